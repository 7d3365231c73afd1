//! Error types for the two operations that can fail: loading a ROM and restoring a save state.
//!
//! Clocking never fails. Undefined opcodes and unmapped addresses are handled in place as
//! no-ops / open-bus zero.

use thiserror::Error;

/// A ROM image could not be turned into a [`Cartridge`](crate::cartridge::cartridge::Cartridge).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("missing iNES signature (expected \"NES\\x1A\")")]
    BadSignature,
    #[error("ROM truncated in {section}: expected {expected} bytes, found {found}")]
    Truncated {
        section: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),
    #[error("header declares no PRG ROM")]
    EmptyPrgRom,
}

/// A save state could not be produced or applied. Restores either fully apply or not at all.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("not a save state (bad magic)")]
    BadMagic,
    #[error("save state version {found} does not match supported version {expected}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("save state was taken with mapper {found}, cartridge uses mapper {expected}")]
    MapperMismatch { expected: u8, found: u8 },
    #[error("save state {what} is {found} bytes, cartridge expects {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("failed to encode save state: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode save state: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}
