//! Save-state container.
//!
//! Layout: 4-byte magic, `u32` little-endian format version, then the bincode encoding of
//! [`Snapshot`]. Components appear in a fixed order: CPU, PPU, bus (RAM, controllers, DMA
//! latch), cartridge (board registers, PRG RAM, CHR RAM). Audio state is not captured.

use bincode::{Decode, Encode};

use crate::{
    bus::BusState, cartridge::cartridge::CartridgeState, cpu::cpu::CPU, error::StateError,
    ppu::ppu::PPU,
};

pub const MAGIC: [u8; 4] = *b"FMCS";
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = MAGIC.len() + 4;

/// Everything needed to resume a console, minus ROM contents and audio.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Snapshot {
    pub cpu: CPU,
    pub ppu: PPU,
    pub bus: BusState,
    pub cart: CartridgeState,
}

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, StateError> {
    let mut out = Vec::with_capacity(HEADER_LEN + 0x4000);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend(bincode::encode_to_vec(snapshot, config())?);
    Ok(out)
}

/// Decode a whole snapshot. Nothing is applied here, so a failure leaves the caller untouched.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, StateError> {
    let (magic, rest) = bytes.split_at_checked(MAGIC.len()).ok_or(StateError::BadMagic)?;
    if magic != MAGIC {
        return Err(StateError::BadMagic);
    }
    let (version, body) = rest.split_at_checked(4).ok_or(StateError::BadMagic)?;
    let found = u32::from_le_bytes([version[0], version[1], version[2], version[3]]);
    if found != VERSION {
        return Err(StateError::VersionMismatch {
            expected: VERSION,
            found,
        });
    }
    let (snapshot, _) = bincode::decode_from_slice(body, config())?;
    Ok(snapshot)
}
