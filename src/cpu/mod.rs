//! 6502 CPU emulation for the NES.
//!
//! Cycle-stepped: every call to `CPU::clock` is one bus cycle, so the PPU and mappers observe
//! reads and writes (dummy ones included) at the right time. Documented plus stable undocumented
//! opcodes; decimal mode is absent as on the 2A03.

pub mod cpu;
pub mod flags;
pub mod opcodes;

#[cfg(test)]
mod tests;
