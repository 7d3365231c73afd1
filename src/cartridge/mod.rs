//! NES cartridge loading and mapper support.
//!
//! - **rom**: Splits iNES (.nes) images into header, PRG and CHR.
//! - **cartridge**: Owns PRG/CHR storage and the board; resolves accesses through its page tables.
//! - **mapper**: NROM (0), MMC1 (1), UxROM (2), MMC3 (4), MMC2 (9), MMC4 (10).

pub mod cartridge;
pub mod mapper;
pub mod rom;
