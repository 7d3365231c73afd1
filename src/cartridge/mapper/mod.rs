//! NES mappers for PRG/CHR memory mapping.
//!
//! Every board resolves addresses through a shared [`banks::BankMap`] page table; the cartridge owns
//! the storage. Boards: NROM (0), MMC1 (1), UxROM (2), MMC3 (4), MMC2 (9), MMC4 (10).

use bincode::{Decode, Encode};

pub mod banks;
pub mod mapper;

pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper4;
pub mod mapper9;

/// Nametable mirroring mode for PPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLower,
    OneScreenUpper,
    FourScreen,
}

impl Mirroring {
    /// Physical 1 KiB page for each of the four logical nametables ($2000, $2400, $2800, $2C00).
    pub fn pages(self) -> [usize; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::OneScreenLower => [0; 4],
            Mirroring::OneScreenUpper => [1; 4],
            Mirroring::FourScreen => [0, 1, 2, 3],
        }
    }
}

/// Register state of each board, as captured by save states.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum MapperState {
    Nrom,
    Mmc1 {
        shift_reg: u8,
        shift_count: u8,
        control: u8,
        chr_bank0: u8,
        chr_bank1: u8,
        prg_bank: u8,
        last_write: Option<u64>,
    },
    Uxrom {
        bank: u8,
    },
    Mmc3 {
        bank_select: u8,
        regs: [u8; 8],
        mirroring: Mirroring,
        prg_ram_control: u8,
        irq_latch: u8,
        irq_counter: u8,
        irq_reload_pending: bool,
        irq_enabled: bool,
        irq_pending: bool,
        last_a12: bool,
    },
    Latch {
        mmc4: bool,
        prg_bank: u8,
        chr_fd: [u8; 2],
        chr_fe: [u8; 2],
        latch_fe: [bool; 2],
        mirroring: Mirroring,
    },
}

impl MapperState {
    /// iNES mapper number this state belongs to.
    pub fn mapper_id(&self) -> u8 {
        match self {
            MapperState::Nrom => 0,
            MapperState::Mmc1 { .. } => 1,
            MapperState::Uxrom { .. } => 2,
            MapperState::Mmc3 { .. } => 4,
            MapperState::Latch { mmc4: false, .. } => 9,
            MapperState::Latch { mmc4: true, .. } => 10,
        }
    }
}
