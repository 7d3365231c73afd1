//! Mapper trait: register writes, page-table recomputation, PPU snooping and IRQ.

use crate::{
    cartridge::mapper::{MapperState, banks::BankMap},
    error::StateError,
};

/// Trait for NES cartridge mappers. The cartridge resolves every PRG/CHR access through
/// [`Mapper::banks`]; a board only decides what the page tables contain.
pub trait Mapper {
    /// iNES mapper number.
    fn id(&self) -> u8;

    /// Current page tables.
    fn banks(&self) -> &BankMap;

    /// CPU write to $8000–$FFFF. `cpu_cycle` is the bus cycle count at the write.
    fn write_register(&mut self, addr: u16, data: u8, cpu_cycle: u64);

    /// Rebuild the PRG windows from register state.
    fn recompute_prg(&mut self);

    /// Rebuild the CHR windows (and mirroring) from register state.
    fn recompute_chr(&mut self);

    /// PPU address bus activity: pattern fetches and the second PPUADDR write. MMC3 counts A12 edges here.
    fn on_ppu_address(&mut self, _addr: u16) {}

    /// A pattern byte was actually read at `addr` (after the read completes).
    fn on_chr_read(&mut self, addr: u16) {
        self.on_ppu_address(addr);
    }

    /// Level of the cartridge IRQ line.
    fn irq(&self) -> bool {
        false
    }

    fn save(&self) -> MapperState;

    /// Restore registers and rebuild the page tables. Fails without side effects on a foreign state.
    fn restore(&mut self, state: &MapperState) -> Result<(), StateError>;
}

/// Error for a state captured on a different board.
pub(crate) fn mismatch(expected: u8, state: &MapperState) -> StateError {
    StateError::MapperMismatch {
        expected,
        found: state.mapper_id(),
    }
}
