//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register
//! and forces PRG mode 3. Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is
//! latched to the register selected by the fifth write's address. Control bits 0–1 = mirroring,
//! bits 2–3 = PRG mode, bit 4 = CHR mode (0 = one 8 KiB bank, 1 = two 4 KiB banks).
//!
//! The serial port ignores a write on the cycle right after another write, so the dummy write of a
//! read-modify-write instruction is the only one that lands. 512 KiB boards (SUROM) take bit 4 of
//! CHR bank 0 as the outer 256 KiB PRG select.

use crate::{
    cartridge::mapper::{
        MapperState, Mirroring,
        banks::{BankMap, Layout},
        mapper::{Mapper, mismatch},
    },
    error::StateError,
};

const PRG_BANK: usize = 0x4000;
const SUROM_PRG: usize = 512 * 1024;

/// MMC1 state: 5-bit shift register, control byte (mirroring + PRG/CHR mode), bank selects.
pub struct Mapper1 {
    banks: BankMap,
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
    /// CPU cycle of the previous register write.
    last_write: Option<u64>,
}

impl Mapper1 {
    /// Control defaults to $0C (PRG mode 3: $8000 switchable, $C000 fixed last).
    pub fn new(layout: Layout) -> Self {
        let mut mapper = Self {
            banks: BankMap::new(layout),
            shift_reg: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            last_write: None,
        };
        mapper.recompute_prg();
        mapper.recompute_chr();
        mapper
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    /// Outer 256 KiB select on SUROM, in 16 KiB bank units.
    fn outer_bank(&self) -> usize {
        if self.banks.layout().prg_rom >= SUROM_PRG {
            (self.chr_bank0 & 0x10) as usize
        } else {
            0
        }
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::OneScreenLower,
            1 => Mirroring::OneScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    fn latch(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000..=0x9FFF => self.control = value,
            0xA000..=0xBFFF => self.chr_bank0 = value,
            0xC000..=0xDFFF => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }
        log::trace!("MMC1 latch ${addr:04X} <- {value:05b}");
        self.recompute_prg();
        self.recompute_chr();
    }
}

impl Mapper for Mapper1 {
    fn id(&self) -> u8 {
        1
    }

    fn banks(&self) -> &BankMap {
        &self.banks
    }

    fn write_register(&mut self, addr: u16, data: u8, cpu_cycle: u64) {
        let previous = self.last_write.replace(cpu_cycle);
        if previous.is_some_and(|last| cpu_cycle.wrapping_sub(last) < 2) {
            return;
        }

        if data & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            self.recompute_prg();
            return;
        }

        // Shift in LSB (bit 0); after 5 writes, latch to the register selected by address.
        self.shift_reg >>= 1;
        self.shift_reg |= (data & 1) << 4;
        self.shift_count += 1;

        if self.shift_count < 5 {
            return;
        }

        let value = self.shift_reg & 0x1F;
        self.shift_reg = 0;
        self.shift_count = 0;
        self.latch(addr, value);
    }

    fn recompute_prg(&mut self) {
        let outer = self.outer_bank();
        let bank = (self.prg_bank & 0x0F) as usize;

        match self.prg_bank_mode() {
            0 | 1 => self.banks.map_prg(0x8000, 2 * PRG_BANK, (outer | bank) >> 1),
            2 => {
                self.banks.map_prg(0x8000, PRG_BANK, outer);
                self.banks.map_prg(0xC000, PRG_BANK, outer | bank);
            }
            _ => {
                self.banks.map_prg(0x8000, PRG_BANK, outer | bank);
                self.banks.map_prg(0xC000, PRG_BANK, outer | 0x0F);
            }
        }
    }

    fn recompute_chr(&mut self) {
        if self.control & 0x10 == 0 {
            self.banks.map_chr(0x0000, 0x2000, (self.chr_bank0 >> 1) as usize);
        } else {
            self.banks.map_chr(0x0000, 0x1000, self.chr_bank0 as usize);
            self.banks.map_chr(0x1000, 0x1000, self.chr_bank1 as usize);
        }
        self.banks.set_mirroring(self.mirroring());
    }

    fn save(&self) -> MapperState {
        MapperState::Mmc1 {
            shift_reg: self.shift_reg,
            shift_count: self.shift_count,
            control: self.control,
            chr_bank0: self.chr_bank0,
            chr_bank1: self.chr_bank1,
            prg_bank: self.prg_bank,
            last_write: self.last_write,
        }
    }

    fn restore(&mut self, state: &MapperState) -> Result<(), StateError> {
        let MapperState::Mmc1 {
            shift_reg,
            shift_count,
            control,
            chr_bank0,
            chr_bank1,
            prg_bank,
            last_write,
        } = *state
        else {
            return Err(mismatch(self.id(), state));
        };
        self.shift_reg = shift_reg;
        self.shift_count = shift_count;
        self.control = control;
        self.chr_bank0 = chr_bank0;
        self.chr_bank1 = chr_bank1;
        self.prg_bank = prg_bank;
        self.last_write = last_write;
        self.recompute_prg();
        self.recompute_chr();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mmc1(prg_rom: usize, chr: usize) -> Mapper1 {
        Mapper1::new(Layout {
            prg_rom,
            prg_ram: 0x2000,
            chr,
            chr_is_ram: false,
            mirroring: Mirroring::Horizontal,
        })
    }

    /// Serial write of a 5-bit value, spaced like separate STA instructions.
    fn serial(mapper: &mut Mapper1, addr: u16, value: u8, cycle: &mut u64) {
        for bit in 0..5 {
            *cycle += 4;
            mapper.write_register(addr, (value >> bit) & 1, *cycle);
        }
    }

    fn prg_offset(mapper: &Mapper1, addr: u16) -> usize {
        mapper.banks().resolve_prg(addr).map(|(_, o)| o).unwrap()
    }

    #[test]
    fn power_on_fixes_last_bank_at_c000() {
        let mapper = mmc1(0x20000, 0x2000);
        assert_eq!(prg_offset(&mapper, 0x8000), 0);
        assert_eq!(prg_offset(&mapper, 0xC000), 7 * PRG_BANK);
    }

    #[test]
    fn reset_then_prg_select() {
        let mut mapper = mmc1(0x20000, 0x2000);
        let mut cycle = 0;
        mapper.write_register(0x8000, 0x80, cycle);
        serial(&mut mapper, 0xE000, 3, &mut cycle);
        assert_eq!(mapper.prg_bank, 3);
        assert_eq!(prg_offset(&mapper, 0x8000), 3 * PRG_BANK);
        assert_eq!(prg_offset(&mapper, 0xC000), 7 * PRG_BANK);
    }

    #[test]
    fn reset_bit_restores_mode_three() {
        let mut mapper = mmc1(0x20000, 0x2000);
        let mut cycle = 0;
        serial(&mut mapper, 0x8000, 0b00000, &mut cycle);
        assert_eq!(mapper.prg_bank_mode(), 0);
        cycle += 4;
        mapper.write_register(0x8000, 0x80, cycle);
        assert_eq!(mapper.prg_bank_mode(), 3);
        assert_eq!(mapper.shift_count, 0);
    }

    #[test]
    fn back_to_back_writes_are_ignored() {
        let mut mapper = mmc1(0x20000, 0x2000);
        mapper.write_register(0xE000, 1, 100);
        mapper.write_register(0xE000, 1, 101);
        assert_eq!(mapper.shift_count, 1);
        mapper.write_register(0xE000, 1, 103);
        assert_eq!(mapper.shift_count, 2);
    }

    #[test]
    fn control_selects_mirroring_and_chr_mode() {
        let mut mapper = mmc1(0x20000, 0x8000);
        let mut cycle = 0;
        serial(&mut mapper, 0x8000, 0b11110, &mut cycle);
        assert_eq!(mapper.banks().mirroring(), Mirroring::Vertical);
        serial(&mut mapper, 0xA000, 3, &mut cycle);
        serial(&mut mapper, 0xC000, 5, &mut cycle);
        let chr = |addr| mapper.banks().resolve_chr(addr).map(|(_, o)| o).unwrap();
        assert_eq!(chr(0x0000), 3 * 0x1000);
        assert_eq!(chr(0x1000), 5 * 0x1000);
    }

    #[test]
    fn surom_outer_bank_from_chr_bank0() {
        let mut mapper = mmc1(SUROM_PRG, 0x2000);
        assert_eq!(prg_offset(&mapper, 0xC000), 15 * PRG_BANK);
        let mut cycle = 0;
        serial(&mut mapper, 0xA000, 0x10, &mut cycle);
        assert_eq!(prg_offset(&mapper, 0x8000), 16 * PRG_BANK);
        assert_eq!(prg_offset(&mapper, 0xC000), 31 * PRG_BANK);
    }

    #[test]
    fn restore_rejects_foreign_state() {
        let mut mapper = mmc1(0x8000, 0x2000);
        assert!(mapper.restore(&MapperState::Nrom).is_err());
        let state = mapper.save();
        assert!(mapper.restore(&state).is_ok());
    }
}
