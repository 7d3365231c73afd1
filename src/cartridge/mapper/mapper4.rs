//! Mapper 4 (MMC3): bank switching, switchable mirroring, PRG RAM protect, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even), PRG RAM protect at $A001. IRQ latch $C000, reload $C001, disable $E000,
//! enable $E001. The IRQ counter clocks on every rising edge of PPU A12.

use crate::{
    cartridge::mapper::{
        MapperState, Mirroring,
        banks::{BankMap, Layout},
        mapper::{Mapper, mismatch},
    },
    error::StateError,
};

const PRG_BANK: usize = 0x2000;
const CHR_BANK: usize = 0x0400;

/// MMC3 state: bank registers, mirroring, PRG RAM control, IRQ counter/latch/enable.
pub struct Mapper4 {
    banks: BankMap,
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG (R0/R1 are 2 KiB, others 1 KiB / 8 KiB).
    regs: [u8; 8],
    mirroring: Mirroring,
    /// $A001: bit 7 = RAM enable, bit 6 = write protect.
    prg_ram_control: u8,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload_pending: bool,
    irq_enabled: bool,
    irq_pending: bool,
    /// Previous PPU A12 to detect rising edges.
    last_a12: bool,
}

impl Mapper4 {
    pub fn new(layout: Layout) -> Self {
        let mut mapper = Self {
            banks: BankMap::new(layout),
            bank_select: 0,
            regs: [0, 2, 4, 5, 6, 7, 0, 1],
            mirroring: layout.mirroring,
            prg_ram_control: 0x80,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload_pending: false,
            irq_enabled: false,
            irq_pending: false,
            last_a12: false,
        };
        mapper.recompute_prg();
        mapper.recompute_chr();
        mapper
    }

    fn four_screen(&self) -> bool {
        self.banks.layout().mirroring == Mirroring::FourScreen
    }

    /// Clock IRQ counter on PPU A12 rising edge.
    fn clock_irq(&mut self) {
        if self.irq_counter == 0 || self.irq_reload_pending {
            self.irq_counter = self.irq_latch;
            self.irq_reload_pending = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}

impl Mapper for Mapper4 {
    fn id(&self) -> u8 {
        4
    }

    fn banks(&self) -> &BankMap {
        &self.banks
    }

    fn write_register(&mut self, addr: u16, data: u8, _cpu_cycle: u64) {
        let even = addr & 1 == 0;
        match (addr, even) {
            (0x8000..=0x9FFF, true) => {
                self.bank_select = data;
                self.recompute_prg();
                self.recompute_chr();
            }
            (0x8000..=0x9FFF, false) => {
                let r = (self.bank_select & 7) as usize;
                self.regs[r] = match r {
                    0 | 1 => data & 0xFE,
                    6 | 7 => data & 0x3F,
                    _ => data,
                };
                self.recompute_prg();
                self.recompute_chr();
            }
            (0xA000..=0xBFFF, true) => {
                if !self.four_screen() {
                    self.mirroring = if data & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                    self.banks.set_mirroring(self.mirroring);
                }
            }
            (0xA000..=0xBFFF, false) => {
                self.prg_ram_control = data;
                self.recompute_prg();
            }
            (0xC000..=0xDFFF, true) => self.irq_latch = data,
            (0xC000..=0xDFFF, false) => {
                self.irq_reload_pending = true;
                self.irq_counter = 0;
            }
            (0xE000..=0xFFFF, true) => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            (0xE000..=0xFFFF, false) => self.irq_enabled = true,
            _ => {}
        }
    }

    fn recompute_prg(&mut self) {
        let count = (self.banks.layout().prg_rom / PRG_BANK).max(1);
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let r6 = self.regs[6] as usize;
        let r7 = self.regs[7] as usize;

        let (bank_8000, bank_c000) = if self.bank_select & 0x40 == 0 {
            (r6, second_last)
        } else {
            (second_last, r6)
        };
        self.banks.map_prg(0x8000, PRG_BANK, bank_8000);
        self.banks.map_prg(0xA000, PRG_BANK, r7);
        self.banks.map_prg(0xC000, PRG_BANK, bank_c000);
        self.banks.map_prg(0xE000, PRG_BANK, last);

        let enabled = self.prg_ram_control & 0x80 != 0;
        let writable = self.prg_ram_control & 0x40 == 0;
        self.banks.map_prg_ram(enabled, writable);
    }

    fn recompute_chr(&mut self) {
        // Two 2 KiB banks in one half, four 1 KiB banks in the other; bit 7 swaps the halves.
        let (two_k, one_k) = if self.bank_select & 0x80 == 0 {
            (0x0000, 0x1000)
        } else {
            (0x1000, 0x0000)
        };
        for (i, &r) in self.regs[0..2].iter().enumerate() {
            let base = two_k + (i as u16) * 0x800;
            self.banks.map_chr(base, CHR_BANK, r as usize);
            self.banks.map_chr(base + 0x400, CHR_BANK, r as usize | 1);
        }
        for (i, &r) in self.regs[2..6].iter().enumerate() {
            self.banks.map_chr(one_k + (i as u16) * 0x400, CHR_BANK, r as usize);
        }
    }

    fn on_ppu_address(&mut self, addr: u16) {
        let a12 = addr & 0x1000 != 0;
        if a12 && !self.last_a12 {
            self.clock_irq();
        }
        self.last_a12 = a12;
    }

    fn irq(&self) -> bool {
        self.irq_pending
    }

    fn save(&self) -> MapperState {
        MapperState::Mmc3 {
            bank_select: self.bank_select,
            regs: self.regs,
            mirroring: self.mirroring,
            prg_ram_control: self.prg_ram_control,
            irq_latch: self.irq_latch,
            irq_counter: self.irq_counter,
            irq_reload_pending: self.irq_reload_pending,
            irq_enabled: self.irq_enabled,
            irq_pending: self.irq_pending,
            last_a12: self.last_a12,
        }
    }

    fn restore(&mut self, state: &MapperState) -> Result<(), StateError> {
        let MapperState::Mmc3 {
            bank_select,
            regs,
            mirroring,
            prg_ram_control,
            irq_latch,
            irq_counter,
            irq_reload_pending,
            irq_enabled,
            irq_pending,
            last_a12,
        } = *state
        else {
            return Err(mismatch(self.id(), state));
        };
        self.bank_select = bank_select;
        self.regs = regs;
        self.mirroring = mirroring;
        self.prg_ram_control = prg_ram_control;
        self.irq_latch = irq_latch;
        self.irq_counter = irq_counter;
        self.irq_reload_pending = irq_reload_pending;
        self.irq_enabled = irq_enabled;
        self.irq_pending = irq_pending;
        self.last_a12 = last_a12;
        self.banks.set_mirroring(mirroring);
        self.recompute_prg();
        self.recompute_chr();
        Ok(())
    }
}
