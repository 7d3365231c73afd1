//! Mapper 9 (MMC2) and Mapper 10 (MMC4): CHR banks chosen by latches that flip when the PPU
//! fetches tiles $FD or $FE.
//!
//! [MMC2](https://www.nesdev.org/wiki/MMC2) / [MMC4](https://www.nesdev.org/wiki/MMC4):
//! $A000 PRG bank, $B000/$C000 CHR $0000 bank for latch 0 = $FD/$FE, $D000/$E000 CHR $1000
//! bank for latch 1 = $FD/$FE, $F000 mirroring (0 = vertical, 1 = horizontal). MMC2 switches
//! 8 KiB at $8000 with the last three 8 KiB banks fixed; MMC4 switches 16 KiB with the last fixed.

use crate::{
    cartridge::mapper::{
        MapperState, Mirroring,
        banks::{BankMap, Layout},
        mapper::{Mapper, mismatch},
    },
    error::StateError,
};

const CHR_BANK: usize = 0x1000;

pub struct Mapper9 {
    banks: BankMap,
    mmc4: bool,
    prg_bank: u8,
    chr_fd: [u8; 2],
    chr_fe: [u8; 2],
    /// Per pattern half: latch currently selects the $FE register.
    latch_fe: [bool; 2],
    mirroring: Mirroring,
}

impl Mapper9 {
    /// MMC2 (PxROM, mapper 9).
    pub fn mmc2(layout: Layout) -> Self {
        Self::new(layout, false)
    }

    /// MMC4 (FxROM, mapper 10).
    pub fn mmc4(layout: Layout) -> Self {
        Self::new(layout, true)
    }

    fn new(layout: Layout, mmc4: bool) -> Self {
        let mut mapper = Self {
            banks: BankMap::new(layout),
            mmc4,
            prg_bank: 0,
            chr_fd: [0; 2],
            chr_fe: [0; 2],
            latch_fe: [true; 2],
            mirroring: Mirroring::Vertical,
        };
        mapper.recompute_prg();
        mapper.recompute_chr();
        mapper
    }

    /// New latch value for a completed pattern fetch at `addr`, if it is a trigger address.
    fn trigger(&self, addr: u16) -> Option<(usize, bool)> {
        match addr & 0x1FFF {
            0x0FD8 => Some((0, false)),
            0x0FE8 => Some((0, true)),
            0x0FD9..=0x0FDF if self.mmc4 => Some((0, false)),
            0x0FE9..=0x0FEF if self.mmc4 => Some((0, true)),
            0x1FD8..=0x1FDF => Some((1, false)),
            0x1FE8..=0x1FEF => Some((1, true)),
            _ => None,
        }
    }
}

impl Mapper for Mapper9 {
    fn id(&self) -> u8 {
        if self.mmc4 { 10 } else { 9 }
    }

    fn banks(&self) -> &BankMap {
        &self.banks
    }

    fn write_register(&mut self, addr: u16, data: u8, _cpu_cycle: u64) {
        match addr {
            0xA000..=0xAFFF => {
                self.prg_bank = data & 0x0F;
                self.recompute_prg();
            }
            0xB000..=0xBFFF => self.chr_fd[0] = data & 0x1F,
            0xC000..=0xCFFF => self.chr_fe[0] = data & 0x1F,
            0xD000..=0xDFFF => self.chr_fd[1] = data & 0x1F,
            0xE000..=0xEFFF => self.chr_fe[1] = data & 0x1F,
            0xF000..=0xFFFF => {
                self.mirroring = if data & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            _ => return,
        }
        self.recompute_chr();
    }

    fn recompute_prg(&mut self) {
        let bank = self.prg_bank as usize;
        if self.mmc4 {
            let last = (self.banks.layout().prg_rom / 0x4000).saturating_sub(1);
            self.banks.map_prg(0x8000, 0x4000, bank);
            self.banks.map_prg(0xC000, 0x4000, last);
        } else {
            let count = self.banks.layout().prg_rom / 0x2000;
            self.banks.map_prg(0x8000, 0x2000, bank);
            for (i, base) in [0xA000, 0xC000, 0xE000].into_iter().enumerate() {
                self.banks.map_prg(base, 0x2000, (count + i).saturating_sub(3));
            }
        }
    }

    fn recompute_chr(&mut self) {
        for half in 0..2 {
            let bank = if self.latch_fe[half] {
                self.chr_fe[half]
            } else {
                self.chr_fd[half]
            };
            self.banks.map_chr((half * CHR_BANK) as u16, CHR_BANK, bank as usize);
        }
        if self.banks.layout().mirroring != Mirroring::FourScreen {
            self.banks.set_mirroring(self.mirroring);
        }
    }

    fn on_chr_read(&mut self, addr: u16) {
        if let Some((half, fe)) = self.trigger(addr)
            && self.latch_fe[half] != fe
        {
            self.latch_fe[half] = fe;
            self.recompute_chr();
        }
    }

    fn save(&self) -> MapperState {
        MapperState::Latch {
            mmc4: self.mmc4,
            prg_bank: self.prg_bank,
            chr_fd: self.chr_fd,
            chr_fe: self.chr_fe,
            latch_fe: self.latch_fe,
            mirroring: self.mirroring,
        }
    }

    fn restore(&mut self, state: &MapperState) -> Result<(), StateError> {
        match *state {
            MapperState::Latch {
                mmc4,
                prg_bank,
                chr_fd,
                chr_fe,
                latch_fe,
                mirroring,
            } if mmc4 == self.mmc4 => {
                self.prg_bank = prg_bank;
                self.chr_fd = chr_fd;
                self.chr_fe = chr_fe;
                self.latch_fe = latch_fe;
                self.mirroring = mirroring;
                self.recompute_prg();
                self.recompute_chr();
                Ok(())
            }
            _ => Err(mismatch(self.id(), state)),
        }
    }
}
