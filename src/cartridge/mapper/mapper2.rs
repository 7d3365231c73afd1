//! Mapper 2 (UxROM): switchable 16 KiB at $8000, last bank fixed at $C000, 8 KiB CHR (usually RAM).

use crate::{
    cartridge::mapper::{
        MapperState,
        banks::{BankMap, Layout},
        mapper::{Mapper, mismatch},
    },
    error::StateError,
};

const PRG_BANK: usize = 0x4000;

pub struct Mapper2 {
    banks: BankMap,
    bank: u8,
}

impl Mapper2 {
    pub fn new(layout: Layout) -> Self {
        let mut mapper = Self {
            banks: BankMap::new(layout),
            bank: 0,
        };
        mapper.recompute_prg();
        mapper.recompute_chr();
        mapper
    }
}

impl Mapper for Mapper2 {
    fn id(&self) -> u8 {
        2
    }

    fn banks(&self) -> &BankMap {
        &self.banks
    }

    fn write_register(&mut self, _addr: u16, data: u8, _cpu_cycle: u64) {
        self.bank = data;
        self.recompute_prg();
    }

    fn recompute_prg(&mut self) {
        let last = (self.banks.layout().prg_rom / PRG_BANK).saturating_sub(1);
        self.banks.map_prg(0x8000, PRG_BANK, self.bank as usize);
        self.banks.map_prg(0xC000, PRG_BANK, last);
    }

    fn recompute_chr(&mut self) {
        self.banks.map_chr(0x0000, 0x2000, 0);
    }

    fn save(&self) -> MapperState {
        MapperState::Uxrom { bank: self.bank }
    }

    fn restore(&mut self, state: &MapperState) -> Result<(), StateError> {
        let MapperState::Uxrom { bank } = *state else {
            return Err(mismatch(self.id(), state));
        };
        self.bank = bank;
        self.recompute_prg();
        Ok(())
    }
}
