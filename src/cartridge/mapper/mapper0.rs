//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::{
    cartridge::mapper::{
        MapperState,
        banks::{BankMap, Layout},
        mapper::{Mapper, mismatch},
    },
    error::StateError,
};

/// NROM mapper: fixed PRG and CHR, a 16KB PRG image mirrors into $C000.
pub struct Mapper0 {
    banks: BankMap,
}

impl Mapper0 {
    pub fn new(layout: Layout) -> Self {
        let mut mapper = Self {
            banks: BankMap::new(layout),
        };
        mapper.recompute_prg();
        mapper.recompute_chr();
        mapper
    }
}

impl Mapper for Mapper0 {
    fn id(&self) -> u8 {
        0
    }

    fn banks(&self) -> &BankMap {
        &self.banks
    }

    fn write_register(&mut self, _addr: u16, _data: u8, _cpu_cycle: u64) {}

    fn recompute_prg(&mut self) {
        self.banks.map_prg(0x8000, 0x8000, 0);
    }

    fn recompute_chr(&mut self) {
        self.banks.map_chr(0x0000, 0x2000, 0);
    }

    fn save(&self) -> MapperState {
        MapperState::Nrom
    }

    fn restore(&mut self, state: &MapperState) -> Result<(), StateError> {
        match state {
            MapperState::Nrom => Ok(()),
            other => Err(mismatch(self.id(), other)),
        }
    }
}
