//! In-memory iNES images for integration tests.
#![allow(dead_code)]

pub const PRG_UNIT: usize = 0x4000;
pub const CHR_UNIT: usize = 0x2000;

/// iNES image builder. PRG bytes hold their 16 KiB bank number and CHR bytes their 1 KiB bank
/// number, so a read shows which bank is mapped. Code and vectors go into the last 16 KiB bank,
/// which every supported board maps at $C000 after power-on.
pub struct Rom {
    mapper: u8,
    flags6: u8,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl Rom {
    pub fn new(mapper: u8, prg_units: usize, chr_units: usize) -> Self {
        let prg = (0..prg_units * PRG_UNIT)
            .map(|i| (i / PRG_UNIT) as u8)
            .collect();
        let chr = (0..chr_units * CHR_UNIT).map(|i| (i / 0x400) as u8).collect();
        Self {
            mapper,
            flags6: 0,
            prg,
            chr,
        }
    }

    pub fn flags6(mut self, flags6: u8) -> Self {
        self.flags6 = flags6;
        self
    }

    /// Place `bytes` at CPU address `addr` ($C000–$FFFF).
    pub fn code(mut self, addr: u16, bytes: &[u8]) -> Self {
        let start = self.prg.len() - PRG_UNIT + (addr as usize - 0xC000);
        self.prg[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn vectors(self, nmi: u16, reset: u16, irq: u16) -> Self {
        let [nmi_lo, nmi_hi] = nmi.to_le_bytes();
        let [reset_lo, reset_hi] = reset.to_le_bytes();
        let [irq_lo, irq_hi] = irq.to_le_bytes();
        self.code(0xFFFA, &[nmi_lo, nmi_hi, reset_lo, reset_hi, irq_lo, irq_hi])
    }

    pub fn build(&self) -> Vec<u8> {
        let mut rom = b"NES\x1A".to_vec();
        rom.push((self.prg.len() / PRG_UNIT) as u8);
        rom.push((self.chr.len() / CHR_UNIT) as u8);
        rom.push(self.flags6 | (self.mapper << 4));
        rom.push(self.mapper & 0xF0);
        rom.resize(16, 0);
        rom.extend_from_slice(&self.prg);
        rom.extend_from_slice(&self.chr);
        rom
    }
}
