//! Minimal iNES handoff: header fields plus the PRG/CHR buffers.
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) layout: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7, PRG-RAM size, 7 reserved bytes),
//! optional 512-byte trainer, PRG ROM, then CHR ROM. No CHR ROM means the board carries 8 KiB of
//! CHR RAM.

use crate::{cartridge::mapper::Mirroring, error::LoadError};

pub const HEADER_LEN: usize = 16;
pub const TRAINER_LEN: usize = 512;
pub const PRG_UNIT: usize = 16 * 1024;
pub const CHR_UNIT: usize = 8 * 1024;
pub const PRG_RAM_UNIT: usize = 8 * 1024;

const MAGIC: &[u8; 4] = b"NES\x1A";

/// Decoded header fields the core cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// PRG ROM size in 16 KiB units.
    pub prg_units: u8,
    /// CHR ROM size in 8 KiB units (0 → CHR RAM).
    pub chr_units: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    /// Flags 6 bit 1: PRG RAM is battery backed.
    pub battery: bool,
    /// Flags 6 bit 2: 512-byte trainer precedes PRG ROM.
    pub trainer: bool,
    /// PRG RAM size in 8 KiB units (byte 8; 0 is read as 1).
    pub prg_ram_units: u8,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < 4 || &bytes[0..4] != MAGIC {
            return Err(LoadError::BadSignature);
        }
        if bytes.len() < HEADER_LEN {
            return Err(LoadError::Truncated {
                section: "header",
                expected: HEADER_LEN,
                found: bytes.len(),
            });
        }

        let flags6 = bytes[6];
        let flags7 = bytes[7];

        // Mirroring: flags 6 bit 3 = four-screen VRAM, else bit 0 (0 = horizontal, 1 = vertical).
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_units: bytes[4],
            chr_units: bytes[5],
            mapper_id: (flags6 >> 4) | (flags7 & 0xF0),
            mirroring,
            battery: flags6 & 0x02 != 0,
            trainer: flags6 & 0x04 != 0,
            prg_ram_units: bytes[8].max(1),
        })
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_units as usize * PRG_UNIT
    }

    pub fn chr_rom_len(&self) -> usize {
        self.chr_units as usize * CHR_UNIT
    }

    pub fn prg_ram_len(&self) -> usize {
        self.prg_ram_units as usize * PRG_RAM_UNIT
    }
}

/// A parsed ROM image, ready to become a [`Cartridge`](crate::cartridge::cartridge::Cartridge).
#[derive(Debug, Clone)]
pub struct RomImage {
    pub header: Header,
    pub trainer: Option<Vec<u8>>,
    pub prg_rom: Vec<u8>,
    /// Empty when the board uses CHR RAM.
    pub chr_rom: Vec<u8>,
}

impl RomImage {
    /// Split an iNES file into header, trainer, PRG and CHR. Rejects truncated images.
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        let header = Header::parse(bytes)?;
        if header.prg_units == 0 {
            return Err(LoadError::EmptyPrgRom);
        }

        let mut offset = HEADER_LEN;
        let trainer = if header.trainer {
            let data = take(bytes, offset, TRAINER_LEN, "trainer")?;
            offset += TRAINER_LEN;
            Some(data.to_vec())
        } else {
            None
        };

        let prg_len = header.prg_rom_len();
        let prg_rom = take(bytes, offset, prg_len, "PRG ROM")?.to_vec();
        offset += prg_len;

        let chr_rom = take(bytes, offset, header.chr_rom_len(), "CHR ROM")?.to_vec();

        Ok(Self {
            header,
            trainer,
            prg_rom,
            chr_rom,
        })
    }
}

fn take<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], LoadError> {
    bytes.get(offset..offset + len).ok_or(LoadError::Truncated {
        section,
        expected: len,
        found: bytes.len().saturating_sub(offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_units: u8, chr_units: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut rom = b"NES\x1A".to_vec();
        rom.extend_from_slice(&[prg_units, chr_units, flags6, flags7, 0, 0, 0, 0, 0, 0, 0, 0]);
        if flags6 & 0x04 != 0 {
            rom.extend(std::iter::repeat_n(0xEE, TRAINER_LEN));
        }
        rom.extend(std::iter::repeat_n(0xAA, prg_units as usize * PRG_UNIT));
        rom.extend(std::iter::repeat_n(0x55, chr_units as usize * CHR_UNIT));
        rom
    }

    #[test]
    fn parses_sizes_mapper_and_flags() {
        let rom = RomImage::parse(&image(2, 1, 0x43, 0x00)).unwrap();
        assert_eq!(rom.header.mapper_id, 4);
        assert_eq!(rom.header.mirroring, Mirroring::Vertical);
        assert!(rom.header.battery);
        assert_eq!(rom.prg_rom.len(), 2 * PRG_UNIT);
        assert_eq!(rom.chr_rom.len(), CHR_UNIT);
        assert!(rom.trainer.is_none());
    }

    #[test]
    fn mapper_high_nibble_comes_from_flags7() {
        let rom = RomImage::parse(&image(1, 0, 0x90, 0x10)).unwrap();
        assert_eq!(rom.header.mapper_id, 0x19);
        assert!(rom.chr_rom.is_empty());
    }

    #[test]
    fn trainer_is_skipped_before_prg() {
        let rom = RomImage::parse(&image(1, 1, 0x04, 0)).unwrap();
        assert_eq!(rom.trainer.as_ref().map(Vec::len), Some(TRAINER_LEN));
        assert_eq!(rom.prg_rom[0], 0xAA);
    }

    #[test]
    fn four_screen_overrides_mirroring_bit() {
        let rom = RomImage::parse(&image(1, 1, 0x09, 0)).unwrap();
        assert_eq!(rom.header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn rejects_bad_signature() {
        assert_eq!(RomImage::parse(b"NES!").unwrap_err(), LoadError::BadSignature);
        assert_eq!(RomImage::parse(b"666").unwrap_err(), LoadError::BadSignature);
    }

    #[test]
    fn rejects_truncated_prg() {
        let mut rom = image(2, 1, 0, 0);
        rom.truncate(HEADER_LEN + PRG_UNIT);
        assert!(matches!(
            RomImage::parse(&rom),
            Err(LoadError::Truncated { section: "PRG ROM", .. })
        ));
    }

    #[test]
    fn rejects_empty_prg() {
        assert_eq!(RomImage::parse(&image(0, 1, 0, 0)).unwrap_err(), LoadError::EmptyPrgRom);
    }
}
