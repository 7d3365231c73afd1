//! Cartridge: PRG ROM, PRG RAM and CHR storage plus the board that maps them.
//!
//! A [Mapper](https://www.nesdev.org/wiki/Mapper) implements CPU PRG ($6000–$FFFF) and PPU CHR
//! ($0000–$1FFF) address decoding and bank switching; this type owns the bytes and resolves every
//! access through the mapper's page tables.

use bincode::{Decode, Encode};

use crate::{
    cartridge::{
        mapper::{
            MapperState, Mirroring,
            banks::{Buffer, Layout},
            mapper::Mapper,
            mapper0::Mapper0,
            mapper1::Mapper1,
            mapper2::Mapper2,
            mapper4::Mapper4,
            mapper9::Mapper9,
        },
        rom::{CHR_UNIT, RomImage},
    },
    error::{LoadError, StateError},
};

const TRAINER_OFFSET: usize = 0x1000;

/// Cartridge RAM and board registers, as captured by save states.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct CartridgeState {
    pub mapper: MapperState,
    pub prg_ram: Vec<u8>,
    /// Empty when CHR is ROM.
    pub chr_ram: Vec<u8>,
}

pub struct Cartridge {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    battery: bool,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Build the board named by the header. A missing CHR ROM becomes 8 KiB of CHR RAM.
    pub fn new(rom: RomImage) -> Result<Self, LoadError> {
        let header = &rom.header;
        if rom.prg_rom.is_empty() {
            return Err(LoadError::EmptyPrgRom);
        }

        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; CHR_UNIT]
        } else {
            rom.chr_rom
        };
        let mut prg_ram = vec![0; header.prg_ram_len()];
        if let Some(trainer) = &rom.trainer
            && let Some(dst) = prg_ram.get_mut(TRAINER_OFFSET..TRAINER_OFFSET + trainer.len())
        {
            dst.copy_from_slice(trainer);
        }

        let layout = Layout {
            prg_rom: rom.prg_rom.len(),
            prg_ram: prg_ram.len(),
            chr: chr.len(),
            chr_is_ram,
            mirroring: header.mirroring,
        };
        let mapper: Box<dyn Mapper> = match header.mapper_id {
            0 => Box::new(Mapper0::new(layout)),
            1 => Box::new(Mapper1::new(layout)),
            2 => Box::new(Mapper2::new(layout)),
            4 => Box::new(Mapper4::new(layout)),
            9 => Box::new(Mapper9::mmc2(layout)),
            10 => Box::new(Mapper9::mmc4(layout)),
            id => return Err(LoadError::UnsupportedMapper(id)),
        };
        log::info!(
            "cartridge: mapper {}, PRG {} KiB, CHR {} KiB {}, {:?} mirroring",
            header.mapper_id,
            layout.prg_rom / 1024,
            layout.chr / 1024,
            if chr_is_ram { "RAM" } else { "ROM" },
            header.mirroring,
        );

        Ok(Self {
            prg_rom: rom.prg_rom,
            prg_ram,
            chr,
            chr_is_ram,
            battery: header.battery,
            mapper,
        })
    }

    /// Parse and build in one step.
    pub fn from_ines(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::new(RomImage::parse(bytes)?)
    }

    pub fn mapper_id(&self) -> u8 {
        self.mapper.id()
    }

    pub fn has_battery(&self) -> bool {
        self.battery
    }

    /// Battery-backed RAM contents, for the host to persist.
    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    /// Restore PRG RAM persisted by the host. The image must match the board's RAM size.
    pub fn load_prg_ram(&mut self, data: &[u8]) -> Result<(), StateError> {
        if data.len() != self.prg_ram.len() {
            return Err(StateError::SizeMismatch {
                what: "PRG RAM",
                expected: self.prg_ram.len(),
                found: data.len(),
            });
        }
        self.prg_ram.copy_from_slice(data);
        Ok(())
    }

    fn buffer(&self, buffer: Buffer) -> &[u8] {
        match buffer {
            Buffer::PrgRom => &self.prg_rom,
            Buffer::PrgRam => &self.prg_ram,
            Buffer::Chr => &self.chr,
            Buffer::Unmapped => &[],
        }
    }

    /// CPU read of $6000–$FFFF. Open bus reads 0. PRG reads have no side effects on these boards.
    pub fn read_prg(&self, addr: u16) -> u8 {
        self.mapper
            .banks()
            .resolve_prg(addr)
            .and_then(|(page, offset)| self.buffer(page.buffer).get(offset).copied())
            .unwrap_or(0)
    }

    /// CPU write: $6000–$7FFF goes to PRG RAM (if mapped and writable), $8000+ to the board.
    pub fn write_prg(&mut self, addr: u16, data: u8, cpu_cycle: u64) {
        if addr >= 0x8000 {
            self.mapper.write_register(addr, data, cpu_cycle);
            return;
        }
        if let Some((page, offset)) = self.mapper.banks().resolve_prg(addr)
            && page.buffer == Buffer::PrgRam
            && page.writable
            && let Some(byte) = self.prg_ram.get_mut(offset)
        {
            *byte = data;
        }
    }

    /// PPU pattern fetch. Lets the board observe the address (A12 edges, CHR latches).
    pub fn read_chr(&mut self, addr: u16) -> u8 {
        let value = self.peek_chr(addr);
        self.mapper.on_chr_read(addr);
        value
    }

    /// Pattern read without notifying the board.
    pub fn peek_chr(&self, addr: u16) -> u8 {
        self.mapper
            .banks()
            .resolve_chr(addr)
            .and_then(|(_, offset)| self.chr.get(offset).copied())
            .unwrap_or(0)
    }

    /// PPU write to pattern space. Only CHR RAM accepts it.
    pub fn write_chr(&mut self, addr: u16, data: u8) {
        if !self.chr_is_ram {
            log::trace!("CHR ROM write ${addr:04X} <- ${data:02X} ignored");
        } else if let Some((page, offset)) = self.mapper.banks().resolve_chr(addr)
            && page.writable
            && let Some(byte) = self.chr.get_mut(offset)
        {
            *byte = data;
        }
        self.mapper.on_ppu_address(addr);
    }

    /// PPU address bus change outside of pattern fetches (second PPUADDR write).
    pub fn on_ppu_address(&mut self, addr: u16) {
        self.mapper.on_ppu_address(addr);
    }

    pub fn nametable_index(&self, addr: u16) -> usize {
        self.mapper.banks().nametable_index(addr)
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.banks().mirroring()
    }

    pub fn irq(&self) -> bool {
        self.mapper.irq()
    }

    pub fn save_state(&self) -> CartridgeState {
        CartridgeState {
            mapper: self.mapper.save(),
            prg_ram: self.prg_ram.clone(),
            chr_ram: if self.chr_is_ram {
                self.chr.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Check a state against this cartridge without applying it.
    pub fn validate_state(&self, state: &CartridgeState) -> Result<(), StateError> {
        if state.mapper.mapper_id() != self.mapper_id() {
            return Err(StateError::MapperMismatch {
                expected: self.mapper_id(),
                found: state.mapper.mapper_id(),
            });
        }
        if state.prg_ram.len() != self.prg_ram.len() {
            return Err(StateError::SizeMismatch {
                what: "PRG RAM",
                expected: self.prg_ram.len(),
                found: state.prg_ram.len(),
            });
        }
        let chr_ram_len = if self.chr_is_ram { self.chr.len() } else { 0 };
        if state.chr_ram.len() != chr_ram_len {
            return Err(StateError::SizeMismatch {
                what: "CHR RAM",
                expected: chr_ram_len,
                found: state.chr_ram.len(),
            });
        }
        Ok(())
    }

    pub fn restore_state(&mut self, state: &CartridgeState) -> Result<(), StateError> {
        self.validate_state(state)?;
        self.mapper.restore(&state.mapper)?;
        self.prg_ram.copy_from_slice(&state.prg_ram);
        if self.chr_is_ram {
            self.chr.copy_from_slice(&state.chr_ram);
        }
        Ok(())
    }
}
