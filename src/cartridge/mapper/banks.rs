//! Page tables shared by every board.
//!
//! CPU $6000–$FFFF is split into five 8 KiB windows and PPU $0000–$1FFF into eight 1 KiB windows.
//! Each window points at a [`Page`]: a backing buffer plus a byte offset into it. Boards only ever
//! rewrite these tables from their registers; every lookup wraps into the backing buffer's length,
//! so a resolved offset is always in bounds.

use crate::cartridge::mapper::Mirroring;

pub const PRG_WINDOW: usize = 0x2000;
pub const CHR_WINDOW: usize = 0x0400;

const PRG_WINDOWS: usize = 5;
const CHR_WINDOWS: usize = 8;
const PRG_BASE: u16 = 0x6000;

/// Which cartridge array a window points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffer {
    PrgRom,
    PrgRam,
    Chr,
    Unmapped,
}

/// One window of a page table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub buffer: Buffer,
    pub offset: usize,
    pub writable: bool,
}

impl Page {
    pub const UNMAPPED: Page = Page {
        buffer: Buffer::Unmapped,
        offset: 0,
        writable: false,
    };
}

/// Storage sizes fixed at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub prg_rom: usize,
    pub prg_ram: usize,
    pub chr: usize,
    pub chr_is_ram: bool,
    /// Mirroring wired on the board (header).
    pub mirroring: Mirroring,
}

impl Layout {
    pub fn len_of(&self, buffer: Buffer) -> usize {
        match buffer {
            Buffer::PrgRom => self.prg_rom,
            Buffer::PrgRam => self.prg_ram,
            Buffer::Chr => self.chr,
            Buffer::Unmapped => 0,
        }
    }
}

/// PRG, CHR and nametable tables for one cartridge.
#[derive(Clone, Debug)]
pub struct BankMap {
    layout: Layout,
    prg: [Page; PRG_WINDOWS],
    chr: [Page; CHR_WINDOWS],
    mirroring: Mirroring,
    nametables: [usize; 4],
}

impl BankMap {
    /// PRG RAM at $6000 (if any), nothing at $8000+, CHR identity-mapped, header mirroring.
    pub fn new(layout: Layout) -> Self {
        let mut banks = Self {
            layout,
            prg: [Page::UNMAPPED; PRG_WINDOWS],
            chr: [Page::UNMAPPED; CHR_WINDOWS],
            mirroring: layout.mirroring,
            nametables: layout.mirroring.pages(),
        };
        banks.map_prg_ram(true, true);
        banks.map_chr(0x0000, 0x2000, 0);
        banks
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Map `size` bytes of PRG ROM, bank `bank` (in `size` units), at CPU address `base`.
    /// The bank number wraps modulo the number of banks of that size.
    pub fn map_prg(&mut self, base: u16, size: usize, bank: usize) {
        let len = self.layout.prg_rom;
        if len == 0 {
            return;
        }
        let bank = bank % (len / size).max(1);
        let first = (base.saturating_sub(PRG_BASE) as usize) / PRG_WINDOW;
        for i in 0..(size / PRG_WINDOW).max(1) {
            if let Some(page) = self.prg.get_mut(first + i) {
                *page = Page {
                    buffer: Buffer::PrgRom,
                    offset: (bank * size + i * PRG_WINDOW) % len,
                    writable: false,
                };
            }
        }
    }

    /// Map PRG RAM into $6000–$7FFF, or leave it open bus when disabled or absent.
    pub fn map_prg_ram(&mut self, enabled: bool, writable: bool) {
        self.prg[0] = if enabled && self.layout.prg_ram > 0 {
            Page {
                buffer: Buffer::PrgRam,
                offset: 0,
                writable,
            }
        } else {
            Page::UNMAPPED
        };
    }

    /// Map `size` bytes of CHR, bank `bank` (in `size` units), at PPU address `base`.
    pub fn map_chr(&mut self, base: u16, size: usize, bank: usize) {
        let len = self.layout.chr;
        if len == 0 {
            return;
        }
        let bank = bank % (len / size).max(1);
        let first = (base as usize & 0x1FFF) / CHR_WINDOW;
        for i in 0..(size / CHR_WINDOW).max(1) {
            if let Some(page) = self.chr.get_mut(first + i) {
                *page = Page {
                    buffer: Buffer::Chr,
                    offset: (bank * size + i * CHR_WINDOW) % len,
                    writable: self.layout.chr_is_ram,
                };
            }
        }
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
        self.nametables = mirroring.pages();
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Resolve a CPU address in $6000–$FFFF to (page, byte offset in its buffer).
    pub fn resolve_prg(&self, addr: u16) -> Option<(Page, usize)> {
        if addr < PRG_BASE {
            return None;
        }
        let rel = (addr - PRG_BASE) as usize;
        let page = self.prg[rel / PRG_WINDOW];
        if page.buffer == Buffer::Unmapped {
            return None;
        }
        let len = self.layout.len_of(page.buffer);
        Some((page, (page.offset + rel % PRG_WINDOW) % len))
    }

    /// Resolve a PPU address in $0000–$1FFF to (page, byte offset in CHR).
    pub fn resolve_chr(&self, addr: u16) -> Option<(Page, usize)> {
        let rel = addr as usize & 0x1FFF;
        let page = self.chr[rel / CHR_WINDOW];
        if page.buffer == Buffer::Unmapped {
            return None;
        }
        let len = self.layout.len_of(page.buffer);
        Some((page, (page.offset + rel % CHR_WINDOW) % len))
    }

    /// Index into the PPU's 4 KiB nametable memory for a PPU address in $2000–$3EFF.
    pub fn nametable_index(&self, addr: u16) -> usize {
        let rel = (addr as usize).wrapping_sub(0x2000) & 0x0FFF;
        self.nametables[rel / 0x400] * 0x400 + (rel & 0x3FF)
    }
}
