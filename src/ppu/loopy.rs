//! The packed scroll/address register ("loopy" `v` and `t`).
//!
//! Layout, from [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling):
//!
//! ```text
//! yyy NN YYYYY XXXXX
//! ||| || ||||| +++++-- coarse X scroll
//! ||| || +++++-------- coarse Y scroll
//! ||| ++-------------- nametable select
//! +++----------------- fine Y scroll
//! ```

use bincode::{Decode, Encode};

const COARSE_X: u16 = 0x001F;
const COARSE_Y: u16 = 0x03E0;
const NAMETABLE_X: u16 = 0x0400;
const NAMETABLE_Y: u16 = 0x0800;
const FINE_Y: u16 = 0x7000;

/// 15-bit VRAM address / scroll position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct VramAddr(u16);

impl VramAddr {
    pub fn new(raw: u16) -> Self {
        Self(raw & 0x7FFF)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn set(&mut self, raw: u16) {
        self.0 = raw & 0x7FFF;
    }

    pub fn coarse_x(self) -> u8 {
        (self.0 & COARSE_X) as u8
    }

    pub fn coarse_y(self) -> u8 {
        ((self.0 & COARSE_Y) >> 5) as u8
    }

    pub fn fine_y(self) -> u8 {
        ((self.0 & FINE_Y) >> 12) as u8
    }

    pub fn nametable(self) -> u8 {
        ((self.0 >> 10) & 3) as u8
    }

    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !COARSE_X) | (value as u16 & 0x1F);
    }

    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !COARSE_Y) | ((value as u16 & 0x1F) << 5);
    }

    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !FINE_Y) | ((value as u16 & 7) << 12);
    }

    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !(NAMETABLE_X | NAMETABLE_Y)) | ((value as u16 & 3) << 10);
    }

    /// Nametable byte address for the tile under `v`.
    pub fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte address covering the tile under `v`.
    pub fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & 0x0C00) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Coarse X increment, wrapping into the horizontally adjacent nametable.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !COARSE_X;
            self.0 ^= NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Fine Y increment, carrying into coarse Y. Row 29 wraps into the vertically adjacent
    /// nametable; rows 30/31 (attribute area) wrap without switching.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    /// Dot 257: coarse X and horizontal nametable from `t`.
    pub fn copy_horizontal(&mut self, t: VramAddr) {
        let mask = COARSE_X | NAMETABLE_X;
        self.0 = (self.0 & !mask) | (t.0 & mask);
    }

    /// Pre-render dots 280–304: fine Y, coarse Y and vertical nametable from `t`.
    pub fn copy_vertical(&mut self, t: VramAddr) {
        let mask = FINE_Y | COARSE_Y | NAMETABLE_Y;
        self.0 = (self.0 & !mask) | (t.0 & mask);
    }
}
