//! NES controller input handling.
//!
//! Implements the standard NES controller shift register protocol:
//! write $01 to $4016 to hold the latch open (reads return button A), write $00 to freeze the
//! current state; then read $4016/$4017 repeatedly to get one bit per read
//! (A, B, Select, Start, Up, Down, Left, Right). After eight reads the port returns 1.

use bincode::{Decode, Encode};

pub const BUTTON_A: u8 = 1 << 0;
pub const BUTTON_B: u8 = 1 << 1;
pub const BUTTON_SELECT: u8 = 1 << 2;
pub const BUTTON_START: u8 = 1 << 3;
pub const BUTTON_UP: u8 = 1 << 4;
pub const BUTTON_DOWN: u8 = 1 << 5;
pub const BUTTON_LEFT: u8 = 1 << 6;
pub const BUTTON_RIGHT: u8 = 1 << 7;

/// Open-bus bits that show up on controller reads (upper byte of the $4016 address).
const OPEN_BUS: u8 = 0x40;

/// A standard joypad on one controller port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct Controller {
    /// Current button states: bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    pub state: u8,
    /// Shift register: latched from `state` on strobe; shifted out LSB-first on read.
    shift: u8,
    strobe: bool,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one button state. Each read advances the shift (next read = next button) unless the
    /// strobe is held high, in which case the register keeps reloading and A is returned.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return (self.state & 1) | OPEN_BUS;
        }
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit | OPEN_BUS
    }

    /// The value the next [`Controller::read`] would return, without shifting.
    pub fn peek(&self) -> u8 {
        let bits = if self.strobe { self.state } else { self.shift };
        (bits & 1) | OPEN_BUS
    }

    /// Write to $4016 (strobe line, shared by both ports).
    pub fn write(&mut self, data: u8) {
        self.strobe = data & 1 != 0;
        if self.strobe {
            self.shift = self.state;
        }
    }
}
