//! Audio collaborator interface.
//!
//! Registers follow [APU registers](https://www.nesdev.org/wiki/APU_registers): channel registers
//! $4000–$4013, status/enable $4015, frame counter $4017 (write side; the read side is joypad 2).

/// CPU address space as seen by the DMC sample fetcher.
pub trait SampleMemory {
    fn read(&mut self, addr: u16) -> u8;
}

/// An APU implementation plugged into the console.
pub trait AudioUnit {
    /// One CPU cycle.
    fn step(&mut self, memory: &mut dyn SampleMemory);

    /// Current mixed output sample, nominally in 0.0..=1.0.
    fn output(&self) -> f32;

    /// CPU write to $4000–$4013, $4015 or $4017.
    fn write_register(&mut self, addr: u16, data: u8);

    /// CPU read of $4015. Clears the frame interrupt flag on real hardware.
    fn read_status(&mut self) -> u8;

    /// $4015 without side effects.
    fn peek_status(&self) -> u8 {
        0
    }

    /// Frame counter or DMC interrupt line.
    fn irq(&self) -> bool {
        false
    }

    /// Reset button.
    fn reset(&mut self) {}
}

/// Produces silence. Used when the host plugs in no audio unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentApu;

impl AudioUnit for SilentApu {
    fn step(&mut self, _memory: &mut dyn SampleMemory) {}

    fn output(&self) -> f32 {
        0.0
    }

    fn write_register(&mut self, _addr: u16, _data: u8) {}

    // Length counters never run, so no channel reports as active.
    fn read_status(&mut self) -> u8 {
        0
    }
}
