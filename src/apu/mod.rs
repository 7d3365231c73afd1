//! NES APU (Audio Processing Unit) seam.
//!
//! Channel synthesis lives outside the core. The console drives any [`apu::AudioUnit`] one step per
//! CPU cycle, routes $4000–$4013/$4015/$4017 to it, and lends it a [`apu::SampleMemory`] for DMC
//! sample fetches. [`apu::SilentApu`] is the default unit.

pub mod apu;
