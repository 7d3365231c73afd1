//! famicore: a cycle-accurate NES (Nintendo Entertainment System) emulation core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): Ricoh 2A03 CPU, 2C02 PPU,
//! cartridge mappers, and controller I/O. Everything advances one CPU cycle at a time so that
//! bus side effects, PPU dots and mapper IRQs line up the way they do on hardware.
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU registers](https://www.nesdev.org/wiki/APU_registers): the audio collaborator
//!   seam (`AudioUnit`, DMC `SampleMemory`)
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU, APU,
//!   controllers, cartridge; [OAM DMA](https://www.nesdev.org/wiki/PPU_registers#OAMDMA)
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper)
//!   NROM (0), MMC1 (1), UxROM (2), MMC3 (4), MMC2 (9), MMC4 (10)
//! - **console** – owns everything; 3 PPU dots and 1 audio step per CPU cycle
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 latch, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: cycle-stepped, documented + stable undocumented opcodes,
//!   [NMI](https://www.nesdev.org/wiki/NMI) / IRQ
//! - **ppu** – [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering), [scrolling](https://www.nesdev.org/wiki/PPU_scrolling), OAM, nametables, 256×240
//! - **savestate** – versioned snapshot container
//! - **error** – load and save-state errors

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod console;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod ppu;
pub mod savestate;
