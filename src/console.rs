//! The whole machine: CPU, bus (PPU, cartridge, audio unit, controllers) and the framebuffer.
//!
//! Clocking is strictly ordered. One CPU cycle runs first so its bus effects are visible, then
//! three PPU dots and one audio step for every cycle it consumed (OAM DMA included), then the
//! NMI and IRQ lines are sampled for the next CPU cycle.

use crate::{
    apu::apu::{AudioUnit, SilentApu},
    bus::{NesBus, RAM_LEN},
    cartridge::cartridge::Cartridge,
    cpu::cpu::CPU,
    error::{LoadError, StateError},
    ppu::ppu::{FrameBuffer, HEIGHT, PPU, WIDTH},
    savestate::{self, Snapshot},
};

pub struct Console {
    pub cpu: CPU,
    pub bus: NesBus,
    framebuffer: Box<FrameBuffer>,
}

impl Console {
    /// Power on with `cart` inserted and no audio.
    pub fn new(cart: Cartridge) -> Self {
        Self::with_audio(cart, Box::new(SilentApu))
    }

    /// Power on with `cart` inserted, stepping `apu` once per CPU cycle.
    pub fn with_audio(cart: Cartridge, apu: Box<dyn AudioUnit>) -> Self {
        let mut console = Self {
            cpu: CPU::new(),
            bus: NesBus::with_audio(cart, apu),
            framebuffer: Box::new([0; WIDTH * HEIGHT]),
        };
        console.power_on();
        console
    }

    pub fn from_ines(bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(Self::new(Cartridge::from_ines(bytes)?))
    }

    /// Swap in a new cartridge and power cycle. On error the running game is left as it was.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        let cart = Cartridge::from_ines(bytes)?;
        self.bus.cart = cart;
        self.power_on();
        Ok(())
    }

    /// Cold boot: RAM, PPU and CPU return to power-on state. Board registers, PRG RAM and
    /// controller buttons are kept.
    pub fn power_on(&mut self) {
        self.bus.ram = [0; RAM_LEN];
        self.bus.ppu = PPU::new();
        self.bus.apu.reset();
        self.cpu.power_on(&mut self.bus);
        self.bus.cycles = self.cpu.cycles;
        self.framebuffer.fill(0);
    }

    /// Reset button.
    pub fn reset(&mut self) {
        self.bus.ppu.reset();
        self.bus.apu.reset();
        self.cpu.reset(&mut self.bus);
        self.bus.cycles = self.cpu.cycles;
    }

    /// One CPU cycle plus the PPU dots and audio steps it pays for. Returns CPU cycles consumed.
    pub fn clock(&mut self) -> u32 {
        let consumed = self.cpu.clock(&mut self.bus);
        for _ in 0..consumed {
            for _ in 0..3 {
                self.bus.clock_ppu(&mut self.framebuffer);
            }
            self.bus.clock_apu();
        }
        self.cpu.set_nmi_line(self.bus.nmi());
        self.cpu.set_irq_line(self.bus.irq());
        consumed
    }

    /// Clock until the PPU finishes a frame, then clear the flag. Returns CPU cycles consumed.
    pub fn run_frame(&mut self) -> u64 {
        let mut cycles = 0u64;
        while !self.frame_ready() {
            cycles += self.clock() as u64;
        }
        self.clear_frame_ready();
        cycles
    }

    pub fn frame_ready(&self) -> bool {
        self.bus.ppu.is_frame_complete()
    }

    pub fn clear_frame_ready(&mut self) {
        self.bus.ppu.clear_frame_complete();
    }

    /// 256×240 pixels, 0xRRGGBB.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.ppu.frame_count
    }

    pub fn audio_output(&self) -> f32 {
        self.bus.apu.output()
    }

    /// Button bits for controller `port` (0 or 1), see [`crate::controller`]. Other ports are
    /// ignored.
    pub fn set_buttons(&mut self, port: usize, bits: u8) {
        if let Some(pad) = self.bus.controllers.get_mut(port) {
            pad.state = bits;
        }
    }

    /// CPU address space read without side effects.
    pub fn peek(&self, addr: u16) -> u8 {
        self.cpu.peek(&self.bus, addr)
    }

    pub fn save_state(&self) -> Result<Vec<u8>, StateError> {
        let snapshot = Snapshot {
            cpu: self.cpu.clone(),
            ppu: self.bus.ppu.clone(),
            bus: self.bus.save_state(),
            cart: self.bus.cart.save_state(),
        };
        let bytes = savestate::encode(&snapshot)?;
        log::debug!(
            "saved state: {} bytes at cycle {}",
            bytes.len(),
            self.cpu.cycles
        );
        Ok(bytes)
    }

    /// Restore a snapshot from [`Console::save_state`]. The snapshot is decoded and checked
    /// against the inserted cartridge first; on error nothing changes.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), StateError> {
        let snapshot = savestate::decode(bytes)?;
        if !snapshot.bus.is_valid() {
            return Err(StateError::SizeMismatch {
                what: "RAM",
                expected: RAM_LEN,
                found: snapshot.bus.ram.len(),
            });
        }
        self.bus.cart.restore_state(&snapshot.cart)?;

        self.cpu = snapshot.cpu;
        self.bus.ppu = snapshot.ppu;
        self.bus.restore_state(&snapshot.bus);
        log::debug!("restored state at cycle {}", self.cpu.cycles);
        Ok(())
    }
}
