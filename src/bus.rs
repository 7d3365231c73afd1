//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, APU/IO ports, controllers and the cartridge, and
//! runs OAM DMA. See [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map).

use bincode::{Decode, Encode};

use crate::{
    apu::apu::{AudioUnit, SampleMemory, SilentApu},
    cartridge::cartridge::Cartridge,
    controller::Controller,
    ppu::ppu::{FrameBuffer, PPU},
};

/// CPU-side view of the system, one call per bus cycle.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Read without side effects (no PPU buffer refill, no controller shift, no mapper latch).
    fn peek(&self, addr: u16) -> u8;
    /// End of a CPU cycle. Returns extra cycles the CPU is stalled for (OAM DMA).
    fn tick(&mut self) -> u32 {
        0
    }
}

pub const RAM_LEN: usize = 0x0800;

/// Bus-owned state captured by save states. The PPU and cartridge are captured separately.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BusState {
    pub ram: Vec<u8>,
    pub controllers: [Controller; 2],
    pub dma_page: Option<u8>,
    pub cycles: u64,
}

/// Main NES bus: RAM, PPU, cartridge, audio unit and both controller ports.
pub struct NesBus {
    pub ram: [u8; RAM_LEN],
    pub cart: Cartridge,
    pub ppu: PPU,
    pub apu: Box<dyn AudioUnit>,
    pub controllers: [Controller; 2],
    /// Set by a $4014 write; the transfer runs at the end of that cycle.
    dma_page: Option<u8>,
    /// Total CPU cycles including DMA stalls; decides DMA alignment.
    pub cycles: u64,
}

impl NesBus {
    /// Create a new bus with the given cartridge and a silent audio unit.
    pub fn new(cart: Cartridge) -> Self {
        Self::with_audio(cart, Box::new(SilentApu))
    }

    pub fn with_audio(cart: Cartridge, apu: Box<dyn AudioUnit>) -> Self {
        Self {
            ram: [0; RAM_LEN],
            cart,
            ppu: PPU::new(),
            apu,
            controllers: [Controller::new(), Controller::new()],
            dma_page: None,
            cycles: 0,
        }
    }

    /// One PPU dot.
    pub fn clock_ppu(&mut self, framebuffer: &mut FrameBuffer) {
        self.ppu.clock(&mut self.cart, framebuffer);
    }

    /// One audio step; the audio unit may fetch DMC samples through the CPU address space.
    pub fn clock_apu(&mut self) {
        let mut memory = SampleBus {
            ram: &self.ram,
            cart: &self.cart,
        };
        self.apu.step(&mut memory);
    }

    pub fn nmi(&self) -> bool {
        self.ppu.nmi_line()
    }

    /// IRQ line: board OR audio unit, level-sensitive.
    pub fn irq(&self) -> bool {
        self.cart.irq() || self.apu.irq()
    }

    pub fn save_state(&self) -> BusState {
        BusState {
            ram: self.ram.to_vec(),
            controllers: self.controllers.clone(),
            dma_page: self.dma_page,
            cycles: self.cycles,
        }
    }

    /// Apply a state already checked with [`BusState::is_valid`].
    pub fn restore_state(&mut self, state: &BusState) {
        self.ram.copy_from_slice(&state.ram);
        self.controllers = state.controllers.clone();
        self.dma_page = state.dma_page;
        self.cycles = state.cycles;
    }

    /// 256 reads from `page << 8` written through OAMDATA.
    fn run_oam_dma(&mut self, page: u8) -> u32 {
        // The CPU waits one extra cycle to align when the transfer starts on an odd cycle.
        let stall = if self.cycles % 2 == 1 { 514 } else { 513 };
        let base = (page as u16) << 8;
        for offset in 0..=0xFF {
            let value = self.read(base | offset);
            self.ppu.oam_dma_write(value);
        }
        log::trace!("OAM DMA from ${base:04X}, {stall} cycles");
        stall
    }
}

impl BusState {
    pub fn is_valid(&self) -> bool {
        self.ram.len() == RAM_LEN
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => self.ppu.read_register(&mut self.cart, addr),
            0x4015 => self.apu.read_status(),
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),
            // Write-only APU registers, $4014, disabled test registers
            0x4000..=0x401F => 0,
            0x4020..=0xFFFF => self.cart.read_prg(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => self.ppu.write_register(&mut self.cart, addr, data),
            0x4014 => self.dma_page = Some(data),
            // Strobe is wired to both ports.
            0x4016 => {
                for pad in &mut self.controllers {
                    pad.write(data);
                }
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, data),
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => self.cart.write_prg(addr, data, self.cycles),
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.peek_register(&self.cart, addr),
            0x4015 => self.apu.peek_status(),
            0x4016 => self.controllers[0].peek(),
            0x4017 => self.controllers[1].peek(),
            0x4000..=0x401F => 0,
            0x4020..=0xFFFF => self.cart.read_prg(addr),
        }
    }

    fn tick(&mut self) -> u32 {
        self.cycles += 1;
        match self.dma_page.take() {
            Some(page) => {
                let stall = self.run_oam_dma(page);
                self.cycles += stall as u64;
                stall
            }
            None => 0,
        }
    }
}

/// What the DMC sample fetcher can reach: RAM and cartridge space.
struct SampleBus<'a> {
    ram: &'a [u8; RAM_LEN],
    cart: &'a Cartridge,
}

impl SampleMemory for SampleBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x4020..=0xFFFF => self.cart.read_prg(addr),
            _ => 0,
        }
    }
}
