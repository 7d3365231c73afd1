//! NES PPU (Picture Processing Unit) implementation.
//!
//! Dot-stepped 2C02: 341 dots × 262 scanlines, background fetched through the loopy `v` register
//! into 16-bit shifters two tiles ahead, sprites evaluated once per line into a 256-wide line
//! buffer. Registers: $2000–$2007 (mirrored every 8 bytes).
//!
//! Timing follows the [PPU frame timing diagram](https://www.nesdev.org/wiki/PPU_rendering).

use bincode::{Decode, Encode};

use crate::{
    cartridge::cartridge::Cartridge,
    ppu::{
        loopy::VramAddr,
        palette::{NES_PALETTE_RGB, palette_index},
    },
};

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

/// 256×240 pixels, 0xRRGGBB, row-major.
pub type FrameBuffer = [u32; WIDTH * HEIGHT];

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;

const DOTS_PER_LINE: u16 = 341;
const PRE_RENDER_LINE: u16 = 261;
const VBLANK_LINE: u16 = 241;

// PPUCTRL
const CTRL_INCREMENT_32: u8 = 0x04;
const CTRL_SPRITE_TABLE: u8 = 0x08;
const CTRL_BG_TABLE: u8 = 0x10;
const CTRL_SPRITE_16: u8 = 0x20;
const CTRL_NMI: u8 = 0x80;

// PPUMASK
const MASK_GRAYSCALE: u8 = 0x01;
const MASK_BG_LEFT: u8 = 0x02;
const MASK_SPRITE_LEFT: u8 = 0x04;
const MASK_BG: u8 = 0x08;
const MASK_SPRITES: u8 = 0x10;

// PPUSTATUS
const STATUS_OVERFLOW: u8 = 0x20;
const STATUS_SPRITE_0: u8 = 0x40;
const STATUS_VBLANK: u8 = 0x80;

/// One sprite copied into secondary OAM during evaluation. `row` (vertical flip applied) and
/// `tall` are fixed at evaluation, so a PPUCTRL write during the fetches cannot change them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
struct SpriteSlot {
    tile: u8,
    attr: u8,
    x: u8,
    row: u8,
    tall: bool,
}

/// Resolved sprite pixel for one column of the next scanline. `color == 0` is transparent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
struct SpritePixel {
    color: u8,
    palette: u8,
    behind: bool,
    sprite_0: bool,
}

impl SpritePixel {
    const EMPTY: Self = Self {
        color: 0,
        palette: 0,
        behind: false,
        sprite_0: false,
    };
}

/// PPU state: timing, loopy registers, VRAM, palettes, OAM and the rendering pipeline.
/// The framebuffer is owned by the caller and passed to [`PPU::clock`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct PPU {
    pub ctrl: u8,
    pub mask: u8,
    pub vblank: bool,
    /// Sprite 0 hit (PPUSTATUS bit 6); cleared on the pre-render line.
    pub sprite_0_hit: bool,
    /// Sprite overflow (PPUSTATUS bit 5); cleared on the pre-render line.
    pub sprite_overflow: bool,
    /// OAM: 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    pub oam_addr: u8,

    v: VramAddr,
    t: VramAddr,
    fine_x: u8,
    /// Shared first/second write toggle for $2005/$2006.
    write_toggle: bool,
    read_buffer: u8,
    /// Last value driven onto the PPU data bus by a register access.
    open_bus: u8,

    /// Nametable RAM. 2 KiB used by most boards, all 4 KiB with four-screen VRAM.
    vram: [u8; 0x1000],
    /// Palette RAM $3F00-$3F1F.
    palette: [u8; 32],

    pub scanline: u16,
    pub dot: u16,
    odd_frame: bool,
    frame_complete: bool,
    pub frame_count: u64,

    bg_next_tile: u8,
    bg_next_attr: u8,
    bg_next_lo: u8,
    bg_next_hi: u8,
    bg_shift_lo: u16,
    bg_shift_hi: u16,
    bg_shift_attr_lo: u16,
    bg_shift_attr_hi: u16,

    secondary_oam: [SpriteSlot; 8],
    sprite_count: u8,
    sprite_0_selected: bool,
    sprite_line: [SpritePixel; WIDTH],
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl PPU {
    /// Power-on state: scanline 0, dot 0, rendering disabled.
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            vblank: false,
            sprite_0_hit: false,
            sprite_overflow: false,
            oam: [0; OAM_LEN],
            oam_addr: 0,
            v: VramAddr::default(),
            t: VramAddr::default(),
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            open_bus: 0,
            vram: [0; 0x1000],
            palette: [0; 32],
            scanline: 0,
            dot: 0,
            odd_frame: false,
            frame_complete: false,
            frame_count: 0,
            bg_next_tile: 0,
            bg_next_attr: 0,
            bg_next_lo: 0,
            bg_next_hi: 0,
            bg_shift_lo: 0,
            bg_shift_hi: 0,
            bg_shift_attr_lo: 0,
            bg_shift_attr_hi: 0,
            secondary_oam: [SpriteSlot::default(); 8],
            sprite_count: 0,
            sprite_0_selected: false,
            sprite_line: [SpritePixel::EMPTY; WIDTH],
        }
    }

    /// Reset button: PPUCTRL, PPUMASK, the write toggle, the read buffer and frame parity clear.
    /// VRAM, OAM and palettes survive.
    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.t = VramAddr::default();
        self.fine_x = 0;
        self.write_toggle = false;
        self.read_buffer = 0;
        self.odd_frame = false;
    }

    /// NMI output: VBlank flag AND PPUCTRL bit 7.
    pub fn nmi_line(&self) -> bool {
        self.vblank && self.ctrl & CTRL_NMI != 0
    }

    pub fn is_frame_complete(&self) -> bool {
        self.frame_complete
    }

    pub fn clear_frame_complete(&mut self) {
        self.frame_complete = false;
    }

    /// Horizontal scroll in pixels as last written (from `t` and fine X).
    pub fn scroll_x(&self) -> u16 {
        self.t.coarse_x() as u16 * 8 + self.fine_x as u16
    }

    /// Vertical scroll in pixels as last written (from `t`).
    pub fn scroll_y(&self) -> u16 {
        self.t.coarse_y() as u16 * 8 + self.t.fine_y() as u16
    }

    pub fn vram_addr(&self) -> u16 {
        self.v.get()
    }

    fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BG | MASK_SPRITES) != 0
    }

    fn sprite_height(&self) -> u16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 { 16 } else { 8 }
    }

    /// Advance one dot. Visible dots write one pixel into `framebuffer`.
    pub fn clock(&mut self, cart: &mut Cartridge, framebuffer: &mut FrameBuffer) {
        let visible = self.scanline < HEIGHT as u16;
        let pre_render = self.scanline == PRE_RENDER_LINE;

        if (visible || pre_render) && self.rendering_enabled() {
            self.render_fetches(cart, pre_render);
        }

        if self.scanline == VBLANK_LINE && self.dot == 1 {
            self.vblank = true;
        }

        if pre_render && self.dot == 1 {
            self.vblank = false;
            self.sprite_0_hit = false;
            self.sprite_overflow = false;
            self.frame_complete = true;
            self.frame_count += 1;
        }

        if visible && (1..=WIDTH as u16).contains(&self.dot) {
            self.emit_pixel(framebuffer);
        }

        self.advance();
    }

    fn advance(&mut self) {
        self.dot += 1;
        // Odd frames drop the last pre-render dot while rendering.
        if self.scanline == PRE_RENDER_LINE
            && self.dot == DOTS_PER_LINE - 1
            && self.odd_frame
            && self.rendering_enabled()
        {
            self.dot = DOTS_PER_LINE;
        }
        if self.dot >= DOTS_PER_LINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > PRE_RENDER_LINE {
                self.scanline = 0;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// Background and sprite memory traffic for one dot of a rendering line.
    fn render_fetches(&mut self, cart: &mut Cartridge, pre_render: bool) {
        let dot = self.dot;

        if (2..=257).contains(&dot) || (321..=337).contains(&dot) {
            self.shift_background();
            match (dot - 1) % 8 {
                0 => {
                    self.load_background_shifters();
                    self.bg_next_tile = self.read_nametable(cart, self.v.tile_address());
                }
                2 => {
                    let mut attr = self.read_nametable(cart, self.v.attribute_address());
                    if self.v.coarse_y() & 2 != 0 {
                        attr >>= 4;
                    }
                    if self.v.coarse_x() & 2 != 0 {
                        attr >>= 2;
                    }
                    self.bg_next_attr = attr & 3;
                }
                4 => self.bg_next_lo = cart.read_chr(self.background_pattern_address()),
                6 => self.bg_next_hi = cart.read_chr(self.background_pattern_address() + 8),
                7 => self.v.increment_x(),
                _ => {}
            }
        }

        if dot == 256 {
            self.v.increment_y();
        }

        if dot == 257 {
            self.load_background_shifters();
            self.v.copy_horizontal(self.t);
            if pre_render {
                self.sprite_count = 0;
                self.sprite_0_selected = false;
            } else {
                self.evaluate_sprites();
            }
            self.sprite_line = [SpritePixel::EMPTY; WIDTH];
        }

        if (257..=320).contains(&dot) {
            self.oam_addr = 0;
            if (dot - 257) % 8 == 7 {
                self.fetch_sprite(cart, ((dot - 257) / 8) as usize);
            }
        }

        // Unused nametable fetches at the end of the line.
        if dot == 338 || dot == 340 {
            self.bg_next_tile = self.read_nametable(cart, self.v.tile_address());
        }

        if pre_render && (280..=304).contains(&dot) {
            self.v.copy_vertical(self.t);
        }
    }

    fn background_pattern_address(&self) -> u16 {
        let table = if self.ctrl & CTRL_BG_TABLE != 0 { 0x1000 } else { 0 };
        table + (self.bg_next_tile as u16) * 16 + self.v.fine_y() as u16
    }

    fn shift_background(&mut self) {
        if self.mask & MASK_BG != 0 {
            self.bg_shift_lo <<= 1;
            self.bg_shift_hi <<= 1;
            self.bg_shift_attr_lo <<= 1;
            self.bg_shift_attr_hi <<= 1;
        }
    }

    fn load_background_shifters(&mut self) {
        self.bg_shift_lo = (self.bg_shift_lo & 0xFF00) | self.bg_next_lo as u16;
        self.bg_shift_hi = (self.bg_shift_hi & 0xFF00) | self.bg_next_hi as u16;
        let fill = |bit: u8| if self.bg_next_attr & bit != 0 { 0xFF } else { 0x00 };
        let (attr_lo, attr_hi) = (fill(1), fill(2));
        self.bg_shift_attr_lo = (self.bg_shift_attr_lo & 0xFF00) | attr_lo;
        self.bg_shift_attr_hi = (self.bg_shift_attr_hi & 0xFF00) | attr_hi;
    }

    /// Select up to eight sprites on this line for display on the next one. OAM Y is one less
    /// than the first line a sprite appears on.
    fn evaluate_sprites(&mut self) {
        let height = self.sprite_height();
        self.sprite_count = 0;
        self.sprite_0_selected = false;
        for index in 0..64 {
            let base = index * 4;
            let y = self.oam[base] as u16;
            if self.scanline < y || self.scanline - y >= height {
                continue;
            }
            if self.sprite_count as usize == self.secondary_oam.len() {
                self.sprite_overflow = true;
                break;
            }
            let attr = self.oam[base + 2];
            let mut row = self.scanline - y;
            if attr & 0x80 != 0 {
                row = height - 1 - row;
            }
            self.secondary_oam[self.sprite_count as usize] = SpriteSlot {
                tile: self.oam[base + 1],
                attr,
                x: self.oam[base + 3],
                row: row as u8,
                tall: height == 16,
            };
            if index == 0 {
                self.sprite_0_selected = true;
            }
            self.sprite_count += 1;
        }
    }

    /// Pattern fetch for one secondary-OAM slot. Empty slots still fetch tile $FF so the board
    /// sees the same address pattern as real hardware.
    fn fetch_sprite(&mut self, cart: &mut Cartridge, slot: usize) {
        let present = slot < self.sprite_count as usize;
        let sprite = if present {
            self.secondary_oam[slot]
        } else {
            SpriteSlot {
                tile: 0xFF,
                attr: 0,
                x: 0xFF,
                row: 0,
                tall: self.sprite_height() == 16,
            }
        };

        let addr = self.sprite_pattern_address(sprite);
        let mut lo = cart.read_chr(addr);
        let mut hi = cart.read_chr(addr + 8);
        if !present {
            return;
        }
        if sprite.attr & 0x40 != 0 {
            lo = lo.reverse_bits();
            hi = hi.reverse_bits();
        }

        for px in 0..8 {
            let x = sprite.x as usize + px;
            if x >= WIDTH {
                break;
            }
            let bit = 7 - px;
            let color = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
            // Lower slots were resolved first and win.
            if color == 0 || self.sprite_line[x].color != 0 {
                continue;
            }
            self.sprite_line[x] = SpritePixel {
                color,
                palette: sprite.attr & 3,
                behind: sprite.attr & 0x20 != 0,
                sprite_0: slot == 0 && self.sprite_0_selected,
            };
        }
    }

    /// Low-plane pattern address of a slot's row. 8×16 sprites take their table from tile bit 0
    /// and use `tile | 1` for rows 8-15.
    fn sprite_pattern_address(&self, sprite: SpriteSlot) -> u16 {
        let row = sprite.row as u16 & 0x0F;
        if sprite.tall {
            let table = (sprite.tile as u16 & 1) * 0x1000;
            let tile = (sprite.tile & 0xFE) as u16 + (row >= 8) as u16;
            table + tile * 16 + (row & 7)
        } else {
            let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 { 0x1000 } else { 0 };
            table + sprite.tile as u16 * 16 + (row & 7)
        }
    }

    fn emit_pixel(&mut self, framebuffer: &mut FrameBuffer) {
        let x = (self.dot - 1) as usize;
        let y = self.scanline as usize;

        let color_index = if self.rendering_enabled() {
            let (pixel, palette) = self.mix_pixel(x);
            if pixel == 0 {
                self.palette[0]
            } else {
                self.palette[palette_index(0x3F00 + palette as u16 * 4 + pixel as u16)]
            }
        } else if self.v.get() & 0x3F00 == 0x3F00 {
            // Rendering off with `v` in palette space shows that entry.
            self.palette[palette_index(self.v.get())]
        } else {
            self.palette[0]
        };

        let color_index = if self.mask & MASK_GRAYSCALE != 0 {
            color_index & 0x30
        } else {
            color_index
        };
        framebuffer[y * WIDTH + x] = NES_PALETTE_RGB[(color_index & 0x3F) as usize];
    }

    /// Background/sprite priority mux. Returns (2-bit pixel, palette 0..8).
    fn mix_pixel(&mut self, x: usize) -> (u8, u8) {
        let (mut bg_pixel, mut bg_palette) = (0, 0);
        if self.mask & MASK_BG != 0 && (self.mask & MASK_BG_LEFT != 0 || x >= 8) {
            let mux = 0x8000 >> self.fine_x;
            let p0 = (self.bg_shift_lo & mux != 0) as u8;
            let p1 = (self.bg_shift_hi & mux != 0) as u8;
            bg_pixel = (p1 << 1) | p0;
            let a0 = (self.bg_shift_attr_lo & mux != 0) as u8;
            let a1 = (self.bg_shift_attr_hi & mux != 0) as u8;
            bg_palette = (a1 << 1) | a0;
        }

        let sprite = if self.mask & MASK_SPRITES != 0 && (self.mask & MASK_SPRITE_LEFT != 0 || x >= 8)
        {
            self.sprite_line[x]
        } else {
            SpritePixel::EMPTY
        };

        match (bg_pixel, sprite.color) {
            (0, 0) => (0, 0),
            (0, _) => (sprite.color, sprite.palette + 4),
            (_, 0) => (bg_pixel, bg_palette),
            _ => {
                if sprite.sprite_0 && x != 255 {
                    self.sprite_0_hit = true;
                }
                if sprite.behind {
                    (bg_pixel, bg_palette)
                } else {
                    (sprite.color, sprite.palette + 4)
                }
            }
        }
    }

    fn read_nametable(&self, cart: &Cartridge, addr: u16) -> u8 {
        self.vram[cart.nametable_index(addr)]
    }

    /// PPU bus read: pattern tables via the cartridge, nametables via mirroring, palette RAM.
    fn read_vram(&mut self, cart: &mut Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.read_chr(addr),
            0x2000..=0x3EFF => self.read_nametable(cart, addr),
            _ => self.palette[palette_index(addr)],
        }
    }

    fn peek_vram(&self, cart: &Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.peek_chr(addr),
            0x2000..=0x3EFF => self.read_nametable(cart, addr),
            _ => self.palette[palette_index(addr)],
        }
    }

    fn write_vram(&mut self, cart: &mut Cartridge, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.write_chr(addr, data),
            0x2000..=0x3EFF => self.vram[cart.nametable_index(addr)] = data,
            // Upper 2 bits of palette entries do not exist.
            _ => self.palette[palette_index(addr)] = data & 0x3F,
        }
    }

    /// CPU write to $2000–$3FFF.
    pub fn write_register(&mut self, cart: &mut Cartridge, addr: u16, data: u8) {
        self.open_bus = data;
        match addr & 7 {
            0 => self.write_ctrl(data),
            1 => self.mask = data,
            2 => {}
            3 => self.write_oam_addr(data),
            4 => self.write_oam_data(data),
            5 => self.write_scroll(data),
            6 => self.write_addr(cart, data),
            _ => self.write_data(cart, data),
        }
    }

    /// CPU read of $2000–$3FFF. Write-only ports return the open-bus latch.
    pub fn read_register(&mut self, cart: &mut Cartridge, addr: u16) -> u8 {
        let value = match addr & 7 {
            2 => self.read_status(),
            4 => self.read_oam_data(),
            7 => self.read_data(cart),
            _ => self.open_bus,
        };
        self.open_bus = value;
        value
    }

    /// Register read without side effects, for debuggers.
    pub fn peek_register(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr & 7 {
            2 => self.status_bits(),
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.v.get() & 0x3FFF;
                if addr >= 0x3F00 {
                    self.peek_vram(cart, addr)
                } else {
                    self.read_buffer
                }
            }
            _ => self.open_bus,
        }
    }

    fn status_bits(&self) -> u8 {
        let mut status = self.open_bus & 0x1F;
        if self.vblank {
            status |= STATUS_VBLANK;
        }
        if self.sprite_0_hit {
            status |= STATUS_SPRITE_0;
        }
        if self.sprite_overflow {
            status |= STATUS_OVERFLOW;
        }
        status
    }

    /// Read PPUSTATUS ($2002); clears vblank and the write toggle.
    pub fn read_status(&mut self) -> u8 {
        let status = self.status_bits();
        self.vblank = false;
        self.write_toggle = false;
        status
    }

    /// Write PPUCTRL ($2000). Bits 0-1 select the base nametable in `t`.
    pub fn write_ctrl(&mut self, data: u8) {
        self.ctrl = data;
        self.t.set_nametable(data & 3);
    }

    /// Write OAMADDR ($2003).
    pub fn write_oam_addr(&mut self, data: u8) {
        self.oam_addr = data;
    }

    /// Read OAMDATA ($2004); does not increment.
    pub fn read_oam_data(&mut self) -> u8 {
        self.oam[self.oam_addr as usize]
    }

    /// Write OAMDATA ($2004); writes OAM and increments OAMADDR. Attribute bits 2-4 do not exist.
    pub fn write_oam_data(&mut self, data: u8) {
        let data = if self.oam_addr & 3 == 2 {
            data & 0xE3
        } else {
            data
        };
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// One byte of a $4014 transfer. Goes through $2004, so it starts at OAMADDR.
    pub fn oam_dma_write(&mut self, data: u8) {
        self.write_oam_data(data);
    }

    /// Write PPUSCROLL ($2005): first write = coarse X and fine X, second = coarse Y and fine Y.
    pub fn write_scroll(&mut self, data: u8) {
        if !self.write_toggle {
            self.t.set_coarse_x(data >> 3);
            self.fine_x = data & 7;
        } else {
            self.t.set_coarse_y(data >> 3);
            self.t.set_fine_y(data & 7);
        }
        self.write_toggle = !self.write_toggle;
    }

    /// Write PPUADDR ($2006): high 6 bits then low byte. The second write copies `t` into `v`,
    /// which puts a new address on the PPU bus for the board to see.
    pub fn write_addr(&mut self, cart: &mut Cartridge, data: u8) {
        if !self.write_toggle {
            self.t.set((self.t.get() & 0x00FF) | ((data as u16 & 0x3F) << 8));
        } else {
            self.t.set((self.t.get() & 0xFF00) | data as u16);
            self.v = self.t;
            cart.on_ppu_address(self.v.get() & 0x3FFF);
        }
        self.write_toggle = !self.write_toggle;
    }

    /// Read PPUDATA ($2007). Below the palette the value comes from the internal buffer, which
    /// then refills; palette reads are direct and refill the buffer from the nametable underneath.
    pub fn read_data(&mut self, cart: &mut Cartridge) -> u8 {
        let addr = self.v.get() & 0x3FFF;
        let value = if addr >= 0x3F00 {
            self.read_buffer = self.read_vram(cart, addr - 0x1000);
            self.palette[palette_index(addr)]
        } else {
            let buffered = self.read_buffer;
            self.read_buffer = self.read_vram(cart, addr);
            buffered
        };
        self.increment_vram_addr();
        value
    }

    /// Write PPUDATA ($2007) at `v`, then increment.
    pub fn write_data(&mut self, cart: &mut Cartridge, data: u8) {
        self.write_vram(cart, self.v.get(), data);
        self.increment_vram_addr();
    }

    /// +1 or +32 per PPUCTRL bit 2. While rendering, the access instead bumps coarse X and Y
    /// together.
    fn increment_vram_addr(&mut self) {
        let rendering_line = self.scanline < HEIGHT as u16 || self.scanline == PRE_RENDER_LINE;
        if self.rendering_enabled() && rendering_line {
            self.v.increment_x();
            self.v.increment_y();
        } else {
            let step = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
            self.v.set(self.v.get().wrapping_add(step));
        }
    }
}
