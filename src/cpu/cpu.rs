//! Cycle-stepped 6502 engine.
//!
//! [`CPU::clock`] performs exactly one bus cycle. An instruction is the composition of two small
//! state machines: the addressing mode computes the effective address (including the dummy reads
//! of indexed and indirect modes), then the operation reads, writes or read-modify-writes it.
//! When the addressing machine finishes without touching the bus, the operation starts in the
//! same cycle. Jumps, stack ops, branches, BRK and interrupt entry run their own sequences.

use bincode::{Decode, Encode};

use crate::{
    bus::Bus,
    cpu::{
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
            FLAG_OVERFLOW, FLAG_UNUSED, FLAG_ZERO,
        },
        opcodes::{Instr, Kind, Mode, OPCODE_TABLE, Op},
    },
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const STACK_BASE: u16 = 0x0100;

/// Hardware interrupt being serviced through the BRK sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Interrupt {
    Nmi,
    Irq,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CPU {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    /// Total cycles consumed since power-on, DMA stalls included.
    pub cycles: u64,

    opcode: u8,
    instr: Instr,
    addr_step: u8,
    op_step: u8,
    addressing_done: bool,
    instruction_done: bool,
    /// Effective address.
    addr: u16,
    /// Zero-page pointer of the indirect modes.
    ptr: u8,
    /// Operand latch.
    data: u8,
    page_crossed: bool,
    interrupt: Option<Interrupt>,

    nmi_line: bool,
    nmi_pending: bool,
    irq_line: bool,
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl CPU {
    /// Registers zeroed, status $20; call [`CPU::reset`] to fetch the reset vector.
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: FLAG_UNUSED,
            cycles: 0,
            opcode: 0,
            instr: Instr::BRK,
            addr_step: 0,
            op_step: 0,
            addressing_done: false,
            instruction_done: true,
            addr: 0,
            ptr: 0,
            data: 0,
            page_crossed: false,
            interrupt: None,
            nmi_line: false,
            nmi_pending: false,
            irq_line: false,
        }
    }

    /// Cold boot: clear every register, then run the reset sequence.
    pub fn power_on<B: Bus>(&mut self, bus: &mut B) {
        *self = Self::new();
        self.reset(bus);
    }

    /// Reset line: PC from $FFFC/$FFFD, A/X/Y cleared, P $24, and SP $FD (three suppressed pushes
    /// from $00).
    /// Costs 7 cycles, which the caller's PPU does not see.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        let lo = bus.read(RESET_VECTOR) as u16;
        let hi = bus.read(RESET_VECTOR.wrapping_add(1)) as u16;

        self.pc = (hi << 8) | lo;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0x00u8.wrapping_sub(3);
        self.status = FLAG_INTERRUPT_DISABLE | FLAG_UNUSED;

        self.instruction_done = true;
        self.interrupt = None;
        self.nmi_pending = false;
        self.cycles += 7;
    }

    /// Level of the NMI input. A low-to-high transition latches a pending NMI.
    pub fn set_nmi_line(&mut self, level: bool) {
        if level && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = level;
    }

    /// Level of the IRQ input; serviced while high and the I flag is clear.
    pub fn set_irq_line(&mut self, level: bool) {
        self.irq_line = level;
    }

    /// True between instructions.
    pub fn at_instruction_boundary(&self) -> bool {
        self.instruction_done
    }

    /// Side-effect free read through the bus.
    pub fn peek<B: Bus>(&self, bus: &B, addr: u16) -> u8 {
        bus.peek(addr)
    }

    /// Advance one CPU cycle. Returns the cycles consumed: 1, plus any DMA stall the bus reports.
    pub fn clock<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.instruction_done {
            self.begin(bus);
        } else if self.interrupt.is_some() || self.instr.kind() == Kind::Control {
            self.instruction_done = self.step_control(bus);
        } else {
            if !self.addressing_done {
                self.addressing_done = self.step_addressing(bus);
            }
            if self.addressing_done {
                self.instruction_done = self.step_operation(bus);
            }
        }

        let consumed = 1 + bus.tick();
        self.cycles += consumed as u64;
        consumed
    }

    /// Run clocks until the current instruction (or interrupt entry) completes.
    /// Returns the cycles consumed.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let mut total = self.clock(bus);
        while !self.instruction_done {
            total += self.clock(bus);
        }
        total
    }

    /// First cycle: poll interrupts (NMI before IRQ), otherwise fetch the opcode.
    fn begin<B: Bus>(&mut self, bus: &mut B) {
        self.addr_step = 0;
        self.op_step = 0;
        self.addressing_done = false;
        self.instruction_done = false;
        self.page_crossed = false;

        let interrupt = if self.nmi_pending {
            self.nmi_pending = false;
            Some(Interrupt::Nmi)
        } else if self.irq_line && self.status & FLAG_INTERRUPT_DISABLE == 0 {
            Some(Interrupt::Irq)
        } else {
            None
        };

        self.interrupt = interrupt;
        if interrupt.is_some() {
            // Opcode fetch is replaced by a dummy read; PC does not advance.
            bus.read(self.pc);
            self.opcode = 0x00;
            self.instr = Instr::BRK;
            return;
        }

        if log::log_enabled!(log::Level::Trace) {
            self.trace(bus);
        }
        self.opcode = self.fetch(bus);
        self.instr = OPCODE_TABLE[self.opcode as usize];
    }

    fn trace<B: Bus>(&self, bus: &B) {
        let op = OPCODE_TABLE[bus.peek(self.pc) as usize];
        log::trace!(
            "{:04X}  {:?} {:?}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            op.op,
            op.mode,
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            self.cycles
        );
    }

    fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn push<B: Bus>(&mut self, bus: &mut B, data: u8) {
        bus.write(STACK_BASE | self.sp as u16, data);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        bus.read(STACK_BASE | self.sp as u16)
    }

    /// One cycle of effective-address computation. Returns true once the address is ready;
    /// a step that returns true does not touch the bus.
    fn step_addressing<B: Bus>(&mut self, bus: &mut B) -> bool {
        let step = self.addr_step;
        self.addr_step += 1;

        match self.instr.mode {
            Mode::Implied | Mode::Accumulator | Mode::Relative | Mode::Indirect => true,
            Mode::Immediate => {
                self.addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                true
            }
            Mode::ZeroPage => match step {
                0 => {
                    self.addr = self.fetch(bus) as u16;
                    false
                }
                _ => true,
            },
            Mode::ZeroPageX | Mode::ZeroPageY => match step {
                0 => {
                    self.addr = self.fetch(bus) as u16;
                    false
                }
                1 => {
                    bus.read(self.addr);
                    let index = if self.instr.mode == Mode::ZeroPageX {
                        self.x
                    } else {
                        self.y
                    };
                    self.addr = (self.addr as u8).wrapping_add(index) as u16;
                    false
                }
                _ => true,
            },
            Mode::Absolute => match step {
                0 => {
                    self.addr = self.fetch(bus) as u16;
                    false
                }
                1 => {
                    self.addr |= (self.fetch(bus) as u16) << 8;
                    false
                }
                _ => true,
            },
            Mode::AbsoluteX | Mode::AbsoluteY => match step {
                0 => {
                    self.addr = self.fetch(bus) as u16;
                    false
                }
                1 => {
                    let base = self.addr | (self.fetch(bus) as u16) << 8;
                    let index = if self.instr.mode == Mode::AbsoluteX {
                        self.x
                    } else {
                        self.y
                    };
                    self.index(base, index);
                    false
                }
                2 => self.fixup(bus),
                _ => true,
            },
            Mode::IndirectX => match step {
                0 => {
                    self.ptr = self.fetch(bus);
                    false
                }
                1 => {
                    bus.read(self.ptr as u16);
                    self.ptr = self.ptr.wrapping_add(self.x);
                    false
                }
                2 => {
                    self.addr = bus.read(self.ptr as u16) as u16;
                    false
                }
                3 => {
                    self.addr |= (bus.read(self.ptr.wrapping_add(1) as u16) as u16) << 8;
                    false
                }
                _ => true,
            },
            Mode::IndirectY => match step {
                0 => {
                    self.ptr = self.fetch(bus);
                    false
                }
                1 => {
                    self.addr = bus.read(self.ptr as u16) as u16;
                    false
                }
                2 => {
                    let hi = bus.read(self.ptr.wrapping_add(1) as u16) as u16;
                    self.index(hi << 8 | self.addr, self.y);
                    false
                }
                3 => self.fixup(bus),
                _ => true,
            },
        }
    }

    fn index(&mut self, base: u16, index: u8) {
        self.addr = base.wrapping_add(index as u16);
        self.page_crossed = (base ^ self.addr) & 0xFF00 != 0;
    }

    /// Indexed-mode extra cycle: a dummy read at the address before the high-byte carry.
    /// Skipped (returning true) for reads that did not cross a page.
    fn fixup<B: Bus>(&mut self, bus: &mut B) -> bool {
        if !self.page_crossed && !self.instr.always_penalty() {
            return true;
        }
        let uncarried = if self.page_crossed {
            self.addr.wrapping_sub(0x100)
        } else {
            self.addr
        };
        bus.read(uncarried);
        false
    }

    /// One cycle of the operation proper. Returns true when the instruction is complete.
    fn step_operation<B: Bus>(&mut self, bus: &mut B) -> bool {
        let step = self.op_step;
        self.op_step += 1;

        match self.instr.kind() {
            Kind::Read => {
                let value = bus.read(self.addr);
                self.execute_read(value);
                true
            }
            Kind::Write => {
                let value = match self.instr.op {
                    Op::Stx => self.x,
                    Op::Sty => self.y,
                    Op::Sax => self.a & self.x,
                    _ => self.a,
                };
                bus.write(self.addr, value);
                true
            }
            Kind::ReadModifyWrite => match step {
                0 => {
                    self.data = bus.read(self.addr);
                    false
                }
                1 => {
                    bus.write(self.addr, self.data);
                    self.data = self.modify(self.data);
                    false
                }
                _ => {
                    bus.write(self.addr, self.data);
                    self.after_modify(self.data);
                    true
                }
            },
            Kind::Implied | Kind::Control => {
                bus.read(self.pc);
                self.execute_implied();
                true
            }
        }
    }

    /// Cycle 2 onwards of jumps, stack ops, branches and the BRK/interrupt sequence.
    fn step_control<B: Bus>(&mut self, bus: &mut B) -> bool {
        let step = self.op_step;
        self.op_step += 1;

        match self.instr.op {
            Op::Brk => self.step_break(bus, step),
            Op::Jmp if self.instr.mode == Mode::Absolute => match step {
                0 => {
                    self.addr = self.fetch(bus) as u16;
                    false
                }
                _ => {
                    let hi = bus.read(self.pc) as u16;
                    self.pc = hi << 8 | self.addr;
                    true
                }
            },
            Op::Jmp => match step {
                0 => {
                    self.addr = self.fetch(bus) as u16;
                    false
                }
                1 => {
                    self.addr |= (self.fetch(bus) as u16) << 8;
                    false
                }
                2 => {
                    self.data = bus.read(self.addr);
                    false
                }
                _ => {
                    // The pointer's high byte never carries into the next page.
                    let hi_addr = (self.addr & 0xFF00) | (self.addr.wrapping_add(1) & 0x00FF);
                    let hi = bus.read(hi_addr) as u16;
                    self.pc = hi << 8 | self.data as u16;
                    true
                }
            },
            Op::Jsr => match step {
                0 => {
                    self.data = self.fetch(bus);
                    false
                }
                1 => {
                    bus.read(STACK_BASE | self.sp as u16);
                    false
                }
                2 => {
                    self.push(bus, (self.pc >> 8) as u8);
                    false
                }
                3 => {
                    self.push(bus, self.pc as u8);
                    false
                }
                _ => {
                    let hi = bus.read(self.pc) as u16;
                    self.pc = hi << 8 | self.data as u16;
                    true
                }
            },
            Op::Rts => match step {
                0 => {
                    bus.read(self.pc);
                    false
                }
                1 => {
                    bus.read(STACK_BASE | self.sp as u16);
                    self.sp = self.sp.wrapping_add(1);
                    false
                }
                2 => {
                    self.data = self.pull(bus);
                    self.sp = self.sp.wrapping_add(1);
                    false
                }
                3 => {
                    let hi = self.pull(bus) as u16;
                    self.pc = hi << 8 | self.data as u16;
                    false
                }
                _ => {
                    bus.read(self.pc);
                    self.pc = self.pc.wrapping_add(1);
                    true
                }
            },
            Op::Rti => match step {
                0 => {
                    bus.read(self.pc);
                    false
                }
                1 => {
                    bus.read(STACK_BASE | self.sp as u16);
                    self.sp = self.sp.wrapping_add(1);
                    false
                }
                2 => {
                    let p = self.pull(bus);
                    self.set_status_from_stack(p);
                    self.sp = self.sp.wrapping_add(1);
                    false
                }
                3 => {
                    self.data = self.pull(bus);
                    self.sp = self.sp.wrapping_add(1);
                    false
                }
                _ => {
                    let hi = self.pull(bus) as u16;
                    self.pc = hi << 8 | self.data as u16;
                    true
                }
            },
            Op::Pha | Op::Php => match step {
                0 => {
                    bus.read(self.pc);
                    false
                }
                _ => {
                    let value = if self.instr.op == Op::Pha {
                        self.a
                    } else {
                        self.status | FLAG_BREAK | FLAG_UNUSED
                    };
                    self.push(bus, value);
                    true
                }
            },
            Op::Pla | Op::Plp => match step {
                0 => {
                    bus.read(self.pc);
                    false
                }
                1 => {
                    bus.read(STACK_BASE | self.sp as u16);
                    self.sp = self.sp.wrapping_add(1);
                    false
                }
                _ => {
                    let value = self.pull(bus);
                    if self.instr.op == Op::Pla {
                        self.a = value;
                        self.update_zero_and_negative_flags(value);
                    } else {
                        self.set_status_from_stack(value);
                    }
                    true
                }
            },
            _ => self.step_branch(bus, step),
        }
    }

    /// BRK and hardware interrupts: 7 cycles including the opcode (or dummy) fetch.
    fn step_break<B: Bus>(&mut self, bus: &mut B, step: u8) -> bool {
        match step {
            0 => {
                // BRK skips its padding byte; an interrupt re-reads PC without advancing.
                bus.read(self.pc);
                if self.interrupt.is_none() {
                    self.pc = self.pc.wrapping_add(1);
                }
                false
            }
            1 => {
                self.push(bus, (self.pc >> 8) as u8);
                false
            }
            2 => {
                self.push(bus, self.pc as u8);
                false
            }
            3 => {
                let brk = if self.interrupt.is_none() { FLAG_BREAK } else { 0 };
                self.push(bus, (self.status & !FLAG_BREAK) | brk | FLAG_UNUSED);
                self.status |= FLAG_INTERRUPT_DISABLE;
                // An NMI arriving by now takes over the vector fetch.
                self.addr = if self.interrupt == Some(Interrupt::Nmi) || self.nmi_pending {
                    self.nmi_pending = false;
                    NMI_VECTOR
                } else {
                    IRQ_VECTOR
                };
                false
            }
            4 => {
                self.data = bus.read(self.addr);
                false
            }
            _ => {
                let hi = bus.read(self.addr.wrapping_add(1)) as u16;
                self.pc = hi << 8 | self.data as u16;
                self.interrupt = None;
                true
            }
        }
    }

    /// Branches: 2 cycles not taken, 3 taken, 4 taken across a page.
    fn step_branch<B: Bus>(&mut self, bus: &mut B, step: u8) -> bool {
        match step {
            0 => {
                self.data = self.fetch(bus);
                !self.branch_taken()
            }
            1 => {
                bus.read(self.pc);
                let target = self.pc.wrapping_add(self.data as i8 as u16);
                self.page_crossed = (target ^ self.pc) & 0xFF00 != 0;
                if self.page_crossed {
                    self.addr = target;
                    self.pc = (self.pc & 0xFF00) | (target & 0x00FF);
                    false
                } else {
                    self.pc = target;
                    true
                }
            }
            _ => {
                bus.read(self.pc);
                self.pc = self.addr;
                true
            }
        }
    }

    fn branch_taken(&self) -> bool {
        let set = |flag: u8| self.status & flag != 0;
        match self.instr.op {
            Op::Bpl => !set(FLAG_NEGATIVE),
            Op::Bmi => set(FLAG_NEGATIVE),
            Op::Bvc => !set(FLAG_OVERFLOW),
            Op::Bvs => set(FLAG_OVERFLOW),
            Op::Bcc => !set(FLAG_CARRY),
            Op::Bcs => set(FLAG_CARRY),
            Op::Bne => !set(FLAG_ZERO),
            Op::Beq => set(FLAG_ZERO),
            _ => false,
        }
    }

    fn execute_read(&mut self, value: u8) {
        match self.instr.op {
            Op::Lda => {
                self.a = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::Ldx => {
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::Ldy => {
                self.y = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::Lax => {
                self.a = value;
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::Adc => self.add_with_carry(value),
            Op::Sbc => self.add_with_carry(!value),
            Op::And => {
                self.a &= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Ora => {
                self.a |= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Eor => {
                self.a ^= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Cmp => self.compare(self.a, value),
            Op::Cpx => self.compare(self.x, value),
            Op::Cpy => self.compare(self.y, value),
            Op::Bit => {
                self.set_flag(FLAG_ZERO, self.a & value == 0);
                self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
                self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
            }
            Op::Anc => {
                self.a &= value;
                self.update_zero_and_negative_flags(self.a);
                self.set_flag(FLAG_CARRY, self.a & 0x80 != 0);
            }
            Op::Alr => {
                self.a &= value;
                self.set_flag(FLAG_CARRY, self.a & 1 != 0);
                self.a >>= 1;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Arr => {
                let carry_in = if self.status & FLAG_CARRY != 0 { 0x80 } else { 0 };
                self.a = ((self.a & value) >> 1) | carry_in;
                self.update_zero_and_negative_flags(self.a);
                let bit6 = self.a & 0x40 != 0;
                let bit5 = self.a & 0x20 != 0;
                self.set_flag(FLAG_CARRY, bit6);
                self.set_flag(FLAG_OVERFLOW, bit6 ^ bit5);
            }
            Op::Axs => {
                let ax = self.a & self.x;
                self.set_flag(FLAG_CARRY, ax >= value);
                self.x = ax.wrapping_sub(value);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Unstable => {
                log::trace!("unstable opcode ${:02X} ignored its operand", self.opcode);
            }
            // NOP reads: the access is all there is.
            _ => {}
        }
    }

    /// New memory value of a read-modify-write op.
    fn modify(&mut self, value: u8) -> u8 {
        match self.instr.op {
            Op::Asl | Op::Slo => self.shift_left(value, false),
            Op::Rol | Op::Rla => self.shift_left(value, true),
            Op::Lsr | Op::Sre => self.shift_right(value, false),
            Op::Ror | Op::Rra => self.shift_right(value, true),
            Op::Inc | Op::Isc => value.wrapping_add(1),
            Op::Dec | Op::Dcp => value.wrapping_sub(1),
            _ => value,
        }
    }

    /// Flag updates and the combined accumulator op of the undocumented RMW instructions.
    fn after_modify(&mut self, value: u8) {
        match self.instr.op {
            Op::Asl | Op::Rol | Op::Lsr | Op::Ror | Op::Inc | Op::Dec => {
                self.update_zero_and_negative_flags(value)
            }
            Op::Slo => {
                self.a |= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Rla => {
                self.a &= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Sre => {
                self.a ^= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Rra => self.add_with_carry(value),
            Op::Dcp => self.compare(self.a, value),
            Op::Isc => self.add_with_carry(!value),
            _ => {}
        }
    }

    fn execute_implied(&mut self) {
        match self.instr.op {
            Op::Asl | Op::Rol | Op::Lsr | Op::Ror => {
                self.a = self.modify(self.a);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Tax => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Txa => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Tya => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Txs => self.sp = self.x,
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Clc => self.set_flag(FLAG_CARRY, false),
            Op::Sec => self.set_flag(FLAG_CARRY, true),
            Op::Cli => self.set_flag(FLAG_INTERRUPT_DISABLE, false),
            Op::Sei => self.set_flag(FLAG_INTERRUPT_DISABLE, true),
            Op::Clv => self.set_flag(FLAG_OVERFLOW, false),
            Op::Cld => self.set_flag(FLAG_DECIMAL, false),
            Op::Sed => self.set_flag(FLAG_DECIMAL, true),
            Op::Jam => {
                log::trace!(
                    "opcode ${:02X} at ${:04X} executed as NOP",
                    self.opcode,
                    self.pc.wrapping_sub(1)
                );
            }
            _ => {}
        }
    }

    /// Binary-mode ADC; SBC passes the operand inverted. Decimal mode does not exist on the 2A03.
    fn add_with_carry(&mut self, value: u8) {
        let carry = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.set_flag(FLAG_OVERFLOW, (self.a ^ result) & (value ^ result) & 0x80 != 0);
        self.a = result;
        self.update_zero_and_negative_flags(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn shift_left(&mut self, value: u8, rotate: bool) -> u8 {
        let carry_in = if rotate { self.status & FLAG_CARRY } else { 0 };
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        (value << 1) | carry_in
    }

    fn shift_right(&mut self, value: u8, rotate: bool) -> u8 {
        let carry_in = if rotate && self.status & FLAG_CARRY != 0 { 0x80 } else { 0 };
        self.set_flag(FLAG_CARRY, value & 1 != 0);
        (value >> 1) | carry_in
    }

    /// B does not exist in the register; U always reads 1.
    fn set_status_from_stack(&mut self, value: u8) {
        self.status = (value & !FLAG_BREAK) | FLAG_UNUSED;
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }
}
