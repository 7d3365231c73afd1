//! 256-entry decode table: every opcode byte maps to an (addressing mode, operation) pair.
//!
//! Covers the 151 documented opcodes and the stable undocumented ones (LAX, SAX, DCP, ISC, SLO,
//! RLA, SRE, RRA, ANC, ALR, ARR, AXS, SBC $EB, multi-byte NOPs). JAM decodes as a 2-cycle implied
//! no-op. The unstable opcodes (XAA, LXA, SHA, SHX, SHY, TAS, LAS) keep their addressing modes so
//! operands are consumed, then act as reads with no effect.
//! See [6502 instructions](https://www.nesdev.org/wiki/Instruction_reference) and
//! [CPU unofficial opcodes](https://www.nesdev.org/wiki/CPU_unofficial_opcodes).

use bincode::{Decode, Encode};

/// How an instruction finds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
    Relative,
    Indirect,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Op {
    // Loads, stores, transfers
    Lda, Ldx, Ldy, Sta, Stx, Sty,
    Tax, Tay, Txa, Tya, Tsx, Txs,
    // Arithmetic and logic
    Adc, Sbc, And, Ora, Eor, Cmp, Cpx, Cpy, Bit,
    Inc, Dec, Inx, Iny, Dex, Dey,
    Asl, Lsr, Rol, Ror,
    // Flags
    Clc, Sec, Cli, Sei, Clv, Cld, Sed,
    // Control flow and stack
    Jmp, Jsr, Rts, Rti, Brk,
    Pha, Php, Pla, Plp,
    Bpl, Bmi, Bvc, Bvs, Bcc, Bcs, Bne, Beq,
    Nop,
    // Stable undocumented
    Lax, Sax, Dcp, Isc, Slo, Rla, Sre, Rra, Anc, Alr, Arr, Axs,
    /// Halts a real 6502; executed here as a no-op.
    Jam,
    /// Unstable undocumented opcode: operand fetched and read, result discarded.
    Unstable,
}

/// Bus behavior of the operation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// One read of the effective address.
    Read,
    /// One write to the effective address.
    Write,
    /// Read, dummy write of the old value, final write.
    ReadModifyWrite,
    /// Registers only, one dummy read of PC.
    Implied,
    /// Own cycle sequence (jumps, stack, branches, BRK).
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Instr {
    pub mode: Mode,
    pub op: Op,
}

impl Instr {
    pub const BRK: Instr = Instr {
        mode: Mode::Implied,
        op: Op::Brk,
    };

    pub fn kind(self) -> Kind {
        use Op::*;
        match self.op {
            Lda | Ldx | Ldy | Adc | Sbc | And | Ora | Eor | Cmp | Cpx | Cpy | Bit | Lax | Anc
            | Alr | Arr | Axs => Kind::Read,
            Nop | Unstable if self.mode != Mode::Implied => Kind::Read,
            Sta | Stx | Sty | Sax => Kind::Write,
            Asl | Lsr | Rol | Ror if self.mode == Mode::Accumulator => Kind::Implied,
            Asl | Lsr | Rol | Ror | Inc | Dec | Dcp | Isc | Slo | Rla | Sre | Rra => {
                Kind::ReadModifyWrite
            }
            Jmp | Jsr | Rts | Rti | Brk | Pha | Php | Pla | Plp | Bpl | Bmi | Bvc | Bvs | Bcc
            | Bcs | Bne | Beq => Kind::Control,
            _ => Kind::Implied,
        }
    }

    /// Writes and read-modify-writes pay the indexed-mode fixup cycle even without a page cross.
    pub fn always_penalty(self) -> bool {
        matches!(self.kind(), Kind::Write | Kind::ReadModifyWrite)
    }
}

const fn i(mode: Mode, op: Op) -> Instr {
    Instr { mode, op }
}

const fn decode(opcode: u8) -> Instr {
    use Mode::*;
    use Op::*;
    match opcode {
        0x00 => i(Implied, Brk),
        0x01 => i(IndirectX, Ora),
        0x05 => i(ZeroPage, Ora),
        0x06 => i(ZeroPage, Asl),
        0x08 => i(Implied, Php),
        0x09 => i(Immediate, Ora),
        0x0A => i(Accumulator, Asl),
        0x0D => i(Absolute, Ora),
        0x0E => i(Absolute, Asl),
        0x10 => i(Relative, Bpl),
        0x11 => i(IndirectY, Ora),
        0x15 => i(ZeroPageX, Ora),
        0x16 => i(ZeroPageX, Asl),
        0x18 => i(Implied, Clc),
        0x19 => i(AbsoluteY, Ora),
        0x1D => i(AbsoluteX, Ora),
        0x1E => i(AbsoluteX, Asl),
        0x20 => i(Absolute, Jsr),
        0x21 => i(IndirectX, And),
        0x24 => i(ZeroPage, Bit),
        0x25 => i(ZeroPage, And),
        0x26 => i(ZeroPage, Rol),
        0x28 => i(Implied, Plp),
        0x29 => i(Immediate, And),
        0x2A => i(Accumulator, Rol),
        0x2C => i(Absolute, Bit),
        0x2D => i(Absolute, And),
        0x2E => i(Absolute, Rol),
        0x30 => i(Relative, Bmi),
        0x31 => i(IndirectY, And),
        0x35 => i(ZeroPageX, And),
        0x36 => i(ZeroPageX, Rol),
        0x38 => i(Implied, Sec),
        0x39 => i(AbsoluteY, And),
        0x3D => i(AbsoluteX, And),
        0x3E => i(AbsoluteX, Rol),
        0x40 => i(Implied, Rti),
        0x41 => i(IndirectX, Eor),
        0x45 => i(ZeroPage, Eor),
        0x46 => i(ZeroPage, Lsr),
        0x48 => i(Implied, Pha),
        0x49 => i(Immediate, Eor),
        0x4A => i(Accumulator, Lsr),
        0x4C => i(Absolute, Jmp),
        0x4D => i(Absolute, Eor),
        0x4E => i(Absolute, Lsr),
        0x50 => i(Relative, Bvc),
        0x51 => i(IndirectY, Eor),
        0x55 => i(ZeroPageX, Eor),
        0x56 => i(ZeroPageX, Lsr),
        0x58 => i(Implied, Cli),
        0x59 => i(AbsoluteY, Eor),
        0x5D => i(AbsoluteX, Eor),
        0x5E => i(AbsoluteX, Lsr),
        0x60 => i(Implied, Rts),
        0x61 => i(IndirectX, Adc),
        0x65 => i(ZeroPage, Adc),
        0x66 => i(ZeroPage, Ror),
        0x68 => i(Implied, Pla),
        0x69 => i(Immediate, Adc),
        0x6A => i(Accumulator, Ror),
        0x6C => i(Indirect, Jmp),
        0x6D => i(Absolute, Adc),
        0x6E => i(Absolute, Ror),
        0x70 => i(Relative, Bvs),
        0x71 => i(IndirectY, Adc),
        0x75 => i(ZeroPageX, Adc),
        0x76 => i(ZeroPageX, Ror),
        0x78 => i(Implied, Sei),
        0x79 => i(AbsoluteY, Adc),
        0x7D => i(AbsoluteX, Adc),
        0x7E => i(AbsoluteX, Ror),
        0x81 => i(IndirectX, Sta),
        0x84 => i(ZeroPage, Sty),
        0x85 => i(ZeroPage, Sta),
        0x86 => i(ZeroPage, Stx),
        0x88 => i(Implied, Dey),
        0x8A => i(Implied, Txa),
        0x8C => i(Absolute, Sty),
        0x8D => i(Absolute, Sta),
        0x8E => i(Absolute, Stx),
        0x90 => i(Relative, Bcc),
        0x91 => i(IndirectY, Sta),
        0x94 => i(ZeroPageX, Sty),
        0x95 => i(ZeroPageX, Sta),
        0x96 => i(ZeroPageY, Stx),
        0x98 => i(Implied, Tya),
        0x99 => i(AbsoluteY, Sta),
        0x9A => i(Implied, Txs),
        0x9D => i(AbsoluteX, Sta),
        0xA0 => i(Immediate, Ldy),
        0xA1 => i(IndirectX, Lda),
        0xA2 => i(Immediate, Ldx),
        0xA4 => i(ZeroPage, Ldy),
        0xA5 => i(ZeroPage, Lda),
        0xA6 => i(ZeroPage, Ldx),
        0xA8 => i(Implied, Tay),
        0xA9 => i(Immediate, Lda),
        0xAA => i(Implied, Tax),
        0xAC => i(Absolute, Ldy),
        0xAD => i(Absolute, Lda),
        0xAE => i(Absolute, Ldx),
        0xB0 => i(Relative, Bcs),
        0xB1 => i(IndirectY, Lda),
        0xB4 => i(ZeroPageX, Ldy),
        0xB5 => i(ZeroPageX, Lda),
        0xB6 => i(ZeroPageY, Ldx),
        0xB8 => i(Implied, Clv),
        0xB9 => i(AbsoluteY, Lda),
        0xBA => i(Implied, Tsx),
        0xBC => i(AbsoluteX, Ldy),
        0xBD => i(AbsoluteX, Lda),
        0xBE => i(AbsoluteY, Ldx),
        0xC0 => i(Immediate, Cpy),
        0xC1 => i(IndirectX, Cmp),
        0xC4 => i(ZeroPage, Cpy),
        0xC5 => i(ZeroPage, Cmp),
        0xC6 => i(ZeroPage, Dec),
        0xC8 => i(Implied, Iny),
        0xC9 => i(Immediate, Cmp),
        0xCA => i(Implied, Dex),
        0xCC => i(Absolute, Cpy),
        0xCD => i(Absolute, Cmp),
        0xCE => i(Absolute, Dec),
        0xD0 => i(Relative, Bne),
        0xD1 => i(IndirectY, Cmp),
        0xD5 => i(ZeroPageX, Cmp),
        0xD6 => i(ZeroPageX, Dec),
        0xD8 => i(Implied, Cld),
        0xD9 => i(AbsoluteY, Cmp),
        0xDD => i(AbsoluteX, Cmp),
        0xDE => i(AbsoluteX, Dec),
        0xE0 => i(Immediate, Cpx),
        0xE1 => i(IndirectX, Sbc),
        0xE4 => i(ZeroPage, Cpx),
        0xE5 => i(ZeroPage, Sbc),
        0xE6 => i(ZeroPage, Inc),
        0xE8 => i(Implied, Inx),
        0xE9 | 0xEB => i(Immediate, Sbc),
        0xEA => i(Implied, Nop),
        0xEC => i(Absolute, Cpx),
        0xED => i(Absolute, Sbc),
        0xEE => i(Absolute, Inc),
        0xF0 => i(Relative, Beq),
        0xF1 => i(IndirectY, Sbc),
        0xF5 => i(ZeroPageX, Sbc),
        0xF6 => i(ZeroPageX, Inc),
        0xF8 => i(Implied, Sed),
        0xF9 => i(AbsoluteY, Sbc),
        0xFD => i(AbsoluteX, Sbc),
        0xFE => i(AbsoluteX, Inc),

        // Multi-byte NOPs
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => i(Implied, Nop),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => i(Immediate, Nop),
        0x04 | 0x44 | 0x64 => i(ZeroPage, Nop),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => i(ZeroPageX, Nop),
        0x0C => i(Absolute, Nop),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => i(AbsoluteX, Nop),

        0xA7 => i(ZeroPage, Lax),
        0xB7 => i(ZeroPageY, Lax),
        0xAF => i(Absolute, Lax),
        0xBF => i(AbsoluteY, Lax),
        0xA3 => i(IndirectX, Lax),
        0xB3 => i(IndirectY, Lax),

        0x87 => i(ZeroPage, Sax),
        0x97 => i(ZeroPageY, Sax),
        0x8F => i(Absolute, Sax),
        0x83 => i(IndirectX, Sax),

        0xC7 => i(ZeroPage, Dcp),
        0xD7 => i(ZeroPageX, Dcp),
        0xCF => i(Absolute, Dcp),
        0xDF => i(AbsoluteX, Dcp),
        0xDB => i(AbsoluteY, Dcp),
        0xC3 => i(IndirectX, Dcp),
        0xD3 => i(IndirectY, Dcp),

        0xE7 => i(ZeroPage, Isc),
        0xF7 => i(ZeroPageX, Isc),
        0xEF => i(Absolute, Isc),
        0xFF => i(AbsoluteX, Isc),
        0xFB => i(AbsoluteY, Isc),
        0xE3 => i(IndirectX, Isc),
        0xF3 => i(IndirectY, Isc),

        0x07 => i(ZeroPage, Slo),
        0x17 => i(ZeroPageX, Slo),
        0x0F => i(Absolute, Slo),
        0x1F => i(AbsoluteX, Slo),
        0x1B => i(AbsoluteY, Slo),
        0x03 => i(IndirectX, Slo),
        0x13 => i(IndirectY, Slo),

        0x27 => i(ZeroPage, Rla),
        0x37 => i(ZeroPageX, Rla),
        0x2F => i(Absolute, Rla),
        0x3F => i(AbsoluteX, Rla),
        0x3B => i(AbsoluteY, Rla),
        0x23 => i(IndirectX, Rla),
        0x33 => i(IndirectY, Rla),

        0x47 => i(ZeroPage, Sre),
        0x57 => i(ZeroPageX, Sre),
        0x4F => i(Absolute, Sre),
        0x5F => i(AbsoluteX, Sre),
        0x5B => i(AbsoluteY, Sre),
        0x43 => i(IndirectX, Sre),
        0x53 => i(IndirectY, Sre),

        0x67 => i(ZeroPage, Rra),
        0x77 => i(ZeroPageX, Rra),
        0x6F => i(Absolute, Rra),
        0x7F => i(AbsoluteX, Rra),
        0x7B => i(AbsoluteY, Rra),
        0x63 => i(IndirectX, Rra),
        0x73 => i(IndirectY, Rra),

        0x0B | 0x2B => i(Immediate, Anc),
        0x4B => i(Immediate, Alr),
        0x6B => i(Immediate, Arr),
        0xCB => i(Immediate, Axs),

        // XAA, LXA
        0x8B | 0xAB => i(Immediate, Unstable),
        // SHA
        0x93 => i(IndirectY, Unstable),
        // TAS, SHX, SHA, LAS
        0x9B | 0x9E | 0x9F | 0xBB => i(AbsoluteY, Unstable),
        // SHY
        0x9C => i(AbsoluteX, Unstable),

        // $02, $12, $22, $32, $42, $52, $62, $72, $92, $B2, $D2, $F2
        _ => i(Implied, Jam),
    }
}

const fn build() -> [Instr; 256] {
    let mut table = [Instr::BRK; 256];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = decode(opcode as u8);
        opcode += 1;
    }
    table
}

/// Decode table indexed by opcode byte.
pub static OPCODE_TABLE: [Instr; 256] = build();
