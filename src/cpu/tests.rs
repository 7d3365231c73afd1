use crate::{
    bus::Bus,
    cpu::{
        cpu::CPU,
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
            FLAG_UNUSED, FLAG_ZERO,
        },
    },
};

struct TestBus {
    mem: [u8; 65536],
    writes: Vec<(u16, u8)>,
    /// Stall reported by the next tick after a write to this address.
    dma_trigger: Option<u16>,
    pending_stall: u32,
}

impl TestBus {
    fn new() -> Self {
        Self {
            mem: [0; 65536],
            writes: Vec::new(),
            dma_trigger: None,
            pending_stall: 0,
        }
    }

    /// Program at `origin` with the reset vector pointing at it.
    fn with_program(origin: u16, program: &[u8]) -> Self {
        let mut bus = Self::new();
        bus.load(origin, program);
        bus.mem[0xFFFC] = origin as u8;
        bus.mem[0xFFFD] = (origin >> 8) as u8;
        bus
    }

    fn load(&mut self, origin: u16, bytes: &[u8]) {
        let start = origin as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
        self.writes.push((addr, data));
        if self.dma_trigger == Some(addr) {
            self.pending_stall = 513;
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn tick(&mut self) -> u32 {
        std::mem::take(&mut self.pending_stall)
    }
}

fn new_cpu(bus: &mut TestBus) -> CPU {
    let mut cpu = CPU::new();
    cpu.reset(bus);
    cpu
}

/// Cycles taken by the first instruction at $8000 after `setup`.
fn cycles_of(program: &[u8], setup: impl FnOnce(&mut CPU, &mut TestBus)) -> u32 {
    cycles_at(0x8000, program, setup)
}

fn cycles_at(origin: u16, program: &[u8], setup: impl FnOnce(&mut CPU, &mut TestBus)) -> u32 {
    let mut bus = TestBus::with_program(origin, program);
    let mut cpu = new_cpu(&mut bus);
    setup(&mut cpu, &mut bus);
    cpu.step(&mut bus)
}

#[test]
fn lda_immediate_loads_value() {
    let mut bus = TestBus::with_program(0x8000, &[0xA9, 0x42]); // LDA #$42
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus);

    assert_eq!(cpu.a, 0x42)
}

#[test]
fn lda_sets_zero_flag() {
    let mut bus = TestBus::with_program(0x8000, &[0xA9, 0x00]); // LDA #$00
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus);
    assert!(cpu.status & FLAG_ZERO != 0)
}

#[test]
fn lda_sets_negative_flag() {
    let mut bus = TestBus::with_program(0x8000, &[0xA9, 0x80]); // LDA #$80
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // LDA

    assert!(cpu.status & FLAG_NEGATIVE != 0)
}

#[test]
fn tax_transfers_a_to_x() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xA9, 0x10, // LDA #$10
            0xAA, // TAX
        ],
    );
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // LDA
    cpu.step(&mut bus); // TAX

    assert_eq!(cpu.x, 0x10)
}

#[test]
fn sta_writes_to_memory() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xA9, 0x33, // LDA #$33
            0x8D, 0x00, 0x02, // STA $0200
        ],
    );
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // LDA
    cpu.step(&mut bus); // STA

    assert_eq!(bus.mem[0x0200], 0x33);
}

#[test]
fn jmp_changes_program_counter() {
    let mut bus = TestBus::with_program(0x8000, &[0x4C, 0x00, 0x90]); // JMP $9000
    bus.load(0x9000, &[0xA9, 0x55]); // LDA #$55
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // JMP
    cpu.step(&mut bus); // LDA

    assert_eq!(cpu.a, 0x55);
}

#[test]
fn jmp_indirect_wraps_within_page() {
    let mut bus = TestBus::with_program(0x8000, &[0x6C, 0xFF, 0x02]); // JMP ($02FF)
    bus.mem[0x02FF] = 0x34;
    bus.mem[0x0200] = 0x12;
    bus.mem[0x0300] = 0x99;
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn inx_increments_x() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xA2, 0x01, // LDX #$01
            0xE8, // INX
        ],
    );
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // LDX
    cpu.step(&mut bus); // INX

    assert_eq!(cpu.x, 0x02);
}

#[test]
fn dex_sets_zero_flag() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xA2, 0x01, // LDX #$01
            0xCA, // DEX
        ],
    );
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // LDX
    cpu.step(&mut bus); // DEX

    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn bne_loops_until_zero() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xA2, 0x03, // LDX #3
            0xCA, // DEX
            0xD0, 0xFD, // BNE -3
        ],
    );
    let mut cpu = new_cpu(&mut bus);

    for _ in 0..7 {
        cpu.step(&mut bus);
    }

    assert_eq!(cpu.x, 0x00);
    assert_eq!(cpu.pc, 0x8005);
}

#[test]
fn jsr_and_rts_work() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0x20, 0x00, 0x90, // JSR $9000
            0xA9, 0x11, // LDA #$11
        ],
    );
    bus.load(
        0x9000,
        &[
            0xA9, 0x22, // LDA #$22
            0x60, // RTS
        ],
    );
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus); // JSR
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x02);
    cpu.step(&mut bus); // LDA #$22
    cpu.step(&mut bus); // RTS
    cpu.step(&mut bus); // LDA #$11

    assert_eq!(cpu.a, 0x11);
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn brk_jumps_to_irq_vector() {
    let mut bus = TestBus::with_program(0x8000, &[0x00]); // BRK
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;
    let mut cpu = new_cpu(&mut bus);
    let status = cpu.status;

    assert_eq!(cpu.step(&mut bus), 7);

    assert_eq!(cpu.pc, 0x9000);
    // Return address skips the padding byte; pushed P has B and U set.
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x02);
    assert_eq!(bus.mem[0x01FB], status | FLAG_BREAK | FLAG_UNUSED);
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);
}

#[test]
fn reset_state() {
    let mut bus = TestBus::with_program(0xC123, &[]);
    let mut cpu = CPU::new();
    cpu.power_on(&mut bus);

    assert_eq!(cpu.pc, 0xC123);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.status, 0x24);
    assert_eq!((cpu.a, cpu.x, cpu.y), (0, 0, 0));
}

#[test]
fn reset_after_running_restores_defined_state() {
    let mut bus = TestBus::with_program(0xC123, &[]);
    let mut cpu = CPU::new();
    cpu.power_on(&mut bus);
    cpu.a = 0x42;
    cpu.x = 0x13;
    cpu.y = 0x37;
    cpu.sp = 0x80;
    cpu.status = 0xFF;
    let cycles = cpu.cycles;

    cpu.reset(&mut bus);
    assert_eq!(cpu.pc, 0xC123);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.status, 0x24);
    assert_eq!((cpu.a, cpu.x, cpu.y), (0, 0, 0));
    assert_eq!(cpu.cycles, cycles + 7);
}

#[test]
fn nmi_pushes_state_and_takes_vector() {
    let mut bus = TestBus::with_program(0x8000, &[0xEA]);
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0xA0;
    let mut cpu = new_cpu(&mut bus);
    cpu.status &= !FLAG_INTERRUPT_DISABLE;
    cpu.status |= FLAG_CARRY;

    cpu.set_nmi_line(true);
    assert_eq!(cpu.step(&mut bus), 7);

    assert_eq!(cpu.pc, 0xA000);
    assert_eq!(bus.mem[0x01FD], 0x80);
    assert_eq!(bus.mem[0x01FC], 0x00);
    // P as it was before I got set, B clear, U set.
    assert_eq!(bus.mem[0x01FB], FLAG_CARRY | FLAG_UNUSED);
}

#[test]
fn nmi_is_edge_triggered() {
    let mut bus = TestBus::with_program(0x8000, &[0xEA]);
    bus.load(0xA000, &[0xEA, 0xEA, 0xEA]);
    bus.mem[0xFFFB] = 0xA0;
    let mut cpu = new_cpu(&mut bus);

    cpu.set_nmi_line(true);
    cpu.step(&mut bus); // NMI entry
    cpu.set_nmi_line(true);
    cpu.step(&mut bus); // NOP, line still high: no new edge

    assert_eq!(cpu.pc, 0xA001);

    cpu.set_nmi_line(false);
    cpu.set_nmi_line(true);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0xA000);
}

#[test]
fn irq_is_masked_by_interrupt_disable() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xEA, // NOP
            0x58, // CLI
            0xEA, // NOP
        ],
    );
    bus.mem[0xFFFF] = 0xB0;
    let mut cpu = new_cpu(&mut bus);
    cpu.set_irq_line(true);

    cpu.step(&mut bus); // NOP: I is set after reset
    assert_eq!(cpu.pc, 0x8001);
    cpu.step(&mut bus); // CLI
    assert_eq!(cpu.step(&mut bus), 7);

    assert_eq!(cpu.pc, 0xB000);
    assert_eq!(bus.mem[0x01FB] & (FLAG_BREAK | FLAG_INTERRUPT_DISABLE), 0);
}

#[test]
fn nmi_hijacks_brk_vector_fetch() {
    let mut bus = TestBus::with_program(0x8000, &[0x00, 0x00]);
    bus.mem[0xFFFB] = 0xA0;
    bus.mem[0xFFFF] = 0x90;
    let mut cpu = new_cpu(&mut bus);

    // Opcode fetch, padding, PCH push
    for _ in 0..3 {
        cpu.clock(&mut bus);
    }
    cpu.set_nmi_line(true);
    while !cpu.at_instruction_boundary() {
        cpu.clock(&mut bus);
    }

    assert_eq!(cpu.pc, 0xA000);
    assert_eq!(bus.mem[0x01FB] & FLAG_BREAK, FLAG_BREAK);
}

#[test]
fn read_modify_write_issues_dummy_write() {
    let mut bus = TestBus::with_program(0x8000, &[0xEE, 0x10, 0x00]); // INC $0010
    bus.mem[0x0010] = 5;
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus);

    assert_eq!(bus.writes, vec![(0x0010, 5), (0x0010, 6)]);
}

#[test]
fn dma_stall_is_reported_by_clock() {
    let mut bus = TestBus::with_program(0x8000, &[0x8D, 0x14, 0x40]); // STA $4014
    bus.dma_trigger = Some(0x4014);
    let mut cpu = new_cpu(&mut bus);
    let before = cpu.cycles;

    assert_eq!(cpu.step(&mut bus), 4 + 513);
    assert_eq!(cpu.cycles - before, 517);
}

#[test]
fn adc_and_sbc_flags() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0x18, // CLC
            0xA9, 0x50, // LDA #$50
            0x69, 0x50, // ADC #$50
            0x38, // SEC
            0xE9, 0xF0, // SBC #$F0
        ],
    );
    let mut cpu = new_cpu(&mut bus);
    for _ in 0..3 {
        cpu.step(&mut bus);
    }
    assert_eq!(cpu.a, 0xA0);
    assert!(cpu.status & FLAG_OVERFLOW != 0);
    assert!(cpu.status & FLAG_CARRY == 0);

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xB0);
    assert!(cpu.status & FLAG_CARRY == 0);
}

#[test]
fn undocumented_lax_and_dcp() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xA7, 0x20, // LAX $20
            0xC7, 0x21, // DCP $21
        ],
    );
    bus.mem[0x20] = 0x42;
    bus.mem[0x21] = 0x43;
    let mut cpu = new_cpu(&mut bus);

    cpu.step(&mut bus);
    assert_eq!((cpu.a, cpu.x), (0x42, 0x42));

    cpu.step(&mut bus);
    assert_eq!(bus.mem[0x21], 0x42);
    assert!(cpu.status & FLAG_ZERO != 0);
    assert!(cpu.status & FLAG_CARRY != 0);
}

#[test]
fn documented_cycle_counts() {
    let none = |_: &mut CPU, _: &mut TestBus| {};
    assert_eq!(cycles_of(&[0xA9, 0x00], none), 2); // LDA #
    assert_eq!(cycles_of(&[0xA5, 0x00], none), 3); // LDA zp
    assert_eq!(cycles_of(&[0xB5, 0x00], none), 4); // LDA zp,X
    assert_eq!(cycles_of(&[0xAD, 0x00, 0x10], none), 4); // LDA abs
    assert_eq!(cycles_of(&[0xA1, 0x00], none), 6); // LDA (zp,X)
    assert_eq!(cycles_of(&[0x8D, 0x00, 0x02], none), 4); // STA abs
    assert_eq!(cycles_of(&[0x9D, 0x00, 0x02], none), 5); // STA abs,X
    assert_eq!(cycles_of(&[0x91, 0x00], none), 6); // STA (zp),Y
    assert_eq!(cycles_of(&[0xE6, 0x00], none), 5); // INC zp
    assert_eq!(cycles_of(&[0xF6, 0x00], none), 6); // INC zp,X
    assert_eq!(cycles_of(&[0xEE, 0x00, 0x02], none), 6); // INC abs
    assert_eq!(cycles_of(&[0x1E, 0x00, 0x02], none), 7); // ASL abs,X
    assert_eq!(cycles_of(&[0x0A], none), 2); // ASL A
    assert_eq!(cycles_of(&[0xEA], none), 2); // NOP
    assert_eq!(cycles_of(&[0x4C, 0x00, 0x80], none), 3); // JMP abs
    assert_eq!(cycles_of(&[0x6C, 0x00, 0x02], none), 5); // JMP (ind)
    assert_eq!(cycles_of(&[0x20, 0x00, 0x90], none), 6); // JSR
    assert_eq!(cycles_of(&[0x60], none), 6); // RTS
    assert_eq!(cycles_of(&[0x40], none), 6); // RTI
    assert_eq!(cycles_of(&[0x48], none), 3); // PHA
    assert_eq!(cycles_of(&[0x28], none), 4); // PLP
}

#[test]
fn page_crossing_penalties() {
    let x1 = |cpu: &mut CPU, _: &mut TestBus| cpu.x = 1;
    let y1 = |cpu: &mut CPU, bus: &mut TestBus| {
        cpu.y = 1;
        bus.mem[0x10] = 0xFF;
        bus.mem[0x11] = 0x10;
    };
    assert_eq!(cycles_of(&[0xBD, 0x00, 0x10], x1), 4); // LDA abs,X, same page
    assert_eq!(cycles_of(&[0xBD, 0xFF, 0x10], x1), 5); // LDA abs,X, crossing
    assert_eq!(cycles_of(&[0x9D, 0xFF, 0x10], x1), 5); // STA abs,X, crossing
    assert_eq!(cycles_of(&[0xB1, 0x10], y1), 6); // LDA (zp),Y, crossing
    assert_eq!(cycles_of(&[0x1C, 0xFF, 0x10], x1), 5); // NOP abs,X, crossing
    assert_eq!(cycles_of(&[0xD3, 0x10], y1), 8); // DCP (zp),Y
}

#[test]
fn branch_cycle_counts() {
    let zero = |cpu: &mut CPU, _: &mut TestBus| cpu.status |= FLAG_ZERO;
    let clear = |cpu: &mut CPU, _: &mut TestBus| cpu.status &= !FLAG_ZERO;
    assert_eq!(cycles_of(&[0xD0, 0x10], zero), 2); // BNE not taken
    assert_eq!(cycles_of(&[0xD0, 0x10], clear), 3); // BNE taken
    assert_eq!(cycles_at(0x80F0, &[0xD0, 0x20], clear), 4); // BNE taken across a page
}

#[test]
fn jam_is_a_two_cycle_nop() {
    let mut bus = TestBus::with_program(0x8000, &[0x02, 0x12]);
    let mut cpu = new_cpu(&mut bus);
    assert_eq!(cpu.step(&mut bus), 2);
    assert_eq!(cpu.step(&mut bus), 2);
    assert_eq!(cpu.pc, 0x8002);
}

#[test]
fn unstable_opcodes_skip_their_operands() {
    let mut bus = TestBus::with_program(
        0x8000,
        &[
            0xAB, 0xA9, // LXA #$A9
            0x8B, 0xA9, // XAA #$A9
            0x9C, 0x00, 0x02, // SHY $0200,X
            0xE8, // INX
        ],
    );
    let mut cpu = new_cpu(&mut bus);
    assert_eq!(cpu.step(&mut bus), 2);
    assert_eq!(cpu.step(&mut bus), 2);
    assert_eq!(cpu.pc, 0x8004);
    assert_eq!((cpu.a, cpu.x), (0, 0));

    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.pc, 0x8007);
    cpu.step(&mut bus);
    assert_eq!(cpu.x, 1);
}
