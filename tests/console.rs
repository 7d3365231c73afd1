mod common;

use common::Rom;
use famicore::{
    console::Console,
    controller::{BUTTON_A, BUTTON_START},
    error::{LoadError, StateError},
    ppu::palette::NES_PALETTE_RGB,
};

/// Idle loop at $C000 with harmless vectors.
fn idle_rom(mapper: u8) -> Vec<u8> {
    Rom::new(mapper, 2, 1)
        .code(0xC000, &[0x4C, 0x00, 0xC0, 0x40]) // JMP $C000; RTI
        .vectors(0xC003, 0xC000, 0xC003)
        .build()
}

/// Waits two VBlanks, sets the backdrop to $21, enables NMI and rendering, then spins.
/// The NMI handler counts frames in $00.
fn rendering_rom() -> Vec<u8> {
    #[rustfmt::skip]
    let program = [
        0x78,             // C000 SEI
        0xA2, 0xFF,       // C001 LDX #$FF
        0x9A,             // C003 TXS
        0x2C, 0x02, 0x20, // C004 BIT $2002
        0x10, 0xFB,       // C007 BPL $C004
        0x2C, 0x02, 0x20, // C009 BIT $2002
        0x10, 0xFB,       // C00C BPL $C009
        0xA9, 0x3F,       // C00E LDA #$3F
        0x8D, 0x06, 0x20, // C010 STA $2006
        0xA9, 0x00,       // C013 LDA #$00
        0x8D, 0x06, 0x20, // C015 STA $2006
        0xA9, 0x21,       // C018 LDA #$21
        0x8D, 0x07, 0x20, // C01A STA $2007
        0xA9, 0x80,       // C01D LDA #$80
        0x8D, 0x00, 0x20, // C01F STA $2000
        0xA9, 0x1E,       // C022 LDA #$1E
        0x8D, 0x01, 0x20, // C024 STA $2001
        0x4C, 0x27, 0xC0, // C027 JMP $C027
        0xE6, 0x00,       // C02A INC $00
        0x40,             // C02C RTI
    ];
    Rom::new(0, 1, 1)
        .code(0xC000, &program)
        .vectors(0xC02A, 0xC000, 0xC02C)
        .build()
}

#[test]
fn power_on_runs_reset_sequence() {
    let console = Console::from_ines(&idle_rom(0)).unwrap();
    assert_eq!(console.cpu.pc, 0xC000);
    assert_eq!(console.cpu.sp, 0xFD);
    assert_eq!(console.cpu.status, 0x24);
    assert_eq!(console.cpu.cycles, 7);
    assert_eq!((console.cpu.a, console.cpu.x, console.cpu.y), (0, 0, 0));
}

#[test]
fn reset_after_load_lands_in_defined_state() {
    let mut console = Console::from_ines(&idle_rom(0)).unwrap();
    console.reset();
    assert_eq!(console.cpu.pc, 0xC000);
    assert_eq!(console.cpu.sp, 0xFD);
    assert_eq!(console.cpu.status, 0x24);
    assert_eq!((console.cpu.a, console.cpu.x, console.cpu.y), (0, 0, 0));

    console.run_frame();
    console.cpu.a = 0x42;
    console.cpu.sp = 0x10;
    console.cpu.status &= !0x04;
    console.reset();
    assert_eq!(console.cpu.pc, 0xC000);
    assert_eq!(console.cpu.a, 0);
    assert_eq!(console.cpu.sp, 0xFD);
    assert_eq!(console.cpu.status, 0x24);
}

#[test]
fn frames_render_backdrop_and_raise_nmi() {
    let mut console = Console::from_ines(&rendering_rom()).unwrap();
    for _ in 0..6 {
        console.run_frame();
    }
    assert!(console.peek(0x0000) >= 2);
    assert_eq!(console.framebuffer()[100 * 256 + 100], NES_PALETTE_RGB[0x21]);
    assert_eq!(console.frame_count(), 6);
}

#[test]
fn a_frame_is_about_29780_cycles() {
    let mut console = Console::from_ines(&idle_rom(0)).unwrap();
    console.run_frame();
    let cycles = console.run_frame();
    // 89342 dots / 3, give or take the instruction that straddles the boundary.
    assert!((29_775..=29_785).contains(&cycles), "{cycles}");
}

#[test]
fn identical_runs_are_identical() {
    let rom = rendering_rom();
    let mut first = Console::from_ines(&rom).unwrap();
    let mut second = Console::from_ines(&rom).unwrap();
    for _ in 0..5 {
        first.run_frame();
        second.run_frame();
    }
    assert_eq!(first.cpu, second.cpu);
    assert_eq!(first.bus.ppu, second.bus.ppu);
    assert_eq!(first.framebuffer()[..], second.framebuffer()[..]);
}

#[test]
fn save_state_round_trip_resumes_identically() {
    let mut console = Console::from_ines(&rendering_rom()).unwrap();
    for _ in 0..4 {
        console.run_frame();
    }
    let state = console.save_state().unwrap();

    for _ in 0..3 {
        console.run_frame();
    }
    let expected_cpu = console.cpu.clone();
    let expected_ram = console.bus.ram;
    let expected_frame = console.framebuffer().to_vec();

    console.load_state(&state).unwrap();
    for _ in 0..3 {
        console.run_frame();
    }
    assert_eq!(console.cpu, expected_cpu);
    assert_eq!(console.bus.ram, expected_ram);
    assert_eq!(console.framebuffer().to_vec(), expected_frame);
}

#[test]
fn state_from_another_board_is_rejected_untouched() {
    let mut nrom = Console::from_ines(&idle_rom(0)).unwrap();
    let mut mmc1 = Console::from_ines(&idle_rom(1)).unwrap();
    mmc1.run_frame();
    let state = mmc1.save_state().unwrap();

    let before = nrom.cpu.clone();
    assert!(matches!(
        nrom.load_state(&state),
        Err(StateError::MapperMismatch {
            expected: 0,
            found: 1
        })
    ));
    assert_eq!(nrom.cpu, before);

    assert!(matches!(
        nrom.load_state(b"garbage"),
        Err(StateError::BadMagic)
    ));
}

#[test]
fn failed_rom_load_keeps_running_game() {
    let mut console = Console::from_ines(&idle_rom(0)).unwrap();
    console.run_frame();
    let before = console.cpu.clone();

    assert_eq!(console.load_rom(b"not a rom"), Err(LoadError::BadSignature));
    assert_eq!(console.cpu, before);

    console.load_rom(&idle_rom(2)).unwrap();
    assert_eq!(console.bus.cart.mapper_id(), 2);
    assert_eq!(console.cpu.cycles, 7);
}

#[test]
fn controller_reads_through_4016() {
    #[rustfmt::skip]
    let program = [
        0xA9, 0x01,       // C000 LDA #1
        0x8D, 0x16, 0x40, // C002 STA $4016
        0xA9, 0x00,       // C005 LDA #0
        0x8D, 0x16, 0x40, // C007 STA $4016
        0xA2, 0x00,       // C00A LDX #0
        0xAD, 0x16, 0x40, // C00C LDA $4016
        0x95, 0x20,       // C00F STA $20,X
        0xE8,             // C011 INX
        0xE0, 0x08,       // C012 CPX #8
        0xD0, 0xF6,       // C014 BNE $C00C
        0x4C, 0x16, 0xC0, // C016 JMP $C016
    ];
    let rom = Rom::new(0, 1, 1)
        .code(0xC000, &program)
        .vectors(0xC016, 0xC000, 0xC016)
        .build();
    let mut console = Console::from_ines(&rom).unwrap();
    console.set_buttons(0, BUTTON_A | BUTTON_START);
    console.run_frame();

    let bits: Vec<u8> = (0x20..0x28).map(|addr| console.peek(addr)).collect();
    assert_eq!(bits, vec![0x41, 0x40, 0x40, 0x41, 0x40, 0x40, 0x40, 0x40]);
}

#[test]
fn mmc1_serial_writes_select_prg_bank() {
    #[rustfmt::skip]
    let program = [
        0xA9, 0x80,       // C000 LDA #$80
        0x8D, 0x00, 0x80, // C002 STA $8000  reset shift register
        0xA9, 0x01,       // C005 LDA #$01
        0x8D, 0x00, 0xE0, // C007 STA $E000  bit 0
        0x8D, 0x00, 0xE0, // C00A STA $E000  bit 1
        0xA9, 0x00,       // C00D LDA #$00
        0x8D, 0x00, 0xE0, // C00F STA $E000
        0x8D, 0x00, 0xE0, // C012 STA $E000
        0x8D, 0x00, 0xE0, // C015 STA $E000  PRG bank 3
        0xAD, 0x00, 0x80, // C018 LDA $8000
        0x85, 0x10,       // C01B STA $10
        0x4C, 0x1D, 0xC0, // C01D JMP $C01D
    ];
    let rom = Rom::new(1, 8, 1)
        .code(0xC000, &program)
        .vectors(0xC01D, 0xC000, 0xC01D)
        .build();
    let mut console = Console::from_ines(&rom).unwrap();
    assert_eq!(console.peek(0x8000), 0);
    console.run_frame();

    assert_eq!(console.peek(0x0010), 3);
    assert_eq!(console.peek(0x8000), 3);
    assert_eq!(console.peek(0xC000), 0xA9);
}

#[test]
fn mmc3_scanline_irq_reaches_cpu() {
    #[rustfmt::skip]
    let program = [
        0x78,             // C000 SEI
        0xA2, 0xFF,       // C001 LDX #$FF
        0x9A,             // C003 TXS
        0x2C, 0x02, 0x20, // C004 BIT $2002
        0x10, 0xFB,       // C007 BPL $C004
        0xA9, 0x0A,       // C009 LDA #10
        0x8D, 0x00, 0xC0, // C00B STA $C000  IRQ latch
        0x8D, 0x01, 0xC0, // C00E STA $C001  reload
        0x8D, 0x01, 0xE0, // C011 STA $E001  enable
        0xA9, 0x08,       // C014 LDA #$08
        0x8D, 0x00, 0x20, // C016 STA $2000  sprites at $1000
        0xA9, 0x18,       // C019 LDA #$18
        0x8D, 0x01, 0x20, // C01B STA $2001  rendering on
        0x58,             // C01E CLI
        0x4C, 0x1F, 0xC0, // C01F JMP $C01F
        0x8D, 0x00, 0xE0, // C022 STA $E000  acknowledge and disable
        0xE6, 0x00,       // C025 INC $00
        0x40,             // C027 RTI
    ];
    let rom = Rom::new(4, 2, 1)
        .code(0xC000, &program)
        .vectors(0xC027, 0xC000, 0xC022)
        .build();
    let mut console = Console::from_ines(&rom).unwrap();
    for _ in 0..3 {
        console.run_frame();
    }
    assert_eq!(console.peek(0x0000), 1);
    assert!(!console.bus.irq());
}
