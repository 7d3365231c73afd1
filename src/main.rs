//! NES emulator entry point.
//!
//! Loads a cartridge and runs the console with a display window.
//! Usage: famicore path/to/game.nes
//!
//! Battery-backed PRG RAM is read from and written back to `game.sav` next to the ROM.
//!
//! Keys: arrows = D-pad, Z = B, X = A, Right Shift = Select, Enter = Start,
//! F5 = save state, F9 = load state, Backspace = reset, Escape = quit.

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use ansi_term::Colour::{Green, Red, Yellow};
use famicore::{
    console::Console,
    controller::{
        BUTTON_A, BUTTON_B, BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_SELECT, BUTTON_START,
        BUTTON_UP,
    },
    ppu::ppu::{HEIGHT, WIDTH},
};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

const KEYMAP: [(Key, u8); 8] = [
    (Key::X, BUTTON_A),
    (Key::Z, BUTTON_B),
    (Key::RightShift, BUTTON_SELECT),
    (Key::Enter, BUTTON_START),
    (Key::Up, BUTTON_UP),
    (Key::Down, BUTTON_DOWN),
    (Key::Left, BUTTON_LEFT),
    (Key::Right, BUTTON_RIGHT),
];

/// Restore the `.sav` image if the board is battery backed and one exists.
fn load_battery(console: &mut Console, save_path: &Path) {
    if !console.bus.cart.has_battery() || !save_path.exists() {
        return;
    }
    let result = std::fs::read(save_path)
        .map_err(|err| err.to_string())
        .and_then(|bytes| console.bus.cart.load_prg_ram(&bytes).map_err(|err| err.to_string()));
    match result {
        Ok(()) => println!("{} {}", Green.bold().paint("LOAD"), save_path.display()),
        Err(err) => eprintln!("{} {}: {err}", Red.bold().paint("ERROR"), save_path.display()),
    }
}

fn store_battery(console: &Console, save_path: &Path) {
    if !console.bus.cart.has_battery() {
        return;
    }
    match std::fs::write(save_path, console.bus.cart.prg_ram()) {
        Ok(()) => println!("{} {}", Green.bold().paint("SAVE"), save_path.display()),
        Err(err) => eprintln!("{} {}: {err}", Red.bold().paint("ERROR"), save_path.display()),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("{} usage: famicore <rom.nes>", Red.bold().paint("ERROR"));
        return ExitCode::FAILURE;
    };

    let rom = match std::fs::read(&path) {
        Ok(rom) => rom,
        Err(err) => {
            eprintln!("{} cannot read {path}: {err}", Red.bold().paint("ERROR"));
            return ExitCode::FAILURE;
        }
    };
    let mut console = match Console::from_ines(&rom) {
        Ok(console) => console,
        Err(err) => {
            eprintln!("{} cannot load {path}: {err}", Red.bold().paint("ERROR"));
            return ExitCode::FAILURE;
        }
    };
    println!(
        "{} {path}: mapper {}, {:?} mirroring",
        Green.bold().paint("LOADED"),
        console.bus.cart.mapper_id(),
        console.bus.cart.mirroring()
    );
    let save_path = Path::new(&path).with_extension("sav");
    load_battery(&mut console, &save_path);

    let mut window = match Window::new(
        "famicore",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale: minifb::Scale::X2,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    ) {
        Ok(window) => window,
        Err(err) => {
            eprintln!("{} cannot open window: {err}", Red.bold().paint("ERROR"));
            return ExitCode::FAILURE;
        }
    };

    let mut snapshot: Option<Vec<u8>> = None;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        let buttons = KEYMAP
            .iter()
            .filter(|(key, _)| window.is_key_down(*key))
            .fold(0, |bits, (_, button)| bits | button);
        console.set_buttons(0, buttons);

        if window.is_key_pressed(Key::F5, KeyRepeat::No) {
            match console.save_state() {
                Ok(bytes) => {
                    println!("{} state saved ({} bytes)", Green.bold().paint("SAVE"), bytes.len());
                    snapshot = Some(bytes);
                }
                Err(err) => eprintln!("{} {err}", Red.bold().paint("ERROR")),
            }
        }
        if window.is_key_pressed(Key::F9, KeyRepeat::No) {
            match snapshot.as_deref().map(|bytes| console.load_state(bytes)) {
                Some(Ok(())) => println!("{} state restored", Green.bold().paint("LOAD")),
                Some(Err(err)) => eprintln!("{} {err}", Red.bold().paint("ERROR")),
                None => println!("{} no state saved yet", Yellow.bold().paint("LOAD")),
            }
        }
        if window.is_key_pressed(Key::Backspace, KeyRepeat::No) {
            console.reset();
            println!("{}", Yellow.bold().paint("RESET"));
        }

        console.run_frame();
        if let Err(err) = window.update_with_buffer(console.framebuffer(), WIDTH, HEIGHT) {
            eprintln!("{} cannot present frame: {err}", Red.bold().paint("ERROR"));
            store_battery(&console, &save_path);
            return ExitCode::FAILURE;
        }

        // Pace to ~60 fps so we don't burn CPU (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
    store_battery(&console, &save_path);
    ExitCode::SUCCESS
}
