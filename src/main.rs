use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use macroquad::input::{is_key_pressed, KeyCode};
use macroquad::time::get_frame_time;
use macroquad::window::Conf;
use macroquad::Window;
use chip8_vm::{disassemble, Chip8, Chip8Error, DISPLAY_HEIGHT, DISPLAY_WIDTH, PROGRAM_START, TIMER_HZ};

use ui::frame_clock::FrameClock;

mod ui;

#[derive(Parser, Debug)]
#[command(name = "chip8-vm", about = "CHIP-8 interpreter")]
struct Args {
    /// ROM image to run
    rom: PathBuf,

    /// Instructions executed per frame; timers count down once per frame at 60 Hz
    #[arg(long, default_value_t = 10)]
    cycles_per_frame: u32,

    /// Window pixels per CHIP-8 pixel
    #[arg(long, default_value_t = 10)]
    scale: i32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Print a disassembly of the ROM and exit
    #[arg(long, default_value_t = false)]
    disassemble: bool,

    /// Run this many frames without a window, then print the screen as text
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,
}

fn build_chip8(args: &Args, rom: &[u8]) -> Result<Chip8> {
    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8.load(rom).context("Failed to load ROM")?;
    Ok(chip8)
}

fn run_headless(mut chip8: Chip8, frames: u32, cycles_per_frame: u32) -> Result<()> {
    for frame in 0..frames {
        chip8
            .run_frame(cycles_per_frame)
            .with_context(|| format!("Emulation halted in frame {frame}"))?;
    }
    print!("{}", chip8.frame_buffer());
    Ok(())
}

/// Runs until Escape or a fatal engine error, which is stored in `fault` for `main`
async fn run_windowed(mut chip8: Chip8, cycles_per_frame: u32, fault: Arc<Mutex<Option<Chip8Error>>>) {
    info!("Running at {cycles_per_frame} instructions per frame, {TIMER_HZ} frames per second");
    let mut clock = FrameClock::new(TIMER_HZ);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        ui::keypad::update_keypad(&mut chip8);
        for _ in 0..clock.advance(get_frame_time()) {
            if let Err(err) = chip8.run_frame(cycles_per_frame) {
                error!("Emulation halted: {err}");
                if let Ok(mut slot) = fault.lock() {
                    *slot = Some(err);
                }
                return;
            }
        }

        ui::renderer::render_frame(chip8.frame_buffer()).await;
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = fs::read(&args.rom).with_context(|| format!("Failed to read {}", args.rom.display()))?;

    if args.disassemble {
        print!("{}", disassemble(&rom, PROGRAM_START));
        return Ok(());
    }

    let chip8 = build_chip8(&args, &rom)?;

    if let Some(frames) = args.headless {
        return run_headless(chip8, frames, args.cycles_per_frame);
    }

    let conf = Conf {
        window_title: "Chip-8 Emulator".to_owned(),
        window_width: DISPLAY_WIDTH as i32 * args.scale,
        window_height: DISPLAY_HEIGHT as i32 * args.scale,
        ..Default::default()
    };
    let fault = Arc::new(Mutex::new(None));
    Window::from_config(conf, run_windowed(chip8, args.cycles_per_frame, Arc::clone(&fault)));

    let fault = fault.lock().ok().and_then(|mut slot| slot.take());
    match fault {
        Some(err) => Err(err).context("Emulation halted"),
        None => Ok(()),
    }
}
