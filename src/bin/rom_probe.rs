use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use triode::nes::{BUTTON_START, Console};

#[derive(Debug, Clone)]
struct Config {
    rom: PathBuf,
    frames: u32,
    press_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rom: PathBuf::from("external/rom.nes"),
            frames: 60,
            press_start: false,
        }
    }
}

fn parse_args() -> Result<Config> {
    let mut cfg = Config::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rom" => {
                let value = args
                    .next()
                    .context("--rom requires a path, e.g. --rom external/rom.nes")?;
                cfg.rom = PathBuf::from(value);
            }
            "--frames" => {
                let value = args
                    .next()
                    .context("--frames requires an integer, e.g. --frames 600")?;
                cfg.frames = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid --frames value: {value}"))?;
            }
            "--press-start" => cfg.press_start = true,
            "--help" | "-h" => {
                println!(
                    "rom_probe\n\n\
Usage:\n\
  cargo run --release --bin rom_probe -- [options]\n\n\
Runs a ROM headlessly for N frames and reports timing, a framebuffer\n\
checksum and audio output volume.\n\n\
Options:\n\
  --rom <path>          ROM path (default external/rom.nes)\n\
  --frames <n>          Frames to run (default 60)\n\
  --press-start         Hold Start on controller 1 from frame 30\n\
  -h, --help            Show this help\n"
                );
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(cfg)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xCBF2_9CE4_8422_2325;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cfg = parse_args()?;

    let mut console = Console::from_file(&cfg.rom)
        .with_context(|| format!("failed to load {}", cfg.rom.display()))?;

    let started = Instant::now();
    let mut sample_count = 0usize;
    let mut peak = 0f32;
    for frame in 0..cfg.frames {
        if cfg.press_start && frame == 30 {
            console.button_down(1, BUTTON_START);
        }
        console.run_frame();
        for sample in console.take_audio_samples() {
            sample_count += 1;
            peak = peak.max(sample.abs());
        }
    }
    let elapsed = started.elapsed();

    println!("rom:       {}", cfg.rom.display());
    println!("frames:    {}", cfg.frames);
    println!(
        "wall time: {:.3}s ({:.1} fps)",
        elapsed.as_secs_f64(),
        cfg.frames as f64 / elapsed.as_secs_f64()
    );
    println!("frame hash: {:016X}", fnv1a(console.frame_buffer()));
    println!("audio:     {sample_count} samples, peak {peak:.4}");

    Ok(())
}
