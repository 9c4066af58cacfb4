use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use triode::nes::Console;

#[derive(Debug, Clone)]
struct Config {
    rom: PathBuf,
    out: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rom: PathBuf::from("external/nestest.nes"),
            out: None,
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
                    .context("--rom requires a path, e.g. --rom external/nestest.nes")?;
                cfg.rom = PathBuf::from(value);
            }
            "--out" => {
                let value = args
                    .next()
                    .context("--out requires a path, e.g. --out nestest.out.log")?;
                cfg.out = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                println!(
                    "nestest_runner\n\n\
Usage:\n\
  cargo run --release --bin nestest_runner -- [options]\n\n\
Runs the nestest automation entry point ($C000) for 8991 instructions and\n\
writes one reference-format trace line per instruction.\n\n\
Options:\n\
  --rom <path>          ROM path (default external/nestest.nes)\n\
  --out <path>          Write the trace to a file instead of stdout\n\
  -h, --help            Show this help\n"
                );
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cfg = parse_args()?;

    let mut console = Console::from_file(&cfg.rom)
        .with_context(|| format!("failed to load {}", cfg.rom.display()))?;

    let mut lines = Vec::with_capacity(8991);
    console.nestest(|line| lines.push(line.to_string()));

    match cfg.out {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            for line in &lines {
                writeln!(writer, "{line}")?;
            }
            writer.flush()?;
            eprintln!("wrote {} lines to {}", lines.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            for line in &lines {
                writeln!(writer, "{line}")?;
            }
        }
    }

    Ok(())
}
