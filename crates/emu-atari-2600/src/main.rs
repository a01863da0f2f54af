//! Atari 2600 emulator binary.
//!
//! Headless: runs a cartridge for a number of frames, then optionally saves
//! a screenshot, a frame sequence or the audio register log.

use std::error::Error;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use emu_atari_2600::{AudioLog, Machine, MachineConfig, MachineError, TvStandard, capture};

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[clap(author, about, long_about = None, version)]
struct Cli {
    /// Cartridge image (2K, 4K, 8K, 16K, 32K, or 3F in 2K slices).
    rom: PathBuf,
    /// Frames to run.
    #[clap(long, default_value_t = 200)]
    frames: u32,
    /// Television standard; detected from the program if omitted.
    #[clap(long, value_enum)]
    tv: Option<TvArg>,
    /// Visible scanlines; detected if omitted.
    #[clap(long)]
    height: Option<u16>,
    /// First visible scanline.
    #[clap(long)]
    y_start: Option<u16>,
    /// Seed for power-on RAM and timer contents.
    #[clap(long)]
    seed: Option<u64>,
    /// Don't blank the left edge after early HMOVEs.
    #[clap(long)]
    no_hmove_blanks: bool,
    /// Save the last frame as a PNG.
    #[clap(long)]
    screenshot: Option<PathBuf>,
    /// Save every frame as a PNG under DIR/frames.
    #[clap(long, value_name = "DIR")]
    record: Option<PathBuf>,
    /// Write audio register writes, one per line.
    #[clap(long)]
    audio_log: Option<PathBuf>,
    /// More logging (repeatable).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Errors only.
    #[clap(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TvArg {
    Ntsc,
    Pal,
}

impl From<TvArg> for TvStandard {
    fn from(arg: TvArg) -> Self {
        match arg {
            TvArg::Ntsc => TvStandard::Ntsc,
            TvArg::Pal => TvStandard::Pal,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{:<5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// `-q` wins, then `-v`, then `EMU2600_LOG`, then warnings.
fn log_level(cli: &Cli) -> log::LevelFilter {
    if cli.quiet {
        return log::LevelFilter::Error;
    }
    match cli.verbose {
        0 => std::env::var("EMU2600_LOG")
            .ok()
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

// ---------------------------------------------------------------------------
// Headless run
// ---------------------------------------------------------------------------

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let image = fs::read(&cli.rom)?;
    let config = MachineConfig {
        tv: cli.tv.map(TvStandard::from),
        display_height: cli.height,
        y_start: cli.y_start,
        seed: cli.seed,
        hmove_blanks: !cli.no_hmove_blanks,
    };

    let mut machine = Machine::new(&config);
    machine.insert_cartridge(&image)?;
    log::info!(
        "{} display, {} lines from line {}",
        machine.tv().name(),
        machine.display_height(),
        machine.y_start()
    );

    let audio = AudioLog::new();
    if cli.audio_log.is_some() {
        machine.set_audio_sink(Box::new(audio.clone()));
    }

    if let Some(dir) = &cli.record {
        capture::record(&mut machine, dir, cli.frames)?;
    } else {
        machine.run_frames(cli.frames as usize)?;
    }
    log::info!(
        "ran {} frames, {:.2}s of console time",
        cli.frames,
        machine.emulated_seconds()
    );

    if let Some(path) = &cli.screenshot {
        capture::save_screenshot(&machine, path)?;
        log::info!("screenshot saved to {}", path.display());
    }

    if let Some(path) = &cli.audio_log {
        let mut out = BufWriter::new(fs::File::create(path)?);
        for write in audio.drain() {
            writeln!(
                out,
                "{} {} {:#04X} {:#04X}",
                write.frame, write.cycle, write.register, write.value
            )?;
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    log::set_logger(&LOGGER)?;
    log::set_max_level(log_level(&cli));

    run(&cli).inspect_err(|err| {
        if let Some(MachineError::Decode(decode)) = err.downcast_ref::<MachineError>() {
            log::error!("processor halted: {decode}");
        }
    })
}
