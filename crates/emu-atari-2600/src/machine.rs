//! The console: processor, bus and the frame pump.

use atari_tia::{AudioSink, FRAME_WIDTH, Tia, VideoSettings};
use emu_core::{Cpu, Observable, Value};
use mos_6507::{DecodeError, Mos6507};
use mos_riot_6532::Riot;
use thiserror::Error;

use crate::bus::SystemBus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::config::{MachineConfig, TvStandard};
use crate::controller::ControllerPorts;
use crate::palette;
use crate::switches::ConsoleSwitches;

/// Instructions per execution slice.
const INSTRUCTIONS_PER_SLICE: usize = 25_000;

/// Slices allowed before a frame counts as overrun.
const MAX_SLICES: usize = 10;

/// Frames run and thrown away before detection starts sampling.
const SETTLE_FRAMES: usize = 60;

/// Frames sampled by format detection.
const FORMAT_SAMPLE_FRAMES: usize = 30;

/// A frame longer than this counts as a PAL vote.
const PAL_SCANLINE_THRESHOLD: i64 = 285;

/// Display placement used when height detection finds nothing sensible.
const FALLBACK_Y_START: u16 = 34;
const FALLBACK_HEIGHT: u16 = 210;
const MIN_DETECTED_HEIGHT: i64 = 100;
const MAX_HEIGHT: i64 = 300;

#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// How a call to [`Machine::process_frame`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// VSYNC ended the frame.
    Complete,
    /// The frame hit the scanline ceiling or ran out of execution slices.
    Overrun,
}

/// An Atari 2600.
pub struct Machine {
    cpu: Mos6507,
    bus: SystemBus,
    config: MachineConfig,
    tv: TvStandard,
    y_start: u16,
    display_height: u16,
    /// Processor cycles in every completed counter period.
    elapsed_cycles: u64,
    overrun_logged: bool,
}

impl Machine {
    /// Power on with no cartridge inserted.
    #[must_use]
    pub fn new(config: &MachineConfig) -> Self {
        let tv = config.tv.unwrap_or_default();
        let y_start = config.y_start.unwrap_or(FALLBACK_Y_START);
        let display_height = config.display_height.unwrap_or(tv.default_height());
        let settings = video_settings(config, tv, y_start, display_height);

        let mut machine = Self {
            cpu: Mos6507::new(),
            bus: SystemBus::new(Tia::new(settings), Riot::new(config.seed)),
            config: config.clone(),
            tv,
            y_start,
            display_height,
            elapsed_cycles: 0,
            overrun_logged: false,
        };
        machine.reset();
        machine
    }

    /// Insert a cartridge image and power cycle. Format and height are
    /// detected by running the program unless the configuration fixes them.
    pub fn insert_cartridge(&mut self, image: &[u8]) -> Result<(), MachineError> {
        let cartridge = Cartridge::new(image)?;
        log::info!(
            "cartridge: {} bytes, {} scheme",
            image.len(),
            cartridge.scheme()
        );
        self.bus.insert_cartridge(cartridge);
        self.reset();

        if self.config.tv.is_none() {
            let tv = self.detect_format()?;
            log::info!("detected {} display", tv.name());
            self.tv = tv;
            if self.config.display_height.is_none() {
                self.display_height = tv.default_height();
            }
            self.apply_settings();
        }

        if self.config.display_height.is_none() {
            let (y_start, height) = self.detect_height()?;
            log::info!("detected display height {height} starting at line {y_start}");
            self.y_start = self.config.y_start.unwrap_or(y_start);
            self.display_height = height;
            self.apply_settings();
        }

        self.reset();
        self.elapsed_cycles = 0;
        Ok(())
    }

    /// Reset every device and the processor. Any partial frame is dropped.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
    }

    /// Run until the TIA completes a frame or the slice budget runs out.
    ///
    /// A frame cut short by the budget stays partial and the next call
    /// carries on with it.
    pub fn process_frame(&mut self) -> Result<FrameStatus, MachineError> {
        if !self.bus.tia().partial_frame() {
            let carry = self.bus.tia().line_clock(self.bus.cycles());
            self.elapsed_cycles += u64::from(self.bus.cycles());
            self.bus.reset_cycles();
            self.bus.tia_mut().begin_frame(carry);
        }

        let mut slices = 0;
        while slices < MAX_SLICES {
            self.bus.clear_stop();
            self.cpu.run(&mut self.bus, INSTRUCTIONS_PER_SLICE)?;
            slices += 1;
            if !self.bus.tia().partial_frame() {
                break;
            }
        }

        let cycles = self.bus.cycles();
        self.bus.tia_mut().finish_frame(cycles);

        if slices == MAX_SLICES || self.bus.tia().scanline_overrun() {
            if !self.overrun_logged {
                log::warn!(
                    "frame overrun at scanline {} (pc {:#06X})",
                    self.bus.tia().scanlines(cycles),
                    self.cpu.pc()
                );
                self.overrun_logged = true;
            }
            return Ok(FrameStatus::Overrun);
        }
        Ok(FrameStatus::Complete)
    }

    /// Run `count` frames, stopping at the first error.
    pub fn run_frames(&mut self, count: usize) -> Result<(), MachineError> {
        for _ in 0..count {
            self.process_frame()?;
        }
        Ok(())
    }

    /// Votes on frame length: PAL programs draw about 312 lines.
    fn detect_format(&mut self) -> Result<TvStandard, MachineError> {
        self.run_frames(SETTLE_FRAMES)?;
        let mut long_frames = 0;
        for _ in 0..FORMAT_SAMPLE_FRAMES {
            self.process_frame()?;
            if self.bus.tia().last_frame_scanlines() > PAL_SCANLINE_THRESHOLD {
                long_frames += 1;
            }
        }
        log::debug!("{long_frames} of {FORMAT_SAMPLE_FRAMES} frames were long");
        Ok(if long_frames >= FORMAT_SAMPLE_FRAMES / 2 {
            TvStandard::Pal
        } else {
            TvStandard::Ntsc
        })
    }

    /// Measures the span between VBLANK off and on. Returns
    /// `(y_start, height)`.
    fn detect_height(&mut self) -> Result<(u16, u16), MachineError> {
        self.reset();
        self.run_frames(SETTLE_FRAMES)?;

        let tia = self.bus.tia();
        let start = tia.detected_y_start();
        let mut height = tia.detected_y_stop() - start;
        if height <= 0 {
            height += tia.vsync_on();
        }
        let height = height.min(MAX_HEIGHT);

        let (y_start, height) = if height < MIN_DETECTED_HEIGHT {
            (FALLBACK_Y_START, FALLBACK_HEIGHT)
        } else {
            (
                u16::try_from(start).unwrap_or(FALLBACK_Y_START),
                u16::try_from(height).unwrap_or(FALLBACK_HEIGHT),
            )
        };
        if self.tv == TvStandard::Pal && height == FALLBACK_HEIGHT {
            return Ok((y_start, TvStandard::Pal.default_height()));
        }
        Ok((y_start, height))
    }

    /// Push the current format and placement to the TIA. Applied at the
    /// next reset.
    fn apply_settings(&mut self) {
        let settings = video_settings(&self.config, self.tv, self.y_start, self.display_height);
        self.bus.tia_mut().set_settings(settings);
        self.reset();
    }

    /// Console time emulated since power on.
    #[must_use]
    pub fn emulated_seconds(&self) -> f64 {
        let cycles = self.elapsed_cycles + u64::from(self.bus.cycles());
        self.tv.master_clock().seconds(cycles * 3)
    }

    #[must_use]
    pub fn tv(&self) -> TvStandard {
        self.tv
    }

    #[must_use]
    pub fn display_height(&self) -> u16 {
        self.display_height
    }

    #[must_use]
    pub fn y_start(&self) -> u16 {
        self.y_start
    }

    /// Colour register values of the last rendered frame, 160 per line.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        self.bus.tia().frame_buffer()
    }

    /// The visible lines of the frame buffer as `0xRRGGBB` pixels.
    #[must_use]
    pub fn rgb_frame(&self) -> Vec<u32> {
        let pixels = FRAME_WIDTH * usize::from(self.display_height);
        let table = self.tv.palette();
        self.frame_buffer()
            .iter()
            .take(pixels)
            .map(|&color| palette::rgb(table, color))
            .collect()
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6507 {
        &self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    #[must_use]
    pub fn controllers(&self) -> &ControllerPorts {
        self.bus.ports()
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerPorts {
        self.bus.ports_mut()
    }

    pub fn switches_mut(&mut self) -> &mut ConsoleSwitches {
        self.bus.switches_mut()
    }

    /// Route TIA audio register writes to `sink`.
    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.bus.set_audio(sink);
    }
}

fn video_settings(
    config: &MachineConfig,
    tv: TvStandard,
    y_start: u16,
    height: u16,
) -> VideoSettings {
    VideoSettings {
        y_start,
        height,
        scanline_ceiling: tv.scanline_ceiling(),
        color_loss: tv.color_loss(),
        hmove_blanks: config.hmove_blanks,
    }
}

/// Machine-level paths plus `cpu.*`, `tia.*` and `riot.*`, which are
/// forwarded to the component.
impl Observable for Machine {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            return self.cpu.query(rest);
        }
        if let Some(rest) = path.strip_prefix("tia.") {
            return self.bus.tia().query(rest);
        }
        if let Some(rest) = path.strip_prefix("riot.") {
            return self.bus.riot().query(rest);
        }
        match path {
            "tv" => Some(self.tv.name().into()),
            "display.height" => Some(self.display_height.into()),
            "display.y_start" => Some(self.y_start.into()),
            "cycles" => Some(self.bus.cycles().into()),
            "switches" => Some(self.bus.switches().bits().into()),
            "cartridge.bank" => self
                .bus
                .cartridge()
                .map(|cart| Value::U8(u8::try_from(cart.bank()).unwrap_or(u8::MAX))),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "tv",
            "display.height",
            "display.y_start",
            "cycles",
            "switches",
            "cartridge.bank",
        ]
    }
}
