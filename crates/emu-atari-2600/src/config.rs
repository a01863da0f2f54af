//! Machine configuration.

use emu_core::MasterClock;

use crate::palette;

/// Television standard. Selects the palette, frame rate, scanline ceiling
/// and PAL colour loss.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TvStandard {
    /// 60 Hz, about 262 scanlines.
    #[default]
    Ntsc,
    /// 50 Hz, about 312 scanlines, with colour loss on odd-length frames.
    Pal,
}

impl TvStandard {
    /// A frame running longer than this without VSYNC is cut off.
    #[must_use]
    pub const fn scanline_ceiling(self) -> u16 {
        match self {
            Self::Ntsc => 290,
            Self::Pal => 342,
        }
    }

    /// Visible height when detection finds the usual 210 lines.
    #[must_use]
    pub const fn default_height(self) -> u16 {
        match self {
            Self::Ntsc => 210,
            Self::Pal => 250,
        }
    }

    /// Nominal frames per second.
    #[must_use]
    pub const fn frame_rate(self) -> u32 {
        match self {
            Self::Ntsc => 60,
            Self::Pal => 50,
        }
    }

    /// RGB colours (`0xRRGGBB`) for the 128 even colour register values.
    #[must_use]
    pub const fn palette(self) -> &'static [u32; 128] {
        match self {
            Self::Ntsc => &palette::NTSC_PALETTE,
            Self::Pal => &palette::PAL_PALETTE,
        }
    }

    /// PAL consoles lose chroma on frames with an odd line count.
    #[must_use]
    pub const fn color_loss(self) -> bool {
        matches!(self, Self::Pal)
    }

    /// Colour clock crystal. The TIA runs at this rate, the processor at a
    /// third of it.
    #[must_use]
    pub const fn master_clock(self) -> MasterClock {
        match self {
            Self::Ntsc => MasterClock::new(3_579_545),
            Self::Pal => MasterClock::new(3_546_894),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ntsc => "NTSC",
            Self::Pal => "PAL",
        }
    }
}

/// Atari 2600 configuration.
///
/// Anything left as `None` is detected from the cartridge when it is
/// inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineConfig {
    /// Television standard; `None` runs format detection.
    pub tv: Option<TvStandard>,
    /// Scanlines shown; `None` runs height detection.
    pub display_height: Option<u16>,
    /// First scanline shown; `None` takes it from height detection.
    pub y_start: Option<u16>,
    /// Seed for RIOT RAM and timer power-on contents. `None` draws one from
    /// the operating system.
    pub seed: Option<u64>,
    /// Whether early HMOVEs blank the left eight pixels.
    pub hmove_blanks: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tv: None,
            display_height: None,
            y_start: None,
            seed: None,
            hmove_blanks: true,
        }
    }
}
