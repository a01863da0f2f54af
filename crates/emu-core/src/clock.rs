//! Master clock configuration.

/// Master crystal of a system.
///
/// Video hardware usually runs at the crystal rate and the processor at a
/// fixed divisor of it, so both rates derive from this one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Crystal frequency in Hz (e.g. `3_579_545` for an NTSC colour clock).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Rate of a component clocked at `frequency / divisor`.
    #[must_use]
    pub const fn divided(&self, divisor: u64) -> u64 {
        self.frequency_hz / divisor
    }

    /// Wall-clock seconds represented by `ticks` crystal ticks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.frequency_hz as f64
    }
}
