//! CPU core trait.

use crate::{Bus, CycleSink};

/// An instruction-stepped CPU core.
///
/// Execution is driven in slices: the CPU runs whole instructions and
/// reports their cost to the bus, which doubles as the cycle sink. Devices
/// that must react mid-slice do so from inside their bus handlers.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Error raised when execution cannot continue.
    type Error;

    /// Run at most `max_instructions` instructions.
    ///
    /// Returns how many actually ran; fewer if the sink requested a stop.
    fn run<B: Bus + CycleSink>(
        &mut self,
        bus: &mut B,
        max_instructions: usize,
    ) -> Result<usize, Self::Error>;

    /// Reset registers and load the program counter from the reset vector.
    fn reset<B: Bus + CycleSink>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;
}
