//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// Components access memory and peripherals through this trait. The bus
/// handles address decoding and routing to the appropriate device.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Receiver for processor time.
///
/// The processor reports every cycle it spends. One cycle is signalled
/// immediately before each bus read; whatever the instruction costs beyond
/// that is reported in a lump once it completes.
pub trait CycleSink {
    /// Account for `cycles` processor cycles.
    fn cycles_elapsed(&mut self, cycles: u32);

    /// True once some device has asked the processor to stop.
    ///
    /// Checked between instructions, never in the middle of one.
    fn stop_requested(&self) -> bool;
}
