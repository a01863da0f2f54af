//! Audio register notification.
//!
//! The TIA's two tone generators are not synthesised here. Whoever wants
//! sound (or a log of what would have been played) implements
//! [`AudioSink`] and receives every AUDCx/AUDFx/AUDVx write with the
//! processor cycle it happened on.

/// Receiver for audio register writes.
pub trait AudioSink {
    /// A write to AUDC0/1, AUDF0/1 or AUDV0/1 (`register` is the TIA
    /// address, 0x15-0x1A) at processor cycle `cycle`.
    fn register_write(&mut self, register: u8, value: u8, cycle: u32);

    /// The cycle counter is about to drop by `cycles`.
    fn cycles_reset(&mut self, cycles: u32) {
        let _ = cycles;
    }

    /// Power-on state.
    fn reset(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn register_write(&mut self, _register: u8, _value: u8, _cycle: u32) {}
}
