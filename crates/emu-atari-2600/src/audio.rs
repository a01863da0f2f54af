//! Audio register capture.
//!
//! Sound generation is left to whoever consumes the log: each entry is one
//! write to AUDC0-AUDV1 stamped with the cycle it happened on.

use std::cell::RefCell;
use std::rc::Rc;

use atari_tia::AudioSink;

/// One audio register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioWrite {
    /// Frame the write belongs to.
    pub frame: u64,
    /// Processor cycle within the frame.
    pub cycle: u32,
    /// TIA register (0x15-0x1A).
    pub register: u8,
    pub value: u8,
}

/// Records audio register writes. Clones share one log, so a handle can be
/// kept while the machine owns the sink.
#[derive(Debug, Clone, Default)]
pub struct AudioLog {
    inner: Rc<RefCell<LogState>>,
}

#[derive(Debug, Default)]
struct LogState {
    frame: u64,
    writes: Vec<AudioWrite>,
}

impl AudioLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far.
    #[must_use]
    pub fn drain(&self) -> Vec<AudioWrite> {
        std::mem::take(&mut self.inner.borrow_mut().writes)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().writes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AudioSink for AudioLog {
    fn register_write(&mut self, register: u8, value: u8, cycle: u32) {
        let mut state = self.inner.borrow_mut();
        let frame = state.frame;
        state.writes.push(AudioWrite {
            frame,
            cycle,
            register,
            value,
        });
    }

    /// Called once per frame as the cycle counter restarts.
    fn cycles_reset(&mut self, _cycles: u32) {
        self.inner.borrow_mut().frame += 1;
    }

    fn reset(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.frame = 0;
        state.writes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let log = AudioLog::new();
        let mut sink = log.clone();
        sink.register_write(0x15, 4, 100);
        sink.cycles_reset(19_912);
        sink.register_write(0x19, 15, 7);
        assert_eq!(
            log.drain(),
            vec![
                AudioWrite { frame: 0, cycle: 100, register: 0x15, value: 4 },
                AudioWrite { frame: 1, cycle: 7, register: 0x19, value: 15 },
            ]
        );
        assert!(log.is_empty());
    }

    #[test]
    fn reset_clears() {
        let log = AudioLog::new();
        let mut sink = log.clone();
        sink.register_write(0x15, 4, 100);
        sink.reset();
        assert!(log.is_empty());
    }
}
