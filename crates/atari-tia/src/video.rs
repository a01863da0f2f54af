//! Double-buffered frame storage.

/// Pixels per line.
pub const FRAME_WIDTH: usize = 160;

/// Tallest frame the buffers hold.
pub const FRAME_HEIGHT_MAX: usize = 300;

/// A detected picture shorter than this is treated as noise.
pub const FRAME_HEIGHT_MIN: usize = 100;

/// Bytes per buffer.
pub const FRAME_PIXELS: usize = FRAME_WIDTH * FRAME_HEIGHT_MAX;

/// Two frames of colour register values, one byte per pixel, row-major.
///
/// The TIA renders into `current`. Starting a frame swaps, so `previous`
/// always holds the last completed picture while the next one is drawn.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    current: Vec<u8>,
    previous: Vec<u8>,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: vec![0; FRAME_PIXELS],
            previous: vec![0; FRAME_PIXELS],
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }

    pub fn clear(&mut self) {
        self.current.fill(0);
        self.previous.fill(0);
    }

    #[must_use]
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    #[must_use]
    pub fn previous(&self) -> &[u8] {
        &self.previous
    }

    /// Store `value` at `index` in the current frame; out-of-range writes
    /// are dropped.
    pub(crate) fn set(&mut self, index: usize, value: u8) {
        if let Some(pixel) = self.current.get_mut(index) {
            *pixel = value;
        }
    }

    /// Fill `count` pixels of the current frame from `start`, clamped to the
    /// buffer.
    pub(crate) fn fill(&mut self, start: usize, count: usize, value: u8) {
        let end = (start + count).min(self.current.len());
        if start < end {
            self.current[start..end].fill(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_frames() {
        let mut buffers = FrameBuffers::new();
        buffers.set(0, 0x1E);
        buffers.swap();
        assert_eq!(buffers.previous()[0], 0x1E);
        assert_eq!(buffers.current()[0], 0);
    }

    #[test]
    fn fill_is_clamped() {
        let mut buffers = FrameBuffers::new();
        buffers.fill(FRAME_PIXELS - 2, 10, 0x42);
        assert_eq!(&buffers.current()[FRAME_PIXELS - 3..], &[0, 0x42, 0x42]);
        buffers.set(FRAME_PIXELS, 0xFF);
    }
}
