//! Per-position object mask tables.
//!
//! Every movable object is drawn by indexing a 320-entry row with
//! `offset + hpos`, where `offset = 160 - (pos & 0xFC)` slides a row built
//! for position 0 across the line and the row's alignment (`pos & 3`)
//! supplies the remaining two bits. Rows are twice the visible width so
//! that copies pushed past the right edge wrap to the left.

const VISIBLE: usize = 160;

/// Entries per mask row.
pub const MASK_ROW: usize = 2 * VISIBLE;

/// Player rows per alignment: two first-copy states by eight NUSIZ modes.
const PLAYER_SHAPES: usize = 16;
/// Missile rows per alignment: eight NUSIZ modes by four widths.
const MISSILE_SHAPES: usize = 32;
/// Ball rows per alignment: four widths.
const BALL_SHAPES: usize = 4;

/// Offsets of the copies drawn by each NUSIZ mode, 0 terminating the list
/// after the first entry.
const COPIES: [[usize; 3]; 8] = [
    [0, 0, 0],
    [0, 16, 0],
    [0, 32, 0],
    [0, 16, 32],
    [0, 64, 0],
    [0, 0, 0],
    [0, 32, 64],
    [0, 0, 0],
];

fn copy_offsets(mode: usize) -> impl Iterator<Item = usize> {
    let [_, second, third] = COPIES[mode & 7];
    std::iter::once(0).chain([second, third].into_iter().filter(|&o| o != 0))
}

/// Selects one mask row: which object shape, and where on the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskDescriptor {
    /// `pos & 3`.
    pub alignment: u8,
    /// Row within the object's table for this alignment.
    pub shape: u8,
    /// `160 - (pos & 0xFC)`; zero for the power-on descriptor.
    pub offset: u8,
}

impl MaskDescriptor {
    fn at(pos: u8, shape: u8) -> Self {
        debug_assert!(usize::from(pos) < VISIBLE, "position {pos} off the line");
        Self {
            alignment: pos & 0x03,
            shape,
            offset: (VISIBLE as u8).wrapping_sub(pos & 0xFC),
        }
    }

    /// A player at `pos` drawn in NUSIZ `mode`. With `skip_first` the copy
    /// at the position itself is suppressed for the rest of the line.
    #[must_use]
    pub fn player(pos: u8, skip_first: bool, mode: u8) -> Self {
        Self::at(pos, u8::from(skip_first) * 8 + (mode & 7))
    }

    /// A missile at `pos` drawn in NUSIZ `mode`, `size` being the width class
    /// (1, 2, 4 or 8 pixels for 0-3).
    #[must_use]
    pub fn missile(pos: u8, mode: u8, size: u8) -> Self {
        Self::at(pos, (mode & 7) * 4 + (size & 3))
    }

    /// The ball at `pos`, `size` as for missiles.
    #[must_use]
    pub fn ball(pos: u8, size: u8) -> Self {
        Self::at(pos, size & 3)
    }

    fn index(self, shapes: usize, hpos: usize) -> usize {
        let row = usize::from(self.alignment) * shapes + usize::from(self.shape);
        row * MASK_ROW + usize::from(self.offset) + hpos
    }
}

/// Where a RESPx strobe lands relative to the copies the player is
/// already drawing on this line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTiming {
    /// Inside a copy's start delay: the copy restarts at the new position.
    InDelay,
    /// Clear of every copy: the first copy at the new position waits a line.
    Clear,
    /// A copy is mid-draw: it finishes before the move takes effect.
    MidCopy,
}

/// Mask rows for every object, alignment and shape, plus the RESPx timing
/// table. Built once and shared between TIAs.
#[derive(Debug, Clone)]
pub struct MaskTables {
    player: Vec<u8>,
    missile: Vec<bool>,
    ball: Vec<bool>,
    position_reset: Vec<i8>,
}

impl Default for MaskTables {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskTables {
    #[must_use]
    pub fn new() -> Self {
        let tables = Self {
            player: build_player(),
            missile: build_missile(),
            ball: build_ball(),
            position_reset: build_position_reset(),
        };
        log::trace!(
            "TIA mask tables built ({} bytes)",
            tables.player.len()
                + tables.missile.len()
                + tables.ball.len()
                + tables.position_reset.len()
        );
        tables
    }

    /// Graphic bit (0x80 = leftmost pixel) of a player at `hpos`, or 0.
    #[must_use]
    pub fn player(&self, mask: MaskDescriptor, hpos: usize) -> u8 {
        self.player[mask.index(PLAYER_SHAPES, hpos)]
    }

    #[must_use]
    pub fn missile(&self, mask: MaskDescriptor, hpos: usize) -> bool {
        self.missile[mask.index(MISSILE_SHAPES, hpos)]
    }

    #[must_use]
    pub fn ball(&self, mask: MaskDescriptor, hpos: usize) -> bool {
        self.ball[mask.index(BALL_SHAPES, hpos)]
    }

    /// Classify a RESPx that moves a player in NUSIZ `mode` from `old` to `new`.
    #[must_use]
    pub fn position_reset(&self, mode: u8, old: u8, new: u8) -> ResetTiming {
        let index =
            (usize::from(mode & 7) * VISIBLE + usize::from(old)) * VISIBLE + usize::from(new);
        match self.position_reset[index] {
            -1 => ResetTiming::InDelay,
            1 => ResetTiming::MidCopy,
            _ => ResetTiming::Clear,
        }
    }
}

/// Fill the wrap-around half of every alignment-0 row, then derive
/// alignments 1-3 by shifting right one pixel each.
fn finish_rows<T: Copy>(table: &mut [T], shapes: usize) {
    for shape in 0..shapes {
        let row = shape * MASK_ROW;
        for x in 0..VISIBLE {
            table[row + VISIBLE + x] = table[row + x];
        }
    }
    for alignment in 1..4 {
        for shape in 0..shapes {
            let src = shape * MASK_ROW;
            let dst = (alignment * shapes + shape) * MASK_ROW;
            for x in 0..MASK_ROW {
                table[dst + x] = table[src + (x + MASK_ROW - alignment) % MASK_ROW];
            }
        }
    }
}

fn build_ball() -> Vec<bool> {
    let mut table = vec![false; 4 * BALL_SHAPES * MASK_ROW];
    for size in 0..4 {
        let row = size * MASK_ROW;
        for x in 0..(1 << size) {
            table[row + x] = true;
        }
    }
    finish_rows(&mut table, BALL_SHAPES);
    table
}

fn build_missile() -> Vec<bool> {
    let mut table = vec![false; 4 * MISSILE_SHAPES * MASK_ROW];
    for mode in 0..8 {
        for size in 0..4 {
            let row = (mode * 4 + size) * MASK_ROW;
            for start in copy_offsets(mode) {
                for x in start..start + (1 << size) {
                    table[row + x % VISIBLE] = true;
                }
            }
        }
    }
    finish_rows(&mut table, MISSILE_SHAPES);
    table
}

fn build_player() -> Vec<u8> {
    let mut table = vec![0u8; 4 * PLAYER_SHAPES * MASK_ROW];
    for skip_first in 0..2 {
        for mode in 0..8 {
            let row = (skip_first * 8 + mode) * MASK_ROW;
            match mode {
                // Double and quad width start one pixel late.
                5 | 7 => {
                    let scale = if mode == 5 { 2 } else { 4 };
                    if skip_first == 0 {
                        for x in 1..=8 * scale {
                            table[row + x] = 0x80 >> ((x - 1) / scale);
                        }
                    }
                }
                _ => {
                    for start in copy_offsets(mode) {
                        if start == 0 && skip_first == 1 {
                            continue;
                        }
                        for bit in 0..8 {
                            table[row + (start + bit) % VISIBLE] = 0x80 >> bit;
                        }
                    }
                }
            }
        }
    }
    finish_rows(&mut table, PLAYER_SHAPES);
    table
}

fn build_position_reset() -> Vec<i8> {
    let mut table = vec![0i8; 8 * VISIBLE * VISIBLE];
    for mode in 0..8 {
        let width = match mode {
            5 => 16,
            7 => 32,
            _ => 8,
        };
        for old in 0..VISIBLE {
            let row = (mode * VISIBLE + old) * VISIBLE;
            for start in copy_offsets(mode) {
                let delay = old + start;
                for new in delay..delay + 4 {
                    table[row + new % VISIBLE] = -1;
                }
            }
            for start in copy_offsets(mode) {
                let shown = old + start + 4;
                for new in shown..shown + width {
                    table[row + new % VISIBLE] = 1;
                }
            }
        }
    }
    table
}
