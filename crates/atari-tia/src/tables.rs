//! Constant lookup tables.
//!
//! Everything here is `const` and computed at compile time. The large
//! per-position mask tables live in [`crate::MaskTables`] instead.

use crate::registers::object::{BL, M0, M1, P0, P1, PF, PRIORITY, SCORE};

/// Extra colour clocks before a register write takes effect, by write
/// address. `-1` marks the playfield registers, whose delay depends on the
/// beam position (see [`PLAYFIELD_DELAY`]).
pub(crate) const POKE_DELAY: [i8; 64] = [
    0, 1, 0, 0, 8, 8, 0, 0, 0, 0, 0, 1, 1, -1, -1, -1, //
    0, 0, 8, 8, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
];

/// Playfield write delay, indexed by `(hpos / 3) & 3`.
pub(crate) const PLAYFIELD_DELAY: [i64; 4] = [4, 5, 2, 3];

/// Whether an HMOVE strobed at processor cycle `n` of the line (0-75)
/// blanks the first eight visible pixels.
pub(crate) const HMOVE_BLANK_ENABLE: [bool; 76] = {
    let mut table = [false; 76];
    let mut x = 0;
    while x <= 20 {
        table[x] = true;
        x += 1;
    }
    table[75] = true;
    table
};

/// Position change applied by HMOVE, indexed by the processor cycle of the
/// strobe within the line and the object's motion nibble.
///
/// Strobes during horizontal blank get the full documented motion. Late
/// strobes (cycles 55-74) cut the motion short and drag objects left.
#[rustfmt::skip]
pub(crate) const COMPLETE_MOTION: [[i8; 16]; 76] = [
    [0, -1, -2, -3, -4, -5, -6, -7, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -5, -6, -7, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -5, -6, -7, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -5, -6, -7, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -5, -6, -6, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -5, -5, -5, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -5, -5, -5, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -4, -4, -4, -4, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -3, -3, -3, -3, -3, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -2, -2, -2, -2, -2, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -2, -2, -2, -2, -2, -2, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, -1, -1, -1, -1, -1, -1, -1, 8, 7, 6, 5, 4, 3, 2, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 8, 7, 6, 5, 4, 3, 2, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 8, 7, 6, 5, 4, 3, 2, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 8, 7, 6, 5, 4, 3, 2, 1],
    [2, 2, 2, 2, 2, 2, 2, 2, 8, 7, 6, 5, 4, 3, 2, 2],
    [3, 3, 3, 3, 3, 3, 3, 3, 8, 7, 6, 5, 4, 3, 3, 3],
    [4, 4, 4, 4, 4, 4, 4, 4, 8, 7, 6, 5, 4, 4, 4, 4],
    [4, 4, 4, 4, 4, 4, 4, 4, 8, 7, 6, 5, 4, 4, 4, 4],
    [5, 5, 5, 5, 5, 5, 5, 5, 8, 7, 6, 5, 5, 5, 5, 5],
    [6, 6, 6, 6, 6, 6, 6, 6, 8, 7, 6, 6, 6, 6, 6, 6],
    [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16],
    [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16],
    [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16], [0; 16],
    [0; 16], [0; 16], [0; 16], [0; 16],
    [0, 0, 0, 0, 0, 0, 0, -1, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, -1, -2, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, -1, -2, -3, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, -1, -2, -3, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, -1, -2, -3, -4, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, -1, -2, -3, -4, -5, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, -1, -2, -3, -4, -5, -6, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, -1, -2, -3, -4, -5, -6, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, -1, -2, -3, -4, -5, -6, -7, 0, 0, 0, 0, 0, 0, 0, 0],
    [-1, -2, -3, -4, -5, -6, -7, -8, 0, 0, 0, 0, 0, 0, 0, 0],
    [-2, -3, -4, -5, -6, -7, -8, -9, 0, 0, 0, 0, 0, 0, 0, -1],
    [-2, -3, -4, -5, -6, -7, -8, -9, 0, 0, 0, 0, 0, 0, 0, -1],
    [-3, -4, -5, -6, -7, -8, -9, -10, 0, 0, 0, 0, 0, 0, -1, -2],
    [-4, -5, -6, -7, -8, -9, -10, -11, 0, 0, 0, 0, 0, -1, -2, -3],
    [-5, -6, -7, -8, -9, -10, -11, -12, 0, 0, 0, 0, -1, -2, -3, -4],
    [-5, -6, -7, -8, -9, -10, -11, -12, 0, 0, 0, 0, -1, -2, -3, -4],
    [-6, -7, -8, -9, -10, -11, -12, -13, 0, 0, 0, -1, -2, -3, -4, -5],
    [-7, -8, -9, -10, -11, -12, -13, -14, 0, 0, -1, -2, -3, -4, -5, -6],
    [-8, -9, -10, -11, -12, -13, -14, -15, 0, -1, -2, -3, -4, -5, -6, -7],
    [-8, -9, -10, -11, -12, -13, -14, -15, 0, -1, -2, -3, -4, -5, -6, -7],
    [0, -1, -2, -3, -4, -5, -6, -7, 8, 7, 6, 5, 4, 3, 2, 1],
];

/// Collision latch bits, by pair of objects. Bit positions match the order
/// the read registers report them in (see [`collision_bits`]).
const COLLISION_PAIRS: [(u8, u8, u16); 15] = [
    (M0, P1, 0x0001),
    (M0, P0, 0x0002),
    (M1, P0, 0x0004),
    (M1, P1, 0x0008),
    (P0, PF, 0x0010),
    (P0, BL, 0x0020),
    (P1, PF, 0x0040),
    (P1, BL, 0x0080),
    (M0, PF, 0x0100),
    (M0, BL, 0x0200),
    (M1, PF, 0x0400),
    (M1, BL, 0x0800),
    (BL, PF, 0x1000),
    (P0, P1, 0x2000),
    (M0, M1, 0x4000),
];

/// Latch bits set when the objects in `enabled` (low six bits) overlap.
pub const COLLISION_TABLE: [u16; 64] = {
    let mut table = [0u16; 64];
    let mut enabled = 0;
    while enabled < 64 {
        let mut bits = 0;
        let mut i = 0;
        while i < COLLISION_PAIRS.len() {
            let (a, b, bit) = COLLISION_PAIRS[i];
            if enabled as u8 & a != 0 && enabled as u8 & b != 0 {
                bits |= bit;
            }
            i += 1;
        }
        table[enabled] = bits;
        enabled += 1;
    }
    table
};

/// The latch bits reported in D7 and D6 of collision read register `register`
/// (0-7). CXBLPF has no D6 partner.
#[must_use]
pub const fn collision_bits(register: u8) -> (u16, u16) {
    match register & 7 {
        0 => (0x0001, 0x0002),
        1 => (0x0004, 0x0008),
        2 => (0x0010, 0x0020),
        3 => (0x0040, 0x0080),
        4 => (0x0100, 0x0200),
        5 => (0x0400, 0x0800),
        6 => (0x1000, 0),
        _ => (0x2000, 0x4000),
    }
}

/// Colour register chosen for a pixel: 0 = COLUBK, 1 = COLUPF, 2 = COLUP0,
/// 3 = COLUP1. Indexed by screen half (score mode colours the left half of
/// the playfield like P0 and the right like P1) and by the enabled-object
/// byte with the CTRLPF score/priority bits folded in.
pub const PRIORITY_ENCODER: [[u8; 256]; 2] = {
    let mut table = [[0u8; 256]; 2];
    let mut half = 0;
    while half < 2 {
        let mut enabled = 0;
        while enabled < 256 {
            let bits = enabled as u8;
            let mut color = 0;
            if bits & PRIORITY != 0 {
                if bits & (P1 | M1) != 0 {
                    color = 3;
                }
                if bits & (P0 | M0) != 0 {
                    color = 2;
                }
                if bits & (BL | PF) != 0 {
                    color = 1;
                }
            } else {
                if bits & BL != 0 {
                    color = 1;
                }
                if bits & PF != 0 {
                    color = if bits & SCORE == 0 {
                        1
                    } else if half == 0 {
                        2
                    } else {
                        3
                    };
                }
                if bits & (P1 | M1) != 0 {
                    color = if color == 2 { 2 } else { 3 };
                }
                if bits & (P0 | M0) != 0 {
                    color = 2;
                }
            }
            table[half][enabled] = color;
            enabled += 1;
        }
        half += 1;
    }
    table
};

/// Bit-reversed bytes, for REFPx.
pub(crate) const REFLECT: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
};

/// Bit of the packed 20-bit playfield (`PF0 >> 4 | PF1 << 4 | PF2 << 12`)
/// shown at each visible pixel, for the normal and reflected right half.
pub(crate) const PLAYFIELD_MASK: [[u32; 160]; 2] = {
    let mut table = [[0u32; 160]; 2];
    let mut x = 0;
    while x < 160 {
        let block = x / 4;
        let left = match block {
            0..=3 => 1u32 << block,
            4..=11 => 0x800 >> (block - 4),
            12..=19 => 0x1000 << (block - 12),
            20..=23 => 1 << (block - 20),
            24..=31 => 0x800 >> (block - 24),
            _ => 0x1000 << (block - 32),
        };
        let reflected = match block {
            0..=19 => left,
            20..=27 => 0x80000 >> (block - 20),
            28..=35 => 0x10 << (block - 28),
            _ => 0x8 >> (block - 36),
        };
        table[0][x] = left;
        table[1][x] = reflected;
        x += 1;
    }
    table
};
