//! 6507 processor status register (P).
//!
//! Flags are kept as separate booleans and only packed into a byte when
//! the status is pushed or pulled.

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// Interrupt disable.
pub const I: u8 = 0x04;
/// Decimal mode.
pub const D: u8 = 0x08;
/// Break. Only meaningful in a pushed status byte.
pub const B: u8 = 0x10;
/// Unused bit, always reads as 1.
pub const U: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// Processor status.
///
/// Zero is held inverted as `not_zero`, which lets ALU code store the raw
/// result test directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Flags {
    pub n: bool,
    pub v: bool,
    pub b: bool,
    pub d: bool,
    pub i: bool,
    pub not_z: bool,
    pub c: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self::from_byte(U)
    }
}

impl Flags {
    /// Unpack a status byte.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self {
            n: value & N != 0,
            v: value & V != 0,
            b: value & B != 0,
            d: value & D != 0,
            i: value & I != 0,
            not_z: value & Z == 0,
            c: value & C != 0,
        }
    }

    /// Pack into a status byte; the unused bit is always set.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        let mut value = U;
        if self.n {
            value |= N;
        }
        if self.v {
            value |= V;
        }
        if self.b {
            value |= B;
        }
        if self.d {
            value |= D;
        }
        if self.i {
            value |= I;
        }
        if !self.not_z {
            value |= Z;
        }
        if self.c {
            value |= C;
        }
        value
    }

    /// True when the zero flag is set.
    #[must_use]
    pub const fn zero(self) -> bool {
        !self.not_z
    }

    /// Update N and Z from a result.
    pub fn update_nz(&mut self, value: u8) {
        self.n = value & 0x80 != 0;
        self.not_z = value != 0;
    }
}
