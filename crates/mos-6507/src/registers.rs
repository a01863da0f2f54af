//! 6507 CPU registers.

use crate::Flags;

/// 6507 register set.
///
/// Same programming model as the 6502:
/// - A: 8-bit accumulator
/// - X, Y: 8-bit index registers
/// - SP: 8-bit stack pointer (stack is at $0100-$01FF, mirrored onto RIOT RAM)
/// - PC: 16-bit program counter, although only 13 address lines leave the chip
/// - P: processor status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub p: Flags,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers in their reset state; PC still has to be fetched from the vector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF,
            pc: 0,
            p: Flags::from_byte(crate::flags::U),
        }
    }

    /// Address for a push; SP moves down afterwards.
    pub fn push(&mut self) -> u16 {
        let addr = self.stack_addr();
        self.sp = self.sp.wrapping_sub(1);
        addr
    }

    /// Address of the current top of stack; SP moves up first.
    pub fn pop(&mut self) -> u16 {
        self.sp = self.sp.wrapping_add(1);
        self.stack_addr()
    }

    /// Current stack address without modifying SP.
    #[must_use]
    pub const fn stack_addr(&self) -> u16 {
        0x0100 | (self.sp as u16)
    }
}
