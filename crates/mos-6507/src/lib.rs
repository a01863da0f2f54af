//! MOS 6507 interpreter.
//!
//! Executes whole instructions. Each bus read is preceded by one cycle
//! reported to the [`emu_core::CycleSink`], so devices observe the clock at
//! the moment of the access; the remainder of an instruction's cost is
//! reported once it finishes.

mod cpu;
mod error;
pub mod flags;
mod registers;
pub mod tables;

pub use cpu::{Mos6507, mnemonic};
pub use error::DecodeError;
pub use flags::Flags;
pub use registers::Registers;
