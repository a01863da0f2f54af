use thiserror::Error;

/// Execution cannot continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The opcode at `address` has no implementation.
    #[error("unknown opcode {opcode:#04X} at {address:#06X}")]
    UnknownOpcode { address: u16, opcode: u8 },
}
