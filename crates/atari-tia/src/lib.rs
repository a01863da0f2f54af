//! Atari TIA (Television Interface Adapter).
//!
//! The TIA has no frame buffer of its own on real hardware: it turns
//! register values into a video signal as the beam sweeps. Here the beam
//! is lazy. Nothing is drawn until the processor touches a TIA register,
//! at which point every colour clock since the previous touch is rendered
//! with the register values that were in force during that span.
//!
//! # Timing
//!
//! - 3 colour clocks per processor cycle
//! - 228 colour clocks per scanline, the first 68 of them horizontal blank
//! - 160 visible pixels per line
//!
//! # Objects
//!
//! | Object | Position register | Shape                          |
//! |--------|-------------------|--------------------------------|
//! | P0/P1  | RESP0/RESP1       | 8-bit graphic, NUSIZ copies    |
//! | M0/M1  | RESM0/RESM1       | 1-8 pixel line, NUSIZ copies   |
//! | BL     | RESBL             | 1-8 pixel line                 |
//! | PF     | n/a               | 20 four-pixel blocks, mirrored |
//!
//! Which pixels an object covers is answered by precomputed mask tables
//! ([`MaskTables`]) indexed by a small [`MaskDescriptor`] per object.

mod audio;
mod masks;
pub mod registers;
mod tables;
mod tia;
mod video;

pub use audio::{AudioSink, NullAudio};
pub use masks::{MaskDescriptor, MaskTables, ResetTiming};
pub use tables::{COLLISION_TABLE, PRIORITY_ENCODER, collision_bits};
pub use tia::{Tia, TiaContext, VideoSettings};
pub use video::{FRAME_HEIGHT_MAX, FRAME_HEIGHT_MIN, FRAME_PIXELS, FRAME_WIDTH, FrameBuffers};

/// Colour clocks per processor cycle.
pub const CLOCKS_PER_CPU_CYCLE: i64 = 3;

/// Colour clocks of horizontal blank at the start of each line.
pub const CLOCKS_PER_LINE_BLANK: i64 = 68;

/// Visible pixels per line.
pub const CLOCKS_PER_LINE_VISIBLE: i64 = 160;

/// Colour clocks per scanline.
pub const CLOCKS_PER_LINE_TOTAL: i64 = 228;

/// Processor cycles per scanline.
pub const CYCLES_PER_LINE: i64 = CLOCKS_PER_LINE_TOTAL / CLOCKS_PER_CPU_CYCLE;
