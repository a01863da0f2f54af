//! Cycle-accurate Atari 2600 emulator.
//!
//! The console runs the 6507 at 1.19 MHz (NTSC) with the TIA clocked three
//! times faster. There is no frame buffer on the real machine; the program
//! races the beam, writing TIA registers a few cycles ahead of the pixels
//! they affect. Here the TIA catches up lazily whenever it is touched, and
//! a frame ends when the program releases VSYNC.
//!
//! One NTSC frame is nominally 262 lines of 76 processor cycles.

mod audio;
mod bus;
pub mod capture;
mod cartridge;
mod config;
mod controller;
mod machine;
pub mod palette;
mod switches;

pub use audio::{AudioLog, AudioWrite};
pub use bus::SystemBus;
pub use cartridge::{BankScheme, Cartridge, CartridgeError};
pub use config::{MachineConfig, TvStandard};
pub use controller::{Controller, ControllerPorts, JoystickInput, Paddle};
pub use machine::{FrameStatus, Machine, MachineError};
pub use switches::{ConsoleSwitch, ConsoleSwitches};
