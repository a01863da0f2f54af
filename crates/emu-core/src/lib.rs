//! Core traits and types for cycle-counted emulation.
//!
//! The processor drives time: every bus access it makes is preceded by a
//! signalled cycle, and peripherals catch up to the cycle count lazily when
//! they are touched. Memory mapping is page based, so a read or write costs
//! one table lookup before it reaches RAM, ROM, or a device.

mod bus;
mod clock;
mod cpu;
mod device;
mod input;
mod memory;
mod observable;
mod page;

pub use bus::{Bus, CycleSink};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use device::{Device, DeviceId};
pub use input::{AnalogPin, DigitalPin, InputSource, Jack, RESISTANCE_MAX, RESISTANCE_MIN};
pub use memory::SharedMemory;
pub use observable::{Observable, Value};
pub use page::{
    ADDRESS_MASK, Access, AddressSpace, PAGE_COUNT, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE, PageBinding,
    Routed,
};
