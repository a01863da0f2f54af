//! MOS 6532 RIOT (RAM, I/O and timer).
//!
//! In the 2600 the RIOT supplies all 128 bytes of system RAM, reads the
//! joysticks on port A and the console switches on port B, and provides
//! the interval timer kernels use to pace vertical blank and overscan.
//!
//! # Address decoding
//!
//! The chip answers wherever `(address & 0x1080) == 0x0080`. Bit 9 selects
//! between RAM (clear) and the I/O/timer registers (set):
//!
//! | `addr & 7` | Read            | Write                      |
//! |------------|-----------------|----------------------------|
//! | 0          | port A (sticks) | port A, through DDRA       |
//! | 1          | DDRA            | DDRA                       |
//! | 2          | port B (switches) | ignored                  |
//! | 3          | DDRB            | ignored                    |
//! | 4, 6       | timer           | see below                  |
//! | 5, 7       | interrupt flag  | see below                  |
//!
//! Writes with `(addr & 0x17)` of 0x14-0x17 start the timer at the written
//! value with an interval of 1, 8, 64 or 1024 cycles.
//!
//! The timer is not ticked. It stores the cycle it was set on and derives
//! its count whenever it is read.

use emu_core::{
    AddressSpace, Device, DeviceId, DigitalPin, Jack, Observable, PAGE_COUNT, PAGE_SHIFT,
    PageBinding, SharedMemory, Value,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bytes of RAM.
pub const RAM_SIZE: usize = 128;

/// Timer interval shifts for TIM1T, TIM8T, TIM64T and TIM1024T.
const INTERVAL_SHIFTS: [u32; 4] = [0, 3, 6, 10];

/// Port A bit for each joystick pin, left jack in the high nibble.
const PORT_A_PINS: [(Jack, DigitalPin, u8); 8] = [
    (Jack::Left, DigitalPin::One, 0x10),
    (Jack::Left, DigitalPin::Two, 0x20),
    (Jack::Left, DigitalPin::Three, 0x40),
    (Jack::Left, DigitalPin::Four, 0x80),
    (Jack::Right, DigitalPin::One, 0x01),
    (Jack::Right, DigitalPin::Two, 0x02),
    (Jack::Right, DigitalPin::Three, 0x04),
    (Jack::Right, DigitalPin::Four, 0x08),
];

/// What the RIOT needs from the system on each register access.
pub trait RiotContext {
    /// Processor cycles since the last counter reset.
    fn cycles(&self) -> u32;

    /// Level of a controller pin (`true` = high).
    fn digital(&self, jack: Jack, pin: DigitalPin) -> bool;

    /// Drive a controller pin from port A.
    fn drive(&mut self, jack: Jack, pin: DigitalPin, level: bool);

    /// Console switch byte presented on port B.
    fn switches(&self) -> u8;
}

/// MOS 6532 RIOT.
pub struct Riot {
    /// RAM, mirrored through direct page bindings.
    ram: SharedMemory,
    rng: StdRng,

    /// Value the timer was last started at.
    timer: u8,
    /// Log2 of the timer interval in cycles.
    interval_shift: u32,
    /// Cycle the timer was last written.
    cycles_when_timer_set: i64,
    /// Cycle of the first timer read after it expired.
    cycles_when_interrupt_reset: i64,
    /// The timer has been read since it expired.
    timer_read_after_interrupt: bool,

    /// Port A data direction (1 = output).
    ddra: u8,
    /// Port B data direction. Writes are ignored: port B is input only here.
    ddrb: u8,
}

impl Riot {
    /// A RIOT whose RAM and power-on timer come from `seed`, or from the
    /// operating system when there is none.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let ram = SharedMemory::new(RAM_SIZE);
        ram.fill_with(|| rng.gen_range(0..255));
        Self {
            ram,
            rng,
            timer: 0,
            interval_shift: 6,
            cycles_when_timer_set: 0,
            cycles_when_interrupt_reset: 0,
            timer_read_after_interrupt: false,
            ddra: 0,
            ddrb: 0,
        }
    }

    /// The RAM, shared with the page table.
    #[must_use]
    pub fn ram(&self) -> &SharedMemory {
        &self.ram
    }

    /// Current timer count as a program reading INTIM at `cycles` would see it.
    ///
    /// Reading past expiry latches the read-after-interrupt state, exactly
    /// as a real read does.
    pub fn read_timer(&mut self, cycles: u32) -> u8 {
        let now = i64::from(cycles);
        let elapsed = now - 1 - self.cycles_when_timer_set;
        let timer = i64::from(self.timer);
        let shift = self.interval_shift;

        let count = timer - (elapsed >> shift) - 1;
        if count >= 0 {
            return count as u8;
        }

        // Expired: the count now falls once per cycle.
        let mut count = (timer << shift) - elapsed - 1;
        if count <= -2 && !self.timer_read_after_interrupt {
            self.timer_read_after_interrupt = true;
            self.cycles_when_interrupt_reset = now;
        }
        if self.timer_read_after_interrupt {
            let offset =
                self.cycles_when_interrupt_reset - (self.cycles_when_timer_set + (timer << shift));
            count = timer - (elapsed >> shift) - offset;
        }
        (count & 0xFF) as u8
    }

    /// TIMINT: bit 7 set once the timer has expired, until it is read.
    #[must_use]
    pub fn interrupt_flag(&self, cycles: u32) -> u8 {
        let elapsed = i64::from(cycles) - 1 - self.cycles_when_timer_set;
        let count = i64::from(self.timer) - (elapsed >> self.interval_shift) - 1;
        if count >= 0 || self.timer_read_after_interrupt {
            0x00
        } else {
            0x80
        }
    }

    fn start_timer(&mut self, value: u8, interval: usize, cycles: u32) {
        self.timer = value;
        self.interval_shift = INTERVAL_SHIFTS[interval & 3];
        self.cycles_when_timer_set = i64::from(cycles);
        self.timer_read_after_interrupt = false;
    }

    fn read_port_a<C: RiotContext>(ctx: &C) -> u8 {
        PORT_A_PINS
            .iter()
            .filter(|&&(jack, pin, _)| ctx.digital(jack, pin))
            .fold(0, |value, &(_, _, bit)| value | bit)
    }

    fn write_port_a<C: RiotContext>(&self, value: u8, ctx: &mut C) {
        let driven = value & self.ddra;
        for (jack, pin, bit) in PORT_A_PINS {
            ctx.drive(jack, pin, driven & bit != 0);
        }
    }
}

impl<C: RiotContext> Device<C> for Riot {
    fn install(&mut self, pages: &mut AddressSpace, id: DeviceId) {
        for page in 0..PAGE_COUNT {
            let address = (page as u16) << PAGE_SHIFT;
            if address & 0x1080 != 0x0080 {
                continue;
            }
            let binding = if address & 0x0200 == 0 {
                PageBinding::direct(id, &self.ram, usize::from(address & 0x7F))
            } else {
                PageBinding::device(id)
            };
            pages.bind(page, binding);
        }
    }

    fn reset(&mut self, _ctx: &mut C) {
        self.timer = 25 + self.rng.gen_range(0..75);
        self.interval_shift = 6;
        self.cycles_when_timer_set = 0;
        self.cycles_when_interrupt_reset = 0;
        self.timer_read_after_interrupt = false;
        self.ddra = 0;
        self.ddrb = 0;
        log::debug!("RIOT reset: timer {} x64", self.timer);
    }

    fn read(&mut self, address: u16, ctx: &mut C) -> u8 {
        match address & 0x07 {
            0x00 => Self::read_port_a(ctx),
            0x01 => self.ddra,
            0x02 => ctx.switches(),
            0x03 => self.ddrb,
            0x04 | 0x06 => self.read_timer(ctx.cycles()),
            _ => self.interrupt_flag(ctx.cycles()),
        }
    }

    fn write(&mut self, address: u16, value: u8, ctx: &mut C) {
        match address & 0x07 {
            0x00 => self.write_port_a(value, ctx),
            0x01 => self.ddra = value,
            0x02 | 0x03 => {}
            _ if address & 0x17 >= 0x14 => {
                self.start_timer(value, usize::from(address & 0x03), ctx.cycles());
            }
            // Edge detect control: PA7 interrupts are not wired on the 2600.
            _ => {}
        }
    }

    fn cycles_reset(&mut self, cycles: u32) {
        self.cycles_when_timer_set -= i64::from(cycles);
        self.cycles_when_interrupt_reset -= i64::from(cycles);
    }
}

impl Observable for Riot {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "timer.start" => Some(self.timer.into()),
            "timer.interval" => Some((1u32 << self.interval_shift).into()),
            "timer.set_at" => Some(self.cycles_when_timer_set.into()),
            "timer.expired_read" => Some(self.timer_read_after_interrupt.into()),
            "ddra" => Some(self.ddra.into()),
            "ddrb" => Some(self.ddrb.into()),
            "ram" => Some(Value::List(
                self.ram.to_vec().into_iter().map(Value::from).collect(),
            )),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "timer.start",
            "timer.interval",
            "timer.set_at",
            "timer.expired_read",
            "ddra",
            "ddrb",
            "ram",
        ]
    }
}
