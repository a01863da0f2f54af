//! System bus: page routing, the cycle counter and device contexts.
//!
//! Every processor access goes through the page table. Direct pages (RIOT
//! RAM, cartridge bank windows) are served from shared memory without
//! touching a device; indirect pages are dispatched to the TIA, the RIOT
//! or the cartridge by device id, each with the context it needs.
//!
//! | Range (13-bit)               | Device                  |
//! |------------------------------|-------------------------|
//! | `addr & 0x1080 == 0x0000`    | TIA                     |
//! | `addr & 0x1280 == 0x0080`    | RIOT RAM (direct)       |
//! | `addr & 0x1280 == 0x0280`    | RIOT I/O and timer      |
//! | `addr & 0x1000 == 0x1000`    | cartridge               |
//!
//! A 3F cartridge also claims the page at $00-$3F to see its bank writes.
//! Reads there still come from the TIA and writes reach both devices.

use atari_tia::{AudioSink, NullAudio, Tia, TiaContext};
use emu_core::{
    AddressSpace, AnalogPin, Bus, CycleSink, Device, DeviceId, DigitalPin, InputSource, Jack,
    Routed,
};
use mos_riot_6532::{Riot, RiotContext};

use crate::cartridge::Cartridge;
use crate::controller::ControllerPorts;
use crate::switches::ConsoleSwitches;

pub(crate) const TIA: DeviceId = DeviceId(0);
pub(crate) const RIOT: DeviceId = DeviceId(1);
pub(crate) const CARTRIDGE: DeviceId = DeviceId(2);

/// The console bus.
pub struct SystemBus {
    pages: AddressSpace,
    tia: Tia,
    riot: Riot,
    cartridge: Option<Cartridge>,

    /// Processor cycles since the last counter reset.
    cycles: u32,
    /// Last value read or written; undriven TIA bits float to it.
    data_bus: u8,
    /// Cooperative stop, checked by the processor between instructions.
    stop: bool,
    last_access_was_read: bool,

    ports: ControllerPorts,
    switches: ConsoleSwitches,
    audio: Box<dyn AudioSink>,
}

/// What a TIA or RIOT access sees of the rest of the console.
struct Link<'a> {
    cycles: &'a mut u32,
    data_bus: u8,
    stop: &'a mut bool,
    last_access_was_read: bool,
    ports: &'a mut ControllerPorts,
    switches: ConsoleSwitches,
    audio: &'a mut dyn AudioSink,
}

impl TiaContext for Link<'_> {
    fn cycles(&self) -> u32 {
        *self.cycles
    }

    fn add_cycles(&mut self, cycles: u32) {
        *self.cycles = self.cycles.saturating_add(cycles);
    }

    fn data_bus(&self) -> u8 {
        self.data_bus
    }

    fn stop_cpu(&mut self) {
        *self.stop = true;
    }

    fn last_access_was_read(&self) -> bool {
        self.last_access_was_read
    }

    fn digital(&self, jack: Jack, pin: DigitalPin) -> bool {
        self.ports.digital(jack, pin)
    }

    fn resistance(&self, jack: Jack, pin: AnalogPin) -> u32 {
        self.ports.resistance(jack, pin)
    }

    fn audio(&mut self) -> &mut dyn AudioSink {
        &mut *self.audio
    }
}

impl RiotContext for Link<'_> {
    fn cycles(&self) -> u32 {
        *self.cycles
    }

    fn digital(&self, jack: Jack, pin: DigitalPin) -> bool {
        self.ports.digital(jack, pin)
    }

    fn drive(&mut self, jack: Jack, pin: DigitalPin, level: bool) {
        self.ports.drive(jack, pin, level);
    }

    fn switches(&self) -> u8 {
        self.switches.bits()
    }
}

impl SystemBus {
    /// A bus with the TIA and RIOT installed and no cartridge.
    #[must_use]
    pub fn new(tia: Tia, riot: Riot) -> Self {
        let mut bus = Self {
            pages: AddressSpace::new(),
            tia,
            riot,
            cartridge: None,
            cycles: 0,
            data_bus: 0,
            stop: false,
            last_access_was_read: true,
            ports: ControllerPorts::default(),
            switches: ConsoleSwitches::default(),
            audio: Box::new(NullAudio),
        };
        Device::<Link<'_>>::install(&mut bus.riot, &mut bus.pages, RIOT);
        Device::<Link<'_>>::install(&mut bus.tia, &mut bus.pages, TIA);
        bus
    }

    /// Swap cartridges. The old one's pages are released first.
    pub fn insert_cartridge(&mut self, mut cartridge: Cartridge) -> Option<Cartridge> {
        self.pages.unbind(CARTRIDGE);
        Device::<Link<'_>>::install(&mut self.tia, &mut self.pages, TIA);
        cartridge.install(&mut self.pages, CARTRIDGE);
        self.cartridge.replace(cartridge)
    }

    /// Power-on reset of every device. The processor is reset separately.
    pub fn reset(&mut self) {
        self.reset_cycles();
        self.stop = false;
        self.last_access_was_read = true;
        let (tia, riot, mut link) = self.split();
        riot.reset(&mut link);
        tia.reset(&mut link);
        if let Some(cartridge) = self.cartridge.as_mut() {
            cartridge.reset(&mut self.pages);
        }
    }

    /// Restart the cycle counter at zero, rebasing every stored stamp.
    pub fn reset_cycles(&mut self) {
        let cycles = self.cycles;
        Device::<Link<'_>>::cycles_reset(&mut self.tia, cycles);
        Device::<Link<'_>>::cycles_reset(&mut self.riot, cycles);
        self.audio.cycles_reset(cycles);
        self.cycles = 0;
    }

    /// Clear a pending stop before running another slice.
    pub fn clear_stop(&mut self) {
        self.stop = false;
    }

    #[must_use]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    #[must_use]
    pub fn tia(&self) -> &Tia {
        &self.tia
    }

    pub fn tia_mut(&mut self) -> &mut Tia {
        &mut self.tia
    }

    #[must_use]
    pub fn riot(&self) -> &Riot {
        &self.riot
    }

    #[must_use]
    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    #[must_use]
    pub fn pages(&self) -> &AddressSpace {
        &self.pages
    }

    #[must_use]
    pub fn ports(&self) -> &ControllerPorts {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut ControllerPorts {
        &mut self.ports
    }

    #[must_use]
    pub fn switches(&self) -> ConsoleSwitches {
        self.switches
    }

    pub fn switches_mut(&mut self) -> &mut ConsoleSwitches {
        &mut self.switches
    }

    pub fn set_audio(&mut self, audio: Box<dyn AudioSink>) {
        self.audio = audio;
    }

    /// Read without side effects. Indirect pages read as `None`.
    #[must_use]
    pub fn peek(&self, address: u16) -> Option<u8> {
        match self.pages.route_read(address) {
            Routed::Data(value) => Some(value),
            Routed::Device(_) => None,
        }
    }

    fn split(&mut self) -> (&mut Tia, &mut Riot, Link<'_>) {
        let link = Link {
            cycles: &mut self.cycles,
            data_bus: self.data_bus,
            stop: &mut self.stop,
            last_access_was_read: self.last_access_was_read,
            ports: &mut self.ports,
            switches: self.switches,
            audio: self.audio.as_mut(),
        };
        (&mut self.tia, &mut self.riot, link)
    }

    fn device_read(&mut self, id: DeviceId, address: u16) -> u8 {
        match id {
            CARTRIDGE if address & 0x1000 != 0 => match self.cartridge.as_mut() {
                Some(cartridge) => cartridge.read(address, &mut self.pages),
                None => 0,
            },
            RIOT => {
                let (_, riot, mut link) = self.split();
                riot.read(address, &mut link)
            }
            _ => {
                let (tia, _, mut link) = self.split();
                tia.read(address, &mut link)
            }
        }
    }

    fn device_write(&mut self, id: DeviceId, address: u16, value: u8) {
        match id {
            CARTRIDGE => {
                if let Some(cartridge) = self.cartridge.as_mut() {
                    cartridge.write(address, value, &mut self.pages);
                }
                if address & 0x1000 == 0 {
                    let (tia, _, mut link) = self.split();
                    tia.write(address, value, &mut link);
                }
            }
            RIOT => {
                let (_, riot, mut link) = self.split();
                riot.write(address, value, &mut link);
            }
            _ => {
                let (tia, _, mut link) = self.split();
                tia.write(address, value, &mut link);
            }
        }
    }
}

impl Bus for SystemBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = match self.pages.route_read(address) {
            Routed::Data(value) => value,
            Routed::Device(id) => self.device_read(id, address),
        };
        self.data_bus = value;
        self.last_access_was_read = true;
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        if let Some(id) = self.pages.route_write(address, value) {
            self.device_write(id, address, value);
        }
        self.data_bus = value;
        self.last_access_was_read = false;
    }
}

impl CycleSink for SystemBus {
    fn cycles_elapsed(&mut self, cycles: u32) {
        self.cycles = self.cycles.saturating_add(cycles);
    }

    fn stop_requested(&self) -> bool {
        self.stop
    }
}
