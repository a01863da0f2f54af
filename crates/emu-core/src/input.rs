//! Controller jacks and the pins the console samples.

/// One of the two controller jacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Jack {
    Left,
    Right,
}

impl Jack {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Jack::Left => 0,
            Jack::Right => 1,
        }
    }
}

/// Pins read as a single bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalPin {
    One,
    Two,
    Three,
    Four,
    Six,
}

/// Pins read as a resistance (paddles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogPin {
    Five,
    Nine,
}

/// Resistance of a shorted analog pin: the capacitor charges at once.
pub const RESISTANCE_MIN: u32 = 0;

/// Resistance of an open analog pin: the capacitor never charges.
pub const RESISTANCE_MAX: u32 = 2_147_483_640;

/// Whatever is plugged into the jacks.
///
/// Sampled on demand when the program reads an input register; nothing
/// polls it in the background.
pub trait InputSource {
    /// Level of a digital pin (`true` = high, i.e. not pressed).
    fn digital(&self, jack: Jack, pin: DigitalPin) -> bool;

    /// Resistance on an analog pin, in ohms.
    fn resistance(&self, jack: Jack, pin: AnalogPin) -> u32;

    /// A value driven onto a digital pin by the console. Joysticks ignore it.
    fn drive(&mut self, jack: Jack, pin: DigitalPin, level: bool) {
        let _ = (jack, pin, level);
    }
}
