//! Controller jacks: joysticks and paddles.
//!
//! Each jack has nine pins. Pins 1-4 and 6 are digital and read high when
//! nothing pulls them down; a joystick grounds them when a direction or
//! the button is pressed. Pins 5 and 9 are analog: a paddle puts a
//! variable resistance on them, which the TIA measures by timing how long
//! a capacitor takes to charge through it.

use emu_core::{AnalogPin, DigitalPin, InputSource, Jack};

/// Paddle resistance drops by this much per percent of travel.
const PADDLE_OHMS_PER_PERCENT: u32 = 10_000;

/// Joystick switch, named by the pin it grounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickInput {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl JoystickInput {
    #[must_use]
    pub const fn pin(self) -> DigitalPin {
        match self {
            Self::Up => DigitalPin::One,
            Self::Down => DigitalPin::Two,
            Self::Left => DigitalPin::Three,
            Self::Right => DigitalPin::Four,
            Self::Fire => DigitalPin::Six,
        }
    }
}

/// One of the two paddles sharing a jack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paddle {
    /// Reads on pin 9, button on pin 4.
    Alpha,
    /// Reads on pin 5, button on pin 3.
    Beta,
}

impl Paddle {
    const fn resistance_pin(self) -> AnalogPin {
        match self {
            Self::Alpha => AnalogPin::Nine,
            Self::Beta => AnalogPin::Five,
        }
    }

    const fn button_pin(self) -> DigitalPin {
        match self {
            Self::Alpha => DigitalPin::Four,
            Self::Beta => DigitalPin::Three,
        }
    }
}

/// Pin levels on one jack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    /// Pins 1, 2, 3, 4 and 6, `true` = high.
    digital: [bool; 5],
    /// Pins 5 and 9, in ohms.
    resistance: [u32; 2],
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            digital: [true; 5],
            resistance: [paddle_resistance(0); 2],
        }
    }
}

impl Controller {
    #[must_use]
    pub fn digital(&self, pin: DigitalPin) -> bool {
        self.digital[digital_index(pin)]
    }

    #[must_use]
    pub fn resistance(&self, pin: AnalogPin) -> u32 {
        self.resistance[analog_index(pin)]
    }

    pub fn set_joystick(&mut self, input: JoystickInput, pressed: bool) {
        self.digital[digital_index(input.pin())] = !pressed;
    }

    /// Turn a paddle to `percent` (clamped to 0-100) of its travel.
    pub fn set_paddle_position(&mut self, paddle: Paddle, percent: u8) {
        self.resistance[analog_index(paddle.resistance_pin())] = paddle_resistance(percent);
    }

    /// Paddle position in percent.
    #[must_use]
    pub fn paddle_position(&self, paddle: Paddle) -> u8 {
        let ohms = self.resistance[analog_index(paddle.resistance_pin())];
        (100 - (ohms / PADDLE_OHMS_PER_PERCENT).min(100)) as u8
    }

    pub fn set_paddle_button(&mut self, paddle: Paddle, pressed: bool) {
        self.digital[digital_index(paddle.button_pin())] = !pressed;
    }

    /// Release everything: pins high, paddles at 0%.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}

fn paddle_resistance(percent: u8) -> u32 {
    PADDLE_OHMS_PER_PERCENT * (100 - u32::from(percent.min(100)))
}

const fn digital_index(pin: DigitalPin) -> usize {
    match pin {
        DigitalPin::One => 0,
        DigitalPin::Two => 1,
        DigitalPin::Three => 2,
        DigitalPin::Four => 3,
        DigitalPin::Six => 4,
    }
}

const fn analog_index(pin: AnalogPin) -> usize {
    match pin {
        AnalogPin::Five => 0,
        AnalogPin::Nine => 1,
    }
}

/// Both jacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerPorts {
    jacks: [Controller; 2],
}

impl ControllerPorts {
    #[must_use]
    pub fn jack(&self, jack: Jack) -> &Controller {
        &self.jacks[jack.index()]
    }

    pub fn jack_mut(&mut self, jack: Jack) -> &mut Controller {
        &mut self.jacks[jack.index()]
    }
}

impl InputSource for ControllerPorts {
    fn digital(&self, jack: Jack, pin: DigitalPin) -> bool {
        self.jack(jack).digital(pin)
    }

    fn resistance(&self, jack: Jack, pin: AnalogPin) -> u32 {
        self.jack(jack).resistance(pin)
    }
}
