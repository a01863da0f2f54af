//! Console switches, read by the program on RIOT port B.

/// A front-panel switch and its port B bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleSwitch {
    /// Game reset (momentary).
    Reset,
    /// Game select (momentary).
    Select,
    /// Down = black and white.
    BlackWhite,
    /// Left difficulty; down = A (hard).
    DifficultyP0,
    /// Right difficulty; down = A (hard).
    DifficultyP1,
}

impl ConsoleSwitch {
    #[must_use]
    pub const fn mask(self) -> u8 {
        match self {
            Self::Reset => 0x01,
            Self::Select => 0x02,
            Self::BlackWhite => 0x08,
            Self::DifficultyP0 => 0x40,
            Self::DifficultyP1 => 0x80,
        }
    }
}

/// The port B byte. Unused bits read high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSwitches(u8);

impl Default for ConsoleSwitches {
    fn default() -> Self {
        Self(0xFF)
    }
}

impl ConsoleSwitches {
    /// Put a switch down (`true`) or up.
    pub fn set(&mut self, switch: ConsoleSwitch, down: bool) {
        if down {
            self.0 &= !switch.mask();
        } else {
            self.0 |= switch.mask();
        }
    }

    #[must_use]
    pub fn is_down(self, switch: ConsoleSwitch) -> bool {
        self.0 & switch.mask() == 0
    }

    /// Value presented on port B.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }
}
