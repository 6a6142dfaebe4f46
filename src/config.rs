//! Configuration register

/// Contents of the configuration register.
///
/// ```text
///   7     6     5     4     3    2    1     0
/// DONE   THF   TLF   NVB   R1   R0   POL  1SHOT
/// ```
///
/// `DONE` and `NVB` are read-only. `THF` and `TLF` latch when a threshold is crossed and can only
/// be cleared by writing a zero.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Config(u8);

static_assertions::assert_eq_size!(Config, u8);

impl Config {
    const DONE: u8 = 1 << 7;
    const THF: u8 = 1 << 6;
    const TLF: u8 = 1 << 5;
    const NVB: u8 = 1 << 4;
    const RESOLUTION_SHIFT: u8 = 2;
    const RESOLUTION: u8 = 0b11 << Self::RESOLUTION_SHIFT;
    const POL: u8 = 1 << 1;
    const ONE_SHOT: u8 = 1 << 0;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the last temperature conversion has completed
    #[inline]
    pub const fn conversion_done(self) -> bool {
        self.0 & Self::DONE != 0
    }

    /// Whether the temperature has been at or above TH since the flag was last cleared
    #[inline]
    pub const fn high_flag(self) -> bool {
        self.0 & Self::THF != 0
    }

    /// Whether the temperature has been at or below TL since the flag was last cleared
    #[inline]
    pub const fn low_flag(self) -> bool {
        self.0 & Self::TLF != 0
    }

    /// Whether a write to EEPROM is in progress
    #[inline]
    pub const fn nv_busy(self) -> bool {
        self.0 & Self::NVB != 0
    }

    #[inline]
    pub const fn resolution(self) -> Resolution {
        Resolution::from_config_register(self.0)
    }

    #[inline]
    #[must_use]
    pub const fn with_resolution(self, res: Resolution) -> Self {
        Self((self.0 & !Self::RESOLUTION) | res.to_config_register())
    }

    #[inline]
    pub const fn mode(self) -> Mode {
        if self.0 & Self::ONE_SHOT == 0 {
            Mode::Continuous
        } else {
            Mode::OneShot
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_mode(self, mode: Mode) -> Self {
        match mode {
            Mode::OneShot => Self(self.0 | Self::ONE_SHOT),
            Mode::Continuous => Self(self.0 & !Self::ONE_SHOT),
        }
    }

    #[inline]
    pub const fn polarity(self) -> Polarity {
        if self.0 & Self::POL == 0 {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_polarity(self, polarity: Polarity) -> Self {
        match polarity {
            Polarity::ActiveHigh => Self(self.0 | Self::POL),
            Polarity::ActiveLow => Self(self.0 & !Self::POL),
        }
    }
}

impl From<u8> for Config {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<Config> for u8 {
    fn from(config: Config) -> Self {
        config.0
    }
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Config({:#010b})", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Resolution {
    /// Resolution for a bit count in `9..=12`
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            9 => Some(Resolution::Bits9),
            10 => Some(Resolution::Bits10),
            11 => Some(Resolution::Bits11),
            12 => Some(Resolution::Bits12),
            _ => None,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    const fn from_config_register(reg: u8) -> Self {
        match (reg & Config::RESOLUTION) >> Config::RESOLUTION_SHIFT {
            0b00 => Resolution::Bits9,
            0b01 => Resolution::Bits10,
            0b10 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    const fn to_config_register(self) -> u8 {
        (self.bits() - 9) << Config::RESOLUTION_SHIFT
    }

    /// Returns the maximum conversion time in milliseconds
    pub const fn conversion_time(self) -> u16 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }
}

/// Conversion mode
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Perform a single conversion after each start command, then idle
    OneShot,
    /// Convert repeatedly until stopped
    Continuous,
}

/// Active level of the Tout thermostat pin
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveLow,
    ActiveHigh,
}
