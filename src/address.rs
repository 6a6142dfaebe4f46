/// 7-bit I2C address of a DS1631.
///
/// The upper four bits are fixed at `1001`; the lower three follow the A2, A1 and A0 pins, so up
/// to eight sensors can share a bus.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Address(u8);

impl Address {
    /// Address with A2, A1 and A0 all tied to ground
    pub const DEFAULT: Self = Self(Self::BASE);

    const BASE: u8 = 0b100_1000;

    /// Address for a pin offset (`A2A1A0`) in `0..=7`
    #[inline]
    pub const fn from_offset(offset: u8) -> Option<Self> {
        if offset > 0b111 {
            None
        } else {
            Some(Self(Self::BASE | offset))
        }
    }

    /// Address for the given logic levels on A2, A1 and A0
    #[inline]
    pub const fn from_pins(a2: bool, a1: bool, a0: bool) -> Self {
        Self(Self::BASE | ((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8))
    }

    /// Raw 7-bit bus address
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Pin offset from the base address
    #[inline]
    pub const fn offset(self) -> u8 {
        self.0 & 0b111
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Address> for u8 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl core::fmt::Debug for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(f, "{:#04X}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Address {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "{=u8:#x}", self.0);
    }
}
