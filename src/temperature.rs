//! DS1631 temperature register format

use fixed::types::I28F4;

/// I28F4 is a fixed point number with 4 fractional bits and 28 integer bits.
/// This gives us a precision of 0.0625 degrees Celsius & a range of (-2^27, 2^27 - 0.0625).
pub type Temperature = I28F4;

/// Lowest temperature the DS1631 is rated to measure
pub const MIN_TEMPERATURE: Temperature = Temperature::const_from_int(-55);
/// Highest temperature the DS1631 is rated to measure
pub const MAX_TEMPERATURE: Temperature = Temperature::const_from_int(125);

/// Contents of a two-byte temperature register (T, TH or TL), as sent on the wire.
///
/// The MSB holds the signed whole degrees and the upper nibble of the LSB holds sixteenths of a
/// degree. The lower nibble of the LSB is always zero on the device and is ignored when decoding.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawTemperature {
    pub msb: u8,
    pub lsb: u8,
}

impl RawTemperature {
    #[inline]
    pub const fn new(msb: u8, lsb: u8) -> Self {
        Self { msb, lsb }
    }

    /// Builds the register bytes from the compact 16-bit form returned by [`Self::word`]
    #[inline]
    pub const fn from_word(word: u16) -> Self {
        let [msb, lsb] = word.to_be_bytes();
        Self { msb, lsb }
    }

    /// Encodes a temperature into register bytes.
    ///
    /// Returns `None` if `temp` is outside the rated range of the sensor.
    pub fn from_temperature(temp: Temperature) -> Option<Self> {
        if temp < MIN_TEMPERATURE || temp > MAX_TEMPERATURE {
            return None;
        }

        let sixteenths = i16::try_from(temp.to_bits()).ok()?;
        let [msb, lsb] = (sixteenths << 4).to_be_bytes();
        Some(Self { msb, lsb })
    }

    /// Encodes a temperature in degrees Celsius into register bytes, rounding to the nearest
    /// sixteenth of a degree.
    ///
    /// Returns `None` for NaN, infinities & values outside the rated range of the sensor.
    pub fn from_celsius(celsius: f32) -> Option<Self> {
        Temperature::checked_from_num(celsius).and_then(Self::from_temperature)
    }

    /// Both register bytes as a single two's complement word, MSB first
    #[inline]
    pub const fn word(self) -> u16 {
        u16::from_be_bytes([self.msb, self.lsb])
    }

    /// Temperature as a signed count of 1/16 °C steps
    #[inline]
    pub const fn sixteenths(self) -> i16 {
        i16::from_be_bytes([self.msb, self.lsb]) >> 4
    }

    /// Decodes the register bytes into a temperature
    #[inline]
    pub fn to_temperature(self) -> Temperature {
        Temperature::from_bits(i32::from(self.sixteenths()))
    }

    /// Decodes the register bytes into degrees Celsius
    #[inline]
    pub fn to_celsius(self) -> f32 {
        self.to_temperature().to_num()
    }
}

impl From<RawTemperature> for Temperature {
    fn from(raw: RawTemperature) -> Self {
        raw.to_temperature()
    }
}
