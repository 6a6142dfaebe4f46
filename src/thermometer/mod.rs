//! Temperature sensor interface

pub mod ds1631;

use crate::temperature::Temperature;

pub trait Thermometer {
    type Error;

    /// Read the temperature in degrees Celsius
    ///
    /// I28F4 is a fixed point number with 4 fractional bits and 28 integer bits.
    /// This gives us a precision of 0.0625 degrees Celsius.
    fn read(&mut self) -> Result<Temperature, Self::Error>;
}
