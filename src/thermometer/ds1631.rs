use embedded_hal::blocking::{
    delay::DelayUs,
    i2c::{Write, WriteRead},
};

use crate::{
    config::{Mode, Resolution},
    ds1631::Ds1631,
    thermometer::{Temperature, Thermometer},
    Error,
};

/// A DS1631 in one-shot mode together with the bus and delay it needs.
pub struct Ds1631Thermometer<I2C, D> {
    i2c: I2C,
    sensor: Ds1631,
    delay: D,
}

impl<I2C, D, E> Ds1631Thermometer<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayUs<u32>,
{
    pub const fn new(i2c: I2C, sensor: Ds1631, delay: D) -> Self {
        Self { i2c, sensor, delay }
    }

    /// Switches the sensor to one-shot conversions at the given resolution
    pub fn init(&mut self, resolution: Resolution) -> Result<(), Error<E>> {
        let config = self
            .sensor
            .read_config(&mut self.i2c)?
            .with_mode(Mode::OneShot)
            .with_resolution(resolution);
        self.sensor.write_config(&mut self.i2c, config)?;
        // Writing the configuration restarts conversions
        self.sensor.stop_conversion(&mut self.i2c)
    }

    pub fn sensor(&self) -> &Ds1631 {
        &self.sensor
    }

    /// Borrows the bus & sensor together for operations not covered by [`Thermometer`]
    pub fn parts_mut(&mut self) -> (&mut I2C, &mut Ds1631) {
        (&mut self.i2c, &mut self.sensor)
    }

    /// Splits the thermometer back into its parts
    pub fn release(self) -> (I2C, Ds1631, D) {
        (self.i2c, self.sensor, self.delay)
    }
}

impl<I2C, D, E> Thermometer for Ds1631Thermometer<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayUs<u32>,
{
    type Error = Error<E>;

    fn read(&mut self) -> Result<Temperature, Self::Error> {
        self.sensor
            .read_temperature_one_shot(&mut self.i2c, &mut self.delay)
    }
}
