//! Implementation for the DS1631 temperature sensor.

use embedded_hal::blocking::{
    delay::DelayUs,
    i2c::{Write, WriteRead},
};
use fugit::MillisDurationU32;

use crate::{
    config::{Config, Mode, Polarity, Resolution},
    temperature::{RawTemperature, Temperature},
    Address, Error, Result,
};

pub const START_CONVERT: u8 = 0x51;
pub const STOP_CONVERT: u8 = 0x22;
pub const ACCESS_CONFIG: u8 = 0xAC;
pub const READ_TEMPERATURE: u8 = 0xAA;
pub const ACCESS_TH: u8 = 0xA1;
pub const ACCESS_TL: u8 = 0xA2;

/// Longest time a one-shot read waits for the conversion-done flag
pub const CONVERSION_TIMEOUT: MillisDurationU32 = MillisDurationU32::from_ticks(1000);
/// Time between two reads of the conversion-done flag
pub const POLL_INTERVAL: MillisDurationU32 = MillisDurationU32::from_ticks(50);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ds1631 {
    addr: Address,
    last: Option<RawTemperature>,
}

impl Ds1631 {
    #[inline]
    pub const fn new(addr: Address) -> Self {
        Self { addr, last: None }
    }

    #[inline]
    pub const fn address(&self) -> Address {
        self.addr
    }

    /// Register bytes from the most recent two-byte read (T, TH or TL)
    #[inline]
    pub const fn last_reading(&self) -> Option<RawTemperature> {
        self.last
    }

    fn command<I2C, E>(&self, i2c: &mut I2C, command: u8) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        trace!("{}: command {=u8:#x}", self.addr, command);
        i2c.write(self.addr.get(), &[command])?;
        Ok(())
    }

    fn read_register<I2C, E>(&mut self, i2c: &mut I2C, command: u8) -> Result<RawTemperature, E>
    where
        I2C: WriteRead<Error = E>,
    {
        let mut buf = [0u8; 2];
        i2c.write_read(self.addr.get(), &[command], &mut buf)?;

        let raw = RawTemperature::new(buf[0], buf[1]);
        self.last = Some(raw);
        Ok(raw)
    }

    /// Writes a temperature register. Conversions are stopped for the duration of the write.
    fn write_register<I2C, E>(&mut self, i2c: &mut I2C, command: u8, temp: Temperature) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        let raw = RawTemperature::from_temperature(temp).ok_or(Error::OutOfRange)?;

        self.stop_conversion(i2c)?;
        trace!("{}: write {=u8:#x} = {}", self.addr, command, raw);
        i2c.write(self.addr.get(), &[command, raw.msb, raw.lsb])?;
        self.start_conversion(i2c)
    }

    /// Starts temperature conversions
    ///
    /// In one-shot mode a single conversion is performed, otherwise the sensor keeps converting
    /// until [`Ds1631::stop_conversion`] is called.
    pub fn start_conversion<I2C, E>(&mut self, i2c: &mut I2C) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        self.command(i2c, START_CONVERT)
    }

    /// Stops temperature conversions & puts the sensor into its low-power idle state
    pub fn stop_conversion<I2C, E>(&mut self, i2c: &mut I2C) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        self.command(i2c, STOP_CONVERT)
    }

    pub fn read_config<I2C, E>(&self, i2c: &mut I2C) -> Result<Config, E>
    where
        I2C: WriteRead<Error = E>,
    {
        let mut buf = [0u8; 1];
        i2c.write_read(self.addr.get(), &[ACCESS_CONFIG], &mut buf)?;
        Ok(Config::from_bits(buf[0]))
    }

    /// Writes the configuration register.
    ///
    /// Conversions are stopped before the write and restarted afterwards.
    pub fn write_config<I2C, E>(&mut self, i2c: &mut I2C, config: Config) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        self.stop_conversion(i2c)?;
        trace!("{}: write config {}", self.addr, config);
        i2c.write(self.addr.get(), &[ACCESS_CONFIG, config.bits()])?;
        self.start_conversion(i2c)
    }

    fn modify_config<I2C, E>(
        &mut self,
        i2c: &mut I2C,
        f: impl FnOnce(Config) -> Config,
    ) -> Result<(), E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        let config = self.read_config(i2c)?;
        self.write_config(i2c, f(config))
    }

    /// Sets the conversion resolution of the sensor
    pub fn set_resolution<I2C, E>(&mut self, i2c: &mut I2C, res: Resolution) -> Result<(), E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        self.modify_config(i2c, |config| config.with_resolution(res))
    }

    /// Selects one-shot or continuous conversions
    pub fn set_mode<I2C, E>(&mut self, i2c: &mut I2C, mode: Mode) -> Result<(), E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        self.modify_config(i2c, |config| config.with_mode(mode))
    }

    /// Sets the active level of the Tout pin
    pub fn set_polarity<I2C, E>(&mut self, i2c: &mut I2C, polarity: Polarity) -> Result<(), E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        self.modify_config(i2c, |config| config.with_polarity(polarity))
    }

    /// Checks if the last temperature conversion has finished
    pub fn conversion_done<I2C, E>(&self, i2c: &mut I2C) -> Result<bool, E>
    where
        I2C: WriteRead<Error = E>,
    {
        Ok(self.read_config(i2c)?.conversion_done())
    }

    /// Reads the temperature register without decoding it
    pub fn read_raw_temperature<I2C, E>(&mut self, i2c: &mut I2C) -> Result<RawTemperature, E>
    where
        I2C: WriteRead<Error = E>,
    {
        self.read_register(i2c, READ_TEMPERATURE)
    }

    /// Reads the result of the last conversion
    ///
    /// In continuous mode this is always recent. In one-shot mode use
    /// [`Ds1631::read_temperature_one_shot`] to trigger a conversion & wait for it.
    pub fn read_temperature<I2C, E>(&mut self, i2c: &mut I2C) -> Result<Temperature, E>
    where
        I2C: WriteRead<Error = E>,
    {
        Ok(self.read_raw_temperature(i2c)?.to_temperature())
    }

    /// Reads the result of the last conversion as a count of 1/16 °C
    pub fn read_temperature_sixteenths<I2C, E>(&mut self, i2c: &mut I2C) -> Result<i16, E>
    where
        I2C: WriteRead<Error = E>,
    {
        Ok(self.read_raw_temperature(i2c)?.sixteenths())
    }

    /// Reads the upper thermostat threshold (TH)
    pub fn read_th<I2C, E>(&mut self, i2c: &mut I2C) -> Result<Temperature, E>
    where
        I2C: WriteRead<Error = E>,
    {
        Ok(self.read_register(i2c, ACCESS_TH)?.to_temperature())
    }

    /// Reads the lower thermostat threshold (TL)
    pub fn read_tl<I2C, E>(&mut self, i2c: &mut I2C) -> Result<Temperature, E>
    where
        I2C: WriteRead<Error = E>,
    {
        Ok(self.read_register(i2c, ACCESS_TL)?.to_temperature())
    }

    /// Writes the upper thermostat threshold (TH)
    ///
    /// Returns [`Error::OutOfRange`] without touching the bus if `temp` is outside -55..=125 °C.
    pub fn write_th<I2C, E>(&mut self, i2c: &mut I2C, temp: Temperature) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        self.write_register(i2c, ACCESS_TH, temp)
    }

    /// Writes the lower thermostat threshold (TL)
    ///
    /// Returns [`Error::OutOfRange`] without touching the bus if `temp` is outside -55..=125 °C.
    pub fn write_tl<I2C, E>(&mut self, i2c: &mut I2C, temp: Temperature) -> Result<(), E>
    where
        I2C: Write<Error = E>,
    {
        self.write_register(i2c, ACCESS_TL, temp)
    }

    /// Polls the conversion-done flag every [`POLL_INTERVAL`] until it is set.
    ///
    /// The flag is checked one last time once [`CONVERSION_TIMEOUT`] has been spent waiting, after
    /// which [`Error::Timeout`] is returned.
    fn wait_for_conversion<I2C, E>(&self, i2c: &mut I2C, delay: &mut impl DelayUs<u32>) -> Result<(), E>
    where
        I2C: WriteRead<Error = E>,
    {
        let mut waited = MillisDurationU32::from_ticks(0);

        while !self.conversion_done(i2c)? {
            if waited >= CONVERSION_TIMEOUT {
                warn!("{}: conversion timed out after {=u32} ms", self.addr, waited.ticks());
                return Err(Error::Timeout);
            }

            delay.delay_us(POLL_INTERVAL.to_micros());
            waited = waited + POLL_INTERVAL;
        }

        debug!("{}: conversion done after {=u32} ms", self.addr, waited.ticks());
        Ok(())
    }

    /// Measures the temperature & returns the raw register bytes
    ///
    /// Starts a conversion, waits for it to finish, reads the result & stops conversions again.
    #[cfg_attr(feature = "sizing", inline(never))]
    pub fn read_raw_one_shot<I2C, E>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<RawTemperature, E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        self.start_conversion(i2c)?;
        self.wait_for_conversion(i2c, delay)?;

        let raw = self.read_raw_temperature(i2c)?;
        self.stop_conversion(i2c)?;

        Ok(raw)
    }

    /// Measures the temperature
    ///
    /// Starts a conversion, waits for it to finish, reads the result & stops conversions again.
    /// Fails with [`Error::Timeout`] if the conversion does not finish within
    /// [`CONVERSION_TIMEOUT`].
    pub fn read_temperature_one_shot<I2C, E>(
        &mut self,
        i2c: &mut I2C,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<Temperature, E>
    where
        I2C: Write<Error = E> + WriteRead<Error = E>,
    {
        Ok(self.read_raw_one_shot(i2c, delay)?.to_temperature())
    }
}

#[cfg(test)]
mod tests {
    use std::{io::ErrorKind, vec, vec::Vec};

    use embedded_hal_mock::{
        delay::MockNoop,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
        MockError,
    };

    use super::*;

    const ADDR: u8 = 0x48;

    /// Delay that only adds up the requested time
    #[derive(Default)]
    struct CountingDelay {
        us: u32,
    }

    impl DelayUs<u32> for CountingDelay {
        fn delay_us(&mut self, us: u32) {
            self.us += us;
        }
    }

    fn config_read(config: u8) -> I2cTransaction {
        I2cTransaction::write_read(ADDR, vec![ACCESS_CONFIG], vec![config])
    }

    #[test]
    fn start_stop() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(0x4B, vec![START_CONVERT]),
            I2cTransaction::write(0x4B, vec![STOP_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::from_offset(3).unwrap());

        sensor.start_conversion(&mut i2c).unwrap();
        sensor.stop_conversion(&mut i2c).unwrap();
        i2c.done();
    }

    #[test]
    fn read_config() {
        let mut i2c = I2cMock::new(&[config_read(0b1000_1101)]);
        let sensor = Ds1631::new(Address::DEFAULT);

        let config = sensor.read_config(&mut i2c).unwrap();
        assert!(config.conversion_done());
        assert_eq!(config.resolution(), Resolution::Bits12);
        assert_eq!(config.mode(), Mode::OneShot);
        i2c.done();
    }

    #[test]
    fn write_config_restarts_conversion() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_CONFIG, 0b0000_1101]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        sensor
            .write_config(&mut i2c, Config::from_bits(0b0000_1101))
            .unwrap();
        i2c.done();
    }

    #[test]
    fn set_resolution_clears_old_bits() {
        let mut i2c = I2cMock::new(&[
            config_read(0b1000_1110),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_CONFIG, 0b1000_0110]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        sensor.set_resolution(&mut i2c, Resolution::Bits10).unwrap();
        i2c.done();
    }

    #[test]
    fn set_mode_and_polarity() {
        let mut i2c = I2cMock::new(&[
            config_read(0b0000_1100),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_CONFIG, 0b0000_1101]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
            config_read(0b0000_1101),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_CONFIG, 0b0000_1111]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
            config_read(0b0000_1111),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_CONFIG, 0b0000_1110]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        sensor.set_mode(&mut i2c, Mode::OneShot).unwrap();
        sensor.set_polarity(&mut i2c, Polarity::ActiveHigh).unwrap();
        sensor.set_mode(&mut i2c, Mode::Continuous).unwrap();
        i2c.done();
    }

    #[test]
    fn read_temperature_keeps_last_reading() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write_read(ADDR, vec![READ_TEMPERATURE], vec![0x19, 0x10]),
            I2cTransaction::write_read(ADDR, vec![READ_TEMPERATURE], vec![0xE6, 0xF0]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);
        assert_eq!(sensor.last_reading(), None);

        let temp = sensor.read_temperature(&mut i2c).unwrap();
        assert_eq!(temp, Temperature::from_num(25.0625));
        assert_eq!(sensor.last_reading(), Some(RawTemperature::new(0x19, 0x10)));

        assert_eq!(sensor.read_temperature_sixteenths(&mut i2c).unwrap(), -401);
        assert_eq!(sensor.last_reading(), Some(RawTemperature::new(0xE6, 0xF0)));
        i2c.done();
    }

    #[test]
    fn thresholds() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write_read(ADDR, vec![ACCESS_TH], vec![0x1C, 0x00]),
            I2cTransaction::write_read(ADDR, vec![ACCESS_TL], vec![0xF5, 0xE0]),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_TH, 0x1E, 0x80]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
            I2cTransaction::write(ADDR, vec![ACCESS_TL, 0xF5, 0x80]),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        assert_eq!(sensor.read_th(&mut i2c).unwrap(), Temperature::from_num(28));
        assert_eq!(sensor.read_tl(&mut i2c).unwrap(), Temperature::from_num(-10.125));
        assert_eq!(sensor.last_reading(), Some(RawTemperature::new(0xF5, 0xE0)));

        sensor.write_th(&mut i2c, Temperature::from_num(30.5)).unwrap();
        sensor.write_tl(&mut i2c, Temperature::from_num(-10.5)).unwrap();
        i2c.done();
    }

    #[test]
    fn write_threshold_out_of_range() {
        let mut i2c = I2cMock::new(&[]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        assert!(matches!(
            sensor.write_th(&mut i2c, Temperature::from_num(126)),
            Err(Error::OutOfRange)
        ));
        assert!(matches!(
            sensor.write_tl(&mut i2c, Temperature::from_num(-56)),
            Err(Error::OutOfRange)
        ));
        i2c.done();
    }

    #[test]
    fn one_shot_polls_until_done() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
            config_read(0b0000_1101),
            config_read(0b0000_1101),
            config_read(0b1000_1101),
            I2cTransaction::write_read(ADDR, vec![READ_TEMPERATURE], vec![0xFF, 0x80]),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);
        let mut delay = CountingDelay::default();

        let temp = sensor.read_temperature_one_shot(&mut i2c, &mut delay).unwrap();
        assert_eq!(temp, Temperature::from_num(-0.5));
        assert_eq!(delay.us, 100_000);
        i2c.done();
    }

    #[test]
    fn one_shot_raw() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
            config_read(0b1000_0001),
            I2cTransaction::write_read(ADDR, vec![READ_TEMPERATURE], vec![0x0A, 0x20]),
            I2cTransaction::write(ADDR, vec![STOP_CONVERT]),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        let raw = sensor.read_raw_one_shot(&mut i2c, &mut MockNoop::new()).unwrap();
        assert_eq!(raw.word(), 0x0A20);
        i2c.done();
    }

    #[test]
    fn one_shot_times_out_after_one_second() {
        // One poll right away plus one per 50 ms interval up to & including 1000 ms
        let mut expectations: Vec<I2cTransaction> =
            vec![I2cTransaction::write(ADDR, vec![START_CONVERT])];
        expectations.extend((0..21).map(|_| config_read(0b0000_1101)));

        let mut i2c = I2cMock::new(&expectations);
        let mut sensor = Ds1631::new(Address::DEFAULT);
        let mut delay = CountingDelay::default();

        assert!(matches!(
            sensor.read_temperature_one_shot(&mut i2c, &mut delay),
            Err(Error::Timeout)
        ));
        assert_eq!(delay.us, CONVERSION_TIMEOUT.to_micros());
        assert_eq!(sensor.last_reading(), None);
        i2c.done();
    }

    #[test]
    fn done_on_last_poll_is_not_a_timeout() {
        let mut expectations: Vec<I2cTransaction> =
            vec![I2cTransaction::write(ADDR, vec![START_CONVERT])];
        expectations.extend((0..20).map(|_| config_read(0b0000_1101)));
        expectations.push(config_read(0b1000_1101));
        expectations.push(I2cTransaction::write_read(
            ADDR,
            vec![READ_TEMPERATURE],
            vec![0x7D, 0x00],
        ));
        expectations.push(I2cTransaction::write(ADDR, vec![STOP_CONVERT]));

        let mut i2c = I2cMock::new(&expectations);
        let mut sensor = Ds1631::new(Address::DEFAULT);
        let mut delay = CountingDelay::default();

        let temp = sensor.read_temperature_one_shot(&mut i2c, &mut delay).unwrap();
        assert_eq!(temp, Temperature::from_num(125));
        assert_eq!(delay.us, 1_000_000);
        i2c.done();
    }

    #[test]
    fn bus_errors_propagate() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(ADDR, vec![START_CONVERT])
                .with_error(MockError::Io(ErrorKind::Other)),
            I2cTransaction::write(ADDR, vec![START_CONVERT]),
            I2cTransaction::write_read(ADDR, vec![ACCESS_CONFIG], vec![0x00])
                .with_error(MockError::Io(ErrorKind::Other)),
        ]);
        let mut sensor = Ds1631::new(Address::DEFAULT);

        assert!(matches!(
            sensor.read_temperature_one_shot(&mut i2c, &mut MockNoop::new()),
            Err(Error::I2c(_))
        ));
        assert!(matches!(
            sensor.read_temperature_one_shot(&mut i2c, &mut MockNoop::new()),
            Err(Error::I2c(_))
        ));
        i2c.done();
    }
}
