pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C bus error
    I2c(E),

    /// The conversion-done flag was not raised before the polling deadline
    Timeout,

    /// Temperature cannot be represented in a DS1631 temperature register
    OutOfRange,
}

impl<E> Error<E> {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::I2c(_) => "I2C error",
            Error::Timeout => "Timeout",
            Error::OutOfRange => "Temperature out of range",
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}
