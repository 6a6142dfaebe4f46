//! Driver for the Maxim DS1631 digital thermometer and thermostat.
//!
//! The DS1631 sits on an I2C bus at `0x48 + A2A1A0` and is driven by single-byte commands.
//! Temperatures are 12-bit two's-complement values with a resolution of 1/16 °C and are
//! exposed as the fixed point [`Temperature`] type.
//!
//! The [`Ds1631`] type only remembers the device address and the last raw reading; the bus is
//! borrowed for each operation so several devices can share it. [`Ds1631Thermometer`] bundles
//! a sensor with its bus and a delay when that is more convenient.

#![no_std]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

mod address;
pub mod config;
pub mod ds1631;
mod error;
pub mod temperature;
pub mod thermometer;

pub use self::{
    address::Address,
    config::{Config, Mode, Polarity, Resolution},
    ds1631::Ds1631,
    error::*,
    temperature::{RawTemperature, Temperature},
    thermometer::{ds1631::Ds1631Thermometer, Thermometer},
};
