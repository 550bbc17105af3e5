//! TMP36 temperature probes behind an ADS1115 16-bit ADC.
//!
//! Up to four probes sit on the single-ended inputs A0..A3.  Each read
//! starts a single-shot conversion at gain 1 (±4.096 V full scale), polls
//! the OS bit until the conversion completes, then applies the TMP36
//! transfer `(V - 0.5) * 100` °C.
//!
//! Generic over any `embedded_hal::i2c::I2c` bus so that the same driver
//! runs against real hardware and against the in-memory bus in tests.

use embedded_hal::i2c::I2c;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Default 7-bit address (ADDR pin to GND).
pub const ADS1115_ADDRESS: u8 = 0x48;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

/// Start a single conversion / conversion idle (read).
const CFG_OS: u16 = 0x8000;
/// PGA gain 1: ±4.096 V.
const CFG_PGA_4_096V: u16 = 0x0200;
const CFG_MODE_SINGLE_SHOT: u16 = 0x0100;
const CFG_DR_128SPS: u16 = 0x0080;
const CFG_COMP_DISABLE: u16 = 0x0003;

const FULL_SCALE_V: f32 = 4.096;
/// Status polls before a conversion counts as hung.
const MAX_POLLS: u32 = 64;

pub const CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn from_celsius(self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Self::Kelvin => celsius + 273.15,
        }
    }
}

/// TMP36 transfer function.
pub fn tmp36_celsius(voltage: f32) -> f32 {
    (voltage - 0.5) * 100.0
}

fn mux_single_ended(channel: u8) -> u16 {
    (0x04 | u16::from(channel & 0x03)) << 12
}

pub struct TemperatureSensors<I2C> {
    i2c: I2C,
    address: u8,
    unit: TemperatureUnit,
}

impl<I2C: I2c> TemperatureSensors<I2C> {
    pub fn new(i2c: I2C, unit: TemperatureUnit) -> Self {
        Self::with_address(i2c, ADS1115_ADDRESS, unit)
    }

    pub fn with_address(i2c: I2C, address: u8, unit: TemperatureUnit) -> Self {
        Self { i2c, address, unit }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Input voltage on `channel` (0..=3).
    pub fn read_voltage(&mut self, channel: u8) -> Result<f32, SensorError> {
        if usize::from(channel) >= CHANNELS {
            return Err(SensorError::OutOfRange);
        }

        let config = CFG_OS
            | mux_single_ended(channel)
            | CFG_PGA_4_096V
            | CFG_MODE_SINGLE_SHOT
            | CFG_DR_128SPS
            | CFG_COMP_DISABLE;
        let [hi, lo] = config.to_be_bytes();
        self.i2c
            .write(self.address, &[REG_CONFIG, hi, lo])
            .map_err(|_| SensorError::BusFailed)?;

        let mut ready = false;
        for _ in 0..MAX_POLLS {
            if self.read_register(REG_CONFIG)? & CFG_OS != 0 {
                ready = true;
                break;
            }
        }
        if !ready {
            return Err(SensorError::Timeout);
        }

        let raw = self.read_register(REG_CONVERSION)? as i16;
        let volts = f32::from(raw) * FULL_SCALE_V / 32768.0;
        trace!("ads1115 A{channel}: raw={raw} {volts:.4} V");
        Ok(volts)
    }

    /// Temperature on one channel in the configured unit.
    pub fn read_temperature(&mut self, channel: u8) -> Result<f32, SensorError> {
        let celsius = tmp36_celsius(self.read_voltage(channel)?);
        Ok(self.unit.from_celsius(celsius))
    }

    /// Mean over the enabled channels.
    pub fn read_average(&mut self, enabled: &[bool; CHANNELS]) -> Result<f32, SensorError> {
        let mut sum = 0.0;
        let mut count = 0u8;
        for (ch, _) in enabled.iter().enumerate().filter(|(_, on)| **on) {
            sum += self.read_temperature(ch as u8)?;
            count += 1;
        }
        if count == 0 {
            return Err(SensorError::NoChannels);
        }
        Ok(sum / f32::from(count))
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(u16::from_be_bytes(buf))
    }
}
