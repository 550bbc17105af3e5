//! INA219 power monitor on the element supply.
//!
//! Programmed for the 32 V / 2 A range: calibration 4096 gives a current
//! LSB of 0.1 mA and a power LSB of 2 mW.  Readings feed a 10-sample
//! window and the element power reported to the controller is the window
//! mean.  A failed read is logged and contributes 0 W, so a flaky bus
//! pulls the average down instead of stalling the loop.

use embedded_hal::i2c::I2c;
use heapless::HistoryBuffer;
use log::warn;

use crate::error::SensorError;

/// Default 7-bit address (A0 = A1 = GND).
pub const INA219_ADDRESS: u8 = 0x40;

const REG_CONFIG: u8 = 0x00;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_POWER: u8 = 0x03;
const REG_CALIBRATION: u8 = 0x05;

/// 32 V bus range, /8 shunt gain, 12-bit bus and shunt ADC, continuous.
const CONFIG_32V_2A: u16 = 0x399F;
const CALIBRATION_32V_2A: u16 = 4096;
const POWER_LSB_W: f32 = 0.002;
const BUS_LSB_V: f32 = 0.004;

/// Samples in the averaging window.
pub const POWER_WINDOW: usize = 10;

pub struct PowerMonitor<I2C> {
    i2c: I2C,
    address: u8,
    window: HistoryBuffer<f32, POWER_WINDOW>,
    failed_reads: u32,
}

impl<I2C: I2c> PowerMonitor<I2C> {
    /// Program configuration and calibration.
    pub fn new(i2c: I2C) -> Result<Self, SensorError> {
        Self::with_address(i2c, INA219_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Result<Self, SensorError> {
        let mut monitor = Self {
            i2c,
            address,
            window: HistoryBuffer::new(),
            failed_reads: 0,
        };
        monitor.write_register(REG_CONFIG, CONFIG_32V_2A)?;
        monitor.write_register(REG_CALIBRATION, CALIBRATION_32V_2A)?;
        Ok(monitor)
    }

    /// Instantaneous power in watts.
    pub fn read_power(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_POWER)?;
        Ok(f32::from(raw) * POWER_LSB_W)
    }

    /// Bus voltage in volts.
    pub fn read_bus_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_BUS_VOLTAGE)?;
        // Bits 15..3 hold the reading.
        Ok(f32::from(raw >> 3) * BUS_LSB_V)
    }

    /// Take one sample and return the window mean.
    pub fn sample(&mut self) -> f32 {
        let watts = match self.read_power() {
            Ok(w) => w,
            Err(e) => {
                self.failed_reads = self.failed_reads.saturating_add(1);
                warn!("ina219: power read failed ({e}), recording 0 W");
                0.0
            }
        };
        self.window.write(watts);
        self.average()
    }

    /// Mean of the window, 0 before the first sample.
    pub fn average(&self) -> f32 {
        let n = self.window.len();
        if n == 0 {
            return 0.0;
        }
        self.window.oldest_ordered().sum::<f32>() / n as f32
    }

    pub fn failed_reads(&self) -> u32 {
        self.failed_reads
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(|_| SensorError::BusFailed)
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(u16::from_be_bytes(buf))
    }
}
