//! Sensor subsystem: temperature probes and the element power monitor.
//!
//! Both drivers are generic over an `embedded_hal::i2c::I2c` bus and share
//! it on real hardware (ADS1115 at 0x48, INA219 at 0x40).

pub mod power;
pub mod temperature;

pub use power::PowerMonitor;
pub use temperature::{TemperatureSensors, TemperatureUnit};
