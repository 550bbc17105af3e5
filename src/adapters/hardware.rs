//! Hardware adapter: bridges the real peripherals to the domain ports.
//!
//! Owns the probe ADC, the power monitor and the element driver, and
//! exposes them through [`SensorPort`] and [`ActuatorPort`].  The ADS1115
//! and INA219 may sit on one physical bus; pass two handles to it (for
//! example `embedded-hal-bus` devices) as the two I2C parameters.

use embedded_hal::i2c::I2c;
use embedded_hal::pwm::SetDutyCycle;
use log::error;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::HeaterElement;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::temperature::CHANNELS;
use crate::sensors::{PowerMonitor, TemperatureSensors};

pub struct HardwareAdapter<T, P, PWM> {
    temperature: TemperatureSensors<T>,
    power: PowerMonitor<P>,
    element: HeaterElement<PWM>,
    channels: [bool; CHANNELS],
}

impl<T, P, PWM> HardwareAdapter<T, P, PWM>
where
    T: I2c,
    P: I2c,
    PWM: SetDutyCycle,
{
    pub fn new(
        temperature: TemperatureSensors<T>,
        power: PowerMonitor<P>,
        element: HeaterElement<PWM>,
        channels: [bool; CHANNELS],
    ) -> Self {
        Self {
            temperature,
            power,
            element,
            channels,
        }
    }

    pub fn element(&self) -> &HeaterElement<PWM> {
        &self.element
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<T: I2c, P: I2c, PWM: SetDutyCycle> SensorPort for HardwareAdapter<T, P, PWM> {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.temperature.read_average(&self.channels)
    }

    fn read_power(&mut self) -> f32 {
        self.power.sample()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<T: I2c, P: I2c, PWM: SetDutyCycle> ActuatorPort for HardwareAdapter<T, P, PWM> {
    fn set_duty(&mut self, duty: f32) -> Result<f32, ActuatorError> {
        self.element.set(duty)
    }

    fn all_off(&mut self) {
        if let Err(e) = self.element.off() {
            error!("element refused to switch off: {e}");
        }
    }
}
