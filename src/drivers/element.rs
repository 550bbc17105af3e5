//! Thermoelectric element driver.
//!
//! Duty in percent is applied to any `embedded_hal::pwm::SetDutyCycle`
//! channel as a per-mille fraction of its maximum, so the driver does not
//! care about the timer resolution underneath.
//!
//! This driver is a dumb actuator: it clamps, applies and remembers.  The
//! choice of duty belongs to the control service.

use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementState {
    Off,
    Driving { duty: f32 },
}

pub struct HeaterElement<PWM> {
    pwm: PWM,
    state: ElementState,
}

impl<PWM: SetDutyCycle> HeaterElement<PWM> {
    /// Take the channel and force it off.
    pub fn new(pwm: PWM) -> Result<Self, ActuatorError> {
        let mut element = Self {
            pwm,
            state: ElementState::Off,
        };
        element.off()?;
        Ok(element)
    }

    /// Apply `duty` percent, clamped to [0, 100].  Returns the applied duty.
    pub fn set(&mut self, duty: f32) -> Result<f32, ActuatorError> {
        let duty = if duty.is_finite() { duty.clamp(0.0, 100.0) } else { 0.0 };
        if duty == 0.0 {
            self.off()?;
            return Ok(0.0);
        }

        let permille = (duty * 10.0).round() as u16;
        self.pwm
            .set_duty_cycle_fraction(permille, 1000)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        debug!("element: duty {duty:.1}% ({permille}/1000)");

        self.state = ElementState::Driving { duty };
        Ok(duty)
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.state = ElementState::Off;
        Ok(())
    }

    pub fn state(&self) -> ElementState {
        self.state
    }

    pub fn is_driving(&self) -> bool {
        !matches!(self.state, ElementState::Off)
    }

    /// Last applied duty in percent.
    pub fn current_duty(&self) -> f32 {
        match self.state {
            ElementState::Off => 0.0,
            ElementState::Driving { duty } => duty,
        }
    }
}
