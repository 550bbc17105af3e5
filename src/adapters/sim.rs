//! Simulated bench rig for host runs.
//!
//! A first-order thermal plant: the chamber relaxes toward ambient and the
//! element pulls heat out in proportion to its duty.
//!
//! ```text
//! dT/dt = k * (ambient - T) - cooling_rate * duty / 100
//! ```
//!
//! Implements both ports, so it drops into
//! [`ControlService`](crate::app::service::ControlService) wherever the
//! real [`HardwareAdapter`](super::hardware::HardwareAdapter) would.

use heapless::HistoryBuffer;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::power::POWER_WINDOW;

/// Integration step (seconds).
const MAX_STEP_S: f32 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigParams {
    pub initial_temp_c: f32,
    pub ambient_c: f32,
    /// Fraction of the ambient gap closed per second.
    pub ambient_coupling: f32,
    /// Cooling rate (°C/s) at 100 % duty.
    pub cooling_rate: f32,
    /// Electrical power (W) at 100 % duty.
    pub full_power_w: f32,
    /// Half-width of uniform noise on temperature readings (°C).
    pub temp_noise_c: f32,
    /// Half-width of uniform noise on power readings (W).
    pub power_noise_w: f32,
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            initial_temp_c: 22.0,
            ambient_c: 22.0,
            ambient_coupling: 0.01,
            cooling_rate: 0.15,
            full_power_w: 25.0,
            temp_noise_c: 0.05,
            power_noise_w: 0.2,
        }
    }
}

pub struct SimulatedRig {
    params: RigParams,
    temperature_c: f32,
    duty: f32,
    power_window: HistoryBuffer<f32, POWER_WINDOW>,
    rng: StdRng,
    /// Injected sensor fault for the next `n` temperature reads.
    failing_reads: u32,
}

impl SimulatedRig {
    pub fn new(params: RigParams, seed: u64) -> Self {
        Self {
            temperature_c: params.initial_temp_c,
            params,
            duty: 0.0,
            power_window: HistoryBuffer::new(),
            rng: StdRng::seed_from_u64(seed),
            failing_reads: 0,
        }
    }

    /// Advance the plant by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f32) {
        let mut remaining = dt_s.max(0.0);
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP_S);
            let p = &self.params;
            let d_temp = p.ambient_coupling * (p.ambient_c - self.temperature_c) - p.cooling_rate * self.duty / 100.0;
            self.temperature_c += d_temp * h;
            remaining -= h;
        }
    }

    /// True chamber temperature (no sensor noise).
    pub fn temperature(&self) -> f32 {
        self.temperature_c
    }

    pub fn duty(&self) -> f32 {
        self.duty
    }

    /// Make the next `reads` temperature reads fail.
    pub fn inject_sensor_fault(&mut self, reads: u32) {
        self.failing_reads = reads;
    }

    /// Duty that holds `target_c` at steady state, if the element can.
    pub fn equilibrium_duty(&self, target_c: f32) -> Option<f32> {
        let p = &self.params;
        let duty = 100.0 * p.ambient_coupling * (p.ambient_c - target_c) / p.cooling_rate;
        (0.0..=100.0).contains(&duty).then_some(duty)
    }

    fn noise(&mut self, half_width: f32) -> f32 {
        if half_width > 0.0 {
            self.rng.gen_range(-half_width..=half_width)
        } else {
            0.0
        }
    }
}

impl SensorPort for SimulatedRig {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(SensorError::BusFailed);
        }
        let n = self.noise(self.params.temp_noise_c);
        Ok(self.temperature_c + n)
    }

    fn read_power(&mut self) -> f32 {
        let n = self.noise(self.params.power_noise_w);
        let watts = (self.params.full_power_w * self.duty / 100.0 + n).max(0.0);
        self.power_window.write(watts);
        self.power_window.oldest_ordered().sum::<f32>() / self.power_window.len() as f32
    }
}

impl ActuatorPort for SimulatedRig {
    fn set_duty(&mut self, duty: f32) -> Result<f32, ActuatorError> {
        self.duty = if duty.is_finite() { duty.clamp(0.0, 100.0) } else { 0.0 };
        Ok(self.duty)
    }

    fn all_off(&mut self) {
        self.duty = 0.0;
    }
}
