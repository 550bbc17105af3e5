//! Baseline PID controller for the thermoelectric element
//!
//! Integrator-derivative controller with a fixed setpoint.  The element
//! cools: a reading above the setpoint drives the output up.  Time deltas
//! come from the caller's monotonic clock, so the very first update has no
//! `dt` and returns zero.

use crate::cascade::{Clock, Decision, Stage, StageCounts};
use crate::config::PidGains;

/// Bound on the accumulated error integral.
const INTEGRAL_LIMIT: f32 = 100.0;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    prev_time_us: Option<u64>,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(gains: PidGains, setpoint: f32) -> Self {
        Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            setpoint,
            integral: 0.0,
            prev_error: 0.0,
            prev_time_us: None,
            output_min: -100.0,
            output_max: 100.0,
        }
    }

    /// Update setpoint
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Compute the output for `measured_value` sampled at `now_us`.
    /// Output is in [-100, 100].
    pub fn update(&mut self, measured_value: f32, now_us: u64) -> f32 {
        if !measured_value.is_finite() {
            return 0.0;
        }
        let error = measured_value - self.setpoint;

        let Some(prev_time_us) = self.prev_time_us else {
            self.prev_time_us = Some(now_us);
            self.prev_error = error;
            return 0.0;
        };

        let dt = now_us.saturating_sub(prev_time_us) as f32 / 1_000_000.0;

        // Proportional
        let p = self.kp * error;

        // Integral (clamped)
        self.integral = (self.integral + error * dt).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        let i = self.ki * self.integral;

        // Derivative
        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        let d = self.kd * derivative;

        self.prev_error = error;
        self.prev_time_us = Some(now_us);

        let output = p + i + d;
        if output.is_finite() {
            output.clamp(self.output_min, self.output_max)
        } else {
            0.0
        }
    }

    /// Current integral term (for diagnostics).
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_time_us = None;
    }
}

/// Drives the element from the PID alone, for baseline-only trials.
pub struct BaselineDecider<C: Clock> {
    pid: PidController,
    clock: C,
    counts: StageCounts,
}

impl<C: Clock> BaselineDecider<C> {
    pub fn new(pid: PidController, clock: C) -> Self {
        Self {
            pid,
            clock,
            counts: StageCounts::zero(),
        }
    }

    pub fn decide(&mut self, temperature: f32) -> Decision {
        let output = self.pid.update(temperature, self.clock.now_us());
        self.counts.baseline += 1;
        Decision::new(output, Stage::Baseline, 0.0)
    }

    pub fn stage_breakdown(&self) -> StageCounts {
        self.counts
    }
}
