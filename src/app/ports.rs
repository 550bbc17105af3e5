//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (sensors, element, event sinks) implement these traits.
//! The [`ControlService`](super::service::ControlService) consumes them via
//! generics, so the control core never touches hardware directly.

use rand::Rng;

use crate::cascade::{CascadeArbiter, Clock, Decision, SharedArbiter, StageCounts};
use crate::control::pid::BaselineDecider;
use crate::error::{ActuatorError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain operating conditions.
pub trait SensorPort {
    /// Averaged probe temperature in °C.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;

    /// Windowed element power in watts.  Never fails; a bad read counts
    /// as 0 W inside the window.
    fn read_power(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive the element.
pub trait ActuatorPort {
    /// Apply a duty in percent.  Returns the duty actually applied.
    fn set_duty(&mut self, duty: f32) -> Result<f32, ActuatorError>;

    /// De-energise the element.  Best effort, never fails.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Decider (the per-tick duty source)
// ───────────────────────────────────────────────────────────────

/// Whatever turns operating conditions into a committed duty each tick:
/// the full cascade, a shared handle to one, or the baseline PID alone.
pub trait Decider {
    fn decide(&mut self, temperature: f32, latency: f32, power: f32) -> Decision;

    /// Commit counts per stage since construction.
    fn stage_breakdown(&self) -> StageCounts;
}

impl<C: Clock, R: Rng> Decider for CascadeArbiter<C, R> {
    fn decide(&mut self, temperature: f32, latency: f32, power: f32) -> Decision {
        CascadeArbiter::decide(self, temperature, latency, power)
    }

    fn stage_breakdown(&self) -> StageCounts {
        CascadeArbiter::stage_breakdown(self)
    }
}

impl<C: Clock, R: Rng> Decider for SharedArbiter<C, R> {
    fn decide(&mut self, temperature: f32, latency: f32, power: f32) -> Decision {
        SharedArbiter::decide(self, temperature, latency, power)
    }

    fn stage_breakdown(&self) -> StageCounts {
        self.with(|a| a.stage_breakdown())
    }
}

impl<C: Clock> Decider for BaselineDecider<C> {
    fn decide(&mut self, temperature: f32, _latency: f32, _power: f32) -> Decision {
        BaselineDecider::decide(self, temperature)
    }

    fn stage_breakdown(&self) -> StageCounts {
        BaselineDecider::stage_breakdown(self)
    }
}

impl<D: Decider + ?Sized> Decider for Box<D> {
    fn decide(&mut self, temperature: f32, latency: f32, power: f32) -> Decision {
        (**self).decide(temperature, latency, power)
    }

    fn stage_breakdown(&self) -> StageCounts {
        (**self).stage_breakdown()
    }
}
