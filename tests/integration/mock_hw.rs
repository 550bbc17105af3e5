//! Mock adapters and predictor helpers for integration tests.
//!
//! `MockRig` replays a scripted temperature trace and records every
//! actuator call so tests can assert on the full command history.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use thermal_cascade::adapters::time::ManualClock;
use thermal_cascade::app::events::AppEvent;
use thermal_cascade::app::ports::{ActuatorPort, EventSink, SensorPort};
use thermal_cascade::cascade::CascadeArbiter;
use thermal_cascade::config::CascadeConfig;
use thermal_cascade::control::predictor::BoxedPredictor;
use thermal_cascade::error::{ActuatorError, PredictorError, SensorError};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetDuty(f32),
    AllOff,
}

// ── MockRig ───────────────────────────────────────────────────

pub struct MockRig {
    /// Readings served in order; the last one repeats.
    pub temperatures: VecDeque<Result<f32, SensorError>>,
    last: Result<f32, SensorError>,
    pub power_w: f32,
    pub calls: Vec<ActuatorCall>,
    pub fail_writes: bool,
    /// Advanced on every sensor read to simulate bus time.
    pub io_clock: Option<(ManualClock, u64)>,
}

#[allow(dead_code)]
impl MockRig {
    pub fn constant(temperature: f32, power_w: f32) -> Self {
        Self::scripted(vec![Ok(temperature)], power_w)
    }

    pub fn scripted(trace: Vec<Result<f32, SensorError>>, power_w: f32) -> Self {
        Self {
            temperatures: trace.into(),
            last: Ok(16.0),
            power_w,
            calls: Vec::new(),
            fail_writes: false,
            io_clock: None,
        }
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::SetDuty(d) => Some(*d),
            ActuatorCall::AllOff => Some(0.0),
        })
    }
}

impl SensorPort for MockRig {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        if let Some((clock, us)) = &self.io_clock {
            clock.advance_us(*us);
        }
        if let Some(next) = self.temperatures.pop_front() {
            self.last = next;
        }
        self.last
    }

    fn read_power(&mut self) -> f32 {
        self.power_w
    }
}

impl ActuatorPort for MockRig {
    fn set_duty(&mut self, duty: f32) -> Result<f32, ActuatorError> {
        if self.fail_writes {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.calls.push(ActuatorCall::SetDuty(duty));
        Ok(duty)
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── RecordingSink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, AppEvent::Tick(_))).count()
    }

    pub fn stage_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::StageChanged { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Predictors ───────────────────────────────────────────────

#[allow(dead_code)]
pub fn constant(duty: f32) -> BoxedPredictor {
    Box::new(move |_t: f32, _p: f32, _l: f32| Ok::<f32, PredictorError>(duty))
}

#[allow(dead_code)]
pub fn failing() -> BoxedPredictor {
    Box::new(|_t: f32, _p: f32, _l: f32| Err::<f32, PredictorError>(PredictorError::InferenceFailed))
}

/// Returns `duty`, but on the listed call numbers (1-based) first burns
/// `stall_ms` on `clock`.
#[allow(dead_code)]
pub fn stalling(duty: f32, clock: ManualClock, stall_on: &'static [u32], stall_ms: u64) -> BoxedPredictor {
    let calls = Arc::new(AtomicU32::new(0));
    Box::new(move |_t: f32, _p: f32, _l: f32| {
        let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
        if stall_on.contains(&n) {
            clock.advance_ms(stall_ms);
        }
        Ok::<f32, PredictorError>(duty)
    })
}

/// Arbiter on a manual clock with a fixed jitter seed.
#[allow(dead_code)]
pub fn arbiter(
    config: CascadeConfig,
    fast: BoxedPredictor,
    slow: BoxedPredictor,
    clock: ManualClock,
) -> CascadeArbiter<ManualClock, StdRng> {
    CascadeArbiter::new(config, fast, slow, clock, StdRng::seed_from_u64(2024)).unwrap()
}
