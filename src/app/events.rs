//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use serde::Serialize;

use crate::cascade::Stage;
use crate::config::ControlMode;
use crate::error::SensorError;
use crate::telemetry::TrialSummary;

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The trial has started.
    Started { trial: String, mode: ControlMode },

    /// One control tick completed.
    Tick(TickRecord),

    /// The committed stage differs from the previous tick's.
    StageChanged {
        from: Option<Stage>,
        to: Stage,
        confidence_percent: f32,
    },

    /// Temperature could not be read; the last good value was reused.
    SensorFault(SensorError),

    /// End-of-trial summary.
    Summary(TrialSummary),

    /// The element is off and the loop has ended.
    Stopped { ticks: u64 },
}

/// One row of trial telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub temperature_c: f32,
    /// Duty applied to the element, in percent.
    pub duty: f32,
    pub latency_ms: f32,
    pub power_w: f32,
    pub stage: Stage,
    pub confidence_percent: f32,
}
