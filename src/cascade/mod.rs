//! Decision-arbitration cascade.
//!
//! Once per control tick the [`CascadeArbiter`] picks which candidate
//! controller's duty to trust:
//!
//! ```text
//!  decide(T, latency, P)
//!     │
//!     ├─ periodic / run-length bookkeeping ──▶ forced BASELINE
//!     │
//!     ├─ for stage in trust order (FAST, SLOW):
//!     │      DeadlineGuard ── overrun ──▶ BASELINE
//!     │      predict ─▶ ConfidenceEstimator ─▶ HysteresisGate
//!     │                                          │ accept ──▶ commit
//!     │                                          │ reject ──▶ ProbabilityModel(0)
//!     │
//!     └─ nothing accepted ──▶ BASELINE
//! ```
//!
//! Every tick yields exactly one [`Decision`]; failures only ever degrade
//! to the baseline controller.

pub mod arbiter;
pub mod confidence;
pub mod controller;
pub mod deadline;
pub mod hysteresis;
pub mod probability;
pub mod shared;
pub mod state;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PerStage;

pub use arbiter::CascadeArbiter;
pub use deadline::Clock;
pub use shared::SharedArbiter;
pub use state::CascadeState;

/// Identity of a candidate controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Cheap, responsive learned controller.
    Fast,
    /// Heavier, more accurate learned controller.
    Slow,
    /// The PID fallback.  Always available, always valid.
    Baseline,
}

impl Stage {
    /// All stages in their neutral (construction-time) evaluation order.
    pub const ALL: [Stage; 3] = [Stage::Fast, Stage::Slow, Stage::Baseline];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "FAST",
            Self::Slow => "SLOW",
            Self::Baseline => "BASELINE",
        }
    }

    pub const fn is_baseline(self) -> bool {
        matches!(self, Self::Baseline)
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Fast => 0,
            Self::Slow => 1,
            Self::Baseline => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage commit counts.  Monotonic for the life of a run.
pub type StageCounts = PerStage<u64>;

impl StageCounts {
    pub const fn zero() -> Self {
        Self {
            fast: 0,
            slow: 0,
            baseline: 0,
        }
    }

    /// Sum over all stages; equals the number of decisions made.
    pub fn total(&self) -> u64 {
        self.fast + self.slow + self.baseline
    }
}

/// The committed output of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Duty cycle in [0, 100].
    pub duty: f32,
    pub stage: Stage,
    /// Confidence of the committed output in [0, 100].
    pub confidence_percent: f32,
}

impl Decision {
    pub(crate) fn new(duty: f32, stage: Stage, confidence: f32) -> Self {
        Self {
            duty: sanitize(duty, 100.0),
            stage,
            confidence_percent: sanitize(confidence * 100.0, 100.0),
        }
    }
}

/// Clamp into `[0, max]`, mapping non-finite values to zero.
fn sanitize(value: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}
