//! Mutable cascade state.
//!
//! One `CascadeState` per arbiter, mutated only inside
//! [`CascadeArbiter::decide`](super::CascadeArbiter::decide).  Trust
//! weights live beside it in the
//! [`ProbabilityModel`](super::probability::ProbabilityModel).

use super::{Stage, StageCounts};

#[derive(Debug, Clone)]
pub struct CascadeState {
    /// Last committed controller, or `None` before the first commit and
    /// after a baseline run-length reset.
    pub active: Option<Stage>,
    /// Ticks since the last controller switch.
    pub dwell_counter: u32,
    /// Ticks the baseline has been continuously active.
    pub consecutive_baseline_ticks: u32,
    /// Ticks since the last periodic forced baseline visit.
    pub cycles_since_forced_baseline: u32,
    /// Confidence of the last committed decision, in [0, 1].
    pub prev_confidence: f32,
    pub stage_counts: StageCounts,
    /// Ticks that fell back to the baseline because of a deadline overrun.
    pub overruns: u64,
    /// Periodic forced baseline visits.
    pub forced_visits: u64,
}

impl CascadeState {
    /// Neutral state: no active controller, all counters zero.
    pub fn new() -> Self {
        Self {
            active: None,
            dwell_counter: 0,
            consecutive_baseline_ticks: 0,
            cycles_since_forced_baseline: 0,
            prev_confidence: 0.0,
            stage_counts: StageCounts::zero(),
            overruns: 0,
            forced_visits: 0,
        }
    }

    /// Per-tick counter advance, run before any decision logic.
    pub(crate) fn begin_tick(&mut self) {
        self.dwell_counter = self.dwell_counter.saturating_add(1);
        self.cycles_since_forced_baseline = self.cycles_since_forced_baseline.saturating_add(1);
        if self.active == Some(Stage::Baseline) {
            self.consecutive_baseline_ticks = self.consecutive_baseline_ticks.saturating_add(1);
        } else {
            self.consecutive_baseline_ticks = 0;
        }
    }

    /// Record a commit.  Returns `true` when the active controller changed.
    pub(crate) fn commit(&mut self, stage: Stage, confidence: f32) -> bool {
        let switched = self.active != Some(stage);
        if switched {
            self.dwell_counter = 0;
        }
        if !stage.is_baseline() {
            self.consecutive_baseline_ticks = 0;
        }
        self.active = Some(stage);
        self.prev_confidence = confidence.clamp(0.0, 1.0);
        *self.stage_counts.get_mut(stage) += 1;
        switched
    }

    pub fn total_decisions(&self) -> u64 {
        self.stage_counts.total()
    }
}

impl Default for CascadeState {
    fn default() -> Self {
        Self::new()
    }
}
