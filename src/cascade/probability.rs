//! Per-controller trust weights.
//!
//! Each decision feeds a continuous reward `exp(-|error|)` into an
//! exponential moving average for the controller concerned.  Calm
//! conditions nudge the slow controller up; temperature spikes nudge the
//! fast one.  After every update each weight is clamped into its range and
//! the evaluation order is re-sorted, heaviest first.

use heapless::Vec;
use log::trace;

use super::Stage;
use crate::config::{LearningConfig, PerStage, TrustRange};

#[derive(Debug, Clone)]
pub struct ProbabilityModel {
    weights: PerStage<f32>,
    ranges: PerStage<TrustRange>,
    learning: LearningConfig,
    /// Evaluation order, descending by weight.  Ties keep their prior order.
    order: Vec<Stage, 3>,
}

impl ProbabilityModel {
    pub fn new(initial: PerStage<f32>, ranges: PerStage<TrustRange>, learning: LearningConfig) -> Self {
        let mut model = Self {
            weights: initial,
            ranges,
            learning,
            order: Vec::from_slice(&Stage::ALL).unwrap_or_default(),
        };
        model.clamp_and_sort();
        model
    }

    /// Reward for a committed output given the absolute temperature error.
    pub fn success_signal(temp_error: f32) -> f32 {
        (-temp_error.abs()).exp()
    }

    /// Fold one outcome into the weights.
    ///
    /// `success_signal` is expected in [0, 1]; rejected candidates pass 0.
    pub fn update(&mut self, stage: Stage, success_signal: f32, temp_error: f32) {
        let signal = if success_signal.is_finite() {
            success_signal.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let decay = self.learning.decay;
        let weight = self.weights.get_mut(stage);
        *weight = (1.0 - decay) * *weight + decay * signal;

        let error = temp_error.abs();
        if error < self.learning.calm_error_c {
            self.weights.slow += self.learning.calm_boost;
        } else if error > self.learning.spike_error_c {
            self.weights.fast += self.learning.spike_boost;
        }

        self.clamp_and_sort();
        trace!(
            "trust: FAST={:.3} SLOW={:.3} BASELINE={:.3}",
            self.weights.fast, self.weights.slow, self.weights.baseline
        );
    }

    pub fn weight(&self, stage: Stage) -> f32 {
        self.weights.get(stage)
    }

    pub fn weights(&self) -> PerStage<f32> {
        self.weights
    }

    /// Full evaluation order, baseline included.
    pub fn order(&self) -> &[Stage] {
        &self.order
    }

    /// Learned candidates in evaluation order.  The baseline is the
    /// terminal fallback and is never a candidate.
    pub fn candidates(&self) -> Vec<Stage, 3> {
        self.order.iter().copied().filter(|s| !s.is_baseline()).collect()
    }

    fn clamp_and_sort(&mut self) {
        for stage in Stage::ALL {
            let range = self.ranges.get(stage);
            let w = self.weights.get_mut(stage);
            *w = range.clamp(*w);
        }
        let weights = self.weights;
        self.order
            .sort_by(|a, b| weights.get(*b).total_cmp(&weights.get(*a)));
    }
}
