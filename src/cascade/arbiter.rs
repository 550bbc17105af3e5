//! The per-tick decision state machine.
//!
//! `decide` runs, in order:
//!
//! 1. advance dwell / periodic / baseline-run counters;
//! 2. clear the active slot after `max_baseline_run` baseline ticks;
//! 3. forced baseline visit every `forced_baseline_period` ticks;
//! 4. learned candidates in trust order, each behind the deadline guard,
//!    the confidence estimator and the hysteresis gate;
//! 5. baseline when nothing was accepted.
//!
//! The two baseline triggers of steps 2 and 3 are independent.

use log::{debug, info, warn};
use rand::Rng;

use super::confidence::ConfidenceEstimator;
use super::controller::Controller;
use super::deadline::{Clock, DeadlineGuard};
use super::hysteresis::HysteresisGate;
use super::probability::ProbabilityModel;
use super::{CascadeState, Decision, Stage, StageCounts};
use crate::config::{CascadeConfig, PerStage};
use crate::control::pid::PidController;
use crate::control::predictor::BoxedPredictor;
use crate::error::ConfigError;

/// Why a tick ended on the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    /// Scheduled periodic visit.
    Forced,
    /// Deadline overrun before or during a candidate.
    Overrun,
    /// No candidate passed the gate.
    Exhausted,
}

pub struct CascadeArbiter<C: Clock, R: Rng> {
    config: CascadeConfig,
    /// Indexed by [`Stage::index`].
    controllers: [Controller; 3],
    estimator: ConfidenceEstimator,
    model: ProbabilityModel,
    gate: HysteresisGate,
    guard: DeadlineGuard,
    state: CascadeState,
    clock: C,
    rng: R,
}

impl<C: Clock, R: Rng> CascadeArbiter<C, R> {
    /// Build an arbiter with neutral state.  Rejects invalid configuration.
    pub fn new(
        config: CascadeConfig,
        fast: BoxedPredictor,
        slow: BoxedPredictor,
        clock: C,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let baseline = PidController::new(config.pid, config.baseline_setpoint_c);
        let model = ProbabilityModel::new(
            config.initial_trust,
            config.trust_ranges,
            config.learning.clone(),
        );

        Ok(Self {
            controllers: [
                Controller::Fast(fast),
                Controller::Slow(slow),
                Controller::Baseline(baseline),
            ],
            estimator: ConfidenceEstimator::new(config.estimator.clone()),
            model,
            gate: HysteresisGate::new(config.hysteresis_margin, config.min_dwell_cycles),
            guard: DeadlineGuard::new(config.deadline_ms),
            state: CascadeState::new(),
            clock,
            rng,
            config,
        })
    }

    /// Run one tick and commit exactly one controller's output.
    pub fn decide(&mut self, temperature: f32, latency: f32, power: f32) -> Decision {
        let tick_start = self.clock.now_us();
        let setpoint = self.config.baseline_setpoint_c;
        let temp_error = (temperature - setpoint).abs();

        self.state.begin_tick();

        if self.state.consecutive_baseline_ticks >= self.config.max_baseline_run {
            info!(
                "baseline held for {} ticks, reopening the active slot",
                self.state.consecutive_baseline_ticks
            );
            self.state.active = None;
            self.state.consecutive_baseline_ticks = 0;
        }

        if self.state.cycles_since_forced_baseline >= self.config.forced_baseline_period {
            return self.fall_back(Fallback::Forced, temperature, power, latency, temp_error, None);
        }

        let threshold = self.config.confidence_threshold;
        let mut best_rejected: Option<f32> = None;

        for stage in self.model.candidates() {
            if self.guard.check(self.clock.elapsed_since(tick_start)) {
                return self.fall_back(Fallback::Overrun, temperature, power, latency, temp_error, best_rejected);
            }

            let now_us = self.clock.now_us();
            let proposal = self.controllers[stage.index()].propose(temperature, power, latency, now_us);

            // A late answer is discarded, whatever it says.
            if self.guard.check(self.clock.elapsed_since(tick_start)) {
                return self.fall_back(Fallback::Overrun, temperature, power, latency, temp_error, best_rejected);
            }

            let duty = match proposal {
                Ok(duty) => duty,
                Err(e) => {
                    debug!("{stage}: predictor failed ({e}), skipping");
                    self.model.update(stage, 0.0, temp_error);
                    continue;
                }
            };

            let confidence =
                self.estimator
                    .estimate(&mut self.rng, duty, temperature, power, latency, setpoint, false);

            if self.gate.accept(stage, confidence, threshold, &self.state) {
                return self.commit(stage, duty, confidence, temp_error);
            }

            debug!(
                "{stage}: rejected (confidence {confidence:.3}, active {:?}, dwell {})",
                self.state.active, self.state.dwell_counter
            );
            best_rejected = Some(best_rejected.map_or(confidence, |b| b.max(confidence)));
            self.model.update(stage, 0.0, temp_error);
        }

        self.fall_back(Fallback::Exhausted, temperature, power, latency, temp_error, best_rejected)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Commit counts per stage since construction.
    pub fn stage_breakdown(&self) -> StageCounts {
        self.state.stage_counts
    }

    pub fn total_decisions(&self) -> u64 {
        self.state.total_decisions()
    }

    /// Ticks that fell back because the deadline was exceeded.
    pub fn overrun_count(&self) -> u64 {
        self.state.overruns
    }

    pub fn forced_visit_count(&self) -> u64 {
        self.state.forced_visits
    }

    pub fn trust_weights(&self) -> PerStage<f32> {
        self.model.weights()
    }

    pub fn evaluation_order(&self) -> &[Stage] {
        self.model.order()
    }

    pub fn active_stage(&self) -> Option<Stage> {
        self.state.active
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Commit the baseline.  Only a forced visit resets the periodic
    /// counter; overrun and exhausted fallbacks leave it running.
    fn fall_back(
        &mut self,
        cause: Fallback,
        temperature: f32,
        power: f32,
        latency: f32,
        temp_error: f32,
        best_rejected: Option<f32>,
    ) -> Decision {
        let baseline_conf = self.estimator.baseline_confidence();
        let confidence = match cause {
            Fallback::Forced => {
                self.state.cycles_since_forced_baseline = 0;
                self.state.dwell_counter = 0;
                self.state.forced_visits += 1;
                info!("forced baseline visit #{}", self.state.forced_visits);
                baseline_conf
            }
            Fallback::Overrun => {
                self.state.overruns += 1;
                warn!(
                    "decision deadline of {} us exceeded, committing baseline",
                    self.guard.budget_us()
                );
                baseline_conf
            }
            Fallback::Exhausted => best_rejected.unwrap_or(baseline_conf),
        };

        let now_us = self.clock.now_us();
        let duty = self.controllers[Stage::Baseline.index()]
            .propose(temperature, power, latency, now_us)
            .unwrap_or(0.0);

        self.commit(Stage::Baseline, duty, confidence, temp_error)
    }

    fn commit(&mut self, stage: Stage, duty: f32, confidence: f32, temp_error: f32) -> Decision {
        let previous = self.state.active;
        if self.state.commit(stage, confidence) {
            match previous {
                Some(from) => info!("stage switch {from} -> {stage} (confidence {confidence:.3})"),
                None => info!("stage {stage} engaged (confidence {confidence:.3})"),
            }
        }
        self.model
            .update(stage, ProbabilityModel::success_signal(temp_error), temp_error);

        Decision::new(duty, stage, confidence)
    }
}

impl<C: Clock, R: Rng> core::fmt::Debug for CascadeArbiter<C, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CascadeArbiter")
            .field("state", &self.state)
            .field("order", &self.model.order())
            .field("weights", &self.model.weights())
            .finish_non_exhaustive()
    }
}
