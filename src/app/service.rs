//! Control service: the hexagonal core.
//!
//! [`ControlService`] owns the decider, the clock and the trial recorder.
//! All I/O flows through port traits injected at call sites, making the
//! whole loop testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                 │       ControlService        │
//! ActuatorPort ◀──│  Decider · TrialRecorder    │
//!                 └────────────────────────────┘
//! ```

use log::{info, warn};

use crate::cascade::{Clock, Decision, Stage};
use crate::config::{ControlMode, RunConfig};
use crate::error::SensorError;
use crate::telemetry::{TrialRecorder, TrialSummary};

use super::events::{AppEvent, TickRecord};
use super::ports::{ActuatorPort, Decider, EventSink, SensorPort};

pub struct ControlService<D: Decider, C: Clock> {
    decider: D,
    clock: C,
    recorder: TrialRecorder,
    mode: ControlMode,
    /// Used until the first good reading arrives.
    setpoint_c: f32,
    last_temperature: Option<f32>,
    last_stage: Option<Stage>,
    tick_count: u64,
}

impl<D: Decider, C: Clock> ControlService<D, C> {
    pub fn new(decider: D, clock: C, run: &RunConfig, setpoint_c: f32) -> Self {
        Self {
            decider,
            clock,
            recorder: TrialRecorder::new(run.trial_name.clone(), setpoint_c, run.duration_minutes),
            mode: run.mode,
            setpoint_c,
            last_temperature: None,
            last_stage: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.recorder.start(self.clock.now_us());
        sink.emit(&AppEvent::Started {
            trial: self.recorder.trial_name().to_owned(),
            mode: self.mode,
        });
        info!("trial '{}' started ({:?})", self.recorder.trial_name(), self.mode);
    }

    /// True once the trial duration has elapsed.
    pub fn should_stop(&self) -> bool {
        self.recorder.should_stop(self.clock.now_us())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read → decide → actuate → record.
    ///
    /// Returns `None` without touching the hardware once the trial is over.
    pub fn tick(&mut self, hw: &mut (impl SensorPort + ActuatorPort), sink: &mut impl EventSink) -> Option<Decision> {
        if self.should_stop() {
            return None;
        }
        self.tick_count += 1;

        // 1. Sensors, timing the I/O
        let io_start = self.clock.now_us();
        let reading = hw
            .read_temperature()
            .and_then(|t| if t.is_finite() { Ok(t) } else { Err(SensorError::OutOfRange) });
        let temperature = match reading {
            Ok(t) => {
                self.last_temperature = Some(t);
                t
            }
            Err(fault) => {
                let fallback = self.last_temperature.unwrap_or(self.setpoint_c);
                warn!("temperature read failed ({fault}), reusing {fallback:.2}");
                sink.emit(&AppEvent::SensorFault(fault));
                fallback
            }
        };
        let power = hw.read_power();
        let latency_ms = self.clock.elapsed_since(io_start) as f32 / 1000.0;

        // 2. Decide
        let decision = self.decider.decide(temperature, latency_ms, power);

        // 3. Actuate
        let applied = match hw.set_duty(decision.duty) {
            Ok(d) => d,
            Err(e) => {
                warn!("element write failed ({e}), switching off");
                hw.all_off();
                0.0
            }
        };

        // 4. Record and report
        self.recorder.record(temperature, latency_ms, power, applied);
        sink.emit(&AppEvent::Tick(TickRecord {
            tick: self.tick_count,
            temperature_c: temperature,
            duty: applied,
            latency_ms,
            power_w: power,
            stage: decision.stage,
            confidence_percent: decision.confidence_percent,
        }));

        if self.last_stage != Some(decision.stage) {
            sink.emit(&AppEvent::StageChanged {
                from: self.last_stage,
                to: decision.stage,
                confidence_percent: decision.confidence_percent,
            });
            self.last_stage = Some(decision.stage);
        }

        Some(decision)
    }

    /// Switch the element off and emit the summary.
    pub fn finish(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) -> TrialSummary {
        hw.all_off();

        let stages = match self.mode {
            ControlMode::Cascade => Some(self.decider.stage_breakdown()),
            ControlMode::Baseline => None,
        };
        let summary = self.recorder.summarize(self.clock.now_us(), stages);

        sink.emit(&AppEvent::Summary(summary.clone()));
        sink.emit(&AppEvent::Stopped {
            ticks: self.tick_count,
        });
        info!(
            "trial '{}' complete after {} ticks",
            summary.trial_name, self.tick_count
        );
        summary
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn decider(&self) -> &D {
        &self.decider
    }

    pub fn recorder(&self) -> &TrialRecorder {
        &self.recorder
    }
}
