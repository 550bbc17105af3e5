//! System configuration parameters
//!
//! All tunable parameters for the cascade and the trial runner.  Values are
//! fixed at construction time; a JSON document may override any subset of
//! the defaults.

use serde::{Deserialize, Serialize};

use crate::cascade::Stage;
use crate::error::ConfigError;
use crate::sensors::temperature::TemperatureUnit;

/// Inclusive clamp range for one controller's trust weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustRange {
    pub min: f32,
    pub max: f32,
}

impl TrustRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, weight: f32) -> f32 {
        weight.clamp(self.min, self.max)
    }

    pub fn contains(&self, weight: f32) -> bool {
        weight >= self.min && weight <= self.max
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.max <= 1.0
            && self.min <= self.max
    }
}

/// One value per stage, indexed by [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerStage<T> {
    pub fast: T,
    pub slow: T,
    pub baseline: T,
}

impl<T: Copy> PerStage<T> {
    pub fn get(&self, stage: Stage) -> T {
        match stage {
            Stage::Fast => self.fast,
            Stage::Slow => self.slow,
            Stage::Baseline => self.baseline,
        }
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut T {
        match stage {
            Stage::Fast => &mut self.fast,
            Stage::Slow => &mut self.slow,
            Stage::Baseline => &mut self.baseline,
        }
    }
}

/// Constants of the confidence estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Fixed confidence reported for the baseline controller.
    pub baseline_confidence: f32,
    /// Lower bound applied to every partial confidence.
    pub partial_floor: f32,
    /// Power (W) at which the power-load confidence reaches its floor.
    pub reference_power_w: f32,
    /// Latency (ms) ceiling used to normalise the latency confidence.
    pub latency_ceiling_ms: f32,
    /// Half-width of the uniform jitter applied to each temperature tier.
    pub tier_jitter: f32,
    /// Half-width of the uniform jitter applied to the averaged confidence.
    pub output_jitter: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            baseline_confidence: 0.1,
            partial_floor: 0.05,
            reference_power_w: 40.0,
            latency_ceiling_ms: 100.0,
            tier_jitter: 0.05,
            output_jitter: 0.03,
        }
    }
}

/// Constants of the trust-weight model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// EMA decay: `w = (1 - decay) * w + decay * signal`.
    pub decay: f32,
    /// Absolute error (°C) below which conditions count as calm.
    pub calm_error_c: f32,
    /// Weight added to the slow controller under calm conditions.
    pub calm_boost: f32,
    /// Absolute error (°C) above which conditions count as a spike.
    pub spike_error_c: f32,
    /// Weight added to the fast controller during a spike.
    pub spike_boost: f32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            decay: 0.1,
            calm_error_c: 0.5,
            calm_boost: 0.02,
            spike_error_c: 2.0,
            spike_boost: 0.05,
        }
    }
}

/// Gains of the baseline integrator-derivative controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 5.0,
            ki: 0.5,
            kd: 1.0,
        }
    }
}

/// Constructor-time parameters of the decision cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    // --- Regulation target ---
    /// Setpoint (°C) of the baseline controller and the error reference.
    pub baseline_setpoint_c: f32,

    // --- Gate ---
    /// Bare confidence threshold in [0, 1].
    pub confidence_threshold: f32,
    /// Extra confidence required on top of the threshold.
    pub hysteresis_margin: f32,
    /// Ticks a controller must stay active before it can be replaced.
    pub min_dwell_cycles: u32,

    // --- Timing / fallback policy ---
    /// Per-tick evaluation budget (milliseconds).
    pub deadline_ms: u32,
    /// Consecutive baseline ticks before the active slot is cleared.
    pub max_baseline_run: u32,
    /// Interval (ticks) between forced baseline visits.
    pub forced_baseline_period: u32,

    // --- Trust model ---
    pub initial_trust: PerStage<f32>,
    pub trust_ranges: PerStage<TrustRange>,
    pub learning: LearningConfig,

    pub estimator: EstimatorConfig,
    pub pid: PidGains,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            baseline_setpoint_c: 16.0,

            confidence_threshold: 0.3,
            hysteresis_margin: 0.1,
            min_dwell_cycles: 6,

            deadline_ms: 200,
            max_baseline_run: 10,
            forced_baseline_period: 40,

            initial_trust: PerStage {
                fast: 0.5,
                slow: 0.5,
                baseline: 0.1,
            },
            trust_ranges: PerStage {
                fast: TrustRange::new(0.05, 0.95),
                slow: TrustRange::new(0.05, 0.95),
                baseline: TrustRange::new(0.05, 0.15),
            },
            learning: LearningConfig::default(),

            estimator: EstimatorConfig::default(),
            pid: PidGains::default(),
        }
    }
}

impl CascadeConfig {
    /// Reject out-of-range parameters before anything is built from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::ValidationFailed as Invalid;

        if !self.baseline_setpoint_c.is_finite() {
            return Err(Invalid("baseline_setpoint_c must be finite"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Invalid("confidence_threshold must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.hysteresis_margin) {
            return Err(Invalid("hysteresis_margin must lie in [0, 1]"));
        }
        if self.confidence_threshold + self.hysteresis_margin > 1.0 {
            return Err(Invalid("confidence_threshold + hysteresis_margin exceeds 1"));
        }
        if self.deadline_ms == 0 {
            return Err(Invalid("deadline_ms must be non-zero"));
        }
        if self.max_baseline_run == 0 {
            return Err(Invalid("max_baseline_run must be non-zero"));
        }
        if self.forced_baseline_period == 0 {
            return Err(Invalid("forced_baseline_period must be non-zero"));
        }

        for stage in Stage::ALL {
            let range = self.trust_ranges.get(stage);
            if !range.is_valid() {
                return Err(Invalid("trust range must satisfy 0 <= min <= max <= 1"));
            }
            if !range.contains(self.initial_trust.get(stage)) {
                return Err(Invalid("initial trust weight outside its clamp range"));
            }
        }

        let l = &self.learning;
        if !(l.decay > 0.0 && l.decay <= 1.0) {
            return Err(Invalid("learning.decay must lie in (0, 1]"));
        }
        if !(l.calm_boost >= 0.0 && l.spike_boost >= 0.0 && l.calm_boost.is_finite() && l.spike_boost.is_finite()) {
            return Err(Invalid("learning boosts must be finite and non-negative"));
        }
        if !(l.calm_error_c >= 0.0 && l.spike_error_c >= l.calm_error_c && l.spike_error_c.is_finite()) {
            return Err(Invalid("learning error bands must satisfy 0 <= calm <= spike"));
        }

        let e = &self.estimator;
        if !(0.0..=1.0).contains(&e.baseline_confidence) {
            return Err(Invalid("estimator.baseline_confidence must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&e.partial_floor) {
            return Err(Invalid("estimator.partial_floor must lie in [0, 1]"));
        }
        let positive = |v: f32| v > 0.0 && v.is_finite();
        if !positive(e.reference_power_w) || !positive(e.latency_ceiling_ms) {
            return Err(Invalid("estimator reference values must be positive and finite"));
        }
        if !(0.0..=0.5).contains(&e.tier_jitter) || !(0.0..=0.5).contains(&e.output_jitter) {
            return Err(Invalid("estimator jitter must lie in [0, 0.5]"));
        }

        let g = &self.pid;
        if !(g.kp.is_finite() && g.ki.is_finite() && g.kd.is_finite()) {
            return Err(Invalid("pid gains must be finite"));
        }

        Ok(())
    }
}

/// Which controller drives the element during a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// The baseline PID alone, every tick.
    Baseline,
    /// The full arbitration cascade.
    Cascade,
}

/// Trial-runner parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Label carried into the summary (e.g. `"IDK_0.3"`).
    pub trial_name: String,
    pub mode: ControlMode,
    /// Trial length in minutes.
    pub duration_minutes: f32,
    /// Control tick cadence (milliseconds).
    pub tick_interval_ms: u32,
    /// Enabled thermistor channels A0..A3.
    pub channels: [bool; 4],
    pub unit: TemperatureUnit,
    /// JSON model description for the fast candidate.
    pub fast_model: Option<String>,
    /// JSON model description for the slow candidate.
    pub slow_model: Option<String>,
    /// Fixed jitter seed; time-seeded when absent.
    pub seed: Option<u64>,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trial_name: String::from("IDK_0.3"),
            mode: ControlMode::Cascade,
            duration_minutes: 45.0,
            tick_interval_ms: 1000, // 1 Hz
            channels: [true; 4],
            unit: TemperatureUnit::Celsius,
            fast_model: None,
            slow_model: None,
            seed: None,
            log_level: String::from("info"),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::ValidationFailed as Invalid;

        if self.tick_interval_ms == 0 {
            return Err(Invalid("tick_interval_ms must be non-zero"));
        }
        if !(self.duration_minutes.is_finite() && self.duration_minutes > 0.0) {
            return Err(Invalid("duration_minutes must be positive"));
        }
        if !self.channels.iter().any(|&c| c) {
            return Err(Invalid("at least one temperature channel must be enabled"));
        }
        if self.unit != TemperatureUnit::Celsius {
            // The cascade setpoint and error bands are expressed in °C.
            return Err(Invalid("control loop requires Celsius readings"));
        }
        Ok(())
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub cascade: CascadeConfig,
    pub run: RunConfig,
}

impl SystemConfig {
    /// Parse and validate a JSON document.  Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cascade.validate()?;
        self.run.validate()
    }
}
