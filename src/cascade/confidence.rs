//! Confidence estimation for candidate outputs.
//!
//! A learned controller's proposed duty is scored against the current
//! operating conditions.  Four partial confidences (temperature proximity,
//! power load, latency, output centering) are floored, averaged, jittered
//! and clamped to [0, 1].  The baseline controller is never scored: it gets
//! a fixed low constant because it is trusted structurally.
//!
//! Jitter comes from the caller-supplied RNG so that a seeded source gives
//! reproducible scores.

use rand::Rng;

use crate::config::EstimatorConfig;

/// Temperature-proximity tiers: `(max |error| in °C, nominal confidence)`.
/// Errors beyond the last bound score [`OUTER_TIER_CONFIDENCE`].
const TEMPERATURE_TIERS: [(f32, f32); 4] = [(0.5, 0.9), (1.0, 0.75), (2.0, 0.55), (4.0, 0.35)];
const OUTER_TIER_CONFIDENCE: f32 = 0.15;

/// Duty at the centre of the actuator range.
const DUTY_CENTRE: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct ConfidenceEstimator {
    config: EstimatorConfig,
}

impl ConfidenceEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Score a proposed duty.  Always returns a value in [0, 1].
    #[allow(clippy::too_many_arguments)]
    pub fn estimate<R: Rng>(
        &self,
        rng: &mut R,
        duty: f32,
        temperature: f32,
        power: f32,
        latency: f32,
        baseline_setpoint: f32,
        is_baseline: bool,
    ) -> f32 {
        if is_baseline {
            return self.config.baseline_confidence;
        }

        let error = (temperature - baseline_setpoint).abs();
        let partials = [
            self.temperature_confidence(rng, error),
            self.power_confidence(power),
            self.latency_confidence(latency),
            self.centering_confidence(duty),
        ];
        let mean = partials.iter().sum::<f32>() / partials.len() as f32;
        let jitter = symmetric(rng, self.config.output_jitter);

        (mean + jitter).clamp(0.0, 1.0)
    }

    /// Confidence reported for the baseline controller.
    pub fn baseline_confidence(&self) -> f32 {
        self.config.baseline_confidence
    }

    fn temperature_confidence<R: Rng>(&self, rng: &mut R, error: f32) -> f32 {
        let nominal = TEMPERATURE_TIERS
            .iter()
            .find(|(bound, _)| error <= *bound)
            .map_or(OUTER_TIER_CONFIDENCE, |(_, conf)| *conf);
        self.floor(nominal + symmetric(rng, self.config.tier_jitter))
    }

    fn power_confidence(&self, power: f32) -> f32 {
        let load = (power / self.config.reference_power_w).clamp(0.0, 1.0);
        self.floor(1.0 - load)
    }

    fn latency_confidence(&self, latency: f32) -> f32 {
        let ceiling = self.config.latency_ceiling_ms;
        let load = latency.clamp(0.0, ceiling) / ceiling;
        self.floor(1.0 - load)
    }

    fn centering_confidence(&self, duty: f32) -> f32 {
        let spread = (duty - DUTY_CENTRE).abs() / DUTY_CENTRE;
        self.floor(1.0 - spread)
    }

    /// Apply the partial floor.  `f32::max` maps NaN to the floor.
    fn floor(&self, value: f32) -> f32 {
        value.max(self.config.partial_floor).min(1.0)
    }
}

/// Uniform sample in `[-half_width, half_width]`.
fn symmetric<R: Rng>(rng: &mut R, half_width: f32) -> f32 {
    if half_width > 0.0 {
        rng.gen_range(-half_width..=half_width)
    } else {
        0.0
    }
}
