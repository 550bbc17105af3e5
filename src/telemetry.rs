//! Trial bookkeeping.
//!
//! [`TrialRecorder`] keeps per-tick histories for a bounded-duration trial
//! and condenses them into a [`TrialSummary`] at the end.  Where the rows
//! end up (console, file, network) is the event sink's business.

use serde::Serialize;

use crate::cascade::StageCounts;

const US_PER_MINUTE: f64 = 60_000_000.0;

/// End-of-trial figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub trial_name: String,
    pub baseline_temp_c: f32,
    pub duration_min: f32,
    /// Sample standard deviation of temperature.  0 with fewer than two samples.
    pub temp_std_dev: f32,
    pub avg_latency_ms: f32,
    pub avg_power_w: f32,
    pub avg_duty: f32,
    /// Present for cascade trials only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<StageCounts>,
    /// `1 / (std * latency * power)`; infinite when the product is zero.
    /// Serialises as `null` when infinite.
    pub efficiency_score: f64,
    pub samples: usize,
}

impl TrialSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone)]
pub struct TrialRecorder {
    trial_name: String,
    baseline_temp_c: f32,
    duration_us: u64,
    start_us: Option<u64>,
    temperatures: Vec<f32>,
    latencies: Vec<f32>,
    powers: Vec<f32>,
    duties: Vec<f32>,
}

impl TrialRecorder {
    pub fn new(trial_name: impl Into<String>, baseline_temp_c: f32, duration_minutes: f32) -> Self {
        let duration_us = (f64::from(duration_minutes.max(0.0)) * US_PER_MINUTE) as u64;
        Self {
            trial_name: trial_name.into(),
            baseline_temp_c,
            duration_us,
            start_us: None,
            temperatures: Vec::new(),
            latencies: Vec::new(),
            powers: Vec::new(),
            duties: Vec::new(),
        }
    }

    /// Mark the trial start.  Later calls are ignored.
    pub fn start(&mut self, now_us: u64) {
        self.start_us.get_or_insert(now_us);
    }

    pub fn elapsed_us(&self, now_us: u64) -> u64 {
        self.start_us.map_or(0, |s| now_us.saturating_sub(s))
    }

    /// True once the configured duration has elapsed.
    pub fn should_stop(&self, now_us: u64) -> bool {
        self.start_us.is_some() && self.elapsed_us(now_us) >= self.duration_us
    }

    pub fn record(&mut self, temperature: f32, latency_ms: f32, power_w: f32, duty: f32) {
        self.temperatures.push(temperature);
        self.latencies.push(latency_ms);
        self.powers.push(power_w);
        self.duties.push(duty);
    }

    pub fn samples(&self) -> usize {
        self.temperatures.len()
    }

    pub fn trial_name(&self) -> &str {
        &self.trial_name
    }

    pub fn summarize(&self, now_us: u64, stages: Option<StageCounts>) -> TrialSummary {
        let temp_std_dev = sample_std_dev(&self.temperatures);
        let avg_latency_ms = mean(&self.latencies);
        let avg_power_w = mean(&self.powers);

        let product = f64::from(temp_std_dev) * f64::from(avg_latency_ms) * f64::from(avg_power_w);
        let efficiency_score = if product == 0.0 { f64::INFINITY } else { 1.0 / product };

        TrialSummary {
            trial_name: self.trial_name.clone(),
            baseline_temp_c: self.baseline_temp_c,
            duration_min: (self.elapsed_us(now_us) as f64 / US_PER_MINUTE) as f32,
            temp_std_dev,
            avg_latency_ms,
            avg_power_w,
            avg_duty: mean(&self.duties),
            stages,
            efficiency_score,
            samples: self.samples(),
        }
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64) as f32
}

fn sample_std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = f64::from(mean(values));
    let ss: f64 = values.iter().map(|v| (f64::from(*v) - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt() as f32
}
