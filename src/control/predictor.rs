//! Candidate predictor capability.
//!
//! A predictor maps the current operating point to a proposed duty.  The
//! arbiter treats it as opaque and side-effect free; cost is bounded by the
//! deadline guard, not here.

use crate::error::PredictorError;

pub trait Predictor {
    /// Propose a duty for `temperature` (°C), `power` (W), `latency` (ms).
    fn predict(&mut self, temperature: f32, power: f32, latency: f32) -> Result<f32, PredictorError>;
}

impl<F> Predictor for F
where
    F: FnMut(f32, f32, f32) -> Result<f32, PredictorError>,
{
    fn predict(&mut self, temperature: f32, power: f32, latency: f32) -> Result<f32, PredictorError> {
        self(temperature, power, latency)
    }
}

/// Boxed predictor as stored by the arbiter.
pub type BoxedPredictor = Box<dyn Predictor + Send>;
