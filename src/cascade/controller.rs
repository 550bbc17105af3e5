//! The closed set of controllers the arbiter can commit.

use super::Stage;
use crate::control::pid::PidController;
use crate::control::predictor::BoxedPredictor;
use crate::error::PredictorError;

/// A candidate controller tagged with its stage.
pub enum Controller {
    Fast(BoxedPredictor),
    Slow(BoxedPredictor),
    Baseline(PidController),
}

impl Controller {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fast(_) => Stage::Fast,
            Self::Slow(_) => Stage::Slow,
            Self::Baseline(_) => Stage::Baseline,
        }
    }

    /// Proposed duty in [0, 100].
    ///
    /// Learned controllers may fail; the baseline always answers.  A
    /// negative PID output (element should idle) maps to zero duty.
    pub fn propose(&mut self, temperature: f32, power: f32, latency: f32, now_us: u64) -> Result<f32, PredictorError> {
        let raw = match self {
            Self::Fast(p) | Self::Slow(p) => p.predict(temperature, power, latency)?,
            Self::Baseline(pid) => pid.update(temperature, now_us),
        };
        if !raw.is_finite() {
            return Err(PredictorError::InvalidOutput);
        }
        Ok(raw.clamp(0.0, 100.0))
    }
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Baseline(pid) => f.debug_tuple("Baseline").field(pid).finish(),
            other => write!(f, "{}(..)", other.stage()),
        }
    }
}
