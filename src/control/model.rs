//! Feed-forward network predictor.
//!
//! Loads a small dense network from JSON:
//!
//! ```json
//! { "mean":  [t, l, p],
//!   "scale": [t, l, p],
//!   "layers": [ { "weights": [[..3 inputs..], ...], "bias": [...] }, ... ] }
//! ```
//!
//! Inputs are ordered `[temperature, latency, power]` and standardised with
//! the stored scaler before the forward pass.  Hidden layers use ReLU, the
//! single output is linear and clamped to the duty range.

use serde::{Deserialize, Serialize};

use super::predictor::Predictor;
use crate::error::PredictorError;

const INPUTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Row-major: `weights[out][in]`.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn outputs(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f32], relu: bool) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z = row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b;
                if relu { z.max(0.0) } else { z }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub mean: [f32; INPUTS],
    pub scale: [f32; INPUTS],
    pub layers: Vec<DenseLayer>,
}

#[derive(Debug, Clone)]
pub struct MlpPredictor {
    spec: ModelSpec,
}

impl MlpPredictor {
    /// Validate layer shapes and the scaler.
    pub fn from_spec(spec: ModelSpec) -> Result<Self, PredictorError> {
        if spec.scale.iter().any(|s| !s.is_finite() || *s == 0.0) || spec.mean.iter().any(|m| !m.is_finite()) {
            return Err(PredictorError::Malformed);
        }
        if spec.layers.is_empty() {
            return Err(PredictorError::ShapeMismatch);
        }

        let mut width = INPUTS;
        for layer in &spec.layers {
            if layer.outputs() == 0 || layer.bias.len() != layer.outputs() {
                return Err(PredictorError::ShapeMismatch);
            }
            if layer.inputs() != width || layer.weights.iter().any(|row| row.len() != width) {
                return Err(PredictorError::ShapeMismatch);
            }
            width = layer.outputs();
        }
        if width != 1 {
            return Err(PredictorError::ShapeMismatch);
        }

        Ok(Self { spec })
    }

    pub fn from_json(text: &str) -> Result<Self, PredictorError> {
        let spec: ModelSpec = serde_json::from_str(text).map_err(|_| PredictorError::Malformed)?;
        Self::from_spec(spec)
    }

    fn forward(&self, temperature: f32, power: f32, latency: f32) -> f32 {
        let raw = [temperature, latency, power];
        let mut activations: Vec<f32> = raw
            .iter()
            .zip(self.spec.mean.iter().zip(&self.spec.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect();

        let last = self.spec.layers.len() - 1;
        for (idx, layer) in self.spec.layers.iter().enumerate() {
            activations = layer.forward(&activations, idx != last);
        }
        activations[0]
    }
}

impl Predictor for MlpPredictor {
    fn predict(&mut self, temperature: f32, power: f32, latency: f32) -> Result<f32, PredictorError> {
        let out = self.forward(temperature, power, latency);
        if !out.is_finite() {
            return Err(PredictorError::InvalidOutput);
        }
        Ok(out.clamp(0.0, 100.0))
    }
}
