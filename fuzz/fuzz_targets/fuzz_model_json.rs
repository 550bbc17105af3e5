//! Fuzz target: `MlpPredictor::from_json` + `predict`
//!
//! Invariants checked:
//! - Loading never panics, whatever the shapes in the document
//! - An accepted model yields either an error or a duty in [0, 100]
//!
//! cargo fuzz run fuzz_model_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermal_cascade::control::model::MlpPredictor;
use thermal_cascade::control::predictor::Predictor;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(mut model) = MlpPredictor::from_json(text) else {
        return;
    };
    for (t, p, l) in [(16.0, 10.0, 2.0), (-40.0, 0.0, 0.0), (f32::MAX, f32::MIN, 1e9)] {
        if let Ok(duty) = model.predict(t, p, l) {
            assert!((0.0..=100.0).contains(&duty));
        }
    }
});
