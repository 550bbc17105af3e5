//! Fuzz target: `SystemConfig::from_json`
//!
//! Feeds arbitrary bytes through the config loader.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Any document the loader accepts passes validation again and builds a
//!   working arbiter
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thermal_cascade::adapters::time::ManualClock;
use thermal_cascade::cascade::CascadeArbiter;
use thermal_cascade::config::SystemConfig;
use thermal_cascade::error::PredictorError;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = SystemConfig::from_json(text) else {
        return;
    };
    assert!(config.validate().is_ok());

    let mut arbiter = CascadeArbiter::new(
        config.cascade,
        Box::new(|_t: f32, _p: f32, _l: f32| Ok::<f32, PredictorError>(40.0)),
        Box::new(|_t: f32, _p: f32, _l: f32| Ok::<f32, PredictorError>(60.0)),
        ManualClock::new(),
        StdRng::seed_from_u64(0),
    )
    .expect("validated config must build an arbiter");

    for i in 0..64 {
        let d = arbiter.decide(10.0 + i as f32 * 0.25, 2.0, 10.0);
        assert!((0.0..=100.0).contains(&d.duty));
        assert!((0.0..=100.0).contains(&d.confidence_percent));
    }
    assert_eq!(arbiter.total_decisions(), 64);
});
