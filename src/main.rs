//! Thermal cascade: bench runner.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  SimulatedRig / HardwareAdapter   LogEventSink   Clock       │
//! │  (Sensor + Actuator)              (EventSink)                │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │       ControlService (read · decide · actuate)     │      │
//! │  │  CascadeArbiter: FAST · SLOW · BASELINE(PID)       │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `thermal-cascade [--accelerated] [config.json]`
//!
//! `--accelerated` drives the simulated rig on a manual clock, so a
//! 45-minute trial completes as fast as the host can tick.

#![deny(unused_must_use)]

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use thermal_cascade::Error;
use thermal_cascade::adapters::console_log::{ConsoleLogger, parse_level};
use thermal_cascade::adapters::log_sink::LogEventSink;
use thermal_cascade::adapters::sim::{RigParams, SimulatedRig};
use thermal_cascade::adapters::time::{ManualClock, MonotonicClock};
use thermal_cascade::app::ports::Decider;
use thermal_cascade::app::service::ControlService;
use thermal_cascade::cascade::{CascadeArbiter, Clock};
use thermal_cascade::config::{ControlMode, SystemConfig};
use thermal_cascade::control::model::MlpPredictor;
use thermal_cascade::control::pid::{BaselineDecider, PidController};
use thermal_cascade::control::predictor::BoxedPredictor;
use thermal_cascade::error::PredictorError;

fn main() -> Result<()> {
    let mut accelerated = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--accelerated" => accelerated = true,
            _ => config_path = Some(arg),
        }
    }

    let mut config = match &config_path {
        Some(path) => load_config(Path::new(path))?,
        None => SystemConfig::default(),
    };

    ConsoleLogger::init(parse_level(&config.run.log_level)).context("installing logger")?;

    info!("thermal-cascade v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("config loaded from {path}"),
        None => info!("no config given, using defaults"),
    }

    let seed = config.run.seed.unwrap_or_else(time_seed);
    info!("jitter seed {seed}");

    let predictors = load_predictors(&config)?;
    if predictors.is_none() && config.run.mode == ControlMode::Cascade {
        warn!("no predictor models configured, running a baseline-only trial");
        config.run.mode = ControlMode::Baseline;
    }

    let rig = SimulatedRig::new(RigParams::default(), seed.wrapping_add(1));

    if accelerated {
        let clock = ManualClock::new();
        let decider = build_decider(&config, predictors, clock.clone(), seed).context("building decider")?;
        let step = Duration::from_millis(u64::from(config.run.tick_interval_ms));
        run(&config, decider, clock.clone(), rig, || clock.advance_us(step.as_micros() as u64))
    } else {
        let clock = MonotonicClock::new();
        let decider = build_decider(&config, predictors, clock, seed).context("building decider")?;
        let interval = Duration::from_millis(u64::from(config.run.tick_interval_ms));
        run(&config, decider, clock, rig, || std::thread::sleep(interval))
    }
}

fn load_config(path: &Path) -> Result<SystemConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    SystemConfig::from_json(&text)
        .map_err(Error::from)
        .with_context(|| format!("parsing {}", path.display()))
}

fn load_model(path: &str) -> Result<MlpPredictor> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading model {path}"))?;
    MlpPredictor::from_json(&text)
        .map_err(Error::from)
        .with_context(|| format!("loading model {path}"))
}

/// Both candidates, or `None` when no model is configured at all.  A single
/// missing model becomes a candidate that never answers.
fn load_predictors(config: &SystemConfig) -> Result<Option<(BoxedPredictor, BoxedPredictor)>> {
    let run = &config.run;
    if run.fast_model.is_none() && run.slow_model.is_none() {
        return Ok(None);
    }

    let load = |path: &Option<String>, name: &str| -> Result<BoxedPredictor> {
        match path {
            Some(p) => Ok(Box::new(load_model(p)?)),
            None => {
                warn!("{name} model not configured, that stage will never engage");
                Ok(Box::new(|_t: f32, _p: f32, _l: f32| {
                    Err::<f32, PredictorError>(PredictorError::InferenceFailed)
                }))
            }
        }
    };
    let fast = load(&run.fast_model, "fast")?;
    let slow = load(&run.slow_model, "slow")?;
    Ok(Some((fast, slow)))
}

fn build_decider<C: Clock + Send + 'static>(
    config: &SystemConfig,
    predictors: Option<(BoxedPredictor, BoxedPredictor)>,
    clock: C,
    seed: u64,
) -> thermal_cascade::Result<Box<dyn Decider>> {
    let cascade = &config.cascade;
    match (config.run.mode, predictors) {
        (ControlMode::Cascade, Some((fast, slow))) => {
            let arbiter = CascadeArbiter::new(cascade.clone(), fast, slow, clock, StdRng::seed_from_u64(seed))?;
            Ok(Box::new(arbiter))
        }
        _ => {
            let pid = PidController::new(cascade.pid, cascade.baseline_setpoint_c);
            Ok(Box::new(BaselineDecider::new(pid, clock)))
        }
    }
}

fn run<C: Clock>(
    config: &SystemConfig,
    decider: Box<dyn Decider>,
    clock: C,
    mut rig: SimulatedRig,
    mut wait: impl FnMut(),
) -> Result<()> {
    let mut sink = LogEventSink::new();
    let mut service = ControlService::new(decider, clock, &config.run, config.cascade.baseline_setpoint_c);
    let tick_s = config.run.tick_interval_ms as f32 / 1000.0;

    service.start(&mut sink);
    while service.tick(&mut rig, &mut sink).is_some() {
        wait();
        rig.step(tick_s);
    }
    let summary = service.finish(&mut rig, &mut sink);

    let json = summary.to_json().context("serialising trial summary")?;
    println!("{json}");
    Ok(())
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}
