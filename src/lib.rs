//! Thermal cascade controller library.
//!
//! Once per control tick a [`cascade::CascadeArbiter`] chooses which of
//! three controllers drives a thermoelectric element: a fast learned
//! predictor, a slow learned predictor, or the baseline PID that is always
//! there to fall back on.  Everything around the arbiter (sensors, the
//! element, trial telemetry) sits behind the ports in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cascade;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod sensors;
pub mod telemetry;

pub use error::{Error, Result};
