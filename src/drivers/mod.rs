//! Actuator drivers.

pub mod element;

pub use element::{ElementState, HeaterElement};
