//! Application core: the control loop, free of I/O.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
