//! Shared handle for an arbiter driven from more than one context.
//!
//! The control tick and any observer (a status reporter, a second loop
//! reading counters) go through one critical-section mutex, so a
//! `decide` call and a query never interleave.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use rand::Rng;

use super::{CascadeArbiter, Clock, Decision};

pub struct SharedArbiter<C: Clock, R: Rng> {
    inner: CriticalSectionMutex<RefCell<CascadeArbiter<C, R>>>,
}

impl<C: Clock, R: Rng> SharedArbiter<C, R> {
    pub fn new(arbiter: CascadeArbiter<C, R>) -> Self {
        Self {
            inner: CriticalSectionMutex::new(RefCell::new(arbiter)),
        }
    }

    /// Serialised [`CascadeArbiter::decide`].
    pub fn decide(&self, temperature: f32, latency: f32, power: f32) -> Decision {
        self.inner
            .lock(|cell| cell.borrow_mut().decide(temperature, latency, power))
    }

    /// Run `f` against the arbiter while holding the lock.
    pub fn with<T>(&self, f: impl FnOnce(&CascadeArbiter<C, R>) -> T) -> T {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    pub fn into_inner(self) -> CascadeArbiter<C, R> {
        self.inner.into_inner().into_inner()
    }
}
