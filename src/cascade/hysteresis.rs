//! Switching hysteresis.
//!
//! A confident candidate still has to earn the right to take over: it must
//! clear `threshold + margin` and then either continue the active
//! controller, replace one that has dwelt long enough, or recover from a
//! baseline fallback.

use super::{CascadeState, Stage};

/// How far below the last committed confidence a candidate may be and
/// still take over from the baseline.
pub const RECOVERY_SLACK: f32 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct HysteresisGate {
    margin: f32,
    min_dwell_cycles: u32,
}

impl HysteresisGate {
    pub fn new(margin: f32, min_dwell_cycles: u32) -> Self {
        Self {
            margin,
            min_dwell_cycles,
        }
    }

    pub fn accept(&self, candidate: Stage, confidence: f32, threshold: f32, state: &CascadeState) -> bool {
        if confidence < threshold + self.margin {
            return false;
        }

        match state.active {
            // Nothing has been committed yet, or the slot was cleared after
            // a long baseline run: there is no dwell to honour.
            None => true,
            Some(active) if active == candidate => true,
            Some(active) => {
                let dwelt = state.dwell_counter >= self.min_dwell_cycles;
                let recovering = active.is_baseline()
                    && confidence >= state.prev_confidence - RECOVERY_SLACK;
                dwelt || recovering
            }
        }
    }
}
