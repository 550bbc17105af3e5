//! Per-tick evaluation budget.
//!
//! The arbiter samples the clock at tick start and asks the guard at every
//! checkpoint (before each predictor call and again once it returns)
//! whether the budget is spent.  There is no preemption: a predictor that
//! hangs is only noticed when it returns.

/// Monotonic time source.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.  Never decreases.
    fn now_us(&self) -> u64;

    /// Microseconds elapsed since `start_us`.
    fn elapsed_since(&self, start_us: u64) -> u64 {
        self.now_us().saturating_sub(start_us)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeadlineGuard {
    budget_us: u64,
}

impl DeadlineGuard {
    pub fn new(deadline_ms: u32) -> Self {
        Self {
            budget_us: u64::from(deadline_ms) * 1_000,
        }
    }

    /// `true` when `elapsed_us` exceeds the budget (overrun).
    pub fn check(&self, elapsed_us: u64) -> bool {
        elapsed_us > self.budget_us
    }

    pub fn budget_us(&self) -> u64 {
        self.budget_us
    }
}
