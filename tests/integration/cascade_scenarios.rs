//! End-to-end arbitration scenarios on a manual clock.
//!
//! All runs use the default cascade configuration: setpoint 16 °C,
//! threshold 0.3, margin 0.1, dwell 6, forced baseline every 40 ticks.

use thermal_cascade::adapters::time::ManualClock;
use thermal_cascade::cascade::Stage;
use thermal_cascade::config::CascadeConfig;

use crate::mock_hw::{arbiter, constant, failing, stalling};

const T: f32 = 16.0;
const POWER_W: f32 = 10.0;
const LATENCY_MS: f32 = 2.0;

// ── Steady state near the setpoint ───────────────────────────

#[test]
fn confident_fast_controller_holds_for_ten_ticks() {
    let mut a = arbiter(CascadeConfig::default(), constant(40.0), constant(50.0), ManualClock::new());

    for tick in 1..=10 {
        let d = a.decide(T, LATENCY_MS, POWER_W);
        assert_eq!(d.stage, Stage::Fast, "tick {tick}");
        assert_eq!(d.duty, 40.0);
    }

    let counts = a.stage_breakdown();
    assert_eq!(counts.fast, 10);
    assert_eq!(counts.slow, 0);
    assert_eq!(counts.baseline, 0);
    assert_eq!(a.active_stage(), Some(Stage::Fast));
    assert_eq!(a.evaluation_order()[0], Stage::Fast);
}

// ── Deadline overrun ─────────────────────────────────────────

#[test]
fn overrun_on_tick_five_falls_back_once_then_recovers() {
    let clock = ManualClock::new();
    let fast = stalling(40.0, clock.clone(), &[5], 250);
    let mut a = arbiter(CascadeConfig::default(), fast, failing(), clock);

    let stages: Vec<Stage> = (0..10).map(|_| a.decide(T, LATENCY_MS, POWER_W).stage).collect();

    assert_eq!(stages[4], Stage::Baseline);
    for (i, s) in stages.iter().enumerate().filter(|(i, _)| *i != 4) {
        assert_eq!(*s, Stage::Fast, "tick {}", i + 1);
    }
    let counts = a.stage_breakdown();
    assert_eq!(counts.baseline, 1);
    assert_eq!(counts.fast, 9);
    assert_eq!(a.overrun_count(), 1);
}

#[test]
fn late_answer_is_discarded_even_when_confident() {
    let clock = ManualClock::new();
    let mut config = CascadeConfig::default();
    config.deadline_ms = 50;
    let fast = stalling(40.0, clock.clone(), &[1], 51);
    let mut a = arbiter(config, fast, constant(45.0), clock);

    let d = a.decide(T, LATENCY_MS, POWER_W);
    assert_eq!(d.stage, Stage::Baseline);
    // The slow candidate was never consulted.
    assert_eq!(a.stage_breakdown().slow, 0);
}

#[test]
fn answer_exactly_on_the_deadline_is_kept() {
    let clock = ManualClock::new();
    let mut config = CascadeConfig::default();
    config.deadline_ms = 50;
    let fast = stalling(40.0, clock.clone(), &[1], 50);
    let mut a = arbiter(config, fast, failing(), clock);

    assert_eq!(a.decide(T, LATENCY_MS, POWER_W).stage, Stage::Fast);
    assert_eq!(a.overrun_count(), 0);
}

// ── Periodic forced visit ────────────────────────────────────

#[test]
fn forty_ticks_force_exactly_one_baseline_visit_at_tick_forty() {
    let mut a = arbiter(CascadeConfig::default(), constant(40.0), constant(50.0), ManualClock::new());

    let stages: Vec<Stage> = (0..40).map(|_| a.decide(T, LATENCY_MS, POWER_W).stage).collect();

    assert_eq!(stages[39], Stage::Baseline);
    assert!(stages[..39].iter().all(|s| *s != Stage::Baseline));
    assert_eq!(a.stage_breakdown().baseline, 1);
    assert_eq!(a.forced_visit_count(), 1);
    assert_eq!(a.state().cycles_since_forced_baseline, 0);
}

#[test]
fn fast_resumes_after_forced_visit() {
    let mut a = arbiter(CascadeConfig::default(), constant(40.0), failing(), ManualClock::new());
    for _ in 0..40 {
        a.decide(T, LATENCY_MS, POWER_W);
    }
    assert_eq!(a.active_stage(), Some(Stage::Baseline));
    assert_eq!(a.decide(T, LATENCY_MS, POWER_W).stage, Stage::Fast);
}

#[test]
fn forced_visits_follow_the_period() {
    let mut config = CascadeConfig::default();
    config.forced_baseline_period = 7;
    let mut a = arbiter(config, constant(40.0), constant(50.0), ManualClock::new());
    for _ in 0..100 {
        a.decide(T, LATENCY_MS, POWER_W);
    }
    assert_eq!(a.forced_visit_count(), 100 / 7);
    assert!(a.stage_breakdown().baseline >= 100 / 7);
}

// ── Baseline run length ──────────────────────────────────────

#[test]
fn long_baseline_run_reopens_the_slot_and_keeps_committing() {
    let mut a = arbiter(CascadeConfig::default(), failing(), failing(), ManualClock::new());
    for _ in 0..25 {
        let d = a.decide(20.0, LATENCY_MS, POWER_W);
        assert_eq!(d.stage, Stage::Baseline);
        assert!((0.0..=100.0).contains(&d.duty));
    }
    assert_eq!(a.stage_breakdown().baseline, 25);
    assert!(a.state().consecutive_baseline_ticks < 10);
}

#[test]
fn baseline_duty_tracks_the_pid() {
    let clock = ManualClock::new();
    let mut a = arbiter(CascadeConfig::default(), failing(), failing(), clock.clone());

    assert_eq!(a.decide(18.0, LATENCY_MS, POWER_W).duty, 0.0);
    clock.advance_ms(1_000);
    // kp * 2 + ki * 2 * 1 s
    let d = a.decide(18.0, LATENCY_MS, POWER_W);
    assert!((d.duty - 11.0).abs() < 1e-3, "got {}", d.duty);

    clock.advance_ms(1_000);
    // Below setpoint the element idles.
    assert_eq!(a.decide(10.0, LATENCY_MS, POWER_W).duty, 0.0);
}

// ── Trust adaptation ─────────────────────────────────────────

#[test]
fn spikes_promote_fast_and_calm_promotes_slow() {
    let mut config = CascadeConfig::default();
    config.initial_trust.fast = 0.4;
    config.initial_trust.slow = 0.6;
    let mut a = arbiter(config, failing(), failing(), ManualClock::new());

    for _ in 0..20 {
        a.decide(25.0, LATENCY_MS, POWER_W);
    }
    let w = a.trust_weights();
    assert!(w.fast > w.slow, "spike should favour FAST: {w:?}");
    assert_eq!(a.evaluation_order()[0], Stage::Fast);

    for _ in 0..60 {
        a.decide(16.1, LATENCY_MS, POWER_W);
    }
    let w = a.trust_weights();
    assert!(w.slow > w.fast, "calm should favour SLOW: {w:?}");
}

#[test]
fn weights_stay_clamped_under_sustained_reward() {
    let mut a = arbiter(CascadeConfig::default(), constant(50.0), constant(50.0), ManualClock::new());
    for _ in 0..500 {
        a.decide(T, LATENCY_MS, POWER_W);
    }
    let w = a.trust_weights();
    assert!(w.fast <= 0.95 && w.slow <= 0.95);
    assert!((0.05..=0.15).contains(&w.baseline));
}

// ── Reproducibility ──────────────────────────────────────────

#[test]
fn same_seed_same_decisions() {
    let run = || {
        let mut a = arbiter(CascadeConfig::default(), constant(35.0), constant(55.0), ManualClock::new());
        (0..60)
            .map(|i| a.decide(14.0 + (i % 9) as f32 * 0.5, LATENCY_MS, POWER_W))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
