//! Integration tests for the ControlService → Decider → actuator pipeline.
//!
//! These run on the host and drive the service through mock ports, with
//! time supplied by a shared manual clock.

use thermal_cascade::adapters::time::ManualClock;
use thermal_cascade::app::events::AppEvent;
use thermal_cascade::app::service::ControlService;
use thermal_cascade::cascade::{CascadeArbiter, SharedArbiter, Stage};
use thermal_cascade::config::{CascadeConfig, ControlMode, PidGains, RunConfig};
use thermal_cascade::control::pid::{BaselineDecider, PidController};
use thermal_cascade::error::SensorError;

use rand::rngs::StdRng;

use crate::mock_hw::{ActuatorCall, MockRig, RecordingSink, arbiter, constant, failing};

type CascadeService = ControlService<CascadeArbiter<ManualClock, StdRng>, ManualClock>;

fn run_config(minutes: f32) -> RunConfig {
    RunConfig {
        duration_minutes: minutes,
        ..RunConfig::default()
    }
}

fn cascade_service(clock: &ManualClock) -> CascadeService {
    let a = arbiter(CascadeConfig::default(), constant(40.0), failing(), clock.clone());
    ControlService::new(a, clock.clone(), &run_config(1.0), 16.0)
}

// ── Single tick ──────────────────────────────────────────────

#[test]
fn tick_applies_the_committed_duty() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::constant(16.0, 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    let d = svc.tick(&mut rig, &mut sink).unwrap();

    assert_eq!(d.stage, Stage::Fast);
    assert_eq!(rig.calls, vec![ActuatorCall::SetDuty(40.0)]);
    assert!(matches!(sink.events[0], AppEvent::Started { mode: ControlMode::Cascade, .. }));
    assert_eq!(sink.ticks(), 1);
    assert_eq!(sink.stage_changes(), 1);
}

#[test]
fn sensor_latency_is_measured_on_the_clock() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::constant(16.0, 10.0);
    rig.io_clock = Some((clock.clone(), 2_500));
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    svc.tick(&mut rig, &mut sink).unwrap();

    let record = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Tick(r) => Some(*r),
            _ => None,
        })
        .unwrap();
    assert!((record.latency_ms - 2.5).abs() < 1e-6);
    assert_eq!(record.power_w, 10.0);
    assert_eq!(record.stage, Stage::Fast);
}

#[test]
fn stage_change_events_only_on_switches() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::constant(16.0, 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    for _ in 0..41 {
        svc.tick(&mut rig, &mut sink).unwrap();
        clock.advance_ms(1_000);
    }
    // FAST engages, forced BASELINE at 40, FAST again at 41.
    assert_eq!(sink.stage_changes(), 3);
}

// ── Sensor and actuator faults ───────────────────────────────

#[test]
fn failed_read_reuses_last_good_temperature() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::scripted(vec![Ok(17.0), Err(SensorError::BusFailed), Ok(18.0)], 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    for _ in 0..3 {
        svc.tick(&mut rig, &mut sink).unwrap();
    }

    let temps: Vec<f32> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Tick(r) => Some(r.temperature_c),
            _ => None,
        })
        .collect();
    assert_eq!(temps, vec![17.0, 17.0, 18.0]);
    assert!(
        sink.events
            .iter()
            .any(|e| matches!(e, AppEvent::SensorFault(SensorError::BusFailed)))
    );
}

#[test]
fn failed_first_read_falls_back_to_setpoint() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::scripted(vec![Err(SensorError::Timeout), Ok(f32::NAN)], 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    svc.tick(&mut rig, &mut sink).unwrap();
    svc.tick(&mut rig, &mut sink).unwrap();

    assert_eq!(svc.recorder().samples(), 2);
    let summary = svc.finish(&mut rig, &mut sink);
    assert_eq!(summary.temp_std_dev, 0.0);
}

#[test]
fn actuator_failure_switches_the_element_off() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::constant(16.0, 10.0);
    rig.fail_writes = true;
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    svc.tick(&mut rig, &mut sink).unwrap();

    assert_eq!(rig.calls, vec![ActuatorCall::AllOff]);
    let summary = svc.finish(&mut rig, &mut sink);
    assert_eq!(summary.avg_duty, 0.0);
}

// ── Trial lifecycle ──────────────────────────────────────────

#[test]
fn trial_runs_for_its_duration_then_stops() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::constant(16.0, 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    while svc.tick(&mut rig, &mut sink).is_some() {
        clock.advance_ms(1_000);
    }

    assert_eq!(svc.tick_count(), 60);
    assert!(svc.should_stop());
    let calls_before = rig.calls.len();
    assert!(svc.tick(&mut rig, &mut sink).is_none());
    assert_eq!(rig.calls.len(), calls_before, "no actuation after the trial ends");
}

#[test]
fn finish_reports_stage_counts_for_cascade_trials() {
    let clock = ManualClock::new();
    let mut svc = cascade_service(&clock);
    let mut rig = MockRig::constant(16.0, 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    for _ in 0..12 {
        svc.tick(&mut rig, &mut sink).unwrap();
        clock.advance_ms(1_000);
    }
    let summary = svc.finish(&mut rig, &mut sink);

    assert_eq!(rig.last_duty(), Some(0.0));
    assert_eq!(rig.calls.last(), Some(&ActuatorCall::AllOff));
    let stages = summary.stages.unwrap();
    assert_eq!(stages.total(), 12);
    assert_eq!(stages.fast, 12);
    assert!((summary.duration_min - 0.2).abs() < 1e-6);
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped { ticks: 12 })));
    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::Summary(_))));
}

#[test]
fn baseline_trial_has_no_stage_counts() {
    let clock = ManualClock::new();
    let run = RunConfig {
        mode: ControlMode::Baseline,
        trial_name: "PID".into(),
        ..run_config(1.0)
    };
    let decider = BaselineDecider::new(PidController::new(PidGains::default(), 16.0), clock.clone());
    let mut svc = ControlService::new(decider, clock.clone(), &run, 16.0);
    let mut rig = MockRig::constant(20.0, 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    for _ in 0..5 {
        let d = svc.tick(&mut rig, &mut sink).unwrap();
        assert_eq!(d.stage, Stage::Baseline);
        clock.advance_ms(1_000);
    }
    assert!(rig.last_duty().unwrap() > 0.0);

    let summary = svc.finish(&mut rig, &mut sink);
    assert!(summary.stages.is_none());
    assert_eq!(summary.trial_name, "PID");
}

#[test]
fn shared_arbiter_drives_the_service() {
    let clock = ManualClock::new();
    let shared = SharedArbiter::new(arbiter(CascadeConfig::default(), constant(40.0), failing(), clock.clone()));
    let mut svc = ControlService::new(shared, clock.clone(), &run_config(1.0), 16.0);
    let mut rig = MockRig::constant(16.0, 10.0);
    let mut sink = RecordingSink::new();

    svc.start(&mut sink);
    for _ in 0..3 {
        svc.tick(&mut rig, &mut sink).unwrap();
    }
    assert_eq!(svc.decider().with(|a| a.total_decisions()), 3);
}
