//! Integration test: coordinated shutdown.
//!
//! Validates: termination unblocks workers wherever they are parked, the
//! readiness counter reaches the participant total within a bounded number
//! of flush iterations, and every worker can be joined afterwards.

use super::{sim_config, start_rig};
use gimbal_common::hal::types::Axis;
use gimbal_hal::{HalCore, OutputEvent, OutputLog, SimulationDriver};
use gimbal_motion::{MotionError, Rig, ShutdownError};
use std::time::{Duration, Instant};

#[test]
fn flush_unblocks_workers_waiting_for_calibration() {
    let mut sim = start_rig(&sim_config(10_000));
    let ctx = sim.rig.context().clone();

    let iterations = ctx.flush_with_limit(1_000).unwrap();
    assert!(iterations >= 1);
    assert_eq!(ctx.readiness().exited(), ctx.readiness().total());

    let reports = sim.rig.join().unwrap();
    assert!(reports.iter().all(|r| r.calibration.is_none()));
    sim.rig.close().unwrap();
}

#[test]
fn flush_unblocks_tracking_workers() {
    let mut sim = start_rig(&sim_config(10_000));
    let ctx = sim.rig.context().clone();
    let commander = sim.rig.commander();
    commander.set_absolute_position(3, 3).unwrap();
    commander.set_absolute_position(7, 1).unwrap();

    ctx.flush_with_limit(1_000).unwrap();
    let reports = sim.rig.join().unwrap();
    assert!(sim.rig.workers().is_empty());
    assert!(reports.iter().all(|r| r.moves == 1));
    assert!(commander.set_absolute_position(0, 0).unwrap_err().is_cancelled());
}

#[test]
fn termination_interrupts_a_long_train() {
    // 10_000 steps at 100 Hz would take 100 s.
    let mut sim = start_rig(&sim_config(100));
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();
    commander.set_absolute_position(20_000, 0).unwrap();
    assert!(sim.log.wait_until(Duration::from_secs(5), |events| {
        events.contains(&OutputEvent::Enable { axis: Axis::X, enabled: true })
    }));

    let start = Instant::now();
    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));

    assert_eq!(reports[0].interrupted_trains, 1);
    assert!(reports[0].steps_emitted < 10_000);
    assert!(!sim.log.is_enabled(Axis::X));
}

#[test]
fn external_participants_hold_the_flush() {
    let mut config = sim_config(10_000);
    config.motion.external_participants = 1;
    let mut sim = start_rig(&config);
    let ctx = sim.rig.context().clone();
    assert_eq!(ctx.readiness().total(), 3);

    let err = ctx.flush_with_limit(500).unwrap_err();
    assert_eq!(
        err,
        ShutdownError::Timeout {
            iterations: 500,
            exited: 2,
            total: 3
        }
    );

    ctx.mark_exited();
    assert_eq!(ctx.flush_with_limit(20), Ok(1));
    sim.rig.join().unwrap();
}

#[test]
fn single_worker_can_be_cancelled() {
    let mut sim = start_rig(&sim_config(10_000));
    let ctx = sim.rig.context().clone();
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();

    let x = &sim.rig.workers()[0];
    assert_eq!(x.axis(), Axis::X);
    x.cancel();

    // X no longer acks; Y keeps tracking.
    let err = commander.set_absolute_position(4, 4).unwrap_err();
    assert!(err.is_cancelled());
    assert!(!ctx.termination_requested());

    let deadline = Instant::now() + Duration::from_secs(5);
    while sim.steps.targets(Axis::Y).is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(sim.steps.targets(Axis::Y), vec![4]);
    assert!(!ctx.readiness().is_complete());

    ctx.flush();
    let reports = sim.rig.join().unwrap();
    assert_eq!(reports[0].moves, 0);
    assert_eq!(reports[1].moves, 1);
}

#[test]
fn commands_after_single_cancel_reach_the_other_axis_once_each() {
    let mut sim = start_rig(&sim_config(10_000));
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();
    sim.rig.workers()[0].cancel();

    let posted: Vec<i16> = (1..=20).map(|i| i * 2).collect();
    for &v in &posted {
        assert!(commander.set_absolute_position(v, v).unwrap_err().is_cancelled());
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while sim.steps.targets(Axis::Y).len() < posted.len() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(sim.steps.targets(Axis::Y), posted);
    assert!(sim.steps.targets(Axis::X).is_empty());

    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();
    assert_eq!(reports[1].moves, 20);
    assert_eq!(reports[1].final_offset, Some(40));
}

#[test]
fn rejected_rt_setup_leaves_rig_spawnable() {
    let mut config = sim_config(10_000);
    config.rt.priority = Some(0);
    let log = OutputLog::new();
    let mut hal = HalCore::new(config.clone()).unwrap();
    hal.init_with_driver(Box::new(SimulationDriver::with_log(log)))
        .unwrap();
    let mut rig = Rig::init(&config, hal).unwrap();

    // Outputs are kept: a second attempt fails the same way, not as "already spawned".
    for _ in 0..2 {
        assert!(matches!(rig.spawn(), Err(MotionError::RtSetup(_))));
    }
    assert!(rig.workers().is_empty());
    assert_eq!(rig.context().readiness().exited(), 0);
    rig.close().unwrap();
}

#[test]
fn spawning_twice_is_rejected() {
    let mut sim = start_rig(&sim_config(10_000));
    assert!(matches!(
        sim.rig.spawn(),
        Err(MotionError::InvalidState(_))
    ));
    sim.rig.context().flush();
    sim.rig.join().unwrap();
}
