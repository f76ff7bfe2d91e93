//! Integration test: end-to-end moves from a calibrated origin.

use super::{sim_config, start_rig};
use gimbal_common::hal::types::{Axis, Direction, StepCommand};
use gimbal_hal::OutputEvent;
use std::time::{Duration, Instant};

#[test]
fn move_from_origin_and_repeat() {
    let mut sim = start_rig(&sim_config(10_000));
    let commander = sim.rig.commander();

    commander.set_absolute_position(0, 0).unwrap();
    commander.set_absolute_position(10, -6).unwrap();
    commander.set_absolute_position(10, -6).unwrap();

    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();

    assert_eq!(
        sim.steps.commands(Axis::X),
        vec![
            StepCommand { step_count: 5, direction: Direction::Positive },
            StepCommand { step_count: 0, direction: Direction::Positive },
        ]
    );
    assert_eq!(
        sim.steps.commands(Axis::Y),
        vec![
            StepCommand { step_count: 3, direction: Direction::Negative },
            StepCommand { step_count: 0, direction: Direction::Positive },
        ]
    );

    let offsets: Vec<_> = reports.iter().map(|r| (r.axis, r.final_offset)).collect();
    assert_eq!(offsets, vec![(Axis::X, Some(10)), (Axis::Y, Some(-6))]);
    assert_eq!(reports[0].steps_emitted, 5);
    assert_eq!(reports[1].steps_emitted, 3);
    sim.rig.close().unwrap();
}

#[test]
fn direction_is_written_before_the_train() {
    let mut sim = start_rig(&sim_config(10_000));
    let commander = sim.rig.commander();

    commander.set_absolute_position(0, 0).unwrap();
    commander.set_absolute_position(-20, 20).unwrap();
    sim.rig.context().flush();
    sim.rig.join().unwrap();

    let y = sim.log.events_for(Axis::Y);
    assert_eq!(
        y,
        vec![
            OutputEvent::Direction { axis: Axis::Y, direction: Direction::Positive },
            OutputEvent::Enable { axis: Axis::Y, enabled: false },
            OutputEvent::Configure { axis: Axis::Y, period_ns: 100_000, duty_ns: 50_000 },
            OutputEvent::Enable { axis: Axis::Y, enabled: true },
            OutputEvent::Enable { axis: Axis::Y, enabled: false },
            // Disable on exit.
            OutputEvent::Enable { axis: Axis::Y, enabled: false },
        ]
    );
    assert_eq!(sim.log.last_direction(Axis::X), Some(Direction::Negative));
}

#[test]
fn train_lasts_steps_over_frequency() {
    // 50 steps at 1 kHz = 50 ms.
    let mut sim = start_rig(&sim_config(1_000));
    let commander = sim.rig.commander();

    commander.set_absolute_position(0, 0).unwrap();
    commander.set_absolute_position(100, 0).unwrap();

    // The next hand-off on X has to wait until the train is over.
    let start = Instant::now();
    commander.set_absolute_position(100, 0).unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(45), "train too short: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "train too long: {elapsed:?}");

    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();
    assert_eq!(reports[0].steps_emitted, 50);
    assert_eq!(reports[0].interrupted_trains, 0);
}

#[test]
fn failing_axis_does_not_stop_the_other() {
    let mut sim = start_rig(&sim_config(10_000));
    let commander = sim.rig.commander();

    commander.set_absolute_position(0, 0).unwrap();
    sim.log.fail_writes(Axis::X, true);
    commander.set_absolute_position(10, 10).unwrap();
    commander.set_absolute_position(20, 20).unwrap();
    // Hand-off only succeeds once the previous trains are over.
    commander.set_absolute_position(20, 20).unwrap();

    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();

    // The direction write fails too, so even the idle move counts as skipped.
    assert_eq!(reports[0].skipped_trains, 3);
    assert_eq!(reports[0].final_offset, Some(20));
    assert_eq!(reports[1].skipped_trains, 0);
    assert_eq!(reports[1].steps_emitted, 10);
    assert_eq!(sim.log.trains_started(Axis::Y), 2);
}
