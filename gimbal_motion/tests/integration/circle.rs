//! Integration test: circle tracing.

use super::{sim_config, start_rig};
use gimbal_common::hal::types::{Axis, Px};
use gimbal_motion::command::circle_points;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn full_circle_issues_one_pair_per_point() {
    let mut sim = start_rig(&sim_config(20_000));
    let commander = sim.rig.commander();

    commander.set_absolute_position(0, 0).unwrap();
    let sent = commander
        .trace_circle(20, 12, Duration::from_millis(1))
        .unwrap();

    sim.rig.context().flush();
    sim.rig.join().unwrap();

    assert_eq!(sent, 12);
    assert_eq!(commander.stats().pairs(), 13);

    let expected: Vec<(Px, Px)> = circle_points(20, 12).collect();
    let xs: Vec<Px> = expected.iter().map(|p| p.0).collect();
    let ys: Vec<Px> = expected.iter().map(|p| p.1).collect();
    assert_eq!(sim.steps.targets(Axis::X), xs);
    assert_eq!(sim.steps.targets(Axis::Y), ys);
    assert_eq!(expected[0], (20, 0));
    assert_eq!(expected[3], (0, 20));
}

#[test]
fn termination_cuts_circle_short() {
    let mut sim = start_rig(&sim_config(20_000));
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();

    let ctx = sim.rig.context().clone();
    let terminator = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        ctx.request_termination();
    });

    // 36 points with 50 ms pauses would take 1.8 s.
    let result = commander.trace_circle(40, 36, Duration::from_millis(50));
    terminator.join().unwrap();

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    let pairs = commander.stats().pairs();
    assert!(pairs >= 2 && pairs < 37, "unexpected pair count {pairs}");

    sim.rig.context().flush();
    sim.rig.join().unwrap();
    // A handshake cut in half may have reached X only.
    let received = sim.steps.targets(Axis::X).len() as u64;
    assert!(received == pairs - 1 || received == pairs);
}

#[test]
fn circle_after_termination_sends_nothing() {
    let mut sim = start_rig(&sim_config(20_000));
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();
    sim.rig.context().request_termination();

    assert!(commander.trace_circle(10, 8, Duration::ZERO).is_err());
    assert_eq!(commander.stats().pairs(), 1);

    sim.rig.context().flush();
    sim.rig.join().unwrap();
    assert!(sim.steps.targets(Axis::X).is_empty());
}

#[test]
fn termination_in_final_pause_keeps_the_circle_complete() {
    let mut sim = start_rig(&sim_config(20_000));
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();

    let ctx = sim.rig.context().clone();
    let terminator = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        ctx.request_termination();
    });

    let start = Instant::now();
    let sent = commander
        .trace_circle(10, 1, Duration::from_millis(500))
        .unwrap();
    terminator.join().unwrap();

    assert_eq!(sent, 1);
    assert!(start.elapsed() < Duration::from_millis(450));
    assert_eq!(commander.stats().pairs(), 2);
    assert_eq!(commander.stats().cancelled(), 0);

    sim.rig.context().flush();
    sim.rig.join().unwrap();
    assert_eq!(sim.steps.targets(Axis::X), vec![10]);
}
