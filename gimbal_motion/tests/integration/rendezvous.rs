//! Integration test: rendezvous delivery.
//!
//! Every posted value reaches its worker exactly once and in order, and the
//! two axes of one command are handed over independently.

use super::{sim_config, start_rig};
use gimbal_common::config::MotionConfig;
use gimbal_common::hal::types::{Axis, Px};
use gimbal_motion::{MotionContext, PositionCommander};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn every_target_received_once_in_order() {
    let mut sim = start_rig(&sim_config(20_000));
    let commander = sim.rig.commander();

    let xs: Vec<Px> = (0..50).map(|i| (i * 7 % 40) - 20).collect();
    let ys: Vec<Px> = (0..50).map(|i| 15 - (i * 3 % 30)).collect();

    commander.set_absolute_position(0, 0).unwrap();
    for (&x, &y) in xs.iter().zip(&ys) {
        commander.set_absolute_position(x, y).unwrap();
    }

    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();

    assert_eq!(sim.steps.targets(Axis::X), xs);
    assert_eq!(sim.steps.targets(Axis::Y), ys);
    assert_eq!(commander.stats().pairs(), 51);
    for report in &reports {
        assert_eq!(report.calibration, Some(0));
        assert_eq!(report.moves, 50);
    }
    sim.rig.close().unwrap();
}

#[test]
fn repeated_target_moves_zero_steps() {
    let mut sim = start_rig(&sim_config(20_000));
    let commander = sim.rig.commander();

    commander.set_absolute_position(5, 5).unwrap();
    commander.set_absolute_position(5, 5).unwrap();
    commander.set_absolute_position(5, 5).unwrap();

    sim.rig.context().flush();
    let reports = sim.rig.join().unwrap();

    for axis in Axis::ALL {
        let commands = sim.steps.commands(axis);
        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|c| c.is_idle()));
        assert_eq!(sim.log.trains_started(axis), 0);
    }
    assert!(reports.iter().all(|r| r.steps_emitted == 0));
}

#[test]
fn axes_are_handed_over_independently() {
    let ctx = Arc::new(MotionContext::new(MotionConfig::default()));
    let commander = PositionCommander::new(Arc::clone(&ctx));
    let y_may_consume = Arc::new(AtomicBool::new(false));

    let x_ctx = Arc::clone(&ctx);
    let x_consumer = thread::spawn(move || {
        let token = x_ctx.termination().child();
        x_ctx.channel(Axis::X).receive(&token)
    });

    let y_ctx = Arc::clone(&ctx);
    let gate = Arc::clone(&y_may_consume);
    let y_consumer = thread::spawn(move || {
        while !gate.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        let token = y_ctx.termination().child();
        y_ctx.channel(Axis::Y).receive(&token)
    });

    let producer = thread::spawn(move || commander.set_absolute_position(12, -4));

    // X has taken its target while Y's is still pending: the pair is not atomic.
    assert_eq!(x_consumer.join().unwrap(), Ok(12));
    thread::sleep(Duration::from_millis(20));
    assert!(!producer.is_finished());

    y_may_consume.store(true, Ordering::SeqCst);
    assert_eq!(y_consumer.join().unwrap(), Ok(-4));
    assert!(producer.join().unwrap().is_ok());
}
