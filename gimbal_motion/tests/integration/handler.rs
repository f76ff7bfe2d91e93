//! Integration test: process signal handling.
//!
//! The only test in this binary that touches process-wide signal state.

use gimbal_common::config::MotionConfig;
use gimbal_motion::{MotionContext, install_termination_handler};
use nix::sys::signal::{Signal, raise};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn handler_installs_once_and_requests_termination() {
    let ctx = Arc::new(MotionContext::new(MotionConfig::default()));
    let other = Arc::new(MotionContext::new(MotionConfig::default()));

    assert_eq!(install_termination_handler(&ctx), Ok(true));
    assert_eq!(install_termination_handler(&other), Ok(false));
    assert_eq!(install_termination_handler(&ctx), Ok(false));

    raise(Signal::SIGINT).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !ctx.termination_requested() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(ctx.termination_requested());
    assert!(!other.termination_requested());
}
