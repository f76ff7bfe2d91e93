//! Per-axis rendezvous slot between the producer and a stepper worker.
//!
//! ```text
//!  producer                      worker
//!  ────────                      ──────
//!  value ← target
//!  ready.release() ───────────►  ready.acquire()
//!                                target ← value
//!  done.acquire()  ◄───────────  done.release()
//! ```
//!
//! Exactly one value is in flight per rendezvous. The slot is not a queue:
//! the producer must not post again before the previous value was acked.

use crate::error::Cancelled;
use crate::sync::{CancelToken, Signal};
use gimbal_common::hal::types::{Axis, Px};
use std::sync::atomic::{AtomicI16, Ordering};

/// Single-slot mailbox carrying target positions for one axis.
#[derive(Debug)]
pub struct AxisChannel {
    axis: Axis,
    ready: Signal,
    done: Signal,
    shared_value: AtomicI16,
}

impl AxisChannel {
    /// Create an empty, open channel.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            ready: Signal::new(),
            done: Signal::new(),
            shared_value: AtomicI16::new(0),
        }
    }

    /// Axis this channel feeds.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Publish `value` and wake the worker. Never blocks.
    pub fn post(&self, value: Px) {
        self.shared_value.store(value, Ordering::Release);
        self.ready.release();
    }

    /// Block until the worker has taken the posted value.
    pub fn await_ack(&self, token: &CancelToken) -> Result<(), Cancelled> {
        self.done.acquire(token)
    }

    /// `post` followed by `await_ack`.
    pub fn send(&self, value: Px, token: &CancelToken) -> Result<(), Cancelled> {
        self.post(value);
        self.await_ack(token)
    }

    /// Worker side: block for the next value, take it and ack.
    ///
    /// # Errors
    /// `Cancelled` once the channel is closed or `token` is cancelled.
    pub fn receive(&self, token: &CancelToken) -> Result<Px, Cancelled> {
        self.ready.acquire(token)?;
        let value = self.shared_value.load(Ordering::Acquire);
        self.done.release();
        Ok(value)
    }

    /// Wake both sides and fail every later wait.
    pub fn close(&self) {
        self.ready.close();
        self.done.close();
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.ready.is_closed()
    }
}
