//! Termination protocol.
//!
//! Termination is a one-way flag (the root [`CancelToken`]) plus a flush:
//! the flush keeps broadcasting wake-ups on every rendezvous signal until
//! the [`ReadinessCounter`] shows that every participant has exited. Only
//! the counter proves shutdown is complete; the flag alone does not.
//!
//! [`CancelToken`]: crate::sync::CancelToken

use crate::context::MotionContext;
use crate::error::ShutdownError;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Count of participants that have exited.
///
/// Monotonic and capped at the participant total.
#[derive(Debug)]
pub struct ReadinessCounter {
    exited: Mutex<usize>,
    changed: Condvar,
    total: usize,
}

impl ReadinessCounter {
    /// Counter expecting `total` participants.
    pub fn new(total: usize) -> Self {
        Self {
            exited: Mutex::new(0),
            changed: Condvar::new(),
            total,
        }
    }

    /// Record one exit and return the new count.
    pub fn mark_exited(&self) -> usize {
        let mut exited = self.exited.lock();
        if *exited >= self.total {
            warn!(
                "Exit reported beyond the {} expected participants; ignored",
                self.total
            );
            return *exited;
        }
        *exited += 1;
        let count = *exited;
        drop(exited);
        self.changed.notify_all();
        debug!("Participant exited ({count}/{})", self.total);
        count
    }

    /// Participants that have exited so far.
    pub fn exited(&self) -> usize {
        *self.exited.lock()
    }

    /// Expected number of participants.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether every participant has exited.
    pub fn is_complete(&self) -> bool {
        self.exited() >= self.total
    }

    /// Wait up to `timeout` for the count to reach the total.
    pub fn wait_complete_for(&self, timeout: Duration) -> bool {
        let mut exited = self.exited.lock();
        self.changed
            .wait_while_for(&mut exited, |e| *e < self.total, timeout);
        *exited >= self.total
    }
}

impl MotionContext {
    /// Set the termination flag and wake every blocked rendezvous.
    ///
    /// Safe to call from any thread, any number of times. Returns `true`
    /// for the call that set the flag.
    pub fn request_termination(&self) -> bool {
        let first = self.termination().cancel();
        if first {
            info!("Termination requested");
        }
        for channel in self.channels() {
            channel.close();
        }
        first
    }

    /// Request termination and wake blocked participants until all of them
    /// have exited.
    ///
    /// Returns the number of flush iterations. Each iteration broadcasts a
    /// wake on every signal, then waits up to `flush_interval` on the
    /// readiness counter. Never returns if a participant never reports its
    /// exit; use [`flush_with_limit`](Self::flush_with_limit) for a bound.
    pub fn flush(&self) -> usize {
        self.request_termination();
        let mut iterations = 1;
        while !self.flush_once() {
            iterations += 1;
        }
        info!("Shutdown flush complete after {iterations} iterations");
        iterations
    }

    /// [`flush`](Self::flush) giving up after `max_iterations`.
    ///
    /// # Errors
    /// `ShutdownError::Timeout` if the counter has not reached the total.
    pub fn flush_with_limit(&self, max_iterations: usize) -> Result<usize, ShutdownError> {
        self.request_termination();
        for iteration in 1..=max_iterations {
            if self.flush_once() {
                info!("Shutdown flush complete after {iteration} iterations");
                return Ok(iteration);
            }
        }
        Err(ShutdownError::Timeout {
            iterations: max_iterations,
            exited: self.readiness().exited(),
            total: self.readiness().total(),
        })
    }

    fn flush_once(&self) -> bool {
        for channel in self.channels() {
            channel.close();
        }
        self.readiness()
            .wait_complete_for(self.motion().flush_interval())
    }
}

static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Route SIGINT/SIGTERM to `ctx.request_termination()`.
///
/// Only the first call installs a handler; later calls return `Ok(false)`
/// and leave the existing handler (and its context) in place. The handler
/// runs on its own thread and never flushes; the thread that owns the rig
/// does that once it sees the request.
pub fn install_termination_handler(ctx: &Arc<MotionContext>) -> Result<bool, ShutdownError> {
    if HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        debug!("Termination handler already installed");
        return Ok(false);
    }

    let ctx = Arc::clone(ctx);
    let result = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        ctx.request_termination();
    });

    match result {
        Ok(()) => {
            info!("Termination handler installed");
            Ok(true)
        }
        Err(e) => {
            HANDLER_INSTALLED.store(false, Ordering::SeqCst);
            Err(ShutdownError::Handler(e.to_string()))
        }
    }
}
