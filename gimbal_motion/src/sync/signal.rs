use super::CancelToken;
use crate::error::Cancelled;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct SignalState {
    released: bool,
    closed: bool,
}

/// Binary semaphore for one direction of a rendezvous.
///
/// `release` makes one `acquire` succeed; releasing an already released
/// signal has no further effect. `close` wakes every waiter at once and makes
/// all later acquisitions fail, which is how termination unblocks a thread
/// parked here. There is no timeout: a waiter stays parked until a release,
/// a close, or (checked on every wake) cancellation of its token.
#[derive(Debug, Default)]
pub struct Signal {
    state: Mutex<SignalState>,
    wake: Condvar,
}

impl Signal {
    /// Create an unreleased, open signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow one waiter to proceed.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.released = true;
        drop(state);
        self.wake.notify_one();
    }

    /// Block until released.
    ///
    /// # Errors
    /// `Cancelled` if the signal is closed or `token` is cancelled.
    pub fn acquire(&self, token: &CancelToken) -> Result<(), Cancelled> {
        let mut state = self.state.lock();
        loop {
            if state.closed || token.is_cancelled() {
                return Err(Cancelled);
            }
            if state.released {
                state.released = false;
                return Ok(());
            }
            self.wake.wait(&mut state);
        }
    }

    /// Consume a pending release without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if !state.closed && state.released {
            state.released = false;
            true
        } else {
            false
        }
    }

    /// Fail all current and future waits. Idempotent.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.wake.notify_all();
    }

    /// Whether a release is pending.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
