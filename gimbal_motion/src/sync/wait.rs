use super::CancelToken;
use std::time::{Duration, Instant};

/// Result of an interruptible sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Completed,
    /// The token was cancelled first.
    Interrupted {
        /// Time slept before noticing the cancellation.
        elapsed: Duration,
    },
}

impl WaitOutcome {
    /// Whether the sleep ended early.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WaitOutcome::Interrupted { .. })
    }
}

/// Sleep for `total` in slices of at most `chunk`, checking `token` before
/// each slice.
///
/// Cancellation is therefore noticed within one `chunk`. A zero `chunk`
/// sleeps in a single slice.
pub fn sleep_interruptible(total: Duration, chunk: Duration, token: &CancelToken) -> WaitOutcome {
    let start = Instant::now();
    let chunk = if chunk.is_zero() { total } else { chunk };

    loop {
        let elapsed = start.elapsed();
        if token.is_cancelled() {
            return WaitOutcome::Interrupted { elapsed };
        }
        let Some(remaining) = total.checked_sub(elapsed).filter(|r| !r.is_zero()) else {
            return WaitOutcome::Completed;
        };
        sleep_slice(remaining.min(chunk));
    }
}

/// Relative `clock_nanosleep` on CLOCK_MONOTONIC.
#[cfg(feature = "rt")]
fn sleep_slice(slice: Duration) {
    use nix::sys::time::TimeSpec;
    use nix::time::{ClockId, ClockNanosleepFlags, clock_nanosleep};

    let request = TimeSpec::from_duration(slice);
    // EINTR only shortens the slice; the caller loops on elapsed time.
    let _ = clock_nanosleep(
        ClockId::CLOCK_MONOTONIC,
        ClockNanosleepFlags::empty(),
        &request,
    );
}

#[cfg(not(feature = "rt"))]
fn sleep_slice(slice: Duration) {
    std::thread::sleep(slice);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const CHUNK: Duration = Duration::from_millis(1);

    #[test]
    fn completes_full_duration() {
        let start = Instant::now();
        let outcome = sleep_interruptible(Duration::from_millis(20), CHUNK, &CancelToken::new());
        assert_eq!(outcome, WaitOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_duration_returns_immediately() {
        let outcome = sleep_interruptible(Duration::ZERO, CHUNK, &CancelToken::new());
        assert_eq!(outcome, WaitOutcome::Completed);
    }

    #[test]
    fn cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let outcome = sleep_interruptible(Duration::from_secs(10), CHUNK, &token);
        assert!(outcome.is_interrupted());
    }

    #[test]
    fn cancellation_noticed_within_a_few_chunks() {
        let token = CancelToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });

        let start = Instant::now();
        let outcome = sleep_interruptible(Duration::from_secs(10), CHUNK, &token);
        handle.join().unwrap();

        match outcome {
            WaitOutcome::Interrupted { elapsed } => {
                assert!(elapsed >= Duration::from_millis(30));
                assert!(elapsed < Duration::from_secs(2));
            }
            WaitOutcome::Completed => panic!("sleep was not interrupted"),
        }
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn zero_chunk_sleeps_in_one_slice() {
        let outcome = sleep_interruptible(Duration::from_millis(5), Duration::ZERO, &CancelToken::new());
        assert_eq!(outcome, WaitOutcome::Completed);
    }
}
