//! Blocking primitives shared by the producer and the stepper workers.
//!
//! - [`CancelToken`] - termination flag with child tokens
//! - [`Signal`] - binary semaphore whose waits honour a token
//! - [`sleep_interruptible`] - chunked sleep that ends early on cancellation

mod cancel;
mod signal;
mod wait;

pub use cancel::CancelToken;
pub use signal::Signal;
pub use wait::{WaitOutcome, sleep_interruptible};
