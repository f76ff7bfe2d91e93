//! Error types of the motion core.

use gimbal_common::config::ConfigError;
use gimbal_common::hal::driver::HalError;
use gimbal_common::hal::types::{Axis, PulseChannel};
use thiserror::Error;

/// A blocking wait was abandoned because termination was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cancelled by termination request")]
pub struct Cancelled;

/// Pulse train errors.
///
/// Hardware failures never reach the worker as errors; they are logged and
/// the train is skipped. Only a bad request is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PulseError {
    /// A frequency of 0 Hz has no period.
    #[error("pulse frequency on {0} must be greater than 0")]
    ZeroFrequency(PulseChannel),
}

/// Shutdown protocol errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShutdownError {
    /// The readiness counter did not reach the participant total.
    #[error("shutdown incomplete after {iterations} flush iterations: {exited}/{total} participants exited")]
    Timeout {
        /// Flush iterations performed.
        iterations: usize,
        /// Participants that reported exit.
        exited: usize,
        /// Expected participants.
        total: usize,
    },

    /// The process signal handler could not be installed.
    #[error("could not install termination handler: {0}")]
    Handler(String),
}

/// Top-level motion error.
#[derive(Debug, Error)]
pub enum MotionError {
    /// Termination interrupted the operation.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Hardware bring-up or hand-off failed.
    #[error("hardware: {0}")]
    Hal(#[from] HalError),

    /// Invalid pulse request.
    #[error(transparent)]
    Pulse(#[from] PulseError),

    /// Shutdown did not complete.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),

    /// Real-time setup system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// A worker thread could not be started.
    #[error("could not spawn stepper-{axis}: {source}")]
    Spawn {
        /// Axis of the worker.
        axis: Axis,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked.
    #[error("stepper-{0} panicked")]
    WorkerPanicked(Axis),

    /// Lifecycle call in the wrong order.
    #[error("invalid rig state: {0}")]
    InvalidState(&'static str),

    /// Raw frame does not match its dimensions.
    #[error("frame of {width}x{height}x{channels} needs {expected} bytes, got {actual}")]
    InvalidFrame {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Bytes per pixel.
        channels: u8,
        /// Required buffer size.
        expected: usize,
        /// Provided buffer size.
        actual: usize,
    },
}

impl MotionError {
    /// Whether the error only reports a termination request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MotionError::Cancelled(_))
    }
}
