//! HAL driver traits and error types.
//!
//! This module defines:
//! - `PwmOutput` / `DirectionLine` - Per-axis output handles owned by a worker
//! - `HalDriver` trait - Interface for pluggable hardware backends
//! - `HalError` enum - Error types for HAL operations
//! - `DriverFactory` type alias - Factory function type

use crate::config::RigConfig;
use crate::hal::types::{Axis, Direction, PulseChannel};
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A hardware write or read failed
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// The outputs of an axis were already handed out
    #[error("Outputs for axis {0} already claimed")]
    AlreadyClaimed(Axis),
}

/// Software-timed PWM output driving the step input of one motor driver.
///
/// Owned by exactly one stepper worker; never shared across threads.
pub trait PwmOutput: Send {
    /// Channel this output writes to.
    fn channel(&self) -> PulseChannel;

    /// Program period and duty cycle, both in nanoseconds.
    fn configure(&mut self, period_ns: u32, duty_ns: u32) -> Result<(), HalError>;

    /// Enable or disable the output. Disabling twice is harmless.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), HalError>;
}

/// Boolean output line selecting the rotation direction of one motor.
pub trait DirectionLine: Send {
    /// Line number (for logging).
    fn line(&self) -> u32;

    /// Drive the line to the level of `direction`.
    fn set_direction(&mut self, direction: Direction) -> Result<(), HalError>;
}

/// Output handles for one axis, moved into its stepper worker.
pub struct AxisOutputs {
    /// Step signal.
    pub pwm: Box<dyn PwmOutput>,
    /// Direction signal.
    pub direction: Box<dyn DirectionLine>,
}

impl std::fmt::Debug for AxisOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxisOutputs")
            .field("pwm", &self.pwm.channel())
            .field("direction", &self.direction.line())
            .finish()
    }
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn HalDriver>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DriverDiagnostics {
    /// Number of successful hardware writes
    pub writes: u64,
    /// Number of failed hardware writes
    pub write_failures: u64,
}

/// Trait defining the interface for HAL drivers.
///
/// # Lifecycle
///
/// 1. `init()` - Verify the configured hardware is present (fatal on error)
/// 2. `claim_axis()` - Hand each axis's outputs to its worker, once
/// 3. `shutdown()` - Release remaining handles
pub trait HalDriver: Send {
    /// Returns the driver's unique identifier (e.g., "sysfs", "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Verify and open the configured hardware.
    ///
    /// There is no partial-hardware mode: any missing channel or line is
    /// reported as `HalError::InitFailed`.
    fn init(&mut self, config: &RigConfig) -> Result<(), HalError>;

    /// Take ownership of the outputs of `axis`.
    ///
    /// # Errors
    /// `HalError::AlreadyClaimed` on a second claim for the same axis,
    /// `HalError::InitFailed` if called before `init()`.
    fn claim_axis(&mut self, axis: Axis) -> Result<AxisOutputs, HalError>;

    /// Release driver resources.
    fn shutdown(&mut self) -> Result<(), HalError>;

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
