//! Prelude module for common re-exports.
//!
//! ```rust
//! use gimbal_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    load_rig_config, AxisConfig, ConfigError, ConfigLoader, MotionConfig, RigConfig, SharedConfig,
};

// ─── Rig Constants ──────────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, DEFAULT_FREQUENCY_HZ, DEFAULT_STEP_SIZE_PX};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::driver::{AxisOutputs, DirectionLine, HalDriver, HalError, PwmOutput};
pub use crate::hal::types::{Axis, Direction, Px, PulseChannel, StepCommand, Steps};

/// Default interruptible wait granularity as Duration.
pub const DEFAULT_WAIT_CHUNK: Duration =
    Duration::from_micros(crate::consts::DEFAULT_WAIT_CHUNK_US as u64);
