//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all gimbal applications, plus the `RigConfig` tree describing the
//! two-axis stepper rig.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gimbal_common::config::{load_rig_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_rig_config(Path::new("rig.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_DUTY_PERCENT, DEFAULT_FLUSH_INTERVAL_US, DEFAULT_FREQUENCY_HZ, DEFAULT_STEP_SIZE_PX,
    DEFAULT_SYSFS_ROOT, DEFAULT_WAIT_CHUNK_US,
};
use crate::hal::types::{Axis, Px, PulseChannel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Highest accepted step frequency [Hz].
pub const MAX_FREQUENCY_HZ: u32 = 100_000;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields shared across all gimbal applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "gimbal-bench-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Motion timing and ratios shared by both stepper workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Pixels per motor step.
    pub step_size_px: u16,
    /// Step frequency of every pulse train [Hz].
    pub frequency_hz: u32,
    /// Duty cycle of the step signal [%].
    pub duty_percent: u8,
    /// Granularity of interruptible waits [µs].
    pub wait_chunk_us: u32,
    /// Interval between shutdown wake broadcasts [µs].
    pub flush_interval_us: u32,
    /// Threads outside the motion core (camera, inference) that report
    /// their exit through the readiness counter.
    pub external_participants: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            step_size_px: DEFAULT_STEP_SIZE_PX,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            duty_percent: DEFAULT_DUTY_PERCENT,
            wait_chunk_us: DEFAULT_WAIT_CHUNK_US,
            flush_interval_us: DEFAULT_FLUSH_INTERVAL_US,
            external_participants: 0,
        }
    }
}

impl MotionConfig {
    /// Wait chunk as a `Duration`.
    pub fn wait_chunk(&self) -> Duration {
        Duration::from_micros(self.wait_chunk_us as u64)
    }

    /// Flush interval as a `Duration`.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_micros(self.flush_interval_us as u64)
    }
}

/// Hardware backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareConfig {
    /// HAL driver name ("sysfs" or "simulation").
    pub driver: String,
    /// Root of the sysfs class tree (contains `pwm/` and `gpio/`).
    pub sysfs_root: PathBuf,
    /// Master emergency switch input, verified at bring-up only.
    pub emergency_gpio: Option<u32>,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            driver: "sysfs".to_string(),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            emergency_gpio: Some(78),
        }
    }
}

/// Per-axis wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// PWM output producing the step signal.
    pub pwm: PulseChannel,
    /// GPIO line driving the direction input.
    pub dir_gpio: u32,
    /// Limit switch input, verified at bring-up only.
    #[serde(default)]
    pub limit_gpio: Option<u32>,
}

/// Wiring of both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AxesConfig {
    /// Pan axis.
    pub x: AxisConfig,
    /// Tilt axis.
    pub y: AxisConfig,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            x: AxisConfig {
                pwm: PulseChannel::new(0, 4),
                dir_gpio: 75,
                limit_gpio: Some(233),
            },
            y: AxisConfig {
                pwm: PulseChannel::new(0, 3),
                dir_gpio: 226,
                limit_gpio: Some(74),
            },
        }
    }
}

impl AxesConfig {
    /// Wiring of the given axis.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

/// Parameters of the circular-path demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircleConfig {
    /// Radius [px].
    pub radius_px: Px,
    /// Number of points on the circle.
    pub points: u8,
    /// Pause after each point [µs].
    pub delay_us: u32,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            radius_px: 40,
            points: 36,
            delay_us: 200_000,
        }
    }
}

/// Real-time scheduling of the stepper threads.
///
/// Only applied when built with the `rt` feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RtConfig {
    /// Lock process memory before spawning workers.
    pub lock_memory: bool,
    /// SCHED_FIFO priority for the workers (None = default scheduler).
    pub priority: Option<i32>,
    /// CPU core for the X worker.
    pub cpu_x: Option<usize>,
    /// CPU core for the Y worker.
    pub cpu_y: Option<usize>,
}

impl RtConfig {
    /// CPU core assigned to the worker of `axis`.
    pub fn cpu_for(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::X => self.cpu_x,
            Axis::Y => self.cpu_y,
        }
    }
}

/// Full rig configuration loaded from `rig.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Motion timing.
    #[serde(default)]
    pub motion: MotionConfig,
    /// Hardware backend.
    #[serde(default)]
    pub hardware: HardwareConfig,
    /// Axis wiring.
    #[serde(default)]
    pub axes: AxesConfig,
    /// Circle demo.
    #[serde(default)]
    pub circle: CircleConfig,
    /// Worker scheduling.
    #[serde(default)]
    pub rt: RtConfig,
}

impl RigConfig {
    /// Default configuration for the given service name.
    pub fn with_service_name(service_name: &str) -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: service_name.to_string(),
            },
            motion: MotionConfig::default(),
            hardware: HardwareConfig::default(),
            axes: AxesConfig::default(),
            circle: CircleConfig::default(),
            rt: RtConfig::default(),
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the rig configuration.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` not empty
    /// 2. `0 < motion.frequency_hz <= MAX_FREQUENCY_HZ`
    /// 3. `motion.step_size_px > 0`
    /// 4. `motion.duty_percent <= 100`
    /// 5. `motion.wait_chunk_us > 0`, `motion.flush_interval_us > 0`
    /// 6. Axes use distinct PWM channels and direction lines
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let motion = &self.motion;
        if motion.frequency_hz == 0 || motion.frequency_hz > MAX_FREQUENCY_HZ {
            return Err(ConfigError::ValidationError(format!(
                "frequency_hz must be in 1..={MAX_FREQUENCY_HZ}, got {}",
                motion.frequency_hz
            )));
        }
        if motion.step_size_px == 0 {
            return Err(ConfigError::ValidationError(
                "step_size_px must be greater than 0".to_string(),
            ));
        }
        if motion.duty_percent > 100 {
            return Err(ConfigError::ValidationError(format!(
                "duty_percent must be <= 100, got {}",
                motion.duty_percent
            )));
        }
        if motion.wait_chunk_us == 0 || motion.flush_interval_us == 0 {
            return Err(ConfigError::ValidationError(
                "wait_chunk_us and flush_interval_us must be greater than 0".to_string(),
            ));
        }

        if self.axes.x.pwm == self.axes.y.pwm {
            return Err(ConfigError::ValidationError(format!(
                "axes x and y share PWM channel {}",
                self.axes.x.pwm
            )));
        }
        if self.axes.x.dir_gpio == self.axes.y.dir_gpio {
            return Err(ConfigError::ValidationError(format!(
                "axes x and y share direction line {}",
                self.axes.x.dir_gpio
            )));
        }

        if self.hardware.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "hardware.driver cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Load and validate a `RigConfig` from a TOML file.
pub fn load_rig_config(path: &Path) -> Result<RigConfig, ConfigError> {
    let config = RigConfig::load(path)?;
    config.validate()?;
    tracing::debug!(
        "Loaded rig config '{}' from {}",
        config.shared.service_name,
        path.display()
    );
    Ok(config)
}
