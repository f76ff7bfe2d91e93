//! Rig-wide constants for the gimbal workspace.
//!
//! Single source of truth for the default mechanical ratios, PWM timing
//! and sysfs locations. Configuration defaults are built from these.

/// Number of stepper axes on the rig (X pan, Y tilt).
pub const AXIS_COUNT: usize = 2;

/// Pixels of image displacement covered by one motor step.
pub const DEFAULT_STEP_SIZE_PX: u16 = 2;

/// Constant step frequency of every pulse train [Hz].
pub const DEFAULT_FREQUENCY_HZ: u32 = 350;

/// PWM duty cycle of the step signal [%].
pub const DEFAULT_DUTY_PERCENT: u8 = 50;

/// Granularity of interruptible waits [µs].
pub const DEFAULT_WAIT_CHUNK_US: u32 = 1000;

/// Interval between two wake broadcasts of the shutdown flush [µs].
pub const DEFAULT_FLUSH_INTERVAL_US: u32 = 1000;

/// Nanoseconds per second, used for period computation.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Root of the sysfs class tree exposing `pwm/` and `gpio/`.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gimbal/rig.toml";
