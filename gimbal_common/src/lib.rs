//! Gimbal Common Library
//!
//! Shared constants, configuration loading and hardware contracts for all
//! gimbal workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Rig constants (step size, PWM frequency, sysfs paths)
//! - [`config`] - Configuration loading traits and the `RigConfig` tree
//! - [`hal`] - HAL driver traits, value types and errors
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use gimbal_common::prelude::*;
//!
//! let cmd = StepCommand::from_displacement(10, DEFAULT_STEP_SIZE_PX);
//! assert_eq!(cmd.step_count, 5);
//! assert_eq!(cmd.direction, Direction::Positive);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
