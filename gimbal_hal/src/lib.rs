//! # Gimbal HAL Library
//!
//! Hardware abstraction for the two stepper axes with a pluggable driver
//! architecture. Drivers implement the `HalDriver` trait defined in
//! `gimbal_common::hal::driver` and hand out per-axis `AxisOutputs`
//! (PWM step output + direction line) that are moved into the workers.
//!
//! # Module Structure
//!
//! - [`core`] - `HalCore`: driver selection, bring-up, axis hand-off
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - `sysfs` and `simulation` driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      gimbal_hal                            │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐  │
//! │  │ RigConfig    │───►│  HalCore     │◄──►│ Driver       │  │
//! │  │ (common)     │    │  (bring-up)  │    │ Registry     │  │
//! │  └──────────────┘    └──────┬───────┘    └──────────────┘  │
//! │                             │ claim_axis(X/Y)              │
//! │                             ▼                              │
//! │                   ┌──────────────────┐                     │
//! │                   │  AxisOutputs     │ ──► stepper worker  │
//! │                   │  pwm + direction │                     │
//! │                   └──────────────────┘                     │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod core;
pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::core::HalCore;
pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::simulation::{OutputEvent, OutputLog, SimulationDriver};
