//! Simulation driver module.
//!
//! In-memory outputs for development and testing without a rig. Every write
//! is appended to a shared [`OutputLog`] that tests can inspect.

mod driver;
mod log;

pub use driver::SimulationDriver;
pub use log::{DEFAULT_LOG_CAPACITY, OutputEvent, OutputLog};

use gimbal_common::hal::driver::HalDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn HalDriver> {
    Box::new(SimulationDriver::new())
}
