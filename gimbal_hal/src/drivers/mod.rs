//! HAL driver implementations.
//!
//! - [`sysfs`] - Linux sysfs PWM channels and GPIO lines (production rig)
//! - [`simulation`] - In-memory outputs recording every write (desk + tests)
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `HalDriver` trait from `gimbal_common::hal::driver`
//! 3. Register the driver in `register_all_drivers()`

pub mod simulation;
pub mod sysfs;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("sysfs", sysfs::create_driver);
    registry.register("simulation", simulation::create_driver);
}
