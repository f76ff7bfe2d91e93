//! Name → factory table for HAL drivers.
//!
//! `HalCore` looks up `hardware.driver` here. The table is an ordinary value
//! handed to `HalCore`, so tests can build one holding only fakes.

use gimbal_common::hal::driver::{DriverFactory, HalDriver, HalError};
use std::collections::BTreeMap;

/// Drivers that can be selected by name.
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Registry without any driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `sysfs` and `simulation`.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Add a driver under `name`.
    ///
    /// # Panics
    /// If `name` is taken. Registration happens once at startup, so a clash
    /// is a programming error.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.insert(name, factory).is_some() {
            panic!("HAL driver '{name}' registered twice");
        }
    }

    /// Whether a driver called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build a fresh, uninitialized instance of the driver `name`.
    ///
    /// # Errors
    /// `HalError::DriverNotFound`, naming the drivers that do exist.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn HalDriver>, HalError> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(HalError::DriverNotFound(format!(
                "'{name}' (available: {})",
                self.names().join(", ")
            ))),
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}
