//! HAL Core: driver selection, bring-up and axis hand-off.
//!
//! The `HalCore` struct is the entry point for hardware setup. It picks the
//! driver named in the rig configuration, runs its bring-up (any failure is
//! fatal, there is no partial-hardware mode) and hands each axis's outputs
//! to the caller exactly once.

use gimbal_common::config::RigConfig;
use gimbal_common::hal::driver::{AxisOutputs, DriverDiagnostics, HalDriver, HalError};
use gimbal_common::hal::types::Axis;
use tracing::info;

use crate::driver_registry::DriverRegistry;

/// HAL Core owns the active driver.
pub struct HalCore {
    /// Rig configuration
    config: RigConfig,
    /// Available driver factories
    registry: DriverRegistry,
    /// Active driver instance
    driver: Option<Box<dyn HalDriver>>,
}

impl HalCore {
    /// Create a HalCore with every built-in driver available.
    ///
    /// # Errors
    /// Returns `HalError::ConfigError` if configuration validation fails.
    pub fn new(config: RigConfig) -> Result<Self, HalError> {
        Self::with_registry(config, DriverRegistry::with_builtin_drivers())
    }

    /// Create a HalCore with a custom registry.
    pub fn with_registry(config: RigConfig, registry: DriverRegistry) -> Result<Self, HalError> {
        config
            .validate()
            .map_err(|e| HalError::ConfigError(e.to_string()))?;
        info!(
            "HalCore created (driver='{}', x={}, y={})",
            config.hardware.driver, config.axes.x.pwm, config.axes.y.pwm
        );
        Ok(Self {
            config,
            registry,
            driver: None,
        })
    }

    /// Create and initialize the driver named in `hardware.driver`.
    ///
    /// # Errors
    /// `HalError::DriverNotFound` for an unknown name, or whatever the
    /// driver's bring-up reports.
    pub fn init(&mut self) -> Result<(), HalError> {
        let driver = self.registry.create_driver(&self.config.hardware.driver)?;
        self.init_with_driver(driver)
    }

    /// Initialize an already constructed driver instance.
    pub fn init_with_driver(&mut self, mut driver: Box<dyn HalDriver>) -> Result<(), HalError> {
        info!("Initializing driver: {} v{}", driver.name(), driver.version());
        driver.init(&self.config)?;

        if detect_rt_mode() {
            info!("Running in real-time mode");
        } else {
            info!("Running in standard (non-RT) mode");
        }

        self.driver = Some(driver);
        Ok(())
    }

    /// Take the outputs of `axis`.
    pub fn claim_axis(&mut self, axis: Axis) -> Result<AxisOutputs, HalError> {
        self.driver_mut()?.claim_axis(axis)
    }

    /// Take the outputs of both axes, in `Axis::ALL` order.
    pub fn claim_all(&mut self) -> Result<[AxisOutputs; 2], HalError> {
        let x = self.claim_axis(Axis::X)?;
        let y = self.claim_axis(Axis::Y)?;
        Ok([x, y])
    }

    /// Release the driver. Calling this without a driver is a no-op.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        if let Some(mut driver) = self.driver.take() {
            info!("Shutting down driver '{}'", driver.name());
            driver.shutdown()?;
        }
        Ok(())
    }

    /// Name of the active driver.
    pub fn driver_name(&self) -> Option<&'static str> {
        self.driver.as_ref().map(|d| d.name())
    }

    /// Diagnostics of the active driver, if it provides any.
    pub fn diagnostics(&self) -> Option<DriverDiagnostics> {
        self.driver.as_ref().and_then(|d| d.diagnostics())
    }

    /// The validated rig configuration.
    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    fn driver_mut(&mut self) -> Result<&mut Box<dyn HalDriver>, HalError> {
        self.driver
            .as_mut()
            .ok_or_else(|| HalError::InitFailed("Driver not initialized".to_string()))
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
pub fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: sched_getscheduler(0) only queries the calling thread.
        unsafe {
            let policy = sched_getscheduler(0);
            policy == SCHED_FIFO || policy == SCHED_RR
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulationDriver;

    fn sim_config() -> RigConfig {
        let mut config = RigConfig::with_service_name("hal-test");
        config.hardware.driver = "simulation".to_string();
        config
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = sim_config();
        config.motion.frequency_hz = 0;
        assert!(matches!(HalCore::new(config), Err(HalError::ConfigError(_))));
    }

    #[test]
    fn unknown_driver_is_fatal() {
        let mut config = sim_config();
        config.hardware.driver = "ethercat".to_string();
        let mut core = HalCore::new(config).unwrap();
        assert!(matches!(core.init(), Err(HalError::DriverNotFound(_))));
        assert!(core.driver_name().is_none());
    }

    #[test]
    fn claim_before_init_fails() {
        let mut core = HalCore::new(sim_config()).unwrap();
        assert!(matches!(
            core.claim_axis(Axis::X),
            Err(HalError::InitFailed(_))
        ));
    }

    #[test]
    fn simulation_bring_up_and_claim() {
        let mut core = HalCore::new(sim_config()).unwrap();
        core.init().unwrap();
        assert_eq!(core.driver_name(), Some("simulation"));

        let [x, y] = core.claim_all().unwrap();
        assert_eq!(x.pwm.channel(), core.config().axes.x.pwm);
        assert_eq!(y.direction.line(), core.config().axes.y.dir_gpio);
        assert!(core.claim_axis(Axis::Y).is_err());

        core.shutdown().unwrap();
        assert!(core.driver_name().is_none());
        core.shutdown().unwrap();
    }

    #[test]
    fn injected_driver_is_used() {
        let driver = SimulationDriver::new();
        let log = driver.log();
        let mut core = HalCore::new(sim_config()).unwrap();
        core.init_with_driver(Box::new(driver)).unwrap();

        let mut x = core.claim_axis(Axis::X).unwrap();
        x.pwm.configure(1000, 500).unwrap();
        assert_eq!(log.events().len(), 1);
        assert_eq!(core.diagnostics().unwrap().writes, 1);
    }
}
