//! Linux sysfs driver.
//!
//! Step signals go to sysfs PWM channels, direction signals to sysfs GPIO
//! lines. Bring-up only verifies and configures what an administrator has
//! already exported; it never exports channels itself.

mod gpio;
mod pwm;

pub use gpio::SysfsGpio;
pub use pwm::SysfsPwm;

use gimbal_common::config::RigConfig;
use gimbal_common::hal::driver::{AxisOutputs, DirectionLine, HalDriver, HalError, PwmOutput};
use gimbal_common::hal::types::Axis;
use tracing::{info, warn};

/// Factory function to create a sysfs driver instance.
pub fn create_driver() -> Box<dyn HalDriver> {
    Box::new(SysfsDriver::new())
}

/// Driver writing to `/sys/class/pwm` and `/sys/class/gpio`.
pub struct SysfsDriver {
    initialized: bool,
    /// Unclaimed per-axis outputs, indexed by `Axis::index()`.
    outputs: [Option<(SysfsPwm, SysfsGpio)>; 2],
    /// Claimed PWM channels, disabled again on shutdown.
    claimed: Vec<SysfsPwm>,
    /// Verified input lines (limit switches, emergency switch).
    inputs: Vec<SysfsGpio>,
}

impl SysfsDriver {
    /// Create an uninitialized driver.
    pub fn new() -> Self {
        Self {
            initialized: false,
            outputs: [None, None],
            claimed: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Current level of every verified input line, as `(line, level)`.
    pub fn read_inputs(&self) -> Vec<(u32, Result<bool, HalError>)> {
        self.inputs
            .iter()
            .map(|gpio| (gpio.line(), gpio.read()))
            .collect()
    }
}

impl Default for SysfsDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HalDriver for SysfsDriver {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &RigConfig) -> Result<(), HalError> {
        let root = &config.hardware.sysfs_root;
        info!("Start sysfs hardware setup under {}", root.display());

        let mut outputs: [Option<(SysfsPwm, SysfsGpio)>; 2] = [None, None];
        let mut inputs = Vec::new();

        for axis in Axis::ALL {
            let wiring = config.axes.get(axis);

            let pwm = SysfsPwm::new(root, wiring.pwm);
            pwm.check()?;

            let dir = SysfsGpio::new(root, wiring.dir_gpio);
            dir.request_output()?;
            info!("Axis {axis}: step={} dir=gpio{}", wiring.pwm, wiring.dir_gpio);

            if let Some(limit) = wiring.limit_gpio {
                let input = SysfsGpio::new(root, limit);
                input.request_input()?;
                inputs.push(input);
            }

            outputs[axis.index()] = Some((pwm, dir));
        }

        if let Some(line) = config.hardware.emergency_gpio {
            let input = SysfsGpio::new(root, line);
            input.request_input()?;
            inputs.push(input);
        }

        self.outputs = outputs;
        self.inputs = inputs;
        self.initialized = true;
        info!(
            "sysfs setup complete ({} input lines verified)",
            self.inputs.len()
        );
        Ok(())
    }

    fn claim_axis(&mut self, axis: Axis) -> Result<AxisOutputs, HalError> {
        if !self.initialized {
            return Err(HalError::InitFailed("sysfs driver not initialized".to_string()));
        }
        let (pwm, direction) = self.outputs[axis.index()]
            .take()
            .ok_or(HalError::AlreadyClaimed(axis))?;
        self.claimed.push(pwm.clone());
        Ok(AxisOutputs {
            pwm: Box::new(pwm),
            direction: Box::new(direction),
        })
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        let unclaimed = self.outputs.iter_mut().filter_map(Option::take).map(|(pwm, _)| pwm);
        for mut pwm in self.claimed.drain(..).chain(unclaimed) {
            if let Err(e) = pwm.set_enabled(false) {
                warn!("Could not disable {}: {e}", pwm.channel());
            }
        }
        self.inputs.clear();
        self.initialized = false;
        info!("sysfs driver released");
        Ok(())
    }
}
