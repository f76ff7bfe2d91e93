//! PWM channel exposed under `<root>/pwm/pwmchipC/pwmN`.
//!
//! Period, duty cycle and enable are text attributes. The channel must have
//! been exported beforehand (a privileged step outside this process).

use gimbal_common::hal::driver::{HalError, PwmOutput};
use gimbal_common::hal::types::PulseChannel;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One sysfs PWM channel.
#[derive(Debug, Clone)]
pub struct SysfsPwm {
    channel: PulseChannel,
    dir: PathBuf,
}

impl SysfsPwm {
    /// Channel handle under the sysfs class root (usually `/sys/class`).
    pub fn new(sysfs_root: &Path, channel: PulseChannel) -> Self {
        let dir = sysfs_root
            .join("pwm")
            .join(format!("pwmchip{}", channel.chip))
            .join(format!("pwm{}", channel.channel));
        Self { channel, dir }
    }

    /// Channel directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Whether the channel directory exists.
    pub fn is_exported(&self) -> bool {
        self.dir.is_dir()
    }

    /// Verify the channel is exported and log its current settings.
    ///
    /// # Errors
    /// `HalError::InitFailed` if the channel has not been exported.
    pub fn check(&self) -> Result<(), HalError> {
        if !self.is_exported() {
            return Err(HalError::InitFailed(format!(
                "PWM {} is not exported (export it as root first)",
                self.channel
            )));
        }
        info!("PWM {} is exported", self.channel);

        if let Some(period) = self.read_attr("period") {
            info!("  current period: {period} ns");
        }
        if let Some(duty) = self.read_attr("duty_cycle") {
            info!("  current duty cycle: {duty} ns");
        }
        Ok(())
    }

    fn read_attr(&self, attr: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(attr))
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn write_attr(&self, attr: &str, value: &str) -> Result<(), HalError> {
        let path = self.dir.join(attr);
        fs::write(&path, value).map_err(|e| {
            HalError::CommunicationError(format!("Could not write {}: {e}", path.display()))
        })
    }
}

impl PwmOutput for SysfsPwm {
    fn channel(&self) -> PulseChannel {
        self.channel
    }

    fn configure(&mut self, period_ns: u32, duty_ns: u32) -> Result<(), HalError> {
        if period_ns == 0 || duty_ns > period_ns {
            return Err(HalError::ConfigError(format!(
                "invalid PWM timing for {}: period={period_ns}ns duty={duty_ns}ns",
                self.channel
            )));
        }

        // The kernel rejects a period shorter than the duty cycle in place.
        let current_duty = self
            .read_attr("duty_cycle")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);
        if current_duty > period_ns {
            self.write_attr("duty_cycle", &duty_ns.to_string())?;
            self.write_attr("period", &period_ns.to_string())?;
        } else {
            self.write_attr("period", &period_ns.to_string())?;
            self.write_attr("duty_cycle", &duty_ns.to_string())?;
        }
        debug!("{}: period={period_ns}ns duty={duty_ns}ns", self.channel);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), HalError> {
        self.write_attr("enable", if enabled { "1" } else { "0" })
    }
}
