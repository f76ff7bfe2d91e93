//! Simulation driver implementation.
//!
//! `SimulationDriver` hands out outputs that validate writes the same way
//! the sysfs driver does and append them to an [`OutputLog`].

use super::log::{OutputEvent, OutputLog};
use gimbal_common::config::RigConfig;
use gimbal_common::hal::driver::{
    AxisOutputs, DirectionLine, DriverDiagnostics, HalDriver, HalError, PwmOutput,
};
use gimbal_common::hal::types::{Axis, Direction, PulseChannel};
use tracing::{debug, info};

/// Simulation driver implementing the HalDriver trait.
pub struct SimulationDriver {
    initialized: bool,
    log: OutputLog,
    /// Wiring of each axis, `None` once claimed.
    wiring: [Option<(PulseChannel, u32)>; 2],
}

impl SimulationDriver {
    /// Create a driver with a fresh log.
    pub fn new() -> Self {
        Self::with_log(OutputLog::new())
    }

    /// Create a driver that records into `log`.
    pub fn with_log(log: OutputLog) -> Self {
        Self {
            initialized: false,
            log,
            wiring: [None, None],
        }
    }

    /// Handle on the write log.
    pub fn log(&self) -> OutputLog {
        self.log.clone()
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HalDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &RigConfig) -> Result<(), HalError> {
        for axis in Axis::ALL {
            let wiring = config.axes.get(axis);
            self.wiring[axis.index()] = Some((wiring.pwm, wiring.dir_gpio));
        }
        self.initialized = true;
        info!("Simulation driver initialized for {} axes", Axis::ALL.len());
        Ok(())
    }

    fn claim_axis(&mut self, axis: Axis) -> Result<AxisOutputs, HalError> {
        if !self.initialized {
            return Err(HalError::InitFailed(
                "simulation driver not initialized".to_string(),
            ));
        }
        let (channel, line) = self.wiring[axis.index()]
            .take()
            .ok_or(HalError::AlreadyClaimed(axis))?;
        debug!("Simulated axis {axis} claimed ({channel}, gpio{line})");
        Ok(AxisOutputs {
            pwm: Box::new(SimPwm {
                axis,
                channel,
                period_ns: 0,
                log: self.log.clone(),
            }),
            direction: Box::new(SimDirection {
                axis,
                line,
                log: self.log.clone(),
            }),
        })
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutting down simulation driver");
        self.wiring = [None, None];
        self.initialized = false;
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        let (writes, write_failures) = self.log.counters();
        Some(DriverDiagnostics {
            writes,
            write_failures,
        })
    }
}

struct SimPwm {
    axis: Axis,
    channel: PulseChannel,
    period_ns: u32,
    log: OutputLog,
}

impl SimPwm {
    fn write(&self, event: OutputEvent) -> Result<(), HalError> {
        if self.log.record(event) {
            Ok(())
        } else {
            Err(HalError::CommunicationError(format!(
                "simulated write failure on {}",
                self.channel
            )))
        }
    }
}

impl PwmOutput for SimPwm {
    fn channel(&self) -> PulseChannel {
        self.channel
    }

    fn configure(&mut self, period_ns: u32, duty_ns: u32) -> Result<(), HalError> {
        if period_ns == 0 || duty_ns > period_ns {
            return Err(HalError::ConfigError(format!(
                "{}: invalid period {period_ns}ns / duty {duty_ns}ns",
                self.channel
            )));
        }
        self.write(OutputEvent::Configure {
            axis: self.axis,
            period_ns,
            duty_ns,
        })?;
        self.period_ns = period_ns;
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), HalError> {
        if enabled && self.period_ns == 0 {
            return Err(HalError::ConfigError(format!(
                "{}: enabled before a period was set",
                self.channel
            )));
        }
        self.write(OutputEvent::Enable {
            axis: self.axis,
            enabled,
        })
    }
}

struct SimDirection {
    axis: Axis,
    line: u32,
    log: OutputLog,
}

impl DirectionLine for SimDirection {
    fn line(&self) -> u32 {
        self.line
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), HalError> {
        if self.log.record(OutputEvent::Direction {
            axis: self.axis,
            direction,
        }) {
            Ok(())
        } else {
            Err(HalError::CommunicationError(format!(
                "simulated write failure on gpio{}",
                self.line
            )))
        }
    }
}
