//! Software-timed pulse trains on one PWM channel.
//!
//! The PWM hardware only generates the square wave; the length of a train
//! (and so the number of steps) is set by how long the output stays
//! enabled. Each train is:
//!
//! 1. disable (idempotent)
//! 2. program period and duty cycle
//! 3. enable
//! 4. sleep `steps / frequency` in interruptible chunks
//! 5. disable, whatever happened before

use crate::error::PulseError;
use crate::sync::{CancelToken, WaitOutcome, sleep_interruptible};
use gimbal_common::config::MotionConfig;
use gimbal_common::consts::NANOS_PER_SEC;
use gimbal_common::hal::driver::{HalError, PwmOutput};
use gimbal_common::hal::types::{PulseChannel, Steps};
use std::time::Duration;
use tracing::{error, trace, warn};

/// How a pulse train ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseOutcome {
    /// The full train was emitted.
    Completed,
    /// Termination cut the train short.
    Interrupted {
        /// Time the output was enabled.
        elapsed: Duration,
    },
    /// A hardware write failed; nothing (or an unknown part) was emitted.
    Skipped,
}

/// Period and active time in nanoseconds for `frequency_hz` at
/// `duty_percent`.
///
/// `frequency_hz` must be non-zero.
pub fn pulse_timing(frequency_hz: u32, duty_percent: u8) -> (u32, u32) {
    let period_ns = (NANOS_PER_SEC / frequency_hz as u64) as u32;
    let duty_ns = (duty_percent.min(100) as u64 * period_ns as u64 / 100) as u32;
    (period_ns, duty_ns)
}

/// Duration of a train of `steps` pulses at `frequency_hz`.
pub fn train_duration(steps: Steps, frequency_hz: u32) -> Duration {
    Duration::from_nanos(steps as u64 * NANOS_PER_SEC / frequency_hz as u64)
}

/// Drives one PWM output. Owned by a single worker.
pub struct PulseGenerator {
    pwm: Box<dyn PwmOutput>,
    duty_percent: u8,
    chunk: Duration,
}

impl PulseGenerator {
    /// Generator on `pwm` with the given duty cycle and wait granularity.
    pub fn new(pwm: Box<dyn PwmOutput>, duty_percent: u8, chunk: Duration) -> Self {
        Self {
            pwm,
            duty_percent,
            chunk,
        }
    }

    /// Generator using the duty cycle and chunk of `motion`.
    pub fn from_config(pwm: Box<dyn PwmOutput>, motion: &MotionConfig) -> Self {
        Self::new(pwm, motion.duty_percent, motion.wait_chunk())
    }

    /// Channel driven by this generator.
    pub fn channel(&self) -> PulseChannel {
        self.pwm.channel()
    }

    /// Emit `steps` pulses at `frequency_hz`.
    ///
    /// A zero-step train touches no hardware. Hardware write failures are
    /// logged and reported as [`PulseOutcome::Skipped`], never retried.
    ///
    /// # Errors
    /// `PulseError::ZeroFrequency` before any write when `frequency_hz == 0`.
    pub fn emit(
        &mut self,
        frequency_hz: u32,
        steps: Steps,
        token: &CancelToken,
    ) -> Result<PulseOutcome, PulseError> {
        if frequency_hz == 0 {
            return Err(PulseError::ZeroFrequency(self.channel()));
        }
        if steps == 0 {
            return Ok(PulseOutcome::Completed);
        }

        if let Err(e) = self.start(frequency_hz) {
            warn!("Skipping {steps} steps on {}: {e}", self.channel());
            self.disable();
            return Ok(PulseOutcome::Skipped);
        }

        let duration = train_duration(steps, frequency_hz);
        trace!("{}: {steps} steps over {duration:?}", self.channel());
        let waited = sleep_interruptible(duration, self.chunk, token);
        self.disable();

        Ok(match waited {
            WaitOutcome::Completed => PulseOutcome::Completed,
            WaitOutcome::Interrupted { elapsed } => PulseOutcome::Interrupted { elapsed },
        })
    }

    /// Switch the output off, logging (not returning) a failure.
    pub fn disable(&mut self) {
        if let Err(e) = self.pwm.set_enabled(false) {
            error!("Could not disable {}: {e}", self.channel());
        }
    }

    fn start(&mut self, frequency_hz: u32) -> Result<(), HalError> {
        let (period_ns, duty_ns) = pulse_timing(frequency_hz, self.duty_percent);
        self.pwm.set_enabled(false)?;
        self.pwm.configure(period_ns, duty_ns)?;
        self.pwm.set_enabled(true)
    }
}
