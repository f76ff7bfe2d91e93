//! Stepper worker: the thread that owns one axis's outputs.
//!
//! ```text
//! Init ──► WaitCalibration ──► Tracking ──┐
//!               │                  ▲      │ next target
//!               │                  └──────┘
//!               └──────────┬───────────┘
//!                          ▼ termination
//!                      Terminated
//! ```
//!
//! The first value received is the calibration offset: the position the
//! rig is assumed to be at. Every later value is an absolute target; the
//! worker moves by `target - offset` and adopts the target as the new
//! offset. A worker always ends in `Terminated`, where it disables its PWM
//! output and reports its exit to the readiness counter exactly once.

use crate::context::MotionContext;
use crate::error::{Cancelled, MotionError};
use crate::pulse::{PulseGenerator, PulseOutcome};
use crate::rt;
use crate::sync::CancelToken;
use gimbal_common::config::RtConfig;
use gimbal_common::hal::driver::{AxisOutputs, DirectionLine};
use gimbal_common::hal::types::{Axis, Px, StepCommand};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Thread started.
    Init,
    /// Waiting for the calibration value.
    WaitCalibration,
    /// Following targets.
    Tracking,
    /// Exited.
    Terminated,
}

/// Receives every step command a worker derives, before it is executed.
pub trait StepObserver: Send + Sync {
    /// Called with the axis, the absolute target and the derived command.
    fn on_step(&self, axis: Axis, target: Px, command: StepCommand);
}

impl<F> StepObserver for F
where
    F: Fn(Axis, Px, StepCommand) + Send + Sync,
{
    fn on_step(&self, axis: Axis, target: Px, command: StepCommand) {
        self(axis, target, command)
    }
}

/// Summary returned by a worker thread on exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Axis of the worker.
    pub axis: Axis,
    /// Calibration value, if one arrived.
    pub calibration: Option<Px>,
    /// Targets received after calibration.
    pub moves: u64,
    /// Pulses emitted (partial trains counted by elapsed time).
    pub steps_emitted: u64,
    /// Trains skipped because of hardware write failures.
    pub skipped_trains: u64,
    /// Trains cut short by termination.
    pub interrupted_trains: u64,
    /// Offset at exit (last accepted absolute position).
    pub final_offset: Option<Px>,
}

impl WorkerReport {
    /// Empty report for `axis`.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            calibration: None,
            moves: 0,
            steps_emitted: 0,
            skipped_trains: 0,
            interrupted_trains: 0,
            final_offset: None,
        }
    }
}

/// State machine driving one axis.
pub struct StepperWorker {
    axis: Axis,
    ctx: Arc<MotionContext>,
    token: CancelToken,
    direction: Box<dyn DirectionLine>,
    pulse: PulseGenerator,
    observer: Option<Arc<dyn StepObserver>>,
    rt: RtConfig,
    state: WorkerState,
    offset: Px,
    report: WorkerReport,
}

impl StepperWorker {
    /// Worker for `axis` driving `outputs`, stopping when `token` (a child
    /// of the context's termination token) is cancelled.
    pub fn new(
        axis: Axis,
        ctx: Arc<MotionContext>,
        outputs: AxisOutputs,
        token: CancelToken,
    ) -> Self {
        let pulse = PulseGenerator::from_config(outputs.pwm, ctx.motion());
        Self {
            axis,
            ctx,
            token,
            direction: outputs.direction,
            pulse,
            observer: None,
            rt: RtConfig::default(),
            state: WorkerState::Init,
            offset: 0,
            report: WorkerReport::new(axis),
        }
    }

    /// Attach a step observer.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Apply real-time scheduling from `rt` when the thread starts.
    pub fn with_rt(mut self, rt: RtConfig) -> Self {
        self.rt = rt;
        self
    }

    /// Current state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Run until termination. Consumes the worker.
    ///
    /// The exit is reported to the readiness counter on every path,
    /// including errors.
    pub fn run(mut self) -> Result<WorkerReport, MotionError> {
        let result = self.run_states();
        self.terminate();
        result.map(|()| self.report.clone())
    }

    fn run_states(&mut self) -> Result<(), MotionError> {
        info!("Start {}-stepper motor task", self.axis);
        if let Err(e) = rt::apply_worker(self.axis, &self.rt) {
            warn!("stepper-{} keeps default scheduling: {e}", self.axis);
        }
        self.state = WorkerState::WaitCalibration;

        debug!("{}-stepper waiting for calibration", self.axis);
        let Ok(calibration) = self.receive() else {
            return Ok(());
        };
        self.offset = calibration;
        self.report.calibration = Some(calibration);
        self.report.final_offset = Some(calibration);
        info!("Set {}-stepper reference to {calibration}", self.axis);
        self.state = WorkerState::Tracking;

        while !self.token.is_cancelled() {
            let Ok(target) = self.receive() else {
                break;
            };
            self.execute_move(target)?;
        }
        Ok(())
    }

    fn receive(&self) -> Result<Px, Cancelled> {
        self.ctx.channel(self.axis).receive(&self.token)
    }

    fn execute_move(&mut self, target: Px) -> Result<(), MotionError> {
        let motion = self.ctx.motion();
        let delta = target as i32 - self.offset as i32;
        let command = StepCommand::from_displacement(delta, motion.step_size_px);
        let frequency_hz = motion.frequency_hz;
        debug!(
            "{}: target={target} delta={delta} steps={} dir={:?}",
            self.axis, command.step_count, command.direction
        );
        self.report.moves += 1;

        if let Some(observer) = &self.observer {
            observer.on_step(self.axis, target, command);
        }

        let outcome = match self.direction.set_direction(command.direction) {
            Ok(()) => self.pulse.emit(frequency_hz, command.step_count, &self.token)?,
            Err(e) => {
                warn!(
                    "Skipping {} steps on {}: direction line: {e}",
                    command.step_count, self.axis
                );
                PulseOutcome::Skipped
            }
        };

        match outcome {
            PulseOutcome::Completed => self.report.steps_emitted += command.step_count as u64,
            PulseOutcome::Interrupted { elapsed } => {
                let partial = elapsed.as_nanos() * frequency_hz as u128 / 1_000_000_000;
                self.report.steps_emitted += partial.min(command.step_count as u128) as u64;
                self.report.interrupted_trains += 1;
            }
            PulseOutcome::Skipped => self.report.skipped_trains += 1,
        }

        self.offset = target;
        self.report.final_offset = Some(target);
        Ok(())
    }

    fn terminate(&mut self) {
        self.pulse.disable();
        self.state = WorkerState::Terminated;
        let exited = self.ctx.mark_exited();
        info!(
            "Stopping {}-stepper motor task ({} moves, {exited}/{} exited)",
            self.axis,
            self.report.moves,
            self.ctx.readiness().total()
        );
    }
}
