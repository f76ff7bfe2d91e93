//! Rig lifecycle: init → spawn → (commands) → terminate → join → close.

use crate::command::PositionCommander;
use crate::context::MotionContext;
use crate::error::MotionError;
use crate::rt;
use crate::sync::CancelToken;
use crate::worker::{StepObserver, StepperWorker, WorkerReport};
use gimbal_common::config::{RigConfig, RtConfig};
use gimbal_common::hal::driver::AxisOutputs;
use gimbal_common::hal::types::Axis;
use gimbal_hal::HalCore;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Handle on one running stepper thread.
pub struct WorkerHandle {
    axis: Axis,
    token: CancelToken,
    ctx: Arc<MotionContext>,
    thread: JoinHandle<Result<WorkerReport, MotionError>>,
}

impl WorkerHandle {
    /// Axis driven by the worker.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop only this worker.
    ///
    /// Cancels the worker's own token and closes its channel; the other
    /// axis keeps running. Commands posted to this axis afterwards fail
    /// with `Cancelled`.
    pub fn cancel(&self) {
        self.token.cancel();
        self.ctx.channel(self.axis).close();
    }

    /// Wait for the thread and return its report.
    ///
    /// # Errors
    /// The worker's own error, or `MotionError::WorkerPanicked`.
    pub fn join(self) -> Result<WorkerReport, MotionError> {
        self.thread
            .join()
            .map_err(|_| MotionError::WorkerPanicked(self.axis))?
    }
}

/// Both stepper workers plus the hardware they own.
pub struct Rig {
    ctx: Arc<MotionContext>,
    hal: HalCore,
    outputs: Option<[AxisOutputs; 2]>,
    rt: RtConfig,
    observer: Option<Arc<dyn StepObserver>>,
    workers: Vec<WorkerHandle>,
}

impl Rig {
    /// Create the synchronization state and take the axis outputs from an
    /// initialized `hardware`.
    pub fn init(config: &RigConfig, mut hardware: HalCore) -> Result<Self, MotionError> {
        config.validate()?;
        let outputs = hardware.claim_all()?;
        let ctx = Arc::new(MotionContext::new(config.motion.clone()));
        info!(
            "Rig initialized: step_size={}px, frequency={}Hz, {} participants",
            config.motion.step_size_px,
            config.motion.frequency_hz,
            ctx.readiness().total()
        );
        Ok(Self {
            ctx,
            hal: hardware,
            outputs: Some(outputs),
            rt: config.rt.clone(),
            observer: None,
            workers: Vec::new(),
        })
    }

    /// Shared context, for termination and readiness reporting.
    pub fn context(&self) -> &Arc<MotionContext> {
        &self.ctx
    }

    /// Producer handle for this rig.
    pub fn commander(&self) -> PositionCommander {
        PositionCommander::new(Arc::clone(&self.ctx))
    }

    /// Observer attached to workers spawned afterwards.
    pub fn set_observer(&mut self, observer: Arc<dyn StepObserver>) {
        self.observer = Some(observer);
    }

    /// Running workers.
    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    /// Start the `stepper-x` and `stepper-y` threads.
    ///
    /// A failed RT setup leaves the rig unspawned, so `spawn` can be
    /// retried. If a thread cannot be started, termination is requested and
    /// every worker that never ran is counted as exited so a flush still
    /// converges.
    pub fn spawn(&mut self) -> Result<(), MotionError> {
        if self.outputs.is_none() {
            return Err(MotionError::InvalidState("workers already spawned"));
        }
        rt::apply_process(&self.rt)?;
        let outputs = self
            .outputs
            .take()
            .ok_or(MotionError::InvalidState("workers already spawned"))?;

        let mut outputs = Axis::ALL.into_iter().zip(outputs);
        while let Some((axis, axis_outputs)) = outputs.next() {
            if let Err(e) = self.spawn_worker(axis, axis_outputs) {
                error!("Could not create task for {axis}-stepper motor: {e}");
                self.ctx.request_termination();
                let never_ran = 1 + outputs.count();
                for _ in 0..never_ran {
                    self.ctx.mark_exited();
                }
                return Err(e);
            }
        }
        info!("Stepper workers spawned");
        Ok(())
    }

    fn spawn_worker(&mut self, axis: Axis, outputs: AxisOutputs) -> Result<(), MotionError> {
        let token = self.ctx.termination().child();
        let mut worker = StepperWorker::new(axis, Arc::clone(&self.ctx), outputs, token.clone())
            .with_rt(self.rt.clone());
        if let Some(observer) = &self.observer {
            worker = worker.with_observer(Arc::clone(observer));
        }

        let thread = thread::Builder::new()
            .name(format!("stepper-{axis}"))
            .spawn(move || worker.run())
            .map_err(|source| MotionError::Spawn { axis, source })?;

        self.workers.push(WorkerHandle {
            axis,
            token,
            ctx: Arc::clone(&self.ctx),
            thread,
        });
        Ok(())
    }

    /// Join every worker. Returns the reports, or the first worker error
    /// after all threads were joined.
    pub fn join(&mut self) -> Result<Vec<WorkerReport>, MotionError> {
        let mut reports = Vec::with_capacity(self.workers.len());
        let mut first_error = None;

        for handle in self.workers.drain(..) {
            let axis = handle.axis();
            match handle.join() {
                Ok(report) => {
                    info!(
                        "stepper-{axis}: {} moves, {} steps, {} skipped, {} interrupted, offset {:?}",
                        report.moves,
                        report.steps_emitted,
                        report.skipped_trains,
                        report.interrupted_trains,
                        report.final_offset
                    );
                    reports.push(report);
                }
                Err(e) => {
                    error!("stepper-{axis} failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    /// Release the hardware. Workers must have been joined.
    pub fn close(mut self) -> Result<(), MotionError> {
        if !self.workers.is_empty() {
            return Err(MotionError::InvalidState("close() before join()"));
        }
        self.hal.shutdown()?;
        info!("Rig closed");
        Ok(())
    }
}
