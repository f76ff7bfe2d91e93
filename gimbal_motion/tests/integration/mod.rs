//! Shared fixtures: a fully spawned rig on the simulation driver.

mod circle;
mod config;
mod handler;
mod rendezvous;
mod scenario;
mod shutdown;

use gimbal_common::config::RigConfig;
use gimbal_common::hal::types::{Axis, Px, StepCommand};
use gimbal_hal::{HalCore, OutputLog, SimulationDriver};
use gimbal_motion::{Rig, StepObserver};
use parking_lot::Mutex;
use std::sync::Arc;

/// Every `(axis, target, command)` seen by the workers, in order.
#[derive(Clone, Default)]
pub struct StepRecorder {
    seen: Arc<Mutex<Vec<(Axis, Px, StepCommand)>>>,
}

impl StepRecorder {
    pub fn targets(&self, axis: Axis) -> Vec<Px> {
        self.seen
            .lock()
            .iter()
            .filter(|(a, ..)| *a == axis)
            .map(|(_, target, _)| *target)
            .collect()
    }

    pub fn commands(&self, axis: Axis) -> Vec<StepCommand> {
        self.seen
            .lock()
            .iter()
            .filter(|(a, ..)| *a == axis)
            .map(|(.., command)| *command)
            .collect()
    }
}

impl StepObserver for StepRecorder {
    fn on_step(&self, axis: Axis, target: Px, command: StepCommand) {
        self.seen.lock().push((axis, target, command));
    }
}

pub struct SimRig {
    pub rig: Rig,
    pub log: OutputLog,
    pub steps: StepRecorder,
}

/// Simulation config with a fast step rate so moves finish quickly.
pub fn sim_config(frequency_hz: u32) -> RigConfig {
    let mut config = RigConfig::with_service_name("gimbal-test");
    config.hardware.driver = "simulation".to_string();
    config.motion.frequency_hz = frequency_hz;
    config
}

/// Bring up hardware, create the rig and spawn both workers.
pub fn start_rig(config: &RigConfig) -> SimRig {
    let log = OutputLog::new();
    let mut hal = HalCore::new(config.clone()).unwrap();
    hal.init_with_driver(Box::new(SimulationDriver::with_log(log.clone())))
        .unwrap();

    let steps = StepRecorder::default();
    let mut rig = Rig::init(config, hal).unwrap();
    rig.set_observer(Arc::new(steps.clone()));
    rig.spawn().unwrap();
    SimRig { rig, log, steps }
}
