//! # Gimbal Motion Core
//!
//! Drives the two stepper motors of a camera gimbal from target positions
//! produced by a tracking process.
//!
//! ## Flow
//!
//! ```text
//! PositionCommander ──► AxisChannel[x] ──► StepperWorker (stepper-x) ──► direction + PWM
//!                   └─► AxisChannel[y] ──► StepperWorker (stepper-y) ──► direction + PWM
//!
//! termination ──► CancelToken (root) ─┬─► worker tokens
//!                                     └─► flush: wake all signals until
//!                                         ReadinessCounter == participants
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use gimbal_common::config::RigConfig;
//! use gimbal_hal::HalCore;
//! use gimbal_motion::Rig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = RigConfig::with_service_name("demo");
//! config.hardware.driver = "simulation".to_string();
//!
//! let mut hal = HalCore::new(config.clone())?;
//! hal.init()?;
//! let mut rig = Rig::init(&config, hal)?;
//! rig.spawn()?;
//!
//! let commander = rig.commander();
//! commander.set_absolute_position(0, 0)?; // calibration
//! commander.set_absolute_position(10, -6)?;
//!
//! rig.context().flush();
//! rig.join()?;
//! rig.close()?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod command;
pub mod context;
pub mod error;
pub mod frame;
pub mod pulse;
pub mod rt;
pub mod runtime;
pub mod shutdown;
pub mod sync;
pub mod worker;

pub use channel::AxisChannel;
pub use command::{CommandStats, PositionCommander};
pub use context::MotionContext;
pub use error::{Cancelled, MotionError, PulseError, ShutdownError};
pub use frame::{Frame, FrameSlot};
pub use pulse::{PulseGenerator, PulseOutcome};
pub use runtime::{Rig, WorkerHandle};
pub use shutdown::{ReadinessCounter, install_termination_handler};
pub use sync::CancelToken;
pub use worker::{StepObserver, StepperWorker, WorkerReport, WorkerState};
