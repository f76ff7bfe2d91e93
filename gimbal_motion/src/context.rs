//! Shared state of one running rig.

use crate::channel::AxisChannel;
use crate::shutdown::ReadinessCounter;
use crate::sync::CancelToken;
use gimbal_common::config::MotionConfig;
use gimbal_common::consts::AXIS_COUNT;
use gimbal_common::hal::types::Axis;

/// Everything the producer, the workers and the termination path share.
///
/// Created once per rig and handed around in an `Arc`; there is no
/// process-global state.
#[derive(Debug)]
pub struct MotionContext {
    termination: CancelToken,
    channels: [AxisChannel; AXIS_COUNT],
    readiness: ReadinessCounter,
    motion: MotionConfig,
}

impl MotionContext {
    /// Fresh context expecting the two workers plus
    /// `motion.external_participants` to report exit.
    pub fn new(motion: MotionConfig) -> Self {
        let total = AXIS_COUNT + motion.external_participants as usize;
        Self {
            termination: CancelToken::new(),
            channels: Axis::ALL.map(AxisChannel::new),
            readiness: ReadinessCounter::new(total),
            motion,
        }
    }

    /// Rendezvous slot of `axis`.
    #[inline]
    pub fn channel(&self, axis: Axis) -> &AxisChannel {
        &self.channels[axis.index()]
    }

    /// Both channels, in `Axis::ALL` order.
    pub fn channels(&self) -> &[AxisChannel] {
        &self.channels
    }

    /// Root termination token. Workers wait on children of it.
    pub fn termination(&self) -> &CancelToken {
        &self.termination
    }

    /// Whether termination has been requested.
    #[inline]
    pub fn termination_requested(&self) -> bool {
        self.termination.is_cancelled()
    }

    /// Shutdown witness.
    pub fn readiness(&self) -> &ReadinessCounter {
        &self.readiness
    }

    /// Report that one participant has exited. Call exactly once per
    /// participant; returns the new count.
    pub fn mark_exited(&self) -> usize {
        self.readiness.mark_exited()
    }

    /// Motion parameters in effect.
    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }
}
