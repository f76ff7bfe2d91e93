//! Real-time setup for the stepper threads.
//!
//! Everything here is a no-op unless the crate is built with the `rt`
//! feature, so development machines and tests run with default scheduling.

use crate::error::MotionError;
use gimbal_common::config::RtConfig;
use gimbal_common::hal::types::Axis;
use tracing::info;

/// SCHED_FIFO priorities accepted by Linux.
pub const FIFO_PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=99;

/// Process-wide setup, run once before the workers are spawned.
///
/// Also checks the per-worker settings, so a bad priority fails here
/// instead of on each worker thread.
pub fn apply_process(rt: &RtConfig) -> Result<(), MotionError> {
    if let Some(priority) = rt.priority.filter(|p| !FIFO_PRIORITY_RANGE.contains(p)) {
        return Err(MotionError::RtSetup(format!(
            "SCHED_FIFO priority {priority} outside {FIFO_PRIORITY_RANGE:?}"
        )));
    }
    if rt.lock_memory {
        rt_mlockall()?;
    }
    Ok(())
}

/// Per-thread setup, run by each worker on its own thread.
pub fn apply_worker(axis: Axis, rt: &RtConfig) -> Result<(), MotionError> {
    if let Some(cpu) = rt.cpu_for(axis) {
        rt_set_affinity(cpu)?;
    }
    if let Some(priority) = rt.priority {
        rt_set_scheduler(priority)?;
    }
    if rt.cpu_for(axis).is_some() || rt.priority.is_some() {
        info!("stepper-{axis} RT setup done (rt feature: {})", cfg!(feature = "rt"));
    }
    Ok(())
}

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), MotionError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| MotionError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), MotionError> {
    tracing::debug!("mlockall skipped (built without rt feature)");
    Ok(())
}

/// Pin the calling thread to one CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), MotionError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| MotionError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| MotionError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(cpu: usize) -> Result<(), MotionError> {
    tracing::debug!("CPU {cpu} affinity skipped (built without rt feature)");
    Ok(())
}

/// Switch the calling thread to SCHED_FIFO.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), MotionError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: pid 0 addresses the calling thread; `param` outlives the call.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(MotionError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(priority: i32) -> Result<(), MotionError> {
    tracing::debug!("SCHED_FIFO {priority} skipped (built without rt feature)");
    Ok(())
}
