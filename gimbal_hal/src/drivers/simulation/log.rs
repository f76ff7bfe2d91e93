//! Shared record of simulated output writes.

use gimbal_common::hal::types::{Axis, Direction};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One write performed on a simulated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    /// Period and duty cycle programmed.
    Configure {
        /// Axis of the PWM output.
        axis: Axis,
        /// Period in nanoseconds.
        period_ns: u32,
        /// Active time in nanoseconds.
        duty_ns: u32,
    },
    /// PWM output switched on or off.
    Enable {
        /// Axis of the PWM output.
        axis: Axis,
        /// New state.
        enabled: bool,
    },
    /// Direction line driven.
    Direction {
        /// Axis of the direction line.
        axis: Axis,
        /// Level written.
        direction: Direction,
    },
}

impl OutputEvent {
    /// Axis the event belongs to.
    pub fn axis(&self) -> Axis {
        match *self {
            OutputEvent::Configure { axis, .. }
            | OutputEvent::Enable { axis, .. }
            | OutputEvent::Direction { axis, .. } => axis,
        }
    }
}

/// Events kept by [`OutputLog::new`].
pub const DEFAULT_LOG_CAPACITY: usize = 4096;

#[derive(Debug, Default)]
struct LogState {
    /// Most recent writes, oldest first; at most `capacity` entries.
    events: VecDeque<OutputEvent>,
    capacity: usize,
    failing: [bool; 2],
    writes: u64,
    write_failures: u64,
    trains_started: [usize; 2],
    last_direction: [Option<Direction>; 2],
    enabled: [bool; 2],
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<LogState>,
    changed: Condvar,
}

/// Cloneable handle on the write log of a [`SimulationDriver`](super::SimulationDriver).
///
/// Clones observe the same log, so a test keeps one and hands another to
/// the driver. Only the most recent `capacity` events are kept; counters,
/// train starts and the current output state cover every write.
#[derive(Debug, Clone)]
pub struct OutputLog {
    shared: Arc<Shared>,
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputLog {
    /// Empty log keeping the last [`DEFAULT_LOG_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Empty log keeping the last `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let state = LogState {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
            capacity,
            ..LogState::default()
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                changed: Condvar::new(),
            }),
        }
    }

    /// Make every subsequent write on `axis` fail (or succeed again).
    pub fn fail_writes(&self, axis: Axis, fail: bool) {
        self.shared.state.lock().failing[axis.index()] = fail;
    }

    /// Record a write attempt. Returns `false` if the axis is set to fail.
    pub(crate) fn record(&self, event: OutputEvent) -> bool {
        let mut state = self.shared.state.lock();
        let axis = event.axis().index();
        if state.failing[axis] {
            state.write_failures += 1;
            return false;
        }
        state.writes += 1;
        match event {
            OutputEvent::Enable { enabled, .. } => {
                if enabled {
                    state.trains_started[axis] += 1;
                }
                state.enabled[axis] = enabled;
            }
            OutputEvent::Direction { direction, .. } => {
                state.last_direction[axis] = Some(direction);
            }
            OutputEvent::Configure { .. } => {}
        }
        if state.events.len() == state.capacity {
            state.events.pop_front();
        }
        state.events.push_back(event);
        drop(state);
        self.shared.changed.notify_all();
        true
    }

    /// Snapshot of the retained successful writes, in order.
    pub fn events(&self) -> Vec<OutputEvent> {
        self.shared.state.lock().events.iter().copied().collect()
    }

    /// Retained successful writes on one axis, in order.
    pub fn events_for(&self, axis: Axis) -> Vec<OutputEvent> {
        self.shared
            .state
            .lock()
            .events
            .iter()
            .filter(|e| e.axis() == axis)
            .copied()
            .collect()
    }

    /// Number of times the PWM output of `axis` was switched on.
    pub fn trains_started(&self, axis: Axis) -> usize {
        self.shared.state.lock().trains_started[axis.index()]
    }

    /// Last direction written on `axis`, if any.
    pub fn last_direction(&self, axis: Axis) -> Option<Direction> {
        self.shared.state.lock().last_direction[axis.index()]
    }

    /// Whether the PWM output of `axis` is currently enabled.
    pub fn is_enabled(&self, axis: Axis) -> bool {
        self.shared.state.lock().enabled[axis.index()]
    }

    /// `(writes, write_failures)` counters.
    pub fn counters(&self) -> (u64, u64) {
        let state = self.shared.state.lock();
        (state.writes, state.write_failures)
    }

    /// Forget the retained events. Counters, output state and failure
    /// flags are kept.
    pub fn clear(&self) {
        self.shared.state.lock().events.clear();
    }

    /// Block until `predicate` holds for the retained events or `timeout`
    /// elapses. Returns the final value of the predicate.
    pub fn wait_until<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut(&[OutputEvent]) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if predicate(state.events.make_contiguous()) {
                return true;
            }
            if self
                .shared
                .changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return predicate(state.events.make_contiguous());
            }
        }
    }
}
