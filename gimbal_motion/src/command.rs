//! Producer-side position commands.
//!
//! Both axes are posted before either ack is awaited, so the two workers
//! start moving at about the same time. The pair is not atomic: one worker
//! may already be stepping toward its new target while the other has not
//! yet taken its own.

use crate::context::MotionContext;
use crate::error::MotionError;
use crate::sync::sleep_interruptible;
use gimbal_common::hal::types::{Axis, Px};
use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Counters of issued commands.
#[derive(Debug, Default)]
pub struct CommandStats {
    pairs: AtomicU64,
    cancelled: AtomicU64,
}

impl CommandStats {
    /// Completed rendezvous pairs (both axes acked).
    pub fn pairs(&self) -> u64 {
        self.pairs.load(Ordering::Relaxed)
    }

    /// Commands abandoned because of termination.
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Single-producer handle for commanding both axes.
///
/// Clones share the same statistics; only one clone may command at a time.
#[derive(Debug, Clone)]
pub struct PositionCommander {
    ctx: Arc<MotionContext>,
    stats: Arc<CommandStats>,
}

impl PositionCommander {
    /// Commander on `ctx`.
    pub fn new(ctx: Arc<MotionContext>) -> Self {
        Self {
            ctx,
            stats: Arc::new(CommandStats::default()),
        }
    }

    /// Issued-command counters.
    pub fn stats(&self) -> &CommandStats {
        &self.stats
    }

    /// Send an absolute target to both axes and wait until both took it.
    ///
    /// The first call after spawn sets the calibration offset of both
    /// workers instead of moving them.
    ///
    /// # Errors
    /// `MotionError::Cancelled` if termination was requested before or
    /// during the handshake.
    pub fn set_absolute_position(&self, x: Px, y: Px) -> Result<(), MotionError> {
        let token = self.ctx.termination();
        if let Err(e) = token.check() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            return Err(e.into());
        }

        let (cx, cy) = (self.ctx.channel(Axis::X), self.ctx.channel(Axis::Y));
        cx.post(x);
        cy.post(y);
        debug!("sent x={x}, y={y}");

        // Both acks are always awaited: returning with a value still pending
        // on one axis would let the next post overwrite it.
        let ack_x = cx.await_ack(token);
        let ack_y = cy.await_ack(token);
        if let Err(e) = ack_x.and(ack_y) {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            return Err(e.into());
        }
        self.stats.pairs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Alias of [`set_absolute_position`](Self::set_absolute_position).
    pub fn trace_line(&self, dx: Px, dy: Px) -> Result<(), MotionError> {
        self.set_absolute_position(dx, dy)
    }

    /// Visit `points` positions on a circle of `radius` around the origin,
    /// pausing `delay` after each.
    ///
    /// Returns the number of positions sent. Stops at the first point or
    /// pause interrupted by termination; an interrupted pause after the last
    /// point still counts as a complete circle.
    ///
    /// # Errors
    /// `MotionError::Cancelled` when termination cut the sequence short.
    pub fn trace_circle(&self, radius: Px, points: u8, delay: Duration) -> Result<usize, MotionError> {
        info!("Tracing circle r={radius} with {points} points");
        let chunk = self.ctx.motion().wait_chunk();
        let mut sent = 0;

        for (i, (x, y)) in circle_points(radius, points).enumerate() {
            debug!("Point {i}: ({x}, {y})");
            self.set_absolute_position(x, y)?;
            sent += 1;

            let paused = sleep_interruptible(delay, chunk, self.ctx.termination());
            if paused.is_interrupted() && sent < points as usize {
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                return Err(crate::error::Cancelled.into());
            }
        }
        Ok(sent)
    }
}

/// Points at angles `2π·i/points` for `i in 0..points`, truncated toward
/// zero.
pub fn circle_points(radius: Px, points: u8) -> impl Iterator<Item = (Px, Px)> {
    let step = if points == 0 {
        0.0
    } else {
        2.0 * PI / points as f64
    };
    (0..points).map(move |i| {
        let angle = step * i as f64;
        let r = radius as f64;
        ((r * angle.cos()) as Px, (r * angle.sin()) as Px)
    })
}
