//! HAL value types.
//!
//! This module defines the data exchanged between the motion core and the
//! motor outputs:
//! - `Axis` - Which stepper an output belongs to
//! - `Direction` - Level of the direction line
//! - `PulseChannel` - Identity of a PWM output
//! - `StepCommand` - Step count + direction for one pulse train

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed pixel displacement on the camera image.
pub type Px = i16;

/// Number of motor steps in one pulse train.
pub type Steps = u16;

/// Stepper axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal (pan) axis.
    X,
    /// Vertical (tilt) axis.
    Y,
}

impl Axis {
    /// Both axes, in spawn order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Array index of the axis.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    /// Lowercase name used in thread names and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rotation direction, written on the direction line before each train.
///
/// `Positive` drives the line low, `Negative` drives it high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Positive displacement (line low).
    #[default]
    Positive,
    /// Negative displacement (line high).
    Negative,
}

impl Direction {
    /// Direction of a signed displacement. Zero maps to `Positive`.
    #[inline]
    pub const fn of(delta: i32) -> Self {
        if delta < 0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }

    /// Logic level of the direction line.
    #[inline]
    pub const fn level(self) -> bool {
        matches!(self, Direction::Negative)
    }
}

/// Identity of one PWM-capable output (`pwmchip<chip>/pwm<channel>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PulseChannel {
    /// PWM controller number.
    pub chip: u8,
    /// Channel number on the controller.
    pub channel: u8,
}

impl PulseChannel {
    /// Create a channel identifier.
    pub const fn new(chip: u8, channel: u8) -> Self {
        Self { chip, channel }
    }
}

impl fmt::Display for PulseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pwmchip{}/pwm{}", self.chip, self.channel)
    }
}

/// Steps and direction derived from one displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCommand {
    /// Number of pulses to emit.
    pub step_count: Steps,
    /// Direction line level for the whole train.
    pub direction: Direction,
}

impl StepCommand {
    /// Convert a pixel displacement into a step command.
    ///
    /// `step_count = floor(|delta| / step_size)`, saturating at `u16::MAX`.
    /// A zero `step_size` yields zero steps.
    pub fn from_displacement(delta: i32, step_size: u16) -> Self {
        let step_count = if step_size == 0 {
            0
        } else {
            let steps = delta.unsigned_abs() / step_size as u32;
            steps.min(Steps::MAX as u32) as Steps
        };
        Self {
            step_count,
            direction: Direction::of(delta),
        }
    }

    /// Whether the command moves the motor at all.
    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.step_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displacement_to_steps() {
        assert_eq!(
            StepCommand::from_displacement(10, 2),
            StepCommand { step_count: 5, direction: Direction::Positive }
        );
        assert_eq!(
            StepCommand::from_displacement(-6, 2),
            StepCommand { step_count: 3, direction: Direction::Negative }
        );
        let zero = StepCommand::from_displacement(0, 2);
        assert_eq!(zero.step_count, 0);
        assert_eq!(zero.direction, Direction::Positive);
        assert!(zero.is_idle());
    }

    #[test]
    fn odd_displacement_floors() {
        assert_eq!(StepCommand::from_displacement(7, 2).step_count, 3);
        assert_eq!(StepCommand::from_displacement(-1, 2).step_count, 0);
        assert_eq!(StepCommand::from_displacement(-1, 2).direction, Direction::Negative);
    }

    #[test]
    fn full_range_displacement_saturates() {
        let delta = i16::MAX as i32 - i16::MIN as i32;
        let cmd = StepCommand::from_displacement(delta, 1);
        assert_eq!(cmd.step_count, Steps::MAX);
        assert_eq!(StepCommand::from_displacement(delta, 0).step_count, 0);
    }

    #[test]
    fn direction_levels() {
        assert!(!Direction::Positive.level());
        assert!(Direction::Negative.level());
    }

    #[test]
    fn pulse_channel_display() {
        assert_eq!(PulseChannel::new(0, 4).to_string(), "pwmchip0/pwm4");
        assert_eq!(Axis::Y.to_string(), "y");
        assert_eq!(Axis::ALL.map(Axis::index), [0, 1]);
    }
}
