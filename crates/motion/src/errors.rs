//! Error types for the motion planning crate.

use core::fmt;

/// Represents errors that can occur while planning a move.
///
/// The step actuator itself cannot fail; it only declines to step.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlannerError {
    /// The motion pipeline is full (or gated); retry once a block completes.
    Busy,
    /// The target violates a soft limit and out-of-bounds motion was not
    /// allowed.
    OutOfBounds,
    /// The requested move is below the minimum move distance. Benign: any
    /// feedrate carried by the command has still been captured.
    TooSmall,
    /// The command carried no usable content (no target axes, no feedrate) or
    /// contradictory flags.
    InvalidArgs,
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::Busy => write!(f, "motion pipeline busy"),
            PlannerError::OutOfBounds => write!(f, "target out of bounds"),
            PlannerError::TooSmall => write!(f, "move below minimum distance"),
            PlannerError::InvalidArgs => write!(f, "invalid move arguments"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlannerError {}
