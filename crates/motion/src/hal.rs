//! Hardware abstraction for the step actuator.
//!
//! The tick drives pins exclusively through [`StepHal`]; electrical detail
//! (direction-reverse wiring, end-stop polarity, absent switches) lives in
//! the implementation so the tick math stays in logical coordinates. A GPIO
//! implementation over `embedded-hal` pins is provided; simulators implement
//! the trait directly.

use driver_endstop::AxisEndstops;
use driver_stepdir::StepDirDriver;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{AxisIndex, MAX_AXES};

/// Pin-level operations the actuator performs. Implementations must be
/// non-blocking; the tick budget is a few microseconds.
///
/// The actuator cannot fail, so implementations swallow pin errors (on
/// memory-mapped GPIO there are none).
pub trait StepHal {
    /// Latches the motion direction for an axis. Called only during
    /// new-block setup, never while a step pulse is pending.
    fn set_direction(&mut self, axis: AxisIndex, forward: bool);

    /// Asserts the step pin. The pulse is ended by `step_end` on a later
    /// tick.
    fn step_start(&mut self, axis: AxisIndex);

    /// De-asserts the step pin.
    fn step_end(&mut self, axis: AxisIndex);

    /// Whether an end-stop input is wired at this end of the axis
    /// (`end_idx`: [`crate::endstops::MIN_VAL_IDX`] or
    /// [`crate::endstops::MAX_VAL_IDX`]).
    fn endstop_present(&self, axis: AxisIndex, end_idx: usize) -> bool;

    /// Samples an end-stop input. `Some(true)` when the switch is at its
    /// active level, `None` when nothing is wired there.
    fn endstop_triggered(&mut self, axis: AxisIndex, end_idx: usize) -> Option<bool>;
}

/// [`StepHal`] over per-axis step/direction drivers and end-stop pairs.
///
/// Pin types are homogeneous per role, which matches HALs offering an
/// erased "any pin" type.
pub struct GpioStepHal<STEP, DIR, EPIN> {
    axes: [StepDirDriver<STEP, DIR>; MAX_AXES],
    endstops: [AxisEndstops<EPIN>; MAX_AXES],
}

impl<STEP, DIR, EPIN, E> GpioStepHal<STEP, DIR, EPIN>
where
    STEP: OutputPin<Error = E>,
    DIR: OutputPin<Error = E>,
    EPIN: InputPin<Error = E>,
{
    pub fn new(
        axes: [StepDirDriver<STEP, DIR>; MAX_AXES],
        endstops: [AxisEndstops<EPIN>; MAX_AXES],
    ) -> Self {
        Self { axes, endstops }
    }
}

impl<STEP, DIR, EPIN, E> StepHal for GpioStepHal<STEP, DIR, EPIN>
where
    STEP: OutputPin<Error = E>,
    DIR: OutputPin<Error = E>,
    EPIN: InputPin<Error = E>,
{
    fn set_direction(&mut self, axis: AxisIndex, forward: bool) {
        if axis < MAX_AXES {
            let _ = self.axes[axis].set_forward(forward);
        }
    }

    fn step_start(&mut self, axis: AxisIndex) {
        if axis < MAX_AXES {
            let _ = self.axes[axis].step_start();
        }
    }

    fn step_end(&mut self, axis: AxisIndex) {
        if axis < MAX_AXES {
            let _ = self.axes[axis].step_end();
        }
    }

    fn endstop_present(&self, axis: AxisIndex, end_idx: usize) -> bool {
        axis < MAX_AXES && self.endstops[axis].is_present(end_idx)
    }

    fn endstop_triggered(&mut self, axis: AxisIndex, end_idx: usize) -> Option<bool> {
        if axis >= MAX_AXES {
            return None;
        }
        self.endstops[axis].triggered(end_idx).ok().flatten()
    }
}
