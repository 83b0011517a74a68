//! A `no_std` driver for the step/direction interface common to stepper
//! driver ICs (DRV8825, TMC2209 in standalone mode, ...).
//!
//! The step pulse is split into explicit `step_start`/`step_end` phases so a
//! tick-driven caller can stretch the pulse across ticks and guarantee the
//! minimum high time without busy-waiting.

#![no_std]

use embedded_hal::digital::{OutputPin, PinState};

/// A step/direction pin pair for one axis, with wiring-level direction
/// reversal handled here so motion logic stays in logical coordinates.
pub struct StepDirDriver<STEP, DIR> {
    step: STEP,
    dir: DIR,
    dir_reversed: bool,
}

impl<STEP, DIR, E> StepDirDriver<STEP, DIR>
where
    STEP: OutputPin<Error = E>,
    DIR: OutputPin<Error = E>,
{
    /// Creates a driver from its control pins. `dir_reversed` flips the
    /// electrical sense of the direction pin.
    pub fn new(step: STEP, dir: DIR, dir_reversed: bool) -> Self {
        Self {
            step,
            dir,
            dir_reversed,
        }
    }

    /// Sets the motion direction. `forward` is the logical positive-step
    /// direction; the reversal flag is applied to the pin level.
    pub fn set_forward(&mut self, forward: bool) -> Result<(), E> {
        self.dir
            .set_state(PinState::from(forward != self.dir_reversed))
    }

    /// Asserts the step pin. The caller must hold it for the driver IC's
    /// minimum pulse width before `step_end`.
    pub fn step_start(&mut self) -> Result<(), E> {
        self.step.set_high()
    }

    /// De-asserts the step pin, completing one step pulse.
    pub fn step_end(&mut self) -> Result<(), E> {
        self.step.set_low()
    }
}
