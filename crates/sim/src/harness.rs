//! Tick runner driving the actuator with virtual time.

use motion::{MotionPipeline, StepActuator};
use thiserror::Error;

use crate::sim_hal::SimStepHal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("pipeline not drained after {0} ticks")]
    TimedOut(u64),
}

/// Runs exactly `ticks` actuator ticks.
pub fn run_ticks<const N: usize>(actuator: &mut StepActuator<'_, SimStepHal, N>, ticks: u64) {
    for _ in 0..ticks {
        actuator.hw_mut().note_tick();
        actuator.tick();
    }
}

/// Ticks until the pipeline drains, up to `max_ticks`. Returns the tick
/// count consumed.
pub fn run_until_idle<const N: usize>(
    actuator: &mut StepActuator<'_, SimStepHal, N>,
    pipeline: &MotionPipeline<N>,
    max_ticks: u64,
) -> Result<u64, SimError> {
    let mut ticks = 0;
    while !pipeline.is_empty() {
        if ticks >= max_ticks {
            return Err(SimError::TimedOut(max_ticks));
        }
        actuator.hw_mut().note_tick();
        actuator.tick();
        ticks += 1;
    }
    // One trailing tick so a pending step-end never leaves a pin high.
    actuator.hw_mut().note_tick();
    actuator.tick();
    Ok(ticks)
}
