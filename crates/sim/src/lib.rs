//! # In-Process Simulation Harness
//!
//! A deterministic simulation environment for the motion core: a recording
//! [`motion::StepHal`] implementation with scriptable end-stop triggers, and
//! a tick runner that drives the actuator with virtual time. Used by the
//! integration tests and the `run_sim` example, so CI exercises the full
//! planner-to-pulses path without hardware.

pub mod harness;
pub mod sim_hal;

pub use harness::{run_ticks, run_until_idle, SimError};
pub use sim_hal::{EndstopTrigger, SimStepHal};
