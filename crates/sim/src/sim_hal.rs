//! Simulated step hardware.
//!
//! Records every pulse, direction change and pulse width so tests can assert
//! electrical invariants (pulse stretched at least one tick, direction
//! stable while a step pin is high). End-stop inputs are scriptable: a
//! trigger arms an input once an axis has emitted a given number of pulses.

use motion::endstops::ENDSTOPS_PER_AXIS;
use motion::{AxisIndex, StepHal, MAX_AXES};

/// Asserts an end-stop input once `axis` has emitted `after_steps` pulses.
#[derive(Debug, Clone, Copy)]
pub struct EndstopTrigger {
    pub axis: AxisIndex,
    pub end_idx: usize,
    pub after_steps: u32,
}

/// Recording [`StepHal`] with virtual time.
#[derive(Debug, Default)]
pub struct SimStepHal {
    tick_now: u64,
    /// Step pulses emitted per axis.
    step_counts: [u32; MAX_AXES],
    dir_forward: [bool; MAX_AXES],
    step_level: [bool; MAX_AXES],
    pulse_started: [u64; MAX_AXES],
    min_pulse_ticks: Option<u64>,
    max_pulse_ticks: Option<u64>,
    endstop_present: [[bool; ENDSTOPS_PER_AXIS]; MAX_AXES],
    endstop_level: [[bool; ENDSTOPS_PER_AXIS]; MAX_AXES],
    triggers: Vec<EndstopTrigger>,
    /// Electrical violations observed: direction flips while a step pin was
    /// high, or a step pin re-asserted before its step-end.
    violations: u32,
}

impl SimStepHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires an end-stop input (idle, not triggered).
    pub fn wire_endstop(&mut self, axis: AxisIndex, end_idx: usize) {
        self.endstop_present[axis][end_idx] = true;
    }

    /// Forces an end-stop input level directly.
    pub fn set_endstop(&mut self, axis: AxisIndex, end_idx: usize, triggered: bool) {
        self.endstop_present[axis][end_idx] = true;
        self.endstop_level[axis][end_idx] = triggered;
    }

    /// Schedules an end-stop assertion after a number of pulses on an axis.
    /// The input is wired implicitly.
    pub fn add_trigger(&mut self, trigger: EndstopTrigger) {
        self.endstop_present[trigger.axis][trigger.end_idx] = true;
        self.triggers.push(trigger);
    }

    /// Advances virtual time by one tick. The harness calls this before
    /// every actuator tick.
    pub fn note_tick(&mut self) {
        self.tick_now += 1;
    }

    pub fn step_count(&self, axis: AxisIndex) -> u32 {
        self.step_counts[axis]
    }

    pub fn dir_forward(&self, axis: AxisIndex) -> bool {
        self.dir_forward[axis]
    }

    /// Shortest completed pulse, in ticks.
    pub fn min_pulse_ticks(&self) -> Option<u64> {
        self.min_pulse_ticks
    }

    /// Longest completed pulse, in ticks.
    pub fn max_pulse_ticks(&self) -> Option<u64> {
        self.max_pulse_ticks
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    fn apply_matured_triggers(&mut self) {
        let counts = self.step_counts;
        for trigger in &self.triggers {
            if counts[trigger.axis] >= trigger.after_steps {
                self.endstop_level[trigger.axis][trigger.end_idx] = true;
            }
        }
    }
}

impl StepHal for SimStepHal {
    fn set_direction(&mut self, axis: AxisIndex, forward: bool) {
        if self.step_level.iter().any(|&high| high) && self.dir_forward[axis] != forward {
            self.violations += 1;
        }
        self.dir_forward[axis] = forward;
    }

    fn step_start(&mut self, axis: AxisIndex) {
        if self.step_level[axis] {
            self.violations += 1;
        }
        self.step_level[axis] = true;
        self.pulse_started[axis] = self.tick_now;
        self.step_counts[axis] += 1;
    }

    fn step_end(&mut self, axis: AxisIndex) {
        if self.step_level[axis] {
            let width = self.tick_now - self.pulse_started[axis];
            self.min_pulse_ticks = Some(self.min_pulse_ticks.map_or(width, |w| w.min(width)));
            self.max_pulse_ticks = Some(self.max_pulse_ticks.map_or(width, |w| w.max(width)));
        }
        self.step_level[axis] = false;
    }

    fn endstop_present(&self, axis: AxisIndex, end_idx: usize) -> bool {
        self.endstop_present[axis][end_idx]
    }

    fn endstop_triggered(&mut self, axis: AxisIndex, end_idx: usize) -> Option<bool> {
        self.apply_matured_triggers();
        if !self.endstop_present[axis][end_idx] {
            return None;
        }
        Some(self.endstop_level[axis][end_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_pulse_widths() {
        let mut hal = SimStepHal::new();
        hal.note_tick();
        hal.step_start(0);
        hal.note_tick();
        hal.step_end(0);
        assert_eq!(hal.step_count(0), 1);
        assert_eq!(hal.min_pulse_ticks(), Some(1));
        assert_eq!(hal.violations(), 0);
    }

    #[test]
    fn trigger_matures_after_steps() {
        let mut hal = SimStepHal::new();
        hal.add_trigger(EndstopTrigger {
            axis: 0,
            end_idx: 0,
            after_steps: 2,
        });
        assert_eq!(hal.endstop_triggered(0, 0), Some(false));
        hal.step_start(0);
        hal.step_end(0);
        assert_eq!(hal.endstop_triggered(0, 0), Some(false));
        hal.step_start(0);
        hal.step_end(0);
        assert_eq!(hal.endstop_triggered(0, 0), Some(true));
    }

    #[test]
    fn unwired_endstop_reads_none() {
        let mut hal = SimStepHal::new();
        assert_eq!(hal.endstop_triggered(1, 1), None);
    }
}
