//! Shared test fixtures: a recording mock HAL and canned axis parameters.
#![allow(dead_code)]

use motion::endstops::ENDSTOPS_PER_AXIS;
use motion::{AxesParams, AxisIndex, StepHal, MAX_AXES};

/// Recording [`StepHal`] for in-crate tests: counts pulses, tracks pulse
/// widths in ticks, and can assert an end-stop input after a pulse count.
#[derive(Debug, Default)]
pub struct TestHal {
    tick_now: u64,
    pub step_counts: [u32; MAX_AXES],
    pub dir_forward: [bool; MAX_AXES],
    step_level: [bool; MAX_AXES],
    pulse_started: [u64; MAX_AXES],
    pub min_pulse_ticks: Option<u64>,
    pub max_pulse_ticks: Option<u64>,
    endstop_present: [[bool; ENDSTOPS_PER_AXIS]; MAX_AXES],
    endstop_level: [[bool; ENDSTOPS_PER_AXIS]; MAX_AXES],
    trigger: Option<(AxisIndex, usize, u32)>,
    pub violations: u32,
}

impl TestHal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wire_endstop(&mut self, axis: AxisIndex, end_idx: usize) {
        self.endstop_present[axis][end_idx] = true;
    }

    /// Asserts the (axis, end) input once the axis has emitted `after_steps`
    /// pulses.
    pub fn trigger_after(&mut self, axis: AxisIndex, end_idx: usize, after_steps: u32) {
        self.endstop_present[axis][end_idx] = true;
        self.trigger = Some((axis, end_idx, after_steps));
    }

    pub fn note_tick(&mut self) {
        self.tick_now += 1;
    }
}

impl StepHal for TestHal {
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
        if let Some((t_axis, t_end, after)) = self.trigger {
            if self.step_counts[t_axis] >= after {
                self.endstop_level[t_axis][t_end] = true;
            }
        }
        if !self.endstop_present[axis][end_idx] {
            return None;
        }
        Some(self.endstop_level[axis][end_idx])
    }
}

/// Two primary axes at 80 steps/mm, 100 mm/s^2, 50 mm/s; the third axis is
/// auxiliary.
pub fn two_axis_params() -> AxesParams {
    let mut params = AxesParams::default();
    for axis in params.axes.iter_mut() {
        axis.steps_per_mm = 80.0;
        axis.max_accel_mm_s2 = 100.0;
        axis.max_speed_mm_s = 50.0;
    }
    params.axes[2].is_primary_axis = false;
    params
}
