//! Tick-driven step actuator.
//!
//! `tick` is called every [`MotionBlock::TICK_INTERVAL_NS`] nanoseconds from
//! a timer ISR (bare metal) or a periodic task (host). It consumes the
//! pipeline head, ramps the fixed-point step rate once per millisecond and
//! emits step pulses with accumulator-based Bresenham across axes. No
//! allocation, no blocking, no logging: the whole tick is integer work and
//! a handful of pin writes.
//!
//! The tick body runs inside `critical_section::with`, pairing with the
//! planner's critical section so lookahead re-planning can never interleave
//! with a tick that reads the same block. On single-core MCUs where the tick
//! is the masked timer interrupt this costs nothing.

use heapless::Vec;

use crate::block::MotionBlock;
use crate::endstops::{EndstopCondition, ENDSTOPS_PER_AXIS, MAX_VAL_IDX, MIN_VAL_IDX};
use crate::hal::StepHal;
use crate::pipeline::MotionPipeline;
use crate::status::{MotionStatus, NUMBERED_COMMAND_NONE};
use crate::{AxisIndex, MAX_AXES};

#[cfg(feature = "instrumentation")]
use crate::instrumentation::{TickTrace, TraceEvent, TraceKind};

/// Upper bound on end-stop samples per block (min and max per axis).
pub const MAX_ENDSTOP_CHECKS: usize = MAX_AXES * ENDSTOPS_PER_AXIS;

/// One pre-computed end-stop sample: which input to read and which reading
/// terminates the block. Computed once at block setup so the per-tick test
/// is a bare pin read and compare.
#[derive(Debug, Clone, Copy)]
struct EndstopCheck {
    axis: u8,
    end_idx: u8,
    stop_on_triggered: bool,
}

/// The pipeline consumer: turns planned blocks into timed step pulses.
pub struct StepActuator<'a, HW, const N: usize> {
    pipeline: &'a MotionPipeline<N>,
    status: &'a MotionStatus,
    hw: HW,
    steps_total_abs: [u32; MAX_AXES],
    cur_step_count: [u32; MAX_AXES],
    accumulator_relative: [u32; MAX_AXES],
    accumulator_step: u32,
    accumulator_ns: u32,
    cur_rate_tticks: u32,
    step_pin_high: [bool; MAX_AXES],
    endstop_checks: Vec<EndstopCheck, MAX_ENDSTOP_CHECKS>,
    tick_count: u32,
    #[cfg(feature = "instrumentation")]
    trace: Option<&'a TickTrace>,
}

impl<'a, HW: StepHal, const N: usize> StepActuator<'a, HW, N> {
    pub fn new(pipeline: &'a MotionPipeline<N>, status: &'a MotionStatus, hw: HW) -> Self {
        Self {
            pipeline,
            status,
            hw,
            steps_total_abs: [0; MAX_AXES],
            cur_step_count: [0; MAX_AXES],
            accumulator_relative: [0; MAX_AXES],
            accumulator_step: 0,
            accumulator_ns: 0,
            cur_rate_tticks: 0,
            step_pin_high: [false; MAX_AXES],
            endstop_checks: Vec::new(),
            tick_count: 0,
            #[cfg(feature = "instrumentation")]
            trace: None,
        }
    }

    /// Attaches a trace ring the tick will record events into.
    #[cfg(feature = "instrumentation")]
    pub fn attach_trace(&mut self, trace: &'a TickTrace) {
        self.trace = Some(trace);
    }

    #[inline]
    pub fn hw(&self) -> &HW {
        &self.hw
    }

    #[inline]
    pub fn hw_mut(&mut self) -> &mut HW {
        &mut self.hw
    }

    /// Current fixed-point step rate; meaningful while a block executes.
    #[inline]
    pub fn cur_rate_tticks(&self) -> u32 {
        self.cur_rate_tticks
    }

    #[inline]
    pub fn cur_step_count(&self, axis: AxisIndex) -> u32 {
        self.cur_step_count[axis]
    }

    #[inline]
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    /// One timer tick. Must not be re-entered; the previous invocation has
    /// fully returned before the next.
    pub fn tick(&mut self) {
        critical_section::with(|_| self.tick_inner());
    }

    fn tick_inner(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);

        // Do a step-end for any motor which needs one - return here to
        // guarantee at least one full tick of high pulse.
        let mut any_pin_reset = false;
        for axis in 0..MAX_AXES {
            if self.step_pin_high[axis] {
                self.hw.step_end(axis);
                self.step_pin_high[axis] = false;
                any_pin_reset = true;
            }
        }
        if any_pin_reset {
            return;
        }

        if self.status.is_paused() {
            return;
        }

        let pipeline = self.pipeline;
        let block = match pipeline.peek_head() {
            Some(block) => block,
            None => return,
        };
        if !block.can_execute() {
            return;
        }

        // First touch of this block: cache counts, set directions, arm
        // end-stop samples. Return to bound the tick's worst case; stepping
        // picks up next tick.
        if block.begin_executing() {
            self.setup_new_block(block);
            return;
        }

        let mut endstop_hit = false;
        for chk in &self.endstop_checks {
            if let Some(triggered) = self
                .hw
                .endstop_triggered(chk.axis as usize, chk.end_idx as usize)
            {
                if triggered == chk.stop_on_triggered {
                    endstop_hit = true;
                }
            }
        }
        if endstop_hit {
            self.status.set_end_stop_reached();
            #[cfg(feature = "instrumentation")]
            self.record(TraceKind::EndstopHit, 0);
            self.finish_block(block);
            return;
        }

        // Millisecond accumulator drives the ramp: one rate adjustment per
        // elapsed ms, leaving the remainder to avoid rounding drift.
        self.accumulator_ns += MotionBlock::TICK_INTERVAL_NS;
        if self.accumulator_ns >= MotionBlock::NS_IN_A_MS {
            self.accumulator_ns -= MotionBlock::NS_IN_A_MS;
            let master = block.axis_with_max_steps;
            if self.cur_step_count[master] > block.steps_before_decel {
                let rate_floor = MotionBlock::MIN_STEP_RATE_PER_TTICKS
                    .max(block.final_rate_tticks)
                    + block.accel_per_ms_tticks;
                if self.cur_rate_tticks > rate_floor {
                    self.cur_rate_tticks -= block.accel_per_ms_tticks;
                }
            } else if self.cur_rate_tticks < block.max_rate_tticks {
                if self.cur_rate_tticks + block.accel_per_ms_tticks < MotionBlock::TTICKS_VALUE {
                    self.cur_rate_tticks += block.accel_per_ms_tticks;
                }
            }
        }

        // Step accumulator overflow emits a step.
        self.accumulator_step += self.cur_rate_tticks;
        if self.accumulator_step >= MotionBlock::TTICKS_VALUE {
            self.accumulator_step -= MotionBlock::TTICKS_VALUE;
            let any_axis_moving = self.step_axes(block);
            if !any_axis_moving {
                #[cfg(feature = "instrumentation")]
                self.record(TraceKind::BlockDone, 0);
                self.finish_block(block);
            }
        }
    }

    /// Caches everything the tick needs for a new block and resets the
    /// motion accumulators.
    fn setup_new_block(&mut self, block: &MotionBlock) {
        self.endstop_checks.clear();
        for axis in 0..MAX_AXES {
            let steps_total = block.steps_to_target(axis);
            self.steps_total_abs[axis] = steps_total.unsigned_abs();
            self.cur_step_count[axis] = 0;
            self.accumulator_relative[axis] = 0;
            self.hw.set_direction(axis, steps_total >= 0);

            if !block.endstops_to_check.any() {
                continue;
            }
            for end_idx in 0..ENDSTOPS_PER_AXIS {
                let cond = block.endstops_to_check.get(axis, end_idx);
                if cond == EndstopCondition::None {
                    continue;
                }
                // Towards only arms the stop on the side the axis is moving
                // to; motion away from a pressed switch must stay possible.
                if cond == EndstopCondition::Towards {
                    let armed = (end_idx == MAX_VAL_IDX && steps_total > 0)
                        || (end_idx == MIN_VAL_IDX && steps_total < 0);
                    if !armed {
                        continue;
                    }
                }
                if !self.hw.endstop_present(axis, end_idx) {
                    continue;
                }
                let stop_on_triggered = cond != EndstopCondition::NotHit;
                let _ = self.endstop_checks.push(EndstopCheck {
                    axis: axis as u8,
                    end_idx: end_idx as u8,
                    stop_on_triggered,
                });
            }
        }

        self.accumulator_step = 0;
        self.accumulator_ns = 0;
        self.cur_rate_tticks = block.initial_rate_tticks;

        #[cfg(feature = "instrumentation")]
        self.record(TraceKind::BlockStart, 0);
    }

    /// Steps the master axis and Bresenhams the others. Returns whether any
    /// axis still has steps remaining.
    fn step_axes(&mut self, block: &MotionBlock) -> bool {
        let master = block.axis_with_max_steps;
        let master_total = self.steps_total_abs[master];
        let mut any_axis_moving = false;

        if self.cur_step_count[master] < master_total {
            self.start_step(master);
            if self.cur_step_count[master] < master_total {
                any_axis_moving = true;
            }
        }

        for axis in 0..MAX_AXES {
            if axis == master || self.cur_step_count[axis] == self.steps_total_abs[axis] {
                continue;
            }
            self.accumulator_relative[axis] += self.steps_total_abs[axis];
            if self.accumulator_relative[axis] >= master_total {
                self.accumulator_relative[axis] -= master_total;
                self.start_step(axis);
                if self.cur_step_count[axis] < self.steps_total_abs[axis] {
                    any_axis_moving = true;
                }
            }
        }

        any_axis_moving
    }

    #[inline]
    fn start_step(&mut self, axis: AxisIndex) {
        self.hw.step_start(axis);
        self.step_pin_high[axis] = true;
        self.cur_step_count[axis] += 1;
        #[cfg(feature = "instrumentation")]
        self.record(TraceKind::StepStart, axis as u8);
    }

    /// Removes the head block, recording its numbered command if tracked.
    fn finish_block(&mut self, block: &MotionBlock) {
        let numbered = block.numbered_command_index;
        if numbered != NUMBERED_COMMAND_NONE {
            self.status.set_last_completed_numbered_command(numbered);
        }
        self.pipeline.remove_head();
    }

    #[cfg(feature = "instrumentation")]
    fn record(&self, kind: TraceKind, axis: u8) {
        if let Some(trace) = self.trace {
            trace.record(TraceEvent {
                tick: self.tick_count,
                kind,
                axis,
                rate_tticks: self.cur_rate_tticks,
            });
        }
    }
}
