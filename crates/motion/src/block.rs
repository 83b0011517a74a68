//! A single planned move: the record the step actuator consumes.
//!
//! A block is born cleared, filled by the planner, published with
//! `can_execute`, claimed by the actuator with `is_executing`, and destroyed
//! when the pipeline head is removed. Once published, the planner may still
//! re-flow its speeds while `is_executing` is false (lookahead), under the
//! planner critical section.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::endstops::AxisMinMaxBools;
use crate::mathf;
use crate::params::AxesParams;
use crate::status::NUMBERED_COMMAND_NONE;
use crate::{AxisIndex, MAX_AXES};

/// A single planned straight-line move with its acceleration profile.
#[derive(Debug)]
pub struct MotionBlock {
    /// Target planar speed for this block, mm/s.
    pub feedrate_mm_s: f32,
    /// Euclidean distance over primary axes, mm.
    pub dist_primary_mm: f32,
    /// Junction-deviation-derived upper bound on the entry speed, mm/s.
    pub max_entry_speed_mm_s: f32,
    /// Planned speed at block entry, mm/s.
    pub entry_speed_mm_s: f32,
    /// Planned speed at block exit, mm/s.
    pub exit_speed_mm_s: f32,
    /// Acceleration used for this block's ramp, mm/s^2.
    pub accel_mm_s2: f32,
    /// Signed step delta per axis.
    pub steps_total: [i32; MAX_AXES],
    /// Axis with the largest absolute step count; drives Bresenham.
    pub axis_with_max_steps: AxisIndex,
    /// Along the master axis, the step after which deceleration begins.
    pub steps_before_decel: u32,
    pub initial_rate_tticks: u32,
    pub max_rate_tticks: u32,
    pub final_rate_tticks: u32,
    /// Step-rate change applied once per millisecond while ramping.
    pub accel_per_ms_tticks: u32,
    pub endstops_to_check: AxisMinMaxBools,
    /// Correlator for tracking command completion; `NUMBERED_COMMAND_NONE`
    /// when untracked.
    pub numbered_command_index: i32,
    /// Set on a block when a successor has been appended behind it.
    pub block_is_followed: bool,
    can_execute: AtomicBool,
    is_executing: AtomicBool,
}

impl MotionBlock {
    /// Minimum move distance; anything shorter with no step deltas is
    /// rejected by the planner.
    pub const MINIMUM_MOVE_DIST_MM: f64 = 0.0001;

    /// Fixed-point scale of the step-rate accumulator.
    pub const TTICKS_VALUE: u32 = 1_000_000_000;

    /// Tick interval in ns. 20000ns allows max 25k steps/sec as each step
    /// needs at least two ticks (pulse start + pulse end).
    pub const TICK_INTERVAL_NS: u32 = 20_000;
    pub const TICKS_PER_SEC: u32 = 1_000_000_000 / Self::TICK_INTERVAL_NS;

    /// Number of ns in a ms.
    pub const NS_IN_A_MS: u32 = 1_000_000;

    /// Accumulator increment corresponding to one step per second.
    pub const RATE_PER_STEP_PER_SEC: u32 = Self::TTICKS_VALUE / Self::TICKS_PER_SEC;

    /// Slowest allowed step rate: one step per ~50ms.
    pub const MIN_STEP_RATE_PER_SEC: u32 = 20;
    pub const MIN_STEP_RATE_PER_TTICKS: u32 =
        Self::MIN_STEP_RATE_PER_SEC * Self::RATE_PER_STEP_PER_SEC;

    pub const fn new() -> Self {
        Self {
            feedrate_mm_s: 0.0,
            dist_primary_mm: 0.0,
            max_entry_speed_mm_s: 0.0,
            entry_speed_mm_s: 0.0,
            exit_speed_mm_s: 0.0,
            accel_mm_s2: 0.0,
            steps_total: [0; MAX_AXES],
            axis_with_max_steps: 0,
            steps_before_decel: 0,
            initial_rate_tticks: 0,
            max_rate_tticks: 0,
            final_rate_tticks: 0,
            accel_per_ms_tticks: 0,
            endstops_to_check: AxisMinMaxBools::none(),
            numbered_command_index: NUMBERED_COMMAND_NONE,
            block_is_followed: false,
            can_execute: AtomicBool::new(false),
            is_executing: AtomicBool::new(false),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn steps_to_target(&self, axis: AxisIndex) -> i32 {
        self.steps_total[axis]
    }

    #[inline]
    pub fn abs_steps_to_target(&self, axis: AxisIndex) -> u32 {
        self.steps_total[axis].unsigned_abs()
    }

    pub fn set_steps_to_target(&mut self, axis: AxisIndex, steps: i32) {
        self.steps_total[axis] = steps;
    }

    /// Whether the actuator may start (or continue) executing this block.
    /// Acquire pairs with the planner's release publication, so all plain
    /// fields are visible once this reads true.
    #[inline]
    pub fn can_execute(&self) -> bool {
        self.can_execute.load(Ordering::Acquire)
    }

    /// Publishes the block to the actuator. All field writes must precede
    /// this call.
    #[inline]
    pub fn set_can_execute(&self) {
        self.can_execute.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_executing(&self) -> bool {
        self.is_executing.load(Ordering::Acquire)
    }

    /// Atomically claims the block for execution. Returns true exactly once,
    /// for the tick that should run the new-block bootstrap.
    #[inline]
    pub fn begin_executing(&self) -> bool {
        !self.is_executing.swap(true, Ordering::AcqRel)
    }

    /// Highest speed reachable over `distance` when ending (or starting) at
    /// `target_speed` under `acceleration`.
    pub fn max_achievable_speed(acceleration: f32, target_speed: f32, distance: f32) -> f32 {
        mathf::sqrtf(target_speed * target_speed + 2.0 * acceleration * distance)
    }

    fn force_in_bounds(val: f32, low: u32, high: u32) -> u32 {
        if !(val > low as f32) {
            return low;
        }
        if val >= high as f32 {
            return high;
        }
        val as u32
    }

    /// The block's entry and exit speeds are now known. Computes the stepping
    /// parameters (fixed-point rates, ramp slope and deceleration point) that
    /// make the motion happen; degenerates the trapezoid to a triangle when
    /// the peak cannot be reached.
    pub fn prepare_for_stepping(&mut self, params: &AxesParams) {
        let master = self.axis_with_max_steps;
        let total_steps = self.abs_steps_to_target(master);
        if total_steps == 0 {
            self.initial_rate_tticks = Self::MIN_STEP_RATE_PER_TTICKS;
            self.max_rate_tticks = Self::MIN_STEP_RATE_PER_TTICKS;
            self.final_rate_tticks = Self::MIN_STEP_RATE_PER_TTICKS;
            self.accel_per_ms_tticks = 1;
            self.steps_before_decel = 0;
            return;
        }

        // Path distance per master-axis step. Blocks moving only auxiliary
        // axes have no planar distance; fall back to the master axis pitch.
        let step_dist_mm = if self.dist_primary_mm > Self::MINIMUM_MOVE_DIST_MM as f32 {
            self.dist_primary_mm / total_steps as f32
        } else {
            1.0 / params.steps_per_mm(master)
        };

        let entry_sps = self.entry_speed_mm_s / step_dist_mm;
        let exit_sps = self.exit_speed_mm_s / step_dist_mm;
        let accel_sps2 = (self.accel_mm_s2 / step_dist_mm).max(1.0);
        let mut peak_sps = (self.feedrate_mm_s / step_dist_mm)
            .max(entry_sps)
            .max(exit_sps);

        let accel_steps = (peak_sps * peak_sps - entry_sps * entry_sps) / (2.0 * accel_sps2);
        let decel_steps = (peak_sps * peak_sps - exit_sps * exit_sps) / (2.0 * accel_sps2);

        if accel_steps + decel_steps > total_steps as f32 {
            // Triangle profile: the cruise speed is whatever the distance
            // allows.
            let peak_sq = (2.0 * accel_sps2 * total_steps as f32
                + entry_sps * entry_sps
                + exit_sps * exit_sps)
                / 2.0;
            peak_sps = mathf::sqrtf(peak_sq)
                .max(entry_sps)
                .max(exit_sps)
                .min(peak_sps);
        }

        let decel_steps = ((peak_sps * peak_sps - exit_sps * exit_sps) / (2.0 * accel_sps2)).max(0.0);
        let decel_steps = (mathf::ceilf(decel_steps) as u32).min(total_steps);
        self.steps_before_decel = total_steps - decel_steps;

        let rate_scale = Self::RATE_PER_STEP_PER_SEC as f32;
        self.initial_rate_tticks = Self::force_in_bounds(
            entry_sps * rate_scale,
            Self::MIN_STEP_RATE_PER_TTICKS,
            Self::TTICKS_VALUE,
        );
        self.final_rate_tticks = Self::force_in_bounds(
            exit_sps * rate_scale,
            Self::MIN_STEP_RATE_PER_TTICKS,
            Self::TTICKS_VALUE,
        );
        self.max_rate_tticks = Self::force_in_bounds(
            peak_sps * rate_scale,
            Self::MIN_STEP_RATE_PER_TTICKS,
            Self::TTICKS_VALUE,
        );
        self.accel_per_ms_tticks =
            ((accel_sps2 * rate_scale / 1000.0) as u32).max(1);
    }
}

impl Default for MotionBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MotionBlock {
    fn clone(&self) -> Self {
        Self {
            feedrate_mm_s: self.feedrate_mm_s,
            dist_primary_mm: self.dist_primary_mm,
            max_entry_speed_mm_s: self.max_entry_speed_mm_s,
            entry_speed_mm_s: self.entry_speed_mm_s,
            exit_speed_mm_s: self.exit_speed_mm_s,
            accel_mm_s2: self.accel_mm_s2,
            steps_total: self.steps_total,
            axis_with_max_steps: self.axis_with_max_steps,
            steps_before_decel: self.steps_before_decel,
            initial_rate_tticks: self.initial_rate_tticks,
            max_rate_tticks: self.max_rate_tticks,
            final_rate_tticks: self.final_rate_tticks,
            accel_per_ms_tticks: self.accel_per_ms_tticks,
            endstops_to_check: self.endstops_to_check,
            numbered_command_index: self.numbered_command_index,
            block_is_followed: self.block_is_followed,
            can_execute: AtomicBool::new(self.can_execute.load(Ordering::Relaxed)),
            is_executing: AtomicBool::new(self.is_executing.load(Ordering::Relaxed)),
        }
    }
}
