//! Motion planner: the pipeline producer.
//!
//! Accepts one logical move at a time from the command interpreter, resolves
//! it through the robot geometry, splits it into distance-bounded blocks,
//! runs junction-deviation lookahead over the queued tail and publishes
//! executable blocks to the actuator.
//!
//! ## Operation
//!
//! 1. **`move_to`**: resolves the target (units, relative moves, geometry,
//!    soft limits), rejects trivial moves, and appends one block per
//!    `block_distance_mm` of path.
//! 2. **Junction deviation**: each block's maximum entry speed comes from
//!    the corner angle against the previous block's direction.
//! 3. **Lookahead re-flow**: a backward then forward pass over the
//!    non-executing tail settles entry/exit speeds, after which stepping
//!    parameters are computed and blocks are published.
//! 4. **Publication holdback**: with `more_moves_coming` the newest block
//!    stays unpublished until a successor arrives, `flush` is called, or the
//!    `service` pump times it out.
//!
//! All mutation of queued blocks happens inside `critical_section::with`,
//! pairing with the actuator tick.

use crate::args::{MoveType, RobotCommandArgs};
use crate::axis_vals::AxisFloats;
use crate::block::MotionBlock;
use crate::errors::PlannerError;
use crate::kinematics::RobotGeometry;
use crate::params::AxesParams;
use crate::pipeline::MotionPipeline;
use crate::position::AxisPosition;
use crate::status::{MotionStatus, NUMBERED_COMMAND_NONE};
use crate::{mathf, MAX_AXES};

/// How long the newest block may wait for a successor before the `service`
/// pump publishes it anyway.
pub const BLOCK_PUBLISH_TIMEOUT_MS: u32 = 100;

/// The pipeline producer. Owns the commanded position and the axes
/// parameters; shares the pipeline and status flags with the actuator.
pub struct MotionPlanner<'a, const N: usize> {
    pipeline: &'a MotionPipeline<N>,
    status: &'a MotionStatus,
    params: AxesParams,
    position: AxisPosition,
    last_commanded_feedrate: Option<f32>,
    prev_unit_vec: [f32; MAX_AXES],
    junction_chain_valid: bool,
    publish_deadline_ms: Option<u32>,
}

impl<'a, const N: usize> MotionPlanner<'a, N> {
    pub fn new(
        pipeline: &'a MotionPipeline<N>,
        status: &'a MotionStatus,
        params: AxesParams,
    ) -> Self {
        Self {
            pipeline,
            status,
            params,
            position: AxisPosition::new(),
            last_commanded_feedrate: None,
            prev_unit_vec: [0.0; MAX_AXES],
            junction_chain_valid: false,
            publish_deadline_ms: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &AxesParams {
        &self.params
    }

    /// Current commanded position (planner-owned; advanced per enqueued
    /// block).
    #[inline]
    pub fn position(&self) -> &AxisPosition {
        &self.position
    }

    /// Whether a new command would be accepted right now.
    pub fn can_accept_command(&self) -> bool {
        self.pipeline.can_accept()
    }

    /// Pipeline drained and nothing executing.
    pub fn is_idle(&self) -> bool {
        self.pipeline.is_empty()
    }

    pub fn pause(&self, pause: bool) {
        self.status.set_paused(pause);
    }

    /// Drops all blocks that have not started executing. A mid-flight block
    /// finishes; callers needing a hard abort pause first and re-home.
    pub fn stop(&mut self) {
        critical_section::with(|_| self.pipeline.clear());
        self.junction_chain_valid = false;
        self.publish_deadline_ms = None;
    }

    pub fn last_completed_numbered_command(&self) -> i32 {
        self.status.last_completed_numbered_command()
    }

    pub fn end_stop_reached(&self) -> bool {
        self.status.end_stop_reached()
    }

    /// Clears the sticky end-stop latch (typically after re-homing).
    pub fn acknowledge_end_stop(&self) {
        self.status.acknowledge_end_stop();
    }

    /// Establishes the commanded position without emitting motion, e.g.
    /// after homing. Only meaningful while idle.
    pub fn set_position(&mut self, pt: &AxisFloats, geom: &dyn RobotGeometry) {
        let mut actuator = AxisFloats::new();
        geom.pt_to_actuator(pt, &mut actuator, &self.position, &self.params, true);
        for axis in 0..MAX_AXES {
            if !pt.is_valid(axis) {
                continue;
            }
            let steps =
                mathf::round(actuator.val(axis) as f64 * self.params.steps_per_mm(axis) as f64)
                    as i32;
            self.position.set_axis(axis, pt.val(axis) as f64, steps);
        }
        self.junction_chain_valid = false;
    }

    /// Plans one logical move, appending zero or more blocks and advancing
    /// the commanded position to the final target.
    ///
    /// Never blocks: a full pipeline yields [`PlannerError::Busy`] with no
    /// state change; the caller retries later.
    pub fn move_to(
        &mut self,
        args: &RobotCommandArgs,
        geom: &dyn RobotGeometry,
    ) -> Result<(), PlannerError> {
        if args.pause {
            self.status.set_paused(true);
        }
        if let Some(feedrate) = args.feedrate_mm_s {
            self.last_commanded_feedrate = Some(feedrate);
        }
        if !args.any_valid() {
            // Feedrate-only (or pause-only) commands succeed without motion.
            return if args.feedrate_mm_s.is_some() || args.pause {
                Ok(())
            } else {
                Err(PlannerError::InvalidArgs)
            };
        }

        // After an end-stop abort only moves that test end-stops (homing)
        // are accepted until the latch is acknowledged.
        if self.status.end_stop_reached() && !args.endstops.any() {
            return Err(PlannerError::Busy);
        }

        let relative = args.move_type == MoveType::Relative;
        let mut target_pt = AxisFloats::new();
        for axis in 0..MAX_AXES {
            if !args.is_valid(axis) {
                continue;
            }
            let commanded = if args.units_are_steps {
                args.pt_steps.val(axis) as f32 / self.params.steps_per_mm(axis)
            } else {
                args.pt_mm.val(axis)
            };
            let val = if relative {
                self.position.mm[axis] as f32 + commanded
            } else {
                commanded
            };
            target_pt.set_val(axis, val);
        }

        // Soft-limit check on the final target.
        let mut actuator_final = AxisFloats::new();
        let in_bounds = geom.pt_to_actuator(
            &target_pt,
            &mut actuator_final,
            &self.position,
            &self.params,
            args.allow_out_of_bounds,
        );
        if !in_bounds && !args.allow_out_of_bounds {
            return Err(PlannerError::OutOfBounds);
        }

        // Euclidean distance over primary axes, in point space.
        let start_mm = self.position.mm;
        let mut dist_sq = 0.0f64;
        for axis in 0..MAX_AXES {
            if !self.params.is_primary(axis) {
                continue;
            }
            let target = if target_pt.is_valid(axis) {
                target_pt.val(axis) as f64
            } else {
                start_mm[axis]
            };
            let delta = target - start_mm[axis];
            dist_sq += delta * delta;
        }
        let move_dist_mm = mathf::sqrt(dist_sq);

        if move_dist_mm < MotionBlock::MINIMUM_MOVE_DIST_MM {
            let mut any_steps = false;
            for axis in 0..MAX_AXES {
                let target_steps = mathf::round(
                    actuator_final.val(axis) as f64 * self.params.steps_per_mm(axis) as f64,
                ) as i32;
                if target_steps != self.position.steps[axis] {
                    any_steps = true;
                }
            }
            if !any_steps {
                return Err(PlannerError::TooSmall);
            }
        }

        // Split long moves so curved geometries stay linearised.
        let block_dist = self.params.block_distance_mm as f64;
        let num_blocks = if args.dont_split_move || block_dist <= 0.0 {
            1
        } else {
            (mathf::ceilf((move_dist_mm / block_dist) as f32) as usize).max(1)
        };
        if num_blocks > self.pipeline.free_slots() {
            return Err(PlannerError::Busy);
        }

        let feedrate = args
            .feedrate_mm_s
            .or(self.last_commanded_feedrate)
            .unwrap_or_else(|| self.default_feedrate());

        critical_section::with(|_| -> Result<(), PlannerError> {
            for sub in 1..=num_blocks {
                let frac = sub as f32 / num_blocks as f32;
                let mut sub_pt = AxisFloats::new();
                for axis in 0..MAX_AXES {
                    let from = start_mm[axis] as f32;
                    let to = if target_pt.is_valid(axis) {
                        target_pt.val(axis)
                    } else {
                        from
                    };
                    sub_pt.set_val(axis, from + (to - from) * frac);
                }

                let mut actuator = AxisFloats::new();
                let sub_in_bounds = geom.pt_to_actuator(
                    &sub_pt,
                    &mut actuator,
                    &self.position,
                    &self.params,
                    args.allow_out_of_bounds,
                );
                if !sub_in_bounds && !args.allow_out_of_bounds {
                    return Err(PlannerError::OutOfBounds);
                }

                self.append_block(&sub_pt, &actuator, feedrate, args, sub == num_blocks)?;
            }
            self.recalculate_pipeline(!args.more_moves_coming);
            Ok(())
        })?;

        geom.correct_step_overflow(&mut self.position, &self.params);
        self.publish_deadline_ms = None;
        Ok(())
    }

    /// Main-loop pump. Publishes a held-back newest block once it has waited
    /// longer than [`BLOCK_PUBLISH_TIMEOUT_MS`] for a successor.
    pub fn service(&mut self, now_ms: u32) {
        let held_back = match self.pipeline.peek_head_n(0) {
            Some(block) => !block.can_execute() && !block.is_executing(),
            None => false,
        };
        if !held_back {
            self.publish_deadline_ms = None;
            return;
        }
        match self.publish_deadline_ms {
            None => {
                self.publish_deadline_ms = Some(now_ms.wrapping_add(BLOCK_PUBLISH_TIMEOUT_MS));
            }
            Some(deadline) => {
                if (now_ms.wrapping_sub(deadline) as i32) >= 0 {
                    self.flush();
                }
            }
        }
    }

    /// Publishes everything queued, planning the newest block to a stop.
    pub fn flush(&mut self) {
        critical_section::with(|_| self.recalculate_pipeline(true));
        self.publish_deadline_ms = None;
    }

    /// Fallback feedrate when a command carries none and none was ever
    /// given: the slowest primary-axis maximum.
    fn default_feedrate(&self) -> f32 {
        let mut feedrate = f32::MAX;
        for axis in 0..MAX_AXES {
            if self.params.is_primary(axis) {
                feedrate = feedrate.min(self.params.max_speed(axis));
            }
        }
        if feedrate == f32::MAX {
            self.params.max_speed(0)
        } else {
            feedrate
        }
    }

    /// Fills one block from the sub-target and appends it. Advances the
    /// commanded position by exactly the emitted steps so rounding residue
    /// never accumulates.
    fn append_block(
        &mut self,
        sub_pt: &AxisFloats,
        actuator: &AxisFloats,
        feedrate_req: f32,
        args: &RobotCommandArgs,
        is_last: bool,
    ) -> Result<(), PlannerError> {
        // Distance and per-axis deltas from the current commanded position,
        // in point space, before the position advances.
        let mut deltas_mm = [0.0f32; MAX_AXES];
        let mut dist_sq = 0.0f64;
        for axis in 0..MAX_AXES {
            let delta = sub_pt.val(axis) as f64 - self.position.mm[axis];
            deltas_mm[axis] = delta as f32;
            if self.params.is_primary(axis) {
                dist_sq += delta * delta;
            }
        }
        let dist_mm = mathf::sqrt(dist_sq) as f32;

        let mut block = MotionBlock::new();
        let mut master = 0;
        let mut master_steps = 0u32;
        for axis in 0..MAX_AXES {
            let target_steps = mathf::round(
                actuator.val(axis) as f64 * self.params.steps_per_mm(axis) as f64,
            ) as i32;
            let step_delta = target_steps - self.position.steps[axis];
            block.set_steps_to_target(axis, step_delta);
            self.position.steps[axis] = target_steps;
            self.position.mm[axis] = sub_pt.val(axis) as f64;
            if step_delta.unsigned_abs() > master_steps {
                master_steps = step_delta.unsigned_abs();
                master = axis;
            }
        }
        if master_steps == 0 {
            // Below one step everywhere; the position still advanced.
            return Ok(());
        }
        block.axis_with_max_steps = master;
        block.dist_primary_mm = dist_mm;

        // Feedrate and ramp acceleration bounded by every moving axis.
        let mut feedrate = feedrate_req;
        let mut accel = f32::MAX;
        for axis in 0..MAX_AXES {
            if block.steps_to_target(axis) == 0 {
                continue;
            }
            feedrate = feedrate.min(self.params.max_speed(axis));
            accel = accel.min(self.params.max_accel(axis));
        }
        block.feedrate_mm_s = feedrate.max(0.01);
        block.accel_mm_s2 = accel;
        block.endstops_to_check = args.endstops;
        block.numbered_command_index = if is_last {
            args.numbered_command_index
        } else {
            NUMBERED_COMMAND_NONE
        };

        let tiny = MotionBlock::MINIMUM_MOVE_DIST_MM as f32;
        let mut unit_vec = [0.0f32; MAX_AXES];
        if dist_mm > tiny {
            for axis in 0..MAX_AXES {
                if self.params.is_primary(axis) {
                    unit_vec[axis] = deltas_mm[axis] / dist_mm;
                }
            }
        }

        // Junction-deviation entry cap against the previous block's
        // direction; a block starting from an empty pipeline starts at rest.
        let mut max_entry = 0.0f32;
        if !self.pipeline.is_empty() && self.junction_chain_valid && dist_mm > tiny {
            max_entry = self
                .junction_speed(&unit_vec, block.accel_mm_s2)
                .min(block.feedrate_mm_s);
            if let Some(prev) = self.pipeline.peek_head_n(0) {
                max_entry = max_entry.min(prev.feedrate_mm_s);
            }
        }
        block.max_entry_speed_mm_s = max_entry;

        if let Some(prev) = self.pipeline.peek_head_n_mut(0) {
            if !prev.is_executing() {
                prev.block_is_followed = true;
            }
        }
        self.pipeline.append(block).map_err(|_| PlannerError::Busy)?;

        self.junction_chain_valid = dist_mm > tiny;
        if self.junction_chain_valid {
            self.prev_unit_vec = unit_vec;
        }
        Ok(())
    }

    /// Maximum cornering speed between the previous direction and
    /// `unit_vec`, from the configured junction deviation.
    fn junction_speed(&self, unit_vec: &[f32; MAX_AXES], accel: f32) -> f32 {
        let mut dot = 0.0f32;
        for axis in 0..MAX_AXES {
            if self.params.is_primary(axis) {
                dot += self.prev_unit_vec[axis] * unit_vec[axis];
            }
        }
        // Angle convention follows the deviation-circle derivation: theta is
        // the turn, cos(theta) = -dot for colinear continuation = -1.
        let cos_theta = -dot;
        if cos_theta < -0.999 {
            // Straight continuation; no junction limit.
            return f32::INFINITY;
        }
        if cos_theta > 0.999 {
            // Full reversal.
            return 0.0;
        }
        let sin_half = mathf::sqrtf((1.0 - cos_theta) / 2.0);
        if sin_half >= 1.0 {
            return 0.0;
        }
        let v_sq = accel * self.params.junction_deviation_mm * sin_half / (1.0 - sin_half);
        mathf::sqrtf(v_sq.max(0.0))
    }

    /// Backward/forward lookahead over the non-executing tail, then stepping
    /// preparation and publication. Caller holds the planner critical
    /// section.
    fn recalculate_pipeline(&mut self, publish_all: bool) {
        let pipeline = self.pipeline;
        let count = pipeline.count();

        // Window of blocks still open to re-planning: newest back to (not
        // including) the first executing block.
        let mut plannable = 0;
        while plannable < count {
            match pipeline.peek_head_n(plannable) {
                Some(block) if !block.is_executing() => plannable += 1,
                _ => break,
            }
        }
        if plannable == 0 {
            return;
        }

        // Exit speed already committed by whatever precedes the window.
        let prior_exit = if plannable < count {
            pipeline
                .peek_head_n(plannable)
                .map(|block| block.exit_speed_mm_s)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        // Backward pass: propagate the stop at the tail towards older
        // blocks.
        let mut next_entry = 0.0f32;
        for i in 0..plannable {
            if let Some(block) = pipeline.peek_head_n_mut(i) {
                let exit = if i == 0 { 0.0 } else { next_entry };
                block.exit_speed_mm_s = exit;
                let reachable = MotionBlock::max_achievable_speed(
                    block.accel_mm_s2,
                    exit,
                    block.dist_primary_mm,
                );
                block.entry_speed_mm_s = block
                    .max_entry_speed_mm_s
                    .min(reachable)
                    .min(block.feedrate_mm_s);
                next_entry = block.entry_speed_mm_s;
            }
        }

        // Forward pass: cap what acceleration can actually deliver.
        let mut prev_exit = prior_exit;
        for i in (0..plannable).rev() {
            if let Some(block) = pipeline.peek_head_n_mut(i) {
                block.entry_speed_mm_s = block.entry_speed_mm_s.min(prev_exit);
                let reachable = MotionBlock::max_achievable_speed(
                    block.accel_mm_s2,
                    block.entry_speed_mm_s,
                    block.dist_primary_mm,
                );
                block.exit_speed_mm_s = block.exit_speed_mm_s.min(reachable);
                prev_exit = block.exit_speed_mm_s;
            }
        }

        // Stepping preparation and publication. The newest block is held
        // back while a successor is expected.
        for i in (0..plannable).rev() {
            if let Some(block) = pipeline.peek_head_n_mut(i) {
                if i == 0 && !publish_all && !block.block_is_followed {
                    continue;
                }
                block.prepare_for_stepping(&self.params);
                block.set_can_execute();
            }
        }
    }
}
