//! Planner and tick-path benchmarks.
//!
//! The tick budget is the hard constraint: the actuator must stay a few
//! microseconds per call. The planner only needs tens of Hz, but lookahead
//! re-flow is O(queue) per move and worth watching.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use motion::{
    AxesParams, MotionPipeline, MotionPlanner, MotionStatus, RobotCommandArgs, StepActuator,
    StepHal, XYBotGeometry,
};

struct NullHal;

impl StepHal for NullHal {
    fn set_direction(&mut self, _axis: usize, _forward: bool) {}
    fn step_start(&mut self, _axis: usize) {}
    fn step_end(&mut self, _axis: usize) {}
    fn endstop_present(&self, _axis: usize, _end_idx: usize) -> bool {
        false
    }
    fn endstop_triggered(&mut self, _axis: usize, _end_idx: usize) -> Option<bool> {
        None
    }
}

fn bench_params() -> AxesParams {
    let mut params = AxesParams::default();
    for axis in params.axes.iter_mut() {
        axis.steps_per_mm = 80.0;
        axis.max_accel_mm_s2 = 1000.0;
        axis.max_speed_mm_s = 200.0;
    }
    params
}

fn plan_polygon(c: &mut Criterion) {
    c.bench_function("plan_16_segment_polygon", |b| {
        let pipeline: MotionPipeline<32> = MotionPipeline::new();
        let status = MotionStatus::new();
        let geom = XYBotGeometry;
        b.iter(|| {
            let mut planner = MotionPlanner::new(&pipeline, &status, bench_params());
            for i in 0..16u32 {
                let angle = i as f32 / 16.0 * core::f32::consts::TAU;
                let mut args = RobotCommandArgs::new();
                args.set_axis_val_mm(0, 30.0 * angle.cos());
                args.set_axis_val_mm(1, 30.0 * angle.sin());
                args.set_feedrate(150.0);
                args.more_moves_coming = i != 15;
                planner.move_to(&args, &geom).unwrap();
            }
            planner.stop();
        });
    });
}

fn actuator_tick(c: &mut Criterion) {
    c.bench_function("actuator_tick_mid_block", |b| {
        let pipeline: MotionPipeline<4> = MotionPipeline::new();
        let status = MotionStatus::new();
        let mut planner = MotionPlanner::new(&pipeline, &status, bench_params());
        let geom = XYBotGeometry;

        let mut args = RobotCommandArgs::new();
        args.set_axis_val_mm(0, 1000.0);
        args.set_axis_val_mm(1, 500.0);
        args.set_feedrate(200.0);
        planner.move_to(&args, &geom).unwrap();

        let mut actuator = StepActuator::new(&pipeline, &status, NullHal);
        // Claim the block and get into the stepping phase.
        actuator.tick();
        actuator.tick();

        b.iter(|| {
            actuator.tick();
            black_box(actuator.cur_rate_tticks());
        });
    });
}

criterion_group!(benches, plan_polygon, actuator_tick);
criterion_main!(benches);
