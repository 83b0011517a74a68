//! Cross-thread pipeline test: a planner thread produces blocks with
//! backpressure retries while the main thread ticks the actuator, exercising
//! the SPSC publication rules under real concurrency.

use std::sync::atomic::{AtomicBool, Ordering};

use motion::{
    AxesParams, MotionPipeline, MotionPlanner, MotionStatus, PlannerError, RobotCommandArgs,
    StepActuator, XYBotGeometry,
};
use sim::SimStepHal;

fn params() -> AxesParams {
    let mut params = AxesParams::default();
    for axis in params.axes.iter_mut() {
        axis.steps_per_mm = 80.0;
        axis.max_accel_mm_s2 = 200.0;
        axis.max_speed_mm_s = 60.0;
    }
    params
}

#[test]
fn planner_thread_feeds_ticking_actuator() {
    const MOVES: i32 = 24;

    let pipeline: MotionPipeline<8> = MotionPipeline::new();
    let status = MotionStatus::new();
    let producer_done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            let mut planner = MotionPlanner::new(&pipeline, &status, params());
            let geom = XYBotGeometry;
            for i in 1..=MOVES {
                let mut args = RobotCommandArgs::new();
                args.set_axis_val_mm(0, i as f32 * 0.5);
                args.set_feedrate(40.0);
                args.more_moves_coming = i != MOVES;
                loop {
                    match planner.move_to(&args, &geom) {
                        Ok(()) => break,
                        Err(PlannerError::Busy) => std::thread::yield_now(),
                        Err(err) => panic!("unexpected planner error: {err}"),
                    }
                }
            }
            assert_eq!(planner.position().steps[0], MOVES * 40);
            producer_done.store(true, Ordering::Release);
        });

        let mut actuator = StepActuator::new(&pipeline, &status, SimStepHal::new());
        let mut ticks: u64 = 0;
        while !(producer_done.load(Ordering::Acquire) && pipeline.is_empty()) {
            actuator.hw_mut().note_tick();
            actuator.tick();
            ticks += 1;
            assert!(ticks < 100_000_000, "simulation runaway");
        }
        // Let a pending step-end complete.
        actuator.hw_mut().note_tick();
        actuator.tick();

        let hal = actuator.hw();
        // 24 forward moves of 0.5mm at 80 steps/mm.
        assert_eq!(hal.step_count(0), (MOVES * 40) as u32);
        assert_eq!(hal.violations(), 0);
        assert!(hal.min_pulse_ticks().unwrap() >= 1);
        assert!(hal.max_pulse_ticks().unwrap() <= 2);
    });
}

#[test]
fn stop_from_producer_while_ticking() {
    let pipeline: MotionPipeline<8> = MotionPipeline::new();
    let status = MotionStatus::new();

    let mut planner = MotionPlanner::new(&pipeline, &status, params());
    let geom = XYBotGeometry;
    for i in 1..=4 {
        let mut args = RobotCommandArgs::new();
        args.set_axis_val_mm(0, i as f32 * 5.0);
        args.set_feedrate(40.0);
        planner.move_to(&args, &geom).unwrap();
    }

    let mut actuator = StepActuator::new(&pipeline, &status, SimStepHal::new());
    // Get the head block mid-flight.
    while actuator.hw().step_count(0) < 50 {
        actuator.hw_mut().note_tick();
        actuator.tick();
    }

    planner.stop();
    // Only the executing block survives; it runs to its planned end.
    assert_eq!(pipeline.count(), 1);
    let consumed = sim::run_until_idle(&mut actuator, &pipeline, 10_000_000).unwrap();
    assert!(consumed > 0);
    // The first 5mm block finished, nothing further ran.
    assert_eq!(actuator.hw().step_count(0), 400);
}
