//! Plans a square plot and runs the actuator over simulated hardware,
//! reporting pulse counts, timing stats and the tick trace.
//!
//! ```text
//! cargo run -p sim --example run_sim -- --side-mm 40 --feedrate 25
//! cargo run -p sim --example run_sim -- --config robot.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use motion::instrumentation::{TickTrace, TraceEvent, TraceKind};
use motion::{
    AxesParams, MotionBlock, MotionPipeline, MotionPlanner, MotionStatus, RobotCommandArgs,
    StepActuator, XYBotGeometry,
};
use sim::{run_until_idle, SimStepHal};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Motion core simulation: plan a square, run the tick loop")]
struct Cli {
    /// Robot description (AxesParams as JSON); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Feedrate for the plotted square, mm/s.
    #[arg(long, default_value_t = 25.0)]
    feedrate: f32,

    /// Side length of the plotted square, mm.
    #[arg(long, default_value_t = 40.0)]
    side_mm: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let params: AxesParams = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text).context("failed to parse axes config")?
        }
        None => AxesParams::default(),
    };

    let pipeline: MotionPipeline<32> = MotionPipeline::new();
    let status = MotionStatus::new();
    let trace = TickTrace::new();

    let mut planner = MotionPlanner::new(&pipeline, &status, params);
    let mut actuator = StepActuator::new(&pipeline, &status, SimStepHal::new());
    actuator.attach_trace(&trace);
    let geom = XYBotGeometry;

    let side = cli.side_mm;
    let corners = [(side, 0.0), (side, side), (0.0, side), (0.0, 0.0)];
    for (i, (x, y)) in corners.iter().enumerate() {
        let mut args = RobotCommandArgs::new();
        args.set_axis_val_mm(0, *x);
        args.set_axis_val_mm(1, *y);
        args.set_feedrate(cli.feedrate);
        args.more_moves_coming = i + 1 < corners.len();
        args.numbered_command_index = i as i32 + 1;
        planner
            .move_to(&args, &geom)
            .with_context(|| format!("planning corner {}", i + 1))?;
        info!(corner = i + 1, x, y, queued = pipeline.count(), "planned");
    }

    let ticks = run_until_idle(&mut actuator, &pipeline, 200_000_000)?;
    let wall_ms = ticks * MotionBlock::TICK_INTERVAL_NS as u64 / 1_000_000;

    let hal = actuator.hw();
    info!(
        ticks,
        wall_ms,
        x_pulses = hal.step_count(0),
        y_pulses = hal.step_count(1),
        min_pulse_ticks = hal.min_pulse_ticks().unwrap_or(0),
        max_pulse_ticks = hal.max_pulse_ticks().unwrap_or(0),
        violations = hal.violations(),
        last_completed = planner.last_completed_numbered_command(),
        "square finished"
    );

    let mut events = [TraceEvent::default(); 256];
    let n = trace.snapshot(&mut events);
    let steps = events[..n]
        .iter()
        .filter(|e| e.kind == TraceKind::StepStart)
        .count();
    info!(
        recorded = trace.total_recorded(),
        window = n,
        step_events = steps,
        "tick trace"
    );

    Ok(())
}
