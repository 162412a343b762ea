use anyhow::{bail, Context};
use clap::Parser;
use floorplan_acoustics::{
    init_tracing, mask, render, InputEvent, LoopState, MouseButton, Orchestrator, SimConfig,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Run the acoustic simulation without a window
#[derive(Parser, Debug)]
#[command(name = "acoustics-headless")]
#[command(about = "Headless floor-plan acoustic simulation", long_about = None)]
struct Args {
    /// Floor-plan image; dark strokes become walls. Omit for open air.
    #[arg(short, long)]
    floorplan: Option<PathBuf>,

    /// TOML file overriding the simulation constants
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of rendered frames to simulate
    #[arg(short = 'n', long, default_value_t = 300)]
    frames: u64,

    /// Normalized click position `x,y` applied before the first frame (repeatable)
    #[arg(long = "click", value_parser = parse_click)]
    clicks: Vec<(f32, f32)>,

    /// Log field statistics every N frames
    #[arg(short, long, default_value_t = 30)]
    report_interval: u64,

    /// Write the final color buffer to this PNG
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

fn parse_click(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got '{s}'"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
    Ok((x, y))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => SimConfig::default(),
    };
    config.log_summary();

    let walls = mask::acquire(args.floorplan.as_deref(), config.width(), config.height());
    let mut orchestrator = Orchestrator::new(config, walls)?;

    let clicks = if args.clicks.is_empty() {
        vec![(0.5, 0.5)]
    } else {
        args.clicks.clone()
    };
    let mut events: VecDeque<InputEvent> = clicks
        .into_iter()
        .map(|position| InputEvent::Press {
            button: MouseButton::Primary,
            position,
        })
        .collect();

    let started = Instant::now();
    for _ in 0..args.frames {
        if orchestrator.run_frame(&mut events)? == LoopState::Terminated {
            break;
        }
        let frame = orchestrator.frame();
        if args.report_interval > 0 && frame % args.report_interval == 0 {
            info!(
                "frame {:>5}: peak |u| = {:.4}, energy = {:.4e}",
                frame,
                orchestrator.state().peak_amplitude(),
                orchestrator.stepper().energy(orchestrator.state())
            );
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    let steps = orchestrator.frame() * orchestrator.config().substeps_per_frame as u64;
    if steps == 0 {
        bail!("No frames were simulated");
    }
    info!(
        "Simulated {} frames ({} steps) in {:.2}s, {:.1} steps/s",
        orchestrator.frame(),
        steps,
        elapsed,
        steps as f64 / elapsed.max(f64::EPSILON)
    );

    if let Some(path) = &args.snapshot {
        render::to_rgb_image(orchestrator.pixels())
            .save(path)
            .with_context(|| format!("Failed to write snapshot '{}'", path.display()))?;
        info!("Saved final frame to {}", path.display());
    }

    Ok(())
}
