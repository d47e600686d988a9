// src/main.rs
// Entry point for turtle-fsm: runs a headless navigation session and reports
// episode metrics.

// Imports dependencies and turtle-fsm modules.
// - env_logger: Logging for debugging (RUST_LOG=debug shows FSM transitions).
// - turtle_fsm: Config loading and the headless simulation host.
use log::{error, info};
use std::error::Error;
use turtle_fsm::{Simulation, TurtleConfig};

/// Main function: loads an optional YAML config given as the first argument,
/// runs the session until the frame limit or the step budget, then logs and
/// optionally exports the metrics.
fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging for debugging
    env_logger::init();
    info!("Starting turtle FSM session...");

    let config = match std::env::args().nth(1) {
        Some(path) => TurtleConfig::from_yaml_file(&path)?,
        None => {
            info!("No config given, using defaults");
            TurtleConfig::default()
        }
    };

    let mut simulation = Simulation::new(&config)?;
    let frames = simulation.run(config.sim.max_frames);

    if !simulation.agent().is_active() {
        info!("Agent stopped after exhausting its step budget");
    }
    info!(
        "Finished after {} frames in state {}",
        frames,
        simulation.controller().current_state()
    );
    simulation.log_summary();

    if let Some(path) = config.metrics.export_path.as_ref() {
        if let Err(e) = simulation.export_metrics(path) {
            error!("Failed to export metrics: {}", e);
            return Err(e.into());
        }
        info!("Metrics written to {}", path.display());
    }

    simulation.shutdown();
    info!("Turtle FSM session completed");
    Ok(())
}
