//! Headless host for the turtle controller
//!
//! [`Simulation`] plays the role of the frame driver: once per frame it ticks
//! the agent, then the controller, then runs as many fixed physics steps as
//! the frame covers, feeding contacts from the [`Arena`] back into the
//! controller after each one.

mod arena;

pub use arena::Arena;

use log::{info, warn};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::{SimConfig, TurtleConfig};
use crate::core::AgentRuntime;
use crate::metrics::{MetricsSummary, SharedRecorder, TurtleMetrics};
use crate::navigation::Controller;
use crate::render::{HeadlessVisuals, Rgb};
use crate::TurtleError;

/// One turtle in one arena
pub struct Simulation {
    config: SimConfig,
    agent: AgentRuntime,
    controller: Controller,
    arena: Arena,
    metrics: Option<Arc<Mutex<TurtleMetrics>>>,
    physics_accumulator: f32,
    frames: u64,
}

impl Simulation {
    /// Validates the configuration and opens the first episode
    pub fn new(config: &TurtleConfig) -> Result<Self, TurtleError> {
        config.validate()?;

        let mut agent = AgentRuntime::new(config.agent.clone())
            .with_visuals(Box::new(HeadlessVisuals::new(Rgb::GREY)), Rgb::GREY);

        let metrics = if config.metrics.enabled {
            let metrics = crate::metrics::shared(TurtleMetrics::new(&config.metrics));
            let recorder: SharedRecorder = metrics.clone();
            agent = agent.with_recorder(recorder);
            Some(metrics)
        } else {
            None
        };

        agent.start();
        info!("Simulation ready: frame dt {:.4}s, physics dt {:.4}s", config.sim.frame_dt, config.sim.physics_dt);

        Ok(Simulation {
            config: config.sim.clone(),
            agent,
            controller: Controller::new(config.controller.clone()),
            arena: Arena::new(&config.sim),
            metrics,
            physics_accumulator: 0.0,
            frames: 0,
        })
    }

    /// Advances one frame. Returns false without doing anything once the
    /// agent has stopped.
    pub fn step_frame(&mut self) -> bool {
        if !self.agent.is_active() {
            return false;
        }
        let frame_dt = self.config.frame_dt;
        let physics_dt = self.config.physics_dt;

        self.agent.tick(frame_dt);
        self.controller.tick(&mut self.agent, frame_dt);

        self.physics_accumulator += frame_dt;
        while self.physics_accumulator >= physics_dt {
            self.physics_accumulator -= physics_dt;
            self.controller.physics_tick(&mut self.agent, physics_dt);
            for event in self.arena.detect(&mut self.agent) {
                self.controller.handle_event(event, &mut self.agent);
            }
        }

        self.frames += 1;
        true
    }

    /// Runs up to `max_frames` frames, stopping early once the agent stops.
    /// Returns the number of frames actually run.
    pub fn run(&mut self, max_frames: u64) -> u64 {
        let mut ran = 0;
        while ran < max_frames && self.step_frame() {
            ran += 1;
        }
        info!("Simulation ran {} frames ({} total)", ran, self.frames);
        ran
    }

    /// Frames run since creation
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Agent runtime
    pub fn agent(&self) -> &AgentRuntime {
        &self.agent
    }

    /// Mutable agent runtime, for placing the turtle by hand
    pub fn agent_mut(&mut self) -> &mut AgentRuntime {
        &mut self.agent
    }

    /// FSM driver
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Mutable FSM driver, for manual input
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Arena geometry and contact state
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Metrics recorder, when enabled
    pub fn metrics(&self) -> Option<&Arc<Mutex<TurtleMetrics>>> {
        self.metrics.as_ref()
    }

    /// Copy of the current metrics summary
    pub fn metrics_summary(&self) -> Option<MetricsSummary> {
        let metrics = self.metrics.as_ref()?;
        match metrics.lock() {
            Ok(guard) => Some(guard.summary().clone()),
            Err(_) => {
                warn!("Recorder lock poisoned, summary unavailable");
                None
            }
        }
    }

    /// Logs the metrics summary, if metrics are enabled
    pub fn log_summary(&self) {
        if let Some(metrics) = self.metrics.as_ref() {
            match metrics.lock() {
                Ok(guard) => guard.log_summary(),
                Err(_) => warn!("Recorder lock poisoned, summary unavailable"),
            }
        }
    }

    /// Writes recorded metrics to a YAML file; a no-op without metrics
    pub fn export_metrics<P: AsRef<Path>>(&self, path: P) -> Result<(), TurtleError> {
        let Some(metrics) = self.metrics.as_ref() else {
            warn!("Metrics disabled, nothing to export");
            return Ok(());
        };
        let guard = metrics.lock().map_err(|_| TurtleError::RecorderPoisoned)?;
        guard.export_yaml(path)?;
        Ok(())
    }

    /// Tears the controller down; later frames still tick the agent but the
    /// FSM no longer reacts
    pub fn shutdown(&mut self) {
        self.controller.shutdown(&mut self.agent);
        self.arena.clear_contacts();
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frames", &self.frames)
            .field("agent", &self.agent)
            .field("controller", &self.controller)
            .field("arena", &self.arena)
            .finish()
    }
}
