//! Turtle FSM - goal-seeking navigation controller for a simulated turtle
//!
//! This library provides a finite state machine that drives a turtle on a
//! ground plane toward a randomly placed goal while handling wall contacts,
//! together with the reward bookkeeping and episode lifecycle around it, an
//! episode metrics recorder and a headless host for running sessions.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// YAML configuration tree
pub mod config;
/// Geometry, controller modes and the agent runtime
pub mod core;
pub mod metrics;
pub mod navigation;
pub mod render;
pub mod sim;

// Re-export commonly used items for easier access
pub use config::{ConfigError, TurtleConfig};
pub use crate::core::{AgentRuntime, ControllerState, Pose};
pub use metrics::{EpisodeRecorder, MetricsError, SharedRecorder, TurtleMetrics};
pub use navigation::{ColliderTag, ContactEvent, Controller, ManualInput};
pub use render::{IndicatorColor, VisualSink};
pub use sim::Simulation;

/// Turtle FSM error types
#[derive(Debug, thiserror::Error)]
pub enum TurtleError {
    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Metrics could not be exported
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    /// A thread panicked while holding the recorder
    #[error("recorder lock poisoned")]
    RecorderPoisoned,
}
