//! Episode metrics for the turtle controller
//!
//! The core only talks to an [`EpisodeRecorder`]: fire-and-forget lifecycle
//! notifications plus one position sample per tick. [`TurtleMetrics`] is the
//! bundled implementation that keeps per-episode records and a running
//! summary.

mod recorder;

pub use recorder::{EpisodeRecord, MetricsError, MetricsSummary, TurtleMetrics};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Read-only view of the agent handed to recorders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Ground-plane position (x, z)
    pub position: Vector2<f32>,
    /// Heading in degrees, [0, 360)
    pub heading: f32,
    /// Goal position, if one is assigned
    pub goal: Option<Vector2<f32>>,
    /// Steps taken in the current episode
    pub step: u32,
    /// Cumulative reward of the current episode
    pub cumulative_reward: f32,
    /// Simulated seconds since the episode started
    pub episode_time: f32,
}

impl AgentSnapshot {
    /// Distance to the goal, or infinity without one
    pub fn distance_to_goal(&self) -> f32 {
        self.goal
            .map(|goal| crate::core::geometry::distance(&self.position, &goal))
            .unwrap_or(f32::INFINITY)
    }
}

/// Consumer of episode lifecycle events
///
/// Every method must return promptly; the core calls them from inside a
/// simulation tick.
pub trait EpisodeRecorder {
    /// A new episode has begun
    fn on_episode_start(&mut self, snapshot: &AgentSnapshot);

    /// The current episode finished
    fn on_episode_end(&mut self, success: bool, snapshot: &AgentSnapshot);

    /// The agent hit a wall
    fn on_collision(&mut self);

    /// Position sample, once per active tick
    fn sample(&mut self, _snapshot: &AgentSnapshot) {}

    /// Stop recording for good
    fn disable(&mut self) {}
}

/// Recorder handle shared between entities; one writer at a time
pub type SharedRecorder = Arc<Mutex<dyn EpisodeRecorder + Send>>;

/// Wraps a recorder into a [`SharedRecorder`]
pub fn shared<R: EpisodeRecorder + Send + 'static>(recorder: R) -> Arc<Mutex<R>> {
    Arc::new(Mutex::new(recorder))
}
