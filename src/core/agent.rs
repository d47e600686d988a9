// core/agent.rs

// Agent runtime: the single owner of the turtle's pose, goal, step counter and
// cumulative reward. States and the controller only reach these through the
// entry points below. Also owns episode respawn, the step budget and the
// optional recorder / visual collaborators.

use log::{debug, info, warn};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::{distance, forward, normalize_heading};
use crate::config::AgentConfig;
use crate::metrics::{AgentSnapshot, EpisodeRecorder, SharedRecorder};
use crate::render::{GroundFlash, IndicatorColor, Rgb, VisualSink};

/// Position and heading on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Ground-plane position (x, z)
    pub position: Vector2<f32>,
    /// Heading in degrees, [0, 360)
    pub heading: f32,
}

impl Pose {
    /// Pose at `position` with a normalised heading
    pub fn new(position: Vector2<f32>, heading: f32) -> Self {
        Pose {
            position,
            heading: normalize_heading(heading),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::new(Vector2::zeros(), 0.0)
    }
}

/// Per-entity runtime persisted across episodes
pub struct AgentRuntime {
    config: AgentConfig,
    spawn: Pose,
    pose: Pose,
    goal: Option<Vector2<f32>>,
    step: u32,
    cumulative_reward: f32,
    episode_time: f32,
    active: bool,
    indicator: IndicatorColor,
    flash: GroundFlash,
    rng: StdRng,
    recorder: Option<SharedRecorder>,
    visuals: Option<Box<dyn VisualSink + Send>>,
}

impl AgentRuntime {
    /// Creates a runtime at the origin, facing +z, with no goal yet
    pub fn new(config: AgentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        AgentRuntime {
            config,
            spawn: Pose::default(),
            pose: Pose::default(),
            goal: None,
            step: 0,
            cumulative_reward: 0.0,
            episode_time: 0.0,
            active: true,
            indicator: IndicatorColor::Default,
            flash: GroundFlash::new(Rgb::GREY),
            rng,
            recorder: None,
            visuals: None,
        }
    }

    /// Attaches an episode recorder
    pub fn with_recorder(mut self, recorder: SharedRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Attaches a render sink; `neutral_ground` is what flashes fade back to
    pub fn with_visuals(mut self, visuals: Box<dyn VisualSink + Send>, neutral_ground: Rgb) -> Self {
        self.visuals = Some(visuals);
        self.flash = GroundFlash::new(neutral_ground);
        self
    }

    /// Moves the spawn point used by every respawn
    pub fn with_spawn(mut self, spawn: Pose) -> Self {
        self.spawn = spawn;
        self.pose = spawn;
        self
    }

    /// Resets counters, respawns pose and goal and opens the first episode
    pub fn start(&mut self) {
        info!("Turtle agent starting");
        self.clear_episode();
        self.respawn();
        self.notify_recorder(|recorder, snapshot| recorder.on_episode_start(snapshot));
    }

    // ---- queries ----------------------------------------------------------

    /// Current pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Current ground-plane position
    pub fn position(&self) -> Vector2<f32> {
        self.pose.position
    }

    /// Current heading in degrees
    pub fn heading(&self) -> f32 {
        self.pose.heading
    }

    /// Goal position, if one is assigned
    pub fn goal_position(&self) -> Option<Vector2<f32>> {
        self.goal
    }

    /// Distance to the goal; infinity when no goal is assigned
    pub fn distance_to_goal(&self) -> f32 {
        self.goal
            .map(|goal| distance(&self.pose.position, &goal))
            .unwrap_or(f32::INFINITY)
    }

    /// Steps taken in the current episode
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Step budget per episode
    pub fn max_steps(&self) -> u32 {
        self.config.max_steps
    }

    /// Reward accumulated in the current episode
    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    /// Forward speed in units per second
    pub fn move_speed(&self) -> f32 {
        self.config.move_speed
    }

    /// Turn rate in degrees per second
    pub fn rotation_speed(&self) -> f32 {
        self.config.rotation_speed
    }

    /// False once the step budget has been exhausted
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current indicator colour
    pub fn indicator(&self) -> IndicatorColor {
        self.indicator
    }

    /// Whether the end-of-episode ground flash is still fading
    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    /// Snapshot handed to recorders
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            position: self.pose.position,
            heading: self.pose.heading,
            goal: self.goal,
            step: self.step,
            cumulative_reward: self.cumulative_reward,
            episode_time: self.episode_time,
        }
    }

    // ---- mutation entry points -------------------------------------------

    /// The only way to change the cumulative reward
    pub fn add_reward(&mut self, delta: f32) {
        self.cumulative_reward += delta;
        if self.config.enable_reward_logs {
            debug!("Reward added: {}. Cumulative: {}", delta, self.cumulative_reward);
        }
    }

    /// Charges the per-decision cost, `-2 / max_steps`
    pub fn add_step_penalty(&mut self) {
        self.add_reward(-2.0 / self.config.max_steps as f32);
    }

    /// Drives `distance` units along the current heading
    pub fn advance(&mut self, distance: f32) {
        self.pose.position += forward(self.pose.heading) * distance;
    }

    /// Turns by `degrees`; positive is clockwise
    pub fn rotate(&mut self, degrees: f32) {
        self.pose.heading = normalize_heading(self.pose.heading + degrees);
    }

    /// Host-side pose override, e.g. pushing the turtle back out of a wall
    pub fn set_position(&mut self, position: Vector2<f32>) {
        self.pose.position = position;
    }

    /// Places the turtle; the heading is normalised
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = Pose::new(pose.position, pose.heading);
    }

    /// Assigns or clears the goal
    pub fn set_goal(&mut self, goal: Option<Vector2<f32>>) {
        self.goal = goal;
    }

    /// Sets the indicator and forwards it to the render sink
    pub fn set_indicator(&mut self, color: IndicatorColor) {
        self.indicator = color;
        if let Some(visuals) = self.visuals.as_mut() {
            visuals.set_indicator(color);
        }
    }

    /// Reports a wall collision to the recorder
    pub fn notify_collision(&mut self) {
        self.notify_recorder(|recorder, _| recorder.on_collision());
    }

    /// One logic tick: count the step, sample, advance the flash, and end the
    /// episode as a failure once the budget is spent.
    pub fn tick(&mut self, dt: f32) {
        if !self.active {
            return;
        }

        self.step += 1;
        self.episode_time += dt;
        self.notify_recorder(|recorder, snapshot| recorder.sample(snapshot));

        if let Some(color) = self.flash.advance(dt) {
            if let Some(visuals) = self.visuals.as_mut() {
                visuals.set_ground_color(color);
            }
        }

        if self.step >= self.config.max_steps {
            info!("Max steps reached ({}), stopping agent", self.config.max_steps);
            self.notify_recorder(|recorder, snapshot| {
                recorder.on_episode_end(false, snapshot);
                recorder.disable();
            });
            self.active = false;
        }
    }

    /// Closes the current episode: reports it and starts the ground flash
    pub(crate) fn finish_episode(&mut self, success: bool) {
        self.notify_recorder(|recorder, snapshot| recorder.on_episode_end(success, snapshot));

        if self.visuals.is_some() && self.cumulative_reward != 0.0 {
            let target = if self.cumulative_reward > 0.0 { Rgb::GREEN } else { Rgb::RED };
            let shown = self.flash.start(target, self.config.flash_duration);
            if let Some(visuals) = self.visuals.as_mut() {
                visuals.set_ground_color(shown);
            }
        }
    }

    /// Opens a fresh episode: zero counters, respawn, notify the recorder
    pub(crate) fn begin_episode(&mut self) {
        self.clear_episode();
        self.respawn();
        self.notify_recorder(|recorder, snapshot| recorder.on_episode_start(snapshot));
    }

    fn clear_episode(&mut self) {
        self.step = 0;
        self.cumulative_reward = 0.0;
        self.episode_time = 0.0;
        self.set_indicator(IndicatorColor::Default);
    }

    // Agent back to its spawn pose, goal somewhere in the spawn annulus
    fn respawn(&mut self) {
        self.pose = self.spawn;

        let bearing = self.rng.gen_range(0.0..360.0);
        let (min, max) = (self.config.goal_min_distance, self.config.goal_max_distance);
        let radius = if max > min { self.rng.gen_range(min..max) } else { min };

        let goal = self.pose.position + forward(bearing) * radius;
        self.goal = Some(goal);
        debug!(
            "Respawned at ({:.2}, {:.2}), goal at ({:.2}, {:.2})",
            self.pose.position.x, self.pose.position.y, goal.x, goal.y
        );
    }

    fn notify_recorder<F>(&self, notify: F)
    where
        F: FnOnce(&mut dyn EpisodeRecorder, &AgentSnapshot),
    {
        let Some(recorder) = self.recorder.as_ref() else {
            return;
        };
        let snapshot = self.snapshot();
        match recorder.lock() {
            Ok(mut guard) => notify(&mut *guard, &snapshot),
            Err(_) => warn!("Recorder lock poisoned, dropping notification"),
        }
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("pose", &self.pose)
            .field("goal", &self.goal)
            .field("step", &self.step)
            .field("max_steps", &self.config.max_steps)
            .field("cumulative_reward", &self.cumulative_reward)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn agent(max_steps: u32) -> AgentRuntime {
        AgentRuntime::new(AgentConfig {
            max_steps,
            seed: Some(3),
            ..AgentConfig::default()
        })
    }

    #[test]
    fn distance_without_goal_is_infinite() {
        let agent = agent(100);
        assert_eq!(agent.goal_position(), None);
        assert!(agent.distance_to_goal().is_infinite());
    }

    #[test]
    fn step_penalty_scales_with_budget() {
        let mut agent = agent(200);
        agent.add_step_penalty();
        assert_relative_eq!(agent.cumulative_reward(), -0.01);
    }

    #[test]
    fn advance_and_rotate_follow_heading() {
        let mut agent = agent(100);
        agent.rotate(90.0);
        agent.advance(2.0);
        assert_relative_eq!(agent.position().x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(agent.position().y, 0.0, epsilon = 1e-5);

        agent.rotate(-180.0);
        assert_relative_eq!(agent.heading(), 270.0);
    }

    #[test]
    fn respawn_places_goal_in_annulus() {
        let mut agent = agent(100);
        for _ in 0..200 {
            agent.begin_episode();
            let d = agent.distance_to_goal();
            assert!(d >= 1.0 - 1e-4 && d <= 2.5 + 1e-4, "goal distance {}", d);
        }
    }

    #[test]
    fn respawn_uses_custom_spawn_point() {
        let spawn = Pose::new(Vector2::new(1.0, -2.0), 450.0);
        let mut agent = agent(100).with_spawn(spawn);
        assert_eq!(agent.position(), Vector2::new(1.0, -2.0));
        assert_relative_eq!(agent.heading(), 90.0);

        agent.start();
        for _ in 0..200 {
            agent.advance(0.7);
            agent.rotate(33.0);
            agent.begin_episode();
            assert_eq!(agent.pose(), spawn);
            let d = agent.distance_to_goal();
            assert!(d >= 1.0 - 1e-4 && d <= 2.5 + 1e-4, "goal distance {}", d);
        }
    }

    #[test]
    fn budget_exhaustion_deactivates() {
        let mut agent = agent(3);
        agent.start();
        for _ in 0..10 {
            agent.tick(0.02);
        }
        assert!(!agent.is_active());
        assert_eq!(agent.step(), 3);
    }
}
