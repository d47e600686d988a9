// metrics/recorder.rs

// Per-episode performance tracking for the turtle. Keeps the live episode
// (path points, collisions, direction changes) plus the finalized history and
// a summary averaged over successful episodes. History and summary can be
// exported to YAML.

use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use super::{AgentSnapshot, EpisodeRecorder};
use crate::config::MetricsConfig;
use crate::core::geometry::{distance, signed_angle_delta};

const DIRECTION_CHANGE_THRESHOLD: f32 = 5.0;
const MIN_SEGMENT_LENGTH: f32 = 0.01;

/// Finalized record of one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// 1-based episode number
    pub episode_number: u32,
    /// Whether the goal was reached
    pub success: bool,
    /// Spawn position
    pub start_position: Vector2<f32>,
    /// Position when the episode ended
    pub end_position: Vector2<f32>,
    /// Goal position at episode start
    pub goal_position: Option<Vector2<f32>>,
    /// Episode duration in simulated seconds
    pub total_time: f32,
    /// Steps taken
    pub total_steps: u32,
    /// Cumulative reward at the end
    pub final_reward: f32,
    /// Distance to the goal at the end
    pub final_distance_to_goal: f32,
    /// Wall collisions during the episode
    pub collision_count: u32,
    /// Heading changes larger than five degrees between samples
    pub direction_changes: u32,
    /// Straight-line distance over travelled distance, in [0, 1]
    pub path_efficiency: f32,
}

/// Aggregates over all recorded episodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Finalized episodes
    pub total_episodes: u32,
    /// Episodes that reached the goal
    pub successful_episodes: u32,
    /// Successful over total, in [0, 1]
    pub success_rate: f32,
    /// Mean episode time in seconds, successful episodes only
    pub avg_time_per_episode: f32,
    /// Mean step count, successful episodes only
    pub avg_steps_per_episode: f32,
    /// Mean final reward, successful episodes only
    pub avg_reward_per_episode: f32,
    /// Mean path efficiency, successful episodes only
    pub avg_path_efficiency: f32,
    /// Mean wall collisions, successful episodes only
    pub avg_collisions_per_episode: f32,
    /// Mean heading changes over 5 degrees, successful episodes only
    pub avg_direction_changes_per_episode: f32,
}

// Live tracking data for the episode currently being recorded
#[derive(Debug, Clone)]
struct LiveEpisode {
    number: u32,
    start_position: Vector2<f32>,
    goal_position: Option<Vector2<f32>>,
    collisions: u32,
    direction_changes: u32,
    last_heading: f32,
    path_points: Vec<Vector2<f32>>,
    last_path_point_time: f32,
    latest: AgentSnapshot,
}

impl LiveEpisode {
    fn distance_travelled(&self) -> f32 {
        let mut total: f32 = self
            .path_points
            .windows(2)
            .map(|pair| distance(&pair[0], &pair[1]))
            .filter(|segment| *segment > MIN_SEGMENT_LENGTH)
            .sum();

        if let Some(last) = self.path_points.last() {
            let tail = distance(last, &self.latest.position);
            if tail > MIN_SEGMENT_LENGTH {
                total += tail;
            }
        }
        total
    }

    fn path_efficiency(&self) -> f32 {
        if self.path_points.len() < 2 {
            return 0.0;
        }

        let direct = self
            .goal_position
            .map(|goal| distance(&self.start_position, &goal))
            .unwrap_or(0.0);
        let mut actual = self.distance_travelled();
        if actual <= 0.0 {
            actual = direct;
        }
        if actual <= 0.0 {
            return 0.0;
        }

        (direct / actual).clamp(0.0, 1.0)
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Export file could not be written
    #[error("metrics export I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failed
    #[error("metrics serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Serialize)]
struct MetricsExport<'a> {
    summary: &'a MetricsSummary,
    episodes: &'a [EpisodeRecord],
}

/// Bundled [`EpisodeRecorder`] implementation
#[derive(Debug, Clone)]
pub struct TurtleMetrics {
    enabled: bool,
    max_episodes: u32,
    path_point_interval: f32,
    episode_count: u32,
    recording: bool,
    current: Option<LiveEpisode>,
    episodes: Vec<EpisodeRecord>,
    summary: MetricsSummary,
}

impl TurtleMetrics {
    /// Creates a recorder from its configuration section
    pub fn new(config: &MetricsConfig) -> Self {
        TurtleMetrics {
            enabled: config.enabled,
            max_episodes: config.max_episodes,
            path_point_interval: config.path_point_interval,
            episode_count: 0,
            recording: false,
            current: None,
            episodes: Vec::new(),
            summary: MetricsSummary::default(),
        }
    }

    /// Whether the recorder still accepts events
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether an episode is currently being recorded
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Finalized episodes, oldest first
    pub fn episodes(&self) -> &[EpisodeRecord] {
        &self.episodes
    }

    /// Current summary
    pub fn summary(&self) -> &MetricsSummary {
        &self.summary
    }

    /// Collisions counted so far in the live episode
    pub fn current_collisions(&self) -> Option<u32> {
        self.current.as_ref().map(|episode| episode.collisions)
    }

    /// Distance travelled so far in the live episode
    pub fn current_distance_travelled(&self) -> Option<f32> {
        self.current.as_ref().map(LiveEpisode::distance_travelled)
    }

    /// Writes the summary and every finalized episode to a YAML file
    pub fn export_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), MetricsError> {
        let file = File::create(path.as_ref())?;
        serde_yaml::to_writer(
            file,
            &MetricsExport {
                summary: &self.summary,
                episodes: &self.episodes,
            },
        )?;
        info!("Exported {} episodes to {}", self.episodes.len(), path.as_ref().display());
        Ok(())
    }

    fn start_new_episode(&mut self, snapshot: &AgentSnapshot) {
        if self.episode_count >= self.max_episodes {
            info!("Episode limit reached ({}), disabling metrics", self.max_episodes);
            self.recording = false;
            self.enabled = false;
            return;
        }

        self.episode_count += 1;
        self.recording = true;

        let start = LiveEpisode {
            number: self.episode_count,
            start_position: snapshot.position,
            goal_position: snapshot.goal,
            collisions: 0,
            direction_changes: 0,
            last_heading: snapshot.heading,
            path_points: vec![snapshot.position],
            last_path_point_time: snapshot.episode_time,
            latest: *snapshot,
        };
        info!(
            "Episode {} started, initial distance to goal {:.2}",
            start.number,
            snapshot.distance_to_goal()
        );
        self.current = Some(start);
    }

    fn complete_episode(&mut self, success: bool, snapshot: &AgentSnapshot) {
        let Some(mut live) = self.current.take() else {
            return;
        };
        live.latest = *snapshot;

        let record = EpisodeRecord {
            episode_number: live.number,
            success,
            start_position: live.start_position,
            end_position: snapshot.position,
            goal_position: live.goal_position,
            total_time: snapshot.episode_time,
            total_steps: snapshot.step,
            final_reward: snapshot.cumulative_reward,
            final_distance_to_goal: snapshot.distance_to_goal(),
            collision_count: live.collisions,
            direction_changes: live.direction_changes,
            path_efficiency: live.path_efficiency(),
        };
        info!(
            "Episode {} completed: success={}, steps={}, reward={:.2}, time={:.2}s",
            record.episode_number, record.success, record.total_steps, record.final_reward, record.total_time
        );

        self.episodes.push(record);
        self.update_summary();
        self.recording = false;

        if live.number == self.max_episodes {
            info!("Final episode completed ({}/{}), disabling metrics", live.number, self.max_episodes);
            self.enabled = false;
            self.log_summary();
        }
    }

    fn update_summary(&mut self) {
        let successes: Vec<&EpisodeRecord> = self.episodes.iter().filter(|e| e.success).collect();
        let total = self.episodes.len() as u32;

        self.summary.total_episodes = total;
        self.summary.successful_episodes = successes.len() as u32;
        self.summary.success_rate = if total > 0 {
            successes.len() as f32 / total as f32
        } else {
            0.0
        };

        if successes.is_empty() {
            return;
        }
        let n = successes.len() as f32;
        let mean = |f: fn(&EpisodeRecord) -> f32| successes.iter().map(|e| f(e)).sum::<f32>() / n;

        self.summary.avg_time_per_episode = mean(|e| e.total_time);
        self.summary.avg_steps_per_episode = mean(|e| e.total_steps as f32);
        self.summary.avg_reward_per_episode = mean(|e| e.final_reward);
        self.summary.avg_path_efficiency = mean(|e| e.path_efficiency);
        self.summary.avg_collisions_per_episode = mean(|e| e.collision_count as f32);
        self.summary.avg_direction_changes_per_episode = mean(|e| e.direction_changes as f32);
    }

    /// Logs the current summary at info level
    pub fn log_summary(&self) {
        let s = &self.summary;
        info!(
            "Turtle FSM metrics: {} episodes, {} successful ({:.1}%)",
            s.total_episodes,
            s.successful_episodes,
            s.success_rate * 100.0
        );
        info!(
            "  avg time {:.2}s, avg steps {:.1}, avg reward {:.2}",
            s.avg_time_per_episode, s.avg_steps_per_episode, s.avg_reward_per_episode
        );
        info!(
            "  avg path efficiency {:.1}%, avg collisions {:.1}, avg direction changes {:.1}",
            s.avg_path_efficiency * 100.0,
            s.avg_collisions_per_episode,
            s.avg_direction_changes_per_episode
        );
    }
}

impl EpisodeRecorder for TurtleMetrics {
    fn on_episode_start(&mut self, snapshot: &AgentSnapshot) {
        if !self.enabled {
            return;
        }
        if self.recording {
            debug!("on_episode_start ignored, episode {} still recording", self.episode_count);
            return;
        }
        self.start_new_episode(snapshot);
    }

    fn on_episode_end(&mut self, success: bool, snapshot: &AgentSnapshot) {
        if !self.enabled {
            return;
        }
        self.complete_episode(success, snapshot);
    }

    fn on_collision(&mut self) {
        if !self.enabled {
            return;
        }
        match self.current.as_mut() {
            Some(live) => live.collisions += 1,
            None => warn!("collision reported outside of an episode"),
        }
    }

    fn sample(&mut self, snapshot: &AgentSnapshot) {
        if !self.enabled || !self.recording {
            return;
        }
        let interval = self.path_point_interval;
        let Some(live) = self.current.as_mut() else {
            return;
        };

        if snapshot.episode_time - live.last_path_point_time > interval {
            live.path_points.push(snapshot.position);
            live.last_path_point_time = snapshot.episode_time;
        }

        if signed_angle_delta(live.last_heading, snapshot.heading).abs() > DIRECTION_CHANGE_THRESHOLD {
            live.direction_changes += 1;
        }
        live.last_heading = snapshot.heading;
        live.latest = *snapshot;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.recording = false;
        info!("Metrics disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(max_episodes: u32) -> MetricsConfig {
        MetricsConfig {
            enabled: true,
            max_episodes,
            path_point_interval: 0.5,
            export_path: None,
        }
    }

    fn snapshot(x: f32, z: f32, time: f32) -> AgentSnapshot {
        AgentSnapshot {
            position: Vector2::new(x, z),
            heading: 0.0,
            goal: Some(Vector2::new(0.0, 2.0)),
            step: (time * 60.0) as u32,
            cumulative_reward: 0.0,
            episode_time: time,
        }
    }

    #[test]
    fn straight_run_is_fully_efficient() {
        let mut metrics = TurtleMetrics::new(&config(10));
        metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
        for i in 1..=20 {
            let t = i as f32 * 0.1;
            metrics.sample(&snapshot(0.0, t, t));
        }
        metrics.on_episode_end(true, &snapshot(0.0, 2.0, 2.0));

        let record = &metrics.episodes()[0];
        assert!(record.success);
        assert_relative_eq!(record.path_efficiency, 1.0, epsilon = 1e-4);
        assert_eq!(metrics.summary().successful_episodes, 1);
        assert!(!metrics.is_recording());
    }

    #[test]
    fn live_distance_follows_samples() {
        let mut metrics = TurtleMetrics::new(&config(10));
        assert_eq!(metrics.current_distance_travelled(), None);

        metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
        for i in 1..=12 {
            let t = i as f32 * 0.1;
            metrics.sample(&snapshot(0.0, t, t));
        }
        assert_relative_eq!(metrics.current_distance_travelled().unwrap(), 1.2, epsilon = 1e-4);

        metrics.on_episode_end(true, &snapshot(0.0, 1.2, 1.2));
        assert_eq!(metrics.current_distance_travelled(), None);
    }

    #[test]
    fn collisions_and_failures_are_counted() {
        let mut metrics = TurtleMetrics::new(&config(10));
        metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
        metrics.on_collision();
        metrics.on_collision();
        assert_eq!(metrics.current_collisions(), Some(2));
        metrics.on_episode_end(false, &snapshot(0.0, 0.0, 1.0));

        let summary = metrics.summary();
        assert_eq!(summary.total_episodes, 1);
        assert_eq!(summary.successful_episodes, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(metrics.episodes()[0].collision_count, 2);
    }

    #[test]
    fn duplicate_start_is_ignored() {
        let mut metrics = TurtleMetrics::new(&config(10));
        metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
        metrics.on_episode_start(&snapshot(1.0, 1.0, 0.0));
        metrics.on_episode_end(true, &snapshot(0.0, 2.0, 1.0));
        assert_eq!(metrics.episodes().len(), 1);
        assert_eq!(metrics.episodes()[0].start_position, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn episode_cap_disables_recording() {
        let mut metrics = TurtleMetrics::new(&config(2));
        for _ in 0..3 {
            metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
            metrics.on_episode_end(true, &snapshot(0.0, 2.0, 1.0));
        }
        assert_eq!(metrics.episodes().len(), 2);
        assert!(!metrics.is_enabled());
    }

    #[test]
    fn direction_changes_wrap_around() {
        let mut metrics = TurtleMetrics::new(&config(10));
        metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
        let mut s = snapshot(0.0, 0.0, 0.1);
        s.heading = 358.0;
        metrics.sample(&s);
        s.heading = 20.0;
        metrics.sample(&s);
        metrics.on_episode_end(true, &snapshot(0.0, 2.0, 1.0));
        assert_eq!(metrics.episodes()[0].direction_changes, 1);
    }

    #[test]
    fn export_writes_yaml() {
        let mut metrics = TurtleMetrics::new(&config(10));
        metrics.on_episode_start(&snapshot(0.0, 0.0, 0.0));
        metrics.on_episode_end(true, &snapshot(0.0, 2.0, 1.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.yaml");
        metrics.export_yaml(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("successful_episodes: 1"));
        assert!(text.contains("episode_number: 1"));
    }
}
