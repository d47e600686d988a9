// src/config.rs
// Configuration tree for the turtle agent, controller, metrics and headless host.
// Loaded from YAML; every section falls back to its defaults when omitted.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleConfig {
    /// Agent runtime parameters
    pub agent: AgentConfig,
    /// FSM driver parameters
    pub controller: ControllerConfig,
    /// Metrics recorder parameters
    pub metrics: MetricsConfig,
    /// Headless host parameters
    pub sim: SimConfig,
}

/// Agent runtime parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Forward speed in units per second
    pub move_speed: f32,
    /// Turn rate in degrees per second
    pub rotation_speed: f32,
    /// Step budget per episode
    pub max_steps: u32,
    /// Log every reward change at debug level
    pub enable_reward_logs: bool,
    /// Inner radius of the goal spawn annulus
    pub goal_min_distance: f32,
    /// Outer radius of the goal spawn annulus
    pub goal_max_distance: f32,
    /// Ground flash fade time in seconds
    pub flash_duration: f32,
    /// RNG seed for goal placement; entropy when absent
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            move_speed: 1.5,
            rotation_speed: 180.0,
            max_steps: 5000,
            enable_reward_logs: false,
            goal_min_distance: 1.0,
            goal_max_distance: 2.5,
            flash_duration: 3.0,
            seed: None,
        }
    }
}

/// FSM driver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Steer toward the goal; manual input otherwise
    pub autonomous: bool,
    /// Log every transition at debug level
    pub debug_mode: bool,
    /// Skip the transition policy while Colliding so the escape strategy runs
    pub hold_policy_while_colliding: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            autonomous: true,
            debug_mode: true,
            hold_policy_while_colliding: false,
        }
    }
}

/// Metrics recorder parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record episodes at all
    pub enabled: bool,
    /// Stop recording after this many episodes
    pub max_episodes: u32,
    /// Seconds between recorded path points
    pub path_point_interval: f32,
    /// Where the binary exports the YAML report
    pub export_path: Option<PathBuf>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            enabled: true,
            max_episodes: 100,
            path_point_interval: 0.5,
            export_path: None,
        }
    }
}

/// Headless host parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Logic tick length in seconds
    pub frame_dt: f32,
    /// Physics tick length in seconds
    pub physics_dt: f32,
    /// Walls sit at +/- this distance from the origin on both axes
    pub arena_half_extent: f32,
    /// Collision radius of the turtle
    pub agent_radius: f32,
    /// Trigger radius of the goal
    pub goal_radius: f32,
    /// Frame limit for one run of the binary
    pub max_frames: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            frame_dt: 1.0 / 60.0,
            physics_dt: 0.02,
            arena_half_extent: 4.0,
            agent_radius: 0.15,
            goal_radius: 0.3,
            max_frames: 20_000,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid YAML for this schema
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A value is outside its allowed range
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            message: format!("must be positive (got {})", value),
        })
    }
}

impl TurtleConfig {
    /// Loads and validates a YAML config file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config: TurtleConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parses and validates YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: TurtleConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every range constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        require_positive("agent.move_speed", agent.move_speed)?;
        require_positive("agent.rotation_speed", agent.rotation_speed)?;
        require_positive("agent.flash_duration", agent.flash_duration)?;
        if agent.max_steps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_steps",
                message: "must be at least 1".to_string(),
            });
        }
        require_positive("agent.goal_max_distance", agent.goal_max_distance)?;
        if !agent.goal_min_distance.is_finite()
            || agent.goal_min_distance < 0.0
            || agent.goal_min_distance > agent.goal_max_distance
        {
            return Err(ConfigError::InvalidValue {
                field: "agent.goal_min_distance",
                message: format!(
                    "must lie in [0, goal_max_distance] (got {} > {})",
                    agent.goal_min_distance, agent.goal_max_distance
                ),
            });
        }

        require_positive("metrics.path_point_interval", self.metrics.path_point_interval)?;

        let sim = &self.sim;
        require_positive("sim.frame_dt", sim.frame_dt)?;
        require_positive("sim.physics_dt", sim.physics_dt)?;
        require_positive("sim.arena_half_extent", sim.arena_half_extent)?;
        require_positive("sim.agent_radius", sim.agent_radius)?;
        require_positive("sim.goal_radius", sim.goal_radius)?;
        if sim.agent_radius >= sim.arena_half_extent {
            return Err(ConfigError::InvalidValue {
                field: "sim.agent_radius",
                message: "turtle does not fit inside the arena".to_string(),
            });
        }
        let reach = agent.goal_max_distance + sim.goal_radius;
        let limit = sim.arena_half_extent - sim.agent_radius;
        if reach > limit {
            return Err(ConfigError::InvalidValue {
                field: "agent.goal_max_distance",
                message: format!(
                    "goals up to {} away (plus goal radius) would spawn outside the walls at {}",
                    reach, limit
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let config = TurtleConfig::default();
        config.validate().unwrap();
        assert_eq!(config.agent.max_steps, 5000);
        assert!(!config.controller.hold_policy_while_colliding);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = TurtleConfig::from_yaml_str(
            "agent:\n  max_steps: 200\n  seed: 7\ncontroller:\n  hold_policy_while_colliding: true\n",
        )
        .unwrap();
        assert_eq!(config.agent.max_steps, 200);
        assert_eq!(config.agent.seed, Some(7));
        assert_eq!(config.agent.move_speed, 1.5);
        assert!(config.controller.hold_policy_while_colliding);
        assert_eq!(config.metrics.max_episodes, 100);
    }

    #[rstest]
    #[case("agent:\n  move_speed: 0.0\n", "agent.move_speed")]
    #[case("agent:\n  max_steps: 0\n", "agent.max_steps")]
    #[case("agent:\n  goal_min_distance: 3.0\n", "agent.goal_min_distance")]
    #[case("agent:\n  goal_max_distance: .inf\n", "agent.goal_max_distance")]
    #[case("agent:\n  goal_max_distance: .nan\n", "agent.goal_max_distance")]
    #[case("agent:\n  goal_min_distance: .inf\n", "agent.goal_min_distance")]
    #[case("agent:\n  goal_min_distance: -1.0\n", "agent.goal_min_distance")]
    #[case("agent:\n  goal_min_distance: 6.0\n  goal_max_distance: 7.0\n", "agent.goal_max_distance")]
    #[case("agent:\n  goal_max_distance: 3.6\n", "agent.goal_max_distance")]
    #[case("sim:\n  arena_half_extent: 2.0\n", "agent.goal_max_distance")]
    #[case("sim:\n  physics_dt: -1.0\n", "sim.physics_dt")]
    #[case("sim:\n  agent_radius: 10.0\n", "sim.agent_radius")]
    fn rejects_out_of_range(#[case] yaml: &str, #[case] expected_field: &str) {
        match TurtleConfig::from_yaml_str(yaml) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected InvalidValue for {}, got {:?}", expected_field, other),
        }
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turtle.yaml");
        let mut config = TurtleConfig::default();
        config.agent.seed = Some(42);
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = TurtleConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
