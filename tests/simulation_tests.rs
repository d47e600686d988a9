// End-to-end runs of the headless host with the bundled metrics recorder.

use nalgebra::Vector2;

use turtle_fsm::config::TurtleConfig;
use turtle_fsm::{ControllerState, Pose, Simulation, TurtleError};

fn config(seed: u64) -> TurtleConfig {
    let mut config = TurtleConfig::default();
    config.agent.seed = Some(seed);
    config.controller.debug_mode = false;
    config
}

// Unit test for an autonomous session: the turtle reaches its goal repeatedly
#[test]
fn autonomous_run_reaches_goals() {
    let mut simulation = Simulation::new(&config(7)).unwrap();
    let frames = simulation.run(3000);
    assert_eq!(frames, 3000);

    let summary = simulation.metrics_summary().unwrap();
    assert!(summary.successful_episodes >= 1, "summary {:?}", summary);
    assert_eq!(summary.total_episodes, summary.successful_episodes);
    assert!(summary.avg_path_efficiency > 0.0 && summary.avg_path_efficiency <= 1.0);

    let metrics = simulation.metrics().unwrap().lock().unwrap();
    assert!(metrics.episodes().iter().all(|episode| episode.success));
    assert!(metrics.is_recording());
}

// A tiny step budget stops the run early and records one failure
#[test]
fn run_stops_when_budget_is_spent() {
    let mut config = config(3);
    config.agent.max_steps = 30;
    let mut simulation = Simulation::new(&config).unwrap();
    simulation.agent_mut().set_goal(Some(Vector2::new(0.0, 3.5)));

    let frames = simulation.run(1000);
    assert_eq!(frames, 30);
    assert!(!simulation.agent().is_active());
    assert!(!simulation.step_frame());

    let metrics = simulation.metrics().unwrap().lock().unwrap();
    assert_eq!(metrics.episodes().len(), 1);
    assert!(!metrics.episodes()[0].success);
    assert!(!metrics.is_enabled());
}

// Driving at an unreachable goal behind a wall produces a collision
#[test]
fn wall_stops_the_turtle_and_counts_a_collision() {
    let mut simulation = Simulation::new(&config(11)).unwrap();
    simulation
        .agent_mut()
        .set_pose(Pose::new(Vector2::new(0.0, 3.0), 0.0));
    simulation.agent_mut().set_goal(Some(Vector2::new(0.0, 10.0)));

    let limit = simulation.arena().limit();
    let mut saw_colliding = false;
    for _ in 0..120 {
        simulation.step_frame();
        saw_colliding |= simulation.controller().current_state() == ControllerState::Colliding;
        assert!(simulation.agent().position().y <= limit + 1e-4);
    }

    assert!(saw_colliding);
    assert!(simulation.arena().is_touching_wall());
    assert!(simulation.controller().is_colliding());
    let metrics = simulation.metrics().unwrap().lock().unwrap();
    assert!(metrics.current_collisions().unwrap() >= 1);
}

#[test]
fn disabled_metrics_export_is_a_no_op() {
    let mut config = config(5);
    config.metrics.enabled = false;
    let simulation = Simulation::new(&config).unwrap();
    assert!(simulation.metrics().is_none());
    assert!(simulation.metrics_summary().is_none());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.yaml");
    simulation.export_metrics(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn export_writes_summary_after_a_run() {
    let mut simulation = Simulation::new(&config(21)).unwrap();
    simulation.run(1500);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.yaml");
    simulation.export_metrics(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("summary:"));
    assert!(text.contains("episodes:"));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = config(1);
    config.sim.physics_dt = 0.0;
    match Simulation::new(&config) {
        Err(TurtleError::Config(_)) => {}
        other => panic!("expected config error, got {:?}", other.map(|_| ())),
    }
}

// Goal annuli that cannot be sampled or that reach past the walls never start
#[test]
fn unreachable_goal_annulus_is_rejected() {
    for (min, max) in [(1.0, f32::INFINITY), (6.0, 7.0)] {
        let mut config = config(1);
        config.agent.goal_min_distance = min;
        config.agent.goal_max_distance = max;
        assert!(matches!(Simulation::new(&config), Err(TurtleError::Config(_))));
    }
}

#[test]
fn shutdown_freezes_the_controller() {
    let mut simulation = Simulation::new(&config(9)).unwrap();
    simulation.run(10);
    simulation.shutdown();

    let position = simulation.agent().position();
    simulation.run(50);
    assert_eq!(simulation.agent().position(), position);
}
