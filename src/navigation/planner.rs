// src/navigation/planner.rs
// Transition policy evaluated by the controller on every logic tick.

use crate::core::geometry::{bearing_to, signed_angle_delta};
use crate::core::{AgentRuntime, ControllerState};

/// Heading error beyond which the policy turns in place, degrees
pub const POLICY_TURN_THRESHOLD: f32 = 15.0;

/// Direction keys held by an operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualInput {
    /// Drive forward
    pub forward: bool,
    /// Turn left
    pub left: bool,
    /// Turn right
    pub right: bool,
}

/// Chooses the controller's target mode each tick.
pub struct Planner {
    autonomous: bool,
    input: ManualInput,
}

impl Planner {
    /// Creates a planner; `autonomous` selects goal seeking over manual input.
    pub fn new(autonomous: bool) -> Self {
        Planner {
            autonomous,
            input: ManualInput::default(),
        }
    }

    /// Whether the planner is steering toward the goal on its own
    pub fn is_autonomous(&self) -> bool {
        self.autonomous
    }

    /// Switches between goal seeking and manual input
    pub fn set_autonomous(&mut self, autonomous: bool) {
        self.autonomous = autonomous;
    }

    /// Latest operator input, used when not autonomous
    pub fn set_input(&mut self, input: ManualInput) {
        self.input = input;
    }

    /// Target mode for this tick, or `None` when there is nothing to decide
    /// (autonomous mode without a goal).
    pub fn decide(&self, agent: &AgentRuntime) -> Option<ControllerState> {
        if self.autonomous {
            Self::seek_goal(agent)
        } else {
            Some(Self::follow_input(self.input))
        }
    }

    fn seek_goal(agent: &AgentRuntime) -> Option<ControllerState> {
        let goal = agent.goal_position()?;
        let bearing = bearing_to(&agent.position(), &goal);
        let delta = signed_angle_delta(agent.heading(), bearing);

        if delta.abs() > POLICY_TURN_THRESHOLD {
            Some(ControllerState::rotation_toward(delta))
        } else {
            Some(ControllerState::Navigating)
        }
    }

    fn follow_input(input: ManualInput) -> ControllerState {
        if input.forward {
            ControllerState::Moving
        } else if input.left {
            ControllerState::RotatingLeft
        } else if input.right {
            ControllerState::RotatingRight
        } else {
            ControllerState::Idle
        }
    }
}
