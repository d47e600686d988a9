// core/state.rs

// Discrete behaviour modes of the turtle controller. Exactly one is active at
// any time; the controller in navigation/controller.rs is the only writer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Controller modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerState {
    /// Standing still, waiting for the policy
    Idle,
    /// Driving straight ahead
    Moving,
    /// Turning counter-clockwise in place
    RotatingLeft,
    /// Turning clockwise in place
    RotatingRight,
    /// Driving toward the goal with periodic heading checks
    Navigating,
    /// Goal touched, episode being reset
    ReachedGoal,
    /// Touching a wall, running the escape strategy
    Colliding,
}

impl ControllerState {
    /// Every mode, in declaration order.
    pub const ALL: [ControllerState; 7] = [
        ControllerState::Idle,
        ControllerState::Moving,
        ControllerState::RotatingLeft,
        ControllerState::RotatingRight,
        ControllerState::Navigating,
        ControllerState::ReachedGoal,
        ControllerState::Colliding,
    ];

    /// Picks the rotation that closes a signed heading delta.
    pub fn rotation_toward(delta: f32) -> Self {
        if delta > 0.0 {
            ControllerState::RotatingRight
        } else {
            ControllerState::RotatingLeft
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        ControllerState::Idle
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "Idle",
            ControllerState::Moving => "Moving",
            ControllerState::RotatingLeft => "RotatingLeft",
            ControllerState::RotatingRight => "RotatingRight",
            ControllerState::Navigating => "Navigating",
            ControllerState::ReachedGoal => "ReachedGoal",
            ControllerState::Colliding => "Colliding",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_sign_convention() {
        assert_eq!(ControllerState::rotation_toward(30.0), ControllerState::RotatingRight);
        assert_eq!(ControllerState::rotation_toward(-30.0), ControllerState::RotatingLeft);
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(ControllerState::default(), ControllerState::Idle);
        assert_eq!(ControllerState::Colliding.to_string(), "Colliding");
    }
}
