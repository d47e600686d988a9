//! Navigation system for the turtle
//!
//! This module holds the finite state machine that decides, tick by tick,
//! whether the turtle idles, drives, turns, navigates toward its goal or
//! recovers from a wall, together with the contact events the physics layer
//! feeds into it.

mod controller;
/// Transition policy
pub mod planner;
pub mod states;

pub use controller::Controller;
pub use planner::{ManualInput, Planner};
pub use states::{Request, StateContext, TurtleState};

use serde::{Deserialize, Serialize};

/// Tag of the collider on the other side of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderTag {
    /// The goal trigger volume
    Goal,
    /// Arena boundary
    Wall,
    /// Anything else; ignored by the controller
    Untagged,
}

/// Contact reported by the physics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactEvent {
    /// Entered a trigger volume
    TriggerEnter(ColliderTag),
    /// Solid contact began
    CollisionEnter(ColliderTag),
    /// Solid contact persists this physics step
    CollisionStay(ColliderTag),
    /// Solid contact ended
    CollisionExit(ColliderTag),
}

impl ContactEvent {
    /// Tag of the other collider
    pub fn tag(&self) -> ColliderTag {
        match *self {
            ContactEvent::TriggerEnter(tag)
            | ContactEvent::CollisionEnter(tag)
            | ContactEvent::CollisionStay(tag)
            | ContactEvent::CollisionExit(tag) => tag,
        }
    }
}
