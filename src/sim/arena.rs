// src/sim/arena.rs
// Square walled arena with a circular goal trigger. Stands in for a physics
// engine: keeps the turtle inside the walls and turns overlaps into
// edge-triggered contact events.

use log::trace;
use nalgebra::Vector2;

use crate::config::SimConfig;
use crate::core::AgentRuntime;
use crate::navigation::{ColliderTag, ContactEvent};

const CONTACT_EPSILON: f32 = 1e-4;

/// Walled square centred on the origin
#[derive(Debug, Clone)]
pub struct Arena {
    half_extent: f32,
    agent_radius: f32,
    goal_radius: f32,
    touching_wall: bool,
    inside_goal: bool,
}

impl Arena {
    /// Builds the arena from the host configuration
    pub fn new(config: &SimConfig) -> Self {
        Arena {
            half_extent: config.arena_half_extent,
            agent_radius: config.agent_radius,
            goal_radius: config.goal_radius,
            touching_wall: false,
            inside_goal: false,
        }
    }

    /// Largest coordinate the turtle's centre may reach on either axis
    pub fn limit(&self) -> f32 {
        self.half_extent - self.agent_radius
    }

    /// Whether the turtle was against a wall at the last detection
    pub fn is_touching_wall(&self) -> bool {
        self.touching_wall
    }

    /// Forgets contact history, e.g. after teleporting the turtle
    pub fn clear_contacts(&mut self) {
        self.touching_wall = false;
        self.inside_goal = false;
    }

    /// Pushes the turtle back inside the walls and reports contact changes
    /// since the previous call.
    pub fn detect(&mut self, agent: &mut AgentRuntime) -> Vec<ContactEvent> {
        let mut events = Vec::new();

        let limit = self.limit();
        let position = agent.position();
        let clamped = Vector2::new(position.x.clamp(-limit, limit), position.y.clamp(-limit, limit));
        if clamped != position {
            agent.set_position(clamped);
        }

        let touching = clamped.x.abs() >= limit - CONTACT_EPSILON || clamped.y.abs() >= limit - CONTACT_EPSILON;
        match (self.touching_wall, touching) {
            (false, true) => events.push(ContactEvent::CollisionEnter(ColliderTag::Wall)),
            (true, true) => events.push(ContactEvent::CollisionStay(ColliderTag::Wall)),
            (true, false) => events.push(ContactEvent::CollisionExit(ColliderTag::Wall)),
            (false, false) => {}
        }
        self.touching_wall = touching;

        let inside = agent.distance_to_goal() <= self.goal_radius + self.agent_radius;
        if inside && !self.inside_goal {
            events.push(ContactEvent::TriggerEnter(ColliderTag::Goal));
        }
        self.inside_goal = inside;

        if !events.is_empty() {
            trace!("Contacts: {:?}", events);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::core::Pose;

    fn agent_at(x: f32, z: f32) -> AgentRuntime {
        let mut agent = AgentRuntime::new(AgentConfig::default());
        agent.set_pose(Pose::new(Vector2::new(x, z), 0.0));
        agent
    }

    #[test]
    fn wall_contacts_are_edge_triggered() {
        let mut arena = Arena::new(&SimConfig::default());
        let mut agent = agent_at(0.0, 5.0);

        let events = arena.detect(&mut agent);
        assert_eq!(events, vec![ContactEvent::CollisionEnter(ColliderTag::Wall)]);
        assert!((agent.position().y - arena.limit()).abs() < 1e-6);

        let events = arena.detect(&mut agent);
        assert_eq!(events, vec![ContactEvent::CollisionStay(ColliderTag::Wall)]);

        agent.set_position(Vector2::new(0.0, 0.0));
        let events = arena.detect(&mut agent);
        assert_eq!(events, vec![ContactEvent::CollisionExit(ColliderTag::Wall)]);
        assert!(arena.detect(&mut agent).is_empty());
    }

    #[test]
    fn goal_trigger_fires_once_per_entry() {
        let mut arena = Arena::new(&SimConfig::default());
        let mut agent = agent_at(0.0, 0.0);
        agent.set_goal(Some(Vector2::new(0.0, 0.2)));

        assert_eq!(
            arena.detect(&mut agent),
            vec![ContactEvent::TriggerEnter(ColliderTag::Goal)]
        );
        assert!(arena.detect(&mut agent).is_empty());

        agent.set_goal(Some(Vector2::new(0.0, 3.0)));
        assert!(arena.detect(&mut agent).is_empty());
        agent.set_goal(Some(Vector2::new(0.0, 0.1)));
        assert_eq!(arena.detect(&mut agent).len(), 1);
    }

    #[test]
    fn no_goal_never_triggers() {
        let mut arena = Arena::new(&SimConfig::default());
        let mut agent = agent_at(0.0, 0.0);
        assert!(arena.detect(&mut agent).is_empty());
    }
}
