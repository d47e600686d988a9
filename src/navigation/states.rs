//! Per-mode behaviour of the turtle controller
//!
//! Each [`ControllerState`] has one small type implementing [`TurtleState`].
//! Every hook defaults to a no-op, so a state only spells out the hooks it
//! actually uses. States never touch each other or the controller: they
//! mutate the agent through its entry points and ask for transitions through
//! [`StateContext::request`].

use log::debug;

use crate::core::geometry::{bearing_to, signed_angle_delta};
use crate::core::{AgentRuntime, ControllerState};
use crate::render::IndicatorColor;

/// Seconds between heading re-checks while navigating
pub const NAVIGATION_CHECK_INTERVAL: f32 = 0.1;
/// Heading error that interrupts navigation, degrees
pub const NAVIGATION_TURN_THRESHOLD: f32 = 20.0;
/// Seconds between escape attempts while colliding
pub const ESCAPE_ATTEMPT_INTERVAL: f32 = 0.5;
/// Heading error worth turning for during an escape, degrees
pub const ESCAPE_TURN_THRESHOLD: f32 = 30.0;
/// Reward granted on reaching the goal
pub const GOAL_REWARD: f32 = 10.0;
/// One-time reward on hitting a wall
pub const COLLISION_PENALTY: f32 = -0.05;
/// Reward per second spent against a wall
pub const COLLISION_PENALTY_RATE: f32 = -0.01;

/// What a state asks the controller to do once its hook returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Switch to another mode
    ChangeState(ControllerState),
    /// Close the episode as a success and start a new one
    ResetEpisode,
}

/// Per-call view handed to state hooks
pub struct StateContext<'a> {
    /// Agent runtime; mutate only through its entry points
    pub agent: &'a mut AgentRuntime,
    /// Simulated seconds since the controller started
    pub now: f32,
    /// Length of the tick being processed
    pub dt: f32,
    request: Option<Request>,
}

impl<'a> StateContext<'a> {
    pub(crate) fn new(agent: &'a mut AgentRuntime, now: f32, dt: f32) -> Self {
        StateContext {
            agent,
            now,
            dt,
            request: None,
        }
    }

    /// Asks the controller for a transition; the last request wins
    pub fn request(&mut self, request: Request) {
        self.request = Some(request);
    }

    /// Shorthand for `request(Request::ChangeState(state))`
    pub fn change_state(&mut self, state: ControllerState) {
        self.request(Request::ChangeState(state));
    }

    pub(crate) fn take_request(&mut self) -> Option<Request> {
        self.request.take()
    }
}

/// Behaviour of one controller mode
pub trait TurtleState: Send {
    /// Mode this behaviour implements
    fn kind(&self) -> ControllerState;

    /// Called once when the mode becomes active
    fn enter(&mut self, _ctx: &mut StateContext<'_>) {}
    /// Called every logic tick while active
    fn tick(&mut self, _ctx: &mut StateContext<'_>) {}
    /// Called every physics tick while active
    fn physics_tick(&mut self, _ctx: &mut StateContext<'_>) {}
    /// Called once when the mode is left
    fn exit(&mut self, _ctx: &mut StateContext<'_>) {}

    /// The turtle touched the goal trigger
    fn on_goal_trigger(&mut self, _ctx: &mut StateContext<'_>) {}
    /// The turtle started touching a wall
    fn on_wall_enter(&mut self, _ctx: &mut StateContext<'_>) {}
    /// The turtle is still touching a wall
    fn on_wall_stay(&mut self, _ctx: &mut StateContext<'_>) {}
    /// The turtle stopped touching a wall
    fn on_wall_exit(&mut self, _ctx: &mut StateContext<'_>) {}
}

/// Standing still; all decisions come from the policy
#[derive(Debug, Default)]
pub struct IdleState;

impl TurtleState for IdleState {
    fn kind(&self) -> ControllerState {
        ControllerState::Idle
    }
}

/// Straight ahead at move speed
#[derive(Debug, Default)]
pub struct MovingState;

impl TurtleState for MovingState {
    fn kind(&self) -> ControllerState {
        ControllerState::Moving
    }

    fn physics_tick(&mut self, ctx: &mut StateContext<'_>) {
        let step = ctx.agent.move_speed() * ctx.dt;
        ctx.agent.advance(step);
    }
}

/// Counter-clockwise turn in place
#[derive(Debug, Default)]
pub struct RotatingLeftState;

impl TurtleState for RotatingLeftState {
    fn kind(&self) -> ControllerState {
        ControllerState::RotatingLeft
    }

    fn physics_tick(&mut self, ctx: &mut StateContext<'_>) {
        let turn = ctx.agent.rotation_speed() * ctx.dt;
        ctx.agent.rotate(-turn);
    }
}

/// Clockwise turn in place
#[derive(Debug, Default)]
pub struct RotatingRightState;

impl TurtleState for RotatingRightState {
    fn kind(&self) -> ControllerState {
        ControllerState::RotatingRight
    }

    fn physics_tick(&mut self, ctx: &mut StateContext<'_>) {
        let turn = ctx.agent.rotation_speed() * ctx.dt;
        ctx.agent.rotate(turn);
    }
}

/// Drives forward and periodically checks the heading against the goal.
///
/// The check timer is not reset on entry, so re-entering shortly after a
/// check waits out the remainder of the interval.
#[derive(Debug, Default)]
pub struct NavigatingState {
    last_direction_check: f32,
}

impl NavigatingState {
    fn update_navigation(&self, ctx: &mut StateContext<'_>) {
        let Some(goal) = ctx.agent.goal_position() else {
            return;
        };
        let bearing = bearing_to(&ctx.agent.position(), &goal);
        let delta = signed_angle_delta(ctx.agent.heading(), bearing);

        if delta.abs() > NAVIGATION_TURN_THRESHOLD {
            ctx.change_state(ControllerState::rotation_toward(delta));
        }
    }
}

impl TurtleState for NavigatingState {
    fn kind(&self) -> ControllerState {
        ControllerState::Navigating
    }

    fn tick(&mut self, ctx: &mut StateContext<'_>) {
        if ctx.now - self.last_direction_check > NAVIGATION_CHECK_INTERVAL {
            self.last_direction_check = ctx.now;
            self.update_navigation(ctx);
        }
    }

    fn physics_tick(&mut self, ctx: &mut StateContext<'_>) {
        let step = ctx.agent.move_speed() * ctx.dt;
        ctx.agent.advance(step);
    }
}

/// Goal touched: reward, flag success, reset the episode
#[derive(Debug, Default)]
pub struct ReachedGoalState;

impl TurtleState for ReachedGoalState {
    fn kind(&self) -> ControllerState {
        ControllerState::ReachedGoal
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        ctx.agent.add_reward(GOAL_REWARD);
        ctx.agent.set_indicator(IndicatorColor::Success);
        ctx.request(Request::ResetEpisode);
    }
}

/// Pressed against a wall: penalise and try to back away from the goal side
#[derive(Debug, Default)]
pub struct CollidingState {
    last_escape_attempt: f32,
}

impl CollidingState {
    // Turn to face away from the goal, then drive out
    fn try_escape(&self, ctx: &mut StateContext<'_>) {
        let Some(goal) = ctx.agent.goal_position() else {
            ctx.change_state(ControllerState::Moving);
            return;
        };
        let position = ctx.agent.position();
        let escape_target = position - (goal - position);
        let bearing = bearing_to(&position, &escape_target);
        let delta = signed_angle_delta(ctx.agent.heading(), bearing);

        if delta.abs() > ESCAPE_TURN_THRESHOLD {
            ctx.change_state(ControllerState::rotation_toward(delta));
        } else {
            ctx.change_state(ControllerState::Moving);
        }
    }
}

impl TurtleState for CollidingState {
    fn kind(&self) -> ControllerState {
        ControllerState::Colliding
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        ctx.agent.set_indicator(IndicatorColor::Alert);
        ctx.agent.add_reward(COLLISION_PENALTY);
        self.last_escape_attempt = ctx.now;
        ctx.agent.notify_collision();
    }

    fn tick(&mut self, ctx: &mut StateContext<'_>) {
        if ctx.now - self.last_escape_attempt < ESCAPE_ATTEMPT_INTERVAL {
            return;
        }
        self.last_escape_attempt = ctx.now;
        debug!("Escape attempt at t={:.2}", ctx.now);
        self.try_escape(ctx);
    }

    fn physics_tick(&mut self, ctx: &mut StateContext<'_>) {
        ctx.agent.add_reward(COLLISION_PENALTY_RATE * ctx.dt);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.agent.set_indicator(IndicatorColor::Default);
    }
}

/// One behaviour per mode, as installed by a fresh controller
pub fn default_states() -> Vec<Box<dyn TurtleState>> {
    vec![
        Box::new(IdleState),
        Box::new(MovingState),
        Box::new(RotatingLeftState),
        Box::new(RotatingRightState),
        Box::new(NavigatingState::default()),
        Box::new(ReachedGoalState),
        Box::new(CollidingState::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn agent() -> AgentRuntime {
        AgentRuntime::new(AgentConfig {
            seed: Some(1),
            ..AgentConfig::default()
        })
    }

    #[test]
    fn every_mode_has_a_behaviour() {
        let kinds: Vec<ControllerState> = default_states().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, ControllerState::ALL.to_vec());
    }

    #[test]
    fn rotating_states_turn_opposite_ways() {
        let mut agent = agent();
        let mut ctx = StateContext::new(&mut agent, 0.0, 0.1);
        RotatingRightState.physics_tick(&mut ctx);
        assert_relative_eq!(ctx.agent.heading(), 18.0, epsilon = 1e-4);
        RotatingLeftState.physics_tick(&mut ctx);
        RotatingLeftState.physics_tick(&mut ctx);
        assert_relative_eq!(ctx.agent.heading(), 342.0, epsilon = 1e-4);
        assert_eq!(ctx.take_request(), None);
    }

    #[test]
    fn navigating_waits_for_interval() {
        let mut agent = agent();
        agent.set_goal(Some(Vector2::new(2.0, 0.0)));
        let mut state = NavigatingState::default();

        let mut ctx = StateContext::new(&mut agent, 0.05, 0.016);
        state.tick(&mut ctx);
        assert_eq!(ctx.take_request(), None);

        let mut ctx = StateContext::new(&mut agent, 0.2, 0.016);
        state.tick(&mut ctx);
        assert_eq!(
            ctx.take_request(),
            Some(Request::ChangeState(ControllerState::RotatingRight))
        );
    }

    #[test]
    fn escape_faces_away_from_goal() {
        let mut agent = agent();
        // goal straight ahead, escape bearing is behind
        agent.set_goal(Some(Vector2::new(0.0, 2.0)));
        let mut state = CollidingState::default();
        let mut ctx = StateContext::new(&mut agent, 1.0, 0.016);
        state.tick(&mut ctx);
        let request = ctx.take_request();
        assert!(matches!(
            request,
            Some(Request::ChangeState(ControllerState::RotatingRight))
                | Some(Request::ChangeState(ControllerState::RotatingLeft))
        ));

        // already facing away: drive out
        ctx.agent.rotate(180.0);
        let mut ctx = StateContext::new(&mut agent, 2.0, 0.016);
        state.tick(&mut ctx);
        assert_eq!(
            ctx.take_request(),
            Some(Request::ChangeState(ControllerState::Moving))
        );
    }
}
