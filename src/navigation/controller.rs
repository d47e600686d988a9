// src/navigation/controller.rs
// FSM driver: owns the active mode and the state table, runs the transition
// policy, dispatches ticks and routes contact events. The agent runtime is
// borrowed per call and only touched through its entry points.

use log::{debug, info};
use std::collections::HashMap;

use super::planner::{ManualInput, Planner};
use super::states::{default_states, Request, StateContext, TurtleState};
use super::{ColliderTag, ContactEvent};
use crate::config::ControllerConfig;
use crate::core::{AgentRuntime, ControllerState};

/// Finite state machine driving one turtle
pub struct Controller {
    config: ControllerConfig,
    states: HashMap<ControllerState, Box<dyn TurtleState>>,
    current: ControllerState,
    state_enter_time: f32,
    clock: f32,
    is_colliding: bool,
    planner: Planner,
}

impl Controller {
    /// Builds the controller with one behaviour per mode, starting in Idle
    pub fn new(config: ControllerConfig) -> Self {
        let states = default_states()
            .into_iter()
            .map(|state| (state.kind(), state))
            .collect();
        let planner = Planner::new(config.autonomous);

        Controller {
            config,
            states,
            current: ControllerState::Idle,
            state_enter_time: 0.0,
            clock: 0.0,
            is_colliding: false,
            planner,
        }
    }

    /// Active mode
    pub fn current_state(&self) -> ControllerState {
        self.current
    }

    /// Whether a wall is currently being touched
    pub fn is_colliding(&self) -> bool {
        self.is_colliding
    }

    /// Simulated time at which the active mode was entered
    pub fn state_enter_time(&self) -> f32 {
        self.state_enter_time
    }

    /// Simulated seconds of logic ticks processed so far
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Switches between goal seeking and manual control
    pub fn set_autonomous(&mut self, autonomous: bool) {
        self.planner.set_autonomous(autonomous);
    }

    /// Operator input used while not autonomous
    pub fn set_manual_input(&mut self, input: ManualInput) {
        self.planner.set_input(input);
    }

    /// Moves to `new_state`. Returns false, doing nothing at all, when it is
    /// already active. Otherwise runs exit, enter, charges one step penalty
    /// and then honours whatever the hooks requested.
    pub fn change_state(&mut self, new_state: ControllerState, agent: &mut AgentRuntime) -> bool {
        if self.current == new_state {
            return false;
        }

        if self.config.debug_mode {
            debug!("Turtle FSM: {} -> {}", self.current, new_state);
        }

        let mut ctx = StateContext::new(agent, self.clock, 0.0);
        if let Some(state) = self.states.get_mut(&self.current) {
            state.exit(&mut ctx);
        }

        self.current = new_state;
        self.state_enter_time = self.clock;

        if let Some(state) = self.states.get_mut(&self.current) {
            state.enter(&mut ctx);
        }
        let request = ctx.take_request();

        agent.add_step_penalty();
        self.apply(request, agent);
        true
    }

    /// Ends the episode as a success and starts the next one. Leaves the
    /// agent with zero steps and reward, a fresh goal, and the controller Idle.
    /// A stopped agent stays stopped.
    pub fn reset_episode(&mut self, agent: &mut AgentRuntime) {
        if !self.is_running(agent) {
            return;
        }
        info!("Resetting episode");
        agent.finish_episode(true);
        self.change_state(ControllerState::Idle, agent);
        self.is_colliding = false;
        agent.begin_episode();
    }

    /// Logic tick: transition policy first, then the active state's tick
    pub fn tick(&mut self, agent: &mut AgentRuntime, dt: f32) {
        if !self.is_running(agent) {
            return;
        }
        self.clock += dt;

        if self.policy_enabled() {
            if let Some(target) = self.planner.decide(agent) {
                self.change_state(target, agent);
            }
        }

        self.dispatch(agent, dt, |state, ctx| state.tick(ctx));
    }

    /// Physics tick: only the active state's integration step
    pub fn physics_tick(&mut self, agent: &mut AgentRuntime, dt: f32) {
        if !self.is_running(agent) {
            return;
        }
        self.dispatch(agent, dt, |state, ctx| state.physics_tick(ctx));
    }

    /// Routes a contact event from the physics layer
    pub fn handle_event(&mut self, event: ContactEvent, agent: &mut AgentRuntime) {
        match event {
            ContactEvent::TriggerEnter(tag) => self.on_trigger_enter(tag, agent),
            ContactEvent::CollisionEnter(tag) => self.on_collision_enter(tag, agent),
            ContactEvent::CollisionStay(tag) => self.on_collision_stay(tag, agent),
            ContactEvent::CollisionExit(tag) => self.on_collision_exit(tag, agent),
        }
    }

    /// Trigger volume entered; the goal forces ReachedGoal
    pub fn on_trigger_enter(&mut self, tag: ColliderTag, agent: &mut AgentRuntime) {
        if tag != ColliderTag::Goal || !self.is_running(agent) {
            return;
        }
        self.change_state(ControllerState::ReachedGoal, agent);
        self.dispatch(agent, 0.0, |state, ctx| state.on_goal_trigger(ctx));
    }

    /// Contact began; walls force Colliding
    pub fn on_collision_enter(&mut self, tag: ColliderTag, agent: &mut AgentRuntime) {
        if tag != ColliderTag::Wall || !self.is_running(agent) {
            return;
        }
        self.is_colliding = true;
        self.change_state(ControllerState::Colliding, agent);
        self.dispatch(agent, 0.0, |state, ctx| state.on_wall_enter(ctx));
    }

    /// Contact persists; no forced transition
    pub fn on_collision_stay(&mut self, tag: ColliderTag, agent: &mut AgentRuntime) {
        if tag != ColliderTag::Wall || !self.is_running(agent) {
            return;
        }
        self.is_colliding = true;
        self.dispatch(agent, 0.0, |state, ctx| state.on_wall_stay(ctx));
    }

    /// Contact ended; leaves Colliding for Idle if still there
    pub fn on_collision_exit(&mut self, tag: ColliderTag, agent: &mut AgentRuntime) {
        if tag != ColliderTag::Wall || !self.is_running(agent) {
            return;
        }
        self.is_colliding = false;
        if self.current == ControllerState::Colliding {
            self.change_state(ControllerState::Idle, agent);
        }
        self.dispatch(agent, 0.0, |state, ctx| state.on_wall_exit(ctx));
    }

    /// Teardown: exits the active mode and drops every behaviour. Ticks and
    /// events are no-ops afterwards.
    pub fn shutdown(&mut self, agent: &mut AgentRuntime) {
        let mut ctx = StateContext::new(agent, self.clock, 0.0);
        if let Some(state) = self.states.get_mut(&self.current) {
            state.exit(&mut ctx);
        }
        self.states.clear();
        info!("Turtle FSM shut down");
    }

    // Stopped agents and a torn-down state table ignore every input
    fn is_running(&self, agent: &AgentRuntime) -> bool {
        agent.is_active() && !self.states.is_empty()
    }

    fn policy_enabled(&self) -> bool {
        match self.current {
            ControllerState::ReachedGoal => false,
            ControllerState::Colliding => !self.config.hold_policy_while_colliding,
            _ => true,
        }
    }

    // Runs one hook on the active state, then applies its request
    fn dispatch<F>(&mut self, agent: &mut AgentRuntime, dt: f32, hook: F)
    where
        F: FnOnce(&mut dyn TurtleState, &mut StateContext<'_>),
    {
        let Some(state) = self.states.get_mut(&self.current) else {
            return;
        };
        let mut ctx = StateContext::new(agent, self.clock, dt);
        hook(state.as_mut(), &mut ctx);
        let request = ctx.take_request();
        self.apply(request, agent);
    }

    fn apply(&mut self, request: Option<Request>, agent: &mut AgentRuntime) {
        match request {
            Some(Request::ChangeState(state)) => {
                self.change_state(state, agent);
            }
            Some(Request::ResetEpisode) => self.reset_episode(agent),
            None => {}
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("current", &self.current)
            .field("state_enter_time", &self.state_enter_time)
            .field("clock", &self.clock)
            .field("is_colliding", &self.is_colliding)
            .field("states", &self.states.len())
            .finish()
    }
}
