// core/mod.rs

// Declares and exposes the turtle's core: ground-plane geometry, the controller
// mode enum and the agent runtime that owns pose, reward and episode state.

/// Agent runtime and pose
pub mod agent;
/// Ground-plane math
pub mod geometry;
/// Controller modes
pub mod state;

// Re-export key types for a unified API
pub use agent::{AgentRuntime, Pose};
pub use state::ControllerState;
