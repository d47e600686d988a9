// render/flash.rs
// Time-sliced ground flash shown at the end of an episode.

use super::Rgb;

/// Fades the ground from a flash colour back to its neutral colour.
///
/// Advanced once per logic tick by the agent runtime. Starting a new flash
/// restarts the fade, which cancels any flash still in progress.
#[derive(Debug, Clone)]
pub struct GroundFlash {
    neutral: Rgb,
    target: Rgb,
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl GroundFlash {
    /// Idle flash that fades back to `neutral`
    pub fn new(neutral: Rgb) -> Self {
        GroundFlash {
            neutral,
            target: neutral,
            duration: 0.0,
            elapsed: 0.0,
            active: false,
        }
    }

    /// Begins a flash and returns the colour to show immediately
    pub fn start(&mut self, target: Rgb, duration: f32) -> Rgb {
        self.target = target;
        self.duration = duration;
        self.elapsed = 0.0;
        self.active = duration > 0.0;
        target
    }

    /// Advances the fade; returns the colour to apply while a flash runs
    pub fn advance(&mut self, dt: f32) -> Option<Rgb> {
        if !self.active {
            return None;
        }

        self.elapsed += dt;
        let color = self.target.lerp(self.neutral, self.elapsed / self.duration);
        if self.elapsed >= self.duration {
            self.active = false;
        }
        Some(color)
    }

    /// Whether a fade is still in progress
    pub fn is_active(&self) -> bool {
        self.active
    }
}
