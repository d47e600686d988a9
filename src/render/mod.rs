//! Visual feedback sinks
//!
//! The controller never renders anything itself. States flip a three-valued
//! indicator and episode resets fade the ground colour; whoever hosts the
//! simulation decides what those mean on screen.

mod flash;

pub use flash::GroundFlash;

use serde::{Deserialize, Serialize};

/// Linear RGB colour with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Rgb {
    /// Pure green, flashed after a rewarding episode
    pub const GREEN: Rgb = Rgb { r: 0.0, g: 1.0, b: 0.0 };
    /// Pure red, flashed after a penalised episode
    pub const RED: Rgb = Rgb { r: 1.0, g: 0.0, b: 0.0 };
    /// Pure blue, the turtle's resting colour
    pub const BLUE: Rgb = Rgb { r: 0.0, g: 0.0, b: 1.0 };
    /// Neutral grey ground
    pub const GREY: Rgb = Rgb { r: 0.5, g: 0.5, b: 0.5 };

    /// Create a colour from its channels
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb { r, g, b }
    }

    /// Interpolates toward `other`; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

/// Semantic indicator colours consumed by the states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorColor {
    /// Normal operation
    Default,
    /// Touching a wall
    Alert,
    /// Goal reached
    Success,
}

impl IndicatorColor {
    /// Concrete colour used by the headless host
    pub fn rgb(self) -> Rgb {
        match self {
            IndicatorColor::Default => Rgb::BLUE,
            IndicatorColor::Alert => Rgb::RED,
            IndicatorColor::Success => Rgb::GREEN,
        }
    }
}

/// Render sink driven by the agent runtime
pub trait VisualSink {
    /// Sets the turtle's indicator colour
    fn set_indicator(&mut self, color: IndicatorColor);
    /// Sets the ground colour; called once per tick while a flash runs
    fn set_ground_color(&mut self, color: Rgb);
}

/// Sink that only remembers the latest values, for headless runs
#[derive(Debug, Clone)]
pub struct HeadlessVisuals {
    /// Last indicator set
    pub indicator: IndicatorColor,
    /// Last ground colour set
    pub ground: Rgb,
}

impl HeadlessVisuals {
    /// Starts with the default indicator and the given ground colour
    pub fn new(ground: Rgb) -> Self {
        HeadlessVisuals {
            indicator: IndicatorColor::Default,
            ground,
        }
    }
}

impl VisualSink for HeadlessVisuals {
    fn set_indicator(&mut self, color: IndicatorColor) {
        log::trace!("indicator -> {:?}", color);
        self.indicator = color;
    }

    fn set_ground_color(&mut self, color: Rgb) {
        self.ground = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_colours_are_distinct() {
        assert_eq!(IndicatorColor::Default.rgb(), Rgb::BLUE);
        assert_eq!(IndicatorColor::Alert.rgb(), Rgb::RED);
        assert_eq!(IndicatorColor::Success.rgb(), Rgb::GREEN);
    }

    #[test]
    fn lerp_clamps_and_interpolates() {
        let mid = Rgb::RED.lerp(Rgb::BLUE, 0.5);
        assert_eq!(mid, Rgb::new(0.5, 0.0, 0.5));
        assert_eq!(Rgb::RED.lerp(Rgb::BLUE, 3.0), Rgb::BLUE);
        assert_eq!(Rgb::RED.lerp(Rgb::BLUE, -1.0), Rgb::RED);
    }
}
