// core/geometry.rs

// Pure ground-plane math shared by the planner, the states and the metrics
// recorder. Positions are (x, z) pairs stored as `Vector2`; headings are in
// degrees, 0 facing +z and increasing clockwise (90 faces +x).

use nalgebra::Vector2;

/// Returns the bearing in degrees from `from` to `to`, in (-180, 180].
pub fn bearing_to(from: &Vector2<f32>, to: &Vector2<f32>) -> f32 {
    let delta = to - from;
    delta.x.atan2(delta.y).to_degrees()
}

/// Shortest signed rotation in degrees from `current` to `target`.
///
/// The result lies in (-180, 180]; positive means turn right (clockwise).
pub fn signed_angle_delta(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Euclidean distance between two ground-plane points.
pub fn distance(a: &Vector2<f32>, b: &Vector2<f32>) -> f32 {
    (b - a).norm()
}

/// Wraps any heading into [0, 360).
pub fn normalize_heading(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit vector pointing along `heading`.
pub fn forward(heading: f32) -> Vector2<f32> {
    let radians = heading.to_radians();
    Vector2::new(radians.sin(), radians.cos())
}
