//! Quadratic Bezier geometry for the boomerang's flight path
//!
//! A curve is defined by:
//! - start: launch point (t = 0)
//! - control: pulls the path outward
//! - end: landing point (t = 1)

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A quadratic Bezier segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticBezier {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
}

impl QuadraticBezier {
    pub fn new(start: Vec2, control: Vec2, end: Vec2) -> Self {
        Self {
            start,
            control,
            end,
        }
    }

    /// Closed loop out from `origin` and back again
    ///
    /// The control point sits `reach` along `aim` and `lift` pixels up
    /// (screen y grows downward). A zero aim falls back to +x.
    pub fn round_trip(origin: Vec2, aim: Vec2, reach: f32, lift: f32) -> Self {
        let dir = aim.try_normalize().unwrap_or(Vec2::X);
        let control = origin + dir * reach + Vec2::new(0.0, -lift);
        Self::new(origin, control, origin)
    }

    /// Point on the curve at parameter `t` (clamped to [0, 1])
    pub fn point_at(&self, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        self.start * (u * u) + self.control * (2.0 * u * t) + self.end * (t * t)
    }

    /// Farthest the curve gets from its start point (sampled)
    pub fn reach(&self) -> f32 {
        (0..=32)
            .map(|i| self.point_at(i as f32 / 32.0).distance(self.start))
            .fold(0.0, f32::max)
    }
}
