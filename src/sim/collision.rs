//! Overlap tests for sprites
//!
//! Every interaction in the yard is an overlap question. Entities carry a
//! center and a size; the box test runs first, and when a pixel mask is
//! registered for a sprite kind the overlapping region is checked pixel by
//! pixel so irregular sprites only collide where they are actually opaque.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap: touching edges do not count
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Whether the rectangle lies entirely inside `[0, w] x [0, h]`
    pub fn within(&self, width: f32, height: f32) -> bool {
        self.min.x >= 0.0 && self.min.y >= 0.0 && self.max.x <= width && self.max.y <= height
    }
}

/// Position and extent of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub center: Vec2,
    pub size: Vec2,
}

impl Body {
    pub fn new(center: Vec2, size: f32) -> Self {
        Self {
            center,
            size: Vec2::splat(size),
        }
    }

    pub fn rect(&self) -> Aabb {
        Aabb::from_center(self.center, self.size)
    }

    /// Keep the whole rectangle on screen
    pub fn clamp_to(&mut self, width: f32, height: f32) {
        let half = self.size * 0.5;
        self.center.x = self.center.x.clamp(half.x, (width - half.x).max(half.x));
        self.center.y = self.center.y.clamp(half.y, (height - half.y).max(half.y));
    }

    /// Integer pixel rectangle `(left, top, width, height)` used for mask tests
    fn pixel_rect(&self) -> (i32, i32, i32, i32) {
        let rect = self.rect();
        (
            rect.min.x.round() as i32,
            rect.min.y.round() as i32,
            self.size.x.round() as i32,
            self.size.y.round() as i32,
        )
    }
}

/// Pixel occupancy bitmap for a sprite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl SpriteMask {
    /// Build a mask by asking `solid(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut solid: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(solid(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    /// Fully opaque mask
    pub fn filled(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// Ellipse inscribed in the sprite rectangle
    pub fn ellipse(width: u32, height: u32) -> Self {
        let rx = width as f32 / 2.0;
        let ry = height as f32 / 2.0;
        Self::from_fn(width, height, |x, y| {
            let dx = (x as f32 + 0.5 - rx) / rx;
            let dy = (y as f32 + 0.5 - ry) / ry;
            dx * dx + dy * dy <= 1.0
        })
    }

    /// Mask from RGBA8 pixels: opaque where alpha exceeds `threshold`
    ///
    /// Returns `None` when `rgba` is not `width * height * 4` bytes long.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8], threshold: u8) -> Option<Self> {
        if rgba.len() != (width * height * 4) as usize {
            return None;
        }
        Some(Self::from_fn(width, height, |x, y| {
            rgba[((y * width + x) * 4 + 3) as usize] > threshold
        }))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at `(x, y)` is solid; out of range is empty
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[(y as u32 * self.width + x as u32) as usize]
    }

    /// Number of solid pixels
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}

/// Sprite families that may carry a pixel mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKind {
    Player,
    Part(u8),
    Enemy,
    Thief,
    Chair,
    Boomerang,
    SpeedBoost,
    Boss,
}

/// Registered masks by sprite kind; kinds without one collide as boxes
#[derive(Debug, Clone, Default)]
pub struct MaskSet {
    masks: HashMap<SpriteKind, SpriteMask>,
}

impl MaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: SpriteKind, mask: SpriteMask) {
        self.masks.insert(kind, mask);
    }

    pub fn get(&self, kind: SpriteKind) -> Option<&SpriteMask> {
        self.masks.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Overlap test between two sprites, pixel-exact where masks exist
    pub fn overlap(&self, a: &Body, a_kind: SpriteKind, b: &Body, b_kind: SpriteKind) -> bool {
        bodies_overlap(a, self.get(a_kind), b, self.get(b_kind))
    }
}

/// Box test, refined by masks when either side has one
///
/// A missing mask behaves like a fully opaque rectangle, so two unmasked
/// bodies reduce to a plain rectangle overlap.
pub fn bodies_overlap(
    a: &Body,
    a_mask: Option<&SpriteMask>,
    b: &Body,
    b_mask: Option<&SpriteMask>,
) -> bool {
    let (ax, ay, aw, ah) = a.pixel_rect();
    let (bx, by, bw, bh) = b.pixel_rect();

    let left = ax.max(bx);
    let right = (ax + aw).min(bx + bw);
    let top = ay.max(by);
    let bottom = (ay + ah).min(by + bh);
    if left >= right || top >= bottom {
        return false;
    }
    if a_mask.is_none() && b_mask.is_none() {
        return true;
    }

    for y in top..bottom {
        for x in left..right {
            let a_solid = a_mask.is_none_or(|m| m.get(x - ax, y - ay));
            let b_solid = b_mask.is_none_or(|m| m.get(x - bx, y - by));
            if a_solid && b_solid {
                return true;
            }
        }
    }
    false
}

/// Plain rectangle test, for zones that never use masks (the cashier)
pub fn rects_overlap(a: &Body, b: &Body) -> bool {
    bodies_overlap(a, None, b, None)
}
