//! Junkyard Dash - A top-down junkyard arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, timers, session state)
//! - `settings`: Data-driven game balance and subsystem toggles
//!
//! Rendering, audio and raw input live outside this crate. A presentation
//! layer feeds [`sim::TickInput`] plus a millisecond timestamp into
//! [`sim::tick`] once per frame and draws from [`sim::GameState::snapshot`].

pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError, Variant};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target simulation rate (updates per second)
    pub const TICK_RATE: u32 = 60;
    /// Nominal milliseconds between ticks at the target rate
    pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

    /// Number of distinct part sprites
    pub const PART_VARIANTS: u8 = 3;

    /// Sprite dimensions (pixels)
    pub const PLAYER_SIZE: f32 = 30.0;
    pub const PART_SIZE: f32 = 20.0;
    pub const ENEMY_SIZE: f32 = 30.0;
    pub const THIEF_SIZE: f32 = 30.0;
    pub const CASHIER_SIZE: f32 = 30.0;
    pub const CHAIR_SIZE: f32 = 20.0;
    pub const BOOMERANG_SIZE: f32 = 20.0;
    pub const SPEED_BOOST_SIZE: f32 = 20.0;
    pub const BOSS_SIZE: f32 = 80.0;

    /// Margin kept between random spawns and the screen edge
    pub const SPAWN_MARGIN: i32 = 50;
    /// Parts keep a wider margin on the right/bottom edges
    pub const PART_SPAWN_FAR_MARGIN: i32 = 150;
    /// Cashier center offset from the bottom-left corner
    pub const CASHIER_INSET: f32 = 20.0;
    /// Replacement enemies enter from the top-right corner, this far in
    pub const ENEMY_ENTRY_INSET: f32 = 15.0;

    /// Rejection-sampling attempts before falling back to the far corner
    pub const RESPAWN_ATTEMPTS: u32 = 64;
}

/// Unit vector pointing from `from` toward `to` (zero if they coincide)
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Unit heading for an angle in radians
#[inline]
pub fn heading_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
