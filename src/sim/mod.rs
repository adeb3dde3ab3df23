//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied millisecond timestamps only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod curve;
pub mod state;
pub mod tick;
pub mod timers;
pub mod view;

pub use collision::{Aabb, Body, MaskSet, SpriteKind, SpriteMask, bodies_overlap, rects_overlap};
pub use curve::QuadraticBezier;
pub use state::{
    Boss, BossPhase, Cashier, Chair, Enemy, EntityId, GameEvent, GamePhase, GameState, Part,
    PartVariant, Player, Projectile, Thief, ThiefState,
};
pub use tick::{TickInput, tick};
pub use timers::{DeliveryWait, Interval, Millis, RespawnQueue, Scheduler};
pub use view::{BossView, EntityView, Snapshot, WaitView};
