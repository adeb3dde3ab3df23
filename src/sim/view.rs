//! Read-only render snapshot
//!
//! Everything a presentation layer needs to draw a frame, without touching
//! the live state. Entities appear as one tagged variant per kind.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::state::{BossPhase, EntityId, GamePhase, GameState, PartVariant};

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityView {
    Player {
        rect: Aabb,
        carrying: Option<PartVariant>,
        has_boomerang: bool,
        boosted: bool,
    },
    Cashier {
        rect: Aabb,
    },
    Part {
        id: EntityId,
        rect: Aabb,
        variant: PartVariant,
    },
    Enemy {
        id: EntityId,
        rect: Aabb,
    },
    Thief {
        id: EntityId,
        rect: Aabb,
        carrying: Option<PartVariant>,
    },
    Chair {
        id: EntityId,
        rect: Aabb,
        invincible: bool,
    },
    BoomerangItem {
        id: EntityId,
        rect: Aabb,
    },
    SpeedBoost {
        id: EntityId,
        rect: Aabb,
    },
    Boomerang {
        rect: Aabb,
        returning: bool,
    },
    Boss {
        rect: Aabb,
        health: u32,
        phase: BossPhase,
    },
}

/// Pending long line at the cashier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaitView {
    pub remaining_ms: u64,
    /// Fraction of the in-place wait served, in [0, 1]
    pub progress: f32,
}

/// Boss health bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossView {
    pub health: u32,
    pub max_health: u32,
    pub phase: BossPhase,
}

/// A full frame's worth of drawable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub now: u64,
    pub delivered: u32,
    /// Draw order: ground items, actors, then the player on top
    pub entities: Vec<EntityView>,
    pub wait: Option<WaitView>,
    pub boss: Option<BossView>,
    pub game_over: bool,
}

impl Snapshot {
    /// Number of entities of one kind, keyed by a predicate
    pub fn count(&self, pred: impl Fn(&EntityView) -> bool) -> usize {
        self.entities.iter().filter(|e| pred(e)).count()
    }
}

impl<R: Rng> GameState<R> {
    /// Capture what to draw right now
    pub fn snapshot(&self) -> Snapshot {
        let now = self.now;
        let settings = &self.settings;
        let mut entities = Vec::with_capacity(
            self.parts.len()
                + self.enemies.len()
                + self.thieves.len()
                + self.chairs.len()
                + self.boomerang_items.len()
                + self.speed_items.len()
                + 4,
        );

        entities.push(EntityView::Cashier {
            rect: self.cashier.body.rect(),
        });
        entities.extend(self.parts.iter().map(|p| EntityView::Part {
            id: p.id,
            rect: p.body.rect(),
            variant: p.variant,
        }));
        entities.extend(self.chairs.iter().map(|c| EntityView::Chair {
            id: c.id,
            rect: c.body.rect(),
            invincible: c.is_invincible(now, settings.chair_invincibility_ms),
        }));
        entities.extend(self.boomerang_items.iter().map(|b| EntityView::BoomerangItem {
            id: b.id,
            rect: b.body.rect(),
        }));
        entities.extend(self.speed_items.iter().map(|s| EntityView::SpeedBoost {
            id: s.id,
            rect: s.body.rect(),
        }));
        entities.extend(self.enemies.iter().map(|e| EntityView::Enemy {
            id: e.id,
            rect: e.body.rect(),
        }));
        entities.extend(self.thieves.iter().map(|t| EntityView::Thief {
            id: t.id,
            rect: t.body.rect(),
            carrying: t.carried(),
        }));
        if let Some(boss) = &self.boss {
            entities.push(EntityView::Boss {
                rect: boss.body.rect(),
                health: boss.health,
                phase: boss.phase,
            });
        }
        if let Some(proj) = &self.projectile {
            entities.push(EntityView::Boomerang {
                rect: proj.body.rect(),
                returning: proj.returning,
            });
        }
        entities.push(EntityView::Player {
            rect: self.player.body.rect(),
            carrying: self.player.carrying,
            has_boomerang: self.player.has_boomerang,
            boosted: self.player.is_boosted(now),
        });

        let wait = self.timers.delivery_wait.map(|w| WaitView {
            remaining_ms: w.remaining(now, settings.wait_time_ms),
            progress: w.progress(now, settings.wait_time_ms),
        });
        let boss = self.boss.as_ref().map(|b| BossView {
            health: b.health,
            max_health: settings.boss_hit_points,
            phase: b.phase,
        });

        Snapshot {
            phase: self.phase,
            now,
            delivered: self.delivered,
            entities,
            wait,
            boss,
            game_over: self.is_game_over(),
        }
    }
}
