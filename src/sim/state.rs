//! Game state and core simulation types
//!
//! The controller owns every live entity. Entities refer to each other only
//! through [`EntityId`] handles, so removing one never leaves a dangling
//! reference behind.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Body, MaskSet, SpriteKind};
use super::curve::QuadraticBezier;
use super::timers::{Millis, Scheduler, has_elapsed};
use crate::consts::*;
use crate::{Settings, direction_to, distance, heading_from_angle};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Intro crawl, waiting for confirm (or for it to finish)
    Intro,
    /// Active gameplay
    Playing,
    /// "SUPER BOOMER!" banner; the world is frozen until the boss arrives
    BossWarning { since: Millis },
    /// Caught; waiting for confirm to restart
    GameOver,
}

/// Handle to a live entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Which part sprite a part (or a carried part) shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartVariant(pub u8);

impl PartVariant {
    pub fn sprite(self) -> SpriteKind {
        SpriteKind::Part(self.0)
    }
}

/// The player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// The part held overhead, if any (at most one)
    pub carrying: Option<PartVariant>,
    pub has_boomerang: bool,
    pub speed_multiplier: f32,
    /// Absolute time the current speed boost runs out
    pub boost_end_time: Millis,
}

impl Player {
    pub fn new(center: Vec2) -> Self {
        Self {
            body: Body::new(center, PLAYER_SIZE),
            carrying: None,
            has_boomerang: false,
            speed_multiplier: 1.0,
            boost_end_time: 0,
        }
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }

    pub fn is_boosted(&self, now: Millis) -> bool {
        now < self.boost_end_time
    }

    /// Move by `intent` (unit steps per axis) and stay on screen
    pub fn steer(&mut self, intent: Vec2, now: Millis, settings: &Settings) {
        if now > self.boost_end_time {
            self.speed_multiplier = 1.0;
        }
        let speed = settings.player_speed * self.speed_multiplier;
        self.body.center += intent * speed;
        self.body.clamp_to(settings.screen_width, settings.screen_height);
    }

    pub fn apply_boost(&mut self, now: Millis, settings: &Settings) {
        self.speed_multiplier = settings.speed_boost_multiplier;
        self.boost_end_time = now + settings.speed_boost_duration_ms;
    }
}

/// A collectible part lying in the yard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: EntityId,
    pub body: Body,
    pub variant: PartVariant,
    /// The thief that dropped this part may not pick it straight back up
    pub forbidden_thief: Option<EntityId>,
}

impl Part {
    pub fn is_forbidden_to(&self, thief: EntityId) -> bool {
        self.forbidden_thief == Some(thief)
    }
}

/// A Boomer roaming toward the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub body: Body,
}

/// What a thief is doing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThiefState {
    /// Hunting for a part
    Seeking,
    /// Holding a part until `drop_at`
    Carrying { variant: PartVariant, drop_at: Millis },
}

/// A thief that steals parts and drops them later
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thief {
    pub id: EntityId,
    pub body: Body,
    /// Unit heading used when there is no target
    pub heading: Vec2,
    pub state: ThiefState,
    /// No stealing before this time
    pub cooldown_until: Millis,
}

impl Thief {
    pub fn is_carrying(&self) -> bool {
        matches!(self.state, ThiefState::Carrying { .. })
    }

    pub fn carried(&self) -> Option<PartVariant> {
        match self.state {
            ThiefState::Carrying { variant, .. } => Some(variant),
            ThiefState::Seeking => None,
        }
    }

    pub fn drop_time(&self) -> Option<Millis> {
        match self.state {
            ThiefState::Carrying { drop_at, .. } => Some(drop_at),
            ThiefState::Seeking => None,
        }
    }

    pub fn can_steal(&self, now: Millis) -> bool {
        !self.is_carrying() && now >= self.cooldown_until
    }

    pub fn take(&mut self, variant: PartVariant, drop_at: Millis) {
        self.state = ThiefState::Carrying { variant, drop_at };
    }

    /// Let go of the carried part if its time has come
    pub fn release_if_due(&mut self, now: Millis, cooldown: Millis) -> Option<PartVariant> {
        match self.state {
            ThiefState::Carrying { variant, drop_at } if now >= drop_at => {
                self.state = ThiefState::Seeking;
                self.cooldown_until = now + cooldown;
                Some(variant)
            }
            _ => None,
        }
    }
}

/// The delivery point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cashier {
    pub body: Body,
}

/// A thrown chair; solid to the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chair {
    pub id: EntityId,
    pub body: Body,
    pub spawn_time: Millis,
}

impl Chair {
    /// Fresh chairs survive enemy contact for a while
    pub fn is_invincible(&self, now: Millis, window: Millis) -> bool {
        !has_elapsed(now, self.spawn_time, window)
    }
}

/// Boomerang lying on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoomerangItem {
    pub id: EntityId,
    pub body: Body,
}

/// Speed boost (NOS) lying on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedBoostItem {
    pub id: EntityId,
    pub body: Body,
}

/// A boomerang in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub body: Body,
    pub path: QuadraticBezier,
    /// Curve parameter in [0, 1]
    pub t: f32,
    pub step: f32,
    pub returning: bool,
}

impl Projectile {
    /// Throw from `origin` toward `aim_at`
    pub fn launch(origin: Vec2, aim_at: Vec2, settings: &Settings) -> Self {
        let path = QuadraticBezier::round_trip(
            origin,
            aim_at - origin,
            settings.boomerang_reach,
            settings.boomerang_lift,
        );
        Self {
            body: Body::new(origin, BOOMERANG_SIZE),
            path,
            t: 0.0,
            step: settings.boomerang_step,
            returning: false,
        }
    }

    /// Advance one tick; false once it is back in hand
    pub fn advance(&mut self) -> bool {
        if !self.returning {
            self.t += self.step;
            if self.t >= 1.0 {
                self.t = 1.0;
                self.returning = true;
            }
        } else {
            self.t -= self.step;
            if self.t <= 0.0 {
                self.t = 0.0;
                return false;
            }
        }
        self.body.center = self.path.point_at(self.t).round();
        true
    }
}

/// Super Boomer behavior phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Standing still, winding up
    Charging,
    /// Dashing along a heading locked when the charge finished
    Sprinting {
        heading: Vec2,
        target: Vec2,
        /// Distance left before the sprint counts as arrived
        remaining: f32,
    },
    /// Slowly tracking the player
    Pursuing,
}

impl BossPhase {
    pub fn name(&self) -> &'static str {
        match self {
            BossPhase::Charging => "charging",
            BossPhase::Sprinting { .. } => "sprinting",
            BossPhase::Pursuing => "pursuing",
        }
    }
}

/// The Super Boomer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub body: Body,
    pub health: u32,
    pub phase: BossPhase,
    pub phase_since: Millis,
    pub last_chair_throw: Millis,
}

impl Boss {
    pub fn new(center: Vec2, now: Millis, settings: &Settings) -> Self {
        Self {
            body: Body::new(center, BOSS_SIZE),
            health: settings.boss_hit_points,
            phase: BossPhase::Charging,
            phase_since: now,
            last_chair_throw: now,
        }
    }

    fn enter(&mut self, phase: BossPhase, now: Millis) {
        self.phase = phase;
        self.phase_since = now;
    }

    /// Run the charge/sprint/pursue machine for one tick
    ///
    /// Returns true when a chair should be thrown from the boss position.
    pub fn step(&mut self, player_center: Vec2, now: Millis, settings: &Settings) -> bool {
        let (w, h) = (settings.screen_width, settings.screen_height);
        match self.phase {
            BossPhase::Charging => {
                if has_elapsed(now, self.phase_since, settings.boss_charge_ms) {
                    let heading = direction_to(self.body.center, player_center);
                    let remaining = distance(self.body.center, player_center);
                    self.enter(
                        BossPhase::Sprinting {
                            heading,
                            target: player_center,
                            remaining,
                        },
                        now,
                    );
                }
            }
            BossPhase::Sprinting {
                heading,
                target,
                remaining,
            } => {
                let speed = settings.boss_sprint_speed;
                self.body.center += heading * speed;
                self.body.clamp_to(w, h);
                let remaining = remaining - speed;
                if distance(self.body.center, target) < speed || remaining <= 0.0 {
                    self.enter(BossPhase::Pursuing, now);
                } else {
                    self.phase = BossPhase::Sprinting {
                        heading,
                        target,
                        remaining,
                    };
                }
            }
            BossPhase::Pursuing => {
                self.body.center +=
                    direction_to(self.body.center, player_center) * settings.boss_pursuit_speed;
                self.body.clamp_to(w, h);
                if has_elapsed(now, self.phase_since, settings.boss_charge_ms) {
                    self.enter(BossPhase::Charging, now);
                }
            }
        }

        if has_elapsed(now, self.last_chair_throw, settings.boss_chair_interval_ms) {
            self.last_chair_throw = now;
            true
        } else {
            false
        }
    }

    /// Take one boomerang hit; true when that finishes it off
    pub fn take_hit(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.health == 0
    }
}

/// Things that happened during a tick, for audio and presentation hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    IntroDismissed,
    SessionReset,
    PartPickedUp { variant: PartVariant },
    PartStolen { thief: EntityId, from_player: bool },
    PartDropped { thief: EntityId, part: EntityId },
    LongLineStarted { next_available_time: Millis },
    Delivered { total: u32 },
    ThiefSpawned { thief: EntityId },
    ChairDropped { chair: EntityId },
    ChairCleared { chair: EntityId },
    BoomerangSpawned,
    BoomerangPickedUp,
    BoomerangThrown,
    BoomerangReturned,
    EnemyKilled { enemy: EntityId },
    EnemyRespawned { enemy: EntityId },
    SpeedBoostSpawned,
    SpeedBoostPickedUp,
    BossWarning,
    BossSpawned,
    BossHit { health: u32 },
    BossDefeated,
    GameOver,
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState<R = Pcg32> {
    pub settings: Settings,
    pub rng: R,
    pub phase: GamePhase,
    /// When the session (or the last reset) began
    pub started_at: Millis,
    /// Timestamp of the most recent tick
    pub now: Millis,
    /// Simulated (non-frozen) ticks since start
    pub time_ticks: u64,
    /// Parts delivered this run
    pub delivered: u32,
    pub player: Player,
    pub cashier: Cashier,
    /// Live entities (sorted by id for determinism)
    pub parts: Vec<Part>,
    pub enemies: Vec<Enemy>,
    pub thieves: Vec<Thief>,
    pub chairs: Vec<Chair>,
    pub boomerang_items: Vec<BoomerangItem>,
    pub speed_items: Vec<SpeedBoostItem>,
    /// At most one boomerang flies at a time
    pub projectile: Option<Projectile>,
    pub boss: Option<Boss>,
    pub timers: Scheduler,
    pub masks: MaskSet,
    /// Last known pointer position, for aiming throws
    pub pointer: Vec2,
    /// Events produced by the latest tick
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState<Pcg32> {
    /// Create a new session with a seeded PCG stream
    pub fn new(seed: u64, settings: Settings, now: Millis) -> Self {
        Self::with_rng(Pcg32::seed_from_u64(seed), settings, now)
    }
}

impl<R: Rng> GameState<R> {
    /// Create a new session drawing randomness from `rng`
    pub fn with_rng(rng: R, settings: Settings, now: Millis) -> Self {
        let center = Vec2::new(settings.screen_width / 2.0, settings.screen_height / 2.0);
        let cashier = Cashier {
            body: Body::new(
                Vec2::new(CASHIER_INSET, settings.screen_height - CASHIER_INSET),
                CASHIER_SIZE,
            ),
        };
        let timers = Scheduler::new(&settings, now);
        let mut state = Self {
            settings,
            rng,
            phase: GamePhase::Intro,
            started_at: now,
            now,
            time_ticks: 0,
            delivered: 0,
            player: Player::new(center),
            cashier,
            parts: Vec::new(),
            enemies: Vec::new(),
            thieves: Vec::new(),
            chairs: Vec::new(),
            boomerang_items: Vec::new(),
            speed_items: Vec::new(),
            projectile: None,
            boss: None,
            timers,
            masks: MaskSet::new(),
            pointer: center,
            events: Vec::new(),
            next_id: 1,
        };
        state.populate();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn screen_center(&self) -> Vec2 {
        Vec2::new(self.settings.screen_width / 2.0, self.settings.screen_height / 2.0)
    }

    /// Clear the yard and lay out a fresh run
    pub fn reset(&mut self, now: Millis) {
        self.started_at = now;
        self.now = now;
        self.time_ticks = 0;
        self.delivered = 0;
        self.player = Player::new(self.screen_center());
        self.parts.clear();
        self.enemies.clear();
        self.thieves.clear();
        self.chairs.clear();
        self.boomerang_items.clear();
        self.speed_items.clear();
        self.projectile = None;
        self.boss = None;
        self.timers = Scheduler::new(&self.settings, now);
        self.populate();
        self.phase = GamePhase::Playing;
        log::info!("Session reset at {now} ms");
    }

    fn populate(&mut self) {
        for _ in 0..self.settings.num_parts {
            self.spawn_random_part();
        }

        let center = self.screen_center();
        let safe = self.settings.respawn_safe_distance;
        for _ in 0..self.settings.num_enemies {
            let pos = self.random_point_away_from(center, safe);
            self.spawn_enemy(pos);
        }

        let pos = self.random_point();
        self.spawn_thief(pos);

        if self.settings.boomerang_enabled {
            let pos = self.random_point();
            self.spawn_boomerang_item(pos);
        }
    }

    // --- Randomness ---

    /// True with probability `p`
    pub fn roll(&mut self, p: f64) -> bool {
        self.rng.random::<f64>() < p
    }

    /// Uniform integer point in `[lo, w - hi_margin] x [lo, h - hi_margin]`
    fn random_point_in(&mut self, lo: i32, hi_margin: i32) -> Vec2 {
        let hi_x = (self.settings.screen_width as i32 - hi_margin).max(lo);
        let hi_y = (self.settings.screen_height as i32 - hi_margin).max(lo);
        let x = self.rng.random_range(lo..=hi_x);
        let y = self.rng.random_range(lo..=hi_y);
        Vec2::new(x as f32, y as f32)
    }

    /// Random spawn point away from the screen edges
    pub fn random_point(&mut self) -> Vec2 {
        self.random_point_in(SPAWN_MARGIN, SPAWN_MARGIN)
    }

    /// Random spawn point for parts (kept clear of the right/bottom edges)
    pub fn random_part_point(&mut self) -> Vec2 {
        self.random_point_in(SPAWN_MARGIN, PART_SPAWN_FAR_MARGIN)
    }

    /// Random spawn point strictly farther than `min_dist` from `avoid`
    pub fn random_point_away_from(&mut self, avoid: Vec2, min_dist: f32) -> Vec2 {
        for _ in 0..RESPAWN_ATTEMPTS {
            let p = self.random_point();
            if distance(p, avoid) > min_dist {
                return p;
            }
        }
        // Fall back to whichever spawn-area corner is farthest away
        let lo = SPAWN_MARGIN as f32;
        let hi_x = self.settings.screen_width - lo;
        let hi_y = self.settings.screen_height - lo;
        [
            Vec2::new(lo, lo),
            Vec2::new(hi_x, lo),
            Vec2::new(lo, hi_y),
            Vec2::new(hi_x, hi_y),
        ]
        .into_iter()
        .max_by(|a, b| distance(*a, avoid).total_cmp(&distance(*b, avoid)))
        .unwrap_or(Vec2::new(lo, lo))
    }

    pub fn random_heading(&mut self) -> Vec2 {
        heading_from_angle(self.rng.random_range(0.0..std::f32::consts::TAU))
    }

    pub fn random_part_variant(&mut self) -> PartVariant {
        PartVariant(self.rng.random_range(0..PART_VARIANTS))
    }

    /// Absolute time a thief that grabs a part now will drop it
    pub fn random_drop_time(&mut self, now: Millis) -> Millis {
        let (lo, hi) = (self.settings.thief_drop_min_ms, self.settings.thief_drop_max_ms);
        now + self.rng.random_range(lo..=hi.max(lo))
    }

    // --- Spawning ---

    pub fn spawn_part(
        &mut self,
        center: Vec2,
        variant: PartVariant,
        forbidden_thief: Option<EntityId>,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.parts.push(Part {
            id,
            body: Body::new(center, PART_SIZE),
            variant,
            forbidden_thief,
        });
        id
    }

    pub fn spawn_random_part(&mut self) -> EntityId {
        let pos = self.random_part_point();
        let variant = self.random_part_variant();
        self.spawn_part(pos, variant, None)
    }

    pub fn spawn_enemy(&mut self, center: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            body: Body::new(center, ENEMY_SIZE),
        });
        id
    }

    pub fn spawn_thief(&mut self, center: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let heading = self.random_heading();
        self.thieves.push(Thief {
            id,
            body: Body::new(center, THIEF_SIZE),
            heading,
            state: ThiefState::Seeking,
            cooldown_until: 0,
        });
        id
    }

    pub fn spawn_chair(&mut self, center: Vec2, now: Millis) -> EntityId {
        let id = self.next_entity_id();
        self.chairs.push(Chair {
            id,
            body: Body::new(center, CHAIR_SIZE),
            spawn_time: now,
        });
        id
    }

    pub fn spawn_boomerang_item(&mut self, center: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.boomerang_items.push(BoomerangItem {
            id,
            body: Body::new(center, BOOMERANG_SIZE),
        });
        id
    }

    pub fn spawn_speed_boost(&mut self, center: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.speed_items.push(SpeedBoostItem {
            id,
            body: Body::new(center, SPEED_BOOST_SIZE),
        });
        id
    }

    /// Bring in a fresh boss at screen center (replaces any current one)
    pub fn spawn_boss(&mut self, now: Millis) {
        let center = self.screen_center();
        self.boss = Some(Boss::new(center, now, &self.settings));
    }

    // --- Queries ---

    /// Mask-aware overlap between two sprites
    pub fn overlaps(&self, a: &Body, a_kind: SpriteKind, b: &Body, b_kind: SpriteKind) -> bool {
        self.masks.overlap(a, a_kind, b, b_kind)
    }

    pub fn player_overlaps(&self, other: &Body, kind: SpriteKind) -> bool {
        self.overlaps(&self.player.body, SpriteKind::Player, other, kind)
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Milliseconds left on a pending long-line wait
    pub fn wait_remaining(&self) -> Option<Millis> {
        self.timers
            .delivery_wait
            .map(|w| w.remaining(self.now, self.settings.wait_time_ms))
    }
}
