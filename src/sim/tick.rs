//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session deterministically. Systems run
//! in a fixed order every tick; several of them compete for the same part,
//! chair or enemy, and whichever runs first wins:
//!
//! 1. Boomerang throw (input)
//! 2. Player movement, undone if it ends inside a chair or a thief
//! 3. Thief steal fallback against the player
//! 4. Enemy seek + separation, then enemy-vs-chair clearing
//! 5. Periodic chair drops from enemies
//! 6. Thieves: drop, steal, move (in id order)
//! 7. Part pickup, or cashier delivery when already carrying
//! 8. Boomerang spawn, pickup, flight and hits
//! 9. Speed boost spawn and pickup
//! 10. Delayed enemy respawns
//! 11. Boss update
//! 12. Caught check (enemy or boss touching the player)

use glam::Vec2;
use rand::Rng;

use super::collision::{SpriteKind, rects_overlap};
use super::state::{GameEvent, GamePhase, GameState, Projectile};
use super::timers::{DeliveryWait, Millis, has_elapsed};
use crate::consts::*;
use crate::direction_to;

/// Input snapshot for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Throw the boomerang (press event)
    pub throw: bool,
    /// Dismiss the intro or restart after game over (press event)
    pub confirm: bool,
    /// Pointer position in screen space, if it moved this frame
    pub pointer: Option<Vec2>,
}

impl TickInput {
    /// Per-axis movement intent; right and down win when opposite keys are held
    pub fn movement(&self) -> Vec2 {
        let mut intent = Vec2::ZERO;
        if self.left {
            intent.x = -1.0;
        }
        if self.right {
            intent.x = 1.0;
        }
        if self.up {
            intent.y = -1.0;
        }
        if self.down {
            intent.y = 1.0;
        }
        intent
    }
}

/// Advance the session by one tick at time `now`
pub fn tick<R: Rng>(state: &mut GameState<R>, input: &TickInput, now: Millis) {
    state.events.clear();
    state.now = now;
    if let Some(pointer) = input.pointer {
        state.pointer = pointer;
    }

    match state.phase {
        GamePhase::Intro => {
            if input.confirm
                || has_elapsed(now, state.started_at, state.settings.intro_duration_ms)
            {
                state.phase = GamePhase::Playing;
                state.events.push(GameEvent::IntroDismissed);
                log::info!("Intro dismissed at {now} ms");
            }
            return;
        }
        GamePhase::GameOver => {
            if input.confirm {
                state.reset(now);
                state.events.push(GameEvent::SessionReset);
            }
            return;
        }
        GamePhase::BossWarning { since } => {
            if !has_elapsed(now, since, state.settings.boss_warning_ms) {
                return;
            }
            state.spawn_boss(now);
            state.phase = GamePhase::Playing;
            state.events.push(GameEvent::BossSpawned);
            log::info!("Super Boomer arrived at {now} ms");
        }
        GamePhase::Playing => {}
    }

    state.time_ticks += 1;

    if input.throw {
        throw_boomerang(state);
    }
    move_player(state, input, now);
    steal_from_player(state, now);
    update_enemies(state, now);
    drop_enemy_chairs(state, now);
    update_thieves(state, now);
    pickup_or_deliver(state, now);
    if state.settings.boomerang_enabled {
        spawn_boomerang(state, now);
        pickup_boomerang(state);
    }
    fly_boomerang(state, now);
    if state.settings.speed_boost_enabled {
        spawn_speed_boost(state, now);
        pickup_speed_boost(state, now);
    }
    respawn_enemies(state, now);
    update_boss(state, now);
    check_caught(state);
}

/// Launch the held boomerang toward the pointer; no-op while one is flying
fn throw_boomerang<R: Rng>(state: &mut GameState<R>) {
    if !state.player.has_boomerang || state.projectile.is_some() {
        return;
    }
    let origin = state.player.body.center;
    state.projectile = Some(Projectile::launch(origin, state.pointer, &state.settings));
    state.player.has_boomerang = false;
    state.events.push(GameEvent::BoomerangThrown);
}

/// Chairs and thieves are solid; enemies and pickups are not
fn move_player<R: Rng>(state: &mut GameState<R>, input: &TickInput, now: Millis) {
    let before = state.player.body.center;
    state.player.steer(input.movement(), now, &state.settings);

    let blocked = state
        .chairs
        .iter()
        .any(|c| state.player_overlaps(&c.body, SpriteKind::Chair))
        || state
            .thieves
            .iter()
            .any(|t| state.player_overlaps(&t.body, SpriteKind::Thief));
    if blocked {
        state.player.body.center = before;
    }
}

/// Any idle thief touching a carrying player takes the part (ignores cooldown)
fn steal_from_player<R: Rng>(state: &mut GameState<R>, now: Millis) {
    for i in 0..state.thieves.len() {
        let Some(variant) = state.player.carrying else {
            return;
        };
        let thief = &state.thieves[i];
        if thief.is_carrying() || !state.player_overlaps(&thief.body, SpriteKind::Thief) {
            continue;
        }
        let drop_at = state.random_drop_time(now);
        let thief = &mut state.thieves[i];
        thief.take(variant, drop_at);
        let id = thief.id;
        state.player.carrying = None;
        state.events.push(GameEvent::PartStolen {
            thief: id,
            from_player: true,
        });
    }
}

/// Seek the player, push away from crowded neighbours, knock over old chairs
fn update_enemies<R: Rng>(state: &mut GameState<R>, now: Millis) {
    let target = state.player.body.center;
    let speed = state.settings.enemy_speed;
    let min_separation = state.settings.min_enemy_separation;
    let invincibility = state.settings.chair_invincibility_ms;

    for i in 0..state.enemies.len() {
        let pos = state.enemies[i].body.center;
        let mut step = direction_to(pos, target) * speed;

        // Enemies already moved this tick are seen at their new position
        let mut push = Vec2::ZERO;
        for (j, other) in state.enemies.iter().enumerate() {
            if j == i {
                continue;
            }
            let away = pos - other.body.center;
            let d = away.length();
            if d > 0.0 && d < min_separation {
                push += away / d;
            }
        }
        if push != Vec2::ZERO {
            step += push.normalize_or_zero() * speed;
        }
        state.enemies[i].body.center += step;

        let body = state.enemies[i].body;
        let hit = state
            .chairs
            .iter()
            .position(|c| state.overlaps(&body, SpriteKind::Enemy, &c.body, SpriteKind::Chair));
        if let Some(ci) = hit {
            if !state.chairs[ci].is_invincible(now, invincibility) {
                let chair = state.chairs.remove(ci);
                state.events.push(GameEvent::ChairCleared { chair: chair.id });
            }
        }
    }
}

/// Every chair interval, each enemy may leave a chair behind
fn drop_enemy_chairs<R: Rng>(state: &mut GameState<R>, now: Millis) {
    if !state.timers.chair_drop.fire(now) {
        return;
    }
    let chance = state.settings.chair_drop_chance;
    let spots: Vec<Vec2> = state.enemies.iter().map(|e| e.body.center).collect();
    for spot in spots {
        if state.roll(chance) {
            let chair = state.spawn_chair(spot, now);
            state.events.push(GameEvent::ChairDropped { chair });
        }
    }
}

fn update_thieves<R: Rng>(state: &mut GameState<R>, now: Millis) {
    for i in 0..state.thieves.len() {
        update_thief(state, i, now);
    }
}

/// Drop, then steal, then move; a thief that drops does nothing else that tick
fn update_thief<R: Rng>(state: &mut GameState<R>, i: usize, now: Millis) {
    let id = state.thieves[i].id;

    if let Some(variant) = state.thieves[i].release_if_due(now, state.settings.thief_cooldown_ms) {
        let at = state.thieves[i].body.center;
        let part = state.spawn_part(at, variant, Some(id));
        state.events.push(GameEvent::PartDropped { thief: id, part });
        return;
    }

    if state.thieves[i].can_steal(now) {
        let body = state.thieves[i].body;
        let from_player = state
            .player
            .carrying
            .filter(|_| state.player_overlaps(&body, SpriteKind::Thief));

        if let Some(variant) = from_player {
            let drop_at = state.random_drop_time(now);
            state.thieves[i].take(variant, drop_at);
            state.player.carrying = None;
            state.events.push(GameEvent::PartStolen {
                thief: id,
                from_player: true,
            });
        } else if let Some(pi) = state.parts.iter().position(|p| {
            !p.is_forbidden_to(id)
                && state.overlaps(&body, SpriteKind::Thief, &p.body, p.variant.sprite())
        }) {
            let part = state.parts.remove(pi);
            let drop_at = state.random_drop_time(now);
            state.thieves[i].take(part.variant, drop_at);
            state.events.push(GameEvent::PartStolen {
                thief: id,
                from_player: false,
            });
        }
    }

    // Head for the nearest part this thief may take, else keep going
    let pos = state.thieves[i].body.center;
    let mut heading = state.thieves[i].heading;
    if !state.thieves[i].is_carrying() {
        let nearest = state
            .parts
            .iter()
            .filter(|p| !p.is_forbidden_to(id))
            .min_by(|a, b| {
                a.body
                    .center
                    .distance_squared(pos)
                    .total_cmp(&b.body.center.distance_squared(pos))
            });
        if let Some(part) = nearest {
            let toward = direction_to(pos, part.body.center);
            if toward != Vec2::ZERO {
                heading = toward;
            }
        }
    }

    let (w, h) = (state.settings.screen_width, state.settings.screen_height);
    let speed = state.settings.thief_speed;
    let thief = &mut state.thieves[i];
    thief.body.center += heading * speed;
    let rect = thief.body.rect();
    if (rect.min.x < 0.0 && heading.x < 0.0) || (rect.max.x > w && heading.x > 0.0) {
        heading.x = -heading.x;
    }
    if (rect.min.y < 0.0 && heading.y < 0.0) || (rect.max.y > h && heading.y > 0.0) {
        heading.y = -heading.y;
    }
    thief.heading = heading;

    let turn_chance = state.settings.thief_turn_chance;
    if state.roll(turn_chance) {
        let fresh = state.random_heading();
        state.thieves[i].heading = fresh;
    }
}

/// Grab a part when empty-handed; otherwise try to hand one in
fn pickup_or_deliver<R: Rng>(state: &mut GameState<R>, now: Millis) {
    if !state.player.is_carrying() {
        let hit = state
            .parts
            .iter()
            .position(|p| state.player_overlaps(&p.body, p.variant.sprite()));
        if let Some(pi) = hit {
            let part = state.parts.remove(pi);
            state.player.carrying = Some(part.variant);
            state.events.push(GameEvent::PartPickedUp {
                variant: part.variant,
            });
        }
        return;
    }

    if !rects_overlap(&state.player.body, &state.cashier.body) {
        return;
    }

    match state.timers.delivery_wait {
        None => {
            let line_probability = state.settings.line_probability;
            if state.roll(line_probability) {
                let wait = DeliveryWait::begin(now, state.settings.come_back_delay_ms);
                state.timers.delivery_wait = Some(wait);
                state.events.push(GameEvent::LongLineStarted {
                    next_available_time: wait.next_available_time,
                });
                log::debug!("Long line at the cashier until {} ms", wait.next_available_time);
            } else {
                deliver(state, now);
            }
        }
        Some(wait) => {
            if wait.is_ready(now, state.settings.wait_time_ms) {
                deliver(state, now);
            }
        }
    }
}

/// Hand in the carried part and bring in replacements
fn deliver<R: Rng>(state: &mut GameState<R>, now: Millis) {
    if state.player.carrying.take().is_none() {
        return;
    }
    state.delivered += 1;
    state.timers.delivery_wait = None;
    let total = state.delivered;
    state.events.push(GameEvent::Delivered { total });
    log::debug!("Delivered part #{total}");

    if total % state.settings.thief_every.max(1) == 0 {
        let pos = state.random_point();
        let thief = state.spawn_thief(pos);
        state.events.push(GameEvent::ThiefSpawned { thief });
    }
    if state.settings.boss_enabled && total % state.settings.boss_every.max(1) == 0 {
        state.phase = GamePhase::BossWarning { since: now };
        state.events.push(GameEvent::BossWarning);
        log::info!("Super Boomer incoming after delivery #{total}");
    }

    state.spawn_random_part();
    let entry = Vec2::new(state.settings.screen_width - ENEMY_ENTRY_INSET, ENEMY_ENTRY_INSET);
    state.spawn_enemy(entry);
}

fn spawn_boomerang<R: Rng>(state: &mut GameState<R>, now: Millis) {
    if !state.timers.boomerang_spawn.fire(now) {
        return;
    }
    let chance = state.settings.boomerang_spawn_chance;
    let lucky = state.roll(chance);
    let none_around = state.boomerang_items.is_empty()
        && state.projectile.is_none()
        && !state.player.has_boomerang;
    if lucky && none_around {
        let pos = state.random_point();
        state.spawn_boomerang_item(pos);
        state.events.push(GameEvent::BoomerangSpawned);
    }
}

fn pickup_boomerang<R: Rng>(state: &mut GameState<R>) {
    if state.player.has_boomerang || state.projectile.is_some() {
        return;
    }
    let hit = state
        .boomerang_items
        .iter()
        .position(|b| state.player_overlaps(&b.body, SpriteKind::Boomerang));
    if let Some(bi) = hit {
        state.boomerang_items.remove(bi);
        state.player.has_boomerang = true;
        state.events.push(GameEvent::BoomerangPickedUp);
    }
}

/// Move the boomerang along its curve and resolve hits
fn fly_boomerang<R: Rng>(state: &mut GameState<R>, now: Millis) {
    let Some(projectile) = state.projectile.as_mut() else {
        return;
    };
    if !projectile.advance() {
        state.projectile = None;
        state.events.push(GameEvent::BoomerangReturned);
        return;
    }
    let body = projectile.body;

    let hit = state
        .enemies
        .iter()
        .position(|e| state.overlaps(&body, SpriteKind::Boomerang, &e.body, SpriteKind::Enemy));
    if let Some(ei) = hit {
        let enemy = state.enemies.remove(ei);
        state
            .timers
            .respawns
            .schedule(now + state.settings.boomerang_respawn_delay_ms);
        state.events.push(GameEvent::EnemyKilled { enemy: enemy.id });
    }

    let boss_hit = state
        .boss
        .as_ref()
        .is_some_and(|b| state.overlaps(&body, SpriteKind::Boomerang, &b.body, SpriteKind::Boss));
    if !boss_hit {
        return;
    }
    // One boss hit per throw
    state.projectile = None;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    let defeated = boss.take_hit();
    let health = boss.health;
    state.events.push(GameEvent::BossHit { health });
    if defeated {
        state.boss = None;
        state.events.push(GameEvent::BossDefeated);
        log::info!("Super Boomer defeated");
    }
}

fn spawn_speed_boost<R: Rng>(state: &mut GameState<R>, now: Millis) {
    if !state.timers.speed_boost_spawn.fire(now) {
        return;
    }
    let chance = state.settings.speed_boost_spawn_chance;
    if state.roll(chance) && state.speed_items.is_empty() {
        let pos = state.random_point();
        state.spawn_speed_boost(pos);
        state.events.push(GameEvent::SpeedBoostSpawned);
    }
}

fn pickup_speed_boost<R: Rng>(state: &mut GameState<R>, now: Millis) {
    let hit = state
        .speed_items
        .iter()
        .position(|s| state.player_overlaps(&s.body, SpriteKind::SpeedBoost));
    if let Some(si) = hit {
        state.speed_items.remove(si);
        state.player.apply_boost(now, &state.settings);
        state.events.push(GameEvent::SpeedBoostPickedUp);
    }
}

/// Bring back enemies whose respawn delay has run out, away from the player
fn respawn_enemies<R: Rng>(state: &mut GameState<R>, now: Millis) {
    let due = state.timers.respawns.take_due(now);
    for _ in 0..due {
        let avoid = state.player.body.center;
        let safe = state.settings.respawn_safe_distance;
        let pos = state.random_point_away_from(avoid, safe);
        let enemy = state.spawn_enemy(pos);
        state.events.push(GameEvent::EnemyRespawned { enemy });
    }
}

fn update_boss<R: Rng>(state: &mut GameState<R>, now: Millis) {
    let player_center = state.player.body.center;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    if boss.step(player_center, now, &state.settings) {
        let at = boss.body.center;
        let chair = state.spawn_chair(at, now);
        state.events.push(GameEvent::ChairDropped { chair });
    }
}

/// Touching an enemy or the boss ends the run
fn check_caught<R: Rng>(state: &mut GameState<R>) {
    let by_enemy = state
        .enemies
        .iter()
        .any(|e| state.player_overlaps(&e.body, SpriteKind::Enemy));
    let by_boss = state
        .boss
        .as_ref()
        .is_some_and(|b| state.player_overlaps(&b.body, SpriteKind::Boss));
    if by_enemy || by_boss {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver);
        log::info!(
            "Game over after {} deliveries ({} ticks)",
            state.delivered,
            state.time_ticks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::distance;
    use crate::sim::state::{EntityId, PartVariant, ThiefState};
    use proptest::prelude::*;

    /// A session in play with nothing in the yard but the player and cashier
    fn quiet(settings: Settings) -> GameState {
        let mut state = GameState::new(4242, settings, 0);
        state.phase = GamePhase::Playing;
        state.parts.clear();
        state.enemies.clear();
        state.thieves.clear();
        state.boomerang_items.clear();
        state
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn at_cashier(state: &mut GameState) {
        state.player.body.center = state.cashier.body.center;
    }

    #[test]
    fn test_intro_confirm_starts_play() {
        let mut state = GameState::new(1, Settings::default(), 0);
        tick(&mut state, &idle(), 16);
        assert_eq!(state.phase, GamePhase::Intro);
        assert_eq!(state.time_ticks, 0);

        let confirm = TickInput {
            confirm: true,
            ..Default::default()
        };
        tick(&mut state, &confirm, 32);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.events.contains(&GameEvent::IntroDismissed));
    }

    #[test]
    fn test_intro_times_out() {
        let mut state = GameState::new(1, Settings::default(), 0);
        tick(&mut state, &idle(), 23_159);
        assert_eq!(state.phase, GamePhase::Intro);
        tick(&mut state, &idle(), 23_160);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_player_moves_and_right_wins() {
        let mut state = quiet(Settings::default());
        let input = TickInput {
            left: true,
            right: true,
            up: true,
            ..Default::default()
        };
        tick(&mut state, &input, 16);
        assert_eq!(state.player.body.center, Vec2::new(516.0, 380.0));
    }

    #[test]
    fn test_player_blocked_by_chair_and_thief() {
        let mut state = quiet(Settings::default());
        let start = state.player.body.center;
        state.spawn_chair(start + Vec2::new(27.0, 0.0), 0);
        let right = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &right, 16);
        assert_eq!(state.player.body.center, start);

        state.chairs.clear();
        state.spawn_thief(start + Vec2::new(0.0, 32.0));
        state.thieves[0].state = ThiefState::Carrying {
            variant: PartVariant(0),
            drop_at: 1_000_000,
        };
        state.thieves[0].heading = Vec2::X;
        state.settings.thief_turn_chance = 0.0;
        let down = TickInput {
            down: true,
            ..Default::default()
        };
        tick(&mut state, &down, 32);
        assert_eq!(state.player.body.center, start);
    }

    #[test]
    fn test_pickup_then_deliver_without_line() {
        let mut settings = Settings::default();
        settings.line_probability = 0.0;
        let mut state = quiet(settings);
        let center = state.player.body.center;
        state.spawn_part(center, PartVariant(1), None);

        tick(&mut state, &idle(), 16);
        assert_eq!(state.player.carrying, Some(PartVariant(1)));
        assert!(state.parts.is_empty());

        at_cashier(&mut state);
        tick(&mut state, &idle(), 32);
        assert_eq!(state.delivered, 1);
        assert!(!state.player.is_carrying());
        assert_eq!(state.parts.len(), 1);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].body.center, Vec2::new(1009.0, 15.0));
        assert!(state.events.contains(&GameEvent::Delivered { total: 1 }));
        assert!(state.timers.delivery_wait.is_none());
    }

    #[test]
    fn test_long_line_completes_after_wait() {
        let mut settings = Settings::default();
        settings.line_probability = 1.0;
        settings.boss_enabled = false;
        let mut state = quiet(settings);
        state.player.carrying = Some(PartVariant(0));
        at_cashier(&mut state);

        tick(&mut state, &idle(), 1_000);
        assert_eq!(state.delivered, 0);
        assert_eq!(
            state.timers.delivery_wait,
            Some(DeliveryWait {
                start_time: 1_000,
                next_available_time: 6_000
            })
        );
        assert_eq!(state.wait_remaining(), Some(1_200));

        tick(&mut state, &idle(), 2_199);
        assert_eq!(state.delivered, 0);
        assert_eq!(state.snapshot().wait.map(|w| w.remaining_ms), Some(1));

        tick(&mut state, &idle(), 2_200);
        assert_eq!(state.delivered, 1);
        assert!(state.timers.delivery_wait.is_none());
        assert!(!state.player.is_carrying());
    }

    #[test]
    fn test_long_line_come_back_time() {
        let mut settings = Settings::default();
        settings.line_probability = 1.0;
        settings.wait_time_ms = 60_000;
        settings.boss_enabled = false;
        let mut state = quiet(settings);
        state.player.carrying = Some(PartVariant(0));
        at_cashier(&mut state);
        tick(&mut state, &idle(), 1_000);

        // Walk away, then come back before and after the come-back time
        state.player.body.center = Vec2::new(400.0, 400.0);
        tick(&mut state, &idle(), 5_000);
        at_cashier(&mut state);
        tick(&mut state, &idle(), 5_999);
        assert_eq!(state.delivered, 0);
        tick(&mut state, &idle(), 6_000);
        assert_eq!(state.delivered, 1);
    }

    #[test]
    fn test_deliver_without_part_is_noop() {
        let mut state = quiet(Settings::default());
        deliver(&mut state, 100);
        assert_eq!(state.delivered, 0);
        assert!(state.parts.is_empty());
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_every_tenth_delivery_adds_thief() {
        let mut settings = Settings::default();
        settings.line_probability = 0.0;
        settings.boss_enabled = false;
        let mut state = quiet(settings);

        let mut now = 0;
        for n in 1..=20u32 {
            state.player.carrying = Some(PartVariant(0));
            at_cashier(&mut state);
            now += 16;
            tick(&mut state, &idle(), now);
            assert_eq!(state.delivered, n);
            let spawned = state
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::ThiefSpawned { .. }))
                .count();
            assert_eq!(spawned, usize::from(n % 10 == 0), "delivery {n}");
            assert_eq!(state.thieves.len() as u32, n / 10);

            // Keep thieves and the incoming enemies out of the way
            for thief in &mut state.thieves {
                thief.body.center = Vec2::new(900.0, 100.0);
            }
            state.enemies.clear();
        }
    }

    #[test]
    fn test_delivery_triggers_boss_warning_then_spawn() {
        let mut settings = Settings::default();
        settings.line_probability = 0.0;
        let mut state = quiet(settings);
        state.player.carrying = Some(PartVariant(2));
        at_cashier(&mut state);

        tick(&mut state, &idle(), 5_000);
        assert_eq!(state.phase, GamePhase::BossWarning { since: 5_000 });
        assert!(state.events.contains(&GameEvent::BossWarning));

        tick(&mut state, &idle(), 5_999);
        assert!(state.boss.is_none());
        let frozen_ticks = state.time_ticks;

        tick(&mut state, &idle(), 6_000);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.events.contains(&GameEvent::BossSpawned));
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.health, 5);
        assert_eq!(boss.body.center, Vec2::new(512.0, 384.0));
        assert_eq!(state.time_ticks, frozen_ticks + 1);
    }

    #[test]
    fn test_thief_steals_from_player_and_drops_forbidden_part() {
        let mut settings = Settings::default();
        settings.thief_turn_chance = 0.0;
        let mut state = quiet(settings);
        state.player.carrying = Some(PartVariant(2));
        let center = state.player.body.center;
        let thief_id = state.spawn_thief(center + Vec2::new(10.0, 0.0));

        tick(&mut state, &idle(), 1_000);
        assert!(!state.player.is_carrying());
        let drop_at = state.thieves[0].drop_time().unwrap();
        assert!((4_000..=31_000).contains(&drop_at));
        assert_eq!(state.thieves[0].carried(), Some(PartVariant(2)));

        state.player.body.center = Vec2::new(900.0, 600.0);
        tick(&mut state, &idle(), drop_at);
        assert_eq!(state.thieves[0].drop_time(), None);
        assert_eq!(state.thieves[0].cooldown_until, drop_at + 500);
        assert_eq!(state.parts.len(), 1);
        assert_eq!(state.parts[0].variant, PartVariant(2));
        assert_eq!(state.parts[0].forbidden_thief, Some(thief_id));

        // Sitting right on its own drop, the thief never takes it back
        let part_at = state.parts[0].body.center;
        let mut now = drop_at;
        for _ in 0..120 {
            now += 16;
            state.thieves[0].body.center = part_at;
            tick(&mut state, &idle(), now);
            assert!(!state.thieves[0].is_carrying());
        }
        assert_eq!(state.parts.len(), 1);

        // A different thief may
        let other = state.spawn_thief(part_at);
        tick(&mut state, &idle(), now + 16);
        assert!(state.parts.is_empty());
        let other = state.thieves.iter().find(|t| t.id == other).unwrap();
        assert_eq!(other.carried(), Some(PartVariant(2)));
    }

    #[test]
    fn test_first_thief_wins_shared_part() {
        let mut state = quiet(Settings::default());
        let spot = Vec2::new(300.0, 300.0);
        state.spawn_part(spot, PartVariant(0), None);
        let first = state.spawn_thief(spot + Vec2::new(5.0, 0.0));
        let second = state.spawn_thief(spot - Vec2::new(5.0, 0.0));

        tick(&mut state, &idle(), 16);
        assert!(state.parts.is_empty());
        let carrying: Vec<EntityId> = state
            .thieves
            .iter()
            .filter(|t| t.is_carrying())
            .map(|t| t.id)
            .collect();
        assert_eq!(carrying, vec![first]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_thief_heads_for_nearest_part() {
        let mut settings = Settings::default();
        settings.thief_turn_chance = 0.0;
        let mut state = quiet(settings);
        state.spawn_part(Vec2::new(340.0, 300.0), PartVariant(0), None);
        state.spawn_part(Vec2::new(300.0, 200.0), PartVariant(1), None);
        state.spawn_thief(Vec2::new(300.0, 300.0));

        tick(&mut state, &idle(), 16);
        assert_eq!(state.thieves[0].body.center, Vec2::new(301.0, 300.0));
        assert_eq!(state.thieves[0].heading, Vec2::X);
    }

    #[test]
    fn test_thief_bounces_off_edge() {
        let mut settings = Settings::default();
        settings.thief_turn_chance = 0.0;
        let mut state = quiet(settings);
        state.spawn_thief(Vec2::new(15.0, 300.0));
        state.thieves[0].heading = Vec2::new(-1.0, 0.0);
        state.thieves[0].state = ThiefState::Carrying {
            variant: PartVariant(0),
            drop_at: 1_000_000,
        };

        tick(&mut state, &idle(), 16);
        assert_eq!(state.thieves[0].heading, Vec2::X);
        tick(&mut state, &idle(), 32);
        assert_eq!(state.thieves[0].body.center, Vec2::new(15.0, 300.0));
    }

    #[test]
    fn test_enemies_separate_while_seeking() {
        let mut state = quiet(Settings::default());
        state.player.body.center = Vec2::new(505.0, 700.0);
        state.spawn_enemy(Vec2::new(500.0, 100.0));
        state.spawn_enemy(Vec2::new(510.0, 100.0));

        tick(&mut state, &idle(), 16);
        let a = state.enemies[0].body.center;
        let b = state.enemies[1].body.center;
        assert!(distance(a, b) > 10.0);
        assert!(a.y > 100.0 && b.y > 100.0);
        assert!(a.x < 500.0 && b.x > 510.0);
    }

    #[test]
    fn test_enemy_clears_chair_after_invincibility() {
        let mut state = quiet(Settings::default());
        state.player.body.center = Vec2::new(500.0, 600.0);
        state.spawn_enemy(Vec2::new(500.0, 100.0));
        state.spawn_chair(Vec2::new(500.0, 100.0), 0);

        tick(&mut state, &idle(), 1_000);
        assert_eq!(state.chairs.len(), 1);

        tick(&mut state, &idle(), 2_000);
        assert!(state.chairs.is_empty());
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ChairCleared { .. }))
        );
    }

    #[test]
    fn test_enemies_drop_chairs_on_interval() {
        let mut settings = Settings::default();
        settings.chair_drop_chance = 1.0;
        let mut state = quiet(settings);
        state.spawn_enemy(Vec2::new(100.0, 100.0));
        state.spawn_enemy(Vec2::new(900.0, 100.0));

        tick(&mut state, &idle(), 9_999);
        assert!(state.chairs.is_empty());
        tick(&mut state, &idle(), 10_000);
        assert_eq!(state.chairs.len(), 2);
        assert!(state.chairs.iter().all(|c| c.spawn_time == 10_000));
        tick(&mut state, &idle(), 10_016);
        assert_eq!(state.chairs.len(), 2);
    }

    #[test]
    fn test_boomerang_pickup_and_single_flight() {
        let mut state = quiet(Settings::default());
        let center = state.player.body.center;
        state.spawn_boomerang_item(center);

        tick(&mut state, &idle(), 16);
        assert!(state.player.has_boomerang);
        assert!(state.boomerang_items.is_empty());

        let throw = TickInput {
            throw: true,
            pointer: Some(center + Vec2::new(100.0, 0.0)),
            ..Default::default()
        };
        tick(&mut state, &throw, 32);
        assert!(!state.player.has_boomerang);
        let first = state.projectile.clone().unwrap();
        assert_eq!(first.path.control, center + Vec2::new(150.0, -75.0));

        // Re-armed mid-flight, a second throw still does nothing
        state.player.has_boomerang = true;
        tick(&mut state, &throw, 48);
        assert!(state.player.has_boomerang);
        let flying = state.projectile.as_ref().unwrap();
        assert_eq!(flying.path, first.path);
        assert!(flying.t > first.t);
    }

    #[test]
    fn test_boomerang_returns_and_must_be_picked_up_again() {
        let mut state = quiet(Settings::default());
        state.player.has_boomerang = true;
        let throw = TickInput {
            throw: true,
            ..Default::default()
        };
        let mut now = 16;
        tick(&mut state, &throw, now);
        assert!(state.projectile.is_some());
        while state.projectile.is_some() {
            now += 16;
            tick(&mut state, &idle(), now);
            assert!(now < 10_000);
        }
        assert!(state.events.contains(&GameEvent::BoomerangReturned));
        assert!(!state.player.has_boomerang);
    }

    #[test]
    fn test_killed_enemy_respawns_after_delay_away_from_player() {
        let mut state = quiet(Settings::default());
        let spot = Vec2::new(200.0, 200.0);
        state.spawn_enemy(spot);
        state.projectile = Some(Projectile::launch(
            spot,
            spot + Vec2::X,
            &state.settings,
        ));

        tick(&mut state, &idle(), 5_000);
        assert!(state.enemies.is_empty());
        assert_eq!(state.timers.respawns.next_due(), Some(15_000));

        tick(&mut state, &idle(), 14_999);
        assert!(state.enemies.is_empty());

        state.player.body.center = Vec2::new(300.0, 300.0);
        tick(&mut state, &idle(), 15_000);
        assert_eq!(state.enemies.len(), 1);
        assert!(distance(state.enemies[0].body.center, Vec2::new(300.0, 300.0)) > 150.0);
        assert!(state.timers.respawns.is_empty());
    }

    #[test]
    fn test_boss_removed_after_hit_points() {
        let mut state = quiet(Settings::default());
        state.player.body.center = Vec2::new(100.0, 700.0);
        state.spawn_boss(0);

        let mut now = 0;
        for hit in 1..=5u32 {
            let at = state.boss.as_ref().unwrap().body.center;
            state.projectile = Some(Projectile::launch(at, at + Vec2::X, &state.settings));
            now += 16;
            tick(&mut state, &idle(), now);
            assert!(state.projectile.is_none(), "hit {hit} consumes the throw");
            if hit < 5 {
                assert_eq!(state.boss.as_ref().unwrap().health, 5 - hit);
            }
        }
        assert!(state.boss.is_none());
        assert!(state.events.contains(&GameEvent::BossDefeated));
        assert!(state.snapshot().boss.is_none());
    }

    #[test]
    fn test_boss_throws_chairs() {
        let mut state = quiet(Settings::default());
        state.player.body.center = Vec2::new(100.0, 700.0);
        state.spawn_boss(0);
        tick(&mut state, &idle(), 1_999);
        assert!(state.chairs.is_empty());
        tick(&mut state, &idle(), 2_000);
        assert_eq!(state.chairs.len(), 1);
        assert_eq!(state.chairs[0].body.center, Vec2::new(512.0, 384.0));
    }

    #[test]
    fn test_speed_boost_pickup() {
        let mut state = quiet(Settings::default());
        let center = state.player.body.center;
        state.spawn_speed_boost(center);
        tick(&mut state, &idle(), 1_000);
        assert!(state.speed_items.is_empty());
        assert_eq!(state.player.speed_multiplier, 2.0);
        assert_eq!(state.player.boost_end_time, 11_000);
        assert!(state.events.contains(&GameEvent::SpeedBoostPickedUp));
    }

    #[test]
    fn test_timed_spawns_respect_preconditions() {
        let mut settings = Settings::default();
        settings.speed_boost_spawn_chance = 1.0;
        settings.boomerang_spawn_chance = 1.0;
        let mut state = quiet(settings);
        state.player.body.center = Vec2::new(15.0, 15.0);

        tick(&mut state, &idle(), 19_999);
        assert!(state.boomerang_items.is_empty());
        tick(&mut state, &idle(), 20_000);
        assert_eq!(state.boomerang_items.len(), 1);

        tick(&mut state, &idle(), 29_999);
        assert!(state.speed_items.is_empty());
        tick(&mut state, &idle(), 30_000);
        assert_eq!(state.speed_items.len(), 1);

        // Already one of each lying around: no more spawn
        tick(&mut state, &idle(), 40_000);
        assert_eq!(state.boomerang_items.len(), 1);
        tick(&mut state, &idle(), 60_000);
        assert_eq!(state.speed_items.len(), 1);

        // Holding a boomerang also blocks a new one
        state.boomerang_items.clear();
        state.player.has_boomerang = true;
        tick(&mut state, &idle(), 60_000 + 20_000);
        assert!(state.boomerang_items.is_empty());
    }

    #[test]
    fn test_caught_then_confirm_resets() {
        let mut state = quiet(Settings::default());
        state.delivered = 4;
        let center = state.player.body.center;
        state.spawn_enemy(center + Vec2::new(10.0, 0.0));

        tick(&mut state, &idle(), 16);
        assert!(state.is_game_over());
        assert!(state.snapshot().game_over);

        tick(&mut state, &idle(), 32);
        assert!(state.is_game_over());

        let confirm = TickInput {
            confirm: true,
            ..Default::default()
        };
        tick(&mut state, &confirm, 48);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.delivered, 0);
        assert_eq!(state.parts.len(), 5);
        assert_eq!(state.enemies.len(), 3);
        assert_eq!(state.thieves.len(), 1);
        assert_eq!(state.timers.chair_drop.last, 48);
        assert!(state.events.contains(&GameEvent::SessionReset));
    }

    #[test]
    fn test_caught_by_boss() {
        let mut state = quiet(Settings::default());
        state.spawn_boss(0);
        tick(&mut state, &idle(), 16);
        assert!(state.is_game_over());
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99_999, Settings::default(), 0);
        let mut state2 = GameState::new(99_999, Settings::default(), 0);

        let inputs = [
            TickInput {
                confirm: true,
                ..Default::default()
            },
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput {
                down: true,
                throw: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        let mut now = 0;
        for i in 0..600 {
            now += TICK_MS;
            let input = &inputs[i % inputs.len()];
            tick(&mut state1, input, now);
            tick(&mut state2, input, now);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.snapshot(), state2.snapshot());
    }

    proptest! {
        #[test]
        fn player_stays_on_screen(
            start_x in 0.0f32..1024.0,
            start_y in 0.0f32..768.0,
            moves in prop::collection::vec(any::<(bool, bool, bool, bool)>(), 1..120),
            boosted in any::<bool>(),
        ) {
            let mut state = quiet(Settings::default());
            state.player.body.center = Vec2::new(start_x, start_y);
            if boosted {
                state.player.apply_boost(0, &state.settings);
            }
            let mut now = 0;
            for (up, down, left, right) in moves {
                now += TICK_MS;
                let input = TickInput { up, down, left, right, ..Default::default() };
                tick(&mut state, &input, now);
                prop_assert!(state.player.body.rect().within(1024.0, 768.0));
            }
        }
    }
}
