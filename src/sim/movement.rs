//! Movement integration
//!
//! Advances every entity by one delta-time step, before combat runs. Enemy
//! formations follow a pattern clock shared by all participants, so an
//! enemy's position is a function of (anchor, slot, clock) rather than of
//! its previous position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Body, magnet_pull};
use super::entity::{BulletKind, EnemyClass};
use super::player::{BuffKind, CompanionKind, Control, Player};
use super::rect::{Rect, clamp_to_field};
use super::rng::{SharedSeed, random_index};
use super::state::{GameState, SimEvent};
use crate::consts::*;
use crate::finite_or;
use crate::tuning::Tuning;

/// Formation movement patterns, drawn once per level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementPattern {
    HorizontalWaves,
    VerticalWaves,
    Circular,
    SpiralDescent,
    GroupFormation,
    Zigzag,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 6] = [
        MovementPattern::HorizontalWaves,
        MovementPattern::VerticalWaves,
        MovementPattern::Circular,
        MovementPattern::SpiralDescent,
        MovementPattern::GroupFormation,
        MovementPattern::Zigzag,
    ];

    /// Deterministic pattern for a level
    pub fn for_level(level: u32, seed: Option<SharedSeed>) -> Self {
        let base = seed.map_or(0, |s| s.0);
        let roll_seed = base.wrapping_add(u64::from(level) * 1000);
        Self::ALL[random_index(roll_seed, Self::ALL.len())]
    }

    /// Offset from the anchor at pattern time `t`
    pub fn offset(self, t: f32, slot: u32, level: u32, group_offset: f32, tuning: &Tuning) -> Vec2 {
        let amp = tuning.pattern_amplitude(level);
        let freq = tuning.pattern_frequency(level);
        let s = slot as f32;
        match self {
            MovementPattern::HorizontalWaves => Vec2::new(
                (t * freq + s * 0.1).sin() * amp,
                (t * 0.25).sin() * 15.0,
            ),
            MovementPattern::VerticalWaves => Vec2::new(
                (t * 0.3).sin() * 25.0,
                (t * freq * 1.1 + s * 0.2).sin() * amp * 0.5,
            ),
            MovementPattern::Circular => {
                let radius = 35.0 + 2.0 * level as f32;
                let angle = t * freq * 0.7 + s * 0.1;
                Vec2::new(angle.cos() * radius, angle.sin() * radius * 0.4)
            }
            MovementPattern::SpiralDescent => Vec2::new(
                (t * freq * 1.3 + s * 0.3).sin() * amp,
                (t * 12.0).rem_euclid(FIELD_HEIGHT * 0.4),
            ),
            MovementPattern::GroupFormation => {
                Vec2::new(group_offset, (t * 0.4 + s * 0.1).sin() * 12.0)
            }
            MovementPattern::Zigzag => Vec2::new(
                (t * 1.8 + s * 0.4).sin() * 60.0,
                (t * 0.6).sin().abs() * 20.0,
            ),
        }
    }
}

/// Movement speed of a player in pixels per second
pub fn player_speed(player: &Player, tuning: &Tuning, now: u64) -> f32 {
    let mut speed =
        tuning.player_speed * (1.0 + tuning.mobility_per_level * player.levels.mobility.saturating_sub(1) as f32);
    if player.overrides.super_speed {
        speed *= tuning.super_speed_factor;
    }
    if player.buffs.is_active(BuffKind::SpeedBoost, now) {
        speed *= tuning.speed_boost_factor;
    }
    speed
}

/// Apply directional input to a local player. `dir` components are -1, 0 or 1.
pub fn move_player(state: &mut GameState, index: usize, dir: Vec2, tuning: &Tuning, now: u64, dt: f32) {
    let player = &mut state.players[index];
    if !player.is_local() || !player.is_alive() || dir == Vec2::ZERO {
        return;
    }
    let speed = player_speed(player, tuning, now);
    let step = Vec2::new(dir.x * speed, dir.y * speed * tuning.vertical_speed_factor) * dt;
    let next = clamp_to_field(finite_or(player.pos + step, player.pos), player.size);
    if next != player.pos {
        player.pos = next;
        let event = SimEvent::PlayerMoved {
            player: player.id,
            pos: next,
        };
        state.events.push(event);
    }
}

/// Ease mirrored players toward their last reported position
pub fn smooth_remote_players(state: &mut GameState, tuning: &Tuning) {
    for player in &mut state.players {
        if let Control::Remote { target } = player.control {
            player.pos = finite_or(player.pos.lerp(target, tuning.remote_lerp), target);
        }
    }
}

/// Move bullets and drop those that left the field or expired
pub fn advance_bullets(state: &mut GameState, now: u64, dt: f32) {
    for bullet in &mut state.bullets {
        if !matches!(bullet.kind, BulletKind::Beam { .. }) {
            bullet.pos += bullet.vel * dt;
        }
    }
    state.bullets.retain(|b| match b.expires_at() {
        Some(expiry) => expiry > now,
        None => b.pos.is_finite() && b.rect().in_field(),
    });
}

/// Nearest living local player with a magnet companion
fn magnet_owner(players: &[Player], point: Vec2) -> Option<Vec2> {
    players
        .iter()
        .filter(|p| p.is_local() && p.is_alive() && p.has_companion(CompanionKind::Magnet))
        .map(|p| p.center())
        .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point)))
}

fn pull_or_fall(body: Rect, fall_speed: f32, owner: Option<Vec2>, tuning: &Tuning, dt: f32) -> Vec2 {
    owner
        .and_then(|target| {
            magnet_pull(
                body,
                target,
                tuning.magnet_radius,
                tuning.magnet_speed,
                tuning.magnet_min_pull,
                dt,
            )
        })
        .unwrap_or(body.pos + Vec2::new(0.0, fall_speed * dt))
}

/// Drop pickups (or pull them toward a magnet owner) and cull those past the bottom
pub fn advance_pickups(state: &mut GameState, tuning: &Tuning, dt: f32) {
    let players = &state.players;
    for powerup in &mut state.powerups {
        let owner = magnet_owner(players, powerup.center());
        powerup.pos = pull_or_fall(powerup.rect(), powerup.fall_speed, owner, tuning, dt);
    }
    for coin in &mut state.coins {
        let owner = magnet_owner(players, coin.center());
        coin.pos = pull_or_fall(coin.rect(), coin.fall_speed, owner, tuning, dt);
    }
    state.powerups.retain(|p| p.pos.y < FIELD_HEIGHT);
    state.coins.retain(|c| c.pos.y < FIELD_HEIGHT);
}

/// Move enemies along the level pattern (formation) or bounce (boss)
pub fn advance_enemies(state: &mut GameState, tuning: &Tuning, now: u64, dt: f32) {
    let level = state.wave.level;
    let freeze = if state.is_time_frozen(now) {
        tuning.time_freeze_factor
    } else {
        1.0
    };
    let speed = tuning.enemy_speed_multiplier(level) * freeze;

    let wave = &mut state.wave;
    wave.clock += dt * speed;
    if wave.pattern == MovementPattern::GroupFormation {
        let limit = FIELD_WIDTH * 0.2;
        wave.group_offset += wave.group_direction * 80.0 * speed * dt;
        if wave.group_offset.abs() > limit {
            wave.group_offset = wave.group_offset.clamp(-limit, limit);
            wave.group_direction = -wave.group_direction;
        }
    }
    let (pattern, clock, group_offset) = (wave.pattern, wave.clock, wave.group_offset);

    for enemy in &mut state.enemies {
        enemy.anim_phase += dt * 10.0;
        if enemy.is_frozen(now) {
            continue;
        }
        let next = match &mut enemy.class {
            EnemyClass::Boss { velocity } => {
                let mut pos = enemy.pos + *velocity * dt * 60.0 * freeze;
                if pos.x <= 0.0 {
                    pos.x = 0.0;
                    velocity.x = velocity.x.abs();
                } else if pos.x + enemy.size.x >= FIELD_WIDTH {
                    pos.x = FIELD_WIDTH - enemy.size.x;
                    velocity.x = -velocity.x.abs();
                }
                if pos.y > FIELD_HEIGHT / 2.0 {
                    velocity.y = 0.0;
                }
                pos
            }
            EnemyClass::Standard => {
                enemy.anchor + pattern.offset(clock, enemy.slot, level, group_offset, tuning)
            }
        };
        if !next.is_finite() {
            log::warn!("{} produced a non-finite position, reset to anchor", enemy.id);
        }
        enemy.pos = clamp_to_field(finite_or(next, enemy.anchor), enemy.size);
    }
}

/// Age explosions and drop finished ones
pub fn advance_explosions(state: &mut GameState, dt: f32) {
    for explosion in &mut state.explosions {
        explosion.advance(dt);
    }
    state.explosions.retain(|e| !e.is_finished());
}
