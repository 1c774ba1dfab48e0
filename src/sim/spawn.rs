//! Seeded per-tick spawns: enemy volleys and falling pickups
//!
//! Every roll is a pure function of (time bucket, level, shared seed), so two
//! participants with the same seed fire the same volleys and drop the same
//! pickups with the same ids.

use glam::Vec2;

use super::entity::{Bullet, BulletOwner, Coin, PickupId, Powerup, PowerupKind};
use super::rng::{random, random_index};
use super::state::GameState;
use crate::consts::*;
use crate::tuning::Tuning;

/// Roll enemy fire once the volley interval has elapsed
pub fn enemy_volley(state: &mut GameState, tuning: &Tuning, now: u64) {
    let level = state.wave.level;
    let delay = f64::from(tuning.volley_delay_ms(level));
    if (now.saturating_sub(state.last_volley_at) as f64) <= delay {
        return;
    }
    state.last_volley_at = now;
    if state.enemies.is_empty() {
        return;
    }

    let base = state.shared_seed.map_or(0.0, |s| s.0 as f64);
    let bucket = (now as f64 / delay).floor() * delay;
    let seed = base + bucket + f64::from(level);
    let chance = tuning.shoot_chance(level);
    let speed = tuning.enemy_bullet_speed(level);

    let shooters: Vec<_> = state
        .enemies
        .iter()
        .filter(|e| e.is_alive() && random(seed + f64::from(e.id.0)) < chance)
        .map(|e| {
            let muzzle = Vec2::new(
                e.pos.x + e.size.x / 2.0 - BULLET_WIDTH / 2.0,
                e.pos.y + e.size.y,
            );
            (e.id, muzzle)
        })
        .collect();

    for (enemy, muzzle) in shooters {
        let id = state.next_bullet_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Enemy(enemy),
            muzzle,
            Vec2::new(BULLET_WIDTH, BULLET_HEIGHT),
            Vec2::new(0.0, speed),
            1,
        ));
    }
}

/// Seed for this tick's pickup rolls, or `None` if this bucket was already rolled
fn pickup_seed(state: &mut GameState, tuning: &Tuning, now: u64) -> Option<u64> {
    match state.shared_seed {
        Some(seed) => {
            let bucket = now / tuning.pickup_bucket_ms;
            if state.last_pickup_bucket == Some(bucket) {
                return None;
            }
            state.last_pickup_bucket = Some(bucket);
            Some(seed.offset(bucket.wrapping_mul(tuning.pickup_bucket_ms)))
        }
        None => Some(now.wrapping_add(u64::from(state.wave.level))),
    }
}

/// Pickup ids share the roll seed; the low bits tell the three rolls apart
fn pickup_id(seed: u64, roll: u64) -> PickupId {
    PickupId(seed.wrapping_mul(4).wrapping_add(roll))
}

fn is_new(state: &GameState, id: PickupId) -> bool {
    !state.collected.contains(&id)
        && !state.powerups.iter().any(|p| p.id == id)
        && !state.coins.iter().any(|c| c.id == id)
}

/// Roll for a power-up, a special power-up and a coin
pub fn roll_pickups(state: &mut GameState, tuning: &Tuning, now: u64) {
    let Some(seed) = pickup_seed(state, tuning, now) else {
        return;
    };
    let level = state.wave.level;
    let scale = 1.0 + tuning.pickup_chance_per_level * f64::from(level);
    let fall_speed = tuning.pickup_fall_speed(level);

    if random(seed) < tuning.powerup_chance * scale {
        let id = pickup_id(seed, 0);
        let kind = PowerupKind::STORED[random_index(seed.wrapping_add(2), PowerupKind::STORED.len())];
        let size = kind.size();
        if is_new(state, id) {
            let x = random(seed.wrapping_add(1)) as f32 * (FIELD_WIDTH - size.x);
            state.powerups.push(Powerup {
                id,
                pos: Vec2::new(x, -20.0),
                size,
                kind,
                fall_speed,
            });
        }
    }

    if random(seed.wrapping_add(10)) < tuning.special_chance_per_level * f64::from(level) {
        let id = pickup_id(seed, 1);
        let kind = PowerupKind::SPECIAL[random_index(seed.wrapping_add(12), PowerupKind::SPECIAL.len())];
        let size = kind.size();
        if is_new(state, id) {
            let x = random(seed.wrapping_add(11)) as f32 * (FIELD_WIDTH - size.x);
            state.powerups.push(Powerup {
                id,
                pos: Vec2::new(x, -20.0),
                size,
                kind,
                fall_speed,
            });
        }
    }

    let coin_seed = seed.wrapping_add(20);
    if random(coin_seed) < tuning.coin_chance * scale {
        let id = pickup_id(seed, 2);
        if is_new(state, id) {
            let value = 10 + (random(coin_seed.wrapping_add(1)) * f64::from(level) * 2.0).floor() as u32;
            let x = random(coin_seed.wrapping_add(2)) as f32 * (FIELD_WIDTH - Coin::SIZE);
            state.coins.push(Coin {
                id,
                pos: Vec2::new(x, -20.0),
                size: Vec2::splat(Coin::SIZE),
                value,
                fall_speed,
            });
        }
    }

    state.powerups.sort_by_key(|p| p.id);
    state.coins.sort_by_key(|c| c.id);
}
