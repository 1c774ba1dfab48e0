//! Combat resolver
//!
//! Runs once per tick after movement, always in this order:
//! 1. local players vs enemy bullets
//! 2. local players vs enemy bodies
//! 3. local players vs pickups
//! 4. player bullets vs enemies
//! 5. death bookkeeping
//!
//! Only locally simulated players take hits or collect pickups here; mirrored
//! players learn about their own outcomes through sync messages.

use std::collections::BTreeSet;

use super::abilities::apply_special;
use super::collision::{Body, overlaps, within_radius};
use super::entity::{BulletKind, Enemy, EnemyId, Explosion, PickupId};
use super::player::{BuffKind, PlayerId, UpgradeKind};
use super::state::{GameState, SimEvent};
use crate::consts::*;
use crate::tuning::Tuning;

/// Resolve every collision class for this tick
pub fn resolve(state: &mut GameState, tuning: &Tuning, now: u64) {
    // Shield state is sampled once: a shield covers every hit of the tick it breaks in
    let shielded: BTreeSet<PlayerId> = state
        .players
        .iter()
        .filter(|p| p.buffs.is_active(BuffKind::Shield, now))
        .map(|p| p.id)
        .collect();
    enemy_bullets_vs_players(state, &shielded, now);
    enemy_bodies_vs_players(state, &shielded, now);
    pickups_vs_players(state, tuning, now);
    player_bullets_vs_enemies(state, tuning, now);
    settle_deaths(state, tuning);
}

/// Apply one hit to a local player: protection ignores it, a shield absorbs it
fn hit_player(state: &mut GameState, index: usize, lives_lost: u32, shielded: &BTreeSet<PlayerId>, now: u64) {
    let player = &mut state.players[index];
    if lives_lost == 0 || player.is_protected(now) {
        return;
    }
    if shielded.contains(&player.id) {
        if player.buffs.is_active(BuffKind::Shield, now) {
            player.buffs.consume(BuffKind::Shield);
            log::debug!("{} shield absorbed a hit", player.id);
        }
        return;
    }
    let died = player.lives.lose(lives_lost);
    let (id, lives, center) = (player.id, player.lives, player.center());
    state.events.push(SimEvent::LifeLost { player: id, lives });
    if died {
        log::info!("{} was destroyed", id);
        state.explosions.push(Explosion::new(center, 60.0, 600.0));
        state.events.push(SimEvent::PlayerDied {
            player: id,
            pos: center,
        });
    }
}

fn local_living(state: &GameState) -> Vec<usize> {
    state
        .players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_local() && p.is_alive())
        .map(|(i, _)| i)
        .collect()
}

/// Step 1
fn enemy_bullets_vs_players(state: &mut GameState, shielded: &BTreeSet<PlayerId>, now: u64) {
    for index in local_living(state) {
        let player_rect = state.players[index].rect();
        let damages: Vec<i32> = state
            .bullets
            .iter()
            .filter(|b| b.is_enemy() && b.rect().overlaps(&player_rect))
            .map(|b| b.damage)
            .collect();
        if damages.is_empty() {
            continue;
        }
        state
            .bullets
            .retain(|b| !(b.is_enemy() && b.rect().overlaps(&player_rect)));
        for damage in damages {
            if !state.players[index].is_alive() {
                break;
            }
            hit_player(state, index, damage.max(0) as u32, shielded, now);
        }
    }
}

/// Step 2
fn enemy_bodies_vs_players(state: &mut GameState, shielded: &BTreeSet<PlayerId>, now: u64) {
    for index in local_living(state) {
        let id = state.players[index].id;
        let touching: Vec<usize> = state
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_alive() && overlaps(*e, &state.players[index]))
            .map(|(i, _)| i)
            .collect();
        for enemy_index in touching {
            state.enemies[enemy_index].destroy(Some(id));
            if state.players[index].is_alive() {
                hit_player(state, index, u32::MAX, shielded, now);
            }
        }
    }
}

/// Step 3
fn pickups_vs_players(state: &mut GameState, tuning: &Tuning, now: u64) {
    for index in local_living(state) {
        let player_rect = state.players[index].rect();
        let id = state.players[index].id;

        let taken: Vec<(PickupId, _)> = state
            .powerups
            .iter()
            .filter(|p| p.rect().overlaps(&player_rect))
            .map(|p| (p.id, p.kind))
            .collect();
        state.powerups.retain(|p| !taken.iter().any(|(t, _)| *t == p.id));
        for (pickup, kind) in taken {
            if !state.collected.insert(pickup) {
                continue;
            }
            if kind.is_special() {
                apply_special(state, id, kind, tuning, now);
            } else {
                state.players[index].inventory.add(kind);
            }
            log::debug!("{} took {:?}", id, kind);
            state.events.push(SimEvent::PowerupTaken {
                pickup,
                kind,
                player: id,
            });
        }

        let coins: Vec<(PickupId, u32)> = state
            .coins
            .iter()
            .filter(|c| c.rect().overlaps(&player_rect))
            .map(|c| (c.id, c.value))
            .collect();
        state.coins.retain(|c| !coins.iter().any(|(t, _)| *t == c.id));
        for (pickup, value) in coins {
            if !state.collected.insert(pickup) {
                continue;
            }
            let player = &mut state.players[index];
            let value = if player.has_upgrade(UpgradeKind::DoubleCoins) {
                value * 2
            } else {
                value
            };
            player.coins_earned += u64::from(value);
            state.events.push(SimEvent::CoinTaken {
                pickup,
                value,
                player: id,
            });
            state.award_score(Some(id), u64::from(value));
        }
    }
}

/// Bottom margin at which area bullets detonate
const GROUND_MARGIN: f32 = 50.0;

/// Step 4
fn player_bullets_vs_enemies(state: &mut GameState, tuning: &Tuning, now: u64) {
    let GameState {
        bullets,
        enemies,
        explosions,
        ..
    } = state;
    let mut spent = BTreeSet::new();

    for bullet in bullets.iter_mut().filter(|b| !b.is_enemy()) {
        let by = bullet.player_owner();
        let rect = bullet.rect();
        let damage = bullet.damage;
        match &mut bullet.kind {
            BulletKind::Area { radius } => {
                let grounded = rect.max().y >= FIELD_HEIGHT - GROUND_MARGIN || rect.min().y <= 0.0;
                let touching = enemies.iter().any(|e| e.is_alive() && e.rect().overlaps(&rect));
                if grounded || touching {
                    let center = rect.center();
                    for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                        if within_radius(center, enemy.center(), *radius) {
                            enemy.hit(damage, by);
                        }
                    }
                    explosions.push(Explosion::new(center, 40.0, 500.0));
                    spent.insert(bullet.id);
                }
            }
            BulletKind::Poison { next_pulse_at, .. } => {
                if now >= *next_pulse_at {
                    for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                        if enemy.rect().overlaps(&rect) {
                            enemy.hit(damage, by);
                        }
                    }
                    *next_pulse_at = now + tuning.poison_pulse_ms;
                }
            }
            _ => {}
        }
    }

    for enemy in enemies.iter_mut() {
        for bullet in bullets.iter_mut() {
            if !enemy.is_alive() {
                break;
            }
            if bullet.is_enemy() || spent.contains(&bullet.id) {
                continue;
            }
            if !bullet.rect().overlaps(&enemy.rect()) {
                continue;
            }
            let by = bullet.player_owner();
            match &mut bullet.kind {
                BulletKind::Standard => {
                    enemy.hit(bullet.damage, by);
                    bullet.hits_remaining = bullet.hits_remaining.saturating_sub(1);
                    if bullet.hits_remaining == 0 {
                        spent.insert(bullet.id);
                    }
                }
                BulletKind::Piercing { struck } => {
                    if struck.contains(&enemy.id) {
                        continue;
                    }
                    struck.push(enemy.id);
                    enemy.hit(bullet.damage, by);
                    bullet.hits_remaining = bullet.hits_remaining.saturating_sub(1);
                    if bullet.hits_remaining == 0 {
                        spent.insert(bullet.id);
                    }
                }
                BulletKind::Beam { struck, .. } => {
                    if !struck.contains(&enemy.id) {
                        struck.push(enemy.id);
                        enemy.hit(bullet.damage, by);
                    }
                }
                BulletKind::Area { .. } | BulletKind::Poison { .. } => {}
            }
        }
    }

    bullets.retain(|b| !spent.contains(&b.id));
}

/// Score for destroying `enemy` given kills already made this level
pub fn kill_score(enemy: &Enemy, kills_this_level: u32, tuning: &Tuning) -> u64 {
    if enemy.is_boss() {
        tuning.boss_kill_base + tuning.boss_kill_per_prior_kill * u64::from(kills_this_level)
    } else {
        tuning.enemy_kill_score
    }
}

/// Step 5: remove dead enemies exactly once and account for them
///
/// Kills by a local player are scored and announced. Kills by mirrored
/// bullets are removed silently and parked in `remote_kills` until the
/// remote killer's announcement credits them.
pub fn settle_deaths(state: &mut GameState, tuning: &Tuning) {
    if state.enemies.iter().all(|e| e.is_alive()) {
        return;
    }
    let (dead, alive): (Vec<Enemy>, Vec<Enemy>) =
        std::mem::take(&mut state.enemies).into_iter().partition(|e| !e.is_alive());
    state.enemies = alive;

    for enemy in dead {
        if !state.destroyed.insert(enemy.id) {
            continue;
        }
        let score = kill_score(&enemy, state.wave.kills_this_level, tuning);
        state.wave.kills_this_level += 1;
        state.enemies_destroyed += 1;
        state.explosions.push(Explosion::for_enemy(&enemy));

        let killer = enemy
            .last_hit_by
            .filter(|id| state.player(*id).is_some_and(|p| p.is_local()));
        let Some(killer) = killer else {
            if enemy.last_hit_by.is_some() {
                state.remote_kills.insert(enemy.id);
            }
            log::debug!("{} destroyed by a remote participant", enemy.id);
            continue;
        };
        state.award_score(Some(killer), score);
        state.events.push(SimEvent::EnemyDestroyed {
            enemy: enemy.id,
            kind: enemy.kind,
            boss: enemy.is_boss(),
            by: Some(killer),
            score,
        });
    }
}

/// Remove an enemy reported destroyed by another participant
///
/// Returns true when the report should be credited: the enemy was removed
/// now, or was already removed by a mirrored bullet and not yet credited.
/// Returns false when the enemy is unknown or already accounted for.
pub fn remove_remote_kill(state: &mut GameState, enemy: EnemyId, killer: Option<PlayerId>) -> bool {
    if state.remote_kills.remove(&enemy) {
        log::debug!("{} credited to {:?}", enemy, killer);
        return true;
    }
    if state.destroyed.contains(&enemy) {
        return false;
    }
    let Some(index) = state.enemies.iter().position(|e| e.id == enemy) else {
        return false;
    };
    let removed = state.enemies.remove(index);
    state.destroyed.insert(enemy);
    state.wave.kills_this_level += 1;
    state.enemies_destroyed += 1;
    state.explosions.push(Explosion::for_enemy(&removed));
    log::debug!("{} destroyed remotely by {:?}", enemy, killer);
    true
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::entity::{Bullet, BulletId, BulletOwner, Coin, EnemyKind, Powerup, PowerupKind};
    use crate::sim::player::{Control, DebugOverrides, Lives, Loadout, Player};

    fn arena() -> GameState {
        let mut state = GameState::new(None);
        state.enemies.clear();
        state.add_player(Player::new(PlayerId(1), "ace", Loadout::default(), Control::Local));
        state
    }

    fn enemy_bullet_on(state: &mut GameState, target: Vec2) {
        let id = state.next_bullet_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Enemy(EnemyId(1)),
            target,
            Vec2::new(BULLET_WIDTH, BULLET_HEIGHT),
            Vec2::new(0.0, 300.0),
            1,
        ));
    }

    fn player_bullet(state: &mut GameState, pos: Vec2) -> BulletId {
        let id = state.next_bullet_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Player(PlayerId(1)),
            pos,
            Vec2::new(BULLET_WIDTH, BULLET_HEIGHT),
            Vec2::new(0.0, -600.0),
            1,
        ));
        id
    }

    #[test]
    fn test_enemy_bullet_costs_a_life() {
        let tuning = Tuning::default();
        let mut state = arena();
        let center = state.players[0].center();
        enemy_bullet_on(&mut state, center);
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.players[0].lives, Lives::Finite(2));
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_shield_covers_its_tick_then_breaks() {
        let tuning = Tuning::default();
        let mut state = arena();
        state.players[0].buffs.grant(BuffKind::Shield, 10_000);
        let center = state.players[0].center();
        enemy_bullet_on(&mut state, center);
        enemy_bullet_on(&mut state, center - Vec2::new(10.0, 0.0));
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.players[0].lives, Lives::Finite(3));
        assert!(!state.players[0].buffs.is_active(BuffKind::Shield, 0));

        enemy_bullet_on(&mut state, center);
        resolve(&mut state, &tuning, 16);
        assert_eq!(state.players[0].lives, Lives::Finite(2));
    }

    #[test]
    fn test_shielded_bullet_and_body_in_one_tick() {
        let tuning = Tuning::default();
        let mut state = arena();
        state.players[0].buffs.grant(BuffKind::Shield, 10_000);
        let center = state.players[0].center();
        let pos = state.players[0].pos;
        enemy_bullet_on(&mut state, center);
        state.enemies.push(Enemy::new(EnemyId(7), 0, EnemyKind::Fighter, pos, 2));
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.players[0].lives, Lives::Finite(3));
        assert!(state.enemies.is_empty());
        assert!(!state.players[0].buffs.is_active(BuffKind::Shield, 0));
    }

    #[test]
    fn test_zero_damage_bullet_costs_nothing() {
        let tuning = Tuning::default();
        let mut state = arena();
        let center = state.players[0].center();
        let id = state.next_bullet_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Enemy(EnemyId(1)),
            center,
            Vec2::new(BULLET_WIDTH, BULLET_HEIGHT),
            Vec2::new(0.0, 300.0),
            0,
        ));
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.players[0].lives, Lives::Finite(3));
        assert!(state.bullets.is_empty());
        assert!(!state.events.iter().any(|e| matches!(e, SimEvent::LifeLost { .. })));
    }

    #[test]
    fn test_no_clip_ignores_hits() {
        let tuning = Tuning::default();
        let mut state = GameState::new(None);
        state.enemies.clear();
        let loadout = Loadout {
            overrides: DebugOverrides {
                no_clip: true,
                ..Default::default()
            },
            ..Default::default()
        };
        state.add_player(Player::new(PlayerId(1), "ace", loadout, Control::Local));
        let center = state.players[0].center();
        enemy_bullet_on(&mut state, center);
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.players[0].lives, Lives::Unbounded);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_body_contact_kills_enemy_and_player() {
        let tuning = Tuning::default();
        let mut state = arena();
        let pos = state.players[0].pos;
        state.enemies.push(Enemy::new(EnemyId(7), 0, EnemyKind::Fighter, pos, 2));
        resolve(&mut state, &tuning, 0);
        assert!(state.enemies.is_empty());
        assert_eq!(state.players[0].lives, Lives::Finite(0));
        assert!(state.events.iter().any(|e| matches!(e, SimEvent::PlayerDied { .. })));
        assert!(state.destroyed.contains(&EnemyId(7)));
    }

    #[test]
    fn test_shielded_body_contact_still_kills_enemy() {
        let tuning = Tuning::default();
        let mut state = arena();
        state.players[0].buffs.grant(BuffKind::Shield, 10_000);
        let pos = state.players[0].pos;
        state.enemies.push(Enemy::new(EnemyId(7), 0, EnemyKind::Fighter, pos, 2));
        resolve(&mut state, &tuning, 0);
        assert!(state.enemies.is_empty());
        assert_eq!(state.players[0].lives, Lives::Finite(3));
    }

    #[test]
    fn test_coins_double_with_upgrade() {
        let tuning = Tuning::default();
        let mut state = arena();
        state.players[0].upgrade = Some(UpgradeKind::DoubleCoins);
        let pos = state.players[0].pos;
        state.coins.push(Coin {
            id: PickupId(9),
            pos,
            size: Vec2::splat(Coin::SIZE),
            value: 15,
            fall_speed: 0.0,
        });
        resolve(&mut state, &tuning, 0);
        let player = &state.players[0];
        assert_eq!(player.coins_earned, 30);
        assert_eq!(player.score, 30);
        assert_eq!(state.score, 30);
        assert!(state.collected.contains(&PickupId(9)));
    }

    #[test]
    fn test_stored_powerup_goes_to_inventory() {
        let tuning = Tuning::default();
        let mut state = arena();
        let pos = state.players[0].pos;
        state.powerups.push(Powerup {
            id: PickupId(3),
            pos,
            size: PowerupKind::RapidFire.size(),
            kind: PowerupKind::RapidFire,
            fall_speed: 0.0,
        });
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.players[0].inventory.count(PowerupKind::RapidFire), 1);
        assert!(state.powerups.is_empty());
    }

    #[test]
    fn test_non_piercing_bullet_hits_one_enemy() {
        let tuning = Tuning::default();
        let mut state = arena();
        let pos = Vec2::new(300.0, 300.0);
        state.enemies.push(Enemy::new(EnemyId(1), 0, EnemyKind::Cruiser, pos, 3));
        state.enemies.push(Enemy::new(EnemyId(2), 1, EnemyKind::Cruiser, pos, 3));
        player_bullet(&mut state, pos + Vec2::splat(10.0));
        resolve(&mut state, &tuning, 0);
        let damaged = state.enemies.iter().filter(|e| e.health < 3).count();
        assert_eq!(damaged, 1);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_kill_scores_and_announces_once() {
        let tuning = Tuning::default();
        let mut state = arena();
        let pos = Vec2::new(300.0, 300.0);
        state.enemies.push(Enemy::new(EnemyId(1), 0, EnemyKind::Scout, pos, 1));
        player_bullet(&mut state, pos + Vec2::splat(10.0));
        player_bullet(&mut state, pos + Vec2::splat(12.0));
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.score, 100);
        assert_eq!(state.enemies_destroyed, 1);
        assert_eq!(state.wave.kills_this_level, 1);
        assert_eq!(state.explosions.len(), 1);
        let announced = state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::EnemyDestroyed { .. }))
            .count();
        assert_eq!(announced, 1);
        // Second bullet was not consumed by the dead enemy
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_boss_kill_escalates() {
        let tuning = Tuning::default();
        let mut state = arena();
        state.wave.kills_this_level = 4;
        let mut boss = Enemy::boss(EnemyId(100), EnemyKind::Destroyer, Vec2::new(300.0, 100.0), 1, Vec2::ZERO);
        boss.destroy(Some(PlayerId(1)));
        state.enemies.push(boss);
        settle_deaths(&mut state, &tuning);
        assert_eq!(state.score, 5000);
    }

    #[test]
    fn test_remote_bullet_kill_is_silent() {
        let tuning = Tuning::default();
        let mut state = arena();
        state.add_player(Player::new(
            PlayerId(2),
            "wing",
            Loadout::default(),
            Control::Remote { target: Vec2::ZERO },
        ));
        let mut enemy = Enemy::new(EnemyId(5), 0, EnemyKind::Scout, Vec2::new(300.0, 300.0), 1);
        enemy.hit(1, Some(PlayerId(2)));
        state.enemies.push(enemy);
        settle_deaths(&mut state, &tuning);
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 0);
        assert!(state.events.is_empty());
        assert_eq!(state.enemies_destroyed, 1);
        assert!(state.remote_kills.contains(&EnemyId(5)));

        // The killer's announcement is credited once, without a second count
        assert!(remove_remote_kill(&mut state, EnemyId(5), Some(PlayerId(2))));
        assert!(!remove_remote_kill(&mut state, EnemyId(5), Some(PlayerId(2))));
        assert_eq!(state.enemies_destroyed, 1);
        assert!(state.remote_kills.is_empty());
    }

    #[test]
    fn test_area_bullet_detonates_on_contact() {
        let tuning = Tuning::default();
        let mut state = arena();
        let pos = Vec2::new(300.0, 300.0);
        state.enemies.push(Enemy::new(EnemyId(1), 0, EnemyKind::Mothership, pos, 10));
        state.enemies.push(Enemy::new(EnemyId(2), 1, EnemyKind::Mothership, pos + Vec2::new(30.0, 0.0), 10));
        state.enemies.push(Enemy::new(EnemyId(3), 2, EnemyKind::Mothership, pos + Vec2::new(300.0, 0.0), 10));
        let id = state.next_bullet_id();
        state.bullets.push(
            Bullet::new(
                id,
                BulletOwner::Player(PlayerId(1)),
                pos + Vec2::splat(15.0),
                Vec2::splat(10.0),
                Vec2::new(0.0, -400.0),
                3,
            )
            .with_kind(BulletKind::Area { radius: 50.0 }),
        );
        resolve(&mut state, &tuning, 0);
        assert_eq!(state.enemies[0].health, 7);
        assert_eq!(state.enemies[1].health, 7);
        assert_eq!(state.enemies[2].health, 10);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_beam_hits_each_enemy_once() {
        let tuning = Tuning::default();
        let mut state = arena();
        for i in 0..3 {
            let pos = Vec2::new(300.0, 100.0 + i as f32 * 60.0);
            state.enemies.push(Enemy::new(EnemyId(i), i, EnemyKind::Mothership, pos, 10));
        }
        let id = state.next_bullet_id();
        state.bullets.push(
            Bullet::new(
                id,
                BulletOwner::Player(PlayerId(1)),
                Vec2::new(310.0, 0.0),
                Vec2::new(16.0, 600.0),
                Vec2::ZERO,
                2,
            )
            .with_kind(BulletKind::Beam { expires_at: 1000, struck: Vec::new() }),
        );
        resolve(&mut state, &tuning, 0);
        resolve(&mut state, &tuning, 16);
        assert!(state.enemies.iter().all(|e| e.health == 8));
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_poison_pulses_on_interval() {
        let tuning = Tuning::default();
        let mut state = arena();
        let pos = Vec2::new(300.0, 300.0);
        state.enemies.push(Enemy::new(EnemyId(1), 0, EnemyKind::Mothership, pos, 10));
        let id = state.next_bullet_id();
        state.bullets.push(
            Bullet::new(id, BulletOwner::Player(PlayerId(1)), pos, Vec2::splat(30.0), Vec2::ZERO, 1)
                .with_kind(BulletKind::Poison { expires_at: 5000, next_pulse_at: 0 }),
        );
        resolve(&mut state, &tuning, 0);
        resolve(&mut state, &tuning, 100);
        assert_eq!(state.enemies[0].health, 9);
        resolve(&mut state, &tuning, 500);
        assert_eq!(state.enemies[0].health, 8);
    }

    #[test]
    fn test_remote_kill_removal_is_idempotent() {
        let mut state = arena();
        state.enemies.push(Enemy::new(EnemyId(4), 0, EnemyKind::Scout, Vec2::ZERO, 1));
        assert!(remove_remote_kill(&mut state, EnemyId(4), Some(PlayerId(2))));
        assert!(!remove_remote_kill(&mut state, EnemyId(4), Some(PlayerId(2))));
        assert!(!remove_remote_kill(&mut state, EnemyId(999), None));
        assert_eq!(state.enemies_destroyed, 1);
    }
}
