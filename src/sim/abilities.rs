//! Ability scheduler
//!
//! Every timed effect (primary weapon, ability slots, regen, companions) is
//! gated by an explicit `(player, ability) -> last_fired_at` table that the
//! session owns and passes in by reference. A missing entry means ready.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;

use super::collision::{Body, within_radius};
use super::entity::{Bullet, BulletKind, BulletOwner, Explosion, PowerupKind};
use super::player::{BuffKind, CompanionKind, Player, PlayerId, UpgradeKind};
use super::rng::random;
use super::state::GameState;
use super::tick::TickInput;
use crate::consts::*;
use crate::tuning::Tuning;

/// Anything with its own cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    PrimaryWeapon,
    /// Ability slot 0-4
    Slot(u8),
    HealthRegen,
    Companion(CompanionKind),
}

/// Per-session cooldown table
#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    last_fired: HashMap<(PlayerId, AbilityKind), u64>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready iff never fired or `now - last >= cooldown`
    pub fn is_ready(&self, player: PlayerId, ability: AbilityKind, cooldown_ms: u64, now: u64) -> bool {
        match self.last_fired.get(&(player, ability)) {
            Some(&last) => now.saturating_sub(last) >= cooldown_ms,
            None => true,
        }
    }

    pub fn mark(&mut self, player: PlayerId, ability: AbilityKind, now: u64) {
        self.last_fired.insert((player, ability), now);
    }

    /// Check and mark in one step
    pub fn try_fire(&mut self, player: PlayerId, ability: AbilityKind, cooldown_ms: u64, now: u64) -> bool {
        if self.is_ready(player, ability, cooldown_ms, now) {
            self.mark(player, ability, now);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.last_fired.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}

/// Buff duration for a kind
pub fn buff_duration_ms(kind: BuffKind, tuning: &Tuning) -> u64 {
    match kind {
        BuffKind::RapidFire => tuning.rapid_fire_ms,
        BuffKind::Shield => tuning.shield_ms,
        BuffKind::SpeedBoost => tuning.speed_boost_ms,
        BuffKind::LaserBeam => tuning.laser_beam_ms,
        BuffKind::MultiShot => tuning.multi_shot_ms,
        BuffKind::Invincibility => tuning.invincibility_ms,
    }
}

/// Milliseconds between primary shots
pub fn fire_delay_ms(player: &Player, tuning: &Tuning, now: u64) -> f32 {
    if let Some(rate) = player.overrides.custom_fire_rate.filter(|r| *r > 0.0) {
        return (1000.0 / rate).max(tuning.min_custom_fire_delay_ms);
    }
    let levels = player.levels.fire_rate.saturating_sub(1) as f32;
    let mut delay = tuning.fire_delay_ms * (1.0 - tuning.fire_rate_per_level * levels);
    if player.overrides.rapid_fire || player.buffs.is_active(BuffKind::RapidFire, now) {
        delay *= tuning.rapid_fire_factor;
    }
    delay.max(tuning.min_fire_delay_ms)
}

/// Damage of one primary shot
pub fn shot_damage(player: &Player, tuning: &Tuning) -> i32 {
    let levels = player.levels.damage.saturating_sub(1) as f32;
    let multiplier = player.overrides.custom_bullet_damage.unwrap_or(1.0);
    (((1.0 + tuning.damage_per_level * levels) * multiplier).floor() as i32).max(1)
}

/// Bullets for one primary trigger pull
fn primary_shots(state: &mut GameState, player: &Player, tuning: &Tuning, now: u64) -> Vec<Bullet> {
    let owner = BulletOwner::Player(player.id);
    let damage = shot_damage(player, tuning);
    let nose = Vec2::new(player.pos.x + player.size.x / 2.0, player.pos.y);
    let size = Vec2::new(BULLET_WIDTH, BULLET_HEIGHT);
    let muzzle = nose - Vec2::new(BULLET_WIDTH / 2.0, BULLET_HEIGHT);
    let pierce = if player.has_upgrade(UpgradeKind::BulletPierce) {
        tuning.pierce_hits
    } else {
        1
    };

    if player.buffs.is_active(BuffKind::MultiShot, now) {
        let n = tuning.multi_shot_count.max(1);
        let mid = (n - 1) as f32 / 2.0;
        return (0..n)
            .map(|i| {
                let angle = (i as f32 - mid) * tuning.multi_shot_spread;
                let vel = Vec2::new(angle.sin(), -angle.cos()) * tuning.bullet_speed;
                Bullet::new(state.next_bullet_id(), owner, muzzle, size, vel, damage).piercing(pierce)
            })
            .collect();
    }

    if player.buffs.is_active(BuffKind::LaserBeam, now) {
        // Corridor from the top of the field down to the ship's nose
        let pos = Vec2::new(nose.x - tuning.laser_width / 2.0, 0.0);
        let beam = Bullet::new(
            state.next_bullet_id(),
            owner,
            pos,
            Vec2::new(tuning.laser_width, nose.y.max(1.0)),
            Vec2::ZERO,
            damage * tuning.laser_damage_factor,
        )
        .with_kind(BulletKind::Beam {
            expires_at: now + tuning.beam_lifetime_ms,
            struck: Vec::new(),
        });
        return vec![beam];
    }

    let vel = Vec2::new(0.0, -tuning.bullet_speed);
    vec![Bullet::new(state.next_bullet_id(), owner, muzzle, size, vel, damage).piercing(pierce)]
}

/// Apply a power-up that takes effect the moment it is collected
pub fn apply_special(state: &mut GameState, player: PlayerId, kind: PowerupKind, tuning: &Tuning, now: u64) {
    match kind {
        PowerupKind::GalacticBomb | PowerupKind::MegaBomb => {
            let mut destroyed = 0;
            for enemy in &mut state.enemies {
                if enemy.destroy(Some(player)) {
                    destroyed += 1;
                }
            }
            state.explosions.push(Explosion::new(
                Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0),
                400.0,
                1000.0,
            ));
            log::info!("{} detonated {:?}: {} enemies", player, kind, destroyed);
        }
        PowerupKind::TimeFreeze => {
            let until = now + tuning.time_freeze_ms;
            state.time_freeze_until = Some(state.time_freeze_until.map_or(until, |t| t.max(until)));
        }
        other => {
            if let Some(buff) = other.buff() {
                if let Some(p) = state.player_mut(player) {
                    p.buffs.grant(buff, now + buff_duration_ms(buff, tuning));
                }
            }
        }
    }
}

/// Run every ability for every living local player
pub fn run(state: &mut GameState, cooldowns: &mut Cooldowns, input: &TickInput, tuning: &Tuning) {
    let now = input.now_ms;
    for id in state.local_player_ids() {
        let alive = state.player(id).is_some_and(|p| p.is_alive());
        if !alive {
            continue;
        }
        activate_slots(state, cooldowns, id, input, tuning, now);
        fire_primary(state, cooldowns, id, input, tuning, now);
        regenerate(state, cooldowns, id, tuning, now);
        run_companion(state, cooldowns, id, tuning, now);
    }
}

fn activate_slots(
    state: &mut GameState,
    cooldowns: &mut Cooldowns,
    id: PlayerId,
    input: &TickInput,
    tuning: &Tuning,
    now: u64,
) {
    for (slot, pressed) in input.slots.iter().enumerate() {
        if !pressed {
            continue;
        }
        let Some(kind) = PowerupKind::for_slot(slot) else {
            continue;
        };
        let ability = AbilityKind::Slot(slot as u8);
        let Some(player) = state.player_mut(id) else {
            return;
        };
        if player.inventory.count(kind) == 0
            || !cooldowns.is_ready(id, ability, tuning.slot_cooldown_ms, now)
        {
            continue;
        }
        player.inventory.take(kind);
        cooldowns.mark(id, ability, now);
        if let Some(buff) = kind.buff() {
            player.buffs.grant(buff, now + buff_duration_ms(buff, tuning));
            log::debug!("{} activated {:?}", id, kind);
        }
    }
}

fn fire_primary(
    state: &mut GameState,
    cooldowns: &mut Cooldowns,
    id: PlayerId,
    input: &TickInput,
    tuning: &Tuning,
    now: u64,
) {
    if !(input.fire || tuning.auto_fire) {
        return;
    }
    let Some(player) = state.player(id).cloned() else {
        return;
    };
    let delay = fire_delay_ms(&player, tuning, now) as u64;
    if !cooldowns.try_fire(id, AbilityKind::PrimaryWeapon, delay, now) {
        return;
    }
    for bullet in primary_shots(state, &player, tuning, now) {
        state.fire_player_bullet(bullet);
    }
}

fn regenerate(state: &mut GameState, cooldowns: &mut Cooldowns, id: PlayerId, tuning: &Tuning, now: u64) {
    let Some(player) = state.player_mut(id) else {
        return;
    };
    if !player.has_upgrade(UpgradeKind::HealthRegen) {
        return;
    }
    if cooldowns.try_fire(id, AbilityKind::HealthRegen, tuning.health_regen_ms, now)
        && player.lives.heal(STARTING_LIVES)
    {
        log::debug!("{} regenerated a life", id);
    }
}

fn run_companion(state: &mut GameState, cooldowns: &mut Cooldowns, id: PlayerId, tuning: &Tuning, now: u64) {
    let Some(player) = state.player(id).cloned() else {
        return;
    };
    let Some(companion) = player.companion else {
        return;
    };
    if companion.kind == CompanionKind::Magnet {
        // Passive; applied during pickup movement
        return;
    }
    let Some(cooldown) = tuning.companion_cooldown(companion.kind, companion.level) else {
        log::debug!("No cooldown configured for {:?}, skipping", companion.kind);
        return;
    };
    if !cooldowns.try_fire(id, AbilityKind::Companion(companion.kind), cooldown, now) {
        return;
    }

    let owner = BulletOwner::Player(id);
    let center = player.center();
    let nose = Vec2::new(center.x, player.pos.y);

    match companion.kind {
        CompanionKind::AutoShooter => {
            let pos = nose - Vec2::new(BULLET_WIDTH / 2.0, BULLET_HEIGHT);
            let bullet = Bullet::new(
                state.next_bullet_id(),
                owner,
                pos,
                Vec2::new(BULLET_WIDTH, BULLET_HEIGHT),
                Vec2::new(0.0, -tuning.bullet_speed),
                1,
            );
            state.fire_player_bullet(bullet);
        }
        CompanionKind::Healer => {
            if let Some(p) = state.player_mut(id) {
                p.lives.heal(STARTING_LIVES);
            }
        }
        CompanionKind::Shield => {
            if let Some(p) = state.player_mut(id) {
                if !p.buffs.is_active(BuffKind::Shield, now) {
                    p.buffs.grant(BuffKind::Shield, now + tuning.companion_shield_ms);
                }
            }
        }
        CompanionKind::Speed => {
            if let Some(p) = state.player_mut(id) {
                if !p.buffs.is_active(BuffKind::SpeedBoost, now) {
                    p.buffs.grant(BuffKind::SpeedBoost, now + tuning.companion_speed_ms);
                }
            }
        }
        CompanionKind::Bomb => {
            let size = Vec2::splat(10.0);
            let bullet = Bullet::new(
                state.next_bullet_id(),
                owner,
                nose - Vec2::new(size.x / 2.0, size.y),
                size,
                Vec2::new(0.0, -tuning.bomb_speed),
                tuning.bomb_damage,
            )
            .with_kind(BulletKind::Area {
                radius: tuning.bomb_radius,
            });
            state.fire_player_bullet(bullet);
        }
        CompanionKind::Laser => {
            let height = tuning.companion_laser_height;
            let bullet = Bullet::new(
                state.next_bullet_id(),
                owner,
                Vec2::new(nose.x - 2.0, (nose.y - height).max(0.0)),
                Vec2::new(4.0, height.min(nose.y).max(1.0)),
                Vec2::ZERO,
                tuning.companion_laser_damage,
            )
            .with_kind(BulletKind::Beam {
                expires_at: now + tuning.beam_lifetime_ms,
                struck: Vec::new(),
            });
            state.fire_player_bullet(bullet);
        }
        CompanionKind::Teleport => {
            let span = FIELD_WIDTH - player.size.x;
            let x = random(now.wrapping_add(u64::from(id.0))) as f32 * span;
            if let Some(p) = state.player_mut(id) {
                p.pos.x = x.clamp(0.0, span);
                log::debug!("{} teleported to x={:.0}", id, p.pos.x);
            }
        }
        CompanionKind::Freeze => {
            let until = now + tuning.freeze_ms;
            for enemy in &mut state.enemies {
                if within_radius(center, enemy.center(), tuning.freeze_radius) {
                    enemy.frozen_until = Some(enemy.frozen_until.map_or(until, |t| t.max(until)));
                }
            }
        }
        CompanionKind::Poison => {
            let size = Vec2::splat(30.0);
            let bullet = Bullet::new(
                state.next_bullet_id(),
                owner,
                nose - Vec2::new(size.x / 2.0, size.y / 2.0),
                size,
                Vec2::new(0.0, -tuning.poison_speed),
                tuning.poison_damage,
            )
            .with_kind(BulletKind::Poison {
                expires_at: now + tuning.poison_ms,
                next_pulse_at: now,
            });
            state.fire_player_bullet(bullet);
        }
        CompanionKind::Explosion => {
            let origin = Vec2::new(center.x, player.pos.y - player.size.y / 2.0);
            let radius = tuning.explosion_radius;
            for enemy in &mut state.enemies {
                let d = enemy.center().distance(origin);
                if d < radius {
                    let damage = ((tuning.explosion_max_damage * (1.0 - d / radius)).floor() as i32).max(1);
                    enemy.hit(damage, Some(id));
                }
            }
            state.explosions.push(Explosion::new(origin, 60.0, 600.0));
        }
        CompanionKind::Drone => {
            let n = tuning.drone_shots.max(1);
            let spin = now as f32 * 0.001;
            for i in 0..n {
                let angle = i as f32 * TAU / n as f32 + spin;
                let vel = Vec2::new(angle.sin(), -angle.cos()) * tuning.drone_speed;
                let bullet = Bullet::new(
                    state.next_bullet_id(),
                    owner,
                    nose - Vec2::new(2.0, 8.0),
                    Vec2::new(4.0, 8.0),
                    vel,
                    tuning.drone_damage,
                );
                state.fire_player_bullet(bullet);
            }
        }
        CompanionKind::Magnet => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Enemy, EnemyId, EnemyKind};
    use crate::sim::player::{Companion, Control, Lives, Loadout};

    fn solo(loadout: Loadout) -> GameState {
        let mut state = GameState::new(None);
        state.enemies.clear();
        state.add_player(Player::new(PlayerId(1), "ace", loadout, Control::Local));
        state
    }

    fn at(now_ms: u64) -> TickInput {
        TickInput {
            now_ms,
            dt: 1.0 / 60.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_cooldown_missing_entry_is_ready() {
        let mut cd = Cooldowns::new();
        let p = PlayerId(1);
        assert!(cd.is_ready(p, AbilityKind::PrimaryWeapon, 200, 0));
        cd.mark(p, AbilityKind::PrimaryWeapon, 1000);
        assert!(!cd.is_ready(p, AbilityKind::PrimaryWeapon, 200, 1199));
        assert!(cd.is_ready(p, AbilityKind::PrimaryWeapon, 200, 1200));
        cd.clear();
        assert!(cd.is_empty());
    }

    #[test]
    fn test_fire_delay_formula() {
        let tuning = Tuning::default();
        let mut player = Player::new(PlayerId(1), "ace", Loadout::default(), Control::Local);
        assert_eq!(fire_delay_ms(&player, &tuning, 0), 200.0);
        player.levels.fire_rate = 6;
        assert!((fire_delay_ms(&player, &tuning, 0) - 180.0).abs() < 1e-3);
        player.buffs.grant(BuffKind::RapidFire, 10);
        assert!((fire_delay_ms(&player, &tuning, 0) - 45.0).abs() < 1e-3);
        player.levels.fire_rate = 20;
        assert_eq!(fire_delay_ms(&player, &tuning, 0), 40.0);
        player.overrides.custom_fire_rate = Some(500.0);
        assert_eq!(fire_delay_ms(&player, &tuning, 0), 10.0);
        player.overrides.custom_fire_rate = Some(4.0);
        assert_eq!(fire_delay_ms(&player, &tuning, 0), 250.0);
    }

    #[test]
    fn test_shot_damage_formula() {
        let tuning = Tuning::default();
        let mut player = Player::new(PlayerId(1), "ace", Loadout::default(), Control::Local);
        assert_eq!(shot_damage(&player, &tuning), 1);
        player.levels.damage = 8;
        assert_eq!(shot_damage(&player, &tuning), 2);
        player.overrides.custom_bullet_damage = Some(3.0);
        assert_eq!(shot_damage(&player, &tuning), 6);
        player.overrides.custom_bullet_damage = Some(0.0);
        assert_eq!(shot_damage(&player, &tuning), 1);
    }

    #[test]
    fn test_auto_fire_respects_cooldown() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout::default());
        let mut cd = Cooldowns::new();
        run(&mut state, &mut cd, &at(1000), &tuning);
        run(&mut state, &mut cd, &at(1100), &tuning);
        assert_eq!(state.bullets.len(), 1);
        run(&mut state, &mut cd, &at(1200), &tuning);
        assert_eq!(state.bullets.len(), 2);
        assert!(state.bullets.iter().all(|b| b.vel.y < 0.0));
    }

    #[test]
    fn test_manual_fire_needs_input() {
        let tuning = Tuning {
            auto_fire: false,
            ..Default::default()
        };
        let mut state = solo(Loadout::default());
        let mut cd = Cooldowns::new();
        run(&mut state, &mut cd, &at(0), &tuning);
        assert!(state.bullets.is_empty());
        let input = TickInput {
            fire: true,
            ..at(0)
        };
        run(&mut state, &mut cd, &input, &tuning);
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_multi_shot_fans_five() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout::default());
        state.players[0].buffs.grant(BuffKind::MultiShot, 5000);
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        assert_eq!(state.bullets.len(), 5);
        let xs: Vec<f32> = state.bullets.iter().map(|b| b.vel.x).collect();
        assert!(xs[0] < 0.0 && xs[2].abs() < 1e-3 && xs[4] > 0.0);
    }

    #[test]
    fn test_laser_beam_is_stationary_double_damage() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout::default());
        state.players[0].buffs.grant(BuffKind::LaserBeam, 5000);
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        let beam = &state.bullets[0];
        assert_eq!(beam.vel, Vec2::ZERO);
        assert_eq!(beam.damage, 2);
        assert_eq!(beam.pos.y, 0.0);
        assert!(matches!(beam.kind, BulletKind::Beam { .. }));
    }

    #[test]
    fn test_pierce_upgrade() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout {
            upgrade: Some(UpgradeKind::BulletPierce),
            ..Default::default()
        });
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        assert_eq!(state.bullets[0].hits_remaining, 3);
    }

    #[test]
    fn test_slot_activation_consumes_inventory() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout::default());
        state.players[0].inventory.add(PowerupKind::Shield);
        let mut cd = Cooldowns::new();
        let mut input = at(1000);
        input.slots[1] = true;
        run(&mut state, &mut cd, &input, &tuning);
        let player = &state.players[0];
        assert_eq!(player.inventory.count(PowerupKind::Shield), 0);
        assert_eq!(player.buffs.expiry(BuffKind::Shield), Some(16_000));

        // Nothing held: pressing again is a no-op
        input.now_ms = 5000;
        run(&mut state, &mut cd, &input, &tuning);
        assert_eq!(state.players[0].buffs.expiry(BuffKind::Shield), Some(16_000));
    }

    #[test]
    fn test_healer_restores_one_life() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout {
            companion: Some(Companion::new(CompanionKind::Healer, 1)),
            ..Default::default()
        });
        state.players[0].lives = Lives::Finite(1);
        let mut cd = Cooldowns::new();
        run(&mut state, &mut cd, &at(0), &tuning);
        assert_eq!(state.players[0].lives, Lives::Finite(2));
        run(&mut state, &mut cd, &at(44_000), &tuning);
        assert_eq!(state.players[0].lives, Lives::Finite(2));
        run(&mut state, &mut cd, &at(45_000), &tuning);
        assert_eq!(state.players[0].lives, Lives::Finite(3));
    }

    #[test]
    fn test_missing_companion_cooldown_is_noop() {
        let mut tuning = Tuning::default();
        tuning.companion_cooldowns_ms.remove(&CompanionKind::Drone);
        tuning.auto_fire = false;
        let mut state = solo(Loadout {
            companion: Some(Companion::new(CompanionKind::Drone, 1)),
            ..Default::default()
        });
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_drone_fires_three_ways() {
        let tuning = Tuning {
            auto_fire: false,
            ..Default::default()
        };
        let mut state = solo(Loadout {
            companion: Some(Companion::new(CompanionKind::Drone, 1)),
            ..Default::default()
        });
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        assert_eq!(state.bullets.len(), 3);
        assert!(state.bullets.iter().all(|b| b.damage == 2));
    }

    #[test]
    fn test_explosion_falloff_damage() {
        let tuning = Tuning {
            auto_fire: false,
            ..Default::default()
        };
        let mut state = solo(Loadout {
            companion: Some(Companion::new(CompanionKind::Explosion, 1)),
            ..Default::default()
        });
        let player = state.players[0].clone();
        let origin = Vec2::new(player.center().x, player.pos.y - player.size.y / 2.0);
        let half = Vec2::splat(ENEMY_WIDTH / 2.0);
        state.enemies.push(Enemy::new(EnemyId(1), 0, EnemyKind::Mothership, origin - half, 10));
        state.enemies.push(Enemy::new(
            EnemyId(2),
            1,
            EnemyKind::Mothership,
            origin + Vec2::new(70.0, 0.0) - half,
            10,
        ));
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        assert_eq!(state.enemies[0].health, 5);
        assert_eq!(state.enemies[1].health, 9);
        assert_eq!(state.explosions.len(), 1);
    }

    #[test]
    fn test_galactic_bomb_destroys_everything() {
        let tuning = Tuning::default();
        let mut state = GameState::new(None);
        state.add_player(Player::new(PlayerId(1), "ace", Loadout::default(), Control::Local));
        apply_special(&mut state, PlayerId(1), PowerupKind::GalacticBomb, &tuning, 0);
        assert!(state.enemies.iter().all(|e| !e.is_alive()));
        assert!(state.enemies.iter().all(|e| e.last_hit_by == Some(PlayerId(1))));
    }

    #[test]
    fn test_time_freeze_and_invincibility() {
        let tuning = Tuning::default();
        let mut state = solo(Loadout::default());
        apply_special(&mut state, PlayerId(1), PowerupKind::TimeFreeze, &tuning, 100);
        assert_eq!(state.time_freeze_until, Some(5100));
        apply_special(&mut state, PlayerId(1), PowerupKind::Invincibility, &tuning, 100);
        assert!(state.players[0].is_protected(8099));
    }

    #[test]
    fn test_remote_players_never_fire_locally() {
        let tuning = Tuning::default();
        let mut state = GameState::new(None);
        state.add_player(Player::new(
            PlayerId(2),
            "wing",
            Loadout::default(),
            Control::Remote { target: Vec2::ZERO },
        ));
        run(&mut state, &mut Cooldowns::new(), &at(0), &tuning);
        assert!(state.bullets.is_empty());
    }
}
