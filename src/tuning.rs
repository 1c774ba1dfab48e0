//! Game balance
//!
//! Every gameplay number lives here so a session can be re-tuned from JSON
//! without a rebuild. Missing fields fall back to the defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::CompanionKind;

/// Failure loading a tuning file
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid tuning value: {0}")]
    Invalid(String),
}

/// Balance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Session ===
    /// Largest delta-time a single tick may advance (seconds)
    pub max_dt: f32,
    /// Highest reachable level
    pub max_level: u32,
    /// Fire the primary weapon without holding the fire key
    pub auto_fire: bool,

    // === Progression ===
    pub level_clear_bonus: u64,
    pub transition_delay_ms: u64,
    pub enemy_kill_score: u64,
    pub boss_kill_base: u64,
    pub boss_kill_per_prior_kill: u64,

    // === Player movement ===
    /// Pixels per second at mobility level 1
    pub player_speed: f32,
    pub mobility_per_level: f32,
    pub vertical_speed_factor: f32,
    pub speed_boost_factor: f32,
    pub super_speed_factor: f32,

    // === Primary weapon ===
    pub fire_delay_ms: f32,
    pub fire_rate_per_level: f32,
    pub rapid_fire_factor: f32,
    pub min_fire_delay_ms: f32,
    /// Floor for the admin custom fire rate delay
    pub min_custom_fire_delay_ms: f32,
    pub bullet_speed: f32,
    pub damage_per_level: f32,
    pub multi_shot_count: u32,
    /// Radians between multi-shot bullets
    pub multi_shot_spread: f32,
    pub laser_width: f32,
    pub laser_damage_factor: i32,
    /// How long a fired beam stays in the field
    pub beam_lifetime_ms: u64,
    pub pierce_hits: u32,

    // === Buffs (ms) ===
    pub rapid_fire_ms: u64,
    pub shield_ms: u64,
    pub speed_boost_ms: u64,
    pub laser_beam_ms: u64,
    pub multi_shot_ms: u64,
    pub invincibility_ms: u64,
    pub time_freeze_ms: u64,
    /// Enemy speed multiplier during time freeze
    pub time_freeze_factor: f32,
    /// Minimum spacing between two slot activations by one player
    pub slot_cooldown_ms: u64,

    // === Upgrades ===
    pub health_regen_ms: u64,

    // === Companions ===
    /// Base cooldowns; a companion with no entry does nothing
    pub companion_cooldowns_ms: BTreeMap<CompanionKind, u64>,
    /// Cooldown reduction per companion level above 1
    pub companion_level_reduction: f32,
    pub companion_shield_ms: u64,
    pub companion_speed_ms: u64,
    pub bomb_damage: i32,
    pub bomb_radius: f32,
    pub bomb_speed: f32,
    pub companion_laser_damage: i32,
    pub companion_laser_height: f32,
    pub freeze_radius: f32,
    pub freeze_ms: u64,
    pub poison_damage: i32,
    pub poison_speed: f32,
    pub poison_ms: u64,
    pub poison_pulse_ms: u64,
    pub explosion_radius: f32,
    pub explosion_max_damage: f32,
    pub drone_shots: u32,
    pub drone_speed: f32,
    pub drone_damage: i32,
    pub magnet_radius: f32,
    /// Pull speed at the owner (pixels per second)
    pub magnet_speed: f32,
    /// Lower bound on pull strength so pickups always approach
    pub magnet_min_pull: f32,

    // === Enemies ===
    pub enemy_speed_per_level: f32,
    pub pattern_amplitude: f32,
    pub pattern_amplitude_per_level: f32,
    pub pattern_frequency: f32,
    pub pattern_frequency_per_level: f32,
    pub volley_delay_ms: f32,
    pub volley_delay_per_level_ms: f32,
    pub min_volley_delay_ms: f32,
    pub volley_rate_per_level: f32,
    pub shoot_chance: f64,
    pub shoot_chance_per_level: f64,
    pub enemy_bullet_speed: f32,
    pub enemy_bullet_speed_per_level: f32,

    // === Pickups ===
    pub powerup_chance: f64,
    pub coin_chance: f64,
    pub pickup_chance_per_level: f64,
    pub special_chance_per_level: f64,
    pub pickup_fall_speed: f32,
    pub pickup_fall_speed_per_level: f32,
    /// Width of a shared pickup roll bucket
    pub pickup_bucket_ms: u64,

    // === Sync ===
    pub move_broadcast_ms: u64,
    pub enemy_update_ms: u64,
    pub game_state_update_ms: u64,
    /// Fraction of the remaining distance a mirrored player covers per tick
    pub remote_lerp: f32,
}

fn default_companion_cooldowns() -> BTreeMap<CompanionKind, u64> {
    use CompanionKind::*;
    BTreeMap::from([
        (AutoShooter, 250),
        (Healer, 45_000),
        (Shield, 30_000),
        (Speed, 25_000),
        (Bomb, 20_000),
        (Laser, 15_000),
        (Teleport, 30_000),
        (Freeze, 25_000),
        (Poison, 18_000),
        (Explosion, 22_000),
        (Drone, 12_000),
    ])
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_dt: 0.1,
            max_level: 100,
            auto_fire: true,

            level_clear_bonus: 50,
            transition_delay_ms: 2000,
            enemy_kill_score: 100,
            boss_kill_base: 1000,
            boss_kill_per_prior_kill: 1000,

            player_speed: 450.0,
            mobility_per_level: 0.1,
            vertical_speed_factor: 0.7,
            speed_boost_factor: 1.5,
            super_speed_factor: 2.0,

            fire_delay_ms: 200.0,
            fire_rate_per_level: 0.02,
            rapid_fire_factor: 0.25,
            min_fire_delay_ms: 40.0,
            min_custom_fire_delay_ms: 10.0,
            bullet_speed: 600.0,
            damage_per_level: 0.15,
            multi_shot_count: 5,
            multi_shot_spread: 0.3,
            laser_width: 16.0,
            laser_damage_factor: 2,
            beam_lifetime_ms: 150,
            pierce_hits: 3,

            rapid_fire_ms: 10_000,
            shield_ms: 15_000,
            speed_boost_ms: 8_000,
            laser_beam_ms: 5_000,
            multi_shot_ms: 8_000,
            invincibility_ms: 8_000,
            time_freeze_ms: 5_000,
            time_freeze_factor: 0.1,
            slot_cooldown_ms: 300,

            health_regen_ms: 35_000,

            companion_cooldowns_ms: default_companion_cooldowns(),
            companion_level_reduction: 0.02,
            companion_shield_ms: 10_000,
            companion_speed_ms: 8_000,
            bomb_damage: 3,
            bomb_radius: 50.0,
            bomb_speed: 400.0,
            companion_laser_damage: 2,
            companion_laser_height: 300.0,
            freeze_radius: 100.0,
            freeze_ms: 3_000,
            poison_damage: 1,
            poison_speed: 200.0,
            poison_ms: 5_000,
            poison_pulse_ms: 500,
            explosion_radius: 80.0,
            explosion_max_damage: 5.0,
            drone_shots: 3,
            drone_speed: 500.0,
            drone_damage: 2,
            magnet_radius: 220.0,
            magnet_speed: 540.0,
            magnet_min_pull: 0.2,

            enemy_speed_per_level: 0.05,
            pattern_amplitude: 70.0,
            pattern_amplitude_per_level: 6.0,
            pattern_frequency: 0.5,
            pattern_frequency_per_level: 0.03,
            volley_delay_ms: 3000.0,
            volley_delay_per_level_ms: 80.0,
            min_volley_delay_ms: 1500.0,
            volley_rate_per_level: 0.03,
            shoot_chance: 0.15,
            shoot_chance_per_level: 0.005,
            enemy_bullet_speed: 250.0,
            enemy_bullet_speed_per_level: 10.0,

            powerup_chance: 0.0008,
            coin_chance: 0.0012,
            pickup_chance_per_level: 0.03,
            special_chance_per_level: 0.0001,
            pickup_fall_speed: 250.0,
            pickup_fall_speed_per_level: 10.0,
            pickup_bucket_ms: 1000,

            move_broadcast_ms: 16,
            enemy_update_ms: 30,
            game_state_update_ms: 100,
            remote_lerp: 0.3,
        }
    }
}

impl Tuning {
    /// Parse (possibly partial) JSON over the defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values that would stall or break the tick
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            return Err(TuningError::Invalid(format!("max_dt must be positive, got {}", self.max_dt)));
        }
        if self.max_level == 0 {
            return Err(TuningError::Invalid("max_level must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.remote_lerp) {
            return Err(TuningError::Invalid(format!(
                "remote_lerp must be within 0..=1, got {}",
                self.remote_lerp
            )));
        }
        if self.magnet_min_pull <= 0.0 || self.magnet_radius <= 0.0 {
            return Err(TuningError::Invalid("magnet radius and minimum pull must be positive".into()));
        }
        if self.pickup_bucket_ms == 0 {
            return Err(TuningError::Invalid("pickup_bucket_ms must be non-zero".into()));
        }
        Ok(())
    }

    /// Cooldown multiplier for a companion of `level`
    pub fn companion_factor(&self, level: u32) -> f32 {
        (1.0 - self.companion_level_reduction * level.saturating_sub(1) as f32).max(0.1)
    }

    /// Scaled companion cooldown, `None` when the companion has no timed ability
    pub fn companion_cooldown(&self, kind: CompanionKind, level: u32) -> Option<u64> {
        let base = *self.companion_cooldowns_ms.get(&kind)?;
        Some((base as f32 * self.companion_factor(level)).round() as u64)
    }

    /// Enemy movement speed multiplier at `level`
    pub fn enemy_speed_multiplier(&self, level: u32) -> f32 {
        1.0 + self.enemy_speed_per_level * level.saturating_sub(1) as f32
    }

    pub fn pattern_amplitude(&self, level: u32) -> f32 {
        self.pattern_amplitude + self.pattern_amplitude_per_level * level as f32
    }

    pub fn pattern_frequency(&self, level: u32) -> f32 {
        self.pattern_frequency + self.pattern_frequency_per_level * level as f32
    }

    /// Milliseconds between enemy volleys at `level`
    pub fn volley_delay_ms(&self, level: u32) -> f32 {
        let base = (self.volley_delay_ms - self.volley_delay_per_level_ms * level as f32)
            .max(self.min_volley_delay_ms);
        base / (1.0 + self.volley_rate_per_level * level.saturating_sub(1) as f32)
    }

    /// Per-enemy chance to shoot in a volley
    pub fn shoot_chance(&self, level: u32) -> f64 {
        self.shoot_chance + self.shoot_chance_per_level * f64::from(level)
    }

    pub fn enemy_bullet_speed(&self, level: u32) -> f32 {
        self.enemy_bullet_speed + self.enemy_bullet_speed_per_level * level as f32
    }

    pub fn pickup_fall_speed(&self, level: u32) -> f32 {
        self.pickup_fall_speed + self.pickup_fall_speed_per_level * level as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "max_level": 20, "magnet_radius": 300.0 }"#).unwrap();
        assert_eq!(tuning.max_level, 20);
        assert_eq!(tuning.magnet_radius, 300.0);
        assert_eq!(tuning.level_clear_bonus, 50);
        assert_eq!(tuning.companion_cooldowns_ms.get(&CompanionKind::Healer), Some(&45_000));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Json(_))));
        assert!(matches!(
            Tuning::from_json(r#"{ "max_dt": 0.0 }"#),
            Err(TuningError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Tuning::load("/definitely/not/here.json"),
            Err(TuningError::Io(_))
        ));
    }

    #[test]
    fn test_companion_cooldown_scales_with_level() {
        let tuning = Tuning::default();
        assert_eq!(tuning.companion_cooldown(CompanionKind::Healer, 1), Some(45_000));
        assert_eq!(tuning.companion_cooldown(CompanionKind::Healer, 6), Some(40_500));
        assert_eq!(tuning.companion_cooldown(CompanionKind::Magnet, 3), None);
    }

    #[test]
    fn test_volley_delay_formula() {
        let tuning = Tuning::default();
        assert_eq!(tuning.volley_delay_ms(1), 2920.0);
        // Clamped at 1500 before the level rate divides it
        let d = tuning.volley_delay_ms(50);
        assert!((d - 1500.0 / 2.47).abs() < 0.01);
    }
}
