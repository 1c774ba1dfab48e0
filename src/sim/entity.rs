//! Non-player entities: enemies, bullets, pickups, explosions
//!
//! Every behavior class is a closed enum chosen at construction time, so a
//! new enemy tier or bullet class is a compile-checked change.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::player::{BuffKind, PlayerId};
use super::rect::Rect;
use crate::consts::*;

/// Stable enemy identity, derived from wave serial and formation slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

impl EnemyId {
    /// Slots per wave in the id space
    pub const SLOTS_PER_WAVE: u32 = 10_000;

    pub fn for_slot(wave_serial: u32, slot: u32) -> Self {
        Self(wave_serial.wrapping_mul(Self::SLOTS_PER_WAVE).wrapping_add(slot))
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

/// Enemy tiers, weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Scout,
    Fighter,
    Cruiser,
    Destroyer,
    Battleship,
    Mothership,
}

impl EnemyKind {
    /// Tiers a formation slot can be promoted to
    pub const PROMOTION_LADDER: [EnemyKind; 5] = [
        EnemyKind::Scout,
        EnemyKind::Fighter,
        EnemyKind::Cruiser,
        EnemyKind::Destroyer,
        EnemyKind::Battleship,
    ];

    /// Boss kinds, cycled every ten levels
    pub const BOSSES: [EnemyKind; 3] = [
        EnemyKind::Mothership,
        EnemyKind::Destroyer,
        EnemyKind::Battleship,
    ];

    pub fn base_health(self) -> i32 {
        match self {
            EnemyKind::Scout => 1,
            EnemyKind::Fighter => 2,
            EnemyKind::Cruiser => 3,
            EnemyKind::Destroyer => 4,
            EnemyKind::Battleship => 5,
            EnemyKind::Mothership => 8,
        }
    }

    /// Base (horizontal, vertical) speed in pixels per 60 Hz frame
    pub fn base_speed(self) -> Vec2 {
        match self {
            EnemyKind::Scout => Vec2::new(4.0, 2.0),
            EnemyKind::Fighter => Vec2::new(3.0, 1.5),
            EnemyKind::Cruiser => Vec2::new(2.5, 1.2),
            EnemyKind::Destroyer => Vec2::new(2.0, 1.0),
            EnemyKind::Battleship => Vec2::new(1.5, 0.8),
            EnemyKind::Mothership => Vec2::new(1.0, 0.5),
        }
    }

    /// Body size for a formation enemy of this tier
    pub fn size(self) -> Vec2 {
        match self {
            EnemyKind::Battleship => Vec2::new(ENEMY_WIDTH * 1.5, ENEMY_HEIGHT * 1.5),
            _ => Vec2::new(ENEMY_WIDTH, ENEMY_HEIGHT),
        }
    }
}

/// Behavior class of an enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyClass {
    /// Formation member following the level's movement pattern
    Standard,
    /// Lone boss bouncing across the field
    Boss { velocity: Vec2 },
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EnemyId,
    /// Index within the formation (drives per-enemy phase offsets)
    pub slot: u32,
    pub kind: EnemyKind,
    pub class: EnemyClass,
    /// Top-left position
    pub pos: Vec2,
    pub size: Vec2,
    /// Origin for oscillating movement patterns
    pub anchor: Vec2,
    pub health: i32,
    pub max_health: i32,
    /// Animation phase counter (cosmetic)
    pub anim_phase: f32,
    pub frozen_until: Option<u64>,
    /// Player whose damage landed last (kill attribution)
    #[serde(default)]
    pub last_hit_by: Option<PlayerId>,
}

impl Enemy {
    pub fn new(id: EnemyId, slot: u32, kind: EnemyKind, pos: Vec2, health: i32) -> Self {
        let health = health.max(1);
        Self {
            id,
            slot,
            kind,
            class: EnemyClass::Standard,
            pos,
            size: kind.size(),
            anchor: pos,
            health,
            max_health: health,
            anim_phase: 0.0,
            frozen_until: None,
            last_hit_by: None,
        }
    }

    pub fn boss(id: EnemyId, kind: EnemyKind, pos: Vec2, health: i32, velocity: Vec2) -> Self {
        let mut enemy = Self::new(id, 0, kind, pos, health);
        enemy.size = Vec2::new(BOSS_WIDTH, BOSS_HEIGHT);
        enemy.class = EnemyClass::Boss { velocity };
        enemy
    }

    #[inline]
    pub fn is_boss(&self) -> bool {
        matches!(self.class, EnemyClass::Boss { .. })
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Frozen iff the freeze expiry is still in the future
    pub fn is_frozen(&self, now: u64) -> bool {
        self.frozen_until.is_some_and(|until| until > now)
    }

    /// Apply damage; returns true if this hit took the enemy to zero
    pub fn apply_damage(&mut self, damage: i32) -> bool {
        let was_alive = self.is_alive();
        self.health -= damage.max(0);
        was_alive && !self.is_alive()
    }

    /// Damage attributed to a player
    pub fn hit(&mut self, damage: i32, by: Option<PlayerId>) -> bool {
        if !self.is_alive() {
            return false;
        }
        if by.is_some() {
            self.last_hit_by = by;
        }
        self.apply_damage(damage)
    }

    /// Destroy outright regardless of remaining health
    pub fn destroy(&mut self, by: Option<PlayerId>) -> bool {
        if !self.is_alive() {
            return false;
        }
        if by.is_some() {
            self.last_hit_by = by;
        }
        self.health = 0;
        true
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }
}

/// Locally allocated bullet identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BulletId(pub u32);

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player(PlayerId),
    Enemy(EnemyId),
}

/// Bullet behavior class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BulletKind {
    /// Consumed by the first enemy it hits
    Standard,
    /// Hits up to `hits_remaining` distinct enemies
    Piercing { struck: Vec<EnemyId> },
    /// Detonates near the ground or a target, damaging everything in radius
    Area { radius: f32 },
    /// Stationary corridor; damages each enemy it touches once
    Beam { expires_at: u64, struck: Vec<EnemyId> },
    /// Drifting cloud that pulses damage until it expires
    Poison {
        expires_at: u64,
        next_pulse_at: u64,
    },
}

/// A bullet entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: BulletId,
    /// Top-left position
    pub pos: Vec2,
    pub size: Vec2,
    /// Velocity in pixels per second (negative y travels up)
    pub vel: Vec2,
    pub owner: BulletOwner,
    pub damage: i32,
    pub hits_remaining: u32,
    pub kind: BulletKind,
}

impl Bullet {
    pub fn new(id: BulletId, owner: BulletOwner, pos: Vec2, size: Vec2, vel: Vec2, damage: i32) -> Self {
        Self {
            id,
            pos,
            size,
            vel,
            owner,
            damage,
            hits_remaining: 1,
            kind: BulletKind::Standard,
        }
    }

    /// Builder: give the bullet a behavior class
    pub fn with_kind(mut self, kind: BulletKind) -> Self {
        if matches!(kind, BulletKind::Beam { .. } | BulletKind::Poison { .. } | BulletKind::Area { .. }) {
            self.hits_remaining = u32::MAX;
        }
        self.kind = kind;
        self
    }

    /// Builder: pierce through `hits` enemies
    pub fn piercing(mut self, hits: u32) -> Self {
        if hits > 1 {
            self.kind = BulletKind::Piercing { struck: Vec::new() };
        }
        self.hits_remaining = hits.max(1);
        self
    }

    #[inline]
    pub fn is_enemy(&self) -> bool {
        matches!(self.owner, BulletOwner::Enemy(_))
    }

    pub fn player_owner(&self) -> Option<PlayerId> {
        match self.owner {
            BulletOwner::Player(id) => Some(id),
            BulletOwner::Enemy(_) => None,
        }
    }

    /// Beams and poison clouds expire on a timer instead of leaving the field
    pub fn expires_at(&self) -> Option<u64> {
        match self.kind {
            BulletKind::Beam { expires_at, .. } | BulletKind::Poison { expires_at, .. } => Some(expires_at),
            _ => None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }
}

/// Pickup identity, derived from the spawn roll seed so participants agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PickupId(pub u64);

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    RapidFire,
    Shield,
    SpeedBoost,
    LaserBeam,
    MultiShot,
    GalacticBomb,
    MegaBomb,
    Invincibility,
    TimeFreeze,
}

impl PowerupKind {
    /// Stored kinds, in ability-slot order (slot 1 first)
    pub const STORED: [PowerupKind; 5] = [
        PowerupKind::RapidFire,
        PowerupKind::Shield,
        PowerupKind::SpeedBoost,
        PowerupKind::LaserBeam,
        PowerupKind::MultiShot,
    ];

    /// Rare kinds that take effect the moment they are collected
    pub const SPECIAL: [PowerupKind; 4] = [
        PowerupKind::GalacticBomb,
        PowerupKind::MegaBomb,
        PowerupKind::Invincibility,
        PowerupKind::TimeFreeze,
    ];

    /// Kind bound to a 0-based ability slot
    pub fn for_slot(slot: usize) -> Option<Self> {
        Self::STORED.get(slot).copied()
    }

    pub fn is_special(self) -> bool {
        Self::SPECIAL.contains(&self)
    }

    /// Buff granted on activation, if this kind is a timed buff
    pub fn buff(self) -> Option<BuffKind> {
        match self {
            PowerupKind::RapidFire => Some(BuffKind::RapidFire),
            PowerupKind::Shield => Some(BuffKind::Shield),
            PowerupKind::SpeedBoost => Some(BuffKind::SpeedBoost),
            PowerupKind::LaserBeam => Some(BuffKind::LaserBeam),
            PowerupKind::MultiShot => Some(BuffKind::MultiShot),
            PowerupKind::Invincibility => Some(BuffKind::Invincibility),
            PowerupKind::GalacticBomb | PowerupKind::MegaBomb | PowerupKind::TimeFreeze => None,
        }
    }

    /// Body size of the falling pickup
    pub fn size(self) -> Vec2 {
        if self.is_special() {
            Vec2::splat(40.0)
        } else {
            Vec2::splat(30.0)
        }
    }
}

/// A falling power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: PickupId,
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: PowerupKind,
    /// Pixels per second
    pub fall_speed: f32,
}

impl Powerup {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }
}

/// A falling coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: PickupId,
    pub pos: Vec2,
    pub size: Vec2,
    pub value: u32,
    /// Pixels per second
    pub fall_speed: f32,
}

impl Coin {
    pub const SIZE: f32 = 20.0;

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }
}

/// Cosmetic explosion timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    /// Center point
    pub pos: Vec2,
    pub max_size: f32,
    pub elapsed_ms: f32,
    pub duration_ms: f32,
}

impl Explosion {
    pub fn new(pos: Vec2, max_size: f32, duration_ms: f32) -> Self {
        Self {
            pos,
            max_size,
            elapsed_ms: 0.0,
            duration_ms,
        }
    }

    /// Sized for an enemy death
    pub fn for_enemy(enemy: &Enemy) -> Self {
        let size = if enemy.is_boss() { 100.0 } else { 50.0 };
        Self::new(enemy.rect().center(), size, 800.0)
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed_ms += dt * 1000.0;
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Normalized progress 0-1 (for rendering)
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}
