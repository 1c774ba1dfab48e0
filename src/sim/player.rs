//! Player entity and the loadout carried into a session

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::PowerupKind;
use super::rect::Rect;
use crate::consts::*;

/// Session-scoped player identity (assigned by the lobby)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Remaining lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lives {
    Finite(u32),
    /// No-clip debug mode
    Unbounded,
}

impl Lives {
    pub fn is_alive(self) -> bool {
        match self {
            Lives::Finite(n) => n > 0,
            Lives::Unbounded => true,
        }
    }

    /// Finite count, if any
    pub fn count(self) -> Option<u32> {
        match self {
            Lives::Finite(n) => Some(n),
            Lives::Unbounded => None,
        }
    }

    /// Lose `n` lives. Returns true if this took the player from alive to dead.
    pub fn lose(&mut self, n: u32) -> bool {
        match self {
            Lives::Finite(left) => {
                let was_alive = *left > 0;
                *left = left.saturating_sub(n);
                was_alive && *left == 0
            }
            Lives::Unbounded => false,
        }
    }

    /// Lose every remaining life
    pub fn lose_all(&mut self) -> bool {
        self.lose(u32::MAX)
    }

    /// Restore one life up to `max`. Returns true if a life was added.
    pub fn heal(&mut self, max: u32) -> bool {
        match self {
            Lives::Finite(left) if *left < max => {
                *left += 1;
                true
            }
            _ => false,
        }
    }
}

/// Time-limited buff kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuffKind {
    RapidFire,
    Shield,
    SpeedBoost,
    LaserBeam,
    MultiShot,
    Invincibility,
}

/// Active buffs: kind -> expiry timestamp (ms)
///
/// Expired entries are never swept; activity is checked lazily against `now`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buffs(BTreeMap<BuffKind, u64>);

impl Buffs {
    pub fn is_active(&self, kind: BuffKind, now: u64) -> bool {
        self.0.get(&kind).is_some_and(|&expiry| expiry > now)
    }

    /// Set (or extend) a buff's expiry
    pub fn grant(&mut self, kind: BuffKind, until: u64) {
        let expiry = self.0.entry(kind).or_insert(until);
        *expiry = (*expiry).max(until);
    }

    /// Remove a buff outright (a shield absorbing a hit)
    pub fn consume(&mut self, kind: BuffKind) {
        self.0.remove(&kind);
    }

    pub fn expiry(&self, kind: BuffKind) -> Option<u64> {
        self.0.get(&kind).copied()
    }
}

/// Held-but-unactivated pickups: kind -> count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory(BTreeMap<PowerupKind, u32>);

impl Inventory {
    pub fn add(&mut self, kind: PowerupKind) {
        *self.0.entry(kind).or_insert(0) += 1;
    }

    /// Spend one charge; false when none are held
    pub fn take(&mut self, kind: PowerupKind) -> bool {
        match self.0.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.0.remove(&kind);
                }
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, kind: PowerupKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Companion kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompanionKind {
    AutoShooter,
    Magnet,
    Healer,
    Shield,
    Speed,
    Bomb,
    Laser,
    Teleport,
    Freeze,
    Poison,
    Explosion,
    Drone,
}

/// An equipped companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub kind: CompanionKind,
    pub level: u32,
}

impl Companion {
    pub fn new(kind: CompanionKind, level: u32) -> Self {
        Self {
            kind,
            level: level.max(1),
        }
    }
}

/// Equippable permanent upgrades (one at a time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    DoubleCoins,
    HealthRegen,
    BulletPierce,
}

/// Permanent upgrade levels (all start at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    pub fire_rate: u32,
    pub damage: u32,
    pub mobility: u32,
}

impl Default for UpgradeLevels {
    fn default() -> Self {
        Self {
            fire_rate: 1,
            damage: 1,
            mobility: 1,
        }
    }
}

/// Admin/debug overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugOverrides {
    /// Unbounded lives, ignores all hits
    pub no_clip: bool,
    /// Doubles movement speed
    pub super_speed: bool,
    /// Permanent rapid fire
    pub rapid_fire: bool,
    /// Shots per second, replacing the fire-rate formula
    pub custom_fire_rate: Option<f32>,
    /// Damage multiplier for primary shots
    pub custom_bullet_damage: Option<f32>,
}

/// Who drives a player's position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Control {
    /// Driven by this client's input
    Local,
    /// Mirror of a remote participant, smoothed toward the last reported position
    Remote { target: Vec2 },
}

/// Everything a player brings into a session from the outside
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadout {
    pub companion: Option<Companion>,
    pub upgrade: Option<UpgradeKind>,
    pub levels: UpgradeLevels,
    pub overrides: DebugOverrides,
    pub inventory: Inventory,
}

/// A player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Top-left position
    pub pos: Vec2,
    pub size: Vec2,
    pub lives: Lives,
    pub score: u64,
    pub coins_earned: u64,
    pub buffs: Buffs,
    pub inventory: Inventory,
    pub levels: UpgradeLevels,
    pub companion: Option<Companion>,
    pub upgrade: Option<UpgradeKind>,
    pub overrides: DebugOverrides,
    pub control: Control,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, loadout: Loadout, control: Control) -> Self {
        let pos = Self::spawn_point();
        let control = match control {
            Control::Remote { .. } => Control::Remote { target: pos },
            Control::Local => Control::Local,
        };
        let lives = if loadout.overrides.no_clip {
            Lives::Unbounded
        } else {
            Lives::Finite(STARTING_LIVES)
        };
        Self {
            id,
            name: name.into(),
            pos,
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            lives,
            score: 0,
            coins_earned: 0,
            buffs: Buffs::default(),
            inventory: loadout.inventory,
            levels: loadout.levels,
            companion: loadout.companion,
            upgrade: loadout.upgrade,
            overrides: loadout.overrides,
            control,
        }
    }

    /// Bottom-center spawn position
    pub fn spawn_point() -> Vec2 {
        Vec2::new(FIELD_WIDTH / 2.0 - PLAYER_WIDTH / 2.0, FIELD_HEIGHT - 100.0)
    }

    /// Back to the spawn point with full lives and no buffs
    pub fn respawn(&mut self) {
        self.pos = Self::spawn_point();
        self.lives = if self.overrides.no_clip {
            Lives::Unbounded
        } else {
            Lives::Finite(STARTING_LIVES)
        };
        self.buffs = Buffs::default();
        if let Control::Remote { target } = &mut self.control {
            *target = self.pos;
        }
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self.control, Control::Local)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.lives.is_alive()
    }

    /// Immune to every kind of hit (no-clip or invincibility)
    pub fn is_protected(&self, now: u64) -> bool {
        self.overrides.no_clip || self.buffs.is_active(BuffKind::Invincibility, now)
    }

    pub fn has_companion(&self, kind: CompanionKind) -> bool {
        self.companion.is_some_and(|c| c.kind == kind)
    }

    pub fn has_upgrade(&self, kind: UpgradeKind) -> bool {
        self.upgrade == Some(kind)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }
}
