//! Deterministic simulation module
//!
//! All gameplay logic lives here. Anything that must agree across
//! participants draws from [`rng::random`] only:
//! - Seeded RNG only (hash of seed, no hidden state)
//! - Stable iteration order (collections kept sorted by id)
//! - No I/O; outbound effects are reported as [`SimEvent`]s

pub mod abilities;
pub mod collision;
pub mod combat;
pub mod entity;
pub mod formation;
pub mod movement;
pub mod player;
pub mod rect;
pub mod rng;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod wave;

pub use abilities::{AbilityKind, Cooldowns};
pub use collision::{Body, overlaps, within_radius};
pub use entity::{
    Bullet, BulletId, BulletKind, BulletOwner, Coin, Enemy, EnemyClass, EnemyId, EnemyKind,
    Explosion, PickupId, Powerup, PowerupKind,
};
pub use formation::{FormationKind, FormationSlot, grid_size, positions, spawn_wave};
pub use player::{
    BuffKind, Buffs, CompanionKind, Companion, Control, DebugOverrides, Inventory, Lives,
    Loadout, Player, PlayerId, UpgradeKind, UpgradeLevels,
};
pub use rect::Rect;
pub use rng::{SharedSeed, random, random_index};
pub use state::{GameState, SimEvent, WaveState};
pub use tick::{TickInput, tick};
pub use wave::{WaveController, WavePhase};
