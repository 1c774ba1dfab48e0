//! Nova Swarm - A wave-based arcade combat simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, combat, abilities, waves)
//! - `sync`: Shared-seed multiplayer reconciliation
//! - `session`: Session lifecycle around the tick loop
//! - `summary`: End-of-session handoff record
//! - `tuning`: Data-driven game balance

pub mod session;
pub mod sim;
pub mod summary;
pub mod sync;
pub mod tuning;

pub use session::{RosterEntry, Session, SessionError, SessionMode, SessionStatus};
pub use summary::{PlayerRecord, SessionSummary};
pub use sync::{Envelope, SyncAdapter, SyncError, SyncMessage};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (pixels, origin top-left, y grows downward)
    pub const FIELD_WIDTH: f32 = 1400.0;
    pub const FIELD_HEIGHT: f32 = 800.0;

    /// Player ship bounding box
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;

    /// Regular enemy bounding box (battleships are 1.5x)
    pub const ENEMY_WIDTH: f32 = 40.0;
    pub const ENEMY_HEIGHT: f32 = 40.0;

    /// Boss bounding box
    pub const BOSS_WIDTH: f32 = 120.0;
    pub const BOSS_HEIGHT: f32 = 80.0;

    /// Standard bullet size
    pub const BULLET_WIDTH: f32 = 6.0;
    pub const BULLET_HEIGHT: f32 = 15.0;

    /// Margin outside the playfield before a bullet is culled
    pub const CULL_MARGIN: f32 = 20.0;

    /// Formation layout
    pub const FORMATION_CENTER_Y: f32 = 150.0;
    pub const FORMATION_SPACING: f32 = 55.0;

    /// Lives a player starts (and is healed up to) with
    pub const STARTING_LIVES: u32 = 3;
}

/// Replace a non-finite vector with a fallback
#[inline]
pub fn finite_or(v: Vec2, fallback: Vec2) -> Vec2 {
    if v.is_finite() { v } else { fallback }
}

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}
