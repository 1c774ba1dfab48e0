//! End-of-session summary
//!
//! Handed to the account/persistence collaborator once a session ends.
//! The simulation never persists anything itself.

use serde::{Deserialize, Serialize};

use crate::sim::{CompanionKind, GameState, PlayerId, UpgradeKind, UpgradeLevels};

/// One participant's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub score: u64,
    pub coins_earned: u64,
    pub companion: Option<CompanionKind>,
    pub companion_level: Option<u32>,
    pub upgrade: Option<UpgradeKind>,
    pub levels: UpgradeLevels,
    /// Simulated by this client (false for mirrors)
    pub local: bool,
}

/// Session outcome record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub final_score: u64,
    pub level_reached: u32,
    pub enemies_destroyed: u32,
    /// Coins collected by local players
    pub coins_earned: u64,
    pub multiplayer: bool,
    /// Currency the account layer should credit
    pub currency_award: u64,
    pub players: Vec<PlayerRecord>,
}

impl SessionSummary {
    /// Snapshot the outcome of `state`
    pub fn from_state(state: &GameState) -> Self {
        let players: Vec<PlayerRecord> = state
            .players
            .iter()
            .map(|p| PlayerRecord {
                id: p.id,
                name: p.name.clone(),
                score: p.score,
                coins_earned: p.coins_earned,
                companion: p.companion.map(|c| c.kind),
                companion_level: p.companion.map(|c| c.level),
                upgrade: p.upgrade,
                levels: p.levels,
                local: p.is_local(),
            })
            .collect();
        let coins_earned = players.iter().filter(|p| p.local).map(|p| p.coins_earned).sum();

        Self {
            final_score: state.score,
            level_reached: state.wave.level,
            enemies_destroyed: state.enemies_destroyed,
            coins_earned,
            multiplayer: state.is_multiplayer(),
            currency_award: currency_award(state.score),
            players,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Currency for a final score: floor(score * 2 / 1.5)
pub fn currency_award(score: u64) -> u64 {
    // Integer form of score * 2 / 1.5
    score.saturating_mul(4) / 3
}
