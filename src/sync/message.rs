//! Wire messages exchanged between participants
//!
//! One closed enum, one typed payload per kind. JSON on the wire:
//!
//! ```text
//! {"from":2,"msg":{"type":"enemy-destroyed","data":{"enemy":10003,"by":2,"score":100}}}
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{Bullet, EnemyId, Lives, PickupId, PlayerId, SharedSeed};

/// Errors at the transport boundary
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Message from {0} echoed back to its sender")]
    Echo(PlayerId),
}

/// Corrected position and health for one enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyCorrection {
    pub id: EnemyId,
    pub pos: Vec2,
    pub health: i32,
}

/// Every message kind the transport carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SyncMessage {
    /// Host distributes the session seed once at start
    SeedBroadcast { seed: SharedSeed },
    PlayerMove { player: PlayerId, pos: Vec2 },
    PlayerFire { bullet: Bullet },
    /// Authority-only, high rate
    EnemyUpdate { enemies: Vec<EnemyCorrection> },
    /// Authority-only, low rate
    GameStateUpdate { level: u32, serial: u32, score: u64 },
    PowerupTaken { pickup: PickupId, player: PlayerId },
    CoinTaken { pickup: PickupId, player: PlayerId },
    EnemyDestroyed {
        enemy: EnemyId,
        by: Option<PlayerId>,
        score: u64,
    },
    /// Sent when the sender starts wave `serial` at `level`
    LevelCompleted { level: u32, serial: u32 },
    PlayerDeath { player: PlayerId, lives: Lives },
    PlayerRespawn { player: PlayerId, pos: Vec2, lives: Lives },
    ScoreUpdate { player: PlayerId, score: u64 },
}

impl SyncMessage {
    /// Kebab-case kind name, matching the wire tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SeedBroadcast { .. } => "seed-broadcast",
            Self::PlayerMove { .. } => "player-move",
            Self::PlayerFire { .. } => "player-fire",
            Self::EnemyUpdate { .. } => "enemy-update",
            Self::GameStateUpdate { .. } => "game-state-update",
            Self::PowerupTaken { .. } => "powerup-taken",
            Self::CoinTaken { .. } => "coin-taken",
            Self::EnemyDestroyed { .. } => "enemy-destroyed",
            Self::LevelCompleted { .. } => "level-completed",
            Self::PlayerDeath { .. } => "player-death",
            Self::PlayerRespawn { .. } => "player-respawn",
            Self::ScoreUpdate { .. } => "score-update",
        }
    }
}

/// A message plus the participant that sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: PlayerId,
    pub msg: SyncMessage,
}

impl Envelope {
    pub fn new(from: PlayerId, msg: SyncMessage) -> Self {
        Self { from, msg }
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tag_is_kebab_case() {
        let env = Envelope::new(
            PlayerId(2),
            SyncMessage::EnemyDestroyed {
                enemy: EnemyId(10_003),
                by: Some(PlayerId(2)),
                score: 100,
            },
        );
        let json = env.to_json().unwrap();
        assert!(json.contains("\"type\":\"enemy-destroyed\""));
        assert_eq!(Envelope::from_json(&json).unwrap(), env);
    }

    #[test]
    fn test_kind_matches_tag() {
        let msg = SyncMessage::GameStateUpdate {
            level: 3,
            serial: 3,
            score: 900,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(msg.kind()));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{"from":1,"msg":{"type":"chat","data":{"text":"hi"}}}"#;
        assert!(matches!(Envelope::from_json(json), Err(SyncError::Json(_))));
    }

    #[test]
    fn test_truncated_rejected() {
        assert!(Envelope::from_json(r#"{"from":1,"msg":{"type":"player-move""#).is_err());
    }
}
