//! Game state and simulation events
//!
//! Everything a tick reads or writes lives in [`GameState`]. Collections are
//! kept sorted by id so iteration order matches on every participant.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{
    Bullet, BulletId, Coin, Enemy, EnemyId, EnemyKind, Explosion, PickupId, Powerup, PowerupKind,
};
use super::formation;
use super::movement::MovementPattern;
use super::player::{Lives, Player, PlayerId};
use super::rng::SharedSeed;
use super::wave::WaveController;

/// Per-level progression state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    /// Current level (1-based, capped)
    pub level: u32,
    /// Number of waves spawned this session; keeps enemy ids unique past the level cap
    pub serial: u32,
    /// Movement pattern drawn on level entry
    pub pattern: MovementPattern,
    /// Kills this level (drives boss score escalation)
    pub kills_this_level: u32,
    /// Pattern clock in seconds, scaled by enemy speed
    pub clock: f32,
    /// Shared horizontal offset for the group-formation pattern
    pub group_offset: f32,
    /// +1 or -1
    pub group_direction: f32,
}

impl WaveState {
    pub fn new(level: u32, serial: u32, seed: Option<SharedSeed>) -> Self {
        Self {
            level,
            serial,
            pattern: MovementPattern::for_level(level, seed),
            kills_this_level: 0,
            clock: 0.0,
            group_offset: 0.0,
            group_direction: 1.0,
        }
    }
}

/// Something that happened during a tick that the outside world may care about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    PlayerMoved {
        player: PlayerId,
        pos: Vec2,
    },
    PlayerFired {
        bullet: Bullet,
    },
    EnemyDestroyed {
        enemy: EnemyId,
        kind: EnemyKind,
        boss: bool,
        by: Option<PlayerId>,
        score: u64,
    },
    PowerupTaken {
        pickup: PickupId,
        kind: PowerupKind,
        player: PlayerId,
    },
    CoinTaken {
        pickup: PickupId,
        value: u32,
        player: PlayerId,
    },
    LifeLost {
        player: PlayerId,
        lives: Lives,
    },
    PlayerDied {
        player: PlayerId,
        pos: Vec2,
    },
    PlayerRespawned {
        player: PlayerId,
        pos: Vec2,
        lives: Lives,
    },
    ScoreChanged {
        player: PlayerId,
        player_score: u64,
        session_score: u64,
    },
    LevelCleared {
        level: u32,
        bonus: u64,
    },
    LevelStarted {
        level: u32,
        serial: u32,
        pattern: MovementPattern,
    },
}

/// Complete simulation state for one client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Present in multi-participant sessions
    pub shared_seed: Option<SharedSeed>,
    pub wave: WaveState,
    pub progression: WaveController,
    /// Session (team) score
    pub score: u64,
    /// Session kill counter
    pub enemies_destroyed: u32,
    /// Players (sorted by id)
    pub players: Vec<Player>,
    /// Active enemies (sorted by id)
    pub enemies: Vec<Enemy>,
    /// Active bullets (sorted by id)
    pub bullets: Vec<Bullet>,
    /// Falling power-ups (sorted by id)
    pub powerups: Vec<Powerup>,
    /// Falling coins (sorted by id)
    pub coins: Vec<Coin>,
    pub explosions: Vec<Explosion>,
    /// Enemies already destroyed this session; late messages about them are ignored
    pub destroyed: BTreeSet<EnemyId>,
    /// Destroyed here by a mirrored bullet, still waiting for the killer's announcement
    #[serde(default)]
    pub remote_kills: BTreeSet<EnemyId>,
    /// Pickups already collected this session
    pub collected: BTreeSet<PickupId>,
    /// Enemy slow-motion expiry (ms)
    pub time_freeze_until: Option<u64>,
    /// Last enemy volley timestamp (ms)
    pub last_volley_at: u64,
    /// Last shared pickup roll bucket
    pub last_pickup_bucket: Option<u64>,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<SimEvent>,
    /// Next local bullet id
    next_id: u32,
}

impl GameState {
    /// Create a state at level 1 with its formation spawned
    pub fn new(shared_seed: Option<SharedSeed>) -> Self {
        Self::at_level(1, shared_seed)
    }

    /// Create a state starting at an arbitrary level
    pub fn at_level(level: u32, shared_seed: Option<SharedSeed>) -> Self {
        let level = level.max(1);
        let wave = WaveState::new(level, 1, shared_seed);
        let enemies = formation::spawn_wave(level, wave.serial, shared_seed);
        log::info!(
            "Level {}: {} enemies, pattern {:?}",
            level,
            enemies.len(),
            wave.pattern
        );
        Self {
            shared_seed,
            wave,
            progression: WaveController::default(),
            score: 0,
            enemies_destroyed: 0,
            players: Vec::new(),
            enemies,
            bullets: Vec::new(),
            powerups: Vec::new(),
            coins: Vec::new(),
            explosions: Vec::new(),
            destroyed: BTreeSet::new(),
            remote_kills: BTreeSet::new(),
            collected: BTreeSet::new(),
            time_freeze_until: None,
            last_volley_at: 0,
            last_pickup_bucket: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn is_multiplayer(&self) -> bool {
        self.shared_seed.is_some()
    }

    /// Allocate a bullet id
    pub fn next_bullet_id(&mut self) -> BulletId {
        let id = BulletId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a player, keeping the roster sorted
    pub fn add_player(&mut self, player: Player) {
        self.players.retain(|p| p.id != player.id);
        self.players.push(player);
        self.players.sort_by_key(|p| p.id);
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Ids of players driven by this client
    pub fn local_player_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_local())
            .map(|p| p.id)
            .collect()
    }

    pub fn any_local_alive(&self) -> bool {
        self.players.iter().any(|p| p.is_local() && p.is_alive())
    }

    /// Participant holding simulation authority: the living player with the lowest id
    pub fn authority(&self) -> Option<PlayerId> {
        self.players.iter().find(|p| p.is_alive()).map(|p| p.id)
    }

    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    /// Add a player-owned bullet created on this client and announce it
    pub fn fire_player_bullet(&mut self, bullet: Bullet) {
        self.events.push(SimEvent::PlayerFired {
            bullet: bullet.clone(),
        });
        self.bullets.push(bullet);
    }

    /// Enemy slow-motion is in effect
    pub fn is_time_frozen(&self, now: u64) -> bool {
        self.time_freeze_until.is_some_and(|until| until > now)
    }

    /// Credit score to the session and (if known) a player
    pub fn award_score(&mut self, player: Option<PlayerId>, points: u64) {
        if points == 0 {
            return;
        }
        self.score += points;
        if let Some(id) = player {
            let session_score = self.score;
            if let Some(p) = self.player_mut(id) {
                p.score += points;
                let player_score = p.score;
                self.events.push(SimEvent::ScoreChanged {
                    player: id,
                    player_score,
                    session_score,
                });
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure collections are sorted by id for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.players.sort_by_key(|p| p.id);
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
        self.powerups.sort_by_key(|p| p.id);
        self.coins.sort_by_key(|c| c.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::{Control, Loadout};

    #[test]
    fn test_new_state_spawns_level_one() {
        let state = GameState::new(None);
        assert_eq!(state.wave.level, 1);
        assert!(!state.enemies.is_empty());
        assert!(state.enemies.iter().all(|e| e.health > 0));
    }

    #[test]
    fn test_bullet_ids_increment() {
        let mut state = GameState::new(None);
        let a = state.next_bullet_id();
        let b = state.next_bullet_id();
        assert!(b > a);
    }

    #[test]
    fn test_authority_is_lowest_living_id() {
        let mut state = GameState::new(Some(SharedSeed(7)));
        state.add_player(Player::new(PlayerId(5), "b", Loadout::default(), Control::Local));
        state.add_player(Player::new(
            PlayerId(2),
            "a",
            Loadout::default(),
            Control::Remote { target: Vec2::ZERO },
        ));
        assert_eq!(state.authority(), Some(PlayerId(2)));
        state.player_mut(PlayerId(2)).unwrap().lives.lose_all();
        assert_eq!(state.authority(), Some(PlayerId(5)));
    }

    #[test]
    fn test_award_score_credits_player_and_session() {
        let mut state = GameState::new(None);
        state.add_player(Player::new(PlayerId(1), "a", Loadout::default(), Control::Local));
        state.award_score(Some(PlayerId(1)), 100);
        state.award_score(None, 50);
        assert_eq!(state.score, 150);
        assert_eq!(state.player(PlayerId(1)).unwrap().score, 100);
        assert_eq!(state.drain_events().len(), 1);
        assert!(state.events.is_empty());
    }
}
