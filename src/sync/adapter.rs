//! Synchronization adapter
//!
//! Sits between the tick loop and a best-effort transport:
//! - inbound envelopes are queued and applied at the start of the next tick
//! - local `SimEvent`s are translated into outbound envelopes after the tick
//! - the authority adds periodic enemy and game-state corrections
//!
//! Every inbound rule is idempotent. Unknown or already-removed entities are
//! ignored, health only goes down, scores only go up.

use std::collections::VecDeque;

use glam::Vec2;

use super::message::{EnemyCorrection, Envelope, SyncError, SyncMessage};
use crate::sim::combat::remove_remote_kill;
use crate::sim::{
    BulletOwner, Control, GameState, PlayerId, SharedSeed, SimEvent, WaveController,
};
use crate::tuning::Tuning;

/// Per-client sync endpoint
#[derive(Debug)]
pub struct SyncAdapter {
    /// Player this client simulates
    local: PlayerId,
    seed: SharedSeed,
    inbox: VecDeque<Envelope>,
    outbox: Vec<Envelope>,
    /// Latest unsent local position
    pending_move: Option<Vec2>,
    last_move_sent: Option<u64>,
    last_enemy_update: Option<u64>,
    last_state_update: Option<u64>,
}

impl SyncAdapter {
    pub fn new(local: PlayerId, seed: SharedSeed) -> Self {
        Self {
            local,
            seed,
            inbox: VecDeque::new(),
            outbox: Vec::new(),
            pending_move: None,
            last_move_sent: None,
            last_enemy_update: None,
            last_state_update: None,
        }
    }

    pub fn local(&self) -> PlayerId {
        self.local
    }

    /// Queue the seed announcement (host only, once)
    pub fn broadcast_seed(&mut self) {
        let msg = SyncMessage::SeedBroadcast { seed: self.seed };
        self.send(msg);
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Queue a decoded envelope for the next tick
    pub fn receive(&mut self, envelope: Envelope) -> Result<(), SyncError> {
        if envelope.from == self.local {
            return Err(SyncError::Echo(envelope.from));
        }
        self.inbox.push_back(envelope);
        Ok(())
    }

    /// Decode and queue a raw message. Malformed input never reaches the tick.
    pub fn receive_json(&mut self, json: &str) -> Result<(), SyncError> {
        let envelope = Envelope::from_json(json).inspect_err(|e| {
            log::warn!("Dropping undecodable sync message: {}", e);
        })?;
        self.receive(envelope)
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbox.len()
    }

    /// Apply everything queued since the last tick
    pub fn apply_inbound(&mut self, state: &mut GameState, tuning: &Tuning, now: u64) {
        while let Some(envelope) = self.inbox.pop_front() {
            log::trace!("{} <- {}: {}", self.local, envelope.from, envelope.msg.kind());
            self.apply(state, tuning, envelope, now);
        }
    }

    fn apply(&self, state: &mut GameState, tuning: &Tuning, envelope: Envelope, now: u64) {
        let Envelope { from, msg } = envelope;
        match msg {
            SyncMessage::SeedBroadcast { seed } => {
                if seed != self.seed {
                    log::warn!("{} announced seed {:?}, session uses {:?}", from, seed, self.seed);
                }
            }
            SyncMessage::PlayerMove { player, pos } => {
                if !pos.is_finite() {
                    return;
                }
                if let Some(mirror) = remote_mut(state, player) {
                    mirror.control = Control::Remote { target: pos };
                }
            }
            SyncMessage::PlayerFire { mut bullet } => {
                // Only bullets owned by the sender are mirrored
                if bullet.owner != BulletOwner::Player(from) || remote_mut(state, from).is_none() {
                    return;
                }
                if !bullet.pos.is_finite() || !bullet.vel.is_finite() {
                    return;
                }
                bullet.id = state.next_bullet_id();
                state.bullets.push(bullet);
            }
            SyncMessage::EnemyUpdate { enemies } => {
                for correction in enemies {
                    apply_correction(state, correction);
                }
            }
            SyncMessage::GameStateUpdate {
                level,
                serial,
                score,
            } => {
                WaveController::adopt(state, tuning, level, serial, now);
                state.score = state.score.max(score);
            }
            SyncMessage::PowerupTaken { pickup, .. } => {
                state.collected.insert(pickup);
                state.powerups.retain(|p| p.id != pickup);
            }
            SyncMessage::CoinTaken { pickup, .. } => {
                state.collected.insert(pickup);
                state.coins.retain(|c| c.id != pickup);
            }
            SyncMessage::EnemyDestroyed { enemy, by, score } => {
                if remove_remote_kill(state, enemy, by) {
                    state.score += score;
                }
            }
            SyncMessage::LevelCompleted { level, serial } => {
                WaveController::adopt(state, tuning, level, serial, now);
            }
            SyncMessage::PlayerDeath { player, lives } => {
                if let Some(mirror) = remote_mut(state, player) {
                    mirror.lives = lives;
                }
            }
            SyncMessage::PlayerRespawn { player, pos, lives } => {
                if let Some(mirror) = remote_mut(state, player) {
                    mirror.lives = lives;
                    if pos.is_finite() {
                        mirror.pos = pos;
                        mirror.control = Control::Remote { target: pos };
                    }
                }
            }
            SyncMessage::ScoreUpdate { player, score } => {
                if let Some(mirror) = remote_mut(state, player) {
                    mirror.score = mirror.score.max(score);
                }
            }
        }
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Translate this tick's events and add any due corrections
    pub fn emit(&mut self, state: &GameState, events: &[SimEvent], tuning: &Tuning, now: u64) {
        for event in events {
            self.translate(event);
        }
        self.flush_move(tuning, now);

        if state.authority() != Some(self.local) {
            return;
        }
        if due(self.last_enemy_update, tuning.enemy_update_ms, now) {
            self.last_enemy_update = Some(now);
            let enemies = state
                .enemies
                .iter()
                .map(|e| EnemyCorrection {
                    id: e.id,
                    pos: e.pos,
                    health: e.health,
                })
                .collect();
            self.send(SyncMessage::EnemyUpdate { enemies });
        }
        if due(self.last_state_update, tuning.game_state_update_ms, now) {
            self.last_state_update = Some(now);
            self.send(SyncMessage::GameStateUpdate {
                level: state.wave.level,
                serial: state.wave.serial,
                score: state.score,
            });
        }
    }

    /// Send one event outside the tick (e.g. a lobby-driven respawn)
    pub fn announce(&mut self, event: &SimEvent) {
        self.translate(event);
    }

    fn translate(&mut self, event: &SimEvent) {
        let msg = match event {
            SimEvent::PlayerMoved { player, pos } => {
                if *player == self.local {
                    self.pending_move = Some(*pos);
                }
                return;
            }
            SimEvent::PlayerFired { bullet } => SyncMessage::PlayerFire {
                bullet: bullet.clone(),
            },
            SimEvent::EnemyDestroyed {
                enemy, by, score, ..
            } => SyncMessage::EnemyDestroyed {
                enemy: *enemy,
                by: *by,
                score: *score,
            },
            SimEvent::PowerupTaken { pickup, player, .. } => SyncMessage::PowerupTaken {
                pickup: *pickup,
                player: *player,
            },
            SimEvent::CoinTaken { pickup, player, .. } => SyncMessage::CoinTaken {
                pickup: *pickup,
                player: *player,
            },
            SimEvent::LifeLost { player, lives } => SyncMessage::PlayerDeath {
                player: *player,
                lives: *lives,
            },
            SimEvent::PlayerRespawned { player, pos, lives } => SyncMessage::PlayerRespawn {
                player: *player,
                pos: *pos,
                lives: *lives,
            },
            SimEvent::ScoreChanged {
                player,
                player_score,
                ..
            } => SyncMessage::ScoreUpdate {
                player: *player,
                score: *player_score,
            },
            SimEvent::LevelStarted { level, serial, .. } => SyncMessage::LevelCompleted {
                level: *level,
                serial: *serial,
            },
            SimEvent::PlayerDied { .. } | SimEvent::LevelCleared { .. } => return,
        };
        self.send(msg);
    }

    /// Movement is coalesced to one message per broadcast interval
    fn flush_move(&mut self, tuning: &Tuning, now: u64) {
        if self.pending_move.is_none() || !due(self.last_move_sent, tuning.move_broadcast_ms, now) {
            return;
        }
        if let Some(pos) = self.pending_move.take() {
            self.last_move_sent = Some(now);
            self.send(SyncMessage::PlayerMove {
                player: self.local,
                pos,
            });
        }
    }

    fn send(&mut self, msg: SyncMessage) {
        self.outbox.push(Envelope::new(self.local, msg));
    }

    /// Take everything queued for the transport
    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbox)
    }

    /// Take everything queued, encoded as JSON
    pub fn drain_outbox_json(&mut self) -> Result<Vec<String>, SyncError> {
        self.drain_outbox().iter().map(Envelope::to_json).collect()
    }
}

fn due(last: Option<u64>, interval_ms: u64, now: u64) -> bool {
    last.is_none_or(|at| now.saturating_sub(at) >= interval_ms)
}

/// A mirrored player; local players are never touched by inbound messages
fn remote_mut(state: &mut GameState, id: PlayerId) -> Option<&mut crate::sim::Player> {
    state.player_mut(id).filter(|p| !p.is_local())
}

fn apply_correction(state: &mut GameState, correction: EnemyCorrection) {
    let Some(enemy) = state.enemy_mut(correction.id) else {
        return;
    };
    // Removal only ever happens through enemy-destroyed
    enemy.health = enemy.health.min(correction.health.max(1));
    if correction.pos.is_finite() && enemy.is_boss() {
        enemy.pos = correction.pos;
    }
}
