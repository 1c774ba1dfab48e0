//! Session lifecycle around the tick loop
//!
//! A session owns the simulation state, the cooldown scheduler and (in
//! shared mode) the sync adapter. Each `step` runs:
//! inbound apply -> tick -> outbound emit -> status check.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{
    Control, Cooldowns, GameState, Loadout, Player, PlayerId, SharedSeed, SimEvent, TickInput,
    tick,
};
use crate::summary::SessionSummary;
use crate::sync::{Envelope, SyncAdapter, SyncError};
use crate::tuning::{Tuning, TuningError};

/// Failure starting a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Roster is empty")]
    EmptyRoster,
    #[error("Local player {0} is not on the roster")]
    UnknownLocal(PlayerId),
    #[error(transparent)]
    Tuning(#[from] TuningError),
}

/// Solo or shared-seed multiplayer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    Solo,
    Shared { seed: SharedSeed },
}

impl SessionMode {
    pub fn seed(self) -> Option<SharedSeed> {
        match self {
            Self::Solo => None,
            Self::Shared { seed } => Some(seed),
        }
    }
}

/// One participant as handed over by the lobby
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub loadout: Loadout,
}

impl RosterEntry {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            loadout: Loadout::default(),
        }
    }
}

/// Where the session stands after a step
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Running,
    /// Multiplayer: the local player is out, the others may still be playing
    AwaitingLobby,
    /// Terminal
    GameOver(SessionSummary),
}

/// A running session on one client
#[derive(Debug)]
pub struct Session {
    state: GameState,
    cooldowns: Cooldowns,
    tuning: Tuning,
    mode: SessionMode,
    local: PlayerId,
    sync: Option<SyncAdapter>,
    status: SessionStatus,
}

impl Session {
    pub fn new(
        mode: SessionMode,
        roster: &[RosterEntry],
        local: PlayerId,
        tuning: Tuning,
    ) -> Result<Self, SessionError> {
        tuning.validate()?;
        if roster.is_empty() {
            return Err(SessionError::EmptyRoster);
        }
        if !roster.iter().any(|r| r.id == local) {
            return Err(SessionError::UnknownLocal(local));
        }

        let mut state = GameState::new(mode.seed());
        for entry in roster {
            let control = if entry.id == local {
                Control::Local
            } else {
                Control::Remote {
                    target: Player::spawn_point(),
                }
            };
            state.add_player(Player::new(entry.id, entry.name.clone(), entry.loadout.clone(), control));
        }

        let sync = mode.seed().map(|seed| {
            let mut adapter = SyncAdapter::new(local, seed);
            if state.authority() == Some(local) {
                adapter.broadcast_seed();
            }
            adapter
        });

        log::info!(
            "Session started: {:?}, {} player(s), local {}",
            mode,
            roster.len(),
            local
        );

        Ok(Self {
            state,
            cooldowns: Cooldowns::new(),
            tuning,
            mode,
            local,
            sync,
            status: SessionStatus::Running,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn local(&self) -> PlayerId {
        self.local
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn cooldowns(&self) -> &Cooldowns {
        &self.cooldowns
    }

    /// Advance one tick. Returns the events it produced.
    pub fn step(&mut self, input: &TickInput) -> Vec<SimEvent> {
        if matches!(self.status, SessionStatus::GameOver(_)) {
            return Vec::new();
        }
        let now = input.now_ms;
        let mut input = input.clone();
        input.dt = clamp_dt(input.dt, self.tuning.max_dt);

        if let Some(sync) = &mut self.sync {
            sync.apply_inbound(&mut self.state, &self.tuning, now);
        }

        tick(&mut self.state, &input, &mut self.cooldowns, &self.tuning);
        let events = self.state.drain_events();

        if let Some(sync) = &mut self.sync {
            sync.emit(&self.state, &events, &self.tuning, now);
        }

        self.update_status();
        events
    }

    fn update_status(&mut self) {
        let alive = self.state.any_local_alive();
        match (&self.status, alive, self.sync.is_some()) {
            (SessionStatus::Running, false, false) => {
                let summary = SessionSummary::from_state(&self.state);
                log::info!(
                    "Game over: score {}, level {}",
                    summary.final_score,
                    summary.level_reached
                );
                self.cooldowns.clear();
                self.status = SessionStatus::GameOver(summary);
            }
            (SessionStatus::Running, false, true) => {
                log::info!("{} is out, awaiting return to lobby", self.local);
                self.status = SessionStatus::AwaitingLobby;
            }
            (SessionStatus::AwaitingLobby, true, _) => {
                self.status = SessionStatus::Running;
            }
            _ => {}
        }
    }

    /// Bring the local player back with full lives. Announced to peers.
    pub fn respawn_local(&mut self) -> bool {
        if matches!(self.status, SessionStatus::GameOver(_)) {
            return false;
        }
        let Some(player) = self.state.player_mut(self.local) else {
            return false;
        };
        player.respawn();
        let event = SimEvent::PlayerRespawned {
            player: player.id,
            pos: player.pos,
            lives: player.lives,
        };
        log::info!("{} respawned", self.local);
        if let Some(sync) = &mut self.sync {
            sync.announce(&event);
        }
        self.status = SessionStatus::Running;
        true
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Queue a raw inbound message (ignored in solo sessions)
    pub fn receive_json(&mut self, json: &str) -> Result<(), SyncError> {
        match &mut self.sync {
            Some(sync) => sync.receive_json(json),
            None => Ok(()),
        }
    }

    pub fn receive(&mut self, envelope: Envelope) -> Result<(), SyncError> {
        match &mut self.sync {
            Some(sync) => sync.receive(envelope),
            None => Ok(()),
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        self.sync
            .as_mut()
            .map(SyncAdapter::drain_outbox)
            .unwrap_or_default()
    }

    /// Tear down: clear every cooldown and produce the summary
    pub fn end(&mut self) -> SessionSummary {
        self.cooldowns.clear();
        let summary = match &self.status {
            SessionStatus::GameOver(summary) => summary.clone(),
            _ => SessionSummary::from_state(&self.state),
        };
        log::info!("Session ended with score {}", summary.final_score);
        self.status = SessionStatus::GameOver(summary.clone());
        summary
    }
}

/// Non-finite or negative dt becomes 0; long frames are capped
fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max_dt) } else { 0.0 }
}
