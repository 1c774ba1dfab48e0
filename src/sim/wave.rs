//! Wave/progression controller
//!
//! Two phases:
//! - Active: enemies alive, checking for a clear each tick
//! - Transitioning: field cleared, waiting out a cosmetic delay
//!
//! A clear is detected only from Active, so one wave produces exactly one
//! transition no matter how many ticks the field stays empty.

use serde::{Deserialize, Serialize};

use super::formation::spawn_wave;
use super::state::{GameState, SimEvent, WaveState};
use crate::tuning::Tuning;

/// Furthest a peer's wave serial may run ahead of ours and still be adopted
pub const MAX_SERIAL_LEAP: u32 = 8;

/// Current progression phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WavePhase {
    #[default]
    Active,
    Transitioning {
        resume_at: u64,
    },
}

/// Progression state machine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveController {
    pub phase: WavePhase,
}

impl WaveController {
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, WavePhase::Transitioning { .. })
    }

    /// Check for a clear or finish a pending transition
    pub fn update(state: &mut GameState, tuning: &Tuning, now: u64) {
        match state.progression.phase {
            WavePhase::Active => {
                if state.enemies.is_empty() {
                    Self::begin_transition(state, tuning, now);
                }
            }
            WavePhase::Transitioning { resume_at } => {
                if now >= resume_at {
                    let next = state.wave.level + 1;
                    let serial = state.wave.serial.saturating_add(1);
                    Self::start_level(state, tuning, next, serial, now);
                }
            }
        }
    }

    fn begin_transition(state: &mut GameState, tuning: &Tuning, now: u64) {
        let level = state.wave.level;
        state.progression.phase = WavePhase::Transitioning {
            resume_at: now + tuning.transition_delay_ms,
        };
        state.bullets.retain(|b| !b.is_enemy());
        state.powerups.clear();
        state.coins.clear();
        state.award_score(None, tuning.level_clear_bonus);
        log::info!("Level {} cleared (+{})", level, tuning.level_clear_bonus);
        state.events.push(SimEvent::LevelCleared {
            level,
            bonus: tuning.level_clear_bonus,
        });
    }

    /// Spawn `level` (capped) as wave number `serial` and return to Active
    pub fn start_level(state: &mut GameState, tuning: &Tuning, level: u32, serial: u32, now: u64) {
        let level = level.clamp(1, tuning.max_level);
        let seed = state.shared_seed;
        state.wave = WaveState::new(level, serial, seed);
        state.enemies = spawn_wave(level, serial, seed);
        state.progression.phase = WavePhase::Active;
        state.last_volley_at = now;
        log::info!(
            "Level {} started: {} enemies, pattern {:?}",
            level,
            state.enemies.len(),
            state.wave.pattern
        );
        state.events.push(SimEvent::LevelStarted {
            level,
            serial,
            pattern: state.wave.pattern,
        });
    }

    /// Follow a participant that already advanced. Stale or duplicate
    /// announcements (serial not ahead of ours) are ignored, and so are
    /// serials further ahead than [`MAX_SERIAL_LEAP`] waves.
    pub fn adopt(state: &mut GameState, tuning: &Tuning, level: u32, serial: u32, now: u64) -> bool {
        if serial <= state.wave.serial {
            return false;
        }
        if serial > state.wave.serial.saturating_add(MAX_SERIAL_LEAP) {
            log::warn!(
                "Ignoring wave {} from a peer, local wave is {}",
                serial,
                state.wave.serial
            );
            return false;
        }
        log::info!("Adopting level {} (wave {}) from a peer", level, serial);
        Self::start_level(state, tuning, level, serial, now);
        // Our own announcement would only echo the peer's
        state
            .events
            .retain(|e| !matches!(e, SimEvent::LevelStarted { serial: s, .. } if *s == serial));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{PickupId, Powerup, PowerupKind};
    use glam::Vec2;

    fn cleared() -> GameState {
        let mut state = GameState::new(None);
        state.enemies.clear();
        state
    }

    #[test]
    fn test_clear_enters_transition_once() {
        let tuning = Tuning::default();
        let mut state = cleared();
        WaveController::update(&mut state, &tuning, 1000);
        WaveController::update(&mut state, &tuning, 1016);
        WaveController::update(&mut state, &tuning, 1032);
        assert_eq!(state.score, 50);
        let clears = state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::LevelCleared { .. }))
            .count();
        assert_eq!(clears, 1);
        assert_eq!(state.progression.phase, WavePhase::Transitioning { resume_at: 3000 });
    }

    #[test]
    fn test_transition_clears_pickups() {
        let tuning = Tuning::default();
        let mut state = cleared();
        state.powerups.push(Powerup {
            id: PickupId(1),
            pos: Vec2::ZERO,
            size: Vec2::splat(30.0),
            kind: PowerupKind::Shield,
            fall_speed: 100.0,
        });
        WaveController::update(&mut state, &tuning, 0);
        assert!(state.powerups.is_empty());
    }

    #[test]
    fn test_level_advances_after_delay() {
        let tuning = Tuning::default();
        let mut state = cleared();
        state.wave.kills_this_level = 7;
        WaveController::update(&mut state, &tuning, 0);
        WaveController::update(&mut state, &tuning, 1999);
        assert_eq!(state.wave.level, 1);
        WaveController::update(&mut state, &tuning, 2000);
        assert_eq!(state.wave.level, 2);
        assert_eq!(state.wave.serial, 2);
        assert_eq!(state.wave.kills_this_level, 0);
        assert!(!state.enemies.is_empty());
        assert_eq!(state.progression.phase, WavePhase::Active);
    }

    #[test]
    fn test_level_capped() {
        let tuning = Tuning::default();
        let mut state = GameState::at_level(100, None);
        state.enemies.clear();
        WaveController::update(&mut state, &tuning, 0);
        WaveController::update(&mut state, &tuning, 5000);
        assert_eq!(state.wave.level, 100);
        // Replayed level still gets fresh ids
        assert!(state.enemies.iter().all(|e| e.id.0 >= 2 * 10_000));
    }

    #[test]
    fn test_adopt_ignores_stale() {
        let tuning = Tuning::default();
        let mut state = GameState::new(None);
        assert!(!WaveController::adopt(&mut state, &tuning, 1, 1, 0));
        assert!(WaveController::adopt(&mut state, &tuning, 4, 3, 0));
        assert_eq!(state.wave.level, 4);
        assert!(!WaveController::adopt(&mut state, &tuning, 4, 3, 10));
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_adopt_rejects_runaway_serial() {
        let tuning = Tuning::default();
        let mut state = GameState::new(None);
        assert!(!WaveController::adopt(&mut state, &tuning, 2, 1 + MAX_SERIAL_LEAP + 1, 0));
        assert!(!WaveController::adopt(&mut state, &tuning, 2, u32::MAX, 0));
        assert_eq!(state.wave.serial, 1);
        assert!(WaveController::adopt(&mut state, &tuning, 2, 1 + MAX_SERIAL_LEAP, 0));
    }
}
