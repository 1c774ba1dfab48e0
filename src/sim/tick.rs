//! Per-tick simulation procedure
//!
//! Advances the state one step in a fixed order. Inbound sync messages are
//! applied by the caller before `tick`; outbound events are drained after.

use glam::Vec2;

use super::abilities::{self, Cooldowns};
use super::combat;
use super::movement;
use super::spawn;
use super::state::GameState;
use super::wave::WaveController;
use crate::tuning::Tuning;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Wall-clock timestamp (ms)
    pub now_ms: u64,
    /// Elapsed seconds since the previous tick (already clamped)
    pub dt: f32,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Primary fire held (ignored when auto-fire is on)
    pub fire: bool,
    /// Ability slots 1-5
    pub slots: [bool; 5],
}

impl TickInput {
    /// Movement direction with components in {-1, 0, 1}
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Advance the game state by one step
pub fn tick(state: &mut GameState, input: &TickInput, cooldowns: &mut Cooldowns, tuning: &Tuning) {
    let now = input.now_ms;
    let dt = if input.dt.is_finite() { input.dt.max(0.0) } else { 0.0 };

    // 1. Local intent
    let dir = input.direction();
    for index in 0..state.players.len() {
        movement::move_player(state, index, dir, tuning, now, dt);
    }

    // 2. Integrate everything else
    movement::smooth_remote_players(state, tuning);
    movement::advance_bullets(state, now, dt);
    movement::advance_pickups(state, tuning, dt);
    movement::advance_enemies(state, tuning, now, dt);
    movement::advance_explosions(state, dt);

    // 3. Seeded spawns (nothing new appears while the field is being cleared)
    if !state.progression.is_transitioning() {
        spawn::enemy_volley(state, tuning, now);
        spawn::roll_pickups(state, tuning, now);
    }

    // 4. Collisions and their effects
    combat::resolve(state, tuning, now);

    // 5. Scheduled abilities
    abilities::run(state, cooldowns, input, tuning);

    // Abilities can kill too (bombs, explosions)
    combat::settle_deaths(state, tuning);

    // 6. Clear check / level advance
    WaveController::update(state, tuning, now);

    state.normalize_order();
}
