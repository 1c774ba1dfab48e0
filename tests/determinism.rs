//! Property tests for the simulation
//!
//! Random input scripts are fed through full sessions and the invariants
//! that keep participants in agreement are checked after every tick.

use std::collections::BTreeMap;

use proptest::prelude::*;

use nova_swarm::sim::{EnemyId, PlayerId, SharedSeed, TickInput, spawn_wave};
use nova_swarm::{RosterEntry, Session, SessionMode, Tuning};

/// One tick of held keys
#[derive(Debug, Clone)]
struct Keys {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    fire: bool,
    slot: Option<usize>,
    /// Frame length in ms (jittered, sometimes absurdly long)
    frame_ms: u64,
}

fn keys_strategy() -> impl Strategy<Value = Keys> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop::option::of(0..5usize),
        prop_oneof![8 => 10..30u64, 1 => 200..2000u64],
    )
        .prop_map(|(left, right, up, down, fire, slot, frame_ms)| Keys {
            left,
            right,
            up,
            down,
            fire,
            slot,
            frame_ms,
        })
}

fn script(keys: &[Keys]) -> Vec<TickInput> {
    let mut now = 0;
    keys.iter()
        .map(|k| {
            now += k.frame_ms;
            let mut slots = [false; 5];
            if let Some(i) = k.slot {
                slots[i] = true;
            }
            TickInput {
                now_ms: now,
                dt: k.frame_ms as f32 / 1000.0,
                left: k.left,
                right: k.right,
                up: k.up,
                down: k.down,
                fire: k.fire,
                slots,
            }
        })
        .collect()
}

fn solo_session(mode: SessionMode) -> Session {
    let roster = [RosterEntry::new(PlayerId(1), "pilot")];
    Session::new(mode, &roster, PlayerId(1), Tuning::default()).unwrap()
}

fn snapshot(session: &Session) -> String {
    serde_json::to_string(session.state()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn same_inputs_same_state(seed in any::<u64>(), keys in prop::collection::vec(keys_strategy(), 1..200)) {
        let mode = SessionMode::Shared { seed: SharedSeed(seed % SharedSeed::RANGE) };
        let mut a = solo_session(mode);
        let mut b = solo_session(mode);
        for input in script(&keys) {
            let ea = a.step(&input);
            let eb = b.step(&input);
            prop_assert_eq!(ea, eb);
        }
        prop_assert_eq!(snapshot(&a), snapshot(&b));
    }

    #[test]
    fn enemy_health_never_increases(keys in prop::collection::vec(keys_strategy(), 1..300)) {
        let mut session = solo_session(SessionMode::Solo);
        let mut seen: BTreeMap<EnemyId, i32> = BTreeMap::new();
        for input in script(&keys) {
            session.step(&input);
            for enemy in &session.state().enemies {
                prop_assert!(enemy.health > 0, "{} present at {}", enemy.id, enemy.health);
                if let Some(prev) = seen.insert(enemy.id, enemy.health) {
                    prop_assert!(enemy.health <= prev, "{} healed {} -> {}", enemy.id, prev, enemy.health);
                }
            }
        }
    }

    #[test]
    fn positions_stay_finite_and_in_field(keys in prop::collection::vec(keys_strategy(), 1..200)) {
        let mut session = solo_session(SessionMode::Solo);
        for input in script(&keys) {
            session.step(&input);
            let state = session.state();
            for player in &state.players {
                prop_assert!(player.pos.is_finite());
                prop_assert!(player.rect().in_field());
            }
            for enemy in &state.enemies {
                prop_assert!(enemy.pos.is_finite());
            }
        }
    }

    #[test]
    fn formations_fit_the_field(level in 1..=100u32, seed in any::<u64>()) {
        let enemies = spawn_wave(level, level, Some(SharedSeed(seed % SharedSeed::RANGE)));
        prop_assert!(!enemies.is_empty());
        for enemy in &enemies {
            prop_assert!(enemy.rect().in_field(), "{:?}", enemy.pos);
        }
        let mut ids: Vec<_> = enemies.iter().map(|e| e.id).collect();
        ids.dedup();
        prop_assert_eq!(ids.len(), enemies.len());
    }
}
