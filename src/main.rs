//! Nova Swarm headless demo
//!
//! Runs an autopiloted session and prints the summary as JSON.
//!
//! ```text
//! nova-swarm [solo|duo] [ticks] [tuning.json]
//! ```
//!
//! `duo` runs two participants in-process, wired back to back through the
//! JSON codec as a lossless loopback transport.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use nova_swarm::sim::{PlayerId, SharedSeed, TickInput};
use nova_swarm::{RosterEntry, Session, SessionMode, SessionStatus, Tuning};

/// Simulation step (60 Hz)
const FRAME_MS: u64 = 16;

/// Random-walk input driver
struct Autopilot {
    rng: Pcg32,
    input: TickInput,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            input: TickInput::default(),
        }
    }

    fn next(&mut self, now_ms: u64) -> TickInput {
        // Hold a direction for a while before changing it
        if self.rng.random_bool(0.05) {
            self.input.left = self.rng.random_bool(0.5);
            self.input.right = !self.input.left && self.rng.random_bool(0.5);
            self.input.up = self.rng.random_bool(0.2);
            self.input.down = !self.input.up && self.rng.random_bool(0.2);
        }
        let mut slots = [false; 5];
        if self.rng.random_bool(0.01) {
            slots[self.rng.random_range(0..5)] = true;
        }
        TickInput {
            now_ms,
            dt: FRAME_MS as f32 / 1000.0,
            fire: true,
            slots,
            ..self.input.clone()
        }
    }
}

fn load_tuning(path: Option<&String>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match Tuning::load(path) {
        Ok(tuning) => tuning,
        Err(e) => {
            log::warn!("Failed to load tuning from {}: {}, using defaults", path, e);
            Tuning::default()
        }
    }
}

fn run_solo(ticks: u64, tuning: Tuning) -> Result<(), Box<dyn std::error::Error>> {
    let roster = [RosterEntry::new(PlayerId(1), "pilot")];
    let mut session = Session::new(SessionMode::Solo, &roster, PlayerId(1), tuning)?;
    let mut pilot = Autopilot::new(1);

    for n in 1..=ticks {
        session.step(&pilot.next(n * FRAME_MS));
        if matches!(session.status(), SessionStatus::GameOver(_)) {
            break;
        }
    }
    println!("{}", session.end().to_json()?);
    Ok(())
}

fn run_duo(ticks: u64, tuning: Tuning) -> Result<(), Box<dyn std::error::Error>> {
    let seed = SharedSeed::generate();
    let mode = SessionMode::Shared { seed };
    let roster = [
        RosterEntry::new(PlayerId(1), "lead"),
        RosterEntry::new(PlayerId(2), "wing"),
    ];
    let mut lead = Session::new(mode, &roster, PlayerId(1), tuning.clone())?;
    let mut wing = Session::new(mode, &roster, PlayerId(2), tuning)?;
    let mut pilots = [Autopilot::new(1), Autopilot::new(2)];

    for n in 1..=ticks {
        let now = n * FRAME_MS;
        lead.step(&pilots[0].next(now));
        wing.step(&pilots[1].next(now));

        for envelope in lead.drain_outbox() {
            wing.receive_json(&envelope.to_json()?)?;
        }
        for envelope in wing.drain_outbox() {
            lead.receive_json(&envelope.to_json()?)?;
        }

        let out = |s: &Session| !matches!(s.status(), SessionStatus::Running);
        if out(&lead) && out(&wing) {
            break;
        }
    }

    let (a, b) = (lead.end(), wing.end());
    log::info!(
        "Lead: level {} score {}; wing: level {} score {}",
        a.level_reached,
        a.final_score,
        b.level_reached,
        b.final_score
    );
    println!("{}", a.to_json()?);
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Nova Swarm (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map_or("solo", String::as_str);
    let ticks = args.get(1).and_then(|t| t.parse().ok()).unwrap_or(60 * 60);
    let tuning = load_tuning(args.get(2));

    let result = match mode {
        "duo" => run_duo(ticks, tuning),
        "solo" => run_solo(ticks, tuning),
        other => {
            eprintln!("Unknown mode '{}', expected solo or duo", other);
            std::process::exit(2);
        }
    };
    if let Err(e) = result {
        log::error!("Session failed: {}", e);
        std::process::exit(1);
    }
}
