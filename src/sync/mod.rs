//! Shared-seed multiplayer reconciliation
//!
//! No participant runs a central simulation. Each client simulates its own
//! player and mirrors the others, agreeing on spawns through the shared seed
//! and on discrete outcomes through one-shot messages.

pub mod adapter;
pub mod message;

pub use adapter::SyncAdapter;
pub use message::{EnemyCorrection, Envelope, SyncError, SyncMessage};
