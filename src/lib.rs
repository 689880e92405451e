//! Bubble Pop - A hand-tracked bubble popping arcade game
//!
//! Core modules:
//! - `tracking`: Pointer pipeline (one-euro filter, cover mapping, deadzone, source selection)
//! - `sim`: Deterministic simulation (spawning, motion, hit testing, scoring, levels)
//! - `session`: Pause/resume/restart state machine wrapped around the simulation
//! - `persistence`: Checkpoint and high score records over a key-value store
//! - `platform`: Browser/native platform abstraction (storage, time)
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tracking;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScores;
pub use session::{SessionController, SessionPhase};
pub use settings::{Difficulty, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Lives at the start of a level-mode session (and the cap for life restores)
    pub const MAX_LIVES: u8 = 3;
    /// Endless mode is one-touch: a single hazard ends the run
    pub const ENDLESS_LIVES: u8 = 1;

    /// Number of levels in the level table
    pub const LEVEL_COUNT: usize = 20;
    /// Score needed to clear the first level
    pub const FIRST_LEVEL_TARGET: u64 = 150;

    /// Level table bounds
    pub const MIN_SPEED_MULTIPLIER: f32 = 1.0;
    pub const MAX_SPEED_MULTIPLIER: f32 = 2.5;
    pub const MIN_SPAWN_MULTIPLIER: f32 = 0.5;
    pub const MAX_SPAWN_MULTIPLIER: f32 = 1.0;
    pub const MIN_HAZARD_PROBABILITY: f32 = 0.05;
    pub const MAX_HAZARD_PROBABILITY: f32 = 0.30;

    /// Maximum live particles
    pub const MAX_PARTICLES: usize = 512;
}
