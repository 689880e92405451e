//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - Time only through `TickInput`
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod levels;
pub mod state;
pub mod tick;

pub use autopilot::Autopilot;
pub use levels::{LevelDefinition, LevelTable, SpawnProfile, endless_profile, spawn_profile};
pub use state::{
    Bubble, BubbleKind, FeedbackMessage, GameEvent, GameMode, GameOverReason, Particle, SimState,
    SimStatus,
};
pub use tick::{TickInput, restart_level, spawn_bubble, tick, tick_effects};
