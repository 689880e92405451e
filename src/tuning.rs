//! Data-driven game balance
//!
//! Every tunable constant of the pointer pipeline and the simulation lives
//! here. Missing fields in a JSON override fall back to the defaults, so a
//! tuning file only has to mention what it changes.

use serde::{Deserialize, Serialize};

use crate::tracking::PointerConfig;

/// What "restart" means after a game over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RestartPolicy {
    /// Replay the level the run ended on, starting from that level's score
    #[default]
    FromLevelStart,
    /// Start over from the first level with zero score
    FromFirstLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Filter, mapper, deadzone and freshness window
    pub pointer: PointerConfig,

    // === Spawning ===
    /// Time between spawns before the level's spawn multiplier (ms)
    pub base_spawn_interval_ms: f64,
    /// Rise speed before multipliers (pixels per tick)
    pub base_speed: f32,
    /// Per-bubble speed jitter range
    pub speed_jitter_min: f32,
    pub speed_jitter_max: f32,
    /// Bubble radius range (pixels)
    pub radius_min: f32,
    pub radius_max: f32,
    /// Probability band for rare bubbles, drawn right after the hazard band
    pub rare_band: f32,
    /// Second draw that must succeed for a life-restore bubble
    pub life_restore_chance: f32,
    /// Life-restore bubbles never appear before this level index
    pub life_restore_min_level: usize,

    // === Scoring ===
    pub ordinary_points: u64,
    pub rare_points: u64,
    /// Hit distance as a multiple of the bubble radius
    pub hit_radius_multiplier: f32,

    // === Endless difficulty ===
    /// Hazard probability added per point scored
    pub endless_hazard_per_point: f32,
    /// Speed multiplier added per point scored
    pub endless_speed_per_point: f32,

    // === Effects ===
    /// Downward particle acceleration (pixels per tick²)
    pub particle_gravity: f32,
    /// Particle life lost per tick
    pub particle_decay: f32,
    /// Screen shake multiplier applied each tick
    pub shake_damping: f32,
    pub hazard_shake: f32,
    pub restart_shake: f32,
    /// How long feedback messages stay up (ticks)
    pub message_ticks: u32,

    // === Session ===
    /// Intermission after a level clear (ticks); 0 resumes immediately
    pub level_transition_ticks: u32,
    pub restart_policy: RestartPolicy,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            pointer: PointerConfig::default(),

            base_spawn_interval_ms: 900.0,
            base_speed: 2.0,
            speed_jitter_min: 0.8,
            speed_jitter_max: 1.2,
            radius_min: 28.0,
            radius_max: 48.0,
            rare_band: 0.08,
            life_restore_chance: 0.03,
            life_restore_min_level: 2,

            ordinary_points: 10,
            rare_points: 50,
            hit_radius_multiplier: 1.3,

            endless_hazard_per_point: 1.0 / 4000.0,
            endless_speed_per_point: 1.0 / 1500.0,

            particle_gravity: 0.15,
            particle_decay: 0.02,
            shake_damping: 0.9,
            hazard_shake: 12.0,
            restart_shake: 20.0,
            message_ticks: 90,

            level_transition_ticks: 60,
            restart_policy: RestartPolicy::FromLevelStart,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning override
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let t = Tuning::default();
        assert_eq!(t.hit_radius_multiplier, 1.3);
        assert_eq!(t.pointer.deadzone_px, 2.0);
        assert_eq!(t.pointer.freshness_ms, 500.0);
        assert_eq!(t.pointer.filter.min_cutoff, 1.5);
        assert_eq!(t.pointer.filter.beta, 0.05);
        assert_eq!(t.pointer.filter.d_cutoff, 1.0);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let t = Tuning::from_json(
            r#"{ "rare_points": 75, "pointer": { "mapper": { "mirror_x": false } } }"#,
        )
        .unwrap();
        assert_eq!(t.rare_points, 75);
        assert!(!t.pointer.mapper.mirror_x);
        assert_eq!(t.pointer.mapper.margin, 10.0);
        assert_eq!(t.ordinary_points, 10);
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut t = Tuning::default();
        t.restart_policy = RestartPolicy::FromFirstLevel;
        let back = Tuning::from_json(&t.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(Tuning::from_json("{ not json").is_err());
    }
}
