//! Player settings and preferences
//!
//! Persisted separately from progress under its own storage key.

use serde::{Deserialize, Serialize};

use crate::platform::Storage;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Rise speed multiplier
    pub fn multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.35,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Flip the camera image (selfie view)
    pub mirror_camera: bool,

    // === Visual Effects ===
    /// Screen shake on hazard pops and restarts
    pub screen_shake: bool,
    /// Pop bursts
    pub particles: bool,

    // === Audio ===
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Accessibility ===
    /// Reduced motion (no shake, no wobble)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            mirror_camera: true,

            screen_shake: true,
            particles: true,

            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bubble_pop_settings";

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective bubble wobble (respects reduced_motion)
    pub fn effective_wobble(&self) -> bool {
        !self.reduced_motion
    }

    /// Sound effect level after master volume. Mute is applied by the sink.
    pub fn sfx_level(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// Music level after master volume
    pub fn music_level(&self) -> f32 {
        (self.master_volume * self.music_volume).clamp(0.0, 1.0)
    }

    /// Load settings; anything missing or unreadable falls back to defaults
    pub fn load(storage: &impl Storage) -> Self {
        match storage.load_json::<Settings>(Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &impl Storage) {
        match storage.save_json(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}
