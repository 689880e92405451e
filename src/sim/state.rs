//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which game is being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameMode {
    /// Discrete levels with score targets, three lives, level restarts
    Levels,
    /// Endless run with score-driven difficulty; one hazard ends it
    Infinite,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Levels => "levels",
            GameMode::Infinite => "infinite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "levels" | "level" => Some(GameMode::Levels),
            "infinite" | "endless" => Some(GameMode::Infinite),
            _ => None,
        }
    }

    pub fn max_lives(&self) -> u8 {
        match self {
            GameMode::Levels => MAX_LIVES,
            GameMode::Infinite => ENDLESS_LIVES,
        }
    }
}

/// Bubble categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BubbleKind {
    #[default]
    Ordinary,
    /// Worth a bonus
    Rare,
    /// Punishes the player on contact
    Hazard,
    /// Gives back a life (level mode only)
    LifeRestore,
}

impl BubbleKind {
    /// Particle/tint colour (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            BubbleKind::Ordinary => 0x7fd8ff,
            BubbleKind::Rare => 0xffd54a,
            BubbleKind::Hazard => 0xff4d4d,
            BubbleKind::LifeRestore => 0x6bff8e,
        }
    }
}

/// A rising bubble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: u32,
    /// Centre in surface pixels
    pub pos: Vec2,
    pub radius: f32,
    /// Upward speed in pixels per tick
    pub speed: f32,
    /// Wobble phase offset (radians)
    pub phase: f32,
    pub kind: BubbleKind,
    pub opacity: f32,
    pub popped: bool,
}

impl Bubble {
    /// Render-only sway. Hit testing always uses `pos`.
    pub fn wobble_offset(&self, time_secs: f32) -> Vec2 {
        let t = time_secs * 2.0 + self.phase;
        Vec2::new(t.sin() * 4.0, (t * 1.3).cos() * 1.5)
    }

    /// Whether a pointer at `pointer` is close enough to pop this bubble
    pub fn hit_by(&self, pointer: Vec2, radius_multiplier: f32) -> bool {
        self.pos.distance(pointer) <= self.radius * radius_multiplier
    }

    /// Entirely past the top edge of the surface
    pub fn has_escaped(&self) -> bool {
        self.pos.y + self.radius < 0.0
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Short on-screen feedback ("+1 Life", "Level 3!")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub text: String,
    pub ticks_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Endless mode hazard pop
    HazardPopped,
    /// Cleared the final level
    AllLevelsCleared,
    /// The session was ended explicitly
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimStatus {
    Playing,
    GameOver(GameOverReason),
}

/// Things that happened during a tick, for audio/persistence/UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Popped { id: u32, kind: BubbleKind, points: u64 },
    LifeLost { lives_left: u8 },
    LifeRestored { lives: u8 },
    LevelCleared { level_index: usize },
    LevelRestarted { level_index: usize },
    GameOver { final_score: u64, reason: GameOverReason },
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub mode: GameMode,
    pub score: u64,
    pub lives: u8,
    /// Current level (always 0 in endless mode)
    pub level_index: usize,
    /// Score when the current level began; level restarts return here
    pub level_start_score: u64,
    /// Time of the last spawn; `None` until the first tick
    pub last_spawn_ms: Option<f64>,
    /// Active bubbles (ascending id)
    pub bubbles: Vec<Bubble>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub message: Option<FeedbackMessage>,
    /// Screen shake magnitude in pixels (decays every tick)
    pub screen_shake: f32,
    pub status: SimStatus,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl SimState {
    /// Start a session at `start_level` (ignored in endless mode)
    pub fn new(mode: GameMode, start_level: usize, seed: u64) -> Self {
        let level_index = match mode {
            GameMode::Levels => start_level,
            GameMode::Infinite => 0,
        };
        Self {
            seed,
            mode,
            score: 0,
            lives: mode.max_lives(),
            level_index,
            level_start_score: 0,
            last_spawn_ms: None,
            bubbles: Vec::new(),
            particles: Vec::new(),
            message: None,
            screen_shake: 0.0,
            status: SimStatus::Playing,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn max_lives(&self) -> u8 {
        self.mode.max_lives()
    }

    pub fn is_playing(&self) -> bool {
        self.status == SimStatus::Playing
    }

    pub fn show_message(&mut self, text: impl Into<String>, ticks: u32) {
        self.message = Some(FeedbackMessage {
            text: text.into(),
            ticks_left: ticks,
        });
    }

    /// Insert a bubble directly (scripted scenarios, tests)
    pub fn push_bubble(&mut self, kind: BubbleKind, pos: Vec2, radius: f32, speed: f32) -> u32 {
        let id = self.next_entity_id();
        self.bubbles.push(Bubble {
            id,
            pos,
            radius,
            speed,
            phase: 0.0,
            kind,
            opacity: 0.85,
            popped: false,
        });
        id
    }
}
