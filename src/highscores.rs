//! High score tables, one per game mode
//!
//! Each mode keeps its top 10 runs. The first entry is the mode's record;
//! a submission only counts as a new record when it strictly beats it.

use serde::{Deserialize, Serialize};

use crate::platform::Storage;
use crate::sim::GameMode;

/// Maximum number of high scores kept per mode
pub const MAX_HIGH_SCORES: usize = 10;

/// Storage key
pub const STORAGE_KEY: &str = "bubble_pop_highscores";

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub mode: GameMode,
    pub score: u64,
    /// Level reached (1-based; 0 in endless mode)
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    /// Sorted by mode, then descending score
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Entries for one mode, best first
    pub fn for_mode(&self, mode: GameMode) -> impl Iterator<Item = &HighScoreEntry> {
        self.entries.iter().filter(move |e| e.mode == mode)
    }

    /// Record score for a mode (0 when none)
    pub fn best(&self, mode: GameMode) -> u64 {
        self.for_mode(mode).next().map(|e| e.score).unwrap_or(0)
    }

    /// Check if a score would make the mode's table
    pub fn qualifies(&self, mode: GameMode, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        let count = self.for_mode(mode).count();
        if count < MAX_HIGH_SCORES {
            return true;
        }
        self.for_mode(mode).last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a run to its mode's table. Returns true only when the run sets a
    /// new record for the mode.
    pub fn submit(&mut self, mode: GameMode, score: u64, level: u32, timestamp: f64) -> bool {
        let is_record = score > self.best(mode);
        if !self.qualifies(mode, score) {
            return false;
        }

        let entry = HighScoreEntry {
            mode,
            score,
            level,
            timestamp,
        };
        // Ties keep the earlier run ahead
        let pos = self
            .entries
            .iter()
            .position(|e| e.mode > mode || (e.mode == mode && score > e.score))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);

        // Trim the mode's table to size
        let mut kept = 0;
        self.entries.retain(|e| {
            if e.mode != mode {
                return true;
            }
            kept += 1;
            kept <= MAX_HIGH_SCORES
        });

        is_record
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from storage; a missing or unreadable record gives an empty table
    pub fn load(storage: &impl Storage) -> Self {
        match storage.load_json::<HighScores>(STORAGE_KEY) {
            Ok(Some(scores)) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Discarding unreadable high scores: {}", e);
                let _ = storage.remove(STORAGE_KEY);
                Self::new()
            }
        }
    }

    pub fn save(&self, storage: &impl Storage) {
        match storage.save_json(STORAGE_KEY, self) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(e) => log::warn!("Failed to save high scores: {}", e),
        }
    }
}
