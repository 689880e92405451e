//! Progress persistence
//!
//! Features:
//! - Versioned JSON checkpoint (highest unlocked level)
//! - Per-mode high scores
//! - Corruption detection and recovery: unreadable records are removed and
//!   treated as absent

use serde::{Deserialize, Serialize};

use crate::highscores::HighScores;
use crate::platform::Storage;
use crate::platform::time::unix_millis;
use crate::sim::GameMode;

pub const CHECKPOINT_KEY: &str = "bubble_pop_checkpoint";
pub const CHECKPOINT_VERSION: u32 = 1;

/// Highest level the player may start from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// 1-based, never below 1
    pub highest_unlocked_level: u32,
    pub version: u32,
    /// Unix ms of the last write
    pub saved_at: f64,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            highest_unlocked_level: 1,
            version: CHECKPOINT_VERSION,
            saved_at: 0.0,
        }
    }
}

impl Checkpoint {
    fn is_valid(&self) -> bool {
        self.version == CHECKPOINT_VERSION && self.highest_unlocked_level >= 1
    }
}

/// What the session needs from persistence
pub trait ProgressStore {
    fn load_checkpoint(&mut self) -> Checkpoint;
    /// Record that level `cleared_level` (1-based) was cleared, unlocking
    /// `cleared_level + 1`. Returns true if the stored value went up.
    fn save_unlocked_level_if_higher(&mut self, cleared_level: usize) -> bool;
    fn high_score(&self, mode: GameMode) -> u64;
    /// Returns true when `score` is a new record for `mode`
    fn save_high_score(&mut self, mode: GameMode, score: u64, level: u32) -> bool;
    fn clear_checkpoint(&mut self);
}

/// [`ProgressStore`] over any [`Storage`] backend
#[derive(Debug)]
pub struct Persistence<S: Storage> {
    storage: S,
    checkpoint: Option<Checkpoint>,
    high_scores: HighScores,
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        let high_scores = HighScores::load(&storage);
        Self {
            storage,
            checkpoint: None,
            high_scores,
        }
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn read_checkpoint(&self) -> Checkpoint {
        match self.storage.load_json::<Checkpoint>(CHECKPOINT_KEY) {
            Ok(Some(cp)) if cp.is_valid() => cp,
            Ok(Some(cp)) => {
                log::warn!(
                    "Discarding checkpoint (version {}, level {})",
                    cp.version,
                    cp.highest_unlocked_level
                );
                self.discard_checkpoint();
                Checkpoint::default()
            }
            Ok(None) => Checkpoint::default(),
            Err(e) => {
                log::warn!("Discarding unreadable checkpoint: {}", e);
                self.discard_checkpoint();
                Checkpoint::default()
            }
        }
    }

    fn discard_checkpoint(&self) {
        if let Err(e) = self.storage.remove(CHECKPOINT_KEY) {
            log::warn!("Failed to remove checkpoint: {}", e);
        }
    }
}

impl<S: Storage> ProgressStore for Persistence<S> {
    fn load_checkpoint(&mut self) -> Checkpoint {
        let cp = self.read_checkpoint();
        self.checkpoint = Some(cp);
        cp
    }

    fn save_unlocked_level_if_higher(&mut self, cleared_level: usize) -> bool {
        let current = match self.checkpoint {
            Some(cp) => cp,
            None => self.load_checkpoint(),
        };
        let unlocked = u32::try_from(cleared_level.saturating_add(1))
            .unwrap_or(u32::MAX)
            .max(1);
        if unlocked <= current.highest_unlocked_level {
            return false;
        }

        let cp = Checkpoint {
            highest_unlocked_level: unlocked,
            version: CHECKPOINT_VERSION,
            saved_at: unix_millis(),
        };
        match self.storage.save_json(CHECKPOINT_KEY, &cp) {
            Ok(()) => {
                log::info!("Unlocked level {}", unlocked);
                self.checkpoint = Some(cp);
                true
            }
            Err(e) => {
                log::warn!("Failed to save checkpoint: {}", e);
                false
            }
        }
    }

    fn high_score(&self, mode: GameMode) -> u64 {
        self.high_scores.best(mode)
    }

    fn save_high_score(&mut self, mode: GameMode, score: u64, level: u32) -> bool {
        if !self.high_scores.qualifies(mode, score) {
            return false;
        }
        let record = self.high_scores.submit(mode, score, level, unix_millis());
        self.high_scores.save(&self.storage);
        if record {
            log::info!("New {} high score: {}", mode.as_str(), score);
        }
        record
    }

    fn clear_checkpoint(&mut self) {
        self.discard_checkpoint();
        self.checkpoint = Some(Checkpoint::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use proptest::prelude::*;

    #[test]
    fn test_fresh_store_starts_at_level_one() {
        let mut store = Persistence::new(MemoryStorage::new());
        assert_eq!(store.load_checkpoint().highest_unlocked_level, 1);
        assert_eq!(store.high_score(GameMode::Levels), 0);
    }

    #[test]
    fn test_unlock_persists_across_instances() {
        let storage = MemoryStorage::new();
        let mut store = Persistence::new(storage.clone());
        assert!(store.save_unlocked_level_if_higher(2));
        assert!(!store.save_unlocked_level_if_higher(1));

        let mut reopened = Persistence::new(storage);
        assert_eq!(reopened.load_checkpoint().highest_unlocked_level, 3);
    }

    #[test]
    fn test_unlock_floor_is_level_one() {
        let mut store = Persistence::new(MemoryStorage::new());
        assert!(!store.save_unlocked_level_if_higher(0));
        assert!(store.save_unlocked_level_if_higher(1));
        assert_eq!(store.load_checkpoint().highest_unlocked_level, 2);
    }

    #[test]
    fn test_corrupt_checkpoint_removed() {
        let storage = MemoryStorage::new();
        storage.set(CHECKPOINT_KEY, "{{{").unwrap();
        let mut store = Persistence::new(storage.clone());
        assert_eq!(store.load_checkpoint(), Checkpoint::default());
        assert!(storage.get(CHECKPOINT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_wrong_version_and_zero_level_removed() {
        for json in [
            r#"{"highest_unlocked_level":5,"version":99,"saved_at":0.0}"#,
            r#"{"highest_unlocked_level":0,"version":1,"saved_at":0.0}"#,
        ] {
            let storage = MemoryStorage::new();
            storage.set(CHECKPOINT_KEY, json).unwrap();
            let mut store = Persistence::new(storage.clone());
            assert_eq!(store.load_checkpoint().highest_unlocked_level, 1);
            assert!(storage.get(CHECKPOINT_KEY).unwrap().is_none());
        }
    }

    #[test]
    fn test_clear_checkpoint() {
        let storage = MemoryStorage::new();
        let mut store = Persistence::new(storage.clone());
        store.save_unlocked_level_if_higher(6);
        store.clear_checkpoint();
        assert_eq!(store.load_checkpoint().highest_unlocked_level, 1);
        assert!(store.save_unlocked_level_if_higher(1));
    }

    #[test]
    fn test_high_score_keeps_best() {
        let storage = MemoryStorage::new();
        let mut store = Persistence::new(storage.clone());
        assert!(store.save_high_score(GameMode::Infinite, 500, 0));
        assert!(!store.save_high_score(GameMode::Infinite, 300, 0));
        assert_eq!(store.high_score(GameMode::Infinite), 500);

        let reopened = Persistence::new(storage);
        assert_eq!(reopened.high_score(GameMode::Infinite), 500);
    }

    proptest! {
        #[test]
        fn prop_unlocked_level_never_decreases(clears in prop::collection::vec(0usize..40, 1..30)) {
            let mut store = Persistence::new(MemoryStorage::new());
            let mut prev = store.load_checkpoint().highest_unlocked_level;
            for cleared in clears {
                store.save_unlocked_level_if_higher(cleared);
                let now = store.load_checkpoint().highest_unlocked_level;
                prop_assert!(now >= prev);
                prop_assert!(now >= 1);
                prev = now;
            }
        }
    }
}
