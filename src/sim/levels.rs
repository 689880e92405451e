//! Level table and endless-mode difficulty curve

use serde::{Deserialize, Serialize};

use super::state::{GameMode, SimState};
use crate::consts::*;
use crate::tuning::Tuning;

/// One level's balance values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Cumulative score needed to clear the level
    pub target_score: u64,
    pub speed_multiplier: f32,
    pub spawn_multiplier: f32,
    pub hazard_probability: f32,
}

/// Precomputed, read-only level table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Cumulative score target for a level: 150, 375, 650, 975, ...
pub fn level_target(index: usize) -> u64 {
    let i = index as u64;
    FIRST_LEVEL_TARGET + i * (200 + 25 * i)
}

impl LevelTable {
    /// The shipped table
    pub fn standard() -> Self {
        Self::generate(LEVEL_COUNT)
    }

    /// Build `count` levels (at least one), ramping every multiplier linearly
    /// from its easiest to its hardest bound
    pub fn generate(count: usize) -> Self {
        let count = count.max(1);
        let last = (count - 1).max(1) as f32;
        let levels = (0..count)
            .map(|i| {
                let t = i as f32 / last;
                LevelDefinition {
                    target_score: level_target(i),
                    speed_multiplier: MIN_SPEED_MULTIPLIER
                        + (MAX_SPEED_MULTIPLIER - MIN_SPEED_MULTIPLIER) * t,
                    spawn_multiplier: MAX_SPAWN_MULTIPLIER
                        - (MAX_SPAWN_MULTIPLIER - MIN_SPAWN_MULTIPLIER) * t,
                    hazard_probability: MIN_HAZARD_PROBABILITY
                        + (MAX_HAZARD_PROBABILITY - MIN_HAZARD_PROBABILITY) * t,
                }
            })
            .collect();
        Self { levels }
    }

    pub fn get(&self, index: usize) -> Option<&LevelDefinition> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter()
    }
}

/// Spawn parameters in effect for the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnProfile {
    pub speed_multiplier: f32,
    pub spawn_multiplier: f32,
    pub hazard_probability: f32,
}

/// Endless difficulty: hazard chance and speed both climb with score, each capped
pub fn endless_profile(score: u64, tuning: &Tuning) -> SpawnProfile {
    let score = score as f32;
    SpawnProfile {
        speed_multiplier: (MIN_SPEED_MULTIPLIER + score * tuning.endless_speed_per_point)
            .min(MAX_SPEED_MULTIPLIER),
        spawn_multiplier: MAX_SPAWN_MULTIPLIER,
        hazard_probability: (MIN_HAZARD_PROBABILITY + score * tuning.endless_hazard_per_point)
            .min(MAX_HAZARD_PROBABILITY),
    }
}

/// Profile for the state's mode and level
pub fn spawn_profile(state: &SimState, levels: &LevelTable, tuning: &Tuning) -> SpawnProfile {
    match state.mode {
        GameMode::Infinite => endless_profile(state.score, tuning),
        GameMode::Levels => {
            let index = state.level_index.min(levels.len().saturating_sub(1));
            match levels.get(index) {
                Some(level) => SpawnProfile {
                    speed_multiplier: level.speed_multiplier,
                    spawn_multiplier: level.spawn_multiplier,
                    hazard_probability: level.hazard_probability,
                },
                None => endless_profile(0, tuning),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_target() {
        assert_eq!(LevelTable::standard().get(0).unwrap().target_score, 150);
    }

    #[test]
    fn test_targets_strictly_increase() {
        let table = LevelTable::standard();
        let targets: Vec<u64> = table.iter().map(|l| l.target_score).collect();
        assert!(targets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_multipliers_within_bounds() {
        for level in LevelTable::standard().iter() {
            assert!((1.0..=2.5).contains(&level.speed_multiplier));
            assert!((0.5..=1.0).contains(&level.spawn_multiplier));
            assert!((0.05..=0.30 + 1e-6).contains(&level.hazard_probability));
        }
        let table = LevelTable::standard();
        let last = table.get(table.len() - 1).unwrap();
        assert!((last.speed_multiplier - 2.5).abs() < 1e-5);
        assert!((last.spawn_multiplier - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_single_level_table() {
        let table = LevelTable::generate(0);
        assert_eq!(table.len(), 1);
        assert!(table.is_last(0));
        assert_eq!(table.get(0).unwrap().speed_multiplier, 1.0);
    }

    #[test]
    fn test_endless_curve_monotonic_and_capped() {
        let tuning = Tuning::default();
        let mut prev = endless_profile(0, &tuning);
        assert_eq!(prev.hazard_probability, 0.05);
        for score in (100..20_000).step_by(100) {
            let p = endless_profile(score, &tuning);
            assert!(p.hazard_probability >= prev.hazard_probability);
            assert!(p.speed_multiplier >= prev.speed_multiplier);
            prev = p;
        }
        assert_eq!(prev.hazard_probability, 0.30);
        assert_eq!(prev.speed_multiplier, 2.5);
    }

    #[test]
    fn test_profile_follows_mode() {
        let levels = LevelTable::standard();
        let tuning = Tuning::default();
        let mut state = SimState::new(GameMode::Levels, 3, 7);
        assert_eq!(
            spawn_profile(&state, &levels, &tuning).hazard_probability,
            levels.get(3).unwrap().hazard_probability
        );
        state.level_index = 999;
        let last = levels.get(levels.len() - 1).unwrap();
        assert_eq!(
            spawn_profile(&state, &levels, &tuning).speed_multiplier,
            last.speed_multiplier
        );
    }
}
