//! Demo-mode player
//!
//! Picks a pointer position each frame: the non-hazard bubble closest to
//! escaping, preferring rare ones, skipping anything a hazard overlaps.

use std::cmp::Ordering;

use glam::Vec2;

use super::state::{Bubble, BubbleKind, SimState};

/// Extra clearance kept around hazards (pixels)
const HAZARD_CLEARANCE: f32 = 12.0;

#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    hit_radius_multiplier: f32,
}

impl Autopilot {
    pub fn new(hit_radius_multiplier: f32) -> Self {
        Self {
            hit_radius_multiplier,
        }
    }

    /// Where the pointer should be this frame, or `None` to leave it alone
    pub fn aim(&self, state: &SimState) -> Option<Vec2> {
        let hazards: Vec<&Bubble> = state
            .bubbles
            .iter()
            .filter(|b| b.kind == BubbleKind::Hazard && !b.popped)
            .collect();

        let is_safe = |target: &Bubble| {
            hazards.iter().all(|h| {
                let reach = h.radius * self.hit_radius_multiplier + HAZARD_CLEARANCE;
                h.pos.distance(target.pos) > reach
            })
        };

        state
            .bubbles
            .iter()
            .filter(|b| b.kind != BubbleKind::Hazard && !b.popped)
            .filter(|b| is_safe(b))
            .min_by(|a, b| {
                // Rare first, then whichever is nearest the top edge
                let rank = |x: &Bubble| (x.kind != BubbleKind::Rare) as u8;
                rank(a).cmp(&rank(b)).then(
                    a.pos
                        .y
                        .partial_cmp(&b.pos.y)
                        .unwrap_or(Ordering::Equal),
                )
            })
            .map(|b| b.pos)
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(1.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameMode;

    #[test]
    fn test_empty_field_gives_no_aim() {
        let state = SimState::new(GameMode::Levels, 0, 1);
        assert!(Autopilot::default().aim(&state).is_none());
    }

    #[test]
    fn test_prefers_rare_then_topmost() {
        let mut state = SimState::new(GameMode::Levels, 0, 1);
        state.push_bubble(BubbleKind::Ordinary, Vec2::new(100.0, 50.0), 30.0, 1.0);
        state.push_bubble(BubbleKind::Ordinary, Vec2::new(300.0, 400.0), 30.0, 1.0);
        assert_eq!(Autopilot::default().aim(&state), Some(Vec2::new(100.0, 50.0)));

        state.push_bubble(BubbleKind::Rare, Vec2::new(500.0, 500.0), 20.0, 1.0);
        assert_eq!(Autopilot::default().aim(&state), Some(Vec2::new(500.0, 500.0)));
    }

    #[test]
    fn test_skips_bubbles_next_to_hazards() {
        let mut state = SimState::new(GameMode::Infinite, 0, 1);
        state.push_bubble(BubbleKind::Hazard, Vec2::new(100.0, 60.0), 30.0, 1.0);
        state.push_bubble(BubbleKind::Ordinary, Vec2::new(110.0, 50.0), 30.0, 1.0);
        state.push_bubble(BubbleKind::Ordinary, Vec2::new(600.0, 300.0), 30.0, 1.0);
        assert_eq!(Autopilot::default().aim(&state), Some(Vec2::new(600.0, 300.0)));
    }
}
