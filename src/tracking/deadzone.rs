//! Deadzone stabilizer
//!
//! Holds the pointer still until it moves further than the jitter threshold,
//! so sub-pixel tracking noise doesn't flicker hover effects or re-trigger hits.

use glam::Vec2;

/// Default jitter threshold in surface pixels
pub const DEFAULT_DEADZONE_PX: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct DeadzoneStabilizer {
    threshold: f32,
    stable: Option<Vec2>,
}

impl Default for DeadzoneStabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_DEADZONE_PX)
    }
}

impl DeadzoneStabilizer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
            stable: None,
        }
    }

    /// Feed a new point; returns the stable point
    pub fn apply(&mut self, point: Vec2) -> Vec2 {
        match self.stable {
            Some(stable) if stable.distance(point) < self.threshold => stable,
            _ => {
                self.stable = Some(point);
                point
            }
        }
    }

    pub fn stable(&self) -> Option<Vec2> {
        self.stable
    }

    pub fn reset(&mut self) {
        self.stable = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_adopted() {
        let mut dz = DeadzoneStabilizer::default();
        assert_eq!(dz.apply(Vec2::new(5.0, 5.0)), Vec2::new(5.0, 5.0));
        assert_eq!(dz.stable(), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_small_move_suppressed() {
        let mut dz = DeadzoneStabilizer::default();
        dz.apply(Vec2::new(100.0, 100.0));
        assert_eq!(dz.apply(Vec2::new(101.0, 100.0)), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_large_move_adopted() {
        let mut dz = DeadzoneStabilizer::default();
        dz.apply(Vec2::new(100.0, 100.0));
        assert_eq!(dz.apply(Vec2::new(103.0, 100.0)), Vec2::new(103.0, 100.0));
        assert_eq!(dz.stable(), Some(Vec2::new(103.0, 100.0)));
    }

    #[test]
    fn test_slow_drift_measured_from_stable_point() {
        let mut dz = DeadzoneStabilizer::default();
        dz.apply(Vec2::ZERO);
        // Each step is under the threshold, but the total drift is not
        assert_eq!(dz.apply(Vec2::new(1.5, 0.0)), Vec2::ZERO);
        assert_eq!(dz.apply(Vec2::new(3.0, 0.0)), Vec2::new(3.0, 0.0));
    }
}
