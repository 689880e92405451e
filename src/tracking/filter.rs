//! One-euro adaptive low-pass filter
//!
//! Smooths a noisy 2-D point stream. Slow motion is smoothed heavily (low
//! cutoff, little jitter); fast motion raises the cutoff so the output keeps
//! up with the hand instead of lagging behind it.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest timestep the filter will use, in seconds
pub const MIN_DT: f32 = 1e-3;

/// Filter tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Cutoff frequency at rest (Hz)
    pub min_cutoff: f32,
    /// How much the cutoff rises per unit of speed (pixels/second)
    pub beta: f32,
    /// Cutoff used to smooth the velocity estimate (Hz)
    pub d_cutoff: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_cutoff: 1.5,
            beta: 0.05,
            d_cutoff: 1.0,
        }
    }
}

/// Exponential smoothing coefficient for a cutoff frequency at timestep `dt`
#[inline]
pub fn smoothing_alpha(cutoff: f32, dt: f32) -> f32 {
    let tau = 1.0 / (TAU * cutoff);
    1.0 / (1.0 + tau / dt)
}

/// Two-axis one-euro filter sharing one speed estimate across both axes
#[derive(Debug, Clone)]
pub struct OneEuroFilter2D {
    params: FilterParams,
    prev: Option<Vec2>,
    velocity: Vec2,
    last_ms: Option<f64>,
}

impl Default for OneEuroFilter2D {
    fn default() -> Self {
        Self::new(FilterParams::default())
    }
}

impl OneEuroFilter2D {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            prev: None,
            velocity: Vec2::ZERO,
            last_ms: None,
        }
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Filter one sample taken at `now_ms` (milliseconds, monotonic)
    pub fn update(&mut self, raw: Vec2, now_ms: f64) -> Vec2 {
        let (Some(prev), Some(last_ms)) = (self.prev, self.last_ms) else {
            self.prev = Some(raw);
            self.last_ms = Some(now_ms);
            self.velocity = Vec2::ZERO;
            return raw;
        };

        let dt = (((now_ms - last_ms) / 1000.0) as f32).max(MIN_DT);

        let raw_velocity = (raw - prev) / dt;
        let d_alpha = smoothing_alpha(self.params.d_cutoff, dt);
        self.velocity = self.velocity.lerp(raw_velocity, d_alpha);

        let cutoff = self.params.min_cutoff + self.params.beta * self.velocity.length();
        let alpha = smoothing_alpha(cutoff, dt);
        let smoothed = prev.lerp(raw, alpha);

        self.prev = Some(smoothed);
        self.last_ms = Some(now_ms);
        smoothed
    }

    /// Last smoothed value, if any sample has been seen
    pub fn value(&self) -> Option<Vec2> {
        self.prev
    }

    /// Forget all history; the next sample passes through unchanged
    pub fn reset(&mut self) {
        self.prev = None;
        self.velocity = Vec2::ZERO;
        self.last_ms = None;
    }
}
