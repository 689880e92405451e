//! Pointer pipeline: source selection plus Mapper → Filter → Deadzone
//!
//! Camera samples win while they're fresh. Once no fingertip has been seen for
//! the freshness window, device pointer (mouse/touch) input takes over, so a
//! frozen hand position never blocks the mouse and the mouse never fights a
//! live hand.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::deadzone::{DEFAULT_DEADZONE_PX, DeadzoneStabilizer};
use super::filter::{FilterParams, OneEuroFilter2D};
use super::mapper::{CoordinateMapper, FrameSize, MapperConfig};
use super::tracker::LandmarkSample;

/// Where the current pointer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerSource {
    Camera,
    Device,
}

/// Pointer pipeline tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    pub filter: FilterParams,
    pub mapper: MapperConfig,
    /// Jitter threshold in surface pixels
    pub deadzone_px: f32,
    /// How long a camera sample keeps priority over device input (ms)
    pub freshness_ms: f64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            filter: FilterParams::default(),
            mapper: MapperConfig::default(),
            deadzone_px: DEFAULT_DEADZONE_PX,
            freshness_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointerPipeline {
    mapper: CoordinateMapper,
    filter: OneEuroFilter2D,
    deadzone: DeadzoneStabilizer,
    freshness_ms: f64,
    /// Timestamp of the last camera sample that produced a pointer
    last_camera_ms: Option<f64>,
    source: Option<PointerSource>,
    smoothed: Option<Vec2>,
}

impl Default for PointerPipeline {
    fn default() -> Self {
        Self::new(PointerConfig::default())
    }
}

impl PointerPipeline {
    pub fn new(config: PointerConfig) -> Self {
        Self {
            mapper: CoordinateMapper::new(config.mapper),
            filter: OneEuroFilter2D::new(config.filter),
            deadzone: DeadzoneStabilizer::new(config.deadzone_px),
            freshness_ms: config.freshness_ms,
            last_camera_ms: None,
            source: None,
            smoothed: None,
        }
    }

    /// True while camera input has priority
    pub fn camera_is_fresh(&self, now_ms: f64) -> bool {
        self.last_camera_ms
            .is_some_and(|t| now_ms - t <= self.freshness_ms)
    }

    /// Feed one detector result. Returns the new stable pointer, or `None`
    /// when the sample carried no hand or frame sizes aren't known yet.
    pub fn push_camera(&mut self, sample: &LandmarkSample, surface: FrameSize) -> Option<Vec2> {
        let fingertip = sample.fingertip?;
        let mapped = self.mapper.map_point(fingertip, sample.frame, surface)?;
        self.last_camera_ms = Some(sample.timestamp_ms);
        Some(self.feed(PointerSource::Camera, mapped, sample.timestamp_ms))
    }

    /// Feed a device pointer position (already in surface pixels).
    /// Ignored while the camera is fresh.
    pub fn push_device(&mut self, point: Vec2, surface: FrameSize, now_ms: f64) -> Option<Vec2> {
        if self.camera_is_fresh(now_ms) || !surface.is_ready() {
            return None;
        }
        let clamped = self.mapper.clamp_to_surface(point, surface);
        Some(self.feed(PointerSource::Device, clamped, now_ms))
    }

    fn feed(&mut self, source: PointerSource, point: Vec2, now_ms: f64) -> Vec2 {
        if self.source != Some(source) {
            if let Some(previous) = self.source {
                log::debug!("Pointer source {:?} -> {:?}", previous, source);
            }
            // Each source starts from a fresh filter and deadzone
            self.filter.reset();
            self.deadzone.reset();
            self.source = Some(source);
        }
        let smoothed = self.filter.update(point, now_ms);
        self.smoothed = Some(smoothed);
        self.deadzone.apply(smoothed)
    }

    /// Stable pointer used for hit testing
    pub fn current(&self) -> Option<Vec2> {
        self.deadzone.stable()
    }

    /// Filter output before the deadzone
    pub fn smoothed(&self) -> Option<Vec2> {
        self.smoothed
    }

    pub fn source(&self) -> Option<PointerSource> {
        self.source
    }

    pub fn last_camera_ms(&self) -> Option<f64> {
        self.last_camera_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA: FrameSize = FrameSize::new(640, 480);
    const SCREEN: FrameSize = FrameSize::new(1280, 720);

    fn hand(x: f32, y: f32, t: f64) -> LandmarkSample {
        LandmarkSample::hand(Vec2::new(x, y), CAMERA, t)
    }

    #[test]
    fn test_camera_sample_maps_to_surface() {
        let mut pipeline = PointerPipeline::default();
        let p = pipeline.push_camera(&hand(0.5, 0.5, 0.0), SCREEN).unwrap();
        assert_eq!(p, Vec2::new(640.0, 360.0));
        assert_eq!(pipeline.source(), Some(PointerSource::Camera));
        assert_eq!(pipeline.current(), Some(p));
    }

    #[test]
    fn test_mouse_blocked_while_camera_fresh() {
        let mut pipeline = PointerPipeline::default();
        pipeline.push_camera(&hand(0.5, 0.5, 1000.0), SCREEN);
        assert!(pipeline
            .push_device(Vec2::new(100.0, 100.0), SCREEN, 1400.0)
            .is_none());
        assert_eq!(pipeline.current(), Some(Vec2::new(640.0, 360.0)));
    }

    #[test]
    fn test_mouse_takes_over_when_camera_stale() {
        let mut pipeline = PointerPipeline::default();
        pipeline.push_camera(&hand(0.5, 0.5, 1000.0), SCREEN);
        let p = pipeline
            .push_device(Vec2::new(100.0, 100.0), SCREEN, 1501.0)
            .unwrap();
        // Source switch reseeds the filter, so the mouse point arrives unsmoothed
        assert_eq!(p, Vec2::new(100.0, 100.0));
        assert_eq!(pipeline.source(), Some(PointerSource::Device));
    }

    #[test]
    fn test_no_hand_lets_freshness_lapse() {
        let mut pipeline = PointerPipeline::default();
        pipeline.push_camera(&hand(0.5, 0.5, 0.0), SCREEN);
        let none = LandmarkSample::no_hand(CAMERA, 300.0);
        assert!(pipeline.push_camera(&none, SCREEN).is_none());
        assert_eq!(pipeline.last_camera_ms(), Some(0.0));
        assert!(!pipeline.camera_is_fresh(600.0));
    }

    #[test]
    fn test_unknown_surface_skips_update() {
        let mut pipeline = PointerPipeline::default();
        assert!(pipeline
            .push_camera(&hand(0.5, 0.5, 0.0), FrameSize::default())
            .is_none());
        assert!(pipeline.current().is_none());
        assert!(pipeline.last_camera_ms().is_none());
    }

    #[test]
    fn test_device_points_clamped_to_margin() {
        let mut pipeline = PointerPipeline::default();
        let p = pipeline
            .push_device(Vec2::new(-50.0, 5000.0), SCREEN, 0.0)
            .unwrap();
        assert_eq!(p, Vec2::new(10.0, 710.0));
    }
}
