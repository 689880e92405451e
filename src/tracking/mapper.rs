//! Camera-to-surface coordinate mapping
//!
//! The camera frame is drawn behind the game with an aspect-fill ("cover")
//! fit, so a fingertip must go through the same transform to land where the
//! player sees their hand.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a camera frame or drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero-sized frames are "not ready yet"
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Vec2 {
        self.as_vec2() * 0.5
    }
}

/// Aspect-fill transform from source pixels to destination pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverTransform {
    /// Uniform scale applied to the source frame
    pub scale: f32,
    /// Size of the scaled source frame (at least as large as the destination)
    pub drawn: Vec2,
    /// Top-left of the scaled frame relative to the destination (≤ 0 on the cropped axis)
    pub offset: Vec2,
}

impl CoverTransform {
    /// Returns `None` until both frames have known, non-zero dimensions
    pub fn new(src: FrameSize, dst: FrameSize) -> Option<Self> {
        if !src.is_ready() || !dst.is_ready() {
            return None;
        }
        let src_size = src.as_vec2();
        let dst_size = dst.as_vec2();
        let scale = (dst_size.x / src_size.x).max(dst_size.y / src_size.y);
        let drawn = src_size * scale;
        let offset = (dst_size - drawn) * 0.5;
        Some(Self {
            scale,
            drawn,
            offset,
        })
    }

    /// Source pixel → destination pixel
    #[inline]
    pub fn apply(&self, src_px: Vec2) -> Vec2 {
        src_px * self.scale + self.offset
    }

    /// Destination pixel → source pixel
    #[inline]
    pub fn invert(&self, dst_px: Vec2) -> Vec2 {
        (dst_px - self.offset) / self.scale
    }
}

/// Mapper configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Flip the camera horizontally (selfie view)
    pub mirror_x: bool,
    /// Keep mapped points this many pixels inside the surface edges
    pub margin: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            mirror_x: true,
            margin: 10.0,
        }
    }
}

/// Maps normalized camera coordinates onto the drawing surface
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateMapper {
    config: MapperConfig,
}

impl CoordinateMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> MapperConfig {
        self.config
    }

    /// Map a normalized `[0,1]²` source point to clamped surface pixels.
    ///
    /// Returns `None` when either frame size is unknown; the caller should skip
    /// the pointer update for this frame.
    pub fn map_point(&self, normalized: Vec2, src: FrameSize, dst: FrameSize) -> Option<Vec2> {
        let transform = CoverTransform::new(src, dst)?;
        let x = if self.config.mirror_x {
            1.0 - normalized.x
        } else {
            normalized.x
        };
        let src_px = Vec2::new(x, normalized.y) * src.as_vec2();
        Some(self.clamp_to_surface(transform.apply(src_px), dst))
    }

    /// Inverse of [`map_point`](Self::map_point) without the clamp: surface
    /// pixels back to normalized camera coordinates
    pub fn unmap_point(&self, surface_px: Vec2, src: FrameSize, dst: FrameSize) -> Option<Vec2> {
        let transform = CoverTransform::new(src, dst)?;
        let normalized = transform.invert(surface_px) / src.as_vec2();
        let x = if self.config.mirror_x {
            1.0 - normalized.x
        } else {
            normalized.x
        };
        Some(Vec2::new(x, normalized.y))
    }

    /// Confine a surface point to the surface bounds minus the margin.
    /// On a surface narrower than two margins the axis collapses to its centre.
    pub fn clamp_to_surface(&self, point: Vec2, dst: FrameSize) -> Vec2 {
        let size = dst.as_vec2();
        let margin = self.config.margin.max(0.0);
        let clamp_axis = |v: f32, extent: f32| {
            let (lo, hi) = (margin, extent - margin);
            if hi < lo { extent * 0.5 } else { v.clamp(lo, hi) }
        };
        Vec2::new(clamp_axis(point.x, size.x), clamp_axis(point.y, size.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CAMERA: FrameSize = FrameSize::new(640, 480);
    const SCREEN: FrameSize = FrameSize::new(1280, 720);

    #[test]
    fn test_cover_scale_fills_wider_surface() {
        let t = CoverTransform::new(CAMERA, SCREEN).expect("sizes known");
        // 1280/640 = 2.0 beats 720/480 = 1.5, so width fills and height is cropped
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.drawn, Vec2::new(1280.0, 960.0));
        assert_eq!(t.offset, Vec2::new(0.0, -120.0));
    }

    #[test]
    fn test_cover_scale_fills_taller_surface() {
        let portrait = FrameSize::new(720, 1280);
        let t = CoverTransform::new(CAMERA, portrait).expect("sizes known");
        assert!((t.scale - 1280.0 / 480.0).abs() < 1e-5);
        assert!(t.offset.x < 0.0);
        assert!(t.offset.y.abs() < 1e-3);
    }

    #[test]
    fn test_center_maps_to_center_either_way() {
        for mirror_x in [false, true] {
            let mapper = CoordinateMapper::new(MapperConfig {
                mirror_x,
                ..MapperConfig::default()
            });
            let p = mapper
                .map_point(Vec2::new(0.5, 0.5), CAMERA, SCREEN)
                .expect("sizes known");
            assert_eq!(p, Vec2::new(640.0, 360.0));
        }
    }

    #[test]
    fn test_mirror_flips_horizontal() {
        let mirrored = CoordinateMapper::new(MapperConfig {
            mirror_x: true,
            margin: 0.0,
        });
        let plain = CoordinateMapper::new(MapperConfig {
            mirror_x: false,
            margin: 0.0,
        });
        let a = mirrored.map_point(Vec2::new(0.1, 0.3), CAMERA, SCREEN).unwrap();
        let b = plain.map_point(Vec2::new(0.9, 0.3), CAMERA, SCREEN).unwrap();
        assert!((a.x - b.x).abs() < 1e-4);
        assert!((a.y - b.y).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_sizes_skip_mapping() {
        let mapper = CoordinateMapper::default();
        assert!(mapper.map_point(Vec2::splat(0.5), FrameSize::default(), SCREEN).is_none());
        assert!(mapper.map_point(Vec2::splat(0.5), CAMERA, FrameSize::new(800, 0)).is_none());
    }

    #[test]
    fn test_cropped_edges_are_clamped() {
        let mapper = CoordinateMapper::new(MapperConfig {
            mirror_x: false,
            margin: 10.0,
        });
        // y = 0 lands at -120 before clamping (cropped band)
        let p = mapper.map_point(Vec2::new(0.0, 0.0), CAMERA, SCREEN).unwrap();
        assert_eq!(p, Vec2::new(10.0, 10.0));
        let p = mapper.map_point(Vec2::new(1.0, 1.0), CAMERA, SCREEN).unwrap();
        assert_eq!(p, Vec2::new(1270.0, 710.0));
    }

    #[test]
    fn test_tiny_surface_collapses_to_center() {
        let mapper = CoordinateMapper::default();
        let p = mapper.clamp_to_surface(Vec2::new(3.0, 900.0), FrameSize::new(12, 400));
        assert_eq!(p, Vec2::new(6.0, 390.0));
    }

    #[test]
    fn test_unmap_inverts_map_inside_margin() {
        let mapper = CoordinateMapper::default();
        let n = Vec2::new(0.3, 0.4);
        let p = mapper.map_point(n, CAMERA, SCREEN).unwrap();
        let back = mapper.unmap_point(p, CAMERA, SCREEN).unwrap();
        assert!((back - n).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_mapped_points_stay_on_surface(
            nx in -0.5f32..1.5,
            ny in -0.5f32..1.5,
            sw in 1u32..4000,
            sh in 1u32..4000,
            dw in 40u32..4000,
            dh in 40u32..4000,
        ) {
            let mapper = CoordinateMapper::default();
            let dst = FrameSize::new(dw, dh);
            let p = mapper.map_point(Vec2::new(nx, ny), FrameSize::new(sw, sh), dst).unwrap();
            prop_assert!(p.x >= 10.0 && p.x <= dw as f32 - 10.0);
            prop_assert!(p.y >= 10.0 && p.y <= dh as f32 - 10.0);
        }
    }
}
