//! Pointer tracking pipeline
//!
//! Turns raw fingertip landmarks (normalized, mirrored, noisy, irregular) or
//! device pointer events into one stable surface-space pointer per frame.

pub mod deadzone;
pub mod filter;
pub mod mapper;
pub mod pointer;
pub mod surface;
pub mod tracker;

pub use deadzone::DeadzoneStabilizer;
pub use filter::{FilterParams, OneEuroFilter2D};
pub use mapper::{CoordinateMapper, CoverTransform, FrameSize, MapperConfig};
pub use pointer::{PointerConfig, PointerPipeline, PointerSource};
pub use surface::SurfaceHandle;
pub use tracker::{
    CallbackTracker, HandTracker, LandmarkReader, LandmarkSample, LandmarkWriter, TrackerError,
    TrackerFeed, landmark_slot,
};
