//! Hand tracker collaborator
//!
//! The landmark detector runs on its own cadence. It talks to the game through
//! a one-slot "latest sample" cell: the detector's callback overwrites the
//! slot, the frame tick takes whatever is there. Nothing else is shared.

use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec2;
use thiserror::Error;

use super::mapper::FrameSize;

/// One detector result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSample {
    /// Normalized fingertip position, or `None` when no hand was found
    pub fingertip: Option<Vec2>,
    /// Pixel size of the camera frame the landmark was detected in
    pub frame: FrameSize,
    /// Capture time (milliseconds, same clock as the frame tick)
    pub timestamp_ms: f64,
}

impl LandmarkSample {
    pub fn hand(fingertip: Vec2, frame: FrameSize, timestamp_ms: f64) -> Self {
        Self {
            fingertip: Some(fingertip),
            frame,
            timestamp_ms,
        }
    }

    pub fn no_hand(frame: FrameSize, timestamp_ms: f64) -> Self {
        Self {
            fingertip: None,
            frame,
            timestamp_ms,
        }
    }
}

type Slot = Arc<Mutex<Option<LandmarkSample>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<LandmarkSample>> {
    // Samples are written whole, so a poisoned slot still holds a valid value
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write half of the latest-sample cell. Deliberately not `Clone`: one producer.
#[derive(Debug)]
pub struct LandmarkWriter {
    slot: Slot,
}

impl LandmarkWriter {
    /// Replace whatever sample is waiting
    pub fn publish(&self, sample: LandmarkSample) {
        *lock(&self.slot) = Some(sample);
    }
}

/// Read half of the latest-sample cell
#[derive(Debug)]
pub struct LandmarkReader {
    slot: Slot,
}

impl LandmarkReader {
    /// Take the newest unread sample, if one arrived since the last call
    pub fn take_latest(&self) -> Option<LandmarkSample> {
        lock(&self.slot).take()
    }
}

/// Create a connected writer/reader pair
pub fn landmark_slot() -> (LandmarkWriter, LandmarkReader) {
    let slot: Slot = Arc::new(Mutex::new(None));
    (
        LandmarkWriter { slot: slot.clone() },
        LandmarkReader { slot },
    )
}

/// Why the camera tracker could not run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera found")]
    NoDevice,
    #[error("camera is in use by another application")]
    DeviceBusy,
    #[error("camera does not support the requested constraints")]
    UnsupportedConstraints,
    #[error("camera tracking failed: {0}")]
    Other(String),
}

impl TrackerError {
    /// Parse the error names reported by the browser's getUserMedia
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "NotAllowedError" | "SecurityError" | "permission" => Self::PermissionDenied,
            "NotFoundError" | "no-device" => Self::NoDevice,
            "NotReadableError" | "AbortError" | "busy" => Self::DeviceBusy,
            "OverconstrainedError" | "unsupported" => Self::UnsupportedConstraints,
            other => Self::Other(other.to_string()),
        }
    }

    /// Short notice shown to the player
    pub fn notice(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Camera blocked - using mouse",
            Self::NoDevice => "No camera - using mouse",
            Self::DeviceBusy => "Camera busy - using mouse",
            Self::UnsupportedConstraints | Self::Other(_) => "Camera unavailable - using mouse",
        }
    }
}

/// A landmark producer that can be started and stopped independently of the game
pub trait HandTracker {
    /// Begin delivering samples into `writer`
    fn start(&mut self, writer: LandmarkWriter) -> Result<(), TrackerError>;
    /// Stop delivering samples; later detector callbacks must be dropped
    fn stop(&mut self);
}

/// Tracker driven by an external callback (browser detector, scripted demo).
///
/// The [`TrackerFeed`] is what the detector callback holds. It only reaches
/// the game while the tracker is started.
#[derive(Debug)]
pub struct CallbackTracker {
    registration: Arc<Mutex<Option<LandmarkWriter>>>,
    fail_with: Option<TrackerError>,
}

/// Callback side of a [`CallbackTracker`]
#[derive(Debug, Clone)]
pub struct TrackerFeed {
    registration: Arc<Mutex<Option<LandmarkWriter>>>,
}

impl CallbackTracker {
    pub fn new() -> (Self, TrackerFeed) {
        let registration = Arc::new(Mutex::new(None));
        (
            Self {
                registration: registration.clone(),
                fail_with: None,
            },
            TrackerFeed { registration },
        )
    }

    /// A tracker whose start always fails (camera denied, missing, ...)
    pub fn failing(error: TrackerError) -> (Self, TrackerFeed) {
        let (mut tracker, feed) = Self::new();
        tracker.fail_with = Some(error);
        (tracker, feed)
    }
}

impl HandTracker for CallbackTracker {
    fn start(&mut self, writer: LandmarkWriter) -> Result<(), TrackerError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        *self
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(writer);
        Ok(())
    }

    fn stop(&mut self) {
        self.registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}

impl TrackerFeed {
    /// Deliver a detector result. Returns false if the tracker isn't running.
    pub fn send(&self, sample: LandmarkSample) -> bool {
        let registration = self
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match registration.as_ref() {
            Some(writer) => {
                writer.publish(sample);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: FrameSize = FrameSize::new(640, 480);

    #[test]
    fn test_slot_keeps_only_latest() {
        let (writer, reader) = landmark_slot();
        writer.publish(LandmarkSample::hand(Vec2::new(0.1, 0.1), FRAME, 1.0));
        writer.publish(LandmarkSample::hand(Vec2::new(0.2, 0.2), FRAME, 2.0));
        let sample = reader.take_latest().expect("sample waiting");
        assert_eq!(sample.timestamp_ms, 2.0);
        assert!(reader.take_latest().is_none());
    }

    #[test]
    fn test_feed_dropped_after_stop() {
        let (mut tracker, feed) = CallbackTracker::new();
        let (writer, reader) = landmark_slot();

        assert!(!feed.send(LandmarkSample::no_hand(FRAME, 0.0)));
        tracker.start(writer).unwrap();
        assert!(feed.send(LandmarkSample::no_hand(FRAME, 1.0)));
        assert!(reader.take_latest().is_some());

        tracker.stop();
        assert!(!feed.send(LandmarkSample::no_hand(FRAME, 2.0)));
        assert!(reader.take_latest().is_none());
    }

    #[test]
    fn test_failing_tracker_reports_error() {
        let (mut tracker, _feed) = CallbackTracker::failing(TrackerError::NoDevice);
        let (writer, _reader) = landmark_slot();
        assert_eq!(tracker.start(writer), Err(TrackerError::NoDevice));
    }

    #[test]
    fn test_error_kinds_from_browser_names() {
        assert_eq!(TrackerError::from_kind("NotAllowedError"), TrackerError::PermissionDenied);
        assert_eq!(TrackerError::from_kind("NotReadableError"), TrackerError::DeviceBusy);
        assert_eq!(
            TrackerError::from_kind("weird"),
            TrackerError::Other("weird".to_string())
        );
    }
}
