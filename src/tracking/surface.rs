//! Drawing surface size, shared between the layout callback and the frame tick
//!
//! Width and height are packed into one `AtomicU64` so a resize is published
//! in a single store and a reader never sees a half-updated size.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::mapper::FrameSize;

#[derive(Debug, Clone, Default)]
pub struct SurfaceHandle {
    packed: Arc<AtomicU64>,
}

#[inline]
fn pack(size: FrameSize) -> u64 {
    ((size.width as u64) << 32) | size.height as u64
}

#[inline]
fn unpack(packed: u64) -> FrameSize {
    FrameSize::new((packed >> 32) as u32, packed as u32)
}

impl SurfaceHandle {
    pub fn new(size: FrameSize) -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(pack(size))),
        }
    }

    /// Publish a new surface size
    pub fn resize(&self, size: FrameSize) {
        self.packed.store(pack(size), Ordering::Release);
    }

    /// Consistent size snapshot; zero-sized means not ready
    pub fn snapshot(&self) -> FrameSize {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_ready() {
        assert!(!SurfaceHandle::default().snapshot().is_ready());
    }

    #[test]
    fn test_resize_visible_through_clones() {
        let layout = SurfaceHandle::default();
        let ticker = layout.clone();
        layout.resize(FrameSize::new(1920, 1080));
        assert_eq!(ticker.snapshot(), FrameSize::new(1920, 1080));
    }

    #[test]
    fn test_concurrent_resizes_never_tear() {
        let handle = SurfaceHandle::new(FrameSize::new(100, 100));
        let writer = handle.clone();
        let t = std::thread::spawn(move || {
            for i in 0..10_000u32 {
                writer.resize(FrameSize::new(i, i));
            }
        });
        for _ in 0..10_000 {
            let s = handle.snapshot();
            assert!(s.width == s.height || (s.width == 100 && s.height == 100));
        }
        t.join().unwrap();
    }
}
