//! Browser bridge
//!
//! The page owns the canvas, the camera and the hand-landmark detector. It
//! drives one session through these exports: `game_frame` from
//! requestAnimationFrame, `game_landmark`/`game_no_hand` from the detector
//! callback, `game_pointer_move` from pointer events, and reads
//! `game_snapshot` to draw.

use std::cell::RefCell;

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::audio::web::WebAudio;
use crate::persistence::Persistence;
use crate::platform::{LocalStorage, MemoryStorage, Storage, StorageError};
use crate::session::{SessionController, SessionOptions};
use crate::settings::Settings;
use crate::sim::GameMode;
use crate::tracking::{CallbackTracker, FrameSize, LandmarkSample, SurfaceHandle, TrackerError, TrackerFeed};

/// LocalStorage when the browser allows it, memory otherwise
enum WebStorage {
    Local(LocalStorage),
    Memory(MemoryStorage),
}

impl WebStorage {
    fn open() -> Self {
        match LocalStorage::open() {
            Ok(local) => WebStorage::Local(local),
            Err(e) => {
                log::warn!("{} - progress will not be saved", e);
                WebStorage::Memory(MemoryStorage::new())
            }
        }
    }
}

impl Storage for WebStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            WebStorage::Local(s) => s.get(key),
            WebStorage::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            WebStorage::Local(s) => s.set(key, value),
            WebStorage::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            WebStorage::Local(s) => s.remove(key),
            WebStorage::Memory(s) => s.remove(key),
        }
    }
}

type WebSession = SessionController<Persistence<WebStorage>, WebAudio>;

struct Runner {
    session: WebSession,
    feed: TrackerFeed,
    /// Size of the last camera frame the detector reported
    camera_frame: FrameSize,
    pending_notice: Option<String>,
}

thread_local! {
    static SURFACE: SurfaceHandle = SurfaceHandle::new(FrameSize::default());
    static RUNNER: RefCell<Option<Runner>> = const { RefCell::new(None) };
}

fn with_runner<R>(f: impl FnOnce(&mut Runner) -> R) -> Option<R> {
    RUNNER.with(|cell| cell.borrow_mut().as_mut().map(f))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Bubble Pop (web) ready");
}

/// Start a session. `mode` is "levels" or "endless"; `level` is 1-based.
/// Returns false for an unknown mode.
#[wasm_bindgen]
pub fn game_init(mode: &str, level: u32) -> bool {
    let Some(mode) = GameMode::from_str(mode) else {
        log::warn!("Unknown game mode '{}'", mode);
        return false;
    };

    // Drop any previous session first so its tracker and music stop
    if let Some(previous) = RUNNER.with(|cell| cell.borrow_mut().take()) {
        previous.session.exit();
    }

    let storage = WebStorage::open();
    let settings = Settings::load(&storage);
    let audio = WebAudio::new(&settings);

    let mut options = SessionOptions::new(mode);
    options.start_level = level.saturating_sub(1) as usize;
    options.seed = js_sys::Date::now() as u64;
    options.settings = settings;

    let surface = SURFACE.with(|s| s.clone());
    let mut session = SessionController::new(options, surface, Persistence::new(storage), audio);

    let (tracker, feed) = CallbackTracker::new();
    if let Err(e) = session.attach_tracker(Box::new(tracker)) {
        log::warn!("Hand tracker unavailable: {}", e);
    }

    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(Runner {
            session,
            feed,
            camera_frame: FrameSize::default(),
            pending_notice: None,
        });
    });
    true
}

#[wasm_bindgen]
pub fn game_frame(now_ms: f64) {
    with_runner(|r| {
        let report = r.session.frame(now_ms);
        if report.notice.is_some() {
            r.pending_notice = report.notice;
        }
    });
}

#[wasm_bindgen]
pub fn game_resize(width: u32, height: u32) {
    SURFACE.with(|s| s.resize(FrameSize::new(width, height)));
}

#[wasm_bindgen]
pub fn game_pointer_move(x: f32, y: f32, now_ms: f64) {
    with_runner(|r| r.session.pointer_moved(Vec2::new(x, y), now_ms));
}

/// Detector result with a fingertip in normalized frame coordinates
#[wasm_bindgen]
pub fn game_landmark(x: f32, y: f32, frame_width: u32, frame_height: u32, now_ms: f64) {
    with_runner(|r| {
        r.camera_frame = FrameSize::new(frame_width, frame_height);
        r.feed
            .send(LandmarkSample::hand(Vec2::new(x, y), r.camera_frame, now_ms));
    });
}

#[wasm_bindgen]
pub fn game_no_hand(now_ms: f64) {
    with_runner(|r| {
        r.feed.send(LandmarkSample::no_hand(r.camera_frame, now_ms));
    });
}

/// Camera or detector failed; `kind` is the DOMException name
#[wasm_bindgen]
pub fn game_tracker_failed(kind: &str) {
    with_runner(|r| {
        r.session
            .report_tracker_failure(&TrackerError::from_kind(kind))
    });
}

/// Notice to show once (camera fallback), if any
#[wasm_bindgen]
pub fn game_take_notice() -> Option<String> {
    with_runner(|r| r.pending_notice.take()).flatten()
}

/// Call from the first user gesture so music started at init becomes audible
#[wasm_bindgen]
pub fn game_resume_audio() {
    with_runner(|r| r.session.audio().resume_context());
}

#[wasm_bindgen]
pub fn game_pause() -> bool {
    with_runner(|r| r.session.pause().is_ok()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_resume() -> bool {
    with_runner(|r| r.session.resume().is_ok()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_restart_level() -> bool {
    with_runner(|r| r.session.restart_level().is_ok()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_end() -> bool {
    with_runner(|r| r.session.end_session().is_ok()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_restart() -> bool {
    with_runner(|r| r.session.restart_after_game_over().is_ok()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn game_set_muted(muted: bool) {
    with_runner(|r| {
        r.session.set_muted(muted);
        r.session.settings().save(r.session.progress().storage());
    });
}

/// Leave the game. Returns the session summary as JSON (empty if no session).
#[wasm_bindgen]
pub fn game_exit() -> String {
    RUNNER
        .with(|cell| cell.borrow_mut().take())
        .map(|r| serde_json::to_string(&r.session.exit()).unwrap_or_default())
        .unwrap_or_default()
}

/// Render snapshot as JSON
#[wasm_bindgen]
pub fn game_snapshot() -> String {
    with_runner(|r| serde_json::to_string(&r.session.snapshot()).unwrap_or_default())
        .unwrap_or_default()
}
