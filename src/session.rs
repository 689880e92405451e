//! Session controller
//!
//! Owns one play session: the simulation, the pointer pipeline, the landmark
//! reader and the collaborators. Phase changes go through the transition
//! methods below; everything else happens once per display frame in
//! [`SessionController::frame`].

use glam::Vec2;
use serde::Serialize;
use thiserror::Error;

use crate::audio::{AudioSink, SoundEffect};
use crate::persistence::ProgressStore;
use crate::settings::Settings;
use crate::sim::{
    self, BubbleKind, GameEvent, GameMode, GameOverReason, LevelTable, Particle, SimState,
    SimStatus, TickInput,
};
use crate::tracking::{
    HandTracker, LandmarkReader, PointerPipeline, PointerSource, SurfaceHandle, TrackerError,
    landmark_slot,
};
use crate::tuning::{RestartPolicy, Tuning};

/// Where the session is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase")]
pub enum SessionPhase {
    Playing,
    Paused,
    /// Intermission after a level clear; only effects animate
    LevelTransition { ticks_left: u32 },
    GameOver {
        final_score: u64,
        reason: GameOverReason,
    },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Playing => "playing",
            SessionPhase::Paused => "paused",
            SessionPhase::LevelTransition { .. } => "level transition",
            SessionPhase::GameOver { .. } => "game over",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, SessionPhase::GameOver { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

/// Everything needed to start a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mode: GameMode,
    /// Requested level (0-based); capped at the highest unlocked level
    pub start_level: usize,
    pub seed: u64,
    pub tuning: Tuning,
    pub settings: Settings,
    pub levels: LevelTable,
}

impl SessionOptions {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            start_level: 0,
            seed: 0,
            tuning: Tuning::default(),
            settings: Settings::default(),
            levels: LevelTable::standard(),
        }
    }
}

/// Result of one display frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub events: Vec<GameEvent>,
    pub phase: SessionPhase,
    /// The surface had no size; nothing ran
    pub skipped: bool,
    /// One-time informational notice (e.g. camera unavailable)
    pub notice: Option<String>,
}

/// Handed back by [`SessionController::exit`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: GameMode,
    pub final_score: u64,
    /// 1-based level reached (0 in endless mode)
    pub level_reached: u32,
    pub new_high_score: bool,
}

/// Bubble as the renderer should draw it
#[derive(Debug, Clone, Serialize)]
pub struct BubbleView {
    pub id: u32,
    /// Includes the render-only wobble
    pub pos: Vec2,
    pub radius: f32,
    pub kind: BubbleKind,
    pub opacity: f32,
}

/// Per-frame state for the renderer/UI
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    #[serde(flatten)]
    pub phase: SessionPhase,
    pub mode: GameMode,
    pub score: u64,
    pub high_score: u64,
    pub lives: u8,
    pub max_lives: u8,
    /// 1-based
    pub level: usize,
    pub target_score: Option<u64>,
    pub bubbles: Vec<BubbleView>,
    pub particles: Vec<Particle>,
    pub pointer: Option<Vec2>,
    pub pointer_source: Option<PointerSource>,
    pub message: Option<String>,
    /// Shake magnitude in pixels (0 when disabled in settings)
    pub shake: f32,
}

pub struct SessionController<P: ProgressStore, A: AudioSink> {
    sim: SimState,
    levels: LevelTable,
    tuning: Tuning,
    settings: Settings,
    pointer: PointerPipeline,
    surface: SurfaceHandle,
    landmarks: Option<LandmarkReader>,
    tracker: Option<Box<dyn HandTracker>>,
    progress: P,
    audio: A,
    phase: SessionPhase,
    /// Phase to return to on resume
    resume_to: SessionPhase,
    pending_notice: Option<String>,
    notice_shown: bool,
    score_submitted: bool,
    new_high_score: bool,
}

impl<P: ProgressStore, A: AudioSink> SessionController<P, A> {
    pub fn new(options: SessionOptions, surface: SurfaceHandle, mut progress: P, mut audio: A) -> Self {
        let SessionOptions {
            mode,
            start_level,
            seed,
            tuning,
            settings,
            levels,
        } = options;

        let checkpoint = progress.load_checkpoint();
        let unlocked = (checkpoint.highest_unlocked_level as usize).saturating_sub(1);
        let level = start_level.min(unlocked).min(levels.len().saturating_sub(1));
        if mode == GameMode::Levels && level < start_level {
            log::warn!(
                "Level {} is locked, starting at level {}",
                start_level + 1,
                level + 1
            );
        }

        let mut pointer_config = tuning.pointer;
        pointer_config.mapper.mirror_x = settings.mirror_camera;

        audio.set_muted(settings.muted);
        audio.start_music();

        let sim = SimState::new(mode, level, seed);
        log::info!(
            "Session started: {} mode, level {}, seed {}",
            mode.as_str(),
            sim.level_index + 1,
            seed
        );

        Self {
            sim,
            levels,
            tuning,
            settings,
            pointer: PointerPipeline::new(pointer_config),
            surface,
            landmarks: None,
            tracker: None,
            progress,
            audio,
            phase: SessionPhase::Playing,
            resume_to: SessionPhase::Playing,
            pending_notice: None,
            notice_shown: false,
            score_submitted: false,
            new_high_score: false,
        }
    }

    /// Start a hand tracker feeding this session. On failure the session
    /// keeps running on device input and the notice is queued.
    pub fn attach_tracker(&mut self, mut tracker: Box<dyn HandTracker>) -> Result<(), TrackerError> {
        self.detach_tracker();
        let (writer, reader) = landmark_slot();
        match tracker.start(writer) {
            Ok(()) => {
                log::info!("Hand tracker started");
                self.tracker = Some(tracker);
                self.landmarks = Some(reader);
                Ok(())
            }
            Err(e) => {
                self.report_tracker_failure(&e);
                Err(e)
            }
        }
    }

    fn detach_tracker(&mut self) {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.stop();
            log::info!("Hand tracker stopped");
        }
        self.landmarks = None;
    }

    /// Tracker failed (at start or later). No retry; the notice shows once.
    pub fn report_tracker_failure(&mut self, error: &TrackerError) {
        log::warn!("Hand tracking unavailable: {}", error);
        self.detach_tracker();
        if !self.notice_shown {
            self.notice_shown = true;
            self.pending_notice = Some(error.notice().to_string());
        }
    }

    /// Device (mouse/touch) pointer input in surface pixels
    pub fn pointer_moved(&mut self, point: Vec2, now_ms: f64) {
        let surface = self.surface.snapshot();
        self.pointer.push_device(point, surface, now_ms);
    }

    /// Run one display frame
    pub fn frame(&mut self, now_ms: f64) -> FrameReport {
        let notice = self.pending_notice.take();
        let surface = self.surface.snapshot();
        if !surface.is_ready() {
            return FrameReport {
                events: Vec::new(),
                phase: self.phase,
                skipped: true,
                notice,
            };
        }

        if let Some(sample) = self.landmarks.as_ref().and_then(|r| r.take_latest()) {
            self.pointer.push_camera(&sample, surface);
        }

        let mut events = Vec::new();
        match self.phase {
            SessionPhase::Playing => {
                let input = TickInput {
                    now_ms,
                    surface,
                    pointer: self.pointer.current(),
                    difficulty: self.settings.difficulty.multiplier(),
                };
                events = sim::tick(&mut self.sim, &input, &self.levels, &self.tuning);
                self.route_events(&events);
            }
            SessionPhase::LevelTransition { ticks_left } => {
                sim::tick_effects(&mut self.sim, &self.tuning);
                self.phase = if ticks_left <= 1 {
                    log::info!("Level {} started", self.sim.level_index + 1);
                    SessionPhase::Playing
                } else {
                    SessionPhase::LevelTransition {
                        ticks_left: ticks_left - 1,
                    }
                };
            }
            SessionPhase::GameOver { .. } => {
                sim::tick_effects(&mut self.sim, &self.tuning);
            }
            SessionPhase::Paused => {}
        }

        FrameReport {
            events,
            phase: self.phase,
            skipped: false,
            notice,
        }
    }

    fn route_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::Popped { kind, .. } => match kind {
                    BubbleKind::Ordinary => self.audio.play(SoundEffect::Pop),
                    BubbleKind::Rare => self.audio.play(SoundEffect::RarePop),
                    BubbleKind::Hazard => {
                        self.audio.play(SoundEffect::HazardPop);
                        self.audio.duck_music();
                    }
                    BubbleKind::LifeRestore => self.audio.play(SoundEffect::LifeRestore),
                },
                GameEvent::LevelCleared { level_index } => {
                    self.progress.save_unlocked_level_if_higher(level_index + 1);
                    self.audio.play(SoundEffect::LevelClear);
                    if self.sim.is_playing() && self.tuning.level_transition_ticks > 0 {
                        self.phase = SessionPhase::LevelTransition {
                            ticks_left: self.tuning.level_transition_ticks,
                        };
                    }
                }
                GameEvent::LevelRestarted { .. } => self.audio.play(SoundEffect::LevelRestart),
                GameEvent::GameOver {
                    final_score,
                    reason,
                } => self.enter_game_over(final_score, reason),
                GameEvent::LifeLost { .. } | GameEvent::LifeRestored { .. } => {}
            }
        }
    }

    fn enter_game_over(&mut self, final_score: u64, reason: GameOverReason) {
        log::info!("Game over ({:?}) with {} points", reason, final_score);
        self.phase = SessionPhase::GameOver {
            final_score,
            reason,
        };
        self.audio.play(SoundEffect::GameOver);
        self.audio.stop_music();
        self.submit_score();
    }

    fn submit_score(&mut self) {
        if self.score_submitted {
            return;
        }
        self.score_submitted = true;
        let level = match self.sim.mode {
            GameMode::Levels => self.sim.level_index as u32 + 1,
            GameMode::Infinite => 0,
        };
        if self
            .progress
            .save_high_score(self.sim.mode, self.sim.score, level)
        {
            self.new_high_score = true;
            self.audio.play(SoundEffect::NewHighScore);
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Playing | SessionPhase::LevelTransition { .. } => {
                self.resume_to = self.phase;
                self.phase = SessionPhase::Paused;
                self.audio.pause_music();
                log::info!("Paused");
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Paused {
            return Err(self.invalid("resume"));
        }
        self.phase = self.resume_to;
        self.audio.resume_music();
        log::info!("Resumed");
        Ok(())
    }

    /// Replay the current level from its starting score (level mode, paused)
    pub fn restart_level(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Paused || self.sim.mode != GameMode::Levels {
            return Err(self.invalid("restart level"));
        }
        let event = sim::restart_level(&mut self.sim, &self.tuning);
        self.route_events(&[event]);
        self.phase = SessionPhase::Playing;
        self.audio.resume_music();
        Ok(())
    }

    /// End the session explicitly
    pub fn end_session(&mut self) -> Result<(), SessionError> {
        if self.phase.is_game_over() {
            return Err(self.invalid("end session"));
        }
        self.sim.status = SimStatus::GameOver(GameOverReason::Ended);
        self.enter_game_over(self.sim.score, GameOverReason::Ended);
        Ok(())
    }

    /// Start again after game over, following the configured restart policy
    pub fn restart_after_game_over(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_game_over() {
            return Err(self.invalid("restart"));
        }
        let seed = self.sim.seed.wrapping_add(1);
        let mode = self.sim.mode;
        self.sim = match (self.tuning.restart_policy, mode) {
            (RestartPolicy::FromLevelStart, GameMode::Levels) => {
                let mut next = SimState::new(mode, self.sim.level_index, seed);
                next.score = self.sim.level_start_score;
                next.level_start_score = self.sim.level_start_score;
                next
            }
            _ => SimState::new(mode, 0, seed),
        };
        self.phase = SessionPhase::Playing;
        self.score_submitted = false;
        self.new_high_score = false;
        self.audio.start_music();
        log::info!(
            "Restarted at level {} with {} points",
            self.sim.level_index + 1,
            self.sim.score
        );
        Ok(())
    }

    /// Leave the game: stop the tracker and music, submit the score
    pub fn exit(mut self) -> SessionSummary {
        self.detach_tracker();
        self.audio.stop_music();
        self.submit_score();
        log::info!("Session exited with {} points", self.sim.score);
        SessionSummary {
            mode: self.sim.mode,
            final_score: self.sim.score,
            level_reached: match self.sim.mode {
                GameMode::Levels => self.sim.level_index as u32 + 1,
                GameMode::Infinite => 0,
            },
            new_high_score: self.new_high_score,
        }
    }

    /// Flip mute and persist nothing; callers save `settings()` themselves
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        self.audio.set_muted(muted);
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let time_secs = self.sim.time_ticks as f32 / 60.0;
        let wobble = self.settings.effective_wobble();
        let bubbles = self
            .sim
            .bubbles
            .iter()
            .map(|b| BubbleView {
                id: b.id,
                pos: if wobble {
                    b.pos + b.wobble_offset(time_secs)
                } else {
                    b.pos
                },
                radius: b.radius,
                kind: b.kind,
                opacity: b.opacity,
            })
            .collect();
        let target_score = match self.sim.mode {
            GameMode::Levels => self.levels.get(self.sim.level_index).map(|l| l.target_score),
            GameMode::Infinite => None,
        };

        RenderSnapshot {
            phase: self.phase,
            mode: self.sim.mode,
            score: self.sim.score,
            high_score: self.progress.high_score(self.sim.mode).max(self.sim.score),
            lives: self.sim.lives,
            max_lives: self.sim.max_lives(),
            level: self.sim.level_index + 1,
            target_score,
            bubbles,
            particles: if self.settings.particles {
                self.sim.particles.clone()
            } else {
                Vec::new()
            },
            pointer: self.pointer.current(),
            pointer_source: self.pointer.source(),
            message: self.sim.message.as_ref().map(|m| m.text.clone()),
            shake: if self.settings.effective_screen_shake() {
                self.sim.screen_shake
            } else {
                0.0
            },
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    /// Direct state access for scripted scenarios
    pub fn sim_mut(&mut self) -> &mut SimState {
        &mut self.sim
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer.current()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn has_tracker(&self) -> bool {
        self.tracker.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCall, RecordingAudio};
    use crate::persistence::Persistence;
    use crate::platform::MemoryStorage;
    use crate::tracking::{CallbackTracker, FrameSize, LandmarkSample};

    type TestSession = SessionController<Persistence<MemoryStorage>, RecordingAudio>;

    const SCREEN: FrameSize = FrameSize::new(800, 600);

    fn session_with(options: SessionOptions, storage: &MemoryStorage) -> TestSession {
        SessionController::new(
            options,
            SurfaceHandle::new(SCREEN),
            Persistence::new(storage.clone()),
            RecordingAudio::default(),
        )
    }

    fn session(mode: GameMode) -> TestSession {
        session_with(SessionOptions::new(mode), &MemoryStorage::new())
    }

    /// Put a still bubble under the device pointer
    fn place_under_pointer(s: &mut TestSession, kind: BubbleKind, now_ms: f64) {
        let at = Vec2::new(400.0, 300.0);
        s.pointer_moved(at, now_ms);
        s.sim_mut().last_spawn_ms = Some(now_ms);
        s.sim_mut().push_bubble(kind, at, 30.0, 0.0);
    }

    #[test]
    fn test_starts_playing_with_music() {
        let s = session(GameMode::Levels);
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert!(s.audio().calls.contains(&AudioCall::StartMusic));
        assert!(s.audio().calls.contains(&AudioCall::SetMuted(false)));
    }

    #[test]
    fn test_zero_surface_skips_frame() {
        let mut s = session(GameMode::Levels);
        s.surface().resize(FrameSize::new(0, 0));
        let report = s.frame(16.0);
        assert!(report.skipped);
        assert_eq!(s.sim().time_ticks, 0);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut s = session(GameMode::Levels);
        s.frame(0.0);
        s.pause().unwrap();
        let ticks = s.sim().time_ticks;
        for i in 1..50 {
            s.frame(i as f64 * 16.0);
        }
        assert_eq!(s.sim().time_ticks, ticks);
        assert!(s.audio().calls.contains(&AudioCall::PauseMusic));

        assert!(s.pause().is_err());
        s.resume().unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert!(s.resume().is_err());
        s.frame(1000.0);
        assert_eq!(s.sim().time_ticks, ticks + 1);
    }

    #[test]
    fn test_restart_level_needs_pause_and_level_mode() {
        let mut s = session(GameMode::Levels);
        assert_eq!(
            s.restart_level(),
            Err(SessionError::InvalidTransition {
                action: "restart level",
                phase: "playing"
            })
        );

        s.sim_mut().score = 120;
        s.sim_mut().lives = 2;
        s.pause().unwrap();
        s.restart_level().unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.sim().score, 0);
        assert_eq!(s.sim().lives, 3);
        assert!(s.audio().played(SoundEffect::LevelRestart));

        let mut endless = session(GameMode::Infinite);
        endless.pause().unwrap();
        assert!(endless.restart_level().is_err());
    }

    #[test]
    fn test_three_hazards_restart_level() {
        let mut s = session(GameMode::Levels);
        s.frame(0.0);
        s.sim_mut().score = 90;
        for i in 1..=3 {
            let now = i as f64 * 16.0;
            place_under_pointer(&mut s, BubbleKind::Hazard, now);
            s.frame(now);
        }
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.sim().score, 0);
        assert_eq!(s.sim().lives, 3);
        assert_eq!(s.sim().level_index, 0);
        assert!(s.audio().played(SoundEffect::LevelRestart));
        assert!(s.audio().calls.contains(&AudioCall::DuckMusic));
    }

    #[test]
    fn test_endless_hazard_ends_with_prior_score() {
        let storage = MemoryStorage::new();
        let mut s = session_with(SessionOptions::new(GameMode::Infinite), &storage);
        s.frame(0.0);
        s.sim_mut().score = 40;
        place_under_pointer(&mut s, BubbleKind::Hazard, 16.0);
        let report = s.frame(16.0);

        assert_eq!(
            report.phase,
            SessionPhase::GameOver {
                final_score: 40,
                reason: GameOverReason::HazardPopped
            }
        );
        assert!(s.audio().played(SoundEffect::GameOver));
        assert!(s.audio().played(SoundEffect::NewHighScore));
        assert_eq!(s.progress().high_score(GameMode::Infinite), 40);

        // Nothing else can happen except restart
        assert!(s.pause().is_err());
        assert!(s.end_session().is_err());
        let ticks = s.sim().time_ticks;
        s.frame(32.0);
        assert_eq!(s.sim().time_ticks, ticks);
    }

    #[test]
    fn test_level_clear_unlocks_and_holds_for_transition() {
        let storage = MemoryStorage::new();
        let mut options = SessionOptions::new(GameMode::Levels);
        options.tuning.level_transition_ticks = 3;
        let mut s = session_with(options, &storage);
        s.frame(0.0);
        s.sim_mut().score = 145;
        place_under_pointer(&mut s, BubbleKind::Ordinary, 16.0);

        let report = s.frame(16.0);
        assert!(report.events.contains(&GameEvent::LevelCleared { level_index: 0 }));
        assert_eq!(s.phase(), SessionPhase::LevelTransition { ticks_left: 3 });
        assert!(s.audio().played(SoundEffect::LevelClear));
        let mut reopened = Persistence::new(storage.clone());
        assert_eq!(reopened.load_checkpoint().highest_unlocked_level, 2);

        // Pause during the intermission comes back to it
        s.pause().unwrap();
        s.resume().unwrap();
        assert_eq!(s.phase(), SessionPhase::LevelTransition { ticks_left: 3 });

        let ticks = s.sim().time_ticks;
        s.frame(32.0);
        s.frame(48.0);
        s.frame(64.0);
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.sim().time_ticks, ticks);
        assert_eq!(s.sim().level_index, 1);
    }

    #[test]
    fn test_all_levels_cleared_is_game_over() {
        let mut options = SessionOptions::new(GameMode::Levels);
        options.levels = LevelTable::generate(1);
        let mut s = session_with(options, &MemoryStorage::new());
        s.frame(0.0);
        s.sim_mut().score = 150;
        let report = s.frame(16.0);
        assert_eq!(
            report.phase,
            SessionPhase::GameOver {
                final_score: 150,
                reason: GameOverReason::AllLevelsCleared
            }
        );
    }

    #[test]
    fn test_start_level_capped_by_checkpoint() {
        let storage = MemoryStorage::new();
        Persistence::new(storage.clone()).save_unlocked_level_if_higher(2);

        let mut options = SessionOptions::new(GameMode::Levels);
        options.start_level = 9;
        assert_eq!(session_with(options.clone(), &storage).sim().level_index, 2);
        options.start_level = 1;
        assert_eq!(session_with(options, &storage).sim().level_index, 1);
    }

    #[test]
    fn test_end_session_and_restart_policies() {
        let mut s = session(GameMode::Levels);
        s.sim_mut().level_index = 2;
        s.sim_mut().level_start_score = 375;
        s.sim_mut().score = 500;
        assert!(s.restart_after_game_over().is_err());
        s.end_session().unwrap();
        assert_eq!(
            s.phase(),
            SessionPhase::GameOver {
                final_score: 500,
                reason: GameOverReason::Ended
            }
        );

        s.restart_after_game_over().unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.sim().level_index, 2);
        assert_eq!(s.sim().score, 375);
        assert_eq!(s.sim().lives, 3);

        let mut options = SessionOptions::new(GameMode::Levels);
        options.tuning.restart_policy = RestartPolicy::FromFirstLevel;
        let mut s = session_with(options, &MemoryStorage::new());
        s.sim_mut().level_index = 2;
        s.sim_mut().score = 500;
        s.end_session().unwrap();
        s.restart_after_game_over().unwrap();
        assert_eq!(s.sim().level_index, 0);
        assert_eq!(s.sim().score, 0);
    }

    #[test]
    fn test_tracker_failure_notice_shown_once() {
        let mut s = session(GameMode::Levels);
        let (tracker, _feed) = CallbackTracker::failing(TrackerError::PermissionDenied);
        assert!(s.attach_tracker(Box::new(tracker)).is_err());
        assert!(!s.has_tracker());

        let first = s.frame(0.0);
        assert!(first.notice.is_some());
        assert!(s.frame(16.0).notice.is_none());

        s.report_tracker_failure(&TrackerError::NoDevice);
        assert!(s.frame(32.0).notice.is_none());

        // Mouse still drives the pointer
        s.pointer_moved(Vec2::new(200.0, 200.0), 48.0);
        assert_eq!(s.pointer(), Some(Vec2::new(200.0, 200.0)));
    }

    #[test]
    fn test_camera_sample_drives_pointer_and_blocks_mouse() {
        let mut s = session(GameMode::Levels);
        let (tracker, feed) = CallbackTracker::new();
        s.attach_tracker(Box::new(tracker)).unwrap();

        let camera = FrameSize::new(640, 480);
        assert!(feed.send(LandmarkSample::hand(Vec2::splat(0.5), camera, 100.0)));
        s.frame(100.0);
        assert_eq!(s.pointer(), Some(Vec2::new(400.0, 300.0)));

        s.pointer_moved(Vec2::new(50.0, 50.0), 200.0);
        assert_eq!(s.pointer(), Some(Vec2::new(400.0, 300.0)));

        s.pointer_moved(Vec2::new(50.0, 50.0), 700.0);
        assert_eq!(s.pointer(), Some(Vec2::new(50.0, 50.0)));

        let summary = s.exit();
        assert_eq!(summary.final_score, 0);
        assert!(!feed.send(LandmarkSample::no_hand(camera, 800.0)));
    }

    #[test]
    fn test_exit_submits_score_once() {
        let storage = MemoryStorage::new();
        let mut s = session_with(SessionOptions::new(GameMode::Levels), &storage);
        s.sim_mut().score = 70;
        let summary = s.exit();
        assert!(summary.new_high_score);
        assert_eq!(summary.level_reached, 1);
        assert_eq!(Persistence::new(storage.clone()).high_score(GameMode::Levels), 70);

        // Game over already submitted; exit doesn't submit again
        let mut s = session_with(SessionOptions::new(GameMode::Levels), &storage);
        s.sim_mut().score = 90;
        s.end_session().unwrap();
        let summary = s.exit();
        assert!(summary.new_high_score);
        let stored = Persistence::new(storage);
        assert_eq!(stored.high_scores().for_mode(GameMode::Levels).count(), 2);
    }

    #[test]
    fn test_snapshot_respects_settings() {
        let mut options = SessionOptions::new(GameMode::Levels);
        options.settings.reduced_motion = true;
        options.settings.particles = false;
        let mut s = session_with(options, &MemoryStorage::new());
        s.sim_mut().screen_shake = 10.0;
        s.sim_mut()
            .push_bubble(BubbleKind::Rare, Vec2::new(100.0, 100.0), 20.0, 1.0);
        sim::tick::spawn_burst(s.sim_mut(), Vec2::ZERO, 4, 0, 1.0);

        let snap = s.snapshot();
        assert_eq!(snap.shake, 0.0);
        assert!(snap.particles.is_empty());
        assert_eq!(snap.bubbles[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(snap.target_score, Some(150));

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
    }
}
