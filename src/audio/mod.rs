//! Audio collaborator
//!
//! The session talks to audio only through [`AudioSink`]. The browser build
//! plugs in procedurally synthesized Web Audio; native and tests use
//! [`NullAudio`] or a recorder.

#[cfg(target_arch = "wasm32")]
pub mod web;

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Ordinary bubble popped
    Pop,
    /// Rare bubble popped
    RarePop,
    /// Hazard popped (ducks the music)
    HazardPop,
    /// Life-restore bubble popped
    LifeRestore,
    /// Level target reached
    LevelClear,
    /// Level replayed after losing all lives
    LevelRestart,
    /// Game over
    GameOver,
    /// New high score
    NewHighScore,
}

pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    fn start_music(&mut self);
    fn stop_music(&mut self);
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    /// Briefly lower the music under a loud effect
    fn duck_music(&mut self);
    fn set_muted(&mut self, muted: bool);
}

/// Silent sink
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
    fn start_music(&mut self) {}
    fn stop_music(&mut self) {}
    fn pause_music(&mut self) {}
    fn resume_music(&mut self) {}
    fn duck_music(&mut self) {}
    fn set_muted(&mut self, _muted: bool) {}
}

/// Sink that logs cues at debug level (native demo)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAudio {
    muted: bool,
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        if !self.muted {
            log::debug!("sfx {:?}", effect);
        }
    }
    fn start_music(&mut self) {
        log::debug!("music start");
    }
    fn stop_music(&mut self) {
        log::debug!("music stop");
    }
    fn pause_music(&mut self) {
        log::debug!("music pause");
    }
    fn resume_music(&mut self) {
        log::debug!("music resume");
    }
    fn duck_music(&mut self) {}
    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Everything the session asked of the audio sink
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Play(SoundEffect),
    StartMusic,
    StopMusic,
    PauseMusic,
    ResumeMusic,
    DuckMusic,
    SetMuted(bool),
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    pub calls: Vec<AudioCall>,
}

#[cfg(test)]
impl RecordingAudio {
    pub fn played(&self, effect: SoundEffect) -> bool {
        self.calls.contains(&AudioCall::Play(effect))
    }
}

#[cfg(test)]
impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect) {
        self.calls.push(AudioCall::Play(effect));
    }
    fn start_music(&mut self) {
        self.calls.push(AudioCall::StartMusic);
    }
    fn stop_music(&mut self) {
        self.calls.push(AudioCall::StopMusic);
    }
    fn pause_music(&mut self) {
        self.calls.push(AudioCall::PauseMusic);
    }
    fn resume_music(&mut self) {
        self.calls.push(AudioCall::ResumeMusic);
    }
    fn duck_music(&mut self) {
        self.calls.push(AudioCall::DuckMusic);
    }
    fn set_muted(&mut self, muted: bool) {
        self.calls.push(AudioCall::SetMuted(muted));
    }
}
