//! Web Audio backend
//!
//! Procedurally generated sound effects and a soft looping pad. No external
//! files needed.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::{AudioSink, SoundEffect};
use crate::settings::Settings;

/// Music gain while ducked, relative to normal
const DUCK_LEVEL: f32 = 0.25;
/// Seconds for the duck to recover
const DUCK_RECOVER_SECS: f64 = 0.8;

pub struct WebAudio {
    ctx: Option<AudioContext>,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    /// Shared gain for every music voice
    music_gain: Option<GainNode>,
    music_voices: Vec<OscillatorNode>,
    music_paused: bool,
}

impl WebAudio {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            sfx_volume: settings.sfx_level(),
            music_volume: settings.music_level(),
            muted: settings.muted,
            music_gain: None,
            music_voices: Vec::new(),
            music_paused: false,
        }
    }

    /// Resume a suspended context. Browsers only allow this from a user
    /// gesture, so the page calls it on the first click or key press.
    pub fn resume_context(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    fn effective_sfx(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_volume.clamp(0.0, 1.0) }
    }

    fn effective_music(&self) -> f32 {
        if self.muted || self.music_paused {
            0.0
        } else {
            self.music_volume.clamp(0.0, 1.0)
        }
    }

    fn apply_music_gain(&self) {
        if let (Some(ctx), Some(gain)) = (&self.ctx, &self.music_gain) {
            let t = ctx.current_time();
            gain.gain().cancel_scheduled_values(t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(self.effective_music() * 0.2, t + 0.1)
                .ok();
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    // === Sound generators ===

    /// Ordinary pop - short bright blip with a downward chirp
    fn play_pop(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 900.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.4, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.08)
            .ok();
        osc.frequency().set_value_at_time(900.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(300.0, t + 0.08)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.1).ok();
    }

    /// Rare pop - sparkly chime
    fn play_rare_pop(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [1200.0, 1600.0, 2400.0].iter().enumerate() {
            let delay = i as f64 * 0.03;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.35).ok();
            }
        }
    }

    /// Hazard pop - low boom with a crack on top
    fn play_hazard_pop(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                .ok();
            osc.frequency().set_value_at_time(100.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(30.0, t + 0.4)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.5).ok();
        }

        if let Some((osc, gain)) = self.create_osc(ctx, 1500.0, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }

    /// Life restore - happy rising ding
    fn play_life_restore(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [600.0, 800.0, 1000.0].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.2).ok();
            }
        }
    }

    /// Level clear - triumphant fanfare
    fn play_level_clear(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 500.0, 600.0, 800.0].iter().enumerate() {
            let delay = i as f64 * 0.1;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.5).ok();
            }
        }
    }

    /// Level restart - ominous descend
    fn play_level_restart(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.4, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.8)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(40.0, t + 0.8)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 1.0).ok();
    }

    /// Game over - sad descending
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            let delay = i as f64 * 0.2;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }

    /// High score - celebratory
    fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }
    }
}

impl AudioSink for WebAudio {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_sfx();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Pop => self.play_pop(ctx, vol),
            SoundEffect::RarePop => self.play_rare_pop(ctx, vol),
            SoundEffect::HazardPop => self.play_hazard_pop(ctx, vol),
            SoundEffect::LifeRestore => self.play_life_restore(ctx, vol),
            SoundEffect::LevelClear => self.play_level_clear(ctx, vol),
            SoundEffect::LevelRestart => self.play_level_restart(ctx, vol),
            SoundEffect::GameOver => self.play_game_over(ctx, vol),
            SoundEffect::NewHighScore => self.play_high_score(ctx, vol),
        }
    }

    fn start_music(&mut self) {
        if !self.music_voices.is_empty() {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Ok(bus) = ctx.create_gain() else { return };
        if bus.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }
        bus.gain().set_value(0.0);

        // Detuned fifths for a slow beating pad
        let mut voices = Vec::new();
        for freq in [110.0, 110.6, 164.8] {
            let Ok(osc) = ctx.create_oscillator() else { continue };
            osc.set_type(OscillatorType::Triangle);
            osc.frequency().set_value(freq);
            if osc.connect_with_audio_node(&bus).is_ok() && osc.start().is_ok() {
                voices.push(osc);
            }
        }

        self.music_voices = voices;
        self.music_gain = Some(bus);
        self.music_paused = false;
        self.apply_music_gain();
        log::info!("Music started");
    }

    fn stop_music(&mut self) {
        for osc in self.music_voices.drain(..) {
            osc.stop().ok();
        }
        if let Some(bus) = self.music_gain.take() {
            bus.disconnect().ok();
        }
    }

    fn pause_music(&mut self) {
        self.music_paused = true;
        self.apply_music_gain();
    }

    fn resume_music(&mut self) {
        self.music_paused = false;
        self.apply_music_gain();
    }

    fn duck_music(&mut self) {
        let target = self.effective_music() * 0.2;
        if let (Some(ctx), Some(gain)) = (&self.ctx, &self.music_gain) {
            let t = ctx.current_time();
            gain.gain().cancel_scheduled_values(t).ok();
            gain.gain().set_value_at_time(target * DUCK_LEVEL, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(target, t + DUCK_RECOVER_SECS)
                .ok();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_music_gain();
    }
}
