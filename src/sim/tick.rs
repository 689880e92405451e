//! Per-frame simulation tick
//!
//! One call advances the game by one rendered frame. Order matters:
//! feedback decay, spawn, motion, hit testing, level clear, particles.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::levels::{LevelTable, SpawnProfile, spawn_profile};
use super::state::{BubbleKind, GameEvent, GameMode, GameOverReason, Particle, SimState, SimStatus};
use crate::consts::MAX_PARTICLES;
use crate::tracking::FrameSize;
use crate::tuning::Tuning;

/// Smallest radius a spawned bubble may have
const MIN_RADIUS: f32 = 4.0;
/// Shake below this snaps to zero
const SHAKE_EPSILON: f32 = 0.05;

/// Burst sizes per pop
const ORDINARY_BURST: usize = 8;
const RARE_BURST: usize = 14;
const HAZARD_BURST: usize = 20;
const LIFE_BURST: usize = 12;
const CLEAR_BURST: usize = 5;

/// Inputs for a single tick
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Frame timestamp (ms)
    pub now_ms: f64,
    /// Surface size snapshot for this frame
    pub surface: FrameSize,
    /// Stabilized pointer, if any source has produced one
    pub pointer: Option<Vec2>,
    /// Player difficulty preset multiplier on rise speed
    pub difficulty: f32,
}

impl TickInput {
    pub fn new(now_ms: f64, surface: FrameSize) -> Self {
        Self {
            now_ms,
            surface,
            pointer: None,
            difficulty: 1.0,
        }
    }

    pub fn with_pointer(mut self, pointer: Vec2) -> Self {
        self.pointer = Some(pointer);
        self
    }
}

/// Advance the game state by one frame
pub fn tick(
    state: &mut SimState,
    input: &TickInput,
    levels: &LevelTable,
    tuning: &Tuning,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Don't tick after game over or without a surface to play on
    if !state.is_playing() || !input.surface.is_ready() {
        return events;
    }

    state.time_ticks += 1;
    decay_feedback(state, tuning);

    maybe_spawn(state, input, levels, tuning);

    for bubble in &mut state.bubbles {
        bubble.pos.y -= bubble.speed;
    }
    state.bubbles.retain(|b| !b.has_escaped());

    if let Some(pointer) = input.pointer {
        resolve_hits(state, pointer, tuning, &mut events);
    }

    check_level_clear(state, levels, tuning, &mut events);

    update_particles(state, tuning);

    events
}

/// Advance only the visual effects (messages, shake, particles).
/// Used while gameplay is held, e.g. between levels.
pub fn tick_effects(state: &mut SimState, tuning: &Tuning) {
    decay_feedback(state, tuning);
    update_particles(state, tuning);
}

fn decay_feedback(state: &mut SimState, tuning: &Tuning) {
    let expired = match &mut state.message {
        Some(msg) => {
            msg.ticks_left = msg.ticks_left.saturating_sub(1);
            msg.ticks_left == 0
        }
        None => false,
    };
    if expired {
        state.message = None;
    }

    state.screen_shake *= tuning.shake_damping;
    if state.screen_shake < SHAKE_EPSILON {
        state.screen_shake = 0.0;
    }
}

fn maybe_spawn(state: &mut SimState, input: &TickInput, levels: &LevelTable, tuning: &Tuning) {
    let Some(last) = state.last_spawn_ms else {
        state.last_spawn_ms = Some(input.now_ms);
        return;
    };

    let profile = spawn_profile(state, levels, tuning);
    let interval = tuning.base_spawn_interval_ms * profile.spawn_multiplier as f64;
    if input.now_ms - last <= interval {
        return;
    }

    state.last_spawn_ms = Some(input.now_ms);
    spawn_bubble(state, input.surface, &profile, input.difficulty, tuning);
}

#[inline]
fn sample_between(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Spawn one bubble just below the surface. Returns its id.
pub fn spawn_bubble(
    state: &mut SimState,
    surface: FrameSize,
    profile: &SpawnProfile,
    difficulty: f32,
    tuning: &Tuning,
) -> u32 {
    let kind = choose_kind(state, profile.hazard_probability, tuning);

    let mut radius = sample_between(&mut state.rng, tuning.radius_min, tuning.radius_max);
    if kind == BubbleKind::Rare {
        radius *= 0.8;
    }
    let radius = radius.max(MIN_RADIUS);

    let width = surface.width as f32;
    let x = sample_between(&mut state.rng, radius, (width - radius).max(radius));
    let jitter = sample_between(
        &mut state.rng,
        tuning.speed_jitter_min,
        tuning.speed_jitter_max,
    );
    let speed = tuning.base_speed * profile.speed_multiplier * difficulty * jitter;
    let phase = state.rng.random_range(0.0..TAU);
    let opacity = state.rng.random_range(0.6..0.9);

    let pos = Vec2::new(x, surface.height as f32 + radius);
    let id = state.push_bubble(kind, pos, radius, speed);
    if let Some(bubble) = state.bubbles.last_mut() {
        bubble.phase = phase;
        bubble.opacity = opacity;
    }

    log::debug!("Spawned {:?} bubble {} at x={:.0} speed={:.2}", kind, id, x, speed);
    id
}

fn choose_kind(state: &mut SimState, hazard_probability: f32, tuning: &Tuning) -> BubbleKind {
    let roll: f32 = state.rng.random();
    if roll < hazard_probability {
        return BubbleKind::Hazard;
    }
    if roll < hazard_probability + tuning.rare_band {
        return BubbleKind::Rare;
    }

    // Life restores only when a life is missing and the early game is over
    let can_restore = state.mode == GameMode::Levels
        && state.lives < state.max_lives()
        && state.level_index >= tuning.life_restore_min_level;
    if can_restore && state.rng.random::<f32>() < tuning.life_restore_chance {
        return BubbleKind::LifeRestore;
    }

    BubbleKind::Ordinary
}

fn resolve_hits(state: &mut SimState, pointer: Vec2, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let mut i = 0;
    // A level restart clears the bubble list mid-loop, hence the live bound
    while i < state.bubbles.len() && state.is_playing() {
        let bubble = &mut state.bubbles[i];
        i += 1;
        if bubble.popped || !bubble.hit_by(pointer, tuning.hit_radius_multiplier) {
            continue;
        }
        bubble.popped = true;
        let (id, kind, pos) = (bubble.id, bubble.kind, bubble.pos);
        resolve_pop(state, id, kind, pos, tuning, events);
    }
    state.bubbles.retain(|b| !b.popped);
}

fn resolve_pop(
    state: &mut SimState,
    id: u32,
    kind: BubbleKind,
    pos: Vec2,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    match kind {
        BubbleKind::Ordinary => {
            state.score += tuning.ordinary_points;
            spawn_burst(state, pos, ORDINARY_BURST, kind.color(), 3.0);
            events.push(GameEvent::Popped {
                id,
                kind,
                points: tuning.ordinary_points,
            });
        }
        BubbleKind::Rare => {
            state.score += tuning.rare_points;
            spawn_burst(state, pos, RARE_BURST, kind.color(), 4.0);
            state.show_message(format!("Rare! +{}", tuning.rare_points), tuning.message_ticks);
            events.push(GameEvent::Popped {
                id,
                kind,
                points: tuning.rare_points,
            });
        }
        BubbleKind::Hazard => {
            events.push(GameEvent::Popped { id, kind, points: 0 });
            spawn_burst(state, pos, HAZARD_BURST, kind.color(), 6.0);
            match state.mode {
                GameMode::Infinite => {
                    state.status = SimStatus::GameOver(GameOverReason::HazardPopped);
                    state.show_message("Game Over", tuning.message_ticks);
                    log::info!("Hazard popped - run over with {} points", state.score);
                    events.push(GameEvent::GameOver {
                        final_score: state.score,
                        reason: GameOverReason::HazardPopped,
                    });
                }
                GameMode::Levels => {
                    state.lives = state.lives.saturating_sub(1);
                    state.screen_shake = tuning.hazard_shake;
                    state.show_message("Ouch!", tuning.message_ticks);
                    events.push(GameEvent::LifeLost {
                        lives_left: state.lives,
                    });
                    if state.lives == 0 {
                        events.push(restart_level(state, tuning));
                    }
                }
            }
        }
        BubbleKind::LifeRestore => {
            spawn_burst(state, pos, LIFE_BURST, kind.color(), 3.5);
            events.push(GameEvent::Popped { id, kind, points: 0 });
            if state.lives < state.max_lives() {
                state.lives += 1;
                state.show_message("+1 Life", tuning.message_ticks);
                events.push(GameEvent::LifeRestored { lives: state.lives });
            }
        }
    }
}

/// Replay the current level: full lives, empty field, score back to the
/// level's starting score. The level index never regresses.
pub fn restart_level(state: &mut SimState, tuning: &Tuning) -> GameEvent {
    state.lives = state.max_lives();
    state.bubbles.clear();
    state.particles.clear();
    state.score = state.level_start_score;
    state.screen_shake = tuning.restart_shake;
    state.last_spawn_ms = None;
    state.show_message("Try again!", tuning.message_ticks);
    log::info!(
        "Level {} restarted at {} points",
        state.level_index + 1,
        state.score
    );
    GameEvent::LevelRestarted {
        level_index: state.level_index,
    }
}

fn check_level_clear(
    state: &mut SimState,
    levels: &LevelTable,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    if state.mode != GameMode::Levels || !state.is_playing() {
        return;
    }
    let Some(level) = levels.get(state.level_index) else {
        return;
    };
    if state.score < level.target_score {
        return;
    }

    let remaining = std::mem::take(&mut state.bubbles);
    for bubble in &remaining {
        spawn_burst(state, bubble.pos, CLEAR_BURST, bubble.kind.color(), 2.0);
    }

    let cleared = state.level_index;
    events.push(GameEvent::LevelCleared {
        level_index: cleared,
    });

    if levels.is_last(cleared) {
        state.status = SimStatus::GameOver(GameOverReason::AllLevelsCleared);
        state.show_message("All levels cleared!", tuning.message_ticks);
        log::info!("Final level cleared with {} points", state.score);
        events.push(GameEvent::GameOver {
            final_score: state.score,
            reason: GameOverReason::AllLevelsCleared,
        });
        return;
    }

    state.level_index += 1;
    state.level_start_score = state.score;
    state.last_spawn_ms = None;
    state.show_message(format!("Level {}!", state.level_index + 1), tuning.message_ticks);
    log::info!("Level {} cleared, advancing to {}", cleared + 1, state.level_index + 1);
}

/// Emit `count` particles radiating from `pos`
pub fn spawn_burst(state: &mut SimState, pos: Vec2, count: usize, color: u32, speed: f32) {
    for i in 0..count {
        let angle = (i as f32 / count as f32) * TAU + state.rng.random_range(-0.3..0.3);
        let s = speed * state.rng.random_range(0.5..1.0);
        let size = state.rng.random_range(2.0..5.0);
        state.particles.push(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * s,
            color,
            life: 1.0,
            size,
        });
    }
    if state.particles.len() > MAX_PARTICLES {
        let excess = state.particles.len() - MAX_PARTICLES;
        state.particles.drain(..excess);
    }
}

fn update_particles(state: &mut SimState, tuning: &Tuning) {
    for particle in &mut state.particles {
        particle.pos += particle.vel;
        particle.vel.y += tuning.particle_gravity;
        particle.life -= tuning.particle_decay;
    }
    state.particles.retain(|p| p.life > 0.0);
}
