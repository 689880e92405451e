//! Bubble Pop entry point
//!
//! The browser build is driven from JavaScript through `bubble_pop::web`.
//! Natively this runs a headless demo: the autopilot moves a virtual
//! fingertip, which is fed through the same tracker path a camera would use.
//!
//! Usage: `bubble-pop [levels|endless] [seconds] [seed]`
//!
//! Environment:
//! - `BUBBLE_POP_DATA_DIR`: where progress is stored (default `.bubble-pop`)
//! - `BUBBLE_POP_TUNING`: optional JSON file overriding balance values
//! - `RUST_LOG`: log filter (default `info`)

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::error::Error;

    use bubble_pop::audio::LogAudio;
    use bubble_pop::persistence::{Persistence, ProgressStore};
    use bubble_pop::platform::FileStorage;
    use bubble_pop::session::{SessionController, SessionOptions, SessionPhase};
    use bubble_pop::settings::Settings;
    use bubble_pop::sim::{Autopilot, GameEvent, GameMode};
    use bubble_pop::tracking::{
        CallbackTracker, CoordinateMapper, FrameSize, LandmarkSample, MapperConfig, SurfaceHandle,
    };
    use bubble_pop::Tuning;
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const SURFACE: FrameSize = FrameSize::new(1280, 720);
    const CAMERA: FrameSize = FrameSize::new(640, 480);
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Detector results arrive at roughly half the display rate
    const CAMERA_EVERY: u64 = 2;
    /// How far the virtual hand can move per frame (pixels)
    const HAND_SPEED: f32 = 28.0;
    /// Detector noise in normalized units
    const LANDMARK_NOISE: f32 = 0.004;

    struct Args {
        mode: GameMode,
        seconds: u64,
        seed: u64,
    }

    fn parse_args() -> Result<Args, Box<dyn Error>> {
        let mut args = std::env::args().skip(1);
        let mode = match args.next() {
            Some(m) => GameMode::from_str(&m).ok_or(format!("unknown mode '{m}'"))?,
            None => GameMode::Levels,
        };
        let seconds = args.next().map(|s| s.parse()).transpose()?.unwrap_or(90);
        let seed = args
            .next()
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_else(|| bubble_pop::platform::time::unix_millis() as u64);
        Ok(Args {
            mode,
            seconds,
            seed,
        })
    }

    fn load_tuning() -> Result<Tuning, Box<dyn Error>> {
        match std::env::var("BUBBLE_POP_TUNING") {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)?;
                log::info!("Loaded tuning from {}", path);
                Ok(Tuning::from_json(&json)?)
            }
            Err(_) => Ok(Tuning::default()),
        }
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let args = parse_args()?;
        let data_dir =
            std::env::var("BUBBLE_POP_DATA_DIR").unwrap_or_else(|_| ".bubble-pop".to_string());
        let storage = FileStorage::new(&data_dir);
        log::info!("Storing progress in {}", storage.dir().display());

        let settings = Settings::load(&storage);
        let tuning = load_tuning()?;
        let autopilot = Autopilot::new(tuning.hit_radius_multiplier);
        let mapper = CoordinateMapper::new(MapperConfig {
            mirror_x: settings.mirror_camera,
            ..tuning.pointer.mapper
        });

        let mut progress = Persistence::new(storage);
        let unlocked = progress.load_checkpoint().highest_unlocked_level;
        log::info!(
            "Best {}: {} (levels unlocked: {})",
            args.mode.as_str(),
            progress.high_score(args.mode),
            unlocked
        );

        let mut options = SessionOptions::new(args.mode);
        options.start_level = unlocked.saturating_sub(1) as usize;
        options.seed = args.seed;
        options.tuning = tuning;
        options.settings = settings;

        let surface = SurfaceHandle::new(SURFACE);
        let mut session = SessionController::new(options, surface, progress, LogAudio::default());
        let (tracker, feed) = CallbackTracker::new();
        session.attach_tracker(Box::new(tracker))?;

        let mut noise = Pcg32::seed_from_u64(args.seed ^ 0x9e37_79b9);
        let mut hand = SURFACE.center();
        let total_frames = args.seconds * 60;

        for frame in 0..total_frames {
            let now = frame as f64 * FRAME_MS;

            if let Some(target) = autopilot.aim(session.sim()) {
                let delta = target - hand;
                hand += delta.clamp_length_max(HAND_SPEED);
            }

            if frame % CAMERA_EVERY == 0 {
                let sample = match mapper.unmap_point(hand, CAMERA, SURFACE) {
                    Some(n) => {
                        let jitter = Vec2::new(
                            noise.random_range(-LANDMARK_NOISE..LANDMARK_NOISE),
                            noise.random_range(-LANDMARK_NOISE..LANDMARK_NOISE),
                        );
                        LandmarkSample::hand(n + jitter, CAMERA, now)
                    }
                    None => LandmarkSample::no_hand(CAMERA, now),
                };
                feed.send(sample);
            }

            let report = session.frame(now);
            for event in &report.events {
                match event {
                    GameEvent::LevelCleared { level_index } => {
                        log::info!("[{:>6.1}s] Cleared level {}", now / 1000.0, level_index + 1)
                    }
                    GameEvent::LifeLost { lives_left } => {
                        log::info!("[{:>6.1}s] Hazard! {} lives left", now / 1000.0, lives_left)
                    }
                    GameEvent::LevelRestarted { level_index } => {
                        log::info!("[{:>6.1}s] Restarting level {}", now / 1000.0, level_index + 1)
                    }
                    _ => {}
                }
            }

            if frame % 600 == 0 {
                let sim = session.sim();
                log::info!(
                    "[{:>6.1}s] score {} level {} lives {} bubbles {}",
                    now / 1000.0,
                    sim.score,
                    sim.level_index + 1,
                    sim.lives,
                    sim.bubbles.len()
                );
            }

            if let SessionPhase::GameOver { .. } = report.phase {
                break;
            }
        }

        let summary = session.exit();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Bubble Pop (native demo) starting...");

    if let Err(e) = demo::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is bubble_pop::web::start, this is just to satisfy the compiler
}
