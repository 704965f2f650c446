//! Horde Arena headless runner
//!
//! Drives the simulation with scripted input for a fixed span of game time
//! and prints the final HUD snapshot as JSON.
//!
//! Usage: `horde-arena [TUNING_JSON] [SECONDS]`

#[cfg(not(target_arch = "wasm32"))]
use horde_arena::Tuning;
#[cfg(not(target_arch = "wasm32"))]
use horde_arena::error::DrawError;
#[cfg(not(target_arch = "wasm32"))]
use horde_arena::render::{Color, Surface, draw_world};
#[cfg(not(target_arch = "wasm32"))]
use horde_arena::sim::{SimEvent, SimPhase, SimulationWorld, TickInput, tick};

#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SECONDS: f32 = 120.0;

/// Counts primitives instead of drawing them
#[cfg(not(target_arch = "wasm32"))]
#[derive(Default)]
struct NullSurface {
    primitives: u64,
}

#[cfg(not(target_arch = "wasm32"))]
impl Surface for NullSurface {
    fn fill_circle(&mut self, _: glam::Vec2, _: f32, _: Color) -> Result<(), DrawError> {
        self.primitives += 1;
        Ok(())
    }

    fn stroke_line(
        &mut self,
        _: glam::Vec2,
        _: glam::Vec2,
        _: f32,
        _: Color,
    ) -> Result<(), DrawError> {
        self.primitives += 1;
        Ok(())
    }

    fn fill_polygon(&mut self, _: &[glam::Vec2], _: Color) -> Result<(), DrawError> {
        self.primitives += 1;
        Ok(())
    }

    fn text(&mut self, _: glam::Vec2, _: &str, _: f32, _: Color) -> Result<(), DrawError> {
        self.primitives += 1;
        Ok(())
    }
}

/// Walk a slow square so the horde has to follow
#[cfg(not(target_arch = "wasm32"))]
fn scripted_input(time: f32) -> TickInput {
    let leg = (time / 3.0) as u32 % 4;
    TickInput {
        right: leg == 0,
        down: leg == 1,
        left: leg == 2,
        up: leg == 3,
        pause: false,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Horde Arena (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load(path),
        None => Tuning::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SECONDS);

    let mut world = SimulationWorld::new(tuning);
    let mut surface = NullSurface::default();
    let mut draw_failures = 0;

    while world.time < seconds && world.phase != SimPhase::GameOver {
        let input = scripted_input(world.time);
        tick(&mut world, &input, FRAME_DT);

        for event in world.drain_events() {
            match event {
                SimEvent::LevelUp { level } => {
                    // Always take the first offer
                    let offer = world.upgrade_choices(3);
                    if let Some(pick) = offer.first() {
                        world.apply_upgrade(*pick);
                        log::info!("level {} -> {:?}", level, pick);
                    }
                }
                SimEvent::BossWarning => log::info!("boss warning at {:.1}s", world.time),
                SimEvent::PlayerDied { time, kills } => {
                    log::info!("died at {:.1}s with {} kills", time, kills)
                }
                _ => {}
            }
        }

        draw_failures += draw_world(&world, &mut surface).failed;
    }

    log::info!(
        "ran {} frames, {} primitives, {} draw failures",
        world.frame,
        surface.primitives,
        draw_failures
    );
    match serde_json::to_string_pretty(&world.hud()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("failed to serialize HUD: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; the host drives `tick` itself
}
