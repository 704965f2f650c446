//! Horde Arena - entity simulation core for a top-down survival arena game
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (entities, status effects, collisions, AI)
//! - `render`: Drawing boundary consumed by an external renderer
//! - `config`: Data-driven game balance loaded from JSON
//! - `error`: Error types for configuration and drawing

pub mod config;
pub mod error;
pub mod render;
pub mod sim;

pub use config::Tuning;
pub use error::{DrawError, SimError};
pub use sim::{SimulationWorld, TickInput, tick};

use glam::Vec2;

/// Game configuration constants (authoritative defaults for [`Tuning`])
pub mod consts {
    /// Largest frame delta the pipeline will simulate in one step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 24.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_SPEED: f32 = 150.0;
    pub const PLAYER_PICKUP_RADIUS: f32 = 60.0;
    pub const PLAYER_INVINCIBILITY: f32 = 0.5;
    /// XP needed for level 2; grows by `XP_GROWTH` each level
    pub const XP_BASE: f32 = 5.0;
    pub const XP_GROWTH: f32 = 1.25;

    /// Enemy defaults (before type multipliers)
    pub const ENEMY_BASE_HEALTH: f32 = 10.0;
    pub const ENEMY_BASE_SPEED: f32 = 60.0;
    pub const ENEMY_BASE_DAMAGE: f32 = 8.0;
    pub const ENEMY_ATTACK_INTERVAL: f32 = 1.0;
    pub const ENEMY_INVINCIBILITY: f32 = 0.1;

    /// Ranged kite behavior
    pub const KITE_FIRE_INTERVAL: f32 = 2.0;
    pub const KITE_CHASE_FRACTION: f32 = 0.7;
    pub const KITE_RETREAT_SPEED: f32 = 0.5;
    pub const ENEMY_PROJECTILE_SPEED: f32 = 220.0;
    pub const ENEMY_PROJECTILE_SIZE: f32 = 10.0;
    pub const ENEMY_PROJECTILE_LIFETIME: f32 = 4.0;

    /// Dash creature behavior
    pub const DASH_SPEED_MULT: f32 = 4.0;
    pub const DASH_DURATION: f32 = 0.4;
    pub const DASH_COOLDOWN: f32 = 3.0;
    pub const DASH_DAMAGE_MULT: f32 = 1.5;
    pub const DASH_FAR_MULT: f32 = 1.2;
    /// Chance per second of dashing while orbiting
    pub const DASH_ORBIT_CHANCE: f32 = 0.3;
    pub const LEAVE_FRACTION: f32 = 0.5;
    pub const APPROACH_FRACTION: f32 = 1.4;
    /// Radius blend rate while settling onto the orbit ring (per second)
    pub const ORBIT_BLEND_RATE: f32 = 3.0;
    /// Movement speed (units per second) below which a dasher counts as stuck
    pub const STUCK_SPEED: f32 = 6.0;
    pub const STUCK_THRESHOLD: f32 = 1.0;
    pub const STUCK_NUDGE: f32 = 40.0;
    pub const FORCED_APPROACH_TIME: f32 = 0.5;

    /// Telegraphed beam behavior
    pub const BEAM_WARNING_TIME: f32 = 0.8;
    pub const BEAM_FIRING_TIME: f32 = 0.6;
    pub const BEAM_COOLDOWN: f32 = 4.0;
    pub const BEAM_RANGE: f32 = 350.0;
    pub const BEAM_LENGTH: f32 = 450.0;
    pub const BEAM_WIDTH: f32 = 16.0;
    pub const BEAM_DAMAGE: f32 = 20.0;
    pub const BEAM_HIT_INVINCIBILITY: f32 = 0.5;

    /// Boss barrage
    pub const BARRAGE_INTERVAL: f32 = 6.0;
    pub const BARRAGE_WAVES: u32 = 3;
    pub const BARRAGE_WAVE_GAP: f32 = 0.35;
    pub const BARRAGE_PROJECTILES: u32 = 12;

    /// Drops
    pub const HEAL_DROP_CHANCE: f32 = 0.03;
    pub const MAGNET_DROP_CHANCE: f32 = 0.01;
    pub const DROP_DECAY_PER_MINUTE: f32 = 0.05;
    pub const DROP_DECAY_FLOOR: f32 = 0.3;
    pub const GEM_SCATTER: f32 = 10.0;
    pub const HEAL_PICKUP_AMOUNT: f32 = 30.0;
    pub const MAGNET_DURATION: f32 = 3.0;

    /// Spawner
    pub const SPAWN_INTERVAL: f32 = 1.5;
    pub const SPAWN_INTERVAL_MIN: f32 = 0.3;
    pub const SPAWN_DISTANCE: f32 = 500.0;
    pub const MAX_ENEMIES: usize = 300;
    pub const BOSS_INTERVAL: f32 = 180.0;
    pub const BOSS_WARNING_TIME: f32 = 3.0;
    pub const OBJECT_INTERVAL: f32 = 45.0;

    /// Floating numbers
    pub const DAMAGE_NUMBER_LIFETIME: f32 = 0.8;
    pub const DAMAGE_NUMBER_RISE: f32 = 40.0;
}

/// Convert an angle (radians) to a unit direction vector
#[inline]
pub fn angle_to_dir(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle (radians) of a direction vector
#[inline]
pub fn dir_to_angle(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

/// Elapsed simulation seconds expressed in minutes
#[inline]
pub fn minutes(seconds: f32) -> f32 {
    seconds / 60.0
}

/// Drop-chance multiplier that tapers linearly with run time
///
/// `max(floor, 1 - minutes * per_minute)`
#[inline]
pub fn drop_decay(minutes: f32, per_minute: f32, floor: f32) -> f32 {
    (1.0 - minutes * per_minute).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_decay_floor() {
        use consts::*;
        assert!((drop_decay(0.0, DROP_DECAY_PER_MINUTE, DROP_DECAY_FLOOR) - 1.0).abs() < 1e-6);
        assert!((drop_decay(10.0, DROP_DECAY_PER_MINUTE, DROP_DECAY_FLOOR) - 0.5).abs() < 1e-6);
        // 14 minutes would be 0.3, anything past clamps
        assert!((drop_decay(30.0, DROP_DECAY_PER_MINUTE, DROP_DECAY_FLOOR) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_angle_roundtrip() {
        let dir = angle_to_dir(0.75);
        assert!((dir_to_angle(dir) - 0.75).abs() < 1e-5);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }
}
