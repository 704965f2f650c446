//! Data-driven game balance
//!
//! [`Tuning`] mirrors the constants in [`crate::consts`]. A JSON file may
//! override any subset of fields; missing keys keep the compile-time default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::sim::character::Stats;

/// Runtime-tunable simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed for the world RNG
    pub seed: u64,
    /// Frame delta clamp (seconds)
    pub max_frame_dt: f32,

    // === Player ===
    pub player_stats: Stats,
    pub player_size: f32,
    pub player_pickup_radius: f32,
    pub player_invincibility: f32,
    pub xp_base: f32,
    pub xp_growth: f32,

    // === Enemies ===
    pub enemy_base_health: f32,
    pub enemy_base_speed: f32,
    pub enemy_base_damage: f32,
    pub enemy_attack_interval: f32,
    pub enemy_invincibility: f32,

    // === Ranged kite ===
    pub kite_fire_interval: f32,
    pub enemy_projectile_speed: f32,

    // === Dash creature ===
    pub dash_speed_mult: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub dash_damage_mult: f32,
    pub dash_far_mult: f32,
    pub dash_orbit_chance: f32,
    pub stuck_threshold: f32,

    // === Telegraphed beam ===
    pub beam_warning_time: f32,
    pub beam_firing_time: f32,
    pub beam_cooldown: f32,
    pub beam_range: f32,
    pub beam_length: f32,
    pub beam_width: f32,
    pub beam_damage: f32,
    pub beam_hit_invincibility: f32,

    // === Boss ===
    pub barrage_interval: f32,
    pub boss_interval: f32,
    pub boss_warning_time: f32,

    // === Drops ===
    pub heal_drop_chance: f32,
    pub magnet_drop_chance: f32,
    pub drop_decay_per_minute: f32,
    pub drop_decay_floor: f32,

    // === Spawner ===
    pub spawn_interval: f32,
    pub spawn_interval_min: f32,
    pub spawn_distance: f32,
    pub max_enemies: usize,
    pub object_interval: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            max_frame_dt: MAX_FRAME_DT,

            player_stats: Stats {
                max_health: PLAYER_MAX_HEALTH,
                speed: PLAYER_SPEED,
                ..Stats::default()
            },
            player_size: PLAYER_SIZE,
            player_pickup_radius: PLAYER_PICKUP_RADIUS,
            player_invincibility: PLAYER_INVINCIBILITY,
            xp_base: XP_BASE,
            xp_growth: XP_GROWTH,

            enemy_base_health: ENEMY_BASE_HEALTH,
            enemy_base_speed: ENEMY_BASE_SPEED,
            enemy_base_damage: ENEMY_BASE_DAMAGE,
            enemy_attack_interval: ENEMY_ATTACK_INTERVAL,
            enemy_invincibility: ENEMY_INVINCIBILITY,

            kite_fire_interval: KITE_FIRE_INTERVAL,
            enemy_projectile_speed: ENEMY_PROJECTILE_SPEED,

            dash_speed_mult: DASH_SPEED_MULT,
            dash_duration: DASH_DURATION,
            dash_cooldown: DASH_COOLDOWN,
            dash_damage_mult: DASH_DAMAGE_MULT,
            dash_far_mult: DASH_FAR_MULT,
            dash_orbit_chance: DASH_ORBIT_CHANCE,
            stuck_threshold: STUCK_THRESHOLD,

            beam_warning_time: BEAM_WARNING_TIME,
            beam_firing_time: BEAM_FIRING_TIME,
            beam_cooldown: BEAM_COOLDOWN,
            beam_range: BEAM_RANGE,
            beam_length: BEAM_LENGTH,
            beam_width: BEAM_WIDTH,
            beam_damage: BEAM_DAMAGE,
            beam_hit_invincibility: BEAM_HIT_INVINCIBILITY,

            barrage_interval: BARRAGE_INTERVAL,
            boss_interval: BOSS_INTERVAL,
            boss_warning_time: BOSS_WARNING_TIME,

            heal_drop_chance: HEAL_DROP_CHANCE,
            magnet_drop_chance: MAGNET_DROP_CHANCE,
            drop_decay_per_minute: DROP_DECAY_PER_MINUTE,
            drop_decay_floor: DROP_DECAY_FLOOR,

            spawn_interval: SPAWN_INTERVAL,
            spawn_interval_min: SPAWN_INTERVAL_MIN,
            spawn_distance: SPAWN_DISTANCE,
            max_enemies: MAX_ENEMIES,
            object_interval: OBJECT_INTERVAL,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read and parse a tuning file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load tuning from a file, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("{} - using default tuning", e);
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON (for dumping a starting-point file)
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the frame pipeline
    pub fn validate(&self) -> Result<(), SimError> {
        fn positive(name: &'static str, value: f32) -> Result<(), SimError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidTuning {
                    name,
                    value,
                    expected: "finite and > 0",
                })
            }
        }
        fn non_negative(name: &'static str, value: f32) -> Result<(), SimError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidTuning {
                    name,
                    value,
                    expected: "finite and >= 0",
                })
            }
        }
        fn unit(name: &'static str, value: f32) -> Result<(), SimError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SimError::InvalidTuning {
                    name,
                    value,
                    expected: "within [0, 1]",
                })
            }
        }

        positive("max_frame_dt", self.max_frame_dt)?;
        positive("player_stats.max_health", self.player_stats.max_health)?;
        positive("player_size", self.player_size)?;
        positive("xp_base", self.xp_base)?;
        positive("enemy_base_health", self.enemy_base_health)?;
        positive("dash_speed_mult", self.dash_speed_mult)?;
        positive("dash_duration", self.dash_duration)?;
        positive("beam_warning_time", self.beam_warning_time)?;
        positive("beam_firing_time", self.beam_firing_time)?;
        positive("beam_width", self.beam_width)?;
        positive("stuck_threshold", self.stuck_threshold)?;
        positive("barrage_interval", self.barrage_interval)?;
        non_negative("dash_cooldown", self.dash_cooldown)?;
        non_negative("beam_cooldown", self.beam_cooldown)?;
        non_negative("kite_fire_interval", self.kite_fire_interval)?;
        positive("spawn_interval", self.spawn_interval)?;
        positive("spawn_interval_min", self.spawn_interval_min)?;
        positive("boss_interval", self.boss_interval)?;
        unit("heal_drop_chance", self.heal_drop_chance)?;
        unit("magnet_drop_chance", self.magnet_drop_chance)?;
        unit("drop_decay_floor", self.drop_decay_floor)?;
        unit(
            "player_stats.slow_resistance",
            self.player_stats.slow_resistance,
        )?;
        if self.xp_growth < 1.0 {
            return Err(SimError::InvalidTuning {
                name: "xp_growth",
                value: self.xp_growth,
                expected: ">= 1",
            });
        }
        Ok(())
    }

    /// Drop-chance multiplier at the given run time (seconds)
    pub fn drop_multiplier(&self, elapsed: f32) -> f32 {
        crate::drop_decay(
            crate::minutes(elapsed),
            self.drop_decay_per_minute,
            self.drop_decay_floor,
        )
    }
}
