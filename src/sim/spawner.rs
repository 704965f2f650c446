//! Enemy waves, boss cadence, and world-object drops over run time

use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use crate::config::Tuning;
use crate::minutes;

/// Per-minute health growth for newly spawned enemies
pub const HEALTH_SCALE_PER_MINUTE: f32 = 0.15;
/// Fraction the spawn interval shrinks by per minute
const INTERVAL_DECAY_PER_MINUTE: f32 = 0.08;
const MAX_BATCH: u32 = 6;

/// What the spawner wants the world to do this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerAction {
    SpawnEnemies { count: u32 },
    BossWarning,
    SpawnObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub spawn_timer: f32,
    pub boss_timer: f32,
    pub object_timer: f32,
    pub bosses_warned: u32,
}

impl Spawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            spawn_timer: tuning.spawn_interval,
            boss_timer: tuning.boss_interval,
            object_timer: tuning.object_interval,
            bosses_warned: 0,
        }
    }

    /// Health multiplier for enemies spawned at `elapsed` seconds
    pub fn health_scale(elapsed: f32) -> f32 {
        1.0 + HEALTH_SCALE_PER_MINUTE * minutes(elapsed)
    }

    pub fn spawn_interval(tuning: &Tuning, elapsed: f32) -> f32 {
        let shrink = (1.0 - INTERVAL_DECAY_PER_MINUTE * minutes(elapsed)).max(0.0);
        (tuning.spawn_interval * shrink).max(tuning.spawn_interval_min)
    }

    pub fn batch_size(elapsed: f32) -> u32 {
        (1 + minutes(elapsed) as u32 / 2).min(MAX_BATCH)
    }

    /// Kinds that may appear at `elapsed` seconds
    pub fn unlocked_kinds(elapsed: f32) -> Vec<EnemyKind> {
        let m = minutes(elapsed);
        let schedule: [(f32, EnemyKind); 8] = [
            (0.0, EnemyKind::Zombie),
            (0.0, EnemyKind::Bat),
            (1.0, EnemyKind::Spitter),
            (1.0, EnemyKind::Slime),
            (2.0, EnemyKind::Brute),
            (2.0, EnemyKind::Bomber),
            (3.0, EnemyKind::Stalker),
            (4.0, EnemyKind::Eye),
        ];
        schedule
            .iter()
            .filter(|(from, _)| m >= *from)
            .map(|(_, kind)| *kind)
            .collect()
    }

    /// Advance timers; `live_enemies` caps regular spawns
    pub fn update(
        &mut self,
        dt: f32,
        elapsed: f32,
        live_enemies: usize,
        tuning: &Tuning,
    ) -> Vec<SpawnerAction> {
        let mut actions = Vec::new();

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            self.spawn_timer = Self::spawn_interval(tuning, elapsed);
            let room = tuning.max_enemies.saturating_sub(live_enemies) as u32;
            let count = Self::batch_size(elapsed).min(room);
            if count > 0 {
                actions.push(SpawnerAction::SpawnEnemies { count });
            }
        }

        self.boss_timer -= dt;
        if self.boss_timer <= 0.0 {
            self.boss_timer = tuning.boss_interval;
            self.bosses_warned += 1;
            actions.push(SpawnerAction::BossWarning);
        }

        self.object_timer -= dt;
        if self.object_timer <= 0.0 {
            self.object_timer = tuning.object_interval;
            actions.push(SpawnerAction::SpawnObject);
        }

        actions
    }
}
