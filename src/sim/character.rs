//! Characters: health, armor, invincibility, and the damage/heal/death pipeline

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityBase, Handle};
use super::status::{DotTick, Resistance, StatusEffect, StatusEffects};

/// Who dealt a hit (kill credit, status-effect attribution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    Player,
    Enemy(Handle),
    /// Enemy-owned hazards (explosions, beams that outlive their caster)
    Hazard,
    Environment,
}

impl DamageSource {
    /// Whether a kill by this source counts toward the player's tally
    #[inline]
    pub fn credits_player(&self) -> bool {
        matches!(self, DamageSource::Player)
    }
}

/// Result of [`Character::take_damage`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Invincible, already dead, or invalid amount
    Ignored,
    Survived { dealt: f32 },
    Died { dealt: f32 },
}

impl DamageOutcome {
    pub fn dealt(&self) -> f32 {
        match *self {
            DamageOutcome::Ignored => 0.0,
            DamageOutcome::Survived { dealt } | DamageOutcome::Died { dealt } => dealt,
        }
    }

    pub fn died(&self) -> bool {
        matches!(self, DamageOutcome::Died { .. })
    }
}

/// A damage-over-time tick after it went through the damage pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotResult {
    pub outcome: DamageOutcome,
    pub source: DamageSource,
}

/// Character stats (base values plus multipliers from upgrades)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub max_health: f32,
    pub speed: f32,
    /// Contact damage for enemies
    pub damage: f32,
    /// Flat mitigation per hit
    pub armor: f32,
    /// Health per second
    pub regen: f32,
    /// Seconds between contact attacks
    pub attack_interval: f32,
    /// Outgoing damage multiplier
    pub might: f32,
    /// Weapon area multiplier
    pub area: f32,
    /// Weapon cooldown multiplier (lower is faster)
    pub cooldown: f32,
    pub slow_resistance: f32,
    pub slow_immunity: bool,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            speed: 100.0,
            damage: 0.0,
            armor: 0.0,
            regen: 0.0,
            attack_interval: 1.0,
            might: 1.0,
            area: 1.0,
            cooldown: 1.0,
            slow_resistance: 0.0,
            slow_immunity: false,
        }
    }
}

impl Stats {
    pub fn resistance(&self) -> Resistance {
        Resistance {
            slow_resistance: self.slow_resistance,
            slow_immunity: self.slow_immunity,
        }
    }
}

/// Anything with health that can be hurt, healed, and affected by statuses
#[derive(Debug, Clone)]
pub struct Character {
    pub base: EntityBase,
    pub stats: Stats,
    /// Always within `[0, stats.max_health]`
    pub health: f32,
    pub status: StatusEffects,
    /// Countdown during which incoming damage is ignored
    pub invincible_time: f32,
    /// Value stamped into `invincible_time` after each accepted hit
    pub invincibility_window: f32,
}

impl Character {
    pub fn new(pos: Vec2, size: f32, stats: Stats, invincibility_window: f32) -> Self {
        Self {
            base: EntityBase::new(pos, size),
            health: stats.max_health,
            stats,
            status: StatusEffects::default(),
            invincible_time: 0.0,
            invincibility_window,
        }
    }

    /// Apply a hit after armor; ignored while invincible
    pub fn take_damage(&mut self, amount: f32, _source: DamageSource) -> DamageOutcome {
        if !self.base.is_live() || self.invincible_time > 0.0 || !amount.is_finite() {
            return DamageOutcome::Ignored;
        }

        // Flat armor with a floor of 1: chip damage always lands
        let dealt = (amount - self.stats.armor).max(1.0);
        self.health = (self.health - dealt).max(0.0);
        self.invincible_time = self.invincibility_window;

        if self.health <= 0.0 {
            self.on_death();
            DamageOutcome::Died { dealt }
        } else {
            DamageOutcome::Survived { dealt }
        }
    }

    /// Restore health up to the maximum; returns the amount actually healed
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.base.is_live() || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.stats.max_health);
        self.health - before
    }

    /// Base death handling: the character leaves the simulation
    pub fn on_death(&mut self) {
        self.health = 0.0;
        self.base.kill();
    }

    pub fn apply_effect(&mut self, effect: StatusEffect, source: DamageSource) -> bool {
        if !self.base.is_live() {
            return false;
        }
        self.status.apply(effect, source, self.stats.resistance())
    }

    /// Count down invincibility and status effects; periodic damage goes
    /// through [`Self::take_damage`] with the effect's stored source
    pub fn tick(&mut self, dt: f32) -> Vec<DotResult> {
        if !self.base.is_live() {
            return Vec::new();
        }
        self.invincible_time = (self.invincible_time - dt).max(0.0);

        let ticks: Vec<DotTick> = self.status.update(dt);
        let mut results = Vec::with_capacity(ticks.len());
        for tick in ticks {
            let outcome = self.take_damage(tick.damage, tick.source);
            results.push(DotResult {
                outcome,
                source: tick.source,
            });
            if outcome.died() {
                break;
            }
        }
        results
    }

    /// Silent per-second regeneration (no floating number)
    pub fn regenerate(&mut self, dt: f32) {
        if self.stats.regen > 0.0 && self.base.is_live() {
            self.health = (self.health + self.stats.regen * dt).min(self.stats.max_health);
        }
    }

    /// Raise max health, granting the difference as current health
    pub fn grow_max_health(&mut self, amount: f32) {
        self.stats.max_health += amount;
        self.health = (self.health + amount).clamp(0.0, self.stats.max_health);
    }

    /// Base speed after slow/stun/freeze
    #[inline]
    pub fn current_speed(&self) -> f32 {
        self.stats.speed * self.status.speed_factor()
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.status.is_stunned()
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.status.is_frozen()
    }

    /// Stunned or frozen: no movement or attacks
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.is_stunned() || self.is_frozen()
    }

    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincible_time > 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.stats.max_health > 0.0 {
            self.health / self.stats.max_health
        } else {
            0.0
        }
    }
}

impl Entity for Character {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}
