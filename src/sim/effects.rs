//! Floating damage numbers and short-lived visual effects
//!
//! Neither kind affects gameplay; both exist so a surface has something to
//! draw. Damage numbers churn fast enough to be pooled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityBase, Handle};
use super::pool::Poolable;
use crate::consts::{DAMAGE_NUMBER_LIFETIME, DAMAGE_NUMBER_RISE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberKind {
    Damage,
    Heal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberSpawn {
    pub pos: Vec2,
    pub value: f32,
    pub kind: NumberKind,
}

#[derive(Debug, Clone)]
pub struct DamageNumber {
    pub base: EntityBase,
    pub value: f32,
    pub kind: NumberKind,
    pub age: f32,
}

impl DamageNumber {
    pub fn update(&mut self, dt: f32) {
        if !self.base.is_live() {
            return;
        }
        self.age += dt;
        // Screen-up is -y
        self.base.translate(Vec2::new(0.0, -DAMAGE_NUMBER_RISE * dt));
        if self.age >= DAMAGE_NUMBER_LIFETIME {
            self.base.kill();
        }
    }

    /// Fade from 1 to 0 over the lifetime
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age / DAMAGE_NUMBER_LIFETIME).clamp(0.0, 1.0)
    }
}

impl Poolable for DamageNumber {
    type Args = NumberSpawn;

    fn create(args: NumberSpawn) -> Self {
        Self {
            base: EntityBase::new(args.pos, 12.0),
            value: args.value,
            kind: args.kind,
            age: 0.0,
        }
    }

    fn init(&mut self, args: NumberSpawn) {
        self.base = EntityBase::new(args.pos, 12.0);
        self.value = args.value;
        self.kind = args.kind;
        self.age = 0.0;
    }
}

impl Entity for DamageNumber {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

/// What a [`TimedEffect`] looks like
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisualKind {
    Explosion { radius: f32 },
    LightningArc { to: Vec2 },
    WhipSwing { corners: [Vec2; 4] },
    LanceLine { to: Vec2, width: f32 },
    /// Follows `enemy`; bursts for `burst_damage` when the enemy dies
    Bubble { enemy: Handle, burst_damage: f32 },
    Burst { radius: f32 },
    LevelUp,
}

/// A one-off visual that expires after `duration`
#[derive(Debug, Clone)]
pub struct TimedEffect {
    pub base: EntityBase,
    pub id: u32,
    pub kind: VisualKind,
    pub elapsed: f32,
    pub duration: f32,
}

impl TimedEffect {
    pub fn new(id: u32, kind: VisualKind, pos: Vec2, size: f32, duration: f32) -> Self {
        Self {
            base: EntityBase::new(pos, size),
            id,
            kind,
            elapsed: 0.0,
            duration,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.base.is_live() {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.base.kill();
        }
    }

    /// 0 at spawn, 1 at expiry
    pub fn progress(&self) -> f32 {
        if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl Entity for TimedEffect {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}
