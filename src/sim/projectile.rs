//! Pooled projectiles (player weapons and enemy shots share one pool)

use glam::Vec2;

use super::character::DamageSource;
use super::collision::{HitKey, HitSet};
use super::entity::{Entity, EntityBase, Handle};
use super::pool::Poolable;
use super::status::StatusEffect;

/// Everything needed to launch a projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub damage: f32,
    /// Extra unique targets after the first; despawns when it drops below 0
    pub pierce: i32,
    pub lifetime: f32,
    pub effect: Option<StatusEffect>,
    pub homing: Option<Handle>,
    pub source: DamageSource,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub base: EntityBase,
    pub vel: Vec2,
    pub damage: f32,
    pub pierce: i32,
    pub lifetime: f32,
    pub effect: Option<StatusEffect>,
    pub homing: Option<Handle>,
    pub source: DamageSource,
    hits: HitSet,
}

/// Radians per second a homing projectile can turn
const HOMING_TURN_RATE: f32 = 6.0;

impl Projectile {
    /// Move and age; out-of-time or non-finite projectiles become garbage
    pub fn update(&mut self, dt: f32) {
        if !self.base.is_live() {
            return;
        }
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.base.kill();
            return;
        }
        if !self.base.translate(self.vel * dt) {
            self.base.kill();
        }
    }

    /// Turn toward `target`, keeping speed
    pub fn steer_toward(&mut self, target: Vec2, dt: f32) {
        let speed = self.vel.length();
        let Some(want) = (target - self.base.pos).try_normalize() else {
            return;
        };
        let Some(have) = self.vel.try_normalize() else {
            self.vel = want * speed;
            return;
        };
        let angle = have.angle_to(want);
        let max_turn = HOMING_TURN_RATE * dt;
        let turn = angle.clamp(-max_turn, max_turn);
        self.vel = Vec2::from_angle(turn).rotate(have) * speed;
    }

    /// Claim a hit on `key`
    ///
    /// Returns false if the projectile is spent or already hit `key`;
    /// otherwise consumes one pierce and the caller applies the damage.
    pub fn register_hit(&mut self, key: HitKey) -> bool {
        if !self.base.is_live() || !self.hits.try_hit(key) {
            return false;
        }
        self.pierce -= 1;
        if self.pierce < 0 {
            self.base.kill();
        }
        true
    }

    pub fn has_hit(&self, key: HitKey) -> bool {
        self.hits.contains(key)
    }

    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}

impl Poolable for Projectile {
    type Args = ProjectileSpawn;

    fn create(args: ProjectileSpawn) -> Self {
        Self {
            base: EntityBase::new(args.pos, args.size),
            vel: args.vel,
            damage: args.damage,
            pierce: args.pierce,
            lifetime: args.lifetime,
            effect: args.effect,
            homing: args.homing,
            source: args.source,
            hits: HitSet::new(),
        }
    }

    fn init(&mut self, args: ProjectileSpawn) {
        self.base = EntityBase::new(args.pos, args.size);
        self.vel = args.vel;
        self.damage = args.damage;
        self.pierce = args.pierce;
        self.lifetime = args.lifetime;
        self.effect = args.effect;
        self.homing = args.homing;
        self.source = args.source;
        self.hits.reset();
    }
}

impl Entity for Projectile {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}
