//! Area hazards owned by player weapons
//!
//! A zone damages everything inside it on a fixed period; a shockwave
//! damages each enemy inside it at most once.

use glam::Vec2;

use super::character::DamageSource;
use super::collision::{HitKey, HitSet, find_enemies_in_radius};
use super::entity::{Arena, Entity, EntityBase, Handle};
use super::status::StatusEffect;

#[derive(Debug, Clone)]
pub enum HazardKind {
    Zone {
        tick_interval: f32,
        tick_timer: f32,
        /// Track the player's position each frame
        follow_player: bool,
    },
    Shockwave {
        hits: HitSet,
    },
}

#[derive(Debug, Clone)]
pub struct Hazard {
    pub base: EntityBase,
    pub kind: HazardKind,
    pub damage: f32,
    pub effect: Option<StatusEffect>,
    pub lifetime: f32,
    pub source: DamageSource,
}

impl Hazard {
    pub fn zone(
        pos: Vec2,
        radius: f32,
        damage: f32,
        tick_interval: f32,
        lifetime: f32,
        effect: Option<StatusEffect>,
    ) -> Self {
        Self {
            base: EntityBase::new(pos, radius * 2.0),
            kind: HazardKind::Zone {
                tick_interval,
                // First tick lands immediately
                tick_timer: 0.0,
                follow_player: true,
            },
            damage,
            effect,
            lifetime,
            source: DamageSource::Player,
        }
    }

    pub fn shockwave(pos: Vec2, radius: f32, damage: f32, lifetime: f32) -> Self {
        Self {
            base: EntityBase::new(pos, radius * 2.0),
            kind: HazardKind::Shockwave {
                hits: HitSet::new(),
            },
            damage,
            effect: None,
            lifetime,
            source: DamageSource::Player,
        }
    }

    pub fn follows_player(&self) -> bool {
        matches!(
            self.kind,
            HazardKind::Zone {
                follow_player: true,
                ..
            }
        )
    }

    /// Age the hazard and return the enemies it damages this frame
    pub fn collect_targets<T: Entity>(&mut self, dt: f32, enemies: &Arena<T>) -> Vec<Handle> {
        if !self.base.is_live() {
            return Vec::new();
        }
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.base.kill();
            return Vec::new();
        }
        let radius = self.base.radius();
        match &mut self.kind {
            HazardKind::Zone {
                tick_interval,
                tick_timer,
                ..
            } => {
                *tick_timer -= dt;
                if *tick_timer > 0.0 {
                    return Vec::new();
                }
                *tick_timer += *tick_interval;
                find_enemies_in_radius(enemies, self.base.pos, radius)
            }
            HazardKind::Shockwave { hits } => find_enemies_in_radius(enemies, self.base.pos, radius)
                .into_iter()
                .filter(|h| hits.try_hit(HitKey::Enemy(*h)))
                .collect(),
        }
    }
}

impl Entity for Hazard {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}
