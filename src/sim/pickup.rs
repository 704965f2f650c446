//! Pickups and destructible world objects

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::circles_overlap;
use super::entity::{Entity, EntityBase};
use super::geom::distance_sq;

/// Pickup size (collision diameter)
pub const PICKUP_SIZE: f32 = 10.0;
/// Speed of a pickup drifting toward the player
pub const PICKUP_ATTRACT_SPEED: f32 = 320.0;
/// Brazier health
pub const BRAZIER_HEALTH: f32 = 20.0;
pub const BRAZIER_SIZE: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    Xp { value: f32 },
    Heal { amount: f32 },
    /// Pulls every XP gem on the field to the player for a while
    Magnet,
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub base: EntityBase,
    pub kind: PickupKind,
    /// Once attracted, a pickup keeps homing until collected
    pub attracted: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2) -> Self {
        Self {
            base: EntityBase::new(pos, PICKUP_SIZE),
            kind,
            attracted: false,
        }
    }

    #[inline]
    pub fn is_xp(&self) -> bool {
        matches!(self.kind, PickupKind::Xp { .. })
    }

    /// Drift toward the collector once inside `radius`; returns true on collection
    ///
    /// `magnet` attracts XP gems regardless of distance.
    pub fn update(
        &mut self,
        dt: f32,
        collector: Vec2,
        collector_size: f32,
        radius: f32,
        magnet: bool,
    ) -> bool {
        if !self.base.is_live() {
            return false;
        }
        if !self.attracted
            && ((magnet && self.is_xp()) || distance_sq(self.base.pos, collector) <= radius * radius)
        {
            self.attracted = true;
        }
        if self.attracted {
            let to = collector - self.base.pos;
            let step = PICKUP_ATTRACT_SPEED * dt;
            if to.length() <= step {
                self.base.pos = collector;
            } else if let Some(dir) = to.try_normalize() {
                self.base.translate(dir * step);
            }
        }
        if circles_overlap(self.base.pos, self.base.size, collector, collector_size) {
            self.base.kill();
            return true;
        }
        false
    }
}

impl Entity for Pickup {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Brazier,
}

/// Destructible prop; weapons can break it for a drop
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub base: EntityBase,
    pub id: u32,
    pub kind: ObjectKind,
    pub health: f32,
}

impl WorldObject {
    pub fn brazier(id: u32, pos: Vec2) -> Self {
        Self {
            base: EntityBase::new(pos, BRAZIER_SIZE),
            id,
            kind: ObjectKind::Brazier,
            health: BRAZIER_HEALTH,
        }
    }

    /// Returns true if this hit broke the object
    pub fn take_hit(&mut self, damage: f32) -> bool {
        if !self.base.is_live() || !damage.is_finite() || damage <= 0.0 {
            return false;
        }
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.base.kill();
            true
        } else {
            false
        }
    }
}

impl Entity for WorldObject {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}
