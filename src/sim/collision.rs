//! Collision tests and spatial queries
//!
//! Hit tests for circles, beams, and whip polygons, plus the "who is near"
//! queries weapons and AI use. Queries are linear scans over the live enemy
//! arena; at a few hundred entities that beats maintaining an index.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Arena, Entity, Handle};
use super::geom::{distance_sq, point_in_polygon, point_segment_distance_sq};

/// Circle-circle overlap using half-sizes as radii
#[inline]
pub fn circles_overlap(a: Vec2, a_size: f32, b: Vec2, b_size: f32) -> bool {
    let reach = (a_size + b_size) * 0.5;
    distance_sq(a, b) <= reach * reach
}

/// Overlap between two live entities; garbage never collides
#[inline]
pub fn entities_overlap(a: &impl Entity, b: &impl Entity) -> bool {
    a.is_live() && b.is_live() && circles_overlap(a.pos(), a.size(), b.pos(), b.size())
}

/// Beam/line hit test
///
/// Hit when the squared distance from the target center to the segment is at
/// most `(width/2)^2 + (target_size/2)^2`. This is a cheap combined
/// threshold, not an exact capsule-vs-circle test.
pub fn beam_hits(target: Vec2, target_size: f32, start: Vec2, end: Vec2, width: f32) -> bool {
    let half_w = width * 0.5;
    let half_t = target_size * 0.5;
    point_segment_distance_sq(target, start, end) <= half_w * half_w + half_t * half_t
}

/// Polygon hit test on the target center
#[inline]
pub fn polygon_hits(target: Vec2, poly: &[Vec2]) -> bool {
    point_in_polygon(target, poly)
}

/// Nearest live entity within `max_range` of `from`
pub fn find_nearest_enemy<T: Entity>(
    enemies: &Arena<T>,
    from: Vec2,
    max_range: f32,
) -> Option<Handle> {
    find_nearest_enemy_excluding(enemies, from, max_range, |_| false)
}

/// Nearest live entity within range that `exclude` does not reject
pub fn find_nearest_enemy_excluding<T: Entity>(
    enemies: &Arena<T>,
    from: Vec2,
    max_range: f32,
    exclude: impl Fn(Handle) -> bool,
) -> Option<Handle> {
    let range_sq = max_range * max_range;
    let mut best: Option<(Handle, f32)> = None;
    for (handle, enemy) in enemies.iter() {
        if !enemy.is_live() || exclude(handle) {
            continue;
        }
        let d = distance_sq(from, enemy.pos());
        if d > range_sq {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((handle, d));
        }
    }
    best.map(|(h, _)| h)
}

/// Uniformly random live entity within `max_range` of `from`
pub fn find_random_enemy<T: Entity>(
    enemies: &Arena<T>,
    from: Vec2,
    max_range: f32,
    rng: &mut impl Rng,
) -> Option<Handle> {
    let candidates = find_enemies_in_radius(enemies, from, max_range);
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

/// All live entities whose centers are within `radius` of `center`
pub fn find_enemies_in_radius<T: Entity>(
    enemies: &Arena<T>,
    center: Vec2,
    radius: f32,
) -> Vec<Handle> {
    let radius_sq = radius * radius;
    enemies
        .iter()
        .filter(|(_, e)| e.is_live() && distance_sq(center, e.pos()) <= radius_sq)
        .map(|(h, _)| h)
        .collect()
}

/// What a projectile or hazard has already damaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitKey {
    Enemy(Handle),
    Object(u32),
}

/// Hit-once record for one projectile/hazard life
#[derive(Debug, Clone, Default)]
pub struct HitSet {
    hits: HashSet<HitKey>,
}

impl HitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit; returns false if `key` was already hit
    #[inline]
    pub fn try_hit(&mut self, key: HitKey) -> bool {
        self.hits.insert(key)
    }

    #[inline]
    pub fn contains(&self, key: HitKey) -> bool {
        self.hits.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Only for re-stamping a pooled instance
    pub(crate) fn reset(&mut self) {
        self.hits.clear();
    }
}
