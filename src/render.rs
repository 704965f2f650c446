//! Drawing boundary
//!
//! The simulation never talks to a GPU. A host implements [`Surface`]
//! (world coordinates in, pixels out; camera mapping is the surface's job)
//! and calls [`draw_world`] once per frame. Each entity draws in isolation:
//! one failure is logged and the pass moves on.

use glam::Vec2;

use crate::error::DrawError;
use crate::sim::behavior::{BeamPhase, Behavior};
use crate::sim::character::DamageSource;
use crate::sim::effects::{DamageNumber, NumberKind, TimedEffect, VisualKind};
use crate::sim::enemy::Enemy;
use crate::sim::entity::Entity;
use crate::sim::hazard::{Hazard, HazardKind};
use crate::sim::pickup::{Pickup, PickupKind, WorldObject};
use crate::sim::player::Player;
use crate::sim::projectile::Projectile;
use crate::sim::state::SimulationWorld;

/// Linear RGBA
pub type Color = [f32; 4];

const PLAYER_COLOR: Color = [0.3, 0.7, 1.0, 1.0];
const PLAYER_HURT_COLOR: Color = [1.0, 1.0, 1.0, 1.0];
const ENEMY_COLOR: Color = [0.8, 0.25, 0.25, 1.0];
const BOSS_COLOR: Color = [0.6, 0.1, 0.7, 1.0];
const HEALTH_BAR_BG: Color = [0.1, 0.1, 0.1, 0.8];
const HEALTH_BAR_FG: Color = [0.2, 0.9, 0.3, 1.0];
const PLAYER_SHOT_COLOR: Color = [1.0, 0.95, 0.5, 1.0];
const ENEMY_SHOT_COLOR: Color = [1.0, 0.4, 0.8, 1.0];
const XP_COLOR: Color = [0.3, 0.9, 1.0, 1.0];
const HEAL_COLOR: Color = [0.3, 1.0, 0.4, 1.0];
const MAGNET_COLOR: Color = [1.0, 0.3, 0.3, 1.0];
const BRAZIER_COLOR: Color = [1.0, 0.6, 0.1, 1.0];
const BEAM_WARNING_COLOR: Color = [1.0, 0.2, 0.2, 0.35];
const BEAM_FIRING_COLOR: Color = [1.0, 0.9, 0.9, 0.95];

/// Primitive drawing operations in world coordinates
pub trait Surface {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) -> Result<(), DrawError>;
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color)
    -> Result<(), DrawError>;
    fn fill_polygon(&mut self, points: &[Vec2], color: Color) -> Result<(), DrawError>;
    fn text(&mut self, pos: Vec2, text: &str, size: f32, color: Color) -> Result<(), DrawError>;
}

/// Something that knows how to put itself on a [`Surface`]
pub trait Draw {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError>;
}

/// Outcome of one [`draw_world`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub drawn: usize,
    pub failed: usize,
}

fn finite(what: &'static str, points: &[Vec2]) -> Result<(), DrawError> {
    if points.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(DrawError::NonFinite { what })
    }
}

fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Draw every live entity, back to front
pub fn draw_world(world: &SimulationWorld, surface: &mut dyn Surface) -> DrawStats {
    let mut stats = DrawStats::default();

    draw_all(world.hazards.iter(), "hazard", surface, &mut stats);
    draw_all(world.pickups.iter(), "pickup", surface, &mut stats);
    draw_all(world.world_objects.iter(), "world object", surface, &mut stats);
    draw_all(world.enemies.values(), "enemy", surface, &mut stats);
    draw_all(world.projectiles.iter(), "projectile", surface, &mut stats);
    draw_all(
        world.enemy_projectiles.iter(),
        "enemy projectile",
        surface,
        &mut stats,
    );
    draw_all(std::iter::once(&world.player), "player", surface, &mut stats);
    draw_all(world.effects.iter(), "effect", surface, &mut stats);
    draw_all(world.damage_numbers.iter(), "damage number", surface, &mut stats);

    stats
}

fn draw_all<'a, T: Draw + Entity + 'a>(
    items: impl Iterator<Item = &'a T>,
    what: &str,
    surface: &mut dyn Surface,
    stats: &mut DrawStats,
) {
    for item in items.filter(|item| item.is_live()) {
        match item.draw(surface) {
            Ok(()) => stats.drawn += 1,
            Err(e) => {
                stats.failed += 1;
                log::warn!("failed to draw {} at {:?}: {}", what, item.pos(), e);
            }
        }
    }
}

impl Draw for Player {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        let pos = self.pos();
        finite("player", &[pos, self.facing])?;
        // Flash while invincible
        let color = if self.character.is_invincible() {
            PLAYER_HURT_COLOR
        } else {
            PLAYER_COLOR
        };
        let radius = self.character.base.radius();
        surface.fill_circle(pos, radius, color)?;
        surface.stroke_line(pos, pos + self.facing * radius * 1.4, 2.0, color)
    }
}

impl Draw for Enemy {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        let pos = self.pos();
        finite("enemy", &[pos])?;

        if let Behavior::Beam(beam) = self.behavior() {
            match beam.phase {
                BeamPhase::Warning => {
                    surface.stroke_line(beam.origin, beam.end, 2.0, BEAM_WARNING_COLOR)?
                }
                // Same width the hit test uses
                BeamPhase::Firing => {
                    surface.stroke_line(beam.origin, beam.end, beam.width, BEAM_FIRING_COLOR)?
                }
                BeamPhase::Idle => {}
            }
        }

        let color = if self.is_boss() { BOSS_COLOR } else { ENEMY_COLOR };
        let radius = self.character.base.radius();
        surface.fill_circle(pos, radius, color)?;

        let fraction = self.character.health_fraction();
        if fraction < 1.0 {
            let left = pos + Vec2::new(-radius, -radius - 6.0);
            let right = left + Vec2::X * radius * 2.0;
            surface.stroke_line(left, right, 3.0, HEALTH_BAR_BG)?;
            surface.stroke_line(left, left.lerp(right, fraction), 3.0, HEALTH_BAR_FG)?;
        }
        Ok(())
    }
}

impl Draw for Projectile {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        finite("projectile", &[self.pos(), self.vel])?;
        let color = match self.source {
            DamageSource::Player => PLAYER_SHOT_COLOR,
            _ => ENEMY_SHOT_COLOR,
        };
        surface.fill_circle(self.pos(), self.base.radius(), color)
    }
}

impl Draw for Pickup {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        finite("pickup", &[self.pos()])?;
        let color = match self.kind {
            PickupKind::Xp { .. } => XP_COLOR,
            PickupKind::Heal { .. } => HEAL_COLOR,
            PickupKind::Magnet => MAGNET_COLOR,
        };
        surface.fill_circle(self.pos(), self.base.radius(), color)
    }
}

impl Draw for WorldObject {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        let pos = self.pos();
        finite("world object", &[pos])?;
        let r = self.base.radius();
        let body = [
            pos + Vec2::new(-r, r),
            pos + Vec2::new(r, r),
            pos + Vec2::new(r * 0.6, -r * 0.4),
            pos + Vec2::new(-r * 0.6, -r * 0.4),
        ];
        surface.fill_polygon(&body, BRAZIER_COLOR)?;
        surface.fill_circle(pos + Vec2::new(0.0, -r * 0.6), r * 0.4, HEAL_COLOR)
    }
}

impl Draw for Hazard {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        finite("hazard", &[self.pos()])?;
        let color = match self.kind {
            HazardKind::Zone { .. } => [0.5, 0.8, 1.0, 0.2],
            HazardKind::Shockwave { .. } => [1.0, 1.0, 1.0, 0.4],
        };
        surface.fill_circle(self.pos(), self.base.radius(), color)
    }
}

impl Draw for TimedEffect {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        let pos = self.pos();
        finite("effect", &[pos])?;
        let t = self.progress();
        let fade = 1.0 - t;

        match self.kind {
            VisualKind::Explosion { radius } => {
                surface.fill_circle(pos, radius * t.max(0.2), with_alpha([1.0, 0.5, 0.1, 0.8], fade))
            }
            VisualKind::LightningArc { to } => {
                finite("lightning", &[to])?;
                surface.stroke_line(pos, to, 3.0, with_alpha([0.7, 0.8, 1.0, 1.0], fade))
            }
            VisualKind::WhipSwing { corners } => {
                finite("whip", &corners)?;
                surface.fill_polygon(&corners, with_alpha([1.0, 1.0, 1.0, 0.6], fade))
            }
            VisualKind::LanceLine { to, width } => {
                finite("lance", &[to])?;
                surface.stroke_line(pos, to, width, with_alpha([1.0, 0.9, 0.6, 0.9], fade))
            }
            VisualKind::Bubble { .. } => {
                surface.fill_circle(pos, self.base.radius(), [0.5, 0.9, 1.0, 0.35])
            }
            VisualKind::Burst { radius } => {
                surface.fill_circle(pos, radius * t, with_alpha([0.8, 0.95, 1.0, 0.7], fade))
            }
            VisualKind::LevelUp => surface.fill_circle(
                pos,
                self.base.radius() * t,
                with_alpha([1.0, 0.85, 0.2, 0.6], fade),
            ),
        }
    }
}

impl Draw for DamageNumber {
    fn draw(&self, surface: &mut dyn Surface) -> Result<(), DrawError> {
        finite("damage number", &[self.pos()])?;
        let color = match self.kind {
            NumberKind::Damage => [1.0, 1.0, 1.0, 1.0],
            NumberKind::Heal => HEAL_COLOR,
        };
        let label = format!("{:.0}", self.value.max(1.0));
        surface.text(self.pos(), &label, self.base.size, with_alpha(color, self.alpha()))
    }
}
