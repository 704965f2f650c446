//! Enemy archetypes and per-frame enemy logic

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::behavior::{Behavior, EnemyCommand, Movement, TargetView};
use super::character::{Character, Stats};
use super::collision::circles_overlap;
use super::entity::{Entity, EntityBase, Handle};
use super::geom::{FALLBACK_DIR, safe_direction};
use crate::config::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Zombie,
    Bat,
    Brute,
    Spitter,
    Stalker,
    Eye,
    Slime,
    Slimelet,
    Bomber,
    Boss,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 10] = [
        EnemyKind::Zombie,
        EnemyKind::Bat,
        EnemyKind::Brute,
        EnemyKind::Spitter,
        EnemyKind::Stalker,
        EnemyKind::Eye,
        EnemyKind::Slime,
        EnemyKind::Slimelet,
        EnemyKind::Bomber,
        EnemyKind::Boss,
    ];
}

/// Explosion on death with linear falloff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub radius: f32,
    pub damage: f32,
}

/// Children spawned on death
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub kind: EnemyKind,
    pub count: u32,
}

/// Static description of an enemy archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyType {
    pub kind: EnemyKind,
    pub health_mult: f32,
    pub speed_mult: f32,
    pub damage_mult: f32,
    pub size: f32,
    pub xp_value: f32,
    pub armor: f32,
    pub can_dash: bool,
    pub is_ranged: bool,
    pub can_shoot_beam: bool,
    pub attack_range: f32,
    pub min_range: f32,
    pub split: Option<Split>,
    pub explosion: Option<Explosion>,
    pub slow_resistance: f32,
    pub slow_immunity: bool,
}

impl EnemyType {
    /// Chase-only baseline every archetype is derived from
    fn basic(kind: EnemyKind) -> Self {
        Self {
            kind,
            health_mult: 1.0,
            speed_mult: 1.0,
            damage_mult: 1.0,
            size: 20.0,
            xp_value: 1.0,
            armor: 0.0,
            can_dash: false,
            is_ranged: false,
            can_shoot_beam: false,
            attack_range: 0.0,
            min_range: 0.0,
            split: None,
            explosion: None,
            slow_resistance: 0.0,
            slow_immunity: false,
        }
    }

    pub fn of(kind: EnemyKind) -> Self {
        let basic = Self::basic(kind);
        match kind {
            EnemyKind::Zombie => basic,
            EnemyKind::Bat => Self {
                health_mult: 0.6,
                speed_mult: 1.8,
                damage_mult: 0.7,
                size: 14.0,
                ..basic
            },
            EnemyKind::Brute => Self {
                health_mult: 4.0,
                speed_mult: 0.6,
                damage_mult: 2.0,
                size: 34.0,
                xp_value: 3.0,
                armor: 2.0,
                slow_resistance: 0.5,
                ..basic
            },
            EnemyKind::Spitter => Self {
                health_mult: 0.8,
                speed_mult: 0.9,
                xp_value: 2.0,
                is_ranged: true,
                attack_range: 300.0,
                min_range: 120.0,
                ..basic
            },
            EnemyKind::Stalker => Self {
                health_mult: 1.5,
                speed_mult: 1.2,
                damage_mult: 1.2,
                size: 22.0,
                xp_value: 3.0,
                can_dash: true,
                ..basic
            },
            EnemyKind::Eye => Self {
                health_mult: 2.0,
                speed_mult: 0.7,
                size: 26.0,
                xp_value: 4.0,
                can_shoot_beam: true,
                ..basic
            },
            EnemyKind::Slime => Self {
                health_mult: 2.0,
                speed_mult: 0.8,
                size: 28.0,
                xp_value: 2.0,
                split: Some(Split {
                    kind: EnemyKind::Slimelet,
                    count: 3,
                }),
                ..basic
            },
            EnemyKind::Slimelet => Self {
                health_mult: 0.4,
                speed_mult: 1.3,
                damage_mult: 0.5,
                size: 12.0,
                xp_value: 0.5,
                ..basic
            },
            EnemyKind::Bomber => Self {
                health_mult: 0.8,
                speed_mult: 1.4,
                size: 18.0,
                xp_value: 2.0,
                explosion: Some(Explosion {
                    radius: 80.0,
                    damage: 25.0,
                }),
                ..basic
            },
            EnemyKind::Boss => Self {
                health_mult: 60.0,
                speed_mult: 0.8,
                damage_mult: 3.0,
                size: 64.0,
                xp_value: 50.0,
                armor: 4.0,
                can_shoot_beam: true,
                slow_immunity: true,
                ..basic
            },
        }
    }

    /// Character stats for this archetype; `health_scale` grows with run time
    pub fn stats(&self, tuning: &Tuning, health_scale: f32) -> Stats {
        Stats {
            max_health: (tuning.enemy_base_health * self.health_mult * health_scale).max(1.0),
            speed: tuning.enemy_base_speed * self.speed_mult,
            damage: tuning.enemy_base_damage * self.damage_mult,
            armor: self.armor,
            attack_interval: tuning.enemy_attack_interval,
            slow_resistance: self.slow_resistance,
            slow_immunity: self.slow_immunity,
            ..Stats::default()
        }
    }
}

/// What an enemy is hunting; re-resolved through the world every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    Player,
    Enemy(Handle),
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub character: Character,
    pub ty: EnemyType,
    pub target: Option<TargetRef>,
    pub attack_cooldown: f32,
    /// Bubble visual holding this enemy, if any
    pub trapped_by: Option<u32>,
    behavior: Behavior,
    barrage_timer: f32,
}

impl Enemy {
    pub fn spawn(kind: EnemyKind, pos: Vec2, tuning: &Tuning, health_scale: f32) -> Self {
        let ty = EnemyType::of(kind);
        let stats = ty.stats(tuning, health_scale);
        Self {
            character: Character::new(pos, ty.size, stats, tuning.enemy_invincibility),
            behavior: Behavior::for_type(&ty, tuning),
            ty,
            target: Some(TargetRef::Player),
            attack_cooldown: 0.0,
            trapped_by: None,
            barrage_timer: tuning.barrage_interval,
        }
    }

    #[inline]
    pub fn kind(&self) -> EnemyKind {
        self.ty.kind
    }

    #[inline]
    pub fn is_boss(&self) -> bool {
        self.ty.kind == EnemyKind::Boss
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// One frame of AI: cooldowns, behavior, chase, and contact attacks
    ///
    /// A `None` target (missing or dead) leaves the enemy idle.
    pub fn update(
        &mut self,
        dt: f32,
        target: Option<TargetView>,
        tuning: &Tuning,
        rng: &mut impl Rng,
        out: &mut Vec<EnemyCommand>,
    ) {
        if !self.character.base.is_live() {
            return;
        }
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);
        self.behavior.tick_cooldowns(dt);

        if self.character.is_disabled() {
            return;
        }
        let Some(target) = target else {
            return;
        };

        if self.is_boss() {
            self.barrage_timer -= dt;
            if self.barrage_timer <= 0.0 {
                out.push(EnemyCommand::Barrage);
                self.barrage_timer = tuning.barrage_interval;
            }
        }

        let movement =
            self.behavior
                .update(&mut self.character, &self.ty, target, tuning, dt, rng, out);
        if movement == Movement::Chase {
            let dir = safe_direction(target.pos - self.character.base.pos, FALLBACK_DIR);
            let step = self.character.current_speed() * dt;
            self.character.base.translate(dir * step);
        }

        if self.attack_cooldown <= 0.0
            && circles_overlap(
                self.character.base.pos,
                self.character.base.size,
                target.pos,
                target.size,
            )
        {
            out.push(EnemyCommand::Contact {
                damage: self.character.stats.damage,
            });
            self.attack_cooldown = self.character.stats.attack_interval;
        }
    }
}

impl Entity for Enemy {
    fn base(&self) -> &EntityBase {
        &self.character.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.character.base
    }
}
