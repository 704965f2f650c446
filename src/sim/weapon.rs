//! Player weapons, passive upgrades, and level-up offers
//!
//! Weapons are plain data on the player; firing reaches into the world
//! through the same query and damage calls the rest of the simulation uses.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::character::DamageSource;
use super::collision::{
    beam_hits, find_nearest_enemy, find_nearest_enemy_excluding, find_random_enemy,
    polygon_hits,
};
use super::effects::VisualKind;
use super::entity::{Entity, Handle};
use super::geom::{oriented_rect, safe_direction};
use super::hazard::Hazard;
use super::player::Player;
use super::projectile::ProjectileSpawn;
use super::state::{ScheduledAction, SimulationWorld};
use super::status::StatusEffect;

/// Highest level any weapon or passive can reach
pub const MAX_LEVEL: u32 = 8;

const BOLT_RANGE: f32 = 450.0;
const BOLT_SPEED: f32 = 420.0;
const BOLT_SIZE: f32 = 10.0;
const BOLT_LIFETIME: f32 = 1.5;
/// Angle between bolts that share a target
const BOLT_SPREAD: f32 = 0.15;

const WHIP_LENGTH: f32 = 130.0;
const WHIP_WIDTH: f32 = 40.0;

const LANCE_LENGTH: f32 = 260.0;
const LANCE_WIDTH: f32 = 12.0;

const LIGHTNING_RANGE: f32 = 380.0;
const LIGHTNING_CHAIN_RANGE: f32 = 160.0;

const FROST_RADIUS: f32 = 70.0;
const FROST_TICK: f32 = 0.5;

const VOLLEY_RANGE: f32 = 450.0;
const VOLLEY_SPEED: f32 = 360.0;
const VOLLEY_GAP: f32 = 0.2;
const VOLLEY_FAN: f32 = 0.5;

const BUBBLE_RANGE: f32 = 320.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Bolt,
    Whip,
    Lance,
    Lightning,
    FrostAura,
    Barrage,
    Bubble,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 7] = [
        WeaponKind::Bolt,
        WeaponKind::Whip,
        WeaponKind::Lance,
        WeaponKind::Lightning,
        WeaponKind::FrostAura,
        WeaponKind::Barrage,
        WeaponKind::Bubble,
    ];

    /// Seconds between shots before the player's cooldown multiplier
    pub fn base_cooldown(self, level: u32) -> f32 {
        let l = level.saturating_sub(1) as f32;
        let cooldown = match self {
            WeaponKind::Bolt => 1.0 - 0.06 * l,
            WeaponKind::Whip => 1.3 - 0.05 * l,
            WeaponKind::Lance => 1.6 - 0.08 * l,
            WeaponKind::Lightning => 2.2 - 0.12 * l,
            WeaponKind::FrostAura => 3.0,
            WeaponKind::Barrage => 4.0 - 0.2 * l,
            WeaponKind::Bubble => 5.0 - 0.3 * l,
        };
        cooldown.max(0.2)
    }

    /// Damage per hit before the player's might multiplier
    pub fn base_damage(self, level: u32) -> f32 {
        let l = level.saturating_sub(1) as f32;
        match self {
            WeaponKind::Bolt => 10.0 + 3.0 * l,
            WeaponKind::Whip => 15.0 + 5.0 * l,
            WeaponKind::Lance => 12.0 + 4.0 * l,
            WeaponKind::Lightning => 18.0 + 6.0 * l,
            WeaponKind::FrostAura => 3.0 + l,
            WeaponKind::Barrage => 6.0 + 2.0 * l,
            WeaponKind::Bubble => 10.0 + 4.0 * l,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub level: u32,
    pub cooldown_timer: f32,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            level: 1,
            cooldown_timer: kind.base_cooldown(1) * 0.5,
        }
    }

    /// Count down; true when the weapon fires this frame
    pub fn ready(&mut self, dt: f32, cooldown_mult: f32) -> bool {
        self.cooldown_timer -= dt;
        if self.cooldown_timer > 0.0 {
            return false;
        }
        self.cooldown_timer = self.kind.base_cooldown(self.level) * cooldown_mult.max(0.1);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassiveKind {
    Might,
    Area,
    Haste,
    Vitality,
    Swiftness,
    Armor,
    Recovery,
    Attraction,
}

impl PassiveKind {
    pub const ALL: [PassiveKind; 8] = [
        PassiveKind::Might,
        PassiveKind::Area,
        PassiveKind::Haste,
        PassiveKind::Vitality,
        PassiveKind::Swiftness,
        PassiveKind::Armor,
        PassiveKind::Recovery,
        PassiveKind::Attraction,
    ];
}

/// A level-up offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    Weapon(WeaponKind),
    Passive(PassiveKind),
}

/// Up to `n` distinct offers among everything not yet at max level
pub fn upgrade_choices(player: &Player, n: usize, rng: &mut impl Rng) -> Vec<Upgrade> {
    let mut offers: Vec<Upgrade> = WeaponKind::ALL
        .iter()
        .filter(|k| player.weapon_level(**k) < MAX_LEVEL)
        .map(|k| Upgrade::Weapon(*k))
        .chain(
            PassiveKind::ALL
                .iter()
                .filter(|k| player.passive_level(**k) < MAX_LEVEL)
                .map(|k| Upgrade::Passive(*k)),
        )
        .collect();
    offers.shuffle(rng);
    offers.truncate(n);
    offers
}

/// Add or level a weapon/passive; false if already at max level
pub fn apply_upgrade(player: &mut Player, upgrade: Upgrade) -> bool {
    match upgrade {
        Upgrade::Weapon(kind) => {
            match player.weapons.iter_mut().find(|w| w.kind == kind) {
                Some(w) if w.level >= MAX_LEVEL => return false,
                Some(w) => w.level += 1,
                None => player.weapons.push(Weapon::new(kind)),
            }
            log::debug!("weapon {kind:?} now level {}", player.weapon_level(kind));
            true
        }
        Upgrade::Passive(kind) => {
            match player.passives.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, level)) if *level >= MAX_LEVEL => return false,
                Some((_, level)) => *level += 1,
                None => player.passives.push((kind, 1)),
            }
            let stats = &mut player.character.stats;
            match kind {
                PassiveKind::Might => stats.might += 0.1,
                PassiveKind::Area => stats.area += 0.1,
                PassiveKind::Haste => stats.cooldown *= 0.92,
                PassiveKind::Vitality => player.character.grow_max_health(20.0),
                PassiveKind::Swiftness => stats.speed *= 1.08,
                PassiveKind::Armor => stats.armor += 1.0,
                PassiveKind::Recovery => stats.regen += 0.25,
                PassiveKind::Attraction => player.pickup_radius *= 1.2,
            }
            true
        }
    }
}

/// Fire one weapon from the player's position
pub fn fire(world: &mut SimulationWorld, kind: WeaponKind, level: u32) {
    let damage = kind.base_damage(level) * world.player.character.stats.might;
    match kind {
        WeaponKind::Bolt => fire_bolts(world, level, damage),
        WeaponKind::Whip => fire_whip(world, level, damage),
        WeaponKind::Lance => fire_lance(world, level, damage),
        WeaponKind::Lightning => fire_lightning(world, level, damage),
        WeaponKind::FrostAura => fire_frost_aura(world, level, damage),
        WeaponKind::Barrage => schedule_barrage(world, level, damage),
        WeaponKind::Bubble => fire_bubble(world, level, damage),
    }
}

fn enemy_pos(world: &SimulationWorld, handle: Handle) -> Option<Vec2> {
    world
        .enemies
        .get(handle)
        .filter(|e| e.is_live())
        .map(|e| e.pos())
}

fn fire_bolts(world: &mut SimulationWorld, level: u32, damage: f32) {
    let origin = world.player.pos();
    let count = 1 + u32::from(level >= 4) + u32::from(level >= 7);

    let mut targets: Vec<Handle> = Vec::new();
    for _ in 0..count {
        match find_nearest_enemy_excluding(&world.enemies, origin, BOLT_RANGE, |h| {
            targets.contains(&h)
        }) {
            Some(h) => targets.push(h),
            None => break,
        }
    }
    if targets.is_empty() {
        return;
    }

    let size = BOLT_SIZE * world.player.character.stats.area;
    let pierce = (level.saturating_sub(1) / 2) as i32;
    for i in 0..count as usize {
        let target = targets[i % targets.len()];
        let Some(pos) = enemy_pos(world, target) else {
            continue;
        };
        let spread = (i / targets.len()) as f32 * BOLT_SPREAD;
        let dir = Vec2::from_angle(spread).rotate(safe_direction(pos - origin, world.player.facing));
        world.spawn_projectile(ProjectileSpawn {
            pos: origin,
            vel: dir * BOLT_SPEED,
            size,
            damage,
            pierce,
            lifetime: BOLT_LIFETIME,
            effect: None,
            homing: Some(target),
            source: DamageSource::Player,
        });
    }
}

fn fire_whip(world: &mut SimulationWorld, level: u32, damage: f32) {
    let area = world.player.character.stats.area;
    let (length, width) = (WHIP_LENGTH * area, WHIP_WIDTH * area);
    let dir = world.player.facing;
    let center = world.player.pos() + dir * length * 0.5;
    let corners = oriented_rect(center, dir, length, width);

    let stun = (level >= 3).then_some(StatusEffect::Stun {
        duration: 0.4 + 0.05 * level as f32,
    });
    let hits: Vec<Handle> = world
        .enemies
        .iter()
        .filter(|(_, e)| e.is_live() && polygon_hits(e.pos(), &corners))
        .map(|(h, _)| h)
        .collect();
    for h in hits {
        world.damage_enemy(h, damage, DamageSource::Player, stun);
    }

    let objects: Vec<u32> = world
        .world_objects
        .iter()
        .filter(|o| o.is_live() && polygon_hits(o.pos(), &corners))
        .map(|o| o.id)
        .collect();
    for id in objects {
        world.damage_object(id, damage);
    }

    world.spawn_effect(VisualKind::WhipSwing { corners }, center, length, 0.15);
}

fn fire_lance(world: &mut SimulationWorld, level: u32, damage: f32) {
    let origin = world.player.pos();
    let length = LANCE_LENGTH * world.player.character.stats.area;
    let dir = find_nearest_enemy(&world.enemies, origin, length)
        .and_then(|h| enemy_pos(world, h))
        .map_or(world.player.facing, |pos| {
            safe_direction(pos - origin, world.player.facing)
        });
    let end = origin + dir * length;

    let poison = StatusEffect::Poison {
        damage: (2.0 + 0.5 * level as f32) * world.player.character.stats.might,
        duration: 3.0,
        tick_interval: 0.5,
    };
    let hits: Vec<Handle> = world
        .enemies
        .iter()
        .filter(|(_, e)| e.is_live() && beam_hits(e.pos(), e.size(), origin, end, LANCE_WIDTH))
        .map(|(h, _)| h)
        .collect();
    for h in hits {
        world.damage_enemy(h, damage, DamageSource::Player, Some(poison));
    }

    world.spawn_effect(
        VisualKind::LanceLine {
            to: end,
            width: LANCE_WIDTH,
        },
        origin,
        LANCE_WIDTH,
        0.12,
    );
}

fn fire_lightning(world: &mut SimulationWorld, level: u32, damage: f32) {
    let origin = world.player.pos();
    let Some(first) = find_random_enemy(&world.enemies, origin, LIGHTNING_RANGE, &mut world.rng)
    else {
        return;
    };

    let chains = 1 + level / 2;
    let mut struck: Vec<Handle> = Vec::new();
    let mut from = origin;
    let mut current = Some(first);
    while let Some(h) = current {
        let Some(pos) = enemy_pos(world, h) else {
            break;
        };
        struck.push(h);
        world.spawn_effect(VisualKind::LightningArc { to: pos }, from, 4.0, 0.2);
        world.damage_enemy(h, damage, DamageSource::Player, None);
        if struck.len() > chains as usize {
            break;
        }
        from = pos;
        current = find_nearest_enemy_excluding(&world.enemies, pos, LIGHTNING_CHAIN_RANGE, |c| {
            struck.contains(&c)
        });
    }
}

fn fire_frost_aura(world: &mut SimulationWorld, level: u32, damage: f32) {
    let stats = &world.player.character.stats;
    let radius = FROST_RADIUS * stats.area * (1.0 + 0.1 * level.saturating_sub(1) as f32);
    // Lives exactly one cooldown
    let lifetime = WeaponKind::FrostAura.base_cooldown(level) * stats.cooldown.max(0.1);
    let slow = StatusEffect::Slow {
        factor: (0.7 - 0.04 * level as f32).max(0.3),
        duration: FROST_TICK + 0.1,
    };
    let pos = world.player.pos();
    world
        .hazards
        .push(Hazard::zone(pos, radius, damage, FROST_TICK, lifetime, Some(slow)));
}

fn schedule_barrage(world: &mut SimulationWorld, level: u32, damage: f32) {
    let waves = 2 + level / 3;
    let count = 3 + level / 2;
    let burn = StatusEffect::Burn {
        damage: (1.5 + 0.5 * level as f32) * world.player.character.stats.might,
        duration: 2.0,
        tick_interval: 0.5,
    };
    for wave in 0..waves {
        world.schedule(
            wave as f32 * VOLLEY_GAP,
            ScheduledAction::PlayerVolley {
                count,
                damage,
                effect: Some(burn),
            },
        );
    }
}

/// One fan of projectiles toward the nearest enemy (or the facing direction)
pub fn fire_volley(
    world: &mut SimulationWorld,
    count: u32,
    damage: f32,
    effect: Option<StatusEffect>,
) {
    if !world.player.is_live() || count == 0 {
        return;
    }
    let origin = world.player.pos();
    let aim = find_nearest_enemy(&world.enemies, origin, VOLLEY_RANGE)
        .and_then(|h| enemy_pos(world, h))
        .map_or(world.player.facing, |pos| {
            safe_direction(pos - origin, world.player.facing)
        });
    let (start, step) = if count > 1 {
        (-VOLLEY_FAN * 0.5, VOLLEY_FAN / (count - 1) as f32)
    } else {
        (0.0, 0.0)
    };
    let size = BOLT_SIZE * world.player.character.stats.area;
    for i in 0..count {
        let angle = start + step * i as f32;
        let dir = Vec2::from_angle(angle).rotate(aim);
        world.spawn_projectile(ProjectileSpawn {
            pos: origin,
            vel: dir * VOLLEY_SPEED,
            size,
            damage,
            pierce: 0,
            lifetime: 1.2,
            effect,
            homing: None,
            source: DamageSource::Player,
        });
    }
}

fn fire_bubble(world: &mut SimulationWorld, level: u32, damage: f32) {
    let origin = world.player.pos();
    let enemies = &world.enemies;
    let Some(target) = find_nearest_enemy_excluding(enemies, origin, BUBBLE_RANGE, |h| {
        enemies
            .get(h)
            .is_some_and(|e| e.trapped_by.is_some() || e.is_boss())
    }) else {
        return;
    };
    let duration = 1.5 + 0.25 * level as f32;
    if !world.apply_enemy_effect(target, StatusEffect::Freeze { duration }, DamageSource::Player) {
        return;
    }
    let Some((pos, size)) = world.enemies.get(target).map(|e| (e.pos(), e.size())) else {
        return;
    };
    let id = world.spawn_effect(
        VisualKind::Bubble {
            enemy: target,
            burst_damage: damage,
        },
        pos,
        size * 1.6,
        duration,
    );
    if let Some(enemy) = world.enemies.get_mut(target) {
        enemy.trapped_by = Some(id);
    }
}

/// Evenly spaced ring of enemy shots, rotated by `phase`
pub fn ring_directions(count: u32, phase: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| Vec2::from_angle(phase + TAU * i as f32 / count as f32))
        .collect()
}
