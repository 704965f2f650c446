//! Frame pipeline
//!
//! One call to [`tick`] advances the world by one (clamped) frame delta:
//! scheduled events, spawner, player, enemies, projectiles, hazards,
//! pickups, floating numbers, visual effects, and finally the garbage sweep.

use std::f32::consts::TAU;

use rand::Rng;
use rand::seq::IndexedRandom;

use super::behavior::EnemyCommand;
use super::character::{DamageOutcome, DamageSource};
use super::collision::{HitKey, circles_overlap};
use super::effects::{NumberKind, VisualKind};
use super::enemy::EnemyKind;
use super::entity::{Entity, Handle};
use super::pickup::{PickupKind, WorldObject};
use super::player::MoveInput;
use super::pool::{sweep, sweep_pooled};
use super::projectile::ProjectileSpawn;
use super::spawner::{Spawner, SpawnerAction};
use super::state::{ScheduledAction, SimEvent, SimPhase, SimulationWorld};
use super::weapon::{self, ring_directions};
use crate::angle_to_dir;
use crate::consts::*;

/// Input snapshot for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    pub fn movement(&self) -> MoveInput {
        MoveInput {
            up: self.up,
            down: self.down,
            left: self.left,
            right: self.right,
        }
    }
}

/// Non-finite or negative deltas become 0; large ones are capped at `max`
pub fn clamp_dt(raw: f32, max: f32) -> f32 {
    if raw.is_finite() && raw > 0.0 {
        raw.min(max)
    } else {
        0.0
    }
}

/// Advance the world by one frame; returns the delta actually simulated
pub fn tick(world: &mut SimulationWorld, input: &TickInput, raw_dt: f32) -> f32 {
    // Handle pause toggle
    if input.pause {
        match world.phase {
            SimPhase::Running => {
                world.phase = SimPhase::Paused;
                return 0.0;
            }
            SimPhase::Paused => world.phase = SimPhase::Running,
            SimPhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if world.phase != SimPhase::Running {
        return 0.0;
    }

    let dt = clamp_dt(raw_dt, world.tuning.max_frame_dt);
    world.time += dt;
    world.frame += 1;

    run_scheduled(world);
    run_spawner(world, dt);
    update_player(world, input, dt);
    update_enemies(world, dt);
    update_projectiles(world, dt);
    update_enemy_projectiles(world, dt);
    update_hazards(world, dt);
    update_pickups(world, dt);
    for n in world.damage_numbers.iter_mut() {
        n.update(dt);
    }
    update_effects(world, dt);
    sweep_garbage(world);

    dt
}

fn run_scheduled(world: &mut SimulationWorld) {
    let now = world.time;
    let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut world.scheduled)
        .into_iter()
        .partition(|e| e.fire_at <= now);
    world.scheduled = pending;
    due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));

    for event in due {
        match event.action {
            ScheduledAction::PlayerVolley {
                count,
                damage,
                effect,
            } => weapon::fire_volley(world, count, damage, effect),
            ScheduledAction::RingVolley {
                boss,
                count,
                damage,
                phase,
            } => ring_volley(world, boss, count, damage, phase),
            ScheduledAction::SpawnBoss => spawn_boss(world),
        }
    }
}

/// Ring of enemy shots around the boss; a dead boss cancels the volley
fn ring_volley(world: &mut SimulationWorld, boss: Handle, count: u32, damage: f32, phase: f32) {
    let Some(origin) = world
        .enemies
        .get(boss)
        .filter(|e| e.is_live())
        .map(|e| e.pos())
    else {
        return;
    };
    let speed = world.tuning.enemy_projectile_speed;
    for dir in ring_directions(count, phase) {
        world.spawn_enemy_projectile(ProjectileSpawn {
            pos: origin,
            vel: dir * speed,
            size: ENEMY_PROJECTILE_SIZE,
            damage,
            pierce: 0,
            lifetime: ENEMY_PROJECTILE_LIFETIME,
            effect: None,
            homing: None,
            source: DamageSource::Enemy(boss),
        });
    }
}

fn spawn_boss(world: &mut SimulationWorld) {
    let distance = world.tuning.spawn_distance * 0.8;
    let pos = ring_position(world, distance);
    world.spawn_enemy(EnemyKind::Boss, pos);
    world.push_event(SimEvent::BossSpawned);
    log::info!("boss spawned at {:.1}s", world.time);
}

/// Random point on a circle of `distance` around the player
fn ring_position(world: &mut SimulationWorld, distance: f32) -> glam::Vec2 {
    let angle = world.rng.random_range(0.0..TAU);
    world.player.pos() + angle_to_dir(angle) * distance
}

fn run_spawner(world: &mut SimulationWorld, dt: f32) {
    let live = world.enemies.values().filter(|e| e.is_live()).count();
    let actions = world
        .spawner
        .update(dt, world.time, live, &world.tuning);

    for action in actions {
        match action {
            SpawnerAction::SpawnEnemies { count } => {
                let kinds = Spawner::unlocked_kinds(world.time);
                let distance = world.tuning.spawn_distance;
                for _ in 0..count {
                    let kind = kinds
                        .choose(&mut world.rng)
                        .copied()
                        .unwrap_or(EnemyKind::Zombie);
                    let pos = ring_position(world, distance);
                    world.spawn_enemy(kind, pos);
                }
            }
            SpawnerAction::BossWarning => {
                log::info!("boss incoming at {:.1}s", world.time);
                world.push_event(SimEvent::BossWarning);
                let delay = world.tuning.boss_warning_time;
                world.schedule(delay, ScheduledAction::SpawnBoss);
            }
            SpawnerAction::SpawnObject => {
                let distance = world.rng.random_range(150.0..350.0);
                let pos = ring_position(world, distance);
                let id = world.next_id();
                world.world_objects.push(WorldObject::brazier(id, pos));
            }
        }
    }
}

fn update_player(world: &mut SimulationWorld, input: &TickInput, dt: f32) {
    if !world.player.is_live() {
        return;
    }

    let dots = world.player.character.tick(dt);
    for dot in dots {
        if dot.outcome.dealt() > 0.0 {
            let pos = world.player.pos();
            world.spawn_number(pos, dot.outcome.dealt(), NumberKind::Damage);
        }
        if dot.outcome.died() {
            world.on_player_death();
            return;
        }
    }

    world.player.character.regenerate(dt);
    world.player.magnet_time = (world.player.magnet_time - dt).max(0.0);
    world.player.move_with(input.movement(), dt);

    let cooldown = world.player.character.stats.cooldown;
    for i in 0..world.player.weapons.len() {
        let w = &mut world.player.weapons[i];
        if w.ready(dt, cooldown) {
            let (kind, level) = (w.kind, w.level);
            weapon::fire(world, kind, level);
        }
    }
}

fn update_enemies(world: &mut SimulationWorld, dt: f32) {
    let mut commands: Vec<(Handle, EnemyCommand)> = Vec::new();
    let mut out = Vec::new();

    for handle in world.enemies.handles() {
        let Some(enemy) = world.enemies.get_mut(handle) else {
            continue;
        };
        if !enemy.is_live() {
            continue;
        }

        // Periodic damage goes through the regular damage pipeline
        let dots = enemy.character.tick(dt);
        let pos = enemy.pos();
        for dot in dots {
            world.report_damage(handle, pos, dot.outcome, dot.source);
        }

        let Some(target) = world
            .enemies
            .get(handle)
            .filter(|e| e.is_live())
            .map(|e| e.target)
        else {
            continue;
        };
        let view = world.resolve_target(target);
        let Some(enemy) = world.enemies.get_mut(handle) else {
            continue;
        };
        enemy.update(dt, view, &world.tuning, &mut world.rng, &mut out);
        commands.extend(out.drain(..).map(|c| (handle, c)));
    }

    for (handle, command) in commands {
        apply_enemy_command(world, handle, command);
    }
}

fn apply_enemy_command(world: &mut SimulationWorld, handle: Handle, command: EnemyCommand) {
    let Some(damage_stat) = world
        .enemies
        .get(handle)
        .filter(|e| e.is_live())
        .map(|e| e.character.stats.damage)
    else {
        return;
    };
    let source = DamageSource::Enemy(handle);

    match command {
        EnemyCommand::Contact { damage } | EnemyCommand::DashHit { damage } => {
            world.damage_player(damage, source);
        }
        EnemyCommand::Beam {
            damage,
            invincibility,
        } => {
            let outcome = world.damage_player(damage, source);
            if outcome != DamageOutcome::Ignored {
                let c = &mut world.player.character;
                c.invincible_time = c.invincible_time.max(invincibility);
            }
        }
        EnemyCommand::Fire {
            origin,
            dir,
            speed,
            damage,
        } => world.spawn_enemy_projectile(ProjectileSpawn {
            pos: origin,
            vel: dir * speed,
            size: ENEMY_PROJECTILE_SIZE,
            damage,
            pierce: 0,
            lifetime: ENEMY_PROJECTILE_LIFETIME,
            effect: None,
            homing: None,
            source,
        }),
        EnemyCommand::Barrage => {
            let count = BARRAGE_PROJECTILES;
            for wave in 0..BARRAGE_WAVES {
                // Alternate waves are offset by half a gap
                let phase = wave as f32 * 0.5 * TAU / count as f32;
                world.schedule(
                    wave as f32 * BARRAGE_WAVE_GAP,
                    ScheduledAction::RingVolley {
                        boss: handle,
                        count,
                        damage: damage_stat * 0.5,
                        phase,
                    },
                );
            }
        }
    }
}

fn update_projectiles(world: &mut SimulationWorld, dt: f32) {
    let mut projectiles = std::mem::take(&mut world.projectiles);

    for p in projectiles.iter_mut() {
        if !p.is_live() {
            continue;
        }
        if let Some(target) = p.homing {
            match world.enemies.get(target).filter(|e| e.is_live()) {
                Some(enemy) => p.steer_toward(enemy.pos(), dt),
                None => p.homing = None,
            }
        }
        p.update(dt);
        if !p.is_live() {
            continue;
        }

        let touching: Vec<Handle> = world
            .enemies
            .iter()
            .filter(|(_, e)| e.is_live() && circles_overlap(p.pos(), p.size(), e.pos(), e.size()))
            .map(|(h, _)| h)
            .collect();
        for h in touching {
            if !p.is_live() {
                break;
            }
            if p.register_hit(HitKey::Enemy(h)) {
                world.damage_enemy(h, p.damage, p.source, p.effect);
            }
        }

        let objects: Vec<u32> = world
            .world_objects
            .iter()
            .filter(|o| o.is_live() && circles_overlap(p.pos(), p.size(), o.pos(), o.size()))
            .map(|o| o.id)
            .collect();
        for id in objects {
            if !p.is_live() {
                break;
            }
            if p.register_hit(HitKey::Object(id)) {
                world.damage_object(id, p.damage);
            }
        }
    }

    // Anything fired while we held the list goes after the survivors
    projectiles.append(&mut world.projectiles);
    world.projectiles = projectiles;
}

fn update_enemy_projectiles(world: &mut SimulationWorld, dt: f32) {
    let mut shots = std::mem::take(&mut world.enemy_projectiles);

    for p in shots.iter_mut() {
        p.update(dt);
        if !p.is_live() {
            continue;
        }
        let Some(player) = world.player.target_view() else {
            continue;
        };
        if circles_overlap(p.pos(), p.size(), player.pos, player.size) {
            world.damage_player(p.damage, p.source);
            p.kill();
        }
    }

    shots.append(&mut world.enemy_projectiles);
    world.enemy_projectiles = shots;
}

fn update_hazards(world: &mut SimulationWorld, dt: f32) {
    let player_pos = world.player.pos();
    let mut hazards = std::mem::take(&mut world.hazards);

    for hazard in hazards.iter_mut() {
        if hazard.follows_player() {
            hazard.base.pos = player_pos;
        }
        for h in hazard.collect_targets(dt, &world.enemies) {
            world.damage_enemy(h, hazard.damage, hazard.source, hazard.effect);
        }
    }

    // Bubble bursts during this pass add shockwaves for next frame
    hazards.append(&mut world.hazards);
    world.hazards = hazards;
}

fn update_pickups(world: &mut SimulationWorld, dt: f32) {
    let Some(player) = world.player.target_view() else {
        return;
    };
    let radius = world.player.pickup_radius;
    let magnet = world.player.magnet_time > 0.0;

    let collected: Vec<PickupKind> = world
        .pickups
        .iter_mut()
        .filter_map(|p| {
            p.update(dt, player.pos, player.size, radius, magnet)
                .then_some(p.kind)
        })
        .collect();

    for kind in collected {
        match kind {
            PickupKind::Xp { value } => world.grant_xp(value),
            PickupKind::Heal { amount } => {
                world.heal_player(amount);
            }
            PickupKind::Magnet => world.player.magnet_time = MAGNET_DURATION,
        }
    }
}

fn update_effects(world: &mut SimulationWorld, dt: f32) {
    let mut released: Vec<(Handle, u32)> = Vec::new();

    for fx in world.effects.iter_mut() {
        if let VisualKind::Bubble { enemy, .. } = fx.kind {
            // Bubbles ride along with their captive
            match world.enemies.get(enemy).filter(|e| e.is_live()) {
                Some(e) => fx.base.pos = e.pos(),
                None => fx.kill(),
            }
        }
        fx.update(dt);
        if let (true, VisualKind::Bubble { enemy, .. }) = (fx.is_garbage(), fx.kind) {
            released.push((enemy, fx.id));
        }
    }

    for (handle, id) in released {
        if let Some(enemy) = world.enemies.get_mut(handle) {
            if enemy.trapped_by == Some(id) {
                enemy.trapped_by = None;
            }
        }
    }
}

/// Pooled kinds go back to their pools, the rest are dropped; enemy slots are freed
fn sweep_garbage(world: &mut SimulationWorld) {
    sweep_pooled(&mut world.projectiles, &mut world.projectile_pool);
    sweep_pooled(&mut world.enemy_projectiles, &mut world.projectile_pool);
    sweep_pooled(&mut world.damage_numbers, &mut world.number_pool);
    sweep(&mut world.pickups);
    sweep(&mut world.world_objects);
    sweep(&mut world.effects);
    sweep(&mut world.hazards);
    let removed = world.enemies.retain(|e| !e.is_garbage());
    if removed > 0 {
        log::trace!("swept {removed} enemies");
    }
}
