//! Enemy behavior state machines
//!
//! Every enemy owns one [`Behavior`], chosen from its type flags. Behaviors
//! move the enemy directly and report attacks as [`EnemyCommand`]s; the world
//! applies the commands once the enemy is no longer borrowed.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::character::Character;
use super::collision::{beam_hits, circles_overlap};
use super::enemy::EnemyType;
use super::geom::{FALLBACK_DIR, distance, safe_direction};
use crate::config::Tuning;
use crate::consts::*;
use crate::{angle_to_dir, dir_to_angle};

/// Snapshot of the target taken before the enemy updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub pos: Vec2,
    pub size: f32,
    pub invincible: bool,
}

/// Side effects an enemy asks the world to perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyCommand {
    /// Melee touch attack
    Contact { damage: f32 },
    /// Contact damage dealt during a dash
    DashHit { damage: f32 },
    /// Launch an enemy projectile
    Fire {
        origin: Vec2,
        dir: Vec2,
        speed: f32,
        damage: f32,
    },
    /// Beam hit: damage plus target-side invincibility
    Beam { damage: f32, invincibility: f32 },
    /// Boss multi-wave ring volley
    Barrage,
}

/// Whether the shared chase step should run after the behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Chase,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KiteState {
    pub fire_cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashMode {
    Approach,
    Circle,
    Leave,
    Dashing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashState {
    pub mode: DashMode,
    pub cooldown: f32,
    pub dash_timer: f32,
    pub dash_dir: Vec2,
    /// Contact damage already dealt this dash
    pub dash_hit: bool,
    /// +1 counter-clockwise, -1 clockwise
    pub orbit_dir: f32,
    /// Accumulated time moving slower than `STUCK_SPEED`
    pub stuck_time: f32,
    pub last_pos: Option<Vec2>,
    pub forced_approach: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamPhase {
    Idle,
    Warning,
    Firing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamState {
    pub phase: BeamPhase,
    /// Time left in the current warning/firing phase
    pub timer: f32,
    pub cooldown: f32,
    /// Frozen at warning start
    pub origin: Vec2,
    pub end: Vec2,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Chase,
    Kite(KiteState),
    Dash(DashState),
    Beam(BeamState),
}

/// Orbit radius of a dash creature: how far one dash carries it
#[inline]
pub fn safe_distance(base_speed: f32, tuning: &Tuning) -> f32 {
    base_speed * tuning.dash_speed_mult * tuning.dash_duration
}

/// Mode from distance alone; both boundaries fall into `Circle`
pub fn resolve_dash_mode(dist: f32, safe: f32) -> DashMode {
    if dist < LEAVE_FRACTION * safe {
        DashMode::Leave
    } else if dist > APPROACH_FRACTION * safe {
        DashMode::Approach
    } else {
        DashMode::Circle
    }
}

impl Behavior {
    /// Pick the behavior for an enemy type: beam, then dash, then ranged, else chase
    pub fn for_type(ty: &EnemyType, tuning: &Tuning) -> Self {
        if ty.can_shoot_beam {
            Behavior::Beam(BeamState {
                phase: BeamPhase::Idle,
                timer: 0.0,
                cooldown: tuning.beam_cooldown * 0.5,
                origin: Vec2::ZERO,
                end: Vec2::ZERO,
                width: tuning.beam_width,
            })
        } else if ty.can_dash {
            Behavior::Dash(DashState {
                mode: DashMode::Approach,
                cooldown: tuning.dash_cooldown,
                dash_timer: 0.0,
                dash_dir: FALLBACK_DIR,
                dash_hit: false,
                orbit_dir: 1.0,
                stuck_time: 0.0,
                last_pos: None,
                forced_approach: 0.0,
            })
        } else if ty.is_ranged {
            Behavior::Kite(KiteState {
                fire_cooldown: tuning.kite_fire_interval * 0.5,
            })
        } else {
            Behavior::Chase
        }
    }

    /// Cooldowns keep running even while the enemy is stunned or frozen
    pub fn tick_cooldowns(&mut self, dt: f32) {
        match self {
            Behavior::Chase => {}
            Behavior::Kite(k) => k.fire_cooldown = (k.fire_cooldown - dt).max(0.0),
            Behavior::Dash(d) => d.cooldown = (d.cooldown - dt).max(0.0),
            Behavior::Beam(b) => {
                if b.phase == BeamPhase::Idle {
                    b.cooldown = (b.cooldown - dt).max(0.0);
                }
            }
        }
    }

    /// Telegraphing or firing a beam, or mid-dash
    pub fn is_committed(&self) -> bool {
        match self {
            Behavior::Dash(d) => d.mode == DashMode::Dashing,
            Behavior::Beam(b) => b.phase != BeamPhase::Idle,
            _ => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        me: &mut Character,
        ty: &EnemyType,
        target: TargetView,
        tuning: &Tuning,
        dt: f32,
        rng: &mut impl Rng,
        out: &mut Vec<EnemyCommand>,
    ) -> Movement {
        match self {
            Behavior::Chase => Movement::Chase,
            Behavior::Kite(state) => update_kite(state, me, ty, target, tuning, dt, out),
            Behavior::Dash(state) => update_dash(state, me, target, tuning, dt, rng, out),
            Behavior::Beam(state) => update_beam(state, me, ty, target, tuning, dt, out),
        }
    }
}

fn update_kite(
    state: &mut KiteState,
    me: &mut Character,
    ty: &EnemyType,
    target: TargetView,
    tuning: &Tuning,
    dt: f32,
    out: &mut Vec<EnemyCommand>,
) -> Movement {
    let to_target = target.pos - me.base.pos;
    let dist = to_target.length();
    let dir = safe_direction(to_target, FALLBACK_DIR);

    if dist >= ty.min_range && dist <= ty.attack_range && state.fire_cooldown <= 0.0 {
        out.push(EnemyCommand::Fire {
            origin: me.base.pos,
            dir,
            speed: tuning.enemy_projectile_speed,
            damage: me.stats.damage,
        });
        state.fire_cooldown = tuning.kite_fire_interval;
    }

    if dist < ty.min_range {
        // Too close: back off at reduced speed
        me.base
            .translate(-dir * me.current_speed() * KITE_RETREAT_SPEED * dt);
        Movement::Hold
    } else if dist > KITE_CHASE_FRACTION * ty.attack_range {
        Movement::Chase
    } else {
        Movement::Hold
    }
}

fn update_dash(
    state: &mut DashState,
    me: &mut Character,
    target: TargetView,
    tuning: &Tuning,
    dt: f32,
    rng: &mut impl Rng,
    out: &mut Vec<EnemyCommand>,
) -> Movement {
    let safe = safe_distance(me.stats.speed, tuning).max(1.0);

    if state.mode == DashMode::Dashing {
        // Base speed: slows don't shorten the dash below the orbit radius
        let dash_speed = me.stats.speed * tuning.dash_speed_mult;
        me.base.translate(state.dash_dir * dash_speed * dt);
        // An invincible target leaves the hit armed for later in the dash
        if !state.dash_hit
            && !target.invincible
            && circles_overlap(me.base.pos, me.base.size, target.pos, target.size)
        {
            out.push(EnemyCommand::DashHit {
                damage: me.stats.damage * tuning.dash_damage_mult,
            });
            state.dash_hit = true;
        }
        state.dash_timer -= dt;
        if state.dash_timer <= 0.0 {
            state.cooldown = tuning.dash_cooldown;
            let dist = distance(me.base.pos, target.pos);
            state.mode = if dist > APPROACH_FRACTION * safe {
                DashMode::Approach
            } else {
                DashMode::Circle
            };
            state.stuck_time = 0.0;
            state.last_pos = None;
        }
        return Movement::Hold;
    }

    // Anti-stuck watchdog: speed since the previous frame, independent of frame rate
    if dt > 0.0 {
        let speed = state
            .last_pos
            .map_or(f32::MAX, |prev| distance(prev, me.base.pos) / dt);
        state.last_pos = Some(me.base.pos);
        if speed < STUCK_SPEED {
            state.stuck_time += dt;
        } else {
            state.stuck_time = 0.0;
        }
    }

    let to_target = target.pos - me.base.pos;
    let dist = to_target.length();

    let wants_dash = dist > tuning.dash_far_mult * safe
        || (state.mode == DashMode::Circle
            && rng.random::<f32>() < tuning.dash_orbit_chance * dt)
        || state.stuck_time > tuning.stuck_threshold * 0.5;
    if state.cooldown <= 0.0 && wants_dash {
        state.mode = DashMode::Dashing;
        state.dash_dir = safe_direction(to_target, FALLBACK_DIR);
        state.dash_timer = tuning.dash_duration;
        state.dash_hit = false;
        state.stuck_time = 0.0;
        return Movement::Hold;
    }

    if state.stuck_time > tuning.stuck_threshold {
        let nudge = Vec2::new(
            rng.random_range(-STUCK_NUDGE..=STUCK_NUDGE),
            rng.random_range(-STUCK_NUDGE..=STUCK_NUDGE),
        );
        me.base.translate(nudge);
        state.stuck_time = 0.0;
        state.forced_approach = FORCED_APPROACH_TIME;
        log::debug!("dasher unstuck at {:?}", me.base.pos);
    }

    state.forced_approach = (state.forced_approach - dt).max(0.0);
    let mode = if state.forced_approach > 0.0 {
        DashMode::Approach
    } else {
        resolve_dash_mode(dist, safe)
    };
    if mode == DashMode::Circle && state.mode != DashMode::Circle {
        state.orbit_dir = if rng.random::<bool>() { 1.0 } else { -1.0 };
    }
    state.mode = mode;

    let speed = me.current_speed();
    let dir = safe_direction(to_target, FALLBACK_DIR);
    match mode {
        DashMode::Leave => {
            me.base.translate(-dir * speed * dt);
        }
        DashMode::Approach => {
            me.base.translate(dir * speed * dt);
        }
        DashMode::Circle => {
            let rel = me.base.pos - target.pos;
            let radius = rel.length();
            let angle = dir_to_angle(safe_direction(rel, FALLBACK_DIR))
                + state.orbit_dir * (speed / safe) * dt;
            let blend = (ORBIT_BLEND_RATE * dt).min(1.0);
            let next_radius = radius + (safe - radius) * blend;
            let next = target.pos + angle_to_dir(angle) * next_radius;
            if next.is_finite() {
                me.base.pos = next;
            }
        }
        DashMode::Dashing => {}
    }
    Movement::Hold
}

fn update_beam(
    state: &mut BeamState,
    me: &mut Character,
    ty: &EnemyType,
    target: TargetView,
    tuning: &Tuning,
    dt: f32,
    out: &mut Vec<EnemyCommand>,
) -> Movement {
    match state.phase {
        BeamPhase::Idle => {
            let to_target = target.pos - me.base.pos;
            if state.cooldown <= 0.0 && to_target.length() <= tuning.beam_range {
                // Geometry is frozen here and never re-aimed
                let dir = safe_direction(to_target, FALLBACK_DIR);
                state.phase = BeamPhase::Warning;
                state.timer = tuning.beam_warning_time;
                state.origin = me.base.pos;
                state.end = me.base.pos + dir * tuning.beam_length;
                state.width = tuning.beam_width;
                Movement::Hold
            } else {
                Movement::Chase
            }
        }
        BeamPhase::Warning => {
            state.timer -= dt;
            if state.timer <= 0.0 {
                state.phase = BeamPhase::Firing;
                state.timer = tuning.beam_firing_time;
            }
            Movement::Hold
        }
        BeamPhase::Firing => {
            if !target.invincible
                && beam_hits(
                    target.pos,
                    target.size,
                    state.origin,
                    state.end,
                    state.width,
                )
            {
                out.push(EnemyCommand::Beam {
                    damage: tuning.beam_damage * ty.damage_mult,
                    invincibility: tuning.beam_hit_invincibility,
                });
            }
            state.timer -= dt;
            if state.timer <= 0.0 {
                state.phase = BeamPhase::Idle;
                state.cooldown = tuning.beam_cooldown;
            }
            Movement::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::character::{DamageSource, Stats};
    use crate::sim::enemy::EnemyKind;
    use crate::sim::status::StatusEffect;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn body(pos: Vec2, speed: f32) -> Character {
        Character::new(
            pos,
            20.0,
            Stats {
                speed,
                damage: 10.0,
                ..Stats::default()
            },
            0.1,
        )
    }

    fn target_at(pos: Vec2) -> TargetView {
        TargetView {
            pos,
            size: 24.0,
            invincible: false,
        }
    }

    #[test]
    fn test_dash_mode_thresholds() {
        let safe = 150.0;
        assert_eq!(resolve_dash_mode(200.0, safe), DashMode::Circle);
        assert_eq!(resolve_dash_mode(LEAVE_FRACTION * safe, safe), DashMode::Circle);
        assert_eq!(resolve_dash_mode(74.9, safe), DashMode::Leave);
        assert_eq!(
            resolve_dash_mode(APPROACH_FRACTION * safe, safe),
            DashMode::Circle
        );
        assert_eq!(resolve_dash_mode(210.5, safe), DashMode::Approach);
    }

    #[test]
    fn test_safe_distance_from_dash_reach() {
        let tuning = Tuning {
            dash_speed_mult: 3.0,
            dash_duration: 0.5,
            ..Tuning::default()
        };
        assert_eq!(safe_distance(100.0, &tuning), 150.0);
    }

    #[test]
    fn test_behavior_selection_priority() {
        let tuning = Tuning::default();
        let mut ty = EnemyType::of(EnemyKind::Zombie);
        assert!(matches!(Behavior::for_type(&ty, &tuning), Behavior::Chase));
        ty.is_ranged = true;
        assert!(matches!(Behavior::for_type(&ty, &tuning), Behavior::Kite(_)));
        ty.can_dash = true;
        assert!(matches!(Behavior::for_type(&ty, &tuning), Behavior::Dash(_)));
        ty.can_shoot_beam = true;
        assert!(matches!(Behavior::for_type(&ty, &tuning), Behavior::Beam(_)));
    }

    #[test]
    fn test_beam_geometry_frozen_at_warning() {
        let tuning = Tuning::default();
        let ty = EnemyType::of(EnemyKind::Eye);
        let mut me = body(Vec2::ZERO, 50.0);
        let mut beam = Behavior::Beam(BeamState {
            phase: BeamPhase::Idle,
            timer: 0.0,
            cooldown: 0.0,
            origin: Vec2::ZERO,
            end: Vec2::ZERO,
            width: tuning.beam_width,
        });
        let mut rng = Pcg32::seed_from_u64(1);
        let mut out = Vec::new();

        // Warning starts with the target straight ahead at (100, 0)
        let m = beam.update(&mut me, &ty, target_at(Vec2::new(100.0, 0.0)), &tuning, 0.016, &mut rng, &mut out);
        assert_eq!(m, Movement::Hold);
        let Behavior::Beam(state) = beam else { unreachable!() };
        assert_eq!(state.phase, BeamPhase::Warning);
        assert!(state.end.y.abs() < 1e-4);

        // Target sidesteps to (100, 50) for the rest of the cycle
        let moved = target_at(Vec2::new(100.0, 50.0));
        let mut t = 0.0;
        while t < tuning.beam_warning_time + tuning.beam_firing_time + 0.1 {
            beam.update(&mut me, &ty, moved, &tuning, 0.05, &mut rng, &mut out);
            t += 0.05;
        }
        assert!(out.is_empty(), "beam must not re-aim at the moved target");
        let Behavior::Beam(state) = beam else { unreachable!() };
        assert_eq!(state.phase, BeamPhase::Idle);
        assert_eq!(state.cooldown, tuning.beam_cooldown);
        assert!(state.end.y.abs() < 1e-4);
    }

    #[test]
    fn test_beam_hits_target_on_frozen_line() {
        let tuning = Tuning::default();
        let ty = EnemyType::of(EnemyKind::Eye);
        let mut me = body(Vec2::ZERO, 50.0);
        let mut beam = Behavior::Beam(BeamState {
            phase: BeamPhase::Firing,
            timer: 0.3,
            cooldown: 0.0,
            origin: Vec2::ZERO,
            end: Vec2::new(400.0, 0.0),
            width: tuning.beam_width,
        });
        let mut rng = Pcg32::seed_from_u64(1);
        let mut out = Vec::new();
        beam.update(&mut me, &ty, target_at(Vec2::new(200.0, 5.0)), &tuning, 0.016, &mut rng, &mut out);
        assert!(matches!(out[0], EnemyCommand::Beam { .. }));

        // An invincible target is skipped
        out.clear();
        let mut shielded = target_at(Vec2::new(200.0, 5.0));
        shielded.invincible = true;
        beam.update(&mut me, &ty, shielded, &tuning, 0.016, &mut rng, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_beam_holds_position_while_committed() {
        let tuning = Tuning::default();
        let ty = EnemyType::of(EnemyKind::Eye);
        let mut me = body(Vec2::ZERO, 50.0);
        let mut beam = Behavior::for_type(&ty, &tuning);
        if let Behavior::Beam(s) = &mut beam {
            s.cooldown = 0.0;
        }
        let mut rng = Pcg32::seed_from_u64(2);
        let mut out = Vec::new();
        let target = target_at(Vec2::new(150.0, 0.0));
        assert_eq!(
            beam.update(&mut me, &ty, target, &tuning, 0.016, &mut rng, &mut out),
            Movement::Hold
        );
        assert!(beam.is_committed());
        assert_eq!(
            beam.update(&mut me, &ty, target, &tuning, 0.016, &mut rng, &mut out),
            Movement::Hold
        );
        assert_eq!(me.base.pos, Vec2::ZERO);
    }

    #[test]
    fn test_kite_fires_in_band_and_retreats_when_close() {
        let tuning = Tuning::default();
        let ty = EnemyType::of(EnemyKind::Spitter);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut out = Vec::new();

        // Within [min_range, attack_range] and above the chase fraction
        let mut me = body(Vec2::ZERO, 50.0);
        let mut kite = Behavior::Kite(KiteState { fire_cooldown: 0.0 });
        let far = target_at(Vec2::new(ty.attack_range * 0.9, 0.0));
        assert_eq!(
            kite.update(&mut me, &ty, far, &tuning, 0.016, &mut rng, &mut out),
            Movement::Chase
        );
        assert!(matches!(out[0], EnemyCommand::Fire { .. }));

        // Cooldown gates the next shot; inside the band it holds still
        out.clear();
        let mid = target_at(Vec2::new(ty.attack_range * 0.6, 0.0));
        assert_eq!(
            kite.update(&mut me, &ty, mid, &tuning, 0.016, &mut rng, &mut out),
            Movement::Hold
        );
        assert!(out.is_empty());

        // Closer than min_range: retreat away from the target
        let close = target_at(Vec2::new(ty.min_range * 0.5, 0.0));
        kite.update(&mut me, &ty, close, &tuning, 0.1, &mut rng, &mut out);
        assert!(me.base.pos.x < 0.0);
    }

    #[test]
    fn test_kite_band_edges() {
        let tuning = Tuning::default();
        let ty = EnemyType::of(EnemyKind::Spitter);
        let mut rng = Pcg32::seed_from_u64(3);
        let fresh = || Behavior::Kite(KiteState { fire_cooldown: 0.0 });
        let fired = |out: &Vec<EnemyCommand>| out.iter().any(|c| matches!(c, EnemyCommand::Fire { .. }));

        // Exactly at attack_range: still in the band, and beyond the chase fraction
        let mut me = body(Vec2::ZERO, 50.0);
        let mut out = Vec::new();
        let edge = target_at(Vec2::new(ty.attack_range, 0.0));
        assert_eq!(
            fresh().update(&mut me, &ty, edge, &tuning, 0.1, &mut rng, &mut out),
            Movement::Chase
        );
        assert!(fired(&out));

        // Just past attack_range: chase without firing
        out.clear();
        let beyond = target_at(Vec2::new(ty.attack_range + 0.5, 0.0));
        assert_eq!(
            fresh().update(&mut me, &ty, beyond, &tuning, 0.1, &mut rng, &mut out),
            Movement::Chase
        );
        assert!(!fired(&out));

        // Exactly at min_range: fires and holds without retreating
        out.clear();
        let inner = target_at(Vec2::new(ty.min_range, 0.0));
        assert_eq!(
            fresh().update(&mut me, &ty, inner, &tuning, 0.1, &mut rng, &mut out),
            Movement::Hold
        );
        assert!(fired(&out));
        assert_eq!(me.base.pos, Vec2::ZERO);

        // Just inside min_range: no shot, back off
        out.clear();
        let close = target_at(Vec2::new(ty.min_range - 0.5, 0.0));
        assert_eq!(
            fresh().update(&mut me, &ty, close, &tuning, 0.1, &mut rng, &mut out),
            Movement::Hold
        );
        assert!(!fired(&out));
        assert!(me.base.pos.x < 0.0);
    }

    #[test]
    fn test_dasher_dashes_from_far_and_hits_once() {
        let tuning = Tuning::default();
        let mut me = body(Vec2::ZERO, 100.0);
        let safe = safe_distance(100.0, &tuning);
        let mut state = DashState {
            mode: DashMode::Approach,
            cooldown: 0.0,
            dash_timer: 0.0,
            dash_dir: FALLBACK_DIR,
            dash_hit: false,
            orbit_dir: 1.0,
            stuck_time: 0.0,
            last_pos: None,
            forced_approach: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(4);
        let mut out = Vec::new();
        let far = target_at(Vec2::new(safe * 1.3, 0.0));

        update_dash(&mut state, &mut me, far, &tuning, 0.016, &mut rng, &mut out);
        assert_eq!(state.mode, DashMode::Dashing);

        // The target steps into the dash path; contact lands only once
        let target = target_at(Vec2::new(safe * 0.6, 0.0));
        let mut t = 0.0;
        while state.mode == DashMode::Dashing && t < 2.0 {
            update_dash(&mut state, &mut me, target, &tuning, 0.02, &mut rng, &mut out);
            t += 0.02;
        }
        let dash_hits = out
            .iter()
            .filter(|c| matches!(c, EnemyCommand::DashHit { .. }))
            .count();
        assert_eq!(dash_hits, 1);
        assert!(state.cooldown > 0.0);
        assert_ne!(state.mode, DashMode::Dashing);
    }

    #[test]
    fn test_dasher_orbit_settles_on_ring() {
        let tuning = Tuning {
            dash_orbit_chance: 0.0,
            ..Tuning::default()
        };
        let mut me = body(Vec2::new(100.0, 0.0), 100.0);
        let safe = safe_distance(100.0, &tuning);
        let mut state = DashState {
            mode: DashMode::Circle,
            cooldown: 100.0,
            dash_timer: 0.0,
            dash_dir: FALLBACK_DIR,
            dash_hit: false,
            orbit_dir: 1.0,
            stuck_time: 0.0,
            last_pos: None,
            forced_approach: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut out = Vec::new();
        let target = target_at(Vec2::ZERO);
        for _ in 0..300 {
            update_dash(&mut state, &mut me, target, &tuning, 0.016, &mut rng, &mut out);
        }
        assert_eq!(state.mode, DashMode::Circle);
        assert!((me.base.pos.length() - safe).abs() < 2.0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_dasher_leaves_when_too_close() {
        let tuning = Tuning::default();
        let mut me = body(Vec2::new(10.0, 0.0), 100.0);
        let mut state = match Behavior::for_type(&EnemyType::of(EnemyKind::Stalker), &tuning) {
            Behavior::Dash(s) => s,
            _ => unreachable!(),
        };
        let mut rng = Pcg32::seed_from_u64(6);
        let mut out = Vec::new();
        update_dash(&mut state, &mut me, target_at(Vec2::ZERO), &tuning, 0.1, &mut rng, &mut out);
        assert_eq!(state.mode, DashMode::Leave);
        assert!(me.base.pos.x > 10.0);
    }

    #[test]
    fn test_stuck_watchdog_forces_approach() {
        let tuning = Tuning::default();
        // Zero speed: never moves, so the watchdog must fire
        let mut me = body(Vec2::new(200.0, 0.0), 0.0);
        me.stats.speed = 0.0;
        let mut state = DashState {
            mode: DashMode::Circle,
            cooldown: 100.0,
            dash_timer: 0.0,
            dash_dir: FALLBACK_DIR,
            dash_hit: false,
            orbit_dir: 1.0,
            stuck_time: 0.0,
            last_pos: None,
            forced_approach: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let mut out = Vec::new();
        let target = target_at(Vec2::ZERO);
        let mut nudged = false;
        for _ in 0..40 {
            update_dash(&mut state, &mut me, target, &tuning, 0.05, &mut rng, &mut out);
            if state.mode == DashMode::Approach && state.forced_approach > 0.0 {
                nudged = true;
                break;
            }
        }
        assert!(nudged);
        assert_ne!(me.base.pos, Vec2::new(200.0, 0.0));
    }

    fn dashing_state() -> DashState {
        DashState {
            mode: DashMode::Dashing,
            cooldown: 0.0,
            dash_timer: Tuning::default().dash_duration,
            dash_dir: Vec2::X,
            dash_hit: false,
            orbit_dir: 1.0,
            stuck_time: 0.0,
            last_pos: None,
            forced_approach: 0.0,
        }
    }

    #[test]
    fn test_slow_does_not_shorten_dash() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(10);
        let far = target_at(Vec2::new(10_000.0, 0.0));

        let mut run = |me: &mut Character| {
            let mut state = dashing_state();
            let mut out = Vec::new();
            let mut frames = 0;
            while state.mode == DashMode::Dashing && frames < 1000 {
                update_dash(&mut state, me, far, &tuning, 0.02, &mut rng, &mut out);
                frames += 1;
            }
            me.base.pos.x
        };

        let mut normal = body(Vec2::ZERO, 100.0);
        let mut slowed = body(Vec2::ZERO, 100.0);
        assert!(slowed.apply_effect(
            StatusEffect::Slow { factor: 0.5, duration: 5.0 },
            DamageSource::Player
        ));
        assert!(slowed.current_speed() < normal.current_speed());

        let full = run(&mut normal);
        let reach = run(&mut slowed);
        assert!(full > 0.0);
        assert!((full - reach).abs() < 1e-3);
    }

    #[test]
    fn test_dash_hit_waits_out_invincibility() {
        let tuning = Tuning::default();
        let mut me = body(Vec2::ZERO, 100.0);
        let mut state = dashing_state();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut out = Vec::new();

        // Overlapping but invincible: nothing lands and the hit stays armed
        let mut shielded = target_at(Vec2::new(5.0, 0.0));
        shielded.invincible = true;
        update_dash(&mut state, &mut me, shielded, &tuning, 0.01, &mut rng, &mut out);
        assert!(out.is_empty());
        assert!(!state.dash_hit);

        // Vulnerable again later in the same dash: exactly one hit
        for _ in 0..3 {
            let exposed = target_at(me.base.pos + Vec2::new(5.0, 0.0));
            update_dash(&mut state, &mut me, exposed, &tuning, 0.01, &mut rng, &mut out);
        }
        let dash_hits = out
            .iter()
            .filter(|c| matches!(c, EnemyCommand::DashHit { .. }))
            .count();
        assert_eq!(dash_hits, 1);
        assert!(state.dash_hit);
    }

    #[test]
    fn test_slow_orbit_not_stuck_at_any_frame_rate() {
        let tuning = Tuning {
            dash_orbit_chance: 0.0,
            ..Tuning::default()
        };
        let safe = safe_distance(100.0, &tuning);
        let target = target_at(Vec2::ZERO);

        for hz in [60.0_f32, 240.0] {
            let dt = 1.0 / hz;
            let mut me = body(Vec2::new(safe, 0.0), 100.0);
            // 20 units/s: slow but clearly moving
            me.apply_effect(
                StatusEffect::Slow { factor: 0.2, duration: 100.0 },
                DamageSource::Player,
            );
            let mut state = DashState {
                mode: DashMode::Circle,
                cooldown: 100.0,
                dash_timer: 0.0,
                dash_dir: FALLBACK_DIR,
                dash_hit: false,
                orbit_dir: 1.0,
                stuck_time: 0.0,
                last_pos: None,
                forced_approach: 0.0,
            };
            let mut rng = Pcg32::seed_from_u64(12);
            let mut out = Vec::new();
            let frames = (3.0 * hz) as usize;
            for _ in 0..frames {
                update_dash(&mut state, &mut me, target, &tuning, dt, &mut rng, &mut out);
                assert_eq!(state.forced_approach, 0.0, "nudged at {} Hz", hz);
            }
            assert_eq!(state.mode, DashMode::Circle);
        }
    }
}
