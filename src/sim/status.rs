//! Status effect engine
//!
//! Each character carries one slot per effect kind. Re-applying an effect
//! never creates a second instance; the stacking rules below decide how the
//! existing slot changes.

use serde::{Deserialize, Serialize};

use super::character::DamageSource;

/// An effect application request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    Stun { duration: f32 },
    /// `factor` multiplies movement speed (0.5 = half speed)
    Slow { factor: f32, duration: f32 },
    Burn { damage: f32, duration: f32, tick_interval: f32 },
    Poison { damage: f32, duration: f32, tick_interval: f32 },
    Freeze { duration: f32 },
}

impl StatusEffect {
    fn is_valid(&self) -> bool {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            StatusEffect::Stun { duration } | StatusEffect::Freeze { duration } => ok(duration),
            StatusEffect::Slow { factor, duration } => {
                ok(duration) && factor.is_finite() && (0.0..=1.0).contains(&factor)
            }
            StatusEffect::Burn {
                damage,
                duration,
                tick_interval,
            }
            | StatusEffect::Poison {
                damage,
                duration,
                tick_interval,
            } => ok(duration) && ok(tick_interval) && damage.is_finite() && damage >= 0.0,
        }
    }
}

/// Binary effect (stun, freeze)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timed {
    pub duration: f32,
    pub source: DamageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slow {
    pub factor: f32,
    pub duration: f32,
    pub source: DamageSource,
}

/// Damage over time (burn, poison)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageOverTime {
    pub damage: f32,
    pub duration: f32,
    pub tick_interval: f32,
    pub tick_timer: f32,
    pub source: DamageSource,
}

impl DamageOverTime {
    fn new(damage: f32, duration: f32, tick_interval: f32, source: DamageSource) -> Self {
        Self {
            damage,
            duration,
            tick_interval,
            tick_timer: tick_interval,
            source,
        }
    }

    /// Merge a re-application; the running tick timer is kept
    fn refresh(&mut self, damage: f32, duration: f32, tick_interval: f32, source: DamageSource) {
        self.duration = self.duration.max(duration);
        self.damage = self.damage.max(damage);
        self.tick_interval = tick_interval;
        self.source = source;
    }

    fn advance(&mut self, dt: f32, ticks: &mut Vec<DotTick>) {
        self.duration -= dt;
        self.tick_timer -= dt;
        if self.tick_timer <= 0.0 {
            ticks.push(DotTick {
                damage: self.damage,
                source: self.source,
            });
            self.tick_timer = self.tick_interval;
        }
    }
}

/// One periodic damage tick that the owner must route through its damage pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotTick {
    pub damage: f32,
    pub source: DamageSource,
}

/// Resistances of the affected entity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Resistance {
    /// 0 = none, 1 = slows have no effect
    pub slow_resistance: f32,
    pub slow_immunity: bool,
}

/// Blend a slow factor toward 1.0 by `resistance`
///
/// `1 - (1 - factor) * (1 - resistance)`, written so zero resistance returns
/// `factor` bit-for-bit.
#[inline]
pub fn resisted_slow_factor(factor: f32, resistance: f32) -> f32 {
    let r = super::geom::finite_or(resistance, 0.0).clamp(0.0, 1.0);
    factor + (1.0 - factor) * r
}

/// Per-entity effect slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub stun: Option<Timed>,
    pub slow: Option<Slow>,
    pub burn: Option<DamageOverTime>,
    pub poison: Option<DamageOverTime>,
    pub freeze: Option<Timed>,
}

impl StatusEffects {
    /// Apply an effect; returns false if it was rejected
    pub fn apply(
        &mut self,
        effect: StatusEffect,
        source: DamageSource,
        resistance: Resistance,
    ) -> bool {
        if !effect.is_valid() {
            return false;
        }
        match effect {
            StatusEffect::Stun { duration } => {
                Self::apply_timed(&mut self.stun, duration, source);
            }
            StatusEffect::Freeze { duration } => {
                Self::apply_timed(&mut self.freeze, duration, source);
            }
            StatusEffect::Slow { factor, duration } => {
                if resistance.slow_immunity {
                    self.slow = None;
                    return false;
                }
                let factor = resisted_slow_factor(factor, resistance.slow_resistance);
                match &mut self.slow {
                    Some(slow) => {
                        if factor < slow.factor {
                            slow.factor = factor;
                            slow.source = source;
                        }
                        slow.duration = slow.duration.max(duration);
                    }
                    None => {
                        self.slow = Some(Slow {
                            factor,
                            duration,
                            source,
                        });
                    }
                }
            }
            StatusEffect::Burn {
                damage,
                duration,
                tick_interval,
            } => Self::apply_dot(&mut self.burn, damage, duration, tick_interval, source),
            StatusEffect::Poison {
                damage,
                duration,
                tick_interval,
            } => Self::apply_dot(&mut self.poison, damage, duration, tick_interval, source),
        }
        true
    }

    fn apply_timed(slot: &mut Option<Timed>, duration: f32, source: DamageSource) {
        match slot {
            Some(t) => {
                t.duration = t.duration.max(duration);
                t.source = source;
            }
            None => *slot = Some(Timed { duration, source }),
        }
    }

    fn apply_dot(
        slot: &mut Option<DamageOverTime>,
        damage: f32,
        duration: f32,
        tick_interval: f32,
        source: DamageSource,
    ) {
        match slot {
            Some(dot) => dot.refresh(damage, duration, tick_interval, source),
            None => *slot = Some(DamageOverTime::new(damage, duration, tick_interval, source)),
        }
    }

    /// Advance every slot by `dt`; returns damage ticks that came due
    pub fn update(&mut self, dt: f32) -> Vec<DotTick> {
        let mut ticks = Vec::new();

        if let Some(t) = &mut self.stun {
            t.duration -= dt;
        }
        if let Some(t) = &mut self.freeze {
            t.duration -= dt;
        }
        if let Some(s) = &mut self.slow {
            s.duration -= dt;
        }
        if let Some(dot) = &mut self.burn {
            dot.advance(dt, &mut ticks);
        }
        if let Some(dot) = &mut self.poison {
            dot.advance(dt, &mut ticks);
        }

        if self.stun.is_some_and(|t| t.duration <= 0.0) {
            self.stun = None;
        }
        if self.freeze.is_some_and(|t| t.duration <= 0.0) {
            self.freeze = None;
        }
        if self.slow.is_some_and(|s| s.duration <= 0.0) {
            self.slow = None;
        }
        if self.burn.is_some_and(|d| d.duration <= 0.0) {
            self.burn = None;
        }
        if self.poison.is_some_and(|d| d.duration <= 0.0) {
            self.poison = None;
        }

        ticks
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stun.is_some()
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.freeze.is_some()
    }

    /// Multiplier on base speed: 0 when stunned or frozen, else the slow factor
    pub fn speed_factor(&self) -> f32 {
        if self.is_stunned() || self.is_frozen() {
            0.0
        } else {
            self.slow.map_or(1.0, |s| s.factor)
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SRC: DamageSource = DamageSource::Player;

    fn slow(factor: f32, duration: f32) -> StatusEffect {
        StatusEffect::Slow { factor, duration }
    }

    #[test]
    fn test_weaker_slow_only_extends_duration() {
        let mut fx = StatusEffects::default();
        fx.apply(slow(0.5, 1.0), SRC, Resistance::default());
        fx.apply(slow(0.7, 2.0), SRC, Resistance::default());
        let s = fx.slow.unwrap();
        assert_eq!(s.factor, 0.5);
        assert_eq!(s.duration, 2.0);
    }

    #[test]
    fn test_stronger_slow_replaces_factor() {
        let mut fx = StatusEffects::default();
        fx.apply(slow(0.7, 2.0), SRC, Resistance::default());
        fx.apply(slow(0.4, 1.0), SRC, Resistance::default());
        let s = fx.slow.unwrap();
        assert_eq!(s.factor, 0.4);
        assert_eq!(s.duration, 2.0);
    }

    #[test]
    fn test_slow_immunity_rejects_and_clears() {
        let mut fx = StatusEffects::default();
        fx.apply(slow(0.5, 1.0), SRC, Resistance::default());
        let immune = Resistance {
            slow_immunity: true,
            ..Default::default()
        };
        assert!(!fx.apply(slow(0.3, 1.0), SRC, immune));
        assert!(fx.slow.is_none());
        assert_eq!(fx.speed_factor(), 1.0);
    }

    #[test]
    fn test_slow_resistance_blends() {
        let mut fx = StatusEffects::default();
        let half = Resistance {
            slow_resistance: 0.5,
            ..Default::default()
        };
        fx.apply(slow(0.4, 1.0), SRC, half);
        // 1 - 0.6 * 0.5
        assert!((fx.slow.unwrap().factor - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_stun_and_freeze_take_max_duration() {
        let mut fx = StatusEffects::default();
        fx.apply(StatusEffect::Stun { duration: 1.0 }, SRC, Resistance::default());
        fx.apply(StatusEffect::Stun { duration: 0.3 }, SRC, Resistance::default());
        assert_eq!(fx.stun.unwrap().duration, 1.0);
        fx.apply(StatusEffect::Freeze { duration: 0.5 }, SRC, Resistance::default());
        fx.apply(StatusEffect::Freeze { duration: 2.0 }, SRC, Resistance::default());
        assert_eq!(fx.freeze.unwrap().duration, 2.0);
        assert_eq!(fx.speed_factor(), 0.0);
    }

    #[test]
    fn test_dot_reapply_preserves_tick_timer() {
        let mut fx = StatusEffects::default();
        let burn = StatusEffect::Burn {
            damage: 2.0,
            duration: 3.0,
            tick_interval: 0.5,
        };
        fx.apply(burn, SRC, Resistance::default());
        assert_eq!(fx.burn.unwrap().tick_timer, 0.5);
        fx.update(0.3);
        let timer_before = fx.burn.unwrap().tick_timer;
        fx.apply(
            StatusEffect::Burn {
                damage: 5.0,
                duration: 1.0,
                tick_interval: 0.25,
            },
            SRC,
            Resistance::default(),
        );
        let b = fx.burn.unwrap();
        assert!((b.tick_timer - timer_before).abs() < 1e-6);
        assert_eq!(b.damage, 5.0);
        assert_eq!(b.tick_interval, 0.25);
        assert!((b.duration - 2.7).abs() < 1e-5);
    }

    #[test]
    fn test_dot_ticks_and_expires() {
        let mut fx = StatusEffects::default();
        fx.apply(
            StatusEffect::Poison {
                damage: 3.0,
                duration: 1.0,
                tick_interval: 0.5,
            },
            DamageSource::Hazard,
            Resistance::default(),
        );
        assert!(fx.update(0.25).is_empty());
        let ticks = fx.update(0.25);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].damage, 3.0);
        assert_eq!(ticks[0].source, DamageSource::Hazard);
        let ticks = fx.update(0.5);
        assert_eq!(ticks.len(), 1);
        assert!(fx.poison.is_none());
    }

    #[test]
    fn test_expiry_restores_speed() {
        let mut fx = StatusEffects::default();
        fx.apply(slow(0.5, 0.2), SRC, Resistance::default());
        assert_eq!(fx.speed_factor(), 0.5);
        fx.update(0.25);
        assert!(fx.slow.is_none());
        assert_eq!(fx.speed_factor(), 1.0);
    }

    #[test]
    fn test_invalid_effect_rejected() {
        let mut fx = StatusEffects::default();
        assert!(!fx.apply(slow(f32::NAN, 1.0), SRC, Resistance::default()));
        assert!(!fx.apply(StatusEffect::Stun { duration: -1.0 }, SRC, Resistance::default()));
        assert_eq!(fx, StatusEffects::default());
    }

    proptest! {
        /// Weaker slows never change the factor; stronger ones always do
        #[test]
        fn prop_slow_stacking_law(
            f1 in 0.05f32..1.0, d1 in 0.1f32..5.0,
            f2 in 0.05f32..1.0, d2 in 0.1f32..5.0,
        ) {
            let mut fx = StatusEffects::default();
            fx.apply(slow(f1, d1), SRC, Resistance::default());
            fx.apply(slow(f2, d2), SRC, Resistance::default());
            let s = fx.slow.unwrap();
            prop_assert_eq!(s.factor, f1.min(f2));
            prop_assert_eq!(s.duration, d1.max(d2));
        }
    }
}
