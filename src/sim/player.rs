//! The player character, movement, and experience

use glam::Vec2;

use super::behavior::TargetView;
use super::character::Character;
use super::entity::{Entity, EntityBase};
use super::weapon::{PassiveKind, Weapon, WeaponKind};
use crate::config::Tuning;

/// Directional input for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveInput {
    /// Unit direction (or zero); screen-up is -y
    pub fn direction(&self) -> Vec2 {
        let x = self.right as i32 - self.left as i32;
        let y = self.down as i32 - self.up as i32;
        Vec2::new(x as f32, y as f32).normalize_or_zero()
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub character: Character,
    pub xp: f32,
    pub level: u32,
    pub xp_to_next: f32,
    pub kills: u32,
    pub pickup_radius: f32,
    /// Last non-zero movement direction
    pub facing: Vec2,
    pub weapons: Vec<Weapon>,
    pub passives: Vec<(PassiveKind, u32)>,
    /// Remaining time all XP gems are pulled in
    pub magnet_time: f32,
    xp_growth: f32,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            character: Character::new(
                Vec2::ZERO,
                tuning.player_size,
                tuning.player_stats.clone(),
                tuning.player_invincibility,
            ),
            xp: 0.0,
            level: 1,
            xp_to_next: tuning.xp_base,
            kills: 0,
            pickup_radius: tuning.player_pickup_radius,
            facing: Vec2::X,
            weapons: vec![Weapon::new(WeaponKind::Bolt)],
            passives: Vec::new(),
            magnet_time: 0.0,
            xp_growth: tuning.xp_growth,
        }
    }

    /// Move from the input snapshot; disabled players stand still
    pub fn move_with(&mut self, input: MoveInput, dt: f32) {
        if !self.character.base.is_live() {
            return;
        }
        let dir = input.direction();
        if dir == Vec2::ZERO {
            return;
        }
        self.facing = dir;
        let speed = self.character.current_speed();
        self.character.base.translate(dir * speed * dt);
    }

    /// Add experience; returns the number of levels gained
    pub fn gain_xp(&mut self, amount: f32) -> u32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0;
        }
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next *= self.xp_growth;
            gained += 1;
        }
        gained
    }

    pub fn weapon_level(&self, kind: WeaponKind) -> u32 {
        self.weapons
            .iter()
            .find(|w| w.kind == kind)
            .map_or(0, |w| w.level)
    }

    pub fn passive_level(&self, kind: PassiveKind) -> u32 {
        self.passives
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, level)| *level)
    }

    /// What enemies see when they target the player
    pub fn target_view(&self) -> Option<TargetView> {
        if !self.character.base.is_live() {
            return None;
        }
        Some(TargetView {
            pos: self.character.base.pos,
            size: self.character.base.size,
            invincible: self.character.is_invincible(),
        })
    }
}

impl Entity for Player {
    fn base(&self) -> &EntityBase {
        &self.character.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.character.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_movement_is_normalized() {
        let tuning = Tuning::default();
        let mut p = Player::new(&tuning);
        p.move_with(
            MoveInput {
                up: true,
                right: true,
                ..Default::default()
            },
            1.0,
        );
        assert!((p.pos().length() - tuning.player_stats.speed).abs() < 1e-3);
        assert!(p.facing.x > 0.0 && p.facing.y < 0.0);
    }

    #[test]
    fn test_no_input_keeps_facing() {
        let mut p = Player::new(&Tuning::default());
        p.move_with(MoveInput::default(), 1.0);
        assert_eq!(p.pos(), Vec2::ZERO);
        assert_eq!(p.facing, Vec2::X);
    }

    #[test]
    fn test_xp_curve() {
        let tuning = Tuning {
            xp_base: 5.0,
            xp_growth: 2.0,
            ..Tuning::default()
        };
        let mut p = Player::new(&tuning);
        assert_eq!(p.gain_xp(4.0), 0);
        assert_eq!(p.gain_xp(1.0), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp_to_next, 10.0);
        // Enough for two levels at once: 10 + 20
        assert_eq!(p.gain_xp(31.0), 2);
        assert_eq!(p.level, 4);
        assert_eq!(p.xp, 1.0);
    }

    #[test]
    fn test_dead_player_is_not_targetable() {
        let mut p = Player::new(&Tuning::default());
        assert!(p.target_view().is_some());
        p.character.on_death();
        assert!(p.target_view().is_none());
    }
}
