//! Frame-stepped simulation
//!
//! All gameplay logic lives here:
//! - Variable timestep, clamped per frame
//! - Seeded RNG only, owned by the world
//! - Deferred removal: entities are flagged garbage and swept at frame end
//! - No rendering or platform dependencies

pub mod behavior;
pub mod character;
pub mod collision;
pub mod effects;
pub mod enemy;
pub mod entity;
pub mod geom;
pub mod hazard;
pub mod pickup;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod spawner;
pub mod state;
pub mod status;
pub mod tick;
pub mod weapon;

pub use character::{Character, DamageOutcome, DamageSource, Stats};
pub use enemy::{Enemy, EnemyKind, EnemyType, TargetRef};
pub use entity::{Arena, Entity, EntityBase, Handle};
pub use player::{MoveInput, Player};
pub use projectile::{Projectile, ProjectileSpawn};
pub use state::{HudSnapshot, ScheduledAction, SimEvent, SimPhase, SimulationWorld};
pub use status::StatusEffect;
pub use tick::{TickInput, clamp_dt, tick};
pub use weapon::{PassiveKind, Upgrade, WeaponKind};
