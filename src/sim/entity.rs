//! Shared entity life-cycle and generational handles
//!
//! Every concrete kind (player, enemy, projectile, pickup, hazard, effect)
//! embeds an [`EntityBase`] and implements [`Entity`]. Weak references between
//! entities are [`Handle`]s into an [`Arena`]; a handle to a removed or
//! recycled slot resolves to nothing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position, extent, and life-cycle flags common to all entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityBase {
    pub pos: Vec2,
    /// Visual scale and collision diameter
    pub size: f32,
    /// Participates in update and draw
    pub active: bool,
    /// Scheduled for removal at the next sweep
    pub garbage: bool,
}

impl EntityBase {
    pub fn new(pos: Vec2, size: f32) -> Self {
        Self {
            pos,
            size,
            active: true,
            garbage: false,
        }
    }

    /// Active and not garbage-flagged
    #[inline]
    pub fn is_live(&self) -> bool {
        self.active && !self.garbage
    }

    /// Collision radius (half the size)
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    /// Flag for removal; no further gameplay effect after this
    #[inline]
    pub fn kill(&mut self) {
        self.garbage = true;
        self.active = false;
    }

    /// Move by `delta`; a step that would leave the position non-finite is
    /// discarded and reported as `false`
    pub fn translate(&mut self, delta: Vec2) -> bool {
        let next = self.pos + delta;
        if next.is_finite() {
            self.pos = next;
            true
        } else {
            false
        }
    }
}

/// Capability shared by every simulated object
pub trait Entity {
    fn base(&self) -> &EntityBase;
    fn base_mut(&mut self) -> &mut EntityBase;

    #[inline]
    fn pos(&self) -> Vec2 {
        self.base().pos
    }

    #[inline]
    fn size(&self) -> f32 {
        self.base().size
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.base().active
    }

    #[inline]
    fn is_garbage(&self) -> bool {
        self.base().garbage
    }

    #[inline]
    fn is_live(&self) -> bool {
        self.base().is_live()
    }

    #[inline]
    fn kill(&mut self) {
        self.base_mut().kill();
    }
}

impl Entity for EntityBase {
    fn base(&self) -> &EntityBase {
        self
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        self
    }
}

/// Generational index into an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with generation-checked access
///
/// Removing a value bumps its slot's generation, so any outstanding handle
/// to it stops resolving even after the slot is reused.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            Handle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            Handle {
                index,
                generation: 0,
            }
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Keep only values for which `keep` returns true; returns the count removed
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let drop_it = match &slot.value {
                Some(value) => !keep(value),
                None => false,
            };
            if drop_it {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                removed += 1;
            }
        }
        self.len -= removed;
        removed
    }

    /// Handles of all occupied slots, in slot order
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_clears_live() {
        let mut base = EntityBase::new(Vec2::ZERO, 10.0);
        assert!(base.is_live());
        base.kill();
        assert!(base.garbage);
        assert!(!base.active);
        assert!(!base.is_live());
    }

    #[test]
    fn test_translate_rejects_nan() {
        let mut base = EntityBase::new(Vec2::new(1.0, 2.0), 10.0);
        assert!(!base.translate(Vec2::new(f32::NAN, 0.0)));
        assert_eq!(base.pos, Vec2::new(1.0, 2.0));
        assert!(base.translate(Vec2::new(1.0, 1.0)));
        assert_eq!(base.pos, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn test_stale_handle_does_not_resolve_after_reuse() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a), Some("a"));
        let b = arena.insert("b");
        // Same slot, new generation
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.remove(a), None);
    }

    #[test]
    fn test_retain_frees_slots() {
        let mut arena = Arena::new();
        let handles: Vec<_> = (0..5).map(|i| arena.insert(i)).collect();
        let removed = arena.retain(|v| v % 2 == 0);
        assert_eq!(removed, 2);
        assert_eq!(arena.len(), 3);
        assert!(arena.get(handles[1]).is_none());
        assert_eq!(arena.get(handles[4]), Some(&4));
        assert_eq!(arena.handles().len(), 3);
    }
}
