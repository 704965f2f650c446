//! Free-list recycling for high-churn entities
//!
//! Projectiles and floating damage numbers are allocated once and then
//! cycle between a live `Vec` and a [`Pool`]. Ownership moves on every
//! transfer, so an instance can never sit in both places at once.

use super::entity::Entity;

/// An entity kind that can be recycled through a [`Pool`]
pub trait Poolable: Sized {
    /// Everything needed to stamp a fresh instance
    type Args;

    /// Construct a new instance
    fn create(args: Self::Args) -> Self;

    /// Re-stamp every mutable field of a recycled instance
    fn init(&mut self, args: Self::Args);
}

/// Free list of parked instances
#[derive(Debug, Clone)]
pub struct Pool<T> {
    free: Vec<T>,
    constructed: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            constructed: 0,
        }
    }

    /// Number of parked instances
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total instances ever constructed through this pool
    pub fn constructed(&self) -> usize {
        self.constructed
    }
}

impl<T: Poolable> Pool<T> {
    /// Take a parked instance (re-stamped) or construct a new one
    pub fn acquire(&mut self, args: T::Args) -> T {
        match self.free.pop() {
            Some(mut item) => {
                item.init(args);
                item
            }
            None => {
                self.constructed += 1;
                T::create(args)
            }
        }
    }

    /// Park an instance the caller has already removed from its live list
    pub fn release(&mut self, item: T) {
        self.free.push(item);
    }
}

/// Move garbage-flagged entries of `live` into `pool`
///
/// Survivors keep their relative order. Returns the number released.
pub fn sweep_pooled<T: Poolable + Entity>(live: &mut Vec<T>, pool: &mut Pool<T>) -> usize {
    if !live.iter().any(|item| item.is_garbage()) {
        return 0;
    }
    let mut released = 0;
    let mut kept = Vec::with_capacity(live.len());
    for item in live.drain(..) {
        if item.is_garbage() {
            pool.release(item);
            released += 1;
        } else {
            kept.push(item);
        }
    }
    *live = kept;
    released
}

/// Drop garbage-flagged entries from a plain (non-pooled) list
pub fn sweep<T: Entity>(live: &mut Vec<T>) -> usize {
    let before = live.len();
    live.retain(|item| !item.is_garbage());
    before - live.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityBase;
    use glam::Vec2;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Spark {
        base: EntityBase,
        stamp: u32,
    }

    impl Entity for Spark {
        fn base(&self) -> &EntityBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.base
        }
    }

    impl Poolable for Spark {
        type Args = u32;

        fn create(stamp: u32) -> Self {
            Self {
                base: EntityBase::new(Vec2::ZERO, 1.0),
                stamp,
            }
        }

        fn init(&mut self, stamp: u32) {
            self.base = EntityBase::new(Vec2::ZERO, 1.0);
            self.stamp = stamp;
        }
    }

    #[test]
    fn test_empty_pool_constructs() {
        let mut pool: Pool<Spark> = Pool::new();
        let s = pool.acquire(7);
        assert_eq!(s.stamp, 7);
        assert_eq!(pool.constructed(), 1);
    }

    #[test]
    fn test_reuse_restamps() {
        let mut pool: Pool<Spark> = Pool::new();
        let mut s = pool.acquire(1);
        s.kill();
        pool.release(s);
        let s = pool.acquire(2);
        assert_eq!(s.stamp, 2);
        assert!(s.is_live());
        assert_eq!(pool.constructed(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_sweep_pooled_preserves_order() {
        let mut pool: Pool<Spark> = Pool::new();
        let mut live: Vec<Spark> = (0..5).map(|i| pool.acquire(i)).collect();
        live[1].kill();
        live[3].kill();
        assert_eq!(sweep_pooled(&mut live, &mut pool), 2);
        let stamps: Vec<u32> = live.iter().map(|s| s.stamp).collect();
        assert_eq!(stamps, vec![0, 2, 4]);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_sweep_plain() {
        let mut live: Vec<Spark> = (0..3).map(Spark::create).collect();
        live[0].kill();
        assert_eq!(sweep(&mut live), 1);
        assert_eq!(live.len(), 2);
    }

    proptest! {
        /// Constructions never exceed the peak number of simultaneously live instances
        #[test]
        fn prop_pool_conservation(ops in prop::collection::vec(any::<bool>(), 1..200)) {
            let mut pool: Pool<Spark> = Pool::new();
            let mut live: Vec<Spark> = Vec::new();
            let mut peak = 0usize;
            for (i, acquire) in ops.into_iter().enumerate() {
                if acquire || live.is_empty() {
                    live.push(pool.acquire(i as u32));
                } else if let Some(mut item) = live.pop() {
                    item.kill();
                    pool.release(item);
                }
                peak = peak.max(live.len());
                prop_assert!(pool.constructed() <= peak);
                prop_assert_eq!(pool.constructed(), live.len() + pool.available());
            }
        }
    }
}
