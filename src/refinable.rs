//! RefinableHashSet: one lock per bucket, with the lock array growing
//! alongside the table.
//!
//! Structure
//! - Each bucket is an `Arc<Mutex<Chain<T>>>`: the lock owns its chain. The
//!   array of bucket handles (the descriptor) sits behind an `RwLock` that is
//!   only write-locked to publish a migration.
//! - `capacity` mirrors the descriptor length and is stored, under the
//!   descriptor write lock, after the new descriptor is in place.
//!
//! Operations
//! - Snapshot capacity, pick the bucket, clone its handle under a short read
//!   lock, release, lock the bucket, then re-check capacity. A mismatch means
//!   a migration slipped in between; drop the lock and start over. Capacity
//!   only ever doubles, so equality proves the epoch did not change.
//! - At most one bucket lock is held at a time.
//!
//! Migration
//! - Only from `add`, after its bucket lock is released.
//! - A single compare-and-set on `ResizeOwner` picks the resizer; losers
//!   return, the winner's migration serves them too.
//! - The winner re-checks the policy, locks every bucket in ascending order,
//!   rehashes into twice as many chains, refills the old locks with the lower
//!   half, appends fresh locks for the upper half, publishes, releases.
//! - Reusing old locks keeps a lock's index stable across epochs, so every
//!   multi-lock acquisition (migration, exact `len`) follows one global
//!   ascending order.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::config::{Config, SizeMode, DEFAULT_CAPACITY};
use crate::policy::{self, GrowthPolicy};
use crate::resize::ResizeOwner;
use crate::table::{chain_contains, chain_insert, chain_remove, empty_chains, index_for, Chain};
use crate::DefaultHashBuilder;

type Bucket<T> = Arc<Mutex<Chain<T>>>;

pub struct RefinableHashSet<T, S = DefaultHashBuilder> {
    hasher: S,
    growth: GrowthPolicy,
    size_mode: SizeMode,
    buckets: RwLock<Arc<[Bucket<T>]>>,
    capacity: AtomicUsize,
    len: AtomicUsize,
    resizer: ResizeOwner,
}

impl<T: Hash + Eq> RefinableHashSet<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<T: Hash + Eq> Default for RefinableHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> RefinableHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_config(Config::with_capacity(capacity), hasher)
    }

    pub(crate) fn from_config(config: Config, hasher: S) -> Self {
        let buckets: Arc<[Bucket<T>]> = empty_chains(config.capacity)
            .into_iter()
            .map(|c| Arc::new(Mutex::new(c)))
            .collect();
        Self {
            hasher,
            growth: config.growth,
            size_mode: config.size_mode,
            buckets: RwLock::new(buckets),
            capacity: AtomicUsize::new(config.capacity),
            len: AtomicUsize::new(0),
            resizer: ResizeOwner::new(),
        }
    }

    /// Runs `f` on the chain of `hash` under its bucket lock, in the current
    /// capacity epoch.
    fn with_chain<R>(&self, hash: u64, f: impl FnOnce(&mut Chain<T>) -> R) -> R {
        loop {
            let capacity = self.capacity.load(Ordering::Acquire);
            let bucket = Arc::clone(&self.buckets.read()[index_for(hash, capacity)]);
            let mut chain = bucket.lock();
            if self.capacity.load(Ordering::Acquire) == capacity {
                return f(&mut *chain);
            }
            log::trace!("refinable set: stale bucket for capacity {}, retrying", capacity);
        }
    }

    pub fn add(&self, value: T) -> bool {
        let hash = self.hasher.hash_one(&value);
        let inserted = self.with_chain(hash, |chain| {
            let inserted = chain_insert(chain, hash, value);
            if inserted {
                self.len.fetch_add(1, Ordering::AcqRel);
            }
            inserted
        });

        if inserted
            && self.growth.should_grow(
                self.len.load(Ordering::Acquire),
                self.capacity.load(Ordering::Acquire),
            )
        {
            self.resize();
        }
        inserted
    }

    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        self.with_chain(hash, |chain| {
            let removed = chain_remove(chain, hash, value);
            if removed {
                self.len.fetch_sub(1, Ordering::AcqRel);
            }
            removed
        })
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        self.with_chain(hash, |chain| chain_contains(chain, hash, value))
    }

    fn resize(&self) {
        let Some(_claim) = self.resizer.try_claim() else {
            log::trace!("refinable set: resize already claimed by another thread");
            return;
        };

        let capacity = self.capacity.load(Ordering::Acquire);
        if !self
            .growth
            .should_grow(self.len.load(Ordering::Acquire), capacity)
        {
            return;
        }

        // Only the claim holder replaces the descriptor, so this stays current.
        let old = Arc::clone(&*self.buckets.read());
        debug_assert_eq!(old.len(), capacity);
        let mut guards: Vec<MutexGuard<'_, Chain<T>>> = old.iter().map(|b| b.lock()).collect();

        let new_capacity = policy::doubled(capacity);
        let mut chains = empty_chains(new_capacity);
        for guard in guards.iter_mut() {
            for entry in guard.drain(..) {
                chains[index_for(entry.hash, new_capacity)].push(entry);
            }
        }

        let upper = chains.split_off(capacity);
        for (guard, chain) in guards.iter_mut().zip(chains) {
            **guard = chain;
        }
        let grown: Arc<[Bucket<T>]> = old
            .iter()
            .cloned()
            .chain(upper.into_iter().map(|c| Arc::new(Mutex::new(c))))
            .collect();

        {
            let mut buckets = self.buckets.write();
            *buckets = grown;
            self.capacity.store(new_capacity, Ordering::Release);
        }
        drop(guards);
        log::trace!("refinable set grew to {} buckets", new_capacity);
    }
}

impl<T, S> RefinableHashSet<T, S> {
    /// Number of elements; see [`SizeMode`] for the consistency guarantee.
    pub fn len(&self) -> usize {
        match self.size_mode {
            SizeMode::Counter => self.len.load(Ordering::Acquire),
            SizeMode::Exact => self.exact_len(),
        }
    }

    /// Locks every current bucket in ascending order and sums the chains,
    /// retrying if a migration published in between.
    fn exact_len(&self) -> usize {
        loop {
            let capacity = self.capacity.load(Ordering::Acquire);
            let buckets = Arc::clone(&*self.buckets.read());
            let guards: Vec<_> = buckets.iter().map(|b| b.lock()).collect();
            if buckets.len() == capacity && self.capacity.load(Ordering::Acquire) == capacity {
                return guards.iter().map(|c| c.len()).sum();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of buckets (and of bucket locks).
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Whether a thread is currently migrating the table.
    pub fn is_resizing(&self) -> bool {
        self.resizer.owner().is_some()
    }

    #[cfg(test)]
    pub(crate) fn audit(&self) -> crate::table::Audit
    where
        T: Eq,
    {
        let buckets = Arc::clone(&*self.buckets.read());
        let guards: Vec<_> = buckets.iter().map(|b| b.lock()).collect();
        crate::table::Audit::of(
            self.capacity(),
            guards.iter().enumerate().map(|(i, c)| (i, c.as_slice())),
        )
    }
}

impl<T, S> fmt::Debug for RefinableHashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefinableHashSet")
            .field("len", &self.len.load(Ordering::Relaxed))
            .field("capacity", &self.capacity())
            .field("size_mode", &self.size_mode)
            .field("resizing", &self.is_resizing())
            .finish_non_exhaustive()
    }
}

crate::set_ops::forward_set_ops!(RefinableHashSet);
