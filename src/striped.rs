//! StripedHashSet: a fixed array of stripe locks over a growing table.
//!
//! Layout
//! - The table has `capacity` buckets and `L` stripes, with `L` dividing the
//!   initial capacity (hence every later capacity, since growth doubles).
//! - Bucket `i` is guarded by stripe `i % L` and stored inside that stripe's
//!   mutex at slot `i / L`. The data a lock guards is the data it owns.
//! - Because `L` divides `capacity`, `(hash % capacity) % L == hash % L`: the
//!   stripe of an element never changes across migrations, only its slot
//!   does. The slot is therefore computed from the capacity read *after* the
//!   stripe is locked; capacity only changes while every stripe is held.
//!
//! Migration
//! - Triggered by `add` once its own stripe is released.
//! - Locks all stripes in ascending order, re-checks the policy (another
//!   thread may have migrated already), redistributes every entry into the
//!   doubled layout, publishes the capacity, releases.
//!
//! Size
//! - `SizeMode::Counter` reads an atomic counter maintained with
//!   fetch-add / fetch-sub under the stripe that performed the mutation.
//! - `SizeMode::Exact` locks every stripe in ascending order and sums chains.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::config::{Config, SizeMode, DEFAULT_CAPACITY};
use crate::policy::{self, GrowthPolicy};
use crate::table::{chain_contains, chain_insert, chain_remove, empty_chains, index_for, Chain};
use crate::DefaultHashBuilder;

/// The buckets owned by one stripe, indexed by `bucket / stripe_count`.
type Stripe<T> = Vec<Chain<T>>;

pub struct StripedHashSet<T, S = DefaultHashBuilder> {
    hasher: S,
    growth: GrowthPolicy,
    size_mode: SizeMode,
    stripes: Box<[Mutex<Stripe<T>>]>,
    // Written only while every stripe is held.
    capacity: AtomicUsize,
    len: AtomicUsize,
}

impl<T: Hash + Eq> StripedHashSet<T> {
    /// A set of 4 buckets guarded by 4 stripes.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// One stripe per initial bucket.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_stripes(capacity, capacity)
    }

    /// # Panics
    ///
    /// Panics if either argument is zero or `stripes` does not divide
    /// `capacity`. Use [`Builder`](crate::Builder) for a fallible variant.
    pub fn with_capacity_and_stripes(capacity: usize, stripes: usize) -> Self {
        match crate::Builder::new()
            .initial_capacity(capacity)
            .stripes(stripes)
            .build_striped()
        {
            Ok(set) => set,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: Hash + Eq> Default for StripedHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> StripedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    pub(crate) fn from_config(config: Config, stripes: usize, hasher: S) -> Self {
        debug_assert!(stripes > 0 && config.capacity % stripes == 0);
        let per_stripe = config.capacity / stripes;
        Self {
            hasher,
            growth: config.growth,
            size_mode: config.size_mode,
            stripes: (0..stripes)
                .map(|_| Mutex::new(empty_chains(per_stripe)))
                .collect(),
            capacity: AtomicUsize::new(config.capacity),
            len: AtomicUsize::new(0),
        }
    }

    /// Locks the stripe of `hash` and returns it with the slot of the bucket
    /// holding `hash` under the capacity current while the lock is held.
    #[inline]
    fn lock_bucket(&self, hash: u64) -> (MutexGuard<'_, Stripe<T>>, usize) {
        let stripe = self.stripes[index_for(hash, self.stripe_count())].lock();
        let capacity = self.capacity.load(Ordering::Acquire);
        let slot = index_for(hash, capacity) / self.stripe_count();
        (stripe, slot)
    }

    pub fn add(&self, value: T) -> bool {
        let hash = self.hasher.hash_one(&value);
        {
            let (mut stripe, slot) = self.lock_bucket(hash);
            if !chain_insert(&mut stripe[slot], hash, value) {
                return false;
            }
            self.len.fetch_add(1, Ordering::AcqRel);
        }

        if self.growth.should_grow(
            self.len.load(Ordering::Acquire),
            self.capacity.load(Ordering::Acquire),
        ) {
            self.resize();
        }
        true
    }

    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        let (mut stripe, slot) = self.lock_bucket(hash);
        let removed = chain_remove(&mut stripe[slot], hash, value);
        if removed {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        let (stripe, slot) = self.lock_bucket(hash);
        chain_contains(&stripe[slot], hash, value)
    }

    /// Doubles the table while holding every stripe.
    fn resize(&self) {
        let mut stripes = self.lock_all();

        let capacity = self.capacity.load(Ordering::Acquire);
        if !self
            .growth
            .should_grow(self.len.load(Ordering::Acquire), capacity)
        {
            // Someone else migrated between our insert and our lock.
            return;
        }

        let count = self.stripe_count();
        let new_capacity = policy::doubled(capacity);
        let old: Vec<Stripe<T>> = stripes
            .iter_mut()
            .map(|s| mem::replace(&mut **s, empty_chains(new_capacity / count)))
            .collect();

        for entry in old.into_iter().flatten().flatten() {
            let bucket = index_for(entry.hash, new_capacity);
            stripes[bucket % count][bucket / count].push(entry);
        }

        self.capacity.store(new_capacity, Ordering::Release);
        log::trace!(
            "striped set grew to {} buckets over {} stripes",
            new_capacity,
            count
        );
    }
}

impl<T, S> StripedHashSet<T, S> {
    /// Every stripe, locked in ascending order.
    fn lock_all(&self) -> Vec<MutexGuard<'_, Stripe<T>>> {
        self.stripes.iter().map(|s| s.lock()).collect()
    }

    /// Number of elements; see [`SizeMode`] for the consistency guarantee.
    pub fn len(&self) -> usize {
        match self.size_mode {
            SizeMode::Counter => self.len.load(Ordering::Acquire),
            SizeMode::Exact => self
                .lock_all()
                .iter()
                .map(|s| s.iter().map(Vec::len).sum::<usize>())
                .sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Number of stripe locks, fixed at construction.
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    #[cfg(test)]
    pub(crate) fn audit(&self) -> crate::table::Audit
    where
        T: Eq,
    {
        let stripes = self.lock_all();
        let count = stripes.len();
        let capacity = self.capacity();
        crate::table::Audit::of(
            capacity,
            (0..capacity).map(|i| (i, stripes[i % count][i / count].as_slice())),
        )
    }
}

impl<T, S> fmt::Debug for StripedHashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripedHashSet")
            .field("len", &self.len.load(Ordering::Relaxed))
            .field("capacity", &self.capacity())
            .field("stripes", &self.stripes.len())
            .field("size_mode", &self.size_mode)
            .finish_non_exhaustive()
    }
}

crate::set_ops::forward_set_ops!(StripedHashSet);
