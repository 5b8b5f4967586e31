//! CoarseHashSet: one mutex around the whole table.
//!
//! Every operation, including `len` and the migration, runs under the same
//! lock, so the set is linearizable by construction. Only the hash is
//! computed outside the lock.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

use crate::config::{Config, DEFAULT_CAPACITY};
use crate::policy::GrowthPolicy;
use crate::table::{chain_contains, chain_insert, chain_remove, Table};
use crate::DefaultHashBuilder;

struct Inner<T> {
    table: Table<T>,
    len: usize,
}

pub struct CoarseHashSet<T, S = DefaultHashBuilder> {
    hasher: S,
    growth: GrowthPolicy,
    inner: Mutex<Inner<T>>,
}

impl<T: Hash + Eq> CoarseHashSet<T> {
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

impl<T: Hash + Eq> Default for CoarseHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> CoarseHashSet<T, S>
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
        Self {
            hasher,
            growth: config.growth,
            inner: Mutex::new(Inner {
                table: Table::with_capacity(config.capacity),
                len: 0,
            }),
        }
    }

    /// Holds the lock through the policy check and, if due, the migration.
    pub fn add(&self, value: T) -> bool {
        let hash = self.hasher.hash_one(&value);
        let mut inner = self.inner.lock();
        if !chain_insert(inner.table.chain_mut(hash), hash, value) {
            return false;
        }
        inner.len += 1;
        if self.growth.should_grow(inner.len, inner.table.capacity()) {
            inner.table.grow();
            log::trace!("coarse set grew to {} buckets", inner.table.capacity());
        }
        true
    }

    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        let mut inner = self.inner.lock();
        let removed = chain_remove(inner.table.chain_mut(hash), hash, value);
        if removed {
            inner.len -= 1;
        }
        removed
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        let inner = self.inner.lock();
        chain_contains(inner.table.chain(hash), hash, value)
    }
}

impl<T, S> CoarseHashSet<T, S> {
    /// Exact: taken under the same lock as every mutation.
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().table.capacity()
    }

    #[cfg(test)]
    pub(crate) fn audit(&self) -> crate::table::Audit
    where
        T: Eq,
    {
        let inner = self.inner.lock();
        crate::table::Audit::of(
            inner.table.capacity(),
            inner.table.buckets().iter().enumerate().map(|(i, c)| (i, c.as_slice())),
        )
    }
}

impl<T, S> fmt::Debug for CoarseHashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CoarseHashSet")
            .field("len", &inner.len)
            .field("capacity", &inner.table.capacity())
            .finish_non_exhaustive()
    }
}

crate::set_ops::forward_set_ops!(CoarseHashSet);
