//! SequentialHashSet: the unsynchronized baseline.
//!
//! The set is `!Sync` (interior `Cell`/`RefCell`), so sharing it between
//! threads is rejected at compile time rather than corrupting the table under
//! contention. It may still be moved to another thread when `T` and `S` are
//! `Send`.

use core::borrow::Borrow;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::hash::{BuildHasher, Hash};

use crate::config::{Config, DEFAULT_CAPACITY};
use crate::policy::GrowthPolicy;
use crate::reentrancy::DebugReentrancy;
use crate::table::{chain_contains, chain_insert, chain_remove, Table};
use crate::DefaultHashBuilder;

pub struct SequentialHashSet<T, S = DefaultHashBuilder> {
    hasher: S,
    growth: GrowthPolicy,
    table: RefCell<Table<T>>,
    len: Cell<usize>,
    reentrancy: DebugReentrancy,
}

impl<T: Hash + Eq> SequentialHashSet<T> {
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

impl<T: Hash + Eq> Default for SequentialHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> SequentialHashSet<T, S>
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
            table: RefCell::new(Table::with_capacity(config.capacity)),
            len: Cell::new(0),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn add(&self, value: T) -> bool {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(&value);
        let mut table = self.table.borrow_mut();
        if !chain_insert(table.chain_mut(hash), hash, value) {
            return false;
        }
        let len = self.len.get() + 1;
        self.len.set(len);
        if self.growth.should_grow(len, table.capacity()) {
            table.grow();
            log::trace!("sequential set grew to {} buckets", table.capacity());
        }
        true
    }

    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(value);
        let removed = chain_remove(self.table.borrow_mut().chain_mut(hash), hash, value);
        if removed {
            self.len.set(self.len.get() - 1);
        }
        removed
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(value);
        chain_contains(self.table.borrow().chain(hash), hash, value)
    }
}

impl<T, S> SequentialHashSet<T, S> {
    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.borrow().capacity()
    }

    #[cfg(test)]
    pub(crate) fn audit(&self) -> crate::table::Audit
    where
        T: Eq,
    {
        let table = self.table.borrow();
        crate::table::Audit::of(
            table.capacity(),
            table.buckets().iter().enumerate().map(|(i, c)| (i, c.as_slice())),
        )
    }
}

impl<T, S> fmt::Debug for SequentialHashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialHashSet")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

crate::set_ops::forward_set_ops!(SequentialHashSet);
