//! The contract shared by every strategy.

/// Add / remove / contains / size over a set of unique elements.
///
/// Object safe, so harnesses can hold any strategy behind
/// `Box<dyn SetOps<T>>` (or `Box<dyn SetOps<T> + Send + Sync>` for the
/// thread-safe ones). The inherent methods of each set additionally accept
/// borrowed forms of `T` for `remove` and `contains`.
pub trait SetOps<T> {
    /// Inserts `value`. Returns `false`, leaving the set unchanged, if an
    /// equal element is already present.
    ///
    /// May migrate the table to twice the capacity before returning.
    fn add(&self, value: T) -> bool;

    /// Removes the element equal to `value`. Returns whether one was present.
    fn remove(&self, value: &T) -> bool;

    /// Whether an element equal to `value` is present.
    fn contains(&self, value: &T) -> bool;

    /// Number of elements (the set's size).
    ///
    /// Exact for the sequential and coarse-grained sets; see
    /// [`SizeMode`](crate::SizeMode) for the striped and refinable ones.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Implements `SetOps` by forwarding to the inherent methods of the same name.
macro_rules! forward_set_ops {
    ($set:ident) => {
        impl<T, S> $crate::SetOps<T> for $set<T, S>
        where
            T: core::hash::Hash + Eq,
            S: core::hash::BuildHasher,
        {
            #[inline]
            fn add(&self, value: T) -> bool {
                $set::add(self, value)
            }

            #[inline]
            fn remove(&self, value: &T) -> bool {
                $set::remove(self, value)
            }

            #[inline]
            fn contains(&self, value: &T) -> bool {
                $set::contains(self, value)
            }

            #[inline]
            fn len(&self) -> usize {
                $set::len(self)
            }
        }
    };
}

pub(crate) use forward_set_ops;
