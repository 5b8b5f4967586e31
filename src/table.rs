//! Bucket store shared by every strategy.
//!
//! A bucket is a short, duplicate-free chain of entries. Each entry keeps
//! the hash computed on insertion; re-indexing during a migration always
//! uses the stored hash, so `T: Hash` is never invoked after insertion.

use core::borrow::Borrow;
use core::mem;

use crate::policy;

#[derive(Debug)]
pub(crate) struct Entry<T> {
    pub(crate) hash: u64,
    pub(crate) value: T,
}

pub(crate) type Chain<T> = Vec<Entry<T>>;

/// Bucket index of `hash` in a table of `capacity` buckets.
#[inline]
pub(crate) fn index_for(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (hash % capacity as u64) as usize
}

pub(crate) fn empty_chains<T>(n: usize) -> Vec<Chain<T>> {
    (0..n).map(|_| Chain::new()).collect()
}

#[inline]
pub(crate) fn chain_contains<T, Q>(chain: &[Entry<T>], hash: u64, q: &Q) -> bool
where
    T: Borrow<Q>,
    Q: ?Sized + Eq,
{
    chain.iter().any(|e| e.hash == hash && e.value.borrow() == q)
}

/// Appends `value` unless an equal element is already chained.
#[inline]
pub(crate) fn chain_insert<T: Eq>(chain: &mut Chain<T>, hash: u64, value: T) -> bool {
    if chain_contains(chain, hash, &value) {
        return false;
    }
    chain.push(Entry { hash, value });
    true
}

/// Removes the first element equal to `q`; insertion order of the rest is kept.
#[inline]
pub(crate) fn chain_remove<T, Q>(chain: &mut Chain<T>, hash: u64, q: &Q) -> bool
where
    T: Borrow<Q>,
    Q: ?Sized + Eq,
{
    match chain
        .iter()
        .position(|e| e.hash == hash && e.value.borrow() == q)
    {
        Some(pos) => {
            chain.remove(pos);
            true
        }
        None => false,
    }
}

/// A flat table of chains, used by the strategies that guard the whole
/// store at once.
#[derive(Debug)]
pub(crate) struct Table<T> {
    buckets: Vec<Chain<T>>,
}

impl<T> Table<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            buckets: empty_chains(capacity),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn chain(&self, hash: u64) -> &Chain<T> {
        &self.buckets[index_for(hash, self.capacity())]
    }

    #[inline]
    pub(crate) fn chain_mut(&mut self, hash: u64) -> &mut Chain<T> {
        let i = index_for(hash, self.capacity());
        &mut self.buckets[i]
    }

    /// Doubles the bucket count and splits every old chain in place.
    ///
    /// Under doubling, an entry of bucket `i` lands either in `i` or in
    /// `i + old_capacity`, so the old buckets are revisited exactly once.
    pub(crate) fn grow(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = policy::doubled(old_capacity);
        self.buckets.resize_with(new_capacity, Chain::new);

        for i in 0..old_capacity {
            let chain = mem::take(&mut self.buckets[i]);
            for entry in chain {
                let b = index_for(entry.hash, new_capacity);
                debug_assert!(b == i || b == i + old_capacity);
                self.buckets[b].push(entry);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn buckets(&self) -> &[Chain<T>] {
        &self.buckets
    }
}

/// Structural health report of a table, used by the tests.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Audit {
    /// Number of buckets.
    pub(crate) capacity: usize,
    /// Sum of chain lengths.
    pub(crate) entries: usize,
    /// Entries whose stored hash does not map to the bucket holding them.
    pub(crate) misplaced: usize,
    /// Pairs of equal elements within a single chain.
    pub(crate) duplicates: usize,
}

#[cfg(test)]
impl Audit {
    /// Audits buckets given in index order.
    pub(crate) fn of<'a, T, I>(capacity: usize, buckets: I) -> Self
    where
        T: Eq + 'a,
        I: IntoIterator<Item = (usize, &'a [Entry<T>])>,
    {
        let mut audit = Audit {
            capacity,
            ..Audit::default()
        };
        for (i, chain) in buckets {
            audit.entries += chain.len();
            audit.misplaced += chain
                .iter()
                .filter(|e| index_for(e.hash, capacity) != i)
                .count();
            for (n, a) in chain.iter().enumerate() {
                audit.duplicates += chain[n + 1..].iter().filter(|b| b.value == a.value).count();
            }
        }
        audit
    }

    /// True when the table holds `len` entries, all placed and unique.
    pub(crate) fn is_sound(&self, len: usize) -> bool {
        self.entries == len && self.misplaced == 0 && self.duplicates == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit<T: Eq>(t: &Table<T>) -> Audit {
        Audit::of(
            t.capacity(),
            t.buckets().iter().enumerate().map(|(i, c)| (i, c.as_slice())),
        )
    }

    /// Invariant: a chain never holds two equal elements.
    #[test]
    fn chain_insert_deduplicates() {
        let mut c: Chain<&str> = Chain::new();
        assert!(chain_insert(&mut c, 7, "a"));
        assert!(!chain_insert(&mut c, 7, "a"));
        assert!(chain_insert(&mut c, 7, "b"));
        assert_eq!(c.len(), 2);
    }

    /// Invariant: the stored hash gates equality; an equal value with a
    /// different hash is a different entry from the chain's point of view.
    #[test]
    fn hash_is_checked_before_eq() {
        let mut c: Chain<u32> = Chain::new();
        chain_insert(&mut c, 1, 10);
        assert!(!chain_contains(&c, 2, &10));
        assert!(chain_contains(&c, 1, &10));
    }

    /// Invariant: removal keeps the remaining entries in insertion order.
    #[test]
    fn chain_remove_keeps_order() {
        let mut c: Chain<u32> = Chain::new();
        for v in [1, 2, 3, 4] {
            chain_insert(&mut c, 0, v);
        }
        assert!(chain_remove(&mut c, 0, &2));
        assert!(!chain_remove(&mut c, 0, &2));
        let rest: Vec<u32> = c.iter().map(|e| e.value).collect();
        assert_eq!(rest, vec![1, 3, 4]);
    }

    /// Invariant: borrowed lookups work on owned chains (`String` vs `str`).
    #[test]
    fn borrowed_lookup() {
        let mut c: Chain<String> = Chain::new();
        chain_insert(&mut c, 3, "hello".to_string());
        assert!(chain_contains(&c, 3, "hello"));
        assert!(chain_remove(&mut c, 3, "hello"));
        assert!(c.is_empty());
    }

    /// Invariant: growth doubles capacity, re-indexes every entry and loses
    /// nothing.
    #[test]
    fn grow_rehashes_without_loss() {
        let mut t: Table<u64> = Table::with_capacity(4);
        for v in 0..64u64 {
            let hash = v.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            assert!(chain_insert(t.chain_mut(hash), hash, v));
        }
        assert!(audit(&t).is_sound(64));

        t.grow();
        assert_eq!(t.capacity(), 8);
        assert!(audit(&t).is_sound(64));

        t.grow();
        t.grow();
        assert_eq!(t.capacity(), 32);
        assert!(audit(&t).is_sound(64));
        for v in 0..64u64 {
            let hash = v.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            assert!(chain_contains(t.chain(hash), hash, &v));
        }
    }

    /// Invariant: the audit reports misplaced entries and duplicates.
    #[test]
    fn audit_detects_corruption() {
        let chain = vec![
            Entry { hash: 1, value: 5u8 },
            Entry { hash: 1, value: 5u8 },
            Entry { hash: 0, value: 6u8 },
        ];
        let a = Audit::of(2, [(1usize, chain.as_slice())]);
        assert_eq!(a.entries, 3);
        assert_eq!(a.misplaced, 1);
        assert_eq!(a.duplicates, 1);
        assert!(!a.is_sound(3));
    }
}
