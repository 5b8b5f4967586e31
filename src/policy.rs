//! Sizing policy: when to grow, and to what.

/// Load-factor trigger shared by every strategy.
///
/// A set grows once `len >= max_load * capacity`, i.e. once its chains are on
/// average `max_load` entries deep. Growth always doubles the bucket count.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct GrowthPolicy {
    max_load: usize,
}

impl GrowthPolicy {
    /// Grow as soon as there are as many elements as buckets.
    pub const SATURATED: Self = Self { max_load: 1 };

    /// Grow once chains are, on average, four entries deep.
    pub const DEEP: Self = Self { max_load: 4 };

    /// Creates a policy with the given average chain depth.
    ///
    /// Returns `None` for `max_load == 0`, which would grow on every insert.
    pub const fn max_load(max_load: usize) -> Option<Self> {
        if max_load == 0 {
            None
        } else {
            Some(Self { max_load })
        }
    }

    /// The average chain depth that triggers growth.
    pub const fn load(&self) -> usize {
        self.max_load
    }

    /// Whether a table of `capacity` buckets holding `len` elements is due
    /// for a migration.
    #[inline]
    pub fn should_grow(&self, len: usize, capacity: usize) -> bool {
        len >= capacity.saturating_mul(self.max_load)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::SATURATED
    }
}

/// The capacity after one migration.
///
/// # Panics
///
/// Panics if doubling overflows `usize`; the table could not be allocated
/// anyway.
#[inline]
pub(crate) fn doubled(capacity: usize) -> usize {
    match capacity.checked_mul(2) {
        Some(c) => c,
        None => capacity_overflow(),
    }
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("hash set capacity overflow")
}
