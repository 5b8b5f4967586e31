//! concurrent-hashset: a resizable, separately-chained hash set offered under
//! four interchangeable concurrency-control strategies.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one logical data structure (a table of short chains that doubles
//!   when it gets too full) and four ways of serializing access to it, all
//!   behind the same `SetOps` contract (add / remove / contains / len).
//! - Strategies:
//!   - SequentialHashSet<T, S>: no synchronization; `!Sync`, so it cannot be
//!     shared between threads. The correctness and performance baseline.
//!   - CoarseHashSet<T, S>: one mutex around the table and the size; every
//!     operation (and `len`) is totally ordered by it.
//!   - StripedHashSet<T, S>: a fixed array of `L` stripe locks; bucket `i`
//!     is guarded by stripe `i % L`. Migration holds every stripe.
//!   - RefinableHashSet<T, S>: one lock per bucket; the lock array grows
//!     with the table, and an atomic ownership word elects a single resizer.
//!
//! Shared pieces
//! - `table`: chains of `Entry { hash, value }`. The hash is computed once
//!   per operation with the set's `BuildHasher` and stored on insert, so a
//!   migration never calls back into `T: Hash`.
//! - `policy`: `GrowthPolicy` decides when a migration is due
//!   (`len >= max_load * capacity`) and doubling computes the new capacity.
//!
//! Capacity epochs
//! - Every operation maps its hash to a bucket against the capacity it sees.
//!   Where capacity can change between that read and taking the bucket's
//!   lock, the capacity is either read under the lock (striped) or
//!   re-validated after locking, with a retry on mismatch (refinable).
//! - Capacity only doubles, so observing the same value twice proves that no
//!   migration happened in between.
//!
//! Lock ordering
//! - Per-operation paths hold at most one stripe/bucket lock.
//! - Every path that holds several (migration, exact `len`) takes them in
//!   ascending index order. The refinable set keeps a lock's index stable
//!   across migrations by reusing old locks for the lower half of the table.
//!
//! Size
//! - Sequential and coarse: exact.
//! - Striped and refinable: `SizeMode::Counter` (default) reads an atomic
//!   counter updated with fetch-add / fetch-sub under the mutating lock;
//!   `SizeMode::Exact` locks everything in order and sums the chains.
//!
//! Failure model
//! - Operations never fail. Allocation failure aborts and capacity overflow
//!   panics; neither leaves a usable set behind.
//! - Construction parameters are validated by `Builder`, which reports
//!   `BuildError`; the convenience constructors panic instead.
//! - Locks are `parking_lot` locks and do not poison: a panic in user `Eq`
//!   or `Hash` unwinds out of the operation and leaves the table sound.
//!
//! Notes and non-goals
//! - No iteration, no bulk clear, no shrinking.
//! - Migrations are logged at `trace` level through the `log` facade.

mod coarse;
mod config;
mod policy;
mod reentrancy;
mod refinable;
mod resize;
mod sequential;
mod set_ops;
mod striped;
mod table;

#[cfg(test)]
mod strategy_proptest;

/// Hasher used when none is given; `hashbrown`'s default builder.
pub use hashbrown::hash_map::DefaultHashBuilder;

// Public surface
pub use coarse::CoarseHashSet;
pub use config::{BuildError, Builder, SizeMode, DEFAULT_CAPACITY};
pub use policy::GrowthPolicy;
pub use refinable::RefinableHashSet;
pub use sequential::SequentialHashSet;
pub use set_ops::SetOps;
pub use striped::StripedHashSet;
