//! Construction parameters and their validation.

use core::fmt;
use core::hash::{BuildHasher, Hash};

use crate::coarse::CoarseHashSet;
use crate::policy::GrowthPolicy;
use crate::refinable::RefinableHashSet;
use crate::sequential::SequentialHashSet;
use crate::striped::StripedHashSet;
use crate::DefaultHashBuilder;

/// Bucket count of a set built without an explicit capacity.
pub const DEFAULT_CAPACITY: usize = 4;

/// How `len()` is computed by the strategies that keep an atomic counter.
///
/// The sequential and coarse-grained sets are always exact and ignore this.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SizeMode {
    /// Read the atomic counter without locking.
    ///
    /// The counter is updated with fetch-add / fetch-sub under the lock that
    /// performed the chain mutation, so it never loses updates, but a reader
    /// may observe it one update behind a concurrent writer.
    #[default]
    Counter,
    /// Acquire every lock in ascending order and sum the chains.
    ///
    /// Linearizable, at the cost of briefly serializing the whole set.
    Exact,
}

/// Invalid construction parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BuildError {
    /// The initial capacity must be at least one bucket.
    ZeroCapacity,
    /// A striped set needs at least one stripe.
    ZeroStripes,
    /// A growth policy with a zero load factor would grow on every insert.
    ZeroLoadFactor,
    /// The stripe count must divide the initial capacity, so that a hash
    /// selects the same stripe in every capacity epoch.
    StripesMustDivideCapacity { stripes: usize, capacity: usize },
}

impl std::error::Error for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ZeroCapacity => f.write_str("initial capacity must be non-zero"),
            BuildError::ZeroStripes => f.write_str("stripe count must be non-zero"),
            BuildError::ZeroLoadFactor => f.write_str("growth load factor must be non-zero"),
            BuildError::StripesMustDivideCapacity { stripes, capacity } => write!(
                f,
                "stripe count {} does not divide initial capacity {}",
                stripes, capacity
            ),
        }
    }
}

/// Validated parameters handed to a set constructor.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Config {
    pub(crate) capacity: usize,
    pub(crate) growth: GrowthPolicy,
    pub(crate) size_mode: SizeMode,
}

impl Config {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "{}", BuildError::ZeroCapacity);
        Self {
            capacity,
            growth: GrowthPolicy::default(),
            size_mode: SizeMode::default(),
        }
    }
}

/// Fallible, by-value builder for all four set strategies.
///
/// ```
/// use concurrent_hashset::{Builder, GrowthPolicy, SizeMode};
///
/// let set = Builder::new()
///     .initial_capacity(16)
///     .stripes(4)
///     .growth(GrowthPolicy::DEEP)
///     .size_mode(SizeMode::Exact)
///     .build_striped::<u32>()
///     .unwrap();
///
/// assert!(set.add(7));
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.stripe_count(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct Builder<S = DefaultHashBuilder> {
    initial_capacity: usize,
    stripes: Option<usize>,
    load_factor: usize,
    size_mode: SizeMode,
    hasher: S,
}

impl Builder {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Builder<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            stripes: None,
            load_factor: GrowthPolicy::default().load(),
            size_mode: SizeMode::default(),
            hasher,
        }
    }

    /// Number of buckets allocated up front.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Number of stripe locks of a striped set. Defaults to the initial
    /// capacity; ignored by the other strategies.
    pub fn stripes(mut self, stripes: usize) -> Self {
        self.stripes = Some(stripes);
        self
    }

    pub fn growth(mut self, policy: GrowthPolicy) -> Self {
        self.load_factor = policy.load();
        self
    }

    /// Grow once chains are, on average, `load_factor` entries deep.
    ///
    /// Unlike [`GrowthPolicy::max_load`], a zero is accepted here and
    /// reported by the `build_*` methods.
    pub fn load_factor(mut self, load_factor: usize) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn size_mode(mut self, mode: SizeMode) -> Self {
        self.size_mode = mode;
        self
    }

    /// Replaces the hasher, changing the builder's hasher type.
    pub fn hasher<S2>(self, hasher: S2) -> Builder<S2> {
        Builder {
            initial_capacity: self.initial_capacity,
            stripes: self.stripes,
            load_factor: self.load_factor,
            size_mode: self.size_mode,
            hasher,
        }
    }

    fn config(&self) -> Result<Config, BuildError> {
        if self.initial_capacity == 0 {
            return Err(BuildError::ZeroCapacity);
        }
        let growth = GrowthPolicy::max_load(self.load_factor).ok_or(BuildError::ZeroLoadFactor)?;
        Ok(Config {
            capacity: self.initial_capacity,
            growth,
            size_mode: self.size_mode,
        })
    }

    fn stripe_count(&self, capacity: usize) -> Result<usize, BuildError> {
        let stripes = self.stripes.unwrap_or(capacity);
        if stripes == 0 {
            return Err(BuildError::ZeroStripes);
        }
        if capacity % stripes != 0 {
            return Err(BuildError::StripesMustDivideCapacity { stripes, capacity });
        }
        Ok(stripes)
    }
}

impl<S: BuildHasher> Builder<S> {
    pub fn build_sequential<T: Hash + Eq>(self) -> Result<SequentialHashSet<T, S>, BuildError> {
        let config = self.config()?;
        Ok(SequentialHashSet::from_config(config, self.hasher))
    }

    pub fn build_coarse<T: Hash + Eq>(self) -> Result<CoarseHashSet<T, S>, BuildError> {
        let config = self.config()?;
        Ok(CoarseHashSet::from_config(config, self.hasher))
    }

    pub fn build_striped<T: Hash + Eq>(self) -> Result<StripedHashSet<T, S>, BuildError> {
        let config = self.config()?;
        let stripes = self.stripe_count(config.capacity)?;
        Ok(StripedHashSet::from_config(config, stripes, self.hasher))
    }

    pub fn build_refinable<T: Hash + Eq>(self) -> Result<RefinableHashSet<T, S>, BuildError> {
        let config = self.config()?;
        Ok(RefinableHashSet::from_config(config, self.hasher))
    }
}
