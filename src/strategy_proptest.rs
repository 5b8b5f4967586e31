#![cfg(test)]

// Property tests for every strategy, kept inside the crate so they can audit
// the bucket layout (placement, duplicates, size) after each step.

use crate::table::Audit;
use crate::{
    Builder, CoarseHashSet, RefinableHashSet, SequentialHashSet, SetOps, SizeMode, StripedHashSet,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashSet;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Eq, PartialEq, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug)]
enum Op {
    Add(usize),
    Remove(usize),
    Contains(usize),
    ContainsFresh(String),
    Len,
}

/// Table shape shared by all strategies of one scenario.
#[derive(Clone, Copy, Debug)]
struct Shape {
    capacity: usize,
    stripes: usize,
    load: usize,
    exact: bool,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    (0u32..4, 0u32..4, 1usize..=4, any::<bool>()).prop_map(|(c, s, load, exact)| {
        let capacity = 1usize << c;
        // Stripes are a power of two no larger than the capacity, so they divide it.
        let stripes = 1usize << s.min(c);
        Shape {
            capacity,
            stripes,
            load,
            exact,
        }
    })
}

fn arb_scenario() -> impl Strategy<Value = (Shape, Vec<String>, Vec<Op>)> {
    (arb_shape(), proptest::collection::vec("[a-z]{0,4}", 1..=16)).prop_flat_map(
        |(shape, pool)| {
            let idx = 0..pool.len();
            let op = prop_oneof![
                4 => idx.clone().prop_map(Op::Add),
                2 => idx.clone().prop_map(Op::Remove),
                2 => idx.prop_map(Op::Contains),
                1 => "[A-Z]{1,3}".prop_map(Op::ContainsFresh),
                1 => Just(Op::Len),
            ];
            proptest::collection::vec(op, 1..120).prop_map(move |ops| (shape, pool.clone(), ops))
        },
    )
}

trait Audited: SetOps<Key> {
    fn audit_now(&self) -> Audit;
    fn capacity_now(&self) -> usize;
}

macro_rules! audited {
    ($set:ident) => {
        impl<S: BuildHasher> Audited for $set<Key, S> {
            fn audit_now(&self) -> Audit {
                self.audit()
            }
            fn capacity_now(&self) -> usize {
                self.capacity()
            }
        }
    };
}

audited!(SequentialHashSet);
audited!(CoarseHashSet);
audited!(StripedHashSet);
audited!(RefinableHashSet);

fn builder<S>(shape: Shape, hasher: S) -> Builder<S> {
    Builder::with_hasher(hasher)
        .initial_capacity(shape.capacity)
        .stripes(shape.stripes)
        .load_factor(shape.load)
        .size_mode(if shape.exact {
            SizeMode::Exact
        } else {
            SizeMode::Counter
        })
}

// Drives one set against a std HashSet model. After every step:
// - `len` and `is_empty` agree with the model;
// - the audit finds exactly `len` entries, none misplaced, none duplicated;
// - capacity is the initial capacity times a power of two and never shrinks.
fn run_scenario(
    sut: &dyn Audited,
    shape: Shape,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashSet<Key> = HashSet::new();
    let mut last_capacity = sut.capacity_now();
    prop_assert_eq!(last_capacity, shape.capacity);

    for op in ops {
        match op {
            Op::Add(i) => {
                let k = Key(pool[i].clone());
                let fresh = !model.contains(&k);
                prop_assert_eq!(sut.add(k.clone()), fresh, "add returns whether new");
                model.insert(k);
            }
            Op::Remove(i) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::Contains(i) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.contains(&k), model.contains(&k));
            }
            Op::ContainsFresh(s) => {
                prop_assert!(!sut.contains(&Key(s)), "never-added key found");
            }
            Op::Len => {}
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());

        let audit = sut.audit_now();
        prop_assert!(audit.is_sound(model.len()), "unsound table: {:?}", audit);

        let capacity = sut.capacity_now();
        prop_assert!(capacity >= last_capacity, "capacity shrank");
        prop_assert_eq!(capacity % shape.capacity, 0);
        prop_assert!((capacity / shape.capacity).is_power_of_two());
        last_capacity = capacity;
    }
    Ok(())
}

// Property: every strategy behaves as a set, with a sound table after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_all_strategies((shape, pool, ops) in arb_scenario()) {
        let hasher = crate::DefaultHashBuilder::default();
        let seq = builder(shape, hasher.clone()).build_sequential::<Key>().unwrap();
        run_scenario(&seq, shape, &pool, ops.clone())?;
        let coarse = builder(shape, hasher.clone()).build_coarse::<Key>().unwrap();
        run_scenario(&coarse, shape, &pool, ops.clone())?;
        let striped = builder(shape, hasher.clone()).build_striped::<Key>().unwrap();
        run_scenario(&striped, shape, &pool, ops.clone())?;
        let refinable = builder(shape, hasher).build_refinable::<Key>().unwrap();
        run_scenario(&refinable, shape, &pool, ops)?;
    }
}

// Property: identical operation sequences drive all strategies through
// identical capacities (same hasher, same policy).
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_strategies_grow_alike((shape, pool, ops) in arb_scenario()) {
        let hasher = crate::DefaultHashBuilder::default();
        let sets: Vec<Box<dyn Audited>> = vec![
            Box::new(builder(shape, hasher.clone()).build_sequential::<Key>().unwrap()) as Box<dyn Audited>,
            Box::new(builder(shape, hasher.clone()).build_coarse::<Key>().unwrap()) as Box<dyn Audited>,
            Box::new(builder(shape, hasher.clone()).build_striped::<Key>().unwrap()) as Box<dyn Audited>,
            Box::new(builder(shape, hasher).build_refinable::<Key>().unwrap()) as Box<dyn Audited>,
        ];
        for op in ops {
            let results: Vec<bool> = sets
                .iter()
                .map(|s| match &op {
                    Op::Add(i) => s.add(Key(pool[*i].clone())),
                    Op::Remove(i) => s.remove(&Key(pool[*i].clone())),
                    Op::Contains(i) => s.contains(&Key(pool[*i].clone())),
                    Op::ContainsFresh(f) => s.contains(&Key(f.clone())),
                    Op::Len => s.is_empty(),
                })
                .collect();
            prop_assert!(results.windows(2).all(|w| w[0] == w[1]), "{:?} diverged: {:?}", op, results);
            let caps: Vec<usize> = sets.iter().map(|s| s.capacity_now()).collect();
            prop_assert!(caps.windows(2).all(|w| w[0] == w[1]), "capacities diverged: {:?}", caps);
        }
    }
}

// Collision variant using a constant hasher: every element shares one chain
// per table, stressing equality probing and migration of long chains.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_all_strategies_with_collisions((shape, pool, ops) in arb_scenario()) {
        let seq = builder(shape, ConstBuildHasher).build_sequential::<Key>().unwrap();
        run_scenario(&seq, shape, &pool, ops.clone())?;
        let coarse = builder(shape, ConstBuildHasher).build_coarse::<Key>().unwrap();
        run_scenario(&coarse, shape, &pool, ops.clone())?;
        let striped = builder(shape, ConstBuildHasher).build_striped::<Key>().unwrap();
        run_scenario(&striped, shape, &pool, ops.clone())?;
        let refinable = builder(shape, ConstBuildHasher).build_refinable::<Key>().unwrap();
        run_scenario(&refinable, shape, &pool, ops)?;
    }
}
