#![cfg(test)]

// Property tests for FixedMap and GrowableMap kept inside the crate so the
// same state machine can drive both variants through one trait.

use crate::{FixedMap, GrowableMap, InsertError};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    RetainAtLeast(i32),
    AddToValues(i32),
    PrefixKeys,
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "_?[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => any::<i32>().prop_map(OpI::RetainAtLeast),
            1 => any::<i32>().prop_map(OpI::AddToValues),
            1 => Just(OpI::PrefixKeys),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Common surface of both variants as seen by the state machine.
trait MapUnderTest: Default {
    // Entry count at which inserts start failing, if any.
    const CEILING: Option<usize>;
    fn try_insert(&mut self, k: Key, v: i32) -> Result<Option<i32>, InsertError>;
    fn remove(&mut self, k: &str) -> Option<i32>;
    fn get(&self, k: &str) -> Option<i32>;
    fn contains(&self, k: &str) -> bool;
    fn retain_at_least(&mut self, t: i32);
    fn add_to_values(&mut self, d: i32);
    fn prefix_keys(&mut self);
    fn entries(&self) -> Vec<(Key, i32)>;
    fn iter_len(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn clear(&mut self);
}

macro_rules! impl_map_under_test {
    ($ty:ty, $ceiling:expr, |$m:ident, $k:ident, $v:ident| $insert:expr) => {
        impl<S: BuildHasher + Default> MapUnderTest for $ty {
            const CEILING: Option<usize> = $ceiling;
            fn try_insert(&mut self, $k: Key, $v: i32) -> Result<Option<i32>, InsertError> {
                let $m = self;
                $insert
            }
            fn remove(&mut self, k: &str) -> Option<i32> {
                <$ty>::remove(self, k)
            }
            fn get(&self, k: &str) -> Option<i32> {
                <$ty>::get(self, k).copied()
            }
            fn contains(&self, k: &str) -> bool {
                self.contains_key(k)
            }
            fn retain_at_least(&mut self, t: i32) {
                self.retain(|_, v| *v >= t);
            }
            fn add_to_values(&mut self, d: i32) {
                self.iter_values_mut(|v| v.wrapping_add(d));
            }
            fn prefix_keys(&mut self) {
                self.iter_keys_mut(|k| Key(format!("_{}", k.0)));
            }
            fn entries(&self) -> Vec<(Key, i32)> {
                <$ty>::entries(self)
            }
            fn iter_len(&self) -> usize {
                self.iter().len()
            }
            fn len(&self) -> usize {
                <$ty>::len(self)
            }
            fn is_empty(&self) -> bool {
                <$ty>::is_empty(self)
            }
            fn clear(&mut self) {
                <$ty>::clear(self)
            }
        }
    };
}

impl_map_under_test!(GrowableMap<Key, i32, S>, None, |m, k, v| Ok(GrowableMap::insert(m, k, v)));
impl_map_under_test!(FixedMap<Key, i32, 16, S>, Some(12), |m, k, v| FixedMap::try_insert(m, k, v));

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns the previous value; overwrites never change `len`.
// - fixed maps refuse inserts exactly at the 3/4 ceiling and stay unchanged.
// - get/contains parity for pool keys and arbitrary strings.
// - remove returns the model's value; missing keys are a no-op.
// - retain / value rewrite / key rebuild match the same transform on the model.
// - entries() equals the model's contents; iter() is exact-sized.
fn run_state_machine<M: MapUnderTest>(pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError> {
    let mut sut = M::default();
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let full = M::CEILING.map_or(false, |c| model.len() >= c);
                match sut.try_insert(k.clone(), v) {
                    Ok(prev) => {
                        prop_assert!(!full, "insert must fail at the ceiling");
                        prop_assert_eq!(prev, model.insert(k, v));
                    }
                    Err(InsertError::LoadFactorExceeded { len, capacity }) => {
                        prop_assert!(full, "insert refused below the ceiling");
                        prop_assert_eq!(len, model.len());
                        prop_assert_eq!(capacity, 16);
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(&k.0), model.remove(&k));
                prop_assert!(!sut.contains(&k.0));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k.0), model.get(&k).copied());
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains(&s), has_model);
            }
            OpI::RetainAtLeast(t) => {
                sut.retain_at_least(t);
                model.retain(|_, v| *v >= t);
            }
            OpI::AddToValues(d) => {
                sut.add_to_values(d);
                for v in model.values_mut() {
                    *v = v.wrapping_add(d);
                }
            }
            OpI::PrefixKeys => {
                sut.prefix_keys();
                model = model
                    .into_iter()
                    .map(|(k, v)| (Key(format!("_{}", k.0)), v))
                    .collect();
            }
            OpI::Iterate => {
                let s: BTreeMap<_, _> = sut.entries().into_iter().collect();
                let m: BTreeMap<_, _> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
                prop_assert_eq!(sut.iter_len(), model.len());
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.entries().len(), model.len());
        for k in pool {
            prop_assert_eq!(sut.get(k), model.get(k.as_str()).copied());
        }
    }
    Ok(())
}

// Constant hasher to stress equality resolution: every key shares one probe
// sequence, so lookups walk chains of collisions and tombstones.
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
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_growable_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine::<GrowableMap<Key, i32>>(&pool, ops)?;
    }

    #[test]
    fn prop_fixed_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine::<FixedMap<Key, i32, 16>>(&pool, ops)?;
    }

    #[test]
    fn prop_growable_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine::<GrowableMap<Key, i32, ConstBuildHasher>>(&pool, ops)?;
    }

    #[test]
    fn prop_fixed_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine::<FixedMap<Key, i32, 16, ConstBuildHasher>>(&pool, ops)?;
    }
}
