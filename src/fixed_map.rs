//! FixedMap: fixed-capacity table with a uniform probe count per operation.
//!
//! Every keyed operation walks the full probe cycle of `N` attempts and
//! latches the first hit instead of returning early, so the amount of work
//! does not depend on where (or whether) the key is found.
//! The guarantee covers probe attempts only: key comparisons stop once a
//! match has been latched.

use crate::error::InsertError;
use crate::load_factor;
use crate::probe::ProbeSeq;
use crate::slot::Slot;
use crate::table::{self, Iter, IterMut};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

#[cfg(test)]
thread_local! {
    static ATTEMPTS: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
}

/// Records one probe attempt; test builds read the tally back.
#[inline]
fn count_attempt() {
    #[cfg(test)]
    ATTEMPTS.with(|a| a.set(a.get() + 1));
}

#[derive(Clone)]
pub struct FixedMap<K, V, const N: usize, S = DefaultHashBuilder> {
    table: [Slot<K, V>; N],
    len: usize,
    hasher: S,
}

impl<K, V, const N: usize> FixedMap<K, V, N>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, const N: usize, S> Default for FixedMap<K, V, N, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, const N: usize, S> FixedMap<K, V, N, S> {
    // Triangular probing only covers every slot for power-of-two sizes.
    const POWER_OF_TWO: () = assert!(
        N.is_power_of_two(),
        "FixedMap capacity must be a power of two"
    );

    pub fn with_hasher(hasher: S) -> Self {
        let () = Self::POWER_OF_TWO;
        Self {
            table: core::array::from_fn(|_| Slot::default()),
            len: 0,
            hasher,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot count; the map holds strictly fewer than `3 * N / 4` entries
    /// before an insert, so at most `ceil(3 * N / 4)` overall.
    pub fn capacity(&self) -> usize {
        N
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drop every entry. All `N` slots go back to empty.
    pub fn clear(&mut self) {
        for slot in self.table.iter_mut() {
            *slot = Slot::default();
        }
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table, self.len)
    }

    pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut V> + '_ {
        IterMut::new(&mut self.table, self.len).map(|(_, v)| v)
    }

    /// Owned snapshot of every entry. Unaffected by later mutation of the map.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        table::snapshot(&self.table, self.len)
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let keys: Vec<K> = self.iter().map(|(k, _)| k.clone()).collect();
        table::verify_len(keys.len(), self.len);
        keys
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let values: Vec<V> = self.iter().map(|(_, v)| v.clone()).collect();
        table::verify_len(values.len(), self.len);
        values
    }

    /// Keep only the entries for which `keep` returns `true`. Each slot is
    /// visited once and surviving entries stay where they are.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for slot in self.table.iter_mut() {
            if let Some((k, v)) = slot.pair() {
                if !keep(k, v) {
                    slot.mark_deleted();
                    self.len -= 1;
                }
            }
        }
    }

    /// Rewrite every value in place.
    pub fn iter_values_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(V) -> V,
    {
        for slot in self.table.iter_mut() {
            slot.map_value(&mut f);
        }
    }
}

impl<K, V, const N: usize, S> FixedMap<K, V, N, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Full probe cycle; returns the first valid slot holding `q`.
    fn scan<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let mut found = None;
        for index in ProbeSeq::new(hash, N) {
            count_attempt();
            let slot = &self.table[index];
            if found.is_none() && slot.is_valid() {
                // SAFETY: validity checked in the condition above.
                let (key, _) = unsafe { slot.pair_unchecked() };
                if key.borrow() == q {
                    found = Some(index);
                }
            }
        }
        found
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.scan(q)?;
        self.table[index].pair().map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.scan(q)?;
        self.table[index].pair_mut().map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).is_some()
    }

    /// Insert or overwrite, returning the previous value for `key`.
    ///
    /// Fails without touching the table once `len` has reached three quarters
    /// of `N`; this is checked before the key is looked at, so an overwrite of
    /// an existing key is refused as well.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        if load_factor::exceeded(self.len, N) {
            return Err(InsertError::LoadFactorExceeded {
                len: self.len,
                capacity: N,
            });
        }

        let hash = self.make_hash(&key);
        let mut matching = None;
        let mut available = None;
        for index in ProbeSeq::new(hash, N) {
            count_attempt();
            let slot = &self.table[index];
            if slot.is_valid() {
                // SAFETY: validity checked in the condition above.
                if matching.is_none() && unsafe { slot.pair_unchecked() }.0 == key {
                    matching = Some(index);
                }
            } else if available.is_none() && slot.is_available() {
                available = Some(index);
            }
        }

        match (matching, available) {
            (Some(index), _) => Ok(self.table[index].set(key, value).map(|(_, old)| old)),
            (None, Some(index)) => {
                self.table[index].set(key, value);
                self.len += 1;
                Ok(None)
            }
            (None, None) => unreachable!("a table below 3/4 load always has a free slot"),
        }
    }

    /// Insert or overwrite, returning the previous value for `key`.
    ///
    /// # Panics
    /// When the map is already at its load-factor ceiling. Use
    /// [`try_insert`](Self::try_insert) to handle that case instead.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(err) => {
                #[cfg(feature = "logging")]
                log::error!("FixedMap of {} slots refused an insert: {}", N, err);
                panic!("{err}")
            }
        }
    }

    /// Remove `q`, returning its value. Missing keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.scan(q)?;
        let (_, value) = self.table[index].take()?;
        self.len -= 1;
        Some(value)
    }

    /// Transform every entry. Keys decide slot positions, so the table is
    /// drained and the results re-inserted; when two results share a key the
    /// one produced later wins.
    pub fn iter_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(K, V) -> (K, V),
    {
        let entries = table::drain(&mut self.table, self.len);
        self.len = 0;
        for (k, v) in entries {
            let (k, v) = f(k, v);
            self.insert(k, v);
        }
    }

    /// Transform every key, rebuilding the table like [`iter_mut`](Self::iter_mut).
    pub fn iter_keys_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(K) -> K,
    {
        self.iter_mut(|k, v| (f(k), v));
    }
}

impl<K, V, const N: usize, S> PartialEq for FixedMap<K, V, N, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, const N: usize, S> Eq for FixedMap<K, V, N, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, const N: usize, S> fmt::Debug for FixedMap<K, V, N, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, const N: usize, S> Extend<(K, V)> for FixedMap<K, V, N, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// # Panics
    /// Like [`FixedMap::insert`], once the load-factor ceiling is reached.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, const N: usize, S> IntoIterator for &'a FixedMap<K, V, N, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;
    use std::collections::BTreeMap;

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
        } // every key shares one probe sequence
    }

    /// Invariant: `get` finds what `insert` stored; absent keys are `None`.
    #[test]
    fn insert_then_get() {
        let mut m: FixedMap<u32, &str, 8> = FixedMap::new();
        assert_eq!(m.insert(1, "one"), None);
        assert_eq!(m.insert(2, "two"), None);
        assert_eq!(m.get(&1), Some(&"one"));
        assert_eq!(m.get(&2), Some(&"two"));
        assert_eq!(m.get(&3), None);
        assert!(m.contains_key(&1));
        assert!(!m.contains_key(&3));
        assert_eq!(m.capacity(), 8);
    }

    /// Invariant: overwriting keeps `len` and hands back the old value.
    #[test]
    fn overwrite_keeps_len() {
        let mut m: FixedMap<u32, u32, 4> = FixedMap::new();
        m.insert(5, 1);
        assert_eq!(m.insert(5, 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&5), Some(&2));
    }

    /// Invariant: inserts stop at three quarters of `N`; `try_insert` reports
    /// it and leaves the map untouched.
    #[test]
    fn try_insert_refuses_at_ceiling() {
        let mut m: FixedMap<u32, u32, 4> = FixedMap::new();
        for k in 0..3 {
            assert_eq!(m.try_insert(k, k), Ok(None));
        }
        let err = m.try_insert(9, 9).unwrap_err();
        assert_eq!(
            err,
            InsertError::LoadFactorExceeded {
                len: 3,
                capacity: 4
            }
        );
        // Overwrites are refused as well: the check precedes the key lookup.
        assert!(m.try_insert(0, 100).is_err());
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(&0), Some(&0));
        assert!(!m.contains_key(&9));
    }

    /// Invariant: `insert` past the ceiling is fatal.
    #[test]
    #[should_panic(expected = "load factor exceeded")]
    fn insert_panics_at_ceiling() {
        let mut m: FixedMap<u32, u32, 2> = FixedMap::new();
        m.insert(1, 1);
        m.insert(2, 2);
    }

    /// Invariant: with every key colliding, entries are still told apart by
    /// `Eq`, and removal leaves later entries reachable past the tombstone.
    #[test]
    fn collisions_and_tombstones() {
        let mut m: FixedMap<&str, i32, 8, ConstBuildHasher> =
            FixedMap::with_hasher(ConstBuildHasher);
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        assert_eq!(m.remove("a"), Some(1));
        assert_eq!(m.get("b"), Some(&2));
        assert_eq!(m.get("c"), Some(&3));

        // Re-inserting an existing key after a tombstone must overwrite it,
        // not duplicate it into the freed slot.
        assert_eq!(m.insert("c", 30), Some(3));
        assert_eq!(m.len(), 2);
        assert_eq!(m.entries().len(), 2);

        // A new key does reuse the tombstone.
        m.insert("d", 4);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get("d"), Some(&4));
    }

    /// Invariant: a key stored on the last attempt of the cycle is still found.
    #[test]
    fn lookup_reaches_last_probe() {
        let mut m: FixedMap<u8, u8, 4, ConstBuildHasher> = FixedMap::with_hasher(ConstBuildHasher);
        m.insert(1, 10);
        m.insert(2, 20);
        m.insert(3, 30);
        m.remove(&1);
        m.remove(&2);
        assert_eq!(m.get(&3), Some(&30));
        assert_eq!(m.remove(&3), Some(30));
        assert!(m.is_empty());
    }

    fn attempts_during<R>(op: impl FnOnce() -> R) -> (R, usize) {
        ATTEMPTS.with(|a| a.set(0));
        let out = op();
        (out, ATTEMPTS.with(|a| a.get()))
    }

    /// Invariant: every keyed operation makes exactly `N` attempts, wherever
    /// (or whether) the key sits in its sequence.
    #[test]
    fn every_operation_walks_the_full_cycle() {
        let mut m: FixedMap<&str, u32, 8, ConstBuildHasher> =
            FixedMap::with_hasher(ConstBuildHasher);

        // Fresh insert into an empty table, then an overwrite of the same key.
        assert_eq!(attempts_during(|| m.insert("a", 1)), (None, 8));
        assert_eq!(attempts_during(|| m.insert("a", 2)), (Some(1), 8));

        // Fill to the ceiling; "f" lands on the sixth slot of the shared sequence.
        for (i, k) in ["b", "c", "d", "e", "f"].into_iter().enumerate() {
            assert_eq!(attempts_during(|| m.insert(k, i as u32)).1, 8);
        }
        assert_eq!(m.len(), 6);

        // Hit on the first attempt, hit deep in the sequence, and a miss.
        assert_eq!(attempts_during(|| m.get(&"a").copied()), (Some(2), 8));
        assert_eq!(attempts_during(|| m.get(&"f").copied()), (Some(4), 8));
        assert_eq!(attempts_during(|| m.get(&"z").copied()), (None, 8));
        assert_eq!(attempts_during(|| m.contains_key(&"z")), (false, 8));
        assert_eq!(attempts_during(|| m.get_mut(&"c").is_some()), (true, 8));

        // A refused insert is decided by the load check alone.
        let (refused, attempts) = attempts_during(|| m.try_insert("g", 0));
        assert!(refused.is_err());
        assert_eq!(attempts, 0);

        // Removal of a present key, then of the same key again.
        assert_eq!(attempts_during(|| m.remove(&"c")), (Some(1), 8));
        assert_eq!(attempts_during(|| m.remove(&"c")), (None, 8));

        // Past a tombstone the lookup still costs the same.
        assert_eq!(attempts_during(|| m.get(&"f").copied()), (Some(4), 8));
    }

    /// Invariant: removing a missing key is a silent no-op.
    #[test]
    fn remove_missing_is_noop() {
        let mut m: FixedMap<u32, u32, 4> = FixedMap::new();
        m.insert(1, 1);
        assert_eq!(m.remove(&1), Some(1));
        assert_eq!(m.remove(&1), None);
        assert!(m.is_empty());
        assert_eq!(m.get(&1), None);
    }

    /// Invariant: `retain` drops exactly the failing entries and fixes `len`.
    #[test]
    fn retain_filters() {
        let mut m: FixedMap<u64, u64, 8> = FixedMap::new();
        m.insert(5, 11);
        m.insert(2, 13);
        m.insert(11, 5);
        m.retain(|k, v| k * v == 55);
        assert_eq!(m.len(), 2);
        assert!(!m.contains_key(&2));
        let got: BTreeMap<_, _> = m.entries().into_iter().collect();
        assert_eq!(got, BTreeMap::from([(5, 11), (11, 5)]));
    }

    /// Invariant: key rebuild followed by value rewrite composes as expected.
    #[test]
    fn iter_keys_then_values() {
        let mut m: FixedMap<u64, u64, 8> = FixedMap::new();
        m.insert(2, 3);
        m.insert(5, 7);
        m.insert(11, 13);
        m.iter_keys_mut(|k| k * 2);
        m.iter_values_mut(|v| v * 5);
        let got: BTreeMap<_, _> = m.entries().into_iter().collect();
        assert_eq!(got, BTreeMap::from([(4, 15), (10, 35), (22, 65)]));
        assert_eq!(m.get(&2), None);
    }

    /// Invariant: colliding results of a key rebuild collapse to one entry.
    #[test]
    fn iter_mut_collapses_collisions() {
        let mut m: FixedMap<u32, u32, 8> = FixedMap::new();
        m.insert(1, 1);
        m.insert(2, 2);
        m.insert(3, 3);
        m.iter_mut(|k, v| (k % 2, v));
        assert_eq!(m.len(), 2);
        assert_eq!(m.keys().len(), 2);
        assert_eq!(m.get(&0), Some(&2));
        assert!(matches!(m.get(&1), Some(1) | Some(3)));
    }

    /// Invariant: equality ignores insertion order and compares values.
    #[test]
    fn equality_is_order_independent() {
        let mut a: FixedMap<u32, u32, 8> = FixedMap::new();
        let mut b: FixedMap<u32, u32, 8> = FixedMap::new();
        for k in [1, 2, 3] {
            a.insert(k, k * 10);
        }
        for k in [3, 1, 2] {
            b.insert(k, k * 10);
        }
        assert_eq!(a, b);
        b.insert(2, 0);
        assert_ne!(a, b);
        b.remove(&2);
        assert_ne!(a, b);
    }

    /// Invariant: `clear` empties the map without changing capacity, and the
    /// cleared slots are reusable.
    #[test]
    fn clear_resets() {
        let mut m: FixedMap<u32, u32, 4> = FixedMap::new();
        m.insert(1, 1);
        m.insert(2, 2);
        m.remove(&1);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 4);
        for k in 10..13 {
            m.insert(k, k);
        }
        assert_eq!(m.len(), 3);
    }

    /// Invariant: `values_mut` and `get_mut` write through to stored values.
    #[test]
    fn mutable_value_access() {
        let mut m: FixedMap<String, i32, 8> = FixedMap::new();
        m.insert("x".to_string(), 1);
        m.insert("y".to_string(), 2);
        *m.get_mut("x").unwrap() += 10;
        for v in m.values_mut() {
            *v *= 2;
        }
        assert_eq!(m.get("x"), Some(&22));
        assert_eq!(m.get("y"), Some(&4));
        let mut values = m.values();
        values.sort();
        assert_eq!(values, vec![4, 22]);
        assert_eq!(format!("{:?}", FixedMap::<u8, u8, 2>::new()), "{}");
    }
}
