//! GrowableMap: power-of-two table that doubles before it reaches half full.

use crate::load_factor;
use crate::probe::ProbeSeq;
use crate::slot::Slot;
use crate::table::{self, Iter, IterMut};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

const MIN_CAPACITY: usize = 1;

#[derive(Clone)]
pub struct GrowableMap<K, V, S = DefaultHashBuilder> {
    table: Box<[Slot<K, V>]>,
    len: usize,
    hasher: S,
}

fn empty_table<K, V>(capacity: usize) -> Box<[Slot<K, V>]> {
    (0..capacity).map(|_| Slot::default()).collect()
}

impl<K, V> GrowableMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for GrowableMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> GrowableMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(MIN_CAPACITY, hasher)
    }

    /// Start with `capacity` slots, rounded up to a power of two.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            table: empty_table(capacity),
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

    /// Current slot count; always a power of two.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drop every entry and shrink back to the minimum capacity.
    pub fn clear(&mut self) {
        self.table = empty_table(MIN_CAPACITY);
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

    /// Keep only the entries for which `keep` returns `true`.
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

impl<K, V, S> GrowableMap<K, V, S>
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

    /// Early-exit probe: stops on the first valid match or the first empty slot.
    fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        for index in ProbeSeq::new(hash, self.table.len()) {
            let slot = &self.table[index];
            if slot.is_valid() {
                // SAFETY: validity checked in the condition above.
                let (key, _) = unsafe { slot.pair_unchecked() };
                if key.borrow() == q {
                    return Some(index);
                }
            } else if slot.is_empty() {
                return None;
            }
        }
        None
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find(q)?;
        self.table[index].pair().map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find(q)?;
        self.table[index].pair_mut().map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Insert or overwrite, returning the previous value for `key`. Doubles
    /// the table first when the insert would bring it to half full.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if load_factor::needs_growth(self.len, self.table.len()) {
            self.grow();
        }
        self.place(key, value)
    }

    /// Probe for `key` without the growth check. Overwrites a live match,
    /// otherwise fills the first tombstone seen or the empty slot that ended
    /// the probe.
    fn place(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let mut available = None;
        for index in ProbeSeq::new(hash, self.table.len()) {
            let slot = &self.table[index];
            if slot.is_valid() {
                // SAFETY: validity checked in the condition above.
                if unsafe { slot.pair_unchecked() }.0 == key {
                    return self.table[index].set(key, value).map(|(_, old)| old);
                }
            } else {
                let empty = slot.is_empty();
                available.get_or_insert(index);
                if empty {
                    break;
                }
            }
        }

        let Some(index) = available else {
            unreachable!("a table at most half full always has a free slot");
        };
        self.table[index].set(key, value);
        self.len += 1;
        None
    }

    /// Double the capacity and rehash every live entry into fresh slots.
    fn grow(&mut self) {
        let capacity = self.table.len() * 2;
        #[cfg(feature = "logging")]
        log::debug!(
            "growing table from {} to {} slots ({} live entries)",
            self.table.len(),
            capacity,
            self.len
        );
        let entries = table::drain(&mut self.table, self.len);
        self.table = empty_table(capacity);
        self.len = 0;
        for (k, v) in entries {
            self.place(k, v);
        }
    }

    /// Remove `q`, returning its value. Missing keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find(q)?;
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

impl<K, V, S> PartialEq for GrowableMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for GrowableMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for GrowableMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for GrowableMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for GrowableMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a GrowableMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
