//! Slot-array passes shared by `FixedMap` and `GrowableMap`: borrowing
//! iterators, owned snapshots and the drain used by rebuilds.

use crate::slot::Slot;

/// Panics unless a full pass counted exactly `len` valid slots.
#[inline]
#[track_caller]
pub(crate) fn verify_len(counted: usize, len: usize) {
    assert_eq!(
        counted, len,
        "table corrupted: counted {counted} valid slots but len is {len}"
    );
}

/// Owned copies of every live pair, in slot order.
pub(crate) fn snapshot<K, V>(slots: &[Slot<K, V>], len: usize) -> Vec<(K, V)>
where
    K: Clone,
    V: Clone,
{
    let entries: Vec<(K, V)> = slots
        .iter()
        .filter_map(Slot::pair)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    verify_len(entries.len(), len);
    entries
}

/// Move every live pair out, leaving all slots empty (tombstones included).
pub(crate) fn drain<K, V>(slots: &mut [Slot<K, V>], len: usize) -> Vec<(K, V)> {
    let mut entries = Vec::with_capacity(len);
    for slot in slots.iter_mut() {
        if let Some(pair) = core::mem::take(slot).into_pair() {
            entries.push(pair);
        }
    }
    verify_len(entries.len(), len);
    entries
}

/// Iterator over the live entries of a map.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(slots: &'a [Slot<K, V>], len: usize) -> Self {
        Self {
            slots: slots.iter(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slots.by_ref().find_map(Slot::pair)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over the live entries of a map with mutable values.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut [Slot<K, V>], len: usize) -> Self {
        Self {
            slots: slots.iter_mut(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slots.by_ref().find_map(Slot::pair_mut)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
