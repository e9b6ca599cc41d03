//! Slot: a single cell of an open-addressed table.

/// One table cell: at most one key-value pair plus a tombstone flag.
///
/// - empty: no pair, not deleted
/// - occupied: pair present, not deleted
/// - tombstoned: deleted; the pair may still be stored (after
///   `mark_deleted`) or already moved out (after `take`)
///
/// A tombstone only goes back to empty when the whole table is rebuilt.
#[derive(Clone, Debug)]
pub(crate) struct Slot<K, V> {
    pair: Option<(K, V)>,
    deleted: bool,
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Self {
            pair: None,
            deleted: false,
        }
    }
}

impl<K, V> Slot<K, V> {
    /// Holds a live entry.
    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        self.pair.is_some() && !self.deleted
    }

    /// Can receive a new entry.
    #[inline]
    pub(crate) fn is_available(&self) -> bool {
        self.deleted || self.pair.is_none()
    }

    /// Never occupied since the table was last rebuilt. Ends a probe.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.pair.is_none() && !self.deleted
    }

    #[inline]
    pub(crate) fn pair(&self) -> Option<(&K, &V)> {
        if self.deleted {
            return None;
        }
        self.pair.as_ref().map(|(k, v)| (k, v))
    }

    #[inline]
    pub(crate) fn pair_mut(&mut self) -> Option<(&K, &mut V)> {
        if self.deleted {
            return None;
        }
        self.pair.as_mut().map(|(k, v)| (&*k, v))
    }

    /// Stored pair without the validity branch.
    ///
    /// # Safety
    /// The caller must have observed `self.is_valid()`.
    #[inline]
    pub(crate) unsafe fn pair_unchecked(&self) -> &(K, V) {
        debug_assert!(self.is_valid());
        // SAFETY: a valid slot always holds `Some`.
        self.pair.as_ref().unwrap_unchecked()
    }

    /// Install a pair and clear the tombstone. Returns whatever was stored
    /// before, which for a tombstone is the stale previous occupant.
    #[inline]
    pub(crate) fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.deleted = false;
        self.pair.replace((key, value))
    }

    /// Tombstone the slot, leaving the pair in place.
    #[inline]
    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Tombstone a valid slot and move its pair out.
    #[inline]
    pub(crate) fn take(&mut self) -> Option<(K, V)> {
        if self.deleted {
            return None;
        }
        self.deleted = true;
        self.pair.take()
    }

    /// Rewrite the value of a valid slot; the key stays where it is.
    pub(crate) fn map_value<F>(&mut self, f: F)
    where
        F: FnOnce(V) -> V,
    {
        if self.deleted {
            return;
        }
        if let Some((key, value)) = self.pair.take() {
            self.pair = Some((key, f(value)));
        }
    }

    #[inline]
    pub(crate) fn into_pair(self) -> Option<(K, V)> {
        if self.deleted {
            None
        } else {
            self.pair
        }
    }
}
