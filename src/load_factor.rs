//! Load-factor thresholds for both map variants.

/// Fixed tables accept an insert only while `len / size < 3/4`.
#[inline]
pub fn exceeded(len: usize, size: usize) -> bool {
    len.saturating_mul(4) >= size.saturating_mul(3)
}

/// Growable tables double before an insert that would bring them to half full.
#[inline]
pub fn needs_growth(len: usize, capacity: usize) -> bool {
    len.saturating_add(1) >= capacity / 2
}
