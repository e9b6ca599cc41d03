//! Triangular-number probe sequence shared by both map variants.

/// Slot index for the `attempt`-th probe of `hash` in a table of `size` slots.
///
/// `(hash + (attempt + attempt²) / 2) mod size`. Offsets from the home slot
/// are the triangular numbers 0, 1, 3, 6, 10, ... For power-of-two sizes the
/// attempts `0..size` visit every index exactly once.
#[inline]
pub fn probe(hash: u64, attempt: usize, size: usize) -> usize {
    debug_assert!(size > 0, "probe into a zero-sized table");
    let home = (hash % size as u64) as usize;
    // Wrapping is exact modulo any power of two.
    home.wrapping_add(triangular(attempt)) % size
}

/// `n(n+1)/2`, halving the even factor first so only the final product can wrap.
#[inline]
fn triangular(n: usize) -> usize {
    if n % 2 == 0 {
        (n / 2).wrapping_mul(n.wrapping_add(1))
    } else {
        n.wrapping_mul(n / 2 + 1)
    }
}

/// One full probe cycle: the `size` indices `probe(hash, 0..size, size)`.
#[derive(Clone, Debug)]
pub struct ProbeSeq {
    hash: u64,
    attempt: usize,
    size: usize,
}

impl ProbeSeq {
    pub fn new(hash: u64, size: usize) -> Self {
        Self {
            hash,
            attempt: 0,
            size,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.attempt == self.size {
            return None;
        }
        let index = probe(self.hash, self.attempt, self.size);
        self.attempt += 1;
        Some(index)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.size - self.attempt;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for ProbeSeq {}
