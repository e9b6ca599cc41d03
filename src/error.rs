/// Error returned by [`FixedMap::try_insert`][try-insert].
///
/// [try-insert]: crate::FixedMap::try_insert
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The table already holds three quarters of its slots. A fixed-capacity
    /// map never grows, so the caller has to size `N` for its workload.
    #[error(
        "load factor exceeded: {len} entries in a fixed table of {capacity} slots \
         (inserts are refused from 3/4 occupancy)"
    )]
    LoadFactorExceeded { len: usize, capacity: usize },
}
