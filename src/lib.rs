//! quadmap: open-addressing hash maps with triangular-number (quadratic)
//! probing and tombstone deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Two variants over the same slot layout and probe sequence:
//!   - FixedMap<K, V, N, S>: `N` slots decided at compile time. Every keyed
//!     operation walks the whole probe cycle (exactly `N` attempts) and
//!     latches the first hit, so its cost does not depend on the outcome.
//!     Inserts are refused once three quarters of the slots are live.
//!   - GrowableMap<K, V, S>: starts at one slot and doubles before an insert
//!     would bring it to half full. Probes stop as soon as the answer is
//!     known: at a live match or at a never-used slot.
//!
//! Layers
//! - `slot`: one cell, `Option<(K, V)>` plus a tombstone flag.
//! - `probe`: `(hash + (i + i²) / 2) mod size`; a permutation of the table
//!   for power-of-two sizes, which is why both variants only use those.
//! - `load_factor`: the 3/4 ceiling (fixed) and 1/2 growth trigger (growable).
//! - `table`: passes over a slot array shared by both maps (iterators,
//!   snapshots, drain) and the `len` consistency check.
//!
//! Deletion
//! - Removing an entry leaves a tombstone. Lookups continue past tombstones;
//!   inserts may reuse them. Tombstones are only cleared by `clear`, by a
//!   key-rebuilding bulk operation, or by a resize.
//! - An insert overwrites a live entry for the same key wherever it sits in
//!   the probe cycle, and only otherwise takes the first free slot. Keys are
//!   therefore never duplicated across a tombstone.
//!
//! Bulk mutation
//! - Values can be rewritten in place (`iter_values_mut`, `values_mut`).
//! - Anything that changes keys (`iter_mut`, `iter_keys_mut`) drains the
//!   table and re-inserts the results, since a key's slot is derived from it.
//!   When two results share a key the later one in drain order wins.
//!
//! Failure semantics
//! - `FixedMap::insert` panics at the load-factor ceiling;
//!   `FixedMap::try_insert` returns `InsertError` instead.
//! - A bulk pass that counts a different number of live slots than `len`
//!   panics: it means the table is corrupted.
//! - Missing keys are `None`; removing one is a no-op.
//!
//! Notes and non-goals
//! - Single-threaded, exclusively owned; no interior mutability.
//! - No shrinking (except `GrowableMap::clear`, which returns to one slot).
//! - Iteration order is slot order, not insertion order.
//! - With the `logging` feature, resizes and refused inserts go to `log`.

mod error;
pub mod fixed_map;
pub mod growable_map;
pub mod load_factor;
mod map_proptest;
pub mod probe;
mod slot;
mod table;

// Public surface
pub use error::InsertError;
pub use fixed_map::FixedMap;
pub use growable_map::GrowableMap;
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use table::Iter;
