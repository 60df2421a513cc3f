//! safe-hashmap: a thread-safe hash map guarded by a single
//! reader-writer lock.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a generic key-value container that many threads can read and
//!   write through a shared reference without data races.
//! - Layers:
//!   - `hashbrown::HashMap<K, V, S>`: the unordered table.
//!   - `parking_lot::RwLock`: one coarse lock around the whole table.
//!     Readers share it, writers hold it exclusively.
//!   - ConcurrentMap<K, V, S>: public API. Each method is one critical
//!     section, which makes every operation linearizable.
//!
//! Constraints
//! - `K: Eq + Hash`; `V` is unconstrained except where a method hands
//!   out an owned copy (`get` and `find` need `V: Clone`; `with_value`
//!   does not). `K` never needs `Clone`: operations that can fail take
//!   the key by value and return it in the error.
//! - The table is never exposed while the map is shared. `into_inner`
//!   requires ownership.
//! - No removal, no iteration. A key stays present once inserted; only
//!   its value can change.
//!
//! Errors
//! - Absence is the only failure. `get`, `with_value`, `update` and
//!   `update_with` return `KeyNotFoundError<K>`, which owns the key and
//!   formats it through `Debug`.
//! - `parking_lot` locks do not poison: a panic inside a critical section
//!   does not make later calls fail.
//!
//! Check-then-act
//! - `contains_key` is a snapshot. `contains_key` followed by `get` or
//!   `update` is not atomic; `update`/`update_with` perform the presence
//!   check and the write under one exclusive hold.
//!
//! Reentrancy policy
//! - The lock is not reentrant. User code that runs while it is held
//!   (`K: Eq/Hash`, closures passed to `with_value`/`update_with`) must
//!   not call back into the same map. A debug-only per-thread guard
//!   turns such a nested entry into a panic instead of a deadlock.
//! - Values displaced by `insert`/`update` are dropped after the lock is
//!   released, so `Drop` for `V` may use the map.

mod concurrent_map;
mod concurrent_map_proptest;
mod error;
mod reentrancy;

// Public surface
pub use concurrent_map::ConcurrentMap;
pub use error::KeyNotFoundError;
