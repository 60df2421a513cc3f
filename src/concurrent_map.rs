//! ConcurrentMap: a hash table behind one reader-writer lock.

use crate::error::KeyNotFoundError;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;

/// A hash map that can be shared between threads.
///
/// Reads (`get`, `find`, `with_value`, `contains_key`, `len`) take the lock in
/// shared mode and run in parallel with each other. Writes (`insert`,
/// `update`, `update_with`, `reserve`) take it exclusively. Every call is
/// one critical section, so operations are linearizable.
///
/// Share it by reference (for example with [`std::thread::scope`]) or
/// wrap it in an [`Arc`](std::sync::Arc).
///
/// ```
/// use safe_hashmap::ConcurrentMap;
///
/// let map: ConcurrentMap<String, u32> = ConcurrentMap::new();
/// map.insert("x".to_string(), 1);
/// assert_eq!(map.get("x".to_string()), Ok(1));
/// assert_eq!(map.find("x"), Some(1));
/// assert!(map.update("y".to_string(), 2).is_err());
/// ```
pub struct ConcurrentMap<K, V, S = RandomState> {
    inner: RwLock<HashMap<K, V, S>>,
    reentrancy: DebugReentrancy,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> Default for ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ConcurrentMap<K, V, S> {
    fn from_table(table: HashMap<K, V, S>) -> Self {
        Self {
            inner: RwLock::new(table),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of entries at the moment of the call.
    pub fn len(&self) -> usize {
        let _g = self.reentrancy.enter();
        let table = self.inner.read();
        table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        let _g = self.reentrancy.enter();
        let table = self.inner.read();
        table.capacity()
    }

    /// Take the table out. Requires ownership, so no other thread can
    /// still be using the map.
    pub fn into_inner(self) -> HashMap<K, V, S> {
        self.inner.into_inner()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_table(HashMap::with_hasher(hasher))
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        log::debug!("creating ConcurrentMap with capacity {}", capacity);
        Self::from_table(HashMap::with_capacity_and_hasher(capacity, hasher))
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn insert(&self, key: K, value: V) {
        // Drop the displaced value after the lock is released; its
        // destructor may call back into the map.
        let _previous = {
            let _g = self.reentrancy.enter();
            let mut table = self.inner.write();
            table.insert(key, value)
        };
    }

    /// Clone out the value stored under `key`.
    ///
    /// Takes the key by value so a miss can hand it back in the error
    /// without requiring `K: Clone`. Callers that want the zero value on a
    /// miss can write `map.get(k).unwrap_or_default()`.
    pub fn get(&self, key: K) -> Result<V, KeyNotFoundError<K>>
    where
        V: Clone,
    {
        self.with_value(key, V::clone)
    }

    /// Run `f` on the value stored under `key` while holding shared access.
    ///
    /// `f` must not call back into this map.
    pub fn with_value<R, F>(&self, key: K, f: F) -> Result<R, KeyNotFoundError<K>>
    where
        F: FnOnce(&V) -> R,
    {
        let found = {
            let _g = self.reentrancy.enter();
            let table = self.inner.read();
            table.get(&key).map(f)
        };
        found.ok_or_else(|| {
            log::trace!("lookup missed");
            KeyNotFoundError::new(key)
        })
    }

    /// Borrowed lookup: clone out the value under `key`, if any.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let _g = self.reentrancy.enter();
        let table = self.inner.read();
        table.get(key).cloned()
    }

    /// Overwrite the value under `key` only if the key is already present.
    ///
    /// The presence check and the write happen under one exclusive hold.
    pub fn update(&self, key: K, value: V) -> Result<(), KeyNotFoundError<K>> {
        let outcome = {
            let _g = self.reentrancy.enter();
            let mut table = self.inner.write();
            match table.get_mut(&key) {
                Some(slot) => Ok(mem::replace(slot, value)),
                None => Err(value),
            }
        };
        match outcome {
            Ok(_previous) => Ok(()),
            Err(_rejected) => {
                log::trace!("update rejected: key not present");
                Err(KeyNotFoundError::new(key))
            }
        }
    }

    /// Modify the value under `key` in place, under one exclusive hold.
    ///
    /// `f` must not call back into this map.
    pub fn update_with<F>(&self, key: K, f: F) -> Result<(), KeyNotFoundError<K>>
    where
        F: FnOnce(&mut V),
    {
        let found = {
            let _g = self.reentrancy.enter();
            let mut table = self.inner.write();
            table.get_mut(&key).map(f).is_some()
        };
        if found {
            Ok(())
        } else {
            log::trace!("update_with rejected: key not present");
            Err(KeyNotFoundError::new(key))
        }
    }

    /// Snapshot presence test. The answer may be stale as soon as it
    /// returns; use [`update`](Self::update) for check-then-act.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let table = self.inner.read();
        table.contains_key(key)
    }

    /// Grow the table for at least `additional` more entries.
    pub fn reserve(&self, additional: usize) {
        let _g = self.reentrancy.enter();
        let mut table = self.inner.write();
        table.reserve(additional);
    }
}

impl<K, V, S> fmt::Debug for ConcurrentMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for ConcurrentMap<K, V, S> {
    fn from(table: HashMap<K, V, S>) -> Self {
        Self::from_table(table)
    }
}

impl<K, V, S> FromIterator<(K, V)> for ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_table(iter.into_iter().collect())
    }
}

impl<K, V, S> Extend<(K, V)> for ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        // `&mut self` rules out concurrent access; no lock needed.
        self.inner.get_mut().extend(iter);
    }
}
