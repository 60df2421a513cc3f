//! Error returned when a lookup or update targets an absent key.

use thiserror::Error;

/// The requested key is not present in the map.
///
/// Carries the key that was asked for, so callers can report it or hand it
/// straight back to [`ConcurrentMap::insert`](crate::ConcurrentMap::insert).
/// The message is built from the key's `Debug` output, which works for any
/// key type rather than only textual ones.
#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
#[error("key not found: {key:?}")]
pub struct KeyNotFoundError<K> {
    key: K,
}

impl<K> KeyNotFoundError<K> {
    pub(crate) fn new(key: K) -> Self {
        KeyNotFoundError { key }
    }

    /// The key that was not found.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Consume the error and return the owned key.
    pub fn into_key(self) -> K {
        self.key
    }
}
