//! Debug-only reentrancy guard.
//!
//! A reader-writer lock is not reentrant: a thread that already holds a
//! guard on a map and asks for another one, shared or exclusive, can
//! deadlock. In debug builds every tracker gets a process-unique id and
//! each thread records the ids it is currently inside; entering the same
//! tracker twice on one thread panics. In release builds this compiles to
//! a zero-cost no-op.

#[cfg(not(debug_assertions))]
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use core::sync::atomic::{AtomicU64, Ordering};
#[cfg(debug_assertions)]
use std::cell::RefCell;

#[cfg(debug_assertions)]
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[cfg(debug_assertions)]
thread_local! {
    static HELD: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Per-instance reentrancy tracker. Embed this in structs and guard public
/// entry-points with `let _g = self.reentrancy.enter();` before taking
/// the lock, so the guard outlives the lock guard.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    id: u64,
}

impl DebugReentrancy {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Enter a guarded section. In debug builds, panics if the current
    /// thread is already inside a section of this tracker. During thread
    /// teardown, after the per-thread list is gone, entry is not checked.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let id = self.id;
            // Untracked once the thread-local is destroyed, e.g. when another
            // thread-local's destructor uses the map during thread exit.
            let _ = HELD.try_with(|held| {
                let mut held = held.borrow_mut();
                assert!(
                    !held.contains(&id),
                    "reentrancy detected: nested entry into ConcurrentMap"
                );
                held.push(id);
            });
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let id = self.owner.id;
            // The thread-local may already be gone during thread teardown.
            let _ = HELD.try_with(|held| {
                let mut held = held.borrow_mut();
                if let Some(pos) = held.iter().rposition(|&h| h == id) {
                    held.swap_remove(pos);
                }
            });
        }
    }
}
