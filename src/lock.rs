//! Click lock: a single-slot semaphore with a bounded hold time.
//!
//! DESIGN
//! ======
//! `try_acquire` either hands out a [`LockLease`] or returns `None` when a
//! lease is already live; callers never wait. Every lease carries a
//! generation number and a safety timer. The lock is freed by whichever
//! comes first: an explicit `release`, the lease being dropped, or the timer
//! expiring. Only the path that finds its own generation still in the slot
//! frees it and runs the `on_release` hook, so a late completion can never
//! free a lock that a newer lease has since taken.
//!
//! Both hooks run while the slot mutex is held. Whatever they toggle (the
//! card's loading flag) therefore changes in the same critical section as
//! ownership, even when the timer fires on another worker thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

type ReleaseHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct ClickLock {
    /// Generation of the live lease, if any.
    owner: Arc<Mutex<Option<u64>>>,
    generations: AtomicU64,
}

impl ClickLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock if it is free. The lease frees itself after `ttl`.
    ///
    /// `on_acquire` runs only on success, before the safety timer exists.
    /// `on_release` runs exactly once, on whichever path frees this lease.
    /// Neither hook may call back into this lock.
    /// Must be called from within a Tokio runtime.
    pub fn try_acquire<A, F>(&self, ttl: Duration, on_acquire: A, on_release: F) -> Option<LockLease>
    where
        A: FnOnce(),
        F: Fn() + Send + Sync + 'static,
    {
        let generation = {
            let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
            if owner.is_some() {
                return None;
            }
            let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
            *owner = Some(generation);
            on_acquire();
            generation
        };

        let on_release: ReleaseHook = Arc::new(on_release);
        let timer = {
            let owner = Arc::clone(&self.owner);
            let on_release = Arc::clone(&on_release);
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if free_if_owned(&owner, generation, &on_release) {
                    debug!(generation, "safety timer released click lock");
                }
            })
        };

        debug!(generation, "click lock acquired");
        Some(LockLease { generation, owner: Arc::clone(&self.owner), on_release, timer, settled: false })
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

fn free_if_owned(owner: &Mutex<Option<u64>>, generation: u64, on_release: &ReleaseHook) -> bool {
    let mut owner = owner.lock().unwrap_or_else(PoisonError::into_inner);
    if *owner == Some(generation) {
        *owner = None;
        on_release();
        true
    } else {
        false
    }
}

// =============================================================================
// LEASE
// =============================================================================

/// Proof of holding the click lock. Frees the lock when released or dropped.
pub struct LockLease {
    generation: u64,
    owner: Arc<Mutex<Option<u64>>>,
    on_release: ReleaseHook,
    timer: JoinHandle<()>,
    settled: bool,
}

impl LockLease {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this lease still owns the lock (its timer has not fired).
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.settled && *self.owner.lock().unwrap_or_else(PoisonError::into_inner) == Some(self.generation)
    }

    /// Cancel the safety timer and free the lock.
    ///
    /// Returns `false` when the lock had already been freed by the timer.
    pub fn release(mut self) -> bool {
        self.settle()
    }

    fn settle(&mut self) -> bool {
        self.timer.abort();
        if self.settled {
            return false;
        }
        self.settled = true;

        if free_if_owned(&self.owner, self.generation, &self.on_release) {
            debug!(generation = self.generation, "click lock released");
            true
        } else {
            debug!(generation = self.generation, "click lock already released by safety timer");
            false
        }
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        self.settle();
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
