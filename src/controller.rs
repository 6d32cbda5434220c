//! Interaction controller for the advice card.
//!
//! DESIGN
//! ======
//! The card state lives in a `watch::Sender<CardState>`; every mutation goes
//! through `send_modify`, so hosts that subscribe re-render on each change.
//!
//! A click cycle runs under a [`LockLease`](crate::lock::LockLease):
//!
//! 1. take the lock (or drop the click if it is held); while the lock slot
//!    is still guarded, show the loading placeholder and take the
//!    prefetched advice
//! 2. fetch fresh advice only when the buffer was empty
//! 3. wait the cosmetic delay, then commit and persist the snapshot
//! 4. spawn the buffer refill, then release the lock
//!
//! The buffer is read exactly once per cycle, before the delay, and the
//! refill is only issued after the commit, so a refill landing mid-cycle
//! cannot change what the cycle shows.
//!
//! ERRORS
//! ======
//! Nothing here is fatal. Failures set the sticky `error` flag; a failed
//! click additionally resets the card to the fallback advice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::advice::{AdviceRecord, CurrentAdvice};
use crate::config::Timings;
use crate::fetch::AdviceSource;
use crate::lock::ClickLock;
use crate::store::AdviceStore;
use crate::view::CardView;

// =============================================================================
// STATE
// =============================================================================

/// Everything the card displays, plus the prefetch buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardState {
    pub current: CurrentAdvice,
    /// Advice fetched ahead of the next click. Holds at most one record.
    pub prefetched: Option<AdviceRecord>,
    /// A click cycle holds the lock.
    pub loading: bool,
    /// Some fetch failed. Never cleared once set.
    pub error: bool,
}

impl CardState {
    fn initial(current: AdviceRecord) -> Self {
        Self { current: CurrentAdvice::Ready(current), prefetched: None, loading: false, error: false }
    }
}

/// Result of one "new advice" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Another cycle held the lock; nothing happened.
    Ignored,
    /// The record now shown and persisted.
    Committed(AdviceRecord),
    /// Fetching failed; the fallback advice is shown.
    Failed,
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Clone)]
pub struct AdviceController {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn AdviceSource>,
    store: AdviceStore,
    timings: Timings,
    lock: ClickLock,
    mounted: AtomicBool,
    state: watch::Sender<CardState>,
}

impl AdviceController {
    /// Build a controller showing the cached advice (or the fallback).
    /// No network activity happens until [`mount`](Self::mount).
    #[must_use]
    pub fn new(source: Arc<dyn AdviceSource>, store: AdviceStore, timings: Timings) -> Self {
        let cached = store.load();
        debug!(id = cached.id, "card initialized from cache");
        let (state, _) = watch::channel(CardState::initial(cached));
        Self {
            inner: Arc::new(Inner { source, store, timings, lock: ClickLock::new(), mounted: AtomicBool::new(false), state }),
        }
    }

    /// Snapshot of the current card state.
    #[must_use]
    pub fn state(&self) -> CardState {
        self.inner.state.borrow().clone()
    }

    /// What the UI surface should show right now.
    #[must_use]
    pub fn view(&self) -> CardView {
        CardView::from(&*self.inner.state.borrow())
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CardState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.lock.is_held()
    }

    /// Replace the cached advice with fresh advice, then fill the prefetch
    /// buffer. Runs once per controller; later calls return immediately.
    pub async fn mount(&self) {
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            debug!("mount already ran");
            return;
        }

        let first = match self.inner.source.fetch_advice().await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "initial advice fetch failed, keeping cached advice");
                self.inner.flag_error();
                return;
            }
        };
        self.inner.commit(first);

        match self.inner.source.fetch_advice().await {
            Ok(next) => {
                debug!(id = next.id, "prefetch buffer filled");
                self.inner.state.send_modify(|s| s.prefetched = Some(next));
            }
            Err(e) => {
                warn!(error = %e, "initial prefetch failed");
                self.inner.flag_error();
            }
        }
    }

    /// Handle a "new advice" click.
    pub async fn request_new(&self) -> ClickOutcome {
        let mut buffered = None;
        let hook_inner = Arc::clone(&self.inner);
        let lease = self.inner.lock.try_acquire(
            self.inner.timings.safety_unlock,
            || {
                self.inner.state.send_modify(|s| {
                    s.loading = true;
                    s.current = CurrentAdvice::Loading;
                    buffered = s.prefetched.take();
                });
            },
            move || hook_inner.state.send_modify(|s| s.loading = false),
        );
        let Some(lease) = lease else {
            debug!("click ignored while a cycle is running");
            return ClickOutcome::Ignored;
        };

        let snapshot = match buffered {
            Some(record) => {
                debug!(id = record.id, "using prefetched advice");
                Ok(record)
            }
            None => self.inner.source.fetch_advice().await,
        };

        let outcome = match snapshot {
            Ok(record) => {
                tokio::time::sleep(self.inner.timings.cosmetic_delay).await;
                self.inner.commit(record.clone());
                self.spawn_refill();
                ClickOutcome::Committed(record)
            }
            Err(e) => {
                warn!(error = %e, "advice fetch failed, showing fallback");
                self.inner.state.send_modify(|s| {
                    s.error = true;
                    s.current = CurrentAdvice::Ready(AdviceRecord::fallback());
                });
                ClickOutcome::Failed
            }
        };

        lease.release();
        outcome
    }

    /// Refill the prefetch buffer in the background.
    fn spawn_refill(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match inner.source.fetch_advice().await {
                Ok(record) => {
                    debug!(id = record.id, "prefetch buffer refilled");
                    inner.state.send_modify(|s| s.prefetched = Some(record));
                }
                Err(e) => {
                    warn!(error = %e, "background prefetch failed");
                    inner.flag_error();
                }
            }
        });
    }
}

impl Inner {
    /// Show `record` and persist it.
    fn commit(&self, record: AdviceRecord) {
        if let Err(e) = self.store.save(&record) {
            warn!(error = %e, id = record.id, "failed to persist advice");
        }
        info!(id = record.id, "advice committed");
        self.state.send_modify(|s| s.current = CurrentAdvice::Ready(record));
    }

    fn flag_error(&self) {
        self.state.send_modify(|s| s.error = true);
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
