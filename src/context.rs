use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::util::lock_unpoisoned;

/// Why a call stopped early: an explicit `cancel()` or the token's
/// deadline passing. Neither outcome is ever retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

/// Cooperative cancellation shared across every attempt of one call.
///
/// Clones share the same state, so a token handed to a request can be
/// cancelled from another thread. An optional deadline bounds the whole
/// retry sequence, not each individual attempt.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never fires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: Mutex::new(false),
                condvar: Condvar::new(),
                deadline: Some(deadline),
            }),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Fires the token. Any in-progress wait wakes immediately.
    pub fn cancel(&self) {
        let mut cancelled = lock_unpoisoned(&self.inner.cancelled);
        *cancelled = true;
        self.inner.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *lock_unpoisoned(&self.inner.cancelled)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub(crate) fn deadline_expired(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub(crate) fn check(&self) -> Option<CancelReason> {
        if self.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        if self.deadline_expired() {
            return Some(CancelReason::DeadlineExceeded);
        }
        None
    }

    /// Blocks for `duration`, waking early if the token fires or its
    /// deadline passes first. Returns `None` when the full duration
    /// elapsed uninterrupted.
    pub(crate) fn wait_for(&self, duration: Duration) -> Option<CancelReason> {
        let wait_until = Instant::now() + duration;
        let mut cancelled = lock_unpoisoned(&self.inner.cancelled);
        loop {
            if *cancelled {
                return Some(CancelReason::Cancelled);
            }
            if self.deadline_expired() {
                return Some(CancelReason::DeadlineExceeded);
            }
            let now = Instant::now();
            if now >= wait_until {
                return None;
            }
            let mut slice = wait_until - now;
            if let Some(deadline) = self.inner.deadline {
                slice = slice.min(deadline.saturating_duration_since(now));
            }
            cancelled = match self.inner.condvar.wait_timeout(cancelled, slice) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

/// The inter-attempt sleep, injectable so tests can substitute zero-wait
/// or scripted cancellation without real sleeping.
pub trait Waiter: Send + Sync {
    /// Blocks between attempts; returns the interruption reason if the
    /// context fired before the delay elapsed.
    fn wait(&self, delay: Duration, context: &CancelToken) -> Option<CancelReason>;
}

#[derive(Debug, Default)]
pub struct SystemWaiter;

impl Waiter for SystemWaiter {
    fn wait(&self, delay: Duration, context: &CancelToken) -> Option<CancelReason> {
        if delay.is_zero() {
            return context.check();
        }
        context.wait_for(delay)
    }
}
