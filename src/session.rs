//! Request generations for page state.
//!
//! Every load takes a [`Ticket`] before it starts fetching. When it finishes,
//! its result is kept only if no newer load has been started since, so a slow
//! response can never overwrite the outcome of a later filter change.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Last accepted value of a page, guarded by a [`RequestGate`].
#[derive(Debug, Default)]
pub struct ViewSlot<T> {
    gate: RequestGate,
    value: Mutex<T>,
}

impl<T: Clone> ViewSlot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            gate: RequestGate::new(),
            value: Mutex::new(initial),
        }
    }

    pub fn begin(&self) -> Ticket {
        self.gate.begin()
    }

    /// Store `value` if `ticket` is still the newest load. Returns whether it
    /// was accepted.
    pub async fn store(&self, ticket: Ticket, value: T) -> bool {
        let mut guard = self.value.lock().await;
        if !self.gate.is_latest(ticket) {
            debug!(
                generation = ticket.generation(),
                "discarding response from superseded load"
            );
            return false;
        }
        *guard = value;
        true
    }

    /// Apply a local edit to the current value. The gate is left alone, so a
    /// load already in flight still stores its result.
    pub async fn modify<F>(&self, edit: F) -> T
    where
        F: FnOnce(&mut T),
    {
        let mut guard = self.value.lock().await;
        edit(&mut guard);
        guard.clone()
    }

    pub async fn current(&self) -> T {
        self.value.lock().await.clone()
    }
}
