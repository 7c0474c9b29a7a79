// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! A single-slot wake-up primitive.
//!
//! Any number of producers can call [`Notifier::notify`]; any number of
//! consumers can await [`Notifier::notified`]. A burst of N `notify()` calls
//! with no intervening wait coalesces to exactly one pending signal — the
//! next wait succeeds immediately, and the one after that blocks. `notify()`
//! never blocks and is safe to call from any context, including signal
//! handlers or synchronous code holding other locks.
//!
//! [`Notifier`] is cheap to clone; clones share the same underlying signal,
//! which makes it safe to embed by value in structs that are themselves
//! cloned freely (the common case for engine components passed to many
//! worker tasks).

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

struct Inner {
    pending: AtomicBool,
    notify: tokio::sync::Notify,
}

#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            inner: Arc::new(Inner {
                pending: AtomicBool::new(false),
                notify: tokio::sync::Notify::new(),
            }),
        }
    }

    /// Deposits a signal if none is pending; otherwise a no-op. Never blocks.
    pub fn notify(&self) {
        if self
            .inner
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.inner.notify.notify_one();
        }
    }

    /// Attempts to consume a pending signal without waiting. Returns `true`
    /// and clears the signal if one was pending, `false` otherwise.
    pub fn try_notified(&self) -> bool {
        self.inner
            .pending
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Waits for and consumes the next signal. If a signal is already
    /// pending, returns immediately.
    pub async fn notified(&self) {
        loop {
            if self.try_notified() {
                return;
            }
            // Register interest before re-checking so a `notify()` racing
            // with this loop iteration cannot be missed: `tokio::sync::Notify`
            // stores a wake-up permit for any `notify_one()` that happens
            // between the two `notified()` calls below.
            let notified = self.inner.notify.notified();
            if self.try_notified() {
                return;
            }
            notified.await;
        }
    }
}
