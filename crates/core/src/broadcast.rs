// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wakeup broadcaster for suspended subscribers
//!
//! Each waiter owns a one-shot channel registered in a shared set.
//! [`Broadcaster::notify_all`] drains the set and fires every channel once,
//! so a waiter registered before the broadcast is always woken and never
//! woken twice by it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

type WaiterSet = Arc<Mutex<HashMap<u64, oneshot::Sender<()>>>>;

/// How a suspended waiter was resumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A publish happened; re-check for new messages
    Notified,
    /// The waiter's cancellation token fired first
    Cancelled,
}

/// Monitor that lets any number of readers suspend until the next publish
pub struct Broadcaster {
    waiters: WaiterSet,
    next_id: Arc<AtomicU64>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            waiters: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a waiter for the next broadcast.
    ///
    /// The registration is live from the moment this returns, so a caller can
    /// register first and check its predicate afterwards without missing a
    /// broadcast that lands in between.
    pub fn register(&self) -> Waiter {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        waiters.insert(id, tx);

        Waiter {
            id,
            rx,
            waiters: Arc::clone(&self.waiters),
        }
    }

    /// Suspend until the next broadcast
    pub async fn wait(&self) {
        self.register().notified().await;
    }

    /// Wake every currently registered waiter. Returns how many were woken.
    pub fn notify_all(&self) -> usize {
        let drained: Vec<oneshot::Sender<()>> = {
            let mut waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
            waiters.drain().map(|(_, tx)| tx).collect()
        };

        let count = drained.len();
        for tx in drained {
            // Receiver may have been dropped by a cancelled waiter
            let _ = tx.send(());
        }
        count
    }

    /// Number of registered waiters
    pub fn waiter_count(&self) -> usize {
        self.waiters.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Broadcaster {
    fn clone(&self) -> Self {
        Self {
            waiters: Arc::clone(&self.waiters),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

/// A single registration with a [`Broadcaster`].
///
/// Dropping the waiter removes its registration.
pub struct Waiter {
    id: u64,
    rx: oneshot::Receiver<()>,
    waiters: WaiterSet,
}

impl Waiter {
    /// Suspend until notified or until `cancel` fires, whichever comes first.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Wake {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Wake::Cancelled,
            // A closed sender means the set was torn down; treat it as a wakeup
            _ = &mut self.rx => Wake::Notified,
        }
    }

    /// Suspend until notified
    pub async fn notified(mut self) {
        let _ = (&mut self.rx).await;
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let mut waiters = self.waiters.lock().unwrap_or_else(|e| e.into_inner());
        waiters.remove(&self.id);
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
