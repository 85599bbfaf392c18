// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat hub: the publish operation and the shared state every request uses
//!
//! A hub is constructed once and cloned into each connection task. Clones
//! share the same log, broadcaster and counters.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::broadcast::Broadcaster;
use crate::id::IdGen;
use crate::log::SharedLog;
use crate::message::{Cursor, Message};
use crate::render::{RenderError, Renderer};
use crate::subscriber::{self, PollOutcome};

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub struct ChatHub<I, R> {
    log: SharedLog,
    broadcaster: Broadcaster,
    ids: I,
    renderer: R,
    visitors: Arc<AtomicU64>,
}

impl<I: IdGen, R: Renderer> ChatHub<I, R> {
    pub fn new(capacity: usize, ids: I, renderer: R) -> Self {
        Self {
            log: SharedLog::new(capacity),
            broadcaster: Broadcaster::new(),
            ids,
            renderer,
            visitors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build a message: fresh id plus rendered form. Nothing is appended.
    pub fn compose(&self, body: impl Into<String>) -> Result<Message, HubError> {
        let body = body.into();
        let id = self.ids.next();
        let rendered = self.renderer.render(&id, &body)?;
        Ok(Message { id, body, rendered })
    }

    /// Publish a message.
    ///
    /// `deliver` receives the new message and produces the publisher's own
    /// response. It runs before the message enters the log, so the
    /// publisher's long-poll sees the message only on its next cycle, like
    /// every other subscriber. The append and wakeup happen whatever
    /// `deliver` returns.
    pub async fn publish<F, Fut>(
        &self,
        body: impl Into<String>,
        deliver: F,
    ) -> Result<Fut::Output, HubError>
    where
        F: FnOnce(Message) -> Fut,
        Fut: Future,
    {
        let message = self.compose(body)?;
        let delivered = deliver(message.clone()).await;
        self.commit(message);
        Ok(delivered)
    }

    fn commit(&self, message: Message) {
        let id = message.id.clone();
        self.log.append(message);
        let woken = self.broadcaster.notify_all();
        info!(%id, woken, "message published");
    }

    /// Long-poll for messages newer than `cursor`
    pub async fn poll(&self, cursor: &Cursor, cancel: &CancellationToken) -> PollOutcome {
        subscriber::poll(&self.log, &self.broadcaster, cursor, cancel).await
    }

    /// Everything currently in the log, oldest first
    pub fn history(&self) -> Vec<Message> {
        self.log.to_vec()
    }

    /// Count a new visitor and return their number (starting at 1)
    pub fn join(&self) -> u64 {
        self.visitors.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn visitors(&self) -> u64 {
        self.visitors.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }

    /// Number of poll requests currently suspended
    pub fn waiter_count(&self) -> usize {
        self.broadcaster.waiter_count()
    }
}

impl<I: Clone, R: Clone> Clone for ChatHub<I, R> {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            broadcaster: self.broadcaster.clone(),
            ids: self.ids.clone(),
            renderer: self.renderer.clone(),
            visitors: Arc::clone(&self.visitors),
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
