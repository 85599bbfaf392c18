// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-poll subscriber loop
//!
//! CHECK -> RESPOND when the catch-up query is non-empty,
//! CHECK -> SUSPENDED otherwise. SUSPENDED returns to CHECK on a broadcast
//! and ends in CANCELLED when the request's token fires.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::broadcast::{Broadcaster, Wake};
use crate::log::SharedLog;
use crate::message::{Cursor, Message};

/// Terminal state of one poll request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Messages newer than the cursor, oldest first. Never empty.
    Ready(Vec<Message>),
    /// The requester went away; nothing should be written
    Cancelled,
}

impl PollOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollOutcome::Cancelled)
    }
}

/// Wait until there are messages newer than `cursor`, or until `cancel` fires.
pub async fn poll(
    log: &SharedLog,
    broadcaster: &Broadcaster,
    cursor: &Cursor,
    cancel: &CancellationToken,
) -> PollOutcome {
    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        // Register before checking so a publish between the check and the
        // suspend still wakes us.
        let waiter = broadcaster.register();
        let fresh = log.since(cursor);

        if !fresh.is_empty() {
            drop(waiter);
            if cancel.is_cancelled() {
                debug!(%cursor, "connection closed before response");
                return PollOutcome::Cancelled;
            }
            debug!(%cursor, count = fresh.len(), "poll ready");
            return PollOutcome::Ready(fresh);
        }

        debug!(%cursor, "poll suspended");
        match waiter.wait(cancel).await {
            Wake::Notified => continue,
            Wake::Cancelled => {
                debug!(%cursor, "poll cancelled while suspended");
                return PollOutcome::Cancelled;
            }
        }
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
