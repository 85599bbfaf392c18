// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-memory message log
//!
//! The log is a plain data structure: appending never wakes anyone.
//! Publishers compose an append with a broadcast themselves.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use crate::catchup::messages_since;
use crate::message::{Cursor, Message};

/// Number of messages kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 200;

/// Ordered, capacity-bounded store of published messages.
///
/// Insertion order is chronological order. Once full, each append evicts the
/// oldest entry, so `len() <= capacity()` always holds.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<Message>,
    capacity: usize,
}

impl MessageLog {
    /// A log holding at most `capacity` messages (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest entries beyond capacity
    pub fn append(&mut self, message: Message) {
        self.entries.push_back(message);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Read-only view of the current contents, oldest first
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            entries: &self.entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended message
    pub fn newest(&self) -> Option<&Message> {
        self.entries.back()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A read-consistent view of the log at one instant
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    entries: &'a VecDeque<Message>,
}

impl<'a> Snapshot<'a> {
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Message> + 'a {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.entries.iter().cloned().collect()
    }
}

/// Message log shared between connection tasks.
///
/// Snapshot reads run concurrently; appends take the lock exclusively.
#[derive(Debug, Clone)]
pub struct SharedLog {
    inner: Arc<RwLock<MessageLog>>,
}

impl SharedLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MessageLog::new(capacity))),
        }
    }

    /// Append under the write lock. The message is visible to readers once this returns.
    pub fn append(&self, message: Message) {
        let mut log = self.inner.write().unwrap_or_else(|e| e.into_inner());
        log.append(message);
    }

    /// Run the catch-up query against a snapshot taken under the read lock
    pub fn since(&self, cursor: &Cursor) -> Vec<Message> {
        let log = self.inner.read().unwrap_or_else(|e| e.into_inner());
        messages_since(&log.snapshot(), cursor)
    }

    /// Copy of the entire current contents
    pub fn to_vec(&self) -> Vec<Message> {
        let log = self.inner.read().unwrap_or_else(|e| e.into_inner());
        log.snapshot().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .capacity()
    }
}

impl Default for SharedLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
