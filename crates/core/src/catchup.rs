// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catch-up query: which messages has a subscriber not seen yet?

use crate::log::Snapshot;
use crate::message::{Cursor, Message};

/// Messages newer than `cursor`, oldest first.
///
/// Scans from the newest entry backwards and stops at the entry whose id equals
/// the cursor, excluding it. A cursor that is not in the snapshot (evicted, or
/// never valid) never stops the scan, so the whole window is returned exactly
/// as for [`Cursor::None`].
pub fn messages_since(snapshot: &Snapshot<'_>, cursor: &Cursor) -> Vec<Message> {
    let mut fresh: Vec<Message> = snapshot
        .iter()
        .rev()
        .take_while(|message| !cursor.is_at(&message.id))
        .cloned()
        .collect();
    fresh.reverse();
    fresh
}

#[cfg(test)]
#[path = "catchup_tests.rs"]
mod tests;
