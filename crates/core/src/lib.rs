// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hb-core: message fan-out for the hubbub chat daemon
//!
//! This crate provides:
//! - A bounded, in-memory message log and the catch-up query over it
//! - A wakeup broadcaster for suspended long-poll requests
//! - The long-poll subscriber loop with explicit cancellation
//! - The publish operation, tied together by [`ChatHub`]

pub mod id;
pub mod message;

pub mod broadcast;
pub mod catchup;
pub mod config;
pub mod hub;
pub mod log;
pub mod render;
pub mod subscriber;

// Re-exports
pub use broadcast::{Broadcaster, Wake, Waiter};
pub use catchup::messages_since;
pub use config::{ConfigError, Settings, SETTINGS_FILE};
pub use hub::{ChatHub, HubError};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use log::{MessageLog, SharedLog, Snapshot, DEFAULT_CAPACITY};
pub use message::{Cursor, Message, MessageId};
pub use render::{RenderError, Renderer, TemplateRenderer, DEFAULT_MESSAGE_TEMPLATE};
pub use subscriber::{poll, PollOutcome};
