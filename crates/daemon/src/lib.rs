// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hb-daemon: the hubbub room daemon (`hbd`)
//!
//! Exposes the wire protocol for clients and the lifecycle/server pieces the
//! binary is assembled from.

pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use lifecycle::{Config, DaemonState, LifecycleError};
pub use protocol::{ProtocolError, Request, Response, PROTOCOL_VERSION};
pub use server::{RoomHub, ServerContext, ServerError};
