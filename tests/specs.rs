//! Behavioral specifications for the hb CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// daemon/
#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;
#[path = "specs/daemon/logs.rs"]
mod daemon_logs;

// chat/
#[path = "specs/chat/publish.rs"]
mod chat_publish;
#[path = "specs/chat/listen.rs"]
mod chat_listen;
