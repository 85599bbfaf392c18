//! Daemon logs specs
//!
//! Verify daemon logs command behavior.

use crate::prelude::*;

#[test]
fn daemon_logs_shows_startup_marker() {
    let room = Room::empty();
    room.hb().args(&["daemon", "start"]).passes();

    room.hb()
        .args(&["daemon", "logs", "--lines", "10"])
        .passes()
        .stdout_has("hbd: starting");
}

#[test]
fn daemon_logs_shows_ready_line() {
    let room = Room::empty();
    room.hb().args(&["daemon", "start"]).passes();

    let ready = wait_for(SPEC_WAIT_MAX_MS, || {
        room.hb()
            .args(&["daemon", "logs"])
            .passes()
            .stdout()
            .contains("Daemon ready")
    });
    assert!(ready, "daemon log should report readiness");
}

#[test]
fn daemon_logs_without_daemon() {
    let room = Room::empty();

    room.hb()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("No log file");
}
