//! Daemon lifecycle specs
//!
//! Verify daemon start/stop/status lifecycle.

use crate::prelude::*;

#[test]
fn daemon_status_when_not_running() {
    let room = Room::empty();

    room.hb()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_start_reports_success() {
    let room = Room::empty();

    room.hb()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon started");
}

#[test]
fn daemon_start_twice_reports_already_running() {
    let room = Room::empty();
    room.hb().args(&["daemon", "start"]).passes();

    room.hb()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("already running");
}

#[test]
fn daemon_status_shows_running_after_start() {
    let room = Room::empty();
    room.hb().args(&["daemon", "start"]).passes();

    room.hb()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Uptime:")
        .stdout_has("Messages: 0/200");
}

#[test]
fn daemon_status_reflects_room_capacity() {
    let room = Room::with_settings("capacity = 3\n");
    room.hb().args(&["daemon", "start"]).passes();

    room.hb()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Messages: 0/3");
}

#[test]
fn daemon_stop_reports_success() {
    let room = Room::empty();
    room.hb().args(&["daemon", "start"]).passes();

    room.hb()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");

    room.hb()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_stop_when_not_running() {
    let room = Room::empty();

    room.hb()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_start_shows_settings_error() {
    let room = Room::with_settings("capacity = 0\n");

    room.hb()
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("capacity must be at least 1");
}

#[test]
fn daemon_start_shows_template_error() {
    let room = Room::with_settings("message_template = \"{{ body \"\n");

    room.hb()
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("invalid message template");
}

#[test]
fn daemon_creates_version_file() {
    let room = Room::empty();
    room.hb().args(&["daemon", "start"]).passes();

    let rooms_dir = room.state_path().join("hb/rooms");
    let has_version = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_dir(&rooms_dir)
            .ok()
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .any(|entry| entry.path().join("daemon.version").exists())
            })
            .unwrap_or(false)
    });
    assert!(has_version, "daemon.version should exist under {:?}", rooms_dir);
}
