//! Long-poll specs
//!
//! Verify `hb listen` returns backlog immediately and waits for new messages.

use crate::prelude::*;

fn say(room: &Room, text: &str) -> String {
    room.hb().args(&["say", text]).passes().stdout().trim().to_string()
}

fn waiters(room: &Room) -> u64 {
    let stdout = room
        .hb()
        .args(&["daemon", "status", "-o", "json"])
        .passes()
        .stdout();
    serde_json::from_str::<serde_json::Value>(&stdout)
        .ok()
        .and_then(|v| v["waiters"].as_u64())
        .unwrap_or(0)
}

#[test]
fn listen_once_returns_backlog() {
    let room = Room::empty();
    say(&room, "first");
    say(&room, "second");

    room.hb()
        .args(&["listen", "--once"])
        .passes()
        .stdout_has(">first<")
        .stdout_has(">second<");
}

#[test]
fn listen_from_cursor_returns_only_newer_messages() {
    let room = Room::empty();
    let first = say(&room, "first");
    say(&room, "second");

    room.hb()
        .args(&["listen", "--once", "--cursor", &first])
        .passes()
        .stdout_lacks(">first<")
        .stdout_has(">second<");
}

#[test]
fn caught_up_listener_waits_for_next_message() {
    let room = Room::empty();
    let last = say(&room, "before");

    let listener = room.spawn_hb(&["listen", "--once", "--cursor", &last]);
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || waiters(&room) == 1),
        "listener should be suspended in the daemon"
    );

    say(&room, "after");

    let stdout = finish(listener);
    assert!(stdout.contains(">after<"), "stdout: {}", stdout);
    assert!(!stdout.contains(">before<"), "stdout: {}", stdout);
}

#[test]
fn one_message_wakes_every_listener() {
    let room = Room::empty();
    let last = say(&room, "before");

    let first = room.spawn_hb(&["listen", "--once", "--cursor", &last]);
    let second = room.spawn_hb(&["listen", "--once", "--cursor", &last]);
    assert!(wait_for(SPEC_WAIT_MAX_MS, || waiters(&room) == 2));

    say(&room, "broadcast");

    assert!(finish(first).contains(">broadcast<"));
    assert!(finish(second).contains(">broadcast<"));
}

#[test]
fn killed_listener_releases_its_waiter() {
    let room = Room::empty();
    let last = say(&room, "before");

    let mut listener = room.spawn_hb(&["listen", "--once", "--cursor", &last]);
    assert!(wait_for(SPEC_WAIT_MAX_MS, || waiters(&room) == 1));

    listener.kill().unwrap();
    let _ = listener.wait();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || waiters(&room) == 0),
        "daemon should drop the waiter of a disconnected listener"
    );
}

#[test]
fn stale_cursor_resends_whole_window() {
    let room = Room::with_settings("capacity = 2\n");
    let evicted = say(&room, "one");
    say(&room, "two");
    say(&room, "three");

    room.hb()
        .args(&["listen", "--once", "--cursor", &evicted])
        .passes()
        .stdout_has(">two<")
        .stdout_has(">three<");
}

#[test]
fn listen_json_output_has_ids() {
    let room = Room::empty();
    let id = say(&room, "json");

    room.hb()
        .args(&["listen", "--once", "-o", "json"])
        .passes()
        .stdout_has(&format!("\"id\":\"{}\"", id));
}
