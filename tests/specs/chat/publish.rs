//! Publishing specs
//!
//! Verify `hb say`, `hb join` and `hb history`.

use crate::prelude::*;

#[test]
fn history_of_new_room_is_empty() {
    let room = Room::empty();

    room.hb()
        .args(&["history"])
        .passes()
        .stdout_has("No messages");
}

#[test]
fn say_auto_starts_daemon_and_appears_in_history() {
    let room = Room::empty();
    room.hb().args(&["say", "hello"]).passes();

    room.hb()
        .args(&["history"])
        .passes()
        .stdout_has("<div class=\"message\"")
        .stdout_has(">hello</div>");
}

#[test]
fn rendered_messages_are_html_escaped() {
    let room = Room::empty();
    room.hb().args(&["say", "<b>hi</b>"]).passes();

    room.hb()
        .args(&["history"])
        .passes()
        .stdout_has("&lt;b&gt;hi&lt;/b&gt;")
        .stdout_lacks("<b>");
}

#[test]
fn custom_template_is_used() {
    let room = Room::with_settings("message_template = \"<p>{{ body }}</p>\"\n");
    room.hb().args(&["say", "custom"]).passes();

    room.hb()
        .args(&["history"])
        .passes()
        .stdout_has("<p>custom</p>");
}

#[test]
fn say_with_next_prints_redirect() {
    let room = Room::empty();

    room.hb()
        .args(&["say", "bye", "--next", "/room"])
        .passes()
        .stdout_has("Redirect: /room");
}

#[test]
fn say_as_prefixes_author_tail() {
    let room = Room::empty();
    room.hb()
        .args(&["say", "hi", "--as", "visitor-12345"])
        .passes();

    room.hb()
        .args(&["history", "-o", "json"])
        .passes()
        .stdout_has("\"body\":\"12345 :  hi\"");
}

#[test]
fn join_counts_visitors() {
    let room = Room::empty();

    room.hb()
        .args(&["join"])
        .passes()
        .stdout_has("(visitor #1)");
    room.hb()
        .args(&["join"])
        .passes()
        .stdout_has("(visitor #2)");
}

#[test]
fn history_keeps_only_the_newest_messages() {
    let room = Room::with_settings("capacity = 2\n");
    for text in ["one", "two", "three"] {
        room.hb().args(&["say", text]).passes();
    }

    room.hb()
        .args(&["history"])
        .passes()
        .stdout_lacks(">one<")
        .stdout_has(">two<")
        .stdout_has(">three<");
}
