use super::*;
use crate::message::MessageId;
use proptest::prelude::*;

fn msg(id: &str) -> Message {
    Message {
        id: MessageId::from(id),
        body: format!("body of {}", id),
        rendered: format!("<div>{}</div>", id),
    }
}

fn ids(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.id.as_str()).collect()
}

#[test]
fn append_preserves_insertion_order() {
    let mut log = MessageLog::new(10);
    log.append(msg("a"));
    log.append(msg("b"));
    log.append(msg("c"));

    assert_eq!(log.len(), 3);
    assert_eq!(ids(&log.snapshot().to_vec()), vec!["a", "b", "c"]);
    assert_eq!(log.newest().map(|m| m.id.as_str()), Some("c"));
}

#[test]
fn append_beyond_capacity_evicts_oldest() {
    let mut log = MessageLog::new(2);
    log.append(msg("a"));
    log.append(msg("b"));
    log.append(msg("c"));

    assert_eq!(log.len(), 2);
    assert_eq!(ids(&log.snapshot().to_vec()), vec!["b", "c"]);
}

#[test]
fn default_capacity_is_two_hundred() {
    let log = MessageLog::default();
    assert_eq!(log.capacity(), 200);
    assert!(log.is_empty());
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let mut log = MessageLog::new(0);
    log.append(msg("a"));
    log.append(msg("b"));
    assert_eq!(log.capacity(), 1);
    assert_eq!(ids(&log.snapshot().to_vec()), vec!["b"]);
}

#[test]
fn shared_log_clones_share_contents() {
    let log1 = SharedLog::new(5);
    let log2 = log1.clone();

    log1.append(msg("a"));

    assert_eq!(log2.len(), 1);
    assert_eq!(ids(&log2.to_vec()), vec!["a"]);
}

#[test]
fn shared_log_since_runs_catch_up_query() {
    let log = SharedLog::new(5);
    log.append(msg("a"));
    log.append(msg("b"));

    assert_eq!(ids(&log.since(&Cursor::at("a"))), vec!["b"]);
    assert!(log.since(&Cursor::at("b")).is_empty());
}

proptest! {
    #[test]
    fn length_never_exceeds_capacity(capacity in 1usize..20, count in 0usize..60) {
        let mut log = MessageLog::new(capacity);
        for i in 0..count {
            log.append(msg(&format!("m-{}", i)));
            prop_assert!(log.len() <= capacity);
        }
        prop_assert_eq!(log.len(), count.min(capacity));
    }

    #[test]
    fn keeps_most_recent_in_order(capacity in 1usize..20, count in 0usize..60) {
        let mut log = MessageLog::new(capacity);
        for i in 0..count {
            log.append(msg(&format!("m-{}", i)));
        }

        let expected: Vec<String> = (count.saturating_sub(capacity)..count)
            .map(|i| format!("m-{}", i))
            .collect();
        let actual: Vec<String> = log
            .snapshot()
            .iter()
            .map(|m| m.id.0.clone())
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
