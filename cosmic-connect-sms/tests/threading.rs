//! Threading a conversation received from the phone
//!
//! Drives the whole pipeline: packet bytes → message records → conversation
//! selection → visual threads with rendered labels.

use chrono::{FixedOffset, NaiveDate};
use cosmic_connect_sms::{
    linkify, messages_for_thread, summarize_conversations, Direction, Message, Packet, Separator,
    ThreadBuilder, ThreadEntry, TimeFormatter, VisualThread,
};
use serde_json::json;

const MINUTE: i64 = 60_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("cosmic_connect_sms=debug")
        .with_test_writer()
        .try_init();
}

fn ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

fn record(id: i64, thread_id: i64, date: i64, message_type: i32, body: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "thread_id": thread_id,
        "address": "+15551234567",
        "body": body,
        "date": date,
        "type": message_type,
        "read": 1
    })
}

fn threads(entries: &[ThreadEntry]) -> Vec<&VisualThread> {
    entries.iter().filter_map(ThreadEntry::as_thread).collect()
}

#[test]
fn test_gap_splits_incoming_run() {
    init_tracing();
    let base = ms(2024, 3, 15, 9, 0);
    let messages: Vec<Message> = [0i64, 10, 120, 125]
        .iter()
        .enumerate()
        .map(|(i, offset)| {
            Message::new(i as i64, 1, "5551234", "hi", base + offset * MINUTE, Direction::In)
        })
        .collect();

    let now = ms(2024, 3, 15, 12, 0);
    let mut builder = ThreadBuilder::new(TimeFormatter::new(chrono::Utc), now);
    builder.extend(&messages);
    let entries = builder.finish();

    let runs: Vec<Vec<i64>> = threads(&entries)
        .iter()
        .map(|t| t.messages(&messages).iter().map(|m| m.id).collect())
        .collect();
    assert_eq!(runs, vec![vec![0, 1], vec![2, 3]]);

    assert_eq!(
        entries[1],
        ThreadEntry::Separator(Separator::TimeGap {
            date: base + 120 * MINUTE,
            label: "11:00 AM".to_string(),
        })
    );
}

#[test]
fn test_alternating_directions() {
    let messages = vec![
        Message::new(1, 1, "5551234", "ping", 0, Direction::In),
        Message::new(2, 1, "5551234", "pong", MINUTE, Direction::Out),
        Message::new(3, 1, "5551234", "ping", 2 * MINUTE, Direction::In),
    ];

    let entries = cosmic_connect_sms::build_threads(&messages, 3 * MINUTE);
    let found = threads(&entries);
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|t| t.len() == 1));
    assert_eq!(entries.len(), 3);
}

#[test]
fn test_packet_to_threads() {
    init_tracing();
    let base = ms(2024, 3, 14, 22, 0);
    let packet = json!({
        "id": "1710500000000",
        "type": "kdeconnect.sms.messages",
        "body": {
            "conversations": [
                {
                    "thread_id": 4,
                    "messages": [
                        record(10, 4, base, 1, "Dinner at www.example.com/menu?"),
                        record(11, 4, base + 2 * MINUTE, 1, "8pm?"),
                        record(12, 4, base + 3 * MINUTE, 2, "Sure & thanks"),
                        record(13, 4, base + 4 * MINUTE, 0, "Contact changed number"),
                        record(14, 4, base + 180 * MINUTE, 2, "Leaving now"),
                        record(15, 4, base + 300 * MINUTE, 2, "Here")
                    ]
                },
                {
                    "thread_id": 5,
                    "messages": [record(20, 5, base + MINUTE, 1, "other thread")]
                }
            ]
        }
    })
    .to_string()
        + "\n";

    let all = Packet::from_bytes(packet.as_bytes())
        .unwrap()
        .sms_messages()
        .unwrap();
    assert_eq!(all.len(), 7);

    let conversations = summarize_conversations(&all, 10);
    assert_eq!(conversations[0].thread_id, 4);
    assert_eq!(conversations[0].last_message, "Here");
    assert_eq!(conversations[1].thread_id, 5);

    let messages = messages_for_thread(&all, 4);
    let now = ms(2024, 3, 15, 9, 0);
    let formatter = TimeFormatter::new(FixedOffset::east_opt(0).unwrap());
    let mut builder = ThreadBuilder::new(formatter, now);
    builder.extend(&messages);
    let entries = builder.finish();

    // in(10, 11), out(12), notice(13), out(14), gap, out(15)
    assert_eq!(entries.len(), 6);
    assert_eq!(threads(&entries)[0].range(), 0..2);
    assert_eq!(threads(&entries)[1].range(), 2..3);
    assert_eq!(entries[2], ThreadEntry::Separator(Separator::Notice { index: 3 }));
    assert_eq!(threads(&entries)[2].range(), 4..5);
    assert_eq!(
        entries[4],
        ThreadEntry::Separator(Separator::TimeGap {
            date: base + 300 * MINUTE,
            label: "3:00 AM".to_string(),
        })
    );

    let first = threads(&entries)[0].messages(&messages);
    assert_eq!(
        linkify(&first[0].body),
        r#"Dinner at <a href="www.example.com/menu">www.example.com/menu</a>?"#
    );
    assert_eq!(linkify(&messages[2].body), "Sure &amp; thanks");
}
