//! Conversation list and per-thread selection

use crate::message::Message;
use std::collections::HashSet;

/// Default length of the conversation list
pub const MAX_CONVERSATIONS: usize = 20;

/// Latest state of one conversation, for the conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub thread_id: i64,
    /// Remote party of the latest message
    pub address: String,
    /// Body of the latest message
    pub last_message: String,
    /// Date of the latest message (milliseconds since epoch)
    pub timestamp: i64,
    /// Whether the latest message is unread
    pub unread: bool,
}

impl From<&Message> for ConversationSummary {
    fn from(message: &Message) -> Self {
        Self {
            thread_id: message.thread_id,
            address: message.address.clone(),
            last_message: message.body.clone(),
            timestamp: message.date,
            unread: message.is_unread(),
        }
    }
}

/// Summarize the most recent conversations, newest first
///
/// Each thread is represented by its latest message. At most `limit`
/// summaries are returned.
pub fn summarize_conversations(messages: &[Message], limit: usize) -> Vec<ConversationSummary> {
    let mut latest_first: Vec<&Message> = messages.iter().collect();
    latest_first.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let mut seen_threads = HashSet::new();
    let mut summaries = Vec::new();

    for message in latest_first {
        if summaries.len() >= limit {
            break;
        }
        if !seen_threads.insert(message.thread_id) {
            continue;
        }
        summaries.push(ConversationSummary::from(message));
    }

    summaries
}

/// The messages of one thread, oldest first
pub fn messages_for_thread(messages: &[Message], thread_id: i64) -> Vec<Message> {
    let mut selected: Vec<Message> = messages
        .iter()
        .filter(|m| m.thread_id == thread_id)
        .cloned()
        .collect();

    selected.sort_by_key(|m| (m.date, m.id));
    selected
}
