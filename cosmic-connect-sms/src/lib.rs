//! Cosmic Connect SMS
//!
//! Message-link parsing and conversation threading for the desktop side of a
//! paired phone:
//!
//! - `sms:` URIs are parsed into recipients and an optional body
//!   ([`SmsRequest`]), with phone numbers normalized by [`NumberAddress`].
//! - Message records received from the phone ([`Message`], via [`Packet`])
//!   are grouped into visual threads ([`ThreadBuilder`]).
//! - Message bodies and timestamps are prepared for display by [`linkify`]
//!   and [`TimeFormatter`].
//!
//! Everything here is synchronous and free of I/O.

pub mod address;
pub mod conversation;
pub mod linkify;
pub mod message;
pub mod packet;
pub mod thread;
pub mod time_format;
pub mod uri;

mod error;

pub use address::NumberAddress;
pub use conversation::{
    messages_for_thread, summarize_conversations, ConversationSummary, MAX_CONVERSATIONS,
};
pub use error::{Result, SmsError};
pub use linkify::linkify;
pub use message::{Direction, Message, ReadStatus};
pub use packet::Packet;
pub use thread::{
    build_threads, Separator, ThreadBuilder, ThreadEntry, VisualThread, DEFAULT_BREAK_THRESHOLD,
};
pub use time_format::{format_time, format_time_short, now_millis, TimeFormatter};
pub use uri::SmsRequest;

/// Parse an `sms:` URI
///
/// ```
/// let request = cosmic_connect_sms::parse_uri("sms:5551234;phone-context=+1?body=hello").unwrap();
///
/// assert_eq!(request.recipients()[0].as_str(), "+15551234");
/// assert_eq!(request.body(), Some("hello"));
/// ```
pub fn parse_uri(uri: &str) -> Result<SmsRequest> {
    SmsRequest::parse(uri)
}
