//! Message records as reported by the phone
//!
//! The phone sends each SMS as a JSON object modelled on Android's
//! `content://sms` columns:
//!
//! ```json
//! {
//!     "_id": 42,
//!     "thread_id": 7,
//!     "address": "+15551234567",
//!     "body": "On my way",
//!     "date": 1700000000000,
//!     "type": 1,
//!     "read": 1
//! }
//! ```
//!
//! Newer phones replace `address` with `"addresses": [{"address": "..."}]`;
//! both are accepted and the first listed address is kept.

use serde::{Deserialize, Serialize};

/// Android message box for received messages
pub const MESSAGE_TYPE_INBOX: i32 = 1;

/// Android message box for sent messages
pub const MESSAGE_TYPE_SENT: i32 = 2;

/// Message box used for non-conversational notices
pub const MESSAGE_TYPE_NOTICE: i32 = 0;

/// Who a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// System notice, never grouped with other messages
    Notice,
    /// Received from the remote party
    In,
    /// Sent from this phone
    Out,
}

impl Direction {
    /// Map an Android message box to a direction
    ///
    /// Everything other than the inbox and notices (sent, draft, outbox,
    /// failed, queued) was written on this phone and counts as outgoing.
    pub fn from_message_type(message_type: i32) -> Self {
        match message_type {
            MESSAGE_TYPE_INBOX => Direction::In,
            MESSAGE_TYPE_NOTICE => Direction::Notice,
            _ => Direction::Out,
        }
    }

    /// Android message box for this direction
    pub fn message_type(self) -> i32 {
        match self {
            Direction::Notice => MESSAGE_TYPE_NOTICE,
            Direction::In => MESSAGE_TYPE_INBOX,
            Direction::Out => MESSAGE_TYPE_SENT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Notice => "notice",
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Whether the user has seen a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadStatus {
    Unread,
    Read,
}

impl ReadStatus {
    /// `0` is unread, anything else is read
    pub fn from_read_flag(read: i32) -> Self {
        if read == 0 {
            ReadStatus::Unread
        } else {
            ReadStatus::Read
        }
    }

    pub fn read_flag(self) -> i32 {
        match self {
            ReadStatus::Unread => 0,
            ReadStatus::Read => 1,
        }
    }
}

/// A single message record
///
/// Records are never modified once received; the threading and conversation
/// code only borrows them.
///
/// # Examples
///
/// ```
/// use cosmic_connect_sms::{Direction, Message, ReadStatus};
///
/// let json = r#"{"_id":1,"thread_id":3,"address":"5551234","body":"hi","date":1000,"type":1,"read":0}"#;
/// let message: Message = serde_json::from_str(json).unwrap();
///
/// assert_eq!(message.direction, Direction::In);
/// assert_eq!(message.status, ReadStatus::Unread);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMessage", into = "WireMessage")]
pub struct Message {
    /// Message ID
    pub id: i64,

    /// Conversation the message belongs to
    pub thread_id: i64,

    /// Remote party's phone number
    pub address: String,

    pub body: String,

    /// Timestamp (milliseconds since epoch)
    pub date: i64,

    pub direction: Direction,

    pub status: ReadStatus,
}

impl Message {
    /// Create a read message
    pub fn new(
        id: i64,
        thread_id: i64,
        address: impl Into<String>,
        body: impl Into<String>,
        date: i64,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            thread_id,
            address: address.into(),
            body: body.into(),
            date,
            direction,
            status: ReadStatus::Read,
        }
    }

    /// Builder pattern: Set read status
    pub fn with_status(mut self, status: ReadStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_unread(&self) -> bool {
        self.status == ReadStatus::Unread
    }

    pub fn is_notice(&self) -> bool {
        self.direction == Direction::Notice
    }
}

/// One entry of the `addresses` list
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireAddress {
    address: String,
}

/// JSON layout of a message as sent by the phone
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "_id", alias = "id", default)]
    id: i64,

    #[serde(rename = "thread_id", default)]
    thread_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    addresses: Vec<WireAddress>,

    #[serde(default)]
    body: String,

    date: i64,

    #[serde(rename = "type")]
    message_type: i32,

    #[serde(default = "default_read_flag")]
    read: i32,
}

fn default_read_flag() -> i32 {
    ReadStatus::Read.read_flag()
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let address = wire
            .address
            .or_else(|| wire.addresses.into_iter().next().map(|a| a.address))
            .unwrap_or_default();

        Self {
            id: wire.id,
            thread_id: wire.thread_id,
            address,
            body: wire.body,
            date: wire.date,
            direction: Direction::from_message_type(wire.message_type),
            status: ReadStatus::from_read_flag(wire.read),
        }
    }
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
            address: Some(message.address),
            addresses: Vec::new(),
            body: message.body,
            date: message.date,
            message_type: message.direction.message_type(),
            read: message.status.read_flag(),
        }
    }
}
