//! SMS packets on the device link
//!
//! Packets are JSON objects terminated by a single newline. SMS traffic uses
//! three packet types:
//!
//! - `cconnect.sms.messages`: phone → desktop, carries message records
//! - `cconnect.sms.request_conversations` / `request_conversation`: desktop →
//!   phone, asks for the conversation list or one thread's history
//! - `cconnect.sms.request`: desktop → phone, sends a message
//!
//! Phones running the upstream KDE Connect app use a `kdeconnect.` prefix
//! instead of `cconnect.`; the two are treated as the same type.

use crate::message::Message;
use crate::time_format::now_millis;
use crate::uri::SmsRequest;
use crate::{Result, SmsError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Message records from the phone
pub const PACKET_TYPE_SMS_MESSAGES: &str = "cconnect.sms.messages";

/// Request the latest message of every conversation
pub const PACKET_TYPE_SMS_REQUEST_CONVERSATIONS: &str = "cconnect.sms.request_conversations";

/// Request the history of one conversation
pub const PACKET_TYPE_SMS_REQUEST_CONVERSATION: &str = "cconnect.sms.request_conversation";

/// Send a message
pub const PACKET_TYPE_SMS_REQUEST: &str = "cconnect.sms.request";

/// A device-link packet
///
/// # Examples
///
/// ```
/// use cosmic_connect_sms::Packet;
///
/// let data = br#"{"id":"1700000000000","type":"kdeconnect.sms.messages","body":{"messages":[]}}"#;
/// let packet = Packet::from_bytes(data).unwrap();
///
/// assert!(packet.is_type("cconnect.sms.messages"));
/// assert!(packet.sms_messages().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Packet {
    /// UNIX timestamp in milliseconds
    /// Note: Some clients send this as a string
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,

    /// Packet type in format: cconnect.<plugin>[.<action>]
    #[serde(rename = "type")]
    pub packet_type: String,

    /// Plugin-specific parameters
    #[serde(default)]
    pub body: Value,
}

impl Packet {
    /// Creates a new packet stamped with the current time
    pub fn new(packet_type: impl Into<String>, body: Value) -> Self {
        Self::with_id(now_millis(), packet_type, body)
    }

    /// Create a new packet with an explicit timestamp
    pub fn with_id(id: i64, packet_type: impl Into<String>, body: Value) -> Self {
        Self {
            id,
            packet_type: packet_type.into(),
            body,
        }
    }

    /// Serialize packet to bytes with newline terminator
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Deserialize a packet from bytes
    ///
    /// Accepts `\n`, `\r\n` or no terminator.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let trimmed = data
            .strip_suffix(b"\r\n")
            .or_else(|| data.strip_suffix(b"\n"))
            .unwrap_or(data);

        serde_json::from_slice(trimmed).map_err(|e| {
            SmsError::InvalidPacket(format!("Failed to deserialize packet: {}", e))
        })
    }

    /// Check if packet is of a specific type, ignoring the vendor prefix
    pub fn is_type(&self, packet_type: &str) -> bool {
        strip_vendor_prefix(&self.packet_type) == strip_vendor_prefix(packet_type)
    }

    /// Extract every message record from a `cconnect.sms.messages` packet
    ///
    /// The body is either `{"conversations": [{"thread_id", "messages"}]}` or
    /// a flat `{"messages": [...]}`. Messages are returned in ascending
    /// `(date, id)` order, ready for threading.
    pub fn sms_messages(&self) -> Result<Vec<Message>> {
        if !self.is_type(PACKET_TYPE_SMS_MESSAGES) {
            return Err(SmsError::InvalidPacket(format!(
                "expected {}, got {}",
                PACKET_TYPE_SMS_MESSAGES, self.packet_type
            )));
        }

        let has_conversations = self.body.get("conversations").is_some();
        if !has_conversations && self.body.get("messages").is_none() {
            return Err(SmsError::InvalidPacket(
                "SMS packet has neither conversations nor messages".to_string(),
            ));
        }

        let body: SmsMessagesBody = serde_json::from_value(self.body.clone())
            .map_err(|e| SmsError::InvalidPacket(format!("Failed to parse SMS: {}", e)))?;

        let mut messages = body.messages;
        for conversation in body.conversations {
            debug!(
                "Thread {}: {} messages",
                conversation.thread_id,
                conversation.messages.len()
            );
            messages.extend(conversation.messages.into_iter().map(|mut message| {
                if message.thread_id == 0 {
                    message.thread_id = conversation.thread_id;
                }
                message
            }));
        }

        messages.sort_by_key(|m| (m.date, m.id));
        info!("Received {} SMS messages", messages.len());

        Ok(messages)
    }

    /// Build a request for the latest message of every conversation
    pub fn request_conversations() -> Self {
        Self::new(PACKET_TYPE_SMS_REQUEST_CONVERSATIONS, json!({}))
    }

    /// Build a request for one conversation's history
    ///
    /// `range_start` limits the reply to messages older than the given
    /// timestamp; `count` caps the number of messages returned.
    pub fn request_conversation(
        thread_id: i64,
        range_start: Option<i64>,
        count: Option<u32>,
    ) -> Self {
        debug!("Creating conversation request for thread {}", thread_id);

        let mut body = json!({ "threadID": thread_id });
        if let Some(start) = range_start {
            body["rangeStartTimestamp"] = json!(start);
        }
        if let Some(count) = count {
            body["numberToRequest"] = json!(count);
        }

        Self::new(PACKET_TYPE_SMS_REQUEST_CONVERSATION, body)
    }
}

impl SmsRequest {
    /// Build the `cconnect.sms.request` packet that sends this message
    ///
    /// The packet lists every recipient under `addresses` and repeats the
    /// first one as `phoneNumber` for phones that only understand a single
    /// recipient.
    pub fn to_packet(&self) -> Packet {
        let addresses: Vec<Value> = self
            .recipients()
            .iter()
            .map(|r| json!({ "address": r.as_str() }))
            .collect();
        let phone_number = self
            .recipients()
            .first()
            .map(|r| r.as_str())
            .unwrap_or_default();

        debug!("Creating send SMS request to {}", phone_number);

        Packet::new(
            PACKET_TYPE_SMS_REQUEST,
            json!({
                "addresses": addresses,
                "phoneNumber": phone_number,
                "messageBody": self.body().unwrap_or_default(),
            }),
        )
    }
}

/// SMS conversation thread
#[derive(Debug, Deserialize)]
struct SmsConversation {
    #[serde(rename = "thread_id", default)]
    thread_id: i64,

    #[serde(default)]
    messages: Vec<Message>,
}

/// SMS messages packet body
#[derive(Debug, Deserialize)]
struct SmsMessagesBody {
    #[serde(default)]
    conversations: Vec<SmsConversation>,

    #[serde(default)]
    messages: Vec<Message>,
}

fn strip_vendor_prefix(packet_type: &str) -> &str {
    packet_type
        .strip_prefix("cconnect.")
        .or_else(|| packet_type.strip_prefix("kdeconnect."))
        .unwrap_or(packet_type)
}

/// Custom deserializer for the `id` field to handle both string and number formats
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value: Value = Deserialize::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::custom("Invalid number for id")),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| Error::custom("Invalid string for id")),
        _ => Err(Error::custom("id must be a number or string")),
    }
}
