//! Error handling for SMS parsing and packet decoding
//!
//! Every fallible operation in this crate returns [`Result`], whose error side
//! is [`SmsError`]. Parsers never hand back partially-populated values: a URI
//! with one bad recipient fails as a whole.
//!
//! Formatting (`time_format`, `linkify`) and threading (`thread`) never fail,
//! so they do not appear here.
//!
//! ## Error Matching
//!
//! ```rust
//! use cosmic_connect_sms::{parse_uri, SmsError};
//!
//! match parse_uri("sms:5551234?body=a&body=b") {
//!     Err(SmsError::DuplicateField(field)) => assert_eq!(field, "body"),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```
//!
//! ## Logging Errors
//!
//! Parse failures are logged at `debug` level where they occur. Callers that
//! surface the failure to a user should prefer [`SmsError::user_message`].

use thiserror::Error;

/// Result type for SMS operations
pub type Result<T> = std::result::Result<T, SmsError>;

/// Errors that can occur while parsing addresses, URIs and packets
///
/// # Examples
///
/// ```rust
/// use cosmic_connect_sms::SmsError;
///
/// let error = SmsError::MalformedAddress("555  1234".to_string());
/// assert_eq!(error.to_string(), "Malformed address: 555  1234");
///
/// let error = SmsError::DuplicateField("body".to_string());
/// assert_eq!(error.to_string(), "Duplicate field: body");
/// ```
#[derive(Error, Debug)]
pub enum SmsError {
    /// A phone-number token violates the lenient digit grammar, or its
    /// `;key=value` parameters are malformed.
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    /// An `sms:` URI violates the scheme or structure rules
    ///
    /// Also raised when a URI carries a fragment, or when any of its
    /// recipients fails address parsing.
    #[error("Malformed URI: {0}")]
    MalformedUri(String),

    /// A query field that may only appear once was repeated
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// Invalid or malformed packet
    ///
    /// The packet decoded as JSON but does not have the expected type or
    /// body layout.
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// JSON serialization/deserialization error
    ///
    /// Automatically converted from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmsError {
    /// Check if this error came from parsing user-supplied text
    ///
    /// Returns `true` for address and URI errors, `false` for packet errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cosmic_connect_sms::SmsError;
    ///
    /// assert!(SmsError::MalformedUri("no recipients".to_string()).is_parse_error());
    /// assert!(!SmsError::InvalidPacket("wrong type".to_string()).is_parse_error());
    /// ```
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            SmsError::MalformedAddress(_) | SmsError::MalformedUri(_) | SmsError::DuplicateField(_)
        )
    }

    /// Get a user-friendly error message suitable for display in UI
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cosmic_connect_sms::SmsError;
    ///
    /// let error = SmsError::DuplicateField("body".to_string());
    /// assert_eq!(
    ///     error.user_message(),
    ///     "The message link sets \"body\" more than once."
    /// );
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            SmsError::MalformedAddress(address) => {
                format!("\"{}\" is not a valid phone number.", address)
            }
            SmsError::MalformedUri(msg) => {
                format!("Invalid message link: {}.", msg)
            }
            SmsError::DuplicateField(field) => {
                format!("The message link sets \"{}\" more than once.", field)
            }
            SmsError::InvalidPacket(msg) => {
                format!("Invalid data received from the phone: {}.", msg)
            }
            SmsError::Json(e) => {
                format!("Data format error: {}.", e)
            }
        }
    }

    /// Create a malformed URI error
    pub fn malformed_uri(msg: impl Into<String>) -> Self {
        SmsError::MalformedUri(msg.into())
    }

    /// Create a malformed address error
    pub fn malformed_address(msg: impl Into<String>) -> Self {
        SmsError::MalformedAddress(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SmsError::MalformedUri("missing sms: scheme".to_string());
        assert_eq!(error.to_string(), "Malformed URI: missing sms: scheme");

        let error = SmsError::InvalidPacket("bad format".to_string());
        assert_eq!(error.to_string(), "Invalid packet: bad format");
    }

    #[test]
    fn test_json_error_conversion() {
        let json = r#"{"invalid json"#;
        let json_error = serde_json::from_str::<serde_json::Value>(json).unwrap_err();
        let error: SmsError = json_error.into();

        assert!(matches!(error, SmsError::Json(_)));
        assert!(!error.is_parse_error());
    }

    #[test]
    fn test_parse_error_classification() {
        assert!(SmsError::malformed_address("x").is_parse_error());
        assert!(SmsError::malformed_uri("x").is_parse_error());
        assert!(SmsError::DuplicateField("body".to_string()).is_parse_error());
        assert!(!SmsError::InvalidPacket("x".to_string()).is_parse_error());
    }

    #[test]
    fn test_user_messages() {
        let error = SmsError::malformed_address("abc!");
        assert_eq!(error.user_message(), "\"abc!\" is not a valid phone number.");

        let error = SmsError::malformed_uri("fragments are not permitted");
        assert_eq!(
            error.user_message(),
            "Invalid message link: fragments are not permitted."
        );
    }
}
