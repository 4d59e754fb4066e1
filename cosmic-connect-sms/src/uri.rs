//! `sms:` URIs
//!
//! Parses and serializes the RFC 5724 `sms:` scheme used to start a new
//! conversation from a link:
//!
//! ```text
//! sms:[//[/]]recipient[,recipient]*[?key=value[&key=value]*]
//! ```
//!
//! Each recipient is a [`NumberAddress`] token. The only query field with
//! meaning is `body`; unknown fields are accepted and skipped so that newer
//! links keep working. Fragments are rejected outright.
//!
//! Serializing an [`SmsRequest`] and parsing the result yields an equal
//! request.

use crate::address::{decode_escape, NumberAddress};
use crate::{Result, SmsError};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// URI scheme, including the colon
pub const SMS_SCHEME: &str = "sms:";

/// Query field carrying the message text
pub const BODY_FIELD: &str = "body";

/// Slashes tolerated between the scheme and the first recipient
const MAX_SLASHES: usize = 3;

/// Everything except RFC 3986 unreserved characters is escaped in the body
const BODY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A request to compose a message, as carried by an `sms:` URI
///
/// # Examples
///
/// ```
/// use cosmic_connect_sms::SmsRequest;
///
/// let request: SmsRequest = "sms:5551234,5556789?body=Hello%20there".parse().unwrap();
/// assert_eq!(request.recipients().len(), 2);
/// assert_eq!(request.body(), Some("Hello there"));
/// assert_eq!(request.to_string(), "sms:5551234,5556789?body=Hello%20there");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsRequest {
    recipients: Vec<NumberAddress>,
    body: Option<String>,
}

impl SmsRequest {
    /// Create a request from already-parsed recipients
    ///
    /// # Errors
    ///
    /// Returns `SmsError::MalformedUri` if `recipients` is empty.
    pub fn new(recipients: Vec<NumberAddress>, body: Option<String>) -> Result<Self> {
        if recipients.is_empty() {
            return Err(SmsError::malformed_uri("at least one recipient is required"));
        }
        Ok(Self { recipients, body })
    }

    /// Parse an `sms:` URI
    ///
    /// # Errors
    ///
    /// - `SmsError::MalformedUri` for a wrong scheme, a fragment, an empty or
    ///   invalid recipient, or a malformed query
    /// - `SmsError::DuplicateField` when `body` appears more than once
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = match uri.get(..SMS_SCHEME.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(SMS_SCHEME) => &uri[SMS_SCHEME.len()..],
            _ => return Err(SmsError::malformed_uri("missing sms: scheme")),
        };

        let slashes = rest.bytes().take_while(|&b| b == b'/').count();
        if slashes > MAX_SLASHES {
            return Err(SmsError::malformed_uri("too many slashes after scheme"));
        }
        let rest = &rest[slashes..];

        if rest.contains('#') {
            debug!("Rejected sms: URI with fragment");
            return Err(SmsError::malformed_uri("fragments are not permitted"));
        }

        let (recipients_part, query) = match rest.split_once('?') {
            Some((recipients, query)) => (recipients, Some(query)),
            None => (rest, None),
        };

        if recipients_part.is_empty() {
            return Err(SmsError::malformed_uri("no recipients"));
        }

        let recipients = recipients_part
            .split(',')
            .map(|token| {
                NumberAddress::parse(token).map_err(|e| {
                    debug!("Rejected sms: recipient {:?}: {}", token, e);
                    SmsError::MalformedUri(format!("invalid recipient {:?}", token))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let body = match query {
            Some(query) => parse_query(query)?,
            None => None,
        };

        Ok(Self { recipients, body })
    }

    /// Recipients in the order given
    pub fn recipients(&self) -> &[NumberAddress] {
        &self.recipients
    }

    /// Decoded message text, if the URI carried one
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Split into recipients and body
    pub fn into_parts(self) -> (Vec<NumberAddress>, Option<String>) {
        (self.recipients, self.body)
    }
}

impl fmt::Display for SmsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SMS_SCHEME)?;

        for (i, recipient) in self.recipients.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&recipient.to_uri_component())?;
        }

        if let Some(body) = &self.body {
            write!(f, "?{}={}", BODY_FIELD, utf8_percent_encode(body, BODY_ESCAPE))?;
        }

        Ok(())
    }
}

impl FromStr for SmsRequest {
    type Err = SmsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn is_query_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b'!'
                | b'$'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b':'
                | b'@'
                | b'/'
                | b'?'
        )
}

fn is_query_value(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'%' {
            if decode_escape(bytes, pos).is_none() {
                return false;
            }
            pos += 3;
        } else if is_query_byte(bytes[pos]) {
            pos += 1;
        } else {
            return false;
        }
    }
    true
}

/// Walk `key=value` fields, returning the decoded `body` if present
fn parse_query(query: &str) -> Result<Option<String>> {
    if query.is_empty() {
        return Err(SmsError::malformed_uri("empty query"));
    }

    let mut body: Option<String> = None;

    for field in query.split('&') {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| SmsError::MalformedUri(format!("query field {:?} has no value", field)))?;

        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(SmsError::MalformedUri(format!("invalid query key {:?}", key)));
        }

        let is_body = key.eq_ignore_ascii_case(BODY_FIELD);
        if is_body && body.is_some() {
            debug!("Rejected sms: URI with repeated body");
            return Err(SmsError::DuplicateField(BODY_FIELD.to_string()));
        }

        if !is_query_value(value) {
            return Err(SmsError::MalformedUri(format!(
                "invalid value for query key {:?}",
                key
            )));
        }

        if !is_body {
            debug!("Ignoring unknown sms: query field {:?}", key);
            continue;
        }

        let decoded = percent_decode_str(value)
            .decode_utf8()
            .map_err(|_| SmsError::malformed_uri("body is not valid UTF-8"))?;
        body = Some(decoded.into_owned());
    }

    Ok(body)
}
