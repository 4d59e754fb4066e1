//! Phone Number Addresses
//!
//! Normalizes a single phone-number token, optionally followed by `tel:`
//! style parameters (RFC 3966), into a canonical address string.
//!
//! ## Grammar
//!
//! ```text
//! token   = number *( ";" key "=" value )
//! number  = [ "+" ] 1*( hexdigit / "*" / "#" / "(" / ")" / "." / "-" / interior-space )
//! key     = 1*( alphanum / "-" )
//! value   = 1*( alphanum / mark / "[" / "]" / "/" / ":" / "&" / "+" / "$" / "%" HEXDIG HEXDIG )
//! ```
//!
//! A space (literal or `%20`) is only accepted between two non-space number
//! characters. Other percent escapes in the number are decoded when they
//! stand for a number character, so `%23` is accepted as `#`.
//!
//! The only parameter with meaning is `phone-context`: a value starting with
//! `+` is an international prefix and is prepended to the number. Domain
//! contexts and every other parameter are ignored.

use crate::{Result, SmsError};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use tracing::debug;

/// Parameter naming the context a local number belongs to
pub const PHONE_CONTEXT: &str = "phone-context";

/// A normalized phone number
///
/// Two addresses are equal when their canonical forms are equal, regardless
/// of whether the prefix came from the number itself or from a
/// `phone-context` parameter.
///
/// # Examples
///
/// ```
/// use cosmic_connect_sms::NumberAddress;
///
/// let address = NumberAddress::parse("5551234;phone-context=+1").unwrap();
/// assert_eq!(address.as_str(), "+15551234");
/// assert_eq!(address.digits(), "5551234");
/// assert_eq!(address.context_prefix(), Some("+1"));
/// ```
#[derive(Debug, Clone)]
pub struct NumberAddress {
    digits: String,
    context_prefix: Option<String>,
    canonical: String,
}

impl NumberAddress {
    /// Parse a token of the form `number[;key=value]*`
    pub fn parse(token: &str) -> Result<Self> {
        match token.find(';') {
            Some(idx) => Self::from_parts(&token[..idx], &token[idx..]),
            None => Self::from_parts(token, ""),
        }
    }

    /// Parse a number and its parameter string separately
    ///
    /// `params` is either empty or a sequence of `;key=value` segments,
    /// including the leading `;`.
    pub fn from_parts(number: &str, params: &str) -> Result<Self> {
        let digits = decode_number(number).ok_or_else(|| {
            debug!("Rejected phone number token {:?}", number);
            SmsError::MalformedAddress(number.to_string())
        })?;

        let mut context_prefix = None;
        for (key, value) in parse_params(params)? {
            if !key.eq_ignore_ascii_case(PHONE_CONTEXT) || !value.starts_with('+') {
                continue;
            }

            // A number that already carries its own `+` is global
            if digits.starts_with('+') {
                debug!("Ignoring phone-context {:?} for global number", value);
                break;
            }

            let prefix = decode_number(value).ok_or_else(|| {
                debug!("Rejected phone-context prefix {:?}", value);
                SmsError::MalformedAddress(format!("{};{}={}", number, key, value))
            })?;
            context_prefix = Some(prefix);
            break;
        }

        let canonical = match &context_prefix {
            Some(prefix) => format!("{}{}", prefix, digits),
            None => digits.clone(),
        };

        Ok(Self {
            digits,
            context_prefix,
            canonical,
        })
    }

    /// The decoded number token, without any context prefix
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// The `+` prefix taken from a `phone-context` parameter, if any
    pub fn context_prefix(&self) -> Option<&str> {
        self.context_prefix.as_deref()
    }

    /// The canonical address used for thread and contact matching
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The canonical address escaped for use inside an `sms:` URI
    ///
    /// Spaces become `%20` and `#` becomes `%23`; every other number
    /// character is URI-safe as is.
    pub fn to_uri_component(&self) -> String {
        let mut out = String::with_capacity(self.canonical.len());
        for c in self.canonical.chars() {
            match c {
                ' ' => out.push_str("%20"),
                '#' => out.push_str("%23"),
                c => out.push(c),
            }
        }
        out
    }
}

impl PartialEq for NumberAddress {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for NumberAddress {}

impl Hash for NumberAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for NumberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for NumberAddress {
    type Err = SmsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for NumberAddress {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_hexdigit() || matches!(c, '*' | '#' | '(' | ')' | '.' | '-')
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode a `%HH` escape starting at `pos`
pub(crate) fn decode_escape(bytes: &[u8], pos: usize) -> Option<u8> {
    let hi = hex_value(*bytes.get(pos + 1)?)?;
    let lo = hex_value(*bytes.get(pos + 2)?)?;
    Some((hi << 4) | lo)
}

/// Match a token against the lenient digit grammar, returning it decoded
fn decode_number(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    if bytes.first() == Some(&b'+') {
        out.push('+');
        pos = 1;
    }
    let body_start = out.len();

    while pos < bytes.len() {
        let (byte, width) = match bytes[pos] {
            b'%' => (decode_escape(bytes, pos)?, 3),
            b => (b, 1),
        };
        // Non-ASCII bytes never belong to the grammar
        if !byte.is_ascii() {
            return None;
        }

        let c = byte as char;
        if c == ' ' {
            if out.len() == body_start || out.ends_with(' ') {
                return None;
            }
        } else if !is_number_char(c) {
            return None;
        }

        out.push(c);
        pos += width;
    }

    if out.len() == body_start || out.ends_with(' ') {
        return None;
    }
    Some(out)
}

fn is_param_value_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
                | b'['
                | b']'
                | b'/'
                | b':'
                | b'&'
                | b'+'
                | b'$'
        )
}

fn is_param_value(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'%' {
            if decode_escape(bytes, pos).is_none() {
                return false;
            }
            pos += 3;
        } else if is_param_value_byte(bytes[pos]) {
            pos += 1;
        } else {
            return false;
        }
    }
    !bytes.is_empty()
}

/// Split `;key=value` segments, validating each against the parameter grammar
fn parse_params(params: &str) -> Result<Vec<(&str, &str)>> {
    if params.is_empty() {
        return Ok(Vec::new());
    }

    let rest = params
        .strip_prefix(';')
        .ok_or_else(|| SmsError::MalformedAddress(params.to_string()))?;

    rest.split(';')
        .map(|segment| {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| SmsError::MalformedAddress(format!("parameter {:?}", segment)))?;

            let key_ok =
                !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
            if !key_ok || !is_param_value(value) {
                return Err(SmsError::MalformedAddress(format!(
                    "parameter {:?}",
                    segment
                )));
            }

            Ok((key, value))
        })
        .collect()
}
