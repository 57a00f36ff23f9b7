//! Text encodings used to carry signed payloads and keys.
//!
//! Payloads reach the engine as text. Binary formats are wrapped in hex
//! (called "plain" in the XML transport files) or Base64, and XML envelopes
//! are sometimes escaped a second time when they are embedded in another
//! XML document.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::DecodingError;

/// Encodings a signed payload or key may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingType {
    /// Hexadecimal digits; `plain` in transport files.
    #[serde(rename = "plain", alias = "hex")]
    PlainHex,
    /// RFC 4648 Base64 with padding.
    #[serde(rename = "base64")]
    Base64,
}

impl EncodingType {
    /// All encodings in probing order, most specific first.
    pub const ALL: [EncodingType; 2] = [EncodingType::PlainHex, EncodingType::Base64];

    /// Encodings `text` plausibly is in, most specific first.
    ///
    /// Hex is listed before Base64 because its alphabet is a strict subset.
    /// Never fails; an empty list means no candidate.
    #[must_use]
    pub fn guess_type(text: &str) -> Vec<EncodingType> {
        let clean = strip_whitespace(text);
        if clean.is_empty() {
            return Vec::new();
        }
        Self::ALL
            .into_iter()
            .filter(|encoding| encoding.accepts(&clean))
            .collect()
    }

    fn accepts(self, clean: &str) -> bool {
        match self {
            Self::PlainHex => {
                clean.len() % 2 == 0 && clean.bytes().all(|b| b.is_ascii_hexdigit())
            },
            Self::Base64 => STANDARD.decode(clean).is_ok(),
        }
    }

    /// Decode `text`, ignoring embedded whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError`] if `text` violates the encoding's grammar.
    pub fn decode(self, text: &str) -> Result<Vec<u8>, DecodingError> {
        let clean = strip_whitespace(text);
        match self {
            Self::PlainHex => hex::decode(&clean).map_err(|e| {
                DecodingError::new(format!("Invalid hex data: {e}"), "error.decoding.hex")
            }),
            Self::Base64 => STANDARD.decode(&clean).map_err(|e| {
                DecodingError::new(format!("Invalid base64 data: {e}"), "error.decoding.base64")
            }),
        }
    }

    /// Encode `bytes`. Hex is written in upper case.
    #[must_use]
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::PlainHex => hex::encode_upper(bytes),
            Self::Base64 => STANDARD.encode(bytes),
        }
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainHex => f.write_str("plain"),
            Self::Base64 => f.write_str("base64"),
        }
    }
}

impl FromStr for EncodingType {
    type Err = DecodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "hex" => Ok(Self::PlainHex),
            "base64" => Ok(Self::Base64),
            other => Err(DecodingError::new(
                format!("Unknown encoding '{other}'"),
                "error.decoding.unknown",
            )),
        }
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Upper-case hex split into space separated groups of `group` digits.
#[must_use]
pub fn to_formatted_hex(bytes: &[u8], group: usize) -> String {
    split_into_groups(&hex::encode_upper(bytes), group)
}

/// Split `text` into space separated chunks of `size` characters.
#[must_use]
pub fn split_into_groups(text: &str, size: usize) -> String {
    if size == 0 {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Printable ASCII rendering of an identifier, if it has one.
///
/// Meter and customer identifiers are often ASCII stored as raw bytes.
/// Returns `None` when any byte falls outside `[A-Za-z0-9!#/ ]`.
#[must_use]
pub fn printable_ascii(bytes: &[u8]) -> Option<String> {
    let printable = bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'!' | b'#' | b'/' | b' '));
    (printable && !bytes.is_empty()).then(|| bytes.iter().map(|&b| char::from(b)).collect())
}

/// Decode hex text and render it as ASCII.
///
/// Bytes outside the printable range are rendered as `.`.
pub fn hex_to_ascii(hex_text: &str) -> Result<String, DecodingError> {
    let bytes = EncodingType::PlainHex.decode(hex_text)?;
    Ok(bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '.' })
        .collect())
}

/// Undo one level of XML escaping.
///
/// Handles the five predefined entities and numeric character references.
/// Unknown entities are left as they are.
#[must_use]
pub fn unescape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let Some(end) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..end];
        let replacement = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "amp" => Some('&'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };

        match replacement {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            },
        }
    }
    out.push_str(rest);
    out
}
