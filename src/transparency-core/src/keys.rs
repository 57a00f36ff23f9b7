//! Public key text at the engine boundary.
//!
//! Keys reach the engine as PEM, Base64 or hex text. The result is handed
//! to the verifiers as bytes, which accept DER SPKI and SEC1 points.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::encoding::EncodingType;
use crate::error::DecodingError;

/// Whether `bytes` start like DER or a SEC1 point.
fn looks_like_key(bytes: &[u8]) -> bool {
    matches!(bytes.first(), Some(0x30 | 0x02 | 0x03 | 0x04))
}

fn pem_body(text: &str) -> Option<String> {
    let begin = text.find("-----BEGIN")?;
    let after_header = begin + text[begin..].find('\n')?;
    let end = text[after_header..].find("-----END")? + after_header;
    Some(
        text[after_header..end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
    )
}

/// Decode key text.
///
/// PEM is recognised by its header. Otherwise Base64 is tried first and
/// kept only if the bytes look like key material, then hex.
///
/// # Errors
///
/// Returns [`DecodingError`] when none of the encodings apply.
pub fn decode_public_key_text(text: &str) -> Result<Vec<u8>, DecodingError> {
    let text = text.trim();

    if text.contains("-----BEGIN") {
        let body = pem_body(text).ok_or_else(|| {
            DecodingError::new("Incomplete PEM public key", "error.publickey.decoding")
        })?;
        return STANDARD.decode(body).map_err(|e| {
            DecodingError::new(format!("Invalid PEM body: {e}"), "error.publickey.decoding")
        });
    }

    if let Ok(bytes) = EncodingType::Base64.decode(text) {
        if looks_like_key(&bytes) {
            return Ok(bytes);
        }
        debug!("base64 key text does not decode to key material");
    }

    EncodingType::PlainHex.decode(text).map_err(|_| {
        DecodingError::new(
            "Public key is neither PEM, base64 nor hex",
            "error.publickey.decoding",
        )
    })
}
