//! EDL signed meter values without the surrounding SML frame.
//!
//! Accepted inputs:
//!
//! ```xml
//! <signedMeterValue>
//!   <publicKey encoding="base64">...</publicKey>
//!   <meterValueSignature encoding="base64">...</meterValueSignature>
//!   <signatureMethod>ECDSA192SHA256</signatureMethod>
//!   <encodingMethod>EDL</encodingMethod>
//! </signedMeterValue>
//! ```
//!
//! possibly XML-escaped once more, or the bare hex / Base64 blob.

use serde::{Deserialize, Serialize};
use tracing::debug;
use transparency_crypto::SignatureAlgorithm;

use super::SmlSignature;
use crate::encoding::{unescape_xml, EncodingType};
use crate::error::{ValidationError, VerifyError};

/// Text element with an optional `encoding` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodedValue {
    /// Declared encoding.
    #[serde(rename = "@encoding", default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Encoded content.
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl EncodedValue {
    /// Decode the content using the declared encoding, or by guessing.
    pub fn decode(&self) -> Result<(Vec<u8>, EncodingType), VerifyError> {
        if let Some(declared) = &self.encoding {
            let encoding: EncodingType = declared.parse()?;
            return Ok((encoding.decode(&self.value)?, encoding));
        }
        decode_guessing(&self.value)
    }
}

/// The `signedMeterValue` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename = "signedMeterValue")]
pub struct SignedMeterValue {
    /// Embedded key.
    #[serde(rename = "publicKey", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<EncodedValue>,
    /// Signed message followed by the signature.
    #[serde(rename = "meterValueSignature")]
    pub meter_value_signature: EncodedValue,
    /// Signature method name.
    #[serde(rename = "signatureMethod", default, skip_serializing_if = "Option::is_none")]
    pub signature_method: Option<String>,
    /// Must be `EDL` when present.
    #[serde(rename = "encodingMethod", default, skip_serializing_if = "Option::is_none")]
    pub encoding_method: Option<String>,
}

impl SignedMeterValue {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.meter_value_signature.value.trim().is_empty() {
            return Err(ValidationError::sml("Empty meterValueSignature"));
        }
        if let Some(method) = &self.encoding_method {
            if !method.trim().eq_ignore_ascii_case("EDL") {
                return Err(ValidationError::sml(format!(
                    "Unsupported encoding method '{}'",
                    method.trim()
                )));
            }
        }
        Ok(())
    }

    fn method(&self) -> Result<Option<SignatureAlgorithm>, ValidationError> {
        self.signature_method
            .as_deref()
            .map(|name| {
                SignatureAlgorithm::from_identifier(name.trim()).ok_or_else(|| {
                    ValidationError::new(
                        format!("Unsupported signature method '{}'", name.trim()),
                        "error.signature.algorithm.unsupported",
                    )
                })
            })
            .transpose()
    }
}

/// Parse a signature-only payload, returning the record and the encoding
/// its blob was carried in.
///
/// # Errors
///
/// Decoding errors for bad encodings, validation errors for anything that
/// is not a well formed signed meter value.
pub fn parse(text: &str) -> Result<(SmlSignature, EncodingType), VerifyError> {
    let unescaped = unescape_xml(text.trim());
    if unescaped.starts_with('<') {
        parse_envelope(&unescaped)
    } else {
        let (blob, encoding) = decode_guessing(&unescaped)?;
        Ok((SmlSignature::from_blob(&blob, None)?, encoding))
    }
}

fn parse_envelope(xml: &str) -> Result<(SmlSignature, EncodingType), VerifyError> {
    let envelope: SignedMeterValue = quick_xml::de::from_str(xml).map_err(|e| {
        debug!(error = %e, "not a signedMeterValue envelope");
        ValidationError::sml(format!("Invalid signedMeterValue: {e}"))
    })?;
    envelope.validate()?;

    let (blob, encoding) = envelope.meter_value_signature.decode()?;
    let mut record = SmlSignature::from_blob(&blob, envelope.method()?)?;
    if let Some(key) = &envelope.public_key {
        if !key.value.trim().is_empty() {
            record.public_key = Some(key.decode()?.0);
        }
    }
    Ok((record, encoding))
}

/// Decode with the first candidate encoding that succeeds.
pub(crate) fn decode_guessing(text: &str) -> Result<(Vec<u8>, EncodingType), VerifyError> {
    let mut last_error = None;
    for encoding in EncodingType::guess_type(text) {
        match encoding.decode(text) {
            Ok(bytes) => return Ok((bytes, encoding)),
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => e.into(),
        None => ValidationError::sml("Data is neither hex nor base64").into(),
    })
}
