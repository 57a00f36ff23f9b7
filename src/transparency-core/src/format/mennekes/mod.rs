//! Mennekes charging processes.
//!
//! A charging process carries a hex public key and two EDL signature-only
//! blobs, one per end of the transaction:
//!
//! ```xml
//! <chargingProcess>
//!   <publicKey>04...</publicKey>
//!   <meterValueStart>...</meterValueStart>
//!   <meterValueEnd>...</meterValueEnd>
//! </chargingProcess>
//! ```
//!
//! Billing exports bundle many of them; see [`billing::convert_billing`].

pub mod billing;
pub mod verified;

use serde::{Deserialize, Serialize};

use crate::encoding::{unescape_xml, EncodingType};
use crate::error::{ValidationError, VerifyError};
use crate::format::sml::{SmlSignature, SmlSignatureVerifier};

pub use billing::{convert_billing, SignedValue};
pub use verified::MennekesVerifiedData;

/// Root element of a charging process.
pub const ROOT: &str = "chargingProcess";

/// XML form of a charging process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChargingProcessXml {
    /// Hex encoded public key.
    #[serde(rename = "publicKey", default)]
    pub public_key: String,
    /// Hex encoded start blob.
    #[serde(rename = "meterValueStart")]
    pub meter_value_start: String,
    /// Hex encoded end blob.
    #[serde(rename = "meterValueEnd")]
    pub meter_value_end: String,
}

/// A decoded charging process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MennekesChargingProcess {
    /// Embedded public key, if the process carries one.
    pub public_key: Option<Vec<u8>>,
    /// Reading at transaction start.
    pub start: SmlSignature,
    /// Reading at transaction end.
    pub end: SmlSignature,
}

impl MennekesChargingProcess {
    /// Check both readings. The process is valid only if both are.
    pub fn verify(&self, public_key: &[u8]) -> Result<bool, VerifyError> {
        let verifier = SmlSignatureVerifier::new();
        Ok(verifier.verify(public_key, &self.start)? && verifier.verify(public_key, &self.end)?)
    }
}

/// Whether `text` looks like a charging process document.
#[must_use]
pub fn has_root(text: &str) -> bool {
    let unescaped = unescape_xml(text.trim());
    let body = unescaped
        .strip_prefix("<?xml")
        .and_then(|rest| rest.find("?>").map(|end| &rest[end + 2..]))
        .unwrap_or(&unescaped);
    body.trim_start().starts_with(&format!("<{ROOT}"))
}

/// Parse a charging process document.
pub fn parse(text: &str) -> Result<MennekesChargingProcess, VerifyError> {
    let unescaped = unescape_xml(text.trim());
    if !has_root(&unescaped) {
        return Err(ValidationError::mennekes("Data is not a Mennekes charging process").into());
    }
    let xml: ChargingProcessXml = quick_xml::de::from_str(&unescaped)
        .map_err(|e| ValidationError::mennekes(format!("Invalid charging process: {e}")))?;

    let public_key = if xml.public_key.trim().is_empty() {
        None
    } else {
        Some(EncodingType::PlainHex.decode(&xml.public_key)?)
    };
    let start = EncodingType::PlainHex.decode(&xml.meter_value_start)?;
    let end = EncodingType::PlainHex.decode(&xml.meter_value_end)?;

    Ok(MennekesChargingProcess {
        public_key,
        start: SmlSignature::from_blob(&start, None)?,
        end: SmlSignature::from_blob(&end, None)?,
    })
}
