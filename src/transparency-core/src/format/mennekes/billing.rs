//! Billing export adapter.
//!
//! A billing record groups charging processes by billing period. Each
//! process becomes one [`SignedValue`] that the registry can verify on its
//! own.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChargingProcessXml, ROOT};
use crate::encoding::{unescape_xml, EncodingType};
use crate::error::BillingAdapterError;
use crate::types::VerificationType;

#[derive(Debug, Deserialize)]
struct Billing {
    #[serde(rename = "billingPeriod", default)]
    periods: Vec<BillingPeriod>,
}

#[derive(Debug, Deserialize)]
struct BillingPeriod {
    #[serde(rename = "chargingProcess", default)]
    processes: Vec<ChargingProcessXml>,
}

/// A signed payload ready for the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedValue {
    /// Format of `data`.
    pub verification_type: VerificationType,
    /// Encoding of the binary parts of `data`.
    pub encoding: EncodingType,
    /// Payload text.
    pub data: String,
    /// Declared public key, hex.
    pub public_key: String,
}

fn transform_error(detail: impl std::fmt::Display) -> BillingAdapterError {
    warn!(error = %detail, "billing conversion failed");
    BillingAdapterError::new(
        "Could not transform Mennekes format to values",
        "error.xml.mennekes.transform",
    )
}

/// Split a billing record into one signed value per charging process.
///
/// # Errors
///
/// Returns [`BillingAdapterError`] when the record cannot be read or a
/// process cannot be written back out.
pub fn convert_billing(text: &str) -> Result<Vec<SignedValue>, BillingAdapterError> {
    let xml = unescape_xml(text.trim());
    let billing: Billing = quick_xml::de::from_str(&xml).map_err(transform_error)?;

    let mut values = Vec::new();
    for process in billing.periods.iter().flat_map(|p| &p.processes) {
        let data =
            quick_xml::se::to_string_with_root(ROOT, process).map_err(transform_error)?;
        values.push(SignedValue {
            verification_type: VerificationType::Mennekes,
            encoding: EncodingType::PlainHex,
            data,
            public_key: process.public_key.trim().to_string(),
        });
    }
    debug!(count = values.len(), "converted billing record");
    Ok(values)
}
