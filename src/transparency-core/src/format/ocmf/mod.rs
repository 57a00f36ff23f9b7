//! Open Charge Metering Format.
//!
//! `OCMF|<payload json>|<signature json>`. The signature covers the payload
//! JSON text exactly as transmitted.

pub mod verified;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;
use transparency_crypto::{P256Verifier, SignatureAlgorithm, SignatureVerifier};

use crate::encoding::EncodingType;
use crate::error::{DecodingError, ValidationError, VerifyError};
use crate::types::{Meter, MeterRole};

pub use verified::OcmfVerifiedData;

/// Record prefix.
pub const PREFIX: &str = "OCMF|";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S,%3f%z";

/// Payload section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OcmfPayload {
    #[serde(rename = "FV", default)]
    pub format_version: Option<String>,
    #[serde(rename = "GI", default)]
    pub gateway_id: Option<String>,
    #[serde(rename = "GS", default)]
    pub gateway_serial: Option<String>,
    #[serde(rename = "GV", default)]
    pub gateway_version: Option<String>,
    #[serde(rename = "PG", default)]
    pub pagination: Option<String>,
    #[serde(rename = "MV", default)]
    pub meter_vendor: Option<String>,
    #[serde(rename = "MM", default)]
    pub meter_model: Option<String>,
    #[serde(rename = "MS", default)]
    pub meter_serial: Option<String>,
    #[serde(rename = "MF", default)]
    pub meter_firmware: Option<String>,
    #[serde(rename = "IS", default)]
    pub identification_status: Option<bool>,
    #[serde(rename = "IL", default)]
    pub identification_level: Option<String>,
    #[serde(rename = "IF", default)]
    pub identification_flags: Vec<String>,
    #[serde(rename = "IT", default)]
    pub identification_type: Option<String>,
    #[serde(rename = "ID", default)]
    pub identification_data: Option<String>,
    #[serde(rename = "TT", default)]
    pub tariff_text: Option<String>,
    #[serde(rename = "CT", default)]
    pub charge_point_id_type: Option<String>,
    #[serde(rename = "CI", default)]
    pub charge_point_id: Option<String>,
    #[serde(rename = "RD", default)]
    pub readings: Vec<OcmfReading>,
}

/// One entry of `RD`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct OcmfReading {
    #[serde(rename = "TM", default)]
    pub time: Option<String>,
    #[serde(rename = "TX", default)]
    pub transaction: Option<String>,
    // Holds the literal digits (serde_json `arbitrary_precision`).
    #[serde(rename = "RV", default)]
    pub value: Option<serde_json::Number>,
    #[serde(rename = "RI", default)]
    pub identifier: Option<String>,
    #[serde(rename = "RU", default)]
    pub unit: Option<String>,
    #[serde(rename = "RT", default)]
    pub current_type: Option<String>,
    #[serde(rename = "EF", default)]
    pub error_flags: Option<String>,
    #[serde(rename = "ST", default)]
    pub status: Option<String>,
}

impl OcmfReading {
    /// Whether the meter reported an error or a non-good status.
    #[must_use]
    pub fn reset_declared(&self) -> bool {
        let flagged = self.error_flags.as_deref().is_some_and(|f| !f.trim().is_empty());
        let bad_status = self.status.as_deref().is_some_and(|s| s != "G");
        flagged || bad_status
    }
}

/// Signature section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OcmfSignatureBlock {
    /// Signature algorithm.
    #[serde(rename = "SA", default)]
    pub algorithm: Option<String>,
    /// Encoding of `SD`.
    #[serde(rename = "SE", default)]
    pub encoding: Option<String>,
    /// Signature MIME type.
    #[serde(rename = "SM", default)]
    pub mime_type: Option<String>,
    /// Signature data.
    #[serde(rename = "SD", default)]
    pub data: String,
}

/// A reading from `RD` with its time resolved and role assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReading {
    /// The reading as a meter value.
    pub meter: Meter,
    /// Register id (`RI`).
    pub identifier: Option<String>,
    /// Whether the reading carries a transaction marker.
    pub in_transaction: bool,
    /// Error or status flag raised by the meter.
    pub reset_declared: bool,
}

/// A parsed OCMF record.
#[derive(Debug, Clone, PartialEq)]
pub struct OcmfSignature {
    /// Payload JSON exactly as transmitted.
    pub payload_text: String,
    /// Parsed payload.
    pub payload: OcmfPayload,
    /// Parsed signature section.
    pub signature: OcmfSignatureBlock,
    /// Decoded signature bytes.
    pub signature_bytes: Vec<u8>,
    /// Encoding of the signature bytes.
    pub signature_encoding: EncodingType,
    /// Signature algorithm.
    pub algorithm: SignatureAlgorithm,
    /// Readings in order of appearance.
    pub readings: Vec<ResolvedReading>,
}

impl OcmfSignature {
    /// Readings belonging to the transaction.
    #[must_use]
    pub fn meters(&self) -> Vec<Meter> {
        self.readings
            .iter()
            .filter(|r| r.in_transaction)
            .map(|r| r.meter.clone())
            .collect()
    }

    /// Readings without a transaction marker.
    pub fn extra_registers(&self) -> impl Iterator<Item = &ResolvedReading> {
        self.readings.iter().filter(|r| !r.in_transaction)
    }

    /// First start reading, or the first transaction reading.
    #[must_use]
    pub fn start_reading(&self) -> Option<&ResolvedReading> {
        let mut in_tx = self.readings.iter().filter(|r| r.in_transaction);
        self.readings
            .iter()
            .find(|r| r.meter.role == MeterRole::Start)
            .or_else(|| in_tx.next())
    }

    /// Last stop reading, or the last transaction reading.
    #[must_use]
    pub fn stop_reading(&self) -> Option<&ResolvedReading> {
        self.readings
            .iter()
            .rev()
            .find(|r| r.meter.role == MeterRole::Stop)
            .or_else(|| self.readings.iter().rev().find(|r| r.in_transaction))
    }

    /// Meter serial, falling back to the gateway serial.
    #[must_use]
    pub fn meter_id(&self) -> Option<&str> {
        self.payload
            .meter_serial
            .as_deref()
            .or(self.payload.gateway_serial.as_deref())
    }

    /// Check the signature against `public_key`.
    pub fn verify(&self, public_key: &[u8]) -> Result<bool, VerifyError> {
        let valid = P256Verifier::der().verify(
            public_key,
            self.payload_text.as_bytes(),
            &self.signature_bytes,
        )?;
        debug!(valid, "OCMF signature checked");
        Ok(valid)
    }
}

/// Whether `text` starts like an OCMF record.
#[must_use]
pub fn has_prefix(text: &str) -> bool {
    text.trim_start().starts_with(PREFIX)
}

/// Parse an OCMF record.
///
/// # Errors
///
/// Decoding errors for broken JSON or signature encoding, validation errors
/// for missing sections, readings or unsupported algorithms.
pub fn parse(text: &str) -> Result<OcmfSignature, VerifyError> {
    let text = text.trim();
    let rest = text
        .strip_prefix(PREFIX)
        .ok_or_else(|| ValidationError::ocmf("Data does not start with OCMF|"))?;
    let split = rest
        .rfind('|')
        .ok_or_else(|| ValidationError::ocmf("OCMF signature section missing"))?;
    let (payload_text, signature_text) = (&rest[..split], &rest[split + 1..]);

    let payload: OcmfPayload = serde_json::from_str(payload_text)
        .map_err(|e| DecodingError::new(format!("Invalid OCMF payload: {e}"), "error.ocmf.json"))?;
    let signature: OcmfSignatureBlock = serde_json::from_str(signature_text).map_err(|e| {
        DecodingError::new(format!("Invalid OCMF signature: {e}"), "error.ocmf.json")
    })?;

    if payload.readings.is_empty() {
        return Err(ValidationError::ocmf("OCMF payload has no readings").into());
    }
    if signature.data.trim().is_empty() {
        return Err(ValidationError::ocmf("OCMF signature data missing").into());
    }

    let algorithm = match signature.algorithm.as_deref() {
        None => SignatureAlgorithm::EcdsaP256Sha256,
        Some(name) => SignatureAlgorithm::from_identifier(name)
            .filter(|a| *a == SignatureAlgorithm::EcdsaP256Sha256)
            .ok_or_else(|| {
                ValidationError::new(
                    format!("Unsupported OCMF signature algorithm '{name}'"),
                    "error.signature.algorithm.unsupported",
                )
            })?,
    };
    let signature_encoding = match signature.encoding.as_deref() {
        None => EncodingType::PlainHex,
        Some(name) => name.parse()?,
    };
    let signature_bytes = signature_encoding.decode(&signature.data)?;
    let readings = resolve_readings(&payload.readings)?;

    Ok(OcmfSignature {
        payload_text: payload_text.to_string(),
        payload,
        signature,
        signature_bytes,
        signature_encoding,
        algorithm,
        readings,
    })
}

fn resolve_readings(readings: &[OcmfReading]) -> Result<Vec<ResolvedReading>, ValidationError> {
    let mut last_time = None;
    let mut resolved = Vec::with_capacity(readings.len());

    for (i, reading) in readings.iter().enumerate() {
        let raw_value = reading
            .value
            .as_ref()
            .ok_or_else(|| ValidationError::ocmf(format!("Reading {i} has no value (RV)")))?;
        let unit = reading
            .unit
            .clone()
            .ok_or_else(|| ValidationError::ocmf(format!("Reading {i} has no unit (RU)")))?;
        let value = BigDecimal::from_str(&raw_value.to_string())
            .map_err(|e| ValidationError::ocmf(format!("Reading {i} value invalid: {e}")))?;

        if let Some(tm) = &reading.time {
            last_time = Some(parse_time(tm)?);
        }

        let role = match reading.transaction.as_deref() {
            Some("B") => MeterRole::Start,
            Some("E" | "L" | "R" | "A") => MeterRole::Stop,
            _ => MeterRole::Intermediate,
        };

        resolved.push(ResolvedReading {
            meter: Meter {
                value,
                unit,
                timestamp: last_time,
                role,
                obis: reading.identifier.clone(),
            },
            identifier: reading.identifier.clone(),
            in_transaction: reading.transaction.is_some(),
            reset_declared: reading.reset_declared(),
        });
    }
    Ok(resolved)
}

/// Parse an OCMF time stamp such as `2025-10-26T12:50:00,000+0100 R`.
///
/// The trailing synchronisation flag is ignored.
pub fn parse_time(tm: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    let stamp = tm.split_whitespace().next().unwrap_or_default();
    DateTime::parse_from_str(stamp, TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(stamp))
        .map_err(|e| ValidationError::ocmf(format!("Invalid OCMF time '{tm}': {e}")))
}
