//! Alfen charge-point records.
//!
//! `AP;<version>;<blocks>;<public key>;<dataset>;<signature>;` with the
//! binary fields in RFC 4648 Base32. The signature covers the dataset bytes.

pub mod verified;


use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use data_encoding::{BASE32, BASE32_NOPAD};
use tracing::debug;
use transparency_crypto::{P256Verifier, SignatureVerifier};

use crate::error::{DecodingError, ValidationError, VerifyError};
use crate::result::{ErrorMessage, ErrorType};
use crate::types::{format_obis, Meter, MeterRole};

pub use verified::AlfenVerifiedData;

/// Record prefix.
pub const PREFIX: &str = "AP;";
/// Length of the signed dataset.
pub const DATASET_LEN: usize = 76;

/// Adapter status bits that indicate an adapter fault.
pub const ADAPTER_ERROR_MASK: u32 = 0x01 | 0x02 | 0x04;

/// A parsed Alfen record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlfenSignature {
    /// Record format version.
    pub version: u32,
    /// Declared block count.
    pub block_count: u32,
    /// Embedded public key.
    pub public_key: Vec<u8>,
    /// Signed dataset.
    pub dataset: Vec<u8>,
    /// Raw `r || s` signature.
    pub signature: Vec<u8>,
    /// Decoded dataset fields.
    pub fields: AlfenDataset,
}

/// Fields of the 76 byte dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct AlfenDataset {
    pub adapter_id: [u8; 10],
    pub adapter_firmware: [u8; 4],
    pub adapter_checksum: u16,
    pub meter_id: [u8; 10],
    pub meter_status: u32,
    pub adapter_status: u32,
    pub second_index: u32,
    pub timestamp: u32,
    pub obis: [u8; 6],
    pub unit: u8,
    pub scaler: i8,
    pub meter_value: u64,
    pub uid: [u8; 10],
    pub session_id: u32,
    pub paging: u32,
}

impl AlfenDataset {
    /// Decode a dataset.
    pub fn parse(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.len() != DATASET_LEN {
            return Err(ValidationError::alfen(format!(
                "Alfen dataset must be {DATASET_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = LeReader { data: bytes, pos: 0 };
        Ok(Self {
            adapter_id: r.array(),
            adapter_firmware: r.array(),
            adapter_checksum: u16::from_le_bytes(r.array()),
            meter_id: r.array(),
            meter_status: u32::from_le_bytes(r.array()),
            adapter_status: u32::from_le_bytes(r.array()),
            second_index: u32::from_le_bytes(r.array()),
            timestamp: u32::from_le_bytes(r.array()),
            obis: r.array(),
            unit: r.array::<1>()[0],
            scaler: i8::from_le_bytes(r.array()),
            meter_value: u64::from_le_bytes(r.array()),
            uid: r.array(),
            session_id: u32::from_le_bytes(r.array()),
            paging: u32::from_le_bytes(r.array()),
        })
    }

    /// Encode the dataset.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DATASET_LEN);
        out.extend_from_slice(&self.adapter_id);
        out.extend_from_slice(&self.adapter_firmware);
        out.extend_from_slice(&self.adapter_checksum.to_le_bytes());
        out.extend_from_slice(&self.meter_id);
        out.extend_from_slice(&self.meter_status.to_le_bytes());
        out.extend_from_slice(&self.adapter_status.to_le_bytes());
        out.extend_from_slice(&self.second_index.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.obis);
        out.push(self.unit);
        out.extend_from_slice(&self.scaler.to_le_bytes());
        out.extend_from_slice(&self.meter_value.to_le_bytes());
        out.extend_from_slice(&self.uid);
        out.extend_from_slice(&self.session_id.to_le_bytes());
        out.extend_from_slice(&self.paging.to_le_bytes());
        out
    }

    /// Reading value in kWh.
    #[must_use]
    pub fn value_kwh(&self) -> BigDecimal {
        BigDecimal::new(BigInt::from(self.meter_value), 3 - i64::from(self.scaler))
    }

    /// Reading time.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(i64::from(self.timestamp), 0).map(|t| t.fixed_offset())
    }

    /// The reading as a [`Meter`].
    #[must_use]
    pub fn meter(&self) -> Meter {
        Meter {
            value: self.value_kwh(),
            unit: "kWh".to_string(),
            timestamp: self.time(),
            role: MeterRole::Intermediate,
            obis: Some(format_obis(&self.obis)),
        }
    }

    /// Status problems the meter or adapter reported.
    #[must_use]
    pub fn status_errors(&self) -> Vec<ErrorMessage> {
        let mut errors = Vec::new();
        if self.meter_status != 0 {
            errors.push(ErrorMessage::new(
                ErrorType::Regulation,
                format!("Meter reported status {:#010X}", self.meter_status),
                "error.alfen.meter.status",
            ));
        }
        if self.adapter_status & ADAPTER_ERROR_MASK != 0 {
            errors.push(ErrorMessage::new(
                ErrorType::Regulation,
                format!("Adapter reported status {:#010X}", self.adapter_status),
                "error.alfen.adapter.status",
            ));
        }
        errors
    }
}

struct LeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl LeReader<'_> {
    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}

impl AlfenSignature {
    /// Check the dataset signature against `public_key`.
    pub fn verify(&self, public_key: &[u8]) -> Result<bool, VerifyError> {
        let valid = P256Verifier::raw().verify(public_key, &self.dataset, &self.signature)?;
        debug!(valid, "Alfen signature checked");
        Ok(valid)
    }

    /// Record text for this signature.
    #[must_use]
    pub fn to_text(&self) -> String {
        format!(
            "AP;{};{};{};{};{};",
            self.version,
            self.block_count,
            BASE32.encode(&self.public_key),
            BASE32.encode(&self.dataset),
            BASE32.encode(&self.signature),
        )
    }
}

/// Whether `text` starts like an Alfen record.
#[must_use]
pub fn has_prefix(text: &str) -> bool {
    text.trim_start().starts_with(PREFIX)
}

fn decode_base32(field: &str, name: &str) -> Result<Vec<u8>, DecodingError> {
    let field = field.trim();
    BASE32
        .decode(field.as_bytes())
        .or_else(|_| BASE32_NOPAD.decode(field.as_bytes()))
        .map_err(|e| {
            DecodingError::new(format!("Invalid base32 in Alfen {name}: {e}"), "error.decoding.base32")
        })
}

/// Parse an Alfen record.
pub fn parse(text: &str) -> Result<AlfenSignature, VerifyError> {
    let text = text.trim();
    if !has_prefix(text) {
        return Err(ValidationError::alfen("Data does not start with AP;").into());
    }
    let parts: Vec<&str> = text.trim_end_matches(';').split(';').collect();
    if parts.len() != 6 {
        return Err(ValidationError::alfen(format!(
            "Alfen record must have 6 fields, got {}",
            parts.len()
        ))
        .into());
    }

    let version = parts[1]
        .trim()
        .parse()
        .map_err(|_| ValidationError::alfen(format!("Invalid Alfen version '{}'", parts[1])))?;
    let block_count = parts[2]
        .trim()
        .parse()
        .map_err(|_| ValidationError::alfen(format!("Invalid Alfen block count '{}'", parts[2])))?;
    let public_key = decode_base32(parts[3], "public key")?;
    let dataset = decode_base32(parts[4], "dataset")?;
    let signature = decode_base32(parts[5], "signature")?;
    let fields = AlfenDataset::parse(&dataset)?;

    Ok(AlfenSignature {
        version,
        block_count,
        public_key,
        dataset,
        signature,
        fields,
    })
}
