//! SML / EDL signed meter values.
//!
//! Two transports carry the same signed record:
//! - a full SML transport frame ([`frame`]), detected as
//!   [`VerificationType::Sml40`](crate::VerificationType::Sml40)
//! - a signature-only blob, optionally wrapped in a `signedMeterValue` XML
//!   envelope ([`signature_only`]), detected as
//!   [`VerificationType::SmlSigOnly`](crate::VerificationType::SmlSigOnly)
//!
//! Both end up as an [`SmlSignature`], whose [`SmlSignature::signed_message`]
//! is what the meter signed.
//!
//! ```text
//! server id (10) | time (4) | status (1) | second index (4) | pagination (4)
//! obis (6) | unit (1) | scaler (1) | meter position (8) | log book (2)
//! customer id (128) | time (4)
//! ```

pub mod frame;
pub mod signature_only;
pub mod tl;
pub mod verified;
pub mod verifier;
pub mod writer;


use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use transparency_crypto::{EcCurve, SignatureAlgorithm};

use crate::encoding::EncodingType;
use crate::error::{ValidationError, VerifyError};
use crate::types::{format_obis, Meter, MeterRole};

pub use verified::SmlVerifiedData;

/// Signature methods an EDL meter may declare.
pub type SmlSignatureMethod = SignatureAlgorithm;
pub use verifier::SmlSignatureVerifier;

/// Length of the server id field in the signed message.
pub const SERVER_ID_LEN: usize = 10;
/// Length of the customer id field in the signed message.
pub const CUSTOMER_ID_LEN: usize = 128;
/// Length of the signed message.
pub const SIGNED_MESSAGE_LEN: usize = SERVER_ID_LEN + 4 + 1 + 4 + 4 + 6 + 1 + 1 + 8 + 2 + CUSTOMER_ID_LEN + 4;

/// DLMS unit code for watt hours.
pub const UNIT_WATT_HOUR: u8 = 30;

/// Status bit set by the meter after a counter reset.
pub const STATUS_RESET: u8 = 0x02;

/// OBIS registers read from a full frame.
pub mod obis {
    /// Active energy import, total (1-0:1.8.0*255).
    pub const ENERGY_IMPORT: [u8; 6] = [0x01, 0x00, 0x01, 0x08, 0x00, 0xFF];
    /// Meter public key.
    pub const PUBLIC_KEY: [u8; 6] = [0x81, 0x81, 0xC7, 0x82, 0x05, 0xFF];
    /// Signature pagination counter.
    pub const PAGINATION: [u8; 6] = [0x81, 0x81, 0xC7, 0x82, 0x04, 0xFF];
    /// Customer / contract identifier.
    pub const CUSTOMER_ID: [u8; 6] = [0x81, 0x80, 0x81, 0x62, 0x00, 0xFF];
    /// Log book counter.
    pub const LOG_BOOK: [u8; 6] = [0x81, 0x81, 0xC7, 0x82, 0x07, 0xFF];
}

/// A signed reading from an EDL meter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmlSignature {
    /// Meter server id.
    pub server_id: Vec<u8>,
    /// Reading time, unix seconds.
    pub timestamp: u32,
    /// Meter status byte.
    pub status: u8,
    /// Meter second index.
    pub second_index: u32,
    /// Signature counter.
    pub pagination: u32,
    /// OBIS register of the reading.
    pub obis: [u8; 6],
    /// DLMS unit code.
    pub unit: u8,
    /// Decimal exponent of `meter_position`.
    pub scaler: i8,
    /// Raw register value.
    pub meter_position: i64,
    /// Log book counter.
    pub log_book: u16,
    /// Customer / contract id.
    pub customer_id: Vec<u8>,
    /// Signature over [`SmlSignature::signed_message`].
    pub provided_signature: Option<Vec<u8>>,
    /// Declared signature method, if the transport names one.
    pub method: Option<SmlSignatureMethod>,
    /// Public key embedded in the transport.
    pub public_key: Option<Vec<u8>>,
}

impl SmlSignature {
    /// Bytes the meter signed.
    ///
    /// # Errors
    ///
    /// Fails if the server or customer id does not fit its field.
    pub fn signed_message(&self) -> Result<Vec<u8>, ValidationError> {
        if self.server_id.len() > SERVER_ID_LEN {
            return Err(ValidationError::sml(format!(
                "Server id too long ({} bytes)",
                self.server_id.len()
            )));
        }
        if self.customer_id.len() > CUSTOMER_ID_LEN {
            return Err(ValidationError::sml(format!(
                "Customer id too long ({} bytes)",
                self.customer_id.len()
            )));
        }

        let mut message = Vec::with_capacity(SIGNED_MESSAGE_LEN);
        message.resize(SERVER_ID_LEN - self.server_id.len(), 0);
        message.extend_from_slice(&self.server_id);
        message.extend_from_slice(&self.timestamp.to_be_bytes());
        message.push(self.status);
        message.extend_from_slice(&self.second_index.to_be_bytes());
        message.extend_from_slice(&self.pagination.to_be_bytes());
        message.extend_from_slice(&self.obis);
        message.push(self.unit);
        message.extend_from_slice(&self.scaler.to_be_bytes());
        message.extend_from_slice(&self.meter_position.to_be_bytes());
        message.extend_from_slice(&self.log_book.to_be_bytes());
        message.extend_from_slice(&self.customer_id);
        message.resize(message.len() + CUSTOMER_ID_LEN - self.customer_id.len(), 0);
        message.extend_from_slice(&self.timestamp.to_be_bytes());
        Ok(message)
    }

    /// Parse a signature-only blob: signed message followed by the signature.
    ///
    /// The signature length follows `method` when given, otherwise the
    /// remaining length must match one of the known curves.
    pub fn from_blob(blob: &[u8], method: Option<SignatureAlgorithm>) -> Result<Self, ValidationError> {
        if blob.len() <= SIGNED_MESSAGE_LEN {
            return Err(ValidationError::sml(format!(
                "Signed meter value too short ({} bytes)",
                blob.len()
            )));
        }
        let signature = &blob[SIGNED_MESSAGE_LEN..];
        let method = match method {
            Some(method) if method.curve().raw_signature_size() == signature.len() => method,
            Some(method) => {
                return Err(ValidationError::sml(format!(
                    "Signature length {} does not match {}",
                    signature.len(),
                    method.identifier()
                )))
            },
            None if signature.len() == EcCurve::P192.raw_signature_size() => {
                SignatureAlgorithm::EcdsaP192Sha256
            },
            None if signature.len() == EcCurve::P256.raw_signature_size() => {
                SignatureAlgorithm::EcdsaP256Sha256
            },
            None => {
                return Err(ValidationError::sml(format!(
                    "Unexpected signature length {}",
                    signature.len()
                )))
            },
        };

        let mut r = FieldReader::new(&blob[..SIGNED_MESSAGE_LEN]);
        let server_id = r.take(SERVER_ID_LEN).to_vec();
        let timestamp = r.u32();
        let status = r.take(1)[0];
        let second_index = r.u32();
        let pagination = r.u32();
        let mut obis = [0u8; 6];
        obis.copy_from_slice(r.take(6));
        let unit = r.take(1)[0];
        let scaler = i8::from_be_bytes([r.take(1)[0]]);
        let meter_position = i64::from_be_bytes(r.array());
        let log_book = u16::from_be_bytes(r.array());
        let customer_id = r.take(CUSTOMER_ID_LEN).to_vec();
        let trailing_time = r.u32();

        if trailing_time != timestamp {
            return Err(ValidationError::sml("Timestamps in signed meter value differ"));
        }

        Ok(Self {
            server_id,
            timestamp,
            status,
            second_index,
            pagination,
            obis,
            unit,
            scaler,
            meter_position,
            log_book,
            customer_id,
            provided_signature: Some(signature.to_vec()),
            method: Some(method),
            public_key: None,
        })
    }

    /// Reading value in kWh.
    ///
    /// `meter_position × 10^scaler` is in Wh for unit code 30.
    #[must_use]
    pub fn value_kwh(&self) -> BigDecimal {
        BigDecimal::new(BigInt::from(self.meter_position), 3 - i64::from(self.scaler))
    }

    /// Reading time.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(i64::from(self.timestamp), 0).map(|t| t.fixed_offset())
    }

    /// Whether the meter flagged a counter reset.
    #[must_use]
    pub fn reset_declared(&self) -> bool {
        self.status & STATUS_RESET != 0
    }

    /// The reading as a [`Meter`].
    #[must_use]
    pub fn meter(&self, role: MeterRole) -> Meter {
        Meter {
            value: self.value_kwh(),
            unit: "kWh".to_string(),
            timestamp: self.time(),
            role,
            obis: Some(format_obis(&self.obis)),
        }
    }

    /// Customer id without zero padding.
    #[must_use]
    pub fn customer_id_trimmed(&self) -> &[u8] {
        let end = self
            .customer_id
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |p| p + 1);
        &self.customer_id[..end]
    }

    /// Server id without leading zero padding.
    #[must_use]
    pub fn server_id_trimmed(&self) -> &[u8] {
        let start = self
            .server_id
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(self.server_id.len());
        &self.server_id[start..]
    }
}

/// Read a full SML frame carried as hex or Base64 text.
///
/// Each candidate encoding is tried in order; the first one whose bytes form
/// a valid frame wins.
pub fn parse_frame_text(text: &str) -> Result<(SmlSignature, EncodingType), VerifyError> {
    let mut last_error: Option<VerifyError> = None;
    for encoding in EncodingType::guess_type(text) {
        let attempt = encoding
            .decode(text)
            .map_err(VerifyError::from)
            .and_then(|bytes| frame::read_signature(&bytes).map_err(VerifyError::from));
        match attempt {
            Ok(record) => return Ok((record, encoding)),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| ValidationError::sml("Data is neither hex nor base64").into()))
}

/// Reject readings that are not in Wh.
pub fn check_unit(record: &SmlSignature) -> Result<(), ValidationError> {
    if record.unit != UNIT_WATT_HOUR {
        return Err(ValidationError::new(
            "Invalid unit present in sml data",
            "error.sml.invalid.unit",
        ));
    }
    Ok(())
}

/// Cursor over a slice whose length was checked up front.
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N));
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.array())
    }
}
