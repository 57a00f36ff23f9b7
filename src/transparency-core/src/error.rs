//! Error types for decoding, validation and regulatory checks.
//!
//! Every error carries a human readable message and a localisation key. The
//! key is what user interfaces translate; the message is for logs.

use thiserror::Error;
use transparency_crypto::CryptoError;

use crate::result::ErrorType;

/// Malformed transport encoding: bad hex/Base64 grammar, truncated frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodingError {
    /// Error message.
    pub message: String,
    /// Localisation key.
    pub localized_key: String,
}

impl DecodingError {
    /// Create a decoding error.
    pub fn new(message: impl Into<String>, localized_key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            localized_key: localized_key.into(),
        }
    }
}

/// Structurally readable data that is semantically invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error message.
    pub message: String,
    /// Localisation key.
    pub localized_key: String,
}

impl ValidationError {
    /// Create a validation error.
    pub fn new(message: impl Into<String>, localized_key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            localized_key: localized_key.into(),
        }
    }

    /// Validation error in SML data.
    pub fn sml(message: impl Into<String>) -> Self {
        Self::new(message, "error.sml.validation")
    }

    /// Validation error in OCMF data.
    pub fn ocmf(message: impl Into<String>) -> Self {
        Self::new(message, "error.ocmf.validation")
    }

    /// Validation error in Alfen data.
    pub fn alfen(message: impl Into<String>) -> Self {
        Self::new(message, "error.alfen.validation")
    }

    /// Validation error in Mennekes data.
    pub fn mennekes(message: impl Into<String>) -> Self {
        Self::new(message, "error.mennekes.validation")
    }

    /// Key or signature material that the verifier could not use.
    pub fn crypto(error: &CryptoError) -> Self {
        let key = match error {
            CryptoError::InvalidPublicKey { .. } | CryptoError::CurveMismatch { .. } => {
                "error.publickey.invalid"
            },
            CryptoError::InvalidSignature { .. } => "error.signature.invalid",
            CryptoError::UnsupportedAlgorithm { .. } => "error.signature.algorithm.unsupported",
        };
        Self::new(error.to_string(), key)
    }
}

/// Hard legal-metrology violation between paired readings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RegulationLawError {
    /// Error message.
    pub message: String,
    /// Localisation key.
    pub localized_key: String,
}

impl RegulationLawError {
    /// Create a regulation error.
    pub fn new(message: impl Into<String>, localized_key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            localized_key: localized_key.into(),
        }
    }
}

/// Failure converting a billing record into signed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BillingAdapterError {
    /// Error message.
    pub message: String,
    /// Localisation key.
    pub localized_key: String,
}

impl BillingAdapterError {
    /// Create an adapter error.
    pub fn new(message: impl Into<String>, localized_key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            localized_key: localized_key.into(),
        }
    }
}

/// Any failure raised inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Malformed encoding.
    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),

    /// Semantically invalid data.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Regulatory violation.
    #[error("Regulation error: {0}")]
    RegulationLaw(#[from] RegulationLawError),

    /// Billing conversion failure.
    #[error("Billing adapter error: {0}")]
    BillingAdapter(#[from] BillingAdapterError),
}

impl From<CryptoError> for VerifyError {
    fn from(error: CryptoError) -> Self {
        Self::Validation(ValidationError::crypto(&error))
    }
}

impl VerifyError {
    /// Result category this error is reported under.
    #[must_use]
    pub fn kind(&self) -> ErrorType {
        match self {
            Self::Decoding(_) => ErrorType::Decoding,
            Self::Validation(_) | Self::BillingAdapter(_) => ErrorType::Validation,
            Self::RegulationLaw(_) => ErrorType::Regulation,
        }
    }

    /// Message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Decoding(e) => &e.message,
            Self::Validation(e) => &e.message,
            Self::RegulationLaw(e) => &e.message,
            Self::BillingAdapter(e) => &e.message,
        }
    }

    /// Localisation key.
    #[must_use]
    pub fn localized_key(&self) -> &str {
        match self {
            Self::Decoding(e) => &e.localized_key,
            Self::Validation(e) => &e.localized_key,
            Self::RegulationLaw(e) => &e.localized_key,
            Self::BillingAdapter(e) => &e.localized_key,
        }
    }
}
