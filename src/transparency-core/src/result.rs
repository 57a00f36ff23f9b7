//! Verification outcome types.

use serde::{Deserialize, Serialize};

use crate::error::{RegulationLawError, VerifyError};
use crate::verified_data::VerifiedData;

/// Category of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// Malformed encoding.
    Decoding,
    /// Semantically invalid data.
    Validation,
    /// Signature checked and rejected.
    Verification,
    /// Legal-metrology violation.
    Regulation,
}

impl ErrorType {
    /// Whether an error of this kind makes a result unverified.
    #[must_use]
    pub const fn blocks_verification(&self) -> bool {
        matches!(self, Self::Verification | Self::Validation)
    }
}

/// A single reported error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error category.
    #[serde(rename = "type")]
    pub kind: ErrorType,
    /// Human readable message.
    pub message: String,
    /// Localisation key.
    pub localized_key: String,
}

impl ErrorMessage {
    /// Create an error message.
    pub fn new(kind: ErrorType, message: impl Into<String>, localized_key: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            localized_key: localized_key.into(),
        }
    }

    /// Signature was checked and did not match.
    #[must_use]
    pub fn verification_failed() -> Self {
        Self::new(
            ErrorType::Verification,
            "Signature verification failed",
            "error.verification.failed",
        )
    }

    /// Neither a supplied nor an embedded public key is available.
    #[must_use]
    pub fn public_key_missing() -> Self {
        Self::new(
            ErrorType::Validation,
            "No public key supplied and none embedded in the data",
            "error.publickey.missing",
        )
    }

    /// No registered format accepted the data.
    #[must_use]
    pub fn no_matching_format() -> Self {
        Self::new(
            ErrorType::Decoding,
            "Data does not match any supported format",
            "error.format.unknown",
        )
    }

    /// Signed data could not be decoded.
    #[must_use]
    pub fn decoding_signature_failed() -> Self {
        Self::new(
            ErrorType::Decoding,
            "Could not decode signed data",
            "error.decoding.signature",
        )
    }
}

impl From<&VerifyError> for ErrorMessage {
    fn from(error: &VerifyError) -> Self {
        Self::new(error.kind(), error.message(), error.localized_key())
    }
}

impl From<VerifyError> for ErrorMessage {
    fn from(error: VerifyError) -> Self {
        Self::from(&error)
    }
}

/// A non-fatal regulatory observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Human readable message.
    pub message: String,
    /// Localisation key.
    pub localized_key: String,
}

impl Warning {
    /// Create a warning.
    pub fn new(message: impl Into<String>, localized_key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            localized_key: localized_key.into(),
        }
    }
}

impl From<RegulationLawError> for Warning {
    fn from(error: RegulationLawError) -> Self {
        Self::new(error.message, error.localized_key)
    }
}

/// Caller assertion that authenticity was established by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntrinsicVerified {
    /// The outer channel already guarantees authenticity.
    Verified,
    /// Signatures must be checked.
    #[default]
    NotVerified,
}

impl IntrinsicVerified {
    /// Whether cryptography may be skipped.
    #[must_use]
    pub const fn ok(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl From<bool> for IntrinsicVerified {
    fn from(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::NotVerified
        }
    }
}

/// Outcome of verifying one signed payload.
///
/// `verified` is true iff no VERIFICATION or VALIDATION error is present and
/// the signature was accepted (or trusted through [`IntrinsicVerified`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified_data: Option<VerifiedData>,
    errors: Vec<ErrorMessage>,
    warnings: Vec<Warning>,
}

impl VerificationResult {
    /// A successful verification.
    #[must_use]
    pub fn verified(data: VerifiedData) -> Self {
        Self {
            verified: true,
            verified_data: Some(data),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Parsed data paired with the error that prevented verification.
    #[must_use]
    pub fn unverified(data: Option<VerifiedData>, error: ErrorMessage) -> Self {
        Self {
            verified: false,
            verified_data: data,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// A failure before any data could be read.
    #[must_use]
    pub fn from_error(error: ErrorMessage) -> Self {
        Self::unverified(None, error)
    }

    /// Record an additional error. Blocking kinds clear the verified flag.
    pub fn add_error(&mut self, error: ErrorMessage) {
        if error.kind.blocks_verification() {
            self.verified = false;
        }
        self.errors.push(error);
    }

    /// Record a warning.
    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Whether the payload is verified.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Parsed data, if parsing got that far.
    #[must_use]
    pub fn verified_data(&self) -> Option<&VerifiedData> {
        self.verified_data.as_ref()
    }

    /// Reported errors in order.
    #[must_use]
    pub fn errors(&self) -> &[ErrorMessage] {
        &self.errors
    }

    /// Reported warnings in order.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Whether an error of `kind` was reported.
    #[must_use]
    pub fn has_error(&self, kind: ErrorType) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}
