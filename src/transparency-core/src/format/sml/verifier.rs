//! Signature check for SML readings.
//!
//! EDL meters sign with P-192; some newer devices use P-256 with the same
//! message layout. The P-192 verifier runs first and the P-256 verifier is
//! only consulted when the first one cannot use the key or signature at all.
//! A clean rejection from the first verifier is final.

use tracing::{debug, instrument};
use transparency_crypto::{P192Verifier, P256Verifier, SignatureVerifier};

use super::SmlSignature;
use crate::error::{ValidationError, VerifyError};

/// Verifier chain for SML signatures.
#[derive(Debug, Clone, Default)]
pub struct SmlSignatureVerifier {
    primary: P192Verifier,
    fallback: P256Verifier,
}

impl SmlSignatureVerifier {
    /// Create the default P-192 / P-256 chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            primary: P192Verifier::new(),
            fallback: P256Verifier::raw(),
        }
    }

    /// Check `record`'s signature against `public_key`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the record has no signature or when
    /// neither verifier can interpret key and signature.
    #[instrument(skip_all, fields(pagination = record.pagination))]
    pub fn verify(&self, public_key: &[u8], record: &SmlSignature) -> Result<bool, VerifyError> {
        let message = record.signed_message()?;
        let signature = record
            .provided_signature
            .as_deref()
            .ok_or_else(|| ValidationError::sml("SML data carries no signature"))?;

        let attempts: [&dyn SignatureVerifier; 2] = [&self.primary, &self.fallback];
        let mut last_error = None;
        for verifier in attempts {
            match verifier.verify(public_key, &message, signature) {
                Ok(valid) => {
                    debug!(algorithm = ?verifier.algorithm(), valid, "SML signature checked");
                    return Ok(valid);
                },
                Err(e) => {
                    debug!(algorithm = ?verifier.algorithm(), error = %e, "verifier not applicable");
                    last_error = Some(e);
                },
            }
        }

        Err(last_error
            .map(VerifyError::from)
            .unwrap_or_else(|| ValidationError::sml("No SML verifier available").into()))
    }
}
