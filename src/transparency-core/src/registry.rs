//! Ordered format registry.
//!
//! Probes readers in priority order and hands the payload to the first one
//! that accepts it.

use tracing::{debug, info, instrument};

use crate::result::{ErrorMessage, IntrinsicVerified, VerificationResult};
use crate::types::VerificationType;

/// Immutable, ordered list of enabled formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRegistry {
    formats: Vec<VerificationType>,
}

impl Default for VerificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationRegistry {
    /// Registry with every format in default priority order.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: VerificationType::PRIORITY.to_vec(),
        }
    }

    /// Registry probing exactly `formats`, in the given order.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    #[must_use]
    pub fn with_formats(formats: &[VerificationType]) -> Self {
        let mut unique = Vec::with_capacity(formats.len());
        for format in formats {
            if !unique.contains(format) {
                unique.push(*format);
            }
        }
        Self { formats: unique }
    }

    /// Enabled formats in probing order.
    #[must_use]
    pub fn formats(&self) -> &[VerificationType] {
        &self.formats
    }

    /// First format whose reader accepts `text`.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<VerificationType> {
        let detected = self.formats.iter().copied().find(|f| f.can_parse_data(text));
        match detected {
            Some(format) => info!(%format, "detected format"),
            None => debug!(candidates = self.formats.len(), "no format matched"),
        }
        detected
    }

    /// Detect the format of `text` and verify it.
    ///
    /// Returns a single DECODING error when no format matches.
    #[instrument(skip_all, fields(len = text.len(), has_key = public_key.is_some()))]
    pub fn detect_and_verify(
        &self,
        text: &str,
        public_key: Option<&[u8]>,
        intrinsic: IntrinsicVerified,
    ) -> VerificationResult {
        match self.detect(text) {
            Some(format) => format.parse_and_verify(text, public_key, intrinsic),
            None => VerificationResult::from_error(ErrorMessage::no_matching_format()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorType;

    #[test]
    fn test_default_order() {
        assert_eq!(
            VerificationRegistry::default().formats(),
            &VerificationType::PRIORITY
        );
    }

    #[test]
    fn test_with_formats_dedups() {
        let registry = VerificationRegistry::with_formats(&[
            VerificationType::Ocmf,
            VerificationType::Alfen,
            VerificationType::Ocmf,
        ]);
        assert_eq!(
            registry.formats(),
            &[VerificationType::Ocmf, VerificationType::Alfen]
        );
    }

    #[test]
    fn test_garbage_gives_single_decoding_error() {
        let result =
            VerificationRegistry::new().detect_and_verify("hello", None, IntrinsicVerified::NotVerified);
        assert!(!result.is_verified());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].kind, ErrorType::Decoding);
        assert_eq!(result.errors()[0].localized_key, "error.format.unknown");
    }

    #[test]
    fn test_empty_registry_detects_nothing() {
        let registry = VerificationRegistry::with_formats(&[]);
        assert!(registry.detect("OCMF|{}|{}").is_none());
    }
}
