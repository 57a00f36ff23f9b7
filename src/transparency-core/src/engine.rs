//! Verification engine facade.
//!
//! Wraps the registry with the configured limits and adds the transaction
//! and billing workflows on top of single-record verification.

use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{BillingAdapterError, ValidationError, VerifyError};
use crate::format::mennekes::convert_billing;
use crate::registry::VerificationRegistry;
use crate::report::TransactionReport;
use crate::result::{IntrinsicVerified, VerificationResult};
use crate::types::VerificationType;

/// Stateless verification engine.
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    config: EngineConfig,
    registry: VerificationRegistry,
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationEngine {
    /// Engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with a custom configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        info!(
            formats = ?config.formats,
            max_input_chars = config.max_input_chars,
            "VerificationEngine: initialising"
        );
        let registry = VerificationRegistry::with_formats(&config.formats);
        Self { config, registry }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Format registry.
    #[must_use]
    pub fn registry(&self) -> &VerificationRegistry {
        &self.registry
    }

    fn check_size(&self, text: &str) -> Result<(), VerifyError> {
        let chars = text.chars().count();
        if chars > self.config.max_input_chars {
            warn!(chars, limit = self.config.max_input_chars, "input rejected");
            return Err(ValidationError::new(
                format!(
                    "Input has {chars} characters, limit is {}",
                    self.config.max_input_chars
                ),
                "error.input.too.large",
            )
            .into());
        }
        Ok(())
    }

    /// Detected format of `text`, if any.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<VerificationType> {
        self.check_size(text).ok()?;
        self.registry.detect(text)
    }

    /// Detect and verify one signed payload.
    #[instrument(skip_all, fields(intrinsic = ?intrinsic))]
    pub fn verify(
        &self,
        text: &str,
        public_key: Option<&[u8]>,
        intrinsic: IntrinsicVerified,
    ) -> VerificationResult {
        if let Err(e) = self.check_size(text) {
            return VerificationResult::from_error(e.into());
        }
        let result = self.registry.detect_and_verify(text, public_key, intrinsic);
        info!(
            verified = result.is_verified(),
            errors = result.errors().len(),
            "verification finished"
        );
        result
    }

    /// Verify a transaction's start and stop record and compare them.
    #[instrument(skip_all)]
    pub fn verify_transaction(
        &self,
        start: &str,
        stop: &str,
        public_key: Option<&[u8]>,
        intrinsic: IntrinsicVerified,
    ) -> TransactionReport {
        let start = self.verify(start, public_key, intrinsic);
        let stop = self.verify(stop, public_key, intrinsic);
        let report = TransactionReport::from_results(&start, &stop);
        info!(
            verified = report.verified,
            energy_kwh = ?report.energy_kwh,
            "transaction checked"
        );
        report
    }

    /// Verify every charging process in a billing export.
    ///
    /// `public_key` overrides the keys declared in the export.
    ///
    /// # Errors
    ///
    /// Returns [`BillingAdapterError`] when the export cannot be converted.
    pub fn verify_billing(
        &self,
        text: &str,
        public_key: Option<&[u8]>,
        intrinsic: IntrinsicVerified,
    ) -> Result<Vec<VerificationResult>, BillingAdapterError> {
        let values = convert_billing(text)?;
        Ok(values
            .iter()
            .map(|value| {
                value
                    .verification_type
                    .parse_and_verify(&value.data, public_key, intrinsic)
            })
            .collect())
    }
}
