//! Configuration for the verification engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::VerificationType;

/// Default input limit, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 2 * 1024 * 1024;

/// Configuration for the verification engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enabled formats in probing order.
    pub formats: Vec<VerificationType>,
    /// Inputs longer than this are rejected without parsing.
    pub max_input_chars: usize,
    /// Hex digits per group when displaying keys.
    pub key_group_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            formats: VerificationType::PRIORITY.to_vec(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            key_group_size: 4,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML configuration. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text)
            .map_err(|e| ValidationError::new(format!("Invalid configuration: {e}"), "error.config.invalid"))
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::new(
                format!("Cannot read configuration {}: {e}", path.display()),
                "error.config.read",
            )
        })?;
        Self::from_toml_str(&text)
    }
}
