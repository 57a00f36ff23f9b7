//! Shared domain types: supported formats and meter readings.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Supported signed-payload formats.
///
/// The set is closed; each value maps to exactly one reader and one
/// [`crate::VerifiedData`] variant (see [`crate::format`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationType {
    /// Full SML frame with readings, identifiers and a value signature.
    #[serde(rename = "EDL_40_P")]
    Sml40,
    /// EDL signed meter value: a single reading plus a bare signature.
    #[serde(rename = "EDL_40_SIG")]
    SmlSigOnly,
    /// Open Charge Metering Format.
    #[serde(rename = "OCMF")]
    Ocmf,
    /// Alfen charge-point format.
    #[serde(rename = "ALFEN")]
    Alfen,
    /// Mennekes charging process extracted from a billing record.
    #[serde(rename = "EDL_40_MENNEKES")]
    Mennekes,
}

impl VerificationType {
    /// All formats in detection priority order.
    ///
    /// The full SML frame comes before the signature-only variant: a frame
    /// of the right length would otherwise be misread as a bare blob.
    pub const PRIORITY: [VerificationType; 5] = [
        VerificationType::Sml40,
        VerificationType::SmlSigOnly,
        VerificationType::Ocmf,
        VerificationType::Alfen,
        VerificationType::Mennekes,
    ];

    /// External name used in transport files and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sml40 => "EDL_40_P",
            Self::SmlSigOnly => "EDL_40_SIG",
            Self::Ocmf => "OCMF",
            Self::Alfen => "ALFEN",
            Self::Mennekes => "EDL_40_MENNEKES",
        }
    }
}

impl fmt::Display for VerificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role of a reading within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeterRole {
    /// Transaction begin.
    Start,
    /// Transaction end.
    Stop,
    /// Intermediate or tariff reading, or a record that does not say.
    Intermediate,
}

/// A single meter reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meter {
    /// Reading value.
    pub value: BigDecimal,
    /// Unit of `value` (`kWh` or `Wh`).
    pub unit: String,
    /// Time of the reading.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Role in the transaction.
    pub role: MeterRole,
    /// OBIS register the reading was taken from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obis: Option<String>,
}

impl Meter {
    /// Value normalised to kWh.
    #[must_use]
    pub fn value_kwh(&self) -> BigDecimal {
        if self.unit.eq_ignore_ascii_case("wh") {
            &self.value / BigDecimal::from(1000)
        } else {
            self.value.clone()
        }
    }
}

/// Render a 6-byte OBIS code as `A-B:C.D.E*F`.
#[must_use]
pub fn format_obis(obis: &[u8]) -> String {
    match obis {
        [a, b, c, d, e, f] => format!("{a}-{b}:{c}.{d}.{e}*{f}"),
        _ => hex::encode_upper(obis),
    }
}
