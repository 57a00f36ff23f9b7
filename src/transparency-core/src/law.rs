//! Legal-metrology checks between the start and stop reading of a
//! transaction.
//!
//! Hard violations are returned as [`RegulationLawError`]; softer findings
//! make the pair non-conformant and are reported as [`Warning`]s.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::{RegulationLawError, ValidationError, VerifyError};
use crate::result::Warning;
use crate::types::format_obis;

/// Outcome of comparing two readings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LawConformity {
    /// Whether the pair satisfies every check.
    pub conformant: bool,
    /// Findings that made the pair non-conformant.
    pub warnings: Vec<Warning>,
}

impl LawConformity {
    /// A conformant pair with nothing to report.
    #[must_use]
    pub fn conformant() -> Self {
        Self {
            conformant: true,
            warnings: Vec::new(),
        }
    }

    /// Record a finding that breaks conformance.
    pub fn violate(&mut self, warning: Warning) {
        self.conformant = false;
        self.warnings.push(warning);
    }
}

/// Error for comparing records of different formats.
#[must_use]
pub fn incomparable(start: &str, stop: &str) -> VerifyError {
    ValidationError::new(
        format!("Cannot compare {start} data with {stop} data"),
        "error.law.incomparable",
    )
    .into()
}

/// Both readings must come from the same meter.
pub fn check_same_meter(start: &[u8], stop: &[u8]) -> Result<(), RegulationLawError> {
    if start != stop {
        return Err(RegulationLawError::new(
            format!(
                "Meter id differs: start {} / stop {}",
                hex::encode_upper(start),
                hex::encode_upper(stop)
            ),
            "error.law.meter.mismatch",
        ));
    }
    Ok(())
}

/// Both readings must measure the same quantity.
pub fn check_same_unit(start: &str, stop: &str) -> Result<(), ValidationError> {
    if start != stop {
        return Err(ValidationError::new(
            format!("Unit differs: start {start} / stop {stop}"),
            "error.law.unit.mismatch",
        ));
    }
    Ok(())
}

/// Both readings must come from the same register.
pub fn check_same_obis(start: &[u8], stop: &[u8]) -> Result<(), ValidationError> {
    if start != stop {
        return Err(ValidationError::new(
            format!(
                "OBIS code differs: start {} / stop {}",
                format_obis(start),
                format_obis(stop)
            ),
            "error.law.obis.mismatch",
        ));
    }
    Ok(())
}

/// The stop reading may not be taken before the start reading.
pub fn check_time_order(
    start: Option<DateTime<FixedOffset>>,
    stop: Option<DateTime<FixedOffset>>,
) -> Result<(), RegulationLawError> {
    if let (Some(start), Some(stop)) = (start, stop) {
        if stop < start {
            return Err(RegulationLawError::new(
                format!("Stop time {stop} is before start time {start}"),
                "error.law.time.reversed",
            ));
        }
    }
    Ok(())
}

/// Meter values never decrease within a transaction.
///
/// A decrease the meter itself declared (reset or error status) is a
/// finding; an undeclared one is a violation.
pub fn check_monotonic(
    start: &BigDecimal,
    stop: &BigDecimal,
    reset_declared: bool,
    conformity: &mut LawConformity,
) -> Result<(), RegulationLawError> {
    if stop >= start {
        return Ok(());
    }
    if reset_declared {
        conformity.violate(Warning::new(
            format!("Meter value decreased from {start} to {stop} after a declared reset"),
            "warning.law.meter.reset",
        ));
        return Ok(());
    }
    Err(RegulationLawError::new(
        format!("Meter value decreased from {start} to {stop}"),
        "error.law.value.decreased",
    ))
}

/// Counters such as signature pagination must move forward.
pub fn check_counter(name: &str, start: u64, stop: u64, conformity: &mut LawConformity) {
    if stop <= start {
        conformity.violate(Warning::new(
            format!("{name} did not advance ({start} -> {stop})"),
            "warning.law.counter",
        ));
    }
}

/// Session or customer identifiers should match.
pub fn check_same_session(name: &str, start: &str, stop: &str, conformity: &mut LawConformity) {
    if start != stop {
        conformity.violate(Warning::new(
            format!("{name} differs: start '{start}' / stop '{stop}'"),
            "warning.law.session.mismatch",
        ));
    }
}
