//! Transaction summary over a verified start / stop pair.

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::law::LawConformity;
use crate::result::{ErrorMessage, VerificationResult, Warning};
use crate::types::{Meter, MeterRole, VerificationType};

/// Summary of one charging transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionReport {
    /// Both records verified and comparable.
    pub verified: bool,
    /// Format of the start record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<VerificationType>,
    /// Errors of both records, then law-conformance errors.
    pub errors: Vec<ErrorMessage>,
    /// Warnings of both records, then law-conformance findings.
    pub warnings: Vec<Warning>,
    /// Reading the transaction started at.
    pub start_meter: Option<Meter>,
    /// Reading the transaction ended at.
    pub stop_meter: Option<Meter>,
    /// Energy delivered, kWh.
    pub energy_kwh: Option<BigDecimal>,
    /// Transaction duration.
    pub duration_seconds: Option<i64>,
    /// Meter serial number.
    pub meter_serial: Option<String>,
    /// Meter model or vendor.
    pub meter_model: Option<String>,
    /// Outcome of the law-conformance check, when it could run.
    pub law_conformity: Option<LawConformity>,
}

impl TransactionReport {
    /// Summarise the results for a transaction's start and stop record.
    ///
    /// Both may come from the same payload when one record carries the
    /// whole transaction.
    #[must_use]
    pub fn from_results(start: &VerificationResult, stop: &VerificationResult) -> Self {
        let mut errors: Vec<ErrorMessage> = start.errors().to_vec();
        errors.extend_from_slice(stop.errors());
        let mut warnings: Vec<Warning> = start.warnings().to_vec();
        warnings.extend_from_slice(stop.warnings());

        let start_data = start.verified_data();
        let stop_data = stop.verified_data();

        let start_meter = start_data.and_then(|d| pick(d.meters(), MeterRole::Start, false));
        let stop_meter = stop_data.and_then(|d| pick(d.meters(), MeterRole::Stop, true));

        let mut comparable = true;
        let law_conformity = match (start_data, stop_data) {
            (Some(first), Some(last)) => match first.law_conform(last) {
                Ok(conformity) => {
                    warnings.extend(conformity.warnings.iter().cloned());
                    Some(conformity)
                },
                Err(e) => {
                    let message = ErrorMessage::from(&e);
                    comparable = !message.kind.blocks_verification();
                    errors.push(message);
                    None
                },
            },
            _ => None,
        };

        let energy_kwh = match (&start_meter, &stop_meter) {
            (Some(a), Some(b)) => Some(b.value_kwh() - a.value_kwh()),
            _ => None,
        };
        let duration_seconds = match (&start_meter, &stop_meter) {
            (Some(a), Some(b)) => match (a.timestamp, b.timestamp) {
                (Some(t0), Some(t1)) => Some((t1 - t0).num_seconds()),
                _ => None,
            },
            _ => None,
        };

        Self {
            verified: start.is_verified() && stop.is_verified() && comparable,
            format: start_data.map(|d| d.format()),
            errors,
            warnings,
            start_meter,
            stop_meter,
            energy_kwh,
            duration_seconds,
            meter_serial: start_data.and_then(|d| d.meter_id()),
            meter_model: start_data.and_then(|d| d.meter_model()),
            law_conformity,
        }
    }
}

/// First (or last) reading with `role`, falling back to the first (or last)
/// reading of any role.
fn pick(meters: Vec<Meter>, role: MeterRole, from_end: bool) -> Option<Meter> {
    let with_role = |m: &&Meter| m.role == role;
    let found = if from_end {
        meters.iter().rev().find(with_role).or_else(|| meters.last())
    } else {
        meters.iter().find(with_role).or_else(|| meters.first())
    };
    found.cloned()
}
