//! OCMF records from detection to transaction summary.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use transparency_core::{
    ErrorType, IntrinsicVerified, MeterRole, VerificationEngine, VerificationType, VerifiedDataKind,
};

use crate::fixtures::{ocmf_key, OCMF};

#[test]
fn lem_record_verifies() {
    let engine = VerificationEngine::new();
    assert_eq!(engine.detect(OCMF), Some(VerificationType::Ocmf));

    let result = engine.verify(OCMF, Some(&ocmf_key()), IntrinsicVerified::NotVerified);
    assert!(result.is_verified(), "{:?}", result.errors());
    assert!(result.errors().is_empty());

    let data = result.verified_data().unwrap();
    assert_eq!(data.kind(), VerifiedDataKind::Ocmf);
    assert_eq!(data.meter_id().as_deref(), Some("1242050810"));

    let meters = data.meters();
    assert_eq!(meters.len(), 2);
    assert_eq!(meters[0].role, MeterRole::Start);
    assert_eq!(meters[1].role, MeterRole::Stop);
    assert_eq!(meters[0].timestamp.unwrap().timestamp(), 1_761_479_400);
}

#[test]
fn lem_transaction_energy() {
    let engine = VerificationEngine::new();
    let report = engine.verify_transaction(OCMF, OCMF, Some(&ocmf_key()), IntrinsicVerified::NotVerified);

    assert!(report.verified, "{:?}", report.errors);
    assert_eq!(report.format, Some(VerificationType::Ocmf));
    assert_eq!(report.energy_kwh, Some(BigDecimal::from_str("9.146").unwrap()));
    assert_eq!(report.duration_seconds, Some(16 * 60 + 7));
    assert_eq!(report.meter_serial.as_deref(), Some("1242050810"));
}

#[test]
fn altered_value_is_rejected() {
    let tampered = OCMF.replacen("\"RV\":1319.135", "\"RV\":1319.136", 1);
    assert_ne!(tampered, OCMF);

    let result = VerificationEngine::new().verify(&tampered, Some(&ocmf_key()), IntrinsicVerified::NotVerified);
    assert!(!result.is_verified());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].kind, ErrorType::Verification);
    assert!(result.verified_data().is_some());
}

#[test]
fn record_without_key_needs_one() {
    let result = VerificationEngine::new().verify(OCMF, None, IntrinsicVerified::NotVerified);
    assert!(!result.is_verified());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].localized_key, "error.publickey.missing");
}

#[test]
fn intrinsic_trust_skips_signature() {
    let tampered = OCMF.replacen("\"RV\":1319.135", "\"RV\":1319.136", 1);
    let result = VerificationEngine::new().verify(&tampered, None, IntrinsicVerified::Verified);
    assert!(result.is_verified());
    assert!(result.errors().is_empty());
}

#[test]
fn broken_json_is_a_decoding_error() {
    let result = VerificationType::Ocmf.parse_and_verify(
        "OCMF|{\"RD\":[|{}",
        Some(&ocmf_key()),
        IntrinsicVerified::NotVerified,
    );
    assert!(!result.is_verified());
    assert!(result.has_error(ErrorType::Decoding));
}
