//! Alfen charge-point records.

use transparency_core::{ErrorType, IntrinsicVerified, VerificationEngine, VerificationType};

use crate::fixtures::{alfen_dataset, alfen_text, meter_key};

#[test]
fn record_verifies_with_embedded_key() {
    let text = alfen_text(&meter_key(0x51), &alfen_dataset());

    let engine = VerificationEngine::new();
    assert_eq!(engine.detect(&text), Some(VerificationType::Alfen));

    let result = engine.verify(&text, None, IntrinsicVerified::NotVerified);
    assert!(result.is_verified(), "{:?}", result.errors());
    let data = result.verified_data().unwrap();
    assert_eq!(data.meter_id().as_deref(), Some("MTR0000042"));
    assert_eq!(data.meters().len(), 1);
}

#[test]
fn meter_fault_is_reported_but_does_not_block() {
    let mut dataset = alfen_dataset();
    dataset.meter_status = 0x10;
    let text = alfen_text(&meter_key(0x52), &dataset);

    let result = VerificationEngine::new().verify(&text, None, IntrinsicVerified::NotVerified);
    assert!(result.is_verified());
    assert!(result.has_error(ErrorType::Regulation));
}

#[test]
fn wrong_key_is_rejected() {
    let text = alfen_text(&meter_key(0x53), &alfen_dataset());
    let other = meter_key(0x54).verifying_key().to_encoded_point(false).as_bytes().to_vec();

    let result = VerificationEngine::new().verify(&text, Some(&other), IntrinsicVerified::NotVerified);
    assert!(!result.is_verified());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].kind, ErrorType::Verification);
}

#[test]
fn transaction_between_two_records() {
    let key = meter_key(0x55);
    let start = alfen_dataset();
    let mut stop = alfen_dataset();
    stop.timestamp += 3600;
    stop.second_index += 3600;
    stop.paging += 1;
    stop.meter_value += 22_000;

    let report = VerificationEngine::new().verify_transaction(
        &alfen_text(&key, &start),
        &alfen_text(&key, &stop),
        None,
        IntrinsicVerified::NotVerified,
    );
    assert!(report.verified, "{:?}", report.errors);
    assert_eq!(report.duration_seconds, Some(3600));
    assert!(report.warnings.is_empty());
}

#[test]
fn session_change_is_a_finding() {
    let key = meter_key(0x56);
    let start = alfen_dataset();
    let mut stop = alfen_dataset();
    stop.timestamp += 60;
    stop.paging += 1;
    stop.session_id += 1;

    let report = VerificationEngine::new().verify_transaction(
        &alfen_text(&key, &start),
        &alfen_text(&key, &stop),
        None,
        IntrinsicVerified::NotVerified,
    );
    assert!(report
        .warnings
        .iter()
        .any(|w| w.localized_key == "warning.law.session.mismatch"));
}
