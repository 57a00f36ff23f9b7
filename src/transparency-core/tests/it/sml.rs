//! EDL readings as full frames and as signature-only values.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use transparency_core::{
    EncodingType, ErrorType, IntrinsicVerified, VerificationEngine, VerificationType,
};

use crate::fixtures::{
    blob_hex, envelope, later, meter_key, public_point, reading, sign_reading, P192_KEY,
    P192_SIGNATURE,
};

#[test]
fn frame_and_blob_are_told_apart() {
    let key = meter_key(0x41);
    let mut record = sign_reading(&key, reading());
    record.public_key = Some(public_point(&key));

    let engine = VerificationEngine::new();
    assert_eq!(
        engine.detect(&hex::encode_upper(record.to_frame())),
        Some(VerificationType::Sml40)
    );
    assert_eq!(engine.detect(&blob_hex(&record)), Some(VerificationType::SmlSigOnly));
    assert_eq!(
        engine.detect(&envelope(&record, &public_point(&key))),
        Some(VerificationType::SmlSigOnly)
    );
}

#[test]
fn p192_blob_verifies() {
    let mut record = reading();
    record.provided_signature = Some(hex::decode(P192_SIGNATURE).unwrap());
    let key = hex::decode(P192_KEY).unwrap();
    let engine = VerificationEngine::new();

    let result = engine.verify(&blob_hex(&record), Some(&key), IntrinsicVerified::NotVerified);
    assert!(result.is_verified(), "{:?}", result.errors());
    assert_eq!(result.verified_data().unwrap().format(), VerificationType::SmlSigOnly);

    record.log_book += 1;
    let result = engine.verify(&blob_hex(&record), Some(&key), IntrinsicVerified::NotVerified);
    assert!(result.has_error(ErrorType::Verification));
}

#[test]
fn frame_with_embedded_key_verifies() {
    let key = meter_key(0x41);
    let mut record = sign_reading(&key, reading());
    record.public_key = Some(public_point(&key));

    let result = VerificationEngine::new().verify(
        &hex::encode_upper(record.to_frame()),
        None,
        IntrinsicVerified::NotVerified,
    );
    assert!(result.is_verified(), "{:?}", result.errors());
    let data = result.verified_data().unwrap();
    assert_eq!(data.format(), VerificationType::Sml40);
    assert_eq!(data.encoding(), EncodingType::PlainHex);
    assert_eq!(data.public_key_bytes(), public_point(&key).as_slice());
    assert_eq!(
        data.meters()[0].value_kwh(),
        BigDecimal::from_str("1319.135").unwrap()
    );
}

#[test]
fn envelope_verifies_with_embedded_key() {
    let key = meter_key(0x42);
    let record = sign_reading(&key, reading());

    let result = VerificationEngine::new().verify(
        &envelope(&record, &public_point(&key)),
        None,
        IntrinsicVerified::NotVerified,
    );
    assert!(result.is_verified(), "{:?}", result.errors());
    assert_eq!(result.verified_data().unwrap().encoding(), EncodingType::Base64);
}

#[test]
fn supplied_key_overrides_embedded_key() {
    let key = meter_key(0x42);
    let other = meter_key(0x43);
    let record = sign_reading(&key, reading());

    let result = VerificationEngine::new().verify(
        &envelope(&record, &public_point(&key)),
        Some(&public_point(&other)),
        IntrinsicVerified::NotVerified,
    );
    assert!(!result.is_verified());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].kind, ErrorType::Verification);
}

#[test]
fn wrong_unit_is_rejected() {
    let key = meter_key(0x44);
    let mut record = reading();
    record.unit = 27;
    let record = sign_reading(&key, record);

    let result = VerificationEngine::new().verify(
        &blob_hex(&record),
        Some(&public_point(&key)),
        IntrinsicVerified::NotVerified,
    );
    assert!(!result.is_verified());
    assert!(result.has_error(ErrorType::Validation));
    assert_eq!(result.errors()[0].message, "Invalid unit present in sml data");
}

#[test]
fn tampered_blob_is_rejected() {
    let key = meter_key(0x45);
    let record = sign_reading(&key, reading());
    let mut bytes = record.to_blob().unwrap();
    // last byte of the meter position
    bytes[10 + 4 + 1 + 4 + 4 + 6 + 1 + 1 + 7] ^= 0x01;

    let result = VerificationEngine::new().verify(
        &hex::encode_upper(bytes),
        Some(&public_point(&key)),
        IntrinsicVerified::NotVerified,
    );
    assert!(!result.is_verified());
    assert_eq!(result.errors()[0].kind, ErrorType::Verification);
}

#[test]
fn transaction_over_two_readings() {
    let key = meter_key(0x46);
    let start = sign_reading(&key, reading());
    let stop = sign_reading(&key, later(&reading(), 30, 11_000));

    let report = VerificationEngine::new().verify_transaction(
        &blob_hex(&start),
        &blob_hex(&stop),
        Some(&public_point(&key)),
        IntrinsicVerified::NotVerified,
    );
    assert!(report.verified, "{:?}", report.errors);
    assert_eq!(report.energy_kwh, Some(BigDecimal::from(11)));
    assert_eq!(report.duration_seconds, Some(1800));
    assert!(report.law_conformity.unwrap().conformant);
}

#[test]
fn decreasing_reading_violates_law() {
    let key = meter_key(0x47);
    let start = sign_reading(&key, reading());
    let stop = sign_reading(&key, later(&reading(), 30, -500));

    let report = VerificationEngine::new().verify_transaction(
        &blob_hex(&start),
        &blob_hex(&stop),
        Some(&public_point(&key)),
        IntrinsicVerified::NotVerified,
    );
    assert!(report
        .errors
        .iter()
        .any(|e| e.kind == ErrorType::Regulation && e.localized_key == "error.law.value.decreased"));
    assert!(report.law_conformity.is_none());
}

#[test]
fn declared_reset_is_only_a_warning() {
    let key = meter_key(0x48);
    let start = sign_reading(&key, reading());
    let mut stop = later(&reading(), 30, -500);
    stop.status |= 0x02;
    let stop = sign_reading(&key, stop);

    let report = VerificationEngine::new().verify_transaction(
        &blob_hex(&start),
        &blob_hex(&stop),
        Some(&public_point(&key)),
        IntrinsicVerified::NotVerified,
    );
    assert!(report.verified, "{:?}", report.errors);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.localized_key == "warning.law.meter.reset"));
}

#[test]
fn frame_and_blob_are_not_comparable() {
    let key = meter_key(0x49);
    let mut start = sign_reading(&key, reading());
    start.public_key = Some(public_point(&key));
    let stop = sign_reading(&key, later(&reading(), 30, 100));

    let report = VerificationEngine::new().verify_transaction(
        &hex::encode_upper(start.to_frame()),
        &blob_hex(&stop),
        Some(&public_point(&key)),
        IntrinsicVerified::NotVerified,
    );
    assert!(report
        .errors
        .iter()
        .any(|e| e.localized_key == "error.law.incomparable"));
}
