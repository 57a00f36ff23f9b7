//! Mennekes charging processes and billing exports.

use transparency_core::{
    convert_billing, ErrorType, IntrinsicVerified, MeterRole, VerificationEngine, VerificationType,
};

use crate::fixtures::{charging_process, later, meter_key, public_point, reading, sign_reading};

fn signed_process(seed: u8) -> (Vec<u8>, String) {
    let key = meter_key(seed);
    let start = sign_reading(&key, reading());
    let end = sign_reading(&key, later(&reading(), 45, 7_500));
    let public = public_point(&key);
    let xml = charging_process(&public, &start, &end);
    (public, xml)
}

#[test]
fn charging_process_verifies() {
    let (_, xml) = signed_process(0x61);

    let engine = VerificationEngine::new();
    assert_eq!(engine.detect(&xml), Some(VerificationType::Mennekes));

    let result = engine.verify(&xml, None, IntrinsicVerified::NotVerified);
    assert!(result.is_verified(), "{:?}", result.errors());
    let meters = result.verified_data().unwrap().meters();
    assert_eq!(meters.len(), 2);
    assert_eq!(meters[0].role, MeterRole::Start);
    assert_eq!(meters[1].role, MeterRole::Stop);
}

#[test]
fn wrong_unit_keeps_process_data() {
    let key = meter_key(0x65);
    let start = sign_reading(&key, reading());
    let mut end = later(&reading(), 30, 5_000);
    end.unit = 27;
    let end = sign_reading(&key, end);
    let public = public_point(&key);
    let xml = charging_process(&public, &start, &end);

    let result = VerificationEngine::new().verify(&xml, None, IntrinsicVerified::NotVerified);
    assert!(!result.is_verified());
    assert_eq!(result.errors()[0].localized_key, "error.sml.invalid.unit");
    let data = result.verified_data().expect("process data survives the unit check");
    assert_eq!(data.public_key_bytes(), public.as_slice());
    assert_eq!(data.meters().len(), 2);
}

#[test]
fn billing_export_is_split_per_process() {
    let (public, xml) = signed_process(0x62);
    let billing = format!(
        "<billing><billingPeriod>{xml}</billingPeriod><billingPeriod>{xml}</billingPeriod></billing>"
    );

    let values = convert_billing(&billing).unwrap();
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|v| v.verification_type == VerificationType::Mennekes));

    let results = VerificationEngine::new()
        .verify_billing(&billing, Some(&public), IntrinsicVerified::NotVerified)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_verified()));
}

#[test]
fn billing_with_foreign_key_fails() {
    let (_, xml) = signed_process(0x63);
    let billing = format!("<billing><billingPeriod>{xml}</billingPeriod></billing>");
    let other = public_point(&meter_key(0x64));

    let results = VerificationEngine::new()
        .verify_billing(&billing, Some(&other), IntrinsicVerified::NotVerified)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].has_error(ErrorType::Verification));
}

#[test]
fn unreadable_billing_export() {
    let err = VerificationEngine::new()
        .verify_billing("<billing><billingPeriod>", None, IntrinsicVerified::NotVerified)
        .unwrap_err();
    assert_eq!(err.message, "Could not transform Mennekes format to values");
}
