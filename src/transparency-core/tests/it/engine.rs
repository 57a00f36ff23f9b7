//! Registry behaviour across formats.

use transparency_core::{
    decode_public_key_text, EngineConfig, ErrorType, IntrinsicVerified, VerificationEngine,
    VerificationRegistry, VerificationType,
};

use crate::fixtures::{blob_hex, meter_key, public_point, reading, sign_reading, OCMF, OCMF_KEY};

#[test]
fn unknown_data_is_one_decoding_error() {
    let engine = VerificationEngine::new();
    for text in ["", "hello world", "<html/>", "AP;garbage", "OCMF|nope"] {
        assert_eq!(engine.detect(text), None, "{text}");
        let result = engine.verify(text, None, IntrinsicVerified::NotVerified);
        assert!(!result.is_verified());
        assert_eq!(result.errors().len(), 1, "{text}");
        assert_eq!(result.errors()[0].kind, ErrorType::Decoding);
    }
}

#[test]
fn verification_is_repeatable() {
    let engine = VerificationEngine::new();
    let key = hex::decode(OCMF_KEY).unwrap();
    let first = engine.verify(OCMF, Some(&key), IntrinsicVerified::NotVerified);
    let second = engine.verify(OCMF, Some(&key), IntrinsicVerified::NotVerified);
    assert_eq!(first, second);
}

#[test]
fn empty_key_counts_as_missing() {
    let result = VerificationEngine::new().verify(OCMF, Some(&[0u8; 0][..]), IntrinsicVerified::NotVerified);
    assert_eq!(result.errors()[0].localized_key, "error.publickey.missing");
}

#[test]
fn key_text_in_any_encoding() {
    let der = hex::decode(OCMF_KEY).unwrap();
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    let b64 = STANDARD.encode(&der);
    let pem = format!("-----BEGIN PUBLIC KEY-----\n{b64}\n-----END PUBLIC KEY-----\n");

    for text in [OCMF_KEY.to_string(), b64, pem] {
        let key = decode_public_key_text(&text).unwrap();
        assert_eq!(key, der);
        let result = VerificationEngine::new().verify(OCMF, Some(&key), IntrinsicVerified::NotVerified);
        assert!(result.is_verified());
    }
}

#[test]
fn restricted_registry_ignores_other_formats() {
    let registry = VerificationRegistry::with_formats(&[VerificationType::Alfen]);
    assert_eq!(registry.detect(OCMF), None);

    let key = meter_key(0x71);
    let blob = blob_hex(&sign_reading(&key, reading()));
    assert_eq!(registry.detect(&blob), None);
    assert_eq!(VerificationRegistry::new().detect(&blob), Some(VerificationType::SmlSigOnly));
}

#[test]
fn config_file_drives_the_engine() {
    let config = EngineConfig::from_toml_str("formats = [\"EDL_40_SIG\"]\nmax_input_chars = 4096").unwrap();
    let engine = VerificationEngine::with_config(config);
    assert_eq!(engine.detect(OCMF), None);

    let key = meter_key(0x72);
    let blob = blob_hex(&sign_reading(&key, reading()));
    let result = engine.verify(&blob, Some(&public_point(&key)), IntrinsicVerified::NotVerified);
    assert!(result.is_verified(), "{:?}", result.errors());
}

#[test]
fn result_serialises_for_reports() {
    let key = hex::decode(OCMF_KEY).unwrap();
    let result = VerificationEngine::new().verify(OCMF, Some(&key), IntrinsicVerified::NotVerified);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["verified"], serde_json::json!(true));
    assert!(json["errors"].as_array().unwrap().is_empty());
    assert!(json.get("verified_data").is_some());
}
