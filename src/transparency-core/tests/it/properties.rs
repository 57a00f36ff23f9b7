//! Property-based tests for encodings, format detection and tampering.

use proptest::prelude::*;
use transparency_core::{EncodingType, IntrinsicVerified, VerificationEngine, VerificationResult};

use crate::fixtures::{
    alfen_dataset, alfen_signature, meter_key, ocmf_key, public_point, reading, sign_reading, OCMF,
};

fn verify_text(text: &str, key: Option<&[u8]>) -> VerificationResult {
    VerificationEngine::new().verify(text, key, IntrinsicVerified::NotVerified)
}

fn verify_hex(bytes: &[u8], key: Option<&[u8]>) -> VerificationResult {
    verify_text(&hex::encode_upper(bytes), key)
}

fn signed_blob() -> (Vec<u8>, Vec<u8>) {
    let key = meter_key(0x71);
    let record = sign_reading(&key, reading());
    (public_point(&key), record.to_blob().unwrap())
}

fn signed_frame() -> Vec<u8> {
    let key = meter_key(0x72);
    let mut record = sign_reading(&key, reading());
    record.public_key = Some(public_point(&key));
    record.to_frame()
}

/// Offset and length of the hex digits in the OCMF `SD` field.
fn ocmf_signature_digits() -> (usize, usize) {
    let start = OCMF.find(r#""SD":""#).unwrap() + 6;
    let len = OCMF[start..].find('"').unwrap();
    (start, len)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// Every encoding reads back what it wrote.
    #[test]
    fn encoding_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        for encoding in EncodingType::ALL {
            let text = encoding.encode(&bytes);
            prop_assert_eq!(encoding.decode(&text).unwrap(), bytes.clone());
        }
    }

    /// Hex text always offers hex as its first candidate.
    #[test]
    fn hex_is_guessed_first(bytes in prop::collection::vec(any::<u8>(), 1..128)) {
        let text = EncodingType::PlainHex.encode(&bytes);
        let guessed = EncodingType::guess_type(&text);
        prop_assert_eq!(guessed.first(), Some(&EncodingType::PlainHex));
    }

    /// Arbitrary text never panics and never verifies.
    #[test]
    fn arbitrary_text_is_not_verified(text in ".{0,400}") {
        let result = VerificationEngine::new().verify(&text, None, IntrinsicVerified::NotVerified);
        prop_assert!(!result.is_verified());
        prop_assert!(!result.errors().is_empty());
    }

    /// Arbitrary bytes presented as hex never verify either.
    #[test]
    fn arbitrary_hex_is_not_verified(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let text = hex::encode_upper(&bytes);
        let result = VerificationEngine::new().verify(&text, None, IntrinsicVerified::NotVerified);
        prop_assert!(!result.is_verified());
    }

    /// A signature-only value with any byte changed is rejected.
    #[test]
    fn changed_blob_byte_is_not_verified(index in 0usize..237, mask in 1u8..=255) {
        let (public, mut blob) = signed_blob();
        prop_assert_eq!(blob.len(), 237);
        blob[index] ^= mask;
        prop_assert!(!verify_hex(&blob, Some(&public)).is_verified());
    }

    /// A shortened signature-only value is rejected.
    #[test]
    fn truncated_blob_is_not_verified(len in 0usize..237) {
        let (public, blob) = signed_blob();
        prop_assert!(!verify_hex(&blob[..len], Some(&public)).is_verified());
    }

    /// A full frame with any byte changed is rejected.
    #[test]
    fn changed_frame_byte_is_not_verified(
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let mut frame = signed_frame();
        let index = position.index(frame.len());
        frame[index] ^= mask;
        prop_assert!(!verify_hex(&frame, None).is_verified());
    }

    /// A shortened full frame is rejected.
    #[test]
    fn truncated_frame_is_not_verified(position in any::<prop::sample::Index>()) {
        let frame = signed_frame();
        let len = position.index(frame.len());
        prop_assert!(!verify_hex(&frame[..len], None).is_verified());
    }

    /// An Alfen record with a changed dataset or signature byte is rejected.
    #[test]
    fn changed_alfen_byte_is_not_verified(
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
        in_signature in any::<bool>(),
    ) {
        let mut record = alfen_signature(&meter_key(0x73), &alfen_dataset());
        let bytes = if in_signature { &mut record.signature } else { &mut record.dataset };
        let index = position.index(bytes.len());
        bytes[index] ^= mask;
        prop_assert!(!verify_text(&record.to_text(), None).is_verified());
    }

    /// An Alfen record with a shortened dataset or signature is rejected.
    #[test]
    fn truncated_alfen_is_not_verified(
        position in any::<prop::sample::Index>(),
        in_signature in any::<bool>(),
    ) {
        let mut record = alfen_signature(&meter_key(0x74), &alfen_dataset());
        let bytes = if in_signature { &mut record.signature } else { &mut record.dataset };
        let len = position.index(bytes.len());
        bytes.truncate(len);
        prop_assert!(!verify_text(&record.to_text(), None).is_verified());
    }

    /// An OCMF record with any payload character replaced is rejected.
    #[test]
    fn changed_ocmf_payload_is_not_verified(
        position in any::<prop::sample::Index>(),
        replacement in prop::char::range('!', '~'),
    ) {
        let start = "OCMF|".len();
        let end = OCMF.rfind('|').unwrap();
        let index = start + position.index(end - start);
        prop_assume!(OCMF.as_bytes()[index] != replacement as u8);

        let mut text = OCMF.to_string();
        text.replace_range(index..=index, &replacement.to_string());
        prop_assert!(!verify_text(&text, Some(&ocmf_key())).is_verified());
    }

    /// An OCMF record with a different signature digit is rejected.
    #[test]
    fn changed_ocmf_signature_is_not_verified(
        position in any::<prop::sample::Index>(),
        digit in 0u32..16,
    ) {
        let (start, len) = ocmf_signature_digits();
        let index = start + position.index(len);
        let old = char::from(OCMF.as_bytes()[index]).to_digit(16).unwrap();
        prop_assume!(old != digit);

        let mut text = OCMF.to_string();
        let new = char::from_digit(digit, 16).unwrap().to_ascii_uppercase();
        text.replace_range(index..=index, &new.to_string());
        prop_assert!(!verify_text(&text, Some(&ocmf_key())).is_verified());
    }

    /// A shortened OCMF record is rejected.
    #[test]
    fn truncated_ocmf_is_not_verified(position in any::<prop::sample::Index>()) {
        let len = position.index(OCMF.len());
        prop_assert!(!verify_text(&OCMF[..len], Some(&ocmf_key())).is_verified());
    }

    /// Verifying the same signed reading twice gives the same result.
    #[test]
    fn verification_is_repeatable(
        meter_position in 0i64..1_000_000_000_000,
        timestamp in 1_500_000_000u32..2_000_000_000,
        pagination in any::<u32>(),
    ) {
        let key = meter_key(0x75);
        let mut record = reading();
        record.meter_position = meter_position;
        record.timestamp = timestamp;
        record.pagination = pagination;
        let record = sign_reading(&key, record);
        let public = public_point(&key);
        let engine = VerificationEngine::new();

        let blob = hex::encode_upper(record.to_blob().unwrap());
        let first = engine.verify(&blob, Some(&public), IntrinsicVerified::NotVerified);
        let second = engine.verify(&blob, Some(&public), IntrinsicVerified::NotVerified);
        prop_assert!(first.is_verified());
        prop_assert_eq!(first, second);

        let mut dataset = alfen_dataset();
        dataset.meter_value = meter_position.unsigned_abs();
        dataset.timestamp = timestamp;
        dataset.paging = pagination;
        let text = alfen_signature(&key, &dataset).to_text();
        let first = engine.verify(&text, None, IntrinsicVerified::NotVerified);
        let second = engine.verify(&text, None, IntrinsicVerified::NotVerified);
        prop_assert!(first.is_verified());
        prop_assert_eq!(first, second);
    }
}
