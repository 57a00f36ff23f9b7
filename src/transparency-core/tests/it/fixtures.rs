//! Signed payloads shared by the integration tests.

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use transparency_core::format::alfen::{AlfenDataset, AlfenSignature};
use transparency_core::format::sml::{obis, SmlSignature, UNIT_WATT_HOUR};

/// OCMF record from a LEM DC meter, signed with [`OCMF_KEY`].
pub const OCMF: &str = concat!(
    "OCMF|",
    r#"{"FV":"1.0","GI":"LEM DCBM","GS":"1242050810","GV":"v1","PG":"T61","MV":"LEM","MS":"1242050810","MF":"MU-2.3.0.1_SU-0.1.3.0","IS":true,"IL":"TRUSTED","IF":["RFID_NONE","OCPP_RS_TLS","ISO15118_NONE","PLMN_NONE"],"IT":"NONE","ID":"O-b9d89940be03-10802","CT":"EVSEID","CI":"FR*A23*E45B*78D","RD":[{"TM":"2025-10-26T12:50:00,000+0100 R","TX":"B","RV":1319.135,"RI":"1-0:1.8.0","RU":"kWh","RT":"DC","EF":"","ST":"G","UC":{"UN":"No_Comp","UI":0,"UR":0}},{"RV":7.641,"RI":"1-0:2.8.0","RU":"kWh","ST":"G"},{"TM":"2025-10-26T13:06:07,000+0100 R","TX":"E","RV":1328.281,"RI":"1-0:1.8.0","RU":"kWh","ST":"G"},{"RV":7.641,"RI":"1-0:2.8.0","RU":"kWh","ST":"G"}]}"#,
    "|",
    r#"{"SA":"ECDSA-secp256r1-SHA256","SD":"304502202FFD57E359C7470E8717FBBB0A5BCE0CCF96EC56268CC95B8862FE3E1CD07EA90221009DE6CF26F3D79411D083CD4BEE9715EE852E730DECFCD83036DF0DDF9EFBC0AD"}"#
);

/// DER SPKI key of the LEM meter, hex.
pub const OCMF_KEY: &str = "3059301306072a8648ce3d020106082a8648ce3d0301070342000490731a7a8b3f0f3cf2884237953842f2b196393404edc1485b67b4e5c7b2c3d5bd5934a12485aceb68c341ecc7068775c3a953d86d6e4c70f4ac05aa7533211c";

/// Uncompressed P-192 point of an EDL meter.
pub const P192_KEY: &str = "04F6E594B8506244FC4529F69B09C33F71783B6E1B076C234B\
    D39249EF782F499BB1CE6B9B74FC728D49C43439FFEC9601";

/// Raw `r || s` signature of [`reading`] by the [`P192_KEY`] meter.
pub const P192_SIGNATURE: &str = "06479E7C85C2BF81C49F72A5456D3F7B7B24C185809E6A67\
    4B752E2FD16ED5507A7E34A9F4FB7ECB12D8A6B0BF3DF315";

pub fn ocmf_key() -> Vec<u8> {
    hex::decode(OCMF_KEY).unwrap()
}

/// Deterministic meter key.
pub fn meter_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).unwrap()
}

pub fn public_point(key: &SigningKey) -> Vec<u8> {
    key.verifying_key().to_encoded_point(false).as_bytes().to_vec()
}

/// An unsigned EDL reading of 1319.135 kWh.
pub fn reading() -> SmlSignature {
    SmlSignature {
        server_id: vec![0x0A, 0x01, 0x45, 0x4D, 0x48, 0x00, 0x00, 0x7F, 0x53, 0x4B],
        timestamp: 1_700_000_000,
        status: 0x04,
        second_index: 123_456,
        pagination: 42,
        obis: obis::ENERGY_IMPORT,
        unit: UNIT_WATT_HOUR,
        scaler: -1,
        meter_position: 13_191_350,
        log_book: 1,
        customer_id: b"CUSTOMER 0001".to_vec(),
        provided_signature: None,
        method: None,
        public_key: None,
    }
}

pub fn sign_reading(key: &SigningKey, mut record: SmlSignature) -> SmlSignature {
    let signature: Signature = key.sign(&record.signed_message().unwrap());
    record.provided_signature = Some(signature.to_bytes().to_vec());
    record
}

/// The reading `minutes` later with `wh` more energy.
pub fn later(record: &SmlSignature, minutes: u32, wh: i64) -> SmlSignature {
    let mut next = record.clone();
    next.timestamp += minutes * 60;
    next.second_index += minutes * 60;
    next.pagination += 1;
    next.meter_position += wh * 10;
    next.provided_signature = None;
    next
}

/// Signature-only blob as upper-case hex.
pub fn blob_hex(record: &SmlSignature) -> String {
    hex::encode_upper(record.to_blob().unwrap())
}

/// `signedMeterValue` envelope around a Base64 blob.
pub fn envelope(record: &SmlSignature, public: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    format!(
        "<signedMeterValue><publicKey encoding=\"base64\">{}</publicKey><meterValueSignature encoding=\"base64\">{}</meterValueSignature><signatureMethod>ECDSA256SHA256</signatureMethod><encodingMethod>EDL</encodingMethod></signedMeterValue>",
        STANDARD.encode(public),
        STANDARD.encode(record.to_blob().unwrap()),
    )
}

pub fn alfen_dataset() -> AlfenDataset {
    AlfenDataset {
        adapter_id: *b"ALF0000001",
        adapter_firmware: *b"1.02",
        adapter_checksum: 0xBEEF,
        meter_id: *b"MTR0000042",
        meter_status: 0,
        adapter_status: 0,
        second_index: 5_000,
        timestamp: 1_700_000_000,
        obis: [1, 0, 1, 8, 0, 255],
        unit: 30,
        scaler: 0,
        meter_value: 1_319_135,
        uid: *b"UID0000007",
        session_id: 77,
        paging: 10,
    }
}

pub fn alfen_signature(key: &SigningKey, dataset: &AlfenDataset) -> AlfenSignature {
    let bytes = dataset.to_bytes();
    let signature: Signature = key.sign(&bytes);
    AlfenSignature {
        version: 3,
        block_count: 1,
        public_key: public_point(key),
        dataset: bytes,
        signature: signature.to_bytes().to_vec(),
        fields: dataset.clone(),
    }
}

/// Alfen record text signed with `key`.
pub fn alfen_text(key: &SigningKey, dataset: &AlfenDataset) -> String {
    alfen_signature(key, dataset).to_text()
}

pub fn charging_process(public: &[u8], start: &SmlSignature, end: &SmlSignature) -> String {
    format!(
        "<chargingProcess><publicKey>{}</publicKey><meterValueStart>{}</meterValueStart><meterValueEnd>{}</meterValueEnd></chargingProcess>",
        hex::encode_upper(public),
        blob_hex(start),
        blob_hex(end),
    )
}
