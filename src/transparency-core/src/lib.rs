//! # transparency-core
//!
//! Verification of signed electricity-meter values from charge points.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  VerificationEngine                          │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │          VerificationRegistry                     │      │
//! │  │   (ordered probing: EDL_40_P, EDL_40_SIG, OCMF,   │      │
//! │  │    ALFEN, EDL_40_MENNEKES)                        │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
//! │  │ SML reader   │  │ OCMF reader  │  │ Alfen reader │      │
//! │  │ (TL, CRC16)  │  │ (JSON)       │  │ (base32)     │      │
//! │  └──────────────┘  └──────────────┘  └──────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │       ECDSA verifiers (transparency-crypto)       │      │
//! │  │     P-192 with P-256 fallback, P-256 DER / raw    │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │   VerifiedData + law conformance (start / stop)   │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **No panics on input**: every data problem ends up in a
//!   [`VerificationResult`]
//! - **Detection never fails**: a payload either matches a format or yields
//!   one DECODING error
//! - **Rejection is not an error**: a signature that does not match is a
//!   VERIFICATION error, malformed keys or signatures are VALIDATION errors

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod format;
pub mod keys;
pub mod law;
pub mod registry;
pub mod report;
pub mod result;
pub mod types;
pub mod verified_data;

pub use config::EngineConfig;
pub use encoding::EncodingType;
pub use engine::VerificationEngine;
pub use error::{
    BillingAdapterError, DecodingError, RegulationLawError, ValidationError, VerifyError,
};
pub use format::mennekes::{convert_billing, SignedValue};
pub use keys::decode_public_key_text;
pub use law::LawConformity;
pub use registry::VerificationRegistry;
pub use report::TransactionReport;
pub use result::{ErrorMessage, ErrorType, IntrinsicVerified, VerificationResult, Warning};
pub use types::{Meter, MeterRole, VerificationType};
pub use verified_data::{Detail, VerifiedData, VerifiedDataKind};
