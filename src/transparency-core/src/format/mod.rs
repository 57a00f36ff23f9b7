//! Format readers and the per-format parse / verify contract.
//!
//! Dispatch is a `match` on [`VerificationType`]; each arm pairs a reader
//! with the verifier its format uses.

pub mod alfen;
pub mod mennekes;
pub mod ocmf;
pub mod sml;

use tracing::{debug, info};

use crate::encoding::EncodingType;
use crate::error::{ValidationError, VerifyError};
use crate::law::LawConformity;
use crate::result::{ErrorMessage, IntrinsicVerified, VerificationResult};
use crate::types::VerificationType;
use crate::verified_data::{VerifiedData, VerifiedDataKind};

use self::alfen::AlfenVerifiedData;
use self::mennekes::MennekesVerifiedData;
use self::ocmf::OcmfVerifiedData;
use self::sml::{SmlSignature, SmlSignatureVerifier, SmlVerifiedData};

impl VerificationType {
    /// Whether this format's reader accepts `text`.
    ///
    /// Never fails: any reader error means "not this format".
    #[must_use]
    pub fn can_parse_data(&self, text: &str) -> bool {
        let accepted = match self {
            Self::Sml40 => sml::parse_frame_text(text).and_then(|(record, _)| {
                if record.provided_signature.is_some() {
                    Ok(())
                } else {
                    Err(ValidationError::sml("SML frame carries no signature").into())
                }
            }),
            Self::SmlSigOnly => sml::signature_only::parse(text).map(|_| ()),
            Self::Ocmf => ocmf::parse(text).map(|_| ()),
            Self::Alfen => alfen::parse(text).map(|_| ()),
            Self::Mennekes => mennekes::parse(text).map(|_| ()),
        };
        match accepted {
            Ok(()) => true,
            Err(e) => {
                debug!(format = %self, error = %e, "data not matching");
                false
            },
        }
    }

    /// Parse `text` and check its signature.
    ///
    /// `public_key` takes precedence over a key embedded in the data. With
    /// `intrinsic` set the data is parsed but no signature is checked.
    /// Failures are reported inside the result.
    #[must_use]
    pub fn parse_and_verify(
        &self,
        text: &str,
        public_key: Option<&[u8]>,
        intrinsic: IntrinsicVerified,
    ) -> VerificationResult {
        let supplied = public_key.filter(|k| !k.is_empty()).map(<[u8]>::to_vec);
        match self {
            Self::Sml40 => match sml::parse_frame_text(text) {
                Ok((record, encoding)) => {
                    verify_sml(*self, record, encoding, supplied, intrinsic)
                },
                Err(e) => VerificationResult::from_error(e.into()),
            },
            Self::SmlSigOnly => match sml::signature_only::parse(text) {
                Ok((record, encoding)) => {
                    verify_sml(*self, record, encoding, supplied, intrinsic)
                },
                Err(e) => VerificationResult::from_error(e.into()),
            },
            Self::Ocmf => match ocmf::parse(text) {
                Ok(record) => {
                    let check_record = record.clone();
                    let mut result = conclude(
                        supplied,
                        intrinsic,
                        |public_key| VerifiedData::Ocmf(OcmfVerifiedData { public_key, record }),
                        |key| check_record.verify(key),
                    );
                    let own = ocmf::verified::law_conform_records(&check_record, &check_record);
                    apply_conformity(&mut result, own);
                    result
                },
                Err(e) => VerificationResult::from_error(e.into()),
            },
            Self::Alfen => match alfen::parse(text) {
                Ok(record) => {
                    let embedded = Some(record.public_key.clone()).filter(|k| !k.is_empty());
                    let key = supplied.or(embedded);
                    let check_record = record.clone();
                    let mut result = conclude(
                        key,
                        intrinsic,
                        |public_key| VerifiedData::Alfen(AlfenVerifiedData { public_key, record }),
                        |key| check_record.verify(key),
                    );
                    if result.is_verified() {
                        for error in check_record.fields.status_errors() {
                            result.add_error(error);
                        }
                    }
                    result
                },
                Err(e) => VerificationResult::from_error(e.into()),
            },
            Self::Mennekes => match mennekes::parse(text) {
                Ok(process) => {
                    let key = supplied.or_else(|| process.public_key.clone());
                    if let Err(e) = sml::check_unit(&process.start)
                        .and_then(|()| sml::check_unit(&process.end))
                    {
                        let data = VerifiedData::Mennekes(MennekesVerifiedData {
                            public_key: key.unwrap_or_default(),
                            process,
                        });
                        return VerificationResult::unverified(
                            Some(data),
                            VerifyError::from(e).into(),
                        );
                    }
                    let check_process = process.clone();
                    let mut result = conclude(
                        key,
                        intrinsic,
                        |public_key| {
                            VerifiedData::Mennekes(MennekesVerifiedData { public_key, process })
                        },
                        |key| check_process.verify(key),
                    );
                    if let Some(VerifiedData::Mennekes(data)) = result.verified_data().cloned() {
                        apply_conformity(&mut result, data.internal_conformity());
                    }
                    result
                },
                Err(e) => VerificationResult::from_error(e.into()),
            },
        }
    }

    /// Public key embedded in `text`, if the format carries one.
    #[must_use]
    pub fn parse_public_key(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Sml40 => sml::parse_frame_text(text).ok()?.0.public_key,
            Self::SmlSigOnly => sml::signature_only::parse(text).ok()?.0.public_key,
            Self::Ocmf => None,
            Self::Alfen => alfen::parse(text).ok().map(|r| r.public_key),
            Self::Mennekes => mennekes::parse(text).ok()?.public_key,
        }
    }

    /// [`VerifiedData`] variant this format produces.
    #[must_use]
    pub const fn verified_data_kind(&self) -> VerifiedDataKind {
        match self {
            Self::Sml40 | Self::SmlSigOnly => VerifiedDataKind::Sml,
            Self::Ocmf => VerifiedDataKind::Ocmf,
            Self::Alfen => VerifiedDataKind::Alfen,
            Self::Mennekes => VerifiedDataKind::Mennekes,
        }
    }
}

fn verify_sml(
    kind: VerificationType,
    record: SmlSignature,
    encoding: EncodingType,
    supplied: Option<Vec<u8>>,
    intrinsic: IntrinsicVerified,
) -> VerificationResult {
    let key = supplied.or_else(|| record.public_key.clone());
    let unit_check = sml::check_unit(&record);
    let check_record = record.clone();

    let build = |public_key: Vec<u8>| {
        VerifiedData::Sml(SmlVerifiedData {
            verification_type: kind,
            encoding,
            public_key,
            record,
        })
    };

    if let Err(e) = unit_check {
        let data = build(key.unwrap_or_default());
        return VerificationResult::unverified(Some(data), VerifyError::from(e).into());
    }

    conclude(key, intrinsic, build, |key| {
        SmlSignatureVerifier::new().verify(key, &check_record)
    })
}

/// Build the verified data and settle the verdict.
fn conclude(
    key: Option<Vec<u8>>,
    intrinsic: IntrinsicVerified,
    build: impl FnOnce(Vec<u8>) -> VerifiedData,
    check: impl FnOnce(&[u8]) -> Result<bool, VerifyError>,
) -> VerificationResult {
    let data = build(key.clone().unwrap_or_default());
    let format = data.format();

    if intrinsic.ok() {
        info!(%format, "authenticity asserted by caller, signature not checked");
        return VerificationResult::verified(data);
    }
    let Some(key) = key else {
        return VerificationResult::unverified(Some(data), ErrorMessage::public_key_missing());
    };

    match check(&key) {
        Ok(true) => {
            info!(%format, "signature verified");
            VerificationResult::verified(data)
        },
        Ok(false) => {
            info!(%format, "signature rejected");
            VerificationResult::unverified(Some(data), ErrorMessage::verification_failed())
        },
        Err(e) => {
            debug!(%format, error = %e, "signature could not be checked");
            VerificationResult::unverified(Some(data), e.into())
        },
    }
}

/// Fold a law-conformance outcome into a result.
pub(crate) fn apply_conformity(
    result: &mut VerificationResult,
    outcome: Result<LawConformity, VerifyError>,
) {
    match outcome {
        Ok(conformity) => {
            for warning in conformity.warnings {
                result.add_warning(warning);
            }
        },
        Err(e) => result.add_error(e.into()),
    }
}
