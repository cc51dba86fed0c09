use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384};

use crate::error::Error;
use crate::types::MacAlgorithm;

/// Keyed HMAC for MAC-then-encrypt records.
#[derive(Clone)]
pub(crate) enum RecordMac {
    Sha1(Hmac<Sha1>),
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
}

impl RecordMac {
    pub fn new(algorithm: MacAlgorithm, key: &[u8]) -> Result<Self, Error> {
        let invalid = |_| Error::CipherSetup("Invalid HMAC key length".to_string());
        match algorithm {
            MacAlgorithm::HmacSha1 => Ok(RecordMac::Sha1(
                Hmac::<Sha1>::new_from_slice(key).map_err(invalid)?,
            )),
            MacAlgorithm::HmacSha256 => Ok(RecordMac::Sha256(
                Hmac::<Sha256>::new_from_slice(key).map_err(invalid)?,
            )),
            MacAlgorithm::HmacSha384 => Ok(RecordMac::Sha384(
                Hmac::<Sha384>::new_from_slice(key).map_err(invalid)?,
            )),
            other => Err(Error::CipherSetup(format!(
                "{:?} is not a record MAC",
                other
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordMac::Sha1(_) => 20,
            RecordMac::Sha256(_) => 32,
            RecordMac::Sha384(_) => 48,
        }
    }

    /// HMAC over `header || content`.
    pub fn compute(&self, header: &[u8], content: &[u8]) -> Vec<u8> {
        match self {
            RecordMac::Sha1(m) => {
                let mut m = m.clone();
                m.update(header);
                m.update(content);
                m.finalize().into_bytes().to_vec()
            }
            RecordMac::Sha256(m) => {
                let mut m = m.clone();
                m.update(header);
                m.update(content);
                m.finalize().into_bytes().to_vec()
            }
            RecordMac::Sha384(m) => {
                let mut m = m.clone();
                m.update(header);
                m.update(content);
                m.finalize().into_bytes().to_vec()
            }
        }
    }
}

impl std::fmt::Debug for RecordMac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordMac::Sha1(_) => write!(f, "RecordMac::Sha1"),
            RecordMac::Sha256(_) => write!(f, "RecordMac::Sha256"),
            RecordMac::Sha384(_) => write!(f, "RecordMac::Sha384"),
        }
    }
}
