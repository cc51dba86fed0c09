//! AES-GCM records (RFC 5288).
//!
//! ```text
//! nonce    = salt(4) || explicit_nonce(8)
//! fragment = explicit_nonce(8) || ciphertext || tag(16)
//! aad      = seq(8) || type(1) || version(2) || plaintext_length(2)
//! ```

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Key, Nonce};

use super::record_header;
use crate::error::{DecryptionError, Error};
use crate::record::Record;

/// Explicit nonce carried in front of every record.
pub(crate) const EXPLICIT_NONCE_LEN: usize = 8;

pub(crate) const GCM_TAG_LEN: usize = 16;

enum AesGcm {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl AesGcm {
    fn new(key: &[u8]) -> Result<Self, Error> {
        match key.len() {
            16 => {
                let key = Key::<Aes128Gcm>::from_slice(key);
                Ok(AesGcm::Aes128(Box::new(Aes128Gcm::new(key))))
            }
            32 => {
                let key = Key::<Aes256Gcm>::from_slice(key);
                Ok(AesGcm::Aes256(Box::new(Aes256Gcm::new(key))))
            }
            n => Err(Error::CipherSetup(format!(
                "Invalid key size for AES-GCM: {}",
                n
            ))),
        }
    }

    fn seal(&self, nonce: &[u8; 12], aad: &[u8], data: &mut Vec<u8>) -> Result<(), Error> {
        let nonce = Nonce::from_slice(nonce);
        let result = match self {
            AesGcm::Aes128(c) => c.encrypt_in_place(nonce, aad, data),
            AesGcm::Aes256(c) => c.encrypt_in_place(nonce, aad, data),
        };
        result.map_err(|_| Error::CipherSetup("AES-GCM encryption failed".to_string()))
    }

    fn open(&self, nonce: &[u8; 12], aad: &[u8], data: &mut Vec<u8>) -> Result<(), DecryptionError> {
        let nonce = Nonce::from_slice(nonce);
        let result = match self {
            AesGcm::Aes128(c) => c.decrypt_in_place(nonce, aad, data),
            AesGcm::Aes256(c) => c.decrypt_in_place(nonce, aad, data),
        };
        result.map_err(|_| DecryptionError::BadTag)
    }
}

fn salt(iv: &[u8]) -> Result<[u8; 4], Error> {
    iv.try_into()
        .map_err(|_| Error::CipherSetup(format!("Invalid AES-GCM salt length {}", iv.len())))
}

fn nonce(salt: &[u8; 4], explicit: &[u8]) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..4].copy_from_slice(salt);
    nonce[4..].copy_from_slice(explicit);
    nonce
}

pub struct GcmEncryptor {
    cipher: AesGcm,
    salt: [u8; 4],
}

impl GcmEncryptor {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, Error> {
        Ok(GcmEncryptor {
            cipher: AesGcm::new(key)?,
            salt: salt(iv)?,
        })
    }
}

impl super::RecordEncryptor for GcmEncryptor {
    fn name(&self) -> &'static str {
        "AES-GCM"
    }

    fn encrypt(&mut self, record: &mut Record, seq: u64) -> Result<(), Error> {
        let explicit: [u8; EXPLICIT_NONCE_LEN] = match record.iv.as_deref() {
            Some(iv) if iv.len() == EXPLICIT_NONCE_LEN => {
                let mut out = [0u8; EXPLICIT_NONCE_LEN];
                out.copy_from_slice(iv);
                out
            }
            _ => seq.to_be_bytes(),
        };

        let aad = record_header(seq, record, record.cleartext.len());
        let mut data = record.cleartext.clone();
        self.cipher
            .seal(&nonce(&self.salt, &explicit), &aad, &mut data)?;

        record.iv = Some(explicit.to_vec());
        record.fragment.clear();
        record.fragment.extend_from_slice(&explicit);
        record.fragment.extend_from_slice(&data);
        record.mac = None;
        record.padding = None;

        Ok(())
    }
}

pub struct GcmDecryptor {
    cipher: AesGcm,
    salt: [u8; 4],
}

impl GcmDecryptor {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, Error> {
        Ok(GcmDecryptor {
            cipher: AesGcm::new(key)?,
            salt: salt(iv)?,
        })
    }
}

impl super::RecordDecryptor for GcmDecryptor {
    fn name(&self) -> &'static str {
        "AES-GCM"
    }

    fn decrypt(&mut self, record: &mut Record, seq: u64) -> Result<(), DecryptionError> {
        let len = record.fragment.len();
        if len < EXPLICIT_NONCE_LEN + GCM_TAG_LEN {
            return Err(DecryptionError::BadLength { len });
        }

        let explicit = &record.fragment[..EXPLICIT_NONCE_LEN];
        let nonce = nonce(&self.salt, explicit);
        let plaintext_len = len - EXPLICIT_NONCE_LEN - GCM_TAG_LEN;
        let aad = record_header(seq, record, plaintext_len);

        let mut data = record.fragment[EXPLICIT_NONCE_LEN..].to_vec();
        record.iv = Some(explicit.to_vec());
        self.cipher.open(&nonce, &aad, &mut data)?;

        record.cleartext = data;
        Ok(())
    }
}
