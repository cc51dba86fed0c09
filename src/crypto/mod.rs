//! Record protection.
//!
//! A [`RecordCipher`] pairs one [`RecordEncryptor`] with one [`RecordDecryptor`].
//! The record layer installs the two halves independently, so a connection can
//! start writing under new keys before it reads under them.

mod aead;
mod cbc;
mod keying;
mod mac;
mod null;
mod prf;

pub use aead::{GcmDecryptor, GcmEncryptor};
pub use cbc::{CbcDecryptor, CbcEncryptor};
pub use keying::{DirectionKeys, KeyBlock};
pub use null::{NullDecryptor, NullEncryptor};
pub use prf::{key_expansion, master_secret, prf_tls12, transcript_hash, verify_data};

use crate::error::{DecryptionError, Error};
use crate::record::Record;
use crate::types::{BulkCipher, CipherSuite, ConnectionEnd, ProtocolVersion};

/// Protects `record.cleartext` into `record.fragment`.
///
/// `seq` is the sequence number fed into the MAC or nonce. For datagram
/// transport it is `epoch << 48 | sequence_number`.
///
/// Implementations honour the MAC and padding edits carried in
/// `record.malformation` and write the values they used back to `record.mac`,
/// `record.padding` and `record.iv`.
pub trait RecordEncryptor: Send {
    fn name(&self) -> &'static str;

    fn encrypt(&mut self, record: &mut Record, seq: u64) -> Result<(), Error>;
}

/// Removes protection from `record.fragment` into `record.cleartext`.
///
/// The error kind is the observation: bad padding and bad MAC are reported
/// separately.
pub trait RecordDecryptor: Send {
    fn name(&self) -> &'static str;

    fn decrypt(&mut self, record: &mut Record, seq: u64) -> Result<(), DecryptionError>;
}

pub struct RecordCipher {
    pub encryptor: Box<dyn RecordEncryptor>,
    pub decryptor: Box<dyn RecordDecryptor>,
}

impl RecordCipher {
    pub fn new(encryptor: Box<dyn RecordEncryptor>, decryptor: Box<dyn RecordDecryptor>) -> Self {
        RecordCipher {
            encryptor,
            decryptor,
        }
    }

    /// The plaintext phase before the first ChangeCipherSpec.
    pub fn null() -> Self {
        RecordCipher::new(Box::new(NullEncryptor), Box::new(NullDecryptor))
    }

    /// Build the cipher pair for one side of a connection.
    ///
    /// `write` keys protect what we send, `read` keys what we receive.
    pub fn from_keys(
        suite: CipherSuite,
        version: ProtocolVersion,
        write: &DirectionKeys,
        read: &DirectionKeys,
        rng_seed: Option<u64>,
    ) -> Result<Self, Error> {
        let mac = suite.mac_algorithm();
        match suite.bulk_cipher() {
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => {
                let encryptor = CbcEncryptor::new(
                    &write.enc_key,
                    mac,
                    &write.mac_key,
                    &write.iv,
                    version.uses_explicit_iv(),
                    rng_seed,
                )?;
                let decryptor = CbcDecryptor::new(
                    &read.enc_key,
                    mac,
                    &read.mac_key,
                    &read.iv,
                    version.uses_explicit_iv(),
                )?;
                Ok(RecordCipher::new(Box::new(encryptor), Box::new(decryptor)))
            }
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => {
                let encryptor = GcmEncryptor::new(&write.enc_key, &write.iv)?;
                let decryptor = GcmDecryptor::new(&read.enc_key, &read.iv)?;
                Ok(RecordCipher::new(Box::new(encryptor), Box::new(decryptor)))
            }
            other => Err(Error::CipherSetup(format!(
                "No record cipher for {} ({:?})",
                suite, other
            ))),
        }
    }

    /// Build the cipher pair from an expanded key block.
    pub fn from_key_block(
        suite: CipherSuite,
        version: ProtocolVersion,
        end: ConnectionEnd,
        block: &KeyBlock,
        rng_seed: Option<u64>,
    ) -> Result<Self, Error> {
        let (write, read) = match end {
            ConnectionEnd::Client => (&block.client, &block.server),
            ConnectionEnd::Server => (&block.server, &block.client),
        };
        debug!(
            "Record cipher for {} ({}, {:?})",
            suite, version, end
        );
        Self::from_keys(suite, version, write, read, rng_seed)
    }
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher")
            .field("encryptor", &self.encryptor.name())
            .field("decryptor", &self.decryptor.name())
            .finish()
    }
}

/// The 13 byte pseudo header both the MAC and the AEAD additional data cover.
pub(crate) fn record_header(
    seq: u64,
    record: &Record,
    length: usize,
) -> [u8; 13] {
    let mut header = [0u8; 13];
    header[..8].copy_from_slice(&seq.to_be_bytes());
    header[8] = record.content_type.as_u8();
    header[9..11].copy_from_slice(&record.version.as_u16().to_be_bytes());
    header[11..].copy_from_slice(&(length as u16).to_be_bytes());
    header
}
