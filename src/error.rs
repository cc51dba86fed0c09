use std::io;

use thiserror::Error;

use crate::record::Record;

/// Errors surfaced by the crate.
///
/// Configuration and preparation failures abort the current session. Decryption
/// and malformed-record failures are observations: the receive path collects them
/// rather than tearing the connection down.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),

    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    #[error(transparent)]
    Preparation(#[from] PreparationError),

    #[error("No pending cipher to install")]
    NoPendingCipher,

    #[error("Record cipher setup failed: {0}")]
    CipherSetup(String),

    #[error("Transport error: {0}")]
    Io(#[from] io::Error),
}

/// Invalid or contradictory session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        ConfigurationError {
            message: message.into(),
        }
    }
}

/// Inbound bytes could not be split into records.
///
/// Everything parsed before the failure is kept in `parsed`, and the bytes
/// that could not be consumed are kept in `excess`.
#[derive(Debug, Clone, Error)]
#[error("Malformed record: {reason} ({} parsed, {} excess bytes)", .parsed.len(), .excess.len())]
pub struct MalformedRecordError {
    pub reason: String,
    pub parsed: Vec<Record>,
    pub excess: Vec<u8>,
}

/// How removing record protection failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DecryptionError {
    #[error("Bad padding")]
    BadPadding,

    #[error("Bad record MAC")]
    BadMac,

    #[error("Bad AEAD tag")]
    BadTag,

    #[error("Bad ciphertext length {len}")]
    BadLength { len: usize },

    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

/// A structural field could not be computed for an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to prepare {field}: {reason}")]
pub struct PreparationError {
    pub field: &'static str,
    pub reason: String,
}

impl PreparationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        PreparationError {
            field,
            reason: reason.into(),
        }
    }
}
