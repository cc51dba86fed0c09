use crate::error::{DecryptionError, Error};
use crate::record::Record;

/// Identity transform used before any keys are installed.
#[derive(Debug, Default)]
pub struct NullEncryptor;

#[derive(Debug, Default)]
pub struct NullDecryptor;

impl super::RecordEncryptor for NullEncryptor {
    fn name(&self) -> &'static str {
        "NULL"
    }

    fn encrypt(&mut self, record: &mut Record, _seq: u64) -> Result<(), Error> {
        record.fragment = record.cleartext.clone();
        record.mac = None;
        record.padding = None;
        record.iv = None;
        Ok(())
    }
}

impl super::RecordDecryptor for NullDecryptor {
    fn name(&self) -> &'static str {
        "NULL"
    }

    fn decrypt(&mut self, record: &mut Record, _seq: u64) -> Result<(), DecryptionError> {
        record.cleartext = record.fragment.clone();
        Ok(())
    }
}
