use super::{distribute, parse_all, protect, CipherPhase, CipherSlots, Framing, Record, RecordLayer};
use crate::crypto::RecordCipher;
use crate::error::{DecryptionError, Error, MalformedRecordError};
use crate::types::{ContentType, ProtocolVersion};

/// Record layer for stream transport.
///
/// Sequence numbers are implicit: one counter per direction, starting at zero
/// and reset whenever that direction's cipher rotates.
pub struct TlsRecordLayer {
    version: ProtocolVersion,
    max_record_length: usize,
    ciphers: CipherSlots,
    write_seq: u64,
    read_seq: u64,
}

impl TlsRecordLayer {
    pub fn new(version: ProtocolVersion, max_record_length: usize) -> Self {
        TlsRecordLayer {
            version,
            max_record_length: max_record_length.max(1),
            ciphers: CipherSlots::new(),
            write_seq: 0,
            read_seq: 0,
        }
    }

    pub fn write_sequence(&self) -> u64 {
        self.write_seq
    }

    pub fn read_sequence(&self) -> u64 {
        self.read_seq
    }
}

impl RecordLayer for TlsRecordLayer {
    fn framing(&self) -> Framing {
        Framing::Stream
    }

    fn version(&self) -> ProtocolVersion {
        self.version
    }

    fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    fn parse_records(&mut self, bytes: &[u8]) -> Result<Vec<Record>, MalformedRecordError> {
        parse_all(bytes, Framing::Stream)
    }

    fn decrypt_record(&mut self, record: &mut Record) -> Result<(), DecryptionError> {
        let seq = self.read_seq;
        self.read_seq += 1;
        record.sequence_number = Some(seq);
        trace!("Decrypting {} record, seq {}", record.content_type, seq);
        self.ciphers.decryptor().decrypt(record, seq)
    }

    fn prepare_records(
        &mut self,
        data: &[u8],
        content_type: ContentType,
        records: &mut Vec<Record>,
    ) -> Result<Vec<u8>, Error> {
        let fresh = self.get_fresh_record();
        distribute(data, content_type, records, self.max_record_length, || {
            fresh.clone()
        });

        let mut out = Vec::new();
        for record in records.iter_mut() {
            let seq = self.write_seq;
            record.sequence_number = Some(seq);
            protect(record, self.ciphers.encryptor(), seq)?;
            self.write_seq += 1;

            trace!(
                "Prepared {} record, seq {}, length {}",
                record.content_type,
                seq,
                record.length
            );
            record.serialize(Framing::Stream, &mut out);
        }

        Ok(out)
    }

    fn set_record_cipher(&mut self, cipher: RecordCipher) {
        self.ciphers.stage(cipher);
    }

    fn update_encryption_cipher(&mut self) -> Result<(), Error> {
        self.ciphers.rotate_write()?;
        self.write_seq = 0;
        Ok(())
    }

    fn update_decryption_cipher(&mut self) -> Result<(), Error> {
        self.ciphers.rotate_read()?;
        self.read_seq = 0;
        Ok(())
    }

    fn get_fresh_record(&self) -> Record {
        Record {
            version: self.version,
            ..Default::default()
        }
    }

    fn encryption_phase(&self) -> CipherPhase {
        self.ciphers.write_phase()
    }

    fn decryption_phase(&self) -> CipherPhase {
        self.ciphers.read_phase()
    }

    fn reset(&mut self) {
        debug!("Resetting stream record layer");
        self.ciphers = CipherSlots::new();
        self.write_seq = 0;
        self.read_seq = 0;
    }
}
