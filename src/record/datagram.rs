use super::{distribute, parse_all, protect, CipherPhase, CipherSlots, Framing, Record, RecordLayer};
use crate::crypto::RecordCipher;
use crate::error::{DecryptionError, Error, MalformedRecordError};
use crate::types::{ContentType, ProtocolVersion};

const MAX_SEQUENCE: u64 = 0xFFFF_FFFF_FFFF;

/// Record layer for datagram transport.
///
/// Every record carries its epoch and 48 bit sequence number. Rotating the
/// encryption cipher starts a new write epoch. Inbound records are decrypted
/// with the epoch and sequence number they carry.
pub struct DtlsRecordLayer {
    version: ProtocolVersion,
    max_record_length: usize,
    ciphers: CipherSlots,
    write_epoch: u16,
    write_seq: u64,
    read_epoch: u16,
}

impl DtlsRecordLayer {
    pub fn new(version: ProtocolVersion, max_record_length: usize) -> Self {
        DtlsRecordLayer {
            version,
            max_record_length: max_record_length.max(1),
            ciphers: CipherSlots::new(),
            write_epoch: 0,
            write_seq: 0,
            read_epoch: 0,
        }
    }

    pub fn write_epoch(&self) -> u16 {
        self.write_epoch
    }

    pub fn read_epoch(&self) -> u16 {
        self.read_epoch
    }

    pub fn write_sequence(&self) -> u64 {
        self.write_seq
    }
}

impl RecordLayer for DtlsRecordLayer {
    fn framing(&self) -> Framing {
        Framing::Datagram
    }

    fn version(&self) -> ProtocolVersion {
        self.version
    }

    fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    fn parse_records(&mut self, bytes: &[u8]) -> Result<Vec<Record>, MalformedRecordError> {
        parse_all(bytes, Framing::Datagram)
    }

    fn decrypt_record(&mut self, record: &mut Record) -> Result<(), DecryptionError> {
        if record.epoch != Some(self.read_epoch) {
            // Records of another epoch cannot be read with the installed cipher.
            warn!(
                "Record epoch {:?} differs from read epoch {}",
                record.epoch, self.read_epoch
            );
        }
        let seq = record.mac_sequence();
        trace!(
            "Decrypting {} record, epoch {:?}, seq {:?}",
            record.content_type,
            record.epoch,
            record.sequence_number
        );
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
            if self.write_seq > MAX_SEQUENCE {
                return Err(Error::CipherSetup(format!(
                    "Sequence numbers exhausted in epoch {}",
                    self.write_epoch
                )));
            }
            record.epoch = Some(self.write_epoch);
            record.sequence_number = Some(self.write_seq);
            self.write_seq += 1;

            let seq = record.mac_sequence();
            protect(record, self.ciphers.encryptor(), seq)?;

            trace!(
                "Prepared {} record, epoch {}, seq {:?}, length {}",
                record.content_type,
                self.write_epoch,
                record.sequence_number,
                record.length
            );
            record.serialize(Framing::Datagram, &mut out);
        }

        Ok(out)
    }

    fn set_record_cipher(&mut self, cipher: RecordCipher) {
        self.ciphers.stage(cipher);
    }

    fn update_encryption_cipher(&mut self) -> Result<(), Error> {
        let epoch = self
            .write_epoch
            .checked_add(1)
            .ok_or_else(|| Error::CipherSetup("Write epoch exhausted".to_string()))?;
        self.ciphers.rotate_write()?;
        self.write_epoch = epoch;
        self.write_seq = 0;
        Ok(())
    }

    fn update_decryption_cipher(&mut self) -> Result<(), Error> {
        let epoch = self
            .read_epoch
            .checked_add(1)
            .ok_or_else(|| Error::CipherSetup("Read epoch exhausted".to_string()))?;
        self.ciphers.rotate_read()?;
        self.read_epoch = epoch;
        Ok(())
    }

    fn get_fresh_record(&self) -> Record {
        Record {
            version: self.version,
            epoch: Some(self.write_epoch),
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
        debug!("Resetting datagram record layer");
        self.ciphers = CipherSlots::new();
        self.write_epoch = 0;
        self.write_seq = 0;
        self.read_epoch = 0;
    }
}
