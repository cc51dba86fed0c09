//! Record model and record layers.
//!
//! [`TlsRecordLayer`] frames records for stream transport with the 5 byte
//! header. [`DtlsRecordLayer`] frames them for datagram transport with the 13
//! byte header carrying epoch and explicit sequence number.

use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use crate::crypto::{RecordCipher, RecordDecryptor, RecordEncryptor};
use crate::error::{DecryptionError, Error, MalformedRecordError, PreparationError};
use crate::types::{ContentType, ProtocolVersion};
use crate::util::{be_u48, put_u48};

mod datagram;
mod malformation;
mod stream;

pub use datagram::DtlsRecordLayer;
pub use malformation::{ByteEdit, LengthEdit, Malformation, PaddingEdit, Position};
pub use stream::TlsRecordLayer;

/// Largest plaintext fragment, 2^14.
pub const MAX_RECORD_LENGTH: usize = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    Stream,
    Datagram,
}

impl Framing {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version.is_dtls() {
            Framing::Datagram
        } else {
            Framing::Stream
        }
    }

    pub fn header_len(&self) -> usize {
        match self {
            // content_type(1) + version(2) + length(2)
            Framing::Stream => 5,
            // content_type(1) + version(2) + epoch(2) + seq(6) + length(2)
            Framing::Datagram => 13,
        }
    }
}

/// One record, inbound or outbound.
///
/// `fragment` is what travels on the wire, `cleartext` what it protects. The
/// remaining crypto fields are filled in by the record cipher as it works, so
/// a caller can see exactly which MAC, padding and IV went out or came in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    /// Datagram only.
    pub epoch: Option<u16>,
    /// Explicit for datagram, the implicit counter value for stream.
    pub sequence_number: Option<u64>,
    /// The length field as declared in the header.
    pub length: u16,
    pub fragment: Vec<u8>,
    pub cleartext: Vec<u8>,
    pub mac: Option<Vec<u8>>,
    pub padding: Option<Vec<u8>>,
    /// Explicit IV or nonce at the front of `fragment`.
    pub iv: Option<Vec<u8>>,
    /// Overrides the layer's maximum for this record.
    pub max_record_length: Option<usize>,
    pub malformation: Malformation,
}

impl Record {
    pub fn parse(input: &[u8], framing: Framing) -> IResult<&[u8], Record> {
        let (input, content_type) = ContentType::parse(input)?;
        let (input, version) = ProtocolVersion::parse(input)?;

        let (input, epoch, sequence_number) = match framing {
            Framing::Stream => (input, None, None),
            Framing::Datagram => {
                let (input, epoch) = be_u16(input)?;
                let (input, seq) = be_u48(input)?;
                (input, Some(epoch), Some(seq))
            }
        };

        let (input, length) = be_u16(input)?;
        let (rest, fragment) = take(length as usize)(input)?;

        Ok((
            rest,
            Record {
                content_type,
                version,
                epoch,
                sequence_number,
                length,
                fragment: fragment.to_vec(),
                ..Default::default()
            },
        ))
    }

    pub fn serialize(&self, framing: Framing, output: &mut Vec<u8>) {
        self.content_type.serialize(output);
        self.version.serialize(output);
        if framing == Framing::Datagram {
            output.extend_from_slice(&self.epoch.unwrap_or(0).to_be_bytes());
            put_u48(output, self.sequence_number.unwrap_or(0));
        }
        output.extend_from_slice(&self.length.to_be_bytes());
        output.extend_from_slice(&self.fragment);
    }

    /// Sequence number as covered by MAC and AEAD nonce.
    pub fn mac_sequence(&self) -> u64 {
        let seq = self.sequence_number.unwrap_or(0);
        match self.epoch {
            Some(epoch) => ((epoch as u64) << 48) | (seq & 0xFFFF_FFFF_FFFF),
            None => seq,
        }
    }
}

/// Cipher state of one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherPhase {
    Plaintext,
    /// Keyed with the n-th installed cipher.
    Keyed(u32),
}

impl CipherPhase {
    fn next(self) -> Self {
        match self {
            CipherPhase::Plaintext => CipherPhase::Keyed(1),
            CipherPhase::Keyed(n) => CipherPhase::Keyed(n + 1),
        }
    }
}

/// Framing boundary between messages and the wire.
pub trait RecordLayer {
    fn framing(&self) -> Framing;

    fn version(&self) -> ProtocolVersion;

    fn set_version(&mut self, version: ProtocolVersion);

    /// Split raw bytes into records.
    ///
    /// On failure the records parsed so far and the bytes that could not be
    /// consumed are returned in the error.
    fn parse_records(&mut self, bytes: &[u8]) -> Result<Vec<Record>, MalformedRecordError>;

    /// Replace `record.fragment` by its cleartext in `record.cleartext`, using
    /// the installed decryption cipher.
    fn decrypt_record(&mut self, record: &mut Record) -> Result<(), DecryptionError>;

    /// Frame and protect `data`.
    ///
    /// Records in `records` are used first, in order. Fresh records are
    /// appended for whatever data remains. Empty data still yields one
    /// record. On return `records` holds every record that went out.
    fn prepare_records(
        &mut self,
        data: &[u8],
        content_type: ContentType,
        records: &mut Vec<Record>,
    ) -> Result<Vec<u8>, Error>;

    /// Stage a cipher. Neither direction uses it until rotated.
    fn set_record_cipher(&mut self, cipher: RecordCipher);

    /// Start protecting outbound records with the staged encryptor.
    fn update_encryption_cipher(&mut self) -> Result<(), Error>;

    /// Start reading inbound records with the staged decryptor.
    fn update_decryption_cipher(&mut self) -> Result<(), Error>;

    fn get_fresh_record(&self) -> Record;

    fn encryption_phase(&self) -> CipherPhase;

    fn decryption_phase(&self) -> CipherPhase;

    /// Back to plaintext in both directions with fresh counters.
    fn reset(&mut self);
}

/// Installed and staged ciphers for both directions.
pub(crate) struct CipherSlots {
    encryptor: Box<dyn RecordEncryptor>,
    decryptor: Box<dyn RecordDecryptor>,
    pending_encryptor: Option<Box<dyn RecordEncryptor>>,
    pending_decryptor: Option<Box<dyn RecordDecryptor>>,
    write_phase: CipherPhase,
    read_phase: CipherPhase,
}

impl CipherSlots {
    pub fn new() -> Self {
        let null = RecordCipher::null();
        CipherSlots {
            encryptor: null.encryptor,
            decryptor: null.decryptor,
            pending_encryptor: None,
            pending_decryptor: None,
            write_phase: CipherPhase::Plaintext,
            read_phase: CipherPhase::Plaintext,
        }
    }

    pub fn stage(&mut self, cipher: RecordCipher) {
        debug!("Staging record cipher {:?}", cipher);
        self.pending_encryptor = Some(cipher.encryptor);
        self.pending_decryptor = Some(cipher.decryptor);
    }

    pub fn rotate_write(&mut self) -> Result<(), Error> {
        let encryptor = self.pending_encryptor.take().ok_or(Error::NoPendingCipher)?;
        self.encryptor = encryptor;
        self.write_phase = self.write_phase.next();
        debug!(
            "Encryption cipher now {} ({:?})",
            self.encryptor.name(),
            self.write_phase
        );
        Ok(())
    }

    pub fn rotate_read(&mut self) -> Result<(), Error> {
        let decryptor = self.pending_decryptor.take().ok_or(Error::NoPendingCipher)?;
        self.decryptor = decryptor;
        self.read_phase = self.read_phase.next();
        debug!(
            "Decryption cipher now {} ({:?})",
            self.decryptor.name(),
            self.read_phase
        );
        Ok(())
    }

    pub fn encryptor(&mut self) -> &mut dyn RecordEncryptor {
        self.encryptor.as_mut()
    }

    pub fn decryptor(&mut self) -> &mut dyn RecordDecryptor {
        self.decryptor.as_mut()
    }

    pub fn write_phase(&self) -> CipherPhase {
        self.write_phase
    }

    pub fn read_phase(&self) -> CipherPhase {
        self.read_phase
    }
}

/// Split `bytes` into records, keeping the parsed prefix on failure.
pub(crate) fn parse_all(bytes: &[u8], framing: Framing) -> Result<Vec<Record>, MalformedRecordError> {
    let mut records = Vec::new();
    let mut input = bytes;

    while !input.is_empty() {
        match Record::parse(input, framing) {
            Ok((rest, record)) => {
                trace!(
                    "Parsed {} record, length {}",
                    record.content_type,
                    record.length
                );
                records.push(record);
                input = rest;
            }
            Err(_) => {
                let reason = if input.len() < framing.header_len() {
                    format!("{} bytes is too short for a record header", input.len())
                } else {
                    "declared length exceeds remaining bytes".to_string()
                };
                debug!("Malformed record: {}", reason);
                return Err(MalformedRecordError {
                    reason,
                    parsed: records,
                    excess: input.to_vec(),
                });
            }
        }
    }

    Ok(records)
}

/// Hand out `data` over `records`, appending fresh records as needed.
pub(crate) fn distribute(
    data: &[u8],
    content_type: ContentType,
    records: &mut Vec<Record>,
    max_record_length: usize,
    fresh: impl Fn() -> Record,
) {
    let mut offset = 0;

    for record in records.iter_mut() {
        let max = record.max_record_length.unwrap_or(max_record_length);
        let end = (offset + max).min(data.len());
        record.cleartext = data[offset..end].to_vec();
        record.content_type = content_type;
        offset = end;
    }

    while offset < data.len() || records.is_empty() {
        let mut record = fresh();
        let end = (offset + max_record_length).min(data.len());
        record.cleartext = data[offset..end].to_vec();
        record.content_type = content_type;
        offset = end;
        records.push(record);
    }
}

/// Encrypt, then apply ciphertext and length edits.
pub(crate) fn protect(
    record: &mut Record,
    encryptor: &mut dyn RecordEncryptor,
    seq: u64,
) -> Result<(), Error> {
    encryptor.encrypt(record, seq)?;

    if let Some(edit) = &record.malformation.ciphertext {
        let prefix = record
            .iv
            .as_ref()
            .map(|iv| iv.len())
            .unwrap_or(0)
            .min(record.fragment.len());
        let mut body = record.fragment[prefix..].to_vec();
        edit.apply(&mut body, "ciphertext")?;
        record.fragment.truncate(prefix);
        record.fragment.extend_from_slice(&body);
    }

    let actual = record.fragment.len();
    if actual > u16::MAX as usize {
        return Err(PreparationError::new(
            "length",
            format!("record fragment of {} bytes", actual),
        )
        .into());
    }

    record.length = match &record.malformation.declared_length {
        Some(edit) => edit.apply(actual),
        None => actual as u16,
    };

    Ok(())
}
