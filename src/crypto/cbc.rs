//! AES-CBC with HMAC, MAC-then-encrypt.
//!
//! Wire layout for TLS 1.1+ and DTLS:
//!
//! ```text
//! explicit_iv(16) || AES-CBC(cleartext || mac || padding)
//! ```
//!
//! TLS 1.0 has no explicit IV. The last ciphertext block of the previous record
//! chains into the next one.

use aes_gcm::aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes_gcm::aes::{Aes128, Aes256, Block};

use super::mac::RecordMac;
use super::record_header;
use crate::error::{DecryptionError, Error, PreparationError};
use crate::record::{PaddingEdit, Record};
use crate::rng::SeededRng;
use crate::types::MacAlgorithm;

const BLOCK_LEN: usize = 16;

/// Largest padding a single length byte can describe.
const MAX_PADDING_LEN: usize = 256;

enum AesBlock {
    Aes128(Box<Aes128>),
    Aes256(Box<Aes256>),
}

impl AesBlock {
    fn new(key: &[u8]) -> Result<Self, Error> {
        let invalid = |_| Error::CipherSetup("Invalid AES key".to_string());
        match key.len() {
            16 => Ok(AesBlock::Aes128(Box::new(
                Aes128::new_from_slice(key).map_err(invalid)?,
            ))),
            32 => Ok(AesBlock::Aes256(Box::new(
                Aes256::new_from_slice(key).map_err(invalid)?,
            ))),
            n => Err(Error::CipherSetup(format!(
                "Invalid key size for AES-CBC: {}",
                n
            ))),
        }
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            AesBlock::Aes128(c) => c.encrypt_block(block),
            AesBlock::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut Block) {
        match self {
            AesBlock::Aes128(c) => c.decrypt_block(block),
            AesBlock::Aes256(c) => c.decrypt_block(block),
        }
    }

    /// `data` must be block aligned.
    fn cbc_encrypt(&self, iv: &[u8; BLOCK_LEN], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut prev = *iv;

        for chunk in data.chunks_exact(BLOCK_LEN) {
            let mut block = Block::default();
            for i in 0..BLOCK_LEN {
                block[i] = chunk[i] ^ prev[i];
            }
            self.encrypt_block(&mut block);
            prev.copy_from_slice(&block);
            out.extend_from_slice(&block);
        }

        out
    }

    /// `data` must be block aligned.
    fn cbc_decrypt(&self, iv: &[u8; BLOCK_LEN], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut prev = *iv;

        for chunk in data.chunks_exact(BLOCK_LEN) {
            let mut block = Block::clone_from_slice(chunk);
            self.decrypt_block(&mut block);
            for i in 0..BLOCK_LEN {
                out.push(block[i] ^ prev[i]);
            }
            prev.copy_from_slice(chunk);
        }

        out
    }
}

enum IvMode {
    Explicit,
    Chained([u8; BLOCK_LEN]),
}

impl IvMode {
    fn new(explicit: bool, fixed_iv: &[u8]) -> Result<Self, Error> {
        if explicit {
            return Ok(IvMode::Explicit);
        }
        let iv: [u8; BLOCK_LEN] = fixed_iv
            .try_into()
            .map_err(|_| Error::CipherSetup(format!("Invalid CBC IV length {}", fixed_iv.len())))?;
        Ok(IvMode::Chained(iv))
    }
}

pub struct CbcEncryptor {
    block: AesBlock,
    mac: RecordMac,
    iv_mode: IvMode,
    rng: SeededRng,
}

impl CbcEncryptor {
    pub fn new(
        key: &[u8],
        mac: MacAlgorithm,
        mac_key: &[u8],
        fixed_iv: &[u8],
        explicit_iv: bool,
        rng_seed: Option<u64>,
    ) -> Result<Self, Error> {
        Ok(CbcEncryptor {
            block: AesBlock::new(key)?,
            mac: RecordMac::new(mac, mac_key)?,
            iv_mode: IvMode::new(explicit_iv, fixed_iv)?,
            rng: SeededRng::new(rng_seed),
        })
    }

    fn next_iv(&mut self, record: &mut Record) -> [u8; BLOCK_LEN] {
        match self.iv_mode {
            IvMode::Explicit => {
                // A record shell that already carries an IV keeps it, so a
                // replayed template encrypts to the same blocks.
                let iv = match record.iv.as_deref() {
                    Some(iv) if iv.len() == BLOCK_LEN => {
                        let mut out = [0u8; BLOCK_LEN];
                        out.copy_from_slice(iv);
                        out
                    }
                    _ => {
                        let mut out = [0u8; BLOCK_LEN];
                        self.rng.fill(&mut out);
                        out
                    }
                };
                record.iv = Some(iv.to_vec());
                iv
            }
            IvMode::Chained(prev) => {
                record.iv = None;
                prev
            }
        }
    }
}

impl super::RecordEncryptor for CbcEncryptor {
    fn name(&self) -> &'static str {
        "AES-CBC"
    }

    fn encrypt(&mut self, record: &mut Record, seq: u64) -> Result<(), Error> {
        let header = record_header(seq, record, record.cleartext.len());
        let mut mac = self.mac.compute(&header, &record.cleartext);

        if let Some(edit) = &record.malformation.mac {
            edit.apply(&mut mac, "mac")?;
        }

        let padding = build_padding(
            record.cleartext.len() + mac.len(),
            record.malformation.padding.as_ref(),
        )?;

        let mut data = Vec::with_capacity(record.cleartext.len() + mac.len() + padding.len());
        data.extend_from_slice(&record.cleartext);
        data.extend_from_slice(&mac);
        data.extend_from_slice(&padding);

        if data.is_empty() || data.len() % BLOCK_LEN != 0 {
            return Err(PreparationError::new(
                "padding",
                format!("{} bytes of CBC input is not block aligned", data.len()),
            )
            .into());
        }

        let iv = self.next_iv(record);
        let ciphertext = self.block.cbc_encrypt(&iv, &data);

        if let IvMode::Chained(prev) = &mut self.iv_mode {
            prev.copy_from_slice(&ciphertext[ciphertext.len() - BLOCK_LEN..]);
        }

        record.fragment.clear();
        if let Some(iv) = &record.iv {
            record.fragment.extend_from_slice(iv);
        }
        record.fragment.extend_from_slice(&ciphertext);
        record.mac = Some(mac);
        record.padding = Some(padding);

        Ok(())
    }
}

pub struct CbcDecryptor {
    block: AesBlock,
    mac: RecordMac,
    iv_mode: IvMode,
}

impl CbcDecryptor {
    pub fn new(
        key: &[u8],
        mac: MacAlgorithm,
        mac_key: &[u8],
        fixed_iv: &[u8],
        explicit_iv: bool,
    ) -> Result<Self, Error> {
        Ok(CbcDecryptor {
            block: AesBlock::new(key)?,
            mac: RecordMac::new(mac, mac_key)?,
            iv_mode: IvMode::new(explicit_iv, fixed_iv)?,
        })
    }
}

impl super::RecordDecryptor for CbcDecryptor {
    fn name(&self) -> &'static str {
        "AES-CBC"
    }

    fn decrypt(&mut self, record: &mut Record, seq: u64) -> Result<(), DecryptionError> {
        let len = record.fragment.len();
        let (iv, ciphertext) = match self.iv_mode {
            IvMode::Explicit => {
                if len < 2 * BLOCK_LEN || len % BLOCK_LEN != 0 {
                    return Err(DecryptionError::BadLength { len });
                }
                let mut iv = [0u8; BLOCK_LEN];
                iv.copy_from_slice(&record.fragment[..BLOCK_LEN]);
                record.iv = Some(iv.to_vec());
                (iv, &record.fragment[BLOCK_LEN..])
            }
            IvMode::Chained(prev) => {
                if len < BLOCK_LEN || len % BLOCK_LEN != 0 {
                    return Err(DecryptionError::BadLength { len });
                }
                (prev, &record.fragment[..])
            }
        };

        let mut data = self.block.cbc_decrypt(&iv, ciphertext);

        if let IvMode::Chained(prev) = &mut self.iv_mode {
            prev.copy_from_slice(&record.fragment[len - BLOCK_LEN..]);
        }

        // Non-empty: the length checks above guarantee at least one block.
        let pad_len = data[data.len() - 1] as usize;
        if pad_len + 1 > data.len() {
            trace!("Padding length {} exceeds record", pad_len);
            return Err(DecryptionError::BadPadding);
        }

        let split = data.len() - pad_len - 1;
        if data[split..].iter().any(|b| *b as usize != pad_len) {
            trace!("Padding bytes inconsistent with length {}", pad_len);
            return Err(DecryptionError::BadPadding);
        }
        let padding = data.split_off(split);

        if data.len() < self.mac.len() {
            return Err(DecryptionError::BadMac);
        }
        let received_mac = data.split_off(data.len() - self.mac.len());

        let header = record_header(seq, record, data.len());
        let expected = self.mac.compute(&header, &data);

        record.padding = Some(padding);
        record.mac = Some(received_mac.clone());

        if expected != received_mac {
            return Err(DecryptionError::BadMac);
        }

        record.cleartext = data;
        Ok(())
    }
}

/// CBC padding for `content_len` bytes of cleartext plus MAC.
///
/// Without an edit this is the shortest valid padding: `p + 1` bytes of value
/// `p`, bringing the total to a multiple of the block size.
pub(crate) fn build_padding(
    content_len: usize,
    edit: Option<&PaddingEdit>,
) -> Result<Vec<u8>, PreparationError> {
    let p = (BLOCK_LEN - (content_len + 1) % BLOCK_LEN) % BLOCK_LEN;

    let extended = |extra_blocks: usize| -> Result<Vec<u8>, PreparationError> {
        let total = p + 1 + extra_blocks * BLOCK_LEN;
        if total > MAX_PADDING_LEN {
            return Err(PreparationError::new(
                "padding",
                format!("{} padding bytes exceed {}", total, MAX_PADDING_LEN),
            ));
        }
        Ok(vec![(total - 1) as u8; total])
    };

    match edit {
        None => extended(0),
        Some(PaddingEdit::Extend { extra_blocks }) => extended(*extra_blocks),
        Some(PaddingEdit::Xor {
            extra_blocks,
            position,
            mask,
        }) => {
            let mut padding = extended(*extra_blocks)?;
            let index = position.resolve(padding.len()).ok_or_else(|| {
                PreparationError::new(
                    "padding",
                    format!("{:?} outside {} padding bytes", position, padding.len()),
                )
            })?;
            padding[index] ^= mask;
            Ok(padding)
        }
        Some(PaddingEdit::Fill(value)) => Ok(vec![*value; p + 1]),
        Some(PaddingEdit::Explicit(bytes)) => Ok(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{RecordDecryptor, RecordEncryptor};
    use crate::record::{ByteEdit, Position};
    use crate::types::{ContentType, ProtocolVersion};

    const KEY: [u8; 16] = [0x11; 16];
    const MAC_KEY: [u8; 20] = [0x22; 20];

    fn pair(explicit: bool) -> (CbcEncryptor, CbcDecryptor) {
        let iv = [0x33u8; 16];
        (
            CbcEncryptor::new(&KEY, MacAlgorithm::HmacSha1, &MAC_KEY, &iv, explicit, Some(1))
                .unwrap(),
            CbcDecryptor::new(&KEY, MacAlgorithm::HmacSha1, &MAC_KEY, &iv, explicit).unwrap(),
        )
    }

    fn record(version: ProtocolVersion, cleartext: &[u8]) -> Record {
        Record {
            content_type: ContentType::ApplicationData,
            version,
            cleartext: cleartext.to_vec(),
            ..Default::default()
        }
    }

    fn roundtrip(version: ProtocolVersion, mut sent: Record) -> Result<Record, DecryptionError> {
        let (mut enc, mut dec) = pair(version.uses_explicit_iv());
        enc.encrypt(&mut sent, 5).unwrap();
        let mut received = record(version, &[]);
        received.fragment = sent.fragment.clone();
        dec.decrypt(&mut received, 5).map(|_| received)
    }

    #[test]
    fn padding_lengths() {
        // 20 bytes content -> 12 padding bytes of value 11.
        assert_eq!(build_padding(20, None).unwrap(), vec![11u8; 12]);
        // 15 bytes content -> a single 0x00.
        assert_eq!(build_padding(15, None).unwrap(), vec![0u8]);
        // 16 bytes content -> a full block of 0x0F.
        assert_eq!(build_padding(16, None).unwrap(), vec![15u8; 16]);
    }

    #[test]
    fn extended_padding_stays_valid() {
        let padding = build_padding(20, Some(&PaddingEdit::Extend { extra_blocks: 2 })).unwrap();
        assert_eq!(padding.len(), 44);
        assert!(padding.iter().all(|b| *b == 43));

        assert!(build_padding(20, Some(&PaddingEdit::Extend { extra_blocks: 16 })).is_err());
    }

    #[test]
    fn roundtrip_explicit_iv() {
        let sent = record(ProtocolVersion::TLS1_2, b"GET / HTTP/1.1\r\n\r\n");
        let received = roundtrip(ProtocolVersion::TLS1_2, sent).unwrap();
        assert_eq!(received.cleartext, b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(received.iv.as_ref().map(|v| v.len()), Some(16));
    }

    #[test]
    fn roundtrip_chained_iv() {
        let (mut enc, mut dec) = pair(false);
        for (seq, text) in [&b"first"[..], &b"second record"[..]].iter().enumerate() {
            let mut sent = record(ProtocolVersion::TLS1_0, text);
            enc.encrypt(&mut sent, seq as u64).unwrap();
            assert!(sent.iv.is_none());
            assert_eq!(sent.fragment.len() % 16, 0);

            let mut received = record(ProtocolVersion::TLS1_0, &[]);
            received.fragment = sent.fragment;
            dec.decrypt(&mut received, seq as u64).unwrap();
            assert_eq!(received.cleartext, text.to_vec());
        }
    }

    #[test]
    fn flipped_mac_is_bad_mac() {
        let mut sent = record(ProtocolVersion::TLS1_2, b"hello");
        sent.malformation.mac = Some(ByteEdit::Xor {
            position: Position::FromEnd(1),
            mask: 0x01,
        });
        assert_eq!(
            roundtrip(ProtocolVersion::TLS1_2, sent).unwrap_err(),
            DecryptionError::BadMac
        );
    }

    #[test]
    fn filled_padding_is_bad_padding() {
        let mut sent = record(ProtocolVersion::TLS1_2, b"hello");
        sent.malformation.padding = Some(PaddingEdit::Fill(0xFF));
        assert_eq!(
            roundtrip(ProtocolVersion::TLS1_2, sent).unwrap_err(),
            DecryptionError::BadPadding
        );
    }

    #[test]
    fn flipped_padding_is_bad_padding() {
        let mut sent = record(ProtocolVersion::TLS1_2, b"hello");
        sent.malformation.padding = Some(PaddingEdit::Xor {
            extra_blocks: 1,
            position: Position::FromStart(0),
            mask: 0x01,
        });
        assert_eq!(
            roundtrip(ProtocolVersion::TLS1_2, sent).unwrap_err(),
            DecryptionError::BadPadding
        );
    }

    #[test]
    fn not_block_aligned_is_bad_length() {
        let (mut enc, mut dec) = pair(true);
        let mut sent = record(ProtocolVersion::TLS1_2, b"hello");
        enc.encrypt(&mut sent, 0).unwrap();

        let mut received = record(ProtocolVersion::TLS1_2, &[]);
        received.fragment = sent.fragment[..sent.fragment.len() - 1].to_vec();
        assert!(matches!(
            dec.decrypt(&mut received, 0),
            Err(DecryptionError::BadLength { .. })
        ));
    }

    #[test]
    fn preset_iv_is_reused() {
        let (mut enc, _) = pair(true);
        let mut a = record(ProtocolVersion::TLS1_2, b"same");
        a.iv = Some(vec![0xAB; 16]);
        let mut b = a.clone();
        enc.encrypt(&mut a, 3).unwrap();
        enc.encrypt(&mut b, 3).unwrap();
        assert_eq!(a.fragment, b.fragment);
        assert_eq!(&a.fragment[..16], &[0xAB; 16]);
    }

    #[test]
    fn misaligned_explicit_padding_is_rejected() {
        let (mut enc, _) = pair(true);
        let mut r = record(ProtocolVersion::TLS1_2, b"x");
        r.malformation.padding = Some(PaddingEdit::Explicit(vec![0, 0]));
        assert!(matches!(enc.encrypt(&mut r, 0), Err(Error::Preparation(_))));
    }
}
