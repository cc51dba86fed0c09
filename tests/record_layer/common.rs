//! Shared helpers for record layer integration tests.

#![allow(unused)]

use tlsprobe::crypto::{DirectionKeys, RecordCipher};
use tlsprobe::record::{Record, RecordLayer};
use tlsprobe::types::{CipherSuite, ProtocolVersion};
use tlsprobe::Error;

pub const CBC_SUITE: CipherSuite = CipherSuite::RSA_WITH_AES_128_CBC_SHA;
pub const GCM_SUITE: CipherSuite = CipherSuite::RSA_WITH_AES_128_GCM_SHA256;

/// Direction keys sized for `suite`, every byte set to `fill`.
pub fn keys(suite: CipherSuite, fill: u8) -> DirectionKeys {
    let bulk = suite.bulk_cipher();
    DirectionKeys {
        mac_key: vec![fill; suite.mac_algorithm().key_len()],
        enc_key: vec![fill.wrapping_add(1); bulk.key_len()],
        iv: vec![fill.wrapping_add(2); bulk.fixed_iv_len()],
    }
}

/// Cipher for one end. The peer's cipher is `cipher(suite, version, true)`.
pub fn cipher(suite: CipherSuite, version: ProtocolVersion, peer: bool) -> RecordCipher {
    let (a, b) = (keys(suite, 0x10), keys(suite, 0x40));
    let (write, read) = if peer { (&b, &a) } else { (&a, &b) };
    RecordCipher::from_keys(suite, version, write, read, Some(7)).unwrap()
}

/// Stage a cipher and rotate both directions.
pub fn key_both(layer: &mut dyn RecordLayer, suite: CipherSuite, peer: bool) {
    let version = layer.version();
    layer.set_record_cipher(cipher(suite, version, peer));
    layer.update_encryption_cipher().unwrap();
    layer.update_decryption_cipher().unwrap();
}

/// Parse and decrypt everything in `bytes`.
pub fn read_all(layer: &mut dyn RecordLayer, bytes: &[u8]) -> Vec<Record> {
    let mut records = layer.parse_records(bytes).unwrap();
    for record in &mut records {
        layer.decrypt_record(record).unwrap();
    }
    records
}
