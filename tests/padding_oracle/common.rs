//! Shared helpers for padding oracle integration tests.

#![allow(unused)]

use std::sync::Arc;

use tlsprobe::attack::RecordSize;
use tlsprobe::connection::{Connection, MemoryTransport};
use tlsprobe::crypto::{DirectionKeys, RecordCipher};
use tlsprobe::record::{Record, RecordLayer, TlsRecordLayer, MAX_RECORD_LENGTH};
use tlsprobe::types::{CipherSuite, ContentType, ProtocolVersion};
use tlsprobe::{Config, TlsContext};

pub const SUITE: CipherSuite = CipherSuite::RSA_WITH_AES_128_CBC_SHA;

pub fn keys(fill: u8) -> DirectionKeys {
    DirectionKeys {
        mac_key: vec![fill; 20],
        enc_key: vec![fill.wrapping_add(1); 16],
        iv: vec![fill.wrapping_add(2); 16],
    }
}

pub fn client_cipher() -> RecordCipher {
    RecordCipher::from_keys(SUITE, ProtocolVersion::TLS1_2, &keys(0x10), &keys(0x40), Some(7))
        .unwrap()
}

pub fn server_cipher() -> RecordCipher {
    RecordCipher::from_keys(SUITE, ProtocolVersion::TLS1_2, &keys(0x40), &keys(0x10), Some(7))
        .unwrap()
}

/// A stream layer already writing with the client cipher.
pub fn keyed_client_layer() -> TlsRecordLayer {
    let mut layer = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    layer.set_record_cipher(client_cipher());
    layer.update_encryption_cipher().unwrap();
    layer
}

/// A stream layer already reading with the server cipher.
pub fn keyed_server_layer() -> TlsRecordLayer {
    let mut layer = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    layer.set_record_cipher(server_cipher());
    layer.update_decryption_cipher().unwrap();
    layer
}

pub fn template(size: RecordSize) -> Record {
    size.template(keyed_client_layer().get_fresh_record())
}

/// Wire bytes of `record` from a freshly keyed layer.
pub fn encrypt(record: &Record) -> (Vec<u8>, Record) {
    let mut layer = keyed_client_layer();
    let mut records = vec![record.clone()];
    let bytes = layer
        .prepare_records(&record.cleartext, record.content_type, &mut records)
        .unwrap();
    assert_eq!(records.len(), 1);
    (bytes, records.remove(0))
}

/// A client connection over a scripted transport, encrypting with the client
/// cipher.
pub fn keyed_connection(config: Config) -> Connection<MemoryTransport> {
    let mut conn = Connection::new(TlsContext::new(Arc::new(config)), MemoryTransport::new());
    conn.record_layer_mut().set_record_cipher(client_cipher());
    conn.record_layer_mut().update_encryption_cipher().unwrap();
    conn
}

/// A plaintext fatal alert record.
pub fn fatal_alert(description: u8) -> Vec<u8> {
    vec![
        0x15, // ContentType::Alert
        0x03, 0x03, // ProtocolVersion::TLS1_2
        0x00, 0x02, // length
        0x02, // fatal
        description,
    ]
}
