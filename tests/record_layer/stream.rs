//! Stream record layer tests.

use tlsprobe::record::{
    CipherPhase, LengthEdit, Record, RecordLayer, TlsRecordLayer, MAX_RECORD_LENGTH,
};
use tlsprobe::types::{ContentType, ProtocolVersion};
use tlsprobe::DecryptionError;

use crate::common::*;

#[test]
fn plaintext_roundtrip_splits_at_max_length() {
    let _ = env_logger::try_init();

    let mut writer = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut reader = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);

    let data: Vec<u8> = (0..40_000u32).map(|i| i as u8).collect();
    let mut records = Vec::new();
    let bytes = writer
        .prepare_records(&data, ContentType::ApplicationData, &mut records)
        .unwrap();
    assert_eq!(records.len(), 3);

    let received = read_all(&mut reader, &bytes);
    assert_eq!(received.len(), 3);
    assert!(received
        .iter()
        .all(|r| r.content_type == ContentType::ApplicationData));
    let joined: Vec<u8> = received.iter().flat_map(|r| r.cleartext.clone()).collect();
    assert_eq!(joined, data);
}

#[test]
fn cbc_roundtrip_keeps_type_and_length() {
    let _ = env_logger::try_init();

    for version in [ProtocolVersion::TLS1_0, ProtocolVersion::TLS1_2] {
        let mut client = TlsRecordLayer::new(version, MAX_RECORD_LENGTH);
        let mut server = TlsRecordLayer::new(version, MAX_RECORD_LENGTH);
        key_both(&mut client, CBC_SUITE, false);
        key_both(&mut server, CBC_SUITE, true);

        for len in [0usize, 1, 15, 16, 100] {
            let data = vec![0x5A; len];
            let bytes = client
                .prepare_records(&data, ContentType::Handshake, &mut Vec::new())
                .unwrap();
            let received = read_all(&mut server, &bytes);
            assert_eq!(received.len(), 1);
            assert_eq!(received[0].content_type, ContentType::Handshake);
            assert_eq!(received[0].cleartext.len(), len, "{} len {}", version, len);
        }
    }
}

#[test]
fn gcm_roundtrip() {
    let _ = env_logger::try_init();

    let mut client = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut server = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    key_both(&mut client, GCM_SUITE, false);
    key_both(&mut server, GCM_SUITE, true);

    let bytes = client
        .prepare_records(b"hello", ContentType::ApplicationData, &mut Vec::new())
        .unwrap();
    let received = read_all(&mut server, &bytes);
    assert_eq!(received[0].cleartext, b"hello");
}

#[test]
fn caller_shells_are_used_first() {
    let _ = env_logger::try_init();

    let mut layer = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut shell = layer.get_fresh_record();
    shell.max_record_length = Some(10);

    let mut records = vec![shell];
    layer
        .prepare_records(&[0x01; 25], ContentType::ApplicationData, &mut records)
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].cleartext.len(), 10);
    assert_eq!(records[1].cleartext.len(), 15);
    assert_eq!(records[0].sequence_number, Some(0));
    assert_eq!(records[1].sequence_number, Some(1));
}

#[test]
fn declared_length_edit_only_touches_header() {
    let _ = env_logger::try_init();

    let mut layer = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut shell = layer.get_fresh_record();
    shell.malformation.declared_length = Some(LengthEdit::Exact(0x0100));

    let mut records = vec![shell];
    let bytes = layer
        .prepare_records(&[0xAB; 4], ContentType::ApplicationData, &mut records)
        .unwrap();

    assert_eq!(
        bytes,
        [
            0x17, // ContentType::ApplicationData
            0x03, 0x03, // ProtocolVersion::TLS1_2
            0x01, 0x00, // declared length
            0xAB, 0xAB, 0xAB, 0xAB, // fragment
        ]
    );
}

#[test]
fn truncated_input_keeps_parsed_prefix() {
    let _ = env_logger::try_init();

    let mut layer = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut bytes = layer
        .prepare_records(b"one", ContentType::ApplicationData, &mut Vec::new())
        .unwrap();
    let whole = bytes.len();
    bytes.extend_from_slice(&[0x17, 0x03, 0x03, 0x00, 0x20, 0x00]);

    let err = layer.parse_records(&bytes).unwrap_err();
    assert_eq!(err.parsed.len(), 1);
    assert_eq!(err.excess, &bytes[whole..]);
}

#[test]
fn directions_rotate_independently() {
    let _ = env_logger::try_init();

    let mut client = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut server = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    client.set_record_cipher(cipher(CBC_SUITE, ProtocolVersion::TLS1_2, false));
    server.set_record_cipher(cipher(CBC_SUITE, ProtocolVersion::TLS1_2, true));

    // Client switches to writing encrypted, still reads plaintext.
    client.update_encryption_cipher().unwrap();
    assert_eq!(client.encryption_phase(), CipherPhase::Keyed(1));
    assert_eq!(client.decryption_phase(), CipherPhase::Plaintext);

    let plain = server
        .prepare_records(b"server", ContentType::Handshake, &mut Vec::new())
        .unwrap();
    assert_eq!(read_all(&mut client, &plain)[0].cleartext, b"server");

    let sealed = client
        .prepare_records(b"client", ContentType::Handshake, &mut Vec::new())
        .unwrap();

    // Reading it before rotating fails to make sense of it.
    let mut records = server.parse_records(&sealed).unwrap();
    server.decrypt_record(&mut records[0]).unwrap();
    assert_ne!(records[0].cleartext, b"client");

    let mut server = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    server.set_record_cipher(cipher(CBC_SUITE, ProtocolVersion::TLS1_2, true));
    server.update_decryption_cipher().unwrap();
    assert_eq!(read_all(&mut server, &sealed)[0].cleartext, b"client");
}

#[test]
fn tampered_mac_is_reported() {
    let _ = env_logger::try_init();

    let mut client = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let mut server = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    key_both(&mut client, CBC_SUITE, false);
    key_both(&mut server, CBC_SUITE, true);

    let shell = Record {
        malformation: tlsprobe::record::Malformation {
            mac: Some(tlsprobe::record::ByteEdit::Xor {
                position: tlsprobe::record::Position::FromStart(0),
                mask: 0x80,
            }),
            ..Default::default()
        },
        ..client.get_fresh_record()
    };
    let bytes = client
        .prepare_records(b"data", ContentType::ApplicationData, &mut vec![shell])
        .unwrap();

    let mut records = server.parse_records(&bytes).unwrap();
    assert_eq!(
        server.decrypt_record(&mut records[0]),
        Err(DecryptionError::BadMac)
    );
}
