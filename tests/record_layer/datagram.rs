//! Datagram record layer tests.

use tlsprobe::record::{CipherPhase, DtlsRecordLayer, Framing, RecordLayer, MAX_RECORD_LENGTH};
use tlsprobe::types::{ContentType, ProtocolVersion};

use crate::common::*;

#[test]
fn explicit_sequence_in_header() {
    let _ = env_logger::try_init();

    let mut layer = DtlsRecordLayer::new(ProtocolVersion::DTLS1_2, 8);
    let mut records = Vec::new();
    let bytes = layer
        .prepare_records(&[0x11; 20], ContentType::Handshake, &mut records)
        .unwrap();

    assert_eq!(records.len(), 3);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.epoch, Some(0));
        assert_eq!(record.sequence_number, Some(i as u64));
    }

    assert_eq!(
        &bytes[..13],
        &[
            0x16, // ContentType::Handshake
            0xFE, 0xFD, // ProtocolVersion::DTLS1_2
            0x00, 0x00, // epoch
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // sequence_number
            0x00, 0x08, // length
        ]
    );

    let parsed = layer.parse_records(&bytes).unwrap();
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[2].sequence_number, Some(2));
    assert_eq!(parsed[2].length, 4);
}

#[test]
fn encryption_rotation_bumps_epoch() {
    let _ = env_logger::try_init();

    let mut client = DtlsRecordLayer::new(ProtocolVersion::DTLS1_2, MAX_RECORD_LENGTH);
    let mut server = DtlsRecordLayer::new(ProtocolVersion::DTLS1_2, MAX_RECORD_LENGTH);

    client
        .prepare_records(b"plain", ContentType::Handshake, &mut Vec::new())
        .unwrap();

    key_both(&mut client, GCM_SUITE, false);
    key_both(&mut server, GCM_SUITE, true);
    assert_eq!(client.write_epoch(), 1);
    assert_eq!(client.write_sequence(), 0);
    assert_eq!(server.decryption_phase(), CipherPhase::Keyed(1));

    let mut records = Vec::new();
    let bytes = client
        .prepare_records(b"finished", ContentType::Handshake, &mut records)
        .unwrap();
    assert_eq!(records[0].epoch, Some(1));
    assert_eq!(records[0].sequence_number, Some(0));

    let received = read_all(&mut server, &bytes);
    assert_eq!(received[0].cleartext, b"finished");
}

#[test]
fn cbc_roundtrip_in_one_datagram() {
    let _ = env_logger::try_init();

    let mut client = DtlsRecordLayer::new(ProtocolVersion::DTLS1_2, 32);
    let mut server = DtlsRecordLayer::new(ProtocolVersion::DTLS1_2, 32);
    key_both(&mut client, CBC_SUITE, false);
    key_both(&mut server, CBC_SUITE, true);

    let data: Vec<u8> = (0..70u8).collect();
    let bytes = client
        .prepare_records(&data, ContentType::ApplicationData, &mut Vec::new())
        .unwrap();

    let received = read_all(&mut server, &bytes);
    assert_eq!(received.len(), 3);
    let joined: Vec<u8> = received.iter().flat_map(|r| r.cleartext.clone()).collect();
    assert_eq!(joined, data);
}

#[test]
fn fresh_record_carries_write_epoch() {
    let _ = env_logger::try_init();

    let mut layer = DtlsRecordLayer::new(ProtocolVersion::DTLS1_2, MAX_RECORD_LENGTH);
    assert_eq!(layer.framing(), Framing::Datagram);
    assert_eq!(layer.get_fresh_record().epoch, Some(0));

    key_both(&mut layer, CBC_SUITE, false);
    assert_eq!(layer.get_fresh_record().epoch, Some(1));

    layer.reset();
    assert_eq!(layer.get_fresh_record().epoch, Some(0));
    assert_eq!(layer.encryption_phase(), CipherPhase::Plaintext);
}
