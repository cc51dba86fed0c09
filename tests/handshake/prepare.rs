//! Handshake message preparation tests.

use tlsprobe::message::{fragment_handshake, HandshakeMessage, MessageBody, Reassembler};
use tlsprobe::preparator::prepare;
use tlsprobe::record::Framing;
use tlsprobe::types::{ConnectionEnd, HandshakeType, ProtocolVersion};
use tlsprobe::PreparationError;

use crate::common::*;

#[test]
fn stream_client_hello_lengths() {
    let _ = env_logger::try_init();

    let mut ctx = context(ProtocolVersion::TLS1_2, ConnectionEnd::Client);
    let mut hello = HandshakeMessage::client_hello(ctx.config());
    prepare(&mut hello, &mut ctx).unwrap();

    let bytes = hello.serialize(Framing::Stream).unwrap();
    assert_eq!(bytes[0], 1);
    let length = u32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]]) as usize;
    assert_eq!(length, bytes.len() - 4);
    assert_eq!(hello.length, Some(length as u32));
    assert_eq!(hello.message_seq, None);

    let extension_bytes = hello.extension_bytes.clone().unwrap();
    assert_eq!(hello.extensions_length, Some(extension_bytes.len() as u16));
    assert!(bytes.ends_with(&extension_bytes));

    let (rest, parsed) = HandshakeMessage::parse(&bytes, Framing::Stream).unwrap();
    assert!(rest.is_empty());
    assert_eq!(parsed.message_type(), HandshakeType::ClientHello);
    assert_eq!(parsed.serialize(Framing::Stream).unwrap(), bytes);
}

#[test]
fn preparation_is_idempotent() {
    let _ = env_logger::try_init();

    for version in [ProtocolVersion::TLS1_2, ProtocolVersion::DTLS1_2] {
        let framing = Framing::for_version(version);
        let mut ctx = context(version, ConnectionEnd::Client);
        let mut hello = HandshakeMessage::client_hello(ctx.config());

        prepare(&mut hello, &mut ctx).unwrap();
        let first = hello.serialize(framing).unwrap();
        prepare(&mut hello, &mut ctx).unwrap();
        let second = hello.serialize(framing).unwrap();
        assert_eq!(first, second, "{}", version);
    }
}

#[test]
fn datagram_fields_describe_one_fragment() {
    let _ = env_logger::try_init();

    let mut ctx = context(ProtocolVersion::DTLS1_2, ConnectionEnd::Server);
    ctx.advance_message_sequence();
    ctx.advance_message_sequence();

    let mut messages = vec![
        HandshakeMessage::server_hello(),
        HandshakeMessage::certificate(),
        HandshakeMessage::server_hello_done(),
    ];
    for message in &mut messages {
        prepare(message, &mut ctx).unwrap();
        assert_eq!(message.fragment_offset, Some(0));
        assert_eq!(message.fragment_length, message.length);
        assert_eq!(message.message_seq, Some(2));

        let bytes = message.serialize(Framing::Datagram).unwrap();
        assert_eq!(bytes.len(), 12 + message.length.unwrap() as usize);
    }
    assert_eq!(ctx.message_sequence(), 2);
    assert_eq!(messages[2].length, Some(0));
}

#[test]
fn certificate_fragments_reassemble() {
    let _ = env_logger::try_init();

    let mut ctx = context(ProtocolVersion::DTLS1_2, ConnectionEnd::Server);
    let mut certificate = HandshakeMessage::certificate();
    prepare(&mut certificate, &mut ctx).unwrap();
    let bytes = certificate.serialize(Framing::Datagram).unwrap();

    let fragments = fragment_handshake(&bytes, 100).unwrap();
    assert!(fragments.len() > 6);
    assert!(fragments.iter().all(|f| f.len() <= 100));

    // Out of order delivery.
    let mut reassembler = Reassembler::new(65536);
    let mut complete = Vec::new();
    for fragment in fragments.iter().rev() {
        complete.extend(reassembler.push_bytes(fragment));
    }
    assert_eq!(complete, vec![bytes]);
    assert!(reassembler.is_empty());
}

#[test]
fn finished_needs_keys() {
    let _ = env_logger::try_init();

    let mut ctx = context(ProtocolVersion::TLS1_2, ConnectionEnd::Client);
    let mut finished = HandshakeMessage::finished();
    let err: PreparationError = prepare(&mut finished, &mut ctx).unwrap_err();
    assert_eq!(err.field, "verify_data");
    assert_eq!(finished.length, None);

    ctx.set_master_secret(&[0x0B; 48]);
    ctx.append_transcript(b"transcript");
    prepare(&mut finished, &mut ctx).unwrap();
    assert_eq!(finished.length, Some(12));
    match &finished.body {
        MessageBody::Finished(f) => assert_eq!(f.verify_data.len(), 12),
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn unprepared_message_does_not_serialize() {
    let _ = env_logger::try_init();

    let hello = HandshakeMessage::server_hello_done();
    assert!(hello.serialize(Framing::Stream).is_err());
}
