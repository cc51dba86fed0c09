//! Handshake flights between two connections over scripted transports.

use tlsprobe::message::HandshakeMessage;
use tlsprobe::record::{CipherPhase, Framing};
use tlsprobe::types::{ConnectionEnd, ContentType, HandshakeType, ProtocolVersion};

use crate::common::*;

fn message_types(messages: &[Vec<u8>], framing: Framing) -> Vec<HandshakeType> {
    messages
        .iter()
        .map(|m| HandshakeMessage::parse(m, framing).unwrap().1.message_type())
        .collect()
}

#[test]
fn hello_flights() {
    let _ = env_logger::try_init();

    for version in [ProtocolVersion::TLS1_2, ProtocolVersion::DTLS1_2] {
        let framing = Framing::for_version(version);
        let mut client = connection(version, ConnectionEnd::Client);
        let mut server = connection(version, ConnectionEnd::Server);

        let mut hello = HandshakeMessage::client_hello(client.context().config());
        client.send_handshake(&mut hello).unwrap();
        deliver(&mut client, &mut server);

        let outcome = server.receive().unwrap();
        assert!(outcome.timed_out);
        assert_eq!(
            message_types(&outcome.handshake, framing),
            vec![HandshakeType::ClientHello],
            "{}",
            version
        );

        for mut message in [
            HandshakeMessage::server_hello(),
            HandshakeMessage::certificate(),
            HandshakeMessage::server_hello_done(),
        ] {
            server.send_handshake(&mut message).unwrap();
        }
        assert_eq!(server.context().message_sequence(), 3);
        deliver(&mut server, &mut client);

        let outcome = client.receive().unwrap();
        assert!(outcome.decryption_errors.is_empty());
        assert_eq!(
            message_types(&outcome.handshake, framing),
            vec![
                HandshakeType::ServerHello,
                HandshakeType::Certificate,
                HandshakeType::ServerHelloDone,
            ],
            "{}",
            version
        );
        assert!(outcome
            .records
            .iter()
            .all(|r| r.content_type == ContentType::Handshake));
    }
}

#[test]
fn keyed_finished_after_change_cipher_spec() {
    let _ = env_logger::try_init();

    for version in [ProtocolVersion::TLS1_2, ProtocolVersion::DTLS1_2] {
        let framing = Framing::for_version(version);
        let mut client = connection(version, ConnectionEnd::Client);
        let mut server = connection(version, ConnectionEnd::Server);

        let client_random = client.context_mut().client_random_or_init();
        let server_random = server.context_mut().server_random_or_init();
        for conn in [&mut client, &mut server] {
            let ctx = conn.context_mut();
            ctx.client_random = Some(client_random);
            ctx.server_random = Some(server_random);
            ctx.set_master_secret(&[0x0B; 48]);
            conn.install_record_cipher().unwrap();
        }

        client.send_change_cipher_spec().unwrap();
        assert_eq!(client.record_layer().encryption_phase(), CipherPhase::Keyed(1));
        assert_eq!(client.record_layer().decryption_phase(), CipherPhase::Plaintext);

        let mut finished = HandshakeMessage::finished();
        client.send_handshake(&mut finished).unwrap();
        deliver(&mut client, &mut server);

        let outcome = server.receive().unwrap();
        assert_eq!(server.record_layer().decryption_phase(), CipherPhase::Keyed(1));
        assert!(outcome.decryption_errors.is_empty(), "{}", version);
        assert_eq!(
            outcome.records.iter().map(|r| r.content_type).collect::<Vec<_>>(),
            vec![ContentType::ChangeCipherSpec, ContentType::Handshake]
        );
        assert_eq!(
            message_types(&outcome.handshake, framing),
            vec![HandshakeType::Finished]
        );
    }
}
