//! Shared helpers for handshake integration tests.

#![allow(unused)]

use std::sync::Arc;

use tlsprobe::connection::{Connection, MemoryTransport};
use tlsprobe::types::{CipherSuite, ConnectionEnd, ProtocolVersion};
use tlsprobe::{Config, TlsContext};

pub const SUITE: CipherSuite = CipherSuite::RSA_WITH_AES_128_CBC_SHA;

pub fn config(version: ProtocolVersion, end: ConnectionEnd) -> Config {
    Config::builder()
        .highest_protocol_version(version)
        .connection_end(end)
        .default_client_supported_cipher_suites(vec![SUITE])
        .add_server_name_indication_extension(true)
        .add_renegotiation_info_extension(true)
        .add_signature_and_hash_algorithms_extension(true)
        .certificate_chain(vec![vec![0x30; 600]])
        .dtls_max_fragment_length(200)
        .rng_seed(Some(match end {
            ConnectionEnd::Client => 1,
            ConnectionEnd::Server => 2,
        }))
        .build()
        .unwrap()
}

pub fn context(version: ProtocolVersion, end: ConnectionEnd) -> TlsContext {
    TlsContext::new(Arc::new(config(version, end)))
}

pub fn connection(version: ProtocolVersion, end: ConnectionEnd) -> Connection<MemoryTransport> {
    Connection::new(context(version, end), MemoryTransport::new())
}

/// Move everything `from` sent into `to`'s inbound queue.
pub fn deliver(from: &mut Connection<MemoryTransport>, to: &mut Connection<MemoryTransport>) {
    for chunk in from.transport_mut().sent.drain(..) {
        to.transport_mut().push_inbound(chunk);
    }
}
