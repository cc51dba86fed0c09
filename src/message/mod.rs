//! Handshake message model and the other record payloads.

mod alert;
mod application_data;
mod certificate;
mod change_cipher_spec;
mod client_hello;
mod extension;
pub mod extensions;
mod finished;
mod fragment;
mod handshake;
mod hello_verify;
mod key_exchange;
mod server_hello;

pub use alert::{Alert, AlertDescription, AlertLevel};
pub use application_data::ApplicationData;
pub use certificate::Certificate;
pub use change_cipher_spec::ChangeCipherSpec;
pub use client_hello::ClientHello;
pub use extension::Extension;
pub use extensions::{
    EcPointFormat, EcPointFormats, ExtensionPayload, HeartbeatMode, NamedGroup, SignatureAlgorithm,
    SignatureAndHashAlgorithm, SignatureHash,
};
pub use finished::Finished;
pub use fragment::{fragment_handshake, HandshakeFragment, Reassembler};
pub use handshake::{HandshakeMessage, MessageBody};
pub use handshake::{DATAGRAM_HEADER_LEN, MAX_BODY_LEN, STREAM_HEADER_LEN};
pub use hello_verify::HelloVerifyRequest;
pub use key_exchange::{ClientKeyExchange, ServerKeyExchange};
pub use server_hello::ServerHello;
