//! Key exchange messages.
//!
//! Both carry their algorithm specific encoding as opaque bytes. What goes in
//! them is decided by whoever drives the handshake.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerKeyExchange {
    pub params: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientKeyExchange {
    pub exchange_keys: Vec<u8>,
}
