#![no_main]

//! Fuzz target for the datagram receive path.
//!
//! Each input is fed to a DTLS connection as one datagram, both as-is and
//! wrapped in a plaintext handshake record so the fragment reassembly and
//! handshake parsing run on arbitrary bytes.

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::time::Duration;

use tlsprobe::connection::{Connection, MemoryTransport};
use tlsprobe::types::ProtocolVersion;
use tlsprobe::{Config, TlsContext};

/// DTLSPlaintext header length
const HEADER_LEN: usize = 13;

fuzz_target!(|data: &[u8]| {
    let config = match Config::builder()
        .highest_protocol_version(ProtocolVersion::DTLS1_2)
        .receive_timeout(Duration::from_millis(1))
        .rng_seed(Some(0))
        .build()
    {
        Ok(c) => c,
        Err(_) => return,
    };

    let mut transport = MemoryTransport::new();
    transport.push_inbound(data.to_vec());

    if !data.is_empty() {
        let frag_len = data.len().min(u16::MAX as usize);
        let mut record = Vec::with_capacity(HEADER_LEN + frag_len);
        record.push(22u8); // ContentType::Handshake
        record.extend_from_slice(&[0xFE, 0xFD]); // DTLS 1.2
        record.extend_from_slice(&[0, 0]); // epoch 0
        record.extend_from_slice(&[0, 0, 0, 0, 0, 1]); // sequence 1
        record.extend_from_slice(&(frag_len as u16).to_be_bytes());
        record.extend_from_slice(&data[..frag_len]);
        transport.push_inbound(record);
    }

    let mut connection = Connection::new(TlsContext::new(Arc::new(config)), transport);
    let _ = connection.receive();
});
