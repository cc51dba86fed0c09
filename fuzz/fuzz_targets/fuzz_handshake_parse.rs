#![no_main]

//! Fuzz target for handshake message parsing.
//!
//! Anything that parses is serialized again.

use libfuzzer_sys::fuzz_target;

use tlsprobe::message::HandshakeMessage;
use tlsprobe::record::Framing;

fuzz_target!(|data: &[u8]| {
    for framing in [Framing::Stream, Framing::Datagram] {
        if let Ok((_, message)) = HandshakeMessage::parse(data, framing) {
            let _ = message.serialize(framing);
        }
    }
});
