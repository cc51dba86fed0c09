//! Handshake message preparation.
//!
//! [`prepare`] fills in a message's structural fields just before it is
//! serialized. The steps run in a fixed order:
//!
//! 1. contents, through the [`PrepareContents`] for the message type
//! 2. body length, from the body as now serialized
//! 3. datagram fragment fields and message_seq
//! 4. message type
//!
//! Anything that can change the body size happens in step 1, so the length
//! written in step 2 matches what goes on the wire.

mod contents;
mod extensions;

pub use contents::{
    CertificatePreparator, ClientHelloPreparator, ClientKeyExchangePreparator, FinishedPreparator,
    HelloRequestPreparator, HelloVerifyRequestPreparator, ServerHelloDonePreparator,
    ServerHelloPreparator, ServerKeyExchangePreparator, UnknownPreparator,
};
pub use extensions::{prepare_extension_length, prepare_extensions};

use crate::context::TlsContext;
use crate::error::PreparationError;
use crate::message::{HandshakeMessage, MAX_BODY_LEN};
use crate::record::Framing;
use crate::types::HandshakeType;

/// Fills the semantic fields of one message type.
pub trait PrepareContents: Sync {
    fn message_type(&self) -> HandshakeType;

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError>;
}

/// The contents preparator for `msg_type`.
pub fn preparator_for(msg_type: HandshakeType) -> &'static dyn PrepareContents {
    match msg_type {
        HandshakeType::HelloRequest => &HelloRequestPreparator,
        HandshakeType::ClientHello => &ClientHelloPreparator,
        HandshakeType::ServerHello => &ServerHelloPreparator,
        HandshakeType::HelloVerifyRequest => &HelloVerifyRequestPreparator,
        HandshakeType::Certificate => &CertificatePreparator,
        HandshakeType::ServerKeyExchange => &ServerKeyExchangePreparator,
        HandshakeType::ServerHelloDone => &ServerHelloDonePreparator,
        HandshakeType::ClientKeyExchange => &ClientKeyExchangePreparator,
        HandshakeType::Finished => &FinishedPreparator,
        _ => &UnknownPreparator,
    }
}

/// Prepare `message` for serialization.
///
/// Running it again on an unchanged message gives the same result. The
/// message sequence is read from `context`, not advanced.
pub fn prepare(
    message: &mut HandshakeMessage,
    context: &mut TlsContext,
) -> Result<(), PreparationError> {
    let msg_type = message.message_type();
    debug!("Preparing {}", msg_type);

    preparator_for(msg_type).prepare_contents(message, context)?;

    let body = message.serialize_body()?;
    let length = u32::try_from(body.len())
        .ok()
        .filter(|len| *len <= MAX_BODY_LEN)
        .ok_or_else(|| {
            PreparationError::new("length", format!("{} byte body exceeds 2^24-1", body.len()))
        })?;
    message.length = Some(length);
    debug!("length: {}", length);

    if context.framing() == Framing::Datagram {
        // One fragment covering the whole body.
        message.fragment_length = Some(length);
        message.fragment_offset = Some(0);
        message.message_seq = Some(context.message_sequence());
        debug!("fragment_length: {}", length);
        debug!("fragment_offset: 0");
        debug!("message_seq: {}", context.message_sequence());
    }

    message.msg_type = Some(msg_type);
    debug!("type: {}", msg_type.as_u8());

    Ok(())
}
