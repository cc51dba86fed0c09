//! Extension rendering.
//!
//! Extensions are rendered in list order. The order is the caller's and is
//! never changed here.

use crate::error::PreparationError;
use crate::message::HandshakeMessage;

/// Prepare every extension and concatenate them into `extension_bytes`.
///
/// An absent or empty list gives an empty region, not a missing one.
pub fn prepare_extensions(message: &mut HandshakeMessage) -> Result<(), PreparationError> {
    let mut bytes = Vec::new();

    if let Some(extensions) = message.extensions.as_mut() {
        for extension in extensions.iter_mut() {
            extension.prepare()?;
            if let Some(rendered) = &extension.extension_bytes {
                bytes.extend_from_slice(rendered);
            }
        }
    }

    debug!("extension_bytes: {:02x?}", bytes);
    message.extension_bytes = Some(bytes);
    Ok(())
}

/// Record the length of `extension_bytes` in `extensions_length`.
pub fn prepare_extension_length(message: &mut HandshakeMessage) -> Result<(), PreparationError> {
    let len = message.extension_bytes.as_ref().map(|b| b.len()).unwrap_or(0);
    let length = u16::try_from(len).map_err(|_| {
        PreparationError::new("extensions_length", format!("{} bytes exceeds 65535", len))
    })?;

    debug!("extensions_length: {}", length);
    message.extensions_length = Some(length);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Extension, ExtensionPayload, HeartbeatMode};

    #[test]
    fn list_order_is_kept() {
        let mut message = HandshakeMessage::server_hello();
        message.extensions = Some(vec![
            Extension::new(ExtensionPayload::ExtendedMasterSecret),
            Extension::new(ExtensionPayload::Heartbeat(HeartbeatMode::PeerNotAllowedToSend)),
            Extension::new(ExtensionPayload::RenegotiationInfo(Vec::new())),
        ]);

        prepare_extensions(&mut message).unwrap();
        prepare_extension_length(&mut message).unwrap();

        let expected = [
            0x00, 0x17, 0x00, 0x00, // extended_master_secret
            0x00, 0x0F, 0x00, 0x01, 0x02, // heartbeat
            0xFF, 0x01, 0x00, 0x01, 0x00, // renegotiation_info
        ];
        assert_eq!(message.extension_bytes.as_deref(), Some(&expected[..]));
        assert_eq!(message.extensions_length, Some(14));
    }

    #[test]
    fn absent_list_gives_empty_region() {
        let mut message = HandshakeMessage::finished();
        assert_eq!(message.extensions, None);

        prepare_extensions(&mut message).unwrap();
        prepare_extension_length(&mut message).unwrap();
        assert_eq!(message.extension_bytes, Some(Vec::new()));
        assert_eq!(message.extensions_length, Some(0));
    }

    #[test]
    fn oversized_region() {
        let mut message = HandshakeMessage::server_hello();
        message.extensions = Some(vec![
            Extension::new(ExtensionPayload::Padding(40_000)),
            Extension::new(ExtensionPayload::Padding(40_000)),
        ]);

        prepare_extensions(&mut message).unwrap();
        let err = prepare_extension_length(&mut message).unwrap_err();
        assert_eq!(err.field, "extensions_length");
    }
}
