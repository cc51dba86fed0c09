use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use super::extensions::ExtensionPayload;
use crate::error::PreparationError;
use crate::types::ExtensionType;

/// One hello extension.
///
/// `extension_bytes` and `extension_length` are derived by [`Extension::prepare`]
/// and stay `None` until then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub extension_type: ExtensionType,
    pub payload: ExtensionPayload,
    /// `type(2) || length(2) || payload`
    pub extension_bytes: Option<Vec<u8>>,
    /// Payload length, excluding the 4 byte extension header.
    pub extension_length: Option<u16>,
}

impl Extension {
    pub fn new(payload: ExtensionPayload) -> Self {
        Extension {
            extension_type: payload.extension_type(),
            payload,
            extension_bytes: None,
            extension_length: None,
        }
    }

    /// Render the payload into `extension_bytes`.
    pub fn prepare(&mut self) -> Result<(), PreparationError> {
        let mut payload = Vec::new();
        self.payload.serialize(&mut payload);

        let length = u16::try_from(payload.len()).map_err(|_| {
            PreparationError::new(
                "extension_length",
                format!(
                    "{:?} payload of {} bytes exceeds 65535",
                    self.extension_type,
                    payload.len()
                ),
            )
        })?;

        let mut bytes = Vec::with_capacity(payload.len() + 4);
        bytes.extend_from_slice(&self.extension_type.as_u16().to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&payload);

        trace!("Prepared {:?} extension: {:02x?}", self.extension_type, bytes);
        self.extension_length = Some(length);
        self.extension_bytes = Some(bytes);

        Ok(())
    }

    /// Parse one extension. The derived fields are set from the wire.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Extension> {
        let (rest, extension_type) = ExtensionType::parse(input)?;
        let (rest, extension_length) = be_u16(rest)?;
        let (rest, data) = take(extension_length as usize)(rest)?;

        let consumed = input.len() - rest.len();
        Ok((
            rest,
            Extension {
                extension_type,
                payload: ExtensionPayload::parse(extension_type, data),
                extension_bytes: Some(input[..consumed].to_vec()),
                extension_length: Some(extension_length),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::extensions::HeartbeatMode;

    const HEARTBEAT: &[u8] = &[
        0x00, 0x0F, // heartbeat
        0x00, 0x01, // length
        0x01, // peer_allowed_to_send
    ];

    #[test]
    fn prepare_heartbeat() {
        let mut ext = Extension::new(ExtensionPayload::Heartbeat(HeartbeatMode::PeerAllowedToSend));
        assert_eq!(ext.extension_bytes, None);

        ext.prepare().unwrap();
        assert_eq!(ext.extension_bytes.as_deref(), Some(HEARTBEAT));
        assert_eq!(ext.extension_length, Some(1));

        let (rest, parsed) = Extension::parse(HEARTBEAT).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, ext);
    }

    #[test]
    fn empty_payload() {
        let mut ext = Extension::new(ExtensionPayload::ExtendedMasterSecret);
        ext.prepare().unwrap();
        assert_eq!(ext.extension_bytes.as_deref(), Some(&[0x00, 0x17, 0x00, 0x00][..]));
        assert_eq!(ext.extension_length, Some(0));
    }

    #[test]
    fn oversized_payload() {
        let mut ext = Extension::new(ExtensionPayload::Padding(70_000));
        let err = ext.prepare().unwrap_err();
        assert_eq!(err.field, "extension_length");
        assert_eq!(ext.extension_bytes, None);
    }
}
