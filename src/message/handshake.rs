use nom::bytes::complete::take;
use nom::combinator::all_consuming;
use nom::error::{Error, ErrorKind};
use nom::multi::many0;
use nom::number::complete::{be_u16, be_u24};
use nom::{Err, IResult};

use super::extensions::ExtensionPayload;
use super::{Certificate, ClientHello, ClientKeyExchange, Extension, Finished};
use super::{HelloVerifyRequest, ServerHello, ServerKeyExchange};
use crate::config::Config;
use crate::error::PreparationError;
use crate::record::Framing;
use crate::types::HandshakeType;
use crate::util::put_u24;

/// Handshake header on stream transport: type(1) + length(3).
pub const STREAM_HEADER_LEN: usize = 4;

/// Handshake header on datagram transport, adding message_seq(2),
/// fragment_offset(3) and fragment_length(3).
pub const DATAGRAM_HEADER_LEN: usize = 12;

/// Largest value of a 24 bit length field.
pub const MAX_BODY_LEN: u32 = 0xFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    HelloVerifyRequest(HelloVerifyRequest),
    Certificate(Certificate),
    ServerKeyExchange(ServerKeyExchange),
    ServerHelloDone,
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
    Unknown(u8, Vec<u8>),
}

impl MessageBody {
    pub fn message_type(&self) -> HandshakeType {
        match self {
            MessageBody::HelloRequest => HandshakeType::HelloRequest,
            MessageBody::ClientHello(_) => HandshakeType::ClientHello,
            MessageBody::ServerHello(_) => HandshakeType::ServerHello,
            MessageBody::HelloVerifyRequest(_) => HandshakeType::HelloVerifyRequest,
            MessageBody::Certificate(_) => HandshakeType::Certificate,
            MessageBody::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            MessageBody::ServerHelloDone => HandshakeType::ServerHelloDone,
            MessageBody::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            MessageBody::Finished(_) => HandshakeType::Finished,
            MessageBody::Unknown(t, _) => HandshakeType::from_u8(*t),
        }
    }

    /// Whether the body ends in an extension block.
    pub fn has_extensions(&self) -> bool {
        matches!(self, MessageBody::ClientHello(_) | MessageBody::ServerHello(_))
    }

    fn serialize(&self, output: &mut Vec<u8>) -> Result<(), PreparationError> {
        match self {
            MessageBody::HelloRequest | MessageBody::ServerHelloDone => {}
            MessageBody::ClientHello(hello) => hello.serialize(output)?,
            MessageBody::ServerHello(hello) => hello.serialize(output)?,
            MessageBody::HelloVerifyRequest(request) => request.serialize(output)?,
            MessageBody::Certificate(certificate) => certificate.serialize(output)?,
            MessageBody::ServerKeyExchange(ske) => output.extend_from_slice(&ske.params),
            MessageBody::ClientKeyExchange(cke) => output.extend_from_slice(&cke.exchange_keys),
            MessageBody::Finished(finished) => finished.serialize(output),
            MessageBody::Unknown(_, body) => output.extend_from_slice(body),
        }
        Ok(())
    }

    fn parse(msg_type: HandshakeType, input: &[u8], dtls: bool) -> IResult<&[u8], MessageBody> {
        let end = &input[input.len()..];
        Ok(match msg_type {
            HandshakeType::HelloRequest => (input, MessageBody::HelloRequest),
            HandshakeType::ServerHelloDone => (input, MessageBody::ServerHelloDone),
            HandshakeType::ClientHello => {
                let (rest, hello) = ClientHello::parse(input, dtls)?;
                (rest, MessageBody::ClientHello(hello))
            }
            HandshakeType::ServerHello => {
                let (rest, hello) = ServerHello::parse(input)?;
                (rest, MessageBody::ServerHello(hello))
            }
            HandshakeType::HelloVerifyRequest => {
                let (rest, request) = HelloVerifyRequest::parse(input)?;
                (rest, MessageBody::HelloVerifyRequest(request))
            }
            HandshakeType::Certificate => {
                let (rest, certificate) = Certificate::parse(input)?;
                (rest, MessageBody::Certificate(certificate))
            }
            HandshakeType::ServerKeyExchange => (
                end,
                MessageBody::ServerKeyExchange(ServerKeyExchange {
                    params: input.to_vec(),
                }),
            ),
            HandshakeType::ClientKeyExchange => (
                end,
                MessageBody::ClientKeyExchange(ClientKeyExchange {
                    exchange_keys: input.to_vec(),
                }),
            ),
            HandshakeType::Finished => (
                end,
                MessageBody::Finished(Finished {
                    verify_data: input.to_vec(),
                }),
            ),
            other => (end, MessageBody::Unknown(other.as_u8(), input.to_vec())),
        })
    }
}

/// A handshake message and its structural fields.
///
/// The structural fields (`msg_type`, `length` and the datagram fragment
/// fields) are derived from the serialized body during preparation. They stay
/// `None` until then and [`HandshakeMessage::serialize`] refuses to run
/// without them. Changing the body after preparation leaves them stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    pub body: MessageBody,
    /// Hello messages only, in wire order.
    pub extensions: Option<Vec<Extension>>,
    /// Concatenated `extension_bytes` of every extension.
    pub extension_bytes: Option<Vec<u8>>,
    pub extensions_length: Option<u16>,
    pub msg_type: Option<HandshakeType>,
    pub length: Option<u32>,
    pub message_seq: Option<u16>,
    pub fragment_offset: Option<u32>,
    pub fragment_length: Option<u32>,
}

impl HandshakeMessage {
    pub fn new(body: MessageBody) -> Self {
        let extensions = body.has_extensions().then(Vec::new);
        HandshakeMessage {
            body,
            extensions,
            extension_bytes: None,
            extensions_length: None,
            msg_type: None,
            length: None,
            message_seq: None,
            fragment_offset: None,
            fragment_length: None,
        }
    }

    /// ClientHello carrying the extensions enabled in `config`.
    pub fn client_hello(config: &Config) -> Self {
        let hello = ClientHello::new(
            config.highest_protocol_version(),
            config.default_client_supported_cipher_suites().to_vec(),
        );

        let mut extensions = Vec::new();
        if config.add_server_name_indication_extension() {
            extensions.push(ExtensionPayload::ServerName(config.server_name().to_string()));
        }
        if config.add_renegotiation_info_extension() {
            extensions.push(ExtensionPayload::RenegotiationInfo(Vec::new()));
        }
        if config.add_signature_and_hash_algorithms_extension() {
            extensions.push(ExtensionPayload::SignatureAlgorithms(
                config.supported_signature_and_hash_algorithms().to_vec(),
            ));
        }
        if config.add_ec_point_format_extension() {
            extensions.push(ExtensionPayload::EcPointFormats(config.point_formats().clone()));
        }
        if config.add_elliptic_curve_extension() {
            extensions.push(ExtensionPayload::SupportedGroups(config.named_groups().to_vec()));
        }
        if config.add_heartbeat_extension() {
            extensions.push(ExtensionPayload::Heartbeat(config.heartbeat_mode()));
        }
        if config.add_extended_master_secret_extension() {
            extensions.push(ExtensionPayload::ExtendedMasterSecret);
        }
        if config.add_padding_extension() {
            extensions.push(ExtensionPayload::Padding(config.padding_extension_length()));
        }

        let mut message = Self::new(MessageBody::ClientHello(hello));
        message.extensions = Some(extensions.into_iter().map(Extension::new).collect());
        message
    }

    pub fn server_hello() -> Self {
        Self::new(MessageBody::ServerHello(ServerHello::default()))
    }

    pub fn hello_verify_request() -> Self {
        Self::new(MessageBody::HelloVerifyRequest(HelloVerifyRequest::default()))
    }

    pub fn certificate() -> Self {
        Self::new(MessageBody::Certificate(Certificate::default()))
    }

    pub fn server_key_exchange() -> Self {
        Self::new(MessageBody::ServerKeyExchange(ServerKeyExchange::default()))
    }

    pub fn server_hello_done() -> Self {
        Self::new(MessageBody::ServerHelloDone)
    }

    pub fn client_key_exchange() -> Self {
        Self::new(MessageBody::ClientKeyExchange(ClientKeyExchange::default()))
    }

    pub fn finished() -> Self {
        Self::new(MessageBody::Finished(Finished::default()))
    }

    pub fn hello_request() -> Self {
        Self::new(MessageBody::HelloRequest)
    }

    pub fn message_type(&self) -> HandshakeType {
        self.body.message_type()
    }

    /// Body content without the handshake header.
    pub fn serialize_body(&self) -> Result<Vec<u8>, PreparationError> {
        let mut output = Vec::new();
        self.body.serialize(&mut output)?;

        if self.body.has_extensions() {
            if let Some(bytes) = &self.extension_bytes {
                let length = match self.extensions_length {
                    Some(length) => length,
                    None => u16::try_from(bytes.len()).map_err(|_| {
                        PreparationError::new(
                            "extensions_length",
                            format!("{} bytes exceeds 65535", bytes.len()),
                        )
                    })?,
                };
                output.extend_from_slice(&length.to_be_bytes());
                output.extend_from_slice(bytes);
            }
        }

        Ok(output)
    }

    /// Header plus body, using the structural fields as prepared.
    pub fn serialize(&self, framing: Framing) -> Result<Vec<u8>, PreparationError> {
        let msg_type = self
            .msg_type
            .ok_or_else(|| PreparationError::new("type", "message not prepared"))?;
        let length = self
            .length
            .ok_or_else(|| PreparationError::new("length", "message not prepared"))?;

        let body = self.serialize_body()?;
        let mut output = Vec::with_capacity(DATAGRAM_HEADER_LEN + body.len());
        output.push(msg_type.as_u8());
        put_u24(&mut output, length);

        if framing == Framing::Datagram {
            let message_seq = self
                .message_seq
                .ok_or_else(|| PreparationError::new("message_seq", "message not prepared"))?;
            let fragment_offset = self
                .fragment_offset
                .ok_or_else(|| PreparationError::new("fragment_offset", "message not prepared"))?;
            let fragment_length = self
                .fragment_length
                .ok_or_else(|| PreparationError::new("fragment_length", "message not prepared"))?;
            output.extend_from_slice(&message_seq.to_be_bytes());
            put_u24(&mut output, fragment_offset);
            put_u24(&mut output, fragment_length);
        }

        output.extend_from_slice(&body);
        Ok(output)
    }

    /// Parse one complete, unfragmented message.
    pub fn parse(input: &[u8], framing: Framing) -> IResult<&[u8], HandshakeMessage> {
        let original = input;
        let (input, msg_type) = HandshakeType::parse(input)?;
        let (input, length) = be_u24(input)?;

        let (input, dtls_fields) = match framing {
            Framing::Stream => (input, None),
            Framing::Datagram => {
                let (input, message_seq) = be_u16(input)?;
                let (input, fragment_offset) = be_u24(input)?;
                let (input, fragment_length) = be_u24(input)?;
                if fragment_offset != 0 || fragment_length != length {
                    return Err(Err::Error(Error::new(original, ErrorKind::Verify)));
                }
                (input, Some((message_seq, fragment_offset, fragment_length)))
            }
        };

        let (rest, body_bytes) = take(length as usize)(input)?;
        let dtls = framing == Framing::Datagram;
        let (ext_input, body) = MessageBody::parse(msg_type, body_bytes, dtls)?;

        let mut message = HandshakeMessage::new(body);
        message.msg_type = Some(msg_type);
        message.length = Some(length);
        if let Some((seq, offset, frag_len)) = dtls_fields {
            message.message_seq = Some(seq);
            message.fragment_offset = Some(offset);
            message.fragment_length = Some(frag_len);
        }

        if message.body.has_extensions() && !ext_input.is_empty() {
            let (_, ext_len) = be_u16(ext_input)?;
            let (_, block) = all_consuming(take(ext_len as usize))(&ext_input[2..])?;
            let (_, extensions) = all_consuming(many0(Extension::parse))(block)?;
            message.extensions = Some(extensions);
            message.extension_bytes = Some(block.to_vec());
            message.extensions_length = Some(ext_len);
        } else if !ext_input.is_empty() {
            return Err(Err::Error(Error::new(ext_input, ErrorKind::Eof)));
        }

        Ok((rest, message))
    }
}
