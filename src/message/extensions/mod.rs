//! Type specific extension payloads.

pub mod ec_point_formats;
pub mod server_name;
pub mod signature_algorithms;
pub mod supported_groups;

pub use ec_point_formats::{EcPointFormat, EcPointFormats};
pub use signature_algorithms::{SignatureAlgorithm, SignatureAndHashAlgorithm, SignatureHash};
pub use supported_groups::NamedGroup;

use nom::combinator::all_consuming;
use nom::number::complete::be_u8;
use nom::IResult;

use crate::types::ExtensionType;
use crate::util::opaque_u8;

/// heartbeat extension mode, RFC 6520.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeartbeatMode {
    #[default]
    PeerAllowedToSend,
    PeerNotAllowedToSend,
    Unknown(u8),
}

impl HeartbeatMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => HeartbeatMode::PeerAllowedToSend,
            2 => HeartbeatMode::PeerNotAllowedToSend,
            _ => HeartbeatMode::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            HeartbeatMode::PeerAllowedToSend => 1,
            HeartbeatMode::PeerNotAllowedToSend => 2,
            HeartbeatMode::Unknown(value) => *value,
        }
    }
}

/// What an extension carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionPayload {
    ServerName(String),
    /// renegotiated_connection, empty on an initial handshake.
    RenegotiationInfo(Vec<u8>),
    SignatureAlgorithms(Vec<SignatureAndHashAlgorithm>),
    EcPointFormats(EcPointFormats),
    SupportedGroups(Vec<NamedGroup>),
    Heartbeat(HeartbeatMode),
    ExtendedMasterSecret,
    /// Number of zero bytes.
    Padding(usize),
    Raw(ExtensionType, Vec<u8>),
}

impl ExtensionPayload {
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            ExtensionPayload::ServerName(_) => ExtensionType::ServerName,
            ExtensionPayload::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            ExtensionPayload::SignatureAlgorithms(_) => ExtensionType::SignatureAlgorithms,
            ExtensionPayload::EcPointFormats(_) => ExtensionType::EcPointFormats,
            ExtensionPayload::SupportedGroups(_) => ExtensionType::SupportedGroups,
            ExtensionPayload::Heartbeat(_) => ExtensionType::Heartbeat,
            ExtensionPayload::ExtendedMasterSecret => ExtensionType::ExtendedMasterSecret,
            ExtensionPayload::Padding(_) => ExtensionType::Padding,
            ExtensionPayload::Raw(extension_type, _) => *extension_type,
        }
    }

    /// Parse `data` as the payload for `extension_type`.
    ///
    /// Payloads that do not parse cleanly are kept as [`ExtensionPayload::Raw`].
    pub fn parse(extension_type: ExtensionType, data: &[u8]) -> ExtensionPayload {
        Self::parse_typed(extension_type, data)
            .map(|(_, payload)| payload)
            .unwrap_or_else(|_| ExtensionPayload::Raw(extension_type, data.to_vec()))
    }

    fn parse_typed(extension_type: ExtensionType, data: &[u8]) -> IResult<&[u8], ExtensionPayload> {
        match extension_type {
            ExtensionType::ServerName => {
                let (rest, name) = all_consuming(server_name::parse)(data)?;
                Ok((rest, ExtensionPayload::ServerName(name)))
            }
            ExtensionType::RenegotiationInfo => {
                let (rest, info) = all_consuming(opaque_u8)(data)?;
                Ok((rest, ExtensionPayload::RenegotiationInfo(info.to_vec())))
            }
            ExtensionType::SignatureAlgorithms => {
                let (rest, algs) = all_consuming(signature_algorithms::parse)(data)?;
                Ok((rest, ExtensionPayload::SignatureAlgorithms(algs)))
            }
            ExtensionType::EcPointFormats => {
                let (rest, formats) = all_consuming(ec_point_formats::parse)(data)?;
                Ok((rest, ExtensionPayload::EcPointFormats(formats)))
            }
            ExtensionType::SupportedGroups => {
                let (rest, groups) = all_consuming(supported_groups::parse)(data)?;
                Ok((rest, ExtensionPayload::SupportedGroups(groups)))
            }
            ExtensionType::Heartbeat => {
                let (rest, mode) = all_consuming(be_u8)(data)?;
                Ok((rest, ExtensionPayload::Heartbeat(HeartbeatMode::from_u8(mode))))
            }
            ExtensionType::ExtendedMasterSecret if data.is_empty() => {
                Ok((data, ExtensionPayload::ExtendedMasterSecret))
            }
            ExtensionType::Padding if data.iter().all(|b| *b == 0) => {
                Ok((&data[data.len()..], ExtensionPayload::Padding(data.len())))
            }
            _ => Ok((&data[data.len()..], ExtensionPayload::Raw(extension_type, data.to_vec()))),
        }
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            ExtensionPayload::ServerName(name) => server_name::serialize(name, output),
            ExtensionPayload::RenegotiationInfo(info) => {
                output.push(info.len() as u8);
                output.extend_from_slice(info);
            }
            ExtensionPayload::SignatureAlgorithms(algs) => {
                signature_algorithms::serialize(algs, output)
            }
            ExtensionPayload::EcPointFormats(formats) => ec_point_formats::serialize(formats, output),
            ExtensionPayload::SupportedGroups(groups) => supported_groups::serialize(groups, output),
            ExtensionPayload::Heartbeat(mode) => output.push(mode.as_u8()),
            ExtensionPayload::ExtendedMasterSecret => {}
            ExtensionPayload::Padding(len) => output.resize(output.len() + len, 0),
            ExtensionPayload::Raw(_, data) => output.extend_from_slice(data),
        }
    }
}
