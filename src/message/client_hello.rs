use nom::bytes::complete::take;
use nom::multi::many0;
use nom::number::complete::be_u16;
use nom::IResult;
use tinyvec::{array_vec, ArrayVec};

use crate::error::PreparationError;
use crate::types::{CipherSuite, CompressionMethod, ProtocolVersion, Random};
use crate::util::opaque_u8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub client_version: ProtocolVersion,
    /// Set by preparation.
    pub random: Option<Random>,
    pub session_id: Vec<u8>,
    /// Datagram only.
    pub cookie: Option<Vec<u8>>,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: ArrayVec<[CompressionMethod; 4]>,
}

impl ClientHello {
    pub fn new(client_version: ProtocolVersion, cipher_suites: Vec<CipherSuite>) -> Self {
        ClientHello {
            client_version,
            random: None,
            session_id: Vec::new(),
            cookie: client_version.is_dtls().then(Vec::new),
            cipher_suites,
            compression_methods: array_vec![[CompressionMethod; 4] => CompressionMethod::Null],
        }
    }

    /// Parse the fields before the extension block.
    pub fn parse(input: &[u8], dtls: bool) -> IResult<&[u8], ClientHello> {
        let (input, client_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id) = opaque_u8(input)?;

        let (input, cookie) = if dtls {
            let (input, cookie) = opaque_u8(input)?;
            (input, Some(cookie.to_vec()))
        } else {
            (input, None)
        };

        let (input, suites_len) = be_u16(input)?;
        let (input, suites) = take(suites_len as usize)(input)?;
        let (_, cipher_suites) = many0(CipherSuite::parse)(suites)?;

        let (input, methods) = opaque_u8(input)?;
        let mut compression_methods = ArrayVec::new();
        for m in methods.iter().take(compression_methods.capacity()) {
            compression_methods.push(CompressionMethod::from_u8(*m));
        }

        Ok((
            input,
            ClientHello {
                client_version,
                random: Some(random),
                session_id: session_id.to_vec(),
                cookie,
                cipher_suites,
                compression_methods,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) -> Result<(), PreparationError> {
        let random = self
            .random
            .as_ref()
            .ok_or_else(|| PreparationError::new("random", "ClientHello random not set"))?;

        if self.session_id.len() > 32 {
            return Err(PreparationError::new(
                "session_id",
                format!("{} bytes exceeds 32", self.session_id.len()),
            ));
        }
        if self.cipher_suites.len() > 32767 {
            return Err(PreparationError::new(
                "cipher_suites",
                format!("{} suites", self.cipher_suites.len()),
            ));
        }

        self.client_version.serialize(output);
        random.serialize(output);
        output.push(self.session_id.len() as u8);
        output.extend_from_slice(&self.session_id);

        if let Some(cookie) = &self.cookie {
            if cookie.len() > 255 {
                return Err(PreparationError::new(
                    "cookie",
                    format!("{} bytes exceeds 255", cookie.len()),
                ));
            }
            output.push(cookie.len() as u8);
            output.extend_from_slice(cookie);
        }

        output.extend_from_slice(&((self.cipher_suites.len() * 2) as u16).to_be_bytes());
        for suite in &self.cipher_suites {
            suite.serialize(output);
        }

        output.push(self.compression_methods.len() as u8);
        for method in &self.compression_methods {
            output.push(method.as_u8());
        }

        Ok(())
    }
}
