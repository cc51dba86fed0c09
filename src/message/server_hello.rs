use nom::IResult;

use crate::error::PreparationError;
use crate::types::{CipherSuite, CompressionMethod, ProtocolVersion, Random};
use crate::util::opaque_u8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub server_version: ProtocolVersion,
    pub random: Option<Random>,
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub compression_method: CompressionMethod,
}

impl Default for ServerHello {
    fn default() -> Self {
        ServerHello {
            server_version: ProtocolVersion::default(),
            random: None,
            session_id: Vec::new(),
            cipher_suite: CipherSuite::Unknown(0),
            compression_method: CompressionMethod::Null,
        }
    }
}

impl ServerHello {
    /// Parse the fields before the extension block.
    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerHello> {
        let (input, server_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id) = opaque_u8(input)?;
        let (input, cipher_suite) = CipherSuite::parse(input)?;
        let (input, compression_method) = CompressionMethod::parse(input)?;

        Ok((
            input,
            ServerHello {
                server_version,
                random: Some(random),
                session_id: session_id.to_vec(),
                cipher_suite,
                compression_method,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) -> Result<(), PreparationError> {
        let random = self
            .random
            .as_ref()
            .ok_or_else(|| PreparationError::new("random", "ServerHello random not set"))?;

        if self.session_id.len() > 32 {
            return Err(PreparationError::new(
                "session_id",
                format!("{} bytes exceeds 32", self.session_id.len()),
            ));
        }

        self.server_version.serialize(output);
        random.serialize(output);
        output.push(self.session_id.len() as u8);
        output.extend_from_slice(&self.session_id);
        self.cipher_suite.serialize(output);
        output.push(self.compression_method.as_u8());

        Ok(())
    }
}
