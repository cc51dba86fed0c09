use nom::IResult;

use crate::error::PreparationError;
use crate::types::ProtocolVersion;
use crate::util::opaque_u8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelloVerifyRequest {
    pub server_version: ProtocolVersion,
    pub cookie: Vec<u8>,
}

impl HelloVerifyRequest {
    pub fn parse(input: &[u8]) -> IResult<&[u8], HelloVerifyRequest> {
        let (input, server_version) = ProtocolVersion::parse(input)?;
        let (input, cookie) = opaque_u8(input)?;

        Ok((
            input,
            HelloVerifyRequest {
                server_version,
                cookie: cookie.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) -> Result<(), PreparationError> {
        if self.cookie.len() > 255 {
            return Err(PreparationError::new(
                "cookie",
                format!("{} bytes exceeds 255", self.cookie.len()),
            ));
        }
        self.server_version.serialize(output);
        output.push(self.cookie.len() as u8);
        output.extend_from_slice(&self.cookie);
        Ok(())
    }
}
