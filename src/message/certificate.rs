use nom::combinator::all_consuming;
use nom::multi::many0;
use nom::IResult;

use crate::error::PreparationError;
use crate::util::{opaque_u24, put_u24};

const MAX_U24: usize = 0xFF_FFFF;

/// Certificate chain as opaque DER blobs. Nothing here looks inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Certificate {
    pub certificate_list: Vec<Vec<u8>>,
}

impl Certificate {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Certificate> {
        let (input, list) = opaque_u24(input)?;
        let (_, certs) = all_consuming(many0(opaque_u24))(list)?;

        Ok((
            input,
            Certificate {
                certificate_list: certs.into_iter().map(|c| c.to_vec()).collect(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) -> Result<(), PreparationError> {
        let total: usize = self.certificate_list.iter().map(|c| c.len() + 3).sum();
        if total > MAX_U24 {
            return Err(PreparationError::new(
                "certificate_list",
                format!("{} bytes exceeds 2^24-1", total),
            ));
        }

        put_u24(output, total as u32);
        for cert in &self.certificate_list {
            put_u24(output, cert.len() as u32);
            output.extend_from_slice(cert);
        }
        Ok(())
    }
}
