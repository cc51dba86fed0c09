use nom::bytes::complete::take;
use nom::error::{make_error, ErrorKind};
use nom::number::complete::{be_u24, be_u8};
use nom::{Err, IResult};

/// Parse a big endian 48 bit integer, as used by the DTLS record sequence number.
pub fn be_u48(input: &[u8]) -> IResult<&[u8], u64> {
    if input.len() < 6 {
        return Err(Err::Error(make_error(input, ErrorKind::Eof)));
    }

    let value = input[..6]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | *byte as u64);

    Ok((&input[6..], value))
}

/// Opaque vector with a one byte length prefix.
pub fn opaque_u8(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, len) = be_u8(input)?;
    take(len as usize)(input)
}

/// Opaque vector with a three byte length prefix.
pub fn opaque_u24(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, len) = be_u24(input)?;
    take(len as usize)(input)
}

pub fn put_u24(output: &mut Vec<u8>, value: u32) {
    output.extend_from_slice(&value.to_be_bytes()[1..]);
}

pub fn put_u48(output: &mut Vec<u8>, value: u64) {
    output.extend_from_slice(&value.to_be_bytes()[2..]);
}
