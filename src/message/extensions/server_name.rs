use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

const HOST_NAME: u8 = 0;

/// server_name extension payload, RFC 6066 section 3.
///
/// Only host names are carried. An empty name is the empty payload a server
/// echoes to acknowledge the extension.
pub fn parse(input: &[u8]) -> IResult<&[u8], String> {
    if input.is_empty() {
        return Ok((input, String::new()));
    }
    let (input, list_len) = be_u16(input)?;
    let (rest, mut list) = take(list_len as usize)(input)?;

    while !list.is_empty() {
        let (i, name_type) = be_u8(list)?;
        let (i, len) = be_u16(i)?;
        let (i, name) = take(len as usize)(i)?;
        if name_type == HOST_NAME {
            return Ok((rest, String::from_utf8_lossy(name).into_owned()));
        }
        list = i;
    }

    Ok((rest, String::new()))
}

pub fn serialize(host_name: &str, output: &mut Vec<u8>) {
    if host_name.is_empty() {
        return;
    }
    let name = host_name.as_bytes();
    output.extend_from_slice(&((name.len() + 3) as u16).to_be_bytes());
    output.push(HOST_NAME);
    output.extend_from_slice(&(name.len() as u16).to_be_bytes());
    output.extend_from_slice(name);
}
