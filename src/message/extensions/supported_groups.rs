use nom::bytes::complete::take;
use nom::multi::many0;
use nom::number::complete::be_u16;
use nom::IResult;

/// Named group, formerly "named curve", RFC 8422 section 5.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedGroup {
    Secp256r1,
    Secp384r1,
    Secp521r1,
    X25519,
    X448,
    Unknown(u16),
}

impl NamedGroup {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0017 => NamedGroup::Secp256r1,
            0x0018 => NamedGroup::Secp384r1,
            0x0019 => NamedGroup::Secp521r1,
            0x001D => NamedGroup::X25519,
            0x001E => NamedGroup::X448,
            _ => NamedGroup::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            NamedGroup::Secp256r1 => 0x0017,
            NamedGroup::Secp384r1 => 0x0018,
            NamedGroup::Secp521r1 => 0x0019,
            NamedGroup::X25519 => 0x001D,
            NamedGroup::X448 => 0x001E,
            NamedGroup::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], NamedGroup> {
        let (input, value) = be_u16(input)?;
        Ok((input, Self::from_u16(value)))
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], Vec<NamedGroup>> {
    let (input, len) = be_u16(input)?;
    let (input, data) = take(len as usize)(input)?;
    let (_, groups) = many0(NamedGroup::parse)(data)?;
    Ok((input, groups))
}

pub fn serialize(groups: &[NamedGroup], output: &mut Vec<u8>) {
    output.extend_from_slice(&((groups.len() * 2) as u16).to_be_bytes());
    for group in groups {
        output.extend_from_slice(&group.as_u16().to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_unknown_groups() {
        let data = [
            0x00, 0x08, // list length
            0x00, 0x1D, // x25519
            0x00, 0x17, // secp256r1
            0x01, 0x00, // ffdhe2048
            0x00, 0x18, // secp384r1
        ];

        let (rest, groups) = parse(&data).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            groups,
            vec![
                NamedGroup::X25519,
                NamedGroup::Secp256r1,
                NamedGroup::Unknown(0x0100),
                NamedGroup::Secp384r1,
            ]
        );

        let mut out = Vec::new();
        serialize(&groups, &mut out);
        assert_eq!(out, data);
    }
}
