use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use nom::IResult;
use tinyvec::ArrayVec;

/// EC point format, RFC 4492 section 5.1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EcPointFormat {
    #[default]
    Uncompressed,
    AnsiX962CompressedPrime,
    AnsiX962CompressedChar2,
    Unknown(u8),
}

impl EcPointFormat {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => EcPointFormat::Uncompressed,
            0x01 => EcPointFormat::AnsiX962CompressedPrime,
            0x02 => EcPointFormat::AnsiX962CompressedChar2,
            _ => EcPointFormat::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            EcPointFormat::Uncompressed => 0x00,
            EcPointFormat::AnsiX962CompressedPrime => 0x01,
            EcPointFormat::AnsiX962CompressedChar2 => 0x02,
            EcPointFormat::Unknown(value) => *value,
        }
    }
}

pub type EcPointFormats = ArrayVec<[EcPointFormat; 4]>;

pub fn parse(input: &[u8]) -> IResult<&[u8], EcPointFormats> {
    let (input, len) = be_u8(input)?;
    let (input, data) = take(len as usize)(input)?;

    // Formats beyond capacity are dropped.
    let mut formats = EcPointFormats::new();
    for value in data.iter().take(formats.capacity()) {
        formats.push(EcPointFormat::from_u8(*value));
    }

    Ok((input, formats))
}

pub fn serialize(formats: &[EcPointFormat], output: &mut Vec<u8>) {
    output.push(formats.len() as u8);
    for format in formats {
        output.push(format.as_u8());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyvec::array_vec;

    #[test]
    fn roundtrip() {
        let formats: EcPointFormats = array_vec![
            EcPointFormat::Uncompressed,
            EcPointFormat::AnsiX962CompressedPrime
        ];

        let mut serialized = Vec::new();
        serialize(&formats, &mut serialized);

        let expected = [
            0x02, // Number of formats
            0x00, // uncompressed
            0x01, // ansiX962_compressed_prime
        ];
        assert_eq!(serialized, expected);

        let (rest, parsed) = parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, formats);
    }
}
