use nom::bytes::complete::take;
use nom::multi::many0;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

/// Hash half of a TLS 1.2 signature_algorithms entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureHash {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Unknown(u8),
}

impl SignatureHash {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => SignatureHash::Md5,
            2 => SignatureHash::Sha1,
            3 => SignatureHash::Sha224,
            4 => SignatureHash::Sha256,
            5 => SignatureHash::Sha384,
            6 => SignatureHash::Sha512,
            _ => SignatureHash::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            SignatureHash::Md5 => 1,
            SignatureHash::Sha1 => 2,
            SignatureHash::Sha224 => 3,
            SignatureHash::Sha256 => 4,
            SignatureHash::Sha384 => 5,
            SignatureHash::Sha512 => 6,
            SignatureHash::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    Rsa,
    Dsa,
    Ecdsa,
    Unknown(u8),
}

impl SignatureAlgorithm {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => SignatureAlgorithm::Rsa,
            2 => SignatureAlgorithm::Dsa,
            3 => SignatureAlgorithm::Ecdsa,
            _ => SignatureAlgorithm::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            SignatureAlgorithm::Rsa => 1,
            SignatureAlgorithm::Dsa => 2,
            SignatureAlgorithm::Ecdsa => 3,
            SignatureAlgorithm::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureAndHashAlgorithm {
    pub hash: SignatureHash,
    pub signature: SignatureAlgorithm,
}

impl SignatureAndHashAlgorithm {
    pub fn new(hash: SignatureHash, signature: SignatureAlgorithm) -> Self {
        SignatureAndHashAlgorithm { hash, signature }
    }

    /// The pairs offered unless configured otherwise.
    pub fn supported() -> Vec<SignatureAndHashAlgorithm> {
        use SignatureAlgorithm::*;
        use SignatureHash::*;
        vec![
            Self::new(Sha256, Rsa),
            Self::new(Sha384, Rsa),
            Self::new(Sha1, Rsa),
            Self::new(Sha256, Ecdsa),
            Self::new(Sha384, Ecdsa),
            Self::new(Sha1, Ecdsa),
            Self::new(Sha256, Dsa),
            Self::new(Sha1, Dsa),
        ]
    }

    pub fn as_u16(&self) -> u16 {
        ((self.hash.as_u8() as u16) << 8) | self.signature.as_u8() as u16
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], SignatureAndHashAlgorithm> {
        let (input, hash) = be_u8(input)?;
        let (input, signature) = be_u8(input)?;
        Ok((
            input,
            SignatureAndHashAlgorithm {
                hash: SignatureHash::from_u8(hash),
                signature: SignatureAlgorithm::from_u8(signature),
            },
        ))
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], Vec<SignatureAndHashAlgorithm>> {
    let (input, len) = be_u16(input)?;
    let (input, data) = take(len as usize)(input)?;
    let (_, algorithms) = many0(SignatureAndHashAlgorithm::parse)(data)?;
    Ok((input, algorithms))
}

pub fn serialize(algorithms: &[SignatureAndHashAlgorithm], output: &mut Vec<u8>) {
    output.extend_from_slice(&((algorithms.len() * 2) as u16).to_be_bytes());
    for alg in algorithms {
        output.extend_from_slice(&alg.as_u16().to_be_bytes());
    }
}
