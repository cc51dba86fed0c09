//! Cipher suite catalog.
//!
//! The catalog is static data. Attributes are resolved by `match` and the
//! implemented subset is computed once, so parallel probe sessions can read it
//! without synchronization.

use std::fmt;

use nom::number::complete::be_u16;
use nom::IResult;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum CipherSuite {
    RSA_WITH_NULL_SHA,                   // 0x0002
    RSA_WITH_3DES_EDE_CBC_SHA,           // 0x000A
    RSA_WITH_AES_128_CBC_SHA,            // 0x002F
    DHE_DSS_WITH_AES_128_CBC_SHA,        // 0x0032
    DHE_RSA_WITH_AES_128_CBC_SHA,        // 0x0033
    RSA_WITH_AES_256_CBC_SHA,            // 0x0035
    DHE_RSA_WITH_AES_256_CBC_SHA,        // 0x0039
    RSA_WITH_AES_128_CBC_SHA256,         // 0x003C
    RSA_WITH_AES_256_CBC_SHA256,         // 0x003D
    DHE_RSA_WITH_AES_128_CBC_SHA256,     // 0x0067
    DHE_RSA_WITH_AES_256_CBC_SHA256,     // 0x006B
    PSK_WITH_AES_128_CBC_SHA,            // 0x008C
    PSK_WITH_AES_256_CBC_SHA,            // 0x008D
    DHE_PSK_WITH_AES_128_CBC_SHA,        // 0x0090
    RSA_WITH_AES_128_GCM_SHA256,         // 0x009C
    RSA_WITH_AES_256_GCM_SHA384,         // 0x009D
    DHE_RSA_WITH_AES_128_GCM_SHA256,     // 0x009E
    ECDH_ECDSA_WITH_AES_128_CBC_SHA,     // 0xC004
    ECDHE_ECDSA_WITH_AES_128_CBC_SHA,    // 0xC009
    ECDHE_ECDSA_WITH_AES_256_CBC_SHA,    // 0xC00A
    ECDHE_RSA_WITH_AES_128_CBC_SHA,      // 0xC013
    ECDHE_RSA_WITH_AES_256_CBC_SHA,      // 0xC014
    SRP_SHA_WITH_AES_128_CBC_SHA,        // 0xC01D
    SRP_SHA_WITH_AES_256_CBC_SHA,        // 0xC020
    ECDHE_ECDSA_WITH_AES_128_CBC_SHA256, // 0xC023
    ECDHE_ECDSA_WITH_AES_256_CBC_SHA384, // 0xC024
    ECDHE_RSA_WITH_AES_128_CBC_SHA256,   // 0xC027
    ECDHE_RSA_WITH_AES_256_CBC_SHA384,   // 0xC028
    ECDHE_ECDSA_WITH_AES_128_GCM_SHA256, // 0xC02B
    ECDHE_ECDSA_WITH_AES_256_GCM_SHA384, // 0xC02C
    ECDHE_RSA_WITH_AES_128_GCM_SHA256,   // 0xC02F
    ECDHE_RSA_WITH_AES_256_GCM_SHA384,   // 0xC030
    ECDHE_PSK_WITH_AES_128_CBC_SHA256,   // 0xC037
    Unknown(u16),
}

/// Suites with a record cipher in this crate.
static IMPLEMENTED: Lazy<Vec<CipherSuite>> = Lazy::new(|| {
    CipherSuite::ALL
        .iter()
        .copied()
        .filter(|s| s.is_implemented())
        .collect()
});

impl CipherSuite {
    pub const ALL: &'static [CipherSuite] = &[
        CipherSuite::RSA_WITH_NULL_SHA,
        CipherSuite::RSA_WITH_3DES_EDE_CBC_SHA,
        CipherSuite::RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::DHE_DSS_WITH_AES_128_CBC_SHA,
        CipherSuite::DHE_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::DHE_RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::RSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::RSA_WITH_AES_256_CBC_SHA256,
        CipherSuite::DHE_RSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::DHE_RSA_WITH_AES_256_CBC_SHA256,
        CipherSuite::PSK_WITH_AES_128_CBC_SHA,
        CipherSuite::PSK_WITH_AES_256_CBC_SHA,
        CipherSuite::DHE_PSK_WITH_AES_128_CBC_SHA,
        CipherSuite::RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::RSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::DHE_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::ECDH_ECDSA_WITH_AES_128_CBC_SHA,
        CipherSuite::ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
        CipherSuite::ECDHE_ECDSA_WITH_AES_256_CBC_SHA,
        CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::ECDHE_RSA_WITH_AES_256_CBC_SHA,
        CipherSuite::SRP_SHA_WITH_AES_128_CBC_SHA,
        CipherSuite::SRP_SHA_WITH_AES_256_CBC_SHA,
        CipherSuite::ECDHE_ECDSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::ECDHE_ECDSA_WITH_AES_256_CBC_SHA384,
        CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA256,
        CipherSuite::ECDHE_RSA_WITH_AES_256_CBC_SHA384,
        CipherSuite::ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        CipherSuite::ECDHE_PSK_WITH_AES_128_CBC_SHA256,
    ];

    /// Catalog entries that have a working record cipher.
    pub fn implemented() -> &'static [CipherSuite] {
        &IMPLEMENTED
    }

    pub fn from_u16(value: u16) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_u16() == value)
            .unwrap_or(CipherSuite::Unknown(value))
    }

    pub fn as_u16(&self) -> u16 {
        use CipherSuite::*;
        match self {
            RSA_WITH_NULL_SHA => 0x0002,
            RSA_WITH_3DES_EDE_CBC_SHA => 0x000A,
            RSA_WITH_AES_128_CBC_SHA => 0x002F,
            DHE_DSS_WITH_AES_128_CBC_SHA => 0x0032,
            DHE_RSA_WITH_AES_128_CBC_SHA => 0x0033,
            RSA_WITH_AES_256_CBC_SHA => 0x0035,
            DHE_RSA_WITH_AES_256_CBC_SHA => 0x0039,
            RSA_WITH_AES_128_CBC_SHA256 => 0x003C,
            RSA_WITH_AES_256_CBC_SHA256 => 0x003D,
            DHE_RSA_WITH_AES_128_CBC_SHA256 => 0x0067,
            DHE_RSA_WITH_AES_256_CBC_SHA256 => 0x006B,
            PSK_WITH_AES_128_CBC_SHA => 0x008C,
            PSK_WITH_AES_256_CBC_SHA => 0x008D,
            DHE_PSK_WITH_AES_128_CBC_SHA => 0x0090,
            RSA_WITH_AES_128_GCM_SHA256 => 0x009C,
            RSA_WITH_AES_256_GCM_SHA384 => 0x009D,
            DHE_RSA_WITH_AES_128_GCM_SHA256 => 0x009E,
            ECDH_ECDSA_WITH_AES_128_CBC_SHA => 0xC004,
            ECDHE_ECDSA_WITH_AES_128_CBC_SHA => 0xC009,
            ECDHE_ECDSA_WITH_AES_256_CBC_SHA => 0xC00A,
            ECDHE_RSA_WITH_AES_128_CBC_SHA => 0xC013,
            ECDHE_RSA_WITH_AES_256_CBC_SHA => 0xC014,
            SRP_SHA_WITH_AES_128_CBC_SHA => 0xC01D,
            SRP_SHA_WITH_AES_256_CBC_SHA => 0xC020,
            ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 => 0xC023,
            ECDHE_ECDSA_WITH_AES_256_CBC_SHA384 => 0xC024,
            ECDHE_RSA_WITH_AES_128_CBC_SHA256 => 0xC027,
            ECDHE_RSA_WITH_AES_256_CBC_SHA384 => 0xC028,
            ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => 0xC02B,
            ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => 0xC02C,
            ECDHE_RSA_WITH_AES_128_GCM_SHA256 => 0xC02F,
            ECDHE_RSA_WITH_AES_256_GCM_SHA384 => 0xC030,
            ECDHE_PSK_WITH_AES_128_CBC_SHA256 => 0xC037,
            Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], CipherSuite> {
        let (input, value) = be_u16(input)?;
        Ok((input, Self::from_u16(value)))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.as_u16().to_be_bytes());
    }

    pub fn key_exchange(&self) -> KeyExchangeAlgorithm {
        use CipherSuite::*;
        use KeyExchangeAlgorithm as Kx;
        match self {
            RSA_WITH_NULL_SHA
            | RSA_WITH_3DES_EDE_CBC_SHA
            | RSA_WITH_AES_128_CBC_SHA
            | RSA_WITH_AES_256_CBC_SHA
            | RSA_WITH_AES_128_CBC_SHA256
            | RSA_WITH_AES_256_CBC_SHA256
            | RSA_WITH_AES_128_GCM_SHA256
            | RSA_WITH_AES_256_GCM_SHA384 => Kx::Rsa,
            DHE_DSS_WITH_AES_128_CBC_SHA => Kx::DheDss,
            DHE_RSA_WITH_AES_128_CBC_SHA
            | DHE_RSA_WITH_AES_256_CBC_SHA
            | DHE_RSA_WITH_AES_128_CBC_SHA256
            | DHE_RSA_WITH_AES_256_CBC_SHA256
            | DHE_RSA_WITH_AES_128_GCM_SHA256 => Kx::DheRsa,
            PSK_WITH_AES_128_CBC_SHA | PSK_WITH_AES_256_CBC_SHA => Kx::Psk,
            DHE_PSK_WITH_AES_128_CBC_SHA => Kx::DhePsk,
            ECDH_ECDSA_WITH_AES_128_CBC_SHA => Kx::EcdhEcdsa,
            ECDHE_ECDSA_WITH_AES_128_CBC_SHA
            | ECDHE_ECDSA_WITH_AES_256_CBC_SHA
            | ECDHE_ECDSA_WITH_AES_128_CBC_SHA256
            | ECDHE_ECDSA_WITH_AES_256_CBC_SHA384
            | ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
            | ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => Kx::EcdheEcdsa,
            ECDHE_RSA_WITH_AES_128_CBC_SHA
            | ECDHE_RSA_WITH_AES_256_CBC_SHA
            | ECDHE_RSA_WITH_AES_128_CBC_SHA256
            | ECDHE_RSA_WITH_AES_256_CBC_SHA384
            | ECDHE_RSA_WITH_AES_128_GCM_SHA256
            | ECDHE_RSA_WITH_AES_256_GCM_SHA384 => Kx::EcdheRsa,
            SRP_SHA_WITH_AES_128_CBC_SHA | SRP_SHA_WITH_AES_256_CBC_SHA => Kx::SrpSha,
            ECDHE_PSK_WITH_AES_128_CBC_SHA256 => Kx::EcdhePsk,
            Unknown(_) => Kx::Unknown,
        }
    }

    pub fn bulk_cipher(&self) -> BulkCipher {
        use CipherSuite::*;
        match self {
            RSA_WITH_NULL_SHA => BulkCipher::Null,
            RSA_WITH_3DES_EDE_CBC_SHA => BulkCipher::TripleDesEdeCbc,
            RSA_WITH_AES_128_CBC_SHA
            | DHE_DSS_WITH_AES_128_CBC_SHA
            | DHE_RSA_WITH_AES_128_CBC_SHA
            | RSA_WITH_AES_128_CBC_SHA256
            | DHE_RSA_WITH_AES_128_CBC_SHA256
            | PSK_WITH_AES_128_CBC_SHA
            | DHE_PSK_WITH_AES_128_CBC_SHA
            | ECDH_ECDSA_WITH_AES_128_CBC_SHA
            | ECDHE_ECDSA_WITH_AES_128_CBC_SHA
            | ECDHE_RSA_WITH_AES_128_CBC_SHA
            | SRP_SHA_WITH_AES_128_CBC_SHA
            | ECDHE_ECDSA_WITH_AES_128_CBC_SHA256
            | ECDHE_RSA_WITH_AES_128_CBC_SHA256
            | ECDHE_PSK_WITH_AES_128_CBC_SHA256 => BulkCipher::Aes128Cbc,
            RSA_WITH_AES_256_CBC_SHA
            | DHE_RSA_WITH_AES_256_CBC_SHA
            | RSA_WITH_AES_256_CBC_SHA256
            | DHE_RSA_WITH_AES_256_CBC_SHA256
            | PSK_WITH_AES_256_CBC_SHA
            | ECDHE_ECDSA_WITH_AES_256_CBC_SHA
            | ECDHE_RSA_WITH_AES_256_CBC_SHA
            | SRP_SHA_WITH_AES_256_CBC_SHA
            | ECDHE_ECDSA_WITH_AES_256_CBC_SHA384
            | ECDHE_RSA_WITH_AES_256_CBC_SHA384 => BulkCipher::Aes256Cbc,
            RSA_WITH_AES_128_GCM_SHA256
            | DHE_RSA_WITH_AES_128_GCM_SHA256
            | ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
            | ECDHE_RSA_WITH_AES_128_GCM_SHA256 => BulkCipher::Aes128Gcm,
            RSA_WITH_AES_256_GCM_SHA384
            | ECDHE_ECDSA_WITH_AES_256_GCM_SHA384
            | ECDHE_RSA_WITH_AES_256_GCM_SHA384 => BulkCipher::Aes256Gcm,
            Unknown(_) => BulkCipher::Unknown,
        }
    }

    pub fn mac_algorithm(&self) -> MacAlgorithm {
        use CipherSuite::*;
        if self.is_aead() {
            return MacAlgorithm::Aead;
        }
        match self {
            RSA_WITH_AES_128_CBC_SHA256
            | RSA_WITH_AES_256_CBC_SHA256
            | DHE_RSA_WITH_AES_128_CBC_SHA256
            | DHE_RSA_WITH_AES_256_CBC_SHA256
            | ECDHE_ECDSA_WITH_AES_128_CBC_SHA256
            | ECDHE_RSA_WITH_AES_128_CBC_SHA256
            | ECDHE_PSK_WITH_AES_128_CBC_SHA256 => MacAlgorithm::HmacSha256,
            ECDHE_ECDSA_WITH_AES_256_CBC_SHA384 | ECDHE_RSA_WITH_AES_256_CBC_SHA384 => {
                MacAlgorithm::HmacSha384
            }
            Unknown(_) => MacAlgorithm::Null,
            _ => MacAlgorithm::HmacSha1,
        }
    }

    /// Hash used by the TLS 1.2 PRF and the handshake transcript.
    pub fn prf_hash(&self) -> HashAlgorithm {
        use CipherSuite::*;
        match self {
            RSA_WITH_AES_256_GCM_SHA384
            | ECDHE_ECDSA_WITH_AES_256_GCM_SHA384
            | ECDHE_RSA_WITH_AES_256_GCM_SHA384
            | ECDHE_ECDSA_WITH_AES_256_CBC_SHA384
            | ECDHE_RSA_WITH_AES_256_CBC_SHA384 => HashAlgorithm::Sha384,
            _ => HashAlgorithm::Sha256,
        }
    }

    pub fn is_cbc(&self) -> bool {
        self.bulk_cipher().is_cbc()
    }

    pub fn is_aead(&self) -> bool {
        matches!(
            self.bulk_cipher(),
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm
        )
    }

    pub fn is_psk(&self) -> bool {
        matches!(
            self.key_exchange(),
            KeyExchangeAlgorithm::Psk | KeyExchangeAlgorithm::DhePsk | KeyExchangeAlgorithm::EcdhePsk
        )
    }

    pub fn is_srp(&self) -> bool {
        self.key_exchange() == KeyExchangeAlgorithm::SrpSha
    }

    pub fn is_implemented(&self) -> bool {
        matches!(
            self.bulk_cipher(),
            BulkCipher::Aes128Cbc
                | BulkCipher::Aes256Cbc
                | BulkCipher::Aes128Gcm
                | BulkCipher::Aes256Gcm
        )
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherSuite::Unknown(v) => write!(f, "TLS_UNKNOWN_0x{:04X}", v),
            _ => write!(f, "TLS_{:?}", self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    Rsa,
    DheDss,
    DheRsa,
    Psk,
    DhePsk,
    SrpSha,
    EcdhEcdsa,
    EcdheEcdsa,
    EcdheRsa,
    EcdhePsk,
    Unknown,
}

impl KeyExchangeAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            KeyExchangeAlgorithm::Rsa => "RSA",
            KeyExchangeAlgorithm::DheDss => "DHE_DSS",
            KeyExchangeAlgorithm::DheRsa => "DHE_RSA",
            KeyExchangeAlgorithm::Psk => "PSK",
            KeyExchangeAlgorithm::DhePsk => "DHE_PSK",
            KeyExchangeAlgorithm::SrpSha => "SRP_SHA",
            KeyExchangeAlgorithm::EcdhEcdsa => "ECDH_ECDSA",
            KeyExchangeAlgorithm::EcdheEcdsa => "ECDHE_ECDSA",
            KeyExchangeAlgorithm::EcdheRsa => "ECDHE_RSA",
            KeyExchangeAlgorithm::EcdhePsk => "ECDHE_PSK",
            KeyExchangeAlgorithm::Unknown => "UNKNOWN",
        }
    }

    /// Key exchange over an elliptic curve group.
    pub fn is_elliptic_curve(&self) -> bool {
        matches!(
            self,
            KeyExchangeAlgorithm::EcdhEcdsa
                | KeyExchangeAlgorithm::EcdheEcdsa
                | KeyExchangeAlgorithm::EcdheRsa
                | KeyExchangeAlgorithm::EcdhePsk
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkCipher {
    Null,
    TripleDesEdeCbc,
    Aes128Cbc,
    Aes256Cbc,
    Aes128Gcm,
    Aes256Gcm,
    Unknown,
}

impl BulkCipher {
    pub fn is_cbc(&self) -> bool {
        matches!(
            self,
            BulkCipher::TripleDesEdeCbc | BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc
        )
    }

    pub fn key_len(&self) -> usize {
        match self {
            BulkCipher::Null | BulkCipher::Unknown => 0,
            BulkCipher::TripleDesEdeCbc => 24,
            BulkCipher::Aes128Cbc | BulkCipher::Aes128Gcm => 16,
            BulkCipher::Aes256Cbc | BulkCipher::Aes256Gcm => 32,
        }
    }

    /// Length of the implicit IV taken from the key block.
    pub fn fixed_iv_len(&self) -> usize {
        match self {
            BulkCipher::Null | BulkCipher::Unknown => 0,
            BulkCipher::TripleDesEdeCbc => 8,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => 4,
        }
    }

    pub fn block_size(&self) -> usize {
        match self {
            BulkCipher::TripleDesEdeCbc => 8,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgorithm {
    Null,
    HmacSha1,
    HmacSha256,
    HmacSha384,
    Aead,
}

impl MacAlgorithm {
    pub fn mac_len(&self) -> usize {
        match self {
            MacAlgorithm::Null | MacAlgorithm::Aead => 0,
            MacAlgorithm::HmacSha1 => 20,
            MacAlgorithm::HmacSha256 => 32,
            MacAlgorithm::HmacSha384 => 48,
        }
    }

    /// MAC keys are as long as the MAC output.
    pub fn key_len(&self) -> usize {
        self.mac_len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
}
