//! Protocol enums and small value types shared across the crate.

mod cipher_suite;
pub use cipher_suite::{BulkCipher, CipherSuite, HashAlgorithm, KeyExchangeAlgorithm, MacAlgorithm};

mod comp_meth;
pub use comp_meth::CompressionMethod;

mod ctype;
pub use ctype::ContentType;

mod ext;
pub use ext::ExtensionType;

mod handshake;
pub use handshake::HandshakeType;

mod random;
pub use random::Random;

mod version;
pub use version::ProtocolVersion;

/// Which side of the connection we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionEnd {
    #[default]
    Client,
    Server,
}

impl ConnectionEnd {
    pub fn peer(&self) -> ConnectionEnd {
        match self {
            ConnectionEnd::Client => ConnectionEnd::Server,
            ConnectionEnd::Server => ConnectionEnd::Client,
        }
    }
}
