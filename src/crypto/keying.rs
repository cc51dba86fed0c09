//! Key block partitioning (RFC 5246 Section 6.3).

use zeroize::Zeroize;

use super::prf::key_expansion;
use crate::error::Error;
use crate::types::{CipherSuite, ProtocolVersion};

/// Keys protecting one direction of traffic.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    pub mac_key: Vec<u8>,
    pub enc_key: Vec<u8>,
    pub iv: Vec<u8>,
}

impl Drop for DirectionKeys {
    fn drop(&mut self) {
        self.mac_key.zeroize();
        self.enc_key.zeroize();
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for DirectionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectionKeys")
            .field("mac_key", &self.mac_key.len())
            .field("enc_key", &self.enc_key.len())
            .field("iv", &self.iv.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBlock {
    pub client: DirectionKeys,
    pub server: DirectionKeys,
}

impl KeyBlock {
    /// Expand the master secret and split it into
    /// `client_mac | server_mac | client_key | server_key | client_iv | server_iv`.
    pub fn derive(
        suite: CipherSuite,
        version: ProtocolVersion,
        master_secret: &[u8],
        client_random: &[u8],
        server_random: &[u8],
    ) -> Result<Self, Error> {
        if !version.is_tls12_or_later() {
            return Err(Error::CipherSetup(format!(
                "Key derivation for {} is not supported",
                version
            )));
        }

        let mac_len = suite.mac_algorithm().key_len();
        let key_len = suite.bulk_cipher().key_len();
        let iv_len = suite.bulk_cipher().fixed_iv_len();
        let total = 2 * (mac_len + key_len + iv_len);

        let mut material = key_expansion(
            master_secret,
            client_random,
            server_random,
            total,
            suite.prf_hash(),
        )?;

        let mut take = {
            let mut offset = 0;
            let material = &material;
            move |n: usize| {
                let v = material[offset..offset + n].to_vec();
                offset += n;
                v
            }
        };

        let client_mac = take(mac_len);
        let server_mac = take(mac_len);
        let client_key = take(key_len);
        let server_key = take(key_len);
        let client_iv = take(iv_len);
        let server_iv = take(iv_len);

        material.zeroize();

        Ok(KeyBlock {
            client: DirectionKeys {
                mac_key: client_mac,
                enc_key: client_key,
                iv: client_iv,
            },
            server: DirectionKeys {
                mac_key: server_mac,
                enc_key: server_key,
                iv: server_iv,
            },
        })
    }
}
