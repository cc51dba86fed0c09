//! Per-connection state.
//!
//! One [`TlsContext`] per session, owned by the session and handed by
//! reference to whatever needs it. Nothing here is shared between sessions.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use zeroize::Zeroize;

use crate::config::Config;
use crate::crypto::{self, KeyBlock, RecordCipher};
use crate::error::Error;
use crate::record::Framing;
use crate::rng::SeededRng;
use crate::types::{CipherSuite, ConnectionEnd, ProtocolVersion, Random};

pub struct TlsContext {
    config: Arc<Config>,
    rng: SeededRng,
    connection_end: ConnectionEnd,
    /// Version chosen by the server, once known.
    pub selected_protocol_version: Option<ProtocolVersion>,
    /// Suite chosen by the server, once known.
    pub selected_cipher_suite: Option<CipherSuite>,
    pub client_random: Option<Random>,
    pub server_random: Option<Random>,
    pub session_id: Vec<u8>,
    pub dtls_cookie: Vec<u8>,
    /// Encoded key exchange sent in our next (Client|Server)KeyExchange.
    pub key_exchange_payload: Vec<u8>,
    message_sequence: u16,
    master_secret: Option<Vec<u8>>,
    transcript: Vec<u8>,
}

impl TlsContext {
    pub fn new(config: Arc<Config>) -> Self {
        TlsContext {
            rng: SeededRng::new(config.rng_seed()),
            connection_end: config.connection_end(),
            config,
            selected_protocol_version: None,
            selected_cipher_suite: None,
            client_random: None,
            server_random: None,
            session_id: Vec::new(),
            dtls_cookie: Vec::new(),
            key_exchange_payload: Vec::new(),
            message_sequence: 0,
            master_secret: None,
            transcript: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rng(&mut self) -> &mut SeededRng {
        &mut self.rng
    }

    pub fn connection_end(&self) -> ConnectionEnd {
        self.connection_end
    }

    /// Selected version, or the configured highest before selection.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.selected_protocol_version
            .unwrap_or_else(|| self.config.highest_protocol_version())
    }

    pub fn framing(&self) -> Framing {
        Framing::for_version(self.protocol_version())
    }

    /// Selected suite, or our first configured one before selection.
    pub fn cipher_suite(&self) -> CipherSuite {
        self.selected_cipher_suite.unwrap_or_else(|| {
            self.config
                .default_client_supported_cipher_suites()
                .first()
                .copied()
                .unwrap_or(CipherSuite::Unknown(0))
        })
    }

    /// Datagram message_seq for the next handshake message we send.
    pub fn message_sequence(&self) -> u16 {
        self.message_sequence
    }

    pub fn advance_message_sequence(&mut self) {
        self.message_sequence = self.message_sequence.wrapping_add(1);
    }

    /// Our client random, created on first use.
    pub fn client_random_or_init(&mut self) -> Random {
        if let Some(random) = self.client_random {
            return random;
        }
        let random = self.fresh_random();
        self.client_random = Some(random);
        random
    }

    /// Our server random, created on first use.
    pub fn server_random_or_init(&mut self) -> Random {
        if let Some(random) = self.server_random {
            return random;
        }
        let random = self.fresh_random();
        self.server_random = Some(random);
        random
    }

    fn fresh_random(&mut self) -> Random {
        // Seeded sessions keep the time field fixed too.
        let gmt_unix_time = if self.rng.is_seeded() {
            0
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        };
        Random::new(gmt_unix_time, &mut self.rng)
    }

    pub fn master_secret(&self) -> Option<&[u8]> {
        self.master_secret.as_deref()
    }

    pub fn set_master_secret(&mut self, secret: &[u8]) {
        if let Some(old) = &mut self.master_secret {
            old.zeroize();
        }
        self.master_secret = Some(secret.to_vec());
    }

    /// Derive the master secret from a premaster secret and both randoms.
    pub fn compute_master_secret(&mut self, pre_master_secret: &[u8]) -> Result<(), Error> {
        let (client, server) = self.randoms()?;
        let hash = self.cipher_suite().prf_hash();
        let mut secret = crypto::master_secret(pre_master_secret, &client, &server, hash)?;
        self.set_master_secret(&secret);
        secret.zeroize();
        Ok(())
    }

    /// Handshake messages so far, as hashed for Finished.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    pub fn append_transcript(&mut self, message: &[u8]) {
        self.transcript.extend_from_slice(message);
    }

    /// Record cipher for the selected suite, keyed from the master secret.
    pub fn record_cipher(&self) -> Result<RecordCipher, Error> {
        let master = self
            .master_secret
            .as_deref()
            .ok_or_else(|| Error::CipherSetup("No master secret".to_string()))?;
        let (client, server) = self.randoms()?;
        let suite = self.cipher_suite();
        let version = self.protocol_version();
        let block = KeyBlock::derive(suite, version, master, &client, &server)?;
        RecordCipher::from_key_block(
            suite,
            version,
            self.connection_end,
            &block,
            self.config.rng_seed(),
        )
    }

    fn randoms(&self) -> Result<([u8; 32], [u8; 32]), Error> {
        match (self.client_random, self.server_random) {
            (Some(client), Some(server)) => Ok((client.to_bytes(), server.to_bytes())),
            _ => Err(Error::CipherSetup("Hello randoms not exchanged".to_string())),
        }
    }
}

impl Drop for TlsContext {
    fn drop(&mut self) {
        if let Some(secret) = &mut self.master_secret {
            secret.zeroize();
        }
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("connection_end", &self.connection_end)
            .field("version", &self.protocol_version())
            .field("cipher_suite", &self.cipher_suite())
            .field("message_sequence", &self.message_sequence)
            .field("master_secret", &self.master_secret.is_some())
            .finish()
    }
}
