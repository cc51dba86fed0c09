use std::fmt;
use std::time::Duration;

use crate::config::Config;
use crate::error::ConfigurationError;
use crate::record::Record;
use crate::types::{CipherSuite, ContentType, ProtocolVersion};

/// Settings of one attack, turned into a session [`Config`].
pub trait AttackConfig {
    /// Command name the attack is selected by.
    fn command(&self) -> &'static str;

    /// Session configuration for probing.
    fn create_config(&self) -> Result<Config, ConfigurationError>;

    /// Whether the attack yields a verdict by itself. When false the
    /// configuration only prepares sessions for a separate probing step.
    fn is_execute_attack(&self) -> bool;
}

/// Cleartext size of the template record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordSize {
    VeryShort,
    #[default]
    Short,
    Medium,
    Long,
}

impl RecordSize {
    pub fn cleartext_len(&self) -> usize {
        match self {
            RecordSize::VeryShort => 1,
            RecordSize::Short => 16,
            RecordSize::Medium => 80,
            RecordSize::Long => 320,
        }
    }

    /// Application data template of this size in `fresh`.
    pub fn template(&self, fresh: Record) -> Record {
        Record {
            content_type: ContentType::ApplicationData,
            cleartext: vec![b'A'; self.cleartext_len()],
            ..fresh
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "very_short" => Some(RecordSize::VeryShort),
            "short" => Some(RecordSize::Short),
            "medium" => Some(RecordSize::Medium),
            "long" => Some(RecordSize::Long),
            _ => None,
        }
    }
}

/// Which family of malformed records to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VectorStrategy {
    /// Ciphertext layout and declared length.
    RecordShape,
    /// MAC and padding inside the encrypted payload.
    #[default]
    VectorContent,
}

impl VectorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            VectorStrategy::RecordShape => "record_shape",
            VectorStrategy::VectorContent => "vector_content",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "record_shape" => Some(VectorStrategy::RecordShape),
            "vector_content" => Some(VectorStrategy::VectorContent),
            _ => None,
        }
    }
}

impl fmt::Display for VectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration of a CBC padding oracle probe.
///
/// Only CBC suites are meaningful: the probe works by varying what the peer
/// finds after removing CBC padding.
#[derive(Debug, Clone)]
pub struct PaddingOracleConfig {
    cipher_suites: Option<Vec<CipherSuite>>,
    server_name: Option<String>,
    protocol_version: ProtocolVersion,
    vector_strategy: VectorStrategy,
    record_size: RecordSize,
    receive_timeout: Duration,
    rng_seed: Option<u64>,
}

impl PaddingOracleConfig {
    pub const ATTACK_COMMAND: &'static str = "padding_oracle";

    pub fn builder() -> PaddingOracleConfigBuilder {
        PaddingOracleConfigBuilder::default()
    }

    /// Explicitly chosen suites, if any.
    #[inline(always)]
    pub fn cipher_suites(&self) -> Option<&[CipherSuite]> {
        self.cipher_suites.as_deref()
    }

    #[inline(always)]
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    #[inline(always)]
    pub fn vector_strategy(&self) -> VectorStrategy {
        self.vector_strategy
    }

    #[inline(always)]
    pub fn record_size(&self) -> RecordSize {
        self.record_size
    }

    /// Every implemented CBC suite, excluding PSK and SRP authentication.
    pub fn default_cipher_suites() -> Vec<CipherSuite> {
        CipherSuite::implemented()
            .iter()
            .copied()
            .filter(|s| s.is_cbc() && !s.is_psk() && !s.is_srp())
            .collect()
    }

    /// The suites a session would offer.
    ///
    /// An absent or empty explicit list means the default set. Any explicit
    /// suite outside CBC is rejected.
    pub fn selected_cipher_suites(&self) -> Result<Vec<CipherSuite>, ConfigurationError> {
        let suites = match &self.cipher_suites {
            Some(suites) if !suites.is_empty() => suites.clone(),
            _ => return Ok(Self::default_cipher_suites()),
        };

        if let Some(suite) = suites.iter().find(|s| !s.is_cbc()) {
            return Err(ConfigurationError::new(format!(
                "This attack only works with CBC cipher suites, {} is not",
                suite
            )));
        }

        Ok(suites)
    }
}

impl AttackConfig for PaddingOracleConfig {
    fn command(&self) -> &'static str {
        Self::ATTACK_COMMAND
    }

    fn create_config(&self) -> Result<Config, ConfigurationError> {
        let suites = self.selected_cipher_suites()?;
        let contains_ec = suites.iter().any(|s| s.key_exchange().is_elliptic_curve());

        debug!(
            "Padding oracle config: {} suites, EC extensions {}",
            suites.len(),
            contains_ec
        );

        let mut builder = Config::builder()
            .highest_protocol_version(self.protocol_version)
            .default_client_supported_cipher_suites(suites)
            .quick_receive(true)
            .add_renegotiation_info_extension(true)
            .add_server_name_indication_extension(true)
            .add_signature_and_hash_algorithms_extension(true)
            .add_ec_point_format_extension(contains_ec)
            .add_elliptic_curve_extension(contains_ec)
            .early_stop(true)
            .stop_actions_after_fatal(true)
            .stop_receiving_after_fatal(true)
            .receive_timeout(self.receive_timeout)
            .rng_seed(self.rng_seed);

        if let Some(name) = &self.server_name {
            builder = builder.server_name(name.clone());
        }

        builder.build()
    }

    fn is_execute_attack(&self) -> bool {
        false
    }
}

/// Builder for [`PaddingOracleConfig`].
#[derive(Debug, Clone)]
pub struct PaddingOracleConfigBuilder {
    cipher_suites: Option<Vec<CipherSuite>>,
    server_name: Option<String>,
    protocol_version: ProtocolVersion,
    vector_strategy: VectorStrategy,
    record_size: RecordSize,
    receive_timeout: Duration,
    rng_seed: Option<u64>,
}

impl Default for PaddingOracleConfigBuilder {
    fn default() -> Self {
        PaddingOracleConfigBuilder {
            cipher_suites: None,
            server_name: None,
            protocol_version: ProtocolVersion::TLS1_2,
            vector_strategy: VectorStrategy::default(),
            record_size: RecordSize::default(),
            receive_timeout: Duration::from_secs(1),
            rng_seed: None,
        }
    }
}

impl PaddingOracleConfigBuilder {
    /// Suites to offer.
    ///
    /// Defaults to every implemented CBC suite without PSK or SRP.
    pub fn cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = Some(suites);
        self
    }

    /// Defaults to the session default.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Defaults to TLS 1.2.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Defaults to [`VectorStrategy::VectorContent`].
    pub fn vector_strategy(mut self, strategy: VectorStrategy) -> Self {
        self.vector_strategy = strategy;
        self
    }

    /// Defaults to [`RecordSize::Short`].
    pub fn record_size(mut self, size: RecordSize) -> Self {
        self.record_size = size;
        self
    }

    /// Defaults to 1 second.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Defaults to `None`, entropy from the OS.
    pub fn rng_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn build(self) -> PaddingOracleConfig {
        PaddingOracleConfig {
            cipher_suites: self.cipher_suites,
            server_name: self.server_name,
            protocol_version: self.protocol_version,
            vector_strategy: self.vector_strategy,
            record_size: self.record_size,
            receive_timeout: self.receive_timeout,
            rng_seed: self.rng_seed,
        }
    }
}
