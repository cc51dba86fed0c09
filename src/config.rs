use std::time::Duration;

use crate::error::ConfigurationError;
use crate::message::{EcPointFormat, EcPointFormats, HeartbeatMode, NamedGroup};
use crate::message::{SignatureAndHashAlgorithm, DATAGRAM_HEADER_LEN, MAX_BODY_LEN};
use crate::record::MAX_RECORD_LENGTH;
use crate::types::{CipherSuite, ConnectionEnd, ProtocolVersion};

const DEFAULT_MAX_HANDSHAKE_LEN: usize = 64 * 1024;

/// Session policy.
///
/// Immutable once built. Every connection reads it through its context.
#[derive(Debug, Clone)]
pub struct Config {
    highest_protocol_version: ProtocolVersion,
    connection_end: ConnectionEnd,
    default_client_supported_cipher_suites: Vec<CipherSuite>,
    add_server_name_indication_extension: bool,
    add_renegotiation_info_extension: bool,
    add_signature_and_hash_algorithms_extension: bool,
    add_ec_point_format_extension: bool,
    add_elliptic_curve_extension: bool,
    add_heartbeat_extension: bool,
    add_extended_master_secret_extension: bool,
    add_padding_extension: bool,
    server_name: String,
    supported_signature_and_hash_algorithms: Vec<SignatureAndHashAlgorithm>,
    named_groups: Vec<NamedGroup>,
    point_formats: EcPointFormats,
    heartbeat_mode: HeartbeatMode,
    padding_extension_length: usize,
    certificate_chain: Vec<Vec<u8>>,
    quick_receive: bool,
    early_stop: bool,
    stop_actions_after_fatal: bool,
    stop_receiving_after_fatal: bool,
    receive_timeout: Duration,
    max_record_length: usize,
    dtls_max_fragment_length: usize,
    max_handshake_message_length: usize,
    rng_seed: Option<u64>,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Version offered in the ClientHello and used for records until the
    /// server selects one.
    #[inline(always)]
    pub fn highest_protocol_version(&self) -> ProtocolVersion {
        self.highest_protocol_version
    }

    #[inline(always)]
    pub fn connection_end(&self) -> ConnectionEnd {
        self.connection_end
    }

    /// Suites offered by a client, in preference order.
    #[inline(always)]
    pub fn default_client_supported_cipher_suites(&self) -> &[CipherSuite] {
        &self.default_client_supported_cipher_suites
    }

    #[inline(always)]
    pub fn add_server_name_indication_extension(&self) -> bool {
        self.add_server_name_indication_extension
    }

    #[inline(always)]
    pub fn add_renegotiation_info_extension(&self) -> bool {
        self.add_renegotiation_info_extension
    }

    #[inline(always)]
    pub fn add_signature_and_hash_algorithms_extension(&self) -> bool {
        self.add_signature_and_hash_algorithms_extension
    }

    #[inline(always)]
    pub fn add_ec_point_format_extension(&self) -> bool {
        self.add_ec_point_format_extension
    }

    /// The supported_groups extension, "elliptic_curves" before RFC 8422.
    #[inline(always)]
    pub fn add_elliptic_curve_extension(&self) -> bool {
        self.add_elliptic_curve_extension
    }

    #[inline(always)]
    pub fn add_heartbeat_extension(&self) -> bool {
        self.add_heartbeat_extension
    }

    #[inline(always)]
    pub fn add_extended_master_secret_extension(&self) -> bool {
        self.add_extended_master_secret_extension
    }

    #[inline(always)]
    pub fn add_padding_extension(&self) -> bool {
        self.add_padding_extension
    }

    /// Host name sent in the server_name extension.
    #[inline(always)]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    #[inline(always)]
    pub fn supported_signature_and_hash_algorithms(&self) -> &[SignatureAndHashAlgorithm] {
        &self.supported_signature_and_hash_algorithms
    }

    #[inline(always)]
    pub fn named_groups(&self) -> &[NamedGroup] {
        &self.named_groups
    }

    #[inline(always)]
    pub fn point_formats(&self) -> &EcPointFormats {
        &self.point_formats
    }

    #[inline(always)]
    pub fn heartbeat_mode(&self) -> HeartbeatMode {
        self.heartbeat_mode
    }

    /// Zero bytes carried by the padding extension.
    #[inline(always)]
    pub fn padding_extension_length(&self) -> usize {
        self.padding_extension_length
    }

    /// DER certificates sent in a Certificate message.
    #[inline(always)]
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.certificate_chain
    }

    /// Return from a receive as soon as something arrived, rather than
    /// waiting out the whole timeout.
    #[inline(always)]
    pub fn quick_receive(&self) -> bool {
        self.quick_receive
    }

    /// Stop reading the current batch at the first fatal alert.
    #[inline(always)]
    pub fn early_stop(&self) -> bool {
        self.early_stop
    }

    /// Send nothing more once a fatal alert was received.
    #[inline(always)]
    pub fn stop_actions_after_fatal(&self) -> bool {
        self.stop_actions_after_fatal
    }

    /// Receive nothing more once a fatal alert was received.
    #[inline(always)]
    pub fn stop_receiving_after_fatal(&self) -> bool {
        self.stop_receiving_after_fatal
    }

    /// How long a receive waits for bytes.
    #[inline(always)]
    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    /// Largest cleartext per record.
    #[inline(always)]
    pub fn max_record_length(&self) -> usize {
        self.max_record_length
    }

    /// Largest datagram handshake fragment, header included.
    #[inline(always)]
    pub fn dtls_max_fragment_length(&self) -> usize {
        self.dtls_max_fragment_length
    }

    /// Largest handshake body accepted from the peer.
    #[inline(always)]
    pub fn max_handshake_message_length(&self) -> usize {
        self.max_handshake_message_length
    }

    /// Seed for randoms and explicit IVs. `None` draws from the OS.
    #[inline(always)]
    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    highest_protocol_version: ProtocolVersion,
    connection_end: ConnectionEnd,
    default_client_supported_cipher_suites: Vec<CipherSuite>,
    add_server_name_indication_extension: bool,
    add_renegotiation_info_extension: bool,
    add_signature_and_hash_algorithms_extension: bool,
    add_ec_point_format_extension: bool,
    add_elliptic_curve_extension: bool,
    add_heartbeat_extension: bool,
    add_extended_master_secret_extension: bool,
    add_padding_extension: bool,
    server_name: String,
    supported_signature_and_hash_algorithms: Vec<SignatureAndHashAlgorithm>,
    named_groups: Vec<NamedGroup>,
    point_formats: EcPointFormats,
    heartbeat_mode: HeartbeatMode,
    padding_extension_length: usize,
    certificate_chain: Vec<Vec<u8>>,
    quick_receive: bool,
    early_stop: bool,
    stop_actions_after_fatal: bool,
    stop_receiving_after_fatal: bool,
    receive_timeout: Duration,
    max_record_length: usize,
    dtls_max_fragment_length: usize,
    max_handshake_message_length: usize,
    rng_seed: Option<u64>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        let mut point_formats = EcPointFormats::new();
        point_formats.push(EcPointFormat::Uncompressed);

        ConfigBuilder {
            highest_protocol_version: ProtocolVersion::TLS1_2,
            connection_end: ConnectionEnd::Client,
            default_client_supported_cipher_suites: vec![
                CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256,
                CipherSuite::RSA_WITH_AES_128_GCM_SHA256,
                CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::RSA_WITH_AES_256_CBC_SHA,
            ],
            add_server_name_indication_extension: false,
            add_renegotiation_info_extension: false,
            add_signature_and_hash_algorithms_extension: false,
            add_ec_point_format_extension: false,
            add_elliptic_curve_extension: false,
            add_heartbeat_extension: false,
            add_extended_master_secret_extension: false,
            add_padding_extension: false,
            server_name: "localhost".to_string(),
            supported_signature_and_hash_algorithms: SignatureAndHashAlgorithm::supported(),
            named_groups: vec![
                NamedGroup::Secp256r1,
                NamedGroup::Secp384r1,
                NamedGroup::X25519,
            ],
            point_formats,
            heartbeat_mode: HeartbeatMode::PeerAllowedToSend,
            padding_extension_length: 6,
            certificate_chain: Vec::new(),
            quick_receive: false,
            early_stop: false,
            stop_actions_after_fatal: false,
            stop_receiving_after_fatal: false,
            receive_timeout: Duration::from_secs(1),
            max_record_length: MAX_RECORD_LENGTH,
            dtls_max_fragment_length: 1150,
            max_handshake_message_length: DEFAULT_MAX_HANDSHAKE_LEN,
            rng_seed: None,
        }
    }
}

impl ConfigBuilder {
    /// Defaults to TLS 1.2.
    pub fn highest_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.highest_protocol_version = version;
        self
    }

    /// Defaults to client.
    pub fn connection_end(mut self, end: ConnectionEnd) -> Self {
        self.connection_end = end;
        self
    }

    /// Set the suites offered by a client.
    ///
    /// Must not be empty.
    pub fn default_client_supported_cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.default_client_supported_cipher_suites = suites;
        self
    }

    /// Defaults to false.
    pub fn add_server_name_indication_extension(mut self, add: bool) -> Self {
        self.add_server_name_indication_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_renegotiation_info_extension(mut self, add: bool) -> Self {
        self.add_renegotiation_info_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_signature_and_hash_algorithms_extension(mut self, add: bool) -> Self {
        self.add_signature_and_hash_algorithms_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_ec_point_format_extension(mut self, add: bool) -> Self {
        self.add_ec_point_format_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_elliptic_curve_extension(mut self, add: bool) -> Self {
        self.add_elliptic_curve_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_heartbeat_extension(mut self, add: bool) -> Self {
        self.add_heartbeat_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_extended_master_secret_extension(mut self, add: bool) -> Self {
        self.add_extended_master_secret_extension = add;
        self
    }

    /// Defaults to false.
    pub fn add_padding_extension(mut self, add: bool) -> Self {
        self.add_padding_extension = add;
        self
    }

    /// Defaults to "localhost".
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    pub fn supported_signature_and_hash_algorithms(
        mut self,
        algorithms: Vec<SignatureAndHashAlgorithm>,
    ) -> Self {
        self.supported_signature_and_hash_algorithms = algorithms;
        self
    }

    /// Defaults to secp256r1, secp384r1 and x25519.
    pub fn named_groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.named_groups = groups;
        self
    }

    /// Defaults to uncompressed only.
    pub fn point_formats(mut self, formats: EcPointFormats) -> Self {
        self.point_formats = formats;
        self
    }

    pub fn heartbeat_mode(mut self, mode: HeartbeatMode) -> Self {
        self.heartbeat_mode = mode;
        self
    }

    /// Defaults to 6.
    pub fn padding_extension_length(mut self, len: usize) -> Self {
        self.padding_extension_length = len;
        self
    }

    pub fn certificate_chain(mut self, chain: Vec<Vec<u8>>) -> Self {
        self.certificate_chain = chain;
        self
    }

    /// Defaults to false.
    pub fn quick_receive(mut self, quick: bool) -> Self {
        self.quick_receive = quick;
        self
    }

    /// Defaults to false.
    pub fn early_stop(mut self, stop: bool) -> Self {
        self.early_stop = stop;
        self
    }

    /// Defaults to false.
    pub fn stop_actions_after_fatal(mut self, stop: bool) -> Self {
        self.stop_actions_after_fatal = stop;
        self
    }

    /// Defaults to false.
    pub fn stop_receiving_after_fatal(mut self, stop: bool) -> Self {
        self.stop_receiving_after_fatal = stop;
        self
    }

    /// Defaults to 1 second.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Defaults to 2^14, which is also the maximum.
    pub fn max_record_length(mut self, len: usize) -> Self {
        self.max_record_length = len;
        self
    }

    /// Defaults to 1150.
    pub fn dtls_max_fragment_length(mut self, len: usize) -> Self {
        self.dtls_max_fragment_length = len;
        self
    }

    /// Defaults to 64 KiB. Received messages declaring a longer body are
    /// dropped without buffering.
    pub fn max_handshake_message_length(mut self, len: usize) -> Self {
        self.max_handshake_message_length = len;
        self
    }

    /// Defaults to unseeded.
    pub fn rng_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config, ConfigurationError> {
        if self.default_client_supported_cipher_suites.is_empty() {
            return Err(ConfigurationError::new("No cipher suites configured"));
        }
        if self.max_record_length == 0 || self.max_record_length > MAX_RECORD_LENGTH {
            return Err(ConfigurationError::new(format!(
                "max_record_length {} outside 1..={}",
                self.max_record_length, MAX_RECORD_LENGTH
            )));
        }
        if self.highest_protocol_version.is_dtls()
            && self.dtls_max_fragment_length <= DATAGRAM_HEADER_LEN
        {
            return Err(ConfigurationError::new(format!(
                "dtls_max_fragment_length {} leaves no room after the {} byte header",
                self.dtls_max_fragment_length, DATAGRAM_HEADER_LEN
            )));
        }

        if self.max_handshake_message_length == 0
            || self.max_handshake_message_length > MAX_BODY_LEN as usize
        {
            return Err(ConfigurationError::new(format!(
                "max_handshake_message_length {} outside 1..={}",
                self.max_handshake_message_length, MAX_BODY_LEN
            )));
        }

        Ok(Config {
            highest_protocol_version: self.highest_protocol_version,
            connection_end: self.connection_end,
            default_client_supported_cipher_suites: self.default_client_supported_cipher_suites,
            add_server_name_indication_extension: self.add_server_name_indication_extension,
            add_renegotiation_info_extension: self.add_renegotiation_info_extension,
            add_signature_and_hash_algorithms_extension: self
                .add_signature_and_hash_algorithms_extension,
            add_ec_point_format_extension: self.add_ec_point_format_extension,
            add_elliptic_curve_extension: self.add_elliptic_curve_extension,
            add_heartbeat_extension: self.add_heartbeat_extension,
            add_extended_master_secret_extension: self.add_extended_master_secret_extension,
            add_padding_extension: self.add_padding_extension,
            server_name: self.server_name,
            supported_signature_and_hash_algorithms: self.supported_signature_and_hash_algorithms,
            named_groups: self.named_groups,
            point_formats: self.point_formats,
            heartbeat_mode: self.heartbeat_mode,
            padding_extension_length: self.padding_extension_length,
            certificate_chain: self.certificate_chain,
            quick_receive: self.quick_receive,
            early_stop: self.early_stop,
            stop_actions_after_fatal: self.stop_actions_after_fatal,
            stop_receiving_after_fatal: self.stop_receiving_after_fatal,
            receive_timeout: self.receive_timeout,
            max_record_length: self.max_record_length,
            dtls_max_fragment_length: self.dtls_max_fragment_length,
            max_handshake_message_length: self.max_handshake_message_length,
            rng_seed: self.rng_seed,
        })
    }
}
