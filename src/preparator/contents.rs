use super::extensions::{prepare_extension_length, prepare_extensions};
use super::PrepareContents;
use crate::context::TlsContext;
use crate::crypto::{transcript_hash, verify_data};
use crate::error::PreparationError;
use crate::message::{HandshakeMessage, MessageBody};
use crate::types::{ConnectionEnd, HandshakeType};

/// DTLS HelloVerifyRequest cookie length when we make one up.
const COOKIE_LEN: usize = 16;

fn wrong_body(expected: HandshakeType, actual: HandshakeType) -> PreparationError {
    PreparationError::new(
        "body",
        format!("{} preparator given a {} body", expected, actual),
    )
}

pub struct ClientHelloPreparator;

impl PrepareContents for ClientHelloPreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ClientHello
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        let random = context.client_random_or_init();
        let dtls = context.framing() == crate::record::Framing::Datagram;
        let config = context.config();

        let actual = message.message_type();

        let MessageBody::ClientHello(hello) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };

        hello.client_version = config.highest_protocol_version();
        hello.random = Some(random);
        hello.session_id = context.session_id.clone();
        hello.cookie = dtls.then(|| context.dtls_cookie.clone());
        hello.cipher_suites = config.default_client_supported_cipher_suites().to_vec();
        debug!(
            "ClientHello {} with {} suites",
            hello.client_version,
            hello.cipher_suites.len()
        );

        prepare_extensions(message)?;
        prepare_extension_length(message)
    }
}

pub struct ServerHelloPreparator;

impl PrepareContents for ServerHelloPreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ServerHello
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        let random = context.server_random_or_init();

        let actual = message.message_type();

        let MessageBody::ServerHello(hello) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };

        hello.server_version = context.protocol_version();
        hello.random = Some(random);
        hello.session_id = context.session_id.clone();
        hello.cipher_suite = context.cipher_suite();
        debug!("ServerHello {} {}", hello.server_version, hello.cipher_suite);

        prepare_extensions(message)?;
        prepare_extension_length(message)
    }
}

pub struct HelloVerifyRequestPreparator;

impl PrepareContents for HelloVerifyRequestPreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::HelloVerifyRequest
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        if context.dtls_cookie.is_empty() {
            let mut cookie = vec![0u8; COOKIE_LEN];
            context.rng().fill(&mut cookie);
            context.dtls_cookie = cookie;
        }

        let actual = message.message_type();

        let MessageBody::HelloVerifyRequest(request) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };

        request.server_version = context.protocol_version();
        request.cookie = context.dtls_cookie.clone();
        Ok(())
    }
}

pub struct CertificatePreparator;

impl PrepareContents for CertificatePreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::Certificate
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        let actual = message.message_type();
        let MessageBody::Certificate(certificate) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };

        certificate.certificate_list = context.config().certificate_chain().to_vec();
        Ok(())
    }
}

/// Takes the exchange bytes from the context unless the message already has
/// some.
fn exchange_bytes(
    current: &mut Vec<u8>,
    context: &TlsContext,
    field: &'static str,
) -> Result<(), PreparationError> {
    if !context.key_exchange_payload.is_empty() {
        *current = context.key_exchange_payload.clone();
    }
    if current.is_empty() {
        return Err(PreparationError::new(field, "no key exchange bytes"));
    }
    Ok(())
}

pub struct ServerKeyExchangePreparator;

impl PrepareContents for ServerKeyExchangePreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ServerKeyExchange
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        let actual = message.message_type();
        let MessageBody::ServerKeyExchange(ske) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };
        exchange_bytes(&mut ske.params, context, "params")
    }
}

pub struct ClientKeyExchangePreparator;

impl PrepareContents for ClientKeyExchangePreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ClientKeyExchange
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        let actual = message.message_type();
        let MessageBody::ClientKeyExchange(cke) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };
        exchange_bytes(&mut cke.exchange_keys, context, "exchange_keys")
    }
}

pub struct FinishedPreparator;

impl PrepareContents for FinishedPreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::Finished
    }

    fn prepare_contents(
        &self,
        message: &mut HandshakeMessage,
        context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        let version = context.protocol_version();
        if !version.is_tls12_or_later() {
            return Err(PreparationError::new(
                "verify_data",
                format!("Finished for {} is not supported", version),
            ));
        }
        let master = context
            .master_secret()
            .ok_or_else(|| PreparationError::new("verify_data", "no master secret"))?;

        let label = match context.connection_end() {
            ConnectionEnd::Client => "client finished",
            ConnectionEnd::Server => "server finished",
        };
        let hash = context.cipher_suite().prf_hash();
        let handshake_hash = transcript_hash(hash, context.transcript());
        let data = verify_data(master, label, &handshake_hash, hash)
            .map_err(|e| PreparationError::new("verify_data", e.to_string()))?;

        let actual = message.message_type();

        let MessageBody::Finished(finished) = &mut message.body else {
            return Err(wrong_body(self.message_type(), actual));
        };
        finished.verify_data = data;
        Ok(())
    }
}

pub struct ServerHelloDonePreparator;

impl PrepareContents for ServerHelloDonePreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::ServerHelloDone
    }

    fn prepare_contents(
        &self,
        _message: &mut HandshakeMessage,
        _context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        Ok(())
    }
}

pub struct HelloRequestPreparator;

impl PrepareContents for HelloRequestPreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::HelloRequest
    }

    fn prepare_contents(
        &self,
        _message: &mut HandshakeMessage,
        _context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        Ok(())
    }
}

/// Unknown and unmodelled types go out as their raw body.
pub struct UnknownPreparator;

impl PrepareContents for UnknownPreparator {
    fn message_type(&self) -> HandshakeType {
        HandshakeType::default()
    }

    fn prepare_contents(
        &self,
        _message: &mut HandshakeMessage,
        _context: &mut TlsContext,
    ) -> Result<(), PreparationError> {
        Ok(())
    }
}
