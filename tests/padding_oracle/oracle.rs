//! Probing a simulated peer.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tlsprobe::attack::{
    probe, scan, AttackConfig, PaddingOracleConfig, PaddingVector, RecordSize, VectorStrategy,
};
use tlsprobe::connection::{Connection, MemoryTransport, Transport};
use tlsprobe::message::AlertDescription;
use tlsprobe::record::{RecordLayer, TlsRecordLayer};
use tlsprobe::types::{CipherSuite, ContentType};
use tlsprobe::{Config, DecryptionError, Error, TlsContext};

use crate::common::*;

const BAD_RECORD_MAC: u8 = 20;
const DECRYPTION_FAILED: u8 = 21;
const DECODE_ERROR: u8 = 50;

/// Peer that decrypts what it is sent and answers with an alert.
struct SimulatedServer {
    layer: TlsRecordLayer,
    /// Answer bad padding differently from a bad MAC.
    leaky: bool,
    replies: VecDeque<Vec<u8>>,
}

impl SimulatedServer {
    fn new(leaky: bool) -> Self {
        SimulatedServer {
            layer: keyed_server_layer(),
            leaky,
            replies: VecDeque::new(),
        }
    }
}

impl Transport for SimulatedServer {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let records = match self.layer.parse_records(data) {
            Ok(records) => records,
            Err(_) => {
                self.replies.push_back(fatal_alert(DECODE_ERROR));
                return Ok(());
            }
        };
        for mut record in records {
            let reply = match self.layer.decrypt_record(&mut record) {
                Err(DecryptionError::BadPadding) if self.leaky => DECRYPTION_FAILED,
                _ => BAD_RECORD_MAC,
            };
            self.replies.push_back(fatal_alert(reply));
        }
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        Ok(self.replies.pop_front())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

fn attack_config() -> Config {
    PaddingOracleConfig::builder()
        .cipher_suites(vec![CipherSuite::RSA_WITH_AES_128_CBC_SHA])
        .receive_timeout(Duration::from_millis(50))
        .rng_seed(Some(3))
        .build()
        .create_config()
        .unwrap()
}

fn session(leaky: bool) -> Result<Connection<SimulatedServer>, Error> {
    let mut conn = Connection::new(
        TlsContext::new(Arc::new(attack_config())),
        SimulatedServer::new(leaky),
    );
    conn.record_layer_mut().set_record_cipher(client_cipher());
    conn.record_layer_mut().update_encryption_cipher()?;
    Ok(conn)
}

#[test]
fn leaky_server_is_flagged() {
    let _ = env_logger::try_init();

    let template = template(RecordSize::Short);
    let mut generator = VectorStrategy::VectorContent.generator(&template);
    let report = scan(generator.as_mut(), || session(true)).unwrap();

    assert!(report.is_vulnerable());
    assert_eq!(report.groups().len(), 2);

    let padding_group = report
        .groups()
        .iter()
        .find(|(f, _)| f.alerts[0].description == AlertDescription::DecryptionFailed)
        .unwrap();
    assert_eq!(
        padding_group.1,
        vec![
            PaddingVector::LongPaddingFlipFirstByte,
            PaddingVector::LongPaddingFlipMiddleByte,
            PaddingVector::PaddingFilledWithFF,
        ]
    );
}

#[test]
fn uniform_server_is_not_flagged() {
    let _ = env_logger::try_init();

    let template = template(RecordSize::Short);
    let mut generator = VectorStrategy::VectorContent.generator(&template);
    let report = scan(generator.as_mut(), || session(false)).unwrap();

    assert!(!report.is_vulnerable());
    assert_eq!(report.groups()[0].1.len(), PaddingVector::VECTOR_CONTENT.len());
}

#[test]
fn shape_vectors_reach_the_peer() {
    let _ = env_logger::try_init();

    let template = template(RecordSize::Short);
    let mut generator = VectorStrategy::RecordShape.generator(&template);
    let report = scan(generator.as_mut(), || session(false)).unwrap();

    // Every vector drew some alert.
    for (fingerprint, _) in report.groups() {
        assert!(!fingerprint.alerts.is_empty());
    }
    let total: usize = report.groups().iter().map(|(_, v)| v.len()).sum();
    assert_eq!(total, PaddingVector::RECORD_SHAPE.len());
}

#[test]
fn probe_sends_the_vector_record() {
    let _ = env_logger::try_init();

    let mut conn = keyed_connection(attack_config());
    conn.transport_mut().push_inbound(fatal_alert(BAD_RECORD_MAC));

    let template = template(RecordSize::Short);
    let record = PaddingVector::AppendBlock.apply(&template);
    let response = probe(&mut conn, PaddingVector::AppendBlock, record).unwrap();

    assert_eq!(response.vector, PaddingVector::AppendBlock);
    assert_eq!(response.fingerprint.record_types, vec![ContentType::Alert]);
    assert!(conn.fatal_alert_received());

    let sent = &conn.transport().sent;
    assert_eq!(sent.len(), 1);
    // header + IV + 3 blocks + appended block
    assert_eq!(sent[0].len(), 5 + 16 + 48 + 16);

    // A second probe on the same session is suppressed.
    let again = probe(
        &mut conn,
        PaddingVector::AppendBlock,
        PaddingVector::AppendBlock.apply(&template),
    )
    .unwrap();
    assert!(again.fingerprint.record_types.is_empty());
    assert_eq!(conn.transport().sent.len(), 1);
}

#[test]
fn probing_without_response_times_out() {
    let _ = env_logger::try_init();

    let mut conn = keyed_connection(attack_config());
    let template = template(RecordSize::VeryShort);
    let response = probe(
        &mut conn,
        PaddingVector::ValidLongPadding,
        PaddingVector::ValidLongPadding.apply(&template),
    )
    .unwrap();

    assert!(response.fingerprint.record_types.is_empty());
    assert!(response.fingerprint.alerts.is_empty());
    assert!(!response.fingerprint.closed);
    let _: &MemoryTransport = conn.transport();
}
