#![no_main]

//! Fuzz target for stream record parsing and decryption.
//!
//! The input is split into records as-is, then every record is run through a
//! keyed CBC decryptor. Nothing may panic, whatever the padding looks like.

use libfuzzer_sys::fuzz_target;

use tlsprobe::crypto::{DirectionKeys, RecordCipher};
use tlsprobe::record::{RecordLayer, TlsRecordLayer, MAX_RECORD_LENGTH};
use tlsprobe::types::{CipherSuite, ProtocolVersion};

fn keys(fill: u8) -> DirectionKeys {
    DirectionKeys {
        mac_key: vec![fill; 20],
        enc_key: vec![fill; 16],
        iv: vec![fill; 16],
    }
}

fuzz_target!(|data: &[u8]| {
    let mut plain = TlsRecordLayer::new(ProtocolVersion::TLS1_2, MAX_RECORD_LENGTH);
    let records = match plain.parse_records(data) {
        Ok(records) => records,
        Err(e) => e.parsed,
    };

    for version in [ProtocolVersion::TLS1_0, ProtocolVersion::TLS1_2] {
        let cipher = match RecordCipher::from_keys(
            CipherSuite::RSA_WITH_AES_128_CBC_SHA,
            version,
            &keys(1),
            &keys(2),
            Some(0),
        ) {
            Ok(c) => c,
            Err(_) => return,
        };
        let mut layer = TlsRecordLayer::new(version, MAX_RECORD_LENGTH);
        layer.set_record_cipher(cipher);
        if layer.update_decryption_cipher().is_err() {
            return;
        }

        for record in &records {
            let mut record = record.clone();
            let _ = layer.decrypt_record(&mut record);
        }
    }
});
