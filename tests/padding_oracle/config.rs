//! Padding oracle session configuration tests.

use tlsprobe::attack::{AttackConfig, PaddingOracleConfig};
use tlsprobe::types::CipherSuite;
use tlsprobe::Error;

#[test]
fn rsa_cbc_scenario() {
    let _ = env_logger::try_init();

    let attack = PaddingOracleConfig::builder()
        .cipher_suites(vec![CipherSuite::RSA_WITH_AES_128_CBC_SHA])
        .build();
    let config = attack.create_config().unwrap();

    assert!(config.add_renegotiation_info_extension());
    assert!(config.add_server_name_indication_extension());
    assert!(config.add_signature_and_hash_algorithms_extension());
    assert!(!config.add_ec_point_format_extension());
    assert!(!config.add_elliptic_curve_extension());
    assert!(config.early_stop());
    assert!(config.quick_receive());
    assert!(config.stop_actions_after_fatal());
    assert!(config.stop_receiving_after_fatal());
    assert_eq!(
        config.default_client_supported_cipher_suites(),
        &[CipherSuite::RSA_WITH_AES_128_CBC_SHA]
    );
    assert!(!attack.is_execute_attack());
}

#[test]
fn gcm_is_rejected() {
    let _ = env_logger::try_init();

    let attack = PaddingOracleConfig::builder()
        .cipher_suites(vec![CipherSuite::RSA_WITH_AES_128_GCM_SHA256])
        .build();
    let err = attack.create_config().unwrap_err();
    assert!(err.message.contains("CBC"), "{}", err);

    // Also through the crate error.
    let err: Error = err.into();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn accepts_iff_every_suite_is_cbc() {
    let _ = env_logger::try_init();

    let catalog = CipherSuite::ALL;

    for suite in catalog {
        let attack = PaddingOracleConfig::builder()
            .cipher_suites(vec![*suite])
            .build();
        assert_eq!(attack.create_config().is_ok(), suite.is_cbc(), "{}", suite);
    }

    // Pairs in both orders.
    for a in catalog {
        for b in catalog {
            let attack = PaddingOracleConfig::builder()
                .cipher_suites(vec![*a, *b])
                .build();
            let expected = a.is_cbc() && b.is_cbc();
            assert_eq!(attack.create_config().is_ok(), expected, "{} {}", a, b);
        }
    }

    // Everything CBC at once, and with one GCM suite at the end.
    let mut all_cbc: Vec<_> = catalog.iter().copied().filter(|s| s.is_cbc()).collect();
    let attack = PaddingOracleConfig::builder()
        .cipher_suites(all_cbc.clone())
        .build();
    assert!(attack.create_config().is_ok());

    all_cbc.push(CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256);
    let attack = PaddingOracleConfig::builder().cipher_suites(all_cbc).build();
    assert!(attack.create_config().is_err());
}

#[test]
fn ec_extensions_iff_any_ec_key_exchange() {
    let _ = env_logger::try_init();

    let cbc: Vec<_> = CipherSuite::ALL
        .iter()
        .copied()
        .filter(|s| s.is_cbc())
        .collect();

    for suite in &cbc {
        let config = PaddingOracleConfig::builder()
            .cipher_suites(vec![*suite])
            .build()
            .create_config()
            .unwrap();
        let ec = suite.key_exchange().is_elliptic_curve();
        assert_eq!(config.add_ec_point_format_extension(), ec, "{}", suite);
        assert_eq!(config.add_elliptic_curve_extension(), ec, "{}", suite);
    }

    let mixed = vec![
        CipherSuite::RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA,
    ];
    let config = PaddingOracleConfig::builder()
        .cipher_suites(mixed)
        .build()
        .create_config()
        .unwrap();
    assert!(config.add_ec_point_format_extension());
    assert!(config.add_elliptic_curve_extension());
}

#[test]
fn client_hello_carries_forced_extensions() {
    let _ = env_logger::try_init();

    use tlsprobe::message::HandshakeMessage;
    use tlsprobe::types::ExtensionType;

    let config = PaddingOracleConfig::builder()
        .cipher_suites(vec![CipherSuite::RSA_WITH_AES_128_CBC_SHA])
        .server_name("target.example")
        .build()
        .create_config()
        .unwrap();
    assert_eq!(config.server_name(), "target.example");

    let hello = HandshakeMessage::client_hello(&config);
    let types: Vec<_> = hello
        .extensions
        .as_ref()
        .unwrap()
        .iter()
        .map(|e| e.extension_type)
        .collect();
    assert_eq!(
        types,
        vec![
            ExtensionType::ServerName,
            ExtensionType::RenegotiationInfo,
            ExtensionType::SignatureAlgorithms,
        ]
    );
}
