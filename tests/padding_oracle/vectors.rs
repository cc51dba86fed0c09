//! Generated vectors differ from the template only where documented.

use tlsprobe::attack::{PaddingVector, RecordSize, VectorStrategy};
use tlsprobe::record::RecordLayer;
use tlsprobe::DecryptionError;

use crate::common::*;

/// Indices where `a` and `b` differ, over the shorter length.
fn diff(a: &[u8], b: &[u8]) -> Vec<usize> {
    a.iter()
        .zip(b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect()
}

fn declared_length(bytes: &[u8]) -> usize {
    u16::from_be_bytes([bytes[3], bytes[4]]) as usize
}

#[test]
fn records_differ_only_in_malformation() {
    let _ = env_logger::try_init();

    let template = template(RecordSize::Short);
    for strategy in [VectorStrategy::RecordShape, VectorStrategy::VectorContent] {
        let mut generator = strategy.generator(&template);
        while let Some((vector, record)) = generator.next_record() {
            let mut expected = template.clone();
            expected.malformation = vector.malformation();
            assert_eq!(record, expected, "{}", vector);
        }
    }
}

#[test]
fn shape_vectors_on_the_wire() {
    let _ = env_logger::try_init();

    for size in [RecordSize::VeryShort, RecordSize::Short, RecordSize::Medium] {
        let template = template(size);
        let (t_bytes, t_record) = encrypt(&template);
        let t_len = t_bytes.len();
        // header(5) + explicit IV(16)
        let body = 5 + 16;
        assert_eq!(declared_length(&t_bytes), t_len - 5);

        for vector in PaddingVector::RECORD_SHAPE {
            let (v_bytes, v_record) = encrypt(&vector.apply(&template));

            // Nothing inside the encrypted payload changes.
            assert_eq!(v_record.cleartext, t_record.cleartext, "{}", vector);
            assert_eq!(v_record.mac, t_record.mac, "{}", vector);
            assert_eq!(v_record.padding, t_record.padding, "{}", vector);
            assert_eq!(v_record.iv, t_record.iv, "{}", vector);

            match vector {
                PaddingVector::FlipFirstCiphertextByte => {
                    assert_eq!(diff(&t_bytes, &v_bytes), vec![body]);
                    assert_eq!(v_bytes.len(), t_len);
                }
                PaddingVector::FlipPenultimateBlockLastByte => {
                    assert_eq!(diff(&t_bytes, &v_bytes), vec![t_len - 17]);
                    assert_eq!(v_bytes.len(), t_len);
                }
                PaddingVector::TruncateLastBlock | PaddingVector::NotBlockAligned => {
                    let cut = if *vector == PaddingVector::TruncateLastBlock { 16 } else { 1 };
                    assert_eq!(v_bytes.len(), t_len - cut);
                    assert_eq!(v_bytes[5..], t_bytes[5..t_len - cut]);
                    assert_eq!(declared_length(&v_bytes), t_len - cut - 5);
                }
                PaddingVector::AppendBlock => {
                    assert_eq!(v_bytes.len(), t_len + 16);
                    assert_eq!(v_bytes[5..t_len], t_bytes[5..]);
                    assert_eq!(v_bytes[t_len..], [0u8; 16]);
                    assert_eq!(declared_length(&v_bytes), t_len + 16 - 5);
                }
                PaddingVector::DeclaredLengthPlusOne | PaddingVector::DeclaredLengthMinusOne => {
                    assert_eq!(v_bytes.len(), t_len);
                    assert!(diff(&t_bytes, &v_bytes).iter().all(|i| *i == 3 || *i == 4));
                    let delta: isize = if *vector == PaddingVector::DeclaredLengthPlusOne {
                        1
                    } else {
                        -1
                    };
                    assert_eq!(
                        declared_length(&v_bytes) as isize,
                        declared_length(&t_bytes) as isize + delta
                    );
                }
                other => panic!("{} is not a shape vector", other),
            }
        }
    }
}

#[test]
fn content_vectors_decrypt_as_documented() {
    let _ = env_logger::try_init();

    for size in [RecordSize::VeryShort, RecordSize::Short, RecordSize::Long] {
        let template = template(size);
        let (_, t_record) = encrypt(&template);

        for vector in PaddingVector::VECTOR_CONTENT {
            let (v_bytes, v_record) = encrypt(&vector.apply(&template));
            assert_eq!(v_record.cleartext, t_record.cleartext, "{}", vector);
            assert_eq!(v_record.iv, t_record.iv, "{}", vector);

            let mut server = keyed_server_layer();
            let mut records = server.parse_records(&v_bytes).unwrap();
            assert_eq!(records.len(), 1);
            let result = server.decrypt_record(&mut records[0]);

            let t_mac = t_record.mac.clone().unwrap();
            let v_mac = v_record.mac.clone().unwrap();
            match vector {
                PaddingVector::FlipMacFirstByte => {
                    assert_eq!(diff(&t_mac, &v_mac), vec![0]);
                    assert_eq!(result, Err(DecryptionError::BadMac));
                }
                PaddingVector::FlipMacLastByte => {
                    assert_eq!(diff(&t_mac, &v_mac), vec![19]);
                    assert_eq!(result, Err(DecryptionError::BadMac));
                }
                PaddingVector::DropMacFirstByte => {
                    assert_eq!(v_mac, t_mac[1..]);
                    assert_eq!(result, Err(DecryptionError::BadMac));
                }
                PaddingVector::DropMacLastByte => {
                    assert_eq!(v_mac, t_mac[..19]);
                    assert_eq!(result, Err(DecryptionError::BadMac));
                }
                PaddingVector::NoMac => {
                    assert!(v_mac.is_empty());
                    assert_eq!(result, Err(DecryptionError::BadMac));
                }
                PaddingVector::LongPaddingFlipFirstByte
                | PaddingVector::LongPaddingFlipMiddleByte
                | PaddingVector::PaddingFilledWithFF => {
                    assert_eq!(v_mac, t_mac, "{}", vector);
                    assert_eq!(result, Err(DecryptionError::BadPadding), "{}", vector);
                }
                PaddingVector::ValidLongPadding => {
                    assert_eq!(v_mac, t_mac);
                    let padding = v_record.padding.clone().unwrap();
                    assert_eq!(padding.len(), t_record.padding.clone().unwrap().len() + 240);
                    assert_eq!(result, Ok(()));
                    assert_eq!(records[0].cleartext, template.cleartext);
                }
                other => panic!("{} is not a content vector", other),
            }
        }
    }
}

#[test]
fn template_is_not_mutated_by_generation() {
    let _ = env_logger::try_init();

    let template = template(RecordSize::Medium);
    let before = template.clone();
    let mut generator = VectorStrategy::RecordShape.generator(&template);
    while generator.next_record().is_some() {}
    generator.reset();
    assert!(generator.next_record().is_some());
    assert_eq!(template, before);
}
