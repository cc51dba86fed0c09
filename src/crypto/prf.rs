use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha384};

use crate::error::Error;
use crate::types::HashAlgorithm;

/// PRF for TLS 1.2 as specified in RFC 5246 Section 5.
///
/// PRF(secret, label, seed) = P_<hash>(secret, label + seed)
///
/// The label is prepended here, `seed` is the bare seed.
pub fn prf_tls12(
    secret: &[u8],
    label: &str,
    seed: &[u8],
    output_len: usize,
    hash: HashAlgorithm,
) -> Result<Vec<u8>, Error> {
    let mut full_seed = Vec::with_capacity(label.len() + seed.len());
    full_seed.extend_from_slice(label.as_bytes());
    full_seed.extend_from_slice(seed);

    match hash {
        HashAlgorithm::Sha256 => p_hash::<Hmac<Sha256>>(secret, &full_seed, output_len),
        HashAlgorithm::Sha384 => p_hash::<Hmac<Sha384>>(secret, &full_seed, output_len),
    }
}

fn p_hash<M>(secret: &[u8], full_seed: &[u8], output_len: usize) -> Result<Vec<u8>, Error>
where
    M: Mac + KeyInit + Clone,
{
    let key = <M as Mac>::new_from_slice(secret)
        .map_err(|_| Error::CipherSetup("Invalid HMAC key length".to_string()))?;

    let mut out = Vec::with_capacity(output_len);

    // A(1) = HMAC_hash(secret, A(0)) where A(0) = seed
    let mut a = key.clone().chain_update(full_seed).finalize().into_bytes();

    while out.len() < output_len {
        // HMAC_hash(secret, A(i) + seed)
        let output = key
            .clone()
            .chain_update(&a)
            .chain_update(full_seed)
            .finalize()
            .into_bytes();

        let to_copy = (output_len - out.len()).min(output.len());
        out.extend_from_slice(&output[..to_copy]);

        // A(i+1) = HMAC_hash(secret, A(i))
        a = key.clone().chain_update(&a).finalize().into_bytes();
    }

    Ok(out)
}

/// master_secret = PRF(pre_master_secret, "master secret", client_random + server_random)[0..47]
pub fn master_secret(
    pre_master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    hash: HashAlgorithm,
) -> Result<Vec<u8>, Error> {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);
    prf_tls12(pre_master_secret, "master secret", &seed, 48, hash)
}

/// Key expansion as specified in RFC 5246 Section 6.3. Note the seed order is
/// server_random + client_random.
pub fn key_expansion(
    master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    key_material_length: usize,
    hash: HashAlgorithm,
) -> Result<Vec<u8>, Error> {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);
    prf_tls12(master_secret, "key expansion", &seed, key_material_length, hash)
}

/// Finished verify_data, 12 bytes.
pub fn verify_data(
    master_secret: &[u8],
    label: &str,
    handshake_hash: &[u8],
    hash: HashAlgorithm,
) -> Result<Vec<u8>, Error> {
    prf_tls12(master_secret, label, handshake_hash, 12, hash)
}

pub fn transcript_hash(hash: HashAlgorithm, messages: &[u8]) -> Vec<u8> {
    match hash {
        HashAlgorithm::Sha256 => Sha256::digest(messages).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(messages).to_vec(),
    }
}
