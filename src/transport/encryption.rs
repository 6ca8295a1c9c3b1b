//! RSA PKCS#1 v1.5 body encryption
//!
//! Plaintext is split into blocks of `k - 11` bytes (`k` = modulus size);
//! the concatenated ciphertext blocks are armored as a `MESSAGE` PEM.

use crate::utils::error::{MetricsError, Result};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use std::path::Path;
use x509_cert::Certificate;
use x509_cert::der::{Decode, Encode};

/// PEM tag of encrypted bodies
pub const MESSAGE_TAG: &str = "MESSAGE";

/// PEM tag of X.509 certificates
pub const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// PKCS#1 v1.5 padding overhead
const PADDING_OVERHEAD: usize = 11;

/// Parse a public key from an X.509 certificate, SPKI (`PUBLIC KEY`) or
/// PKCS#1 (`RSA PUBLIC KEY`) PEM
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    if let Ok(block) = pem::parse(pem) {
        if block.tag() == CERTIFICATE_TAG {
            return certificate_public_key(block.contents());
        }
    }

    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| MetricsError::Crypto(format!("Invalid RSA public key: {}", e)))
}

/// RSA key in the certificate's subject public key info
fn certificate_public_key(der: &[u8]) -> Result<RsaPublicKey> {
    let cert = Certificate::from_der(der)
        .map_err(|e| MetricsError::Crypto(format!("Invalid certificate: {}", e)))?;
    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| MetricsError::Crypto(format!("Invalid certificate key: {}", e)))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| MetricsError::Crypto(format!("Certificate key is not RSA: {}", e)))
}

/// Parse a private key from PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`) PEM
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| MetricsError::Crypto(format!("Invalid RSA private key: {}", e)))
}

pub async fn load_public_key(path: &Path) -> Result<RsaPublicKey> {
    let pem = read_key_file(path).await?;
    parse_public_key(&pem)
}

pub async fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let pem = read_key_file(path).await?;
    parse_private_key(&pem)
}

async fn read_key_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        MetricsError::Config(format!("Failed to read key file {}: {}", path.display(), e))
    })
}

/// Encrypt and armor `plaintext`
pub fn encrypt(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let block_len = key.size() - PADDING_OVERHEAD;
    let mut rng = rand::thread_rng();

    let mut ciphertext = Vec::with_capacity((plaintext.len() / block_len + 1) * key.size());
    let empty = plaintext.is_empty().then_some(&[][..]);
    for chunk in plaintext.chunks(block_len).chain(empty) {
        let block = key
            .encrypt(&mut rng, Pkcs1v15Encrypt, chunk)
            .map_err(|e| MetricsError::Crypto(format!("Encryption failed: {}", e)))?;
        ciphertext.extend_from_slice(&block);
    }

    Ok(pem::encode(&pem::Pem::new(MESSAGE_TAG, ciphertext)).into_bytes())
}

/// Dearmor and decrypt a body produced by [`encrypt`]
pub fn decrypt(key: &RsaPrivateKey, armored: &[u8]) -> Result<Vec<u8>> {
    let message = pem::parse(armored)
        .map_err(|e| MetricsError::Crypto(format!("Invalid PEM body: {}", e)))?;
    if message.tag() != MESSAGE_TAG {
        return Err(MetricsError::Crypto(format!(
            "Unexpected PEM block: {}",
            message.tag()
        )));
    }

    let block_len = key.size();
    let ciphertext = message.contents();
    if ciphertext.is_empty() || ciphertext.len() % block_len != 0 {
        return Err(MetricsError::Crypto(
            "Ciphertext length is not a multiple of the key size".to_string(),
        ));
    }

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for block in ciphertext.chunks(block_len) {
        let chunk = key
            .decrypt(Pkcs1v15Encrypt, block)
            .map_err(|_| MetricsError::Crypto("Decryption failed".to_string()))?;
        plaintext.extend_from_slice(&chunk);
    }
    Ok(plaintext)
}

/// Whether a body looks like PEM armor
pub fn is_armored(body: &[u8]) -> bool {
    body.trim_ascii_start().starts_with(b"-----BEGIN ")
}
