//! Test fixtures

use pc_metrics::Metric;
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A batch mixing both kinds with repeated ids
pub fn mixed_batch() -> Vec<Metric> {
    vec![
        Metric::gauge("Alloc", 1024.0),
        Metric::counter("PollCount", 2),
        Metric::gauge("Alloc", 2048.0),
        Metric::counter("PollCount", 3),
    ]
}

/// Shared 1024-bit key; generation is slow in debug builds
pub fn rsa_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("Failed to generate RSA key")
    })
}

/// Write the shared key pair as PEM files, returning (private, public)
pub fn write_key_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let key = rsa_key();
    let private_path = dir.join("private.pem");
    let public_path = dir.join("public.pem");

    let private_pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("Failed to encode private key");
    let public_pem = key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("Failed to encode public key");

    std::fs::write(&private_path, private_pem.as_bytes()).expect("Failed to write private key");
    std::fs::write(&public_path, public_pem).expect("Failed to write public key");
    (private_path, public_path)
}
