//! HMAC-SHA256 body signatures

use crate::utils::error::{MetricsError, Result};
use hmac::{Hmac, Mac, digest::KeyInit as HmacKeyInit};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature
pub const SIGNATURE_HEADER: &str = "HashSHA256";

fn mac(secret: &str) -> Result<HmacSha256> {
    <HmacSha256 as HmacKeyInit>::new_from_slice(secret.as_bytes())
        .map_err(|e| MetricsError::Crypto(format!("Invalid HMAC key: {}", e)))
}

/// Hex HMAC-SHA256 of `data`
pub fn sign(secret: &str, data: &[u8]) -> Result<String> {
    let mut mac = mac(secret)?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature in constant time
pub fn verify(secret: &str, data: &[u8], signature: &str) -> Result<()> {
    let expected = hex::decode(signature.trim())
        .map_err(|_| MetricsError::integrity("signature is not valid hex"))?;

    let mut mac = mac(secret)?;
    mac.update(data);
    mac.verify_slice(&expected)
        .map_err(|_| MetricsError::integrity("signature mismatch"))
}
