//! Transport envelope
//!
//! Sealing turns a batch into request bytes: JSON, then gzip with an optional
//! HMAC header, or RSA encryption in place of the gzip body. Opening reverses
//! this and checks integrity before anything is parsed.

pub mod compression;
pub mod encryption;
pub mod signature;

use crate::core::metric::Metric;
use crate::utils::error::{MetricsError, Result};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;

pub use compression::GZIP_ENCODING;
pub use signature::SIGNATURE_HEADER;

/// Default cap on decompressed request bodies
pub const DEFAULT_MAX_BODY: usize = 64 * 1024 * 1024;

/// Request bytes plus the headers that describe them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBatch {
    pub body: Vec<u8>,
    /// `Content-Encoding` header value
    pub content_encoding: Option<&'static str>,
    /// `HashSHA256` header value
    pub signature: Option<String>,
}

/// Seals and opens metric batches with the configured protection
#[derive(Debug, Clone)]
pub struct Envelope {
    key: Option<String>,
    public_key: Option<RsaPublicKey>,
    private_key: Option<RsaPrivateKey>,
    max_body: usize,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            key: None,
            public_key: None,
            private_key: None,
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

impl Envelope {
    /// Plain gzip envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign with / require an HMAC over the uncompressed body
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Encrypt outgoing bodies
    pub fn with_public_key(mut self, key: RsaPublicKey) -> Self {
        self.public_key = Some(key);
        self
    }

    /// Require and decrypt encrypted incoming bodies
    pub fn with_private_key(mut self, key: RsaPrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    pub fn max_body(&self) -> usize {
        self.max_body
    }

    pub fn is_signed(&self) -> bool {
        self.key.is_some()
    }

    pub fn is_encrypted(&self) -> bool {
        self.public_key.is_some() || self.private_key.is_some()
    }

    /// Serialize and protect a batch for sending
    pub fn seal(&self, metrics: &[Metric]) -> Result<SealedBatch> {
        let json = serde_json::to_vec(metrics)?;
        self.seal_bytes(&json)
    }

    pub fn seal_bytes(&self, json: &[u8]) -> Result<SealedBatch> {
        if let Some(public_key) = &self.public_key {
            return Ok(SealedBatch {
                body: encryption::encrypt(public_key, json)?,
                content_encoding: None,
                signature: None,
            });
        }

        let signature = self
            .key
            .as_deref()
            .map(|key| signature::sign(key, json))
            .transpose()?;

        Ok(SealedBatch {
            body: compression::gzip(json)?,
            content_encoding: Some(GZIP_ENCODING),
            signature,
        })
    }

    /// Undo the framing and check integrity, returning the plaintext JSON.
    ///
    /// Nothing is parsed before the signature has been verified.
    pub fn open_bytes(
        &self,
        body: &[u8],
        content_encoding: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Vec<u8>> {
        self.open_framed(body, content_encoding, signature, true)
    }

    /// Same as [`Envelope::open_bytes`] without the decryption step.
    ///
    /// Single-metric requests are never encrypted, only signed.
    pub fn open_signed_bytes(
        &self,
        body: &[u8],
        content_encoding: Option<&str>,
        signature: Option<&str>,
    ) -> Result<Vec<u8>> {
        self.open_framed(body, content_encoding, signature, false)
    }

    fn open_framed(
        &self,
        body: &[u8],
        content_encoding: Option<&str>,
        signature: Option<&str>,
        decrypt: bool,
    ) -> Result<Vec<u8>> {
        let mut payload = if compression::is_gzip(content_encoding) {
            compression::gunzip(body, self.max_body).map_err(|e| match (&self.key, e) {
                // a corrupted body cannot be authenticated
                (Some(_), MetricsError::Validation(msg)) => MetricsError::integrity(msg),
                (_, e) => e,
            })?
        } else {
            body.to_vec()
        };

        if let Some(private_key) = self.private_key.as_ref().filter(|_| decrypt) {
            if !encryption::is_armored(&payload) {
                return Err(MetricsError::crypto("expected an encrypted body"));
            }
            payload = encryption::decrypt(private_key, &payload)?;
        }

        if let Some(key) = &self.key {
            let signature = signature
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| MetricsError::integrity("missing HashSHA256 header"))?;
            signature::verify(key, &payload, signature)?;
        }

        Ok(payload)
    }

    /// Open and parse a body
    pub fn open<T: DeserializeOwned>(
        &self,
        body: &[u8],
        content_encoding: Option<&str>,
        signature: Option<&str>,
    ) -> Result<T> {
        let payload = self.open_bytes(body, content_encoding, signature)?;
        Ok(serde_json::from_slice(&payload)?)
    }

    pub fn open_signed<T: DeserializeOwned>(
        &self,
        body: &[u8],
        content_encoding: Option<&str>,
        signature: Option<&str>,
    ) -> Result<T> {
        let payload = self.open_signed_bytes(body, content_encoding, signature)?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Open a sealed batch
    pub fn unseal(&self, sealed: &SealedBatch) -> Result<Vec<Metric>> {
        self.open(
            &sealed.body,
            sealed.content_encoding,
            sealed.signature.as_deref(),
        )
    }

    /// Signature to attach to a response body, if a key is configured
    pub fn sign_response(&self, body: &[u8]) -> Result<Option<String>> {
        self.key
            .as_deref()
            .map(|key| signature::sign(key, body))
            .transpose()
    }
}
