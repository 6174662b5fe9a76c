//! Webhook signature verification.
//!
//! The platform signs every delivery with its private RSA key: the signature
//! header carries base64(RSA-PKCS#1v1.5(SHA-512(raw body))). Older deployments
//! use a shared secret instead, where the header is base64(SHA-512(secret || body)).
//!
//! Verification always runs over the exact bytes received, never a
//! re-serialized payload.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use super::error::SignatureError;
use crate::config::{SignatureConfig, SignatureScheme};

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hook-Signature";

enum Scheme {
    Rsa(Option<RsaPublicKey>),
    SharedSecret(Option<String>),
    Bypass,
}

/// Verifies delivery signatures against the configured key material.
pub struct SignatureVerifier {
    scheme: Scheme,
}

impl SignatureVerifier {
    /// Build from config. Malformed key material fails here; absent key
    /// material fails each `verify` call instead.
    pub fn from_config(config: &SignatureConfig) -> Result<Self, SignatureError> {
        if config.skip {
            return Ok(Self::bypass());
        }
        match config.scheme {
            SignatureScheme::Rsa => {
                let key = config
                    .public_key
                    .as_deref()
                    .map(parse_public_key)
                    .transpose()?;
                Ok(Self {
                    scheme: Scheme::Rsa(key),
                })
            }
            SignatureScheme::SharedSecret => Ok(Self {
                scheme: Scheme::SharedSecret(config.shared_secret.clone()),
            }),
        }
    }

    pub fn rsa(public_key: RsaPublicKey) -> Self {
        Self {
            scheme: Scheme::Rsa(Some(public_key)),
        }
    }

    pub fn shared_secret(secret: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::SharedSecret(Some(secret.into())),
        }
    }

    /// Accepts every delivery. Only for non-production test environments.
    pub fn bypass() -> Self {
        Self {
            scheme: Scheme::Bypass,
        }
    }

    pub fn is_bypassed(&self) -> bool {
        matches!(self.scheme, Scheme::Bypass)
    }

    /// Verify `signature_header` against the raw request body.
    pub fn verify(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<(), SignatureError> {
        match &self.scheme {
            Scheme::Bypass => Ok(()),
            Scheme::Rsa(key) => {
                let key = key.as_ref().ok_or(SignatureError::MissingPublicKey)?;
                let signature = decode_header(signature_header)?;
                verify_rsa(key, raw_body, &signature)
            }
            Scheme::SharedSecret(secret) => {
                let secret = secret.as_deref().ok_or(SignatureError::MissingSharedSecret)?;
                let signature = decode_header(signature_header)?;
                verify_shared_secret(secret, raw_body, &signature)
            }
        }
    }
}

fn decode_header(signature_header: Option<&str>) -> Result<Vec<u8>, SignatureError> {
    let header = signature_header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::MissingSignature)?;
    Ok(STANDARD.decode(header)?)
}

/// Parse a base64 DER SubjectPublicKeyInfo, or a PEM block.
pub fn parse_public_key(encoded: &str) -> Result<RsaPublicKey, SignatureError> {
    let encoded = encoded.trim();
    if encoded.starts_with("-----BEGIN") {
        return RsaPublicKey::from_public_key_pem(encoded)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()));
    }
    let der = STANDARD
        .decode(encoded)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))
}

fn verify_rsa(key: &RsaPublicKey, body: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let digest = Sha512::digest(body);
    key.verify(Pkcs1v15Sign::new::<Sha512>(), &digest, signature)
        .map_err(|_| SignatureError::Mismatch)
}

fn verify_shared_secret(secret: &str, body: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let expected = shared_secret_digest(secret, body);
    if bool::from(expected.as_slice().ct_eq(signature)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn shared_secret_digest(secret: &str, body: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(secret.as_bytes());
    hasher.update(body);
    hasher.finalize().to_vec()
}
