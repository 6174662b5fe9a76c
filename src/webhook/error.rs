use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Missing signature header")]
    MissingSignature,

    #[error("Failed to decode signature: {0}")]
    MalformedSignature(#[from] base64::DecodeError),

    #[error("No public key configured")]
    MissingPublicKey,

    #[error("No shared secret configured")]
    MissingSharedSecret,

    #[error("Failed to parse public key: {0}")]
    InvalidPublicKey(String),

    #[error("Failed to verify signature")]
    Mismatch,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to unmarshal web hook payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Amount must be a non-negative magnitude, got {0}")]
    NegativeAmount(i64),
}
