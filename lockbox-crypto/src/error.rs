//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in crypto operations.
///
/// `Decryption` and `KeyUnwrap` deliberately carry no detail: a wrong key,
/// a flipped bit and a truncated blob must be indistinguishable to callers.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed (wrong key or corrupted data)")]
    Decryption,

    #[error("key unwrap failed (wrong key or corrupted envelope)")]
    KeyUnwrap,

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}
