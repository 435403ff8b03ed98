//! Vault protocol error types.

use lockbox_crypto::CryptoError;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur in vault operations.
///
/// None of these are retried at this layer. `Decryption` and `AccessDenied`
/// are safe to show to users: their messages never say which check failed.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid master password or corrupted data")]
    Decryption,

    #[error("key unwrap failed")]
    KeyUnwrap,

    #[error("you don't have access to this secret")]
    AccessDenied(DenyReason),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("vault is locked")]
    Locked,

    #[error("master password too short (min {min} characters)")]
    PasswordTooShort { min: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why access was denied. Kept out of the display message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// No envelope addressed to the caller or to the owning group.
    NoEnvelope,
    /// The secret is group-owned but the caller holds no membership.
    NotAMember,
}

/// Group sharing and sealing preconditions. These are not crypto failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("group {group_id} has no public key")]
    MissingGroupPublicKey { group_id: String },

    #[error("user {user_id} is not enrolled in group {group_id}")]
    NotEnrolled { user_id: String, group_id: String },

    #[error("membership envelope of user {user_id} for group {group_id} cannot be opened")]
    InvalidMembershipEnvelope { user_id: String, group_id: String },

    #[error("user {user_id} is already a member of group {group_id}")]
    AlreadyMember { user_id: String, group_id: String },

    #[error("user id {user_id} uses the reserved group prefix")]
    ReservedUserId { user_id: String },

    #[error("a secret needs at least one recipient")]
    NoRecipients,

    #[error("no envelope addressed to owner {principal}")]
    OwnerEnvelopeMissing { principal: String },
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyDerivation(msg) => Self::KeyDerivation(msg),
            CryptoError::Decryption => Self::Decryption,
            CryptoError::KeyUnwrap | CryptoError::InvalidKeyLength { .. } => Self::KeyUnwrap,
            other => Self::Crypto(other.to_string()),
        }
    }
}
