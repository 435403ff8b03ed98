//! Records exchanged with the persistence layer.
//!
//! Field names serialise in camelCase to match the stored documents.

use chrono::{DateTime, Utc};
use lockbox_crypto::{import_public_key, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::VaultResult;

const GROUP_PREFIX: &str = "group:";

/// Key of an entry in a secret's envelope map: a raw user id, or
/// `group:<groupId>` for a group.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Addresses a user. Ids starting with `group:` would collide with group
    /// principals; callers reject them with [`PrincipalId::is_reserved_user_id`].
    pub fn user(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }

    pub fn group(group_id: &str) -> Self {
        Self(format!("{GROUP_PREFIX}{group_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The group id, if this principal addresses a group.
    pub fn group_id(&self) -> Option<&str> {
        self.0.strip_prefix(GROUP_PREFIX)
    }

    pub fn is_group(&self) -> bool {
        self.group_id().is_some()
    }

    /// Whether `user_id` cannot name a user because it reads as a group.
    pub fn is_reserved_user_id(user_id: &str) -> bool {
        user_id.starts_with(GROUP_PREFIX)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who owns a secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Owner {
    User(String),
    Group(String),
}

impl Owner {
    pub fn id(&self) -> &str {
        match self {
            Self::User(id) | Self::Group(id) => id,
        }
    }

    /// The envelope key the owner resolves through.
    pub fn principal(&self) -> PrincipalId {
        match self {
            Self::User(id) => PrincipalId::user(id.clone()),
            Self::Group(id) => PrincipalId::group(id),
        }
    }
}

/// Plaintext secret fields. Serialised to JSON and encrypted as one payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SecretData {
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl fmt::Debug for SecretData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretData")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// An encrypted secret as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecord {
    pub id: String,
    /// Display name, stored in the clear for listing.
    pub name: String,
    pub owner: Owner,
    /// `base64(iv || AES-GCM(json(SecretData)))`.
    pub encrypted_data: String,
    /// Data key wrapped once per principal, base64.
    pub encrypted_data_keys: BTreeMap<PrincipalId, String>,
    pub last_modified: DateTime<Utc>,
}

impl SecretRecord {
    pub fn envelope_for(&self, principal: &PrincipalId) -> Option<&str> {
        self.encrypted_data_keys.get(principal).map(String::as_str)
    }
}

/// Per-user key material as stored at registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeyRecord {
    pub user_id: String,
    /// SPKI PEM.
    pub public_key: String,
    /// `base64(iv || AES-GCM(pkcs8))` under the master-derived key.
    pub encrypted_private_key: String,
    /// base64 of 16 random bytes.
    pub kdf_salt: String,
}

/// Group descriptor as handed over by the persistence layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
    /// SPKI PEM. Absent on groups created without key setup.
    #[serde(default)]
    pub group_public_key: Option<String>,
}

/// A member's copy of the group private key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub user_id: String,
    pub group_id: String,
    /// base64 of the wrapped PKCS#8 group private key (direct or hybrid).
    pub encrypted_group_private_key: String,
    pub created_at: DateTime<Utc>,
}

/// A principal a data key gets wrapped for.
#[derive(Clone, Debug)]
pub struct Recipient {
    pub principal: PrincipalId,
    pub public_key: RsaPublicKey,
}

impl Recipient {
    pub fn new(principal: PrincipalId, public_key: RsaPublicKey) -> Self {
        Self {
            principal,
            public_key,
        }
    }

    /// Builds a recipient from a stored PEM public key.
    pub fn from_pem(principal: PrincipalId, pem: &str) -> VaultResult<Self> {
        Ok(Self::new(principal, import_public_key(pem)?))
    }
}
