//! The unlocked session.
//!
//! A [`VaultSession`] is either locked or holds one immutable
//! [`UnlockedIdentity`]. Unlock and lock swap that value wholesale; readers
//! clone the `Arc`, so in-flight decrypts keep a consistent key even if the
//! session is locked underneath them. The private key is zeroized when the
//! last clone drops.

use crate::access;
use crate::account;
use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::group;
use crate::membership::MembershipLookup;
use crate::types::{Group, GroupMembership, PrincipalId, SecretData, SecretRecord, UserKeyRecord};
use lockbox_crypto::{IdentityKeyPair, RsaPrivateKey, RsaPublicKey};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// A user's identity keypair, decrypted for the lifetime of a session.
pub struct UnlockedIdentity {
    user_id: String,
    keypair: IdentityKeyPair,
}

impl UnlockedIdentity {
    pub fn new(user_id: impl Into<String>, keypair: IdentityKeyPair) -> Self {
        Self {
            user_id: user_id.into(),
            keypair,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn principal(&self) -> PrincipalId {
        PrincipalId::user(self.user_id.clone())
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.keypair.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.keypair.public
    }
}

impl std::fmt::Debug for UnlockedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedIdentity")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Caller-owned session state.
pub struct VaultSession {
    config: VaultConfig,
    identity: RwLock<Option<Arc<UnlockedIdentity>>>,
}

impl VaultSession {
    /// Creates a locked session.
    pub fn new(config: VaultConfig) -> Self {
        Self {
            config,
            identity: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Derives the master key and opens the stored private key.
    ///
    /// On failure the session is left as it was.
    pub fn unlock(&self, record: &UserKeyRecord, master_password: &str) -> VaultResult<()> {
        let keypair = match account::unlock_keypair(record, master_password, &self.config) {
            Ok(keypair) => keypair,
            Err(e) => {
                warn!(user_id = %record.user_id, "vault unlock failed");
                return Err(e);
            }
        };
        self.install(UnlockedIdentity::new(record.user_id.clone(), keypair));
        Ok(())
    }

    /// Installs an already-decrypted keypair, e.g. right after registration.
    pub fn unlock_with_keypair(&self, user_id: &str, keypair: IdentityKeyPair) {
        self.install(UnlockedIdentity::new(user_id, keypair));
    }

    fn install(&self, identity: UnlockedIdentity) {
        debug!(user_id = %identity.user_id, "vault unlocked");
        *self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(identity));
    }

    /// Drops the in-memory identity.
    pub fn lock(&self) {
        let previous = self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("vault locked");
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the unlocked identity, or [`VaultError::Locked`].
    pub fn identity(&self) -> VaultResult<Arc<UnlockedIdentity>> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(VaultError::Locked)
    }

    /// Resolves the caller's envelope for `secret` and decrypts it.
    pub fn open_secret(
        &self,
        secret: &SecretRecord,
        lookup: &impl MembershipLookup,
    ) -> VaultResult<SecretData> {
        let identity = self.identity()?;
        access::open_secret(
            secret,
            identity.user_id(),
            identity.private_key(),
            lookup,
            self.config.envelope_format,
        )
    }

    /// Enrols a new member in `group` on behalf of this session's user.
    pub fn add_member(
        &self,
        group: &Group,
        new_member_id: &str,
        new_member_public_key: &RsaPublicKey,
        lookup: &impl MembershipLookup,
    ) -> VaultResult<GroupMembership> {
        let identity = self.identity()?;
        group::add_member(
            group,
            new_member_id,
            new_member_public_key,
            &identity,
            lookup,
            self.config.envelope_format,
        )
    }
}
