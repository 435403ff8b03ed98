//! Access resolution: which envelope opens a secret for a given user.
//!
//! 1. An envelope addressed to the user's id opens the data key directly.
//! 2. Otherwise, for a group-owned secret, the user's membership envelope
//!    opens the group private key, which opens the `group:<id>` envelope.

use crate::error::{DenyReason, VaultError, VaultResult};
use crate::group::open_group_private_key;
use crate::membership::MembershipLookup;
use crate::types::{Owner, PrincipalId, SecretData, SecretRecord};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lockbox_crypto::{decrypt_data, DataKey, EnvelopeFormat, RsaPrivateKey};
use tracing::debug;
use zeroize::Zeroizing;

fn unwrap_data_key(
    envelope: &str,
    private: &RsaPrivateKey,
    format: EnvelopeFormat,
) -> VaultResult<DataKey> {
    let blob = BASE64
        .decode(envelope.trim())
        .map_err(|_| VaultError::KeyUnwrap)?;
    let key = format.unwrap(&blob, private)?;
    DataKey::from_slice(&key).map_err(|_| VaultError::KeyUnwrap)
}

/// Finds the caller's path to the secret's data key and unwraps it.
pub fn resolve_data_key(
    secret: &SecretRecord,
    user_id: &str,
    identity_private: &RsaPrivateKey,
    lookup: &impl MembershipLookup,
    format: EnvelopeFormat,
) -> VaultResult<DataKey> {
    if PrincipalId::is_reserved_user_id(user_id) {
        return Err(VaultError::AccessDenied(DenyReason::NoEnvelope));
    }
    if let Some(envelope) = secret.envelope_for(&PrincipalId::user(user_id)) {
        debug!(secret_id = %secret.id, "resolving via direct envelope");
        return unwrap_data_key(envelope, identity_private, format);
    }

    let Owner::Group(group_id) = &secret.owner else {
        return Err(VaultError::AccessDenied(DenyReason::NoEnvelope));
    };
    let group_envelope = secret
        .envelope_for(&PrincipalId::group(group_id))
        .ok_or(VaultError::AccessDenied(DenyReason::NoEnvelope))?;
    let membership = lookup
        .membership(user_id, group_id)
        .ok_or(VaultError::AccessDenied(DenyReason::NotAMember))?;

    debug!(secret_id = %secret.id, group_id = %group_id, "resolving via group envelope");
    let group_private = open_group_private_key(&membership, identity_private, format)?;
    unwrap_data_key(group_envelope, &group_private, format)
}

/// Resolves the data key and decrypts the payload to its JSON text.
pub fn resolve_and_decrypt(
    secret: &SecretRecord,
    user_id: &str,
    identity_private: &RsaPrivateKey,
    lookup: &impl MembershipLookup,
    format: EnvelopeFormat,
) -> VaultResult<Zeroizing<String>> {
    let data_key = resolve_data_key(secret, user_id, identity_private, lookup, format)?;
    let plaintext = decrypt_data(&secret.encrypted_data, &data_key)?;
    Ok(Zeroizing::new(plaintext))
}

/// Resolves, decrypts and parses the secret fields.
pub fn open_secret(
    secret: &SecretRecord,
    user_id: &str,
    identity_private: &RsaPrivateKey,
    lookup: &impl MembershipLookup,
    format: EnvelopeFormat,
) -> VaultResult<SecretData> {
    let json = resolve_and_decrypt(secret, user_id, identity_private, lookup, format)?;
    Ok(serde_json::from_str(&json)?)
}
