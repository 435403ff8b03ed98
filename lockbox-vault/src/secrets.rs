//! Sealing secrets: one fresh data key per write, wrapped per recipient.

use crate::error::{PreconditionError, VaultResult};
use crate::types::{Owner, PrincipalId, Recipient, SecretData, SecretRecord};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use lockbox_crypto::{encrypt_data, DataKey, EnvelopeFormat};
use std::collections::BTreeMap;
use tracing::debug;
use zeroize::Zeroizing;

struct SealedPayload {
    encrypted_data: String,
    encrypted_data_keys: BTreeMap<PrincipalId, String>,
}

fn seal_payload(
    data: &SecretData,
    owner: &Owner,
    recipients: &[Recipient],
    format: EnvelopeFormat,
) -> VaultResult<SealedPayload> {
    if recipients.is_empty() {
        return Err(PreconditionError::NoRecipients.into());
    }
    let owner_principal = owner.principal();
    if !recipients.iter().any(|r| r.principal == owner_principal) {
        return Err(PreconditionError::OwnerEnvelopeMissing {
            principal: owner_principal.to_string(),
        }
        .into());
    }

    let data_key = DataKey::generate();
    let json = Zeroizing::new(serde_json::to_string(data)?);
    let encrypted_data = encrypt_data(&json, &data_key)?;

    let mut encrypted_data_keys = BTreeMap::new();
    for recipient in recipients {
        let wrapped = format.wrap(data_key.as_bytes(), &recipient.public_key)?;
        encrypted_data_keys.insert(recipient.principal.clone(), BASE64.encode(wrapped));
    }

    Ok(SealedPayload {
        encrypted_data,
        encrypted_data_keys,
    })
}

/// Encrypts a new secret.
///
/// `recipients` must include the owner's principal: the user id for a
/// user-owned secret, `group:<id>` (with the group public key) for a
/// group-owned one. Other recipients get direct access.
pub fn seal_secret(
    id: &str,
    data: &SecretData,
    owner: Owner,
    recipients: &[Recipient],
    format: EnvelopeFormat,
) -> VaultResult<SecretRecord> {
    let sealed = seal_payload(data, &owner, recipients, format)?;
    debug!(secret_id = id, envelopes = sealed.encrypted_data_keys.len(), "sealed secret");

    Ok(SecretRecord {
        id: id.to_string(),
        name: data.name.clone(),
        owner,
        encrypted_data: sealed.encrypted_data,
        encrypted_data_keys: sealed.encrypted_data_keys,
        last_modified: Utc::now(),
    })
}

/// Re-encrypts an existing secret under a fresh data key.
///
/// The envelope map is replaced by one built from `recipients`; envelopes
/// for the old data key are not carried over.
pub fn reseal_secret(
    record: &SecretRecord,
    data: &SecretData,
    recipients: &[Recipient],
    format: EnvelopeFormat,
) -> VaultResult<SecretRecord> {
    let sealed = seal_payload(data, &record.owner, recipients, format)?;
    debug!(secret_id = %record.id, envelopes = sealed.encrypted_data_keys.len(), "resealed secret");

    Ok(SecretRecord {
        id: record.id.clone(),
        name: data.name.clone(),
        owner: record.owner.clone(),
        encrypted_data: sealed.encrypted_data,
        encrypted_data_keys: sealed.encrypted_data_keys,
        last_modified: Utc::now(),
    })
}
