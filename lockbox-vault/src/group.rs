//! Group keypairs and per-member envelopes.
//!
//! A group owns an RSA keypair. Its public key is stored openly; its private
//! key exists only wrapped under each member's identity public key. Enrolling
//! a member means an existing member unwraps the group key and re-wraps it
//! for the newcomer. No secret is re-encrypted.
//!
//! Removing a member does not rotate anything: an envelope that was once
//! issued keeps opening the same group key.

use crate::config::VaultConfig;
use crate::error::{PreconditionError, VaultError, VaultResult};
use crate::membership::MembershipLookup;
use crate::session::UnlockedIdentity;
use crate::types::{Group, GroupMembership, PrincipalId};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use lockbox_crypto::{
    import_public_key, unwrap_private_key, wrap_private_key, EnvelopeFormat, IdentityKeyPair,
    RsaPrivateKey, RsaPublicKey,
};
use tracing::{debug, info};

/// Output of [`create_group`]: the only two things that get persisted.
#[derive(Clone, Debug)]
pub struct CreatedGroup {
    /// SPKI PEM of the new group keypair.
    pub group_public_key: String,
    pub owner_membership: GroupMembership,
}

fn membership_envelope(
    group_private: &RsaPrivateKey,
    user_id: &str,
    group_id: &str,
    member_public: &RsaPublicKey,
    format: EnvelopeFormat,
) -> VaultResult<GroupMembership> {
    let wrapped = wrap_private_key(group_private, member_public, format)?;
    Ok(GroupMembership {
        user_id: user_id.to_string(),
        group_id: group_id.to_string(),
        encrypted_group_private_key: BASE64.encode(wrapped),
        created_at: Utc::now(),
    })
}

/// Generates a group keypair and enrols the owner.
///
/// The group private key is dropped (and zeroized) before returning.
pub fn create_group(
    group_id: &str,
    owner_id: &str,
    owner_public_key: &RsaPublicKey,
    config: &VaultConfig,
) -> VaultResult<CreatedGroup> {
    let keypair = IdentityKeyPair::generate_with_bits(config.rsa_modulus_bits)?;
    let group_public_key = keypair.public_key_pem()?;
    let owner_membership = membership_envelope(
        &keypair.private,
        owner_id,
        group_id,
        owner_public_key,
        config.envelope_format,
    )?;
    drop(keypair);

    info!(group_id, owner_id, "created group keypair");
    Ok(CreatedGroup {
        group_public_key,
        owner_membership,
    })
}

/// Unwraps the group private key from a membership envelope.
pub fn open_group_private_key(
    membership: &GroupMembership,
    identity_private: &RsaPrivateKey,
    format: EnvelopeFormat,
) -> VaultResult<RsaPrivateKey> {
    let blob = BASE64
        .decode(membership.encrypted_group_private_key.trim())
        .map_err(|_| VaultError::KeyUnwrap)?;
    Ok(unwrap_private_key(&blob, identity_private, format)?)
}

/// Re-wraps the group private key for a new member.
///
/// The new member id must not carry the group prefix. Preconditions are then
/// checked in this order, each with its own error: the group has a public
/// key, the target is not already a member, the acting user holds a
/// membership, and that membership opens the key matching the group public
/// key.
pub fn add_member(
    group: &Group,
    new_member_id: &str,
    new_member_public_key: &RsaPublicKey,
    acting: &UnlockedIdentity,
    lookup: &impl MembershipLookup,
    format: EnvelopeFormat,
) -> VaultResult<GroupMembership> {
    if PrincipalId::is_reserved_user_id(new_member_id) {
        return Err(PreconditionError::ReservedUserId {
            user_id: new_member_id.to_string(),
        }
        .into());
    }

    let group_public = group
        .group_public_key
        .as_deref()
        .filter(|pem| !pem.trim().is_empty())
        .ok_or_else(|| PreconditionError::MissingGroupPublicKey {
            group_id: group.id.clone(),
        })?;
    let group_public = import_public_key(group_public)?;

    let already_member = group.member_ids.iter().any(|id| id == new_member_id)
        || lookup.membership(new_member_id, &group.id).is_some();
    if already_member {
        return Err(PreconditionError::AlreadyMember {
            user_id: new_member_id.to_string(),
            group_id: group.id.clone(),
        }
        .into());
    }

    let acting_membership = lookup
        .membership(acting.user_id(), &group.id)
        .ok_or_else(|| PreconditionError::NotEnrolled {
            user_id: acting.user_id().to_string(),
            group_id: group.id.clone(),
        })?;

    let invalid_envelope = || PreconditionError::InvalidMembershipEnvelope {
        user_id: acting.user_id().to_string(),
        group_id: group.id.clone(),
    };
    let group_private = open_group_private_key(&acting_membership, acting.private_key(), format)
        .map_err(|_| invalid_envelope())?;
    if RsaPublicKey::from(&group_private) != group_public {
        debug!(group_id = %group.id, "membership envelope holds a foreign key");
        return Err(invalid_envelope().into());
    }

    let membership = membership_envelope(
        &group_private,
        new_member_id,
        &group.id,
        new_member_public_key,
        format,
    )?;

    info!(
        group_id = %group.id,
        user_id = new_member_id,
        enrolled_by = acting.user_id(),
        "enrolled group member"
    );
    Ok(membership)
}
