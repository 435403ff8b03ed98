//! Account key material: registration, unlock, master password change.

use crate::config::VaultConfig;
use crate::error::{PreconditionError, VaultError, VaultResult};
use crate::types::{PrincipalId, UserKeyRecord};
use lockbox_crypto::{
    decrypt_and_import_private_key, derive_key, export_and_encrypt_private_key,
    import_public_key, IdentityKeyPair, RsaPublicKey, Salt,
};
use tracing::info;

fn check_password_len(password: &str, config: &VaultConfig) -> VaultResult<()> {
    if password.chars().count() < config.min_password_len {
        return Err(VaultError::PasswordTooShort {
            min: config.min_password_len,
        });
    }
    Ok(())
}

/// Creates the key material for a new account.
///
/// Returns the record to persist and the freshly generated keypair, so the
/// caller can open a session without deriving the key a second time.
pub fn register(
    user_id: &str,
    master_password: &str,
    config: &VaultConfig,
) -> VaultResult<(UserKeyRecord, IdentityKeyPair)> {
    config.validate()?;
    if PrincipalId::is_reserved_user_id(user_id) {
        return Err(PreconditionError::ReservedUserId {
            user_id: user_id.to_string(),
        }
        .into());
    }
    check_password_len(master_password, config)?;

    let salt = Salt::random();
    let derived = derive_key(master_password, &salt, &config.kdf)?;
    let keypair = IdentityKeyPair::generate_with_bits(config.rsa_modulus_bits)?;

    let record = UserKeyRecord {
        user_id: user_id.to_string(),
        public_key: keypair.public_key_pem()?,
        encrypted_private_key: export_and_encrypt_private_key(&keypair.private, &derived)?,
        kdf_salt: salt.to_base64(),
    };

    info!(user_id, "registered identity keypair");
    Ok((record, keypair))
}

/// Opens the identity keypair stored in `record`.
///
/// A malformed salt is reported as such. Every later failure (wrong
/// password, tampered envelope, envelope not matching the stored public key)
/// collapses into [`VaultError::Decryption`].
pub fn unlock_keypair(
    record: &UserKeyRecord,
    master_password: &str,
    config: &VaultConfig,
) -> VaultResult<IdentityKeyPair> {
    let salt = Salt::from_base64(&record.kdf_salt)?;
    let derived = derive_key(master_password, &salt, &config.kdf)?;

    let private = decrypt_and_import_private_key(&record.encrypted_private_key, &derived)
        .map_err(|_| VaultError::Decryption)?;
    let keypair = IdentityKeyPair::from_private(private);

    let stored_public: RsaPublicKey =
        import_public_key(&record.public_key).map_err(|_| VaultError::Decryption)?;
    if stored_public != keypair.public {
        return Err(VaultError::Decryption);
    }
    Ok(keypair)
}

/// Re-encrypts the identity private key under a new master password.
///
/// The keypair itself is unchanged, so every existing envelope stays valid.
/// A fresh salt is drawn.
pub fn change_master_password(
    record: &UserKeyRecord,
    old_password: &str,
    new_password: &str,
    config: &VaultConfig,
) -> VaultResult<UserKeyRecord> {
    check_password_len(new_password, config)?;
    let keypair = unlock_keypair(record, old_password, config)?;

    let salt = Salt::random();
    let derived = derive_key(new_password, &salt, &config.kdf)?;

    info!(user_id = %record.user_id, "master password changed");
    Ok(UserKeyRecord {
        user_id: record.user_id.clone(),
        public_key: record.public_key.clone(),
        encrypted_private_key: export_and_encrypt_private_key(&keypair.private, &derived)?,
        kdf_salt: salt.to_base64(),
    })
}
