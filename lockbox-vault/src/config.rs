//! Vault protocol configuration.

use crate::error::{VaultError, VaultResult};
use lockbox_crypto::{
    EnvelopeFormat, KdfParams, MAX_RSA_MODULUS_BITS, MIN_KDF_ITERATIONS, RSA_MODULUS_BITS,
};
use serde::{Deserialize, Serialize};

/// Configuration shared by registration, unlock, sealing and sharing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// PBKDF2 cost for master key derivation.
    pub kdf: KdfParams,

    /// RSA modulus size for newly generated identity and group keypairs.
    pub rsa_modulus_bits: usize,

    /// Wire encoding of wrapped data keys and membership envelopes.
    ///
    /// Must match whatever is already persisted: the two encodings cannot be
    /// told apart by inspection.
    pub envelope_format: EnvelopeFormat,

    /// Minimum master password length, in characters.
    pub min_password_len: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            rsa_modulus_bits: RSA_MODULUS_BITS,
            envelope_format: EnvelopeFormat::Legacy,
            min_password_len: 8,
        }
    }
}

impl VaultConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> VaultResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VaultResult<()> {
        if self.kdf.iterations < MIN_KDF_ITERATIONS {
            return Err(VaultError::Config(format!(
                "kdf.iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
                self.kdf.iterations
            )));
        }
        if !(RSA_MODULUS_BITS..=MAX_RSA_MODULUS_BITS).contains(&self.rsa_modulus_bits) {
            return Err(VaultError::Config(format!(
                "rsa_modulus_bits must be between {RSA_MODULUS_BITS} and {MAX_RSA_MODULUS_BITS}, got {}",
                self.rsa_modulus_bits
            )));
        }
        if self.min_password_len == 0 {
            return Err(VaultError::Config(
                "min_password_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
