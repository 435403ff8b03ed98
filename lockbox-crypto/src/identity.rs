//! Identity keypairs and the password-protected private key envelope.
//!
//! Public keys are exchanged as SPKI PEM blocks. Private keys are serialised
//! as PKCS#8 DER and only ever persisted AES-GCM encrypted under the key
//! derived from the master password.

use crate::cipher::{self, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

/// RSA modulus size for identity and group keypairs.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Largest modulus the public key importer accepts.
pub const MAX_RSA_MODULUS_BITS: usize = 4096;

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// RSA-OAEP keypair for a user or a group.
///
/// `RsaPrivateKey` zeroizes its components on drop.
#[derive(Clone)]
pub struct IdentityKeyPair {
    pub private: RsaPrivateKey,
    pub public: RsaPublicKey,
}

impl IdentityKeyPair {
    /// Generates a fresh 2048-bit keypair.
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with_bits(RSA_MODULUS_BITS)
    }

    pub fn generate_with_bits(bits: usize) -> CryptoResult<Self> {
        if bits > MAX_RSA_MODULUS_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "RSA-{bits} exceeds the {MAX_RSA_MODULUS_BITS}-bit limit"
            )));
        }
        let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
            .map_err(|e| CryptoError::KeyGeneration(format!("RSA-{bits}: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    /// Rebuilds the pair from a private key (the public half is derived).
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self { private, public }
    }

    /// Returns the public key as an armored PEM block.
    pub fn public_key_pem(&self) -> CryptoResult<String> {
        export_public_key(&self.public)
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("private", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Generates a new identity keypair for a registering user.
pub fn generate_identity_keypair() -> CryptoResult<IdentityKeyPair> {
    IdentityKeyPair::generate()
}

/// Serialises a public key as an SPKI PEM block.
pub fn export_public_key(public: &RsaPublicKey) -> CryptoResult<String> {
    public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::Encoding(format!("public key export failed: {e}")))
}

/// Parses an SPKI PEM block.
///
/// Accepts any line width, including a body written on a single line.
pub fn import_public_key(pem: &str) -> CryptoResult<RsaPublicKey> {
    let trimmed = pem.trim();
    let body = trimmed
        .strip_prefix(PEM_HEADER)
        .and_then(|rest| rest.strip_suffix(PEM_FOOTER))
        .ok_or_else(|| {
            CryptoError::Encoding("invalid PEM key format: missing header or footer".to_string())
        })?;

    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let der = BASE64
        .decode(compact)
        .map_err(|e| CryptoError::Encoding(format!("invalid PEM body: {e}")))?;

    RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CryptoError::Encoding(format!("invalid SPKI public key: {e}")))
}

/// PKCS#8 DER encoding of a private key, wiped on drop.
pub(crate) fn private_key_to_der(private: &RsaPrivateKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let doc = private
        .to_pkcs8_der()
        .map_err(|e| CryptoError::Encoding(format!("private key export failed: {e}")))?;
    Ok(Zeroizing::new(doc.as_bytes().to_vec()))
}

pub(crate) fn private_key_from_der(der: &[u8]) -> Option<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(der).ok()
}

/// Exports the private key as PKCS#8 and encrypts it under the derived key.
///
/// Returns `base64(iv || ciphertext)`.
pub fn export_and_encrypt_private_key(
    private: &RsaPrivateKey,
    derived: &DerivedKey,
) -> CryptoResult<String> {
    let der = private_key_to_der(private)?;
    let encrypted = cipher::seal(derived.as_bytes(), &der)?;
    Ok(encrypted.to_base64())
}

/// Decrypts and re-imports a private key envelope.
///
/// A wrong password, a tampered blob and an undecodable key all produce
/// [`CryptoError::Decryption`].
pub fn decrypt_and_import_private_key(
    blob: &str,
    derived: &DerivedKey,
) -> CryptoResult<RsaPrivateKey> {
    let encrypted = EncryptedData::from_base64(blob)?;
    let der = cipher::open(derived.as_bytes(), &encrypted)?;
    private_key_from_der(&der).ok_or(CryptoError::Decryption)
}
