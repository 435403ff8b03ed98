//! Client-side encryption layer for Lockbox.
//!
//! Nothing in this crate performs I/O. It turns passwords, keys and opaque
//! blobs into other keys and blobs:
//! - PBKDF2-HMAC-SHA256 for the master key
//! - AES-256-GCM for payloads and the private key envelope
//! - RSA-2048 OAEP (SHA-256) for wrapping data keys and group private keys
//!
//! # Key hierarchy
//!
//! 1. **Derived Key**: PBKDF2 output from the master password and a per-user
//!    salt. Never stored; it only unlocks the identity private key.
//!
//! 2. **Identity Keypair**: RSA keypair per user. The public half is shared
//!    as PEM, the private half is stored encrypted under the derived key.
//!
//! 3. **Data Key**: random per secret version. Encrypts the payload and is
//!    wrapped once per recipient public key (a user or a group).
//!
//! Group private keys are themselves wrapped per member, which is what lets
//! a member be added without touching any secret.

mod cipher;
mod error;
mod identity;
mod key;
pub mod wrap;

pub use cipher::{
    decrypt, decrypt_data, encrypt, encrypt_data, EncryptedData, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use identity::{
    decrypt_and_import_private_key, export_and_encrypt_private_key, export_public_key,
    generate_identity_keypair, import_public_key, IdentityKeyPair, MAX_RSA_MODULUS_BITS,
    RSA_MODULUS_BITS,
};
pub use key::{
    derive_key, generate_data_key, DataKey, DerivedKey, KdfParams, Salt, KEY_SIZE,
    MIN_KDF_ITERATIONS, SALT_SIZE,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use wrap::{
    max_direct_plaintext, unwrap_key, unwrap_key_tagged, unwrap_private_key, wrap_key,
    wrap_key_tagged, wrap_private_key, EnvelopeFormat, WrapMode,
};
