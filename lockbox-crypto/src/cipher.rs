//! AES-256-GCM payload cipher.
//!
//! Every encryption draws a fresh random 12-byte IV. The persisted form is
//! `base64(iv || ciphertext || tag)`.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DataKey, KEY_SIZE};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// AES-GCM IV size in bytes.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// IV plus AEAD ciphertext (tag appended).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Concatenates `iv || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Splits `iv || ciphertext`. Blobs too short to hold an IV are rejected
    /// with the same error as a failed authentication.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE {
            return Err(CryptoError::Decryption);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(nonce);
        Ok(Self {
            nonce: arr,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| CryptoError::Decryption)?;
        Self::from_bytes(&bytes)
    }
}

pub(crate) fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM seal failed: {e}")))?;

    Ok(EncryptedData { nonce, ciphertext })
}

pub(crate) fn open(key: &[u8; KEY_SIZE], data: &EncryptedData) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(&data.nonce), data.ciphertext.as_ref())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::Decryption)
}

/// Encrypts raw bytes under a data key.
pub fn encrypt(key: &DataKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    seal(key.as_bytes(), plaintext)
}

/// Decrypts raw bytes under a data key.
pub fn decrypt(key: &DataKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    open(key.as_bytes(), data).map(|plain| plain.to_vec())
}

/// Encrypts a UTF-8 payload and returns `base64(iv || ciphertext)`.
pub fn encrypt_data(plaintext: &str, key: &DataKey) -> CryptoResult<String> {
    Ok(encrypt(key, plaintext.as_bytes())?.to_base64())
}

/// Inverse of [`encrypt_data`].
pub fn decrypt_data(blob: &str, key: &DataKey) -> CryptoResult<String> {
    let data = EncryptedData::from_base64(blob)?;
    let plain = open(key.as_bytes(), &data)?;
    String::from_utf8(plain.to_vec()).map_err(|_| CryptoError::Decryption)
}
