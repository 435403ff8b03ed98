//! RSA-OAEP key wrapping with a hybrid fallback for oversized payloads.
//!
//! OAEP with SHA-256 can carry at most `modulus_bytes - 2 * 32 - 2` bytes
//! (190 for RSA-2048). Anything larger is sealed under a fresh AES-256-GCM
//! key, and only that key is OAEP-wrapped:
//!
//! ```text
//! u32le(len(wrapped_k)) || wrapped_k || iv(12) || aes_gcm(payload)
//! ```
//!
//! Two envelope encodings exist. [`EnvelopeFormat::Legacy`] tells direct and
//! hybrid blobs apart by reading the first four bytes as a length and
//! comparing it to the modulus size. [`EnvelopeFormat::Tagged`] prefixes every
//! blob with an explicit format byte instead.

use crate::cipher::{self, EncryptedData, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::identity::{private_key_from_der, private_key_to_der};
use crate::key::{DataKey, KEY_SIZE};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Digest size of the OAEP hash (SHA-256).
pub const OAEP_HASH_SIZE: usize = 32;

/// Size of the little-endian length prefix of a hybrid blob.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Format byte for a direct OAEP ciphertext in the tagged encoding.
pub const TAG_DIRECT: u8 = 0x01;

/// Format byte for a hybrid blob in the tagged encoding.
pub const TAG_HYBRID: u8 = 0x02;

// A fresh OAEP encryption that happens to start with the hybrid length
// prefix is redrawn; the odds of one collision are 2^-32.
const MAX_DIRECT_ATTEMPTS: usize = 8;

/// How a wrapped blob is encoded on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    /// Untagged; direct vs hybrid inferred from the length prefix.
    #[default]
    Legacy,
    /// One leading format byte ([`TAG_DIRECT`] or [`TAG_HYBRID`]).
    Tagged,
}

/// Which wrapping path a payload takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Direct,
    Hybrid,
}

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Largest payload that can be OAEP-encrypted directly under `public`.
pub fn max_direct_plaintext(public: &RsaPublicKey) -> usize {
    public.size().saturating_sub(2 * OAEP_HASH_SIZE + 2)
}

/// Picks the wrapping path for a payload of `len` bytes.
pub fn wrap_mode_for(len: usize, public: &RsaPublicKey) -> WrapMode {
    if len <= max_direct_plaintext(public) {
        WrapMode::Direct
    } else {
        WrapMode::Hybrid
    }
}

/// Applies the legacy detection rule to an untagged blob.
pub fn detect_mode(blob: &[u8], private: &RsaPrivateKey) -> WrapMode {
    match read_length_prefix(blob) {
        Some(len) if len == private.size() => WrapMode::Hybrid,
        _ => WrapMode::Direct,
    }
}

fn read_length_prefix(blob: &[u8]) -> Option<usize> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = blob.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    usize::try_from(u32::from_le_bytes(prefix)).ok()
}

fn oaep_encrypt(public: &RsaPublicKey, bytes: &[u8]) -> CryptoResult<Vec<u8>> {
    public
        .encrypt(&mut rand::rngs::OsRng, oaep(), bytes)
        .map_err(|e| CryptoError::Encryption(format!("RSA-OAEP wrap failed: {e}")))
}

fn oaep_decrypt(private: &RsaPrivateKey, ciphertext: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    private
        .decrypt(oaep(), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::KeyUnwrap)
}

fn wrap_direct(bytes: &[u8], public: &RsaPublicKey, avoid_prefix_collision: bool) -> CryptoResult<Vec<u8>> {
    if !avoid_prefix_collision {
        return oaep_encrypt(public, bytes);
    }
    for _ in 0..MAX_DIRECT_ATTEMPTS {
        let ciphertext = oaep_encrypt(public, bytes)?;
        if read_length_prefix(&ciphertext) != Some(public.size()) {
            return Ok(ciphertext);
        }
    }
    Err(CryptoError::Encryption(
        "could not produce an unambiguous direct envelope".to_string(),
    ))
}

fn wrap_hybrid(bytes: &[u8], public: &RsaPublicKey) -> CryptoResult<Vec<u8>> {
    let session_key = DataKey::generate();
    let sealed = cipher::seal(session_key.as_bytes(), bytes)?;
    let wrapped_key = oaep_encrypt(public, session_key.as_bytes())?;

    let len = u32::try_from(wrapped_key.len())
        .map_err(|_| CryptoError::Encryption("wrapped key too large".to_string()))?;

    let mut out = Vec::with_capacity(
        LENGTH_PREFIX_SIZE + wrapped_key.len() + NONCE_SIZE + sealed.ciphertext.len(),
    );
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&wrapped_key);
    out.extend_from_slice(&sealed.nonce);
    out.extend_from_slice(&sealed.ciphertext);
    Ok(out)
}

fn unwrap_hybrid(blob: &[u8], private: &RsaPrivateKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let key_len = read_length_prefix(blob).ok_or(CryptoError::KeyUnwrap)?;
    if key_len != private.size() {
        return Err(CryptoError::KeyUnwrap);
    }

    let body = &blob[LENGTH_PREFIX_SIZE..];
    if body.len() < key_len + NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::KeyUnwrap);
    }
    let (wrapped_key, rest) = body.split_at(key_len);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let session_key = oaep_decrypt(private, wrapped_key)?;
    let session_key: &[u8; KEY_SIZE] = session_key
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::KeyUnwrap)?;

    let mut iv = [0u8; NONCE_SIZE];
    iv.copy_from_slice(nonce);
    let sealed = EncryptedData {
        nonce: iv,
        ciphertext: ciphertext.to_vec(),
    };
    cipher::open(session_key, &sealed).map_err(|_| CryptoError::KeyUnwrap)
}

/// Wraps `bytes` under `public` in the legacy (untagged) encoding.
///
/// Payloads up to [`max_direct_plaintext`] are OAEP-encrypted directly; larger
/// ones use the hybrid layout.
pub fn wrap_key(bytes: &[u8], public: &RsaPublicKey) -> CryptoResult<Vec<u8>> {
    match wrap_mode_for(bytes.len(), public) {
        WrapMode::Direct => wrap_direct(bytes, public, true),
        WrapMode::Hybrid => wrap_hybrid(bytes, public),
    }
}

/// Unwraps a legacy blob, detecting direct vs hybrid from the length prefix.
pub fn unwrap_key(blob: &[u8], private: &RsaPrivateKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
    match detect_mode(blob, private) {
        WrapMode::Hybrid => unwrap_hybrid(blob, private),
        WrapMode::Direct => oaep_decrypt(private, blob),
    }
}

/// Wraps `bytes` under `public` with a leading format byte.
pub fn wrap_key_tagged(bytes: &[u8], public: &RsaPublicKey) -> CryptoResult<Vec<u8>> {
    let (tag, body) = match wrap_mode_for(bytes.len(), public) {
        WrapMode::Direct => (TAG_DIRECT, wrap_direct(bytes, public, false)?),
        WrapMode::Hybrid => (TAG_HYBRID, wrap_hybrid(bytes, public)?),
    };
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(tag);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Unwraps a tagged blob. Unknown tags are rejected.
pub fn unwrap_key_tagged(blob: &[u8], private: &RsaPrivateKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
    match blob.split_first() {
        Some((&TAG_DIRECT, body)) => oaep_decrypt(private, body),
        Some((&TAG_HYBRID, body)) => unwrap_hybrid(body, private),
        _ => Err(CryptoError::KeyUnwrap),
    }
}

impl EnvelopeFormat {
    pub fn wrap(self, bytes: &[u8], public: &RsaPublicKey) -> CryptoResult<Vec<u8>> {
        match self {
            Self::Legacy => wrap_key(bytes, public),
            Self::Tagged => wrap_key_tagged(bytes, public),
        }
    }

    pub fn unwrap(self, blob: &[u8], private: &RsaPrivateKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
        match self {
            Self::Legacy => unwrap_key(blob, private),
            Self::Tagged => unwrap_key_tagged(blob, private),
        }
    }
}

/// Wraps a private key (PKCS#8 DER) for a recipient.
///
/// At RSA-2048 the DER form is always far above the direct limit, so this
/// takes the hybrid path.
pub fn wrap_private_key(
    key: &RsaPrivateKey,
    recipient: &RsaPublicKey,
    format: EnvelopeFormat,
) -> CryptoResult<Vec<u8>> {
    let der = private_key_to_der(key)?;
    format.wrap(&der, recipient)
}

/// Inverse of [`wrap_private_key`]. Undecodable keys are a [`CryptoError::KeyUnwrap`].
pub fn unwrap_private_key(
    blob: &[u8],
    private: &RsaPrivateKey,
    format: EnvelopeFormat,
) -> CryptoResult<RsaPrivateKey> {
    let der = format.unwrap(blob, private)?;
    private_key_from_der(&der).ok_or(CryptoError::KeyUnwrap)
}
