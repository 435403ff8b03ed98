//! Identity keypair and password-protected private key envelope.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lockbox_crypto::{
    decrypt_and_import_private_key, derive_key, export_and_encrypt_private_key,
    export_public_key, import_public_key, unwrap_key, wrap_key, CryptoError, DataKey,
    IdentityKeyPair, KdfParams, RsaPublicKey, Salt, MAX_RSA_MODULUS_BITS, NONCE_SIZE,
};
use std::sync::LazyLock;

static KEYPAIR: LazyLock<IdentityKeyPair> = LazyLock::new(|| IdentityKeyPair::generate().unwrap());

#[test]
fn public_key_pem_roundtrip() {
    let pem = export_public_key(&KEYPAIR.public).unwrap();
    assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
    assert!(pem.trim_end().ends_with("-----END PUBLIC KEY-----"));

    let imported = import_public_key(&pem).unwrap();
    assert_eq!(imported, KEYPAIR.public);
}

#[test]
fn modulus_above_import_limit_not_generated() {
    let err = IdentityKeyPair::generate_with_bits(MAX_RSA_MODULUS_BITS + 64).unwrap_err();
    assert!(matches!(err, CryptoError::KeyGeneration(_)));
}

#[test]
fn single_line_pem_body_accepted() {
    let pem = export_public_key(&KEYPAIR.public).unwrap();
    let body: String = pem
        .lines()
        .filter(|l| !l.starts_with("-----"))
        .collect();
    let single_line = format!("-----BEGIN PUBLIC KEY-----\n{body}\n-----END PUBLIC KEY-----");

    let imported: RsaPublicKey = import_public_key(&single_line).unwrap();
    assert_eq!(imported, KEYPAIR.public);
}

#[test]
fn private_key_envelope_roundtrip_decrypts_for_public_key() {
    let salt = Salt::random();
    let derived = derive_key("correct-horse-battery-staple", &salt, &KdfParams::default()).unwrap();

    // Data wrapped for the public key before the private key went into its envelope.
    let data_key = DataKey::generate();
    let wrapped = wrap_key(data_key.as_bytes(), &KEYPAIR.public).unwrap();

    let blob = export_and_encrypt_private_key(&KEYPAIR.private, &derived).unwrap();
    let restored = decrypt_and_import_private_key(&blob, &derived).unwrap();

    let unwrapped = unwrap_key(&wrapped, &restored).unwrap();
    assert_eq!(unwrapped.as_slice(), data_key.as_bytes());
}

#[test]
fn envelope_layout_is_iv_then_ciphertext() {
    let derived = derive_key("layout", &Salt::random(), &KdfParams::default()).unwrap();
    let blob = export_and_encrypt_private_key(&KEYPAIR.private, &derived).unwrap();
    let raw = BASE64.decode(blob).unwrap();
    // PKCS#8 for RSA-2048 is well over a kilobyte.
    assert!(raw.len() > NONCE_SIZE + 1000);
}

#[test]
fn same_password_and_salt_unlock_envelope() {
    let salt = Salt::from_bytes([0u8; 16]);
    let first = derive_key("Tr0ub4dor&3", &salt, &KdfParams::default()).unwrap();
    let second = derive_key("Tr0ub4dor&3", &salt, &KdfParams::default()).unwrap();

    let blob = export_and_encrypt_private_key(&KEYPAIR.private, &first).unwrap();
    assert!(decrypt_and_import_private_key(&blob, &second).is_ok());
}

#[test]
fn wrong_password_and_corruption_share_one_error() {
    let salt = Salt::random();
    let right = derive_key("right password", &salt, &KdfParams::default()).unwrap();
    let wrong = derive_key("wrong password", &salt, &KdfParams::default()).unwrap();
    let blob = export_and_encrypt_private_key(&KEYPAIR.private, &right).unwrap();

    let wrong_password = decrypt_and_import_private_key(&blob, &wrong).unwrap_err();

    let mut raw = BASE64.decode(&blob).unwrap();
    raw[NONCE_SIZE + 10] ^= 0x01;
    let corrupted = decrypt_and_import_private_key(&BASE64.encode(&raw), &right).unwrap_err();

    assert!(matches!(wrong_password, CryptoError::Decryption));
    assert!(matches!(corrupted, CryptoError::Decryption));
    assert_eq!(wrong_password.to_string(), corrupted.to_string());
}

#[test]
fn bit_flips_in_envelope_detected() {
    let derived = derive_key("flip", &Salt::random(), &KdfParams::default()).unwrap();
    let blob = export_and_encrypt_private_key(&KEYPAIR.private, &derived).unwrap();
    let raw = BASE64.decode(&blob).unwrap();

    for byte in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[byte] ^= 1 << (byte % 8);
        assert!(
            matches!(
                decrypt_and_import_private_key(&BASE64.encode(&tampered), &derived),
                Err(CryptoError::Decryption)
            ),
            "flip in byte {byte} went undetected"
        );
    }
}

#[test]
fn different_salts_give_unrelated_keys() {
    let a = derive_key("same password", &Salt::random(), &KdfParams::default()).unwrap();
    let b = derive_key("same password", &Salt::random(), &KdfParams::default()).unwrap();
    let blob = export_and_encrypt_private_key(&KEYPAIR.private, &a).unwrap();
    assert!(decrypt_and_import_private_key(&blob, &b).is_err());
}
