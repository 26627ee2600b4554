//! Cryptographic operations for vault security
//!
//! - AES-256-CBC with PKCS#7 padding for symmetric encryption
//! - PBKDF2-HMAC-SHA256 for passphrase-based key derivation
//! - Secure memory handling with zeroization
//!
//! Each encryption call produces a self-contained envelope
//! `base64(salt || iv || ciphertext)` with a fresh random salt and IV,
//! so repeated encryption of the same plaintext never yields the same
//! blob. CBC carries no authentication tag: a failed unpad is the only
//! observable signal for a wrong passphrase or tampered data, and the
//! two cases cannot be told apart.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::Hmac;
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};

/// Size of AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of CBC initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// Size of key-derivation salt in bytes
pub const SALT_SIZE: usize = 16;

/// PBKDF2 iteration count - fixed so brute-force guessing stays expensive
pub const PBKDF2_ITERATIONS: u32 = 100_000;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric key derived from a passphrase
pub struct DerivedKey(Secret<[u8; KEY_SIZE]>);

impl DerivedKey {
    pub(crate) fn expose(&self) -> &[u8; KEY_SIZE] {
        self.0.expose_secret()
    }
}

/// Run the PBKDF2 stretch over arbitrary input material.
pub(crate) fn pbkdf2_stretch(material: &[u8], salt: &[u8], out: &mut [u8]) -> VaultResult<()> {
    pbkdf2::pbkdf2::<Hmac<Sha256>>(material, salt, PBKDF2_ITERATIONS, out)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))
}

/// Derive a symmetric key from a passphrase and salt.
///
/// An optional per-record secret is concatenated onto the passphrase
/// before stretching, so a record-level secret changes the effective key
/// without changing the user-facing passphrase.
pub fn derive_key(
    passphrase: &str,
    salt: &[u8],
    record_secret: Option<&str>,
) -> VaultResult<DerivedKey> {
    if passphrase.is_empty() {
        return Err(VaultError::InvalidInput(
            "passphrase cannot be empty".to_string(),
        ));
    }

    let mut material = Zeroizing::new(passphrase.as_bytes().to_vec());
    if let Some(secret) = record_secret {
        material.extend_from_slice(secret.as_bytes());
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_stretch(&material, salt, &mut key)?;

    Ok(DerivedKey(Secret::new(key)))
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Generate a cryptographically secure random IV
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt a plaintext into a self-contained text envelope.
///
/// Output is `base64(salt || iv || ciphertext)`; salt and IV are freshly
/// generated on every call and never reused.
pub fn encrypt(
    plaintext: &str,
    passphrase: &str,
    record_secret: Option<&str>,
) -> VaultResult<String> {
    if plaintext.is_empty() {
        return Err(VaultError::InvalidInput(
            "plaintext cannot be empty".to_string(),
        ));
    }

    let salt = generate_salt();
    let iv = generate_iv();
    let key = derive_key(passphrase, &salt, record_secret)?;

    let ciphertext = Aes256CbcEnc::new(key.expose().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut blob = Vec::with_capacity(SALT_SIZE + IV_SIZE + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(blob))
}

/// Decrypt a text envelope produced by [`encrypt`].
///
/// Fails with [`VaultError::WrongPassphraseOrCorruptData`] when the
/// envelope is structurally broken or the final-block unpadding fails.
pub fn decrypt(
    encoded: &str,
    passphrase: &str,
    record_secret: Option<&str>,
) -> VaultResult<Zeroizing<String>> {
    if encoded.is_empty() {
        return Err(VaultError::InvalidInput(
            "ciphertext cannot be empty".to_string(),
        ));
    }

    let blob = BASE64
        .decode(encoded)
        .map_err(|_| VaultError::WrongPassphraseOrCorruptData)?;

    if blob.len() < SALT_SIZE + IV_SIZE {
        return Err(VaultError::WrongPassphraseOrCorruptData);
    }

    let salt = &blob[..SALT_SIZE];
    let iv: [u8; IV_SIZE] = blob[SALT_SIZE..SALT_SIZE + IV_SIZE]
        .try_into()
        .map_err(|_| VaultError::WrongPassphraseOrCorruptData)?;
    let ciphertext = &blob[SALT_SIZE + IV_SIZE..];

    let key = derive_key(passphrase, salt, record_secret)?;

    let plaintext = Aes256CbcDec::new(key.expose().into(), (&iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::WrongPassphraseOrCorruptData)?;

    let plaintext = Zeroizing::new(plaintext);
    match std::str::from_utf8(&plaintext) {
        Ok(text) => Ok(Zeroizing::new(text.to_string())),
        Err(_) => Err(VaultError::WrongPassphraseOrCorruptData),
    }
}

/// Constant-time comparison to prevent timing attacks
pub(crate) fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = generate_salt();

        let key1 = derive_key("test-passphrase", &salt, None).unwrap();
        let key2 = derive_key("test-passphrase", &salt, None).unwrap();

        assert_eq!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_record_secret_changes_key() {
        let salt = generate_salt();

        let plain = derive_key("pw", &salt, None).unwrap();
        let mixed = derive_key("pw", &salt, Some("record-secret")).unwrap();

        assert_ne!(plain.expose(), mixed.expose());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let salt = generate_salt();
        assert!(matches!(
            derive_key("", &salt, None),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let plaintext = "Hello, secure world!";
        let blob = encrypt(plaintext, "hunter2", None).unwrap();

        let decrypted = decrypt(&blob, "hunter2", None).unwrap();
        assert_eq!(plaintext, decrypted.as_str());
    }

    #[test]
    fn test_roundtrip_with_record_secret() {
        let blob = encrypt("per-record data", "hunter2", Some("extra")).unwrap();

        let decrypted = decrypt(&blob, "hunter2", Some("extra")).unwrap();
        assert_eq!("per-record data", decrypted.as_str());

        // Missing secret behaves exactly like a wrong passphrase
        assert!(matches!(
            decrypt(&blob, "hunter2", None),
            Err(VaultError::WrongPassphraseOrCorruptData)
        ));
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let blob = encrypt("secret data", "correct", None).unwrap();

        assert!(matches!(
            decrypt(&blob, "wrong", None),
            Err(VaultError::WrongPassphraseOrCorruptData)
        ));
    }

    #[test]
    fn test_encryption_is_nondeterministic() {
        let blob1 = encrypt("same plaintext", "pw", None).unwrap();
        let blob2 = encrypt("same plaintext", "pw", None).unwrap();

        assert_ne!(blob1, blob2);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(matches!(
            encrypt("", "pw", None),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            encrypt("data", "", None),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            decrypt("", "pw", None),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let short = BASE64.encode([0u8; SALT_SIZE + IV_SIZE - 1]);
        assert!(matches!(
            decrypt(&short, "pw", None),
            Err(VaultError::WrongPassphraseOrCorruptData)
        ));
    }

    #[test]
    fn test_garbage_encoding_rejected() {
        assert!(matches!(
            decrypt("not valid base64!!!", "pw", None),
            Err(VaultError::WrongPassphraseOrCorruptData)
        ));
    }

    // CBC without a MAC: a bit flip in the ciphertext body may decrypt to
    // garbage without a padding error. The blob is only guaranteed to fail
    // loudly when the final block's padding breaks - known weakness.
    #[test]
    fn test_tampered_final_block_detected() {
        let blob = encrypt("integrity matters", "pw", None).unwrap();
        let mut raw = BASE64.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = BASE64.encode(&raw);

        let result = decrypt(&tampered, "pw", None);
        // Either unpad failure or garbage-but-valid padding; never the
        // original plaintext.
        if let Ok(plaintext) = result {
            assert_ne!(plaintext.as_str(), "integrity matters");
        }
    }

    #[test]
    fn test_salt_and_iv_uniqueness() {
        assert_ne!(generate_salt(), generate_salt());
        assert_ne!(generate_iv(), generate_iv());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }
}
