//! Master passphrase hashing, verification, and strength checks
//!
//! The master hash is the PBKDF2-HMAC-SHA256 stretch of the passphrase
//! under a random 16-byte salt, serialized as `base64(salt):base64(hash)`.
//! Verification recomputes the stretch and compares hashes in constant
//! time.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{constant_time_compare, generate_salt, pbkdf2_stretch, SALT_SIZE};
use crate::error::{VaultError, VaultResult};

/// Size of the stored passphrase hash in bytes
pub const HASH_SIZE: usize = 32;

/// Minimum passphrase length accepted as strong
const MIN_LENGTH: usize = 12;

/// Minimum estimated entropy in bits accepted as strong
const MIN_ENTROPY_BITS: f64 = 80.0;

/// Common passwords and words rejected as case-insensitive substrings
const BLACKLIST: &[&str] = &[
    "password", "123456", "12345678", "qwerty", "letmein", "welcome", "admin", "iloveyou",
    "monkey", "dragon", "master", "login", "abc123", "princess", "sunshine", "football",
    "shadow", "superman",
];

/// Holds the master passphrase salt and derived hash.
///
/// An empty hash means no passphrase has been set yet.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterAuthenticator {
    salt: [u8; SALT_SIZE],
    hash: Vec<u8>,
}

impl Default for MasterAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl MasterAuthenticator {
    /// Create an authenticator with a fresh salt and no passphrase set
    pub fn new() -> Self {
        Self {
            salt: generate_salt(),
            hash: Vec::new(),
        }
    }

    /// Reconstruct from a stored `salt:hash` string.
    ///
    /// The decoded salt length is validated; anything else is corruption.
    pub fn from_stored(stored: &str) -> VaultResult<Self> {
        let (salt, hash) = parse_stored(stored)
            .ok_or_else(|| VaultError::CorruptVaultFormat("malformed master hash".to_string()))?;

        let salt: [u8; SALT_SIZE] = salt
            .try_into()
            .map_err(|_| VaultError::CorruptVaultFormat("invalid salt length".to_string()))?;

        Ok(Self { salt, hash })
    }

    /// Serialize as `base64(salt):base64(hash)`
    pub fn serialize(&self) -> String {
        format!("{}:{}", BASE64.encode(self.salt), BASE64.encode(&self.hash))
    }

    pub fn is_passphrase_set(&self) -> bool {
        !self.hash.is_empty()
    }

    /// Replace the stored passphrase.
    ///
    /// First-time set succeeds without an old passphrase; otherwise the old
    /// passphrase must verify. Returns whether the replacement happened.
    pub fn set_new_passphrase(&mut self, old: &str, new: &str) -> VaultResult<bool> {
        if new.is_empty() {
            return Err(VaultError::InvalidInput(
                "new passphrase cannot be empty".to_string(),
            ));
        }

        if self.is_passphrase_set() && !verify(old, &self.serialize()) {
            return Ok(false);
        }

        self.force_set_new_passphrase(new)?;
        Ok(true)
    }

    /// Replace the stored passphrase without checking the old one
    pub fn force_set_new_passphrase(&mut self, new: &str) -> VaultResult<()> {
        if new.is_empty() {
            return Err(VaultError::InvalidInput(
                "new passphrase cannot be empty".to_string(),
            ));
        }

        let salt = generate_salt();
        let mut hash = vec![0u8; HASH_SIZE];
        pbkdf2_stretch(new.as_bytes(), &salt, &mut hash)?;

        self.clear_sensitive_data();
        self.salt = salt;
        self.hash = hash;
        Ok(())
    }

    /// Overwrite salt and hash in place
    pub fn clear_sensitive_data(&mut self) {
        self.salt.zeroize();
        self.hash.zeroize();
        self.hash.clear();
    }
}

/// Hash a passphrase under a fresh random salt, producing `salt:hash`
pub fn hash_passphrase(passphrase: &str) -> VaultResult<String> {
    if passphrase.is_empty() {
        return Err(VaultError::InvalidInput(
            "passphrase cannot be empty".to_string(),
        ));
    }

    let salt = generate_salt();
    let mut hash = vec![0u8; HASH_SIZE];
    pbkdf2_stretch(passphrase.as_bytes(), &salt, &mut hash)?;

    Ok(format!("{}:{}", BASE64.encode(salt), BASE64.encode(&hash)))
}

/// Verify a passphrase against a stored `salt:hash` string.
///
/// Returns `false` on empty input or a malformed stored value; the hash
/// comparison itself is constant-time.
pub fn verify(passphrase: &str, stored: &str) -> bool {
    if passphrase.is_empty() || stored.is_empty() {
        return false;
    }

    let Some((salt, expected)) = parse_stored(stored) else {
        return false;
    };
    if salt.len() != SALT_SIZE {
        return false;
    }

    let mut computed = vec![0u8; expected.len().max(1)];
    if pbkdf2_stretch(passphrase.as_bytes(), &salt, &mut computed).is_err() {
        return false;
    }

    constant_time_compare(&computed, &expected)
}

fn parse_stored(stored: &str) -> Option<(Vec<u8>, Vec<u8>)> {
    let (salt_part, hash_part) = stored.split_once(':')?;
    let salt = BASE64.decode(salt_part).ok()?;
    let hash = BASE64.decode(hash_part).ok()?;
    if hash.is_empty() {
        return None;
    }
    Some((salt, hash))
}

// === Passphrase strength policy ===

/// Check whether a passphrase satisfies the full strength policy
pub fn is_strong(passphrase: &str) -> VaultResult<bool> {
    Ok(failed_checks(passphrase)?.is_empty())
}

/// Ordered list of failed strength checks, or a single confirmation line
pub fn strength_feedback(passphrase: &str) -> VaultResult<Vec<String>> {
    let failures = failed_checks(passphrase)?;
    if failures.is_empty() {
        Ok(vec!["Passphrase is strong".to_string()])
    } else {
        Ok(failures.into_iter().map(String::from).collect())
    }
}

fn failed_checks(passphrase: &str) -> VaultResult<Vec<&'static str>> {
    if passphrase.is_empty() {
        return Err(VaultError::InvalidInput(
            "passphrase cannot be empty".to_string(),
        ));
    }

    let mut failures = Vec::new();

    if passphrase.chars().count() < MIN_LENGTH {
        failures.push("Must be at least 12 characters long");
    }
    if !passphrase.chars().any(|c| c.is_ascii_uppercase()) {
        failures.push("Must contain an uppercase letter");
    }
    if !passphrase.chars().any(|c| c.is_ascii_lowercase()) {
        failures.push("Must contain a lowercase letter");
    }
    if !passphrase.chars().any(|c| c.is_ascii_digit()) {
        failures.push("Must contain a digit");
    }
    if !passphrase.chars().any(|c| !c.is_alphanumeric() && c != ' ') {
        failures.push("Must contain a special character");
    }
    if contains_blacklisted_word(passphrase) {
        failures.push("Must not contain a common word or password");
    }
    if has_ascending_run(passphrase) {
        failures.push("Must not contain an ascending sequence like 'abc' or '123'");
    }
    if estimated_entropy_bits(passphrase) < MIN_ENTROPY_BITS {
        failures.push("Estimated entropy is below 80 bits");
    }

    Ok(failures)
}

fn contains_blacklisted_word(passphrase: &str) -> bool {
    let lowered = passphrase.to_lowercase();
    BLACKLIST.iter().any(|word| lowered.contains(word))
}

/// Detect a 3-character monotonically ascending run of letters or digits
fn has_ascending_run(passphrase: &str) -> bool {
    let chars: Vec<char> = passphrase.to_lowercase().chars().collect();
    chars.windows(3).any(|w| {
        let same_class = (w.iter().all(|c| c.is_ascii_lowercase()))
            || (w.iter().all(|c| c.is_ascii_digit()));
        same_class && w[1] as u32 == w[0] as u32 + 1 && w[2] as u32 == w[1] as u32 + 1
    })
}

/// `log2(charset) * length`, charset summed from the classes present
fn estimated_entropy_bits(passphrase: &str) -> f64 {
    let mut charset = 0u32;
    if passphrase.chars().any(|c| c.is_ascii_lowercase()) {
        charset += 26;
    }
    if passphrase.chars().any(|c| c.is_ascii_uppercase()) {
        charset += 26;
    }
    if passphrase.chars().any(|c| c.is_ascii_digit()) {
        charset += 10;
    }
    if passphrase.chars().any(|c| !c.is_alphanumeric() && c != ' ') {
        charset += 32;
    }

    if charset == 0 {
        return 0.0;
    }

    f64::from(charset).log2() * passphrase.chars().count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_passphrase("hunter2-hunter2").unwrap();
        assert!(verify("hunter2-hunter2", &stored));
        assert!(!verify("hunter2-hunter2x", &stored));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let a = hash_passphrase("same-passphrase").unwrap();
        let b = hash_passphrase("same-passphrase").unwrap();
        assert_ne!(a, b);
        assert!(verify("same-passphrase", &a));
        assert!(verify("same-passphrase", &b));
    }

    #[test]
    fn test_verify_rejects_malformed_stored() {
        assert!(!verify("pw", "no-separator"));
        assert!(!verify("pw", "!!!:###"));
        assert!(!verify("pw", ""));
        assert!(!verify("", "a:b"));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(
            hash_passphrase(""),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(is_strong(""), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_stored_roundtrip() {
        let mut auth = MasterAuthenticator::new();
        assert!(!auth.is_passphrase_set());

        auth.force_set_new_passphrase("initial-passphrase").unwrap();
        let stored = auth.serialize();

        let restored = MasterAuthenticator::from_stored(&stored).unwrap();
        assert!(restored.is_passphrase_set());
        assert!(verify("initial-passphrase", &restored.serialize()));
    }

    #[test]
    fn test_from_stored_validates_salt_length() {
        let bad_salt = BASE64.encode([0u8; 8]);
        let hash = BASE64.encode([0u8; HASH_SIZE]);
        assert!(matches!(
            MasterAuthenticator::from_stored(&format!("{bad_salt}:{hash}")),
            Err(VaultError::CorruptVaultFormat(_))
        ));
    }

    #[test]
    fn test_set_new_passphrase_first_time() {
        let mut auth = MasterAuthenticator::new();
        assert!(auth.set_new_passphrase("ignored", "first-passphrase").unwrap());
        assert!(verify("first-passphrase", &auth.serialize()));
    }

    #[test]
    fn test_set_new_passphrase_requires_old() {
        let mut auth = MasterAuthenticator::new();
        auth.force_set_new_passphrase("original").unwrap();

        assert!(!auth.set_new_passphrase("wrong-old", "replacement").unwrap());
        assert!(verify("original", &auth.serialize()));

        assert!(auth.set_new_passphrase("original", "replacement").unwrap());
        assert!(verify("replacement", &auth.serialize()));
    }

    #[test]
    fn test_clear_sensitive_data() {
        let mut auth = MasterAuthenticator::new();
        auth.force_set_new_passphrase("something").unwrap();
        auth.clear_sensitive_data();
        assert!(!auth.is_passphrase_set());
    }

    #[test]
    fn test_weak_passphrases() {
        assert!(!is_strong("abc").unwrap());
        assert!(!is_strong("alllowercaseonly!1").unwrap()); // no uppercase
        assert!(!is_strong("Short1!").unwrap());
        assert!(!is_strong("MyPassword123!x").unwrap()); // blacklist + "123"
    }

    #[test]
    fn test_strong_passphrase() {
        assert!(is_strong("Tr0ub4dor&3Zq!").unwrap());
    }

    #[test]
    fn test_entropy_gate() {
        // 12 chars with all four classes: log2(94) * 12 ~ 78.7 bits, which
        // passes every structural check but falls short of 80 bits.
        let pw = "Zx9!Qw7#Rt5k";
        let feedback = strength_feedback(pw).unwrap();
        assert!(feedback
            .iter()
            .any(|line| line.contains("entropy")));
        assert!(!is_strong(pw).unwrap());
    }

    #[test]
    fn test_ascending_run_detected() {
        assert!(has_ascending_run("xxabcxx"));
        assert!(has_ascending_run("xx123xx"));
        assert!(has_ascending_run("ABCdefGHI"));
        assert!(!has_ascending_run("acegik135"));
        // A letter run and a digit boundary do not mix
        assert!(!has_ascending_run("yz0"));
    }

    #[test]
    fn test_feedback_lists_failures_in_order() {
        let feedback = strength_feedback("abc").unwrap();
        assert!(feedback[0].contains("12 characters"));
        assert!(feedback.iter().any(|line| line.contains("uppercase")));
        assert!(feedback.iter().any(|line| line.contains("digit")));

        let strong = strength_feedback("Tr0ub4dor&3Zq!").unwrap();
        assert_eq!(strong, vec!["Passphrase is strong".to_string()]);
    }
}
