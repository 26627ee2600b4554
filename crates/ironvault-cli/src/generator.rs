//! Random password generation
//!
//! Pure utility: the core only ever sees the resulting plaintext string,
//! which it encrypts before storage.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::GeneratorConfig;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?";

pub struct PasswordGenerator {
    length: usize,
    uppercase: bool,
    lowercase: bool,
    digits: bool,
    special_chars: bool,
}

impl PasswordGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            length: config.length,
            uppercase: config.uppercase,
            lowercase: config.lowercase,
            digits: config.digits,
            special_chars: config.special_chars,
        }
    }

    pub fn set_length(&mut self, length: usize) {
        self.length = length;
    }

    pub fn set_uppercase(&mut self, enabled: bool) {
        self.uppercase = enabled;
    }

    pub fn set_lowercase(&mut self, enabled: bool) {
        self.lowercase = enabled;
    }

    pub fn set_digits(&mut self, enabled: bool) {
        self.digits = enabled;
    }

    pub fn set_special_chars(&mut self, enabled: bool) {
        self.special_chars = enabled;
    }

    /// Generate a random password containing at least one character from
    /// every enabled class.
    pub fn generate(&self) -> Result<String, Box<dyn std::error::Error>> {
        let mut classes: Vec<&[u8]> = Vec::new();
        if self.uppercase {
            classes.push(UPPERCASE);
        }
        if self.lowercase {
            classes.push(LOWERCASE);
        }
        if self.digits {
            classes.push(DIGITS);
        }
        if self.special_chars {
            classes.push(SPECIAL);
        }

        if classes.is_empty() {
            return Err("at least one character class must be enabled".into());
        }
        if self.length < classes.len() {
            return Err(format!(
                "length {} too short for {} enabled character classes",
                self.length,
                classes.len()
            )
            .into());
        }

        let pool: Vec<u8> = classes.concat();
        let mut password = Vec::with_capacity(self.length);

        // One guaranteed character per enabled class, then random fill
        for class in &classes {
            password.push(class[OsRng.gen_range(0..class.len())]);
        }
        while password.len() < self.length {
            password.push(pool[OsRng.gen_range(0..pool.len())]);
        }
        password.shuffle(&mut OsRng);

        Ok(String::from_utf8(password)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_length() {
        let generator = PasswordGenerator::new(&GeneratorConfig::default());
        assert_eq!(generator.generate().unwrap().len(), 16);
    }

    #[test]
    fn test_contains_every_enabled_class() {
        let generator = PasswordGenerator::new(&GeneratorConfig::default());
        for _ in 0..20 {
            let pw = generator.generate().unwrap();
            assert!(pw.bytes().any(|b| UPPERCASE.contains(&b)));
            assert!(pw.bytes().any(|b| LOWERCASE.contains(&b)));
            assert!(pw.bytes().any(|b| DIGITS.contains(&b)));
            assert!(pw.bytes().any(|b| SPECIAL.contains(&b)));
        }
    }

    #[test]
    fn test_disabled_classes_are_absent() {
        let mut generator = PasswordGenerator::new(&GeneratorConfig::default());
        generator.set_special_chars(false);
        generator.set_uppercase(false);
        generator.set_length(12);

        let pw = generator.generate().unwrap();
        assert!(!pw.bytes().any(|b| SPECIAL.contains(&b)));
        assert!(!pw.bytes().any(|b| UPPERCASE.contains(&b)));
    }

    #[test]
    fn test_no_classes_enabled_is_an_error() {
        let mut generator = PasswordGenerator::new(&GeneratorConfig::default());
        generator.set_uppercase(false);
        generator.set_lowercase(false);
        generator.set_digits(false);
        generator.set_special_chars(false);

        assert!(generator.generate().is_err());
    }

    #[test]
    fn test_successive_passwords_differ() {
        let generator = PasswordGenerator::new(&GeneratorConfig::default());
        assert_ne!(generator.generate().unwrap(), generator.generate().unwrap());
    }
}
