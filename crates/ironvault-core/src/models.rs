//! Credential record model and its line-oriented serialization

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::crypto;
use crate::error::{VaultError, VaultResult};

/// Default category applied when none is given
pub const DEFAULT_CATEGORY: &str = "General";

/// Number of lines in a serialized record block
const RECORD_LINES: usize = 7;

/// One service/login/password entry plus metadata.
///
/// The password is held only as an encrypted envelope; the plaintext never
/// lives on the record. `last_modified` is refreshed by every mutating
/// setter.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    service_name: String,
    url: String,
    login: String,
    encrypted_password: String,
    category: String,
    internal_key: String,
    last_modified: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a validated record. Service name and login must be non-empty;
    /// an empty category falls back to [`DEFAULT_CATEGORY`].
    pub fn new(
        service_name: &str,
        url: &str,
        login: &str,
        encrypted_password: &str,
        category: &str,
    ) -> VaultResult<Self> {
        if service_name.is_empty() {
            return Err(VaultError::InvalidInput(
                "service name cannot be empty".to_string(),
            ));
        }
        if login.is_empty() {
            return Err(VaultError::InvalidInput(
                "login cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            service_name: service_name.to_string(),
            url: url.to_string(),
            login: login.to_string(),
            encrypted_password: encrypted_password.to_string(),
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            internal_key: String::new(),
            last_modified: Utc::now(),
        })
    }

    /// Decrypt this record's password with the given passphrase,
    /// mixing in the per-record internal key when one is set.
    pub fn decrypt_password(&self, passphrase: &str) -> VaultResult<Zeroizing<String>> {
        let secret = if self.internal_key.is_empty() {
            None
        } else {
            Some(self.internal_key.as_str())
        };
        crypto::decrypt(&self.encrypted_password, passphrase, secret)
    }

    /// Both service name and login empty - the only "empty record" case
    pub fn is_empty(&self) -> bool {
        self.service_name.is_empty() && self.login.is_empty()
    }

    /// Basic validity for vault insertion: service name and login present
    pub fn is_valid(&self) -> bool {
        !self.service_name.is_empty() && !self.login.is_empty()
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    // === Accessors ===

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn encrypted_password(&self) -> &str {
        &self.encrypted_password
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn internal_key(&self) -> &str {
        &self.internal_key
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    // === Setters (each refreshes last_modified) ===

    pub fn set_service_name(&mut self, name: &str) {
        self.service_name = name.to_string();
        self.touch();
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
        self.touch();
    }

    pub fn set_login(&mut self, login: &str) {
        self.login = login.to_string();
        self.touch();
    }

    pub fn set_encrypted_password(&mut self, encrypted_password: &str) {
        self.encrypted_password = encrypted_password.to_string();
        self.touch();
    }

    pub fn set_category(&mut self, category: &str) {
        self.category = if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.to_string()
        };
        self.touch();
    }

    pub fn set_internal_key(&mut self, key: &str) {
        self.internal_key = key.to_string();
        self.touch();
    }

    // === Serialization ===

    /// Serialize as a 7-line block (no surrounding markers).
    ///
    /// The internal key is deliberately written as an empty line: it is a
    /// transient secret and persisting it next to the password it protects
    /// would defeat its purpose.
    pub fn serialize(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n\n{}",
            self.service_name,
            self.url,
            self.login,
            self.encrypted_password,
            self.category,
            self.last_modified.timestamp()
        )
    }

    /// Parse a 7-line block.
    ///
    /// Tolerant of empty service/login so a damaged vault still loads what
    /// it can; structural problems (short block, bad timestamp) are errors
    /// so the caller can skip just this record.
    pub fn deserialize(block: &str) -> VaultResult<Self> {
        let lines: Vec<&str> = block.lines().collect();
        if lines.len() < RECORD_LINES {
            return Err(VaultError::CorruptVaultFormat(format!(
                "record block has {} lines, expected {}",
                lines.len(),
                RECORD_LINES
            )));
        }

        let epoch: i64 = lines[6].trim().parse().map_err(|_| {
            VaultError::CorruptVaultFormat("unparseable record timestamp".to_string())
        })?;
        let last_modified = DateTime::<Utc>::from_timestamp(epoch, 0).ok_or_else(|| {
            VaultError::CorruptVaultFormat("record timestamp out of range".to_string())
        })?;

        Ok(Self {
            service_name: lines[0].to_string(),
            url: lines[1].to_string(),
            login: lines[2].to_string(),
            encrypted_password: lines[3].to_string(),
            category: if lines[4].is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                lines[4].to_string()
            },
            internal_key: lines[5].to_string(),
            last_modified,
        })
    }
}
