//! Credential vault orchestration
//!
//! State machine: Locked (initial) -> Unlocked via [`CredentialVault::load_from_file`],
//! back to Locked via [`CredentialVault::lock`] or any load failure. Every
//! record operation requires the Unlocked state.
//!
//! A vault instance assumes single-process, single-instance access to its
//! file path. There is no file locking: concurrent writers to the same
//! path are last-writer-wins. Known limitation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::auth;
use crate::crypto;
use crate::error::{VaultError, VaultResult};
use crate::filter::SearchFilter;
use crate::models::CredentialRecord;
use crate::storage;

/// The full credential container: record set, master-hash metadata, and
/// the backing file path.
pub struct CredentialVault {
    records: Vec<CredentialRecord>,
    master_hash: Zeroizing<String>,
    authenticated: bool,
    file_path: PathBuf,
}

impl CredentialVault {
    /// Create a locked vault bound to a file path
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            records: Vec::new(),
            master_hash: Zeroizing::new(String::new()),
            authenticated: false,
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Load and decrypt the vault file, transitioning to Unlocked.
    ///
    /// A missing file is first-time creation: the master hash is computed
    /// from the supplied passphrase and the vault unlocks with an empty
    /// record set (nothing is written yet). Any failure clears in-memory
    /// state and leaves the vault Locked.
    pub fn load_from_file(&mut self, passphrase: &str) -> VaultResult<()> {
        if passphrase.is_empty() {
            return Err(VaultError::InvalidInput(
                "master passphrase cannot be empty".to_string(),
            ));
        }

        if !storage::vault_exists(&self.file_path) {
            self.master_hash = Zeroizing::new(auth::hash_passphrase(passphrase)?);
            self.records.clear();
            self.authenticated = true;
            return Ok(());
        }

        match self.load_existing(passphrase) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.lock();
                Err(e)
            }
        }
    }

    fn load_existing(&mut self, passphrase: &str) -> VaultResult<()> {
        let envelope = storage::read_vault_file(&self.file_path)?;
        let plaintext = crypto::decrypt(envelope.trim(), passphrase, None)?;
        let (master_hash, mut records) = storage::parse_vault(&plaintext)?;

        if !auth::verify(passphrase, &master_hash) {
            return Err(VaultError::WrongPassphraseOrCorruptData);
        }

        records.sort_by(|a, b| a.service_name().cmp(b.service_name()));

        self.master_hash = Zeroizing::new(master_hash);
        self.records = records;
        self.authenticated = true;
        Ok(())
    }

    /// Serialize, encrypt, and write the vault to its file path.
    ///
    /// The existing file is backed up before being overwritten; a failure
    /// anywhere leaves the previous on-disk state intact.
    pub fn save_to_file(&self, passphrase: &str) -> VaultResult<()> {
        self.require_unlocked()?;
        if passphrase.is_empty() {
            return Err(VaultError::InvalidInput(
                "master passphrase cannot be empty".to_string(),
            ));
        }

        let plaintext = Zeroizing::new(storage::serialize_vault(&self.master_hash, &self.records));
        let envelope = crypto::encrypt(&plaintext, passphrase, None)?;
        storage::write_vault_file(&self.file_path, envelope.as_bytes())
    }

    /// Clear the in-memory master hash and record set and return to Locked.
    ///
    /// The zeroing is a security requirement, not an optimization.
    pub fn lock(&mut self) {
        self.master_hash = Zeroizing::new(String::new());
        self.records.clear();
        self.authenticated = false;
    }

    /// Add a record.
    ///
    /// Returns `Ok(false)` when the record fails basic validation (caller
    /// can correct it); a duplicate service name is an error and leaves the
    /// record set unchanged.
    pub fn add_record(&mut self, record: CredentialRecord) -> VaultResult<bool> {
        self.require_unlocked()?;

        if !record.is_valid() {
            return Ok(false);
        }
        if self.service_exists(record.service_name()) {
            return Err(VaultError::DuplicateServiceName(
                record.service_name().to_string(),
            ));
        }

        self.records.push(record);
        self.sort_records();
        Ok(true)
    }

    /// Replace the record with the given service name.
    ///
    /// A rename must not collide with another record. Returns `Ok(false)`
    /// when no record matches.
    pub fn update_record(
        &mut self,
        service_name: &str,
        new_record: CredentialRecord,
    ) -> VaultResult<bool> {
        self.require_unlocked()?;

        let Some(index) = self
            .records
            .iter()
            .position(|r| r.service_name() == service_name)
        else {
            return Ok(false);
        };

        if new_record.service_name() != service_name
            && self.service_exists(new_record.service_name())
        {
            return Err(VaultError::DuplicateServiceName(
                new_record.service_name().to_string(),
            ));
        }

        self.records[index] = new_record;
        self.records[index].touch();
        self.sort_records();
        Ok(true)
    }

    /// Remove by exact service name; reports whether anything was removed
    pub fn remove_record(&mut self, service_name: &str) -> VaultResult<bool> {
        self.require_unlocked()?;

        let before = self.records.len();
        self.records.retain(|r| r.service_name() != service_name);
        Ok(self.records.len() != before)
    }

    /// Find by exact service name
    pub fn find_record(&self, service_name: &str) -> VaultResult<Option<&CredentialRecord>> {
        self.require_unlocked()?;
        Ok(self
            .records
            .iter()
            .find(|r| r.service_name() == service_name))
    }

    /// Linear scan applying the filter predicate
    pub fn search_records(&self, filter: &SearchFilter) -> VaultResult<Vec<&CredentialRecord>> {
        self.require_unlocked()?;
        Ok(self.records.iter().filter(|r| filter.matches(r)).collect())
    }

    /// Convenience search over a category-only filter
    pub fn records_by_category(&self, category: &str) -> VaultResult<Vec<&CredentialRecord>> {
        self.search_records(&SearchFilter::category_filter(category))
    }

    /// All records, sorted by service name
    pub fn records(&self) -> VaultResult<&[CredentialRecord]> {
        self.require_unlocked()?;
        Ok(&self.records)
    }

    /// Distinct category values, sorted and deduplicated
    pub fn all_categories(&self) -> VaultResult<Vec<String>> {
        self.require_unlocked()?;

        let mut categories: Vec<String> = self
            .records
            .iter()
            .map(|r| r.category().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Most recent record modification time, or now for an empty vault
    pub fn last_modified(&self) -> VaultResult<DateTime<Utc>> {
        self.require_unlocked()?;
        Ok(self
            .records
            .iter()
            .map(|r| r.last_modified())
            .max()
            .unwrap_or_else(Utc::now))
    }

    /// Replace the master passphrase after verifying the old one.
    ///
    /// Returns `Ok(false)` when the old passphrase does not verify. The
    /// change is in-memory; call [`CredentialVault::save_to_file`] with the
    /// new passphrase to persist it.
    pub fn change_master_passphrase(&mut self, old: &str, new: &str) -> VaultResult<bool> {
        self.require_unlocked()?;

        if !auth::verify(old, &self.master_hash) {
            return Ok(false);
        }

        self.master_hash = Zeroizing::new(auth::hash_passphrase(new)?);
        Ok(true)
    }

    /// Metadata-only CSV export (passwords are never exported)
    pub fn export_csv(&self) -> VaultResult<String> {
        self.require_unlocked()?;

        let mut out = String::from("service,url,login,category,last_modified\n");
        for record in &self.records {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(record.service_name()),
                csv_field(record.url()),
                csv_field(record.login()),
                csv_field(record.category()),
                record.last_modified().timestamp()
            ));
        }
        Ok(out)
    }

    fn require_unlocked(&self) -> VaultResult<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(VaultError::NotAuthenticated)
        }
    }

    fn service_exists(&self, service_name: &str) -> bool {
        self.records.iter().any(|r| r.service_name() == service_name)
    }

    fn sort_records(&mut self) {
        self.records
            .sort_by(|a, b| a.service_name().cmp(b.service_name()));
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
