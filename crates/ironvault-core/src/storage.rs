//! Vault file format and encrypted file storage
//!
//! The plaintext vault body (before envelope encryption) is line-oriented:
//! a header line, a version line, the serialized master hash, then zero or
//! more record blocks bounded by literal start/end markers. A record block
//! that fails to parse is logged and skipped so one corrupt record never
//! loses the whole vault.
//!
//! Writes take a backup of the existing file first, then go through a
//! temp-file rename so a failed save leaves the previous vault intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{VaultError, VaultResult};
use crate::models::CredentialRecord;

/// First line of every vault body
pub const VAULT_HEADER: &str = "IRONVAULT";

/// Format version line
pub const VAULT_VERSION: &str = "1.0";

/// Marker opening a record block
const RECORD_START: &str = "---RECORD---";

/// Marker closing a record block
const RECORD_END: &str = "---END_RECORD---";

/// Path of the backup taken before each overwrite
pub fn backup_file_path(path: &Path) -> PathBuf {
    sibling(path, ".bak")
}

fn temp_file_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Whether a vault file exists at the given path
pub fn vault_exists(path: &Path) -> bool {
    path.exists()
}

/// Serialize header, version, master hash, and all record blocks
pub fn serialize_vault(master_hash: &str, records: &[CredentialRecord]) -> String {
    let mut body = format!("{VAULT_HEADER}\n{VAULT_VERSION}\n{master_hash}\n");
    for record in records {
        body.push_str(RECORD_START);
        body.push('\n');
        body.push_str(&record.serialize());
        body.push('\n');
        body.push_str(RECORD_END);
        body.push('\n');
    }
    body
}

/// Parse a decrypted vault body into the stored master hash and records.
///
/// Header or version mismatch is fatal; an unparseable record block is
/// skipped with a warning.
pub fn parse_vault(plaintext: &str) -> VaultResult<(String, Vec<CredentialRecord>)> {
    let mut lines = plaintext.lines();

    match lines.next() {
        Some(VAULT_HEADER) => {}
        other => {
            return Err(VaultError::CorruptVaultFormat(format!(
                "unexpected header line: {:?}",
                other.unwrap_or("")
            )))
        }
    }
    match lines.next() {
        Some(VAULT_VERSION) => {}
        other => {
            return Err(VaultError::CorruptVaultFormat(format!(
                "unsupported vault version: {:?}",
                other.unwrap_or("")
            )))
        }
    }
    let master_hash = lines
        .next()
        .ok_or_else(|| VaultError::CorruptVaultFormat("missing master hash line".to_string()))?
        .to_string();

    let mut records = Vec::new();
    while let Some(line) = lines.next() {
        if line != RECORD_START {
            continue;
        }

        let mut block = String::new();
        for record_line in lines.by_ref() {
            if record_line == RECORD_END {
                break;
            }
            block.push_str(record_line);
            block.push('\n');
        }

        if block.is_empty() {
            continue;
        }
        match CredentialRecord::deserialize(&block) {
            Ok(record) => records.push(record),
            Err(e) => warn!(error = %e, "skipping unparseable record block"),
        }
    }

    Ok((master_hash, records))
}

/// Read the encrypted vault envelope from disk
pub fn read_vault_file(path: &Path) -> VaultResult<String> {
    Ok(fs::read_to_string(path)?)
}

/// Write the encrypted vault envelope to disk.
///
/// Backs up any existing file to `<path>.bak`, then writes through a temp
/// file and renames it into place.
pub fn write_vault_file(path: &Path, data: &[u8]) -> VaultResult<()> {
    if path.exists() {
        let backup = backup_file_path(path);
        if backup.exists() {
            fs::remove_file(&backup)?;
        }
        fs::copy(path, &backup)?;
    }

    let temp = temp_file_path(path);
    {
        let mut file = fs::File::create(&temp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    // Vault files are owner-only on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&temp, path)?;
    Ok(())
}
