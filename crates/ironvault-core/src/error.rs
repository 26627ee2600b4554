//! Error types for vault operations

use thiserror::Error;

/// Errors that can occur during vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Vault is locked - unlock with master passphrase first")]
    NotAuthenticated,

    #[error("A record for service '{0}' already exists")]
    DuplicateServiceName(String),

    #[error("Decryption failed - wrong passphrase or corrupted data")]
    WrongPassphraseOrCorruptData,

    #[error("Corrupt vault format: {0}")]
    CorruptVaultFormat(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Cipher error: {0}")]
    Cipher(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VaultResult<T> = Result<T, VaultError>;
