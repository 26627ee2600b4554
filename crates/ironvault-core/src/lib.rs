//! IronVault Core - Encrypted credential storage
//!
//! This crate provides:
//! - AES-256-CBC encryption of the vault file and individual passwords
//! - PBKDF2-HMAC-SHA256 key derivation from the master passphrase
//! - Salted, stretched master passphrase hashing with strength checks
//! - Line-oriented vault serialization with per-record recovery
//! - Composable search filtering over credential records

pub mod auth;
pub mod crypto;
pub mod error;
pub mod filter;
pub mod models;
pub mod storage;
pub mod vault;

pub use auth::*;
pub use crypto::*;
pub use error::*;
pub use filter::*;
pub use models::*;
pub use storage::*;
pub use vault::*;
