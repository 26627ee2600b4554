//! CLI configuration stored as TOML next to the vault

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file name inside the IronVault directory
const CONFIG_FILE: &str = "config.toml";

/// Default vault file name
const VAULT_FILE: &str = "ironvault.dat";

/// Default IronVault directory name under the home directory
const IRONVAULT_DIR: &str = ".ironvault";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Vault file path; `None` means the default location
    pub vault_path: Option<PathBuf>,

    /// Password generator defaults
    pub generator: GeneratorConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            vault_path: None,
            generator: GeneratorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub special_chars: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            special_chars: true,
        }
    }
}

/// IronVault directory (`~/.ironvault`, falling back to the cwd)
pub fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(IRONVAULT_DIR)
}

pub fn default_vault_path(base_dir: &Path) -> PathBuf {
    base_dir.join(VAULT_FILE)
}

/// Load the config, returning defaults when no file exists
pub fn load_config(base_dir: &Path) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let path = base_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

/// Save the config, creating the IronVault directory if needed
pub fn save_config(base_dir: &Path, config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(base_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(base_dir, fs::Permissions::from_mode(0o700))?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(base_dir.join(CONFIG_FILE), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.vault_path.is_none());
        assert_eq!(config.generator.length, 16);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut config = CliConfig::default();
        config.vault_path = Some(PathBuf::from("/tmp/custom.dat"));
        config.generator.length = 24;
        config.generator.special_chars = false;

        save_config(dir.path(), &config).unwrap();
        let loaded = load_config(dir.path()).unwrap();

        assert_eq!(loaded.vault_path, config.vault_path);
        assert_eq!(loaded.generator.length, 24);
        assert!(!loaded.generator.special_chars);
    }
}
