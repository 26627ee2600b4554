//! IronVault CLI
//!
//! Interactive front end for the encrypted credential store. All secret
//! entry goes through a hidden prompt; the core never touches the
//! terminal.

mod config;
mod generator;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ironvault_core::{auth, crypto, CredentialRecord, CredentialVault, SearchFilter};

use crate::config::{default_base_dir, default_vault_path, load_config, CliConfig};
use crate::generator::PasswordGenerator;

#[derive(Parser)]
#[command(name = "ironvault")]
#[command(version)]
#[command(about = "IronVault - local encrypted credential store")]
#[command(after_help = "EXAMPLES:
  ironvault init                    Create a new vault
  ironvault add GitHub --login dev  Add a credential (prompts securely)
  ironvault get GitHub              Decrypt and print one password
  ironvault search --service git    Search records
  ironvault generate --length 24    Generate a random password")]
struct Cli {
    /// Vault file path (defaults to the configured or standard location)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new vault
    Init,

    /// Add a credential record
    Add {
        /// Service name (unique within the vault)
        service: String,
        /// Login / username
        #[arg(long)]
        login: String,
        /// Service URL
        #[arg(long, default_value = "")]
        url: String,
        /// Category (defaults to "General")
        #[arg(long, default_value = "")]
        category: String,
        /// Generate the password instead of prompting for it
        #[arg(long)]
        generate: bool,
    },

    /// List records (never shows passwords)
    List {
        /// Only records in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Decrypt and print one record's password
    Get {
        /// Service name
        service: String,
    },

    /// Remove a record
    Remove {
        /// Service name
        service: String,
    },

    /// Update fields of an existing record
    Update {
        /// Service name of the record to update
        service: String,
        /// Rename the service
        #[arg(long)]
        rename: Option<String>,
        /// New login
        #[arg(long)]
        login: Option<String>,
        /// New URL
        #[arg(long)]
        url: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },

    /// Search records by field queries
    Search {
        /// Substring query against the service name
        #[arg(long, default_value = "")]
        service: String,
        /// Substring query against the login
        #[arg(long, default_value = "")]
        login: String,
        /// Substring query against the URL
        #[arg(long, default_value = "")]
        url: String,
        /// Only these categories
        #[arg(long = "category", action = clap::ArgAction::Append)]
        categories: Vec<String>,
        /// Exclude these categories
        #[arg(long = "exclude-category", action = clap::ArgAction::Append)]
        excluded_categories: Vec<String>,
        /// Match exactly instead of by substring
        #[arg(long)]
        exact: bool,
        /// Case-sensitive matching
        #[arg(long)]
        case_sensitive: bool,
    },

    /// List all categories in use
    Categories,

    /// Generate a random password (no vault access)
    Generate {
        /// Password length
        #[arg(long)]
        length: Option<usize>,
        /// Exclude uppercase letters
        #[arg(long)]
        no_uppercase: bool,
        /// Exclude lowercase letters
        #[arg(long)]
        no_lowercase: bool,
        /// Exclude digits
        #[arg(long)]
        no_digits: bool,
        /// Exclude special characters
        #[arg(long)]
        no_special: bool,
    },

    /// Change the master passphrase
    ChangeMaster,

    /// Export record metadata as CSV (passwords are never exported)
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show vault statistics
    Stats,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => {
            println!("IronVault - local encrypted credential store");
            println!();
            println!("Run 'ironvault --help' for usage information.");
            println!("Run 'ironvault init' to create a new vault.");
        }
        Some(cmd) => {
            if let Err(e) = handle_command(cmd, cli.vault) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn handle_command(
    cmd: Commands,
    vault_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base_dir = default_base_dir();
    let cfg = load_config(&base_dir)?;
    let vault_path = resolve_vault_path(vault_override, &cfg, &base_dir);

    match cmd {
        Commands::Init => handle_init(&vault_path, &base_dir, &cfg),
        Commands::Add {
            service,
            login,
            url,
            category,
            generate,
        } => handle_add(&vault_path, &cfg, &service, &login, &url, &category, generate),
        Commands::List { category } => handle_list(&vault_path, category),
        Commands::Get { service } => handle_get(&vault_path, &service),
        Commands::Remove { service } => handle_remove(&vault_path, &service),
        Commands::Update {
            service,
            rename,
            login,
            url,
            category,
            password,
        } => handle_update(&vault_path, &service, rename, login, url, category, password),
        Commands::Search {
            service,
            login,
            url,
            categories,
            excluded_categories,
            exact,
            case_sensitive,
        } => handle_search(
            &vault_path,
            SearchFilter {
                service_query: service,
                login_query: login,
                url_query: url,
                categories,
                excluded_categories,
                exact_match: exact,
                case_sensitive,
                ..SearchFilter::default()
            },
        ),
        Commands::Categories => handle_categories(&vault_path),
        Commands::Generate {
            length,
            no_uppercase,
            no_lowercase,
            no_digits,
            no_special,
        } => handle_generate(&cfg, length, no_uppercase, no_lowercase, no_digits, no_special),
        Commands::ChangeMaster => handle_change_master(&vault_path),
        Commands::Export { output } => handle_export(&vault_path, output),
        Commands::Stats => handle_stats(&vault_path),
    }
}

fn resolve_vault_path(
    vault_override: Option<PathBuf>,
    cfg: &CliConfig,
    base_dir: &std::path::Path,
) -> PathBuf {
    vault_override
        .or_else(|| cfg.vault_path.clone())
        .unwrap_or_else(|| default_vault_path(base_dir))
}

// === Command handlers ===

fn handle_init(
    vault_path: &std::path::Path,
    base_dir: &std::path::Path,
    cfg: &CliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if vault_path.exists() {
        println!("Vault already exists at {}", vault_path.display());
        return Ok(());
    }

    println!("Creating new vault at {}", vault_path.display());
    println!();

    let passphrase = prompt_password("Enter master passphrase: ")?;
    let confirm = prompt_password("Confirm master passphrase: ")?;

    if passphrase != confirm {
        return Err("Passphrases do not match".into());
    }
    if passphrase.is_empty() {
        return Err("Passphrase cannot be empty".into());
    }

    for line in auth::strength_feedback(&passphrase)? {
        println!("  {}", line);
    }
    println!();

    if let Some(parent) = vault_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config::save_config(base_dir, cfg)?;

    let mut vault = CredentialVault::new(vault_path);
    vault.load_from_file(&passphrase)?;
    vault.save_to_file(&passphrase)?;

    println!("Vault created successfully!");
    println!();
    println!("Next steps:");
    println!("  ironvault add <service> --login <login>   Add a credential");
    println!("  ironvault list                            List records");

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_add(
    vault_path: &std::path::Path,
    cfg: &CliConfig,
    service: &str,
    login: &str,
    url: &str,
    category: &str,
    generate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut vault, passphrase) = unlock_vault(vault_path)?;

    let password = if generate {
        let pw = PasswordGenerator::new(&cfg.generator).generate()?;
        println!("Generated password: {}", pw);
        pw
    } else {
        prompt_password(&format!("Password for {}: ", service))?
    };

    let encrypted = crypto::encrypt(&password, &passphrase, None)?;
    let record = CredentialRecord::new(service, url, login, &encrypted, category)?;

    if !vault.add_record(record)? {
        return Err("Record is invalid (service name and login are required)".into());
    }
    vault.save_to_file(&passphrase)?;

    println!("Added '{}'.", service);
    Ok(())
}

fn handle_list(
    vault_path: &std::path::Path,
    category: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (vault, _) = unlock_vault(vault_path)?;

    let records = match &category {
        Some(cat) => vault.records_by_category(cat)?,
        None => vault.records()?.iter().collect(),
    };

    if records.is_empty() {
        println!("No records.");
        return Ok(());
    }

    for record in records {
        print_record(record);
    }
    Ok(())
}

fn handle_get(
    vault_path: &std::path::Path,
    service: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (vault, passphrase) = unlock_vault(vault_path)?;

    let record = vault
        .find_record(service)?
        .ok_or_else(|| format!("No record for service '{}'", service))?;

    let password = record.decrypt_password(&passphrase)?;
    println!("{}", password.as_str());
    Ok(())
}

fn handle_remove(
    vault_path: &std::path::Path,
    service: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut vault, passphrase) = unlock_vault(vault_path)?;

    if !vault.remove_record(service)? {
        println!("No record for service '{}'.", service);
        return Ok(());
    }

    vault.save_to_file(&passphrase)?;
    println!("Removed '{}'.", service);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_update(
    vault_path: &std::path::Path,
    service: &str,
    rename: Option<String>,
    login: Option<String>,
    url: Option<String>,
    category: Option<String>,
    password: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut vault, passphrase) = unlock_vault(vault_path)?;

    let mut updated = vault
        .find_record(service)?
        .ok_or_else(|| format!("No record for service '{}'", service))?
        .clone();

    if let Some(name) = rename {
        updated.set_service_name(&name);
    }
    if let Some(login) = login {
        updated.set_login(&login);
    }
    if let Some(url) = url {
        updated.set_url(&url);
    }
    if let Some(category) = category {
        updated.set_category(&category);
    }
    if password {
        let new_password = prompt_password("New password: ")?;
        updated.set_encrypted_password(&crypto::encrypt(&new_password, &passphrase, None)?);
    }

    vault.update_record(service, updated)?;
    vault.save_to_file(&passphrase)?;

    println!("Updated '{}'.", service);
    Ok(())
}

fn handle_search(
    vault_path: &std::path::Path,
    filter: SearchFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let (vault, _) = unlock_vault(vault_path)?;

    let hits = vault.search_records(&filter)?;
    if hits.is_empty() {
        println!("No matching records.");
        return Ok(());
    }

    println!("{} matching record(s):", hits.len());
    for record in hits {
        print_record(record);
    }
    Ok(())
}

fn handle_categories(vault_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let (vault, _) = unlock_vault(vault_path)?;

    let categories = vault.all_categories()?;
    if categories.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for category in categories {
        println!("{}", category);
    }
    Ok(())
}

fn handle_generate(
    cfg: &CliConfig,
    length: Option<usize>,
    no_uppercase: bool,
    no_lowercase: bool,
    no_digits: bool,
    no_special: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = PasswordGenerator::new(&cfg.generator);
    if let Some(length) = length {
        generator.set_length(length);
    }
    if no_uppercase {
        generator.set_uppercase(false);
    }
    if no_lowercase {
        generator.set_lowercase(false);
    }
    if no_digits {
        generator.set_digits(false);
    }
    if no_special {
        generator.set_special_chars(false);
    }

    println!("{}", generator.generate()?);
    Ok(())
}

fn handle_change_master(vault_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let (mut vault, old_passphrase) = unlock_vault(vault_path)?;

    let new_passphrase = prompt_password("New master passphrase: ")?;
    let confirm = prompt_password("Confirm new master passphrase: ")?;
    if new_passphrase != confirm {
        return Err("Passphrases do not match".into());
    }

    for line in auth::strength_feedback(&new_passphrase)? {
        println!("  {}", line);
    }

    if !vault.change_master_passphrase(&old_passphrase, &new_passphrase)? {
        return Err("Current passphrase did not verify".into());
    }

    // Every record password is encrypted under the master passphrase, so
    // re-encrypt them all under the new one before saving.
    let reencrypted: Result<Vec<CredentialRecord>, Box<dyn std::error::Error>> = vault
        .records()?
        .iter()
        .map(|record| {
            let plaintext = record.decrypt_password(&old_passphrase)?;
            let mut updated = record.clone();
            updated.set_encrypted_password(&crypto::encrypt(
                &plaintext,
                &new_passphrase,
                None,
            )?);
            Ok(updated)
        })
        .collect();
    for record in reencrypted? {
        let name = record.service_name().to_string();
        vault.update_record(&name, record)?;
    }

    vault.save_to_file(&new_passphrase)?;
    println!("Master passphrase changed.");
    Ok(())
}

fn handle_export(
    vault_path: &std::path::Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (vault, _) = unlock_vault(vault_path)?;

    let csv = vault.export_csv()?;
    match output {
        Some(path) => {
            std::fs::write(&path, csv)?;
            println!("Exported to {}", path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}

fn handle_stats(vault_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let (vault, _) = unlock_vault(vault_path)?;

    println!("Vault:          {}", vault.file_path().display());
    println!("Records:        {}", vault.record_count());
    println!("Categories:     {}", vault.all_categories()?.len());
    println!(
        "Last modified:  {}",
        vault.last_modified()?.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

// === Helper functions ===

fn unlock_vault(
    vault_path: &std::path::Path,
) -> Result<(CredentialVault, String), Box<dyn std::error::Error>> {
    if !vault_path.exists() {
        return Err(format!(
            "No vault found at {}. Run 'ironvault init' first.",
            vault_path.display()
        )
        .into());
    }

    let passphrase = prompt_password("Master passphrase: ")?;
    let mut vault = CredentialVault::new(vault_path);
    vault.load_from_file(&passphrase)?;
    Ok((vault, passphrase))
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let password = rpassword::read_password()?;
    Ok(password)
}

fn print_record(record: &CredentialRecord) {
    println!();
    println!("--- {} ---", record.service_name());
    if !record.url().is_empty() {
        println!("URL:           {}", record.url());
    }
    println!("Login:         {}", record.login());
    println!("Category:      {}", record.category());
    println!(
        "Last modified: {}",
        record.last_modified().format("%Y-%m-%d %H:%M:%S UTC")
    );
}
