//! Configuration management commands.
//!
//! Stores CLI configuration in `~/.campus/config.toml`, including the
//! session token saved by `campus auth login`.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., api-url)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show all configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Persistent CLI configuration stored on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// Return the path to the configuration file (`~/.campus/config.toml`).
fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".campus").join("config.toml"))
}

/// Load the CLI configuration from disk, returning defaults if the file does
/// not exist.
fn load_config() -> Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: CliConfig = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    Ok(cfg)
}

/// Save the CLI configuration to disk, creating the directory if needed.
fn save_config(cfg: &CliConfig) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(cfg).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Load the stored API URL, if configured.
pub fn load_api_url() -> Option<String> {
    load_config().ok()?.values.get("api-url").cloned()
}

/// Load the stored session token, if any.
pub fn load_token() -> Option<String> {
    load_config().ok()?.values.get("token").cloned()
}

/// Persist a session token (called by `auth login`).
pub fn store_token(token: &str) -> Result<()> {
    let mut cfg = load_config()?;
    cfg.values.insert("token".to_string(), token.to_string());
    save_config(&cfg)
}

/// Remove the stored session token (called by `auth logout`).
pub fn clear_token() -> Result<()> {
    let mut cfg = load_config()?;
    cfg.values.remove("token");
    save_config(&cfg)
}

pub async fn execute(cmd: ConfigCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Set { key, value } => {
            let mut cfg = load_config()?;
            cfg.values.insert(key.clone(), value);
            save_config(&cfg)?;
            output::print_success(&format!("Set {}", key));
        }

        ConfigCommands::Get { key } => {
            let cfg = load_config()?;
            match cfg.values.get(&key) {
                Some(value) => println!("{}", value),
                None => anyhow::bail!("Key not found: {}", key),
            }
        }

        ConfigCommands::Show => {
            let cfg = load_config()?;
            match format {
                OutputFormat::Table => {
                    output::print_header("CLI Configuration");
                    if cfg.values.is_empty() {
                        output::print_info("No configuration set");
                    }
                    for (key, value) in &cfg.values {
                        // Don't print session tokens in full.
                        if key == "token" {
                            let shown: String = value.chars().take(12).collect();
                            output::print_detail(key, &format!("{}…", shown));
                        } else {
                            output::print_detail(key, value);
                        }
                    }
                }
                _ => output::print_item(&cfg, format),
            }
        }

        ConfigCommands::Reset { force } => {
            if !force {
                anyhow::bail!("Pass --force to reset configuration");
            }
            save_config(&CliConfig::default())?;
            output::print_success("Configuration reset");
        }
    }

    Ok(())
}
