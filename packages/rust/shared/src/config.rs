//! Application configuration for pubtools.
//!
//! User config lives at `~/.pubtools/pubtools.toml`.
//! CLI flags (and their env vars) override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PubtoolsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pubtools.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pubtools";

// ---------------------------------------------------------------------------
// Config structs (matching pubtools.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search service connection settings.
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Publishing pipeline lookup keys.
    #[serde(default)]
    pub publication: PublicationConfig,

    /// Manifest aggregation settings.
    #[serde(default)]
    pub manifest: ManifestConfig,
}

/// `[elasticsearch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL of the search service.
    #[serde(default = "default_host")]
    pub host: String,

    /// Basic-auth user name. No auth header is sent when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Name of the env var holding the password (never store the password itself).
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            user: None,
            password_env: default_password_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:9200".into()
}
fn default_password_env() -> String {
    "ES_PASSWORD".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[publication]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationConfig {
    /// Index holding the sequence document.
    #[serde(default = "default_sequence_index")]
    pub sequence_index: String,

    /// `_id` of the sequence document whose `_version` is the sequence number.
    #[serde(default = "default_sequence_id")]
    pub sequence_id: String,

    /// Index holding publishing process documents.
    #[serde(default = "default_process_index")]
    pub process_index: String,

    /// Prefix joined with the sequence number to form the process `id.name`.
    #[serde(default = "default_process_prefix")]
    pub process_prefix: String,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            sequence_index: default_sequence_index(),
            sequence_id: default_sequence_id(),
            process_index: default_process_index(),
            process_prefix: default_process_prefix(),
        }
    }
}

fn default_sequence_index() -> String {
    "sequence".into()
}
fn default_sequence_id() -> String {
    "PublishingPlan-Production".into()
}
fn default_process_index() -> String {
    "bss_spublishingprocess_v1".into()
}
fn default_process_prefix() -> String {
    "Production_".into()
}

/// `[manifest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Exact file name of the fragments to collect.
    #[serde(default = "default_manifest_file_name")]
    pub manifest_file_name: String,

    /// File name of the merged output, written into the scanned directory.
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,

    /// Skip malformed fragments with a warning instead of aborting.
    #[serde(default)]
    pub skip_malformed: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            manifest_file_name: default_manifest_file_name(),
            output_file_name: default_output_file_name(),
            skip_malformed: false,
        }
    }
}

fn default_manifest_file_name() -> String {
    "manifest.xml".into()
}
fn default_output_file_name() -> String {
    "manifest_temporary.xml".into()
}

// ---------------------------------------------------------------------------
// Connection config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime search-service settings, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    /// Build from the config file, with CLI/env values taking precedence.
    ///
    /// The password falls back to the env var named by `password_env`.
    pub fn resolve(
        config: &ElasticsearchConfig,
        host: Option<String>,
        user: Option<String>,
        password: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        let password = password.or_else(|| {
            std::env::var(&config.password_env)
                .ok()
                .filter(|v| !v.is_empty())
        });

        Self {
            host: host.unwrap_or_else(|| config.host.clone()),
            user: user.or_else(|| config.user.clone()),
            password,
            timeout_secs: timeout_secs.unwrap_or(config.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pubtools/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| PubtoolsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pubtools/pubtools.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(error = %e, "no config location, using defaults");
            return Ok(AppConfig::default());
        }
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PubtoolsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PubtoolsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Load from `path` when given, otherwise from the default location.
pub fn load_config_or_default(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config(),
    }
}
