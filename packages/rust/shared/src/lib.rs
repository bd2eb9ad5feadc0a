//! Shared error model and configuration for pubtools.
//!
//! This crate is depended on by every other pubtools crate.
//! It provides:
//! - [`PubtoolsError`] — the unified error type
//! - Configuration ([`AppConfig`], [`ConnectionConfig`], config loading)

pub mod config;
pub mod error;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConnectionConfig, ElasticsearchConfig, ManifestConfig, PublicationConfig,
    config_dir, config_file_path, load_config, load_config_from, load_config_or_default,
};
pub use error::{PubtoolsError, Result};
