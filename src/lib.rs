//! realmcfg - configuration schema and version migration for Realm servers
//!
//! Loads the single configuration document a server runs with, recognises
//! files written before version tagging existed, and carries older documents
//! forward to the current schema before any listener starts.

pub mod cli;
pub mod config;
pub mod logging;
pub mod schema;

pub use config::{load_config, ConfigHandle, ConfigLoader, ConfigStore, FileConfigStore, LoadOutcome};
pub use schema::{Config, CURRENT_VERSION};

/// Result type alias for realmcfg operations
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to realmcfg operations
#[derive(thiserror::Error, Debug)]
pub enum RealmConfigError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] config::PersistenceError),

    #[error("Document error: {0}")]
    Document(#[from] config::DocumentError),

    #[error("Migration error: {0}")]
    Migration(#[from] config::MigrationError),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Logging error: {0}")]
    Logging(String),
}
