//! Detection of configuration files that predate schema versioning
//!
//! A legacy file has no top-level `version` key. By default it is replaced
//! with a fresh default configuration: none of its values survive. Stores
//! that keep backups get a copy of the legacy file first, and
//! [`LegacyPolicy::Merge`] carries forward every value whose path still
//! exists in the current schema instead.

use crate::config::carry::carry_forward;
use crate::config::document::document_version;
use crate::config::persistence::ConfigStore;
use crate::schema::{Config, CURRENT_VERSION};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// What to write over a legacy file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyPolicy {
    /// Write a fresh default configuration, discarding every legacy value
    #[default]
    Reset,
    /// Keep legacy values whose path exists in the current schema
    Merge,
}

impl FromStr for LegacyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reset" => Ok(LegacyPolicy::Reset),
            "merge" => Ok(LegacyPolicy::Merge),
            _ => Err(format!("Invalid legacy policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyStatus {
    /// The document carries a version tag, or could not be read at all
    NotLegacy,
    /// No version tag; the file was rewritten
    Rewritten,
    /// No version tag; the rewrite failed and the file is unchanged
    RewriteFailed,
}

#[derive(Debug, Clone)]
pub struct LegacyOutcome {
    pub status: LegacyStatus,
    /// What was written (and is now the configuration to run with)
    pub config: Option<Config>,
    pub backup: Option<PathBuf>,
}

impl LegacyOutcome {
    fn not_legacy() -> Self {
        Self {
            status: LegacyStatus::NotLegacy,
            config: None,
            backup: None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.status != LegacyStatus::NotLegacy
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LegacyDetector {
    policy: LegacyPolicy,
    backup_before_rewrite: bool,
}

impl Default for LegacyDetector {
    fn default() -> Self {
        Self::new(LegacyPolicy::default())
    }
}

impl LegacyDetector {
    pub fn new(policy: LegacyPolicy) -> Self {
        Self {
            policy,
            backup_before_rewrite: true,
        }
    }

    pub fn with_backup(mut self, backup_before_rewrite: bool) -> Self {
        self.backup_before_rewrite = backup_before_rewrite;
        self
    }

    pub fn policy(&self) -> LegacyPolicy {
        self.policy
    }

    /// Read the store's raw document and rewrite it if it has no version tag.
    ///
    /// Read and parse errors are not reported: an unreadable document is
    /// treated as not legacy.
    pub fn detect_and_rewrite<S>(&self, store: &mut S) -> LegacyOutcome
    where
        S: ConfigStore + ?Sized,
    {
        let document = match store.load_document() {
            Ok(document) => document,
            Err(e) => {
                debug!("Skipping legacy check, document unreadable: {}", e);
                return LegacyOutcome::not_legacy();
            }
        };

        if document_version(&document).is_some() {
            return LegacyOutcome::not_legacy();
        }

        info!("Updating legacy configuration {}", store.describe());

        let backup = if self.backup_before_rewrite {
            match store.backup("legacy_rewrite") {
                Ok(path) => {
                    if let Some(path) = &path {
                        info!("Legacy configuration saved to {}", path.display());
                    }
                    path
                }
                Err(e) => {
                    warn!("Failed to back up legacy configuration: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let replacement = match self.policy {
            LegacyPolicy::Reset => Config::default(),
            LegacyPolicy::Merge => match carry_forward::<Config>(&document) {
                Ok(carried) => {
                    let mut config = carried.value;
                    config.version = CURRENT_VERSION;
                    config
                }
                Err(e) => {
                    warn!("Failed to merge legacy values, writing defaults: {}", e);
                    Config::default()
                }
            },
        };

        match store.save(&replacement) {
            Ok(()) => LegacyOutcome {
                status: LegacyStatus::Rewritten,
                config: Some(replacement),
                backup,
            },
            Err(e) => {
                warn!("Failed to rewrite legacy configuration: {}", e);
                LegacyOutcome {
                    status: LegacyStatus::RewriteFailed,
                    config: None,
                    backup,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::persistence::{MemoryConfigStore, MockConfigStore, PersistenceError};
    use serde_json::json;

    fn legacy_document() -> serde_json::Value {
        json!({
            "account": {"autoCreate": false},
            "server": {"http": {"bindPort": 8443}, "game": {"bindPort": 23000}}
        })
    }

    #[test]
    fn test_versioned_document_is_not_legacy() {
        let mut store = MemoryConfigStore::with_document(json!({"version": 1}));

        let outcome = LegacyDetector::default().detect_and_rewrite(&mut store);

        assert_eq!(outcome.status, LegacyStatus::NotLegacy);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_reset_discards_every_legacy_value() {
        let mut store = MemoryConfigStore::with_document(legacy_document());

        let outcome = LegacyDetector::new(LegacyPolicy::Reset).detect_and_rewrite(&mut store);

        assert_eq!(outcome.status, LegacyStatus::Rewritten);
        assert_eq!(outcome.config, Some(Config::default()));
        assert_eq!(store.writes(), 1);

        let written = store.document().unwrap();
        assert_eq!(written["version"], CURRENT_VERSION);
        assert_eq!(written["account"]["autoCreate"], true);
        assert_eq!(written["server"]["http"]["bindPort"], 443);
        assert_eq!(store.backups(), &[legacy_document()]);
    }

    #[test]
    fn test_merge_keeps_matching_legacy_values() {
        let mut store = MemoryConfigStore::with_document(legacy_document());

        let outcome = LegacyDetector::new(LegacyPolicy::Merge).detect_and_rewrite(&mut store);

        let config = outcome.config.unwrap();
        assert_eq!(config.version, CURRENT_VERSION);
        assert!(!config.account.auto_create);
        assert_eq!(config.server.http.bind_port, 8443);
        assert_eq!(config.server.game.bind_port, 23000);
    }

    #[test]
    fn test_unreadable_document_is_not_legacy() {
        let mut store = MockConfigStore::new();
        store.expect_load_document().returning(|| {
            Err(PersistenceError::Unavailable {
                message: "corrupt".to_string(),
            })
        });
        store.expect_save().never();

        let outcome = LegacyDetector::default().detect_and_rewrite(&mut store);
        assert!(!outcome.is_legacy());
    }

    #[test]
    fn test_backup_failure_does_not_block_rewrite() {
        let mut store = MockConfigStore::new();
        store.expect_load_document().returning(|| Ok(json!({"server": {}})));
        store.expect_describe().return_const("<mock>".to_string());
        store.expect_backup().times(1).returning(|_| {
            Err(PersistenceError::BackupError {
                message: "read-only".to_string(),
            })
        });
        store.expect_save().times(1).returning(|_| Ok(()));

        let outcome = LegacyDetector::default().detect_and_rewrite(&mut store);
        assert_eq!(outcome.status, LegacyStatus::Rewritten);
        assert!(outcome.backup.is_none());
    }

    #[test]
    fn test_backup_can_be_disabled() {
        let mut store = MemoryConfigStore::with_document(legacy_document());

        LegacyDetector::default()
            .with_backup(false)
            .detect_and_rewrite(&mut store);

        assert!(store.backups().is_empty());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("MERGE".parse::<LegacyPolicy>().unwrap(), LegacyPolicy::Merge);
        assert!("keep".parse::<LegacyPolicy>().is_err());
    }
}
