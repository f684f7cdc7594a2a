use crate::config::document::{DocumentError, DocumentFormat};
use crate::schema::{Config, CURRENT_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Document error: {0}")]
    DocumentError(#[from] DocumentError),
    #[error("Backup metadata error: {0}")]
    MetadataError(#[from] toml::ser::Error),
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Backup error: {message}")]
    BackupError { message: String },
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

/// Where and how a configuration document is stored.
///
/// The migration code only talks to this trait; the file-backed store is the
/// production implementation.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    /// Whether a document has been written yet
    fn exists(&self) -> bool;

    /// Read and parse the raw document
    fn load_document(&self) -> Result<Value, PersistenceError>;

    /// Replace the stored document with `config`
    fn save(&mut self, config: &Config) -> Result<(), PersistenceError>;

    /// Copy the current document aside before a destructive rewrite.
    ///
    /// Returns where the copy went, or `None` when there was nothing to copy
    /// or the store keeps no backups.
    fn backup(&mut self, reason: &str) -> Result<Option<PathBuf>, PersistenceError>;

    /// Human-readable location used in log messages
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub config_path: PathBuf,
    pub backup_dir: PathBuf,
    pub max_backups: usize,
    pub atomic_writes: bool,
    pub file_permissions: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::for_path("config.json")
    }
}

impl StoreOptions {
    /// Options for a config file at `config_path`, backups next to it
    pub fn for_path(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let backup_dir = config_path
            .parent()
            .map(|dir| dir.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));

        Self {
            config_path,
            backup_dir,
            max_backups: 10,
            atomic_writes: true,
            file_permissions: 0o600, // Read/write for owner only
        }
    }

    /// Load store options from environment variables
    pub fn from_env() -> Self {
        let mut options = match std::env::var("REALMCFG_CONFIG") {
            Ok(path) if !path.is_empty() => Self::for_path(path),
            _ => Self::default(),
        };

        if let Ok(dir) = std::env::var("REALMCFG_BACKUP_DIR") {
            options.backup_dir = PathBuf::from(dir);
        }

        if let Ok(max) = std::env::var("REALMCFG_MAX_BACKUPS") {
            match usize::from_str(&max) {
                Ok(parsed) => options.max_backups = parsed,
                Err(_) => warn!("Ignoring invalid REALMCFG_MAX_BACKUPS value: {}", max),
            }
        }

        options
    }

    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_path(&self.config_path)
    }
}

/// Sidecar written next to every backup
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub created_at: DateTime<Utc>,
    pub original_file: String,
    pub backup_reason: String,
    pub writer_version: u32,
}

/// Configuration document stored in a single file
pub struct FileConfigStore {
    options: StoreOptions,
}

impl FileConfigStore {
    pub fn new(options: StoreOptions) -> Self {
        Self { options }
    }

    pub fn at(config_path: impl Into<PathBuf>) -> Self {
        Self::new(StoreOptions::for_path(config_path))
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn path(&self) -> &Path {
        &self.options.config_path
    }

    fn write_file_atomic(&self, file_path: &Path, content: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if self.options.atomic_writes {
            let temp_path = file_path.with_extension("tmp");

            fs::write(&temp_path, content)?;
            self.restrict_permissions(&temp_path)?;
            fs::rename(temp_path, file_path)?;
        } else {
            fs::write(file_path, content)?;
            self.restrict_permissions(file_path)?;
        }

        Ok(())
    }

    #[cfg(unix)]
    fn restrict_permissions(&self, path: &Path) -> Result<(), PersistenceError> {
        use std::os::unix::fs::PermissionsExt;
        let permissions = fs::Permissions::from_mode(self.options.file_permissions);
        fs::set_permissions(path, permissions)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict_permissions(&self, _path: &Path) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn ensure_backup_dir(&self) -> Result<(), PersistenceError> {
        let dir = &self.options.backup_dir;
        if !dir.exists() {
            fs::create_dir_all(dir)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }

    fn cleanup_old_backups(&self) -> Result<(), PersistenceError> {
        let mut backup_files = Vec::new();

        for entry in fs::read_dir(&self.options.backup_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) == Some("backup") {
                if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
                    backup_files.push((path, modified));
                }
            }
        }

        // Newest first; names carry the timestamp so they break ties
        backup_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        for (old_backup, _) in backup_files.iter().skip(self.options.max_backups) {
            debug!("Removing old backup {}", old_backup.display());
            fs::remove_file(old_backup)?;

            let metadata_path = old_backup.with_extension("metadata");
            if metadata_path.exists() {
                fs::remove_file(metadata_path)?;
            }
        }

        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn exists(&self) -> bool {
        self.path().is_file()
    }

    fn load_document(&self) -> Result<Value, PersistenceError> {
        let path = self.path();
        if !path.exists() {
            return Err(PersistenceError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Ok(self.options.format().parse(&content)?)
    }

    fn save(&mut self, config: &Config) -> Result<(), PersistenceError> {
        let content = self.options.format().render(config)?;
        self.write_file_atomic(&self.options.config_path, &content)?;
        debug!("Wrote configuration to {}", self.path().display());
        Ok(())
    }

    fn backup(&mut self, reason: &str) -> Result<Option<PathBuf>, PersistenceError> {
        let file_path = self.path();
        if !file_path.exists() {
            return Ok(None);
        }

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PersistenceError::BackupError {
                message: format!("Invalid file name: {}", file_path.display()),
            })?;

        self.ensure_backup_dir()?;

        let created_at = Utc::now();
        let backup_filename = format!(
            "{}.{}.backup",
            filename,
            created_at.format("%Y%m%dT%H%M%S%.6fZ")
        );
        let backup_path = self.options.backup_dir.join(&backup_filename);

        fs::copy(file_path, &backup_path)?;

        let metadata = BackupMetadata {
            created_at,
            original_file: filename.to_string(),
            backup_reason: reason.to_string(),
            writer_version: CURRENT_VERSION,
        };
        let metadata_content = toml::to_string_pretty(&metadata)?;
        fs::write(backup_path.with_extension("metadata"), metadata_content)?;

        self.cleanup_old_backups()?;

        Ok(Some(backup_path))
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// Configuration document held in memory.
///
/// Counts writes and can be told to fail, which makes it the store of choice
/// for tests and for embedders that source configuration elsewhere.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    document: Option<Value>,
    writes: usize,
    backups: Vec<Value>,
    fail_saves: bool,
    fail_loads: bool,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Value) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    /// Number of successful saves
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Documents copied aside by [`ConfigStore::backup`], oldest first
    pub fn backups(&self) -> &[Value] {
        &self.backups
    }

    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn fail_loads(&mut self, fail: bool) {
        self.fail_loads = fail;
    }
}

impl ConfigStore for MemoryConfigStore {
    fn exists(&self) -> bool {
        self.document.is_some()
    }

    fn load_document(&self) -> Result<Value, PersistenceError> {
        if self.fail_loads {
            return Err(PersistenceError::Unavailable {
                message: "loads disabled".to_string(),
            });
        }

        self.document
            .clone()
            .ok_or_else(|| PersistenceError::NotFound {
                path: PathBuf::from(self.describe()),
            })
    }

    fn save(&mut self, config: &Config) -> Result<(), PersistenceError> {
        if self.fail_saves {
            return Err(PersistenceError::Unavailable {
                message: "saves disabled".to_string(),
            });
        }

        self.document = Some(serde_json::to_value(config).map_err(DocumentError::from)?);
        self.writes += 1;
        Ok(())
    }

    fn backup(&mut self, reason: &str) -> Result<Option<PathBuf>, PersistenceError> {
        let Some(document) = self.document.clone() else {
            return Ok(None);
        };

        self.backups.push(document);
        Ok(Some(PathBuf::from(format!(
            "<memory>/{}.{}.backup",
            reason,
            self.backups.len()
        ))))
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir, file_name: &str) -> FileConfigStore {
        FileConfigStore::at(temp_dir.path().join(file_name))
    }

    #[test]
    fn test_save_then_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, "config.json");
        assert!(!store.exists());

        let mut config = Config::default();
        config.server.http.bind_port = 8443;
        store.save(&config).unwrap();

        assert!(store.exists());
        let document = store.load_document().unwrap();
        assert_eq!(document["server"]["http"]["bindPort"], 8443);
        assert_eq!(document["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_save_then_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, "config.toml");

        store.save(&Config::default()).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("[server.game]"));

        let loaded: Config = serde_json::from_value(store.load_document().unwrap()).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, "config.json");

        store.save(&Config::default()).unwrap();

        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, "config.json");
        store.save(&Config::default()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "config.json");

        let err = store.load_document().unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));
    }

    #[test]
    fn test_backup_and_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let backup_dir = temp_dir.path().join("backups");

        let mut store = FileConfigStore::new(StoreOptions {
            backup_dir: backup_dir.clone(),
            max_backups: 2,
            ..StoreOptions::for_path(&config_path)
        });

        assert!(store.backup("nothing yet").unwrap().is_none());

        for i in 0..5 {
            std::thread::sleep(std::time::Duration::from_millis(20));
            fs::write(&config_path, format!("{{\"round\": {}}}", i)).unwrap();
            store.backup("test").unwrap();
        }

        let backups: Vec<_> = fs::read_dir(&backup_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("backup"))
            .collect();
        assert_eq!(backups.len(), 2);

        let newest = backups.iter().max().unwrap();
        assert_eq!(fs::read_to_string(newest).unwrap(), "{\"round\": 4}");

        let metadata = fs::read_to_string(newest.with_extension("metadata")).unwrap();
        assert!(metadata.contains("backup_reason = \"test\""));
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let mut store = MemoryConfigStore::with_document(json!({"version": 1}));
        assert!(store.exists());
        assert_eq!(store.writes(), 0);

        store.save(&Config::default()).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.document().unwrap()["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_memory_store_keeps_backups() {
        let mut store = MemoryConfigStore::new();
        assert!(store.backup("empty").unwrap().is_none());

        let mut store = MemoryConfigStore::with_document(json!({"server": {}}));
        assert!(store.backup("legacy").unwrap().is_some());
        assert_eq!(store.backups(), &[json!({"server": {}})]);
    }

    #[test]
    fn test_memory_store_failures() {
        let mut store = MemoryConfigStore::with_document(json!({"version": 1}));
        store.fail_saves(true);
        store.fail_loads(true);

        assert!(store.save(&Config::default()).is_err());
        assert!(store.load_document().is_err());
        assert_eq!(store.writes(), 0);
    }
}
