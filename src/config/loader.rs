//! Startup load sequence and the configuration handle
//!
//! Runs once per process, before any listener starts:
//! fresh-install check, typed load, legacy detection, migration.

use crate::config::carry::carry_forward;
use crate::config::document::document_version;
use crate::config::legacy::{LegacyDetector, LegacyPolicy, LegacyStatus};
use crate::config::migration::{self, MigrationReport};
use crate::config::persistence::ConfigStore;
use crate::schema::{Config, Versioned, CURRENT_VERSION};
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where the load sequence is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Legacy,
    Migrating,
    Current,
}

impl LoadState {
    fn can_transition_to(self, next: LoadState) -> bool {
        matches!(
            (self, next),
            (LoadState::NotLoaded, LoadState::Legacy)
                | (LoadState::NotLoaded, LoadState::Migrating)
                | (LoadState::NotLoaded, LoadState::Current)
                | (LoadState::Legacy, LoadState::Current)
                | (LoadState::Migrating, LoadState::Current)
        )
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::NotLoaded => "NOT_LOADED",
            LoadState::Legacy => "LEGACY",
            LoadState::Migrating => "MIGRATING",
            LoadState::Current => "CURRENT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub legacy_policy: LegacyPolicy,
    pub backup_before_rewrite: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            legacy_policy: LegacyPolicy::Reset,
            backup_before_rewrite: true,
        }
    }
}

impl LoaderOptions {
    /// Load options from environment variables
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(policy) = std::env::var("REALMCFG_LEGACY_POLICY") {
            match policy.parse() {
                Ok(parsed) => options.legacy_policy = parsed,
                Err(e) => warn!("Ignoring REALMCFG_LEGACY_POLICY: {}", e),
            }
        }

        if let Ok(backup) = std::env::var("REALMCFG_BACKUP_LEGACY") {
            options.backup_before_rewrite = !backup.eq_ignore_ascii_case("false");
        }

        options
    }
}

/// Immutable, shareable configuration produced once at startup.
///
/// Clone it into every subsystem that needs configuration; there is no way
/// to mutate the configuration through it.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<Config>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner
    }
}

impl Deref for ConfigHandle {
    type Target = Config;

    fn deref(&self) -> &Config {
        &self.inner
    }
}

impl From<Config> for ConfigHandle {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

/// Everything the load sequence found out
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub handle: ConfigHandle,
    pub state: LoadState,
    /// States visited, starting with `NotLoaded`
    pub history: Vec<LoadState>,
    pub fresh_install: bool,
    pub legacy: LegacyStatus,
    pub legacy_backup: Option<PathBuf>,
    pub migration: Option<MigrationReport>,
    /// Set when the document could not be read and defaults are in use
    pub load_error: Option<String>,
}

/// Runs the startup load sequence. Consumed by [`ConfigLoader::load`], so one
/// loader performs at most one migration pass.
pub struct ConfigLoader {
    options: LoaderOptions,
    state: LoadState,
    history: Vec<LoadState>,
}

impl ConfigLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            state: LoadState::NotLoaded,
            history: vec![LoadState::NotLoaded],
        }
    }

    fn transition(&mut self, next: LoadState) {
        if !self.state.can_transition_to(next) {
            // Only reachable through a bug in this module
            error!("Invalid configuration load transition {} -> {}", self.state, next);
            return;
        }

        debug!("Configuration load state {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    pub fn load<S>(mut self, store: &mut S) -> LoadOutcome
    where
        S: ConfigStore + ?Sized,
    {
        if !store.exists() {
            return self.fresh_install(store);
        }

        let document = match store.load_document() {
            Ok(document) => document,
            Err(e) => {
                error!(
                    "Failed to read configuration {}, running with defaults: {}",
                    store.describe(),
                    e
                );
                return self.finish_with_defaults(e.to_string());
            }
        };

        let mut loaded = match carry_forward::<Config>(&document) {
            Ok(carried) => carried.value,
            Err(e) => {
                error!("Failed to decode configuration, running with defaults: {}", e);
                return self.finish_with_defaults(e.to_string());
            }
        };

        // A malformed tag fails the typed carry and keeps the current default
        if let Some(tag) = document_version(&document) {
            loaded.set_version(tag);
        }

        let detector = LegacyDetector::new(self.options.legacy_policy)
            .with_backup(self.options.backup_before_rewrite);
        let legacy = detector.detect_and_rewrite(store);

        if legacy.is_legacy() {
            self.transition(LoadState::Legacy);

            // A failed rewrite leaves the legacy file in place; run on what it
            // would have been replaced with.
            let config = legacy.config.unwrap_or_else(|| match self.options.legacy_policy {
                LegacyPolicy::Reset => Config::default(),
                LegacyPolicy::Merge => loaded,
            });

            self.transition(LoadState::Current);
            return LoadOutcome {
                handle: ConfigHandle::new(config),
                state: self.state,
                history: self.history,
                fresh_install: false,
                legacy: legacy.status,
                legacy_backup: legacy.backup,
                migration: None,
                load_error: None,
            };
        }

        if loaded.version() < CURRENT_VERSION {
            self.transition(LoadState::Migrating);
        }

        let migration = migration::migrate(loaded, &document, store);
        self.transition(LoadState::Current);

        LoadOutcome {
            handle: ConfigHandle::new(migration.config),
            state: self.state,
            history: self.history,
            fresh_install: false,
            legacy: LegacyStatus::NotLegacy,
            legacy_backup: None,
            migration: Some(migration.report),
            load_error: None,
        }
    }

    fn fresh_install<S>(mut self, store: &mut S) -> LoadOutcome
    where
        S: ConfigStore + ?Sized,
    {
        info!("No configuration at {}, writing defaults", store.describe());

        let config = Config::default();
        let load_error = match store.save(&config) {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to write default configuration: {}", e);
                Some(e.to_string())
            }
        };

        self.transition(LoadState::Current);
        LoadOutcome {
            handle: ConfigHandle::new(config),
            state: self.state,
            history: self.history,
            fresh_install: true,
            legacy: LegacyStatus::NotLegacy,
            legacy_backup: None,
            migration: None,
            load_error,
        }
    }

    fn finish_with_defaults(mut self, load_error: String) -> LoadOutcome {
        self.transition(LoadState::Current);
        LoadOutcome {
            handle: ConfigHandle::new(Config::default()),
            state: self.state,
            history: self.history,
            fresh_install: false,
            legacy: LegacyStatus::NotLegacy,
            legacy_backup: None,
            migration: None,
            load_error: Some(load_error),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

/// Load configuration with default options
pub fn load_config<S>(store: &mut S) -> LoadOutcome
where
    S: ConfigStore + ?Sized,
{
    ConfigLoader::default().load(store)
}

/// Read-only view of what [`ConfigLoader::load`] would do, without writing
#[derive(Debug, Clone)]
pub struct Inspection {
    pub exists: bool,
    pub version: Option<u32>,
    pub legacy: bool,
    pub needs_migration: bool,
    pub config: Config,
    pub failed_fields: Vec<String>,
    pub discarded_fields: Vec<String>,
    pub error: Option<String>,
}

pub fn inspect<S>(store: &S) -> Inspection
where
    S: ConfigStore + ?Sized,
{
    let mut inspection = Inspection {
        exists: store.exists(),
        version: None,
        legacy: false,
        needs_migration: false,
        config: Config::default(),
        failed_fields: Vec::new(),
        discarded_fields: Vec::new(),
        error: None,
    };

    if !inspection.exists {
        return inspection;
    }

    let document = match store.load_document() {
        Ok(document) => document,
        Err(e) => {
            inspection.error = Some(e.to_string());
            return inspection;
        }
    };

    inspection.version = document_version(&document);
    inspection.legacy = inspection.version.is_none();
    inspection.needs_migration = inspection.version.is_some_and(|version| version < CURRENT_VERSION);

    match carry_forward::<Config>(&document) {
        Ok(carried) => {
            inspection.failed_fields = carried.failed.into_iter().map(|f| f.path).collect();
            inspection.discarded_fields = carried.discarded;
            inspection.config = carried.value;
        }
        Err(e) => inspection.error = Some(e.to_string()),
    }

    inspection
}
