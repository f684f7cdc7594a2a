//! Schema migration
//!
//! A document written by an older release is carried onto the snapshot of
//! its own version, then upgraded one version at a time through the `From`
//! impls in [`crate::schema`]. Versions without a snapshot fall back to a
//! path-matching carry straight onto the current schema.

use crate::config::carry::{carry_forward, Carried, CarryError, FieldFailure};
use crate::config::persistence::{ConfigStore, PersistenceError};
use crate::config::document::document_version;
use crate::schema::{v1, v2, Config, Versioned, CURRENT_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::trace_performance;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Carry error: {0}")]
    Carry(#[from] CarryError),
    #[error("Failed to persist migrated configuration: {0}")]
    Save(#[source] PersistenceError),
    #[error("Failed to reload migrated configuration: {0}")]
    Reload(#[source] PersistenceError),
    #[error("Reloaded configuration does not carry the current version (found {found})")]
    StaleReload { found: u32 },
}

/// How the old document reached the current schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradePath {
    /// Already current, nothing to do
    None,
    /// Through the listed `(from, to)` transitions
    Explicit(Vec<(u32, u32)>),
    /// No snapshot for the old version; fields matched by path
    ByName,
    /// Written by a newer release; read as-is and left on disk untouched
    Newer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    UpToDate,
    Migrated,
    /// Migration ran but save or reload failed; the pre-migration config is kept
    NotPersisted,
    NewerThanCurrent,
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub path: UpgradePath,
    pub status: MigrationStatus,
    pub copied: Vec<String>,
    pub failed: Vec<FieldFailure>,
    pub discarded: Vec<String>,
    /// Set when status is `NotPersisted`
    pub error: Option<String>,
}

impl MigrationReport {
    fn up_to_date(version: u32) -> Self {
        Self {
            from_version: version,
            to_version: version,
            path: UpgradePath::None,
            status: MigrationStatus::UpToDate,
            copied: Vec::new(),
            failed: Vec::new(),
            discarded: Vec::new(),
            error: None,
        }
    }

    fn from_carry<T>(from_version: u32, path: UpgradePath, carried: &Carried<T>) -> Self {
        Self {
            from_version,
            to_version: CURRENT_VERSION,
            path,
            status: MigrationStatus::Migrated,
            copied: carried.copied.clone(),
            failed: carried.failed.clone(),
            discarded: carried.discarded.clone(),
            error: None,
        }
    }

    pub fn persisted(&self) -> bool {
        self.status == MigrationStatus::Migrated
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            MigrationStatus::UpToDate => write!(f, "configuration is at version {}", self.to_version)?,
            MigrationStatus::NewerThanCurrent => write!(
                f,
                "configuration version {} is newer than supported version {}; left untouched",
                self.from_version, CURRENT_VERSION
            )?,
            MigrationStatus::Migrated | MigrationStatus::NotPersisted => {
                write!(f, "migrated version {} -> {}", self.from_version, self.to_version)?;
                match &self.path {
                    UpgradePath::Explicit(steps) => {
                        let steps: Vec<String> = steps.iter().map(|(a, b)| format!("{}->{}", a, b)).collect();
                        write!(f, " via {}", steps.join(", "))?;
                    }
                    UpgradePath::ByName => write!(f, " by field name")?,
                    UpgradePath::None | UpgradePath::Newer => {}
                }
                write!(
                    f,
                    " ({} copied, {} failed, {} discarded)",
                    self.copied.len(),
                    self.failed.len(),
                    self.discarded.len()
                )?;
                if let Some(error) = &self.error {
                    write!(f, "; not persisted: {}", error)?;
                }
            }
        }
        Ok(())
    }
}

/// Result of a migration pass: the configuration to run with plus the report
#[derive(Debug, Clone)]
pub struct Migration {
    pub config: Config,
    pub report: MigrationReport,
}

/// Build the current-schema instance for an older document.
///
/// Pure: no store access. `existing` is the typed config already loaded from
/// `document`; only its version is consulted. Returns `None` when no
/// migration applies (current or newer version).
pub fn upgrade(existing: &Config, document: &Value) -> Result<Option<(Config, MigrationReport)>, CarryError> {
    let from = source_version(existing, document);
    if from >= CURRENT_VERSION {
        return Ok(None);
    }

    let (mut migrated, report) = match from {
        v1::VERSION => {
            let carried = carry_snapshot::<v1::Config>(document)?;
            let report = MigrationReport::from_carry(
                from,
                UpgradePath::Explicit(vec![(1, 2), (2, 3)]),
                &carried,
            );
            let upgraded: Config = v2::Config::from(carried.value).into();
            (upgraded, report)
        }
        v2::VERSION => {
            let carried = carry_snapshot::<v2::Config>(document)?;
            let report = MigrationReport::from_carry(from, UpgradePath::Explicit(vec![(2, 3)]), &carried);
            (Config::from(carried.value), report)
        }
        _ => {
            let carried = carry_forward::<Config>(document)?;
            let report = MigrationReport::from_carry(from, UpgradePath::ByName, &carried);
            (carried.value, report)
        }
    };

    // Stamp last: the carry copied the stale tag across with everything else.
    migrated.set_version(Config::VERSION);

    Ok(Some((migrated, report)))
}

/// Run the full migration pass against `store`.
///
/// Never fails: a save or reload error is logged and the pre-migration
/// configuration is returned with status `NotPersisted`.
pub fn migrate<S>(existing: Config, document: &Value, store: &mut S) -> Migration
where
    S: ConfigStore + ?Sized,
{
    let from = source_version(&existing, document);

    if from == CURRENT_VERSION {
        debug!("Configuration is at current version {}", CURRENT_VERSION);
        return Migration {
            config: existing,
            report: MigrationReport::up_to_date(from),
        };
    }

    if from > CURRENT_VERSION {
        warn!(
            "Configuration {} has version {}, newer than supported version {}; not migrating",
            store.describe(),
            from,
            CURRENT_VERSION
        );
        let mut report = MigrationReport::up_to_date(from);
        report.path = UpgradePath::Newer;
        report.status = MigrationStatus::NewerThanCurrent;
        return Migration {
            config: existing,
            report,
        };
    }

    info!(
        "Migrating configuration {} from version {} to {}",
        store.describe(),
        from,
        CURRENT_VERSION
    );

    let upgraded = trace_performance!("config_migration", { upgrade(&existing, document) });

    let (migrated, mut report) = match upgraded {
        Ok(Some(result)) => result,
        Ok(None) => {
            return Migration {
                config: existing,
                report: MigrationReport::up_to_date(from),
            }
        }
        Err(e) => {
            warn!("Failed to migrate configuration, continuing with the loaded one: {}", e);
            let mut report = MigrationReport::up_to_date(from);
            report.status = MigrationStatus::NotPersisted;
            report.to_version = from;
            report.error = Some(e.to_string());
            return Migration {
                config: existing,
                report,
            };
        }
    };

    for failure in &report.failed {
        debug!(field = %failure.path, "Field kept its default during migration");
    }

    match persist_and_reload(&migrated, store) {
        Ok(reloaded) => {
            info!("Configuration migrated: {}", report);
            Migration {
                config: reloaded,
                report,
            }
        }
        Err(e) => {
            warn!("Failed to persist the migrated configuration: {}", e);
            report.status = MigrationStatus::NotPersisted;
            report.error = Some(e.to_string());
            Migration {
                config: existing,
                report,
            }
        }
    }
}

/// Version the document was written with.
///
/// The raw tag wins over the typed one: a malformed tag fails the typed carry
/// and would otherwise read as the current version.
fn source_version(existing: &Config, document: &Value) -> u32 {
    document_version(document).unwrap_or_else(|| existing.version())
}

/// Carry `document` onto the snapshot `T`, tagged with that snapshot's version
fn carry_snapshot<T>(document: &Value) -> Result<Carried<T>, CarryError>
where
    T: Versioned + Serialize + DeserializeOwned + Default,
{
    debug!("Reading configuration with the version {} schema", T::VERSION);
    let mut carried = carry_forward::<T>(document)?;
    carried.value.set_version(T::VERSION);
    Ok(carried)
}

fn persist_and_reload<S>(migrated: &Config, store: &mut S) -> Result<Config, MigrationError>
where
    S: ConfigStore + ?Sized,
{
    store.save(migrated).map_err(MigrationError::Save)?;

    let document = store.load_document().map_err(MigrationError::Reload)?;
    let reloaded = carry_forward::<Config>(&document)?.value;

    if reloaded.version() != CURRENT_VERSION {
        return Err(MigrationError::StaleReload {
            found: reloaded.version(),
        });
    }

    Ok(reloaded)
}
