//! Configuration storage, legacy detection and migration

pub mod carry;
pub mod document;
pub mod legacy;
pub mod loader;
pub mod migration;
pub mod persistence;

pub use carry::{carry_forward, Carried, CarryError, FieldFailure};
pub use document::{document_version, lookup, DocumentError, DocumentFormat, VERSION_KEY};
pub use legacy::{LegacyDetector, LegacyOutcome, LegacyPolicy, LegacyStatus};
pub use loader::{
    inspect, load_config, ConfigHandle, ConfigLoader, Inspection, LoadOutcome, LoadState, LoaderOptions,
};
pub use migration::{
    migrate, upgrade, Migration, MigrationError, MigrationReport, MigrationStatus, UpgradePath,
};
pub use persistence::{
    BackupMetadata, ConfigStore, FileConfigStore, MemoryConfigStore, PersistenceError, StoreOptions,
};
