//! Command-line interface for realmcfg
//!
//! Operator commands for inspecting and migrating a server configuration
//! file without starting the server.

use crate::config::{
    inspect, ConfigLoader, DocumentFormat, FileConfigStore, Inspection, LegacyPolicy, LoadOutcome, LoadState,
    LoaderOptions, StoreOptions,
};
use crate::schema::{Config, CURRENT_VERSION};
use crate::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, error, info};

/// realmcfg command-line interface
#[derive(Parser)]
#[command(name = "realmcfg")]
#[command(about = "Inspect and migrate Realm server configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Realm Team")]
pub struct RealmCfgCli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable JSON output for machine-readable results
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Print a fresh default configuration document
    Defaults {
        /// Document format (json, toml)
        #[arg(short, long)]
        format: Option<DocumentFormat>,
    },

    /// Report the file's version and what a load would do, without writing
    Check,

    /// Run the startup load pass and print the migration report
    Migrate {
        /// What to write over a legacy file (reset, merge)
        #[arg(short, long)]
        legacy_policy: Option<LegacyPolicy>,
    },

    /// Print the effective configuration without writing
    Show,
}

/// CLI command executor
pub struct RealmCfgCliExecutor {
    store_options: StoreOptions,
    json_output: bool,
}

impl RealmCfgCliExecutor {
    pub fn new(store_options: StoreOptions, json_output: bool) -> Self {
        Self {
            store_options,
            json_output,
        }
    }

    /// Store options for `--config`, falling back to the environment
    pub fn store_options_for(config: Option<&str>) -> StoreOptions {
        let from_env = StoreOptions::from_env();
        match config {
            Some(path) => StoreOptions {
                max_backups: from_env.max_backups,
                ..StoreOptions::for_path(path)
            },
            None => from_env,
        }
    }

    /// Execute a command and return what should be printed
    pub fn execute(&self, command: Commands) -> Result<String> {
        debug!("Executing {:?}", command);

        match command {
            Commands::Defaults { format } => self.defaults(format),
            Commands::Check => self.check(),
            Commands::Migrate { legacy_policy } => self.migrate(legacy_policy),
            Commands::Show => self.show(),
        }
    }

    fn defaults(&self, format: Option<DocumentFormat>) -> Result<String> {
        let format = match (format, self.json_output) {
            (Some(format), _) => format,
            (None, true) => DocumentFormat::Json,
            (None, false) => self.store_options.format(),
        };

        Ok(format.render(&Config::default())?)
    }

    fn check(&self) -> Result<String> {
        let store = FileConfigStore::new(self.store_options.clone());
        let inspection = inspect(&store);
        let action = predicted_action(&inspection);

        if self.json_output {
            let report = json!({
                "path": store.path().display().to_string(),
                "exists": inspection.exists,
                "version": inspection.version,
                "currentVersion": CURRENT_VERSION,
                "legacy": inspection.legacy,
                "needsMigration": inspection.needs_migration,
                "action": action,
                "failedFields": inspection.failed_fields,
                "discardedFields": inspection.discarded_fields,
                "error": inspection.error,
            });
            return Ok(serde_json::to_string_pretty(&report)?);
        }

        let mut lines = vec![format!("Configuration: {}", store.path().display())];
        match inspection.version {
            Some(version) => lines.push(format!("  Version: {} (current {})", version, CURRENT_VERSION)),
            None if inspection.exists => lines.push("  Version: none (legacy file)".to_string()),
            None => lines.push("  Version: none (file missing)".to_string()),
        }
        lines.push(format!("  On load: {}", action));
        for field in &inspection.failed_fields {
            lines.push(format!("  Would keep default: {}", field));
        }
        for field in &inspection.discarded_fields {
            lines.push(format!("  Would discard: {}", field));
        }
        if let Some(error) = &inspection.error {
            lines.push(format!("  Error: {}", error));
        }

        Ok(lines.join("\n"))
    }

    fn migrate(&self, legacy_policy: Option<LegacyPolicy>) -> Result<String> {
        let mut options = LoaderOptions::from_env();
        if let Some(policy) = legacy_policy {
            options.legacy_policy = policy;
        }

        info!("Running configuration load pass with {:?}", options);

        let mut store = FileConfigStore::new(self.store_options.clone());
        let outcome = ConfigLoader::new(options).load(&mut store);

        if self.json_output {
            return Ok(serde_json::to_string_pretty(&outcome_json(&outcome))?);
        }

        let mut lines = vec![format!("Configuration: {}", store.path().display())];
        if outcome.fresh_install {
            lines.push("  Wrote default configuration".to_string());
        }
        if outcome.history.contains(&LoadState::Legacy) {
            lines.push(format!("  Legacy file: {:?}", outcome.legacy));
        }
        if let Some(backup) = &outcome.legacy_backup {
            lines.push(format!("  Backup: {}", backup.display()));
        }
        if let Some(report) = &outcome.migration {
            lines.push(format!("  {}", report));
            for failure in &report.failed {
                lines.push(format!("  Kept default for {}: {}", failure.path, failure.reason));
            }
        }
        if let Some(error) = &outcome.load_error {
            lines.push(format!("  Running on defaults: {}", error));
        }
        lines.push(format!("  Version in use: {}", outcome.handle.version));

        Ok(lines.join("\n"))
    }

    fn show(&self) -> Result<String> {
        let store = FileConfigStore::new(self.store_options.clone());
        let inspection = inspect(&store);

        if let Some(error) = &inspection.error {
            error!("Failed to read configuration, showing defaults: {}", error);
        }

        let format = if self.json_output {
            DocumentFormat::Json
        } else {
            self.store_options.format()
        };

        Ok(format.render(&inspection.config)?)
    }
}

fn predicted_action(inspection: &Inspection) -> &'static str {
    if inspection.error.is_some() {
        "run on defaults, file left untouched"
    } else if !inspection.exists {
        "write defaults (fresh install)"
    } else if inspection.legacy {
        "rewrite legacy file"
    } else if inspection.needs_migration {
        "migrate to current version"
    } else if inspection.version.is_some_and(|version| version > CURRENT_VERSION) {
        "run as-is, newer than this build"
    } else {
        "nothing, already current"
    }
}

fn outcome_json(outcome: &LoadOutcome) -> serde_json::Value {
    let migration = outcome.migration.as_ref().map(|report| {
        json!({
            "from": report.from_version,
            "to": report.to_version,
            "status": format!("{:?}", report.status),
            "summary": report.to_string(),
            "copied": report.copied,
            "failed": report.failed.iter().map(|f| &f.path).collect::<Vec<_>>(),
            "discarded": report.discarded,
            "error": report.error,
        })
    });

    json!({
        "state": outcome.state.to_string(),
        "history": outcome.history.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "freshInstall": outcome.fresh_install,
        "legacy": format!("{:?}", outcome.legacy),
        "legacyBackup": outcome.legacy_backup.as_ref().map(|p| p.display().to_string()),
        "migration": migration,
        "loadError": outcome.load_error,
        "version": outcome.handle.version,
    })
}

/// Run the CLI interface
pub fn run_cli(cli: RealmCfgCli) -> Result<()> {
    let options = RealmCfgCliExecutor::store_options_for(cli.config.as_deref());
    let executor = RealmCfgCliExecutor::new(options, cli.json);

    match executor.execute(cli.command) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            if cli.json {
                let error_json = json!({
                    "error": true,
                    "message": e.to_string()
                });
                println!("{}", serde_json::to_string_pretty(&error_json)?);
            } else {
                error!("Command failed: {}", e);
            }
            std::process::exit(1);
        }
    }
}
