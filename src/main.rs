//! realmcfg - operator tool for Realm server configuration files

use clap::Parser;
use realmcfg::{
    cli::{run_cli, RealmCfgCli},
    logging::{init_logging, LogConfig},
    RealmConfigError, Result,
};

fn main() -> Result<()> {
    let cli = RealmCfgCli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose().with_env_overrides()
    } else {
        LogConfig::from_env()
    };
    init_logging(&log_config).map_err(|e| RealmConfigError::Logging(e.to_string()))?;

    run_cli(cli)
}
