//! Configuration schema for the Realm server
//!
//! [`Config`] is the single source of truth for what a fresh installation
//! looks like: `Config::default()` populates every option. Documents missing
//! keys deserialize to the defaults of those keys.
//!
//! Adding, removing or renaming an option is a schema change. Every schema
//! change bumps [`CURRENT_VERSION`], freezes the previous shape as a snapshot
//! module (see [`v1`], [`v2`]) and adds one `From` impl upgrading the previous
//! snapshot to the new shape.

pub mod gameplay;
pub mod groups;
pub mod locale;
pub mod server;
pub mod v1;
pub mod v2;

pub use gameplay::{
    AvatarLimits, ConsoleAccount, GameOptions, InventoryLimits, JoinOptions, MailItem, Rates,
    ResinOptions, WelcomeMail,
};
pub use groups::{Account, DataStore, Database, Language, Structure};
pub use locale::{Locale, LocaleParseError};
pub use server::{
    Cors, DebugMode, Dispatch, Encryption, Files, Game, Http, Policies, Region, RunMode, Server,
};

use serde::{Deserialize, Serialize};

/// Version of the schema compiled into this build.
///
/// Never edit by hand outside of a schema change, never decrement.
pub const CURRENT_VERSION: u32 = 3;

/// Root of the configuration tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub folder_structure: Structure,
    pub database_info: Database,
    pub language: Language,
    pub account: Account,
    pub server: Server,
    /// Schema version the document was written with
    pub version: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder_structure: Structure::default(),
            database_info: Database::default(),
            language: Language::default(),
            account: Account::default(),
            server: Server::default(),
            version: CURRENT_VERSION,
        }
    }
}

impl Config {
    /// Whether this instance carries the compiled-in schema version
    pub fn is_current(&self) -> bool {
        self.version == CURRENT_VERSION
    }

    /// Region advertised when the dispatch registry lists none of its own
    pub fn default_region(&self) -> Region {
        let game = &self.server.game;
        Region::new(
            self.server.dispatch.default_name.clone(),
            self.server.dispatch.default_name.clone(),
            game.access_address.clone(),
            game.public_port(),
        )
    }

    /// Regions offered by dispatch, falling back to [`Config::default_region`]
    pub fn dispatch_regions(&self) -> Vec<Region> {
        if self.server.dispatch.regions.is_empty() {
            vec![self.default_region()]
        } else {
            self.server.dispatch.regions.clone()
        }
    }
}

/// Common surface of every schema snapshot, current or historical
pub trait Versioned {
    /// Version this shape was introduced with
    const VERSION: u32;

    fn version(&self) -> u32;

    fn set_version(&mut self, version: u32);
}

impl Versioned for Config {
    const VERSION: u32 = CURRENT_VERSION;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

impl From<v2::Config> for Config {
    fn from(old: v2::Config) -> Self {
        let game_defaults = Game::default();
        let game = old.server.game;

        Self {
            // `dumps` was never read by the server and is dropped in version 3
            folder_structure: Structure {
                resources: old.folder_structure.resources,
                data: old.folder_structure.data,
                packets: old.folder_structure.packets,
                scripts: old.folder_structure.scripts,
                plugins: old.folder_structure.plugins,
            },
            database_info: old.database_info,
            language: old.language,
            account: old.account,
            server: Server {
                debug_level: old.server.debug_level,
                run_mode: old.server.run_mode,
                http: old.server.http,
                game: Game {
                    bind_address: game.bind_address,
                    access_address: game.access_address,
                    bind_port: game.bind_port,
                    access_port: game.access_port,
                    load_entities_for_player_range: game_defaults.load_entities_for_player_range,
                    enable_script_in_big_world: game_defaults.enable_script_in_big_world,
                    enable_console: game.enable_console,
                    game_options: game.game_options,
                    join_options: game.join_options,
                    server_account: game.server_account,
                },
                dispatch: old.server.dispatch,
            },
            version: CURRENT_VERSION,
        }
    }
}
