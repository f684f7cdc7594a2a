//! Schema version 2
//!
//! Frozen. Adds `account.maxPlayer` and `gameOptions.resinOptions`, renames
//! `dispatch.regionName` to `dispatch.defaultName`.
//!
//! The `From` impls below and in the parent module spell out every field on
//! purpose: a field added to either side without a matching assignment is a
//! compile error, not a silently dropped value.

use super::gameplay::{ConsoleAccount, GameOptions, JoinOptions, ResinOptions};
use super::groups::{Account, Database, Language};
use super::server::{DebugMode, Dispatch, Http, RunMode};
use super::{v1, Versioned};
use serde::{Deserialize, Serialize};

pub const VERSION: u32 = 2;

pub use v1::Structure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub folder_structure: Structure,
    pub database_info: Database,
    pub language: Language,
    pub account: Account,
    pub server: Server,
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
            version: VERSION,
        }
    }
}

impl Versioned for Config {
    const VERSION: u32 = VERSION;

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Server {
    pub debug_level: DebugMode,
    pub run_mode: RunMode,
    pub http: Http,
    pub game: Game,
    pub dispatch: Dispatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Game {
    pub bind_address: String,
    pub access_address: String,
    pub bind_port: i32,
    pub access_port: i32,
    pub enable_console: bool,
    pub game_options: GameOptions,
    pub join_options: JoinOptions,
    pub server_account: ConsoleAccount,
}

impl Default for Game {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            access_address: "127.0.0.1".to_string(),
            bind_port: 22102,
            access_port: 0,
            enable_console: true,
            game_options: GameOptions::default(),
            join_options: JoinOptions::default(),
            server_account: ConsoleAccount::default(),
        }
    }
}

impl From<v1::Config> for Config {
    fn from(old: v1::Config) -> Self {
        let account_defaults = Account::default();

        Self {
            folder_structure: old.folder_structure,
            database_info: old.database_info,
            language: old.language,
            account: Account {
                auto_create: old.account.auto_create,
                default_permissions: old.account.default_permissions,
                max_player: account_defaults.max_player,
            },
            server: Server {
                debug_level: old.server.debug_level,
                run_mode: old.server.run_mode,
                http: old.server.http,
                game: old.server.game.into(),
                dispatch: Dispatch {
                    regions: old.server.dispatch.regions,
                    default_name: old.server.dispatch.region_name,
                },
            },
            version: VERSION,
        }
    }
}

impl From<v1::Game> for Game {
    fn from(old: v1::Game) -> Self {
        let options = old.game_options;

        Self {
            bind_address: old.bind_address,
            access_address: old.access_address,
            bind_port: old.bind_port,
            access_port: old.access_port,
            enable_console: old.enable_console,
            game_options: GameOptions {
                inventory_limits: options.inventory_limits,
                avatar_limits: options.avatar_limits,
                scene_entity_limit: options.scene_entity_limit,
                watch_gacha_config: options.watch_gacha_config,
                enable_shop_items: options.enable_shop_items,
                stamina_usage: options.stamina_usage,
                energy_usage: options.energy_usage,
                resin_options: ResinOptions::default(),
                rates: options.rates,
            },
            join_options: old.join_options,
            server_account: old.server_account,
        }
    }
}
