//! Schema version 1, the first release that wrote a `version` tag
//!
//! Frozen. Groups unchanged since version 1 are shared with the current schema.

use super::gameplay::{AvatarLimits, ConsoleAccount, InventoryLimits, JoinOptions, Rates};
use super::groups::{Database, Language};
use super::server::{DebugMode, Http, Region, RunMode};
use super::Versioned;
use serde::{Deserialize, Serialize};

pub const VERSION: u32 = 1;

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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Structure {
    pub resources: String,
    pub data: String,
    pub packets: String,
    pub scripts: String,
    pub plugins: String,
    pub dumps: String,
}

impl Default for Structure {
    fn default() -> Self {
        Self {
            resources: "./resources/".to_string(),
            data: "./data/".to_string(),
            packets: "./packets/".to_string(),
            scripts: "./resources/Scripts/".to_string(),
            plugins: "./plugins/".to_string(),
            dumps: "./dumps/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub auto_create: bool,
    pub default_permissions: Vec<String>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            auto_create: true,
            default_permissions: vec!["*".to_string()],
        }
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameOptions {
    pub inventory_limits: InventoryLimits,
    pub avatar_limits: AvatarLimits,
    pub scene_entity_limit: i32,
    pub watch_gacha_config: bool,
    pub enable_shop_items: bool,
    pub stamina_usage: bool,
    pub energy_usage: bool,
    pub rates: Rates,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            inventory_limits: InventoryLimits::default(),
            avatar_limits: AvatarLimits::default(),
            scene_entity_limit: 1000,
            watch_gacha_config: false,
            enable_shop_items: true,
            stamina_usage: true,
            energy_usage: true,
            rates: Rates::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dispatch {
    pub regions: Vec<Region>,
    pub region_name: String,
}

impl Default for Dispatch {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            region_name: "Realm".to_string(),
        }
    }
}
