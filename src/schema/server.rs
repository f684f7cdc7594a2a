//! Server settings: endpoints, dispatch registry, run mode

use super::gameplay::{ConsoleAccount, GameOptions, JoinOptions};
use serde::{Deserialize, Serialize};

/// How much missing-data diagnostics the server prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebugMode {
    All,
    Missing,
    #[default]
    #[serde(rename = "NONE")]
    Off,
}

/// Which halves of the server this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    #[default]
    Hybrid,
    DispatchOnly,
    GameOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Server {
    pub debug_level: DebugMode,
    pub run_mode: RunMode,
    pub http: Http,
    pub game: Game,
    pub dispatch: Dispatch,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            debug_level: DebugMode::Off,
            run_mode: RunMode::Hybrid,
            http: Http::default(),
            game: Game::default(),
            dispatch: Dispatch::default(),
        }
    }
}

/// HTTP (dispatch and web) endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Http {
    pub bind_address: String,
    /// Address written into URLs handed to clients
    pub access_address: String,
    pub bind_port: i32,
    /// Port written into URLs, 0 to reuse `bind_port`
    pub access_port: i32,
    pub encryption: Encryption,
    pub policies: Policies,
    pub files: Files,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            access_address: "127.0.0.1".to_string(),
            bind_port: 443,
            access_port: 0,
            encryption: Encryption::default(),
            policies: Policies::default(),
            files: Files::default(),
        }
    }
}

impl Http {
    pub fn public_port(&self) -> i32 {
        public_port(self.bind_port, self.access_port)
    }

    /// Base URL clients are redirected to
    pub fn public_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.encryption.url_scheme(),
            self.access_address,
            self.public_port()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Encryption {
    pub use_encryption: bool,
    /// Whether generated URLs use `https`
    pub use_in_routing: bool,
    pub keystore: String,
    pub keystore_password: String,
}

impl Default for Encryption {
    fn default() -> Self {
        Self {
            use_encryption: true,
            use_in_routing: true,
            keystore: "./keystore.p12".to_string(),
            keystore_password: "123456".to_string(),
        }
    }
}

impl Encryption {
    pub fn url_scheme(&self) -> &'static str {
        if self.use_encryption && self.use_in_routing {
            "https"
        } else {
            "http"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policies {
    pub cors: Cors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cors {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Static pages served by the HTTP endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Files {
    pub index_file: String,
    pub error_file: String,
}

impl Default for Files {
    fn default() -> Self {
        Self {
            index_file: "./index.html".to_string(),
            error_file: "./404.html".to_string(),
        }
    }
}

/// Game (KCP) endpoint and in-world options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Game {
    pub bind_address: String,
    /// Address advertised in the default region
    pub access_address: String,
    pub bind_port: i32,
    /// Port advertised in the default region, 0 to reuse `bind_port`
    pub access_port: i32,
    /// Radius within which scene entities are loaded for a player
    pub load_entities_for_player_range: i32,
    pub enable_script_in_big_world: bool,
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
            load_entities_for_player_range: 100,
            enable_script_in_big_world: false,
            enable_console: true,
            game_options: GameOptions::default(),
            join_options: JoinOptions::default(),
            server_account: ConsoleAccount::default(),
        }
    }
}

impl Game {
    pub fn public_port(&self) -> i32 {
        public_port(self.bind_port, self.access_port)
    }
}

/// Region registry served by dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dispatch {
    /// Duplicates are not rejected
    pub regions: Vec<Region>,
    pub default_name: String,
}

impl Default for Dispatch {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            default_name: "Realm".to_string(),
        }
    }
}

/// A dispatch-able game server instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Ip")]
    pub address: String,
    #[serde(rename = "Port")]
    pub port: i32,
}

impl Region {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        address: impl Into<String>,
        port: i32,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            address: address.into(),
            port,
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new("os_usa", "Realm", "127.0.0.1", 22102)
    }
}

fn public_port(bind_port: i32, access_port: i32) -> i32 {
    if access_port == 0 {
        bind_port
    } else {
        access_port
    }
}
