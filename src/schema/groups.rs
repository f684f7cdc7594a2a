//! Top-level option groups other than `server`

use super::locale::Locale;
use serde::{Deserialize, Serialize};

/// On-disk locations the server reads assets and plugins from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Structure {
    pub resources: String,
    pub data: String,
    pub packets: String,
    pub scripts: String,
    pub plugins: String,
}

impl Default for Structure {
    fn default() -> Self {
        Self {
            resources: "./resources/".to_string(),
            data: "./data/".to_string(),
            packets: "./packets/".to_string(),
            scripts: "./resources/Scripts/".to_string(),
            plugins: "./plugins/".to_string(),
        }
    }
}

/// Connection info for the two data stores (accounts and game state)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub server: DataStore,
    pub game: DataStore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataStore {
    pub connection_uri: String,
    pub collection: String,
}

impl Default for DataStore {
    fn default() -> Self {
        Self {
            connection_uri: "mongodb://localhost:27017".to_string(),
            collection: "realm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    /// Language used for server messages
    pub language: Locale,
    /// Used when a message has no translation in `language`
    pub fallback: Locale,
    /// Language of the bundled documentation
    pub document: String,
}

impl Default for Language {
    fn default() -> Self {
        Self {
            language: Locale::system(),
            fallback: Locale::us(),
            document: "EN".to_string(),
        }
    }
}

/// Account creation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub auto_create: bool,
    pub default_permissions: Vec<String>,
    /// Player cap, negative for unlimited
    pub max_player: i32,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            auto_create: true,
            default_permissions: vec!["*".to_string()],
            max_player: -1,
        }
    }
}

impl Account {
    pub fn player_limit(&self) -> Option<u32> {
        u32::try_from(self.max_player).ok()
    }
}
