//! Game-balance, join and console account options

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameOptions {
    pub inventory_limits: InventoryLimits,
    pub avatar_limits: AvatarLimits,
    /// Not enforced by the scene manager yet
    pub scene_entity_limit: i32,
    pub watch_gacha_config: bool,
    pub enable_shop_items: bool,
    pub stamina_usage: bool,
    pub energy_usage: bool,
    pub resin_options: ResinOptions,
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
            resin_options: ResinOptions::default(),
            rates: Rates::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryLimits {
    pub weapons: i32,
    pub relics: i32,
    pub materials: i32,
    pub furniture: i32,
    pub all: i32,
}

impl Default for InventoryLimits {
    fn default() -> Self {
        Self {
            weapons: 2000,
            relics: 2000,
            materials: 2000,
            furniture: 2000,
            all: 30000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvatarLimits {
    pub single_player_team: i32,
    pub multiplayer_team: i32,
}

impl Default for AvatarLimits {
    fn default() -> Self {
        Self {
            single_player_team: 4,
            multiplayer_team: 4,
        }
    }
}

/// Reward multipliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rates {
    pub adventure_exp: f32,
    pub mora: f32,
    pub ley_lines: f32,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            adventure_exp: 1.0,
            mora: 1.0,
            ley_lines: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResinOptions {
    pub resin_usage: bool,
    pub cap: i32,
    /// Seconds per resin point
    pub recharge_time: i32,
}

impl Default for ResinOptions {
    fn default() -> Self {
        Self {
            resin_usage: true,
            cap: 160,
            recharge_time: 480,
        }
    }
}

/// What a player receives on first login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinOptions {
    pub welcome_emotes: Vec<i32>,
    pub welcome_message: String,
    pub welcome_mail: WelcomeMail,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            welcome_emotes: vec![2007, 1002, 4010],
            welcome_message: "Welcome to your own server.".to_string(),
            welcome_mail: WelcomeMail::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WelcomeMail {
    pub title: String,
    pub content: String,
    pub sender: String,
    pub items: Vec<MailItem>,
}

impl Default for WelcomeMail {
    fn default() -> Self {
        Self {
            title: "Welcome to your world!".to_string(),
            content: concat!(
                "Hello, and welcome to your world.\n",
                "If you run into any problem, let the server operator know so they can help you.\n",
                "\n",
                "Have fun!\n"
            )
            .to_string(),
            sender: "Realm".to_string(),
            items: vec![
                MailItem::new(201, 99999, 1),
                MailItem::new(202, 9999999, 1),
                MailItem::new(203, 99999, 1),
                MailItem::new(204, 99999, 1),
                MailItem::new(223, 666, 1),
                MailItem::new(224, 666, 1),
                MailItem::new(102, 1880200, 1),
                MailItem::new(105002, 9999, 1),
                MailItem::new(107, 99, 1),
                MailItem::new(105003, 999, 1),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailItem {
    pub item_id: i32,
    pub item_count: i32,
    pub item_level: i32,
}

impl MailItem {
    pub fn new(item_id: i32, item_count: i32, item_level: i32) -> Self {
        Self {
            item_id,
            item_count,
            item_level,
        }
    }
}

impl Default for MailItem {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

/// Identity of the in-game console operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleAccount {
    pub avatar_id: i32,
    pub name_card_id: i32,
    pub adventure_rank: i32,
    pub world_level: i32,
    pub nick_name: String,
    pub signature: String,
}

impl Default for ConsoleAccount {
    fn default() -> Self {
        Self {
            avatar_id: 10000007,
            name_card_id: 210001,
            adventure_rank: 1,
            world_level: 0,
            nick_name: "<color=#e65614>Server</color>".to_string(),
            signature: "Welcome to your world!".to_string(),
        }
    }
}
