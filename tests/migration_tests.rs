//! Integration tests for the startup load sequence
//!
//! Exercises legacy detection, versioned migration and the file-backed store
//! together, the way a server runs them at startup.

use realmcfg::config::{
    carry_forward, load_config, ConfigLoader, ConfigStore, FileConfigStore, LegacyPolicy, LegacyStatus,
    LoadState, LoaderOptions, MemoryConfigStore, MigrationStatus, StoreOptions, UpgradePath,
};
use realmcfg::schema::{v1, v2, Config, CURRENT_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn file_store(dir: &TempDir, name: &str) -> FileConfigStore {
    FileConfigStore::new(StoreOptions::for_path(dir.path().join(name)))
}

fn version_one_document() -> serde_json::Value {
    json!({
        "version": 1,
        "folderStructure": {"resources": "/srv/realm/res/", "dumps": "/srv/realm/dumps/"},
        "account": {"autoCreate": false, "defaultPermissions": ["player.*"]},
        "server": {
            "runMode": "DISPATCH_ONLY",
            "http": {"bindPort": 8443},
            "game": {"bindPort": 23000, "gameOptions": {"sceneEntityLimit": 500}},
            "dispatch": {"regionName": "Europe"}
        }
    })
}

mod legacy {
    use super::*;

    #[test]
    fn test_legacy_file_is_rewritten_with_defaults() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir, "config.json");
        let legacy = json!({
            "account": {"autoCreate": false},
            "server": {"http": {"bindPort": 8080}, "game": {"bindPort": 30000}}
        });
        fs::write(store.path(), legacy.to_string()).unwrap();

        let outcome = load_config(&mut store);

        assert_eq!(outcome.legacy, LegacyStatus::Rewritten);
        assert_eq!(*outcome.handle, Config::default());

        // Every legacy value is gone from the rewritten file
        let written = store.load_document().unwrap();
        assert_eq!(written["version"], CURRENT_VERSION);
        assert_eq!(written["account"]["autoCreate"], true);
        assert_eq!(written["server"]["http"]["bindPort"], 443);
        assert_eq!(written["server"]["game"]["bindPort"], 22102);

        // ...but survive in the backup taken first
        let backup = outcome.legacy_backup.unwrap();
        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(backup).unwrap()).unwrap();
        assert_eq!(saved, legacy);
    }

    #[test]
    fn test_merge_policy_keeps_legacy_values() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir, "config.json");
        fs::write(store.path(), r#"{"server": {"game": {"bindPort": 30000}}}"#).unwrap();

        let options = LoaderOptions {
            legacy_policy: LegacyPolicy::Merge,
            ..LoaderOptions::default()
        };
        let outcome = ConfigLoader::new(options).load(&mut store);

        assert_eq!(outcome.handle.server.game.bind_port, 30000);
        assert_eq!(outcome.handle.version, CURRENT_VERSION);

        let reloaded = store.load_document().unwrap();
        assert_eq!(reloaded["server"]["game"]["bindPort"], 30000);
    }

    #[test]
    fn test_failed_rewrite_still_runs_on_defaults() {
        let mut store = MemoryConfigStore::with_document(json!({"server": {}}));
        store.fail_saves(true);

        let outcome = load_config(&mut store);

        assert_eq!(outcome.legacy, LegacyStatus::RewriteFailed);
        assert_eq!(outcome.state, LoadState::Current);
        assert_eq!(*outcome.handle, Config::default());
        assert_eq!(store.document(), Some(&json!({"server": {}})));
    }
}

mod versions {
    use super::*;

    #[test]
    fn test_version_one_upgrades_through_every_step() {
        let mut store = MemoryConfigStore::with_document(version_one_document());

        let outcome = load_config(&mut store);
        let report = outcome.migration.unwrap();
        let config = &*outcome.handle;

        assert_eq!(report.status, MigrationStatus::Migrated);
        assert_eq!(report.path, UpgradePath::Explicit(vec![(1, 2), (2, 3)]));
        assert_eq!(config.version, CURRENT_VERSION);

        // Unchanged paths keep their values
        assert_eq!(config.folder_structure.resources, "/srv/realm/res/");
        assert!(!config.account.auto_create);
        assert_eq!(config.account.default_permissions, vec!["player.*"]);
        assert_eq!(config.server.http.bind_port, 8443);
        assert_eq!(config.server.game.bind_port, 23000);
        assert_eq!(config.server.game.game_options.scene_entity_limit, 500);

        // The 1 -> 2 rename carries the value across
        assert_eq!(config.server.dispatch.default_name, "Europe");

        // Fields introduced later hold their defaults
        let defaults = Config::default();
        assert_eq!(config.account.max_player, defaults.account.max_player);
        assert_eq!(
            config.server.game.game_options.resin_options,
            defaults.server.game.game_options.resin_options
        );
        assert_eq!(
            config.server.game.load_entities_for_player_range,
            defaults.server.game.load_entities_for_player_range
        );

        // Removed fields are gone from the stored document
        let written = store.document().unwrap();
        assert!(written["folderStructure"].get("dumps").is_none());
        assert!(written["server"]["dispatch"].get("regionName").is_none());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_explicit_chain_matches_snapshot_conversions() {
        let document = version_one_document();
        let snapshot = carry_forward::<v1::Config>(&document).unwrap().value;
        let mut expected = Config::from(v2::Config::from(snapshot));
        expected.version = CURRENT_VERSION;

        let mut store = MemoryConfigStore::with_document(document);
        let outcome = load_config(&mut store);

        assert_eq!(*outcome.handle, expected);
    }

    #[test]
    fn test_bad_field_keeps_default_and_migration_continues() {
        let mut store = MemoryConfigStore::with_document(json!({
            "version": 2,
            "account": {"maxPlayer": "lots", "autoCreate": false}
        }));

        let outcome = load_config(&mut store);
        let report = outcome.migration.unwrap();

        assert_eq!(report.status, MigrationStatus::Migrated);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "account.maxPlayer");
        assert_eq!(outcome.handle.account.max_player, -1);
        assert!(!outcome.handle.account.auto_create);
    }

    #[test]
    fn test_unknown_old_version_matches_by_name() {
        let mut store = MemoryConfigStore::with_document(json!({
            "version": 0,
            "server": {"game": {"bindPort": 24000}},
            "obsolete": true
        }));

        let outcome = load_config(&mut store);
        let report = outcome.migration.unwrap();

        assert_eq!(report.path, UpgradePath::ByName);
        assert_eq!(report.discarded, vec!["obsolete"]);
        assert_eq!(outcome.handle.server.game.bind_port, 24000);
        assert_eq!(outcome.handle.version, CURRENT_VERSION);
    }

    #[test]
    fn test_string_version_tag_is_migrated_by_name() {
        let mut store = MemoryConfigStore::with_document(json!({
            "version": "1",
            "folderStructure": {"dumps": "/x"},
            "server": {"dispatch": {"regionName": "Europe"}, "game": {"bindPort": 24000}}
        }));

        let outcome = load_config(&mut store);
        let report = outcome.migration.unwrap();

        assert_eq!(report.status, MigrationStatus::Migrated);
        assert_eq!(report.path, UpgradePath::ByName);
        assert_eq!(outcome.handle.version, CURRENT_VERSION);
        assert_eq!(outcome.handle.server.game.bind_port, 24000);
        assert_eq!(store.writes(), 1);

        let written = store.document().unwrap();
        assert_eq!(written["version"], CURRENT_VERSION);
        assert!(written["folderStructure"].get("dumps").is_none());
        assert!(written["server"]["dispatch"].get("regionName").is_none());
    }

    #[test]
    fn test_null_version_tag_is_migrated_by_name() {
        let mut store = MemoryConfigStore::with_document(json!({
            "version": null,
            "account": {"autoCreate": false}
        }));

        let outcome = load_config(&mut store);

        assert_eq!(outcome.legacy, LegacyStatus::NotLegacy);
        assert_eq!(outcome.migration.unwrap().path, UpgradePath::ByName);
        assert!(!outcome.handle.account.auto_create);
        assert_eq!(store.document().unwrap()["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_current_version_performs_no_writes() {
        let mut original = Config::default();
        original.server.game.bind_port = 25000;
        let mut store = MemoryConfigStore::with_document(serde_json::to_value(&original).unwrap());

        let outcome = load_config(&mut store);

        assert_eq!(store.writes(), 0);
        assert_eq!(*outcome.handle, original);
        assert_eq!(outcome.migration.unwrap().status, MigrationStatus::UpToDate);
    }

    #[test]
    fn test_newer_version_is_never_rewritten() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir, "config.json");
        let content = r#"{"version": 99, "server": {"game": {"bindPort": 26000}}, "futureOption": 1}"#;
        fs::write(store.path(), content).unwrap();

        let outcome = load_config(&mut store);

        assert_eq!(outcome.migration.unwrap().status, MigrationStatus::NewerThanCurrent);
        assert_eq!(outcome.handle.server.game.bind_port, 26000);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), content);
    }

    #[test]
    fn test_save_failure_keeps_pre_migration_config() {
        let mut store = MemoryConfigStore::with_document(json!({
            "version": 2,
            "server": {"game": {"bindPort": 27000}}
        }));
        store.fail_saves(true);

        let outcome = load_config(&mut store);
        let report = outcome.migration.unwrap();

        assert_eq!(report.status, MigrationStatus::NotPersisted);
        assert!(report.error.is_some());
        assert_eq!(outcome.handle.version, 2);
        assert_eq!(outcome.handle.server.game.bind_port, 27000);
        assert_eq!(store.document().unwrap()["version"], 2);
    }
}

mod renamed_field {
    //! Path-matching copy cannot follow a rename: the old value is lost and
    //! the new field holds its default.

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct Game {
        port: i32,
    }

    impl Default for Game {
        fn default() -> Self {
            Self { port: 22102 }
        }
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Server {
        game: Game,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Root {
        server: Server,
        version: u32,
    }

    impl Default for Root {
        fn default() -> Self {
            Self {
                server: Server::default(),
                version: 2,
            }
        }
    }

    #[test]
    fn test_rename_by_name_loses_old_value() {
        let old = json!({"version": 1, "server": {"game": {"bindPort": 12345}}});

        let carried = carry_forward::<Root>(&old).unwrap();
        let mut migrated = carried.value;
        migrated.version = 2;

        assert_eq!(migrated.version, 2);
        assert_eq!(migrated.server.game.port, 22102);
        assert_eq!(carried.discarded, vec!["server.game.bindPort"]);
    }
}

mod round_trip {
    use super::*;

    fn assert_round_trip(file: &str) {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir, file);
        let mut old = Config::default();
        old.version = 2;
        store.save(&old).unwrap();

        let outcome = load_config(&mut store);
        assert_eq!(outcome.migration.as_ref().unwrap().status, MigrationStatus::Migrated);

        let reloaded: Config = serde_json::from_value(store.load_document().unwrap()).unwrap();
        assert_eq!(reloaded, *outcome.handle);

        // A second start finds nothing to do
        let second = load_config(&mut store);
        assert_eq!(second.migration.unwrap().status, MigrationStatus::UpToDate);
        assert_eq!(*second.handle, reloaded);
    }

    #[test]
    fn test_json_round_trip() {
        assert_round_trip("config.json");
    }

    #[test]
    fn test_toml_round_trip() {
        assert_round_trip("config.toml");
    }

    #[test]
    fn test_fresh_install_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir, "nested/config.json");

        let outcome = load_config(&mut store);
        assert!(outcome.fresh_install);
        assert!(store.exists());

        let second = load_config(&mut store);
        assert_eq!(*second.handle, Config::default());
        assert_eq!(second.migration.unwrap().status, MigrationStatus::UpToDate);
    }

    #[test]
    fn test_corrupt_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir, "config.json");
        fs::write(store.path(), "{ not json").unwrap();

        let outcome = load_config(&mut store);

        assert!(outcome.load_error.is_some());
        assert_eq!(*outcome.handle, Config::default());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }
}
