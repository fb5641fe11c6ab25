use std::fs;
use std::sync::Arc;
use std::thread;

use adwatch_core::{
    CommandError, KnownIds, SettingsUpdate, DEFAULT_CHANNEL, DEFAULT_REFRESH_SECONDS,
    MIN_REFRESH_SECONDS,
};
use adwatch_engine::{StateStore, StoreError};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn ids(values: &[&str]) -> KnownIds {
    values.iter().map(|v| v.to_string()).collect()
}

fn init_logging() {
    engine_logging::initialize_for_tests();
}

#[test]
fn missing_file_loads_defaults() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = StateStore::load(temp.path().join("config.json"));

    let settings = store.settings();
    assert!(store.targets().is_empty());
    assert_eq!(settings.refresh_seconds, DEFAULT_REFRESH_SECONDS);
    assert!(settings.notifications_enabled);
    assert_eq!(settings.channel, DEFAULT_CHANNEL);
}

#[test]
fn save_then_load_round_trips() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");

    let store = StateStore::load(&path);
    store.add_target("https://a.example.test/s").unwrap();
    store.add_target("https://b.example.test/s").unwrap();
    store
        .record_scan("https://a.example.test/s", &ids(&["3", "1", "2"]))
        .unwrap();
    store
        .update_settings(SettingsUpdate {
            refresh_seconds: Some(30),
            notifications_enabled: Some(false),
            channel: Some("bikes".to_string()),
        })
        .unwrap();

    let reloaded = StateStore::load(&path);
    assert_eq!(reloaded.snapshot(), store.snapshot());
    assert_eq!(
        reloaded.targets(),
        vec!["https://a.example.test/s", "https://b.example.test/s"]
    );
    assert_eq!(
        reloaded.known_ids("https://a.example.test/s"),
        Some(ids(&["1", "2", "3"]))
    );
}

#[test]
fn saved_file_uses_original_keys_and_deduplicates() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(
        &path,
        r#"{"urls": ["https://a.example.test/s"], "known_ids": {"https://a.example.test/s": ["1", "1", "2"]}}"#,
    )
    .unwrap();

    let store = StateStore::load(&path);
    store.save().unwrap();

    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["urls"], serde_json::json!(["https://a.example.test/s"]));
    assert_eq!(json["refresh_seconds"], DEFAULT_REFRESH_SECONDS);
    assert_eq!(json["ntfy_enabled"], true);
    assert_eq!(json["ntfy_topic"], DEFAULT_CHANNEL);
    assert_eq!(
        json["known_ids"]["https://a.example.test/s"],
        serde_json::json!(["1", "2"])
    );
}

#[test]
fn partially_shaped_file_backfills_each_field() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "urls": ["https://a.example.test/s", "https://b.example.test/s"],
            "refresh_seconds": "soon",
            "ntfy_enabled": null,
            "ntfy_topic": "my-topic",
            "known_ids": {"https://a.example.test/s": ["1"], "https://old.example.test/s": ["9"]},
            "some_future_key": 42
        }"#,
    )
    .unwrap();

    let store = StateStore::load(&path);
    let settings = store.settings();
    assert_eq!(settings.refresh_seconds, DEFAULT_REFRESH_SECONDS);
    assert!(settings.notifications_enabled);
    assert_eq!(settings.channel, "my-topic");
    assert_eq!(store.known_ids("https://a.example.test/s"), Some(ids(&["1"])));
    assert_eq!(store.known_ids("https://b.example.test/s"), Some(KnownIds::new()));
    assert_eq!(store.known_ids("https://old.example.test/s"), None);
}

#[test]
fn interval_below_minimum_in_file_is_raised() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{"refresh_seconds": 1}"#).unwrap();

    let store = StateStore::load(&path);
    assert_eq!(store.settings().refresh_seconds, MIN_REFRESH_SECONDS);
}

#[test]
fn corrupt_file_is_set_aside_and_defaults_used() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let store = StateStore::load(&path);
    assert!(store.targets().is_empty());
    assert!(!path.exists());
    assert_eq!(
        fs::read_to_string(temp.path().join("config.json.corrupt")).unwrap(),
        "{ not json"
    );

    store.save().unwrap();
    assert!(path.exists());
}

#[test]
fn non_utf8_file_is_set_aside_before_the_first_save() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let original = b"{\"urls\":[\"https://a.example.test/s\"],\"ntfy_topic\":\"x\xff\"}".to_vec();
    fs::write(&path, &original).unwrap();

    let store = StateStore::load(&path);
    assert!(store.targets().is_empty());
    store.save().unwrap();

    assert_eq!(
        fs::read(temp.path().join("config.json.corrupt")).unwrap(),
        original
    );
}

#[test]
fn bad_list_elements_are_dropped_one_by_one() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "urls": ["https://a.example.test/s", 5, "https://b.example.test/s", null],
            "known_ids": {
                "https://a.example.test/s": ["1234567", 7654321, {"id": "x"}],
                "https://b.example.test/s": ["2"]
            }
        }"#,
    )
    .unwrap();

    let store = StateStore::load(&path);
    assert_eq!(
        store.targets(),
        vec!["https://a.example.test/s", "https://b.example.test/s"]
    );
    assert_eq!(
        store.known_ids("https://a.example.test/s"),
        Some(ids(&["1234567", "7654321"]))
    );
    assert_eq!(store.known_ids("https://b.example.test/s"), Some(ids(&["2"])));

    store.save().unwrap();
    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        json["urls"],
        serde_json::json!(["https://a.example.test/s", "https://b.example.test/s"])
    );
    assert_eq!(json["known_ids"]["https://b.example.test/s"], serde_json::json!(["2"]));
}

#[test]
fn rejected_commands_do_not_touch_the_file() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = StateStore::load(&path);
    store.add_target("https://a.example.test/s").unwrap();
    let before = fs::read_to_string(&path).unwrap();

    assert!(matches!(
        store.add_target("https://a.example.test/s"),
        Err(StoreError::Command(CommandError::AlreadyTracked(_)))
    ));
    assert!(matches!(
        store.remove_target(5),
        Err(StoreError::Command(CommandError::InvalidIndex { index: 5, len: 1 }))
    ));
    assert!(matches!(
        store.update_settings(SettingsUpdate::refresh_seconds(MIN_REFRESH_SECONDS - 1)),
        Err(StoreError::Command(CommandError::InvalidValue(_)))
    ));

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn toggle_reports_new_value_and_persists() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = StateStore::load(&path);

    assert!(!store.toggle_notifications().unwrap());
    assert!(!StateStore::load(&path).settings().notifications_enabled);
    assert!(store.toggle_notifications().unwrap());
}

#[test]
fn record_scan_merges_and_skips_removed_targets() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = StateStore::load(&path);
    store.add_target("https://a.example.test/s").unwrap();

    assert!(store.record_scan("https://a.example.test/s", &ids(&["1"])).unwrap());
    assert!(store.record_scan("https://a.example.test/s", &ids(&["2"])).unwrap());
    assert!(!store.record_scan("https://a.example.test/s", &ids(&["1", "2"])).unwrap());
    assert_eq!(
        store.known_ids("https://a.example.test/s"),
        Some(ids(&["1", "2"]))
    );

    store.remove_target(0).unwrap();
    assert!(!store.record_scan("https://a.example.test/s", &ids(&["3"])).unwrap());
    assert!(StateStore::load(&path).known_ids("https://a.example.test/s").is_none());
}

#[test]
fn concurrent_mutations_all_land() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = Arc::new(StateStore::load(&path));
    store.add_target("https://a.example.test/s").unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                for n in 0..10 {
                    let id = format!("{worker}-{n}");
                    store
                        .record_scan("https://a.example.test/s", &ids(&[id.as_str()]))
                        .unwrap();
                }
                store
                    .add_target(&format!("https://w{worker}.example.test/s"))
                    .unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let reloaded = StateStore::load(&path);
    assert_eq!(
        reloaded.known_ids("https://a.example.test/s").map(|s| s.len()),
        Some(40)
    );
    assert_eq!(reloaded.targets().len(), 5);
}
