// tests/ingest_config.rs
use snapshot_cacher::ingest::config::{
    load_config_default, load_config_from, FeedKind, IngestConfig, ENV_CONFIG_PATH,
    ENV_FETCH_TIMEOUT_SECS, ENV_METRICS_ADDR, ENV_PERIOD_SECS, ENV_RUN_ONCE, ENV_STORE_DIR,
};
use std::path::PathBuf;
use std::{env, fs};

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        ENV_PERIOD_SECS,
        ENV_STORE_DIR,
        ENV_METRICS_ADDR,
        ENV_RUN_ONCE,
        ENV_FETCH_TIMEOUT_SECS,
    ] {
        env::remove_var(k);
    }
}

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("snapshot.toml");
    fs::write(
        &p_toml,
        r#"
period_secs = 30
store_dir = "snapshots"

[[feeds]]
kind = "ended-auctions"

[[feeds]]
kind = "bazaar"
url = "http://localhost:8080/bazaar"
"#,
    )
    .unwrap();
    let v = load_config_from(&p_toml).unwrap();
    assert_eq!(v.period_secs, 30);
    assert_eq!(v.store_dir, PathBuf::from("snapshots"));
    assert_eq!(v.feeds.len(), 2);
    assert_eq!(v.feeds[1].kind, FeedKind::Bazaar);
    assert_eq!(v.feeds[1].endpoint(), "http://localhost:8080/bazaar");

    let p_json = dir.path().join("snapshot.json");
    fs::write(
        &p_json,
        r#"{"period_secs": 5, "feeds": [{"kind": "election", "enabled": false}]}"#,
    )
    .unwrap();
    let vj = load_config_from(&p_json).unwrap();
    assert_eq!(vj.period_secs, 5);
    assert_eq!(vj.enabled_feeds().count(), 0);
}

#[test]
fn unknown_feed_kind_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("snapshot.toml");
    fs::write(&p, "[[feeds]]\nkind = \"auctions\"\n").unwrap();
    assert!(load_config_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the test never reads a real config/ directory.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing on disk -> defaults
    let v = load_config_default().unwrap();
    assert_eq!(v, IngestConfig::default());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("snapshot.toml"), "period_secs = 45\n").unwrap();
    assert_eq!(load_config_default().unwrap().period_secs, 45);

    // 3) Env path wins over ./config/
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"{"period_secs": 90}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().period_secs, 90);

    // 4) Single-value overrides apply last
    env::set_var(ENV_PERIOD_SECS, "12");
    env::set_var(ENV_RUN_ONCE, "true");
    let vo = load_config_default().unwrap();
    assert_eq!(vo.period_secs, 12);
    assert!(vo.run_once);

    // 5) Missing env path is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(load_config_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
