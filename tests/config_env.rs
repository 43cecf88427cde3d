// tests/config_env.rs
//! Config loading: file + env override precedence. Env-mutating tests are
//! serialized.

use serial_test::serial;

use barcode_scan_pipeline::config::{
    PipelineConfig, ENV_BARCODE_LOOKUP_API_KEY, ENV_CONFIG_PATH,
};

fn write_temp_config(contents: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("scanner-cfg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("scanner.toml");
    std::fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
#[serial]
fn env_path_takes_precedence() {
    let path = write_temp_config(
        r#"
        lookup_timeout_secs = 7
        cache_ttl_hours = 2
        "#,
    );
    std::env::set_var(ENV_CONFIG_PATH, &path);
    std::env::remove_var(ENV_BARCODE_LOOKUP_API_KEY);

    let cfg = PipelineConfig::load_default();
    assert_eq!(cfg.lookup_timeout_secs, 7);
    assert_eq!(cfg.cache_ttl_hours, 2);
    // Untouched fields keep defaults.
    assert_eq!(cfg.wedge_gap_ms, 100);

    std::env::remove_var(ENV_CONFIG_PATH);
}

#[test]
#[serial]
fn api_key_env_overrides_file() {
    let path = write_temp_config(r#"barcode_lookup_api_key = "from-file""#);
    std::env::set_var(ENV_CONFIG_PATH, &path);
    std::env::set_var(ENV_BARCODE_LOOKUP_API_KEY, "from-env");

    let cfg = PipelineConfig::load_default();
    assert_eq!(cfg.barcode_lookup_api_key.as_deref(), Some("from-env"));

    std::env::remove_var(ENV_CONFIG_PATH);
    std::env::remove_var(ENV_BARCODE_LOOKUP_API_KEY);
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    std::env::set_var(ENV_CONFIG_PATH, "/nonexistent/scanner.toml");
    std::env::remove_var(ENV_BARCODE_LOOKUP_API_KEY);

    let cfg = PipelineConfig::load_default();
    assert_eq!(cfg.lookup_timeout_secs, 4);
    assert!(cfg.barcode_lookup_api_key.is_none());

    std::env::remove_var(ENV_CONFIG_PATH);
}

#[test]
fn derived_durations_are_clamped() {
    let cfg: PipelineConfig = toml::from_str(
        r#"
        lookup_timeout_secs = 0
        frame_interval_ms = 1
        "#,
    )
    .unwrap();
    assert_eq!(cfg.lookup_timeout().as_secs(), 1);
    assert_eq!(cfg.frame_interval().as_millis(), 50);
}
