use super::*;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents.as_bytes()).expect("write config");
    path
}

#[test]
fn default_config_redacts() {
    let config = default_config();
    assert!(config.redact);
    assert_eq!(config.platform, Platform::Cf);
    validate_config(&config).expect("default config is valid");
}

#[test]
fn load_config_reads_yaml_and_fills_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(
        dir.path(),
        "discover.yaml",
        "platform: korifi\napi_endpoint: https://localhost\nkorifi_username: kind-korifi\nspace_names: [dev, prod]\n",
    );
    let config = load_config(&path).expect("load yaml");
    assert_eq!(config.platform, Platform::Korifi);
    assert_eq!(config.api_endpoint.as_deref(), Some("https://localhost"));
    assert_eq!(config.space_names, vec!["dev", "prod"]);
    assert!(config.redact, "redact should default to true");
    validate_config(&config).expect("valid config");
}

#[test]
fn load_config_reads_json_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(
        dir.path(),
        "discover.json",
        r#"{"redact": false, "version": "3", "skip_ssl_validation": true}"#,
    );
    let config = load_config(&path).expect("load json");
    assert!(!config.redact);
    assert_eq!(config.version.as_deref(), Some("3"));
    assert!(config.skip_ssl_validation);
}

#[test]
fn load_config_reports_the_path_on_parse_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(dir.path(), "broken.json", "{not json");
    let err = load_config(&path).expect_err("broken config");
    assert!(
        format!("{err:#}").contains("broken.json"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn validate_config_rejects_contradictions() {
    let mut config = default_config();
    config.api_endpoint = Some("api.example.com".to_string());
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.kubeconfig = Some(PathBuf::from("/tmp/kubeconfig"));
    let err = validate_config(&config).expect_err("kubeconfig on cf");
    assert!(err.to_string().contains("korifi"), "{err}");

    let mut config = default_config();
    config.space_names = vec!["dev".to_string(), " ".to_string()];
    assert!(validate_config(&config).is_err());
}

#[test]
fn live_request_needs_space_app_and_korifi_settings() {
    let config = default_config();
    assert!(validate_live_request(&config, "", "app").is_err());
    assert!(validate_live_request(&config, "dev", "").is_err());
    validate_live_request(&config, "dev", "app").expect("cf request");

    let mut korifi = default_config();
    korifi.platform = Platform::Korifi;
    let err = validate_live_request(&korifi, "dev", "app").expect_err("no endpoint");
    assert!(err.to_string().contains("api_endpoint"), "{err}");
    korifi.api_endpoint = Some("https://localhost".to_string());
    assert!(validate_live_request(&korifi, "dev", "app").is_err());
    korifi.korifi_username = Some("kind-korifi".to_string());
    validate_live_request(&korifi, "dev", "app").expect("korifi request");
}

#[test]
fn explicit_paths_win_over_environment() {
    let mut config = default_config();
    config.cf_home = Some(PathBuf::from("/srv/cf"));
    config.platform = Platform::Korifi;
    config.kubeconfig = Some(PathBuf::from("/srv/kube/config"));
    assert_eq!(resolve_cf_home(&config).expect("cf home"), PathBuf::from("/srv/cf"));
    assert_eq!(
        resolve_kubeconfig(&config).expect("kubeconfig"),
        PathBuf::from("/srv/kube/config")
    );
}
