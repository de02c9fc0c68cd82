use record_filter::config::{
    ConfigError, FilterConfig, builtin_profile_names, load_config_from_path, resolve_config,
};
use record_filter::filter::{ConfigurationError, PredicateMode};
use record_filter::record::FieldKind;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("filters.toml");
    fs::write(&path, content).expect("failed to write config");
    path
}

#[test]
fn test_config_file_with_default_criteria() {
    let dir = tempdir().expect("temp dir");
    let path = write_config(
        dir.path(),
        r#"
profile_name = "hiring"

[schema]
name = "text"
status = "text"
experience = "number"
skills = "list"

[search]
fields = ["name"]

[[criteria]]
field = "experience"
mode = "range"
min = 2

[[criteria]]
field = "skills"
mode = "containsAny"
values = ["Rust", "Go"]
"#,
    );

    let config = load_config_from_path(&path).expect("config should load");

    assert_eq!(config.profile_name, "hiring");
    assert_eq!(config.schema.kind_of("skills"), Some(FieldKind::List));
    assert_eq!(config.search_spec().fields(), ["name"]);

    let criteria = config.default_criteria().expect("criteria should be valid");
    assert_eq!(criteria.len(), 2);
    assert_eq!(
        criteria.get("experience").map(|c| c.mode()),
        Some(PredicateMode::Range)
    );
}

#[test]
fn test_config_with_unknown_mode_is_invalid() {
    let dir = tempdir().expect("temp dir");
    let path = write_config(
        dir.path(),
        r#"
[[criteria]]
field = "status"
mode = "similar"
value = "Hired"
"#,
    );

    match load_config_from_path(&path) {
        Err(ConfigError::Invalid { source, .. }) => {
            assert_eq!(source, ConfigurationError::UnknownMode("similar".to_string()));
        }
        other => panic!("expected invalid config, got {other:?}"),
    }
}

#[test]
fn test_config_range_without_bounds_is_invalid() {
    let dir = tempdir().expect("temp dir");
    let path = write_config(
        dir.path(),
        r#"
[[criteria]]
field = "experience"
mode = "range"
"#,
    );

    match load_config_from_path(&path) {
        Err(ConfigError::Invalid { source, .. }) => {
            assert!(matches!(source, ConfigurationError::MalformedCriterion { .. }));
        }
        other => panic!("expected invalid config, got {other:?}"),
    }
}

#[test]
fn test_config_search_field_must_be_declared() {
    let dir = tempdir().expect("temp dir");
    let path = write_config(
        dir.path(),
        r#"
[schema]
name = "text"

[search]
fields = ["name", "email"]
"#,
    );

    let err = load_config_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("email"), "got: {err}");
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let dir = tempdir().expect("temp dir");
    let path = write_config(dir.path(), "[schema\nname = ");

    assert!(matches!(
        load_config_from_path(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_missing_config_file_is_a_read_error() {
    let dir = tempdir().expect("temp dir");
    let err = load_config_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_resolve_prefers_explicit_file_over_profile() {
    let dir = tempdir().expect("temp dir");
    let path = write_config(dir.path(), "profile_name = \"mine\"\n");

    let config = resolve_config(Some(&path), Some("jobs")).expect("config should resolve");
    assert_eq!(config.profile_name, "mine");

    let config = resolve_config(None, Some("JOBS")).expect("profile lookup ignores case");
    assert_eq!(config.profile_name, "jobs");

    let config = resolve_config(None, None).expect("default config");
    assert_eq!(config, FilterConfig::default());
}

#[test]
fn test_every_builtin_profile_has_search_fields() {
    for name in builtin_profile_names() {
        let config = resolve_config(None, Some(name)).expect("built-in profile");
        assert!(
            !config.search_spec().is_empty(),
            "profile {name} has no search fields"
        );
    }
}
