//! Integration tests for config loading across all file formats.

use std::path::Path;

use routesync::config::model::ProviderConfig;
use routesync::config::validation::validate;
use routesync::config::{load_file, parse_config_str};
use routesync::error::RouteSyncError;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("routesync.yaml");
    let config = parse_config_str("yaml", &content, "routesync.yaml").unwrap();
    validate(&config).unwrap();

    assert_eq!(config.poll_interval, "10s");
    assert_eq!(config.fetch_timeout, "3s");
    let names: Vec<&str> = config.instances.names().collect();
    assert_eq!(names, ["edge-eu", "edge-us"]);

    let eu = config.instances.get("edge-eu").unwrap();
    assert_eq!(eu.api_host, "http://edge-eu.internal:8080");
    assert_eq!(eu.cert_resolver, "letsencrypt");
    assert_eq!(eu.credentials.as_ref().unwrap().username, "admin");
    assert_eq!(eu.service["loadBalancer"]["passHostHeader"], true);
}

#[tokio::test]
async fn load_file_reads_and_validates() {
    let config = load_file(Path::new("example/routesync.yaml")).await.unwrap();
    assert_eq!(config.instances.len(), 2);
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("routesync.json");
    let config = parse_config_str("json", &content, "routesync.json").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.instances.len(), 1);
    assert_eq!(config.fetch_timeout, "10s");
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("routesync.toml");
    let config = parse_config_str("toml", &content, "routesync.toml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.instances.len(), 1);
}

#[cfg(all(feature = "json", feature = "toml"))]
#[test]
fn all_formats_describe_the_same_first_instance() {
    let yaml_config = parse_config_str("yaml", &load_example("routesync.yaml"), "yaml").unwrap();
    let json_config = parse_config_str("json", &load_example("routesync.json"), "json").unwrap();
    let toml_config = parse_config_str("toml", &load_example("routesync.toml"), "toml").unwrap();

    for other in [&json_config, &toml_config] {
        let (name, instance) = other.instances.iter().next().unwrap();
        let (yaml_name, yaml_instance) = yaml_config.instances.iter().next().unwrap();
        assert_eq!(name, yaml_name);
        assert_eq!(instance.api_host, yaml_instance.api_host);
        assert_eq!(instance.entry_points, yaml_instance.entry_points);
        assert_eq!(
            instance.service["loadBalancer"]["servers"],
            yaml_instance.service["loadBalancer"]["servers"]
        );
    }
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(matches!(result, Err(RouteSyncError::UnsupportedFormat(_))));
}

#[test]
fn empty_config_is_valid() {
    let config: ProviderConfig = serde_json::from_str("{}").unwrap();
    validate(&config).unwrap();
    assert!(config.instances.is_empty());
    assert_eq!(config.poll_interval, "5s");
}

#[test]
fn invalid_instance_fails_validation() {
    let json = r#"{
        "pollInterval": "0s",
        "instances": {"edge": {"apiHost": "ftp://edge"}}
    }"#;
    let config: ProviderConfig = serde_json::from_str(json).unwrap();
    let errors = validate(&config).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"pollInterval"));
    assert!(fields.contains(&"apiHost"));
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{"instances": {"edge": {"apiHost": "http://edge", "certResolvr": "le"}}}"#;
    assert!(serde_json::from_str::<ProviderConfig>(json).is_err());
}
