//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`ProviderConfig`] for
//! structural errors: unparseable or non-positive durations, duplicate
//! instance names, malformed API hosts, half-configured credentials,
//! blank entry points and non-object service descriptors. All problems
//! are collected into a list of [`ValidationError`] values with
//! per-field suggestions.

use std::collections::HashSet;

use url::Url;

use super::duration::ConfigDuration;
use super::model::{InstanceConfig, ProviderConfig};
use crate::error::ValidationError;

const ROOT: &str = "(root)";

/// Validate a duration field that must be strictly positive.
pub fn validate_positive_duration(value: &str) -> Result<ConfigDuration, String> {
    let duration: ConfigDuration = value.parse()?;
    if duration.is_positive() {
        Ok(duration)
    } else {
        Err(format!("'{value}' must be greater than 0"))
    }
}

/// Validate an upstream API host. Returns `Ok(())` or a human-readable error.
pub fn validate_api_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("apiHost cannot be empty".into());
    }
    match Url::parse(host) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().is_none() {
                Err(format!("'{host}' has no host"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{host}' is not a valid URL")),
    }
}

fn error(instance: &str, field: &str, message: String) -> ValidationError {
    ValidationError {
        instance: instance.to_string(),
        field: field.into(),
        message,
        suggestion: None,
    }
}

fn validate_instance(name: &str, instance: &InstanceConfig, errors: &mut Vec<ValidationError>) {
    if let Err(msg) = validate_api_host(&instance.api_host) {
        let suggestion = (!instance.api_host.is_empty() && !instance.api_host.contains("://"))
            .then(|| format!("did you mean 'http://{}'?", instance.api_host));
        errors.push(ValidationError {
            suggestion,
            ..error(name, "apiHost", msg)
        });
    }

    if let Some(ref credentials) = instance.credentials {
        if credentials.username.is_empty() && !credentials.password.is_empty() {
            errors.push(ValidationError {
                suggestion: Some("set credentials.username or remove credentials".into()),
                ..error(
                    name,
                    "credentials.username",
                    "username is required when password is set".into(),
                )
            });
        }
    }

    for (i, entry_point) in instance.entry_points.iter().enumerate() {
        if entry_point.trim().is_empty() {
            errors.push(error(
                name,
                &format!("entryPoints[{i}]"),
                "entry point name cannot be empty".into(),
            ));
        }
    }

    if !instance.service.is_object() {
        errors.push(ValidationError {
            suggestion: Some("e.g. service: { loadBalancer: { servers: [...] } }".into()),
            ..error(
                name,
                "service",
                "service must be an object in the router core's schema".into(),
            )
        });
    }
}

pub fn validate(config: &ProviderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(msg) = validate_positive_duration(&config.poll_interval) {
        errors.push(error(ROOT, "pollInterval", msg));
    }
    if let Err(msg) = validate_positive_duration(&config.fetch_timeout) {
        errors.push(error(ROOT, "fetchTimeout", msg));
    }

    let mut seen_names = HashSet::new();

    for (i, (name, instance)) in config.instances.iter().enumerate() {
        let instance_id = if name.is_empty() {
            format!("instances[{i}]")
        } else {
            name.to_string()
        };

        if name.trim().is_empty() {
            errors.push(error(
                &instance_id,
                "name",
                "instance name cannot be empty".into(),
            ));
        }

        if !seen_names.insert(name) {
            errors.push(error(
                &instance_id,
                "name",
                "duplicate instance name".into(),
            ));
        }

        validate_instance(&instance_id, instance, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &ProviderConfig) -> String {
    let mut lines = vec![format!(
        "  {} instances, polled every {}\n",
        config.instances.len(),
        config.poll_interval
    )];

    if config.instances.is_empty() {
        lines.push("  (no instances: snapshots will be empty)".into());
    }

    for (name, instance) in config.instances.iter() {
        let entry_points = if instance.entry_points.is_empty() {
            "(all)".to_string()
        } else {
            instance.entry_points.join(", ")
        };
        let cert_resolver = if instance.cert_resolver.is_empty() {
            "(default)"
        } else {
            instance.cert_resolver.as_str()
        };
        let auth = match instance.credentials {
            Some(ref c) if !c.is_empty() => "basic",
            _ => "none",
        };

        lines.push(format!("  {name}  -> {}", instance.api_host));
        lines.push(format!("    entryPoints:  {entry_points}"));
        lines.push(format!("    certResolver: {cert_resolver}"));
        lines.push(format!("    auth:         {auth}"));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Credentials, Instances};

    fn config_with(instances: Vec<(&str, InstanceConfig)>) -> ProviderConfig {
        ProviderConfig {
            instances: instances
                .into_iter()
                .map(|(n, i)| (n.to_string(), i))
                .collect(),
            ..ProviderConfig::default()
        }
    }

    fn edge() -> InstanceConfig {
        InstanceConfig {
            entry_points: vec!["websecure".into()],
            cert_resolver: "le".into(),
            ..InstanceConfig::new("http://edge:8080")
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&config_with(vec![("edge", edge())])).is_ok());
    }

    #[test]
    fn no_instances_is_valid() {
        assert!(validate(&ProviderConfig::default()).is_ok());
    }

    #[test]
    fn zero_poll_interval_fails() {
        let config = ProviderConfig {
            poll_interval: "0s".into(),
            ..ProviderConfig::default()
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "pollInterval");
        assert!(errors[0].message.contains("greater than 0"));
    }

    #[test]
    fn unparseable_fetch_timeout_fails() {
        let config = ProviderConfig {
            fetch_timeout: "soon".into(),
            ..ProviderConfig::default()
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors[0].field, "fetchTimeout");
    }

    #[test]
    fn api_host_without_scheme_suggests_fix() {
        let config = config_with(vec![("edge", InstanceConfig::new("edge:8080"))]);
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean 'http://edge:8080'?")));
    }

    #[test]
    fn unsupported_scheme_fails() {
        let config = config_with(vec![("edge", InstanceConfig::new("ftp://edge"))]);
        let errors = validate(&config).unwrap_err();
        assert!(errors[0].message.contains("unsupported scheme"));
    }

    #[test]
    fn password_without_username_fails() {
        let instance = InstanceConfig {
            credentials: Some(Credentials {
                username: String::new(),
                password: "secret".into(),
            }),
            ..edge()
        };
        let errors = validate(&config_with(vec![("edge", instance)])).unwrap_err();
        assert_eq!(errors[0].field, "credentials.username");
    }

    #[test]
    fn blank_entry_point_fails() {
        let instance = InstanceConfig {
            entry_points: vec!["web".into(), " ".into()],
            ..edge()
        };
        let errors = validate(&config_with(vec![("edge", instance)])).unwrap_err();
        assert_eq!(errors[0].field, "entryPoints[1]");
    }

    #[test]
    fn non_object_service_fails() {
        let instance = InstanceConfig {
            service: serde_json::json!("http://edge"),
            ..edge()
        };
        let errors = validate(&config_with(vec![("edge", instance)])).unwrap_err();
        assert_eq!(errors[0].field, "service");
    }

    #[test]
    fn duplicate_names_from_file_fail() {
        let json = r#"{"instances": {
            "edge": {"apiHost": "http://a"},
            "edge": {"apiHost": "http://b"}
        }}"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("duplicate instance name")));
    }

    #[test]
    fn errors_are_collected_not_first_fail() {
        let config = ProviderConfig {
            poll_interval: "-1s".into(),
            instances: Instances::from_iter(vec![(
                "edge".to_string(),
                InstanceConfig::new("not a url"),
            )]),
            ..ProviderConfig::default()
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn report_lists_instances() {
        let config = config_with(vec![("edge", edge())]);
        let report = format_validation_report("routesync.yaml", &config);
        assert!(report.starts_with("routesync.yaml is valid"));
        assert!(report.contains("edge  -> http://edge:8080"));
        assert!(report.contains("certResolver: le"));
    }
}
