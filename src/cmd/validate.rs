//! `routesync validate` — check a configuration file for errors.
//!
//! Parses and validates the config file, reporting results in either
//! human-readable text or machine-readable JSON format. The JSON summary
//! describes what `run` would poll: cadence, timeout and every instance
//! with its local routing identity.

use serde_json::{json, Value};

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::ProviderConfig;
use crate::config::parse_config_str;
use crate::config::validation;
use crate::error::{RouteSyncError, ValidationError};

pub fn execute(args: &ValidateArgs) -> Result<(), RouteSyncError> {
    let path = &args.config;
    if !path.exists() {
        return Err(RouteSyncError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let display = path.display().to_string();
    let config = parse_config_str(ext, &content, &display)?;

    match (validation::validate(&config), &args.format) {
        (Ok(()), ValidateFormat::Text) => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&display, &config)
            );
            Ok(())
        }
        (Ok(()), ValidateFormat::Json) => {
            println!("{}", summary(&config));
            Ok(())
        }
        (Err(errors), ValidateFormat::Text) => {
            eprintln!("\u{2717} {display} has {} errors\n", errors.len());
            for error in &errors {
                eprintln!("{error}");
            }
            Err(RouteSyncError::ConfigValidation { errors })
        }
        (Err(errors), ValidateFormat::Json) => {
            println!("{}", error_report(&errors));
            Err(RouteSyncError::ConfigValidation { errors })
        }
    }
}

/// JSON description of a valid configuration. Credentials are reduced to
/// the auth scheme; secrets never reach the output.
#[must_use]
pub fn summary(config: &ProviderConfig) -> Value {
    let instances: Vec<Value> = config
        .instances
        .iter()
        .map(|(name, instance)| {
            let auth = match instance.credentials {
                Some(ref c) if !c.is_empty() => "basic",
                _ => "none",
            };
            json!({
                "name": name,
                "apiHost": instance.api_host,
                "entryPoints": instance.entry_points,
                "certResolver": instance.cert_resolver,
                "auth": auth,
                "service": name,
            })
        })
        .collect();

    json!({
        "valid": true,
        "pollInterval": config.poll_interval,
        "fetchTimeout": config.fetch_timeout,
        "instances": instances,
    })
}

#[must_use]
pub fn error_report(errors: &[ValidationError]) -> Value {
    let errors: Vec<Value> = errors
        .iter()
        .map(|e| {
            json!({
                "instance": e.instance,
                "field": e.field,
                "message": e.message,
                "suggestion": e.suggestion,
            })
        })
        .collect();
    json!({ "valid": false, "errors": errors })
}
