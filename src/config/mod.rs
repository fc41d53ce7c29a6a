//! Configuration loading and validation.
//!
//! The provider configuration is read once at startup and treated as
//! immutable for the lifetime of the provider. Submodules provide the
//! data model, the duration syntax used by `pollInterval` and
//! `fetchTimeout`, and validation logic.

pub mod duration;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::RouteSyncError;
use model::ProviderConfig;
use validation::validate;

/// File names probed in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "routesync.yaml",
    "routesync.yml",
    "routesync.json",
    "routesync.toml",
];

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<ProviderConfig, RouteSyncError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => {
            serde_yml::from_str(content).map_err(|e| RouteSyncError::ConfigParse {
                path: path_display.to_string(),
                source: Box::new(e),
            })
        }

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| RouteSyncError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| RouteSyncError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(RouteSyncError::UnsupportedFormat(other.to_string())),
    }
}

/// Read, parse and validate a config file.
pub async fn load_file(path: &Path) -> Result<ProviderConfig, RouteSyncError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RouteSyncError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RouteSyncError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validate(&config) {
        return Err(RouteSyncError::ConfigValidation { errors });
    }

    Ok(config)
}

/// Use the explicit path if given, otherwise auto-detect one of
/// [`DEFAULT_CONFIG_FILES`] in the current directory.
pub async fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, RouteSyncError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    for name in DEFAULT_CONFIG_FILES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Ok(path);
        }
    }

    Err(RouteSyncError::NoConfigSource {
        hint: "Provide --config <file> or create ./routesync.yaml.".into(),
    })
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
