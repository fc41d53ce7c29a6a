//! Unified error types for routesync.
//!
//! Defines [`RouteSyncError`] (fatal, surfaced synchronously to the
//! caller), [`FetchError`] (per-instance upstream failures, logged and
//! isolated to one instance for one tick) and [`ValidationError`] for
//! config validation failures. All use `thiserror` for `Display` and
//! `Error` derives.

use std::path::PathBuf;

use hyper::StatusCode;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub instance: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "  instance {}: {}: {}",
            self.instance, self.field, self.message
        )?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RouteSyncError {
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than 0 (got '{value}')")]
    NonPositiveDuration { field: &'static str, value: String },

    #[error("Provider '{name}' cannot start: it is {state}")]
    InvalidState { name: String, state: String },

    #[error("No config file found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(StatusCode),
}

/// Failure to obtain routers from one upstream instance.
///
/// Never fatal for a build: the builder logs it and moves on to the
/// next instance.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("invalid upstream host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upstream {url} unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upstream {url} rejected the request with status {status}")]
    Rejected { url: String, status: StatusCode },

    #[error("upstream {url} returned an undecodable router list: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
