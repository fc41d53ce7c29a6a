//! Routesync is a dynamic configuration provider for a reverse-proxy core.
//!
//! On every poll it asks each configured upstream proxy instance for its
//! HTTP routers, re-publishes them under local identity (the local router
//! points at one service per instance and uses that instance's entry
//! points and certificate resolver), and hands the merged snapshot to
//! the consumer over a channel. One unreachable instance never blocks
//! the others.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, snapshot, validate, health).
//! - [`config`] -- Provider configuration: model, duration parsing, file
//!   loading and validation.
//! - [`dynamic`] -- The dynamic configuration snapshot handed to the router core.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`provider`] -- Upstream fetch, rule remapping, snapshot building and
//!   the cancellable polling loop.
//! - [`server`] -- Axum server exposing the latest snapshot, shared
//!   application state, and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod health;
pub mod logging;
pub mod provider;
pub mod server;

pub use config::model::{Credentials, InstanceConfig, ProviderConfig};
pub use dynamic::Configuration;
pub use error::{FetchError, RouteSyncError};
pub use provider::Provider;
