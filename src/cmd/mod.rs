//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`snapshot`], [`validate`], or [`health`].
//! Each handler lives in its own submodule.

pub mod health;
pub mod run;
pub mod snapshot;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::RouteSyncError;

pub async fn dispatch(cli: Cli) -> Result<(), RouteSyncError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Snapshot(args)) => snapshot::execute(args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  routesync v{version}: republishes routers polled from upstream proxies\n\n  \
         No command provided. To get started:\n\n    \
         routesync validate                Check ./routesync.yaml\n    \
         routesync snapshot                Fetch once and print the merged configuration\n    \
         routesync run                     Poll continuously and serve /api/config\n    \
         routesync --help                  See all commands and options\n"
    );
}
