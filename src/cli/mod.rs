//! Command-line interface: argument definitions and command dispatch.
//!
//! Commands are grouped by resource (`app`, `plugin`), each with its own
//! subcommand enum. Every command resolves a named server from the config
//! file, logs in, and performs its work through [`ConsoleClient`]. Batch
//! commands print one status line per item and exit non-zero when any
//! item failed.

mod app;
mod output;
mod plugin;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

pub use app::AppCommand;
pub use plugin::{OutputFormat, PluginCommand};

use crate::config::{load_config, ServerConfig};
use crate::console::ConsoleClient;
use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::error::DifyError;

#[derive(Debug, Parser)]
#[command(name = "dify-assistant")]
#[command(about = "App and plugin migration tool for Dify servers")]
#[command(version)]
pub struct Cli {
    /// Config file path (default: ./app.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH", env = "DIFY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// App management commands
    App {
        #[command(subcommand)]
        command: AppCommand,
    },
    /// Plugin management commands
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
}

/// Load configuration and run the selected command.
pub async fn run(cli: Cli) -> Result<ExitCode, DifyError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::App { command } => app::run(command, &config).await,
        Commands::Plugin { command } => plugin::run(command, &config).await,
    }
}

/// Build a console client for one configured server.
pub(crate) fn console_client(
    server: &ServerConfig,
    max_concurrency: usize,
) -> Result<ConsoleClient, DifyError> {
    ConsoleClient::with_options(
        server.base_url.as_str(),
        server.email.as_str(),
        server.password.clone(),
        Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        max_concurrency,
    )
}

/// Success unless any batch item failed.
pub(crate) fn exit_code(failed: usize) -> ExitCode {
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
