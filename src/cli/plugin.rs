//! Plugin management commands: list, export, import, upgrade.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Subcommand, ValueEnum};
use serde_json::Value;

use crate::config::{AppConfig, ServerConfig};
use crate::console::ConsoleClient;
use crate::constants::CLI_DEFAULT_CONCURRENCY;
use crate::error::{ApiError, DifyError};
use crate::models::{PluginExportEntry, PluginExportFile, PluginInfo};

use super::output::{confirm, plugin_table};
use super::{console_client, exit_code};

#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// List installed plugins
    List {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Export the installed-plugin list as JSON
    Export {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include plugin configurations (may contain credentials)
        #[arg(long)]
        with_config: bool,
    },
    /// Install plugins from an export file
    Import {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Input file path (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Install the latest versions instead of the exported ones
        #[arg(long)]
        latest: bool,
        /// Apply exported plugin configurations after install
        #[arg(long)]
        with_config: bool,
        /// Skip plugins that are already installed
        #[arg(long)]
        skip_existing: bool,
    },
    /// Upgrade marketplace plugins to their latest versions
    #[command(group(ArgGroup::new("selection").required(true).args(["plugin_ids", "all"])))]
    Upgrade {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Upgrade a specific plugin (repeatable)
        #[arg(short = 'p', long = "plugin-id", value_name = "PLUGIN_ID")]
        plugin_ids: Vec<String>,
        /// Upgrade every marketplace plugin
        #[arg(short, long)]
        all: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Max concurrent requests
        #[arg(short, long, default_value_t = CLI_DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// Raw JSON
    Json,
}

pub(crate) async fn run(command: PluginCommand, config: &AppConfig) -> Result<ExitCode, DifyError> {
    match command {
        PluginCommand::List { server, format } => {
            let server = config.get_server(&server)?;
            list(server, format).await
        }
        PluginCommand::Export {
            server,
            output,
            with_config,
        } => {
            let server = config.get_server(&server)?;
            export(server, output.as_deref(), with_config).await
        }
        PluginCommand::Import {
            server,
            input,
            latest,
            with_config,
            skip_existing,
        } => {
            let server = config.get_server(&server)?;
            import(server, input.as_deref(), latest, with_config, skip_existing).await
        }
        PluginCommand::Upgrade {
            server,
            plugin_ids,
            all,
            yes,
            concurrency,
        } => {
            let server = config.get_server(&server)?;
            upgrade(server, &plugin_ids, all, yes, concurrency).await
        }
    }
}

async fn list(server: &ServerConfig, format: OutputFormat) -> Result<ExitCode, DifyError> {
    let client = console_client(server, CLI_DEFAULT_CONCURRENCY)?;
    client.login().await?;

    let plugins = client.get_plugins().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plugins)?),
        OutputFormat::Table => {
            println!("Server: {} ({})", server.name, client.base_url());
            println!("Total: {} plugin(s)\n", plugins.len());
            println!("{}", plugin_table(&plugins));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn export(
    server: &ServerConfig,
    output: Option<&Path>,
    with_config: bool,
) -> Result<ExitCode, DifyError> {
    let client = console_client(server, CLI_DEFAULT_CONCURRENCY)?;
    client.login().await?;

    let plugins = client.get_plugins().await?;
    if plugins.is_empty() {
        eprintln!("No plugins found to export");
        return Ok(ExitCode::SUCCESS);
    }

    let mut export = PluginExportFile::new(server.name.as_str(), with_config);
    export.plugins = plugins
        .iter()
        .map(|p| PluginExportEntry::from_plugin(p, with_config))
        .collect();

    let json = serde_json::to_string_pretty(&export)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, &json).await?;
            println!("Exported {} plugin(s) to {}", plugins.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::SUCCESS)
}

async fn import(
    server: &ServerConfig,
    input: Option<&Path>,
    latest: bool,
    with_config: bool,
    skip_existing: bool,
) -> Result<ExitCode, DifyError> {
    let text = match input {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let document: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Error: Invalid JSON input: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };
    let Some(raw_plugins) = document.get("plugins") else {
        eprintln!("Error: Invalid import file format (missing 'plugins' field)");
        return Ok(ExitCode::FAILURE);
    };
    let entries: Vec<PluginExportEntry> = serde_json::from_value(raw_plugins.clone())?;
    if entries.is_empty() {
        println!("No plugins to import");
        return Ok(ExitCode::SUCCESS);
    }

    let client = console_client(server, CLI_DEFAULT_CONCURRENCY)?;
    client.login().await?;

    // Both the exact identifier and the bare name count as installed, so
    // a version bump on the server still registers as a duplicate.
    let existing = if skip_existing {
        let installed = client.get_plugins().await?;
        let mut set = HashSet::new();
        for plugin in &installed {
            set.insert(plugin.plugin_id.clone());
            if let Some((name, _)) = plugin.plugin_id.rsplit_once(':') {
                set.insert(name.to_string());
            }
        }
        set
    } else {
        HashSet::new()
    };

    println!("Server: {} ({})", server.name, client.base_url());
    println!("Importing {} plugin(s)...\n", entries.len());

    let mut installed = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    let mut configs_applied = 0usize;

    for entry in &entries {
        let install_id = entry.install_identifier(latest);

        if skip_existing && (existing.contains(&install_id) || existing.contains(&entry.name)) {
            println!("  [SKIP] {} (already installed)", entry.name);
            skipped += 1;
            continue;
        }

        match install_entry(&client, entry, &install_id).await {
            Ok(()) => {
                let mut status_parts = vec!["installed".to_string()];
                if with_config {
                    if let Some(config) = &entry.config {
                        if !entry.installation_id.is_empty() {
                            match client
                                .update_plugin_config(&entry.installation_id, config)
                                .await
                            {
                                Ok(_) => {
                                    status_parts.push("config applied".to_string());
                                    configs_applied += 1;
                                }
                                Err(err) => {
                                    status_parts.push(format!("config failed: {}", err))
                                }
                            }
                        }
                    }
                }
                let version = if latest { "latest" } else { entry.version.as_str() };
                println!(
                    "  [OK] {}:{} ({})",
                    entry.name,
                    version,
                    status_parts.join(", ")
                );
                installed += 1;
            }
            Err(err) if is_already_installed(&err) => {
                println!("  [SKIP] {}:{} (already installed)", entry.name, entry.version);
                skipped += 1;
            }
            Err(err) => {
                eprintln!("  [FAIL] {}:{} - {}", entry.name, entry.version, err);
                failed += 1;
            }
        }
    }

    println!(
        "\nSummary: {} installed, {} skipped, {} failed",
        installed, skipped, failed
    );
    if with_config {
        println!("         {} configs applied", configs_applied);
    }
    Ok(exit_code(failed))
}

async fn install_entry(
    client: &ConsoleClient,
    entry: &PluginExportEntry,
    install_id: &str,
) -> Result<(), DifyError> {
    if entry.source == "github" {
        if let Some(github) = &entry.github {
            let repo = github.get("repo").and_then(Value::as_str).unwrap_or_default();
            let version = github
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let package = github
                .get("package")
                .and_then(Value::as_str)
                .unwrap_or_default();
            client
                .install_plugin_from_github(install_id, repo, version, package)
                .await?;
            return Ok(());
        }
    }

    let identifiers = [install_id.to_string()];
    client.install_plugin_from_marketplace(&identifiers).await?;
    Ok(())
}

/// Servers answer a duplicate install with a 400 whose message names the
/// conflict; that case is a skip, not a failure.
fn is_already_installed(err: &DifyError) -> bool {
    let DifyError::Api(ApiError::InvalidRequest { message, .. }) = err else {
        return false;
    };
    let message = message.to_lowercase();
    message.contains("already") || message.contains("installed") || message.contains("exist")
}

async fn upgrade(
    server: &ServerConfig,
    plugin_ids: &[String],
    all: bool,
    yes: bool,
    concurrency: usize,
) -> Result<ExitCode, DifyError> {
    let client = console_client(server, concurrency)?;
    client.login().await?;

    let installed = client.get_plugins().await?;

    println!("Server: {} ({})", server.name, client.base_url());

    let mut skipped = 0usize;
    let mut failed = 0usize;
    let mut targets: Vec<PluginInfo> = Vec::new();

    if all {
        for plugin in installed {
            if plugin.source == "marketplace" {
                targets.push(plugin);
            } else {
                println!(
                    "  [SKIP] {} (source: {}, marketplace only)",
                    plugin.plugin_id, plugin.source
                );
                skipped += 1;
            }
        }
    } else {
        let by_id: HashMap<&str, &PluginInfo> = installed
            .iter()
            .map(|p| (p.plugin_id.as_str(), p))
            .collect();
        let mut seen = HashSet::new();
        for plugin_id in plugin_ids {
            if !seen.insert(plugin_id.as_str()) {
                continue;
            }
            match by_id.get(plugin_id.as_str()) {
                None => {
                    eprintln!("  [FAIL] {} - not installed", plugin_id);
                    failed += 1;
                }
                Some(plugin) if plugin.source != "marketplace" => {
                    println!(
                        "  [SKIP] {} (source: {}, marketplace only)",
                        plugin.plugin_id, plugin.source
                    );
                    skipped += 1;
                }
                Some(plugin) => targets.push((*plugin).clone()),
            }
        }
    }

    if targets.is_empty() {
        println!("No plugins to upgrade");
        println!("\nSummary: 0 upgraded, {} skipped, {} failed", skipped, failed);
        return Ok(exit_code(failed));
    }

    if !yes && !confirm(&format!("Upgrade {} plugin(s)?", targets.len()))? {
        println!("Aborted");
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "Upgrading {} plugin(s) (concurrency={})...",
        targets.len(),
        concurrency
    );

    let results = client.upgrade_plugins(&targets).await;
    let mut by_key: HashMap<String, Result<String, DifyError>> =
        results.into_iter().map(|r| (r.key, r.outcome)).collect();

    let mut upgraded = 0usize;
    for plugin in &targets {
        match by_key.remove(&plugin.plugin_id) {
            Some(Ok(identifier)) => {
                println!("  [OK] {} (upgraded)", identifier);
                upgraded += 1;
            }
            Some(Err(err)) => {
                eprintln!("  [FAIL] {} - {}", plugin.plugin_id, err);
                failed += 1;
            }
            None => {}
        }
    }

    println!(
        "\nSummary: {} upgraded, {} skipped, {} failed",
        upgraded, skipped, failed
    );
    Ok(exit_code(failed))
}
