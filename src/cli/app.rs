//! App management commands: tags, list, export, import, delete.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Subcommand};

use crate::config::{AppConfig, ServerConfig};
use crate::console::ConsoleClient;
use crate::constants::CLI_DEFAULT_CONCURRENCY;
use crate::error::{ApiError, DifyError};
use crate::models::{AppImportResult, AppInfo};

use super::output::{confirm, sanitize_filename};
use super::{console_client, exit_code};

#[derive(Debug, Subcommand)]
pub enum AppCommand {
    /// List all tags on a server
    Tags {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
    },
    /// List apps on a server
    List {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Only show apps carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Export apps as YAML DSL files
    Export {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Export only apps carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Export a single app by ID
        #[arg(short = 'i', long = "id", value_name = "APP_ID", conflicts_with = "tag")]
        id: Option<String>,
        /// Output directory for the YAML files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Include credential values in the exported DSL
        #[arg(long)]
        include_secret: bool,
        /// Process apps one at a time instead of concurrently
        #[arg(long)]
        serial: bool,
        /// Max concurrent requests
        #[arg(short, long, default_value_t = CLI_DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Import apps from YAML DSL files
    Import {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// YAML file or directory of YAML files to import
        #[arg(short, long)]
        input: PathBuf,
        /// Tag to apply to every imported app
        #[arg(short, long)]
        tag: Option<String>,
        /// Process files one at a time instead of concurrently
        #[arg(long)]
        serial: bool,
        /// Max concurrent requests
        #[arg(short, long, default_value_t = CLI_DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Delete apps from a server
    #[command(group(ArgGroup::new("selector").required(true).args(["id", "tag", "all"])))]
    Delete {
        /// Server instance name from the config file
        #[arg(short, long)]
        server: String,
        /// Delete a single app by ID
        #[arg(short = 'i', long = "id", value_name = "APP_ID")]
        id: Option<String>,
        /// Delete every app carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Delete all apps on the server
        #[arg(short, long)]
        all: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Process apps one at a time instead of concurrently
        #[arg(long)]
        serial: bool,
        /// Max concurrent requests
        #[arg(short, long, default_value_t = CLI_DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

pub(crate) async fn run(command: AppCommand, config: &AppConfig) -> Result<ExitCode, DifyError> {
    match command {
        AppCommand::Tags { server } => {
            let server = config.get_server(&server)?;
            tags(server).await
        }
        AppCommand::List { server, tag } => {
            let server = config.get_server(&server)?;
            list(server, tag.as_deref()).await
        }
        AppCommand::Export {
            server,
            tag,
            id,
            output,
            include_secret,
            serial,
            concurrency,
        } => {
            let server = config.get_server(&server)?;
            export(
                server,
                tag.as_deref(),
                id.as_deref(),
                &output,
                include_secret,
                serial,
                concurrency,
            )
            .await
        }
        AppCommand::Import {
            server,
            input,
            tag,
            serial,
            concurrency,
        } => {
            let server = config.get_server(&server)?;
            import(server, &input, tag.as_deref(), serial, concurrency).await
        }
        AppCommand::Delete {
            server,
            id,
            tag,
            all,
            yes,
            serial,
            concurrency,
        } => {
            let server = config.get_server(&server)?;
            delete(server, id.as_deref(), tag.as_deref(), all, yes, serial, concurrency).await
        }
    }
}

async fn tags(server: &ServerConfig) -> Result<ExitCode, DifyError> {
    let client = console_client(server, CLI_DEFAULT_CONCURRENCY)?;
    client.login().await?;

    let tags = client.get_tags("app").await?;
    if tags.is_empty() {
        println!("No tags found");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Tags:");
    for tag in &tags {
        println!("  - {} (id: {})", tag.name, tag.id);
    }
    Ok(ExitCode::SUCCESS)
}

async fn list(server: &ServerConfig, tag: Option<&str>) -> Result<ExitCode, DifyError> {
    let client = console_client(server, CLI_DEFAULT_CONCURRENCY)?;
    client.login().await?;

    let apps = client.get_apps(tag).await?;
    if apps.is_empty() {
        println!("No apps found");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Apps ({}):", apps.len());
    for app in &apps {
        let mode = if app.mode.is_empty() {
            "unknown"
        } else {
            app.mode.as_str()
        };
        let tag_names: Vec<&str> = app
            .tags
            .iter()
            .filter(|t| !t.name.is_empty())
            .map(|t| t.name.as_str())
            .collect();
        let tag_suffix = if tag_names.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tag_names.join(", "))
        };
        println!("  [{}] {} ({}){}", mode, app.name, app.id, tag_suffix);
    }
    Ok(ExitCode::SUCCESS)
}

async fn export(
    server: &ServerConfig,
    tag: Option<&str>,
    id: Option<&str>,
    output: &Path,
    include_secret: bool,
    serial: bool,
    concurrency: usize,
) -> Result<ExitCode, DifyError> {
    tokio::fs::create_dir_all(output).await?;

    let client = console_client(server, concurrency)?;
    client.login().await?;

    if let Some(app_id) = id {
        export_single(&client, app_id, include_secret, output).await?;
        println!("Export completed to {}", output.display());
        return Ok(ExitCode::SUCCESS);
    }

    if !serial {
        println!("Logged in successfully");
    }

    let apps = client.get_apps(tag).await?;
    if apps.is_empty() {
        println!("No apps found to export");
        return Ok(ExitCode::SUCCESS);
    }

    let failed = if serial {
        println!("Exporting {} app(s) serially...", apps.len());
        for app in &apps {
            export_single(&client, &app.id, include_secret, output).await?;
        }
        0
    } else {
        println!(
            "Exporting {} app(s) in parallel (concurrency={})...",
            apps.len(),
            concurrency
        );
        export_parallel(&client, &apps, include_secret, output).await?
    };

    println!("Export completed to {}", output.display());
    Ok(exit_code(failed))
}

/// Export one app and write it under the name `{sanitized}_{id}.yaml`.
async fn export_single(
    client: &ConsoleClient,
    app_id: &str,
    include_secret: bool,
    output: &Path,
) -> Result<(), DifyError> {
    let yaml = client.export_app(app_id, include_secret).await?;
    let info = client.get_app(app_id).await?;
    let name = info.as_ref().map(|i| i.name.as_str()).unwrap_or(app_id);

    let filename = format!("{}_{}.yaml", sanitize_filename(name), app_id);
    tokio::fs::write(output.join(&filename), &yaml).await?;
    println!("  Exported: {}", filename);
    Ok(())
}

async fn export_parallel(
    client: &ConsoleClient,
    apps: &[AppInfo],
    include_secret: bool,
    output: &Path,
) -> Result<usize, DifyError> {
    let app_ids: Vec<String> = apps.iter().map(|a| a.id.clone()).collect();

    let results = client.export_apps(&app_ids, include_secret).await;
    // Names are fetched fresh so renames between listing and export still
    // land in the right file.
    let infos = client.get_apps_info(&app_ids).await;

    let info_by_id: HashMap<String, AppInfo> = infos
        .into_iter()
        .filter_map(|r| match r.outcome {
            Ok(Some(info)) => Some((r.key, info)),
            _ => None,
        })
        .collect();
    let mut yaml_by_id: HashMap<String, Result<String, DifyError>> =
        results.into_iter().map(|r| (r.key, r.outcome)).collect();

    let mut exported = 0usize;
    let mut failed = 0usize;
    for app_id in &app_ids {
        let Some(outcome) = yaml_by_id.remove(app_id) else {
            continue;
        };
        match outcome {
            Err(err) => {
                eprintln!("  Failed: {} - {}", app_id, err);
                failed += 1;
            }
            Ok(yaml) if yaml.is_empty() => {
                eprintln!("  Skipped: {} (empty content)", app_id);
                failed += 1;
            }
            Ok(yaml) => {
                let name = info_by_id
                    .get(app_id)
                    .map(|i| i.name.as_str())
                    .unwrap_or(app_id);
                let filename = format!("{}_{}.yaml", sanitize_filename(name), app_id);
                tokio::fs::write(output.join(&filename), &yaml).await?;
                println!("  Exported: {}", filename);
                exported += 1;
            }
        }
    }

    println!("Done: {} exported, {} failed", exported, failed);
    Ok(failed)
}

async fn import(
    server: &ServerConfig,
    input: &Path,
    tag: Option<&str>,
    serial: bool,
    concurrency: usize,
) -> Result<ExitCode, DifyError> {
    let client = console_client(server, concurrency)?;
    client.login().await?;

    if input.is_file() {
        import_single(&client, input, tag).await?;
        println!("Import completed");
        return Ok(ExitCode::SUCCESS);
    }

    if !input.is_dir() {
        return Err(ApiError::Validation {
            message: format!("path '{}' is not a file or directory", input.display()),
        }
        .into());
    }

    let files = collect_yaml_files(input).await?;
    if files.is_empty() {
        println!("No YAML files found in directory");
        return Ok(ExitCode::SUCCESS);
    }

    let failed = if serial || files.len() == 1 {
        println!("Importing {} file(s) serially...", files.len());
        for file in &files {
            import_single(&client, file, tag).await?;
        }
        0
    } else {
        import_parallel(&client, &files, tag).await?
    };

    println!("Import completed");
    Ok(exit_code(failed))
}

async fn collect_yaml_files(dir: &Path) -> Result<Vec<PathBuf>, DifyError> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        if is_yaml && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn import_single(
    client: &ConsoleClient,
    path: &Path,
    tag: Option<&str>,
) -> Result<(), DifyError> {
    let yaml = tokio::fs::read_to_string(path).await?;
    let result = client.import_app(&yaml).await?;

    let fallback = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let name = result.name.as_deref().unwrap_or(fallback);
    let app_id = result.app_id.as_deref().unwrap_or("unknown");
    println!("  Imported: {} ({})", name, app_id);

    if let Some(tag) = tag {
        if app_id != "unknown" {
            let bound = async {
                let tag_id = client.get_or_create_tag(tag, "app").await?;
                client.bind_tag_to_app(app_id, &tag_id).await
            }
            .await;
            match bound {
                Ok(()) => println!("    Tagged with '{}'", tag),
                Err(err) => eprintln!("    Failed to tag: {}", err),
            }
        }
    }
    Ok(())
}

async fn import_parallel(
    client: &ConsoleClient,
    files: &[PathBuf],
    tag: Option<&str>,
) -> Result<usize, DifyError> {
    let tag_id = match tag {
        Some(tag) => {
            println!("Getting or creating tag '{}'...", tag);
            Some(client.get_or_create_tag(tag, "app").await?)
        }
        None => None,
    };

    println!(
        "Importing {} file(s) in parallel (concurrency={})...",
        files.len(),
        client.max_concurrency()
    );

    let mut contents = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed.yaml")
            .to_string();
        let yaml = tokio::fs::read_to_string(file).await?;
        contents.push((name, yaml));
    }
    let filenames: Vec<String> = contents.iter().map(|(name, _)| name.clone()).collect();

    let results = client.import_apps(contents).await;
    let mut by_name: HashMap<String, Result<AppImportResult, DifyError>> =
        results.into_iter().map(|r| (r.key, r.outcome)).collect();

    let mut imported = 0usize;
    let mut failed = 0usize;
    for filename in &filenames {
        let Some(outcome) = by_name.remove(filename) else {
            continue;
        };
        match outcome {
            Err(err) => {
                eprintln!("  Failed: {} - {}", filename, err);
                failed += 1;
            }
            Ok(result) => {
                let name = result.name.as_deref().unwrap_or(filename);
                let app_id = result.app_id.as_deref().unwrap_or("unknown");
                println!("  Imported: {} ({})", name, app_id);
                imported += 1;

                if let (Some(tag), Some(tag_id)) = (tag, tag_id.as_deref()) {
                    if app_id != "unknown" {
                        match client.bind_tag_to_app(app_id, tag_id).await {
                            Ok(()) => println!("    Tagged with '{}'", tag),
                            Err(err) => eprintln!("    Failed to tag: {}", err),
                        }
                    }
                }
            }
        }
    }

    println!("Done: {} imported, {} failed", imported, failed);
    Ok(failed)
}

async fn delete(
    server: &ServerConfig,
    id: Option<&str>,
    tag: Option<&str>,
    all: bool,
    yes: bool,
    serial: bool,
    concurrency: usize,
) -> Result<ExitCode, DifyError> {
    let client = console_client(server, concurrency)?;

    if let Some(app_id) = id {
        if !yes && !confirm(&format!("Delete app {}?", app_id))? {
            println!("Aborted");
            return Ok(ExitCode::SUCCESS);
        }
        client.login().await?;
        client.delete_app(app_id).await?;
        println!("Deleted app: {}", app_id);
        return Ok(ExitCode::SUCCESS);
    }

    client.login().await?;
    let apps = client.get_apps(tag).await?;
    if apps.is_empty() {
        println!("No apps found to delete");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Apps to be deleted ({}):", apps.len());
    for app in &apps {
        println!("  - {} ({})", app.name, app.id);
    }

    if !yes {
        let prompt = if all {
            format!("Delete ALL {} app(s)? This cannot be undone!", apps.len())
        } else {
            format!(
                "Delete {} app(s) with tag '{}'?",
                apps.len(),
                tag.unwrap_or_default()
            )
        };
        if !confirm(&prompt)? {
            println!("Aborted");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let app_ids: Vec<String> = apps.iter().map(|a| a.id.clone()).collect();

    if serial || app_ids.len() == 1 {
        println!("Deleting {} app(s) serially...", app_ids.len());
        for app_id in &app_ids {
            client.delete_app(app_id).await?;
            println!("  Deleted: {}", app_id);
        }
        println!("Done: {} deleted", app_ids.len());
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "Deleting {} app(s) in parallel (concurrency={})...",
        app_ids.len(),
        concurrency
    );
    let results = client.delete_apps(&app_ids).await;
    let mut by_id: HashMap<String, Result<bool, DifyError>> =
        results.into_iter().map(|r| (r.key, r.outcome)).collect();

    let mut deleted = 0usize;
    let mut failed = 0usize;
    for app_id in &app_ids {
        match by_id.remove(app_id) {
            Some(Ok(_)) => {
                println!("  Deleted: {}", app_id);
                deleted += 1;
            }
            Some(Err(err)) => {
                eprintln!("  Failed: {} - {}", app_id, err);
                failed += 1;
            }
            None => {}
        }
    }
    println!("Done: {} deleted, {} failed", deleted, failed);
    Ok(exit_code(failed))
}
