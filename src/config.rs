//! Configuration loading for server connections.
//!
//! Connection details live in a TOML file with one `[servers.NAME]` table
//! per Dify deployment:
//!
//! ```toml
//! [servers.production]
//! base_url = "https://dify.example.com"
//! email = "admin@example.com"
//! password = "secret"
//! ```
//!
//! [`load_config`] resolves the file from an explicit path, the current
//! directory, or the user config directory, in that order. The config
//! object is constructed once and passed to whatever needs it.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::constants::CONFIG_FILE_NAME;

/// Subdirectory of the user config dir that holds the config file.
const CONFIG_DIR_NAME: &str = "dify-assistant";

/// Errors raised while locating, reading, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file was found at any candidate location.
    #[error("config file not found: {path}")]
    NotFound { path: String },

    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or is missing required fields.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// The config file parsed but defines no servers.
    #[error("no servers defined in config file {path}")]
    NoServers { path: String },

    /// The requested server name does not exist in the config.
    #[error("server '{name}' not found in config (available: {})", .available.join(", "))]
    UnknownServer { name: String, available: Vec<String> },
}

/// Login password, kept out of `Debug` output.
///
/// Config files hold real credentials, so the password never appears in
/// logs or debug formatting. Call [`Password::expose`] at the point of use.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Access the underlying secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Password(value)
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Password(value.to_string())
    }
}

/// Connection details for a single Dify deployment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server name, backfilled from the `[servers.NAME]` table key.
    #[serde(default)]
    pub name: String,
    /// Base URL of the deployment, e.g. `https://dify.example.com`.
    pub base_url: String,
    /// Console login email.
    pub email: String,
    /// Console login password.
    pub password: Password,
}

/// Application configuration: the full set of known servers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Server configurations keyed by name.
    pub servers: HashMap<String, ServerConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: display.clone(),
                }
            } else {
                ConfigError::Read {
                    path: display.clone(),
                    source: e,
                }
            }
        })?;

        warn_if_widely_readable(path);

        let mut config: AppConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: display.clone(),
            source: e,
        })?;

        if config.servers.is_empty() {
            return Err(ConfigError::NoServers { path: display });
        }

        // Table keys are the canonical server names.
        for (name, server) in config.servers.iter_mut() {
            server.name = name.clone();
        }

        Ok(config)
    }

    /// Look up a server by name.
    ///
    /// The error lists the available names so a typo is easy to spot.
    pub fn get_server(&self, name: &str) -> Result<&ServerConfig, ConfigError> {
        self.servers.get(name).ok_or_else(|| {
            let mut available: Vec<String> = self.servers.keys().cloned().collect();
            available.sort();
            ConfigError::UnknownServer {
                name: name.to_string(),
                available,
            }
        })
    }
}

/// Locate and load the config file.
///
/// Tries, in order: the explicit `path` if given, `./app.toml`, then
/// `<user config dir>/dify-assistant/app.toml`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = path {
        return AppConfig::from_file(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return AppConfig::from_file(&local);
    }

    if let Some(dir) = dirs::config_dir() {
        let fallback = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if fallback.exists() {
            return AppConfig::from_file(&fallback);
        }
    }

    Err(ConfigError::NotFound {
        path: CONFIG_FILE_NAME.to_string(),
    })
}

/// Warn when the config file is readable by group or others, since it
/// holds credentials.
#[cfg(unix)]
fn warn_if_widely_readable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o044 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = format!("{:o}", mode & 0o777),
                "config file is readable by other users; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_widely_readable(_path: &Path) {}
