//! Console API models: apps, tags, plugins, uploads, and export artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format version written into plugin export artifacts.
pub const PLUGIN_EXPORT_FORMAT_VERSION: &str = "1.0";

/// One application registered on a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// One page of the console app list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPage {
    #[serde(default)]
    pub data: Vec<AppInfo>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Result record returned by the app-import endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppImportResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_mode: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A tag usable for grouping and filtering apps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub tag_type: String,
}

/// One installed plugin as reported by the console plugin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Installation record ID; older servers call the field `installation_id`.
    #[serde(default, alias = "installation_id")]
    pub id: String,
    /// Plugin ID without version (`author/name`).
    #[serde(default)]
    pub plugin_id: String,
    /// Fully qualified identifier (`author/name:version@hash`).
    #[serde(default)]
    pub plugin_unique_identifier: String,
    #[serde(default = "default_plugin_source")]
    pub source: String,
    #[serde(default)]
    pub version: String,
    /// GitHub source coordinates, present for github-sourced plugins.
    #[serde(default)]
    pub github: Option<Value>,
    /// Installation-time configuration, when the server exposes it.
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub settings: Option<Value>,
}

/// Server response for the plugin list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginListResponse {
    #[serde(default)]
    pub plugins: Vec<PluginInfo>,
}

/// File uploaded through the service file-upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: i64,
}

/// One plugin entry in an export artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginExportEntry {
    /// Plugin ID without version, used as the install key with `--latest`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plugin_unique_identifier: String,
    #[serde(default = "default_plugin_source")]
    pub source: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub installation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl PluginExportEntry {
    /// Build an export entry from a live plugin record.
    pub fn from_plugin(plugin: &PluginInfo, include_config: bool) -> Self {
        let config = if include_config {
            plugin.config.clone().or_else(|| plugin.settings.clone())
        } else {
            None
        };
        Self {
            name: plugin.plugin_id.clone(),
            plugin_unique_identifier: plugin.plugin_unique_identifier.clone(),
            source: plugin.source.clone(),
            version: plugin.version.clone(),
            installation_id: plugin.id.clone(),
            github: plugin.github.clone(),
            config,
        }
    }

    /// Identifier to install: the exact exported version, or the bare
    /// plugin name when the caller wants the latest version resolved
    /// server-side.
    pub fn install_identifier(&self, latest: bool) -> String {
        if latest {
            return self.name.clone();
        }
        if !self.plugin_unique_identifier.is_empty() {
            self.plugin_unique_identifier.clone()
        } else if !self.version.is_empty() {
            format!("{}:{}", self.name, self.version)
        } else {
            self.name.clone()
        }
    }
}

/// Export artifact written by `plugin export` and read by `plugin import`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginExportFile {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub source_server: String,
    #[serde(default)]
    pub include_config: bool,
    #[serde(default)]
    pub plugins: Vec<PluginExportEntry>,
}

impl PluginExportFile {
    pub fn new(source_server: impl Into<String>, include_config: bool) -> Self {
        Self {
            version: PLUGIN_EXPORT_FORMAT_VERSION.to_string(),
            exported_at: Utc::now(),
            source_server: source_server.into(),
            include_config,
            plugins: Vec::new(),
        }
    }
}

fn default_plugin_source() -> String {
    "marketplace".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plugin_info_installation_id_alias() {
        let plugin: PluginInfo = serde_json::from_value(json!({
            "installation_id": "inst-1",
            "plugin_id": "langgenius/openai",
            "plugin_unique_identifier": "langgenius/openai:0.2.1@abc",
            "version": "0.2.1"
        }))
        .unwrap();
        assert_eq!(plugin.id, "inst-1");
        assert_eq!(plugin.source, "marketplace");
    }

    #[test]
    fn test_export_entry_from_plugin() {
        let plugin: PluginInfo = serde_json::from_value(json!({
            "id": "inst-2",
            "plugin_id": "langgenius/tavily",
            "plugin_unique_identifier": "langgenius/tavily:0.1.4@def",
            "source": "marketplace",
            "version": "0.1.4",
            "settings": {"api_key": "sk-xxx"}
        }))
        .unwrap();

        let entry = PluginExportEntry::from_plugin(&plugin, false);
        assert_eq!(entry.name, "langgenius/tavily");
        assert_eq!(entry.installation_id, "inst-2");
        assert!(entry.config.is_none());

        // With config requested, `settings` backs an absent `config` field.
        let entry = PluginExportEntry::from_plugin(&plugin, true);
        assert_eq!(entry.config, Some(json!({"api_key": "sk-xxx"})));
    }

    #[test]
    fn test_install_identifier_resolution() {
        let entry = PluginExportEntry {
            name: "langgenius/openai".to_string(),
            plugin_unique_identifier: "langgenius/openai:0.2.1@abc".to_string(),
            source: "marketplace".to_string(),
            version: "0.2.1".to_string(),
            installation_id: "inst-1".to_string(),
            github: None,
            config: None,
        };
        assert_eq!(
            entry.install_identifier(false),
            "langgenius/openai:0.2.1@abc"
        );
        assert_eq!(entry.install_identifier(true), "langgenius/openai");

        let bare = PluginExportEntry {
            plugin_unique_identifier: String::new(),
            ..entry.clone()
        };
        assert_eq!(bare.install_identifier(false), "langgenius/openai:0.2.1");

        let nameless = PluginExportEntry {
            plugin_unique_identifier: String::new(),
            version: String::new(),
            ..entry
        };
        assert_eq!(nameless.install_identifier(false), "langgenius/openai");
    }

    #[test]
    fn test_export_file_roundtrip() {
        let mut file = PluginExportFile::new("production", false);
        file.plugins.push(PluginExportEntry {
            name: "langgenius/openai".to_string(),
            plugin_unique_identifier: "langgenius/openai:0.2.1@abc".to_string(),
            source: "marketplace".to_string(),
            version: "0.2.1".to_string(),
            installation_id: "inst-1".to_string(),
            github: None,
            config: None,
        });

        let text = serde_json::to_string_pretty(&file).unwrap();
        let parsed: PluginExportFile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.version, PLUGIN_EXPORT_FORMAT_VERSION);
        assert_eq!(parsed.plugins.len(), 1);
        assert_eq!(parsed.source_server, "production");
    }

    #[test]
    fn test_app_page_defaults() {
        let page: AppPage = serde_json::from_value(json!({
            "data": [{"id": "app-1", "name": "Helper"}]
        }))
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].mode, "");
        assert!(!page.has_more);
    }
}
