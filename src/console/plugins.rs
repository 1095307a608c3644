//! Console plugin operations and the upgrade sequencer.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::constants::PLUGIN_MARKETPLACE_CONCURRENCY;
use crate::error::{ApiError, DifyError, ResourceKind};
use crate::models::{PluginInfo, PluginListResponse};

use super::{run_batch, BatchItemResult, ConsoleClient};

impl ConsoleClient {
    /// List all plugins installed in the current workspace.
    pub async fn get_plugins(&self) -> Result<Vec<PluginInfo>, DifyError> {
        let response: PluginListResponse = self
            .get("/console/api/workspaces/current/plugin/list", &[])
            .await?;
        Ok(response.plugins)
    }

    /// Install plugins from the marketplace by unique identifier
    /// (`org/name:version`, or `org/name` for the latest version).
    pub async fn install_plugin_from_marketplace(
        &self,
        plugin_unique_identifiers: &[String],
    ) -> Result<Value, DifyError> {
        tracing::debug!(?plugin_unique_identifiers, "installing plugins from marketplace");
        self.post(
            "/console/api/workspaces/current/plugin/install/marketplace",
            &json!({ "plugin_unique_identifiers": plugin_unique_identifiers }),
        )
        .await
    }

    /// Install a plugin from a GitHub release.
    pub async fn install_plugin_from_github(
        &self,
        plugin_unique_identifier: &str,
        repo: &str,
        version: &str,
        package: &str,
    ) -> Result<Value, DifyError> {
        tracing::debug!(repo, version, "installing plugin from GitHub");
        self.post(
            "/console/api/workspaces/current/plugin/install/github",
            &json!({
                "plugin_unique_identifier": plugin_unique_identifier,
                "repo": repo,
                "version": version,
                "package": package,
            }),
        )
        .await
    }

    /// Uninstall a plugin by its installation ID.
    pub async fn uninstall_plugin(
        &self,
        plugin_installation_id: &str,
    ) -> Result<Value, DifyError> {
        let result = self
            .post(
                "/console/api/workspaces/current/plugin/uninstall",
                &json!({ "plugin_installation_id": plugin_installation_id }),
            )
            .await?;
        tracing::info!(plugin_installation_id, "uninstalled plugin");
        Ok(result)
    }

    /// List pending plugin installation tasks.
    ///
    /// The endpoint has returned both a bare array and a `{"tasks": []}`
    /// envelope; both shapes are accepted.
    pub async fn get_plugin_tasks(&self) -> Result<Vec<Value>, DifyError> {
        let data: Value = self
            .get("/console/api/workspaces/current/plugin/tasks", &[])
            .await?;
        let tasks = match data {
            Value::Array(tasks) => tasks,
            Value::Object(mut map) => match map.remove("tasks") {
                Some(Value::Array(tasks)) => tasks,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(tasks)
    }

    /// Replace a plugin instance's configuration.
    pub async fn update_plugin_config(
        &self,
        plugin_installation_id: &str,
        config: &Value,
    ) -> Result<Value, DifyError> {
        tracing::debug!(plugin_installation_id, "updating plugin config");
        self.put(
            &format!(
                "/console/api/workspaces/current/plugin/instances/{}/config",
                plugin_installation_id
            ),
            config,
        )
        .await
    }

    /// Look up a plugin's latest published version on the marketplace.
    ///
    /// Returns `None` when the response carries no version. This call is
    /// unauthenticated and does not count against the console
    /// concurrency gate, since it targets a different host.
    pub async fn fetch_latest_plugin_version(
        &self,
        plugin_id: &str,
    ) -> Result<Option<String>, DifyError> {
        let response = self
            .http
            .get(self.marketplace_url(&format!("/api/v1/plugins/{}", plugin_id)))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status.as_u16(), &body)
                .for_resource(ResourceKind::Plugin)
                .into());
        }

        // The payload shape has varied across marketplace versions;
        // probe the known locations.
        let body: Value = response.json().await?;
        let latest = body
            .pointer("/data/plugin/latest_version")
            .or_else(|| body.pointer("/data/latest_version"))
            .or_else(|| body.get("latest_version"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);
        Ok(latest)
    }

    /// Upgrade marketplace plugins to their latest versions.
    ///
    /// Latest versions are resolved first in their own bounded fan-out
    /// (the marketplace tolerates little concurrency), then each plugin
    /// is uninstalled and reinstalled at the new version under the
    /// general concurrency cap. A plugin whose version lookup failed is
    /// reported failed without touching its installation. Success
    /// values carry the identifier that was installed.
    pub async fn upgrade_plugins(
        &self,
        plugins: &[PluginInfo],
    ) -> Vec<BatchItemResult<String>> {
        tracing::info!(count = plugins.len(), "upgrading plugins");

        let lookup_items: Vec<(String, String)> = plugins
            .iter()
            .map(|p| (p.plugin_id.clone(), p.plugin_id.clone()))
            .collect();
        let lookup_client = self.clone();
        let lookups = run_batch(
            lookup_items,
            move |_key, plugin_id: String| {
                let client = lookup_client.clone();
                async move { client.fetch_latest_plugin_version(&plugin_id).await }
            },
            PLUGIN_MARKETPLACE_CONCURRENCY,
        )
        .await;
        let latest_by_id: HashMap<String, Option<String>> = lookups
            .into_iter()
            .map(|r| (r.key, r.outcome.ok().flatten()))
            .collect();

        let items: Vec<(String, PluginInfo)> = plugins
            .iter()
            .map(|p| (p.plugin_id.clone(), p.clone()))
            .collect();
        let client = self.clone();
        run_batch(
            items,
            move |key, plugin: PluginInfo| {
                let client = client.clone();
                let target_version = latest_by_id.get(&key).cloned().flatten();
                async move { client.upgrade_plugin(plugin, target_version).await }
            },
            self.max_concurrency,
        )
        .await
    }

    /// Uninstall-then-install one plugin as a single logical step.
    ///
    /// If the install of the new version fails after the uninstall
    /// succeeded, one compensating reinstall of the original identifier
    /// is attempted; the upgrade is reported failed either way, and a
    /// failed compensation is logged loudly since the plugin may then
    /// be in neither state.
    async fn upgrade_plugin(
        &self,
        plugin: PluginInfo,
        target_version: Option<String>,
    ) -> Result<String, DifyError> {
        let version = target_version.ok_or_else(|| {
            DifyError::from(ApiError::NotFound {
                resource: ResourceKind::Plugin,
                message: format!("no marketplace version found for {}", plugin.plugin_id),
            })
        })?;

        if plugin.id.is_empty() {
            return Err(ApiError::Validation {
                message: format!("plugin {} has no installation id", plugin.plugin_id),
            }
            .into());
        }

        let target = format!("{}:{}", plugin.plugin_id, version);

        // Nothing to do when the marketplace has no newer version.
        if plugin.version == version {
            tracing::debug!(plugin_id = %plugin.plugin_id, version = %version, "plugin already at latest version");
            return Ok(target);
        }

        let original = if !plugin.plugin_unique_identifier.is_empty() {
            plugin.plugin_unique_identifier.clone()
        } else if !plugin.version.is_empty() {
            format!("{}:{}", plugin.plugin_id, plugin.version)
        } else {
            plugin.plugin_id.clone()
        };

        self.uninstall_plugin(&plugin.id).await?;

        match self
            .install_plugin_from_marketplace(std::slice::from_ref(&target))
            .await
        {
            Ok(_) => {
                tracing::info!(plugin_id = %plugin.plugin_id, version = %version, "upgraded plugin");
                Ok(target)
            }
            Err(install_err) => {
                tracing::warn!(
                    plugin_id = %plugin.plugin_id,
                    error = %install_err,
                    "install of new version failed, reinstalling original"
                );
                if let Err(rollback_err) = self
                    .install_plugin_from_marketplace(std::slice::from_ref(&original))
                    .await
                {
                    tracing::error!(
                        plugin_id = %plugin.plugin_id,
                        error = %rollback_err,
                        "rollback reinstall failed; plugin may be left uninstalled"
                    );
                }
                Err(install_err)
            }
        }
    }
}
