//! Console app and tag operations.

use serde_json::{json, Value};

use crate::constants::DEFAULT_PAGE_LIMIT;
use crate::error::{ApiError, DifyError, ResourceKind};
use crate::models::{AppImportResult, AppInfo, AppPage, Tag};

use super::{run_batch, BatchItemResult, ConsoleClient};

impl ConsoleClient {
    /// List all tags of the given type (`"app"` for app tags).
    ///
    /// Deployments have returned both a bare array and a `{"data": []}`
    /// envelope here; both shapes are accepted.
    pub async fn get_tags(&self, tag_type: &str) -> Result<Vec<Tag>, DifyError> {
        let data: Value = self
            .get("/console/api/tags", &[("type", tag_type.to_string())])
            .await?;
        let tags = if data.is_array() {
            data
        } else {
            data.get("data").cloned().unwrap_or_else(|| json!([]))
        };
        serde_json::from_value(tags).map_err(DifyError::from)
    }

    /// Resolve a tag name to its ID, if the tag exists.
    pub async fn get_tag_id_by_name(
        &self,
        tag_name: &str,
        tag_type: &str,
    ) -> Result<Option<String>, DifyError> {
        let tags = self.get_tags(tag_type).await?;
        Ok(tags.into_iter().find(|t| t.name == tag_name).map(|t| t.id))
    }

    /// Create a new tag.
    pub async fn create_tag(&self, name: &str, tag_type: &str) -> Result<Tag, DifyError> {
        self.post(
            "/console/api/tags",
            &json!({ "name": name, "type": tag_type }),
        )
        .await
    }

    /// Resolve a tag name to an ID, creating the tag if necessary.
    pub async fn get_or_create_tag(
        &self,
        name: &str,
        tag_type: &str,
    ) -> Result<String, DifyError> {
        if let Some(id) = self.get_tag_id_by_name(name, tag_type).await? {
            tracing::debug!(tag = name, id = %id, "found existing tag");
            return Ok(id);
        }

        let tag = self.create_tag(name, tag_type).await?;
        tracing::info!(tag = name, id = %tag.id, "created new tag");
        Ok(tag.id)
    }

    /// Attach a tag to an app.
    pub async fn bind_tag_to_app(&self, app_id: &str, tag_id: &str) -> Result<(), DifyError> {
        let _: Value = self
            .post(
                "/console/api/tag-bindings/create",
                &json!({ "tag_ids": [tag_id], "target_id": app_id, "type": "app" }),
            )
            .await?;
        tracing::debug!(app_id, tag_id, "bound tag to app");
        Ok(())
    }

    /// List all apps, walking every page.
    ///
    /// An unknown `tag` filter logs a warning and returns the unfiltered
    /// list rather than failing.
    pub async fn get_apps(&self, tag: Option<&str>) -> Result<Vec<AppInfo>, DifyError> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", "1".to_string()),
            ("limit", DEFAULT_PAGE_LIMIT.to_string()),
        ];

        if let Some(tag) = tag {
            match self.get_tag_id_by_name(tag, "app").await? {
                Some(tag_id) => query.push(("tag_ids", tag_id)),
                None => {
                    tracing::warn!(tag, "tag not found, ignoring tag filter");
                }
            }
        }

        let mut page_number = 1u32;
        let mut page: AppPage = self.get("/console/api/apps", &query).await?;
        let mut apps = page.data;
        while page.has_more {
            page_number += 1;
            query[0].1 = page_number.to_string();
            page = self.get("/console/api/apps", &query).await?;
            apps.append(&mut page.data);
        }
        Ok(apps)
    }

    /// Fetch one app's info; `None` if it does not exist.
    pub async fn get_app(&self, app_id: &str) -> Result<Option<AppInfo>, DifyError> {
        match self
            .get::<AppInfo>(&format!("/console/api/apps/{}", app_id), &[])
            .await
        {
            Ok(app) => Ok(Some(app)),
            Err(DifyError::Api(ApiError::NotFound { .. })) => Ok(None),
            Err(err) => Err(err.for_resource(ResourceKind::App)),
        }
    }

    /// Export an app's DSL as YAML text.
    pub async fn export_app(
        &self,
        app_id: &str,
        include_secret: bool,
    ) -> Result<String, DifyError> {
        let data: Value = self
            .get(
                &format!("/console/api/apps/{}/export", app_id),
                &[("include_secret", include_secret.to_string())],
            )
            .await
            .map_err(|e| e.for_resource(ResourceKind::App))?;
        Ok(data
            .get("data")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    /// Import an app from YAML DSL text.
    pub async fn import_app(&self, yaml_content: &str) -> Result<AppImportResult, DifyError> {
        self.post(
            "/console/api/apps/imports",
            &json!({ "mode": "yaml-content", "yaml_content": yaml_content }),
        )
        .await
    }

    /// Delete an app by ID.
    pub async fn delete_app(&self, app_id: &str) -> Result<bool, DifyError> {
        let _: Value = self
            .delete(&format!("/console/api/apps/{}", app_id))
            .await
            .map_err(|e| e.for_resource(ResourceKind::App))?;
        tracing::info!(app_id, "deleted app");
        Ok(true)
    }

    // === Batch operations ===

    /// Export many apps concurrently; results carry the YAML per app ID.
    pub async fn export_apps(
        &self,
        app_ids: &[String],
        include_secret: bool,
    ) -> Vec<BatchItemResult<String>> {
        tracing::info!(
            count = app_ids.len(),
            max_concurrency = self.max_concurrency,
            "exporting apps"
        );
        let items: Vec<(String, String)> =
            app_ids.iter().map(|id| (id.clone(), id.clone())).collect();
        let client = self.clone();
        run_batch(
            items,
            move |_key, app_id: String| {
                let client = client.clone();
                async move { client.export_app(&app_id, include_secret).await }
            },
            self.max_concurrency,
        )
        .await
    }

    /// Import many apps concurrently from `(filename, yaml)` pairs.
    pub async fn import_apps(
        &self,
        files: Vec<(String, String)>,
    ) -> Vec<BatchItemResult<AppImportResult>> {
        tracing::info!(
            count = files.len(),
            max_concurrency = self.max_concurrency,
            "importing apps"
        );
        let client = self.clone();
        run_batch(
            files,
            move |_key, yaml: String| {
                let client = client.clone();
                async move { client.import_app(&yaml).await }
            },
            self.max_concurrency,
        )
        .await
    }

    /// Fetch info for many apps concurrently.
    pub async fn get_apps_info(
        &self,
        app_ids: &[String],
    ) -> Vec<BatchItemResult<Option<AppInfo>>> {
        let items: Vec<(String, String)> =
            app_ids.iter().map(|id| (id.clone(), id.clone())).collect();
        let client = self.clone();
        run_batch(
            items,
            move |_key, app_id: String| {
                let client = client.clone();
                async move { client.get_app(&app_id).await }
            },
            self.max_concurrency,
        )
        .await
    }

    /// Delete many apps concurrently.
    pub async fn delete_apps(&self, app_ids: &[String]) -> Vec<BatchItemResult<bool>> {
        tracing::info!(
            count = app_ids.len(),
            max_concurrency = self.max_concurrency,
            "deleting apps"
        );
        let items: Vec<(String, String)> =
            app_ids.iter().map(|id| (id.clone(), id.clone())).collect();
        let client = self.clone();
        run_batch(
            items,
            move |_key, app_id: String| {
                let client = client.clone();
                async move { client.delete_app(&app_id).await }
            },
            self.max_concurrency,
        )
        .await
    }
}
