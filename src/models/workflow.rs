//! Workflow API models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{InputFile, ResponseMode};
use super::is_none_or_empty_vec;
use crate::error::ApiError;

/// Execution status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Succeeded,
    Failed,
    Stopped,
    #[serde(rename = "partial-succeeded")]
    PartialSucceeded,
}

impl WorkflowStatus {
    /// Whether the run has reached a final state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

/// Result record of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowData {
    pub id: String,
    pub workflow_id: String,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub outputs: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub total_steps: u32,
    pub created_at: i64,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

/// Request body for the workflow-run endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRunRequest {
    pub inputs: HashMap<String, Value>,
    pub response_mode: ResponseMode,
    pub user: String,
    #[serde(skip_serializing_if = "is_none_or_empty_vec")]
    pub files: Option<Vec<InputFile>>,
}

impl WorkflowRunRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            inputs: HashMap::new(),
            response_mode: ResponseMode::default(),
            user: user.into(),
            files: None,
        }
    }

    /// Set a workflow input variable.
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    /// Attach files for file-typed workflow variables.
    pub fn with_files(mut self, files: Vec<InputFile>) -> Self {
        self.files = Some(files);
        self
    }

    /// Structural checks performed before the request is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.user.is_empty() {
            return Err(ApiError::Validation {
                message: "user must not be empty".to_string(),
            });
        }
        if let Some(files) = &self.files {
            for file in files {
                file.validate()?;
            }
        }
        Ok(())
    }
}

/// Blocking-mode response from the workflow-run endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunResponse {
    pub workflow_run_id: String,
    pub task_id: String,
    pub data: WorkflowData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_workflow_status_partial_succeeded_rename() {
        let status: WorkflowStatus = serde_json::from_value(json!("partial-succeeded")).unwrap();
        assert_eq!(status, WorkflowStatus::PartialSucceeded);
        assert!(status.is_terminal());
        assert!(!WorkflowStatus::Running.is_terminal());
    }

    #[test]
    fn test_workflow_response_decodes() {
        let response: WorkflowRunResponse = serde_json::from_value(json!({
            "workflow_run_id": "run-1",
            "task_id": "task-1",
            "data": {
                "id": "run-1",
                "workflow_id": "wf-1",
                "status": "succeeded",
                "outputs": {"text": "done"},
                "elapsed_time": 1.25,
                "total_tokens": 42,
                "total_steps": 3,
                "created_at": 1_705_000_000,
                "finished_at": 1_705_000_002
            }
        }))
        .unwrap();
        assert_eq!(response.data.status, WorkflowStatus::Succeeded);
        assert_eq!(response.data.total_steps, 3);
        assert_eq!(
            response.data.outputs.as_ref().unwrap()["text"],
            json!("done")
        );
    }

    #[test]
    fn test_workflow_data_optional_fields_default() {
        let data: WorkflowData = serde_json::from_value(json!({
            "id": "run-2",
            "workflow_id": "wf-1",
            "status": "running",
            "created_at": 1_705_000_000
        }))
        .unwrap();
        assert!(data.outputs.is_none());
        assert_eq!(data.total_steps, 0);
        assert!(data.finished_at.is_none());
    }

    #[test]
    fn test_workflow_request_serialization() {
        let request = WorkflowRunRequest::new("user-123").with_input("city", json!("Oslo"));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["inputs"]["city"], json!("Oslo"));
        assert!(value.get("files").is_none());
    }
}
