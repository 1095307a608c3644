//! Workflow execution endpoints.

use serde_json::json;

use crate::error::DifyError;
use crate::models::{ResponseMode, StopResponse, WorkflowRunRequest, WorkflowRunResponse};

use super::{DifyClient, EventStream};

impl DifyClient {
    /// Run a workflow and wait for its terminal result.
    pub async fn run_workflow(
        &self,
        request: &WorkflowRunRequest,
    ) -> Result<WorkflowRunResponse, DifyError> {
        request.validate()?;
        let mut request = request.clone();
        request.response_mode = ResponseMode::Blocking;
        self.post_json("/workflows/run", &request).await
    }

    /// Run a workflow and stream node-level progress as SSE events.
    ///
    /// Yields `workflow_started`, per-node events, and a terminal
    /// `workflow_finished` carrying the outputs.
    pub async fn stream_workflow(
        &self,
        request: &WorkflowRunRequest,
    ) -> Result<EventStream, DifyError> {
        request.validate()?;
        let mut request = request.clone();
        request.response_mode = ResponseMode::Streaming;
        self.start_stream("/workflows/run", &request).await
    }

    /// Stop an in-flight workflow run by its task ID.
    pub async fn stop_workflow(
        &self,
        task_id: &str,
        user: &str,
    ) -> Result<StopResponse, DifyError> {
        self.post_json(
            &format!("/workflows/tasks/{}/stop", task_id),
            &json!({ "user": user }),
        )
        .await
    }
}
