//! Text completion endpoints.

use serde_json::json;

use crate::error::DifyError;
use crate::models::{CompletionRequest, CompletionResponse, ResponseMode, StopResponse};

use super::{DifyClient, EventStream};

impl DifyClient {
    /// Run a completion and wait for the full generated text.
    pub async fn send_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, DifyError> {
        request.validate()?;
        let mut request = request.clone();
        request.response_mode = ResponseMode::Blocking;
        self.post_json("/completion-messages", &request).await
    }

    /// Run a completion and stream the generated text as SSE events.
    pub async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<EventStream, DifyError> {
        request.validate()?;
        let mut request = request.clone();
        request.response_mode = ResponseMode::Streaming;
        self.start_stream("/completion-messages", &request).await
    }

    /// Stop an in-flight completion by its task ID.
    pub async fn stop_completion(
        &self,
        task_id: &str,
        user: &str,
    ) -> Result<StopResponse, DifyError> {
        self.post_json(
            &format!("/completion-messages/{}/stop", task_id),
            &json!({ "user": user }),
        )
        .await
    }
}
