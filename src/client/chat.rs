//! Chat message endpoints.

use serde_json::json;

use crate::error::DifyError;
use crate::models::{ChatRequest, ChatResponse, FeedbackResponse, Rating, ResponseMode, StopResponse};

use super::{DifyClient, EventStream};

impl DifyClient {
    /// Send a chat message and wait for the complete answer.
    ///
    /// The request is validated locally first and sent in blocking mode
    /// regardless of the mode set on it.
    pub async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse, DifyError> {
        request.validate()?;
        let mut request = request.clone();
        request.response_mode = ResponseMode::Blocking;
        self.post_json("/chat-messages", &request).await
    }

    /// Send a chat message and stream the answer as typed SSE events.
    ///
    /// Yields incremental `message` deltas followed by a terminal
    /// `message_end` carrying usage metadata.
    pub async fn stream_message(&self, request: &ChatRequest) -> Result<EventStream, DifyError> {
        request.validate()?;
        let mut request = request.clone();
        request.response_mode = ResponseMode::Streaming;
        self.start_stream("/chat-messages", &request).await
    }

    /// Stop an in-flight chat generation by its task ID.
    pub async fn stop_message(&self, task_id: &str, user: &str) -> Result<StopResponse, DifyError> {
        self.post_json(
            &format!("/chat-messages/{}/stop", task_id),
            &json!({ "user": user }),
        )
        .await
    }

    /// Rate a message. [`Rating::Null`] revokes previously sent feedback.
    pub async fn send_feedback(
        &self,
        message_id: &str,
        rating: Rating,
        user: &str,
    ) -> Result<FeedbackResponse, DifyError> {
        self.post_json(
            &format!("/messages/{}/feedbacks", message_id),
            &json!({ "rating": rating, "user": user }),
        )
        .await
    }
}
