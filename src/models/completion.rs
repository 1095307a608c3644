//! Completion (text-generation) API models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{InputFile, ResponseMetadata, ResponseMode};
use super::is_none_or_empty_vec;
use crate::error::ApiError;

/// Request body for the completion-message endpoint.
///
/// Completion apps read their prompt from `inputs` (conventionally the
/// `query` key), not from a top-level field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub inputs: HashMap<String, Value>,
    pub response_mode: ResponseMode,
    pub user: String,
    #[serde(skip_serializing_if = "is_none_or_empty_vec")]
    pub files: Option<Vec<InputFile>>,
}

impl CompletionRequest {
    pub fn new(inputs: HashMap<String, Value>, user: impl Into<String>) -> Self {
        Self {
            inputs,
            response_mode: ResponseMode::default(),
            user: user.into(),
            files: None,
        }
    }

    /// Attach files for multimodal input.
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

/// Blocking-mode response from the completion-message endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub message_id: String,
    pub mode: String,
    pub answer: String,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completion_request_serialization() {
        let mut inputs = HashMap::new();
        inputs.insert("query".to_string(), json!("Write a haiku"));
        let request = CompletionRequest::new(inputs, "user-123");

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["inputs"]["query"], json!("Write a haiku"));
        assert_eq!(value["response_mode"], json!("streaming"));
        assert!(value.get("files").is_none());
    }

    #[test]
    fn test_completion_request_requires_user() {
        let err = CompletionRequest::new(HashMap::new(), "")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn test_completion_response_decodes() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "message_id": "msg-9",
            "mode": "completion",
            "answer": "An old silent pond...",
            "metadata": {},
            "created_at": 1_705_000_000
        }))
        .unwrap();
        assert_eq!(response.mode, "completion");
    }
}
