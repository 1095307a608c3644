//! Chat API request and response models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{InputFile, ResponseMetadata, ResponseMode, RetrieverResource};
use super::{is_none_or_empty, is_none_or_empty_vec};
use crate::error::ApiError;

/// Request body for the chat-message endpoint.
///
/// An absent or empty `conversation_id` starts a new conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub query: String,
    pub inputs: HashMap<String, Value>,
    pub response_mode: ResponseMode,
    pub user: String,
    #[serde(skip_serializing_if = "is_none_or_empty")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "is_none_or_empty_vec")]
    pub files: Option<Vec<InputFile>>,
    pub auto_generate_name: bool,
}

impl ChatRequest {
    /// Minimal request: new conversation, no inputs, auto-named.
    pub fn new(query: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            inputs: HashMap::new(),
            response_mode: ResponseMode::default(),
            user: user.into(),
            conversation_id: None,
            files: None,
            auto_generate_name: true,
        }
    }

    /// Continue an existing conversation.
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Set an application input variable.
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    /// Attach files for multimodal input.
    pub fn with_files(mut self, files: Vec<InputFile>) -> Self {
        self.files = Some(files);
        self
    }

    /// Keep the conversation title unchanged instead of auto-generating one.
    pub fn without_auto_name(mut self) -> Self {
        self.auto_generate_name = false;
        self
    }

    /// Structural checks performed before the request is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.query.is_empty() {
            return Err(ApiError::Validation {
                message: "query must not be empty".to_string(),
            });
        }
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

/// Blocking-mode response from the chat-message endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message_id: String,
    pub conversation_id: String,
    pub mode: String,
    pub answer: String,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    pub created_at: i64,
}

/// One message in a conversation's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    pub query: String,
    pub answer: String,
    #[serde(default)]
    pub message_files: Vec<Value>,
    #[serde(default)]
    pub feedback: Option<Value>,
    #[serde(default)]
    pub retriever_resources: Option<Vec<RetrieverResource>>,
    pub created_at: i64,
}

/// One conversation in the conversation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    pub status: String,
    #[serde(default)]
    pub introduction: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::FileType;
    use serde_json::json;

    #[test]
    fn test_chat_request_minimal_serialization() {
        let request = ChatRequest::new("Hello", "user-123");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "Hello",
                "inputs": {},
                "response_mode": "streaming",
                "user": "user-123",
                "auto_generate_name": true
            })
        );
    }

    #[test]
    fn test_chat_request_empty_conversation_id_omitted() {
        let request = ChatRequest::new("Hello", "user-123").with_conversation("");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("conversation_id").is_none());

        let request = ChatRequest::new("Hello", "user-123").with_conversation("conv-1");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["conversation_id"], json!("conv-1"));
    }

    #[test]
    fn test_chat_request_with_files() {
        let request = ChatRequest::new("Describe this", "user-123")
            .with_files(vec![InputFile::remote_url(
                FileType::Image,
                "https://example.com/a.png",
            )])
            .with_input("topic", json!("animals"));
        assert!(request.validate().is_ok());

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["files"][0]["transfer_method"], json!("remote_url"));
        assert_eq!(value["inputs"]["topic"], json!("animals"));
    }

    #[test]
    fn test_chat_request_validation_rejects_empty_query() {
        let err = ChatRequest::new("", "user-123").validate().unwrap_err();
        assert!(err.to_string().contains("query"));

        let err = ChatRequest::new("Hi", "").validate().unwrap_err();
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn test_chat_response_decodes_without_metadata() {
        let response: ChatResponse = serde_json::from_value(json!({
            "message_id": "msg-1",
            "conversation_id": "conv-1",
            "mode": "chat",
            "answer": "Hello!",
            "created_at": 1_705_000_000
        }))
        .unwrap();
        assert_eq!(response.answer, "Hello!");
        assert!(response.metadata.usage.is_none());
    }

    #[test]
    fn test_conversation_info_introduction_defaults_empty() {
        let info: ConversationInfo = serde_json::from_value(json!({
            "id": "conv-1",
            "name": "Support chat",
            "status": "normal",
            "created_at": 1_705_000_000,
            "updated_at": 1_705_000_100
        }))
        .unwrap();
        assert_eq!(info.introduction, "");
        assert!(info.inputs.is_empty());
    }
}
