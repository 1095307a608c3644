//! Shared data types used across the service APIs.
//!
//! Response modes, ratings, file descriptors, token usage, and citation
//! records appear in several request and response shapes; they live here so
//! the chat, completion, and workflow models can share them.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// How the service should deliver a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Wait for the complete answer and return one JSON document.
    Blocking,
    /// Deliver the answer incrementally over an SSE stream.
    #[default]
    Streaming,
}

/// Feedback rating for a message.
///
/// The service expects the literal string `"null"` to revoke a prior
/// rating, not a JSON null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Like,
    Dislike,
    Null,
}

/// Kind of an input file attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Document,
    Audio,
    Video,
}

/// How an input file reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    /// The service fetches the file from a URL.
    RemoteUrl,
    /// The file was uploaded beforehand and is referenced by ID.
    LocalFile,
}

/// A file attached to a chat, completion, or workflow request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub transfer_method: TransferMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_file_id: Option<String>,
}

impl InputFile {
    /// File the service fetches from a remote URL.
    pub fn remote_url(file_type: FileType, url: impl Into<String>) -> Self {
        Self {
            file_type,
            transfer_method: TransferMethod::RemoteUrl,
            url: Some(url.into()),
            upload_file_id: None,
        }
    }

    /// File uploaded beforehand through the file-upload endpoint.
    pub fn local_file(file_type: FileType, upload_file_id: impl Into<String>) -> Self {
        Self {
            file_type,
            transfer_method: TransferMethod::LocalFile,
            url: None,
            upload_file_id: Some(upload_file_id.into()),
        }
    }

    /// Check that the transfer method has its required companion field.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self.transfer_method {
            TransferMethod::RemoteUrl if self.url.as_deref().map_or(true, str::is_empty) => {
                Err(ApiError::Validation {
                    message: "url is required when transfer_method is remote_url".to_string(),
                })
            }
            TransferMethod::LocalFile
                if self.upload_file_id.as_deref().map_or(true, str::is_empty) =>
            {
                Err(ApiError::Validation {
                    message: "upload_file_id is required when transfer_method is local_file"
                        .to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Token usage reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A knowledge-base citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverResource {
    pub position: u32,
    pub dataset_id: String,
    pub dataset_name: String,
    pub document_id: String,
    pub document_name: String,
    pub segment_id: String,
    pub score: f64,
    pub content: String,
}

/// Metadata block attached to blocking responses and `message_end` events.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retriever_resources: Option<Vec<RetrieverResource>>,
}

/// Page envelope returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Acknowledgement returned by the task-stop endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    pub result: String,
}

impl StopResponse {
    /// Whether the service acknowledged the stop.
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }
}

/// Acknowledgement returned by the message-feedback endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub result: String,
}

impl FeedbackResponse {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }
}
