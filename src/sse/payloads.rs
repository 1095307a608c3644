//! SSE payload deserialization structs
//!
//! Contains internal structs used to deserialize JSON data payloads
//! from the service SSE stream. One struct covers each event family;
//! variant-specific shaping happens in the parser modules.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Payload shared by `message`, `agent_message`, and `message_replace`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessagePayload {
    pub task_id: String,
    pub message_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub answer: String,
    pub created_at: i64,
}

/// Payload of the terminal `message_end` event.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageEndPayload {
    pub task_id: String,
    pub message_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Payload of `message_file` events.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageFilePayload {
    pub id: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub belongs_to: String,
    pub url: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Payload of `agent_thought` events.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AgentThoughtPayload {
    pub id: String,
    pub task_id: String,
    pub message_id: String,
    pub position: u32,
    pub thought: String,
    #[serde(default)]
    pub observation: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub tool_input: String,
    pub created_at: i64,
    #[serde(default)]
    pub message_files: Vec<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Payload shared by `tts_message` and `tts_message_end`; the end event
/// may carry no audio.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TtsPayload {
    pub task_id: String,
    pub message_id: String,
    #[serde(default)]
    pub audio: String,
    pub created_at: i64,
}

/// Payload shared by the six workflow-family events; the service packs
/// everything variant-specific into `data`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkflowEventPayload {
    pub task_id: String,
    pub workflow_run_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Payload of in-stream `error` events. Every field is optional on the
/// wire; missing status defaults to 500.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default = "default_error_status")]
    pub status: u16,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

fn default_error_status() -> u16 {
    500
}
