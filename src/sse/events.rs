//! SSE event types and definitions
//!
//! Contains the StreamEvent enum with all event variants the service can
//! emit on a chat, completion, or workflow stream.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{RetrieverResource, Usage};

/// Typed SSE events from the service streaming API.
///
/// The discriminator is the SSE `event:` field (or, for servers that leave
/// it undeclared, the `event` key inside the JSON payload). Unknown kinds
/// degrade to [`StreamEvent::Ping`] during parsing instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental answer text chunk
    Message {
        task_id: String,
        message_id: String,
        conversation_id: Option<String>,
        answer: String,
        created_at: i64,
    },
    /// Terminal event of a message stream, carries final metadata
    MessageEnd {
        task_id: String,
        message_id: String,
        conversation_id: Option<String>,
        metadata: Map<String, Value>,
    },
    /// File produced while answering (e.g. generated image)
    MessageFile {
        id: String,
        #[serde(rename = "type")]
        file_type: String,
        belongs_to: String,
        url: String,
        conversation_id: Option<String>,
    },
    /// Replaces the concatenation of all prior chunks for this message
    MessageReplace {
        task_id: String,
        message_id: String,
        conversation_id: Option<String>,
        answer: String,
        created_at: i64,
    },
    /// Answer delta emitted by agent-mode apps
    AgentMessage {
        task_id: String,
        message_id: String,
        conversation_id: Option<String>,
        answer: String,
        created_at: i64,
    },
    /// Agent reasoning step with tool invocation details
    AgentThought {
        id: String,
        task_id: String,
        message_id: String,
        position: u32,
        thought: String,
        observation: String,
        tool: String,
        tool_input: String,
        created_at: i64,
        message_files: Vec<String>,
        conversation_id: Option<String>,
    },
    /// Base64 audio chunk for text-to-speech
    TtsMessage {
        task_id: String,
        message_id: String,
        audio: String,
        created_at: i64,
    },
    /// End of the text-to-speech audio stream
    TtsMessageEnd {
        task_id: String,
        message_id: String,
        audio: String,
        created_at: i64,
    },
    /// Workflow run started
    WorkflowStarted {
        task_id: String,
        workflow_run_id: String,
        data: Map<String, Value>,
    },
    /// Workflow run finished; status/outputs/error live inside `data`
    WorkflowFinished {
        task_id: String,
        workflow_run_id: String,
        data: Map<String, Value>,
    },
    /// Workflow node started
    NodeStarted {
        task_id: String,
        workflow_run_id: String,
        data: Map<String, Value>,
    },
    /// Workflow node finished
    NodeFinished {
        task_id: String,
        workflow_run_id: String,
        data: Map<String, Value>,
    },
    /// Parallel branch started
    ParallelBranchStarted {
        task_id: String,
        workflow_run_id: String,
        data: Map<String, Value>,
    },
    /// Parallel branch finished
    ParallelBranchFinished {
        task_id: String,
        workflow_run_id: String,
        data: Map<String, Value>,
    },
    /// Error reported inside the stream
    Error {
        task_id: Option<String>,
        message_id: Option<String>,
        status: u16,
        code: String,
        message: String,
    },
    /// Heartbeat/keepalive
    Ping,
}

impl StreamEvent {
    /// Returns the event type name as a string for logging and dispatch.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            StreamEvent::Message { .. } => "message",
            StreamEvent::MessageEnd { .. } => "message_end",
            StreamEvent::MessageFile { .. } => "message_file",
            StreamEvent::MessageReplace { .. } => "message_replace",
            StreamEvent::AgentMessage { .. } => "agent_message",
            StreamEvent::AgentThought { .. } => "agent_thought",
            StreamEvent::TtsMessage { .. } => "tts_message",
            StreamEvent::TtsMessageEnd { .. } => "tts_message_end",
            StreamEvent::WorkflowStarted { .. } => "workflow_started",
            StreamEvent::WorkflowFinished { .. } => "workflow_finished",
            StreamEvent::NodeStarted { .. } => "node_started",
            StreamEvent::NodeFinished { .. } => "node_finished",
            StreamEvent::ParallelBranchStarted { .. } => "parallel_branch_started",
            StreamEvent::ParallelBranchFinished { .. } => "parallel_branch_finished",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Ping => "ping",
        }
    }

    /// Whether this event ends its logical request. The transport may
    /// still deliver further lines (e.g. a TTS tail or a ping) afterwards.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::MessageEnd { .. } | StreamEvent::WorkflowFinished { .. }
        )
    }

    /// Task ID this event belongs to, when it carries one.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Message { task_id, .. }
            | StreamEvent::MessageEnd { task_id, .. }
            | StreamEvent::MessageReplace { task_id, .. }
            | StreamEvent::AgentMessage { task_id, .. }
            | StreamEvent::AgentThought { task_id, .. }
            | StreamEvent::TtsMessage { task_id, .. }
            | StreamEvent::TtsMessageEnd { task_id, .. }
            | StreamEvent::WorkflowStarted { task_id, .. }
            | StreamEvent::WorkflowFinished { task_id, .. }
            | StreamEvent::NodeStarted { task_id, .. }
            | StreamEvent::NodeFinished { task_id, .. }
            | StreamEvent::ParallelBranchStarted { task_id, .. }
            | StreamEvent::ParallelBranchFinished { task_id, .. } => Some(task_id),
            StreamEvent::Error { task_id, .. } => task_id.as_deref(),
            StreamEvent::MessageFile { .. } | StreamEvent::Ping => None,
        }
    }

    /// Answer text delta, for the variants that carry one.
    pub fn answer(&self) -> Option<&str> {
        match self {
            StreamEvent::Message { answer, .. }
            | StreamEvent::MessageReplace { answer, .. }
            | StreamEvent::AgentMessage { answer, .. } => Some(answer),
            _ => None,
        }
    }

    /// Token usage from a `message_end` metadata map, when present and
    /// well-formed.
    pub fn usage(&self) -> Option<Usage> {
        match self {
            StreamEvent::MessageEnd { metadata, .. } => metadata
                .get("usage")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            _ => None,
        }
    }

    /// Knowledge-base citations from a `message_end` metadata map.
    pub fn retriever_resources(&self) -> Option<Vec<RetrieverResource>> {
        match self {
            StreamEvent::MessageEnd { metadata, .. } => metadata
                .get("retriever_resources")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            _ => None,
        }
    }

    /// Decoded audio bytes from a TTS event. The wire carries audio as
    /// base64; `None` for non-TTS events or undecodable audio.
    pub fn audio_bytes(&self) -> Option<Vec<u8>> {
        match self {
            StreamEvent::TtsMessage { audio, .. } | StreamEvent::TtsMessageEnd { audio, .. } => {
                STANDARD.decode(audio).ok()
            }
            _ => None,
        }
    }
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: message")
    Event(String),
    /// Data payload (e.g., "data: {\"answer\": \"hello\"}")
    Data(String),
    /// Event ID used for resume bookkeeping (e.g., "id: abc123")
    Id(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment line or unrecognized field - ignored
    Comment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_end_with(metadata: Value) -> StreamEvent {
        let Value::Object(map) = metadata else {
            panic!("metadata must be an object");
        };
        StreamEvent::MessageEnd {
            task_id: "task-1".to_string(),
            message_id: "msg-1".to_string(),
            conversation_id: Some("conv-1".to_string()),
            metadata: map,
        }
    }

    #[test]
    fn test_event_type_name() {
        let event = StreamEvent::Message {
            task_id: "task-1".to_string(),
            message_id: "msg-1".to_string(),
            conversation_id: None,
            answer: "Hi".to_string(),
            created_at: 1_705_000_000,
        };
        assert_eq!(event.event_type_name(), "message");
        assert_eq!(StreamEvent::Ping.event_type_name(), "ping");
    }

    #[test]
    fn test_terminal_events() {
        assert!(message_end_with(json!({})).is_terminal());
        let finished = StreamEvent::WorkflowFinished {
            task_id: "task-1".to_string(),
            workflow_run_id: "run-1".to_string(),
            data: Map::new(),
        };
        assert!(finished.is_terminal());
        assert!(!StreamEvent::Ping.is_terminal());
    }

    #[test]
    fn test_usage_extracted_lazily() {
        let event = message_end_with(json!({
            "usage": {"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}
        }));
        let usage = event.usage().unwrap();
        assert_eq!(usage.total_tokens, 42);

        // Malformed usage block yields None rather than failing.
        let event = message_end_with(json!({"usage": "not-an-object"}));
        assert!(event.usage().is_none());

        assert!(message_end_with(json!({})).usage().is_none());
    }

    #[test]
    fn test_retriever_resources_extracted_lazily() {
        let event = message_end_with(json!({
            "retriever_resources": [{
                "position": 1,
                "dataset_id": "ds-1",
                "dataset_name": "Docs",
                "document_id": "doc-1",
                "document_name": "guide.md",
                "segment_id": "seg-1",
                "score": 0.87,
                "content": "cited text"
            }]
        }));
        let resources = event.retriever_resources().unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].dataset_name, "Docs");
    }

    #[test]
    fn test_answer_accessor() {
        let event = StreamEvent::AgentMessage {
            task_id: "task-1".to_string(),
            message_id: "msg-1".to_string(),
            conversation_id: None,
            answer: "chunk".to_string(),
            created_at: 0,
        };
        assert_eq!(event.answer(), Some("chunk"));
        assert!(StreamEvent::Ping.answer().is_none());
    }

    #[test]
    fn test_audio_bytes_decoded_from_base64() {
        let event = StreamEvent::TtsMessage {
            task_id: "task-1".to_string(),
            message_id: "msg-1".to_string(),
            audio: STANDARD.encode(b"RIFF"),
            created_at: 0,
        };
        assert_eq!(event.audio_bytes(), Some(b"RIFF".to_vec()));

        let bad = StreamEvent::TtsMessage {
            task_id: "task-1".to_string(),
            message_id: "msg-1".to_string(),
            audio: "!!not-base64!!".to_string(),
            created_at: 0,
        };
        assert!(bad.audio_bytes().is_none());
        assert!(StreamEvent::Ping.audio_bytes().is_none());
    }

    #[test]
    fn test_serializes_with_event_tag() {
        let event = StreamEvent::MessageFile {
            id: "file-1".to_string(),
            file_type: "image".to_string(),
            belongs_to: "assistant".to_string(),
            url: "/files/file-1".to_string(),
            conversation_id: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], json!("message_file"));
        assert_eq!(value["type"], json!("image"));
    }
}
