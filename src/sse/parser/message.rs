//! Message-family event parsing.
//!
//! Covers the chat-stream events: answer deltas (`message`,
//! `agent_message`, `message_replace`), the terminal `message_end`,
//! produced files, and agent reasoning steps.

use serde_json::Value;

use crate::sse::events::StreamEvent;
use crate::sse::payloads::{
    AgentThoughtPayload, MessageEndPayload, MessageFilePayload, MessagePayload,
};

/// Parse the three answer-delta kinds, which share one payload shape.
pub(super) fn parse_message_event(kind: &str, value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: MessagePayload = serde_json::from_value(value)?;
    let event = match kind {
        "agent_message" => StreamEvent::AgentMessage {
            task_id: payload.task_id,
            message_id: payload.message_id,
            conversation_id: payload.conversation_id,
            answer: payload.answer,
            created_at: payload.created_at,
        },
        "message_replace" => StreamEvent::MessageReplace {
            task_id: payload.task_id,
            message_id: payload.message_id,
            conversation_id: payload.conversation_id,
            answer: payload.answer,
            created_at: payload.created_at,
        },
        _ => StreamEvent::Message {
            task_id: payload.task_id,
            message_id: payload.message_id,
            conversation_id: payload.conversation_id,
            answer: payload.answer,
            created_at: payload.created_at,
        },
    };
    Ok(event)
}

pub(super) fn parse_message_end_event(value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: MessageEndPayload = serde_json::from_value(value)?;
    Ok(StreamEvent::MessageEnd {
        task_id: payload.task_id,
        message_id: payload.message_id,
        conversation_id: payload.conversation_id,
        metadata: payload.metadata,
    })
}

pub(super) fn parse_message_file_event(value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: MessageFilePayload = serde_json::from_value(value)?;
    Ok(StreamEvent::MessageFile {
        id: payload.id,
        file_type: payload.file_type,
        belongs_to: payload.belongs_to,
        url: payload.url,
        conversation_id: payload.conversation_id,
    })
}

pub(super) fn parse_agent_thought_event(value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: AgentThoughtPayload = serde_json::from_value(value)?;
    Ok(StreamEvent::AgentThought {
        id: payload.id,
        task_id: payload.task_id,
        message_id: payload.message_id,
        position: payload.position,
        thought: payload.thought,
        observation: payload.observation,
        tool: payload.tool,
        tool_input: payload.tool_input,
        created_at: payload.created_at,
        message_files: payload.message_files,
        conversation_id: payload.conversation_id,
    })
}
