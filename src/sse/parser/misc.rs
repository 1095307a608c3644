//! TTS and error event parsing.

use serde_json::Value;

use crate::sse::events::StreamEvent;
use crate::sse::payloads::{ErrorPayload, TtsPayload};

/// Parse the two TTS kinds, which share one payload shape; end events may
/// omit the audio field.
pub(super) fn parse_tts_event(kind: &str, value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: TtsPayload = serde_json::from_value(value)?;
    let event = if kind == "tts_message_end" {
        StreamEvent::TtsMessageEnd {
            task_id: payload.task_id,
            message_id: payload.message_id,
            audio: payload.audio,
            created_at: payload.created_at,
        }
    } else {
        StreamEvent::TtsMessage {
            task_id: payload.task_id,
            message_id: payload.message_id,
            audio: payload.audio,
            created_at: payload.created_at,
        }
    };
    Ok(event)
}

pub(super) fn parse_error_event(value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: ErrorPayload = serde_json::from_value(value)?;
    Ok(StreamEvent::Error {
        task_id: payload.task_id,
        message_id: payload.message_id,
        status: payload.status,
        code: payload.code,
        message: payload.message,
    })
}
