//! SSE stream parser.
//!
//! Parses the `text/event-stream` framing used by the service streaming
//! API: `field: value` lines accumulated until a blank delimiter line,
//! then decoded into a typed [`StreamEvent`]. The parser is a stateful
//! line accumulator so callers can feed lines as they arrive from the
//! transport, and it keeps resume bookkeeping (`last_event_id`, reconnect
//! attempts) across streams fed through the same instance.

mod message;
mod misc;
mod workflow;

use serde_json::Value;

use crate::error::StreamError;
use crate::sse::events::{SseLine, StreamEvent};

use message::{
    parse_agent_thought_event, parse_message_end_event, parse_message_event,
    parse_message_file_event,
};
use misc::{parse_error_event, parse_tts_event};
use workflow::parse_workflow_event;

/// Event kinds the decoder recognizes. Anything else degrades to `ping`.
const KNOWN_EVENT_TYPES: [&str; 16] = [
    "message",
    "message_end",
    "message_file",
    "message_replace",
    "agent_message",
    "agent_thought",
    "tts_message",
    "tts_message_end",
    "workflow_started",
    "workflow_finished",
    "node_started",
    "node_finished",
    "parallel_branch_started",
    "parallel_branch_finished",
    "error",
    "ping",
];

fn is_known_event_type(event_type: &str) -> bool {
    KNOWN_EVENT_TYPES.contains(&event_type)
}

/// Split a raw SSE line into its field and value.
///
/// Trailing whitespace is stripped first. The line splits on the first
/// colon, and exactly one leading space is removed from the value — per
/// the SSE framing rule, only that first space is insignificant. A line
/// without a colon is treated as a field with an empty value.
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end();
    if line.is_empty() {
        return SseLine::Empty;
    }
    if line.starts_with(':') {
        return SseLine::Comment(line.to_string());
    }

    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };

    match field {
        "event" => SseLine::Event(value.to_string()),
        "data" => SseLine::Data(value.to_string()),
        "id" => SseLine::Id(value.to_string()),
        _ => SseLine::Comment(line.to_string()),
    }
}

/// Decode one joined `data` payload against the known event kinds.
///
/// The declared `event:` type wins when it names a known kind; otherwise
/// the payload's own `event` field is consulted; anything else degrades to
/// [`StreamEvent::Ping`] so unknown kinds never abort a stream. A payload
/// that is not valid JSON, or a known kind whose payload fails structural
/// decoding, is a parse failure carrying the raw text.
pub fn parse_stream_event(event_type: &str, data: &str) -> Result<StreamEvent, StreamError> {
    let value: Value = serde_json::from_str(data).map_err(|e| StreamError::Parse {
        raw: data.to_string(),
        message: format!("invalid JSON in event payload: {}", e),
    })?;

    let effective = if is_known_event_type(event_type) {
        event_type.to_string()
    } else {
        match value.get("event").and_then(|v| v.as_str()) {
            Some(inner) if is_known_event_type(inner) => inner.to_string(),
            _ => {
                tracing::debug!(event_type, "unknown SSE event type, treating as ping");
                return Ok(StreamEvent::Ping);
            }
        }
    };

    let result = match effective.as_str() {
        "message" | "agent_message" | "message_replace" => parse_message_event(&effective, value),
        "message_end" => parse_message_end_event(value),
        "message_file" => parse_message_file_event(value),
        "agent_thought" => parse_agent_thought_event(value),
        "tts_message" | "tts_message_end" => parse_tts_event(&effective, value),
        "workflow_started" | "workflow_finished" | "node_started" | "node_finished"
        | "parallel_branch_started" | "parallel_branch_finished" => {
            parse_workflow_event(&effective, value)
        }
        "error" => parse_error_event(value),
        _ => return Ok(StreamEvent::Ping),
    };

    result.map_err(|e| StreamError::Parse {
        raw: data.to_string(),
        message: format!("invalid '{}' event payload: {}", effective, e),
    })
}

/// Stateful SSE parser that accumulates lines and emits complete events.
///
/// Working state (declared type, pending ID, buffered data lines) is
/// cleared every time an event completes. Session state (`last_event_id`
/// and the reconnect-attempt counter) persists across streams fed through
/// the same instance, so a caller can resume a dropped stream with the
/// service's replay semantics.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Declared type of the event being accumulated; `message` if absent.
    current_event_type: Option<String>,
    /// Pending `id:` value of the event being accumulated.
    current_event_id: Option<String>,
    /// Accumulated data lines (SSE allows multiple `data:` lines).
    data_buffer: Vec<String>,
    /// ID of the most recently completed event.
    last_event_id: Option<String>,
    /// Transport read failures observed since the last completed event.
    reconnect_attempts: u32,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns a complete event when this line closes one.
    ///
    /// A blank line delimits an event, but a blank line with nothing
    /// accumulated is a keep-alive and emits nothing (the declared event
    /// type survives it).
    pub fn feed_line(&mut self, line: &str) -> Result<Option<StreamEvent>, StreamError> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                Ok(None)
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                Ok(None)
            }
            SseLine::Id(id) => {
                self.current_event_id = Some(id);
                Ok(None)
            }
            SseLine::Empty => self.emit_pending(),
            SseLine::Comment(_) => Ok(None),
        }
    }

    /// Flush a trailing event when the line source ends without a final
    /// blank line. Unlike a delimited event this does not touch
    /// `last_event_id` or the reconnect counter.
    pub fn finish(&mut self) -> Result<Option<StreamEvent>, StreamError> {
        if self.data_buffer.is_empty() {
            return Ok(None);
        }
        let event_type = self.current_event_type.take();
        self.current_event_id = None;
        let data = std::mem::take(&mut self.data_buffer).join("\n");
        parse_stream_event(event_type.as_deref().unwrap_or("message"), &data).map(Some)
    }

    /// Record a transport read failure; returns the updated attempt count.
    pub fn record_connection_failure(&mut self) -> u32 {
        self.reconnect_attempts += 1;
        self.reconnect_attempts
    }

    /// ID of the most recently completed event, for resume.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Read failures since the last successfully completed event.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Clear all working and session state back to initial values.
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.current_event_id = None;
        self.data_buffer.clear();
        self.last_event_id = None;
        self.reconnect_attempts = 0;
    }

    fn emit_pending(&mut self) -> Result<Option<StreamEvent>, StreamError> {
        if self.data_buffer.is_empty() {
            return Ok(None);
        }

        let event_type = self.current_event_type.take();
        let data = std::mem::take(&mut self.data_buffer).join("\n");

        // The completed event's ID sticks even if decoding fails below,
        // so a resume replays from the right position.
        if let Some(id) = self.current_event_id.take() {
            if !id.is_empty() {
                self.last_event_id = Some(id);
            }
        }

        let event = parse_stream_event(event_type.as_deref().unwrap_or("message"), &data)?;
        // A completed event is evidence the connection is healthy.
        self.reconnect_attempts = 0;
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut SseParser, lines: &[&str]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for line in lines {
            if let Some(event) = parser.feed_line(line).unwrap() {
                events.push(event);
            }
        }
        events
    }

    // ===================== parse_sse_line =====================

    #[test]
    fn test_parse_sse_line_fields() {
        assert_eq!(
            parse_sse_line("event: message"),
            SseLine::Event("message".to_string())
        );
        assert_eq!(
            parse_sse_line("data: {\"a\": 1}"),
            SseLine::Data("{\"a\": 1}".to_string())
        );
        assert_eq!(parse_sse_line("id: abc123"), SseLine::Id("abc123".to_string()));
        assert_eq!(parse_sse_line(""), SseLine::Empty);
        assert_eq!(parse_sse_line("   "), SseLine::Empty);
    }

    #[test]
    fn test_parse_sse_line_strips_exactly_one_space() {
        // Only the first space after the colon is framing; the rest is value.
        assert_eq!(
            parse_sse_line("data:  two spaces"),
            SseLine::Data(" two spaces".to_string())
        );
        assert_eq!(
            parse_sse_line("data:no space"),
            SseLine::Data("no space".to_string())
        );
    }

    #[test]
    fn test_parse_sse_line_without_colon() {
        // A bare field name is that field with an empty value.
        assert_eq!(parse_sse_line("data"), SseLine::Data(String::new()));
        assert_eq!(parse_sse_line("event"), SseLine::Event(String::new()));
    }

    #[test]
    fn test_parse_sse_line_comments_and_unknown_fields() {
        assert_eq!(
            parse_sse_line(": keep-alive"),
            SseLine::Comment(": keep-alive".to_string())
        );
        assert_eq!(
            parse_sse_line("retry: 3000"),
            SseLine::Comment("retry: 3000".to_string())
        );
    }

    #[test]
    fn test_parse_sse_line_strips_trailing_whitespace() {
        assert_eq!(
            parse_sse_line("data: {\"a\": 1}\r"),
            SseLine::Data("{\"a\": 1}".to_string())
        );
    }

    // ===================== parse_stream_event =====================

    #[test]
    fn test_parse_stream_event_dispatches_on_declared_type() {
        let event = parse_stream_event(
            "message",
            r#"{"task_id":"t1","message_id":"m1","answer":"Hi","created_at":1}"#,
        )
        .unwrap();
        assert_eq!(event.event_type_name(), "message");
    }

    #[test]
    fn test_parse_stream_event_unknown_kind_degrades_to_ping() {
        let event = parse_stream_event("totally_new_kind", r#"{"field": 1}"#).unwrap();
        assert_eq!(event, StreamEvent::Ping);
    }

    #[test]
    fn test_parse_stream_event_internal_event_field_fallback() {
        // Undeclared type, but the payload names a known kind.
        let event = parse_stream_event(
            "unknown",
            r#"{"event":"message","task_id":"t1","message_id":"m1","answer":"Hi","created_at":1}"#,
        )
        .unwrap();
        assert_eq!(event.event_type_name(), "message");

        // Internal field naming an unknown kind still degrades to ping.
        let event = parse_stream_event("unknown", r#"{"event":"mystery"}"#).unwrap();
        assert_eq!(event, StreamEvent::Ping);
    }

    #[test]
    fn test_parse_stream_event_invalid_json_carries_raw() {
        let err = parse_stream_event("message", "not valid json").unwrap_err();
        match err {
            StreamError::Parse { raw, .. } => assert_eq!(raw, "not valid json"),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_stream_event_known_kind_bad_shape_is_parse_error() {
        // Valid JSON, but the message family requires task_id and answer.
        let err = parse_stream_event("message", r#"{"answer": 42}"#).unwrap_err();
        assert!(matches!(err, StreamError::Parse { .. }));
    }

    #[test]
    fn test_parse_stream_event_ping() {
        assert_eq!(parse_stream_event("ping", "{}").unwrap(), StreamEvent::Ping);
    }

    // ===================== SseParser =====================

    #[test]
    fn test_basic_event_emission() {
        let mut parser = SseParser::new();
        assert!(parser.feed_line("event: message").unwrap().is_none());
        assert!(parser
            .feed_line(r#"data: {"task_id":"t1","message_id":"m1","answer":"Hello","created_at":1}"#)
            .unwrap()
            .is_none());

        let event = parser.feed_line("").unwrap().unwrap();
        match event {
            StreamEvent::Message { answer, .. } => assert_eq!(answer, "Hello"),
            other => panic!("Expected Message event, got {:?}", other),
        }
    }

    #[test]
    fn test_event_type_defaults_to_message() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[
                r#"data: {"task_id":"t1","message_id":"m1","answer":"Hi","created_at":1}"#,
                "",
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type_name(), "message");
    }

    #[test]
    fn test_multiple_data_lines_joined_with_newline() {
        // JSON split across two data lines must be reassembled.
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[
                "event: message",
                r#"data: {"task_id":"t1","message_id":"m1","#,
                r#"data: "answer":"Hi","created_at":1}"#,
                "",
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].answer(), Some("Hi"));
    }

    #[test]
    fn test_blank_line_without_data_is_keepalive() {
        let mut parser = SseParser::new();
        assert!(parser.feed_line("").unwrap().is_none());
        assert!(parser.feed_line("").unwrap().is_none());

        // The declared event type survives a dataless delimiter.
        assert!(parser.feed_line("event: message_end").unwrap().is_none());
        assert!(parser.feed_line("").unwrap().is_none());
        let events = feed_all(
            &mut parser,
            &[r#"data: {"task_id":"t1","message_id":"m1"}"#, ""],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type_name(), "message_end");
    }

    #[test]
    fn test_malformed_payload_fails_with_raw_text() {
        let mut parser = SseParser::new();
        parser.feed_line("event: message").unwrap();
        parser.feed_line("data: not json").unwrap();
        let err = parser.feed_line("").unwrap_err();
        match err {
            StreamError::Parse { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_data_line_is_invalid_payload() {
        let mut parser = SseParser::new();
        parser.feed_line("data:").unwrap();
        let err = parser.feed_line("").unwrap_err();
        assert!(matches!(err, StreamError::Parse { .. }));
    }

    #[test]
    fn test_last_event_id_set_when_event_completes() {
        let mut parser = SseParser::new();
        parser.feed_line("id: abc123").unwrap();
        // Not yet completed: the ID is still pending.
        assert!(parser.last_event_id().is_none());

        let events = feed_all(
            &mut parser,
            &[
                r#"data: {"task_id":"t1","message_id":"m1","answer":"Hi","created_at":1}"#,
                "",
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(parser.last_event_id(), Some("abc123"));

        // Subsequent events without an id keep the last one.
        let events = feed_all(
            &mut parser,
            &[
                r#"data: {"task_id":"t1","message_id":"m1","answer":"again","created_at":2}"#,
                "",
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(parser.last_event_id(), Some("abc123"));
    }

    #[test]
    fn test_empty_id_does_not_overwrite_last_event_id() {
        let mut parser = SseParser::new();
        feed_all(
            &mut parser,
            &[
                "id: first",
                r#"data: {"task_id":"t1","message_id":"m1","answer":"a","created_at":1}"#,
                "",
                "id:",
                r#"data: {"task_id":"t1","message_id":"m1","answer":"b","created_at":2}"#,
                "",
            ],
        );
        assert_eq!(parser.last_event_id(), Some("first"));
    }

    #[test]
    fn test_flush_on_end_without_trailing_blank() {
        let mut parser = SseParser::new();
        parser.feed_line("event: message").unwrap();
        parser
            .feed_line(r#"data: {"task_id":"t1","message_id":"m1","answer":"tail","created_at":1}"#)
            .unwrap();

        let event = parser.finish().unwrap().unwrap();
        assert_eq!(event.answer(), Some("tail"));

        // Nothing left: a second finish is a no-op.
        assert!(parser.finish().unwrap().is_none());
    }

    #[test]
    fn test_finish_does_not_touch_session_state() {
        let mut parser = SseParser::new();
        parser.record_connection_failure();
        parser.feed_line("id: xyz").unwrap();
        parser
            .feed_line(r#"data: {"task_id":"t1","message_id":"m1","answer":"tail","created_at":1}"#)
            .unwrap();

        let event = parser.finish().unwrap();
        assert!(event.is_some());
        // Only a delimited event updates the ID or clears the counter.
        assert!(parser.last_event_id().is_none());
        assert_eq!(parser.reconnect_attempts(), 1);
    }

    #[test]
    fn test_reconnect_counter_lifecycle() {
        let mut parser = SseParser::new();
        assert_eq!(parser.reconnect_attempts(), 0);

        assert_eq!(parser.record_connection_failure(), 1);
        assert_eq!(parser.record_connection_failure(), 2);
        assert_eq!(parser.reconnect_attempts(), 2);

        // A successfully completed event resets the counter.
        feed_all(
            &mut parser,
            &[
                r#"data: {"task_id":"t1","message_id":"m1","answer":"ok","created_at":1}"#,
                "",
            ],
        );
        assert_eq!(parser.reconnect_attempts(), 0);
    }

    #[test]
    fn test_reset_clears_session_state() {
        let mut parser = SseParser::new();
        parser.record_connection_failure();
        feed_all(
            &mut parser,
            &[
                "id: abc",
                r#"data: {"task_id":"t1","message_id":"m1","answer":"x","created_at":1}"#,
                "",
            ],
        );
        assert_eq!(parser.last_event_id(), Some("abc"));

        parser.feed_line("event: message").unwrap();
        parser.feed_line("data: pending").unwrap();
        parser.reset();

        assert!(parser.last_event_id().is_none());
        assert_eq!(parser.reconnect_attempts(), 0);
        // The pending partial event is gone too.
        assert!(parser.feed_line("").unwrap().is_none());
    }

    #[test]
    fn test_unknown_event_kind_mid_stream_degrades_to_ping() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[
                "event: future_feature",
                r#"data: {"some": "payload"}"#,
                "",
                "event: message",
                r#"data: {"task_id":"t1","message_id":"m1","answer":"still alive","created_at":1}"#,
                "",
            ],
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Ping);
        assert_eq!(events[1].answer(), Some("still alive"));
    }

    #[test]
    fn test_realistic_chat_stream() {
        // Two deltas spelling "Hello", then the terminal metadata event,
        // exactly in server order.
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[
                ": heartbeat",
                "event: message",
                r#"data: {"task_id":"t1","message_id":"m1","conversation_id":"c1","answer":"Hel","created_at":1}"#,
                "",
                "event: message",
                r#"data: {"task_id":"t1","message_id":"m1","conversation_id":"c1","answer":"lo","created_at":1}"#,
                "",
                "event: message_end",
                r#"data: {"task_id":"t1","message_id":"m1","conversation_id":"c1","metadata":{"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}}"#,
                "",
            ],
        );

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].answer(), Some("Hel"));
        assert_eq!(events[1].answer(), Some("lo"));
        assert!(events[2].is_terminal());
        assert_eq!(events[2].usage().map(|u| u.total_tokens), Some(7));
    }

    #[test]
    fn test_workflow_stream() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[
                "event: workflow_started",
                r#"data: {"task_id":"t1","workflow_run_id":"r1","data":{"id":"r1"}}"#,
                "",
                "event: node_started",
                r#"data: {"task_id":"t1","workflow_run_id":"r1","data":{"node_id":"n1"}}"#,
                "",
                "event: node_finished",
                r#"data: {"task_id":"t1","workflow_run_id":"r1","data":{"node_id":"n1","status":"succeeded"}}"#,
                "",
                "event: workflow_finished",
                r#"data: {"task_id":"t1","workflow_run_id":"r1","data":{"status":"succeeded","outputs":{"text":"done"}}}"#,
                "",
            ],
        );
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], StreamEvent::WorkflowStarted { .. }));
        assert!(matches!(events[3], StreamEvent::WorkflowFinished { .. }));
        assert!(events[3].is_terminal());
    }

    #[test]
    fn test_session_state_persists_across_streams() {
        // Same parser fed by two transport attempts: the resume state
        // carries over into the second stream.
        let mut parser = SseParser::new();
        feed_all(
            &mut parser,
            &[
                "id: evt-7",
                r#"data: {"task_id":"t1","message_id":"m1","answer":"partial","created_at":1}"#,
                "",
            ],
        );
        parser.record_connection_failure();

        assert_eq!(parser.last_event_id(), Some("evt-7"));
        assert_eq!(parser.reconnect_attempts(), 1);

        // Second stream delivers an event; the counter heals.
        feed_all(
            &mut parser,
            &[
                r#"data: {"task_id":"t1","message_id":"m1","answer":"resumed","created_at":2}"#,
                "",
            ],
        );
        assert_eq!(parser.reconnect_attempts(), 0);
        assert_eq!(parser.last_event_id(), Some("evt-7"));
    }
}
