//! Server-sent-event decoding for the streaming endpoints.
//!
//! [`SseParser`] accumulates raw `text/event-stream` lines into typed
//! [`StreamEvent`] values; the client layer pumps transport bytes through
//! a shared parser instance so resume state survives reconnects.

mod events;
mod parser;
pub(crate) mod payloads;

pub use events::{SseLine, StreamEvent};
pub use parser::{parse_sse_line, parse_stream_event, SseParser};
