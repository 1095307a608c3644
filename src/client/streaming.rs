//! SSE event stream plumbing.
//!
//! Adapts a raw HTTP byte stream into typed [`StreamEvent`]s: bytes are
//! buffered and split on newlines, each line is fed through the client's
//! shared [`SseParser`], and completed events are yielded as they close.
//! Every yielded error is terminal for the stream; the resume state in
//! the shared parser survives so the caller can start a follow-up stream.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;

use crate::error::{DifyError, StreamError};
use crate::sse::{SseParser, StreamEvent};

use super::DifyClient;

impl DifyClient {
    /// POST a streaming request and pump its body through the shared
    /// SSE parser.
    pub(crate) async fn start_stream<B>(&self, path: &str, body: &B) -> Result<EventStream, DifyError>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send_stream_request(path, body).await?;
        Ok(EventStream::new(
            response.bytes_stream(),
            Arc::clone(&self.parser),
            self.sse_timeout,
        ))
    }
}

/// Typed stream of server-sent events from a streaming endpoint.
///
/// Yields decoded events until the server closes the stream or an error
/// terminates it; after any `Err` item the stream is done and yields
/// `None`. Dropping it mid-stream abandons the HTTP response body.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = Result<StreamEvent, DifyError>> + Send>>,
    parser: Arc<Mutex<SseParser>>,
}

impl EventStream {
    pub(crate) fn new<S, E>(
        bytes: S,
        parser: Arc<Mutex<SseParser>>,
        sse_timeout: Duration,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        // Transport errors are carried as strings from here on; pinning
        // makes the stream pollable without an Unpin bound on `S`.
        let bytes = Box::pin(bytes.map(|result| result.map_err(|e| e.to_string())));
        let inner = Box::pin(pump(bytes, Arc::clone(&parser), sse_timeout));
        Self { inner, parser }
    }

    /// ID of the most recently completed event, for resume.
    pub fn last_event_id(&self) -> Option<String> {
        self.parser.lock().unwrap().last_event_id().map(String::from)
    }

    /// Transport failures recorded since the last completed event.
    pub fn reconnect_attempts(&self) -> u32 {
        self.parser.lock().unwrap().reconnect_attempts()
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent, DifyError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum PumpPhase {
    /// Transport open: reading chunks and feeding complete lines.
    Open,
    /// Transport ended cleanly: flushing the tail of the line buffer.
    Draining,
    /// Terminal: the flush completed or an error was yielded.
    Done,
}

struct PumpState<S> {
    bytes: S,
    parser: Arc<Mutex<SseParser>>,
    buffer: Vec<u8>,
    sse_timeout: Duration,
    phase: PumpPhase,
}

fn pump<S>(
    bytes: S,
    parser: Arc<Mutex<SseParser>>,
    sse_timeout: Duration,
) -> impl Stream<Item = Result<StreamEvent, DifyError>>
where
    S: Stream<Item = Result<Bytes, String>> + Send + Unpin + 'static,
{
    let state = PumpState {
        bytes,
        parser,
        buffer: Vec::new(),
        sse_timeout,
        phase: PumpPhase::Open,
    };
    stream::unfold(state, |mut state| async move {
        state.next_event().await.map(|item| (item, state))
    })
}

impl<S> PumpState<S>
where
    S: Stream<Item = Result<Bytes, String>> + Send + Unpin,
{
    async fn next_event(&mut self) -> Option<Result<StreamEvent, DifyError>> {
        loop {
            match self.phase {
                PumpPhase::Done => return None,

                PumpPhase::Open => {
                    // Feed any complete line already buffered. Splitting on
                    // the byte level keeps multi-byte characters intact even
                    // when a chunk boundary lands inside one.
                    if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
                        let line = String::from_utf8_lossy(&line_bytes[..pos]);
                        match self.feed(line.trim_end_matches('\r')) {
                            Ok(Some(event)) => return Some(Ok(event)),
                            Ok(None) => continue,
                            Err(err) => {
                                self.phase = PumpPhase::Done;
                                return Some(Err(err.into()));
                            }
                        }
                    }

                    // No complete line left: wait for the next chunk.
                    match tokio::time::timeout(self.sse_timeout, self.bytes.next()).await {
                        Ok(Some(Ok(chunk))) => self.buffer.extend_from_slice(&chunk),
                        Ok(Some(Err(message))) => {
                            let attempts =
                                self.parser.lock().unwrap().record_connection_failure();
                            tracing::error!(
                                attempt = attempts,
                                max = crate::constants::DEFAULT_MAX_RECONNECT_ATTEMPTS,
                                %message,
                                "SSE stream connection lost"
                            );
                            self.phase = PumpPhase::Done;
                            return Some(Err(StreamError::ConnectionLost {
                                reconnect_attempts: attempts,
                                message,
                            }
                            .into()));
                        }
                        Ok(None) => self.phase = PumpPhase::Draining,
                        Err(_) => {
                            let timeout_secs = self.sse_timeout.as_secs();
                            tracing::error!(timeout_secs, "SSE stream timed out waiting for data");
                            self.phase = PumpPhase::Done;
                            return Some(Err(StreamError::Timeout { timeout_secs }.into()));
                        }
                    }
                }

                PumpPhase::Draining => {
                    // Servers may omit the newline after the final line.
                    if !self.buffer.is_empty() {
                        let tail = std::mem::take(&mut self.buffer);
                        let line = String::from_utf8_lossy(&tail);
                        match self.feed(line.trim_end_matches('\r')) {
                            Ok(Some(event)) => return Some(Ok(event)),
                            Ok(None) => continue,
                            Err(err) => {
                                self.phase = PumpPhase::Done;
                                return Some(Err(err.into()));
                            }
                        }
                    }

                    self.phase = PumpPhase::Done;
                    match self.parser.lock().unwrap().finish() {
                        Ok(Some(event)) => return Some(Ok(event)),
                        Ok(None) => return None,
                        Err(err) => return Some(Err(err.into())),
                    }
                }
            }
        }
    }

    fn feed(&mut self, line: &str) -> Result<Option<StreamEvent>, StreamError> {
        self.parser.lock().unwrap().feed_line(line)
    }
}
