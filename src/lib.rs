//! Typed async client for the Dify conversational-AI platform.
//!
//! [`DifyClient`] covers the service API (chat, completion, workflow,
//! conversations, files) in blocking and streaming form; streaming calls
//! yield typed [`StreamEvent`]s decoded from the `text/event-stream` wire
//! format by [`SseParser`]. [`ConsoleClient`] drives the admin console
//! (login, apps, tags, plugins) and fans batch operations out through
//! [`run_batch`] under a bounded concurrency cap. The `cli` module is the
//! companion command-line tool built on top of both.

pub mod cli;
pub mod client;
pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod models;
pub mod sse;

pub use client::{DifyClient, EventStream};
pub use config::{load_config, AppConfig, ConfigError, Password, ServerConfig};
pub use console::{run_batch, BatchItemResult, ConsoleClient};
pub use error::{ApiError, DifyError, ResourceKind, StreamError};
pub use models::{
    ChatRequest, ChatResponse, CompletionRequest, CompletionResponse, ConversationInfo,
    MessageInfo, ResponseMode, WorkflowRunRequest, WorkflowRunResponse,
};
pub use sse::{SseParser, StreamEvent};
