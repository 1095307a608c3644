pub mod chat;
pub mod common;
pub mod completion;
pub mod console;
pub mod workflow;

pub use chat::{ChatRequest, ChatResponse, ConversationInfo, MessageInfo};
pub use common::*;
pub use completion::{CompletionRequest, CompletionResponse};
pub use console::{
    AppImportResult, AppInfo, AppPage, PluginExportEntry, PluginExportFile, PluginInfo,
    PluginListResponse, Tag, UploadedFile,
};
pub use workflow::{WorkflowData, WorkflowRunRequest, WorkflowRunResponse, WorkflowStatus};

/// Helper for `skip_serializing_if`: treat `None` and `Some("")` the same,
/// so an empty conversation ID is omitted and the service starts a fresh
/// conversation.
pub(crate) fn is_none_or_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Helper for `skip_serializing_if`: omit absent or empty file lists.
pub(crate) fn is_none_or_empty_vec<T>(value: &Option<Vec<T>>) -> bool {
    value.as_ref().map_or(true, Vec::is_empty)
}
