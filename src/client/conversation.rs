//! Conversation history endpoints.

use serde_json::{json, Value};

use crate::error::{DifyError, ResourceKind};
use crate::models::{ConversationInfo, MessageInfo, Paginated};

use super::DifyClient;

impl DifyClient {
    /// List a user's conversations, most recently updated first.
    ///
    /// `last_id` pages past a previously returned conversation; `limit`
    /// defaults to 20 and `sort_by` to `-updated_at`.
    pub async fn list_conversations(
        &self,
        user: &str,
        last_id: Option<&str>,
        limit: Option<u32>,
        sort_by: Option<&str>,
    ) -> Result<Vec<ConversationInfo>, DifyError> {
        let mut query: Vec<(&str, String)> = vec![
            ("user", user.to_string()),
            ("limit", limit.unwrap_or(20).to_string()),
            ("sort_by", sort_by.unwrap_or("-updated_at").to_string()),
        ];
        if let Some(last_id) = last_id {
            query.push(("last_id", last_id.to_string()));
        }

        let page: Paginated<ConversationInfo> = self
            .get_json("/conversations", &query)
            .await
            .map_err(|e| e.for_resource(ResourceKind::Conversation))?;
        Ok(page.data)
    }

    /// List the messages of one conversation, oldest first.
    ///
    /// `first_id` pages backwards from a previously returned message.
    pub async fn get_messages(
        &self,
        conversation_id: &str,
        user: &str,
        first_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<MessageInfo>, DifyError> {
        let mut query: Vec<(&str, String)> = vec![
            ("conversation_id", conversation_id.to_string()),
            ("user", user.to_string()),
            ("limit", limit.unwrap_or(20).to_string()),
        ];
        if let Some(first_id) = first_id {
            query.push(("first_id", first_id.to_string()));
        }

        let page: Paginated<MessageInfo> = self
            .get_json("/messages", &query)
            .await
            .map_err(|e| e.for_resource(ResourceKind::Conversation))?;
        Ok(page.data)
    }

    /// Delete a conversation. Returns whether the service confirmed it.
    pub async fn delete_conversation(
        &self,
        conversation_id: &str,
        user: &str,
    ) -> Result<bool, DifyError> {
        let response: Value = self
            .delete_json(
                &format!("/conversations/{}", conversation_id),
                &[("user", user.to_string())],
            )
            .await
            .map_err(|e| e.for_resource(ResourceKind::Conversation))?;
        Ok(response.get("result").and_then(|v| v.as_str()) == Some("success"))
    }

    /// Rename a conversation, or let the service auto-generate a name.
    pub async fn rename_conversation(
        &self,
        conversation_id: &str,
        name: Option<&str>,
        user: &str,
        auto_generate: bool,
    ) -> Result<ConversationInfo, DifyError> {
        let mut body = json!({ "user": user, "auto_generate": auto_generate });
        if let Some(name) = name {
            body["name"] = Value::String(name.to_string());
        }

        self.post_json(&format!("/conversations/{}/name", conversation_id), &body)
            .await
            .map_err(|e| e.for_resource(ResourceKind::Conversation))
    }
}
