// Conversation message types
//
// Message is the unit of conversation history threaded through the workflow.
// Append order is causal: an assistant message always precedes the
// tool-result messages produced by its tool calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool_types::ToolCall;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// System message (stage prompt)
    System,
    /// User message
    User,
    /// Assistant response (may carry tool calls)
    Assistant,
    /// Tool execution result
    ToolResult,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// Message content variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Text content (system/user/assistant)
    Text(String),

    /// Tool result content
    ToolResult {
        result: Option<serde_json::Value>,
        error: Option<String>,
    },
}

impl MessageContent {
    /// Get text content if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Flatten to a plain string for the LLM wire format
    pub fn to_llm_string(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::ToolResult { result, error } => {
                if let Some(err) = error {
                    format!("Tool error: {}", err)
                } else if let Some(res) = result {
                    match res {
                        serde_json::Value::String(s) => s.clone(),
                        other => serde_json::to_string(other)
                            .unwrap_or_else(|_| "{}".to_string()),
                    }
                } else {
                    "{}".to_string()
                }
            }
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Message role
    pub role: MessageRole,

    /// Message content
    pub content: MessageContent,

    /// Tool call ID (for tool_result messages, correlates with the call)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool calls requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            tool_calls: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            tool_calls: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            tool_calls: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new assistant message carrying tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
            tool_call_id: None,
            tool_calls: Some(tool_calls),
            created_at: Utc::now(),
        }
    }

    /// Create a tool result message
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        result: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::ToolResult,
            content: MessageContent::ToolResult { result, error },
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
            created_at: Utc::now(),
        }
    }

    /// Get text content if this is a text message
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }

    /// Check if this message carries tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|tc| !tc.is_empty())
    }

    /// Tool calls carried by this message, if any
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// Find the most recent tool-result message, if any
pub fn last_tool_result(messages: &[Message]) -> Option<&Message> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::ToolResult)
}
