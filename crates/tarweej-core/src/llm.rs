// LLM client seam
//
// Nodes talk to the model through the object-safe `LlmClient` trait. The
// production implementation lives in tarweej-openai; tests script the trait
// directly.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::message::Message;
use crate::tool_types::{ToolCall, ToolDefinition};

/// Per-call options for a chat completion
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Tools the model may call this turn (empty = none bound)
    pub tools: Vec<ToolDefinition>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Completion token cap
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    /// Options with tools bound
    pub fn with_tools(tools: Vec<ToolDefinition>) -> Self {
        Self {
            tools,
            ..Default::default()
        }
    }
}

/// A completed chat turn
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Assistant text (may be empty when the turn is all tool calls)
    pub text: String,
    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    /// Convert this turn into an assistant message for the history
    pub fn into_message(self) -> Message {
        if self.tool_calls.is_empty() {
            Message::assistant(self.text)
        } else {
            Message::assistant_with_tools(self.text, self.tool_calls)
        }
    }
}

/// Client for an LLM chat endpoint.
///
/// `structured` is the schema-constrained path: the model must return a JSON
/// document conforming to `schema`. A violation is a collaborator fault and
/// surfaces as `WorkflowError::Llm`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one chat turn, optionally with tools bound.
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse>;

    /// Run one chat turn constrained to a JSON schema; returns the parsed
    /// JSON document.
    async fn structured(
        &self,
        messages: &[Message],
        schema_name: &str,
        schema: &Value,
    ) -> Result<Value>;
}
