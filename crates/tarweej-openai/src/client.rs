// OpenAI-compatible chat client
//
// Non-streaming chat completions against any OpenAI-compatible endpoint.
// Defaults target Groq, which hosts the model the workflow was tuned on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use tarweej_core::error::{Result, WorkflowError};
use tarweej_core::llm::{ChatOptions, ChatResponse, LlmClient};
use tarweej_core::message::Message;

use crate::types::{
    from_openai_tool_calls, to_openai_message, to_openai_tools, ChatRequest, OpenAiResponse,
    ResponseFormat,
};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Configure from the environment. `LLM_API_KEY` (or `OPENAI_API_KEY`)
    /// is required; `LLM_BASE_URL` and `LLM_MODEL` override the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| WorkflowError::config("LLM_API_KEY environment variable not set"))?;

        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            client.base_url = base_url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            client.model = model;
        }
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn complete(&self, request: &ChatRequest) -> Result<OpenAiResponse> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(model = %request.model, messages = request.messages.len(), "chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| WorkflowError::llm(format!("failed to send chat request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkflowError::llm(format!(
                "chat completion failed with status {status}: {error_text}"
            )));
        }

        response
            .json::<OpenAiResponse>()
            .await
            .map_err(|e| WorkflowError::llm(format!("failed to parse chat response: {e}")))
    }

    fn build_request(&self, messages: &[Message], options: &ChatOptions) -> ChatRequest {
        let tools = if options.tools.is_empty() {
            None
        } else {
            Some(to_openai_tools(&options.tools))
        };

        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(to_openai_message).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
            tools,
            response_format: None,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse> {
        let request = self.build_request(messages, options);
        let response = self.complete(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::llm("no choices in chat response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .as_deref()
            .map(from_openai_tool_calls)
            .unwrap_or_default();

        Ok(ChatResponse {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    async fn structured(
        &self,
        messages: &[Message],
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut request = self.build_request(messages, &ChatOptions::default());
        request.response_format = Some(ResponseFormat::json_schema(schema_name, schema.clone()));

        let response = self.complete(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::llm("no choices in structured response"))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| WorkflowError::llm("structured response had no content"))?;

        serde_json::from_str(&content)
            .map_err(|e| WorkflowError::llm(format!("structured response was not valid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tarweej_core::tool_types::ToolDefinition;

    #[test]
    fn test_build_request_omits_empty_tools() {
        let client = OpenAiChatClient::new("test-key");
        let request = client.build_request(&[Message::user("hi")], &ChatOptions::default());
        assert!(request.tools.is_none());
        assert!(!request.stream);
        assert_eq!(request.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_build_request_includes_tools() {
        let client = OpenAiChatClient::new("test-key").with_model("gpt-4o-mini");
        let options = ChatOptions::with_tools(vec![ToolDefinition {
            name: "list_prospects".to_string(),
            description: "List prospects".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }]);
        let request = client.build_request(&[Message::user("hi")], &options);
        let tools = request.tools.unwrap();
        assert_eq!(tools[0].function.name, "list_prospects");
        assert_eq!(request.model, "gpt-4o-mini");
    }
}
