// OpenAI Protocol Types
//
// Wire types for the OpenAI-compatible chat completions API. Any endpoint
// speaking this protocol (OpenAI, Groq, local inference servers) works.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tarweej_core::message::{Message, MessageRole};
use tarweej_core::tool_types::{ToolCall, ToolDefinition};

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// `response_format` for structured outputs
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    pub r#type: String,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: Value,
}

impl ResponseFormat {
    /// Strict json_schema response format
    pub fn json_schema(name: impl Into<String>, schema: Value) -> Self {
        Self {
            r#type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: name.into(),
                strict: true,
                schema,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiTool {
    pub r#type: String,
    pub function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    pub r#type: String,
    pub function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the API delivers them
    pub arguments: String,
}

// Non-streaming response types
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponse {
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert a workflow message to the OpenAI wire format
pub fn to_openai_message(message: &Message) -> OpenAiMessage {
    let role = match message.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::ToolResult => "tool",
    };

    OpenAiMessage {
        role: role.to_string(),
        content: Some(message.content.to_llm_string()),
        tool_calls: message.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|tc| OpenAiToolCall {
                    id: tc.id.clone(),
                    r#type: "function".to_string(),
                    function: OpenAiFunctionCall {
                        name: tc.name.clone(),
                        arguments: serde_json::to_string(&tc.arguments).unwrap_or_default(),
                    },
                })
                .collect()
        }),
        tool_call_id: message.tool_call_id.clone(),
    }
}

/// Convert tool definitions to the OpenAI function-calling format
pub fn to_openai_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|tool| OpenAiTool {
            r#type: "function".to_string(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        })
        .collect()
}

/// Parse wire tool calls back into workflow tool calls. Malformed argument
/// JSON degrades to an empty object instead of failing the whole turn.
pub fn from_openai_tool_calls(calls: &[OpenAiToolCall]) -> Vec<ToolCall> {
    calls
        .iter()
        .map(|tc| ToolCall {
            id: tc.id.clone(),
            name: tc.function.name.clone(),
            arguments: serde_json::from_str(&tc.function.arguments)
                .unwrap_or_else(|_| serde_json::json!({})),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_message_maps_to_tool_role() {
        let message = Message::tool_result("c1", Some(json!("rows here")), None);
        let wire = to_openai_message(&message);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(wire.content.as_deref(), Some("rows here"));
    }

    #[test]
    fn test_assistant_tool_calls_encode_arguments_as_string() {
        let message = Message::assistant_with_tools(
            "",
            vec![ToolCall {
                id: "c1".to_string(),
                name: "send_email".to_string(),
                arguments: json!({ "to": "a@b.com" }),
            }],
        );
        let wire = to_openai_message(&message);
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].r#type, "function");
        assert_eq!(calls[0].function.arguments, r#"{"to":"a@b.com"}"#);
    }

    #[test]
    fn test_malformed_arguments_degrade_to_empty_object() {
        let calls = from_openai_tool_calls(&[OpenAiToolCall {
            id: "c1".to_string(),
            r#type: "function".to_string(),
            function: OpenAiFunctionCall {
                name: "send_email".to_string(),
                arguments: "{not json".to_string(),
            },
        }]);
        assert_eq!(calls[0].arguments, json!({}));
    }

    #[test]
    fn test_request_serializes_response_format() {
        let request = ChatRequest {
            model: "openai/gpt-oss-120b".to_string(),
            messages: vec![],
            temperature: None,
            max_tokens: None,
            stream: false,
            tools: None,
            response_format: Some(ResponseFormat::json_schema(
                "route_output",
                json!({ "type": "object" }),
            )),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert!(value.get("tools").is_none());
    }
}
