// Tool abstraction for the workflow
//
// Tools are defined via the `Tool` trait and registered with a
// `ToolRegistry`, which the dispatcher uses to execute pending tool calls.
//
// Error handling distinguishes tool-level errors (safe to show the LLM) from
// internal errors (logged, replaced with a generic message).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use crate::tool_types::{ToolCall, ToolDefinition, ToolResult};

// ============================================================================
// Tool Execution Result
// ============================================================================

/// Result of a tool execution.
///
/// - `Success`: result is returned to the LLM as-is
/// - `ToolError`: expected error condition the LLM should see
///   (e.g. "No prospects found")
/// - `InternalError`: system-level failure; details are logged but hidden
///   from the LLM
#[derive(Debug)]
pub enum ToolExecutionResult {
    /// Successful execution with a JSON result
    Success(Value),

    /// Tool-level error, safe to show the LLM
    ToolError(String),

    /// Internal error, hidden from the LLM
    InternalError(String),
}

impl ToolExecutionResult {
    /// Create a successful result
    pub fn success(value: impl Into<Value>) -> Self {
        ToolExecutionResult::Success(value.into())
    }

    /// Create a tool-level error (safe to show the LLM)
    pub fn tool_error(message: impl Into<String>) -> Self {
        ToolExecutionResult::ToolError(message.into())
    }

    /// Create an internal error (hidden from the LLM)
    pub fn internal_error(message: impl Into<String>) -> Self {
        ToolExecutionResult::InternalError(message.into())
    }

    /// Check if this is a successful result
    pub fn is_success(&self) -> bool {
        matches!(self, ToolExecutionResult::Success(_))
    }

    /// Convert to a ToolResult for the conversation history.
    ///
    /// All outcomes become a result payload so the workflow continues the
    /// same way regardless of tool success or failure; internal errors are
    /// logged here and replaced with a generic message.
    pub fn into_tool_result(self, tool_call_id: &str, tool_name: &str) -> ToolResult {
        match self {
            ToolExecutionResult::Success(value) => ToolResult {
                tool_call_id: tool_call_id.to_string(),
                result: Some(value),
                error: None,
            },
            ToolExecutionResult::ToolError(message) => ToolResult {
                tool_call_id: tool_call_id.to_string(),
                result: None,
                error: Some(message),
            },
            ToolExecutionResult::InternalError(message) => {
                error!(
                    tool_name = %tool_name,
                    tool_call_id = %tool_call_id,
                    error = %message,
                    "Tool internal error (details hidden from LLM)"
                );
                ToolResult {
                    tool_call_id: tool_call_id.to_string(),
                    result: None,
                    error: Some("An internal error occurred while executing the tool".to_string()),
                }
            }
        }
    }
}

// ============================================================================
// Tool Trait
// ============================================================================

/// Trait for tools the workflow's generation nodes can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name, used by the LLM to invoke it.
    fn name(&self) -> &str;

    /// Description provided to the LLM.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> ToolExecutionResult;

    /// Convert this tool to a definition for the LLM call.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

// ============================================================================
// ToolRegistry
// ============================================================================

/// A registry holding the tools available to the workflow.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Register an Arc-wrapped tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Tool definitions for an LLM call
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute one tool call. Unknown tool names become a tool-level error
    /// so a hallucinated call never aborts the batch.
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let outcome = match self.tools.get(&tool_call.name) {
            Some(tool) => tool.execute(tool_call.arguments.clone()).await,
            None => ToolExecutionResult::tool_error(format!(
                "Unknown tool: {}",
                tool_call.name
            )),
        };
        outcome.into_tool_result(&tool_call.id, &tool_call.name)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the message back"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"]
            })
        }

        async fn execute(&self, arguments: Value) -> ToolExecutionResult {
            match arguments.get("message").and_then(|v| v.as_str()) {
                Some(msg) => ToolExecutionResult::success(json!({ "echo": msg })),
                None => ToolExecutionResult::tool_error("missing message"),
            }
        }
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let call = ToolCall {
            id: "call_1".to_string(),
            name: "echo".to_string(),
            arguments: json!({"message": "hi"}),
        };
        let result = registry.execute(&call).await;
        assert_eq!(result.result, Some(json!({"echo": "hi"})));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "nope".to_string(),
            arguments: json!({}),
        };
        let result = registry.execute(&call).await;
        assert!(result.error.as_deref().unwrap().contains("Unknown tool"));
    }

    #[test]
    fn test_internal_error_hidden() {
        let result = ToolExecutionResult::internal_error("db password wrong")
            .into_tool_result("call_1", "list_prospects");
        assert!(!result.error.as_deref().unwrap().contains("password"));
    }
}
