// Tool dispatch
//
// Resolves the tool calls carried by the last assistant turn into
// tool-result messages. One failing call never aborts the batch; its
// failure comes back as an error tool result the LLM can react to.

use tracing::{info, warn};

use crate::message::Message;
use crate::state::{StateUpdate, WorkflowState};
use crate::tools::ToolRegistry;

pub struct ToolDispatcher {
    registry: ToolRegistry,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute every pending tool call in order and return one tool-result
    /// message per call. No pending calls yields an empty update.
    pub async fn dispatch(&self, state: &WorkflowState) -> StateUpdate {
        let Some(last) = state.last_message() else {
            return StateUpdate::none();
        };
        let calls = last.tool_calls();
        if calls.is_empty() {
            return StateUpdate::none();
        }

        let mut messages = Vec::with_capacity(calls.len());
        for call in calls {
            info!(tool = %call.name, call_id = %call.id, "executing tool call");
            let result = self.registry.execute(call).await;
            if let Some(error) = &result.error {
                warn!(tool = %call.name, call_id = %call.id, %error, "tool call failed");
            }
            messages.push(Message::tool_result(
                result.tool_call_id,
                result.result,
                result.error,
            ));
        }

        StateUpdate {
            messages,
            ..StateUpdate::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;
    use crate::tool_types::ToolCall;
    use crate::tools::{Tool, ToolExecutionResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the input"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }

        async fn execute(&self, arguments: Value) -> ToolExecutionResult {
            match arguments.get("text").and_then(Value::as_str) {
                Some(text) => ToolExecutionResult::Success(json!(text.to_uppercase())),
                None => ToolExecutionResult::tool_error("missing 'text'"),
            }
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(UpperTool);
        ToolDispatcher::new(registry)
    }

    fn state_with_calls(calls: Vec<ToolCall>) -> WorkflowState {
        let mut state = WorkflowState::new("hello");
        state.apply(StateUpdate::with_message(Message::assistant_with_tools(
            "", calls,
        )));
        state
    }

    #[tokio::test]
    async fn test_dispatch_resolves_each_call() {
        let state = state_with_calls(vec![
            ToolCall {
                id: "c1".to_string(),
                name: "upper".to_string(),
                arguments: json!({ "text": "hi" }),
            },
            ToolCall {
                id: "c2".to_string(),
                name: "upper".to_string(),
                arguments: json!({ "text": "there" }),
            },
        ]);
        let update = dispatcher().dispatch(&state).await;
        assert_eq!(update.messages.len(), 2);
        assert!(update
            .messages
            .iter()
            .all(|m| m.role == MessageRole::ToolResult));
        assert_eq!(update.messages[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(update.messages[1].tool_call_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn test_failed_call_does_not_abort_batch() {
        let state = state_with_calls(vec![
            ToolCall {
                id: "c1".to_string(),
                name: "no_such_tool".to_string(),
                arguments: json!({}),
            },
            ToolCall {
                id: "c2".to_string(),
                name: "upper".to_string(),
                arguments: json!({ "text": "ok" }),
            },
        ]);
        let update = dispatcher().dispatch(&state).await;
        assert_eq!(update.messages.len(), 2);
        match &update.messages[0].content {
            crate::message::MessageContent::ToolResult { error, .. } => {
                assert!(error.as_deref().unwrap().contains("Unknown tool"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
        match &update.messages[1].content {
            crate::message::MessageContent::ToolResult { result, error } => {
                assert!(error.is_none());
                assert_eq!(result.as_ref().unwrap(), &json!("OK"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_pending_calls_is_noop() {
        let state = WorkflowState::new("hello");
        let update = dispatcher().dispatch(&state).await;
        assert!(update.messages.is_empty());
    }
}
