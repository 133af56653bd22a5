use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{Result, WorkflowError};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::ROUTE_INPUT_PROMPT;
use crate::state::{Route, StateUpdate, WorkflowState};

use super::StageNode;

/// Classifies the user request into one of the workflow routes
pub struct RouteInputNode {
    llm: Arc<dyn LlmClient>,
}

#[derive(Debug, Deserialize)]
struct RouteOutput {
    route: Route,
}

impl RouteInputNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl StageNode for RouteInputNode {
    fn name(&self) -> &str {
        "route_input"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let messages = [
            Message::system(ROUTE_INPUT_PROMPT),
            Message::user(state.user_input.clone()),
        ];

        let schema = json!({
            "type": "object",
            "properties": {
                "route": {
                    "type": "string",
                    "enum": ["campaign", "route_2", "route_3"],
                    "description": "The workflow route for this request"
                }
            },
            "required": ["route"],
            "additionalProperties": false
        });

        let value = self.llm.structured(&messages, "route_output", &schema).await?;
        let output: RouteOutput = serde_json::from_value(value)
            .map_err(|e| WorkflowError::llm(format!("invalid route output: {e}")))?;

        info!(route = ?output.route, "routing decision");
        Ok(StateUpdate::with_route(output.route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatOptions, ChatResponse};
    use serde_json::Value;

    struct FixedRouteLlm(Value);

    #[async_trait]
    impl LlmClient for FixedRouteLlm {
        async fn chat(&self, _messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
            unreachable!("route_input never calls chat")
        }

        async fn structured(
            &self,
            _messages: &[Message],
            _schema_name: &str,
            _schema: &Value,
        ) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_routes_campaign_request() {
        let node = RouteInputNode::new(Arc::new(FixedRouteLlm(json!({ "route": "campaign" }))));
        let state = WorkflowState::new("launch a HNW campaign in Riyadh");
        let update = node.run(&state).await.unwrap();
        assert_eq!(update.route, Some(Route::Campaign));
        assert!(update.messages.is_empty());
    }

    #[tokio::test]
    async fn test_same_input_routes_identically() {
        let node = RouteInputNode::new(Arc::new(FixedRouteLlm(json!({ "route": "campaign" }))));
        let state = WorkflowState::new("launch a HNW campaign in Riyadh");

        let first = node.run(&state).await.unwrap();
        let second = node.run(&state).await.unwrap();

        assert_eq!(first.route, Some(Route::Campaign));
        assert_eq!(first.route, second.route);
        // routing never touches the transcript, so re-running is harmless
        assert!(first.messages.is_empty());
        assert!(second.messages.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_route() {
        let node = RouteInputNode::new(Arc::new(FixedRouteLlm(json!({ "route": "route_9" }))));
        let state = WorkflowState::new("hello");
        assert!(node.run(&state).await.is_err());
    }
}
