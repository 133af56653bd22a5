use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{Result, WorkflowError};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::GENERATE_MESSAGES_PROMPT;
use crate::state::{MessageTemplates, StateUpdate, WorkflowState};

use super::StageNode;

/// Generates the English and Arabic campaign message templates
pub struct GenerateMessagesNode {
    llm: Arc<dyn LlmClient>,
}

#[derive(Debug, Deserialize)]
struct MessagesOutput {
    english_message: String,
    arabic_message: String,
}

impl GenerateMessagesNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl StageNode for GenerateMessagesNode {
    fn name(&self) -> &str {
        "generate_messages"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let mut context = format!("Campaign details: {}", state.user_input);
        if !state.agent_persona.trim().is_empty() {
            context.push_str(&format!("\nAgent persona: {}", state.agent_persona));
        }

        let schema = json!({
            "type": "object",
            "properties": {
                "english_message": {
                    "type": "string",
                    "description": "Campaign message in English, may contain a {name} placeholder"
                },
                "arabic_message": {
                    "type": "string",
                    "description": "Equivalent campaign message in Arabic"
                }
            },
            "required": ["english_message", "arabic_message"],
            "additionalProperties": false
        });

        let messages = [
            Message::system(GENERATE_MESSAGES_PROMPT),
            Message::user(context),
        ];
        let value = self
            .llm
            .structured(&messages, "messages_output", &schema)
            .await?;
        let output: MessagesOutput = serde_json::from_value(value)
            .map_err(|e| WorkflowError::llm(format!("invalid messages output: {e}")))?;

        info!(
            english_chars = output.english_message.len(),
            arabic_chars = output.arabic_message.len(),
            "generated message templates"
        );

        Ok(StateUpdate {
            generated_templates: Some(MessageTemplates {
                english: output.english_message,
                arabic: output.arabic_message,
            }),
            ..StateUpdate::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatOptions, ChatResponse};
    use serde_json::Value;

    struct FixedStructuredLlm(Value);

    #[async_trait]
    impl LlmClient for FixedStructuredLlm {
        async fn chat(&self, _messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
            unreachable!("generation never calls chat")
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
    async fn test_produces_both_templates() {
        let node = GenerateMessagesNode::new(Arc::new(FixedStructuredLlm(json!({
            "english_message": "Hello {name}, exclusive listings in Riyadh.",
            "arabic_message": "مرحبا {name}، عروض حصرية في الرياض."
        }))));
        let state = WorkflowState::new("HNW campaign in Riyadh");
        let update = node.run(&state).await.unwrap();
        let templates = update.generated_templates.unwrap();
        assert!(templates.english.contains("{name}"));
        assert!(templates.arabic.contains("{name}"));
        assert!(!templates.is_empty());
    }
}
