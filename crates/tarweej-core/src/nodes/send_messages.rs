use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient};
use crate::message::Message;
use crate::prompts::SEND_MESSAGES_PROMPT;
use crate::state::{StateUpdate, WorkflowState};
use crate::tool_types::ToolDefinition;

use super::StageNode;

/// Dispatches the generated templates to every extracted customer over the
/// customer's preferred channel. Skips silently when either templates or
/// customers are missing so a degraded run still terminates cleanly.
pub struct SendMessagesNode {
    llm: Arc<dyn LlmClient>,
    messaging_tools: Vec<ToolDefinition>,
}

impl SendMessagesNode {
    pub fn new(llm: Arc<dyn LlmClient>, messaging_tools: Vec<ToolDefinition>) -> Self {
        Self {
            llm,
            messaging_tools,
        }
    }
}

#[async_trait]
impl StageNode for SendMessagesNode {
    fn name(&self) -> &str {
        "send_messages"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let (Some(templates), Some(customers)) =
            (&state.generated_templates, &state.extracted_customers)
        else {
            warn!("missing generated templates or customer data, skipping send");
            return Ok(StateUpdate::none());
        };
        if templates.is_empty() || customers.is_empty() {
            warn!("empty templates or customer list, skipping send");
            return Ok(StateUpdate::none());
        }
        let Some(last) = state.last_message() else {
            return Ok(StateUpdate::none());
        };

        let campaign_content = last.content.to_llm_string();
        info!(
            customers = customers.len(),
            "personalizing messages for customers"
        );

        let mut human_parts = vec![
            "## Pre-generated Messages:".to_string(),
            format!("English: {}", templates.english),
            format!("Arabic: {}", templates.arabic),
            "\n## Customer Data (for personalization):".to_string(),
        ];
        human_parts.extend(customers.iter().map(|c| {
            format!(
                "- Name: {}, Channel: {}, Contact: {}, Language: {}",
                c.name, c.preferred_channel, c.contact, c.language
            )
        }));
        human_parts.push("\n## Prospect Data from Campaign:".to_string());
        human_parts.push(campaign_content);

        let mut messages = Vec::with_capacity(state.messages.len() + 2);
        messages.push(Message::system(SEND_MESSAGES_PROMPT));
        messages.extend(state.messages.iter().cloned());
        messages.push(Message::user(human_parts.join("\n")));

        let options = ChatOptions::with_tools(self.messaging_tools.clone());
        let response = self.llm.chat(&messages, &options).await?;

        info!(tool_calls = response.tool_calls.len(), "send stage response");
        Ok(StateUpdate::with_message(response.into_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatResponse;
    use crate::records::{Channel, CustomerRecord, Language};
    use crate::state::MessageTemplates;
    use crate::tool_types::ToolCall;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct CapturingLlm {
        response: ChatResponse,
        last_user_content: Mutex<Option<String>>,
    }

    #[async_trait]
    impl LlmClient for CapturingLlm {
        async fn chat(&self, messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
            let last = messages.last().unwrap();
            *self.last_user_content.lock().unwrap() = last.text().map(str::to_string);
            Ok(self.response.clone())
        }

        async fn structured(
            &self,
            _messages: &[Message],
            _schema_name: &str,
            _schema: &Value,
        ) -> Result<Value> {
            unreachable!("send stage never calls structured")
        }
    }

    fn customer() -> CustomerRecord {
        CustomerRecord {
            name: "Sara".to_string(),
            preferred_channel: Channel::Whatsapp,
            contact: "+966500000001".to_string(),
            language: Language::Arabic,
            city: None,
            segment: None,
            budget_max: None,
            property_type_preference: None,
            dnc: None,
            consent_status: None,
        }
    }

    fn ready_state() -> WorkflowState {
        let mut state = WorkflowState::new("HNW campaign in Riyadh");
        state.apply(StateUpdate {
            messages: vec![Message::assistant("id=1, full_name=Sara, ...")],
            extracted_customers: Some(vec![customer()]),
            generated_templates: Some(MessageTemplates {
                english: "Hello {name}".to_string(),
                arabic: "مرحبا {name}".to_string(),
            }),
            ..StateUpdate::default()
        });
        state
    }

    #[tokio::test]
    async fn test_builds_personalization_context() {
        let llm = Arc::new(CapturingLlm {
            response: ChatResponse {
                text: String::new(),
                tool_calls: vec![ToolCall {
                    id: "c1".to_string(),
                    name: "send_whatsapp".to_string(),
                    arguments: json!({ "to": "+966500000001", "message": "مرحبا Sara" }),
                }],
            },
            last_user_content: Mutex::new(None),
        });
        let node = SendMessagesNode::new(llm.clone(), vec![]);
        let update = node.run(&ready_state()).await.unwrap();

        assert_eq!(update.messages.len(), 1);
        assert!(update.messages[0].has_tool_calls());

        let content = llm.last_user_content.lock().unwrap().clone().unwrap();
        assert!(content.contains("## Pre-generated Messages:"));
        assert!(content.contains("English: Hello {name}"));
        assert!(content.contains("Name: Sara, Channel: whatsapp"));
        assert!(content.contains("## Prospect Data from Campaign:"));
    }

    #[tokio::test]
    async fn test_missing_templates_skips_send() {
        let llm = Arc::new(CapturingLlm {
            response: ChatResponse {
                text: "done".to_string(),
                tool_calls: vec![],
            },
            last_user_content: Mutex::new(None),
        });
        let node = SendMessagesNode::new(llm.clone(), vec![]);

        let mut state = WorkflowState::new("hello");
        state.apply(StateUpdate {
            extracted_customers: Some(vec![customer()]),
            ..StateUpdate::default()
        });
        let update = node.run(&state).await.unwrap();
        assert!(update.messages.is_empty());
        assert!(llm.last_user_content.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_customer_list_skips_send() {
        let llm = Arc::new(CapturingLlm {
            response: ChatResponse {
                text: "done".to_string(),
                tool_calls: vec![],
            },
            last_user_content: Mutex::new(None),
        });
        let node = SendMessagesNode::new(llm.clone(), vec![]);

        let mut state = ready_state();
        state.apply(StateUpdate {
            extracted_customers: Some(vec![]),
            ..StateUpdate::default()
        });
        let update = node.run(&state).await.unwrap();
        assert!(update.messages.is_empty());
    }
}
