use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{Result, WorkflowError};
use crate::llm::LlmClient;
use crate::message::{last_tool_result, Message};
use crate::prompts::EXTRACT_CUSTOMERS_PROMPT;
use crate::records::CustomerRecord;
use crate::state::{StateUpdate, WorkflowState};

use super::StageNode;

/// Parses the raw prospect rows from the last tool result into structured
/// customer records, dropping any record that lacks the contact info its
/// channel requires.
pub struct ExtractCustomersNode {
    llm: Arc<dyn LlmClient>,
}

#[derive(Debug, Deserialize)]
struct CustomersOutput {
    customers: Vec<CustomerRecord>,
}

impl ExtractCustomersNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "customers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "preferred_channel": {
                                "type": "string",
                                "enum": ["call", "whatsapp", "email"]
                            },
                            "contact": { "type": "string" },
                            "language": {
                                "type": "string",
                                "enum": ["english", "arabic"]
                            },
                            "city": { "type": ["string", "null"] },
                            "segment": { "type": ["string", "null"] },
                            "budget_max": { "type": ["number", "null"] },
                            "property_type_preference": { "type": ["string", "null"] },
                            "dnc": { "type": ["boolean", "null"] },
                            "consent_status": {
                                "type": ["string", "null"],
                                "enum": ["opted_in", "opted_out", "unknown", null]
                            }
                        },
                        "required": ["name", "preferred_channel", "contact", "language"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["customers"],
            "additionalProperties": false
        })
    }
}

#[async_trait]
impl StageNode for ExtractCustomersNode {
    fn name(&self) -> &str {
        "extract_customers"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let Some(tool_message) = last_tool_result(&state.messages) else {
            warn!("no tool result found in transcript, skipping extraction");
            return Ok(StateUpdate::none());
        };
        let prospect_data = tool_message.content.to_llm_string();
        info!(chars = prospect_data.len(), "extracting customers from prospect data");

        let messages = [
            Message::system(EXTRACT_CUSTOMERS_PROMPT),
            Message::user(prospect_data),
        ];
        let value = self
            .llm
            .structured(&messages, "customers_output", &Self::schema())
            .await?;
        let output: CustomersOutput = serde_json::from_value(value)
            .map_err(|e| WorkflowError::llm(format!("invalid customers output: {e}")))?;

        let total = output.customers.len();
        let customers: Vec<CustomerRecord> = output
            .customers
            .into_iter()
            .filter(CustomerRecord::has_required_contact)
            .collect();
        if customers.len() < total {
            warn!(
                dropped = total - customers.len(),
                "dropped customers missing required contact info"
            );
        }
        info!(count = customers.len(), "extracted customers");

        Ok(StateUpdate {
            extracted_customers: Some(customers),
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
            unreachable!("extraction never calls chat")
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

    fn state_with_tool_result(rows: &str) -> WorkflowState {
        let mut state = WorkflowState::new("campaign");
        state.apply(StateUpdate::with_message(Message::tool_result(
            "c1",
            Some(json!(rows)),
            None,
        )));
        state
    }

    #[tokio::test]
    async fn test_no_tool_result_is_noop() {
        let node = ExtractCustomersNode::new(Arc::new(FixedStructuredLlm(json!({
            "customers": []
        }))));
        let state = WorkflowState::new("campaign");
        let update = node.run(&state).await.unwrap();
        assert!(update.extracted_customers.is_none());
    }

    #[tokio::test]
    async fn test_drops_customers_without_required_contact() {
        let node = ExtractCustomersNode::new(Arc::new(FixedStructuredLlm(json!({
            "customers": [
                {
                    "name": "Ali",
                    "preferred_channel": "whatsapp",
                    "contact": "+966500000001",
                    "language": "arabic"
                },
                {
                    "name": "Sara",
                    "preferred_channel": "whatsapp",
                    "contact": "",
                    "language": "english"
                },
                {
                    "name": "Omar",
                    "preferred_channel": "email",
                    "contact": "not-an-email",
                    "language": "english"
                }
            ]
        }))));
        let state = state_with_tool_result("id=1, full_name=Ali");
        let update = node.run(&state).await.unwrap();
        let customers = update.extracted_customers.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Ali");
    }
}
