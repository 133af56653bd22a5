use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{Result, WorkflowError};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::EXTRACT_CAMPAIGN_DETAILS_PROMPT;
use crate::records::{CampaignDetails, CampaignRecord, CustomerRecord};
use crate::state::{StateUpdate, WorkflowState};
use crate::traits::CampaignStore;

use super::StageNode;

/// Final stage: extracts campaign metadata from the original request,
/// persists a campaign record with synthesized engagement metrics, and
/// produces the frontend-facing customer projection.
///
/// A persistence failure is logged but never fails the run; the serialized
/// output is still returned to the caller.
pub struct SerializeCustomerDataNode {
    llm: Arc<dyn LlmClient>,
    campaign_store: Arc<dyn CampaignStore>,
}

impl SerializeCustomerDataNode {
    pub fn new(llm: Arc<dyn LlmClient>, campaign_store: Arc<dyn CampaignStore>) -> Self {
        Self { llm, campaign_store }
    }

    fn details_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "target_city": {
                    "type": "string",
                    "enum": ["riyadh", "jeddah", "all"]
                },
                "target_segment": {
                    "type": "string",
                    "enum": ["hnw", "investor", "first_time", "all"]
                },
                "channels": {
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": ["call", "sms", "whatsapp", "email"]
                    }
                },
                "respect_dnc": { "type": "boolean" },
                "require_consent": { "type": "boolean" },
                "record_conversations": { "type": "boolean" },
                "active_window_start": { "type": ["string", "null"] },
                "active_window_end": { "type": ["string", "null"] }
            },
            "required": ["name", "target_city", "target_segment"],
            "additionalProperties": false
        })
    }
}

#[async_trait]
impl StageNode for SerializeCustomerDataNode {
    fn name(&self) -> &str {
        "serialize_customer_data"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let Some(customers) = state.extracted_customers.as_deref() else {
            warn!("no customer data available to serialize");
            return Ok(StateUpdate::none());
        };
        if customers.is_empty() {
            warn!("empty customer list, nothing to serialize");
            return Ok(StateUpdate::none());
        }

        let messages = [
            Message::system(EXTRACT_CAMPAIGN_DETAILS_PROMPT),
            Message::user(state.user_input.clone()),
        ];
        let value = self
            .llm
            .structured(&messages, "campaign_details", &Self::details_schema())
            .await?;
        let details: CampaignDetails = serde_json::from_value(value)
            .map_err(|e| WorkflowError::llm(format!("invalid campaign details: {e}")))?;

        info!(
            campaign = %details.name,
            city = ?details.target_city,
            segment = ?details.target_segment,
            "extracted campaign details"
        );

        let serialized: Vec<Value> = customers
            .iter()
            .map(CustomerRecord::frontend_projection)
            .collect();

        let record = CampaignRecord::assemble(
            details,
            state.agent_persona.clone(),
            state.user_role.clone(),
            customers,
        );
        match self.campaign_store.create_campaign(&record).await {
            Ok(outcome) if outcome.success => {
                info!(
                    campaign = ?outcome.campaign_name,
                    campaign_id = ?outcome.campaign_id,
                    "campaign record created"
                );
            }
            Ok(outcome) => {
                error!(error = ?outcome.error, "failed to create campaign record");
            }
            Err(e) => {
                error!(error = %e, "campaign persistence call failed");
            }
        }

        Ok(StateUpdate {
            serialized_output: Some(Value::Array(serialized)),
            ..StateUpdate::default()
        })
    }
}
