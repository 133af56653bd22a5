use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient};
use crate::message::Message;
use crate::prompts::CAMPAIGN_PROMPT;
use crate::state::{StateUpdate, WorkflowState};
use crate::tool_types::ToolDefinition;

use super::{persona_context, StageNode};

/// Queries the prospect database for customers matching the campaign
/// criteria. Emits assistant turns that may carry database tool calls; the
/// dispatcher resolves them and control loops back here until the model
/// answers without tools.
pub struct CampaignNode {
    llm: Arc<dyn LlmClient>,
    database_tools: Vec<ToolDefinition>,
}

impl CampaignNode {
    pub fn new(llm: Arc<dyn LlmClient>, database_tools: Vec<ToolDefinition>) -> Self {
        Self {
            llm,
            database_tools,
        }
    }
}

#[async_trait]
impl StageNode for CampaignNode {
    fn name(&self) -> &str {
        "campaign"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let system = persona_context(&state.agent_persona, CAMPAIGN_PROMPT);

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(system));
        messages.extend(state.messages.iter().cloned());

        let options = ChatOptions::with_tools(self.database_tools.clone());
        let response = self.llm.chat(&messages, &options).await?;

        info!(
            tool_calls = response.tool_calls.len(),
            "campaign stage response"
        );
        Ok(StateUpdate::with_message(response.into_message()))
    }
}
