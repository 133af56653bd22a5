// Workflow stage nodes
//
// Each stage reads the shared state and returns a StateUpdate. Nodes never
// mutate the state directly; the graph runner owns the merge.

mod campaign;
mod extract_customers;
mod generate_messages;
mod route_input;
mod send_messages;
mod serialize_customer_data;

pub use campaign::CampaignNode;
pub use extract_customers::ExtractCustomersNode;
pub use generate_messages::GenerateMessagesNode;
pub use route_input::RouteInputNode;
pub use send_messages::SendMessagesNode;
pub use serialize_customer_data::SerializeCustomerDataNode;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::{StateUpdate, WorkflowState};

/// A single stage of the campaign workflow
#[async_trait]
pub trait StageNode: Send + Sync {
    /// Stage name used in logs
    fn name(&self) -> &str;

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate>;
}

/// Persona header prepended to every stage system prompt
pub(crate) fn persona_context(agent_persona: &str, prompt: &str) -> String {
    format!(
        "## Agent Persona (REQUIRED - assume the persona and behaviour as follows and do \
         not deviate from it):\n{agent_persona}\n\n{prompt}"
    )
}
