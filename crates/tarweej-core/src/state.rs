// Shared workflow state
//
// Every stage reads the state and returns a StateUpdate; the graph runner
// merges updates with per-field semantics. Messages are append-only, all
// other fields are whole-value replacements.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;
use crate::records::CustomerRecord;

pub const DEFAULT_AGENT_PERSONA: &str = "Be formal, warm and polite";
pub const DEFAULT_USER_ROLE: &str = "system";

/// Routing decision produced by the first stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Marketing-campaign request, enter the campaign pipeline
    Campaign,
    /// General conversation, answer and stop
    #[serde(rename = "route_2")]
    Route2,
    /// Out-of-scope request, decline and stop
    #[serde(rename = "route_3")]
    Route3,
}

/// Localized message templates produced by the generation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplates {
    pub english: String,
    pub arabic: String,
}

impl MessageTemplates {
    pub fn is_empty(&self) -> bool {
        self.english.trim().is_empty() && self.arabic.trim().is_empty()
    }
}

/// Conversation and pipeline state shared across all stages
#[derive(Debug, Clone)]
pub struct WorkflowState {
    /// Full conversation transcript, append-only
    pub messages: Vec<Message>,
    /// The raw user request that started the run
    pub user_input: String,
    /// Persona text prepended to stage system prompts
    pub agent_persona: String,
    /// Role attributed to the requester when persisting campaigns
    pub user_role: String,
    pub route: Option<Route>,
    pub extracted_customers: Option<Vec<CustomerRecord>>,
    pub generated_templates: Option<MessageTemplates>,
    /// Frontend-facing customer projection emitted by the final stage
    pub serialized_output: Option<Value>,
}

impl WorkflowState {
    /// Seed a new run. The user query becomes both `user_input` and the
    /// first transcript message.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            messages: vec![Message::user(query.clone())],
            user_input: query,
            agent_persona: DEFAULT_AGENT_PERSONA.to_string(),
            user_role: DEFAULT_USER_ROLE.to_string(),
            route: None,
            extracted_customers: None,
            generated_templates: None,
            serialized_output: None,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.agent_persona = persona.into();
        self
    }

    pub fn with_user_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = role.into();
        self
    }

    /// Merge a stage update into the state
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(route) = update.route {
            self.route = Some(route);
        }
        if let Some(customers) = update.extracted_customers {
            self.extracted_customers = Some(customers);
        }
        if let Some(templates) = update.generated_templates {
            self.generated_templates = Some(templates);
        }
        if let Some(output) = update.serialized_output {
            self.serialized_output = Some(output);
        }
    }

    /// Last message of the transcript
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True when the last transcript message is an assistant turn carrying
    /// unresolved tool calls
    pub fn has_pending_tool_calls(&self) -> bool {
        self.last_message()
            .map(Message::has_tool_calls)
            .unwrap_or(false)
    }
}

/// Per-stage delta against the shared state
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub route: Option<Route>,
    pub extracted_customers: Option<Vec<CustomerRecord>>,
    pub generated_templates: Option<MessageTemplates>,
    pub serialized_output: Option<Value>,
}

impl StateUpdate {
    /// An update that changes nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_message(message: Message) -> Self {
        Self {
            messages: vec![message],
            ..Self::default()
        }
    }

    pub fn with_route(route: Route) -> Self {
        Self {
            route: Some(route),
            ..Self::default()
        }
    }
}
