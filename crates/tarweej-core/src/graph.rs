// Workflow graph
//
// Fixed topology:
//
//   route_input -> campaign <-> tools_campaign
//   campaign -> extract_customers -> generate_messages
//   generate_messages -> send_messages <-> tools_send_messages
//   send_messages -> serialize_customer_data -> end
//
// Edges are tagged transitions, never name lookups; an impossible
// transition cannot be expressed.

use std::sync::Arc;

use tracing::{debug, info};

use crate::dispatch::ToolDispatcher;
use crate::error::{Result, WorkflowError};
use crate::llm::LlmClient;
use crate::nodes::{
    CampaignNode, ExtractCustomersNode, GenerateMessagesNode, RouteInputNode, SendMessagesNode,
    SerializeCustomerDataNode, StageNode,
};
use crate::state::{Route, WorkflowState};
use crate::tools::ToolRegistry;
use crate::traits::CampaignStore;

pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 25;

/// The nodes of the campaign workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    RouteInput,
    Campaign,
    ToolsCampaign,
    ExtractCustomers,
    GenerateMessages,
    SendMessages,
    ToolsSendMessages,
    SerializeCustomerData,
}

impl NodeId {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeId::RouteInput => "route_input",
            NodeId::Campaign => "campaign",
            NodeId::ToolsCampaign => "tools_campaign",
            NodeId::ExtractCustomers => "extract_customers",
            NodeId::GenerateMessages => "generate_messages",
            NodeId::SendMessages => "send_messages",
            NodeId::ToolsSendMessages => "tools_send_messages",
            NodeId::SerializeCustomerData => "serialize_customer_data",
        }
    }
}

/// Where control flows after a node completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(NodeId),
    End,
}

/// The assembled campaign workflow
pub struct CampaignGraph {
    route_input: RouteInputNode,
    campaign: CampaignNode,
    extract_customers: ExtractCustomersNode,
    generate_messages: GenerateMessagesNode,
    send_messages: SendMessagesNode,
    serialize_customer_data: SerializeCustomerDataNode,
    campaign_dispatcher: ToolDispatcher,
    messaging_dispatcher: ToolDispatcher,
    max_tool_iterations: usize,
}

impl CampaignGraph {
    /// Wire the workflow. `database_tools` back the campaign stage,
    /// `messaging_tools` back the send stage.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        database_tools: ToolRegistry,
        messaging_tools: ToolRegistry,
        campaign_store: Arc<dyn CampaignStore>,
    ) -> Self {
        Self {
            route_input: RouteInputNode::new(llm.clone()),
            campaign: CampaignNode::new(llm.clone(), database_tools.tool_definitions()),
            extract_customers: ExtractCustomersNode::new(llm.clone()),
            generate_messages: GenerateMessagesNode::new(llm.clone()),
            send_messages: SendMessagesNode::new(llm.clone(), messaging_tools.tool_definitions()),
            serialize_customer_data: SerializeCustomerDataNode::new(llm, campaign_store),
            campaign_dispatcher: ToolDispatcher::new(database_tools),
            messaging_dispatcher: ToolDispatcher::new(messaging_tools),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Run the workflow to completion, returning the final state.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let mut current = NodeId::RouteInput;
        let mut campaign_cycles = 0usize;
        let mut send_cycles = 0usize;

        loop {
            debug!(node = current.as_str(), "entering node");
            let update = match current {
                NodeId::RouteInput => self.route_input.run(&state).await?,
                NodeId::Campaign => self.campaign.run(&state).await?,
                NodeId::ToolsCampaign => self.campaign_dispatcher.dispatch(&state).await,
                NodeId::ExtractCustomers => self.extract_customers.run(&state).await?,
                NodeId::GenerateMessages => self.generate_messages.run(&state).await?,
                NodeId::SendMessages => self.send_messages.run(&state).await?,
                NodeId::ToolsSendMessages => self.messaging_dispatcher.dispatch(&state).await,
                NodeId::SerializeCustomerData => self.serialize_customer_data.run(&state).await?,
            };
            state.apply(update);

            let transition = match current {
                NodeId::RouteInput => match state.route {
                    Some(Route::Campaign) => Transition::Next(NodeId::Campaign),
                    Some(Route::Route2) | Some(Route::Route3) | None => Transition::End,
                },
                NodeId::Campaign => {
                    if state.has_pending_tool_calls() {
                        campaign_cycles += 1;
                        if campaign_cycles > self.max_tool_iterations {
                            return Err(WorkflowError::MaxIterationsReached(
                                self.max_tool_iterations,
                            ));
                        }
                        Transition::Next(NodeId::ToolsCampaign)
                    } else {
                        Transition::Next(NodeId::ExtractCustomers)
                    }
                }
                NodeId::ToolsCampaign => Transition::Next(NodeId::Campaign),
                NodeId::ExtractCustomers => Transition::Next(NodeId::GenerateMessages),
                NodeId::GenerateMessages => Transition::Next(NodeId::SendMessages),
                NodeId::SendMessages => {
                    if state.has_pending_tool_calls() {
                        send_cycles += 1;
                        if send_cycles > self.max_tool_iterations {
                            return Err(WorkflowError::MaxIterationsReached(
                                self.max_tool_iterations,
                            ));
                        }
                        Transition::Next(NodeId::ToolsSendMessages)
                    } else {
                        Transition::Next(NodeId::SerializeCustomerData)
                    }
                }
                NodeId::ToolsSendMessages => Transition::Next(NodeId::SendMessages),
                NodeId::SerializeCustomerData => Transition::End,
            };

            match transition {
                Transition::Next(next) => {
                    debug!(from = current.as_str(), to = next.as_str(), "transition");
                    current = next;
                }
                Transition::End => {
                    info!(
                        messages = state.messages.len(),
                        route = ?state.route,
                        "workflow complete"
                    );
                    return Ok(state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::llm::{ChatOptions, ChatResponse};
    use crate::message::{Message, MessageRole};
    use crate::records::{CampaignRecord, CreateCampaignOutcome};
    use crate::tool_types::ToolCall;
    use crate::tools::{Tool, ToolExecutionResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted chat and structured responses in order
    struct ScriptedLlm {
        chat: Mutex<VecDeque<ChatResponse>>,
        structured: Mutex<VecDeque<Value>>,
    }

    impl ScriptedLlm {
        fn new(chat: Vec<ChatResponse>, structured: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                chat: Mutex::new(chat.into()),
                structured: Mutex::new(structured.into()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(&self, _messages: &[Message], _options: &ChatOptions) -> Result<ChatResponse> {
            self.chat
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| WorkflowError::llm("scripted chat exhausted"))
        }

        async fn structured(
            &self,
            _messages: &[Message],
            _schema_name: &str,
            _schema: &Value,
        ) -> Result<Value> {
            self.structured
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| WorkflowError::llm("scripted structured exhausted"))
        }
    }

    struct StaticTool {
        name: &'static str,
        result: Value,
    }

    /// Counts how many times the dispatcher executed it
    struct CountingTool {
        calls: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "list_prospects"
        }

        fn description(&self) -> &str {
            "counting test tool"
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _arguments: Value) -> ToolExecutionResult {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            ToolExecutionResult::Success(json!(
                "id=1, full_name=Sara, language=english, preferred_channel=email, email=sara@example.com"
            ))
        }
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "static test tool"
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _arguments: Value) -> ToolExecutionResult {
            ToolExecutionResult::Success(self.result.clone())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        records: Mutex<Vec<CampaignRecord>>,
    }

    #[async_trait]
    impl CampaignStore for RecordingStore {
        async fn create_campaign(&self, record: &CampaignRecord) -> Result<CreateCampaignOutcome> {
            self.records.lock().unwrap().push(record.clone());
            Ok(CreateCampaignOutcome::created(
                uuid::Uuid::new_v4(),
                record.name.clone(),
            ))
        }
    }

    fn tool_call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: json!({}),
        }
    }

    fn chat_text(text: &str) -> ChatResponse {
        ChatResponse {
            text: text.to_string(),
            tool_calls: vec![],
        }
    }

    fn chat_tools(calls: Vec<ToolCall>) -> ChatResponse {
        ChatResponse {
            text: String::new(),
            tool_calls: calls,
        }
    }

    fn database_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(StaticTool {
            name: "list_prospects",
            result: json!(
                "id=1, full_name=Sara, language=english, preferred_channel=email, email=sara@example.com"
            ),
        });
        registry
    }

    fn messaging_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(StaticTool {
            name: "send_email",
            result: json!({ "status": "sent" }),
        });
        registry
    }

    fn customers_json() -> Value {
        json!({
            "customers": [{
                "name": "Sara",
                "preferred_channel": "email",
                "contact": "sara@example.com",
                "language": "english"
            }]
        })
    }

    fn templates_json() -> Value {
        json!({
            "english_message": "Hello {name}",
            "arabic_message": "مرحبا {name}"
        })
    }

    fn details_json() -> Value {
        json!({
            "name": "HNW Riyadh Q3",
            "target_city": "riyadh",
            "target_segment": "hnw",
            "channels": ["email"]
        })
    }

    #[tokio::test]
    async fn test_non_campaign_route_ends_immediately() {
        let llm = ScriptedLlm::new(vec![], vec![json!({ "route": "route_2" })]);
        let graph = CampaignGraph::new(
            llm,
            database_registry(),
            messaging_registry(),
            Arc::new(RecordingStore::default()),
        );
        let state = graph.run(WorkflowState::new("what's the weather?")).await.unwrap();
        assert_eq!(state.route, Some(Route::Route2));
        assert!(state.extracted_customers.is_none());
        assert!(state.serialized_output.is_none());
    }

    #[tokio::test]
    async fn test_full_campaign_run() {
        let llm = ScriptedLlm::new(
            vec![
                // campaign: query prospects, then summarize
                chat_tools(vec![tool_call("c1", "list_prospects")]),
                chat_text("Found 1 prospect: Sara."),
                // send: one email, then done
                chat_tools(vec![tool_call("c2", "send_email")]),
                chat_text("All messages sent."),
            ],
            vec![
                json!({ "route": "campaign" }),
                customers_json(),
                templates_json(),
                details_json(),
            ],
        );
        let store = Arc::new(RecordingStore::default());
        let graph = CampaignGraph::new(
            llm,
            database_registry(),
            messaging_registry(),
            store.clone(),
        );

        let state = graph
            .run(WorkflowState::new("launch HNW Riyadh Q3 campaign"))
            .await
            .unwrap();

        assert_eq!(state.route, Some(Route::Campaign));
        assert_eq!(state.extracted_customers.as_ref().unwrap().len(), 1);
        assert!(state.generated_templates.is_some());

        let output = state.serialized_output.as_ref().unwrap().as_array().unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0]["preferred_channel"], "email");

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metrics.total_outreach, 1);

        // transcript: user, assistant+tools, tool result, assistant,
        // assistant+tools, tool result, assistant
        assert_eq!(state.messages.len(), 7);
        assert_eq!(state.messages.last().unwrap().role, MessageRole::Assistant);
        assert_eq!(
            state.messages.last().unwrap().text(),
            Some("All messages sent.")
        );
    }

    #[tokio::test]
    async fn test_tool_loop_dispatches_each_scripted_turn() {
        // three tool turns, then the model stops asking for tools
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(CountingTool {
            calls: calls.clone(),
        });

        let llm = ScriptedLlm::new(
            vec![
                chat_tools(vec![tool_call("c1", "list_prospects")]),
                chat_tools(vec![tool_call("c2", "list_prospects")]),
                chat_tools(vec![tool_call("c3", "list_prospects")]),
                chat_text("Found 1 prospect: Sara."),
            ],
            vec![
                json!({ "route": "campaign" }),
                json!({ "customers": [] }),
                templates_json(),
            ],
        );
        let graph = CampaignGraph::new(
            llm,
            registry,
            messaging_registry(),
            Arc::new(RecordingStore::default()),
        );

        let state = graph.run(WorkflowState::new("campaign")).await.unwrap();

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);

        // transcript: user, then one assistant/tool-result pair per turn,
        // then the closing assistant summary
        assert_eq!(state.messages.len(), 8);
        let roles: Vec<_> = state.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::ToolResult,
                MessageRole::Assistant,
                MessageRole::ToolResult,
                MessageRole::Assistant,
                MessageRole::ToolResult,
                MessageRole::Assistant,
            ]
        );

        // control left the loop for extraction, which saw no customers
        assert_eq!(state.extracted_customers.as_ref().map(Vec::len), Some(0));
        assert!(state.serialized_output.is_none());
    }

    #[tokio::test]
    async fn test_runaway_tool_loop_is_bounded() {
        // the model keeps asking for tools forever
        let mut chat = Vec::new();
        for i in 0..10 {
            chat.push(chat_tools(vec![tool_call(&format!("c{i}"), "list_prospects")]));
        }
        let llm = ScriptedLlm::new(chat, vec![json!({ "route": "campaign" })]);
        let graph = CampaignGraph::new(
            llm,
            database_registry(),
            messaging_registry(),
            Arc::new(RecordingStore::default()),
        )
        .with_max_tool_iterations(3);

        let err = graph
            .run(WorkflowState::new("campaign"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MaxIterationsReached(3)));
    }

    #[tokio::test]
    async fn test_degraded_run_without_messaging_tools() {
        // messaging registry empty: send stage still runs, model answers
        // without tool calls, workflow completes
        let llm = ScriptedLlm::new(
            vec![
                chat_tools(vec![tool_call("c1", "list_prospects")]),
                chat_text("Found 1 prospect: Sara."),
                chat_text("No messaging tools available, nothing sent."),
            ],
            vec![
                json!({ "route": "campaign" }),
                customers_json(),
                templates_json(),
                details_json(),
            ],
        );
        let graph = CampaignGraph::new(
            llm,
            database_registry(),
            ToolRegistry::new(),
            Arc::new(RecordingStore::default()),
        );
        let state = graph
            .run(WorkflowState::new("launch campaign"))
            .await
            .unwrap();
        assert!(state.serialized_output.is_some());
    }
}
