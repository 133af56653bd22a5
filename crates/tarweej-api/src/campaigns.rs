// Campaign query endpoint

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{extract::State, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tarweej_core::graph::CampaignGraph;
use tarweej_core::state::WorkflowState;

/// App state shared across campaign routes
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<CampaignGraph>,
}

impl AppState {
    pub fn new(graph: Arc<CampaignGraph>) -> Self {
        Self { graph }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/campaigns/query", post(run_query))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// The user's campaign request
    pub query: String,
    /// Optional persona override for the agent
    #[serde(default)]
    pub agent_persona: Option<String>,
    /// Role recorded as the campaign creator
    #[serde(default)]
    pub user_role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    /// Final agent message of the run
    pub message: String,
    /// Serialized customer projection, present for completed campaign runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_data: Option<serde_json::Value>,
}

/// POST /v1/campaigns/query - Run the campaign workflow for one request
#[utoipa::path(
    post,
    path = "/v1/campaigns/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Workflow completed", body = QueryResponse),
        (status = 500, description = "Workflow failed")
    ),
    tag = "campaigns"
)]
pub async fn run_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, StatusCode> {
    tracing::info!(query = %truncate(&req.query, 100), "received campaign query");

    let mut workflow_state = WorkflowState::new(req.query);
    if let Some(persona) = req.agent_persona {
        workflow_state = workflow_state.with_persona(persona);
    }
    if let Some(role) = req.user_role {
        workflow_state = workflow_state.with_user_role(role);
    }

    let final_state = state.graph.run(workflow_state).await.map_err(|e| {
        tracing::error!("workflow run failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let message = final_state
        .last_message()
        .map(|m| m.content.to_llm_string())
        .unwrap_or_default();
    tracing::info!(preview = %truncate(&message, 500), "workflow response");

    Ok(Json(QueryResponse {
        message,
        customer_data: final_state.serialized_output,
    }))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
