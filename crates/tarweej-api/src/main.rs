// Tarweej API server
//
// Composition root: connects Postgres and the MCP sessions, wires the
// campaign workflow graph once at startup, and serves it over HTTP.

mod campaigns;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tarweej_core::builtin::{
    ListProspectsTool, SendEmailTool, SendPhoneTextTool, SendWhatsappTool,
};
use tarweej_core::graph::CampaignGraph;
use tarweej_core::tools::ToolRegistry;
use tarweej_mcp::{McpConfigFile, McpMessageGateway, SessionManager};
use tarweej_openai::OpenAiChatClient;
use tarweej_storage::Database;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(campaigns::run_query),
    components(schemas(campaigns::QueryRequest, campaigns::QueryResponse)),
    tags(
        (name = "campaigns", description = "Campaign workflow endpoints")
    ),
    info(
        title = "Tarweej API",
        version = "0.1.0",
        description = "Conversational marketing-campaign agent for real estate prospect outreach"
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tarweej_api=debug,tarweej_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tarweej-api starting...");

    // Database (required)
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Arc::new(
        Database::from_url(&database_url)
            .await
            .context("Failed to connect to database")?,
    );
    tracing::info!("Connected to database");

    // MCP sessions: database session required, messaging degrades
    let mcp_config_path =
        std::env::var("MCP_CONFIG_PATH").unwrap_or_else(|_| "mcp.json".to_string());
    let mcp_config = McpConfigFile::load(&mcp_config_path)
        .with_context(|| format!("Failed to load MCP config from {mcp_config_path}"))?;
    let session_manager = Arc::new(SessionManager::new(mcp_config));
    session_manager
        .init()
        .await
        .context("Failed to initialize MCP sessions")?;

    // LLM client
    let llm = Arc::new(OpenAiChatClient::from_env().context("Failed to configure LLM client")?);

    // Campaign stage tools: MCP database tools plus the direct prospect listing
    let mut database_tools = session_manager.database_registry().await?;
    database_tools.register(ListProspectsTool::new(db.clone()));

    // Send stage tools: MCP messaging tools plus the gateway-backed senders
    let gateway = Arc::new(McpMessageGateway::new(session_manager.clone()));
    let mut messaging_tools = session_manager.messaging_registry().await?;
    messaging_tools.register(SendEmailTool::new(gateway.clone()));
    messaging_tools.register(SendWhatsappTool::new(gateway.clone()));
    messaging_tools.register(SendPhoneTextTool::new(gateway));
    log_registries(&database_tools, &messaging_tools);

    let mut graph = CampaignGraph::new(llm, database_tools, messaging_tools, db);
    if let Ok(max) = std::env::var("MAX_TOOL_ITERATIONS") {
        let max = max
            .parse::<usize>()
            .context("MAX_TOOL_ITERATIONS must be a positive integer")?;
        graph = graph.with_max_tool_iterations(max);
    }
    let campaigns_state = campaigns::AppState::new(Arc::new(graph));
    tracing::info!("Campaign graph built and cached");

    // CORS for the frontend origin(s)
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let mut app = Router::new()
        .route("/health", get(health))
        .merge(campaigns::routes(campaigns_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    if !cors_origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
                .allow_credentials(true),
        );
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Close MCP sessions so stdio child processes are killed
    session_manager.shutdown().await;

    Ok(())
}

fn log_registries(database_tools: &ToolRegistry, messaging_tools: &ToolRegistry) {
    tracing::info!(
        database = ?database_tools.tool_names(),
        messaging = ?messaging_tools.tool_names(),
        "tool registries assembled"
    );
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutdown signal received");
}
