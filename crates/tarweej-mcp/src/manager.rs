// External session lifecycle
//
// One SessionManager per process. The database session is required; the
// messaging session degrades gracefully to an empty tool set when its
// server is unreachable. init and shutdown are idempotent and serialized
// behind an async lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use tarweej_core::error::{Result, WorkflowError};
use tarweej_core::tools::{Tool, ToolRegistry};

use crate::client::McpSession;
use crate::config::{McpConfigFile, DATABASE_SERVER, MESSAGING_SERVER};
use crate::tools::McpTool;

/// Database tools the campaign stage may use
const DATABASE_TOOL_ALLOWLIST: &[&str] = &["execute_sql", "list_tables"];

/// Messaging tools the send stage may use
const MESSAGING_TOOL_ALLOWLIST: &[&str] = &[
    "periskope_send_message",
    "periskope_list_chats",
    "periskope_get_chat",
    "periskope_list_messages_in_a_chat",
    "periskope_get_message_by_id",
    "periskope_list_contacts",
    "periskope_get_contact_by_id",
];

/// Name of the messaging tool used for WhatsApp delivery
pub const SEND_MESSAGE_TOOL: &str = "periskope_send_message";

struct Sessions {
    database: Arc<McpSession>,
    messaging: Option<Arc<McpSession>>,
    database_tools: Vec<Arc<dyn Tool>>,
    messaging_tools: Vec<Arc<dyn Tool>>,
}

pub struct SessionManager {
    config: McpConfigFile,
    sessions: Mutex<Option<Sessions>>,
}

impl SessionManager {
    pub fn new(config: McpConfigFile) -> Self {
        Self {
            config,
            sessions: Mutex::new(None),
        }
    }

    /// Open the MCP sessions. Idempotent; a second call is a no-op. Fails
    /// when the database server is missing or unreachable. A messaging
    /// failure logs a warning and leaves the messaging tool set empty.
    pub async fn init(&self) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        if sessions.is_some() {
            return Ok(());
        }

        let database_config = self.config.mcp_servers.get(DATABASE_SERVER).ok_or_else(|| {
            WorkflowError::session(format!("no '{DATABASE_SERVER}' server in MCP config"))
        })?;
        let database = Arc::new(
            McpSession::connect(DATABASE_SERVER, database_config)
                .await
                .map_err(|e| {
                    WorkflowError::session(format!("failed to connect database MCP server: {e}"))
                })?,
        );
        let database_tools = Self::load_tools(&database, DATABASE_TOOL_ALLOWLIST)
            .await
            .map_err(|e| {
                WorkflowError::session(format!("failed to list database MCP tools: {e}"))
            })?;
        info!(
            count = database_tools.len(),
            "database MCP session established"
        );

        let (messaging, messaging_tools) = match self.config.mcp_servers.get(MESSAGING_SERVER) {
            Some(config) => match McpSession::connect(MESSAGING_SERVER, config).await {
                Ok(session) => {
                    let session = Arc::new(session);
                    match Self::load_tools(&session, MESSAGING_TOOL_ALLOWLIST).await {
                        Ok(tools) => {
                            info!(count = tools.len(), "messaging MCP session established");
                            (Some(session), tools)
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to list messaging MCP tools, continuing without them");
                            (Some(session), Vec::new())
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to connect messaging MCP server, continuing without messaging tools");
                    (None, Vec::new())
                }
            },
            None => {
                warn!("no messaging server in MCP config, continuing without messaging tools");
                (None, Vec::new())
            }
        };

        *sessions = Some(Sessions {
            database,
            messaging,
            database_tools,
            messaging_tools,
        });
        Ok(())
    }

    async fn load_tools(
        session: &Arc<McpSession>,
        allowlist: &[&str],
    ) -> anyhow::Result<Vec<Arc<dyn Tool>>> {
        let mut specs: Vec<_> = session
            .list_tools()
            .await?
            .into_iter()
            .filter(|spec| allowlist.contains(&spec.name.as_str()))
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(specs
            .into_iter()
            .map(|spec| Arc::new(McpTool::new(session.clone(), spec)) as Arc<dyn Tool>)
            .collect())
    }

    /// Close both sessions and clear cached tools. Idempotent.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        let Some(taken) = sessions.take() else {
            return;
        };
        drop(taken.database_tools);
        drop(taken.messaging_tools);

        match Arc::try_unwrap(taken.database) {
            Ok(database) => database.close().await,
            Err(_) => warn!("database MCP session still referenced at shutdown, dropping handle"),
        }
        if let Some(messaging) = taken.messaging {
            match Arc::try_unwrap(messaging) {
                Ok(messaging) => messaging.close().await,
                Err(_) => {
                    warn!("messaging MCP session still referenced at shutdown, dropping handle")
                }
            }
        }
        info!("MCP shutdown complete");
    }

    /// Registry of allow-listed database tools. Errors before init.
    pub async fn database_registry(&self) -> Result<ToolRegistry> {
        let sessions = self.sessions.lock().await;
        let sessions = sessions
            .as_ref()
            .ok_or_else(|| WorkflowError::session("MCP sessions not initialized"))?;
        let mut registry = ToolRegistry::new();
        for tool in &sessions.database_tools {
            registry.register_arc(tool.clone());
        }
        Ok(registry)
    }

    /// Registry of allow-listed messaging tools. Empty when the messaging
    /// session is degraded. Errors before init.
    pub async fn messaging_registry(&self) -> Result<ToolRegistry> {
        let sessions = self.sessions.lock().await;
        let sessions = sessions
            .as_ref()
            .ok_or_else(|| WorkflowError::session("MCP sessions not initialized"))?;
        let mut registry = ToolRegistry::new();
        for tool in &sessions.messaging_tools {
            registry.register_arc(tool.clone());
        }
        Ok(registry)
    }

    /// Call one messaging tool directly, bypassing the LLM. Used by the
    /// message gateway for WhatsApp delivery.
    pub async fn call_messaging_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let session = {
            let sessions = self.sessions.lock().await;
            let sessions = sessions
                .as_ref()
                .ok_or_else(|| WorkflowError::session("MCP sessions not initialized"))?;
            sessions
                .messaging
                .clone()
                .ok_or_else(|| WorkflowError::session("messaging MCP session unavailable"))?
        };

        let output = session
            .call_tool(tool_name, arguments)
            .await
            .map_err(|e| WorkflowError::tool(format!("messaging tool call failed: {e}")))?;
        if output.is_error {
            return Err(WorkflowError::tool(output.text));
        }
        Ok(serde_json::Value::String(output.text))
    }
}
