// MCP client connection
//
// Wraps one rmcp client session over stdio or streamable HTTP.

use anyhow::{anyhow, Context, Result};
use rmcp::handler::client::ClientHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientCapabilities, Content, Implementation,
    InitializeRequestParams, RawContent,
};
use rmcp::service::{self, RoleClient, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::transport::streamable_http_client::{
    StreamableHttpClientTransport, StreamableHttpClientTransportConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::config::{interpolate_env_vars, McpServerConfig, McpTransportType};

pub type McpConnection = RunningService<RoleClient, CampaignClientHandler>;

#[derive(Clone)]
pub struct CampaignClientHandler {
    server_name: String,
}

impl CampaignClientHandler {
    pub fn new(server_name: String) -> Self {
        Self { server_name }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

impl ClientHandler for CampaignClientHandler {
    fn get_info(&self) -> InitializeRequestParams {
        InitializeRequestParams {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "tarweej".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
        }
    }
}

/// A tool advertised by a connected MCP server
#[derive(Debug, Clone)]
pub struct McpToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// Flattened result of one MCP tool call
#[derive(Debug, Clone)]
pub struct McpToolOutput {
    pub text: String,
    pub is_error: bool,
}

/// An established session with one MCP server
pub struct McpSession {
    name: String,
    service: McpConnection,
}

impl McpSession {
    pub async fn connect(name: &str, config: &McpServerConfig) -> Result<Self> {
        let handler = CampaignClientHandler::new(name.to_string());
        let service = match config.transport() {
            McpTransportType::Stdio => connect_stdio(config, handler).await?,
            McpTransportType::Http => connect_http(config, handler).await?,
        };
        Ok(Self {
            name: name.to_string(),
            service,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn list_tools(&self) -> Result<Vec<McpToolSpec>> {
        let tools = self.service.list_all_tools().await?;
        Ok(tools
            .into_iter()
            .map(|tool| McpToolSpec {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()),
                input_schema: serde_json::to_value(tool.input_schema)
                    .unwrap_or_else(|_| serde_json::json!({})),
            })
            .collect())
    }

    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolOutput> {
        let args = arguments.as_object().cloned().unwrap_or_default();
        let params = CallToolRequestParams {
            meta: None,
            name: tool_name.to_string().into(),
            arguments: Some(args),
            task: None,
        };

        let result = self.service.call_tool(params).await?;
        Ok(flatten_call_tool_result(result))
    }

    /// Close the session, killing the child process for stdio servers.
    pub async fn close(self) {
        if let Err(e) = self.service.cancel().await {
            tracing::debug!(server = %self.name, error = %e, "MCP session cleanup warning");
        }
    }
}

async fn connect_stdio(
    config: &McpServerConfig,
    handler: CampaignClientHandler,
) -> Result<McpConnection> {
    let server_name = handler.server_name().to_string();
    let command = config
        .command
        .clone()
        .ok_or_else(|| anyhow!("Missing command for stdio MCP server"))?;

    let mut cmd = Command::new(command);
    cmd.args(&config.args);
    for (key, value) in &config.env {
        cmd.env(key, interpolate_env_vars(value));
    }

    // Pipe stderr so server-side noise lands in our logs instead of the tty
    let (transport, stderr) = TokioChildProcess::builder(cmd)
        .stderr(std::process::Stdio::piped())
        .spawn()
        .context("Failed to spawn MCP child process")?;

    if let Some(stderr) = stderr {
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(mcp_server = %server_name, "{}", line);
            }
        });
    }

    let service = service::serve_client(handler, transport).await?;
    Ok(service)
}

async fn connect_http(
    config: &McpServerConfig,
    handler: CampaignClientHandler,
) -> Result<McpConnection> {
    let url = config
        .url
        .as_ref()
        .ok_or_else(|| anyhow!("Missing URL for HTTP MCP server"))?;

    let mut transport_config = StreamableHttpClientTransportConfig::with_uri(url.to_string());

    let mut headers = reqwest::header::HeaderMap::new();
    for (key, value) in &config.headers {
        let resolved = interpolate_env_vars(value);
        if resolved.is_empty() {
            continue;
        }
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("Invalid header name: {key}"))?;
        let header_value = reqwest::header::HeaderValue::from_str(&resolved)
            .with_context(|| format!("Invalid header value for {key}"))?;
        headers.insert(header_name, header_value);
    }

    // Bearer tokens go through the transport's auth header support
    let bearer_token = headers
        .get(reqwest::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|s| s.to_string());
    if let Some(token) = bearer_token {
        transport_config = transport_config.auth_header(token);
        headers.remove(reqwest::header::AUTHORIZATION);
    }

    let client = if headers.is_empty() {
        reqwest::Client::new()
    } else {
        reqwest::Client::builder().default_headers(headers).build()?
    };

    let transport = StreamableHttpClientTransport::with_client(client, transport_config);
    let service = service::serve_client(handler, transport).await?;
    Ok(service)
}

fn flatten_call_tool_result(result: CallToolResult) -> McpToolOutput {
    let text = result
        .content
        .into_iter()
        .filter_map(content_text)
        .collect::<Vec<_>>()
        .join("\n");

    McpToolOutput {
        text,
        is_error: result.is_error.unwrap_or(false),
    }
}

fn content_text(content: Content) -> Option<String> {
    match content.raw {
        RawContent::Text(text_content) => Some(text_content.text),
        RawContent::Resource(resource) => match resource.resource {
            rmcp::model::ResourceContents::TextResourceContents { text, .. } => Some(text),
            rmcp::model::ResourceContents::BlobResourceContents { .. } => None,
        },
        _ => None,
    }
}
