// MCP configuration
//
// Server definitions load from an mcp.json file with a top-level
// `mcpServers` map. Values in `env` and `headers` support `$VAR` and
// `${VAR}` interpolation against the process environment.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tarweej_core::error::{Result, WorkflowError};

/// Name of the database MCP server entry in mcp.json
pub const DATABASE_SERVER: &str = "supabase";
/// Name of the messaging MCP server entry in mcp.json
pub const MESSAGING_SERVER: &str = "periskope-mcp";

/// Root structure of mcp.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct McpConfigFile {
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerConfig>,
}

/// Server transport type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransportType {
    #[default]
    Stdio,
    Http,
}

/// One MCP server entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Explicit transport; inferred from command/url when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<McpTransportType>,

    /// Command for stdio transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables for stdio servers
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// URL for HTTP transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl McpServerConfig {
    /// Effective transport: explicit wins, otherwise a command means stdio
    /// and a url means HTTP.
    pub fn transport(&self) -> McpTransportType {
        if let Some(transport) = self.transport {
            return transport;
        }
        if self.command.is_some() {
            McpTransportType::Stdio
        } else {
            McpTransportType::Http
        }
    }
}

impl McpConfigFile {
    /// Load server definitions from an mcp.json file and inject database
    /// auth. The database server gets a bearer Authorization header from
    /// `DATABASE_MCP_ACCESS_TOKEN` when one is not already configured; an
    /// existing bare token is normalized to `Bearer` form.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::config(format!("MCP config file not found: {}: {e}", path.display()))
        })?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| WorkflowError::config(format!("invalid MCP config: {e}")))?;
        config.inject_database_auth();
        Ok(config)
    }

    fn inject_database_auth(&mut self) {
        let access_token = std::env::var("DATABASE_MCP_ACCESS_TOKEN").ok();

        for (name, server) in &mut self.mcp_servers {
            if server.url.is_none() || !name.to_lowercase().contains(DATABASE_SERVER) {
                continue;
            }
            if let Some(token) = &access_token {
                server
                    .headers
                    .insert("Authorization".to_string(), format!("Bearer {token}"));
            } else if let Some(existing) = server.headers.get("Authorization") {
                if !existing.starts_with("Bearer ") {
                    let normalized = format!("Bearer {existing}");
                    server.headers.insert("Authorization".to_string(), normalized);
                }
            }
        }
    }
}

/// Expand `$VAR` and `${VAR}` references against the process environment.
/// Unknown variables expand to the empty string.
pub fn interpolate_env_vars(value: &str) -> String {
    let mut out = String::new();
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut var_name = String::new();
                let mut found_close = false;
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == '}' {
                        found_close = true;
                        break;
                    }
                    var_name.push(next);
                }
                if found_close {
                    out.push_str(&std::env::var(&var_name).unwrap_or_default());
                } else {
                    out.push_str("${");
                    out.push_str(&var_name);
                }
            }
            Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut var_name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        var_name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&std::env::var(&var_name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serializes tests that touch process environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_transport_inference() {
        let stdio: McpServerConfig = serde_json::from_str(
            r#"{ "command": "npx", "args": ["-y", "some-mcp-server"] }"#,
        )
        .unwrap();
        assert_eq!(stdio.transport(), McpTransportType::Stdio);

        let http: McpServerConfig =
            serde_json::from_str(r#"{ "url": "https://mcp.example.com/mcp" }"#).unwrap();
        assert_eq!(http.transport(), McpTransportType::Http);
    }

    #[test]
    fn test_config_file_parses_servers() {
        let json = r#"{
            "mcpServers": {
                "supabase": { "url": "https://mcp.supabase.com/mcp" },
                "periskope-mcp": { "command": "npx", "args": ["-y", "periskope-mcp"] }
            }
        }"#;
        let config: McpConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.mcp_servers.len(), 2);
        assert!(config.mcp_servers.contains_key(DATABASE_SERVER));
        assert!(config.mcp_servers.contains_key(MESSAGING_SERVER));
    }

    #[test]
    fn test_interpolate_env_vars() {
        let _env = ENV_LOCK.lock().unwrap();
        std::env::set_var("TARWEEJ_TEST_TOKEN", "abc123");
        assert_eq!(interpolate_env_vars("Bearer $TARWEEJ_TEST_TOKEN"), "Bearer abc123");
        assert_eq!(interpolate_env_vars("${TARWEEJ_TEST_TOKEN}!"), "abc123!");
        assert_eq!(interpolate_env_vars("no vars here"), "no vars here");
        assert_eq!(interpolate_env_vars("$TARWEEJ_TEST_MISSING_VAR"), "");
    }

    #[test]
    fn test_bare_auth_header_is_normalized() {
        let _env = ENV_LOCK.lock().unwrap();
        std::env::remove_var("DATABASE_MCP_ACCESS_TOKEN");
        let json = r#"{
            "mcpServers": {
                "supabase": {
                    "url": "https://mcp.supabase.com/mcp",
                    "headers": { "Authorization": "raw-token" }
                }
            }
        }"#;
        let mut config: McpConfigFile = serde_json::from_str(json).unwrap();
        config.inject_database_auth();
        assert_eq!(
            config.mcp_servers["supabase"].headers["Authorization"],
            "Bearer raw-token"
        );
    }
}
