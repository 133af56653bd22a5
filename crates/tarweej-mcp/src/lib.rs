//! MCP session management for the campaign workflow.
//!
//! Connects the database and messaging MCP servers declared in mcp.json,
//! filters their tools through per-server allow-lists, and adapts them to
//! the workflow's [`tarweej_core::Tool`] trait.

pub mod client;
pub mod config;
pub mod gateway;
pub mod manager;
pub mod tools;

pub use config::{McpConfigFile, McpServerConfig, DATABASE_SERVER, MESSAGING_SERVER};
pub use gateway::McpMessageGateway;
pub use manager::SessionManager;
