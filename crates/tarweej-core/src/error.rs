// Error types for the campaign workflow

use thiserror::Error;

/// Result type alias for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that can occur while driving a campaign workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// LLM provider error (transport failure or a broken output contract)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Tool execution error
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// External session error (MCP server unavailable or misbehaving)
    #[error("Session error: {0}")]
    Session(String),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Tool-dispatch loop exceeded its safety bound
    #[error("Max tool iterations ({0}) reached")]
    MaxIterationsReached(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WorkflowError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        WorkflowError::Llm(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        WorkflowError::ToolExecution(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        WorkflowError::Session(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        WorkflowError::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        WorkflowError::Configuration(msg.into())
    }
}
