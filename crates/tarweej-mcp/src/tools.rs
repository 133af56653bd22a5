// MCP tool adapter
//
// Exposes a remote MCP tool through the workflow's Tool trait so the
// dispatcher treats it like any built-in.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use tarweej_core::tools::{Tool, ToolExecutionResult};

use crate::client::{McpSession, McpToolSpec};

pub struct McpTool {
    session: Arc<McpSession>,
    name: String,
    description: String,
    input_schema: Value,
}

impl McpTool {
    pub fn new(session: Arc<McpSession>, spec: McpToolSpec) -> Self {
        Self {
            session,
            name: spec.name,
            description: spec.description.unwrap_or_default(),
            input_schema: spec.input_schema,
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn execute(&self, arguments: Value) -> ToolExecutionResult {
        match self.session.call_tool(&self.name, arguments).await {
            Ok(output) if output.is_error => ToolExecutionResult::ToolError(output.text),
            Ok(output) => ToolExecutionResult::Success(json!(output.text)),
            Err(e) => ToolExecutionResult::InternalError(format!(
                "MCP call to '{}' on '{}' failed: {e}",
                self.name,
                self.session.name()
            )),
        }
    }
}
