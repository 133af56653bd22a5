// Outbound message delivery
//
// WhatsApp goes through the messaging MCP session. Email and phone text
// delivery post to plain HTTP webhook endpoints configured via
// EMAIL_WEBHOOK_URL and SMS_WEBHOOK_URL; an unconfigured channel is a
// tool-level failure, not a crash.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use tarweej_core::error::{Result, WorkflowError};
use tarweej_core::records::Channel;
use tarweej_core::traits::MessageGateway;

use crate::manager::{SessionManager, SEND_MESSAGE_TOOL};

pub struct McpMessageGateway {
    manager: Arc<SessionManager>,
    http: reqwest::Client,
    email_webhook: Option<String>,
    sms_webhook: Option<String>,
}

impl McpMessageGateway {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            email_webhook: std::env::var("EMAIL_WEBHOOK_URL").ok(),
            sms_webhook: std::env::var("SMS_WEBHOOK_URL").ok(),
        }
    }

    async fn post_webhook(&self, url: &str, recipient: &str, body: &str) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .json(&json!({ "to": recipient, "message": body }))
            .send()
            .await
            .map_err(|e| WorkflowError::tool(format!("webhook request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(WorkflowError::tool(format!(
                "webhook returned status {status}"
            )));
        }
        response
            .json::<Value>()
            .await
            .or(Ok(json!({ "status": "sent" })))
    }
}

#[async_trait]
impl MessageGateway for McpMessageGateway {
    async fn send(&self, channel: Channel, recipient: &str, body: &str) -> Result<Value> {
        info!(channel = %channel, recipient = %recipient, "sending message");
        match channel {
            Channel::Whatsapp => {
                self.manager
                    .call_messaging_tool(
                        SEND_MESSAGE_TOOL,
                        json!({ "to": recipient, "message": body }),
                    )
                    .await
            }
            Channel::Email => {
                let url = self.email_webhook.as_deref().ok_or_else(|| {
                    WorkflowError::tool("EMAIL_WEBHOOK_URL not configured")
                })?;
                self.post_webhook(url, recipient, body).await
            }
            Channel::Call | Channel::Sms => {
                let url = self.sms_webhook.as_deref().ok_or_else(|| {
                    WorkflowError::tool("SMS_WEBHOOK_URL not configured")
                })?;
                self.post_webhook(url, recipient, body).await
            }
        }
    }
}
