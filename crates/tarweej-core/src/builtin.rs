// Built-in tools
//
// Database and messaging tools exposed to the LLM during the campaign and
// send stages. Each wraps one of the seam traits so the concrete backend
// stays out of the core crate.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::records::Channel;
use crate::tools::{Tool, ToolExecutionResult};
use crate::traits::{MessageGateway, ProspectFilter, ProspectStore};

// ==== Database ====

/// Lists every prospect row as one `key=value, ...` line per prospect
pub struct ListProspectsTool {
    store: Arc<dyn ProspectStore>,
}

impl ListProspectsTool {
    pub fn new(store: Arc<dyn ProspectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListProspectsTool {
    fn name(&self) -> &str {
        "list_prospects"
    }

    fn description(&self) -> &str {
        "Query the prospects table and list prospects, optionally filtered. Returns one \
         formatted row per prospect with id, full_name, language, city, primary_segment, \
         phone, whatsapp_number, email, preferred_channel, consent_status, dnc, \
         budget_min, budget_max, property_type_pref and beds_min."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "Only prospects in this city (e.g. 'riyadh')"
                },
                "segment": {
                    "type": "string",
                    "description": "Only prospects in this primary segment (e.g. 'hnw')"
                },
                "consent_status": {
                    "type": "string",
                    "enum": ["opted_in", "opted_out", "unknown"],
                    "description": "Only prospects with this consent status"
                },
                "exclude_dnc": {
                    "type": "boolean",
                    "description": "When true, drop prospects flagged do-not-contact"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of rows to return"
                }
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: Value) -> ToolExecutionResult {
        let filter = ProspectFilter {
            city: arguments
                .get("city")
                .and_then(Value::as_str)
                .map(str::to_string),
            segment: arguments
                .get("segment")
                .and_then(Value::as_str)
                .map(str::to_string),
            consent_status: arguments
                .get("consent_status")
                .and_then(Value::as_str)
                .map(str::to_string),
            dnc: match arguments.get("exclude_dnc").and_then(Value::as_bool) {
                Some(true) => Some(false),
                _ => None,
            },
            limit: arguments.get("limit").and_then(Value::as_i64),
        };

        let prospects = match self.store.list_prospects(&filter).await {
            Ok(rows) => rows,
            Err(e) => return ToolExecutionResult::InternalError(e.to_string()),
        };

        if prospects.is_empty() {
            info!("list_prospects found no prospects");
            return ToolExecutionResult::Success(json!("No prospects found in the database."));
        }

        info!(count = prospects.len(), "list_prospects returning rows");
        let rows: Vec<String> = prospects.iter().map(|p| p.format_line()).collect();
        ToolExecutionResult::Success(json!(rows.join("\n")))
    }
}

// ==== Messaging ====

fn personalize(message: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => message.replace("{name}", name),
        None => message.to_string(),
    }
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolExecutionResult> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ToolExecutionResult::ToolError(format!("missing required parameter '{key}'"))
        })
}

/// One batch recipient parsed from a `customer_list` argument
struct BatchRecipient {
    name: Option<String>,
    contact: Option<String>,
}

fn customer_list(arguments: &Value) -> Result<Vec<BatchRecipient>, ToolExecutionResult> {
    let list = arguments
        .get("customer_list")
        .and_then(Value::as_array)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| {
            ToolExecutionResult::ToolError(
                "missing required parameter 'customer_list'".to_string(),
            )
        })?;
    Ok(list
        .iter()
        .map(|c| BatchRecipient {
            name: c.get("name").and_then(Value::as_str).map(str::to_string),
            contact: c
                .get("contact")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        })
        .collect())
}

fn customer_list_schema(contact_description: &str) -> Value {
    json!({
        "type": "array",
        "description": "Recipients for this batch",
        "items": {
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Recipient name" },
                "contact": { "type": "string", "description": contact_description }
            },
            "required": ["name", "contact"]
        }
    })
}

/// Sends `template` to every recipient, substituting `{name}` per recipient.
/// A failed recipient never aborts the batch; failures show up in the summary.
async fn send_batch(
    gateway: &Arc<dyn MessageGateway>,
    channel: Channel,
    template: &str,
    subject: Option<&str>,
    recipients: Vec<BatchRecipient>,
    language: &str,
) -> ToolExecutionResult {
    let total = recipients.len();
    let mut sent = 0usize;
    let mut failures: Vec<String> = Vec::new();

    for recipient in recipients {
        let label = recipient.name.as_deref().unwrap_or("unknown").to_string();
        let Some(contact) = recipient.contact else {
            failures.push(format!("{label}: missing contact"));
            continue;
        };
        let mut body = personalize(template, recipient.name.as_deref());
        if let Some(subject) = subject {
            body = format!("Subject: {subject}\n\n{body}");
        }
        match gateway.send(channel, &contact, &body).await {
            Ok(_) => sent += 1,
            Err(e) => failures.push(format!("{label}: {e}")),
        }
    }

    info!(%channel, sent, total, "batch send complete");
    let mut summary = format!("Sent {sent} of {total} {channel} message(s) in {language}.");
    if !failures.is_empty() {
        summary.push_str(&format!(" Failed: {}", failures.join("; ")));
    }
    ToolExecutionResult::Success(json!(summary))
}

/// Sends a campaign email to a batch of recipients
pub struct SendEmailTool {
    gateway: Arc<dyn MessageGateway>,
}

impl SendEmailTool {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send a campaign email to a list of customers. The {name} placeholder in the \
         template is replaced with each recipient's name. Returns a delivery summary."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "template": {
                    "type": "string",
                    "description": "Email body template; {name} is substituted per recipient"
                },
                "subject": { "type": "string", "description": "Email subject line" },
                "customer_list": customer_list_schema("Recipient email address"),
                "language": {
                    "type": "string",
                    "enum": ["english", "arabic"],
                    "description": "Language of the template"
                }
            },
            "required": ["template", "subject", "customer_list", "language"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: Value) -> ToolExecutionResult {
        let template = match required_str(&arguments, "template") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let subject = match required_str(&arguments, "subject") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let recipients = match customer_list(&arguments) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let language = arguments
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or("english");

        send_batch(
            &self.gateway,
            Channel::Email,
            template,
            Some(subject),
            recipients,
            language,
        )
        .await
    }
}

/// Sends a WhatsApp message to a batch of recipients
pub struct SendWhatsappTool {
    gateway: Arc<dyn MessageGateway>,
}

impl SendWhatsappTool {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for SendWhatsappTool {
    fn name(&self) -> &str {
        "send_whatsapp"
    }

    fn description(&self) -> &str {
        "Send a WhatsApp message to a list of customers. The {name} placeholder in the \
         template is replaced with each recipient's name. Returns a delivery summary."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "template": {
                    "type": "string",
                    "description": "Message template; {name} is substituted per recipient"
                },
                "customer_list": customer_list_schema("Recipient phone number"),
                "language": {
                    "type": "string",
                    "enum": ["english", "arabic"],
                    "description": "Language of the template"
                }
            },
            "required": ["template", "customer_list", "language"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: Value) -> ToolExecutionResult {
        let template = match required_str(&arguments, "template") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let recipients = match customer_list(&arguments) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let language = arguments
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or("english");

        send_batch(
            &self.gateway,
            Channel::Whatsapp,
            template,
            None,
            recipients,
            language,
        )
        .await
    }
}

/// Sends a text message to a phone number through the messaging gateway
pub struct SendPhoneTextTool {
    gateway: Arc<dyn MessageGateway>,
}

impl SendPhoneTextTool {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for SendPhoneTextTool {
    fn name(&self) -> &str {
        "send_phone_text"
    }

    fn description(&self) -> &str {
        "Send a text message to a single recipient phone number, used for the call \
         channel. Returns a delivery status."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": { "type": "string", "description": "Recipient phone number" },
                "message": { "type": "string", "description": "Message body" },
                "language": {
                    "type": "string",
                    "enum": ["english", "arabic"],
                    "description": "Language of the message"
                }
            },
            "required": ["to", "message"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: Value) -> ToolExecutionResult {
        let to = match required_str(&arguments, "to") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let message = match required_str(&arguments, "message") {
            Ok(v) => v,
            Err(e) => return e,
        };

        match self.gateway.send(Channel::Call, to, message).await {
            Ok(_) => ToolExecutionResult::Success(json!(format!("Sent phone text to {to}."))),
            Err(e) => ToolExecutionResult::ToolError(format!("failed to send phone text: {e}")),
        }
    }
}
