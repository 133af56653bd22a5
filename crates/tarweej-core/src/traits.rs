// Storage and delivery seams
//
// The workflow core depends on these traits; concrete implementations
// (Postgres, MCP, HTTP gateways) live in sibling crates.

use async_trait::async_trait;

use crate::error::Result;
use crate::records::{CampaignRecord, CreateCampaignOutcome, Prospect};

/// Filters accepted by a prospect listing
#[derive(Debug, Clone, Default)]
pub struct ProspectFilter {
    pub city: Option<String>,
    pub segment: Option<String>,
    pub consent_status: Option<String>,
    pub dnc: Option<bool>,
    pub limit: Option<i64>,
}

/// Read access to the prospect database
#[async_trait]
pub trait ProspectStore: Send + Sync {
    async fn list_prospects(&self, filter: &ProspectFilter) -> Result<Vec<Prospect>>;
}

/// Write access to campaign records
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn create_campaign(&self, record: &CampaignRecord) -> Result<CreateCampaignOutcome>;
}

/// Per-channel outbound message delivery
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Deliver `body` to `recipient` over the given channel. `recipient` is
    /// a phone number or email address depending on the channel.
    async fn send(&self, channel: crate::records::Channel, recipient: &str, body: &str)
        -> Result<serde_json::Value>;
}
