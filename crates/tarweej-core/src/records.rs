// Campaign domain records
//
// CustomerRecord is what the extraction stage produces from raw prospect
// rows; CampaignDetails/CampaignRecord feed the persistence stage.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Outreach channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Call,
    Sms,
    Whatsapp,
    Email,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Call => write!(f, "call"),
            Channel::Sms => write!(f, "sms"),
            Channel::Whatsapp => write!(f, "whatsapp"),
            Channel::Email => write!(f, "email"),
        }
    }
}

/// Customer language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Arabic,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Arabic => write!(f, "arabic"),
        }
    }
}

/// Marketing-contact permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    OptedIn,
    OptedOut,
    Unknown,
}

/// A customer extracted from prospect rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
    pub preferred_channel: Channel,
    /// Phone number or email address, depending on the channel
    pub contact: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_status: Option<ConsentStatus>,
}

impl CustomerRecord {
    /// Retention invariant: a record is kept only when it carries contact
    /// info appropriate to its channel. Records failing this are dropped
    /// before entering the workflow state.
    pub fn has_required_contact(&self) -> bool {
        let contact = self.contact.trim();
        if contact.is_empty() {
            return false;
        }
        match self.preferred_channel {
            Channel::Email => contact.contains('@'),
            Channel::Call | Channel::Sms | Channel::Whatsapp => true,
        }
    }

    /// Frontend-facing projection (channel keyed as `preferred_channel`)
    pub fn frontend_projection(&self) -> Value {
        self.projection("preferred_channel")
    }

    /// Persistence-facing projection (channel keyed as `channel`)
    pub fn persistence_projection(&self) -> Value {
        self.projection("channel")
    }

    fn projection(&self, channel_key: &str) -> Value {
        json!({
            "name": self.name,
            channel_key: self.preferred_channel.to_string(),
            "contact": self.contact,
            "language": self.language.to_string(),
            "city": self.city,
            "segment": self.segment,
            "budget_max": self.budget_max,
            "property_type_preference": self.property_type_preference,
            "dnc": self.dnc,
            "consent_status": self.consent_status,
        })
    }
}

/// A raw prospect row from the database, prior to extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    pub id: Option<i64>,
    pub full_name: Option<String>,
    pub language: Option<String>,
    pub city: Option<String>,
    pub primary_segment: Option<String>,
    pub phone: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub preferred_channel: Option<String>,
    pub consent_status: Option<String>,
    pub dnc: Option<bool>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub property_type_pref: Option<String>,
    pub beds_min: Option<i32>,
}

impl Prospect {
    /// Format this prospect as one `key=value, ...` line for the LLM.
    /// NULLs render as `NULL`, booleans lowercase.
    pub fn format_line(&self) -> String {
        fn fmt<T: std::fmt::Display>(value: &Option<T>) -> String {
            match value {
                Some(v) => v.to_string(),
                None => "NULL".to_string(),
            }
        }

        [
            format!("id={}", fmt(&self.id)),
            format!("full_name={}", fmt(&self.full_name)),
            format!("language={}", fmt(&self.language)),
            format!("city={}", fmt(&self.city)),
            format!("primary_segment={}", fmt(&self.primary_segment)),
            format!("phone={}", fmt(&self.phone)),
            format!("whatsapp_number={}", fmt(&self.whatsapp_number)),
            format!("email={}", fmt(&self.email)),
            format!("preferred_channel={}", fmt(&self.preferred_channel)),
            format!("consent_status={}", fmt(&self.consent_status)),
            format!("dnc={}", fmt(&self.dnc)),
            format!("budget_min={}", fmt(&self.budget_min)),
            format!("budget_max={}", fmt(&self.budget_max)),
            format!("property_type_pref={}", fmt(&self.property_type_pref)),
            format!("beds_min={}", fmt(&self.beds_min)),
        ]
        .join(", ")
    }
}

/// Campaign target city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCity {
    Riyadh,
    Jeddah,
    All,
}

impl std::fmt::Display for TargetCity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetCity::Riyadh => write!(f, "riyadh"),
            TargetCity::Jeddah => write!(f, "jeddah"),
            TargetCity::All => write!(f, "all"),
        }
    }
}

/// Campaign target segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSegment {
    Hnw,
    Investor,
    FirstTime,
    All,
}

impl std::fmt::Display for TargetSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetSegment::Hnw => write!(f, "hnw"),
            TargetSegment::Investor => write!(f, "investor"),
            TargetSegment::FirstTime => write!(f, "first_time"),
            TargetSegment::All => write!(f, "all"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Campaign metadata extracted from the user request.
///
/// Produced once per request by the serialize stage and consumed immediately
/// by the persistence call; not retained in WorkflowState.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDetails {
    pub name: String,
    pub target_city: TargetCity,
    pub target_segment: TargetSegment,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default = "default_true")]
    pub respect_dnc: bool,
    #[serde(default = "default_true")]
    pub require_consent: bool,
    #[serde(default = "default_true")]
    pub record_conversations: bool,
    /// HH:MM:SS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_window_start: Option<String>,
    /// HH:MM:SS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_window_end: Option<String>,
}

/// Synthetic engagement metrics attached to a persisted campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub total_outreach: u32,
    pub connect_rate: f64,
    pub response_rate: f64,
    pub click_rate: f64,
    pub booked_appointments: u32,
}

impl CampaignMetrics {
    /// Draw synthetic metrics for a campaign that contacted `total_outreach`
    /// prospects.
    ///
    /// connect_rate is always 100.0. response_rate is drawn from [50, 100]
    /// with probability 0.7, else [0, 50], two-decimal precision; click_rate
    /// equals response_rate. booked_appointments is drawn from the lower
    /// half [0, total/2] with probability 0.8, else from the upper half;
    /// always 0 for an empty campaign.
    pub fn synthesize(total_outreach: u32) -> Self {
        let mut rng = rand::thread_rng();

        let response_rate = if rng.gen_bool(0.7) {
            rng.gen_range(50.0..=100.0_f64)
        } else {
            rng.gen_range(0.0..50.0_f64)
        };
        let response_rate = (response_rate * 100.0).round() / 100.0;

        let booked_appointments = if total_outreach == 0 {
            0
        } else {
            let lower_max = total_outreach / 2;
            if rng.gen_bool(0.8) {
                rng.gen_range(0..=lower_max)
            } else {
                rng.gen_range(lower_max + 1..=total_outreach)
            }
        };

        Self {
            total_outreach,
            connect_rate: 100.0,
            response_rate,
            click_rate: response_rate,
            booked_appointments,
        }
    }
}

/// A campaign record ready for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub name: String,
    pub target_city: TargetCity,
    pub target_segment: TargetSegment,
    pub channels: Vec<Channel>,
    pub agent_persona: String,
    pub created_by: String,
    pub respect_dnc: bool,
    pub require_consent: bool,
    pub record_conversations: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_window_end: Option<String>,
    /// Persistence projections of the contacted customers
    pub contacted_prospects: Vec<Value>,
    #[serde(flatten)]
    pub metrics: CampaignMetrics,
}

impl CampaignRecord {
    /// Assemble a record from extracted details, contacted customers, and
    /// freshly drawn metrics.
    pub fn assemble(
        details: CampaignDetails,
        agent_persona: String,
        created_by: String,
        contacted: &[CustomerRecord],
    ) -> Self {
        let contacted_prospects: Vec<Value> = contacted
            .iter()
            .map(CustomerRecord::persistence_projection)
            .collect();
        let metrics = CampaignMetrics::synthesize(contacted_prospects.len() as u32);

        Self {
            name: details.name,
            target_city: details.target_city,
            target_segment: details.target_segment,
            channels: details.channels,
            agent_persona,
            created_by,
            respect_dnc: details.respect_dnc,
            require_consent: details.require_consent,
            record_conversations: details.record_conversations,
            active_window_start: details.active_window_start,
            active_window_end: details.active_window_end,
            contacted_prospects,
            metrics,
        }
    }
}

/// Outcome of a campaign-record insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaignOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<uuid::Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreateCampaignOutcome {
    /// Successful insert
    pub fn created(campaign_id: uuid::Uuid, campaign_name: impl Into<String>) -> Self {
        Self {
            success: true,
            campaign_id: Some(campaign_id),
            campaign_name: Some(campaign_name.into()),
            error: None,
        }
    }

    /// Failed insert
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            campaign_id: None,
            campaign_name: None,
            error: Some(error.into()),
        }
    }
}
