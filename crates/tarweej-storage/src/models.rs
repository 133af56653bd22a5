// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use tarweej_core::records::Prospect;

#[derive(Debug, Clone, FromRow)]
pub struct ProspectRow {
    pub id: i64,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProspectRow> for Prospect {
    fn from(row: ProspectRow) -> Self {
        Prospect {
            id: Some(row.id),
            full_name: row.full_name,
            language: row.language,
            city: row.city,
            primary_segment: row.primary_segment,
            phone: row.phone,
            whatsapp_number: row.whatsapp_number,
            email: row.email,
            preferred_channel: row.preferred_channel,
            consent_status: row.consent_status,
            dnc: row.dnc,
            budget_min: row.budget_min,
            budget_max: row.budget_max,
            property_type_pref: row.property_type_pref,
            beds_min: row.beds_min,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub name: String,
    pub target_city: String,
    pub target_segment: String,
    pub channels: Vec<String>,
    pub agent_persona: String,
    pub created_by: String,
    pub respect_dnc: bool,
    pub require_consent: bool,
    pub record_conversations: bool,
    pub active_window_start: Option<String>,
    pub active_window_end: Option<String>,
    pub contacted_prospects: sqlx::types::JsonValue,
    pub total_outreach: i32,
    pub connect_rate: f64,
    pub response_rate: f64,
    pub click_rate: f64,
    pub booked_appointments: i32,
    pub created_at: DateTime<Utc>,
}
