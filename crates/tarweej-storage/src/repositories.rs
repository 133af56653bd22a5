// Repository layer for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use tracing::info;

use tarweej_core::error::WorkflowError;
use tarweej_core::records::{CampaignRecord, CreateCampaignOutcome, Prospect};
use tarweej_core::traits::{CampaignStore, ProspectFilter, ProspectStore};

use crate::models::{CampaignRow, ProspectRow};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Prospects
    // ============================================

    pub async fn list_prospects(&self, filter: &ProspectFilter) -> Result<Vec<ProspectRow>> {
        let mut query = prospects_query(filter);
        let rows = query
            .build_query_as::<ProspectRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // ============================================
    // Campaigns
    // ============================================

    pub async fn insert_campaign(&self, record: &CampaignRecord) -> Result<CampaignRow> {
        let channels: Vec<String> = record.channels.iter().map(|c| c.to_string()).collect();
        let contacted = serde_json::to_value(&record.contacted_prospects)?;

        let row = sqlx::query_as::<_, CampaignRow>(
            r#"
            INSERT INTO campaigns (
                name, target_city, target_segment, channels, agent_persona, created_by,
                respect_dnc, require_consent, record_conversations,
                active_window_start, active_window_end, contacted_prospects,
                total_outreach, connect_rate, response_rate, click_rate, booked_appointments
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id, name, target_city, target_segment, channels, agent_persona,
                      created_by, respect_dnc, require_consent, record_conversations,
                      active_window_start, active_window_end, contacted_prospects,
                      total_outreach, connect_rate, response_rate, click_rate,
                      booked_appointments, created_at
            "#,
        )
        .bind(&record.name)
        .bind(record.target_city.to_string())
        .bind(record.target_segment.to_string())
        .bind(&channels)
        .bind(&record.agent_persona)
        .bind(&record.created_by)
        .bind(record.respect_dnc)
        .bind(record.require_consent)
        .bind(record.record_conversations)
        .bind(&record.active_window_start)
        .bind(&record.active_window_end)
        .bind(contacted)
        .bind(record.metrics.total_outreach as i32)
        .bind(record.metrics.connect_rate)
        .bind(record.metrics.response_rate)
        .bind(record.metrics.click_rate)
        .bind(record.metrics.booked_appointments as i32)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Builds the prospect listing query; omitted filters add no clauses.
/// `dnc = Some(false)` also matches NULL, since unset dnc means contactable.
fn prospects_query(filter: &ProspectFilter) -> QueryBuilder<'_, sqlx::Postgres> {
    let mut query = QueryBuilder::new(
        r#"
        SELECT id, full_name, language, city, primary_segment, phone,
               whatsapp_number, email, preferred_channel, consent_status, dnc,
               budget_min, budget_max, property_type_pref, beds_min,
               created_at, updated_at
        FROM prospects
        WHERE 1 = 1
        "#,
    );

    if let Some(city) = &filter.city {
        query.push(" AND city = ").push_bind(city);
    }
    if let Some(segment) = &filter.segment {
        query.push(" AND primary_segment = ").push_bind(segment);
    }
    if let Some(consent_status) = &filter.consent_status {
        query.push(" AND consent_status = ").push_bind(consent_status);
    }
    if let Some(dnc) = filter.dnc {
        query.push(" AND (dnc = ").push_bind(dnc);
        if !dnc {
            query.push(" OR dnc IS NULL");
        }
        query.push(")");
    }
    query.push(" ORDER BY id");
    if let Some(limit) = filter.limit {
        query.push(" LIMIT ").push_bind(limit);
    }
    query
}

#[async_trait]
impl ProspectStore for Database {
    async fn list_prospects(
        &self,
        filter: &ProspectFilter,
    ) -> tarweej_core::error::Result<Vec<Prospect>> {
        let rows = Database::list_prospects(self, filter)
            .await
            .map_err(|e| WorkflowError::storage(format!("failed to list prospects: {e}")))?;
        Ok(rows.into_iter().map(Prospect::from).collect())
    }
}

#[async_trait]
impl CampaignStore for Database {
    async fn create_campaign(
        &self,
        record: &CampaignRecord,
    ) -> tarweej_core::error::Result<CreateCampaignOutcome> {
        match self.insert_campaign(record).await {
            Ok(row) => {
                info!(campaign = %row.name, campaign_id = %row.id, "campaign persisted");
                Ok(CreateCampaignOutcome::created(row.id, row.name))
            }
            Err(e) => Ok(CreateCampaignOutcome::failed(format!(
                "failed to insert campaign: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prospects_query_unfiltered() {
        let sql = prospects_query(&ProspectFilter::default()).into_sql();
        assert!(sql.contains("FROM prospects"));
        assert!(sql.contains("ORDER BY id"));
        assert!(!sql.contains("AND city"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_prospects_query_with_all_filters() {
        let filter = ProspectFilter {
            city: Some("riyadh".to_string()),
            segment: Some("hnw".to_string()),
            consent_status: Some("opted_in".to_string()),
            dnc: Some(false),
            limit: Some(25),
        };
        let sql = prospects_query(&filter).into_sql();
        assert!(sql.contains("AND city = $1"));
        assert!(sql.contains("AND primary_segment = $2"));
        assert!(sql.contains("AND consent_status = $3"));
        assert!(sql.contains("AND (dnc = $4 OR dnc IS NULL)"));
        assert!(sql.contains("LIMIT $5"));
    }

    #[test]
    fn test_prospects_query_dnc_true_excludes_null_rows() {
        let filter = ProspectFilter {
            dnc: Some(true),
            ..ProspectFilter::default()
        };
        let sql = prospects_query(&filter).into_sql();
        assert!(sql.contains("AND (dnc = $1)"));
        assert!(!sql.contains("IS NULL"));
    }
}
