use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::core::distance::{calculate_bounding_box, haversine_miles};
use crate::models::{
    CandidateProvider, CandidateQuery, Lead, LeadStatus, Match, NotificationAttempt, PriceTier,
    ProviderCapacity, ProviderProfile, ServiceCategory, DEFAULT_RESPONSE_RATE,
};
use crate::services::store::{LeadStore, StoreError};

/// Postgres error code for `undefined_table`
const UNDEFINED_TABLE: &str = "42P01";

/// Mean earth radius in miles, the same sphere `haversine_miles` uses
const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// PostgreSQL-backed datastore for providers, leads, matches and notification audit rows
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool (no migrations are run)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Coordinates for a lead: explicit lat/lng first, then the zip centroid table
    async fn resolve_coordinates(&self, query: &CandidateQuery) -> Result<(f64, f64), StoreError> {
        if let Some(coords) = query.location.coordinates() {
            return Ok(coords);
        }

        let zip = query
            .location
            .zip
            .as_deref()
            .ok_or_else(|| StoreError::NotFound("lead has no zip code or coordinates".into()))?;

        let row = sqlx::query("SELECT latitude, longitude FROM zip_centroids WHERE zip = $1")
            .bind(zip)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("unknown zip code {}", zip)))?;

        Ok((row.try_get("latitude")?, row.try_get("longitude")?))
    }
}

fn parse_categories(raw: Vec<String>) -> Vec<ServiceCategory> {
    raw.iter()
        .filter_map(|c| match c.parse::<ServiceCategory>() {
            Ok(category) => Some(category),
            Err(e) => {
                tracing::warn!("Skipping stored category: {}", e);
                None
            }
        })
        .collect()
}

fn non_negative(value: Option<i32>) -> Option<u32> {
    value.map(|v| u32::try_from(v).unwrap_or(0))
}

fn candidate_from_row(row: &PgRow, distance_miles: f64) -> Result<CandidateProvider, StoreError> {
    let price_tier: String = row.try_get("price_tier")?;
    Ok(CandidateProvider {
        id: row.try_get("id")?,
        business_name: row.try_get("business_name")?,
        categories: parse_categories(row.try_get("categories")?),
        distance_miles,
        rating: row.try_get("rating")?,
        response_rate: DEFAULT_RESPONSE_RATE,
        price_tier: price_tier
            .parse::<PriceTier>()
            .map_err(StoreError::InvalidData)?,
        avg_job_price: row.try_get("avg_job_price")?,
        avg_response_hours: row.try_get("avg_response_hours")?,
        offers_emergency: row.try_get("offers_emergency")?,
        licensed: row.try_get("licensed")?,
        insured: row.try_get("insured")?,
        capability_tags: row.try_get("capability_tags")?,
    })
}

#[async_trait]
impl LeadStore for PostgresClient {
    async fn search_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateProvider>, StoreError> {
        let (lat, lon) = self.resolve_coordinates(query).await?;
        let bbox = calculate_bounding_box(lat, lon, query.radius_miles);

        let categories: Vec<String> = query
            .all_categories()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        // Radius is checked in SQL so LIMIT only counts in-radius rows.
        // Exact-category providers first, then by rating
        let sql = r#"
            SELECT id, business_name, categories, latitude, longitude, rating, price_tier,
                   avg_job_price, avg_response_hours, offers_emergency, licensed, insured,
                   capability_tags
            FROM service_providers
            WHERE is_active
              AND categories && $1
              AND rating >= $2
              AND latitude BETWEEN $3 AND $4
              AND longitude BETWEEN $5 AND $6
              AND $9 * 2 * ASIN(SQRT(
                    POWER(SIN(RADIANS(latitude - $10) / 2), 2)
                    + COS(RADIANS($10)) * COS(RADIANS(latitude))
                      * POWER(SIN(RADIANS(longitude - $11) / 2), 2)
                  )) <= $12
            ORDER BY ($7 = ANY(categories)) DESC, rating DESC
            LIMIT $8
        "#;

        let rows = sqlx::query(sql)
            .bind(&categories)
            .bind(query.min_rating)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .bind(query.category.as_str())
            .bind(query.limit as i64)
            .bind(EARTH_RADIUS_MILES)
            .bind(lat)
            .bind(lon)
            .bind(query.radius_miles)
            .fetch_all(&self.pool)
            .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let distance = haversine_miles(
                lat,
                lon,
                row.try_get("latitude")?,
                row.try_get("longitude")?,
            );
            candidates.push(candidate_from_row(row, distance)?);
        }

        tracing::debug!(
            "Found {} candidates within {}mi",
            candidates.len(),
            query.radius_miles
        );

        Ok(candidates)
    }

    async fn response_rate(&self, provider_id: Uuid) -> Result<Option<f64>, StoreError> {
        let query = r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status <> 'active') AS responded
            FROM lead_matches
            WHERE provider_id = $1
              AND created_at > NOW() - INTERVAL '90 days'
        "#;

        let row = sqlx::query(query)
            .bind(provider_id)
            .fetch_one(&self.pool)
            .await?;

        let total: i64 = row.try_get("total")?;
        let responded: i64 = row.try_get("responded")?;

        if total == 0 {
            return Ok(None);
        }
        Ok(Some(responded as f64 / total as f64))
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO leads (
                id, problem_text, contact_phone, contact_email, service_category, urgency,
                budget_min, budget_max, location_zip, latitude, longitude, key_requirements,
                sentiment, quality_score, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#;

        let c = &lead.classification;
        sqlx::query(query)
            .bind(lead.id)
            .bind(&lead.problem_text)
            .bind(&lead.contact.phone)
            .bind(&lead.contact.email)
            .bind(c.service_category.as_str())
            .bind(c.urgency.as_str())
            .bind(c.budget.min)
            .bind(c.budget.max)
            .bind(&c.location.zip)
            .bind(c.location.latitude)
            .bind(c.location.longitude)
            .bind(&c.key_requirements)
            .bind(c.sentiment.as_str())
            .bind(c.quality_score)
            .bind(lead.status.as_str())
            .bind(lead.created_at)
            .bind(lead.updated_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Inserted lead {} ({})", lead.id, lead.status);
        Ok(())
    }

    async fn update_lead_status(
        &self,
        lead_id: Uuid,
        status: LeadStatus,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        let query = r#"
            UPDATE leads
            SET status = $2, error_message = $3, updated_at = NOW()
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(lead_id)
            .bind(status.as_str())
            .bind(error)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("lead {}", lead_id)));
        }
        Ok(())
    }

    async fn insert_matches(&self, matches: &[Match]) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO lead_matches (
                id, lead_id, provider_id, confidence, distance_miles, reasons, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#;

        let mut tx = self.pool.begin().await?;
        for m in matches {
            sqlx::query(query)
                .bind(m.id)
                .bind(m.lead_id)
                .bind(m.provider_id)
                .bind(i16::from(m.confidence))
                .bind(m.distance_miles)
                .bind(&m.reasons)
                .bind(m.status.as_str())
                .bind(m.created_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!("Inserted {} matches", matches.len());
        Ok(())
    }

    async fn provider_profile(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<ProviderProfile>, StoreError> {
        let query = r#"
            SELECT id, business_name, email, phone, rating, years_in_business, categories,
                   completed_jobs, email_notifications, sms_notifications
            FROM service_providers
            WHERE id = $1
        "#;

        let Some(row) = sqlx::query(query)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(ProviderProfile {
            id: row.try_get("id")?,
            business_name: row.try_get("business_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            rating: row.try_get("rating")?,
            years_in_business: non_negative(row.try_get("years_in_business")?),
            categories: parse_categories(row.try_get("categories")?),
            completed_jobs: non_negative(Some(row.try_get("completed_jobs")?)).unwrap_or(0),
            email_notifications: row.try_get("email_notifications")?,
            sms_notifications: row.try_get("sms_notifications")?,
        }))
    }

    async fn provider_capacity(&self, provider_id: Uuid) -> Result<ProviderCapacity, StoreError> {
        let query = r#"
            SELECT notifications_paused, monthly_lead_quota, leads_this_month
            FROM service_providers
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("provider {}", provider_id)))?;

        Ok(ProviderCapacity {
            notifications_paused: row.try_get("notifications_paused")?,
            monthly_quota: non_negative(row.try_get("monthly_lead_quota")?),
            leads_this_month: non_negative(Some(row.try_get("leads_this_month")?)).unwrap_or(0),
        })
    }

    async fn record_notification(&self, attempt: &NotificationAttempt) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO notification_attempts (
                id, match_id, lead_id, provider_id, channel, recipient, subject, message,
                outcome, message_id, error, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#;

        let outcome = match attempt.outcome {
            crate::models::DeliveryOutcome::Sent => "sent",
            crate::models::DeliveryOutcome::Failed => "failed",
        };

        sqlx::query(query)
            .bind(attempt.id)
            .bind(attempt.match_id)
            .bind(attempt.lead_id)
            .bind(attempt.provider_id)
            .bind(attempt.channel.as_str())
            .bind(&attempt.recipient)
            .bind(&attempt.subject)
            .bind(&attempt.message)
            .bind(outcome)
            .bind(&attempt.message_id)
            .bind(&attempt.error)
            .bind(attempt.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let missing_table = matches!(
                    &e,
                    sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE)
                );
                if missing_table {
                    StoreError::MissingTable("notification_attempts".to_string())
                } else {
                    StoreError::SqlxError(e)
                }
            })?;

        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(Into::into)
    }
}
