use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CandidateProvider, CandidateQuery, Lead, LeadStatus, Match, NotificationAttempt,
    ProviderCapacity, ProviderProfile,
};

/// Errors that can occur when interacting with the datastore
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Table does not exist: {0}")]
    MissingTable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Datastore unavailable: {0}")]
    Unavailable(String),
}

/// Everything the engine reads from and writes to the relational store
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Providers near the lead in its category (or a related one) above the
    /// rating floor, with `distance_miles` filled in, in datastore order
    async fn search_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateProvider>, StoreError>;

    /// Rolling 90-day response rate; `None` when the provider has no history
    async fn response_rate(&self, provider_id: Uuid) -> Result<Option<f64>, StoreError>;

    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError>;

    async fn update_lead_status(
        &self,
        lead_id: Uuid,
        status: LeadStatus,
        error: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Insert a lead's full match set in one batch
    async fn insert_matches(&self, matches: &[Match]) -> Result<(), StoreError>;

    async fn provider_profile(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<ProviderProfile>, StoreError>;

    async fn provider_capacity(&self, provider_id: Uuid) -> Result<ProviderCapacity, StoreError>;

    async fn record_notification(&self, attempt: &NotificationAttempt) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
