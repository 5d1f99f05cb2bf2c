use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{ClassifiedLead, LeadStatus, Match};

/// Terminal outcome of processing one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorResult {
    pub lead_id: Option<Uuid>,
    pub classified_lead: Option<ClassifiedLead>,
    pub quality_score: Option<f64>,
    pub matches: Vec<Match>,
    pub notifications_sent: usize,
    pub status: LeadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
