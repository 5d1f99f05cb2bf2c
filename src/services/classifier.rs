use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    BudgetRange, ClassifiedLead, LocationSignal, Sentiment, ServiceCategory, Urgency,
};
use crate::services::llm::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Problem description is empty")]
    EmptyInput,

    #[error("Classification service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid classification: {0}")]
    InvalidClassification(String),
}

impl From<LlmError> for ClassifierError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(msg) => ClassifierError::InvalidClassification(msg),
            other => ClassifierError::Unavailable(other.to_string()),
        }
    }
}

/// Turns free text into a structured lead
#[async_trait]
pub trait LeadClassifier: Send + Sync {
    async fn classify(&self, raw_text: &str) -> Result<ClassifiedLead, ClassifierError>;
}

/// Wire shape the model is asked to produce
#[derive(Debug, Deserialize)]
struct ClassificationPayload {
    service_category: ServiceCategory,
    urgency: Urgency,
    #[serde(default)]
    budget_min: Option<f64>,
    #[serde(default)]
    budget_max: Option<f64>,
    #[serde(default)]
    location_zip: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    key_requirements: Vec<String>,
    sentiment: Sentiment,
    quality_score: f64,
}

impl ClassificationPayload {
    fn into_classified(self) -> Result<ClassifiedLead, ClassifierError> {
        let lead = ClassifiedLead {
            service_category: self.service_category,
            urgency: self.urgency,
            budget: BudgetRange {
                min: self.budget_min.unwrap_or(0.0),
                max: self.budget_max,
            },
            location: LocationSignal {
                zip: self.location_zip.filter(|z| !z.trim().is_empty()),
                latitude: self.latitude,
                longitude: self.longitude,
            },
            key_requirements: self
                .key_requirements
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            sentiment: self.sentiment,
            quality_score: self.quality_score,
        };
        lead.validate().map_err(ClassifierError::InvalidClassification)?;
        Ok(lead)
    }
}

fn system_prompt() -> String {
    let categories = ServiceCategory::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You classify home-service requests for a local services marketplace. \
         Reply with a single JSON object with these fields: \
         service_category (one of: {categories}), \
         urgency (emergency, high, medium or low), \
         budget_min (number or null), budget_max (number or null), \
         location_zip (5-digit string or null), latitude (number or null), longitude (number or null), \
         key_requirements (array of short strings, most important first), \
         sentiment (positive, neutral, negative or frustrated), \
         quality_score (0-10: how specific and actionable the request is; \
         vague or spam requests score below 5)."
    )
}

/// Classifier backed by the shared LLM client
pub struct LlmClassifier {
    llm: LlmClient,
}

impl LlmClassifier {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl LeadClassifier for LlmClassifier {
    async fn classify(&self, raw_text: &str) -> Result<ClassifiedLead, ClassifierError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let payload: ClassificationPayload = self.llm.complete_json(&system_prompt(), text).await?;
        let lead = payload.into_classified()?;

        tracing::debug!(
            "Classified lead as {} / {} (quality {:.1})",
            lead.service_category,
            lead.urgency.as_str(),
            lead.quality_score
        );

        Ok(lead)
    }
}
