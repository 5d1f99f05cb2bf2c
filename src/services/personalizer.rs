use async_trait::async_trait;
use thiserror::Error;

use crate::core::personalize::{LeadSummary, PersonalizedMessage};
use crate::models::ProviderProfile;
use crate::services::llm::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum PersonalizerError {
    #[error("Personalizer unavailable: {0}")]
    Unavailable(#[from] LlmError),

    #[error("Personalized message rejected: {0}")]
    Rejected(String),
}

/// Writes notification copy for one (lead, provider) pair
#[async_trait]
pub trait Personalizer: Send + Sync {
    async fn personalize(
        &self,
        lead: &LeadSummary,
        provider: &ProviderProfile,
    ) -> Result<PersonalizedMessage, PersonalizerError>;
}

const SYSTEM_PROMPT: &str = "You write short lead notifications for local service providers. \
    Reply with a JSON object with fields subject (at most 8 words), \
    message (exactly 3 sentences, 50-100 words, addressed to the provider, mentioning \
    the job, its urgency and why they are a good fit) and call_to_action (2-4 words). \
    Never include the customer's contact details.";

fn user_prompt(lead: &LeadSummary, provider: &ProviderProfile) -> String {
    let budget = lead
        .budget_max
        .map(|b| format!("up to ${:.0}", b))
        .unwrap_or_else(|| "not specified".to_string());
    let categories = provider
        .categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ");
    let years = provider
        .years_in_business
        .map(|y| y.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "Lead:\n- category: {}\n- urgency: {}\n- location: {}\n- budget: {}\n- requirements: {}\n- problem: {}\n\n\
         Provider:\n- name: {}\n- rating: {:.1}\n- years in business: {}\n- services: {}\n- completed jobs: {}",
        lead.category.label(),
        lead.urgency.as_str(),
        lead.location,
        budget,
        lead.requirements.join("; "),
        lead.problem_text,
        provider.business_name,
        provider.rating,
        years,
        categories,
        provider.completed_jobs,
    )
}

/// Personalizer backed by the shared LLM client
pub struct LlmPersonalizer {
    llm: LlmClient,
}

impl LlmPersonalizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Personalizer for LlmPersonalizer {
    async fn personalize(
        &self,
        lead: &LeadSummary,
        provider: &ProviderProfile,
    ) -> Result<PersonalizedMessage, PersonalizerError> {
        let message: PersonalizedMessage = self
            .llm
            .complete_json(SYSTEM_PROMPT, &user_prompt(lead, provider))
            .await?;
        Ok(message)
    }
}
