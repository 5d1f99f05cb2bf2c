use serde::{Deserialize, Serialize};

use crate::models::{BudgetRange, ClassifiedLead, Lead, ServiceCategory, Urgency};

const MAX_SUBJECT_WORDS: usize = 8;
const MESSAGE_WORDS: std::ops::RangeInclusive<usize> = 50..=100;
const CTA_WORDS: std::ops::RangeInclusive<usize> = 2..=4;

/// What a provider is told about a lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSummary {
    pub category: ServiceCategory,
    pub urgency: Urgency,
    pub location: String,
    pub budget_max: Option<f64>,
    pub requirements: Vec<String>,
    pub problem_text: String,
}

impl LeadSummary {
    pub fn from_lead(lead: &Lead) -> Self {
        let c = &lead.classification;
        Self {
            category: c.service_category,
            urgency: c.urgency,
            location: c
                .location
                .zip
                .clone()
                .unwrap_or_else(|| "your service area".to_string()),
            budget_max: c.budget.max,
            requirements: c.key_requirements.clone(),
            problem_text: lead.problem_text.clone(),
        }
    }
}

/// Notification copy for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizedMessage {
    pub subject: String,
    pub message: String,
    pub call_to_action: String,
}

impl PersonalizedMessage {
    /// Single-part text for channels without a subject line
    pub fn as_sms(&self) -> String {
        format!("{}: {} {}", self.subject, self.message, self.call_to_action)
    }
}

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Check generated copy against the personalizer contract
pub fn validate_message(msg: &PersonalizedMessage) -> Result<(), String> {
    let subject_words = word_count(&msg.subject);
    if subject_words == 0 || subject_words > MAX_SUBJECT_WORDS {
        return Err(format!("subject has {} words", subject_words));
    }

    let message_words = word_count(&msg.message);
    if !MESSAGE_WORDS.contains(&message_words) {
        return Err(format!("message has {} words", message_words));
    }

    let cta_words = word_count(&msg.call_to_action);
    if !CTA_WORDS.contains(&cta_words) {
        return Err(format!("call to action has {} words", cta_words));
    }

    Ok(())
}

fn budget_text(budget: &BudgetRange) -> String {
    match (budget.min, budget.max) {
        (min, Some(max)) if min > 0.0 => format!("${:.0}-${:.0}", min, max),
        (_, Some(max)) => format!("up to ${:.0}", max),
        (min, None) if min > 0.0 => format!("${:.0}+", min),
        _ => "not specified".to_string(),
    }
}

/// Deterministic copy used whenever the personalizer cannot be used
pub fn fallback_message(lead: &ClassifiedLead) -> PersonalizedMessage {
    let label = lead.service_category.label();
    let subject = match lead.urgency {
        Urgency::Emergency => format!("Emergency {} request nearby", label),
        other => format!("New {} lead ({} priority)", label, other.as_str()),
    };

    let message = format!(
        "A homeowner near you is looking for {} help and has asked to be connected \
         with a trusted local professional. The request is marked {} priority \
         (budget: {}), and the customer is waiting to hear back from providers in \
         the area. Respond quickly to introduce yourself, confirm your availability, \
         and win this job before another provider does.",
        label,
        lead.urgency.as_str(),
        budget_text(&lead.budget)
    );

    PersonalizedMessage {
        subject,
        message,
        call_to_action: "View lead details".to_string(),
    }
}
