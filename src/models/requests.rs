use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::domain::ContactInfo;
use crate::models::session::{IntakeSession, SessionRole};

/// A raw consumer submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_contact"))]
pub struct LeadSubmission {
    #[validate(length(min = 1, max = 5000))]
    #[serde(alias = "problemText")]
    pub problem_text: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    /// Used when the description itself carries no zip code
    #[serde(default, alias = "zipCode")]
    pub zip_code: Option<String>,
}

impl LeadSubmission {
    pub fn contact(&self) -> ContactInfo {
        ContactInfo {
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

/// Changes applied to an intake session by `PUT /sessions/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SessionUpdate {
    #[serde(default)]
    pub role: Option<SessionRole>,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub collected: HashMap<String, String>,
    #[serde(default, alias = "leadId")]
    pub lead_id: Option<Uuid>,
}

impl SessionUpdate {
    pub fn apply(self, session: &mut IntakeSession) {
        if let Some(content) = self.content.filter(|c| !c.trim().is_empty()) {
            session.push_turn(self.role.unwrap_or(SessionRole::Consumer), content);
        }
        session.collected.extend(self.collected);
        if self.lead_id.is_some() {
            session.lead_id = self.lead_id;
        }
        session.updated_at = chrono::Utc::now();
    }
}

fn validate_contact(submission: &LeadSubmission) -> Result<(), ValidationError> {
    if submission.contact().is_reachable() {
        Ok(())
    } else {
        let mut err = ValidationError::new("contact_required");
        err.message = Some("a phone number or email address is required".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(phone: Option<&str>, email: Option<&str>) -> LeadSubmission {
        LeadSubmission {
            problem_text: "Kitchen sink is clogged".to_string(),
            phone: phone.map(String::from),
            email: email.map(String::from),
            zip_code: None,
        }
    }

    #[test]
    fn test_submission_requires_contact() {
        assert!(submission(None, None).validate().is_err());
        assert!(submission(Some("+13175550100"), None).validate().is_ok());
        assert!(submission(None, Some("pat@example.com")).validate().is_ok());
    }

    #[test]
    fn test_submission_rejects_bad_email() {
        assert!(submission(None, Some("not-an-email")).validate().is_err());
    }

    #[test]
    fn test_session_update_appends_turn_and_answers() {
        let mut session = IntakeSession::new("s1");
        let update = SessionUpdate {
            role: None,
            content: Some("My AC stopped working".to_string()),
            collected: HashMap::from([("zip".to_string(), "46032".to_string())]),
            lead_id: None,
        };

        update.apply(&mut session);

        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.turns[0].role, SessionRole::Consumer);
        assert_eq!(session.collected.get("zip").map(String::as_str), Some("46032"));
    }

    #[test]
    fn test_submission_rejects_empty_text() {
        let mut s = submission(Some("+13175550100"), None);
        s.problem_text = String::new();
        assert!(s.validate().is_err());
    }
}
