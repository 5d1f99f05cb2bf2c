use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of a consumer intake conversation.
///
/// Sessions are always loaded from and saved to the session store at each
/// entry point; nothing here is kept in process memory between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSession {
    pub session_id: String,
    #[serde(default)]
    pub turns: Vec<SessionTurn>,
    /// Answers gathered so far, keyed by question id
    #[serde(default)]
    pub collected: HashMap<String, String>,
    #[serde(default)]
    pub lead_id: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntakeSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
            collected: HashMap::new(),
            lead_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_turn(&mut self, role: SessionRole, content: impl Into<String>) {
        let now = Utc::now();
        self.turns.push(SessionTurn {
            role,
            content: content.into(),
            at: now,
        });
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTurn {
    pub role: SessionRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Consumer,
    Assistant,
}
