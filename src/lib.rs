//! Leadflow - lead matching and notification engine for a local-services marketplace
//!
//! Consumers describe a problem in free text. The engine classifies it, gates
//! it on quality, ranks nearby providers, and notifies the best of them over
//! email and SMS, recording every delivery attempt.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    LeadOrchestrator, Matcher, NotificationDispatcher, QualityGate, RelatedCategories,
};
pub use models::{ClassifiedLead, Lead, LeadStatus, LeadSubmission, Match, OrchestratorResult};
