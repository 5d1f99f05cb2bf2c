// Model exports
pub mod domain;
pub mod requests;
pub mod responses;
pub mod session;

pub use domain::{
    BoundingBox, BudgetRange, CandidateProvider, CandidateQuery, Channel, ClassifiedLead,
    ContactInfo, DeliveryOutcome, Lead, LeadStatus, LocationSignal, Match, MatchStatus,
    NotificationAttempt, PriceTier, ProviderCapacity, ProviderProfile, Sentiment,
    ServiceCategory, Urgency, DEFAULT_RESPONSE_RATE,
};
pub use requests::{LeadSubmission, SessionUpdate};
pub use responses::{ErrorResponse, HealthResponse, OrchestratorResult};
pub use session::{IntakeSession, SessionRole, SessionTurn};
