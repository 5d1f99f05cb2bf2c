// Core engine exports
pub mod capacity;
pub mod categories;
pub mod dispatcher;
pub mod distance;
pub mod lifecycle;
pub mod matcher;
pub mod orchestrator;
pub mod personalize;
pub mod quality;
pub mod scoring;

pub use capacity::{check_capacity, CapacityDecision};
pub use categories::{CategoryMapError, RelatedCategories};
pub use dispatcher::{CandidateOutcome, DispatchReport, NotificationDispatcher, SkipReason};
pub use distance::{calculate_bounding_box, haversine_miles, is_within_bounding_box};
pub use lifecycle::{LeadStage, Lifecycle, LifecycleError, Transition};
pub use matcher::{MatchResult, Matcher};
pub use orchestrator::{LeadOrchestrator, OrchestratorError};
pub use personalize::{fallback_message, validate_message, LeadSummary, PersonalizedMessage};
pub use quality::{QualityDecision, QualityGate};
pub use scoring::{score_candidate, MatchScore, ScoreBreakdown};
