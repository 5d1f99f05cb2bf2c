use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Service categories a lead can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Plumbing,
    Electrical,
    Hvac,
    Roofing,
    Landscaping,
    Cleaning,
    PestControl,
    Painting,
    Carpentry,
    Flooring,
    ApplianceRepair,
    Handyman,
    GeneralContractor,
    Locksmith,
    Moving,
    Other,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 16] = [
        ServiceCategory::Plumbing,
        ServiceCategory::Electrical,
        ServiceCategory::Hvac,
        ServiceCategory::Roofing,
        ServiceCategory::Landscaping,
        ServiceCategory::Cleaning,
        ServiceCategory::PestControl,
        ServiceCategory::Painting,
        ServiceCategory::Carpentry,
        ServiceCategory::Flooring,
        ServiceCategory::ApplianceRepair,
        ServiceCategory::Handyman,
        ServiceCategory::GeneralContractor,
        ServiceCategory::Locksmith,
        ServiceCategory::Moving,
        ServiceCategory::Other,
    ];

    /// Stable identifier used in the database and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Plumbing => "plumbing",
            ServiceCategory::Electrical => "electrical",
            ServiceCategory::Hvac => "hvac",
            ServiceCategory::Roofing => "roofing",
            ServiceCategory::Landscaping => "landscaping",
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::PestControl => "pest_control",
            ServiceCategory::Painting => "painting",
            ServiceCategory::Carpentry => "carpentry",
            ServiceCategory::Flooring => "flooring",
            ServiceCategory::ApplianceRepair => "appliance_repair",
            ServiceCategory::Handyman => "handyman",
            ServiceCategory::GeneralContractor => "general_contractor",
            ServiceCategory::Locksmith => "locksmith",
            ServiceCategory::Moving => "moving",
            ServiceCategory::Other => "other",
        }
    }

    /// Human-readable label for notification copy
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Plumbing => "plumbing",
            ServiceCategory::Electrical => "electrical",
            ServiceCategory::Hvac => "HVAC",
            ServiceCategory::Roofing => "roofing",
            ServiceCategory::Landscaping => "landscaping",
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::PestControl => "pest control",
            ServiceCategory::Painting => "painting",
            ServiceCategory::Carpentry => "carpentry",
            ServiceCategory::Flooring => "flooring",
            ServiceCategory::ApplianceRepair => "appliance repair",
            ServiceCategory::Handyman => "handyman",
            ServiceCategory::GeneralContractor => "general contracting",
            ServiceCategory::Locksmith => "locksmith",
            ServiceCategory::Moving => "moving",
            ServiceCategory::Other => "home service",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ServiceCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown service category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Emergency,
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Emergency => "emergency",
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
        }
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emergency" => Ok(Urgency::Emergency),
            "high" => Ok(Urgency::High),
            "medium" => Ok(Urgency::Medium),
            "low" => Ok(Urgency::Low),
            other => Err(format!("unknown urgency: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Frustrated,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Frustrated => "frustrated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Budget,
    Standard,
    Premium,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Budget => "budget",
            PriceTier::Standard => "standard",
            PriceTier::Premium => "premium",
        }
    }
}

impl FromStr for PriceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(PriceTier::Budget),
            "standard" => Ok(PriceTier::Standard),
            "premium" => Ok(PriceTier::Premium),
            other => Err(format!("unknown price tier: {}", other)),
        }
    }
}

/// Budget the consumer stated, in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

impl BudgetRange {
    /// Midpoint of the range; an open-ended range uses its lower bound
    pub fn midpoint(&self) -> f64 {
        match self.max {
            Some(max) => (self.min + max) / 2.0,
            None => self.min,
        }
    }

    pub fn is_specified(&self) -> bool {
        self.min > 0.0 || self.max.is_some()
    }
}

/// Where the work is, as extracted from the problem description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSignal {
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl LocationSignal {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Structured output of the classification step. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLead {
    pub service_category: ServiceCategory,
    pub urgency: Urgency,
    pub budget: BudgetRange,
    pub location: LocationSignal,
    #[serde(default)]
    pub key_requirements: Vec<String>,
    pub sentiment: Sentiment,
    pub quality_score: f64,
}

impl ClassifiedLead {
    /// Check the invariants a classification must hold before the engine accepts it
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=10.0).contains(&self.quality_score) {
            return Err(format!(
                "quality score {} is outside 0-10",
                self.quality_score
            ));
        }
        if self.budget.min < 0.0 {
            return Err("budget minimum is negative".to_string());
        }
        if let Some(max) = self.budget.max {
            if max < self.budget.min {
                return Err(format!(
                    "budget maximum {} is below minimum {}",
                    max, self.budget.min
                ));
            }
        }
        Ok(())
    }

    /// Does any stated requirement mention the given keyword
    pub fn requires(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.key_requirements
            .iter()
            .any(|r| r.to_lowercase().contains(&keyword))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Pending,
    LowQuality,
    NoMatches,
    Matched,
    Error,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::LowQuality => "low_quality",
            LeadStatus::NoMatches => "no_matches",
            LeadStatus::Matched => "matched",
            LeadStatus::Error => "error",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the consumer can be reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactInfo {
    pub fn is_reachable(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.phone) || present(&self.email)
    }
}

/// Persisted lead aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub problem_text: String,
    pub contact: ContactInfo,
    pub classification: ClassifiedLead,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(
        problem_text: String,
        contact: ContactInfo,
        classification: ClassifiedLead,
        status: LeadStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            problem_text,
            contact,
            classification,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Provider projection returned by candidate retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProvider {
    pub id: Uuid,
    pub business_name: String,
    pub categories: Vec<ServiceCategory>,
    /// Miles from the lead, computed at retrieval time
    pub distance_miles: f64,
    pub rating: f64,
    #[serde(default = "default_response_rate")]
    pub response_rate: f64,
    pub price_tier: PriceTier,
    #[serde(default)]
    pub avg_job_price: Option<f64>,
    #[serde(default)]
    pub avg_response_hours: Option<f64>,
    #[serde(default)]
    pub offers_emergency: bool,
    #[serde(default)]
    pub licensed: bool,
    #[serde(default)]
    pub insured: bool,
    #[serde(default)]
    pub capability_tags: Vec<String>,
}

/// Response rate assumed for providers without history
pub const DEFAULT_RESPONSE_RATE: f64 = 0.5;

fn default_response_rate() -> f64 {
    DEFAULT_RESPONSE_RATE
}

/// Notification capacity state for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapacity {
    pub notifications_paused: bool,
    /// `None` means no monthly cap
    pub monthly_quota: Option<u32>,
    pub leads_this_month: u32,
}

/// Provider details used to personalize and address notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub business_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub rating: f64,
    #[serde(default)]
    pub years_in_business: Option<u32>,
    pub categories: Vec<ServiceCategory>,
    #[serde(default)]
    pub completed_jobs: u32,
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default)]
    pub sms_notifications: bool,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Accepted,
    Declined,
    Converted,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "active",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Declined => "declined",
            MatchStatus::Converted => "converted",
        }
    }
}

/// A scored pairing of a lead and a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub provider_id: Uuid,
    pub business_name: String,
    /// 0-100, comparable only within one lead's match set
    pub confidence: u8,
    pub distance_miles: f64,
    pub reasons: Vec<String>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

/// One delivery attempt over one channel for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAttempt {
    pub id: Uuid,
    pub match_id: Uuid,
    pub lead_id: Uuid,
    pub provider_id: Uuid,
    pub channel: Channel,
    pub recipient: String,
    pub subject: Option<String>,
    pub message: String,
    pub outcome: DeliveryOutcome,
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome == DeliveryOutcome::Sent
    }
}

/// Candidate search parameters handed to the datastore
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub category: ServiceCategory,
    pub related_categories: Vec<ServiceCategory>,
    pub location: LocationSignal,
    pub radius_miles: f64,
    pub min_rating: f64,
    pub limit: usize,
}

impl CandidateQuery {
    /// The lead category followed by its related categories
    pub fn all_categories(&self) -> Vec<ServiceCategory> {
        let mut all = vec![self.category];
        all.extend(
            self.related_categories
                .iter()
                .copied()
                .filter(|c| *c != self.category),
        );
        all
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}
