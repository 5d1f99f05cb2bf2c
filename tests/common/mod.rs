// Shared fakes for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use leadflow::config::MatchingSettings;
use leadflow::core::personalize::{LeadSummary, PersonalizedMessage};
use leadflow::core::{LeadOrchestrator, Matcher, NotificationDispatcher, RelatedCategories};
use leadflow::models::{
    BudgetRange, CandidateProvider, CandidateQuery, Channel, ClassifiedLead, ContactInfo, Lead,
    LeadStatus, LocationSignal, Match, NotificationAttempt, PriceTier, ProviderCapacity,
    ProviderProfile, Sentiment, ServiceCategory, Urgency,
};
use leadflow::services::{
    ChannelTransport, ClassifierError, DeliveryReceipt, LeadClassifier, LeadStore, Personalizer,
    PersonalizerError, StoreError, TransportError,
};

// ---------------------------------------------------------------------------
// Datastore
// ---------------------------------------------------------------------------

/// In-memory store that counts calls and can be told to fail
#[derive(Default)]
pub struct MockStore {
    pub candidates: Mutex<Vec<CandidateProvider>>,
    pub response_rates: Mutex<HashMap<Uuid, f64>>,
    pub profiles: Mutex<HashMap<Uuid, ProviderProfile>>,
    pub capacities: Mutex<HashMap<Uuid, ProviderCapacity>>,

    pub fail_search: AtomicBool,
    pub fail_response_rate: AtomicBool,
    pub fail_insert_lead: AtomicBool,
    pub fail_insert_matches: AtomicBool,
    pub fail_matched_status: AtomicBool,
    pub missing_notification_table: AtomicBool,

    pub leads: Mutex<Vec<Lead>>,
    pub status_updates: Mutex<Vec<(Uuid, LeadStatus, Option<String>)>>,
    pub match_batches: Mutex<Vec<Vec<Match>>>,
    pub notifications: Mutex<Vec<NotificationAttempt>>,

    pub search_calls: AtomicUsize,
    pub response_rate_calls: AtomicUsize,
    pub capacity_calls: AtomicUsize,
    pub record_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate along with a reachable profile
    pub fn add_provider(&self, candidate: CandidateProvider, profile: ProviderProfile) {
        self.profiles.lock().unwrap().insert(candidate.id, profile);
        self.candidates.lock().unwrap().push(candidate);
    }

    pub fn set_response_rate(&self, id: Uuid, rate: f64) {
        self.response_rates.lock().unwrap().insert(id, rate);
    }

    pub fn set_capacity(&self, id: Uuid, capacity: ProviderCapacity) {
        self.capacities.lock().unwrap().insert(id, capacity);
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn last_status(&self) -> Option<LeadStatus> {
        self.status_updates.lock().unwrap().last().map(|(_, s, _)| *s)
    }

    pub fn stored_leads(&self) -> Vec<Lead> {
        self.leads.lock().unwrap().clone()
    }

    pub fn recorded_notifications(&self) -> Vec<NotificationAttempt> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeadStore for MockStore {
    async fn search_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateProvider>, StoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        let categories = query.all_categories();
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.categories.iter().any(|cat| categories.contains(cat)))
            .filter(|c| c.rating >= query.min_rating && c.distance_miles <= query.radius_miles)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn response_rate(&self, provider_id: Uuid) -> Result<Option<f64>, StoreError> {
        self.response_rate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_response_rate.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("timeout".into()));
        }
        Ok(self.response_rates.lock().unwrap().get(&provider_id).copied())
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        if self.fail_insert_lead.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert failed".into()));
        }
        self.leads.lock().unwrap().push(lead.clone());
        Ok(())
    }

    async fn update_lead_status(
        &self,
        lead_id: Uuid,
        status: LeadStatus,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        if status == LeadStatus::Matched && self.fail_matched_status.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("status update failed".into()));
        }
        self.status_updates
            .lock()
            .unwrap()
            .push((lead_id, status, error.map(str::to_string)));
        if let Some(lead) = self.leads.lock().unwrap().iter_mut().find(|l| l.id == lead_id) {
            lead.status = status;
        }
        Ok(())
    }

    async fn insert_matches(&self, matches: &[Match]) -> Result<(), StoreError> {
        if self.fail_insert_matches.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("batch insert failed".into()));
        }
        self.match_batches.lock().unwrap().push(matches.to_vec());
        Ok(())
    }

    async fn provider_profile(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<ProviderProfile>, StoreError> {
        Ok(self.profiles.lock().unwrap().get(&provider_id).cloned())
    }

    async fn provider_capacity(&self, provider_id: Uuid) -> Result<ProviderCapacity, StoreError> {
        self.capacity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .capacities
            .lock()
            .unwrap()
            .get(&provider_id)
            .copied()
            .unwrap_or(ProviderCapacity {
                notifications_paused: false,
                monthly_quota: None,
                leads_this_month: 0,
            }))
    }

    async fn record_notification(&self, attempt: &NotificationAttempt) -> Result<(), StoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_notification_table.load(Ordering::SeqCst) {
            return Err(StoreError::MissingTable("notification_attempts".into()));
        }
        self.notifications.lock().unwrap().push(attempt.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Returns a scripted classification and counts calls
pub struct MockClassifier {
    response: Result<ClassifiedLead, String>,
    pub calls: AtomicUsize,
}

impl MockClassifier {
    pub fn returning(lead: ClassifiedLead) -> Self {
        Self { response: Ok(lead), calls: AtomicUsize::new(0) }
    }

    pub fn failing(message: &str) -> Self {
        Self { response: Err(message.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadClassifier for MockClassifier {
    async fn classify(&self, raw_text: &str) -> Result<ClassifiedLead, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if raw_text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput);
        }
        self.response
            .clone()
            .map_err(ClassifierError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Personalizer
// ---------------------------------------------------------------------------

pub enum PersonalizerMode {
    Fail,
    Reply(PersonalizedMessage),
}

pub struct MockPersonalizer {
    mode: PersonalizerMode,
    pub calls: AtomicUsize,
}

impl MockPersonalizer {
    pub fn failing() -> Self {
        Self { mode: PersonalizerMode::Fail, calls: AtomicUsize::new(0) }
    }

    pub fn replying(message: PersonalizedMessage) -> Self {
        Self { mode: PersonalizerMode::Reply(message), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Personalizer for MockPersonalizer {
    async fn personalize(
        &self,
        _lead: &LeadSummary,
        _provider: &ProviderProfile,
    ) -> Result<PersonalizedMessage, PersonalizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            PersonalizerMode::Fail => Err(PersonalizerError::Rejected("model overloaded".into())),
            PersonalizerMode::Reply(message) => Ok(message.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: Option<String>,
    pub message: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Records every send; can fail for chosen recipients and simulate latency
pub struct RecordingTransport {
    channel: Channel,
    delay: Duration,
    fail_for: HashSet<String>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub sent: Mutex<Vec<SentMessage>>,
}

impl RecordingTransport {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            delay: Duration::ZERO,
            fail_for: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_for(mut self, recipient: &str) -> Self {
        self.fail_for.insert(recipient.to_string());
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.recipient).collect()
    }
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        recipient: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<DeliveryReceipt, TransportError> {
        let started = Instant::now();
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.map(str::to_string),
            message: message.to_string(),
            started,
            finished: Instant::now(),
        });

        if self.fail_for.contains(recipient) {
            return Err(TransportError::Rejected { status: 500, body: "mailbox unavailable".into() });
        }
        Ok(DeliveryReceipt { message_id: Some(format!("msg-{}", Uuid::new_v4())) })
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn classified_lead(category: ServiceCategory, urgency: Urgency, quality_score: f64) -> ClassifiedLead {
    ClassifiedLead {
        service_category: category,
        urgency,
        budget: BudgetRange { min: 0.0, max: None },
        location: LocationSignal { zip: Some("46032".to_string()), latitude: None, longitude: None },
        key_requirements: vec![],
        sentiment: Sentiment::Neutral,
        quality_score,
    }
}

pub fn candidate(name: &str, distance_miles: f64, rating: f64) -> CandidateProvider {
    CandidateProvider {
        id: Uuid::new_v4(),
        business_name: name.to_string(),
        categories: vec![ServiceCategory::Plumbing],
        distance_miles,
        rating,
        response_rate: 0.5,
        price_tier: PriceTier::Standard,
        avg_job_price: None,
        avg_response_hours: None,
        offers_emergency: false,
        licensed: false,
        insured: false,
        capability_tags: vec![],
    }
}

pub fn email_for(candidate: &CandidateProvider) -> String {
    format!("{}@pros.test", candidate.business_name.to_lowercase().replace(' ', "-"))
}

pub fn profile_for(candidate: &CandidateProvider) -> ProviderProfile {
    ProviderProfile {
        id: candidate.id,
        business_name: candidate.business_name.clone(),
        email: Some(email_for(candidate)),
        phone: Some("+13175550100".to_string()),
        rating: candidate.rating,
        years_in_business: Some(8),
        categories: candidate.categories.clone(),
        completed_jobs: 120,
        email_notifications: true,
        sms_notifications: false,
    }
}

pub fn lead_with(classification: ClassifiedLead) -> Lead {
    Lead::new(
        "Water heater is leaking all over the basement".to_string(),
        ContactInfo { phone: Some("+13175550111".to_string()), email: None },
        classification,
        LeadStatus::Pending,
    )
}

pub fn match_for(lead: &Lead, candidate: &CandidateProvider, confidence: u8) -> Match {
    Match {
        id: Uuid::new_v4(),
        lead_id: lead.id,
        provider_id: candidate.id,
        business_name: candidate.business_name.clone(),
        confidence,
        distance_miles: candidate.distance_miles,
        reasons: vec![],
        status: leadflow::models::MatchStatus::Active,
        created_at: chrono::Utc::now(),
    }
}

pub fn matcher() -> Matcher {
    Matcher::new(
        MatchingSettings::default(),
        RelatedCategories::builtin().expect("bundled category map"),
    )
}

/// Orchestrator wired to the fakes with an email transport
pub fn orchestrator(
    classifier: Arc<MockClassifier>,
    store: Arc<MockStore>,
    email: Arc<RecordingTransport>,
) -> LeadOrchestrator {
    let dispatcher = NotificationDispatcher::new(store.clone()).with_email(email);
    LeadOrchestrator::new(classifier, store, matcher(), dispatcher)
}
