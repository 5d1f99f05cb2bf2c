use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::capacity::{check_capacity, CapacityDecision};
use crate::core::personalize::{fallback_message, validate_message, LeadSummary, PersonalizedMessage};
use crate::models::{Channel, DeliveryOutcome, Lead, Match, NotificationAttempt, ProviderProfile};
use crate::services::{ChannelTransport, LeadStore, Personalizer, StoreError};

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Why a candidate received no attempt at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Paused,
    QuotaExhausted,
    CapacityUnavailable,
    ProfileMissing,
}

/// Outcome of notifying one matched provider
#[derive(Debug, Clone)]
pub enum CandidateOutcome {
    Skipped {
        provider_id: Uuid,
        reason: SkipReason,
    },
    /// At least one channel succeeded
    Delivered {
        provider_id: Uuid,
        attempts: Vec<NotificationAttempt>,
    },
    /// Every attempted channel failed, or no channel was available
    Undelivered {
        provider_id: Uuid,
        attempts: Vec<NotificationAttempt>,
    },
}

impl CandidateOutcome {
    pub fn provider_id(&self) -> Uuid {
        match self {
            CandidateOutcome::Skipped { provider_id, .. }
            | CandidateOutcome::Delivered { provider_id, .. }
            | CandidateOutcome::Undelivered { provider_id, .. } => *provider_id,
        }
    }

    pub fn attempts(&self) -> &[NotificationAttempt] {
        match self {
            CandidateOutcome::Skipped { .. } => &[],
            CandidateOutcome::Delivered { attempts, .. }
            | CandidateOutcome::Undelivered { attempts, .. } => attempts,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, CandidateOutcome::Delivered { .. })
    }

    fn from_attempts(provider_id: Uuid, attempts: Vec<NotificationAttempt>) -> Self {
        if attempts.iter().any(NotificationAttempt::succeeded) {
            CandidateOutcome::Delivered { provider_id, attempts }
        } else {
            CandidateOutcome::Undelivered { provider_id, attempts }
        }
    }
}

/// Aggregated outcomes of one dispatch run, in match order
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<CandidateOutcome>,
    pub batches: usize,
}

impl DispatchReport {
    /// Providers reached on at least one channel
    pub fn notified(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CandidateOutcome::Skipped { .. }))
            .count()
    }

    pub fn attempts(&self) -> impl Iterator<Item = &NotificationAttempt> {
        self.outcomes.iter().flat_map(|o| o.attempts().iter())
    }
}

/// Fans notifications out to matched providers over every enabled channel
pub struct NotificationDispatcher {
    store: Arc<dyn LeadStore>,
    personalizer: Option<Arc<dyn Personalizer>>,
    email: Option<Arc<dyn ChannelTransport>>,
    sms: Option<Arc<dyn ChannelTransport>>,
    batch_size: usize,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self {
            store,
            personalizer: None,
            email: None,
            sms: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_personalizer(mut self, personalizer: Arc<dyn Personalizer>) -> Self {
        self.personalizer = Some(personalizer);
        self
    }

    pub fn with_email(mut self, transport: Arc<dyn ChannelTransport>) -> Self {
        self.email = Some(transport);
        self
    }

    pub fn with_sms(mut self, transport: Arc<dyn ChannelTransport>) -> Self {
        self.sms = Some(transport);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Notify every matched provider.
    ///
    /// Matches are processed in batches of `batch_size`; candidates within a
    /// batch run concurrently and the next batch starts only once the current
    /// one has fully settled. No candidate's failure affects another.
    pub async fn dispatch(&self, lead: &Lead, matches: &[Match]) -> DispatchReport {
        let summary = LeadSummary::from_lead(lead);
        let mut report = DispatchReport::default();

        for batch in matches.chunks(self.batch_size) {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|m| self.notify_candidate(lead, &summary, m)),
            )
            .await;

            report.batches += 1;
            report.outcomes.extend(outcomes);
        }

        tracing::info!(
            "Lead {}: notified {} of {} providers ({} skipped, {} batches)",
            lead.id,
            report.notified(),
            matches.len(),
            report.skipped(),
            report.batches
        );

        report
    }

    async fn notify_candidate(
        &self,
        lead: &Lead,
        summary: &LeadSummary,
        matched: &Match,
    ) -> CandidateOutcome {
        let provider_id = matched.provider_id;

        let capacity = match self.store.provider_capacity(provider_id).await {
            Ok(capacity) => capacity,
            Err(e) => {
                tracing::warn!("Capacity lookup failed for provider {}: {}", provider_id, e);
                return CandidateOutcome::Skipped {
                    provider_id,
                    reason: SkipReason::CapacityUnavailable,
                };
            }
        };

        match check_capacity(&capacity) {
            CapacityDecision::Eligible => {}
            CapacityDecision::Paused => {
                tracing::debug!("Provider {} has notifications paused", provider_id);
                return CandidateOutcome::Skipped { provider_id, reason: SkipReason::Paused };
            }
            CapacityDecision::QuotaExhausted => {
                tracing::debug!("Provider {} is over its monthly quota", provider_id);
                return CandidateOutcome::Skipped {
                    provider_id,
                    reason: SkipReason::QuotaExhausted,
                };
            }
        }

        let profile = match self.store.provider_profile(provider_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!("No profile for matched provider {}", provider_id);
                return CandidateOutcome::Skipped {
                    provider_id,
                    reason: SkipReason::ProfileMissing,
                };
            }
            Err(e) => {
                tracing::warn!("Profile lookup failed for provider {}: {}", provider_id, e);
                return CandidateOutcome::Skipped {
                    provider_id,
                    reason: SkipReason::ProfileMissing,
                };
            }
        };

        let message = self.compose(lead, summary, &profile).await;

        let channels = enabled_channels(&profile, self.email.is_some(), self.sms.is_some());
        let mut attempts = Vec::with_capacity(channels.len());

        for channel in channels {
            let attempt = match channel {
                Channel::Email => match (&self.email, profile.email.as_deref()) {
                    (Some(transport), Some(address)) => {
                        let body = format!("{}\n\n{}", message.message, message.call_to_action);
                        self.attempt(transport.as_ref(), matched, address, Some(&message.subject), &body)
                            .await
                    }
                    _ => continue,
                },
                Channel::Sms => match (&self.sms, profile.phone.as_deref()) {
                    (Some(transport), Some(phone)) => {
                        self.attempt(transport.as_ref(), matched, phone, None, &message.as_sms())
                            .await
                    }
                    _ => continue,
                },
            };
            attempts.push(attempt);
        }

        if attempts.is_empty() {
            tracing::debug!("Provider {} has no enabled channel", provider_id);
        }

        CandidateOutcome::from_attempts(provider_id, attempts)
    }

    /// Personalized copy, or the template when the personalizer is absent,
    /// fails or breaks its output contract
    async fn compose(
        &self,
        lead: &Lead,
        summary: &LeadSummary,
        profile: &ProviderProfile,
    ) -> PersonalizedMessage {
        let Some(personalizer) = &self.personalizer else {
            return fallback_message(&lead.classification);
        };

        match personalizer.personalize(summary, profile).await {
            Ok(message) => match validate_message(&message) {
                Ok(()) => message,
                Err(reason) => {
                    tracing::warn!(
                        "Personalized message for {} rejected ({}); using template",
                        profile.id,
                        reason
                    );
                    fallback_message(&lead.classification)
                }
            },
            Err(e) => {
                tracing::warn!("Personalization failed for {}: {}; using template", profile.id, e);
                fallback_message(&lead.classification)
            }
        }
    }

    /// Send over one channel and record the attempt whatever the outcome
    async fn attempt(
        &self,
        transport: &dyn ChannelTransport,
        matched: &Match,
        recipient: &str,
        subject: Option<&str>,
        message: &str,
    ) -> NotificationAttempt {
        let channel = transport.channel();
        let (outcome, message_id, error) = match transport.send(recipient, subject, message).await {
            Ok(receipt) => (DeliveryOutcome::Sent, receipt.message_id, None),
            Err(e) => {
                tracing::warn!(
                    "{} delivery to provider {} failed: {}",
                    channel,
                    matched.provider_id,
                    e
                );
                (DeliveryOutcome::Failed, None, Some(e.to_string()))
            }
        };

        let attempt = NotificationAttempt {
            id: Uuid::new_v4(),
            match_id: matched.id,
            lead_id: matched.lead_id,
            provider_id: matched.provider_id,
            channel,
            recipient: recipient.to_string(),
            subject: subject.map(str::to_string),
            message: message.to_string(),
            outcome,
            message_id,
            error,
            created_at: Utc::now(),
        };

        self.record(&attempt).await;
        attempt
    }

    async fn record(&self, attempt: &NotificationAttempt) {
        match self.store.record_notification(attempt).await {
            Ok(()) => {}
            Err(StoreError::MissingTable(table)) => {
                tracing::debug!("Notification table {} missing; attempt not recorded", table);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to record {} attempt for match {}: {}",
                    attempt.channel,
                    attempt.match_id,
                    e
                );
            }
        }
    }
}

/// Channels a provider would be contacted on, given which transports exist
pub fn enabled_channels(
    profile: &ProviderProfile,
    email_configured: bool,
    sms_configured: bool,
) -> Vec<Channel> {
    let mut channels = Vec::with_capacity(2);
    if email_configured && profile.email_notifications && profile.email.is_some() {
        channels.push(Channel::Email);
    }
    if sms_configured && profile.sms_notifications && profile.phone.is_some() {
        channels.push(Channel::Sms);
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceCategory;

    fn profile(email: bool, phone: bool, sms_enabled: bool) -> ProviderProfile {
        ProviderProfile {
            id: Uuid::new_v4(),
            business_name: "Test Pro".to_string(),
            email: email.then(|| "pro@example.com".to_string()),
            phone: phone.then(|| "+13175550100".to_string()),
            rating: 4.5,
            years_in_business: None,
            categories: vec![ServiceCategory::Plumbing],
            completed_jobs: 0,
            email_notifications: true,
            sms_notifications: sms_enabled,
        }
    }

    fn attempt(outcome: DeliveryOutcome) -> NotificationAttempt {
        NotificationAttempt {
            id: Uuid::new_v4(),
            match_id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            channel: Channel::Email,
            recipient: "pro@example.com".to_string(),
            subject: None,
            message: "hi".to_string(),
            outcome,
            message_id: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sms_requires_opt_in() {
        assert_eq!(enabled_channels(&profile(true, true, false), true, true), vec![Channel::Email]);
        assert_eq!(
            enabled_channels(&profile(true, true, true), true, true),
            vec![Channel::Email, Channel::Sms]
        );
    }

    #[test]
    fn test_unconfigured_transport_disables_channel() {
        assert!(enabled_channels(&profile(true, true, true), false, false).is_empty());
        assert_eq!(enabled_channels(&profile(false, true, true), true, true), vec![Channel::Sms]);
    }

    #[test]
    fn test_outcome_from_attempts() {
        let id = Uuid::new_v4();
        let partial = CandidateOutcome::from_attempts(
            id,
            vec![attempt(DeliveryOutcome::Failed), attempt(DeliveryOutcome::Sent)],
        );
        assert!(partial.is_delivered());

        let failed = CandidateOutcome::from_attempts(id, vec![attempt(DeliveryOutcome::Failed)]);
        assert!(!failed.is_delivered());
        assert_eq!(failed.attempts().len(), 1);

        let none = CandidateOutcome::from_attempts(id, vec![]);
        assert!(matches!(none, CandidateOutcome::Undelivered { .. }));
    }

    #[test]
    fn test_report_counts() {
        let id = Uuid::new_v4();
        let report = DispatchReport {
            outcomes: vec![
                CandidateOutcome::from_attempts(id, vec![attempt(DeliveryOutcome::Sent)]),
                CandidateOutcome::Skipped { provider_id: id, reason: SkipReason::Paused },
                CandidateOutcome::from_attempts(id, vec![attempt(DeliveryOutcome::Failed)]),
            ],
            batches: 1,
        };

        assert_eq!(report.notified(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.attempts().count(), 2);
    }
}
