use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::dispatcher::NotificationDispatcher;
use crate::core::lifecycle::{LeadStage, Lifecycle, LifecycleError, Transition};
use crate::core::matcher::Matcher;
use crate::core::quality::{QualityDecision, QualityGate};
use crate::models::{ClassifiedLead, Lead, LeadStatus, LeadSubmission, Match, OrchestratorResult};
use crate::services::{ClassifierError, LeadClassifier, LeadStore, StoreError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),

    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// What is known about a lead so far; survives an aborted run
#[derive(Debug, Default)]
struct Progress {
    lifecycle: Lifecycle,
    lead_id: Option<Uuid>,
    classified: Option<ClassifiedLead>,
    matches: Vec<Match>,
}

impl Progress {
    fn result(
        self,
        status: LeadStatus,
        notifications_sent: usize,
        error: Option<String>,
    ) -> OrchestratorResult {
        OrchestratorResult {
            lead_id: self.lead_id,
            quality_score: self.classified.as_ref().map(|c| c.quality_score),
            classified_lead: self.classified,
            matches: self.matches,
            notifications_sent,
            status,
            error,
        }
    }
}

/// Drives one submission from raw text to a terminal lead status
pub struct LeadOrchestrator {
    classifier: Arc<dyn LeadClassifier>,
    store: Arc<dyn LeadStore>,
    matcher: Matcher,
    dispatcher: NotificationDispatcher,
    quality_gate: QualityGate,
    auto_send: bool,
}

impl LeadOrchestrator {
    pub fn new(
        classifier: Arc<dyn LeadClassifier>,
        store: Arc<dyn LeadStore>,
        matcher: Matcher,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            classifier,
            store,
            matcher,
            dispatcher,
            quality_gate: QualityGate::default(),
            auto_send: true,
        }
    }

    pub fn with_quality_gate(mut self, gate: QualityGate) -> Self {
        self.quality_gate = gate;
        self
    }

    pub fn with_auto_send(mut self, auto_send: bool) -> Self {
        self.auto_send = auto_send;
        self
    }

    /// Process one submission.
    ///
    /// Always returns a result with a definite status. Failures end in
    /// `error`; if the lead row was already written its status is updated
    /// to `error` as well, on a best-effort basis.
    pub async fn process_lead(&self, submission: &LeadSubmission) -> OrchestratorResult {
        let mut progress = Progress::default();

        match self.run(submission, &mut progress).await {
            Ok((status, notifications_sent)) => progress.result(status, notifications_sent, None),
            Err(e) => self.fail(progress, e).await,
        }
    }

    async fn run(
        &self,
        submission: &LeadSubmission,
        progress: &mut Progress,
    ) -> Result<(LeadStatus, usize), OrchestratorError> {
        let text = submission.problem_text.trim();
        if text.is_empty() {
            return Err(OrchestratorError::InvalidSubmission(
                "problem description is empty".to_string(),
            ));
        }
        let contact = submission.contact();
        if !contact.is_reachable() {
            return Err(OrchestratorError::InvalidSubmission(
                "a phone number or email address is required".to_string(),
            ));
        }

        // 1. Classify
        let mut classified = self.classifier.classify(text).await?;
        if classified.location.zip.is_none() && classified.location.coordinates().is_none() {
            classified.location.zip = submission.zip_code.clone();
        }
        progress.lifecycle.advance(LeadStage::Classified)?;
        progress.classified = Some(classified.clone());

        tracing::info!(
            "Classified submission as {} ({}, quality {:.1})",
            classified.service_category,
            classified.urgency.as_str(),
            classified.quality_score
        );

        // 2. Quality gate
        if self.quality_gate.evaluate(classified.quality_score) == QualityDecision::Reject {
            let lead = Lead::new(text.to_string(), contact, classified, LeadStatus::LowQuality);
            self.store.insert_lead(&lead).await?;
            progress.lead_id = Some(lead.id);
            progress.lifecycle.advance(LeadStage::LowQuality)?;

            tracing::info!(
                "Lead {} rejected as low quality (min {:.1})",
                lead.id,
                self.quality_gate.min_score()
            );
            return Ok((LeadStatus::LowQuality, 0));
        }

        // 3. Persist as pending
        progress.lifecycle.advance(LeadStage::Pending)?;
        let lead = Lead::new(text.to_string(), contact, classified, LeadStatus::Pending);
        self.store.insert_lead(&lead).await?;
        progress.lead_id = Some(lead.id);

        // 4. Match
        let matches = self
            .matcher
            .find_matches(self.store.as_ref(), lead.id, &lead.classification)
            .await;

        if matches.is_empty() {
            self.persist_stage(progress, lead.id, LeadStage::NoMatches).await?;
            tracing::info!("Lead {} has no matching providers", lead.id);
            return Ok((LeadStatus::NoMatches, 0));
        }

        // 5. Persist the match set
        self.store.insert_matches(&matches).await?;
        progress.matches = matches;

        // 6. Notify
        let notifications_sent = if self.auto_send {
            self.dispatcher.dispatch(&lead, &progress.matches).await.notified()
        } else {
            tracing::debug!("Auto-send disabled; lead {} not dispatched", lead.id);
            0
        };

        // 7. Done
        self.persist_stage(progress, lead.id, LeadStage::Matched).await?;

        tracing::info!(
            "Lead {} matched {} providers, notified {}",
            lead.id,
            progress.matches.len(),
            notifications_sent
        );

        Ok((LeadStatus::Matched, notifications_sent))
    }

    async fn persist_stage(
        &self,
        progress: &mut Progress,
        lead_id: Uuid,
        stage: LeadStage,
    ) -> Result<(), OrchestratorError> {
        if progress.lifecycle.advance(stage)? == Transition::Unchanged {
            return Ok(());
        }
        if let Some(status) = stage.persisted_status() {
            self.store.update_lead_status(lead_id, status, None).await?;
        }
        Ok(())
    }

    async fn fail(&self, mut progress: Progress, err: OrchestratorError) -> OrchestratorResult {
        let message = err.to_string();

        match &err {
            OrchestratorError::InvalidSubmission(_)
            | OrchestratorError::Classification(ClassifierError::EmptyInput) => {
                tracing::warn!("Rejected submission: {}", message);
            }
            _ => tracing::error!("Lead processing failed: {}", message),
        }

        if let Err(e) = progress.lifecycle.advance(LeadStage::Error) {
            tracing::debug!("{}", e);
        }

        if let Some(lead_id) = progress.lead_id {
            if let Err(e) = self
                .store
                .update_lead_status(lead_id, LeadStatus::Error, Some(&message))
                .await
            {
                tracing::warn!("Could not mark lead {} as error: {}", lead_id, e);
            }
        }

        // An error result carries no partial match set
        progress.matches.clear();
        progress.result(LeadStatus::Error, 0, Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_result_carries_quality_score() {
        let progress = Progress {
            classified: Some(ClassifiedLead {
                service_category: crate::models::ServiceCategory::Cleaning,
                urgency: crate::models::Urgency::Low,
                budget: crate::models::BudgetRange { min: 0.0, max: None },
                location: crate::models::LocationSignal { zip: None, latitude: None, longitude: None },
                key_requirements: vec![],
                sentiment: crate::models::Sentiment::Neutral,
                quality_score: 3.5,
            }),
            ..Default::default()
        };

        let result = progress.result(LeadStatus::LowQuality, 0, None);
        assert_eq!(result.quality_score, Some(3.5));
        assert_eq!(result.status, LeadStatus::LowQuality);
        assert!(result.lead_id.is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = OrchestratorError::from(ClassifierError::EmptyInput);
        assert_eq!(err.to_string(), "Classification failed: Problem description is empty");
    }
}
