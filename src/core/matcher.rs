use chrono::Utc;
use uuid::Uuid;

use crate::config::MatchingSettings;
use crate::core::categories::RelatedCategories;
use crate::core::scoring::score_candidate;
use crate::models::{
    CandidateProvider, CandidateQuery, ClassifiedLead, Match, MatchStatus, DEFAULT_RESPONSE_RATE,
};
use crate::services::LeadStore;

/// Result of ranking one lead's candidates
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<Match>,
    pub total_candidates: usize,
}

/// Retrieval + scoring pipeline
///
/// # Pipeline Stages
/// 1. Candidate retrieval (radius, category, rating prefilter in the datastore)
/// 2. Response-rate enrichment
/// 3. Scoring
/// 4. Confidence floor, ranking and truncation
#[derive(Debug, Clone)]
pub struct Matcher {
    settings: MatchingSettings,
    related: RelatedCategories,
}

impl Matcher {
    pub fn new(settings: MatchingSettings, related: RelatedCategories) -> Self {
        Self { settings, related }
    }

    pub fn settings(&self) -> &MatchingSettings {
        &self.settings
    }

    pub fn related(&self) -> &RelatedCategories {
        &self.related
    }

    /// Datastore query for a lead's candidates
    pub fn candidate_query(&self, lead: &ClassifiedLead) -> CandidateQuery {
        CandidateQuery {
            category: lead.service_category,
            related_categories: self.related.related_to(lead.service_category),
            location: lead.location.clone(),
            radius_miles: self.settings.radius_miles,
            min_rating: self.settings.min_rating,
            limit: self.settings.candidate_limit,
        }
    }

    /// Score, filter and rank already-retrieved candidates.
    ///
    /// Candidates below `min_confidence` are dropped; the rest are ordered by
    /// confidence (highest first) and cut to `max_matches`. The sort is stable,
    /// so equal confidences keep the order the candidates arrived in.
    pub fn rank(
        &self,
        lead_id: Uuid,
        lead: &ClassifiedLead,
        candidates: Vec<CandidateProvider>,
    ) -> MatchResult {
        let total_candidates = candidates.len();
        let now = Utc::now();

        let mut matches: Vec<Match> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = score_candidate(lead, &candidate, &self.related);
                if score.confidence < self.settings.min_confidence {
                    tracing::debug!(
                        "Dropping {} (confidence {})",
                        candidate.business_name,
                        score.confidence
                    );
                    return None;
                }

                Some(Match {
                    id: Uuid::new_v4(),
                    lead_id,
                    provider_id: candidate.id,
                    business_name: candidate.business_name,
                    confidence: score.confidence,
                    distance_miles: candidate.distance_miles,
                    reasons: score.reasons,
                    status: MatchStatus::Active,
                    created_at: now,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        matches.truncate(self.settings.max_matches);

        MatchResult {
            matches,
            total_candidates,
        }
    }

    /// Find the best providers for a lead.
    ///
    /// Never fails: a retrieval error yields an empty list, and a failed
    /// response-rate lookup falls back to the default rate for that candidate.
    pub async fn find_matches(
        &self,
        store: &dyn LeadStore,
        lead_id: Uuid,
        lead: &ClassifiedLead,
    ) -> Vec<Match> {
        let query = self.candidate_query(lead);

        let mut candidates = match store.search_candidates(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Candidate retrieval failed for lead {}: {}", lead_id, e);
                return Vec::new();
            }
        };

        for candidate in candidates.iter_mut() {
            candidate.response_rate = match store.response_rate(candidate.id).await {
                Ok(Some(rate)) => rate,
                Ok(None) => DEFAULT_RESPONSE_RATE,
                Err(e) => {
                    tracing::warn!(
                        "Response rate lookup failed for provider {}: {}",
                        candidate.id,
                        e
                    );
                    DEFAULT_RESPONSE_RATE
                }
            };
        }

        let result = self.rank(lead_id, lead, candidates);

        tracing::info!(
            "Lead {}: {} matches from {} candidates",
            lead_id,
            result.matches.len(),
            result.total_candidates
        );

        result.matches
    }
}
