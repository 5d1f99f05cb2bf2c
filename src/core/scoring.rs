use serde::{Deserialize, Serialize};

use crate::core::categories::RelatedCategories;
use crate::models::{CandidateProvider, ClassifiedLead, PriceTier, ServiceCategory, Urgency};

/// Points earned by each factor. Maximums: 30/20/15/15/10/5/5 = 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: u8,
    pub category: u8,
    pub rating: u8,
    pub response_rate: u8,
    pub price_fit: u8,
    pub urgency_fit: u8,
    pub requirement_fit: u8,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        self.distance
            + self.category
            + self.rating
            + self.response_rate
            + self.price_fit
            + self.urgency_fit
            + self.requirement_fit
    }
}

/// Score of one candidate against one lead
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    pub confidence: u8,
    pub breakdown: ScoreBreakdown,
    /// Advisory only; never feeds back into the score
    pub reasons: Vec<String>,
}

/// Points for one factor plus the reason it earned, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorScore {
    pub points: u8,
    pub reason: Option<String>,
}

impl FactorScore {
    fn new(points: u8, reason: Option<String>) -> Self {
        Self { points, reason }
    }

    fn silent(points: u8) -> Self {
        Self { points, reason: None }
    }
}

/// Score a candidate provider for a classified lead (0-100)
///
/// Pure: identical inputs always yield the identical score and reasons.
///
/// Scoring formula (additive, each factor bounded):
///   distance (30) + category (20) + rating (15) + response rate (15)
///   + price-tier fit (10) + urgency fit (5) + requirement fit (5)
pub fn score_candidate(
    lead: &ClassifiedLead,
    candidate: &CandidateProvider,
    related: &RelatedCategories,
) -> MatchScore {
    let factors = [
        distance_score(candidate.distance_miles),
        category_score(lead.service_category, &candidate.categories, related),
        rating_score(candidate.rating),
        response_rate_score(candidate.response_rate),
        price_fit_score(lead, candidate),
        urgency_fit_score(lead.urgency, candidate),
        requirement_fit_score(lead, candidate),
    ];

    let breakdown = ScoreBreakdown {
        distance: factors[0].points,
        category: factors[1].points,
        rating: factors[2].points,
        response_rate: factors[3].points,
        price_fit: factors[4].points,
        urgency_fit: factors[5].points,
        requirement_fit: factors[6].points,
    };

    let reasons = factors.into_iter().filter_map(|f| f.reason).collect();

    MatchScore {
        confidence: breakdown.total().min(100),
        breakdown,
        reasons,
    }
}

/// Step function over distance: <5mi 30, <10mi 25, <15mi 15, <20mi 10, else 5
pub fn distance_score(miles: f64) -> FactorScore {
    if miles < 5.0 {
        FactorScore::new(30, Some(format!("Very close ({:.1} mi)", miles)))
    } else if miles < 10.0 {
        FactorScore::new(25, Some(format!("Nearby ({:.1} mi)", miles)))
    } else if miles < 15.0 {
        FactorScore::silent(15)
    } else if miles < 20.0 {
        FactorScore::silent(10)
    } else {
        FactorScore::silent(5)
    }
}

pub fn category_score(
    lead_category: ServiceCategory,
    candidate_categories: &[ServiceCategory],
    related: &RelatedCategories,
) -> FactorScore {
    if candidate_categories.contains(&lead_category) {
        return FactorScore::new(20, Some(format!("Specializes in {}", lead_category.label())));
    }

    match candidate_categories
        .iter()
        .find(|c| related.is_related(lead_category, **c))
    {
        Some(other) => FactorScore::new(12, Some(format!("Also offers {} services", other.label()))),
        None => FactorScore::silent(0),
    }
}

pub fn rating_score(rating: f64) -> FactorScore {
    if rating >= 4.8 {
        FactorScore::new(15, Some(format!("Excellent rating ({:.1}⭐)", rating)))
    } else if rating >= 4.5 {
        FactorScore::new(13, Some(format!("Great rating ({:.1}⭐)", rating)))
    } else if rating >= 4.0 {
        FactorScore::new(10, Some(format!("Good rating ({:.1}⭐)", rating)))
    } else if rating >= 3.5 {
        FactorScore::silent(6)
    } else {
        FactorScore::silent(0)
    }
}

pub fn response_rate_score(rate: f64) -> FactorScore {
    let percent = (rate * 100.0).round();
    if rate >= 0.9 {
        FactorScore::new(15, Some(format!("Very responsive ({}% response rate)", percent)))
    } else if rate >= 0.8 {
        FactorScore::new(13, Some(format!("Responsive ({}% response rate)", percent)))
    } else if rate >= 0.7 {
        FactorScore::silent(10)
    } else if rate >= 0.6 {
        FactorScore::silent(7)
    } else if rate >= 0.5 {
        FactorScore::silent(5)
    } else {
        FactorScore::silent(0)
    }
}

/// Bucket a budget midpoint into a price tier
pub fn budget_tier(midpoint: f64) -> PriceTier {
    if midpoint < 200.0 {
        PriceTier::Budget
    } else if midpoint <= 1000.0 {
        PriceTier::Standard
    } else {
        PriceTier::Premium
    }
}

/// Exact tier match earns 10; otherwise an average job price within 30% of
/// the budget midpoint earns 6. The two never combine.
pub fn price_fit_score(lead: &ClassifiedLead, candidate: &CandidateProvider) -> FactorScore {
    if !lead.budget.is_specified() {
        return FactorScore::silent(0);
    }

    let midpoint = lead.budget.midpoint();
    let tier = budget_tier(midpoint);
    if candidate.price_tier == tier {
        return FactorScore::new(10, Some(format!("Fits {} budget", tier.as_str())));
    }

    match candidate.avg_job_price {
        Some(avg) if midpoint > 0.0 && (avg - midpoint).abs() <= midpoint * 0.3 => {
            FactorScore::new(6, Some(format!("Typical job price close to budget (${:.0})", avg)))
        }
        _ => FactorScore::silent(0),
    }
}

pub fn urgency_fit_score(urgency: Urgency, candidate: &CandidateProvider) -> FactorScore {
    match urgency {
        Urgency::Emergency if candidate.offers_emergency => {
            FactorScore::new(5, Some("Offers emergency service".to_string()))
        }
        Urgency::Emergency => FactorScore::silent(0),
        Urgency::High => match candidate.avg_response_hours {
            Some(hours) if hours < 24.0 => FactorScore::new(
                5,
                Some(format!("Usually responds within {:.0}h", hours.ceil())),
            ),
            _ => FactorScore::silent(3),
        },
        Urgency::Medium | Urgency::Low => FactorScore::silent(3),
    }
}

/// +2 licensed, +2 insured, +1 per requirement matching a capability tag; capped at 5
pub fn requirement_fit_score(lead: &ClassifiedLead, candidate: &CandidateProvider) -> FactorScore {
    let mut points: u8 = 0;
    let mut matched: Vec<String> = Vec::new();

    if lead.requires("licensed") && candidate.licensed {
        points += 2;
        matched.push("licensed".to_string());
    }
    if lead.requires("insured") && candidate.insured {
        points += 2;
        matched.push("insured".to_string());
    }

    let tags: Vec<String> = candidate
        .capability_tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    for requirement in &lead.key_requirements {
        let requirement = requirement.trim().to_lowercase();
        if requirement.is_empty() {
            continue;
        }
        if tags.iter().any(|tag| tag.contains(&requirement)) {
            points = points.saturating_add(1);
            matched.push(requirement);
        }
    }

    let points = points.min(5);
    if points == 0 {
        FactorScore::silent(0)
    } else {
        FactorScore::new(points, Some(format!("Meets requirements: {}", matched.join(", "))))
    }
}
