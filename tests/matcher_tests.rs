// Matcher tests against the in-memory store

mod common;

use common::*;
use leadflow::models::{ServiceCategory, Urgency, DEFAULT_RESPONSE_RATE};
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[tokio::test]
async fn test_twelve_candidates_yield_ten_matches() {
    let store = MockStore::new();
    for i in 0..12 {
        let c = candidate(&format!("Pro {}", i), 1.0 + i as f64, 4.5);
        store.set_response_rate(c.id, 0.9);
        store.add_provider(c.clone(), profile_for(&c));
    }

    let lead = classified_lead(ServiceCategory::Plumbing, Urgency::Medium, 8.0);
    let matches = matcher().find_matches(&store, Uuid::new_v4(), &lead).await;

    assert_eq!(matches.len(), 10);
    assert!(matches.iter().all(|m| m.confidence >= 50));
    assert!(matches.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[tokio::test]
async fn test_retrieval_failure_yields_empty_list() {
    let store = MockStore::new();
    let c = candidate("Reliable Rooter", 2.0, 4.9);
    store.add_provider(c.clone(), profile_for(&c));
    MockStore::fail(&store.fail_search);

    let lead = classified_lead(ServiceCategory::Plumbing, Urgency::High, 8.0);
    let matches = matcher().find_matches(&store, Uuid::new_v4(), &lead).await;

    assert!(matches.is_empty());
    assert_eq!(store.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_response_rate_failure_defaults_to_half() {
    let store = MockStore::new();
    let c = candidate("Reliable Rooter", 2.0, 4.9);
    store.set_response_rate(c.id, 0.95);
    store.add_provider(c.clone(), profile_for(&c));
    MockStore::fail(&store.fail_response_rate);

    let lead = classified_lead(ServiceCategory::Plumbing, Urgency::Medium, 8.0);
    let matches = matcher().find_matches(&store, Uuid::new_v4(), &lead).await;

    // 30 distance + 20 category + 15 rating + 5 response (0.5) + 0 price + 3 urgency
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].confidence, 73);
    assert_eq!(DEFAULT_RESPONSE_RATE, 0.5);
}

#[tokio::test]
async fn test_missing_history_defaults_to_half() {
    let store = MockStore::new();
    let c = candidate("New Kid Plumbing", 2.0, 4.9);
    store.add_provider(c.clone(), profile_for(&c));

    let lead = classified_lead(ServiceCategory::Plumbing, Urgency::Medium, 8.0);
    let matches = matcher().find_matches(&store, Uuid::new_v4(), &lead).await;

    assert_eq!(matches[0].confidence, 73);
}

#[tokio::test]
async fn test_known_response_rate_is_used() {
    let store = MockStore::new();
    let c = candidate("Reliable Rooter", 2.0, 4.9);
    store.set_response_rate(c.id, 0.95);
    store.add_provider(c.clone(), profile_for(&c));

    let lead = classified_lead(ServiceCategory::Plumbing, Urgency::Medium, 8.0);
    let matches = matcher().find_matches(&store, Uuid::new_v4(), &lead).await;

    assert_eq!(matches[0].confidence, 83);
    assert!(matches[0]
        .reasons
        .iter()
        .any(|r| r.starts_with("Very responsive")));
}

#[tokio::test]
async fn test_related_category_candidates_are_retrieved() {
    let store = MockStore::new();
    let mut hvac = candidate("Comfort Air", 3.0, 4.8);
    hvac.categories = vec![ServiceCategory::Hvac];
    store.set_response_rate(hvac.id, 0.9);
    store.add_provider(hvac.clone(), profile_for(&hvac));

    let mut roofer = candidate("Top Roofing", 1.0, 5.0);
    roofer.categories = vec![ServiceCategory::Roofing];
    store.add_provider(roofer.clone(), profile_for(&roofer));

    let lead = classified_lead(ServiceCategory::Plumbing, Urgency::Medium, 8.0);
    let matches = matcher().find_matches(&store, Uuid::new_v4(), &lead).await;

    // 30 + 12 related + 15 + 15 + 0 + 3
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].provider_id, hvac.id);
    assert_eq!(matches[0].confidence, 75);
}
