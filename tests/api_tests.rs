// HTTP surface tests

mod common;

use actix_web::{test, web, App};
use common::*;
use leadflow::models::{Channel, ServiceCategory, Urgency};
use leadflow::routes::{configure_routes, handle_json_payload_error, AppState};
use std::sync::Arc;

fn state(store: Arc<MockStore>, classifier: Arc<MockClassifier>) -> AppState {
    let email = Arc::new(RecordingTransport::new(Channel::Email));
    AppState {
        orchestrator: Arc::new(orchestrator(classifier, store.clone(), email)),
        store,
        sessions: None,
    }
}

fn default_state() -> AppState {
    let store = Arc::new(MockStore::new());
    let c = candidate("Reliable Rooter", 2.0, 4.9);
    store.add_provider(c.clone(), profile_for(&c));
    let classifier = Arc::new(MockClassifier::returning(classified_lead(
        ServiceCategory::Plumbing,
        Urgency::High,
        8.0,
    )));
    state(store, classifier)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let app = app!(default_state());

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_submit_lead_returns_result() {
    let app = app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/v1/leads")
        .set_json(serde_json::json!({
            "problem_text": "Burst pipe under the kitchen sink",
            "email": "pat@example.com"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "matched");
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
    assert_eq!(body["notifications_sent"], 1);
    assert!(body.get("error").is_none());
}

#[actix_web::test]
async fn test_submit_lead_requires_contact() {
    let app = app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/v1/leads")
        .set_json(serde_json::json!({ "problem_text": "Burst pipe" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn test_malformed_json_is_400() {
    let app = app!(default_state());

    let req = test::TestRequest::post()
        .uri("/api/v1/leads")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_classifier_outage_is_500_with_result() {
    let store = Arc::new(MockStore::new());
    let classifier = Arc::new(MockClassifier::failing("timeout"));
    let app = app!(state(store, classifier));

    let req = test::TestRequest::post()
        .uri("/api/v1/leads")
        .set_json(serde_json::json!({
            "problem_text": "Furnace won't turn on",
            "phone": "+13175550111"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("timeout"));
}

#[actix_web::test]
async fn test_sessions_unavailable_without_cache() {
    let app = app!(default_state());

    let req = test::TestRequest::get().uri("/api/v1/sessions/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 503);

    let req = test::TestRequest::put()
        .uri("/api/v1/sessions/abc")
        .set_json(serde_json::json!({ "content": "My AC is broken" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 503);
}
