use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{ErrorResponse, HealthResponse, LeadStatus, LeadSubmission};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/leads", web::post().to(submit_lead));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = match state.store.health_check().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Datastore health check failed: {}", e);
            "degraded"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Submit a consumer request
///
/// POST /api/v1/leads
///
/// Request body:
/// ```json
/// {
///   "problem_text": "Water heater is leaking, need someone today",
///   "phone": "+13175550100",
///   "email": "pat@example.com",
///   "zip_code": "46032"
/// }
/// ```
async fn submit_lead(
    state: web::Data<AppState>,
    req: web::Json<LeadSubmission>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for lead submission: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let result = state.orchestrator.process_lead(&req).await;

    match result.status {
        LeadStatus::Error => HttpResponse::InternalServerError().json(result),
        _ => HttpResponse::Ok().json(result),
    }
}
