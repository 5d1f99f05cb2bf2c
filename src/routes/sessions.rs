use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::models::{ErrorResponse, IntakeSession, SessionUpdate};
use crate::routes::AppState;
use crate::services::SessionStore;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/sessions/{id}", web::get().to(get_session))
        .route("/sessions/{id}", web::put().to(update_session))
        .route("/sessions/{id}", web::delete().to(delete_session));
}

fn unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorResponse {
        error: "Sessions unavailable".to_string(),
        message: "Session storage is not configured".to_string(),
        status_code: 503,
    })
}

fn storage_error(e: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("Session storage error: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Session storage error".to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

fn sessions(state: &AppState) -> Option<&Arc<SessionStore>> {
    state.sessions.as_ref()
}

/// GET /api/v1/sessions/{id}
async fn get_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let Some(store) = sessions(&state) else {
        return unavailable();
    };
    let session_id = path.into_inner();

    match store.load(&session_id).await {
        Ok(Some(session)) => HttpResponse::Ok().json(session),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Session not found".to_string(),
            message: format!("No session with id {}", session_id),
            status_code: 404,
        }),
        Err(e) => storage_error(e),
    }
}

/// PUT /api/v1/sessions/{id}
///
/// Loads the session (creating it when absent), applies the update and
/// saves it back.
async fn update_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<SessionUpdate>,
) -> impl Responder {
    let Some(store) = sessions(&state) else {
        return unavailable();
    };
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }
    let session_id = path.into_inner();

    let mut session = match store.load(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => IntakeSession::new(session_id.as_str()),
        Err(e) => return storage_error(e),
    };

    req.into_inner().apply(&mut session);

    match store.save(&session).await {
        Ok(()) => {
            tracing::debug!("Saved session {} ({} turns)", session_id, session.turns.len());
            HttpResponse::Ok().json(session)
        }
        Err(e) => storage_error(e),
    }
}

/// DELETE /api/v1/sessions/{id}
async fn delete_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let Some(store) = sessions(&state) else {
        return unavailable();
    };

    match store.delete(&path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => storage_error(e),
    }
}
