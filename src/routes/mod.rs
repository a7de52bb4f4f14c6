// Route exports
pub mod matchmaking;
pub mod registrations;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, Responder};

use crate::context::AppContext;
use crate::models::{ErrorResponse, HealthResponse};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(registrations::configure)
            .configure(matchmaking::configure),
    );
}

/// Health check endpoint
async fn health_check(ctx: web::Data<AppContext>) -> impl Responder {
    let store_healthy = match ctx.events.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Error body for payloads actix rejects before a handler runs
#[derive(Debug)]
pub struct PayloadError(ErrorResponse);

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for PayloadError {}

impl error::ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}
