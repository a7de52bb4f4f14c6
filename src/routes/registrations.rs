use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::context::AppContext;
use crate::error::AppError;
use crate::models::{RegisterRequest, UpdateCapacityRequest, WaitlistEntry, WaitlistResponse};

/// Configure event registration routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/events/{event_id}/registrations", web::post().to(register))
        .route("/events/{event_id}/capacity", web::put().to(update_capacity))
        .route("/events/{event_id}/waitlist", web::get().to(waitlist));
}

/// Register an attendee
///
/// POST /api/v1/events/{eventId}/registrations
///
/// Request body:
/// ```json
/// {
///   "fullName": "string",
///   "email": "string",
///   "phone": "string",
///   "organization": "string",
///   "interest": "string"
/// }
/// ```
async fn register(
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let result = ctx
        .capacity
        .register(&event_id, req.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Change an event's capacity, promoting from the waitlist when it grows
///
/// PUT /api/v1/events/{eventId}/capacity
async fn update_capacity(
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    req: web::Json<UpdateCapacityRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    let event_id = path.into_inner();

    let result = ctx
        .capacity
        .update_capacity(&event_id, req.new_capacity)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Current waitlist in promotion order
///
/// GET /api/v1/events/{eventId}/waitlist
async fn waitlist(
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let waitlist: Vec<WaitlistEntry> = ctx
        .capacity
        .waitlist(&event_id)
        .await?
        .into_iter()
        .map(WaitlistEntry::from)
        .collect();

    Ok(HttpResponse::Ok().json(WaitlistResponse {
        event_id,
        count: waitlist.len(),
        waitlist,
    }))
}
