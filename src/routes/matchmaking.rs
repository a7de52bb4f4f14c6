use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::context::AppContext;
use crate::error::AppError;
use crate::models::{MatchesQuery, MatchesResponse, SubmitProfileRequest};

/// Configure matchmaking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matchmaking/profiles", web::post().to(submit_profile))
        .route("/matchmaking/matches", web::get().to(get_matches));
}

/// Save a profile and return its matches
///
/// POST /api/v1/matchmaking/profiles
async fn submit_profile(
    ctx: web::Data<AppContext>,
    req: web::Json<SubmitProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let response = ctx.matchmaking.submit_profile(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/matchmaking/matches?userId=&eventId=
async fn get_matches(
    ctx: web::Data<AppContext>,
    query: web::Query<MatchesQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let matches = ctx
        .matchmaking
        .get_matches(&query.user_id, &query.event_id)
        .await?;

    Ok(HttpResponse::Ok().json(MatchesResponse { matches }))
}
