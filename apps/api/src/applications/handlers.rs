//! Axum route handlers for the Applications API.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::Actor;
use crate::errors::AppError;
use crate::models::application::{AcceptOutcome, Application, ApplicationView, OfferApplicant};
use crate::routes::extract::{AppPath, OptionalJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptRequest {
    #[serde(default)]
    pub reject_pending_applications: bool,
}

/// POST /api/v1/offers/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(offer_id): AppPath<i32>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let application = state.applications.apply(&actor, offer_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/offers/:id/applications
pub async fn handle_offer_applications(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(offer_id): AppPath<i32>,
) -> Result<Json<Vec<OfferApplicant>>, AppError> {
    Ok(Json(
        state.applications.list_for_offer(&actor, offer_id).await?,
    ))
}

/// GET /api/v1/applications
pub async fn handle_my_applications(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<ApplicationView>>, AppError> {
    Ok(Json(state.applications.list_for_candidate(&actor).await?))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<i32>,
) -> Result<Json<ApplicationView>, AppError> {
    Ok(Json(state.applications.get_by_id(&actor, id).await?))
}

/// POST /api/v1/applications/:id/accept
///
/// The body may be empty; when present it must be a valid `AcceptRequest`. With
/// `reject_pending_applications`, every other pending application on the same offer is
/// rejected in the same transaction.
pub async fn handle_accept(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<i32>,
    OptionalJson(request): OptionalJson<AcceptRequest>,
) -> Result<Json<AcceptOutcome>, AppError> {
    let outcome = state
        .applications
        .accept(&actor, id, request.reject_pending_applications)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/applications/:id/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(state.applications.reject(&actor, id).await?))
}
