//! Axum route handlers for the Offers API.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::auth::Actor;
use crate::errors::AppError;
use crate::models::offer::{CompanyOfferView, Offer, OfferView};
use crate::offers::service::{OfferDraft, OfferPatch};
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub liked: bool,
}

/// GET /api/v1/offers
///
/// The candidate feed, each offer annotated with `liked`. With `?liked=true` only the liked
/// offers are returned, each annotated with `applied`.
pub async fn handle_list_offers(
    State(state): State<AppState>,
    actor: Actor,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Response, AppError> {
    if query.liked {
        let liked = state.likes.list_liked(&actor).await?;
        return Ok(Json(liked).into_response());
    }
    let offers = state.offers.list_all(&actor).await?;
    Ok(Json(offers).into_response())
}

/// POST /api/v1/offers
pub async fn handle_create_offer(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(draft): AppJson<OfferDraft>,
) -> Result<(StatusCode, Json<Offer>), AppError> {
    let offer = state.offers.create(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// GET /api/v1/offers/:id
pub async fn handle_get_offer(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<i32>,
) -> Result<Json<OfferView>, AppError> {
    Ok(Json(state.offers.get_by_id(&actor, id).await?))
}

/// PATCH /api/v1/offers/:id
pub async fn handle_update_offer(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<i32>,
    AppJson(patch): AppJson<OfferPatch>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.offers.update(&actor, id, patch).await?))
}

/// DELETE /api/v1/offers/:id
///
/// Requirement links and likes go with the offer; applications are kept.
pub async fn handle_delete_offer(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    state.offers.remove(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/companies/me/offers
pub async fn handle_company_offers(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<CompanyOfferView>>, AppError> {
    Ok(Json(state.offers.list_by_company(&actor).await?))
}
