use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::Actor;
use crate::errors::AppError;
use crate::routes::extract::AppPath;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub offer_id: i32,
    pub liked: bool,
}

/// POST /api/v1/offers/:id/like
pub async fn handle_like(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(offer_id): AppPath<i32>,
) -> Result<Json<LikeResponse>, AppError> {
    state.likes.like(&actor, offer_id).await?;
    Ok(Json(LikeResponse {
        offer_id,
        liked: true,
    }))
}

/// POST /api/v1/offers/:id/unlike
pub async fn handle_unlike(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(offer_id): AppPath<i32>,
) -> Result<Json<LikeResponse>, AppError> {
    state.likes.unlike(&actor, offer_id).await?;
    Ok(Json(LikeResponse {
        offer_id,
        liked: false,
    }))
}

/// GET /api/v1/offers/:id/like
pub async fn handle_is_liked(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(offer_id): AppPath<i32>,
) -> Result<Json<LikeResponse>, AppError> {
    let liked = state.likes.is_liked(&actor, offer_id).await?;
    Ok(Json(LikeResponse { offer_id, liked }))
}
