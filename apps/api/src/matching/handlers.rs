use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Actor;
use crate::errors::AppError;
use crate::routes::extract::OptionalJson;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankingQuery {
    pub user_job_title_emb: Option<Vec<f64>>,
}

/// GET /api/v1/offers/ranking
///
/// Forwards the candidate and offer vectors to the ranking service and returns its answer.
/// The body may be empty; when present it only carries the job-title embedding.
pub async fn handle_rank_offers(
    State(state): State<AppState>,
    actor: Actor,
    OptionalJson(query): OptionalJson<RankingQuery>,
) -> Result<Json<Value>, AppError> {
    let ranking = state.matching.rank(&actor, query.user_job_title_emb).await?;
    Ok(Json(ranking))
}
