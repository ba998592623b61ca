pub mod extract;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::likes::handlers as likes;
use crate::matching::handlers as matching;
use crate::offers::handlers as offers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Offers
        .route(
            "/api/v1/offers",
            get(offers::handle_list_offers).post(offers::handle_create_offer),
        )
        .route("/api/v1/offers/ranking", get(matching::handle_rank_offers))
        .route(
            "/api/v1/offers/:id",
            get(offers::handle_get_offer)
                .patch(offers::handle_update_offer)
                .delete(offers::handle_delete_offer),
        )
        .route(
            "/api/v1/companies/me/offers",
            get(offers::handle_company_offers),
        )
        // Likes
        .route(
            "/api/v1/offers/:id/like",
            get(likes::handle_is_liked).post(likes::handle_like),
        )
        .route("/api/v1/offers/:id/unlike", post(likes::handle_unlike))
        // Applications
        .route("/api/v1/offers/:id/apply", post(applications::handle_apply))
        .route(
            "/api/v1/offers/:id/applications",
            get(applications::handle_offer_applications),
        )
        .route(
            "/api/v1/applications",
            get(applications::handle_my_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/accept",
            post(applications::handle_accept),
        )
        .route(
            "/api/v1/applications/:id/reject",
            post(applications::handle_reject),
        )
        .with_state(state)
}
