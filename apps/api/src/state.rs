use std::sync::Arc;

use sqlx::PgPool;

use crate::applications::ApplicationService;
use crate::config::Config;
use crate::likes::LikeService;
use crate::matching::client::HttpRankingService;
use crate::matching::MatchingService;
use crate::offers::geocoding::NominatimGeocoder;
use crate::offers::OfferService;
use crate::repository::postgres::{
    PgApplicationRepo, PgCandidateRepo, PgCompanyRepo, PgOfferRepo, PgUserRepo,
};
use crate::repository::CompanyRepo;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<OfferService>,
    pub applications: Arc<ApplicationService>,
    pub likes: Arc<LikeService>,
    pub matching: Arc<MatchingService>,
    /// Used by the `Actor` extractor to resolve company links.
    pub companies: Arc<dyn CompanyRepo>,
}

impl AppState {
    /// Wires the Postgres repositories and the outbound HTTP collaborators into the services.
    pub fn from_pool(db: PgPool, config: &Config) -> anyhow::Result<Self> {
        let offer_repo = Arc::new(PgOfferRepo::new(db.clone()));
        let application_repo = Arc::new(PgApplicationRepo::new(db.clone()));
        let user_repo = Arc::new(PgUserRepo::new(db.clone()));
        let candidate_repo = Arc::new(PgCandidateRepo::new(db.clone()));
        let company_repo = Arc::new(PgCompanyRepo::new(db));

        let geocoder = Arc::new(NominatimGeocoder::new(
            config.geocoding_url.clone(),
            &config.geocoding_user_agent,
            config.outbound_timeout,
        )?);
        let ranking = Arc::new(HttpRankingService::new(
            config.ranking_service_url.clone(),
            config.outbound_timeout,
        )?);

        Ok(Self {
            offers: Arc::new(OfferService::new(offer_repo.clone(), geocoder)),
            applications: Arc::new(ApplicationService::new(
                offer_repo.clone(),
                application_repo,
                user_repo.clone(),
            )),
            likes: Arc::new(LikeService::new(offer_repo.clone(), user_repo)),
            matching: Arc::new(MatchingService::new(candidate_repo, offer_repo, ranking)),
            companies: company_repo,
        })
    }
}
