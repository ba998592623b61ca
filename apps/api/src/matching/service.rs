use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::auth::{authorize, Action, Actor, Resource};
use crate::errors::AppError;
use crate::matching::builder::{MatchingRequestBuilder, RankedOffer, RankingRequest};
use crate::matching::client::RankingService;
use crate::matching::features::{candidate_vector, offer_vector};
use crate::models::candidate::CandidateProfile;
use crate::repository::{CandidateRepo, OfferRepo};

pub struct MatchingService {
    candidates: Arc<dyn CandidateRepo>,
    offers: Arc<dyn OfferRepo>,
    ranking: Arc<dyn RankingService>,
}

impl MatchingService {
    pub fn new(
        candidates: Arc<dyn CandidateRepo>,
        offers: Arc<dyn OfferRepo>,
        ranking: Arc<dyn RankingService>,
    ) -> Self {
        Self {
            candidates,
            offers,
            ranking,
        }
    }

    /// Gathers the profile inputs of a candidate. Fails with `UserNotFound` if the user has
    /// no candidate record.
    pub async fn candidate_profile(&self, user_id: i32) -> Result<CandidateProfile, AppError> {
        let record = self
            .candidates
            .get_candidate(user_id)
            .await?
            .ok_or(AppError::UserNotFound(user_id))?;

        Ok(CandidateProfile {
            skills: self.candidates.get_candidate_skills(user_id).await?,
            languages: self.candidates.get_candidate_languages(user_id).await?,
            educations: self.candidates.get_candidate_educations(user_id).await?,
            seniority: record.seniority,
            location: record.gps_location,
        })
    }

    pub async fn build_request(
        &self,
        actor: &Actor,
        user_job_title_emb: Option<Vec<f64>>,
    ) -> Result<RankingRequest, AppError> {
        authorize(actor, Resource::Catalog, Action::RankOffers)?;

        let profile = self.candidate_profile(actor.user_id).await?;
        let offers = self
            .offers
            .get_all()
            .await?
            .iter()
            .map(|details| RankedOffer {
                offer_id: details.offer.id,
                job_title: details.offer.title.clone(),
                vector: offer_vector(details),
            })
            .collect();

        Ok(MatchingRequestBuilder::build(
            candidate_vector(&profile),
            offers,
            user_job_title_emb,
        ))
    }

    /// Builds the payload and forwards it to the ranking service.
    pub async fn rank(
        &self,
        actor: &Actor,
        user_job_title_emb: Option<Vec<f64>>,
    ) -> Result<Value, AppError> {
        let request = self.build_request(actor, user_job_title_emb).await?;
        debug!(
            "Ranking {} offers for candidate {}",
            request.job_offers.len(),
            actor.user_id
        );
        self.ranking.rank(&request).await
    }
}
