//! Repository contracts consumed by the offer, application, like and matching services.
//!
//! Services hold `Arc<dyn ...Repo>` handles injected at startup, so the Postgres adapter
//! and the in-memory fakes used by the tests are interchangeable.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::application::{AcceptOutcome, Application, ApplicationView, OfferApplicant};
use crate::models::candidate::CandidateRecord;
use crate::models::offer::{
    LikedOfferView, NewOffer, Offer, OfferChanges, OfferDetails, RequirementChanges,
    RequirementLinks,
};
use crate::models::reference::{Education, LanguageLevel, Skill};
use crate::models::user::{Company, CompanyUser, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// An offer row with its applicant count, for the company dashboard.
#[derive(Debug, Clone)]
pub struct CompanyOffer {
    pub details: OfferDetails,
    pub number_applicants: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Offers, requirement links, likes and applications keyed by offer
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait OfferRepo: Send + Sync {
    /// Inserts the offer and its requirement links as one unit.
    async fn create(&self, offer: NewOffer, links: RequirementLinks) -> Result<Offer, AppError>;

    /// Applies scalar changes, bumps `modified_at` and replaces every collection that is not
    /// `Keep`, all as one unit. Fails with `OfferNotFound` if the offer is absent.
    async fn update_with_links(
        &self,
        id: i32,
        changes: OfferChanges,
        requirements: RequirementChanges,
    ) -> Result<Offer, AppError>;

    /// Deletes requirement links, likes and the offer itself. Applications are kept.
    async fn delete(&self, id: i32) -> Result<(), AppError>;

    async fn get_by_id(&self, id: i32) -> Result<Option<OfferDetails>, AppError>;

    async fn get_all(&self) -> Result<Vec<OfferDetails>, AppError>;

    async fn get_by_company(&self, company_id: i32) -> Result<Vec<CompanyOffer>, AppError>;

    async fn get_liked(&self, user_id: i32) -> Result<Vec<LikedOfferView>, AppError>;

    /// Ids of every offer the user likes.
    async fn liked_offer_ids(&self, user_id: i32) -> Result<BTreeSet<i32>, AppError>;

    async fn does_user_like(&self, offer_id: i32, user_id: i32) -> Result<bool, AppError>;

    /// Inserts the like unless it already exists.
    async fn like(&self, offer_id: i32, user_id: i32) -> Result<(), AppError>;

    /// Removes the like if present.
    async fn unlike(&self, offer_id: i32, user_id: i32) -> Result<(), AppError>;

    /// Creates a `pending` application. A second application for the same pair fails with
    /// `AlreadyApplied`, including when two calls race.
    async fn apply(&self, offer_id: i32, user_id: i32) -> Result<Application, AppError>;

    async fn get_applications(&self, offer_id: i32) -> Result<Vec<OfferApplicant>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Application state transitions
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ApplicationRepo: Send + Sync {
    async fn get_application_by_id(&self, id: i32) -> Result<Option<Application>, AppError>;

    async fn get_applications_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ApplicationView>, AppError>;

    /// Moves a pending application to `offered`. With `reject_pending`, every other pending
    /// application on the same offer moves to `rejected` in the same unit of work.
    async fn accept_application(
        &self,
        id: i32,
        reject_pending: bool,
    ) -> Result<AcceptOutcome, AppError>;

    /// Moves a pending application to `rejected`.
    async fn reject_application(&self, id: i32) -> Result<Application, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Companies, users, candidates
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CompanyRepo: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Company>, AppError>;

    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<CompanyUser>, AppError>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait CandidateRepo: Send + Sync {
    async fn get_candidate(&self, user_id: i32) -> Result<Option<CandidateRecord>, AppError>;

    /// Distinct skills attached to the candidate's projects and prior experiences.
    async fn get_candidate_skills(&self, user_id: i32) -> Result<Vec<Skill>, AppError>;

    async fn get_candidate_languages(&self, user_id: i32)
        -> Result<Vec<LanguageLevel>, AppError>;

    async fn get_candidate_educations(&self, user_id: i32) -> Result<Vec<Education>, AppError>;
}
