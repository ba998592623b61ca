use std::sync::Arc;

use tracing::debug;

use crate::auth::{authorize, Action, Actor, Resource};
use crate::errors::AppError;
use crate::models::offer::LikedOfferView;
use crate::repository::{OfferRepo, UserRepo};

/// Candidate bookmarks on offers. Membership is idempotent in both directions.
pub struct LikeService {
    offers: Arc<dyn OfferRepo>,
    users: Arc<dyn UserRepo>,
}

impl LikeService {
    pub fn new(offers: Arc<dyn OfferRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { offers, users }
    }

    pub async fn like(&self, actor: &Actor, offer_id: i32) -> Result<(), AppError> {
        authorize(actor, Resource::Catalog, Action::LikeOffer)?;
        if self.users.find_by_id(actor.user_id).await?.is_none() {
            return Err(AppError::UserNotFound(actor.user_id));
        }
        if self.offers.get_by_id(offer_id).await?.is_none() {
            return Err(AppError::OfferNotFound(offer_id));
        }
        self.offers.like(offer_id, actor.user_id).await?;
        debug!("User {} likes offer {offer_id}", actor.user_id);
        Ok(())
    }

    /// Removing a like that does not exist succeeds.
    pub async fn unlike(&self, actor: &Actor, offer_id: i32) -> Result<(), AppError> {
        authorize(actor, Resource::Catalog, Action::LikeOffer)?;
        self.offers.unlike(offer_id, actor.user_id).await
    }

    pub async fn is_liked(&self, actor: &Actor, offer_id: i32) -> Result<bool, AppError> {
        authorize(actor, Resource::Catalog, Action::LikeOffer)?;
        self.offers.does_user_like(offer_id, actor.user_id).await
    }

    pub async fn list_liked(&self, actor: &Actor) -> Result<Vec<LikedOfferView>, AppError> {
        authorize(actor, Resource::Catalog, Action::LikeOffer)?;
        self.offers.get_liked(actor.user_id).await
    }
}
