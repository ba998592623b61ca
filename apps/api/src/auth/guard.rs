//! Authorization guard.
//!
//! Identity comes from the authentication gateway in front of the service, which forwards
//! `x-user-id` and `x-user-role`. Company actors get their company resolved once, here, so
//! every rule below is a pure function of `(actor, resource, action)`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use crate::errors::AppError;
use crate::models::user::Role;
use crate::repository::CompanyRepo;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
    /// Resolved for company actors that administer a company.
    pub company_id: Option<i32>,
}

impl Actor {
    pub fn candidate(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::Candidate,
            company_id: None,
        }
    }

    pub fn company(user_id: i32, company_id: Option<i32>) -> Self {
        Self {
            user_id,
            role: Role::Company,
            company_id,
        }
    }

    pub fn is_candidate(&self) -> bool {
        self.role == Role::Candidate
    }

    /// Builds an actor from the gateway identity, resolving the company link for company users.
    pub async fn resolve(
        user_id: i32,
        role: Role,
        companies: &dyn CompanyRepo,
    ) -> Result<Self, AppError> {
        match role {
            Role::Candidate => Ok(Self::candidate(user_id)),
            Role::Company => {
                let Some(link) = companies.find_by_user_id(user_id).await? else {
                    return Ok(Self::company(user_id, None));
                };
                if companies.find_by_id(link.company_id).await?.is_none() {
                    return Err(AppError::CompanyNotFound(link.company_id));
                }
                Ok(Self::company(user_id, Some(link.company_id)))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateOffer,
    UpdateOffer,
    DeleteOffer,
    ListCompanyOffers,
    ViewOfferApplications,
    DecideApplication,
    ApplyToOffer,
    LikeOffer,
    RankOffers,
    ListOwnApplications,
    ViewApplication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// No specific record: creation, listings, ranking.
    Catalog,
    Offer { company_id: i32 },
    /// `company_id` is `None` once the targeted offer has been removed.
    Application {
        candidate_id: i32,
        company_id: Option<i32>,
    },
}

fn require_role(actor: &Actor, role: Role, action: Action) -> Result<(), AppError> {
    if actor.role == role {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "{action:?} requires the {role} role"
        )))
    }
}

fn require_company(actor: &Actor, action: Action) -> Result<i32, AppError> {
    require_role(actor, Role::Company, action)?;
    actor.company_id.ok_or(AppError::NoAssociatedCompany)
}

/// Evaluates one authorization rule. Ok means the actor may perform `action` on `resource`.
pub fn authorize(actor: &Actor, resource: Resource, action: Action) -> Result<(), AppError> {
    let decision = match (action, resource) {
        (Action::CreateOffer | Action::ListCompanyOffers, Resource::Catalog) => {
            require_company(actor, action).map(|_| ())
        }
        (
            Action::UpdateOffer
            | Action::DeleteOffer
            | Action::ViewOfferApplications
            | Action::DecideApplication,
            Resource::Offer { company_id },
        ) => require_company(actor, action).and_then(|own| {
            if own == company_id {
                Ok(())
            } else {
                Err(AppError::Unauthorized(
                    "offer belongs to another company".to_string(),
                ))
            }
        }),
        (
            Action::ApplyToOffer | Action::LikeOffer | Action::RankOffers
            | Action::ListOwnApplications,
            _,
        ) => require_role(actor, Role::Candidate, action),
        (
            Action::ViewApplication,
            Resource::Application {
                candidate_id,
                company_id,
            },
        ) => {
            let allowed = match actor.role {
                Role::Candidate => actor.user_id == candidate_id,
                Role::Company => actor.company_id.is_some() && actor.company_id == company_id,
            };
            if allowed {
                Ok(())
            } else {
                Err(AppError::Unauthorized(
                    "application belongs to someone else".to_string(),
                ))
            }
        }
        (action, resource) => Err(AppError::Unauthorized(format!(
            "{action:?} does not apply to {resource:?}"
        ))),
    };

    if decision.is_err() {
        debug!(
            "Denied {action:?} on {resource:?} for user {} ({})",
            actor.user_id, actor.role
        );
    }
    decision
}

// ────────────────────────────────────────────────────────────────────────────
// Extractor
// ────────────────────────────────────────────────────────────────────────────

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthenticated)
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)?
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::Unauthenticated)?;
        let role = header(parts, USER_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|_| AppError::Unauthenticated)?;

        Actor::resolve(user_id, role, state.companies.as_ref()).await
    }
}
