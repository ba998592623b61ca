//! Offer aggregate: creation, allow-listed updates with requirement replacement, removal
//! and the candidate / company read models.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::auth::{authorize, Action, Actor, Resource};
use crate::errors::AppError;
use crate::matching::features::language_ordinal;
use crate::models::offer::{
    CollectionUpdate, CompanyOfferView, LocationType, NewOffer, Offer, OfferChanges,
    OfferView, RequirementChanges, RequirementLinks,
};
use crate::offers::geocoding::Geocoder;
use crate::repository::OfferRepo;

const DEFAULT_STATUS: &str = "pending";

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageRequirement {
    pub id: i32,
    pub level: String,
}

/// Body of an offer creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfferDraft {
    pub title: String,
    pub body: String,
    pub min_salary: i32,
    pub max_salary: i32,
    pub location_type: Option<LocationType>,
    pub address: Option<String>,
    pub seniority: Option<i16>,
    pub status: Option<String>,
    pub image: Option<String>,
    pub skills: Option<Vec<i32>>,
    pub education: Option<Vec<i32>>,
    pub experiences: Option<Vec<i32>>,
    pub languages: Option<Vec<LanguageRequirement>>,
}

/// Body of an offer update. Absent fields are left alone. For requirement collections an
/// absent key keeps the stored set, `[]` clears it and a non-empty list replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfferPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
    pub location_type: Option<LocationType>,
    pub address: Option<String>,
    pub seniority: Option<i16>,
    pub status: Option<String>,
    pub image: Option<String>,
    pub skills: Option<Vec<i32>>,
    pub education: Option<Vec<i32>>,
    pub experiences: Option<Vec<i32>>,
    pub languages: Option<Vec<LanguageRequirement>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn check_salary_range(min: i32, max: i32) -> Result<(), AppError> {
    if min < 0 {
        return Err(AppError::Validation(
            "min_salary cannot be negative".to_string(),
        ));
    }
    if min > max {
        return Err(AppError::Validation(format!(
            "min_salary ({min}) exceeds max_salary ({max})"
        )));
    }
    Ok(())
}

fn check_seniority(seniority: Option<i16>) -> Result<(), AppError> {
    match seniority {
        Some(level) if !(1..=3).contains(&level) => Err(AppError::Validation(format!(
            "seniority must be 1 (junior), 2 (confirmed) or 3 (senior), got {level}"
        ))),
        _ => Ok(()),
    }
}

fn check_location(location_type: LocationType, address: Option<&str>) -> Result<(), AppError> {
    if location_type.requires_address() && address.is_none() {
        return Err(AppError::Validation(format!(
            "{location_type} offers need an address"
        )));
    }
    Ok(())
}

fn language_levels(
    languages: Vec<LanguageRequirement>,
) -> Result<Vec<(i32, String)>, AppError> {
    languages
        .into_iter()
        .map(|l| {
            let level = l.level.trim().to_ascii_lowercase();
            if language_ordinal(&level) == 0 {
                return Err(AppError::Validation(format!(
                    "unknown language level '{}'",
                    l.level
                )));
            }
            Ok((l.id, level))
        })
        .collect()
}

/// Trims the value; blank strings count as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

pub struct OfferService {
    offers: Arc<dyn OfferRepo>,
    geocoder: Arc<dyn Geocoder>,
}

impl OfferService {
    pub fn new(offers: Arc<dyn OfferRepo>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { offers, geocoder }
    }

    async fn load(&self, id: i32) -> Result<Offer, AppError> {
        self.offers
            .get_by_id(id)
            .await?
            .map(|details| details.offer)
            .ok_or(AppError::OfferNotFound(id))
    }

    pub async fn create(&self, actor: &Actor, draft: OfferDraft) -> Result<Offer, AppError> {
        authorize(actor, Resource::Catalog, Action::CreateOffer)?;
        let company_id = actor.company_id.ok_or(AppError::NoAssociatedCompany)?;

        let title = required_text("title", &draft.title)?;
        let body = required_text("body", &draft.body)?;
        check_salary_range(draft.min_salary, draft.max_salary)?;
        check_seniority(draft.seniority)?;

        let address = non_blank(draft.address);
        let location_type = draft.location_type.unwrap_or(if address.is_some() {
            LocationType::Onsite
        } else {
            LocationType::Remote
        });
        check_location(location_type, address.as_deref())?;

        let languages = language_levels(draft.languages.unwrap_or_default())?;
        let links = RequirementLinks {
            skills: draft.skills.unwrap_or_default().into_iter().collect(),
            education: draft.education.unwrap_or_default().into_iter().collect(),
            experiences: draft.experiences.unwrap_or_default().into_iter().collect(),
            languages: languages.into_iter().collect::<BTreeMap<_, _>>(),
        };

        let gps_location = match &address {
            Some(address) => Some(self.geocoder.geocode(address).await?),
            None => None,
        };

        let offer = NewOffer {
            company_id,
            title,
            body,
            min_salary: draft.min_salary,
            max_salary: draft.max_salary,
            location_type,
            address,
            gps_location,
            seniority: draft.seniority,
            status: non_blank(draft.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            image: non_blank(draft.image),
        };

        self.offers.create(offer, links).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: i32,
        patch: OfferPatch,
    ) -> Result<Offer, AppError> {
        let current = self.load(id).await?;
        authorize(
            actor,
            Resource::Offer {
                company_id: current.company_id,
            },
            Action::UpdateOffer,
        )?;

        let address = patch
            .address
            .as_deref()
            .map(|a| required_text("address", a))
            .transpose()?;
        let mut changes = OfferChanges {
            title: patch
                .title
                .as_deref()
                .map(|t| required_text("title", t))
                .transpose()?,
            body: patch
                .body
                .as_deref()
                .map(|b| required_text("body", b))
                .transpose()?,
            min_salary: patch.min_salary,
            max_salary: patch.max_salary,
            location_type: patch.location_type,
            address: address.clone(),
            gps_location: None,
            seniority: patch.seniority,
            status: patch
                .status
                .as_deref()
                .map(|s| required_text("status", s))
                .transpose()?,
            image: patch.image,
        };

        check_salary_range(
            changes.min_salary.unwrap_or(current.min_salary),
            changes.max_salary.unwrap_or(current.max_salary),
        )?;
        check_seniority(changes.seniority)?;
        check_location(
            changes.location_type.unwrap_or(current.location_type),
            address.as_deref().or(current.address.as_deref()),
        )?;

        let requirements = RequirementChanges {
            skills: CollectionUpdate::<BTreeSet<i32>>::from_supplied(patch.skills),
            education: CollectionUpdate::<BTreeSet<i32>>::from_supplied(patch.education),
            experiences: CollectionUpdate::<BTreeSet<i32>>::from_supplied(patch.experiences),
            languages: CollectionUpdate::<BTreeMap<i32, String>>::from_supplied(
                patch.languages.map(language_levels).transpose()?,
            ),
        };

        if let Some(address) = address.filter(|a| current.address.as_ref() != Some(a)) {
            changes.gps_location = Some(self.geocoder.geocode(&address).await?);
        }

        debug!(
            "Updating offer {id} (requirements touched: {})",
            !requirements.is_noop()
        );
        self.offers
            .update_with_links(id, changes, requirements)
            .await
    }

    pub async fn remove(&self, actor: &Actor, id: i32) -> Result<(), AppError> {
        let current = self.load(id).await?;
        authorize(
            actor,
            Resource::Offer {
                company_id: current.company_id,
            },
            Action::DeleteOffer,
        )?;
        self.offers.delete(id).await
    }

    /// Offer with requirements. `liked` is only ever true for candidate actors.
    pub async fn get_by_id(&self, actor: &Actor, id: i32) -> Result<OfferView, AppError> {
        let details = self
            .offers
            .get_by_id(id)
            .await?
            .ok_or(AppError::OfferNotFound(id))?;
        let liked = actor.is_candidate() && self.offers.does_user_like(id, actor.user_id).await?;
        Ok(OfferView { details, liked })
    }

    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<OfferView>, AppError> {
        let liked = if actor.is_candidate() {
            self.offers.liked_offer_ids(actor.user_id).await?
        } else {
            Default::default()
        };
        let offers = self.offers.get_all().await?;
        Ok(offers
            .into_iter()
            .map(|details| OfferView {
                liked: liked.contains(&details.offer.id),
                details,
            })
            .collect())
    }

    /// The acting company's own offers with applicant counts.
    pub async fn list_by_company(&self, actor: &Actor) -> Result<Vec<CompanyOfferView>, AppError> {
        authorize(actor, Resource::Catalog, Action::ListCompanyOffers)?;
        let company_id = actor.company_id.ok_or(AppError::NoAssociatedCompany)?;
        let offers = self.offers.get_by_company(company_id).await?;
        Ok(offers
            .into_iter()
            .map(|o| CompanyOfferView {
                details: o.details,
                number_applicants: o.number_applicants,
            })
            .collect())
    }
}
