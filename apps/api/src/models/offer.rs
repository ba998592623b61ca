use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::reference::{Education, Experience, LanguageLevel, Skill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Onsite,
    Hybrid,
    Remote,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Onsite => "onsite",
            LocationType::Hybrid => "hybrid",
            LocationType::Remote => "remote",
        }
    }

    /// Onsite and hybrid offers point candidates at a physical workplace.
    pub fn requires_address(&self) -> bool {
        !matches!(self, LocationType::Remote)
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onsite" => Ok(LocationType::Onsite),
            "hybrid" => Ok(LocationType::Hybrid),
            "remote" => Ok(LocationType::Remote),
            other => Err(format!("unknown location type '{other}'")),
        }
    }
}

/// Geocoordinate serialized as a `[longitude, latitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lon, point.lat]
    }
}

impl GeoPoint {
    pub fn from_columns(lon: Option<f64>, lat: Option<f64>) -> Option<Self> {
        match (lon, lat) {
            (Some(lon), Some(lat)) => Some(Self { lon, lat }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i32,
    pub company_id: i32,
    pub title: String,
    pub body: String,
    pub min_salary: i32,
    pub max_salary: i32,
    pub location_type: LocationType,
    pub address: Option<String>,
    pub gps_location: Option<GeoPoint>,
    /// 1 junior, 2 confirmed, 3 senior. Offers created before the column existed have none.
    pub seniority: Option<i16>,
    pub status: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Scalar fields of an offer about to be inserted. Timestamps are set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub company_id: i32,
    pub title: String,
    pub body: String,
    pub min_salary: i32,
    pub max_salary: i32,
    pub location_type: LocationType,
    pub address: Option<String>,
    pub gps_location: Option<GeoPoint>,
    pub seniority: Option<i16>,
    pub status: String,
    pub image: Option<String>,
}

/// Allow-listed scalar changes for an existing offer. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
    pub location_type: Option<LocationType>,
    pub address: Option<String>,
    pub gps_location: Option<GeoPoint>,
    pub seniority: Option<i16>,
    pub status: Option<String>,
    pub image: Option<String>,
}

impl OfferChanges {
    /// Applies the changes to a stored offer, leaving identity and timestamps alone.
    pub fn apply_to(&self, offer: &mut Offer) {
        if let Some(title) = &self.title {
            offer.title = title.clone();
        }
        if let Some(body) = &self.body {
            offer.body = body.clone();
        }
        if let Some(min) = self.min_salary {
            offer.min_salary = min;
        }
        if let Some(max) = self.max_salary {
            offer.max_salary = max;
        }
        if let Some(location_type) = self.location_type {
            offer.location_type = location_type;
        }
        if let Some(address) = &self.address {
            offer.address = Some(address.clone());
        }
        if let Some(point) = self.gps_location {
            offer.gps_location = Some(point);
        }
        if let Some(seniority) = self.seniority {
            offer.seniority = Some(seniority);
        }
        if let Some(status) = &self.status {
            offer.status = status.clone();
        }
        if let Some(image) = &self.image {
            offer.image = Some(image.clone());
        }
    }
}

/// Requirement references attached to a new offer: skill, education and experience ids,
/// plus language id → required level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementLinks {
    pub skills: BTreeSet<i32>,
    pub education: BTreeSet<i32>,
    pub experiences: BTreeSet<i32>,
    pub languages: BTreeMap<i32, String>,
}

/// What an update does to one requirement collection.
///
/// `Keep` when the caller did not supply the collection, `Clear` when an empty one was
/// supplied, `Replace` when a non-empty one was supplied. Replacement is total: every
/// stored link is deleted before the new set is inserted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionUpdate<T> {
    #[default]
    Keep,
    Clear,
    Replace(T),
}

impl<T> CollectionUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, CollectionUpdate::Keep)
    }

    /// The links that must exist once the update is applied, or `None` to keep the stored set.
    pub fn target(&self) -> Option<Option<&T>> {
        match self {
            CollectionUpdate::Keep => None,
            CollectionUpdate::Clear => Some(None),
            CollectionUpdate::Replace(set) => Some(Some(set)),
        }
    }
}

impl<K: Ord> CollectionUpdate<BTreeSet<K>> {
    pub fn from_supplied(supplied: Option<Vec<K>>) -> Self {
        match supplied {
            None => CollectionUpdate::Keep,
            Some(items) if items.is_empty() => CollectionUpdate::Clear,
            Some(items) => CollectionUpdate::Replace(items.into_iter().collect()),
        }
    }
}

impl<K: Ord, V> CollectionUpdate<BTreeMap<K, V>> {
    pub fn from_supplied(supplied: Option<Vec<(K, V)>>) -> Self {
        match supplied {
            None => CollectionUpdate::Keep,
            Some(items) if items.is_empty() => CollectionUpdate::Clear,
            Some(items) => CollectionUpdate::Replace(items.into_iter().collect()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementChanges {
    pub skills: CollectionUpdate<BTreeSet<i32>>,
    pub education: CollectionUpdate<BTreeSet<i32>>,
    pub experiences: CollectionUpdate<BTreeSet<i32>>,
    pub languages: CollectionUpdate<BTreeMap<i32, String>>,
}

impl RequirementChanges {
    pub fn is_noop(&self) -> bool {
        self.skills.is_keep()
            && self.education.is_keep()
            && self.experiences.is_keep()
            && self.languages.is_keep()
    }
}

/// Resolved requirement collections of a stored offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub skills: Vec<Skill>,
    pub education: Vec<Education>,
    pub experiences: Vec<Experience>,
    pub languages: Vec<LanguageLevel>,
}

/// An offer joined with its company name and requirement collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferDetails {
    #[serde(flatten)]
    pub offer: Offer,
    pub company_name: String,
    #[serde(flatten)]
    pub requirements: RequirementSet,
}

/// Candidate-facing offer view.
#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub details: OfferDetails,
    pub liked: bool,
}

/// Company-dashboard offer view.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyOfferView {
    #[serde(flatten)]
    pub details: OfferDetails,
    pub number_applicants: i64,
}

/// A liked offer, annotated with whether the candidate has already applied.
#[derive(Debug, Clone, Serialize)]
pub struct LikedOfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub company_name: String,
    pub applied: bool,
}
