//! Feature extraction for candidates and offers.
//!
//! Both sides produce the same `FeatureVector` shape. Maps are ordered so that identical
//! inputs always serialize to identical payloads.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::candidate::CandidateProfile;
use crate::models::offer::{GeoPoint, OfferDetails};
use crate::models::reference::{Skill, SkillKind};

/// Ordinal of a language proficiency level. Unknown levels map to 0.
pub fn language_ordinal(level: &str) -> u8 {
    match level {
        "beginner" => 1,
        "intermediate" => 2,
        "confirmed" => 3,
        "native" => 4,
        _ => 0,
    }
}

/// Years of study a diploma stands for. Unknown diplomas map to 0.
pub fn diploma_years(diploma: &str) -> u32 {
    match diploma {
        "BTS" | "DUT" => 2,
        "License" | "Bachelor" => 3,
        "Master" | "Engineer" => 5,
        _ => 0,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCounts {
    pub hardskills: BTreeMap<String, u32>,
    pub softskills: BTreeMap<String, u32>,
}

impl SkillCounts {
    /// Partitions skills by kind and counts occurrences by name. Skills of neither kind
    /// are ignored.
    pub fn from_skills<'a>(skills: impl IntoIterator<Item = &'a Skill>) -> Self {
        let mut counts = Self::default();
        for skill in skills {
            let target = match skill.kind() {
                Some(SkillKind::Hard) => &mut counts.hardskills,
                Some(SkillKind::Soft) => &mut counts.softskills,
                None => continue,
            };
            *target.entry(skill.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub location: Option<GeoPoint>,
    #[serde(rename = "diplomaYears")]
    pub diploma_years: u32,
    pub seniority: i16,
    pub languages: BTreeMap<String, u8>,
    pub hardskills: BTreeMap<String, u32>,
    pub softskills: BTreeMap<String, u32>,
}

/// Candidate vector: education years are summed, skills deduplicated by identity.
pub fn candidate_vector(profile: &CandidateProfile) -> FeatureVector {
    let mut seen = BTreeSet::new();
    let unique_skills = profile.skills.iter().filter(|s| seen.insert(s.id));
    let SkillCounts {
        hardskills,
        softskills,
    } = SkillCounts::from_skills(unique_skills);

    FeatureVector {
        location: profile.location,
        diploma_years: profile
            .educations
            .iter()
            .map(|e| diploma_years(&e.diploma))
            .sum(),
        seniority: profile.seniority.unwrap_or(0),
        languages: profile
            .languages
            .iter()
            .map(|l| (l.name.clone(), language_ordinal(&l.level)))
            .collect(),
        hardskills,
        softskills,
    }
}

/// Offer vector: the education requirement is the highest required tier.
pub fn offer_vector(details: &OfferDetails) -> FeatureVector {
    let requirements = &details.requirements;
    let SkillCounts {
        hardskills,
        softskills,
    } = SkillCounts::from_skills(&requirements.skills);

    FeatureVector {
        location: details.offer.gps_location,
        diploma_years: requirements
            .education
            .iter()
            .map(|e| diploma_years(&e.diploma))
            .max()
            .unwrap_or(0),
        seniority: details.offer.seniority.unwrap_or(0),
        languages: requirements
            .languages
            .iter()
            .map(|l| (l.name.clone(), language_ordinal(&l.level)))
            .collect(),
        hardskills,
        softskills,
    }
}
