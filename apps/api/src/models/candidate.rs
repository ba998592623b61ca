use serde::{Deserialize, Serialize};

use crate::models::offer::GeoPoint;
use crate::models::reference::{Education, LanguageLevel, Skill};

/// Candidate scalar attributes consumed by matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub user_id: i32,
    /// 1 junior, 2 confirmed, 3 senior.
    pub seniority: Option<i16>,
    pub gps_location: Option<GeoPoint>,
}

/// Everything the profile extractor reads about a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Union of project and experience skills.
    pub skills: Vec<Skill>,
    pub languages: Vec<LanguageLevel>,
    pub educations: Vec<Education>,
    pub seniority: Option<i16>,
    pub location: Option<GeoPoint>,
}
