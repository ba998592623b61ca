use std::collections::BTreeMap;

use serde::Serialize;

use crate::matching::features::FeatureVector;

/// Per-dimension weights the scorer applies to the candidate's own skills and languages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateWeights {
    pub hardskills: BTreeMap<String, u32>,
    pub softskills: BTreeMap<String, u32>,
    pub languages: BTreeMap<String, u8>,
}

impl CandidateWeights {
    pub fn from_vector(vector: &FeatureVector) -> Self {
        Self {
            hardskills: vector.hardskills.clone(),
            softskills: vector.softskills.clone(),
            languages: vector.languages.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOffer {
    pub offer_id: i32,
    pub job_title: String,
    #[serde(flatten)]
    pub vector: FeatureVector,
}

/// Body posted to the external ranking service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_job_title_emb: Option<Vec<f64>>,
    pub candidate_weights: CandidateWeights,
    pub candidate_attribute: FeatureVector,
    pub job_offers: Vec<RankedOffer>,
}

pub struct MatchingRequestBuilder;

impl MatchingRequestBuilder {
    /// Assembles the ranking payload. Offers are emitted in ascending id order.
    pub fn build(
        candidate: FeatureVector,
        mut offers: Vec<RankedOffer>,
        user_job_title_emb: Option<Vec<f64>>,
    ) -> RankingRequest {
        offers.sort_by_key(|o| o.offer_id);
        RankingRequest {
            user_job_title_emb,
            candidate_weights: CandidateWeights::from_vector(&candidate),
            candidate_attribute: candidate,
            job_offers: offers,
        }
    }
}
