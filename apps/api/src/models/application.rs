use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an application. `Pending` is the only initial state; the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Offered,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Pending, ApplicationStatus::Offered)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "offered" => Ok(ApplicationStatus::Offered),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i32,
    pub candidate_id: i32,
    pub offer_id: i32,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Result of an accept: the offered application plus the siblings rejected alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptOutcome {
    pub application: Application,
    pub rejected_application_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOfferSummary {
    pub id: i32,
    pub title: String,
    pub company: String,
}

/// Candidate-facing view of an application. `job_offer` is absent once the offer was removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: i32,
    pub status: ApplicationStatus,
    pub job_offer: Option<JobOfferSummary>,
}

/// Company-facing applicant row for one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferApplicant {
    pub id: i32,
    pub offer_id: i32,
    pub user_id: i32,
    pub user_fullname: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}
