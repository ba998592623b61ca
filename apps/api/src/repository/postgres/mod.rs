//! sqlx/Postgres implementations of the repository contracts.

mod accounts;
mod applications;
mod offers;

pub use accounts::{PgCandidateRepo, PgCompanyRepo, PgUserRepo};
pub use applications::PgApplicationRepo;
pub use offers::PgOfferRepo;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationStatus};

/// Translates constraint violations raised by writes into validation errors.
/// Anything else stays a database error.
pub(crate) fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return AppError::Validation(format!(
                "unknown reference ({})",
                db_err.constraint().unwrap_or("foreign key")
            ));
        }
        if db_err.is_check_violation() {
            return AppError::Validation(format!(
                "constraint violated ({})",
                db_err.constraint().unwrap_or("check")
            ));
        }
    }
    AppError::Database(err)
}

#[derive(Debug, FromRow)]
pub(crate) struct ApplicationRecord {
    pub id: i32,
    pub user_id: i32,
    pub job_offer_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

pub(crate) fn parse_status(raw: &str) -> Result<ApplicationStatus, AppError> {
    raw.parse::<ApplicationStatus>()
        .map_err(|e| AppError::Internal(anyhow!(e)))
}

impl TryFrom<ApplicationRecord> for Application {
    type Error = AppError;

    fn try_from(record: ApplicationRecord) -> Result<Self, Self::Error> {
        Ok(Application {
            id: record.id,
            candidate_id: record.user_id,
            offer_id: record.job_offer_id,
            status: parse_status(&record.status)?,
            created_at: record.created_at,
            modified_at: record.modified_at,
        })
    }
}
