use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::application::ApplicationStatus;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Offer {0} not found")]
    OfferNotFound(i32),

    #[error("Application {0} not found")]
    ApplicationNotFound(i32),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("Company {0} not found")]
    CompanyNotFound(i32),

    #[error("No company profile is associated with this user")]
    NoAssociatedCompany,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Candidate {candidate_id} already applied to offer {offer_id}")]
    AlreadyApplied { candidate_id: i32, offer_id: i32 },

    #[error("Cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::OfferNotFound(_) => (StatusCode::NOT_FOUND, "OFFER_NOT_FOUND"),
            AppError::ApplicationNotFound(_) => (StatusCode::NOT_FOUND, "APPLICATION_NOT_FOUND"),
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AppError::CompanyNotFound(_) => (StatusCode::NOT_FOUND, "COMPANY_NOT_FOUND"),
            AppError::NoAssociatedCompany => (StatusCode::NOT_FOUND, "NO_ASSOCIATED_COMPANY"),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AppError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            AppError::AlreadyApplied { .. } => (StatusCode::CONFLICT, "ALREADY_APPLIED"),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {msg}");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_map_to_404() {
        for err in [
            AppError::OfferNotFound(1),
            AppError::ApplicationNotFound(1),
            AppError::UserNotFound(1),
            AppError::CompanyNotFound(1),
            AppError::NoAssociatedCompany,
        ] {
            assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_conflicts_map_to_409() {
        let applied = AppError::AlreadyApplied {
            candidate_id: 3,
            offer_id: 7,
        };
        assert_eq!(applied.status_and_code(), (StatusCode::CONFLICT, "ALREADY_APPLIED"));
        assert!(applied.to_string().contains("offer 7"));

        let transition = AppError::InvalidTransition {
            from: ApplicationStatus::Rejected,
            to: ApplicationStatus::Offered,
        };
        assert_eq!(transition.status_and_code().0, StatusCode::CONFLICT);
        assert_eq!(
            transition.to_string(),
            "Cannot move application from rejected to offered"
        );
    }

    #[test]
    fn test_ownership_failure_is_forbidden_not_unauthenticated() {
        assert_eq!(
            AppError::Unauthorized("not the owner".into()).status_and_code().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Unauthenticated.status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_upstream_is_bad_gateway() {
        assert_eq!(
            AppError::Upstream("geocoder down".into()).status_and_code().0,
            StatusCode::BAD_GATEWAY
        );
    }
}
