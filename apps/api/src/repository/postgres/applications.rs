use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::info;

use super::{parse_status, ApplicationRecord};
use crate::errors::AppError;
use crate::models::application::{
    AcceptOutcome, Application, ApplicationStatus, ApplicationView, JobOfferSummary,
};
use crate::repository::ApplicationRepo;

#[derive(Clone)]
pub struct PgApplicationRepo {
    pool: PgPool,
}

impl PgApplicationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationViewRecord {
    id: i32,
    status: String,
    offer_id: Option<i32>,
    offer_title: Option<String>,
    company_name: Option<String>,
}

/// Locks the application row and checks that it may move to `next`.
async fn lock_for_transition(
    conn: &mut PgConnection,
    id: i32,
    next: ApplicationStatus,
) -> Result<ApplicationRecord, AppError> {
    let record = sqlx::query_as::<_, ApplicationRecord>(
        "SELECT * FROM applications WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::ApplicationNotFound(id))?;

    let current = parse_status(&record.status)?;
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: next,
        });
    }
    Ok(record)
}

async fn set_status(
    conn: &mut PgConnection,
    id: i32,
    status: ApplicationStatus,
) -> Result<ApplicationRecord, AppError> {
    let record = sqlx::query_as::<_, ApplicationRecord>(
        "UPDATE applications SET status = $2, modified_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(record)
}

#[async_trait]
impl ApplicationRepo for PgApplicationRepo {
    async fn get_application_by_id(&self, id: i32) -> Result<Option<Application>, AppError> {
        sqlx::query_as::<_, ApplicationRecord>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    async fn get_applications_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ApplicationView>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationViewRecord>(
            r#"
            SELECT a.id, a.status,
                   o.id AS offer_id, o.title AS offer_title, c.name AS company_name
            FROM applications a
            LEFT JOIN job_offers o ON o.id = a.job_offer_id
            LEFT JOIN companies c ON c.id = o.company_id
            WHERE a.user_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let job_offer = match (r.offer_id, r.offer_title, r.company_name) {
                    (Some(id), Some(title), Some(company)) => Some(JobOfferSummary {
                        id,
                        title,
                        company,
                    }),
                    _ => None,
                };
                Ok(ApplicationView {
                    id: r.id,
                    status: parse_status(&r.status)?,
                    job_offer,
                })
            })
            .collect()
    }

    async fn accept_application(
        &self,
        id: i32,
        reject_pending: bool,
    ) -> Result<AcceptOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock order for a cascade is offer, then application, then siblings. Two cascading
        // accepts on one offer queue on the offer row; applies (FOR SHARE) wait behind it.
        if reject_pending {
            let offer_id: i32 =
                sqlx::query_scalar("SELECT job_offer_id FROM applications WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(AppError::ApplicationNotFound(id))?;
            sqlx::query("SELECT id FROM job_offers WHERE id = $1 FOR UPDATE")
                .bind(offer_id)
                .fetch_optional(&mut *tx)
                .await?;
        }

        let current = lock_for_transition(&mut tx, id, ApplicationStatus::Offered).await?;

        let accepted = set_status(&mut tx, id, ApplicationStatus::Offered).await?;

        let mut rejected_application_ids: Vec<i32> = if reject_pending {
            sqlx::query_scalar(
                r#"
                UPDATE applications
                SET status = 'rejected', modified_at = now()
                WHERE job_offer_id = $1 AND status = 'pending' AND id <> $2
                RETURNING id
                "#,
            )
            .bind(current.job_offer_id)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
        } else {
            Vec::new()
        };

        tx.commit().await?;
        rejected_application_ids.sort_unstable();

        info!(
            "Accepted application {id} on offer {}; rejected {} pending siblings",
            current.job_offer_id,
            rejected_application_ids.len()
        );

        Ok(AcceptOutcome {
            application: accepted.try_into()?,
            rejected_application_ids,
        })
    }

    async fn reject_application(&self, id: i32) -> Result<Application, AppError> {
        let mut tx = self.pool.begin().await?;

        lock_for_transition(&mut tx, id, ApplicationStatus::Rejected).await?;
        let rejected = set_status(&mut tx, id, ApplicationStatus::Rejected).await?;

        tx.commit().await?;

        info!("Rejected application {id}");
        rejected.try_into()
    }
}
