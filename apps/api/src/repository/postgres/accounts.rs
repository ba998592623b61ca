use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::models::offer::GeoPoint;
use crate::models::reference::{Education, LanguageLevel, Skill};
use crate::models::user::{Company, CompanyUser, Role, User};
use crate::repository::{CandidateRepo, CompanyRepo, UserRepo};

// ────────────────────────────────────────────────────────────────────────────
// Companies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgCompanyRepo {
    pool: PgPool,
}

impl PgCompanyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepo for PgCompanyRepo {
    async fn find_by_id(&self, id: i32) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT id, name, created_at, modified_at FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<CompanyUser>, AppError> {
        let link = sqlx::query_as::<_, CompanyUser>(
            "SELECT user_id, company_id, name FROM company_users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: i32,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let Some(record) = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, role, created_at, modified_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let role = record
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(anyhow!(e)))?;
        Ok(Some(User {
            id: record.id,
            email: record.email,
            role,
            created_at: record.created_at,
            modified_at: record.modified_at,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidates
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgCandidateRepo {
    pool: PgPool,
}

impl PgCandidateRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    user_id: i32,
    looking_for_experience: Option<i16>,
    longitude: Option<f64>,
    latitude: Option<f64>,
}

#[async_trait]
impl CandidateRepo for PgCandidateRepo {
    async fn get_candidate(&self, user_id: i32) -> Result<Option<CandidateRecord>, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT user_id, looking_for_experience, longitude, latitude
            FROM candidate_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CandidateRecord {
            user_id: r.user_id,
            seniority: r.looking_for_experience,
            gps_location: GeoPoint::from_columns(r.longitude, r.latitude),
        }))
    }

    async fn get_candidate_skills(&self, user_id: i32) -> Result<Vec<Skill>, AppError> {
        // UNION drops skills reached through both a project and an experience.
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT s.id, s.name, s.type, s.category
            FROM skills s
            JOIN projects_skills ps ON ps.skill_id = s.id
            JOIN projects p ON p.id = ps.project_id
            WHERE p.user_id = $1
            UNION
            SELECT s.id, s.name, s.type, s.category
            FROM skills s
            JOIN experience_skills es ON es.skill_id = s.id
            JOIN user_experiences ue ON ue.experience_id = es.experience_id
            WHERE ue.user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn get_candidate_languages(
        &self,
        user_id: i32,
    ) -> Result<Vec<LanguageLevel>, AppError> {
        let languages = sqlx::query_as::<_, LanguageLevel>(
            r#"
            SELECT l.id, l.name, ul.level
            FROM users_languages ul
            JOIN languages l ON l.id = ul.language_id
            WHERE ul.user_id = $1
            ORDER BY l.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(languages)
    }

    async fn get_candidate_educations(&self, user_id: i32) -> Result<Vec<Education>, AppError> {
        let educations = sqlx::query_as::<_, Education>(
            r#"
            SELECT e.id, e.domain, e.diploma
            FROM user_education ue
            JOIN education e ON e.id = ue.education_id
            WHERE ue.user_id = $1
            ORDER BY e.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(educations)
    }
}
