use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, info};

use super::{map_write_error, parse_status, ApplicationRecord};
use crate::errors::AppError;
use crate::models::application::{Application, OfferApplicant};
use crate::models::offer::{
    CollectionUpdate, GeoPoint, LikedOfferView, LocationType, NewOffer, Offer, OfferChanges,
    OfferDetails, RequirementChanges, RequirementLinks, RequirementSet,
};
use crate::models::reference::{Education, Experience, LanguageLevel, Skill};
use crate::repository::{CompanyOffer, OfferRepo};

#[derive(Clone)]
pub struct PgOfferRepo {
    pool: PgPool,
}

impl PgOfferRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct OfferRecord {
    id: i32,
    company_id: i32,
    title: String,
    body: String,
    min_salary: i32,
    max_salary: i32,
    location_type: String,
    address: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    seniority: Option<i16>,
    status: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl TryFrom<OfferRecord> for Offer {
    type Error = AppError;

    fn try_from(r: OfferRecord) -> Result<Self, Self::Error> {
        let location_type = r
            .location_type
            .parse::<LocationType>()
            .map_err(|e| AppError::Internal(anyhow!(e)))?;
        Ok(Offer {
            id: r.id,
            company_id: r.company_id,
            title: r.title,
            body: r.body,
            min_salary: r.min_salary,
            max_salary: r.max_salary,
            location_type,
            address: r.address,
            gps_location: GeoPoint::from_columns(r.longitude, r.latitude),
            seniority: r.seniority,
            status: r.status,
            image: r.image,
            created_at: r.created_at,
            modified_at: r.modified_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OfferWithCompanyRecord {
    #[sqlx(flatten)]
    offer: OfferRecord,
    company_name: String,
}

#[derive(Debug, FromRow)]
struct CompanyOfferRecord {
    #[sqlx(flatten)]
    offer: OfferRecord,
    company_name: String,
    number_applicants: i64,
}

#[derive(Debug, FromRow)]
struct LikedOfferRecord {
    #[sqlx(flatten)]
    offer: OfferRecord,
    company_name: String,
    applied: bool,
}

#[derive(Debug, FromRow)]
struct SkillLink {
    job_offer_id: i32,
    #[sqlx(flatten)]
    skill: Skill,
}

#[derive(Debug, FromRow)]
struct EducationLink {
    job_offer_id: i32,
    #[sqlx(flatten)]
    education: Education,
}

#[derive(Debug, FromRow)]
struct ExperienceLink {
    job_offer_id: i32,
    #[sqlx(flatten)]
    experience: Experience,
}

#[derive(Debug, FromRow)]
struct LanguageLink {
    job_offer_id: i32,
    #[sqlx(flatten)]
    language: LanguageLevel,
}

#[derive(Debug, FromRow)]
struct ApplicantRecord {
    id: i32,
    offer_id: i32,
    user_id: i32,
    user_fullname: String,
    status: String,
    applied_at: DateTime<Utc>,
}

const OFFER_WITH_COMPANY: &str = r#"
    SELECT o.*, c.name AS company_name
    FROM job_offers o
    JOIN companies c ON c.id = o.company_id
"#;

// ────────────────────────────────────────────────────────────────────────────
// Requirement link tables
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum LinkTable {
    Skills,
    Education,
    Experiences,
}

impl LinkTable {
    fn table(&self) -> &'static str {
        match self {
            LinkTable::Skills => "job_offer_skills",
            LinkTable::Education => "job_offer_education",
            LinkTable::Experiences => "job_offer_experiences",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            LinkTable::Skills => "skill_id",
            LinkTable::Education => "education_id",
            LinkTable::Experiences => "experience_id",
        }
    }
}

async fn insert_links(
    conn: &mut PgConnection,
    offer_id: i32,
    link: LinkTable,
    ids: &BTreeSet<i32>,
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let ids: Vec<i32> = ids.iter().copied().collect();
    let sql = format!(
        "INSERT INTO {} ({}, job_offer_id) SELECT UNNEST($1::int4[]), $2",
        link.table(),
        link.column()
    );
    sqlx::query(&sql)
        .bind(&ids)
        .bind(offer_id)
        .execute(&mut *conn)
        .await
        .map_err(map_write_error)?;
    Ok(())
}

async fn insert_language_links(
    conn: &mut PgConnection,
    offer_id: i32,
    languages: &BTreeMap<i32, String>,
) -> Result<(), AppError> {
    if languages.is_empty() {
        return Ok(());
    }
    let (ids, levels): (Vec<i32>, Vec<String>) = languages
        .iter()
        .map(|(id, level)| (*id, level.clone()))
        .unzip();
    sqlx::query(
        r#"
        INSERT INTO job_offer_languages (language_id, level, job_offer_id)
        SELECT l.language_id, l.level, $3
        FROM UNNEST($1::int4[], $2::text[]) AS l(language_id, level)
        "#,
    )
    .bind(&ids)
    .bind(&levels)
    .bind(offer_id)
    .execute(&mut *conn)
    .await
    .map_err(map_write_error)?;
    Ok(())
}

async fn replace_links(
    conn: &mut PgConnection,
    offer_id: i32,
    link: LinkTable,
    update: &CollectionUpdate<BTreeSet<i32>>,
) -> Result<(), AppError> {
    let Some(target) = update.target() else {
        return Ok(());
    };
    let sql = format!("DELETE FROM {} WHERE job_offer_id = $1", link.table());
    sqlx::query(&sql).bind(offer_id).execute(&mut *conn).await?;
    if let Some(ids) = target {
        insert_links(conn, offer_id, link, ids).await?;
    }
    Ok(())
}

async fn replace_language_links(
    conn: &mut PgConnection,
    offer_id: i32,
    update: &CollectionUpdate<BTreeMap<i32, String>>,
) -> Result<(), AppError> {
    let Some(target) = update.target() else {
        return Ok(());
    };
    sqlx::query("DELETE FROM job_offer_languages WHERE job_offer_id = $1")
        .bind(offer_id)
        .execute(&mut *conn)
        .await?;
    if let Some(languages) = target {
        insert_language_links(conn, offer_id, languages).await?;
    }
    Ok(())
}

/// Loads the requirement collections of several offers with one query per collection.
async fn load_requirements(
    pool: &PgPool,
    offer_ids: &[i32],
) -> Result<HashMap<i32, RequirementSet>, AppError> {
    let mut sets: HashMap<i32, RequirementSet> = offer_ids
        .iter()
        .map(|id| (*id, RequirementSet::default()))
        .collect();
    if offer_ids.is_empty() {
        return Ok(sets);
    }

    let skills = sqlx::query_as::<_, SkillLink>(
        r#"
        SELECT l.job_offer_id, s.id, s.name, s.type, s.category
        FROM job_offer_skills l
        JOIN skills s ON s.id = l.skill_id
        WHERE l.job_offer_id = ANY($1)
        ORDER BY l.job_offer_id, s.id
        "#,
    )
    .bind(offer_ids)
    .fetch_all(pool)
    .await?;
    for link in skills {
        if let Some(set) = sets.get_mut(&link.job_offer_id) {
            set.skills.push(link.skill);
        }
    }

    let education = sqlx::query_as::<_, EducationLink>(
        r#"
        SELECT l.job_offer_id, e.id, e.domain, e.diploma
        FROM job_offer_education l
        JOIN education e ON e.id = l.education_id
        WHERE l.job_offer_id = ANY($1)
        ORDER BY l.job_offer_id, e.id
        "#,
    )
    .bind(offer_ids)
    .fetch_all(pool)
    .await?;
    for link in education {
        if let Some(set) = sets.get_mut(&link.job_offer_id) {
            set.education.push(link.education);
        }
    }

    let experiences = sqlx::query_as::<_, ExperienceLink>(
        r#"
        SELECT l.job_offer_id, x.id, x.name
        FROM job_offer_experiences l
        JOIN experiences x ON x.id = l.experience_id
        WHERE l.job_offer_id = ANY($1)
        ORDER BY l.job_offer_id, x.id
        "#,
    )
    .bind(offer_ids)
    .fetch_all(pool)
    .await?;
    for link in experiences {
        if let Some(set) = sets.get_mut(&link.job_offer_id) {
            set.experiences.push(link.experience);
        }
    }

    let languages = sqlx::query_as::<_, LanguageLink>(
        r#"
        SELECT l.job_offer_id, g.id, g.name, l.level
        FROM job_offer_languages l
        JOIN languages g ON g.id = l.language_id
        WHERE l.job_offer_id = ANY($1)
        ORDER BY l.job_offer_id, g.id
        "#,
    )
    .bind(offer_ids)
    .fetch_all(pool)
    .await?;
    for link in languages {
        if let Some(set) = sets.get_mut(&link.job_offer_id) {
            set.languages.push(link.language);
        }
    }

    Ok(sets)
}

fn into_details(
    record: OfferRecord,
    company_name: String,
    sets: &mut HashMap<i32, RequirementSet>,
) -> Result<OfferDetails, AppError> {
    let requirements = sets.remove(&record.id).unwrap_or_default();
    Ok(OfferDetails {
        offer: record.try_into()?,
        company_name,
        requirements,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// OfferRepo
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OfferRepo for PgOfferRepo {
    async fn create(&self, offer: NewOffer, links: RequirementLinks) -> Result<Offer, AppError> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, OfferRecord>(
            r#"
            INSERT INTO job_offers
                (company_id, title, body, min_salary, max_salary, location_type, address,
                 longitude, latitude, seniority, status, image, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now())
            RETURNING *
            "#,
        )
        .bind(offer.company_id)
        .bind(&offer.title)
        .bind(&offer.body)
        .bind(offer.min_salary)
        .bind(offer.max_salary)
        .bind(offer.location_type.as_str())
        .bind(&offer.address)
        .bind(offer.gps_location.map(|p| p.lon))
        .bind(offer.gps_location.map(|p| p.lat))
        .bind(offer.seniority)
        .bind(&offer.status)
        .bind(&offer.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        insert_links(&mut tx, record.id, LinkTable::Skills, &links.skills).await?;
        insert_links(&mut tx, record.id, LinkTable::Education, &links.education).await?;
        insert_links(&mut tx, record.id, LinkTable::Experiences, &links.experiences).await?;
        insert_language_links(&mut tx, record.id, &links.languages).await?;

        tx.commit().await?;

        info!(
            "Created offer {} for company {}",
            record.id, record.company_id
        );
        record.try_into()
    }

    async fn update_with_links(
        &self,
        id: i32,
        changes: OfferChanges,
        requirements: RequirementChanges,
    ) -> Result<Offer, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, OfferRecord>(
            "SELECT * FROM job_offers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::OfferNotFound(id))?;

        let mut offer: Offer = current.try_into()?;
        changes.apply_to(&mut offer);

        let record = sqlx::query_as::<_, OfferRecord>(
            r#"
            UPDATE job_offers
            SET title = $2, body = $3, min_salary = $4, max_salary = $5, location_type = $6,
                address = $7, longitude = $8, latitude = $9, seniority = $10, status = $11,
                image = $12, modified_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&offer.title)
        .bind(&offer.body)
        .bind(offer.min_salary)
        .bind(offer.max_salary)
        .bind(offer.location_type.as_str())
        .bind(&offer.address)
        .bind(offer.gps_location.map(|p| p.lon))
        .bind(offer.gps_location.map(|p| p.lat))
        .bind(offer.seniority)
        .bind(&offer.status)
        .bind(&offer.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        replace_links(&mut tx, id, LinkTable::Skills, &requirements.skills).await?;
        replace_links(&mut tx, id, LinkTable::Education, &requirements.education).await?;
        replace_links(&mut tx, id, LinkTable::Experiences, &requirements.experiences).await?;
        replace_language_links(&mut tx, id, &requirements.languages).await?;

        tx.commit().await?;

        info!("Updated offer {id}");
        record.try_into()
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for table in [
            "job_offer_skills",
            "job_offer_education",
            "job_offer_experiences",
            "job_offer_languages",
            "users_liked_job_offers",
        ] {
            let sql = format!("DELETE FROM {table} WHERE job_offer_id = $1");
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }

        let deleted = sqlx::query("DELETE FROM job_offers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::OfferNotFound(id));
        }

        tx.commit().await?;

        info!("Deleted offer {id}; its applications are retained");
        Ok(())
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<OfferDetails>, AppError> {
        let sql = format!("{OFFER_WITH_COMPANY} WHERE o.id = $1");
        let Some(row) = sqlx::query_as::<_, OfferWithCompanyRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut sets = load_requirements(&self.pool, &[id]).await?;
        into_details(row.offer, row.company_name, &mut sets).map(Some)
    }

    async fn get_all(&self) -> Result<Vec<OfferDetails>, AppError> {
        let sql = format!("{OFFER_WITH_COMPANY} ORDER BY o.created_at DESC, o.id DESC");
        let rows = sqlx::query_as::<_, OfferWithCompanyRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.offer.id).collect();
        let mut sets = load_requirements(&self.pool, &ids).await?;
        debug!("Loaded {} offers", rows.len());

        rows.into_iter()
            .map(|row| into_details(row.offer, row.company_name, &mut sets))
            .collect()
    }

    async fn get_by_company(&self, company_id: i32) -> Result<Vec<CompanyOffer>, AppError> {
        let rows = sqlx::query_as::<_, CompanyOfferRecord>(
            r#"
            SELECT o.*, c.name AS company_name,
                   (SELECT COUNT(*) FROM applications a WHERE a.job_offer_id = o.id)
                       AS number_applicants
            FROM job_offers o
            JOIN companies c ON c.id = o.company_id
            WHERE o.company_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.offer.id).collect();
        let mut sets = load_requirements(&self.pool, &ids).await?;

        rows.into_iter()
            .map(|row| {
                Ok(CompanyOffer {
                    details: into_details(row.offer, row.company_name, &mut sets)?,
                    number_applicants: row.number_applicants,
                })
            })
            .collect()
    }

    async fn get_liked(&self, user_id: i32) -> Result<Vec<LikedOfferView>, AppError> {
        let rows = sqlx::query_as::<_, LikedOfferRecord>(
            r#"
            SELECT o.*, c.name AS company_name,
                   EXISTS (
                       SELECT 1 FROM applications a
                       WHERE a.job_offer_id = o.id AND a.user_id = $1
                   ) AS applied
            FROM users_liked_job_offers l
            JOIN job_offers o ON o.id = l.job_offer_id
            JOIN companies c ON c.id = o.company_id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC, o.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(LikedOfferView {
                    offer: row.offer.try_into()?,
                    company_name: row.company_name,
                    applied: row.applied,
                })
            })
            .collect()
    }

    async fn liked_offer_ids(&self, user_id: i32) -> Result<BTreeSet<i32>, AppError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT job_offer_id FROM users_liked_job_offers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn does_user_like(&self, offer_id: i32, user_id: i32) -> Result<bool, AppError> {
        let liked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users_liked_job_offers WHERE job_offer_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(offer_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(liked)
    }

    async fn like(&self, offer_id: i32, user_id: i32) -> Result<(), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users_liked_job_offers (user_id, job_offer_id, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id, job_offer_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(offer_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?
        .rows_affected();

        debug!("User {user_id} liked offer {offer_id} (new row: {})", inserted > 0);
        Ok(())
    }

    async fn unlike(&self, offer_id: i32, user_id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users_liked_job_offers WHERE user_id = $1 AND job_offer_id = $2")
            .bind(user_id)
            .bind(offer_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn apply(&self, offer_id: i32, user_id: i32) -> Result<Application, AppError> {
        let mut tx = self.pool.begin().await?;

        // Shared lock: conflicts with the exclusive lock a cascading accept takes on the offer.
        let offer: Option<i32> =
            sqlx::query_scalar("SELECT id FROM job_offers WHERE id = $1 FOR SHARE")
                .bind(offer_id)
                .fetch_optional(&mut *tx)
                .await?;
        if offer.is_none() {
            return Err(AppError::OfferNotFound(offer_id));
        }

        let record = sqlx::query_as::<_, ApplicationRecord>(
            r#"
            INSERT INTO applications (user_id, job_offer_id, status, created_at, modified_at)
            VALUES ($1, $2, 'pending', now(), now())
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(offer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::AlreadyApplied {
                    candidate_id: user_id,
                    offer_id,
                }
            }
            _ => map_write_error(err),
        })?;

        tx.commit().await?;

        info!("User {user_id} applied to offer {offer_id} (application {})", record.id);
        record.try_into()
    }

    async fn get_applications(&self, offer_id: i32) -> Result<Vec<OfferApplicant>, AppError> {
        let rows = sqlx::query_as::<_, ApplicantRecord>(
            r#"
            SELECT a.id, a.job_offer_id AS offer_id, a.user_id,
                   cu.firstname || ' ' || cu.lastname AS user_fullname,
                   a.status, a.created_at AS applied_at
            FROM applications a
            JOIN candidate_users cu ON cu.user_id = a.user_id
            WHERE a.job_offer_id = $1
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(OfferApplicant {
                    id: r.id,
                    offer_id: r.offer_id,
                    user_id: r.user_id,
                    user_fullname: r.user_fullname,
                    status: parse_status(&r.status)?,
                    applied_at: r.applied_at,
                })
            })
            .collect()
    }
}
