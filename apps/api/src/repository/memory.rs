//! In-memory implementations of every repository contract, shared through one locked state
//! so likes, applications and offers stay consistent across handles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::application::{
    AcceptOutcome, Application, ApplicationStatus, ApplicationView, JobOfferSummary,
    OfferApplicant,
};
use crate::models::candidate::{CandidateProfile, CandidateRecord};
use crate::models::offer::{
    CollectionUpdate, LikedOfferView, NewOffer, Offer, OfferChanges, OfferDetails,
    RequirementChanges, RequirementLinks, RequirementSet,
};
use crate::models::reference::{Education, Experience, LanguageLevel, Skill};
use crate::models::user::{Company, CompanyUser, Role, User};
use crate::repository::{
    ApplicationRepo, CandidateRepo, CompanyOffer, CompanyRepo, OfferRepo, UserRepo,
};

#[derive(Default)]
struct State {
    next_id: i32,
    users: BTreeMap<i32, User>,
    companies: BTreeMap<i32, Company>,
    company_users: BTreeMap<i32, CompanyUser>,
    candidates: BTreeMap<i32, CandidateRecord>,
    candidate_names: BTreeMap<i32, String>,
    profiles: BTreeMap<i32, CandidateProfile>,
    skills: BTreeMap<i32, Skill>,
    education: BTreeMap<i32, Education>,
    experiences: BTreeMap<i32, Experience>,
    languages: BTreeMap<i32, String>,
    offers: BTreeMap<i32, Offer>,
    links: BTreeMap<i32, RequirementLinks>,
    applications: BTreeMap<i32, Application>,
    /// (user id, offer id)
    likes: BTreeSet<(i32, i32)>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_ids<'a>(
        known: impl Fn(&i32) -> bool,
        ids: impl IntoIterator<Item = &'a i32>,
        what: &str,
    ) -> Result<(), AppError> {
        for id in ids {
            if !known(id) {
                return Err(AppError::Validation(format!("unknown reference ({what} {id})")));
            }
        }
        Ok(())
    }

    fn check_links(&self, links: &RequirementLinks) -> Result<(), AppError> {
        Self::check_ids(|id| self.skills.contains_key(id), &links.skills, "skill")?;
        Self::check_ids(|id| self.education.contains_key(id), &links.education, "education")?;
        Self::check_ids(
            |id| self.experiences.contains_key(id),
            &links.experiences,
            "experience",
        )?;
        Self::check_ids(
            |id| self.languages.contains_key(id),
            links.languages.keys(),
            "language",
        )
    }

    fn check_changes(&self, changes: &RequirementChanges) -> Result<(), AppError> {
        let mut replacements = RequirementLinks::default();
        if let CollectionUpdate::Replace(ids) = &changes.skills {
            replacements.skills = ids.clone();
        }
        if let CollectionUpdate::Replace(ids) = &changes.education {
            replacements.education = ids.clone();
        }
        if let CollectionUpdate::Replace(ids) = &changes.experiences {
            replacements.experiences = ids.clone();
        }
        if let CollectionUpdate::Replace(languages) = &changes.languages {
            replacements.languages = languages.clone();
        }
        self.check_links(&replacements)
    }

    fn requirement_set(&self, offer_id: i32) -> RequirementSet {
        let Some(links) = self.links.get(&offer_id) else {
            return RequirementSet::default();
        };
        RequirementSet {
            skills: links
                .skills
                .iter()
                .filter_map(|id| self.skills.get(id).cloned())
                .collect(),
            education: links
                .education
                .iter()
                .filter_map(|id| self.education.get(id).cloned())
                .collect(),
            experiences: links
                .experiences
                .iter()
                .filter_map(|id| self.experiences.get(id).cloned())
                .collect(),
            languages: links
                .languages
                .iter()
                .filter_map(|(id, level)| {
                    self.languages.get(id).map(|name| LanguageLevel {
                        id: *id,
                        name: name.clone(),
                        level: level.clone(),
                    })
                })
                .collect(),
        }
    }

    fn company_name(&self, company_id: i32) -> String {
        self.companies
            .get(&company_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn details(&self, offer: &Offer) -> OfferDetails {
        OfferDetails {
            offer: offer.clone(),
            company_name: self.company_name(offer.company_id),
            requirements: self.requirement_set(offer.id),
        }
    }

    /// Offers newest first.
    fn offers_desc(&self) -> impl Iterator<Item = &Offer> {
        self.offers.values().rev()
    }

    fn transition(
        &mut self,
        id: i32,
        next: ApplicationStatus,
    ) -> Result<Application, AppError> {
        let application = self
            .applications
            .get_mut(&id)
            .ok_or(AppError::ApplicationNotFound(id))?;
        if !application.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: application.status,
                to: next,
            });
        }
        application.status = next;
        application.modified_at = Utc::now();
        Ok(application.clone())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    fn add_user(state: &mut State, role: Role) -> i32 {
        let id = state.next_id();
        let now = Utc::now();
        state.users.insert(
            id,
            User {
                id,
                email: format!("user{id}@example.test"),
                role,
                created_at: now,
                modified_at: now,
            },
        );
        id
    }

    pub fn add_company(&self, name: &str) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        let now = Utc::now();
        state.companies.insert(
            id,
            Company {
                id,
                name: name.to_string(),
                created_at: now,
                modified_at: now,
            },
        );
        id
    }

    /// Creates a company-role user administering `company_id` and returns the user id.
    pub fn add_company_user(&self, company_id: i32) -> i32 {
        let mut state = self.lock();
        let user_id = Self::add_user(&mut state, Role::Company);
        state.company_users.insert(
            user_id,
            CompanyUser {
                user_id,
                company_id,
                name: format!("admin {user_id}"),
            },
        );
        user_id
    }

    /// Creates a company-role user with no company link.
    pub fn add_orphan_company_user(&self) -> i32 {
        let mut state = self.lock();
        Self::add_user(&mut state, Role::Company)
    }

    pub fn add_candidate(&self, firstname: &str, lastname: &str) -> i32 {
        let mut state = self.lock();
        let user_id = Self::add_user(&mut state, Role::Candidate);
        state.candidates.insert(
            user_id,
            CandidateRecord {
                user_id,
                seniority: None,
                gps_location: None,
            },
        );
        state
            .candidate_names
            .insert(user_id, format!("{firstname} {lastname}"));
        user_id
    }

    pub fn set_profile(&self, user_id: i32, profile: CandidateProfile) {
        let mut state = self.lock();
        if let Some(record) = state.candidates.get_mut(&user_id) {
            record.seniority = profile.seniority;
            record.gps_location = profile.location;
        }
        state.profiles.insert(user_id, profile);
    }

    pub fn add_skill(&self, name: &str, skill_type: &str) -> Skill {
        let mut state = self.lock();
        let id = state.next_id();
        let skill = Skill {
            id,
            name: name.to_string(),
            skill_type: skill_type.to_string(),
            category: "general".to_string(),
        };
        state.skills.insert(id, skill.clone());
        skill
    }

    pub fn add_education(&self, domain: &str, diploma: &str) -> Education {
        let mut state = self.lock();
        let id = state.next_id();
        let education = Education {
            id,
            domain: domain.to_string(),
            diploma: diploma.to_string(),
        };
        state.education.insert(id, education.clone());
        education
    }

    pub fn add_experience(&self, name: &str) -> Experience {
        let mut state = self.lock();
        let id = state.next_id();
        let experience = Experience {
            id,
            name: name.to_string(),
        };
        state.experiences.insert(id, experience.clone());
        experience
    }

    pub fn add_language(&self, name: &str) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        state.languages.insert(id, name.to_string());
        id
    }

    pub fn application(&self, id: i32) -> Option<Application> {
        self.lock().applications.get(&id).cloned()
    }

    pub fn links(&self, offer_id: i32) -> Option<RequirementLinks> {
        self.lock().links.get(&offer_id).cloned()
    }

    pub fn offer_count(&self) -> usize {
        self.lock().offers.len()
    }

    pub fn likes_for_offer(&self, offer_id: i32) -> usize {
        self.lock()
            .likes
            .iter()
            .filter(|(_, liked)| *liked == offer_id)
            .count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OfferRepo
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OfferRepo for MemoryStore {
    async fn create(&self, offer: NewOffer, links: RequirementLinks) -> Result<Offer, AppError> {
        let mut state = self.lock();
        state.check_links(&links)?;
        if !state.companies.contains_key(&offer.company_id) {
            return Err(AppError::Validation(format!(
                "unknown reference (company {})",
                offer.company_id
            )));
        }

        let id = state.next_id();
        let now = Utc::now();
        let stored = Offer {
            id,
            company_id: offer.company_id,
            title: offer.title,
            body: offer.body,
            min_salary: offer.min_salary,
            max_salary: offer.max_salary,
            location_type: offer.location_type,
            address: offer.address,
            gps_location: offer.gps_location,
            seniority: offer.seniority,
            status: offer.status,
            image: offer.image,
            created_at: now,
            modified_at: now,
        };
        state.offers.insert(id, stored.clone());
        state.links.insert(id, links);
        Ok(stored)
    }

    async fn update_with_links(
        &self,
        id: i32,
        changes: OfferChanges,
        requirements: RequirementChanges,
    ) -> Result<Offer, AppError> {
        let mut state = self.lock();
        if !state.offers.contains_key(&id) {
            return Err(AppError::OfferNotFound(id));
        }
        state.check_changes(&requirements)?;

        let links = state.links.entry(id).or_default();
        if let Some(target) = requirements.skills.target() {
            links.skills = target.cloned().unwrap_or_default();
        }
        if let Some(target) = requirements.education.target() {
            links.education = target.cloned().unwrap_or_default();
        }
        if let Some(target) = requirements.experiences.target() {
            links.experiences = target.cloned().unwrap_or_default();
        }
        if let Some(target) = requirements.languages.target() {
            links.languages = target.cloned().unwrap_or_default();
        }

        let offer = state
            .offers
            .get_mut(&id)
            .ok_or(AppError::OfferNotFound(id))?;
        changes.apply_to(offer);
        offer.modified_at = Utc::now();
        Ok(offer.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.offers.remove(&id).is_none() {
            return Err(AppError::OfferNotFound(id));
        }
        state.links.remove(&id);
        state.likes.retain(|(_, offer_id)| *offer_id != id);
        Ok(())
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<OfferDetails>, AppError> {
        let state = self.lock();
        Ok(state.offers.get(&id).map(|offer| state.details(offer)))
    }

    async fn get_all(&self) -> Result<Vec<OfferDetails>, AppError> {
        let state = self.lock();
        Ok(state.offers_desc().map(|offer| state.details(offer)).collect())
    }

    async fn get_by_company(&self, company_id: i32) -> Result<Vec<CompanyOffer>, AppError> {
        let state = self.lock();
        Ok(state
            .offers_desc()
            .filter(|offer| offer.company_id == company_id)
            .map(|offer| CompanyOffer {
                details: state.details(offer),
                number_applicants: state
                    .applications
                    .values()
                    .filter(|a| a.offer_id == offer.id)
                    .count() as i64,
            })
            .collect())
    }

    async fn get_liked(&self, user_id: i32) -> Result<Vec<LikedOfferView>, AppError> {
        let state = self.lock();
        Ok(state
            .offers_desc()
            .filter(|offer| state.likes.contains(&(user_id, offer.id)))
            .map(|offer| LikedOfferView {
                offer: offer.clone(),
                company_name: state.company_name(offer.company_id),
                applied: state
                    .applications
                    .values()
                    .any(|a| a.offer_id == offer.id && a.candidate_id == user_id),
            })
            .collect())
    }

    async fn liked_offer_ids(&self, user_id: i32) -> Result<BTreeSet<i32>, AppError> {
        Ok(self
            .lock()
            .likes
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, offer_id)| *offer_id)
            .collect())
    }

    async fn does_user_like(&self, offer_id: i32, user_id: i32) -> Result<bool, AppError> {
        Ok(self.lock().likes.contains(&(user_id, offer_id)))
    }

    async fn like(&self, offer_id: i32, user_id: i32) -> Result<(), AppError> {
        let mut state = self.lock();
        if !state.offers.contains_key(&offer_id) {
            return Err(AppError::Validation(format!(
                "unknown reference (offer {offer_id})"
            )));
        }
        state.likes.insert((user_id, offer_id));
        Ok(())
    }

    async fn unlike(&self, offer_id: i32, user_id: i32) -> Result<(), AppError> {
        self.lock().likes.remove(&(user_id, offer_id));
        Ok(())
    }

    async fn apply(&self, offer_id: i32, user_id: i32) -> Result<Application, AppError> {
        let mut state = self.lock();
        if !state.offers.contains_key(&offer_id) {
            return Err(AppError::OfferNotFound(offer_id));
        }
        if state
            .applications
            .values()
            .any(|a| a.offer_id == offer_id && a.candidate_id == user_id)
        {
            return Err(AppError::AlreadyApplied {
                candidate_id: user_id,
                offer_id,
            });
        }

        let id = state.next_id();
        let now = Utc::now();
        let application = Application {
            id,
            candidate_id: user_id,
            offer_id,
            status: ApplicationStatus::Pending,
            created_at: now,
            modified_at: now,
        };
        state.applications.insert(id, application.clone());
        Ok(application)
    }

    async fn get_applications(&self, offer_id: i32) -> Result<Vec<OfferApplicant>, AppError> {
        let state = self.lock();
        Ok(state
            .applications
            .values()
            .filter(|a| a.offer_id == offer_id)
            .filter_map(|a| {
                state.candidate_names.get(&a.candidate_id).map(|name| OfferApplicant {
                    id: a.id,
                    offer_id: a.offer_id,
                    user_id: a.candidate_id,
                    user_fullname: name.clone(),
                    status: a.status,
                    applied_at: a.created_at,
                })
            })
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ApplicationRepo
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ApplicationRepo for MemoryStore {
    async fn get_application_by_id(&self, id: i32) -> Result<Option<Application>, AppError> {
        Ok(self.application(id))
    }

    async fn get_applications_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ApplicationView>, AppError> {
        let state = self.lock();
        Ok(state
            .applications
            .values()
            .rev()
            .filter(|a| a.candidate_id == user_id)
            .map(|a| ApplicationView {
                id: a.id,
                status: a.status,
                job_offer: state.offers.get(&a.offer_id).map(|offer| JobOfferSummary {
                    id: offer.id,
                    title: offer.title.clone(),
                    company: state.company_name(offer.company_id),
                }),
            })
            .collect())
    }

    async fn accept_application(
        &self,
        id: i32,
        reject_pending: bool,
    ) -> Result<AcceptOutcome, AppError> {
        let mut state = self.lock();
        let application = state.transition(id, ApplicationStatus::Offered)?;

        let mut rejected_application_ids = Vec::new();
        if reject_pending {
            let now = Utc::now();
            for sibling in state.applications.values_mut() {
                if sibling.offer_id == application.offer_id
                    && sibling.id != id
                    && sibling.status == ApplicationStatus::Pending
                {
                    sibling.status = ApplicationStatus::Rejected;
                    sibling.modified_at = now;
                    rejected_application_ids.push(sibling.id);
                }
            }
        }

        Ok(AcceptOutcome {
            application,
            rejected_application_ids,
        })
    }

    async fn reject_application(&self, id: i32) -> Result<Application, AppError> {
        self.lock().transition(id, ApplicationStatus::Rejected)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Accounts
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CompanyRepo for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Company>, AppError> {
        Ok(self.lock().companies.get(&id).cloned())
    }

    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<CompanyUser>, AppError> {
        Ok(self.lock().company_users.get(&user_id).cloned())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }
}

#[async_trait]
impl CandidateRepo for MemoryStore {
    async fn get_candidate(&self, user_id: i32) -> Result<Option<CandidateRecord>, AppError> {
        Ok(self.lock().candidates.get(&user_id).cloned())
    }

    async fn get_candidate_skills(&self, user_id: i32) -> Result<Vec<Skill>, AppError> {
        Ok(self
            .lock()
            .profiles
            .get(&user_id)
            .map(|p| p.skills.clone())
            .unwrap_or_default())
    }

    async fn get_candidate_languages(
        &self,
        user_id: i32,
    ) -> Result<Vec<LanguageLevel>, AppError> {
        Ok(self
            .lock()
            .profiles
            .get(&user_id)
            .map(|p| p.languages.clone())
            .unwrap_or_default())
    }

    async fn get_candidate_educations(&self, user_id: i32) -> Result<Vec<Education>, AppError> {
        Ok(self
            .lock()
            .profiles
            .get(&user_id)
            .map(|p| p.educations.clone())
            .unwrap_or_default())
    }
}
