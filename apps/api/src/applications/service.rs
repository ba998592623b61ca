//! Application lifecycle: `pending` → `offered` | `rejected`.

use std::sync::Arc;

use tracing::debug;

use crate::auth::{authorize, Action, Actor, Resource};
use crate::errors::AppError;
use crate::models::application::{
    AcceptOutcome, Application, ApplicationView, JobOfferSummary, OfferApplicant,
};
use crate::models::offer::OfferDetails;
use crate::repository::{ApplicationRepo, OfferRepo, UserRepo};

pub struct ApplicationService {
    offers: Arc<dyn OfferRepo>,
    applications: Arc<dyn ApplicationRepo>,
    users: Arc<dyn UserRepo>,
}

impl ApplicationService {
    pub fn new(
        offers: Arc<dyn OfferRepo>,
        applications: Arc<dyn ApplicationRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            offers,
            applications,
            users,
        }
    }

    async fn load_application(&self, id: i32) -> Result<Application, AppError> {
        self.applications
            .get_application_by_id(id)
            .await?
            .ok_or(AppError::ApplicationNotFound(id))
    }

    async fn load_offer(&self, id: i32) -> Result<OfferDetails, AppError> {
        self.offers
            .get_by_id(id)
            .await?
            .ok_or(AppError::OfferNotFound(id))
    }

    /// Loads the application and checks the actor owns the offer it targets. Applications on
    /// removed offers can no longer be decided.
    async fn load_for_decision(&self, actor: &Actor, id: i32) -> Result<Application, AppError> {
        let application = self.load_application(id).await?;
        let offer = self.load_offer(application.offer_id).await?;
        authorize(
            actor,
            Resource::Offer {
                company_id: offer.offer.company_id,
            },
            Action::DecideApplication,
        )?;
        Ok(application)
    }

    pub async fn apply(&self, actor: &Actor, offer_id: i32) -> Result<Application, AppError> {
        authorize(actor, Resource::Catalog, Action::ApplyToOffer)?;
        if self.users.find_by_id(actor.user_id).await?.is_none() {
            return Err(AppError::UserNotFound(actor.user_id));
        }
        // The store re-checks existence and uniqueness atomically.
        self.offers.apply(offer_id, actor.user_id).await
    }

    pub async fn accept(
        &self,
        actor: &Actor,
        id: i32,
        reject_pending: bool,
    ) -> Result<AcceptOutcome, AppError> {
        self.load_for_decision(actor, id).await?;
        let outcome = self
            .applications
            .accept_application(id, reject_pending)
            .await?;
        debug!(
            "Application {id} offered; {} siblings rejected",
            outcome.rejected_application_ids.len()
        );
        Ok(outcome)
    }

    pub async fn reject(&self, actor: &Actor, id: i32) -> Result<Application, AppError> {
        self.load_for_decision(actor, id).await?;
        self.applications.reject_application(id).await
    }

    pub async fn get_by_id(&self, actor: &Actor, id: i32) -> Result<ApplicationView, AppError> {
        let application = self.load_application(id).await?;
        let offer = self.offers.get_by_id(application.offer_id).await?;
        authorize(
            actor,
            Resource::Application {
                candidate_id: application.candidate_id,
                company_id: offer.as_ref().map(|o| o.offer.company_id),
            },
            Action::ViewApplication,
        )?;

        Ok(ApplicationView {
            id: application.id,
            status: application.status,
            job_offer: offer.map(|o| JobOfferSummary {
                id: o.offer.id,
                title: o.offer.title,
                company: o.company_name,
            }),
        })
    }

    pub async fn list_for_candidate(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ApplicationView>, AppError> {
        authorize(actor, Resource::Catalog, Action::ListOwnApplications)?;
        self.applications
            .get_applications_for_user(actor.user_id)
            .await
    }

    pub async fn list_for_offer(
        &self,
        actor: &Actor,
        offer_id: i32,
    ) -> Result<Vec<OfferApplicant>, AppError> {
        let offer = self.load_offer(offer_id).await?;
        authorize(
            actor,
            Resource::Offer {
                company_id: offer.offer.company_id,
            },
            Action::ViewOfferApplications,
        )?;
        self.offers.get_applications(offer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::application::ApplicationStatus;
    use crate::models::offer::{LocationType, NewOffer, RequirementLinks};
    use crate::repository::memory::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        service: ApplicationService,
        owner: Actor,
        rival: Actor,
        offer_id: i32,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let acme = store.add_company("Acme");
        let globex = store.add_company("Globex");
        let owner = Actor::company(store.add_company_user(acme), Some(acme));
        let rival = Actor::company(store.add_company_user(globex), Some(globex));
        let offer = store
            .create(
                NewOffer {
                    company_id: acme,
                    title: "Data engineer".into(),
                    body: "Pipelines".into(),
                    min_salary: 50_000,
                    max_salary: 65_000,
                    location_type: LocationType::Remote,
                    address: None,
                    gps_location: None,
                    seniority: Some(2),
                    status: "pending".into(),
                    image: None,
                },
                RequirementLinks::default(),
            )
            .await
            .unwrap();
        let service = ApplicationService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        Fixture {
            store,
            service,
            owner,
            rival,
            offer_id: offer.id,
        }
    }

    impl Fixture {
        async fn applicant(&self, first: &str) -> (Actor, Application) {
            let candidate = Actor::candidate(self.store.add_candidate(first, "Doe"));
            let application = self.service.apply(&candidate, self.offer_id).await.unwrap();
            (candidate, application)
        }

        fn status(&self, application: &Application) -> ApplicationStatus {
            self.store.application(application.id).unwrap().status
        }
    }

    #[tokio::test]
    async fn test_apply_creates_pending_application() {
        let f = fixture().await;
        let (candidate, application) = f.applicant("Ann").await;
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.candidate_id, candidate.user_id);
        assert_eq!(application.offer_id, f.offer_id);
    }

    #[tokio::test]
    async fn test_second_apply_fails_even_after_rejection() {
        let f = fixture().await;
        let (candidate, application) = f.applicant("Ann").await;

        assert!(matches!(
            f.service.apply(&candidate, f.offer_id).await,
            Err(AppError::AlreadyApplied { .. })
        ));

        f.service.reject(&f.owner, application.id).await.unwrap();
        assert!(matches!(
            f.service.apply(&candidate, f.offer_id).await,
            Err(AppError::AlreadyApplied { .. })
        ));

        let applicants = f.service.list_for_offer(&f.owner, f.offer_id).await.unwrap();
        assert_eq!(applicants.len(), 1);
    }

    #[tokio::test]
    async fn test_racing_applies_create_one_application() {
        let f = fixture().await;
        let candidate = Actor::candidate(f.store.add_candidate("Ann", "Doe"));

        let (first, second) = tokio::join!(
            f.service.apply(&candidate, f.offer_id),
            f.service.apply(&candidate, f.offer_id)
        );
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::AlreadyApplied { .. })))
                .count(),
            1
        );

        let applicants = f.service.list_for_offer(&f.owner, f.offer_id).await.unwrap();
        assert_eq!(applicants.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_checks_parties() {
        let f = fixture().await;
        let candidate = Actor::candidate(f.store.add_candidate("Bob", "Doe"));
        assert!(matches!(
            f.service.apply(&candidate, 9_999).await,
            Err(AppError::OfferNotFound(9_999))
        ));
        assert!(matches!(
            f.service.apply(&Actor::candidate(8_888), f.offer_id).await,
            Err(AppError::UserNotFound(8_888))
        ));
        assert!(matches!(
            f.service.apply(&f.owner, f.offer_id).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_accept_with_cascade_rejects_other_pending() {
        let f = fixture().await;
        let (_, a1) = f.applicant("Ann").await;
        let (_, a2) = f.applicant("Ben").await;
        let (_, a3) = f.applicant("Cal").await;

        let outcome = f.service.accept(&f.owner, a1.id, true).await.unwrap();

        assert_eq!(outcome.application.status, ApplicationStatus::Offered);
        assert_eq!(outcome.rejected_application_ids, vec![a2.id, a3.id]);
        assert_eq!(f.status(&a1), ApplicationStatus::Offered);
        assert_eq!(f.status(&a2), ApplicationStatus::Rejected);
        assert_eq!(f.status(&a3), ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_accept_without_cascade_leaves_siblings_pending() {
        let f = fixture().await;
        let (_, a1) = f.applicant("Ann").await;
        let (_, a2) = f.applicant("Ben").await;
        let (_, a3) = f.applicant("Cal").await;

        let outcome = f.service.accept(&f.owner, a1.id, false).await.unwrap();

        assert!(outcome.rejected_application_ids.is_empty());
        assert_eq!(f.status(&a1), ApplicationStatus::Offered);
        assert_eq!(f.status(&a2), ApplicationStatus::Pending);
        assert_eq!(f.status(&a3), ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_terminal_states_do_not_move() {
        let f = fixture().await;
        let (_, offered) = f.applicant("Ann").await;
        let (_, rejected) = f.applicant("Ben").await;
        f.service.accept(&f.owner, offered.id, false).await.unwrap();
        f.service.reject(&f.owner, rejected.id).await.unwrap();

        assert!(matches!(
            f.service.reject(&f.owner, offered.id).await,
            Err(AppError::InvalidTransition {
                from: ApplicationStatus::Offered,
                to: ApplicationStatus::Rejected
            })
        ));
        assert!(matches!(
            f.service.accept(&f.owner, rejected.id, true).await,
            Err(AppError::InvalidTransition { .. })
        ));
        assert_eq!(f.status(&offered), ApplicationStatus::Offered);
        assert_eq!(f.status(&rejected), ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_decide() {
        let f = fixture().await;
        let (_, application) = f.applicant("Ann").await;

        assert!(matches!(
            f.service.accept(&f.rival, application.id, true).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.reject(&f.rival, application.id).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.list_for_offer(&f.rival, f.offer_id).await,
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(f.status(&application), ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_view_rules() {
        let f = fixture().await;
        let (candidate, application) = f.applicant("Ann").await;
        let (other, _) = f.applicant("Ben").await;

        let view = f.service.get_by_id(&candidate, application.id).await.unwrap();
        assert_eq!(view.status, ApplicationStatus::Pending);
        let summary = view.job_offer.unwrap();
        assert_eq!(summary.company, "Acme");
        assert_eq!(summary.title, "Data engineer");

        assert!(f.service.get_by_id(&f.owner, application.id).await.is_ok());
        assert!(matches!(
            f.service.get_by_id(&other, application.id).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.get_by_id(&f.rival, application.id).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.get_by_id(&candidate, 5_555).await,
            Err(AppError::ApplicationNotFound(5_555))
        ));
    }

    #[tokio::test]
    async fn test_applications_survive_offer_removal() {
        let f = fixture().await;
        let (candidate, application) = f.applicant("Ann").await;
        f.store.delete(f.offer_id).await.unwrap();

        let mine = f.service.list_for_candidate(&candidate).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, application.id);
        assert!(mine[0].job_offer.is_none());

        let view = f.service.get_by_id(&candidate, application.id).await.unwrap();
        assert!(view.job_offer.is_none());

        assert!(matches!(
            f.service.accept(&f.owner, application.id, false).await,
            Err(AppError::OfferNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_applicant_listing_carries_full_name() {
        let f = fixture().await;
        let (candidate, _) = f.applicant("Ann").await;
        let applicants = f.service.list_for_offer(&f.owner, f.offer_id).await.unwrap();
        assert_eq!(applicants[0].user_fullname, "Ann Doe");
        assert_eq!(applicants[0].user_id, candidate.user_id);
    }
}
