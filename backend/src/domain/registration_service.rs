use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::form_state_machine::{FormEffect, FormError, FormState, FormStateMachine, Transition};
use crate::domain::models::{DraftRecord, DraftUpdate, ProfileImage, Student};
use crate::domain::record_assembler::{RecordAssembler, SubmissionError};
use crate::domain::validation::ValidationViolation;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Registration session not found: {0}")]
    SessionNotFound(Uuid),
    #[error(transparent)]
    Form(#[from] FormError),
}

/// How the last operation on a session went
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Accepted,
    Rejected(ValidationViolation),
    SubmissionFailed(SubmissionError),
}

/// Everything the UI needs to render a session after an operation
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub id: Uuid,
    pub state: FormState,
    pub progress_percent: u8,
    pub draft: DraftRecord,
    pub record: Option<Student>,
    pub effects: Vec<FormEffect>,
    pub outcome: StepOutcome,
}

impl SessionView {
    fn new(id: Uuid, machine: &FormStateMachine, effects: Vec<FormEffect>, outcome: StepOutcome) -> Self {
        Self {
            id,
            state: machine.state(),
            progress_percent: machine.progress_percent(),
            draft: machine.draft().clone(),
            record: machine.record().cloned(),
            effects,
            outcome,
        }
    }

    fn from_transition(id: Uuid, machine: &FormStateMachine, transition: Transition) -> Self {
        let outcome = match transition.rejected {
            Some(violation) => StepOutcome::Rejected(violation),
            None => StepOutcome::Accepted,
        };
        Self::new(id, machine, transition.effects, outcome)
    }
}

/// A form session and the time it was last used
struct FormSession {
    machine: FormStateMachine,
    touched_at: DateTime<Utc>,
}

impl FormSession {
    /// Mark the session as used and hand out its state machine
    fn touch(&mut self) -> &mut FormStateMachine {
        self.touched_at = Utc::now();
        &mut self.machine
    }
}

type SessionHandle = Arc<Mutex<FormSession>>;

/// Keeps one form state machine per applicant session and runs submissions.
///
/// Each session has its own lock, held for the whole submission, so a second
/// advance on the same session waits for the first one to finish instead of
/// submitting twice. Sessions left alone for longer than the idle timeout,
/// submitted ones included, are dropped whenever a new session starts.
#[derive(Clone)]
pub struct RegistrationService {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    assembler: RecordAssembler,
    idle_timeout: Duration,
}

impl RegistrationService {
    pub fn new(assembler: RecordAssembler, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            assembler,
            idle_timeout,
        }
    }

    /// Drop sessions idle for longer than the timeout. A session whose lock
    /// is held is in use and always kept.
    pub async fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => now - session.touched_at <= self.idle_timeout,
            Err(_) => true,
        });

        let pruned = before - sessions.len();
        if pruned > 0 {
            info!("Dropped {} idle registration sessions", pruned);
        }
        pruned
    }

    async fn session(&self, id: Uuid) -> Result<SessionHandle, RegistrationError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                warn!("Registration session not found: {}", id);
                RegistrationError::SessionNotFound(id)
            })
    }

    /// Start a fresh form at step 1
    pub async fn create_session(&self) -> SessionView {
        self.prune_idle(Utc::now()).await;

        let id = Uuid::new_v4();
        let machine = FormStateMachine::new();
        let view = SessionView::new(id, &machine, Vec::new(), StepOutcome::Accepted);
        let session = FormSession {
            machine,
            touched_at: Utc::now(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Arc::new(Mutex::new(session)));
        info!("Created registration session {} ({} active)", id, sessions.len());
        view
    }

    pub async fn get_session(&self, id: Uuid) -> Result<SessionView, RegistrationError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        let machine = session.touch();
        Ok(SessionView::new(id, machine, Vec::new(), StepOutcome::Accepted))
    }

    pub async fn update_draft(&self, id: Uuid, update: DraftUpdate) -> Result<SessionView, RegistrationError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        let machine = session.touch();

        let transition = machine.update(update)?;
        Ok(SessionView::from_transition(id, machine, transition))
    }

    pub async fn set_profile_image(&self, id: Uuid, image: ProfileImage) -> Result<SessionView, RegistrationError> {
        info!(
            "Attaching profile image {} ({} bytes) to session {}",
            image.filename,
            image.bytes.len(),
            id
        );
        self.update_draft(
            id,
            DraftUpdate {
                profile_image: Some(Some(image)),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn clear_profile_image(&self, id: Uuid) -> Result<SessionView, RegistrationError> {
        self.update_draft(
            id,
            DraftUpdate {
                profile_image: Some(None),
                ..Default::default()
            },
        )
        .await
    }

    /// Validate the current step and move on. On the last step this runs the
    /// submission (upload, then insert) before returning.
    pub async fn advance(
        &self,
        id: Uuid,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SessionView, RegistrationError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        let machine = session.touch();

        let transition = machine.advance(today)?;
        if !transition.wants_submission() {
            return Ok(SessionView::from_transition(id, machine, transition));
        }

        info!("Submitting registration for session {}", id);
        let mut effects = transition.effects;
        let submitted = self.assembler.submit(machine.draft(), now).await;
        match submitted {
            Ok(student) => {
                let completed = machine.complete_submission(student)?;
                effects.extend(completed.effects);
                Ok(SessionView::new(id, machine, effects, StepOutcome::Accepted))
            }
            Err(error) => {
                effects.extend(machine.fail_submission(&error).effects);
                Ok(SessionView::new(id, machine, effects, StepOutcome::SubmissionFailed(error)))
            }
        }
    }

    pub async fn retreat(&self, id: Uuid) -> Result<SessionView, RegistrationError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        let machine = session.touch();

        let transition = machine.retreat()?;
        Ok(SessionView::from_transition(id, machine, transition))
    }

    /// Start the same session over with an empty draft
    pub async fn reset(&self, id: Uuid) -> Result<SessionView, RegistrationError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        let machine = session.touch();

        let transition = machine.reset();
        info!("Reset registration session {}", id);
        Ok(SessionView::from_transition(id, machine, transition))
    }

    pub async fn discard(&self, id: Uuid) -> Result<(), RegistrationError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!("Discarded registration session {}", id);
                Ok(())
            }
            None => Err(RegistrationError::SessionNotFound(id)),
        }
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::tests::{complete_draft, today};
    use crate::domain::validation::FormStep;
    use crate::storage::test_utils::{InMemoryBlobStore, InMemoryStudentStore};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn setup() -> (RegistrationService, Arc<InMemoryStudentStore>, Arc<InMemoryBlobStore>) {
        let students = Arc::new(InMemoryStudentStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let service = RegistrationService::new(
            RecordAssembler::new(students.clone(), blobs.clone()),
            Duration::minutes(60),
        );
        (service, students, blobs)
    }

    fn complete_update() -> DraftUpdate {
        let draft = complete_draft();
        DraftUpdate {
            first_name: Some(draft.first_name),
            last_name: Some(draft.last_name),
            gender: Some(draft.gender),
            date_of_birth: Some(draft.date_of_birth),
            email: Some(draft.email),
            mobile: Some(draft.mobile),
            blood_group: Some(draft.blood_group),
            medications: Some(draft.medications),
            mother_mobile: Some(draft.mother_mobile),
            mother_occupation: Some(draft.mother_occupation),
            father_name: Some(draft.father_name),
            ..Default::default()
        }
    }

    async fn at_final_step(service: &RegistrationService) -> Uuid {
        let id = service.create_session().await.id;
        service.update_draft(id, complete_update()).await.unwrap();
        service.advance(id, today(), now()).await.unwrap();
        service.advance(id, today(), now()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_full_registration_flow() {
        let (service, students, blobs) = setup();
        let id = at_final_step(&service).await;
        service
            .set_profile_image(id, ProfileImage::new("me.png", vec![1, 2, 3]))
            .await
            .unwrap();

        let view = service.advance(id, today(), now()).await.unwrap();

        assert_eq!(view.state, FormState::Submitted);
        assert_eq!(view.outcome, StepOutcome::Accepted);
        assert_eq!(view.progress_percent, 100);
        assert_eq!(view.draft, DraftRecord::default());
        assert!(view.effects.contains(&FormEffect::Submit));
        assert!(view.effects.contains(&FormEffect::Navigate(FormState::Submitted)));

        let record = view.record.unwrap();
        assert_eq!(students.stored(), vec![record.clone()]);
        assert_eq!(blobs.uploaded_names().len(), 1);
        assert!(record.profile_image_url.unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn test_validation_rejection_is_reported() {
        let (service, students, _) = setup();
        let id = service.create_session().await.id;

        let view = service.advance(id, today(), now()).await.unwrap();

        assert_eq!(view.state, FormState::InProgress(FormStep::Demographics));
        assert_eq!(
            view.outcome,
            StepOutcome::Rejected(ValidationViolation::MissingRequiredFields)
        );
        assert!(students.stored().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_draft_for_retry() {
        let (service, students, blobs) = setup();
        let id = at_final_step(&service).await;
        service
            .set_profile_image(id, ProfileImage::new("me.png", vec![1]))
            .await
            .unwrap();
        blobs.fail_uploads(true);

        let failed = service.advance(id, today(), now()).await.unwrap();

        assert_eq!(failed.state, FormState::InProgress(FormStep::ParentInfo));
        assert!(matches!(failed.outcome, StepOutcome::SubmissionFailed(SubmissionError::UploadFailed(_))));
        assert_eq!(failed.draft.first_name, "Anna");
        assert!(students.stored().is_empty());

        blobs.fail_uploads(false);
        let retried = service.advance(id, today(), now()).await.unwrap();
        assert_eq!(retried.state, FormState::Submitted);
        assert_eq!(students.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_reports_error_notification() {
        let (service, students, _) = setup();
        let id = at_final_step(&service).await;
        students.fail_writes(true);

        let view = service.advance(id, today(), now()).await.unwrap();

        assert!(matches!(view.outcome, StepOutcome::SubmissionFailed(SubmissionError::SaveFailed(_))));
        let notified = view.effects.iter().any(|effect| {
            matches!(effect, FormEffect::Notify(n) if n.title == "Error" && n.description.contains("NOT NULL"))
        });
        assert!(notified);
    }

    #[tokio::test]
    async fn test_insert_failure_after_upload_keeps_draft_at_final_step() {
        let (service, students, blobs) = setup();
        let id = at_final_step(&service).await;
        let before = service
            .set_profile_image(id, ProfileImage::new("me.png", vec![0x89, 0x50]))
            .await
            .unwrap()
            .draft;
        students.fail_writes(true);

        let view = service.advance(id, today(), now()).await.unwrap();

        assert!(matches!(view.outcome, StepOutcome::SubmissionFailed(SubmissionError::SaveFailed(_))));
        assert_eq!(blobs.uploaded_names().len(), 1);
        assert_eq!(view.state, FormState::InProgress(FormStep::ParentInfo));
        assert_eq!(view.draft, before);
        assert!(view.record.is_none());
        assert!(students.stored().is_empty());
    }

    #[tokio::test]
    async fn test_step_one_edits_from_final_step_are_revalidated() {
        let (service, students, blobs) = setup();
        let id = at_final_step(&service).await;
        service
            .update_draft(
                id,
                DraftUpdate {
                    date_of_birth: Some(NaiveDate::from_ymd_opt(2014, 1, 1)),
                    profile_image: Some(Some(ProfileImage::new("photo.jpg", vec![0xff]))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let view = service.advance(id, today(), now()).await.unwrap();

        assert_eq!(view.state, FormState::InProgress(FormStep::ParentInfo));
        assert_eq!(view.outcome, StepOutcome::Rejected(ValidationViolation::Underage));
        assert!(students.stored().is_empty());
        assert!(blobs.uploaded_names().is_empty());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_pruned() {
        let (service, _, _) = setup();
        let submitted = at_final_step(&service).await;
        service.advance(submitted, today(), now()).await.unwrap();
        let idle = service.create_session().await.id;

        assert_eq!(service.prune_idle(Utc::now()).await, 0);
        assert_eq!(service.session_count().await, 2);

        let later = Utc::now() + Duration::minutes(61);
        assert_eq!(service.prune_idle(later).await, 2);
        assert_eq!(service.session_count().await, 0);
        assert_eq!(
            service.get_session(idle).await,
            Err(RegistrationError::SessionNotFound(idle))
        );
    }

    #[tokio::test]
    async fn test_recently_used_session_survives_pruning() {
        let (service, _, _) = setup();
        let id = service.create_session().await.id;

        service.get_session(id).await.unwrap();
        assert_eq!(service.prune_idle(Utc::now() + Duration::minutes(30)).await, 0);
        assert!(service.get_session(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_submitted_session_rejects_further_edits() {
        let (service, _, _) = setup();
        let id = at_final_step(&service).await;
        service.advance(id, today(), now()).await.unwrap();

        assert_eq!(
            service.advance(id, today(), now()).await,
            Err(RegistrationError::Form(FormError::AlreadySubmitted))
        );
        assert_eq!(
            service.update_draft(id, complete_update()).await,
            Err(RegistrationError::Form(FormError::AlreadySubmitted))
        );

        let reset = service.reset(id).await.unwrap();
        assert_eq!(reset.state, FormState::InProgress(FormStep::Demographics));
        assert!(reset.record.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_advances_submit_once() {
        let (service, students, _) = setup();
        let id = at_final_step(&service).await;

        let (first, second) = tokio::join!(
            service.advance(id, today(), now()),
            service.advance(id, today(), now())
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| *r == Err(RegistrationError::Form(FormError::AlreadySubmitted))));
        assert_eq!(students.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_image_can_be_cleared() {
        let (service, _, _) = setup();
        let id = service.create_session().await.id;

        let with_image = service
            .set_profile_image(id, ProfileImage::new("me.png", vec![1]))
            .await
            .unwrap();
        assert!(with_image.draft.profile_image.is_some());

        let cleared = service.clear_profile_image(id).await.unwrap();
        assert!(cleared.draft.profile_image.is_none());
    }

    #[tokio::test]
    async fn test_unknown_and_discarded_sessions() {
        let (service, _, _) = setup();
        let missing = Uuid::new_v4();
        assert_eq!(
            service.get_session(missing).await,
            Err(RegistrationError::SessionNotFound(missing))
        );

        let id = service.create_session().await.id;
        assert_eq!(service.session_count().await, 1);
        service.discard(id).await.unwrap();
        assert_eq!(service.session_count().await, 0);
        assert_eq!(
            service.retreat(id).await,
            Err(RegistrationError::SessionNotFound(id))
        );
        assert_eq!(service.discard(id).await, Err(RegistrationError::SessionNotFound(id)));
    }
}
