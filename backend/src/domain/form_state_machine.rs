//! Registration form state machine.
//!
//! The form moves strictly forward through three steps and then into a
//! terminal `Submitted` state. Every operation returns a [`Transition`]: the
//! resulting state plus the effects the UI should perform (show a
//! notification, navigate, start a submission). The machine itself never
//! talks to storage; when the last step validates it asks for a submission
//! and waits for [`FormStateMachine::complete_submission`] or
//! [`FormStateMachine::fail_submission`].

use chrono::NaiveDate;
use shared::{Notification, NotificationVariant};
use tracing::{debug, warn};

use crate::domain::models::{DraftRecord, DraftUpdate, Student};
use crate::domain::record_assembler::SubmissionError;
use crate::domain::validation::{validate_all, validate_step, FormStep, ValidationViolation};

/// Where the form currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    InProgress(FormStep),
    Submitted,
}

impl FormState {
    pub fn step(&self) -> Option<FormStep> {
        match self {
            FormState::InProgress(step) => Some(*step),
            FormState::Submitted => None,
        }
    }
}

/// Instruction for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum FormEffect {
    Notify(Notification),
    Navigate(FormState),
    /// The draft is complete; the caller should run the submission now
    Submit,
}

/// Result of a state machine operation
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: FormState,
    pub effects: Vec<FormEffect>,
    /// Set when `advance` refused to leave the current step
    pub rejected: Option<ValidationViolation>,
}

impl Transition {
    fn quiet(state: FormState) -> Self {
        Self::with_effects(state, Vec::new())
    }

    fn with_effects(state: FormState, effects: Vec<FormEffect>) -> Self {
        Self {
            state,
            effects,
            rejected: None,
        }
    }

    pub fn wants_submission(&self) -> bool {
        self.effects.contains(&FormEffect::Submit)
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.effects.iter().filter_map(|effect| match effect {
            FormEffect::Notify(notification) => Some(notification),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Registration has already been submitted")]
    AlreadySubmitted,
    #[error("Registration can only be submitted from the last step")]
    NotOnFinalStep,
}

pub fn validation_notification(violation: ValidationViolation) -> Notification {
    Notification {
        variant: NotificationVariant::Destructive,
        title: "Validation Error".to_string(),
        description: violation.to_string(),
    }
}

pub fn submission_failed_notification(error: &SubmissionError) -> Notification {
    Notification {
        variant: NotificationVariant::Destructive,
        title: "Error".to_string(),
        description: error.to_string(),
    }
}

pub fn submission_succeeded_notification() -> Notification {
    Notification {
        variant: NotificationVariant::Default,
        title: "Registration Successful".to_string(),
        description: "Your registration has been submitted successfully.".to_string(),
    }
}

/// One applicant's pass through the registration form
#[derive(Debug, Clone)]
pub struct FormStateMachine {
    draft: DraftRecord,
    state: FormState,
    record: Option<Student>,
}

impl Default for FormStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormStateMachine {
    pub fn new() -> Self {
        Self {
            draft: DraftRecord::default(),
            state: FormState::InProgress(FormStep::Demographics),
            record: None,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    /// The stored record, once submitted
    pub fn record(&self) -> Option<&Student> {
        self.record.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.state == FormState::Submitted
    }

    /// Progress bar value: step / total * 100, 100 once submitted
    pub fn progress_percent(&self) -> u8 {
        match self.state {
            FormState::InProgress(step) => {
                (u32::from(step.number()) * 100 / u32::from(FormStep::COUNT)) as u8
            }
            FormState::Submitted => 100,
        }
    }

    fn ensure_editable(&self) -> Result<FormStep, FormError> {
        self.state.step().ok_or(FormError::AlreadySubmitted)
    }

    /// Merge fields into the draft, at any step, without validation
    pub fn update(&mut self, update: DraftUpdate) -> Result<Transition, FormError> {
        self.ensure_editable()?;
        self.draft.apply(update);
        Ok(Transition::quiet(self.state))
    }

    /// Validate the current step and move forward.
    ///
    /// On the last step every step is validated again, since earlier fields
    /// may have been edited from there. Success does not move the cursor; it
    /// emits [`FormEffect::Submit`] instead.
    pub fn advance(&mut self, today: NaiveDate) -> Result<Transition, FormError> {
        let step = self.ensure_editable()?;

        // Earlier steps stay editable, so the last step re-checks all of them
        let checked = match step.next() {
            Some(_) => validate_step(step, &self.draft, today),
            None => validate_all(&self.draft, today),
        };
        if let Err(violation) = checked {
            debug!("Step {} rejected: {:?}", step.number(), violation);
            return Ok(Transition {
                state: self.state,
                effects: vec![FormEffect::Notify(validation_notification(violation))],
                rejected: Some(violation),
            });
        }

        match step.next() {
            Some(next) => {
                self.state = FormState::InProgress(next);
                Ok(Transition::with_effects(
                    self.state,
                    vec![FormEffect::Navigate(self.state)],
                ))
            }
            None => Ok(Transition::with_effects(self.state, vec![FormEffect::Submit])),
        }
    }

    /// Step back one page. Never validates, never drops entered data.
    pub fn retreat(&mut self) -> Result<Transition, FormError> {
        let step = self.ensure_editable()?;

        match step.previous() {
            Some(previous) => {
                self.state = FormState::InProgress(previous);
                Ok(Transition::with_effects(
                    self.state,
                    vec![FormEffect::Navigate(self.state)],
                ))
            }
            None => Ok(Transition::quiet(self.state)),
        }
    }

    /// Record a successful submission. The draft is consumed.
    pub fn complete_submission(&mut self, record: Student) -> Result<Transition, FormError> {
        match self.state {
            FormState::InProgress(FormStep::ParentInfo) => {}
            FormState::Submitted => return Err(FormError::AlreadySubmitted),
            FormState::InProgress(_) => return Err(FormError::NotOnFinalStep),
        }

        self.draft = DraftRecord::default();
        self.record = Some(record);
        self.state = FormState::Submitted;

        Ok(Transition::with_effects(
            self.state,
            vec![
                FormEffect::Notify(submission_succeeded_notification()),
                FormEffect::Navigate(self.state),
            ],
        ))
    }

    /// Report a failed submission. Draft and cursor are left as they were so
    /// the user can retry.
    pub fn fail_submission(&self, error: &SubmissionError) -> Transition {
        warn!("Submission failed, draft kept at step {:?}: {}", self.state, error);
        Transition::with_effects(
            self.state,
            vec![FormEffect::Notify(submission_failed_notification(error))],
        )
    }

    /// Throw the draft away and start over at step 1
    pub fn reset(&mut self) -> Transition {
        *self = Self::new();
        Transition::with_effects(self.state, vec![FormEffect::Navigate(self.state)])
    }
}
