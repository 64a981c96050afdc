use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared::{
    DraftView, FormEffect as SharedFormEffect, FormPhase, RegistrationSnapshot, UpdateDraftRequest,
};

use crate::domain::form_state_machine::{FormEffect, FormState};
use crate::domain::models::{DraftRecord, DraftUpdate};
use crate::domain::registration_service::SessionView;
use crate::domain::validation::FormStep;
use crate::io::rest::mappers::StudentMapper;

const SUBMITTED_TITLE: &str = "Registration Submitted";

/// Mapper between registration session state and the shared DTOs
pub struct RegistrationMapper;

impl RegistrationMapper {
    pub fn to_phase(state: FormState) -> FormPhase {
        match state {
            FormState::InProgress(FormStep::Demographics) => FormPhase::Step1,
            FormState::InProgress(FormStep::Medical) => FormPhase::Step2,
            FormState::InProgress(FormStep::ParentInfo) => FormPhase::Step3,
            FormState::Submitted => FormPhase::Submitted,
        }
    }

    pub fn to_effect_dto(effect: FormEffect) -> SharedFormEffect {
        match effect {
            FormEffect::Notify(notification) => SharedFormEffect::ShowNotification { notification },
            FormEffect::Navigate(state) => SharedFormEffect::Navigate {
                to: Self::to_phase(state),
            },
            FormEffect::Submit => SharedFormEffect::SubmissionStarted,
        }
    }

    /// The draft as shown to the client; image bytes stay on the server
    pub fn to_draft_view(draft: DraftRecord) -> DraftView {
        DraftView {
            first_name: draft.first_name,
            last_name: draft.last_name,
            gender: draft.gender,
            date_of_birth: draft.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            email: draft.email,
            mobile: draft.mobile,
            profile_image_name: draft.profile_image.map(|image| image.filename),
            blood_group: draft.blood_group,
            allergies: draft.allergies,
            medications: draft.medications,
            mother_name: draft.mother_name,
            mother_mobile: draft.mother_mobile,
            mother_occupation: draft.mother_occupation,
            father_name: draft.father_name,
            father_mobile: draft.father_mobile,
        }
    }

    pub fn to_snapshot_dto(view: SessionView) -> RegistrationSnapshot {
        let step = view.state.step();
        RegistrationSnapshot {
            session_id: view.id.to_string(),
            phase: Self::to_phase(view.state),
            step: step.map(|s| s.number()),
            total_steps: FormStep::COUNT,
            progress_percent: view.progress_percent,
            step_title: step.map_or(SUBMITTED_TITLE, |s| s.title()).to_string(),
            draft: Self::to_draft_view(view.draft),
            effects: view.effects.into_iter().map(Self::to_effect_dto).collect(),
            record: view.record.map(StudentMapper::to_dto),
        }
    }

    /// Map a partial update. `null` clears gender, blood group and date of
    /// birth; an empty date of birth clears it too.
    pub fn to_domain_update(request: UpdateDraftRequest) -> Result<DraftUpdate> {
        let date_of_birth = match request.date_of_birth {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) if raw.trim().is_empty() => Some(None),
            Some(Some(raw)) => Some(Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("Invalid date of birth '{}', expected YYYY-MM-DD", raw))?,
            )),
        };

        Ok(DraftUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            gender: request.gender,
            date_of_birth,
            email: request.email,
            mobile: request.mobile,
            profile_image: None,
            blood_group: request.blood_group,
            allergies: request.allergies,
            medications: request.medications,
            mother_name: request.mother_name,
            mother_mobile: request.mother_mobile,
            mother_occupation: request.mother_occupation,
            father_name: request.father_name,
            father_mobile: request.father_mobile,
        })
    }
}
